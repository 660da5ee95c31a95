/*
 * vAgent SMTP routing rules
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/
use crate::{Config, ConfigHandle};

#[test]
fn parse_minimal() {
    let config = Config::from_toml(r#"version_requirement = ">=1.0.0, <2.0.0""#).unwrap();

    pretty_assertions::assert_eq!(config.rules, crate::field::FieldRules::default());
    assert!(!config.rules.sender_mismatch.debug_enabled);
    assert!(config.rules.reroute.exempted_domains.is_empty());
    assert!(config.rules.reroute.exempted_addresses.is_empty());
}

#[test]
fn parse_full() {
    let config = Config::from_toml(
        r#"
version_requirement = ">=1.0.0, <2.0.0"

[rules.sender_mismatch]
debug_enabled = true

[rules.rewrite_recipient]
debug_enabled = true

[rules.reroute]
debug_enabled = false
exempted_domains = ["Contoso.com", "contoso.com", "fabrikam.com"]
exempted_addresses = ["User@Tailspintoys.com"]
"#,
    )
    .unwrap();

    assert!(config.rules.sender_mismatch.debug_enabled);
    assert!(config.rules.rewrite_recipient.debug_enabled);
    assert!(!config.rules.rewrite_sender.debug_enabled);

    // normalization: lower-cased, deduplicated, ordered.
    pretty_assertions::assert_eq!(
        config
            .rules
            .reroute
            .exempted_domain_set()
            .into_iter()
            .collect::<Vec<_>>(),
        vec!["contoso.com".to_string(), "fabrikam.com".to_string()]
    );
    pretty_assertions::assert_eq!(
        config
            .rules
            .reroute
            .exempted_address_set()
            .into_iter()
            .collect::<Vec<_>>(),
        vec!["user@tailspintoys.com".to_string()]
    );
}

#[test]
fn version_requirement_not_fulfilled() {
    assert!(Config::from_toml(r#"version_requirement = ">=99.0.0""#).is_err());
}

#[test]
fn unknown_field() {
    assert!(Config::from_toml(
        r#"
version_requirement = ">=1.0.0, <2.0.0"

[rules.sender_mismatch]
debug = true
"#
    )
    .is_err());
}

#[test]
fn handle_replaces_snapshot_atomically() {
    let handle = ConfigHandle::default();
    let before = handle.snapshot();
    assert!(!before.rules.reroute.debug_enabled);

    let mut updated = Config::default();
    updated.rules.reroute.debug_enabled = true;
    handle.replace(updated);

    // the old snapshot is unchanged, the new one is visible.
    assert!(!before.rules.reroute.debug_enabled);
    assert!(handle.snapshot().rules.reroute.debug_enabled);
}
