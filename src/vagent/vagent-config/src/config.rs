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

/// This structure contains all the fields to configure the rules at startup.
///
/// All fields are optional and defaulted if missing, except the version
/// requirement. See [`crate::Config::from_toml`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// vAgent's version requirement to parse this configuration file.
    pub version_requirement: semver::VersionReq,
    /// see [`field::FieldRules`]
    #[serde(default)]
    pub rules: field::FieldRules,
}

/// The inner fields of the rule configuration.
#[allow(clippy::module_name_repetitions)]
pub mod field {
    /// One namespace per rule.
    #[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldRules {
        /// see [`FieldRule`]
        #[serde(default)]
        pub sender_mismatch: FieldRule,
        /// see [`FieldRule`]
        #[serde(default)]
        pub rewrite_sender: FieldRule,
        /// see [`FieldRule`]
        #[serde(default)]
        pub rewrite_recipient: FieldRule,
        /// see [`FieldRule`]
        #[serde(default)]
        pub inspector: FieldRule,
        /// see [`FieldReroute`]
        #[serde(default)]
        pub reroute: FieldReroute,
    }

    /// Settings shared by every rule.
    #[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldRule {
        /// Informational traces are only written to the sink when enabled.
        /// Warnings and errors are written regardless.
        #[serde(default)]
        pub debug_enabled: bool,
    }

    /// Settings of the rerouting rules.
    #[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldReroute {
        /// see [`FieldRule::debug_enabled`]
        #[serde(default)]
        pub debug_enabled: bool,
        /// Recipient domains never overridden by the exclusion-list variant.
        #[serde(default)]
        pub exempted_domains: Vec<String>,
        /// Full recipient addresses never overridden by the exclusion-list
        /// variant.
        #[serde(default)]
        pub exempted_addresses: Vec<String>,
    }

    impl FieldReroute {
        /// exempted domains, lower-cased and deduplicated.
        #[must_use]
        pub fn exempted_domain_set(&self) -> std::collections::BTreeSet<String> {
            self.exempted_domains
                .iter()
                .map(|domain| domain.to_lowercase())
                .collect()
        }

        /// exempted addresses, lower-cased and deduplicated.
        #[must_use]
        pub fn exempted_address_set(&self) -> std::collections::BTreeSet<String> {
            self.exempted_addresses
                .iter()
                .map(|address| address.to_lowercase())
                .collect()
        }
    }
}
