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
use vagent_common::{Address, Domain, MailHeaders};

/// The control header names recognized by the rules.
///
/// Header lookup is case-sensitive and first-match: control headers are
/// inserted by transport rules with this exact spelling, this is the wire
/// contract.
pub mod header {
    /// mismatch reconciliation strategy, see [`super::MismatchAction`].
    pub const MISMATCH_ACTION: &str = "X-VAgent-P1P2MismatchAction";
    /// forces the envelope sender to a literal mailbox address.
    pub const FORCE_P1: &str = "X-VAgent-ForceP1";
    /// routing override target, one DNS hostname.
    pub const REROUTE_TARGET: &str = "X-VAgent-Target";
    /// sender domain rewrite map, `domain=domain(;domain=domain)*`.
    pub const SENDER_REWRITE_MAP: &str = "X-VAgent-SenderRewriteMap";
    /// recipient domain rewrite map, `domain=domain(;domain=domain)*`.
    pub const RECIPIENT_REWRITE_MAP: &str = "X-VAgent-RecipientRewriteMap";
    /// identification / loop-protection marker shared by the reroute and
    /// rewrite rules, inserted by the rules, never expected as external
    /// input. Any rule's marker blocks every reroute variant.
    pub const PRODUCT_NAME: &str = "X-VAgent-Name";
    /// identification marker of the sender-mismatch rule. A separate name
    /// from [`PRODUCT_NAME`]: reconciling senders does not reroute anything
    /// and must not trip the reroute loop protection.
    pub const SENDER_PRODUCT_NAME: &str = "X-VAgent-Sender-Name";
}

/// A directive whose raw value does not match its grammar.
///
/// Not fatal: upstream this always classifies as a warning outcome, and no
/// mutation takes place.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectiveError {
    /// the header is present but its value is malformed.
    #[error("header {header} carries the invalid value '{value}': {reason}")]
    Invalid {
        /// offending control header name.
        header: &'static str,
        /// raw value found on the message.
        value: String,
        /// what the grammar expected.
        reason: String,
    },
}

impl DirectiveError {
    fn invalid(header: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            header,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// raw value of the first header carrying this exact name, trimmed.
/// `None` is a valid no-op state, not an error.
#[must_use]
pub fn find_directive<'a>(headers: &'a MailHeaders, name: &str) -> Option<&'a str> {
    headers.find_first(name).map(str::trim)
}

/// How a P1/P2 sender mismatch is reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum MismatchAction {
    /// the envelope sender overwrites the message `Sender:` and `From:`.
    UseP1,
    /// the message `Sender:` overwrites the envelope sender.
    UseP2,
    /// no mutation, but the message still counts as processed.
    None,
}

/// parse a mismatch-action directive value (case-insensitive).
///
/// # Errors
///
/// * the value is not one of `UseP1`, `UseP2`, `None`
pub fn parse_mismatch_action(raw: &str) -> Result<MismatchAction, DirectiveError> {
    raw.trim().parse::<MismatchAction>().map_err(|_| {
        DirectiveError::invalid(
            header::MISMATCH_ACTION,
            raw,
            "valid (case insensitive) values are UseP1, UseP2, None",
        )
    })
}

/// parse a directive value holding one RFC 5321 mailbox.
///
/// # Errors
///
/// * the value is not a syntactically valid address
pub fn parse_address(header: &'static str, raw: &str) -> Result<Address, DirectiveError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|error| DirectiveError::invalid(header, raw, error.to_string()))
}

/// parse a directive value holding one DNS hostname.
///
/// The hostname must be syntactically valid, not necessarily resolvable.
///
/// # Errors
///
/// * the value is not a syntactically valid hostname
pub fn parse_hostname(header: &'static str, raw: &str) -> Result<Domain, DirectiveError> {
    raw.trim()
        .parse::<Domain>()
        .map_err(|error| DirectiveError::invalid(header, raw, error.to_string()))
}

/// Ordered source-domain to destination-domain mapping, parsed from a single
/// `source=destination;...` header value.
///
/// Keys and values are lower-cased; when the same source domain appears
/// twice, the later occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteMap(Vec<(String, String)>);

impl RewriteMap {
    /// parse a `domain=domain(;domain=domain)*` directive value.
    ///
    /// Empty tokens between `;` separators are skipped; surrounding
    /// whitespace is trimmed per token.
    ///
    /// # Errors
    ///
    /// * an entry is missing its `=` separator
    /// * an entry has an empty source or destination domain
    pub fn parse(header: &'static str, raw: &str) -> Result<Self, DirectiveError> {
        let mut entries = vec![];

        for token in raw.split(';').map(str::trim).filter(|t| !t.is_empty()) {
            let (source, destination) = token
                .split_once('=')
                .ok_or_else(|| DirectiveError::invalid(header, raw, "entry is missing '='"))?;

            let source = source.trim().to_lowercase();
            let destination = destination.trim().to_lowercase();
            if source.is_empty() {
                return Err(DirectiveError::invalid(header, raw, "empty source domain"));
            }
            if destination.is_empty() {
                return Err(DirectiveError::invalid(
                    header,
                    raw,
                    "empty destination domain",
                ));
            }

            entries.push((source, destination));
        }

        Ok(Self(entries))
    }

    /// the map holds no entry at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// destination for this source domain, matching case-insensitively.
    /// Exact-domain matching only, no wildcard or subdomain logic.
    #[must_use]
    pub fn get(&self, domain: &str) -> Option<&str> {
        let domain = domain.to_lowercase();
        self.0
            .iter()
            .rev()
            .find(|(source, _)| *source == domain)
            .map(|(_, destination)| destination.as_str())
    }

    /// entries in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(source, destination)| (source.as_str(), destination.as_str()))
    }
}
