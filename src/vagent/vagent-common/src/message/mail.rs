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
use crate::Address;

/// we use Vec instead of a `HashMap` because header ordering is important,
/// and duplicate names are allowed.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct MailHeaders(pub Vec<(String, String)>);

impl MailHeaders {
    /// value of the first header with this exact name.
    ///
    /// Lookup is case-sensitive: control headers are inserted by transport
    /// rules with a fixed spelling, this is part of the wire contract.
    #[must_use]
    pub fn find_first(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value.as_str())
    }

    /// push a header to the end of the header section.
    pub fn push(&mut self, name: &str, value: &str) {
        self.0.push((name.to_string(), value.to_string()));
    }

    /// append the header unless the first header carrying this name already
    /// holds exactly this value. Returns whether a header was added.
    pub fn push_if_missing(&mut self, name: &str, value: &str) -> bool {
        if self.find_first(name) == Some(value) {
            return false;
        }
        self.push(name, value);
        true
    }

    /// whether at least one header carries this exact name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find_first(name).is_some()
    }
}

/// One P2 address entry: SMTP address plus optional display name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Mailbox {
    /// the SMTP address.
    pub address: Address,
    /// display name, when the address book resolved one. When unresolved,
    /// mail clients often leave the bare address string in here.
    pub display_name: Option<String>,
}

impl Mailbox {
    /// mailbox without a display name.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            display_name: None,
        }
    }

    /// mailbox with a display name.
    #[must_use]
    pub fn with_display_name(address: Address, display_name: impl Into<String>) -> Self {
        Self {
            address,
            display_name: Some(display_name.into()),
        }
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "\"{name}\" <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// The P2 (message content) view of one in-flight message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Mail {
    /// Message-ID header value.
    pub message_id: String,
    /// Subject header value.
    pub subject: String,
    /// the `Sender:` address.
    pub sender: Address,
    /// the `From:` (author) address.
    pub from: Address,
    /// `To:` recipients.
    pub to: Vec<Mailbox>,
    /// `Cc:` recipients.
    pub cc: Vec<Mailbox>,
    /// `Bcc:` recipients.
    pub bcc: Vec<Mailbox>,
    /// `Reply-To:` addresses.
    pub reply_to: Vec<Mailbox>,
    /// full header section, insertion order preserved.
    pub headers: MailHeaders,
    /// system generated messages (DSN, journaling, ...) are exempt from
    /// every routing rule.
    pub is_system: bool,
}

impl Default for Mail {
    fn default() -> Self {
        Self {
            message_id: String::default(),
            subject: String::default(),
            sender: Address::new_unchecked("default@domain.com".to_string()),
            from: Address::new_unchecked("default@domain.com".to_string()),
            to: vec![],
            cc: vec![],
            bcc: vec![],
            reply_to: vec![],
            headers: MailHeaders::default(),
            is_system: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MailHeaders;

    #[test]
    fn find_first_is_case_sensitive_and_ordered() {
        let mut headers = MailHeaders::default();
        headers.push("X-Test", "first");
        headers.push("X-Test", "second");
        headers.push("x-test", "lowercase");

        assert_eq!(headers.find_first("X-Test"), Some("first"));
        assert_eq!(headers.find_first("x-test"), Some("lowercase"));
        assert_eq!(headers.find_first("X-TEST"), None);
    }

    #[test]
    fn push_if_missing() {
        let mut headers = MailHeaders::default();
        assert!(headers.push_if_missing("X-Name", "a"));
        assert!(!headers.push_if_missing("X-Name", "a"));
        // a different value is appended, the original is left untouched.
        assert!(headers.push_if_missing("X-Name", "b"));
        assert_eq!(
            headers.0,
            vec![
                ("X-Name".to_string(), "a".to_string()),
                ("X-Name".to_string(), "b".to_string())
            ]
        );
    }
}
