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

//! vAgent common definition
//!
//! The data model shared by every routing rule: addresses, domains, the
//! envelope (P1) and message (P2) views of one in-flight mail, and the
//! per-recipient routing slot.

#![doc(html_no_source)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
//
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]

#[macro_use]
mod types {
    #[macro_use]
    pub mod address;
    pub mod domain;
}

pub use types::{address::Address, domain::Domain};

mod envelop;
mod mail_context;
mod rcpt;

pub use envelop::Envelop;
pub use mail_context::MailContext;
pub use rcpt::{DeliveryQueue, Rcpt, RecipientCategory, Route};

/// message (P2) level representation
pub mod message {
    /// mail headers, mailboxes and the message view.
    pub mod mail;
}

pub use message::mail::{Mail, MailHeaders, Mailbox};
