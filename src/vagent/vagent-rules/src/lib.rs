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

//! vAgent routing rules
//!
//! Message-processing rules running inline in an SMTP relay's routing
//! pipeline. Each rule inspects the mail envelope and MIME headers, consults
//! its control directive headers, and conditionally mutates the envelope's
//! routing metadata before the message continues through the pipeline.
//!
//! A rule never aborts message processing: every failure mode is handled
//! locally, traced, and classified for the diagnostic sink.

#![doc(html_no_source)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
//
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]

mod directive;
mod rule;
mod trace;

mod inspector;
mod reroute;
mod rewrite;
mod sender_mismatch;

pub use directive::{
    find_directive, header, parse_address, parse_hostname, parse_mismatch_action, DirectiveError,
    MismatchAction, RewriteMap,
};
pub use inspector::Inspector;
pub use reroute::{AcceptedDomains, ExemptionPolicy, Reroute};
pub use rewrite::{RewriteRecipientDomain, RewriteSenderDomain};
pub use rule::{Rule, Verdict};
pub use sender_mismatch::SenderMismatch;
pub use trace::{DiagnosticSink, ProcessingTrace, Severity, TracingSink};

#[cfg(test)]
mod tests;
