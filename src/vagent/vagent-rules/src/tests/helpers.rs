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
use crate::trace::{DiagnosticSink, Severity};
use std::sync::{Arc, Mutex};
use vagent_common::{addr, MailContext, Rcpt};
use vagent_config::Config;

/// sink capturing every flushed trace, so tests can assert on what was
/// written and at which severity.
#[derive(Default)]
pub struct MemorySink(Mutex<Vec<(Severity, String)>>);

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<(Severity, String)> {
        self.0.lock().unwrap().clone()
    }

    pub fn severities(&self) -> Vec<Severity> {
        self.entries()
            .into_iter()
            .map(|(severity, _)| severity)
            .collect()
    }

    /// all flushed text joined together, for contains-style assertions.
    pub fn text(&self) -> String {
        self.entries()
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl DiagnosticSink for MemorySink {
    fn write(&self, severity: Severity, text: &str) {
        self.0.lock().unwrap().push((severity, text.to_string()));
    }
}

/// a default configuration with every debug flag raised, so informational
/// traces reach the sink.
pub fn debug_config() -> Config {
    let mut config = Config::default();
    config.rules.sender_mismatch.debug_enabled = true;
    config.rules.rewrite_sender.debug_enabled = true;
    config.rules.rewrite_recipient.debug_enabled = true;
    config.rules.inspector.debug_enabled = true;
    config.rules.reroute.debug_enabled = true;
    config
}

/// a context with coherent P1/P2 senders and organizational recipients.
pub fn context(mail_from: &str, rcpt: &[&str]) -> MailContext {
    let mut ctx = MailContext::default();
    ctx.envelop.mail_from = addr!(mail_from);
    ctx.envelop.rcpt = rcpt
        .iter()
        .map(|recipient| Rcpt::new(addr!(recipient)))
        .collect();
    ctx.mail.message_id = "<0001@relay.test>".to_string();
    ctx.mail.subject = "unit test".to_string();
    ctx.mail.sender = addr!(mail_from);
    ctx.mail.from = addr!(mail_from);
    ctx
}
