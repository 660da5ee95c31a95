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
use crate::rule::{Rule, Verdict};
use crate::trace::{DiagnosticSink, ProcessingTrace};
use std::sync::Arc;
use vagent_common::MailContext;
use vagent_config::Config;

/// Read-only diagnostic rule dumping the P1/P2 state (senders, recipient
/// lists) and the full header list of every message, and raising a warning
/// on sender anomalies:
/// a P1/P2 mismatch, a `Sender:`/`From:` divergence, or a multi-address
/// sender field.
///
/// Never mutates the message.
pub struct Inspector {
    debug_enabled: bool,
    sink: Arc<dyn DiagnosticSink>,
}

impl Inspector {
    /// build the rule from its configuration namespace.
    #[must_use]
    pub fn new(config: &Config, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            debug_enabled: config.rules.inspector.debug_enabled,
            sink,
        }
    }
}

impl Rule for Inspector {
    fn name(&self) -> &'static str {
        "inspector"
    }

    fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    fn execute(
        &self,
        ctx: &mut MailContext,
        trace: &mut ProcessingTrace,
    ) -> anyhow::Result<Verdict> {
        let p1 = ctx.envelop.mail_from.full().to_lowercase();
        let sender = ctx.mail.sender.full().to_lowercase();
        let from = ctx.mail.from.full().to_lowercase();

        trace.append(format!("P1 MAIL FROM: {p1}"));
        for rcpt in &ctx.envelop.rcpt {
            trace.append(format!("P1 RCPT TO: {rcpt}"));
        }
        trace.append(format!("P2 SENDER: {sender}"));
        trace.append(format!("P2 FROM: {from}"));
        for (kind, list) in [
            ("TO", &ctx.mail.to),
            ("CC", &ctx.mail.cc),
            ("BCC", &ctx.mail.bcc),
            ("REPLY-TO", &ctx.mail.reply_to),
        ] {
            for mailbox in list {
                trace.append(format!("P2 {kind}: {mailbox}"));
            }
        }
        trace.append(format!(
            "message is {}system generated",
            if ctx.mail.is_system { "" } else { "not " }
        ));

        trace.append("header dump start");
        for (name, value) in &ctx.mail.headers.0 {
            trace.append(format!("\t{name}: {value}"));
        }
        trace.append("header dump end");

        let mut warning = false;
        if p1 != sender || p1 != from {
            trace.append("P1/P2 sender mismatch detected");
            warning = true;
        }
        if sender != from {
            trace.append("P2 SENDER and P2 FROM diverge");
            warning = true;
        }
        if sender.contains(',') || from.contains(',') {
            trace.append("P2 sender field carries more than one address");
            warning = true;
        }

        Ok(Verdict {
            processed: true,
            warning,
        })
    }
}
