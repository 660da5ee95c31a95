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
use crate::directive::{find_directive, header, RewriteMap};
use crate::rule::{append_identity_headers, Rule, Verdict};
use crate::trace::{DiagnosticSink, ProcessingTrace};
use std::sync::Arc;
use vagent_common::{Address, MailContext};
use vagent_config::Config;

/// rewrite the domain of one address slot when it is a key of the map.
/// The local-part and non-matching domains are left untouched.
fn rewrite_in_place(
    slot: &mut Address,
    map: &RewriteMap,
    what: &str,
    trace: &mut ProcessingTrace,
) -> bool {
    let Some(destination) = map.get(slot.domain()) else {
        return false;
    };
    let rewritten = slot.with_domain(destination);
    trace.append(format!(
        "{what} {} rewritten to {}",
        slot.full(),
        rewritten.full()
    ));
    *slot = rewritten;
    true
}

fn trace_map(map: &RewriteMap, what: &str, trace: &mut ProcessingTrace) {
    trace.append(format!("{what} domain rewrite map start"));
    for (source, destination) in map.iter() {
        trace.append(format!("\t{source} : {destination}"));
    }
    trace.append(format!("{what} domain rewrite map end"));
}

/// Reads the rewrite-map directive shared by both rewrite rules.
///
/// Returns `Ok(None)` when the directive is absent or empty (silent no-op),
/// `Err(())` after tracing a warning when the map is malformed. A malformed
/// map applies zero rewrites: it is parsed fully before any mutation.
fn read_map(
    ctx: &MailContext,
    name: &'static str,
    trace: &mut ProcessingTrace,
) -> Result<Option<RewriteMap>, ()> {
    let Some(raw) = find_directive(&ctx.mail.headers, name) else {
        trace.append(format!("message untouched: {name} is not set"));
        return Ok(None);
    };

    match RewriteMap::parse(name, raw) {
        Err(error) => {
            trace.append(&error);
            Err(())
        }
        Ok(map) if map.is_empty() => {
            trace.append(format!("message untouched: {name} is empty"));
            Ok(None)
        }
        Ok(map) => Ok(Some(map)),
    }
}

/// Rewrites the domain of the sender identities: envelope `MAIL FROM`,
/// message `From:` and message `Sender:`, according to the
/// [`header::SENDER_REWRITE_MAP`] directive.
pub struct RewriteSenderDomain {
    debug_enabled: bool,
    sink: Arc<dyn DiagnosticSink>,
}

impl RewriteSenderDomain {
    /// build the rule from its configuration namespace.
    #[must_use]
    pub fn new(config: &Config, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            debug_enabled: config.rules.rewrite_sender.debug_enabled,
            sink,
        }
    }
}

impl Rule for RewriteSenderDomain {
    fn name(&self) -> &'static str {
        "rewrite-sender-domain"
    }

    // high volume rule: untouched messages are not worth a log entry.
    fn log_untouched_messages(&self) -> bool {
        false
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
        if ctx.mail.is_system {
            trace.append("message skipped: system generated");
            return Ok(Verdict::skipped());
        }

        let map = match read_map(ctx, header::SENDER_REWRITE_MAP, trace) {
            Err(()) => return Ok(Verdict::rejected()),
            Ok(None) => return Ok(Verdict::skipped()),
            Ok(Some(map)) => map,
        };
        trace_map(&map, "sender", trace);

        trace.append(format!(
            "evaluating P1 MAIL FROM: {}",
            ctx.envelop.mail_from
        ));
        rewrite_in_place(&mut ctx.envelop.mail_from, &map, "P1 MAIL FROM", trace);

        trace.append(format!("evaluating P2 FROM: {}", ctx.mail.from));
        rewrite_in_place(&mut ctx.mail.from, &map, "P2 FROM", trace);

        trace.append(format!("evaluating P2 SENDER: {}", ctx.mail.sender));
        rewrite_in_place(&mut ctx.mail.sender, &map, "P2 SENDER", trace);

        append_identity_headers(
            &mut ctx.mail,
            &[(header::PRODUCT_NAME, "VAgent-RewriteSenderDomain")],
            trace,
        );
        Ok(Verdict::applied())
    }
}

/// Rewrites the domain of the recipients: envelope `RCPT TO` plus message
/// `To:`/`Cc:`/`Bcc:` entries, according to the
/// [`header::RECIPIENT_REWRITE_MAP`] directive.
///
/// When a P2 entry's display name is itself an email-address string (no
/// human name was resolved), the display name is rewritten identically to
/// keep it consistent with the new address.
pub struct RewriteRecipientDomain {
    debug_enabled: bool,
    sink: Arc<dyn DiagnosticSink>,
}

impl RewriteRecipientDomain {
    /// build the rule from its configuration namespace.
    #[must_use]
    pub fn new(config: &Config, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            debug_enabled: config.rules.rewrite_recipient.debug_enabled,
            sink,
        }
    }
}

impl Rule for RewriteRecipientDomain {
    fn name(&self) -> &'static str {
        "rewrite-recipient-domain"
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
        if ctx.mail.is_system {
            trace.append("message skipped: system generated");
            return Ok(Verdict::skipped());
        }

        let map = match read_map(ctx, header::RECIPIENT_REWRITE_MAP, trace) {
            Err(()) => return Ok(Verdict::rejected()),
            Ok(None) => return Ok(Verdict::skipped()),
            Ok(Some(map)) => map,
        };
        trace_map(&map, "recipient", trace);

        for rcpt in &mut ctx.envelop.rcpt {
            trace.append(format!("evaluating P1 recipient: {}", rcpt.address));
            rewrite_in_place(&mut rcpt.address, &map, "P1 recipient", trace);
        }

        let mail = &mut ctx.mail;
        for (kind, mailbox) in mail
            .to
            .iter_mut()
            .map(|mailbox| ("TO", mailbox))
            .chain(mail.cc.iter_mut().map(|mailbox| ("CC", mailbox)))
            .chain(mail.bcc.iter_mut().map(|mailbox| ("BCC", mailbox)))
        {
            trace.append(format!(
                "evaluating P2 {kind} recipient: {}",
                mailbox.address
            ));
            if !rewrite_in_place(
                &mut mailbox.address,
                &map,
                &format!("P2 {kind} recipient"),
                trace,
            ) {
                continue;
            }

            let full = mailbox.address.full().to_string();
            if let Some(display_name) = &mut mailbox.display_name {
                if display_name.contains('@') {
                    *display_name = full;
                    trace.append(format!(
                        "P2 {kind} display name rewritten to {display_name} as it holds a bare address"
                    ));
                }
            }
        }

        append_identity_headers(
            &mut ctx.mail,
            &[(header::PRODUCT_NAME, "VAgent-RewriteRecipientDomain")],
            trace,
        );
        Ok(Verdict::applied())
    }
}
