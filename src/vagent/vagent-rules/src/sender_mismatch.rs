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
use crate::directive::{find_directive, header, parse_address, parse_mismatch_action};
use crate::rule::{append_identity_headers, Rule, Verdict};
use crate::trace::{DiagnosticSink, ProcessingTrace};
use crate::MismatchAction;
use std::sync::Arc;
use vagent_common::MailContext;
use vagent_config::Config;

const PRODUCT_VALUE: &str = "VAgent-SenderMismatch";

/// Reconciles the envelope sender (P1, `MAIL FROM`) with the message-level
/// sender/author addresses (P2, `Sender:`/`From:`).
///
/// Two independent directives are honored:
/// * [`header::MISMATCH_ACTION`] selects a merge strategy
///   (`UseP1` / `UseP2` / `None`);
/// * [`header::FORCE_P1`] unconditionally overwrites the envelope sender
///   with a literal address, and always runs last so its value wins as the
///   final P1.
pub struct SenderMismatch {
    debug_enabled: bool,
    sink: Arc<dyn DiagnosticSink>,
}

impl SenderMismatch {
    /// build the rule from its configuration namespace.
    #[must_use]
    pub fn new(config: &Config, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            debug_enabled: config.rules.sender_mismatch.debug_enabled,
            sink,
        }
    }

    fn apply_action(
        &self,
        raw: &str,
        ctx: &mut MailContext,
        trace: &mut ProcessingTrace,
        verdict: &mut Verdict,
    ) {
        trace.append(format!(
            "evaluating P1/P2 sender mismatch as {} is present",
            header::MISMATCH_ACTION
        ));

        let action = match parse_mismatch_action(raw) {
            Err(error) => {
                trace.append(&error);
                verdict.warning = true;
                return;
            }
            Ok(action) => action,
        };

        let p1 = ctx.envelop.mail_from.clone();
        let p2 = ctx.mail.sender.clone();
        trace.append(format!("P1 sender is set to: {p1}"));
        trace.append(format!("P2 sender is set to: {p2}"));

        match action {
            MismatchAction::UseP1 => {
                ctx.mail.sender = p1.clone();
                ctx.mail.from = p1.clone();
                trace.append(format!("P2 sender and from have been set to: {p1}"));
            }
            MismatchAction::UseP2 => {
                ctx.envelop.mail_from = p2.clone();
                trace.append(format!("P1 sender has been set to: {p2}"));
            }
            MismatchAction::None => {
                trace.append("no action taken as the directive is set to None");
            }
        }
        verdict.processed = true;
    }

    fn apply_forced_p1(
        &self,
        raw: &str,
        ctx: &mut MailContext,
        trace: &mut ProcessingTrace,
        verdict: &mut Verdict,
    ) {
        trace.append(format!(
            "overriding P1 sender as {} is present",
            header::FORCE_P1
        ));

        match parse_address(header::FORCE_P1, raw) {
            Err(error) => {
                trace.append(&error);
                verdict.warning = true;
            }
            Ok(forced) => {
                trace.append(format!(
                    "P1 sender is currently set to: {}",
                    ctx.envelop.mail_from
                ));
                ctx.envelop.mail_from = forced;
                trace.append(format!(
                    "forced P1 sender to {}",
                    ctx.envelop.mail_from
                ));
                verdict.processed = true;
            }
        }
    }
}

impl Rule for SenderMismatch {
    fn name(&self) -> &'static str {
        "sender-mismatch"
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

        let action_raw =
            find_directive(&ctx.mail.headers, header::MISMATCH_ACTION).map(str::to_string);
        let force_raw = find_directive(&ctx.mail.headers, header::FORCE_P1).map(str::to_string);

        let mut verdict = Verdict::skipped();

        match &action_raw {
            None => trace.append(format!(
                "message untouched: {} is not set",
                header::MISMATCH_ACTION
            )),
            Some(raw) => self.apply_action(raw, ctx, trace, &mut verdict),
        }

        // runs last, so a forced value always wins as the final P1.
        match &force_raw {
            None => trace.append(format!(
                "message untouched: {} is not set",
                header::FORCE_P1
            )),
            Some(raw) => self.apply_forced_p1(raw, ctx, trace, &mut verdict),
        }

        if verdict.processed {
            append_identity_headers(
                &mut ctx.mail,
                &[(header::SENDER_PRODUCT_NAME, PRODUCT_VALUE)],
                trace,
            );
        }

        Ok(verdict)
    }
}
