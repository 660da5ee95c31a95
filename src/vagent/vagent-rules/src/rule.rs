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
use crate::trace::{DiagnosticSink, ProcessingTrace, Severity};
use vagent_common::{message::mail::Mail, MailContext};

/// What one invocation of a rule did to the message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verdict {
    /// the rule acted on the message (a directive was present and valid,
    /// even when the directive explicitly asked for no mutation).
    pub processed: bool,
    /// something was out of order: malformed directive value, or a possible
    /// mail loop. Warnings are logged regardless of the debug flag.
    pub warning: bool,
}

impl Verdict {
    /// no directive, or the message is exempt: nothing was examined.
    #[must_use]
    pub const fn skipped() -> Self {
        Self {
            processed: false,
            warning: false,
        }
    }

    /// the rule acted on the message.
    #[must_use]
    pub const fn applied() -> Self {
        Self {
            processed: true,
            warning: false,
        }
    }

    /// the directive was present but rejected; no mutation took place.
    #[must_use]
    pub const fn rejected() -> Self {
        Self {
            processed: false,
            warning: true,
        }
    }
}

/// A message-processing rule, invoked synchronously once per message by the
/// hosting pipeline.
///
/// Rules are stateless across invocations apart from configuration loaded at
/// construction; each invocation mutates only the [`MailContext`] that
/// belongs to it, so no locking is needed.
pub trait Rule: Send + Sync {
    /// short rule name, used in traces.
    fn name(&self) -> &'static str;

    /// whether a clean, untouched message still produces an informational
    /// trace. Rules processing high volumes of untouched traffic return
    /// `false` so the log is not flooded; warnings and errors are always
    /// written either way.
    fn log_untouched_messages(&self) -> bool {
        true
    }

    /// the configured debug flag gating informational traces.
    fn debug_enabled(&self) -> bool;

    /// the sink receiving this rule's flushed traces.
    fn sink(&self) -> &dyn DiagnosticSink;

    /// the decision logic. Mutates the context in place and reports what it
    /// did; any error is contained by [`Rule::run`].
    ///
    /// # Errors
    ///
    /// * an unexpected internal failure; partial mutations may remain.
    fn execute(
        &self,
        ctx: &mut MailContext,
        trace: &mut ProcessingTrace,
    ) -> anyhow::Result<Verdict>;

    /// Entry point called by the hosting pipeline.
    ///
    /// Never fails and never panics back into the pipeline: the outcome is
    /// traced, classified and flushed whichever path was taken.
    fn run(&self, ctx: &mut MailContext) {
        let mut trace = ProcessingTrace::default();
        trace.append(format!(
            "Processing message {} from {} with subject '{}' in vagent:{}",
            ctx.mail.message_id,
            ctx.envelop.mail_from.full().to_lowercase(),
            ctx.mail.subject.trim(),
            self.name(),
        ));

        let started = std::time::Instant::now();
        let verdict = self.execute(ctx, &mut trace);
        trace.append(format!(
            "vagent:{} took {} ms to execute",
            self.name(),
            started.elapsed().as_millis(),
        ));

        match verdict {
            Err(error) => {
                trace.append(format!("Unexpected failure in vagent:{}", self.name()));
                trace.append_error(&error);
                trace.flush(self.sink(), Severity::Error);
            }
            Ok(Verdict { warning: true, .. }) => trace.flush(self.sink(), Severity::Warning),
            Ok(Verdict { processed, .. }) => {
                if (processed || self.log_untouched_messages()) && self.debug_enabled() {
                    trace.flush(self.sink(), Severity::Debug);
                } else {
                    trace.discard();
                }
            }
        }
    }
}

/// append audit headers, skipping the ones already present with the same
/// value on their first occurrence.
pub(crate) fn append_identity_headers(
    mail: &mut Mail,
    headers: &[(&str, &str)],
    trace: &mut ProcessingTrace,
) {
    for (name, value) in headers {
        if mail.headers.push_if_missing(name, value) {
            trace.append(format!("ADDED header {name}: {value}"));
        }
    }
}
