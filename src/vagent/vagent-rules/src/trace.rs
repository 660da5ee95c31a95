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

/// Severity of one flushed trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// informational, gated by the per-rule debug flag.
    Debug,
    /// anomaly without mutation (malformed directive, possible loop).
    /// Always written, regardless of the debug flag.
    Warning,
    /// unexpected internal failure. Always written.
    Error,
}

/// Where flushed traces go.
///
/// Writes are best-effort: an implementation must never let a write failure
/// reach back into message processing.
pub trait DiagnosticSink: Send + Sync {
    /// append one classified trace.
    fn write(&self, severity: Severity, text: &str);
}

/// The default sink, forwarding traces to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn write(&self, severity: Severity, text: &str) {
        match severity {
            Severity::Debug => tracing::debug!("{text}"),
            Severity::Warning => tracing::warn!("{text}"),
            Severity::Error => tracing::error!("{text}"),
        }
    }
}

const RULER: &str =
    "--------------------------------------------------------------------------------";

/// Ordered buffer of human-readable lines for one rule invocation.
///
/// Lines accumulate while the rule works; at the end of the invocation the
/// whole buffer is flushed to the sink as a single entry, or discarded for
/// rules that only log messages they acted upon.
#[derive(Debug, Default)]
pub struct ProcessingTrace {
    lines: Vec<String>,
}

impl ProcessingTrace {
    /// append one line.
    pub fn append(&mut self, line: impl std::fmt::Display) {
        self.lines.push(line.to_string());
    }

    /// append a structured block describing an unexpected failure:
    /// message, cause chain, and full detail.
    pub fn append_error(&mut self, error: &anyhow::Error) {
        self.append(RULER);
        self.append(format!("ERROR MESSAGE: {error}"));
        for (depth, cause) in error.chain().skip(1).enumerate() {
            self.append(format!("ERROR CAUSE {depth}: {cause}"));
        }
        self.append(format!("ERROR DETAIL: {error:#}"));
        self.append(RULER);
    }

    /// hand the buffer to the sink at the given severity, then clear it.
    pub fn flush(&mut self, sink: &dyn DiagnosticSink, severity: Severity) {
        if !self.lines.is_empty() {
            sink.write(severity, &self.lines.join("\n"));
        }
        self.lines.clear();
    }

    /// drop the buffer without writing anything.
    pub fn discard(&mut self) {
        self.lines.clear();
    }

    /// buffered lines, mostly useful for assertions in tests.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}
