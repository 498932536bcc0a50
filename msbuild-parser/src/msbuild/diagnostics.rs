//! Diagnostics sinks
//!
//! Readers and parsers never log on their own. Anything worth reporting, from verbose
//! capture traces to recoverable syntax errors, is handed to a [`DiagnosticSink`] the caller
//! passes in. [`TracingSink`] forwards to `tracing` for binaries that want the events in
//! their log, `Vec<Diagnostic>` collects them for tests and for document snapshots.

use super::text::Range;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Warning,
    Error,
}

/// The component a diagnostic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSource {
    Reader,
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub source: DiagnosticSource,
    pub message: String,
    pub range: Option<Range>,
}

impl Diagnostic {
    pub fn new(severity: Severity, source: DiagnosticSource, message: impl Into<String>) -> Self {
        Self {
            severity,
            source,
            message: message.into(),
            range: None,
        }
    }

    pub fn at(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn is_trace(&self) -> bool {
        self.severity == Severity::Trace
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Trace => "trace",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.range {
            Some(range) => write!(f, "{severity} {range}: {}", self.message),
            None => write!(f, "{severity}: {}", self.message),
        }
    }
}

pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);

    /// Whether trace-level diagnostics are wanted at all. Emitters skip building trace
    /// messages when this is false.
    fn wants_trace(&self) -> bool {
        true
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _diagnostic: Diagnostic) {}

    fn wants_trace(&self) -> bool {
        false
    }
}

/// Forwards diagnostics to `tracing` events.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    trace: bool,
}

impl TracingSink {
    pub fn new() -> Self {
        Self { trace: false }
    }

    /// Also forward the reader's per-node capture traces.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let range = diagnostic.range.map(|range| range.to_string());
        let source = match diagnostic.source {
            DiagnosticSource::Reader => "reader",
            DiagnosticSource::Expression => "expression",
        };
        match diagnostic.severity {
            Severity::Trace => {
                tracing::trace!(source, range = range.as_deref(), "{}", diagnostic.message)
            }
            Severity::Warning => {
                tracing::warn!(source, range = range.as_deref(), "{}", diagnostic.message)
            }
            Severity::Error => {
                tracing::error!(source, range = range.as_deref(), "{}", diagnostic.message)
            }
        }
    }

    fn wants_trace(&self) -> bool {
        self.trace
    }
}

/// Splits diagnostics between two sinks, e.g. collecting them while also logging.
pub struct Tee<'a, A: ?Sized, B: ?Sized> {
    pub first: &'a mut A,
    pub second: &'a mut B,
}

impl<A, B> DiagnosticSink for Tee<'_, A, B>
where
    A: DiagnosticSink + ?Sized,
    B: DiagnosticSink + ?Sized,
{
    fn emit(&mut self, diagnostic: Diagnostic) {
        if !diagnostic.is_trace() || self.first.wants_trace() {
            self.first.emit(diagnostic.clone());
        }
        if !diagnostic.is_trace() || self.second.wants_trace() {
            self.second.emit(diagnostic);
        }
    }

    fn wants_trace(&self) -> bool {
        self.first.wants_trace() || self.second.wants_trace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msbuild::text::Position;

    #[test]
    fn test_vec_collects() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        sink.emit(Diagnostic::new(Severity::Warning, DiagnosticSource::Reader, "stray end tag"));

        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].to_string(), "warning: stray end tag");
    }

    #[test]
    fn test_display_with_range() {
        let diagnostic = Diagnostic::new(Severity::Error, DiagnosticSource::Expression, "expected ')'")
            .at(Range::empty_at(Position::one_based(2, 4)));

        assert_eq!(diagnostic.to_string(), "error (2,4)-(2,4): expected ')'");
    }

    #[test]
    fn test_tee_filters_traces_per_sink() {
        let mut collected: Vec<Diagnostic> = Vec::new();
        let mut dropped = NullSink;
        let mut tee = Tee {
            first: &mut collected,
            second: &mut dropped,
        };

        tee.emit(Diagnostic::new(Severity::Trace, DiagnosticSource::Reader, "open <Project>"));
        tee.emit(Diagnostic::new(Severity::Error, DiagnosticSource::Reader, "bad token"));

        assert!(tee.wants_trace());
        assert_eq!(collected.len(), 2);
    }
}
