//! Parse entry points
//!
//! Each entry point tokenizes the text, runs one grammar rule over the whole of it and
//! returns a [`ParseOutcome`]. Failing to parse is an ordinary outcome: the text under an
//! editor cursor is usually incomplete, so callers get diagnostics and no tree rather than an
//! error to propagate.

use chumsky::error::SimpleReason;
use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

use super::grammar::{parse_with, ParserError, Rule, Rules};
use super::lists::{build_list, build_simple_list};
use super::tree::ExpressionTree;
use crate::msbuild::diagnostics::{Diagnostic, DiagnosticSink, DiagnosticSource, Severity};
use crate::msbuild::text::PositionIndex;

thread_local! {
    // Boxed chumsky parsers are `Rc`-based, so each thread builds the grammar once.
    static RULES: Rules<'static> = Rules::new();
}

fn run<O>(
    text: &str,
    rule: impl FnOnce(&Rules<'static>) -> Rule<'static, O>,
) -> Result<O, Vec<ParserError>> {
    RULES.with(|rules| parse_with(rule(rules), text))
}

/// Which rule to parse a piece of text with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpressionSyntax {
    /// A condition or a single expression.
    Root,
    /// Expressions separated by `;`.
    List,
    /// Raw text split on `;`.
    SimpleList,
}

/// Why a piece of expression text did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message} at {}..{}", .span.start, .span.end)]
pub struct ExpressionDiagnostic {
    /// Character span, relative to the parsed text.
    pub span: Range<usize>,
    /// Tokens and constructs that would have been accepted.
    pub expected: Vec<String>,
    pub found: Option<String>,
    pub message: String,
}

impl ExpressionDiagnostic {
    fn from_error(error: ParserError) -> Self {
        let mut expected: Vec<String> = error
            .expected()
            .map(|token| match token {
                Some(token) => format!("'{token}'"),
                None => "end of input".to_string(),
            })
            .collect();
        expected.sort();
        expected.dedup();
        if let Some(label) = error.label() {
            expected.insert(0, label.to_string());
        }
        let found = error.found().map(|token| token.to_string());

        let message = match error.reason() {
            SimpleReason::Custom(message) => message.clone(),
            SimpleReason::Unclosed { delimiter, .. } => format!("unclosed '{delimiter}'"),
            SimpleReason::Unexpected => {
                let found = found
                    .as_ref()
                    .map(|token| format!("unexpected '{token}'"))
                    .unwrap_or_else(|| "unexpected end of input".to_string());
                if expected.is_empty() {
                    found
                } else {
                    format!("{found}, expected {}", expected.join(", "))
                }
            }
        };

        Self {
            span: error.span(),
            expected,
            found,
            message,
        }
    }

    /// Report against the document, given the offset the parsed text started at.
    pub fn to_diagnostic(&self, base_offset: usize, index: &PositionIndex) -> Diagnostic {
        let span = base_offset + self.span.start..base_offset + self.span.end;
        Diagnostic::new(Severity::Warning, DiagnosticSource::Expression, self.message.clone())
            .at(index.span_to_range(span))
    }
}

#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub tree: Option<ExpressionTree>,
    pub diagnostics: Vec<ExpressionDiagnostic>,
}

impl ParseOutcome {
    fn from_result<O>(
        result: Result<O, Vec<ParserError>>,
        build: impl FnOnce(O) -> ExpressionTree,
    ) -> Self {
        match result {
            Ok(output) => {
                let mut tree = build(output);
                tree.ensure_relationships();
                Self {
                    tree: Some(tree),
                    diagnostics: Vec::new(),
                }
            }
            Err(errors) => Self {
                tree: None,
                diagnostics: errors
                    .into_iter()
                    .map(ExpressionDiagnostic::from_error)
                    .collect(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.tree.is_some()
    }

    pub fn into_result(self) -> Result<ExpressionTree, Vec<ExpressionDiagnostic>> {
        self.tree.ok_or(self.diagnostics)
    }

    /// Forward the diagnostics to a sink, positioned in the document.
    pub fn report(&self, base_offset: usize, index: &PositionIndex, sink: &mut dyn DiagnosticSink) {
        for diagnostic in &self.diagnostics {
            sink.emit(diagnostic.to_diagnostic(base_offset, index));
        }
    }
}

/// Parse a condition or a single expression.
pub fn parse(text: &str) -> ParseOutcome {
    let outcome =
        ParseOutcome::from_result(run(text, |rules| rules.root.clone()), ExpressionTree::from);
    tracing::trace!(
        text,
        parsed = outcome.is_success(),
        "parsed expression"
    );
    outcome
}

/// Parse a `;`-separated list of expressions.
pub fn parse_list(text: &str) -> ParseOutcome {
    let length = text.chars().count();
    ParseOutcome::from_result(run(text, |rules| rules.list.clone()), |parts| {
        ExpressionTree::from(build_list(parts, length))
    })
}

/// Split raw text on `;`. Never fails.
pub fn parse_simple_list(text: &str) -> ParseOutcome {
    ParseOutcome::from_result(run(text, |rules| rules.simple_list.clone()), |semicolons| {
        ExpressionTree::from(build_simple_list(text, &semicolons))
    })
}

pub fn parse_as(text: &str, syntax: ExpressionSyntax) -> ParseOutcome {
    match syntax {
        ExpressionSyntax::Root => parse(text),
        ExpressionSyntax::List => parse_list(text),
        ExpressionSyntax::SimpleList => parse_simple_list(text),
    }
}
