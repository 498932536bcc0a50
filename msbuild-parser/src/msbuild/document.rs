//! One parse snapshot of a project file
//!
//! [`ProjectDocument::parse`] runs the whole pipeline once: position index, XML reader,
//! semantic model, lookup index. The snapshot is immutable; re-parse to pick up edits.

use crate::msbuild::diagnostics::{Diagnostic, DiagnosticSink, NullSink, Tee};
use crate::msbuild::expressions::{
    parse, parse_list, parse_simple_list, ExpressionDiagnostic, ExpressionNode, ExpressionSyntax,
    ExpressionTree, NodeId,
};
use crate::msbuild::lookup::PositionalLookup;
use crate::msbuild::semantic::{SemanticModel, XmlLocation, XmlLocator, XsNode, XsNodeData, XsNodeId};
use crate::msbuild::text::{Position, PositionError, PositionIndex, Range};
use crate::msbuild::xml::{read_document, XmlDocument};

#[derive(Debug, Clone)]
pub struct ProjectDocument {
    index: PositionIndex,
    xml: XmlDocument,
    model: SemanticModel,
    lookup: PositionalLookup<XsNodeId>,
    diagnostics: Vec<Diagnostic>,
}

/// The expression under a cursor.
#[derive(Debug, Clone)]
pub struct ExpressionAtPosition {
    /// The attribute or text node the expression was read from.
    pub source: XsNodeId,
    /// Document offset of the expression text's first character.
    pub base_offset: usize,
    /// The rule that produced `tree`.
    pub syntax: ExpressionSyntax,
    pub tree: Option<ExpressionTree>,
    pub diagnostics: Vec<ExpressionDiagnostic>,
    /// Deepest expression node at the cursor.
    pub node: Option<NodeId>,
}

impl ExpressionAtPosition {
    pub fn node(&self) -> Option<&ExpressionNode> {
        let tree = self.tree.as_ref()?;
        self.node.map(|id| tree.node(id))
    }
}

/// Keeps warnings and errors, never asks for traces.
#[derive(Default)]
struct Collected(Vec<Diagnostic>);

impl DiagnosticSink for Collected {
    fn emit(&mut self, diagnostic: Diagnostic) {
        if !diagnostic.is_trace() {
            self.0.push(diagnostic);
        }
    }

    fn wants_trace(&self) -> bool {
        false
    }
}

impl ProjectDocument {
    pub fn parse(text: &str) -> Self {
        Self::parse_with_sink(text, &mut NullSink)
    }

    /// Parse while also forwarding diagnostics, traces included, to `sink`.
    pub fn parse_with_sink(text: &str, sink: &mut dyn DiagnosticSink) -> Self {
        let mut collected = Collected::default();
        let index = PositionIndex::new(text);
        let xml = {
            let mut tee = Tee {
                first: &mut collected,
                second: sink,
            };
            read_document(text, &index, &mut tee)
        };
        let model = SemanticModel::build(&xml, &index);
        let lookup = model.lookup_index();
        tracing::debug!(
            elements = xml.elements().len(),
            nodes = model.len(),
            diagnostics = collected.0.len(),
            "parsed project document"
        );
        Self {
            index,
            xml,
            model,
            lookup,
            diagnostics: collected.0,
        }
    }

    pub fn text(&self) -> &str {
        self.index.text()
    }

    pub fn index(&self) -> &PositionIndex {
        &self.index
    }

    pub fn xml(&self) -> &XmlDocument {
        &self.xml
    }

    pub fn model(&self) -> &SemanticModel {
        &self.model
    }

    pub fn lookup(&self) -> &PositionalLookup<XsNodeId> {
        &self.lookup
    }

    /// Reader diagnostics, traces excluded.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn locator(&self) -> XmlLocator<'_> {
        XmlLocator::with_lookup(&self.model, &self.index, &self.lookup)
    }

    /// The most specific node at `position`.
    pub fn node_at(&self, position: Position) -> Option<&XsNode> {
        self.lookup
            .find(position)
            .map(|&id| self.model.node(id))
    }

    pub fn inspect(&self, position: Position) -> Option<XmlLocation<'_>> {
        self.locator().inspect(position)
    }

    /// Parse the attribute value or text under `position` as an expression.
    ///
    /// `Condition` attributes are conditions. Anything else is read as a list, and as a
    /// simple list when it is not a valid expression list.
    pub fn expression_at(&self, position: Position) -> Option<ExpressionAtPosition> {
        let location = self.inspect(position)?;
        let node = location.node;
        let (span, syntax) = match &node.data {
            XsNodeData::Attribute(attribute) if location.is_attribute_value() => {
                let syntax = if attribute.name.eq_ignore_ascii_case("Condition") {
                    ExpressionSyntax::Root
                } else {
                    ExpressionSyntax::List
                };
                (attribute.value_span.clone(), syntax)
            }
            XsNodeData::Text { .. } => (node.span.clone(), ExpressionSyntax::List),
            _ => return None,
        };

        let text = self.index.slice(span.clone());
        let (syntax, outcome) = match syntax {
            ExpressionSyntax::Root => (syntax, parse(text)),
            _ => {
                let outcome = parse_list(text);
                if outcome.is_success() {
                    (ExpressionSyntax::List, outcome)
                } else {
                    (ExpressionSyntax::SimpleList, parse_simple_list(text))
                }
            }
        };

        let relative = location.offset.saturating_sub(span.start);
        let expression = outcome
            .tree
            .as_ref()
            .and_then(|tree| tree.find_deepest_node_at(relative))
            .map(|expression| expression.id);
        Some(ExpressionAtPosition {
            source: node.id,
            base_offset: span.start,
            syntax,
            tree: outcome.tree,
            diagnostics: outcome.diagnostics,
            node: expression,
        })
    }

    /// Document range of an expression node found by [`ProjectDocument::expression_at`].
    pub fn expression_range(
        &self,
        found: &ExpressionAtPosition,
        node: &ExpressionNode,
    ) -> Option<Result<Range, PositionError>> {
        let tree = found.tree.as_ref()?;
        Some(tree.range_of(node, found.base_offset, &self.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msbuild::diagnostics::Severity;
    use crate::msbuild::expressions::ExpressionKind;

    const PROJECT: &str = "<Project>\n  <PropertyGroup Condition=\"'$(Configuration)' == 'Debug'\">\n    <DefineConstants>DEBUG;TRACE</DefineConstants>\n  </PropertyGroup>\n</Project>\n";

    #[test]
    fn test_snapshot_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProjectDocument>();
    }

    #[test]
    fn test_condition_parses_as_root() {
        let document = ProjectDocument::parse(PROJECT);
        // On "Configuration"
        let found = document.expression_at(Position::one_based(2, 33)).unwrap();

        assert_eq!(found.syntax, ExpressionSyntax::Root);
        let node = found.node().unwrap();
        assert_eq!(node.expression_kind(), ExpressionKind::Symbol);
        assert_eq!(node.name(), Some("Configuration"));
        let range = document.expression_range(&found, node).unwrap().unwrap();
        assert_eq!(range.start, Position::one_based(2, 32));
    }

    #[test]
    fn test_text_parses_as_list() {
        let document = ProjectDocument::parse(PROJECT);
        let found = document.expression_at(Position::one_based(3, 28)).unwrap();

        assert_eq!(found.syntax, ExpressionSyntax::List);
        let tree = found.tree.as_ref().unwrap();
        assert_eq!(tree.list_items().count(), 2);
    }

    #[test]
    fn test_invalid_list_falls_back_to_simple_list() {
        let document = ProjectDocument::parse("<A>$(;x</A>");
        let found = document.expression_at(Position::one_based(1, 6)).unwrap();

        assert_eq!(found.syntax, ExpressionSyntax::SimpleList);
        assert!(found.tree.is_some());
    }

    #[test]
    fn test_no_expression_on_element_name() {
        let document = ProjectDocument::parse(PROJECT);

        assert!(document.expression_at(Position::one_based(1, 3)).is_none());
    }

    #[test]
    fn test_node_at_and_diagnostics() {
        let document = ProjectDocument::parse("<a>\n  <b>\n</a>");

        assert_eq!(
            document.node_at(Position::zero_based(1, 3)).map(XsNode::name),
            Some("b")
        );
        assert!(document
            .diagnostics()
            .iter()
            .any(|diagnostic| diagnostic.severity == Severity::Warning));
    }
}
