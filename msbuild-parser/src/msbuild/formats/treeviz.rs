//! Treeviz formatter for expression trees and semantic models
//!
//! One line per node, nesting drawn with box connectors, each line an icon and a label
//! truncated to 30 characters:
//!
//! ```text
//! ≟ ==
//! ├─ " QuotedString
//! │ └─ $ Evaluate
//! │   └─ ◦ Configuration
//! └─ " QuotedString
//!   └─ ¶ "Debug"
//! ```
//!
//! Icons
//!     Expressions:
//!         Symbol: ◦
//!         Number: #
//!         QuotedString: "
//!         QuotedStringLiteral: '
//!         StringContent: ¶
//!         Evaluate: $
//!         ItemGroup: @
//!         ItemGroupTransform: ⇒
//!         ItemMetadata: %
//!         FunctionCall: ƒ
//!         Comparison: ≟
//!         Logical: ∧ ∨ ¬
//!         List, SimpleList: ☰
//!         SimpleListItem: •
//!         ListSeparator: ;
//!         EmptyListItem: ∅
//!     Semantic model:
//!         Element: ◇
//!         Attribute: @
//!         Text: ¶
//!         Whitespace: ␣
//!
//! Params: `show-spans` appends expression spans, `show-ranges` appends node ranges.

use std::borrow::Cow;
use std::collections::HashMap;
use std::rc::Rc;

use crate::msbuild::expressions::{
    ComparisonKind, ExprKind, ExpressionNode, ExpressionTree, FunctionKind, LogicalOperator,
};
use crate::msbuild::semantic::{ElementShape, SemanticModel, XsNode, XsNodeData};

const LABEL_WIDTH: usize = 30;

/// Label clipped to [`LABEL_WIDTH`] characters, with `...` marking the cut.
fn clip(label: &str) -> Cow<'_, str> {
    match label.char_indices().nth(LABEL_WIDTH) {
        Some((cut, _)) => Cow::Owned(format!("{}...", &label[..cut])),
        None => Cow::Borrowed(label),
    }
}

fn line(icon: &str, label: &str, detail: Option<String>) -> String {
    match detail {
        Some(detail) => format!("{} {} {}", icon, clip(label), detail),
        None => format!("{} {}", icon, clip(label)),
    }
}

fn flag(params: &HashMap<String, String>, name: &str) -> bool {
    params.get(name).map(|v| v != "false").unwrap_or(false)
}

/// Lay out the tree under `root`, one line per node, depth first.
///
/// Walks with an explicit stack so arbitrarily deep trees render without recursion. Each
/// entry carries the connector prefix of its line; `None` marks the unprefixed top line.
fn layout<N: Copy>(
    root: N,
    children: impl Fn(N) -> Vec<N>,
    render: impl Fn(N) -> String,
    output: &mut String,
) {
    let mut pending: Vec<(N, Rc<str>, Option<bool>)> = vec![(root, Rc::from(""), None)];
    while let Some((node, prefix, last)) = pending.pop() {
        let child_prefix: Rc<str> = match last {
            None => {
                output.push_str(&render(node));
                prefix
            }
            Some(is_last) => {
                let connector = if is_last { "└─" } else { "├─" };
                output.push_str(&format!("{}{} {}", prefix, connector, render(node)));
                Rc::from(format!("{}{}", prefix, if is_last { "  " } else { "│ " }))
            }
        };
        output.push('\n');

        let children = children(node);
        let count = children.len();
        for (index, child) in children.into_iter().enumerate().rev() {
            pending.push((child, Rc::clone(&child_prefix), Some(index + 1 == count)));
        }
    }
}

fn expression_icon(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::Symbol { .. } => "◦",
        ExprKind::Number { .. } => "#",
        ExprKind::QuotedString => "\"",
        ExprKind::QuotedStringLiteral { .. } => "'",
        ExprKind::StringContent { .. } => "¶",
        ExprKind::Evaluate => "$",
        ExprKind::ItemGroup => "@",
        ExprKind::ItemGroupTransform => "⇒",
        ExprKind::ItemMetadata => "%",
        ExprKind::FunctionCall { .. } => "ƒ",
        ExprKind::Comparison { .. } => "≟",
        ExprKind::Logical { operator } => match operator {
            LogicalOperator::And => "∧",
            LogicalOperator::Or => "∨",
            LogicalOperator::Not => "¬",
        },
        ExprKind::List | ExprKind::SimpleList => "☰",
        ExprKind::SimpleListItem { .. } => "•",
        ExprKind::ListSeparator { .. } => ";",
        ExprKind::EmptyListItem => "∅",
    }
}

fn expression_label(node: &ExpressionNode) -> String {
    match &node.kind {
        ExprKind::Symbol { name, namespace } if namespace.is_empty() => name.clone(),
        ExprKind::Symbol { name, namespace } => format!("{namespace}.{name}"),
        ExprKind::QuotedStringLiteral { content } | ExprKind::StringContent { content } => {
            format!("{content:?}")
        }
        ExprKind::SimpleListItem { value } => format!("{value:?}"),
        ExprKind::Number { value } => value.clone(),
        ExprKind::FunctionCall { name, function } => match function {
            FunctionKind::Global => format!("{name}()"),
            FunctionKind::InstanceMethod => format!(".{name}()"),
            FunctionKind::StaticMethod => format!("::{name}()"),
        },
        ExprKind::Comparison { comparison } => match comparison {
            ComparisonKind::Equality => "==".to_string(),
            ComparisonKind::Inequality => "!=".to_string(),
        },
        ExprKind::Logical { operator } => format!("{operator:?}"),
        _ => node.expression_kind().to_string(),
    }
}

pub fn expression_to_treeviz(tree: &ExpressionTree) -> String {
    expression_to_treeviz_with_params(tree, &HashMap::new())
}

pub fn expression_to_treeviz_with_params(
    tree: &ExpressionTree,
    params: &HashMap<String, String>,
) -> String {
    let show_spans = flag(params, "show-spans");
    let mut output = String::new();
    layout(
        tree.root(),
        |node| tree.children(node).collect(),
        |node: &ExpressionNode| {
            line(
                expression_icon(&node.kind),
                &expression_label(node),
                show_spans.then(|| format!("@{}..{}", node.start, node.end())),
            )
        },
        &mut output,
    );
    output
}

fn node_icon(node: &XsNode) -> &'static str {
    match node.data {
        XsNodeData::Element(_) => "◇",
        XsNodeData::Attribute(_) => "@",
        XsNodeData::Text { .. } => "¶",
        XsNodeData::Whitespace { .. } => "␣",
    }
}

fn node_label(node: &XsNode) -> String {
    match &node.data {
        XsNodeData::Element(element) => match element.shape {
            ElementShape::Empty => format!("<{}/>", element.name),
            ElementShape::WithContent { .. } => format!("<{}>", element.name),
            ElementShape::Invalid { .. } => format!("<{}> (invalid)", element.name),
        },
        XsNodeData::Attribute(attribute) => format!("{}={:?}", attribute.name, attribute.value),
        XsNodeData::Text { text } | XsNodeData::Whitespace { text } => format!("{text:?}"),
    }
}

pub fn model_to_treeviz(model: &SemanticModel) -> String {
    model_to_treeviz_with_params(model, &HashMap::new())
}

pub fn model_to_treeviz_with_params(
    model: &SemanticModel,
    params: &HashMap<String, String>,
) -> String {
    let show_ranges = flag(params, "show-ranges");
    let mut output = String::new();
    for root in model.roots() {
        layout(
            root,
            |node| model.attributes(node).chain(model.content(node)).collect(),
            |node: &XsNode| {
                line(
                    node_icon(node),
                    &node_label(node),
                    show_ranges.then(|| node.range.to_string()),
                )
            },
            &mut output,
        );
    }
    output
}
