//! Expression node kinds and the owned node grammar rules produce
//!
//! Grammar rules build [`Expr`] values: an owned tree where every node already carries its
//! character span. Spans are attached by the rule that recognises the construct (via
//! `map_with_span`), so no node type needs a position setter. The owned tree is then moved
//! into an [`ExpressionTree`](super::tree::ExpressionTree) arena for navigation.

use serde::Serialize;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionKind {
    /// `Name(args)`
    Global,
    /// `Target.Name(args)`
    InstanceMethod,
    /// `[Type]::Name(args)`
    StaticMethod,
}

impl FunctionKind {
    /// Instance and static calls carry their receiver as the first child.
    pub fn has_target(self) -> bool {
        !matches!(self, FunctionKind::Global)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonKind {
    Equality,
    Inequality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

/// Node payload. Structural children live on the node itself, not in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ExprKind {
    /// An identifier, or a `[Namespace.Type]` reference when `namespace` is not empty.
    Symbol { name: String, namespace: String },
    /// A numeric function argument such as `1`, `-2` or `0.5`, kept as written.
    Number { value: String },
    /// `'...'` with `StringContent` runs and embedded references as children.
    QuotedString,
    /// `'...'` without interpolation (transform separators).
    QuotedStringLiteral { content: String },
    /// A plain run inside a quoted string, escapes decoded.
    StringContent { content: String },
    /// `$(...)`, one child: a symbol or a function call.
    Evaluate,
    /// `@(Name)`, children: `[name?]`.
    ItemGroup,
    /// `@(Name->'body', 'separator')`, children: `[name, body?, separator?]`.
    ItemGroupTransform,
    /// `%(ItemType.Name)`, children: `[item_type?, name]`, or none for `%()`.
    ItemMetadata,
    /// Children: `[target?, arguments...]`; global calls have no target.
    FunctionCall { name: String, function: FunctionKind },
    Comparison { comparison: ComparisonKind },
    /// `Not` has one child, `And`/`Or` have two.
    Logical { operator: LogicalOperator },
    List,
    SimpleList,
    SimpleListItem { value: String },
    /// `;` plus any whitespace around it. `separator_offset` locates the `;` within the node.
    ListSeparator { separator_offset: usize },
    /// A zero-length placeholder for an empty list slot.
    EmptyListItem,
}

/// Fieldless discriminant of [`ExprKind`], handy for tables and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ExpressionKind {
    Symbol,
    Number,
    QuotedString,
    QuotedStringLiteral,
    StringContent,
    Evaluate,
    ItemGroup,
    ItemGroupTransform,
    ItemMetadata,
    FunctionCall,
    Comparison,
    Logical,
    List,
    SimpleList,
    SimpleListItem,
    ListSeparator,
    EmptyListItem,
}

impl ExprKind {
    pub fn kind(&self) -> ExpressionKind {
        match self {
            ExprKind::Symbol { .. } => ExpressionKind::Symbol,
            ExprKind::Number { .. } => ExpressionKind::Number,
            ExprKind::QuotedString => ExpressionKind::QuotedString,
            ExprKind::QuotedStringLiteral { .. } => ExpressionKind::QuotedStringLiteral,
            ExprKind::StringContent { .. } => ExpressionKind::StringContent,
            ExprKind::Evaluate => ExpressionKind::Evaluate,
            ExprKind::ItemGroup => ExpressionKind::ItemGroup,
            ExprKind::ItemGroupTransform => ExpressionKind::ItemGroupTransform,
            ExprKind::ItemMetadata => ExpressionKind::ItemMetadata,
            ExprKind::FunctionCall { .. } => ExpressionKind::FunctionCall,
            ExprKind::Comparison { .. } => ExpressionKind::Comparison,
            ExprKind::Logical { .. } => ExpressionKind::Logical,
            ExprKind::List => ExpressionKind::List,
            ExprKind::SimpleList => ExpressionKind::SimpleList,
            ExprKind::SimpleListItem { .. } => ExpressionKind::SimpleListItem,
            ExprKind::ListSeparator { .. } => ExpressionKind::ListSeparator,
            ExprKind::EmptyListItem => ExpressionKind::EmptyListItem,
        }
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        ExprKind::Symbol {
            name: name.into(),
            namespace: String::new(),
        }
    }
}

impl fmt::Display for ExpressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An owned expression node with a character span relative to the parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Range<usize>,
    pub children: Vec<Expr>,
}

impl Expr {
    pub fn leaf(kind: ExprKind, span: Range<usize>) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    pub fn node(kind: ExprKind, span: Range<usize>, children: Vec<Expr>) -> Self {
        Self {
            kind,
            span,
            children,
        }
    }

    /// A binary logical node spanning both operands.
    pub fn logical(operator: LogicalOperator, left: Expr, right: Expr) -> Self {
        let span = left.span.start..right.span.end;
        Self::node(ExprKind::Logical { operator }, span, vec![left, right])
    }

    /// The same node re-spanned, used when parentheses are folded into their contents.
    pub fn with_span(self, span: Range<usize>) -> Self {
        Self { span, ..self }
    }
}
