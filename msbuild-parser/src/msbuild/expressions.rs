//! MSBuild expressions
//!
//! The mini-language embedded in attribute values and element text: property references
//! `$(...)`, item references `@(...)` with optional transforms, metadata references `%(...)`,
//! function calls, comparisons, `And`/`Or`/`Not`, and `;`-separated lists.
//!
//! ## Pipeline
//!
//! text -> [`lexer::tokenize`] -> [`grammar::Rules`] -> [`ast::Expr`] -> [`tree::ExpressionTree`]
//!
//! All offsets are character offsets relative to the parsed text. Use
//! [`ExpressionTree::range_of`] with the document offset of the text to get document ranges.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use msbuild_parser::msbuild::expressions::parse;
//!
//! let tree = parse("'$(Configuration)' == 'Debug'").tree.unwrap();
//! let node = tree.find_deepest_node_at(4).unwrap();
//! ```

pub mod api;
pub mod ast;
pub mod grammar;
pub mod lexer;
mod lists;
pub mod tree;

pub use api::{
    parse, parse_as, parse_list, parse_simple_list, ExpressionDiagnostic, ExpressionSyntax,
    ParseOutcome,
};
pub use ast::{
    ComparisonKind, Expr, ExprKind, ExpressionKind, FunctionKind, LogicalOperator,
};
pub use grammar::Rules;
pub use lexer::ExprToken;
pub use tree::{ExpressionNode, ExpressionTree, NodeId};
