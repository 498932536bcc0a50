//! Expression tree arena
//!
//! [`ExpressionTree`] owns every node of one parsed expression in a flat vector, in preorder.
//! Nodes refer to each other by [`NodeId`]; parent and sibling links are back-references
//! into the same arena, written once by [`ExpressionTree::ensure_relationships`].
//!
//! Offsets are character offsets relative to the parsed substring. [`ExpressionTree::range_of`]
//! maps a node onto the enclosing document once the substring's own offset is known.

use serde::Serialize;
use std::ops;

use super::ast::{Expr, ExprKind, ExpressionKind, LogicalOperator};
use crate::msbuild::text::{PositionError, PositionIndex, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpressionNode {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: ExprKind,
    pub start: usize,
    pub length: usize,
    pub children: Vec<NodeId>,
    #[serde(skip)]
    pub parent: Option<NodeId>,
    #[serde(skip)]
    pub previous_sibling: Option<NodeId>,
    #[serde(skip)]
    pub next_sibling: Option<NodeId>,
}

impl ExpressionNode {
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn span(&self) -> ops::Range<usize> {
        self.start..self.end()
    }

    pub fn expression_kind(&self) -> ExpressionKind {
        self.kind.kind()
    }

    /// Zero-length placeholders (empty list slots, a metadata name not typed yet).
    pub fn is_virtual(&self) -> bool {
        self.length == 0
    }

    /// Symbol and function names.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Symbol { name, .. } | ExprKind::FunctionCall { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Does this node claim `offset` during a deepest-node descent?
    fn claims(&self, offset: usize) -> bool {
        if self.length == 0 {
            offset == self.start
        } else {
            self.start <= offset && offset < self.end()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpressionTree {
    nodes: Vec<ExpressionNode>,
    #[serde(skip)]
    linked: bool,
}

impl From<Expr> for ExpressionTree {
    /// Flatten an owned expression into the arena in preorder, using an explicit stack so
    /// deeply nested input cannot exhaust the call stack.
    fn from(root: Expr) -> Self {
        let mut nodes: Vec<ExpressionNode> = Vec::new();
        let mut pending: Vec<(Expr, Option<NodeId>)> = vec![(root, None)];
        while let Some((expr, parent)) = pending.pop() {
            let Expr {
                kind,
                span,
                children,
            } = expr;
            let id = NodeId(nodes.len());
            nodes.push(ExpressionNode {
                id,
                kind,
                start: span.start,
                length: span.end.saturating_sub(span.start),
                children: Vec::with_capacity(children.len()),
                parent: None,
                previous_sibling: None,
                next_sibling: None,
            });
            if let Some(parent) = parent {
                nodes[parent.0].children.push(id);
            }
            pending.extend(children.into_iter().rev().map(|child| (child, Some(id))));
        }
        Self {
            nodes,
            linked: false,
        }
    }
}

impl ExpressionTree {
    /// Wire parent and sibling links. Each container's child list is visited once; calling
    /// this again is a no-op.
    pub fn ensure_relationships(&mut self) -> &mut Self {
        if self.linked {
            return self;
        }
        let mut pending = vec![NodeId(0)];
        while let Some(parent) = pending.pop() {
            let children = self.nodes[parent.0].children.clone();
            for (position, &child) in children.iter().enumerate() {
                debug_assert!(
                    self.nodes[parent.0].start <= self.nodes[child.0].start
                        && self.nodes[child.0].end() <= self.nodes[parent.0].end(),
                    "child span escapes its parent"
                );
                let node = &mut self.nodes[child.0];
                node.parent = Some(parent);
                node.previous_sibling = position.checked_sub(1).map(|index| children[index]);
                node.next_sibling = children.get(position + 1).copied();
            }
            pending.extend(children);
        }
        self.linked = true;
        self
    }

    pub fn has_relationships(&self) -> bool {
        self.linked
    }

    pub fn root(&self) -> &ExpressionNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> &ExpressionNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&ExpressionNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in preorder.
    pub fn iter(&self) -> impl Iterator<Item = &ExpressionNode> {
        self.nodes.iter()
    }

    pub fn children<'t>(
        &'t self,
        node: &'t ExpressionNode,
    ) -> impl DoubleEndedIterator<Item = &'t ExpressionNode> + ExactSizeIterator + 't {
        node.children.iter().map(|&id| &self.nodes[id.0])
    }

    pub fn child(&self, node: &ExpressionNode, index: usize) -> Option<&ExpressionNode> {
        node.children.get(index).map(|&id| &self.nodes[id.0])
    }

    pub fn parent(&self, node: &ExpressionNode) -> Option<&ExpressionNode> {
        node.parent.map(|id| &self.nodes[id.0])
    }

    pub fn previous_sibling(&self, node: &ExpressionNode) -> Option<&ExpressionNode> {
        node.previous_sibling.map(|id| &self.nodes[id.0])
    }

    pub fn next_sibling(&self, node: &ExpressionNode) -> Option<&ExpressionNode> {
        node.next_sibling.map(|id| &self.nodes[id.0])
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors<'t>(
        &'t self,
        node: &'t ExpressionNode,
    ) -> impl Iterator<Item = &'t ExpressionNode> + 't {
        std::iter::successors(self.parent(node), move |current| self.parent(current))
    }

    /// Every node below `node`, in preorder.
    pub fn descendants<'t>(&'t self, node: &'t ExpressionNode) -> Vec<&'t ExpressionNode> {
        let mut found = Vec::new();
        let mut pending: Vec<&ExpressionNode> = self.children(node).rev().collect();
        while let Some(current) = pending.pop() {
            found.push(current);
            pending.extend(self.children(current).rev());
        }
        found
    }

    /// The innermost node at `offset`.
    ///
    /// The root covers its span with both ends inclusive, so a cursor right after the
    /// expression still lands on it. Below the root a child covers `[start, end)`, and a
    /// zero-length child covers only its own start. The first child in position order that
    /// covers the offset is descended into, which settles shared boundaries in favour of the
    /// child that starts there.
    pub fn find_deepest_node_at(&self, offset: usize) -> Option<&ExpressionNode> {
        let mut current = self.root();
        if offset < current.start || offset > current.end() {
            return None;
        }
        while let Some(child) = self.children(current).find(|child| child.claims(offset)) {
            current = child;
        }
        Some(current)
    }

    /// The list item a cursor at `offset` belongs to.
    ///
    /// On a separator, offsets up to and including its `;` belong to the item before it and
    /// offsets after the `;` to the item after it.
    pub fn find_item_at(&self, offset: usize) -> Option<&ExpressionNode> {
        let list = self.root();
        if !matches!(list.kind, ExprKind::List | ExprKind::SimpleList) {
            return None;
        }
        let children: Vec<&ExpressionNode> = self.children(list).collect();
        let index = children.iter().rposition(|child| child.start <= offset)?;
        let candidate = children[index];
        match candidate.kind {
            ExprKind::ListSeparator { separator_offset } => {
                let item = if offset <= candidate.start + separator_offset {
                    children[..index].iter().rev().find(|child| is_list_item(child))
                } else {
                    children[index + 1..].iter().find(|child| is_list_item(child))
                };
                item.copied()
            }
            _ => Some(candidate),
        }
    }

    /// List items, without separators.
    pub fn list_items(&self) -> impl Iterator<Item = &ExpressionNode> {
        self.children(self.root()).filter(|child| is_list_item(child))
    }

    /// Whether a node is complete enough to act on. Partial constructs parse so that
    /// completion can see them, but they are reported here.
    pub fn is_valid(&self, node: &ExpressionNode) -> bool {
        match node.kind {
            ExprKind::Evaluate => node.children.len() == 1,
            ExprKind::ItemGroup => self
                .item_name(node)
                .is_some_and(|name| !name.trim().is_empty()),
            ExprKind::ItemGroupTransform => node.children.len() >= 2,
            ExprKind::ItemMetadata => self
                .metadata_name(node)
                .is_some_and(|name| !name.trim().is_empty()),
            _ => true,
        }
    }

    /// The item type named by an item group or transform.
    pub fn item_name(&self, node: &ExpressionNode) -> Option<&str> {
        match node.kind {
            ExprKind::ItemGroup | ExprKind::ItemGroupTransform => {
                self.child(node, 0).and_then(ExpressionNode::name)
            }
            _ => None,
        }
    }

    pub fn transform_body(&self, node: &ExpressionNode) -> Option<&ExpressionNode> {
        match node.kind {
            ExprKind::ItemGroupTransform => self.child(node, 1),
            _ => None,
        }
    }

    pub fn transform_separator(&self, node: &ExpressionNode) -> Option<&str> {
        match node.kind {
            ExprKind::ItemGroupTransform => {
                self.child(node, 2).and_then(|separator| match &separator.kind {
                    ExprKind::QuotedStringLiteral { content } => Some(content.as_str()),
                    _ => None,
                })
            }
            _ => None,
        }
    }

    /// The metadata name of `%(Name)` or `%(Type.Name)`.
    pub fn metadata_name(&self, node: &ExpressionNode) -> Option<&str> {
        match node.kind {
            ExprKind::ItemMetadata => {
                let last = node.children.len().checked_sub(1)?;
                self.child(node, last).and_then(ExpressionNode::name)
            }
            _ => None,
        }
    }

    /// The item type qualifying `%(Type.Name)`.
    pub fn metadata_item_type(&self, node: &ExpressionNode) -> Option<&str> {
        match node.kind {
            ExprKind::ItemMetadata if node.children.len() == 2 => {
                self.child(node, 0).and_then(ExpressionNode::name)
            }
            _ => None,
        }
    }

    /// The decoded text of a quoted string, without its embedded references.
    pub fn string_content(&self, node: &ExpressionNode) -> Option<String> {
        match &node.kind {
            ExprKind::QuotedString => Some(
                self.children(node)
                    .filter_map(|child| match &child.kind {
                        ExprKind::StringContent { content } => Some(content.as_str()),
                        _ => None,
                    })
                    .collect(),
            ),
            ExprKind::QuotedStringLiteral { content } | ExprKind::StringContent { content } => {
                Some(content.clone())
            }
            _ => None,
        }
    }

    /// The property references embedded in a quoted string.
    pub fn evaluations<'t>(
        &'t self,
        node: &'t ExpressionNode,
    ) -> impl Iterator<Item = &'t ExpressionNode> + 't {
        self.children(node)
            .filter(|child| matches!(child.kind, ExprKind::Evaluate))
    }

    /// The receiver of an instance or static call.
    pub fn function_target(&self, node: &ExpressionNode) -> Option<&ExpressionNode> {
        match &node.kind {
            ExprKind::FunctionCall { function, .. } if function.has_target() => self.child(node, 0),
            _ => None,
        }
    }

    pub fn function_arguments<'t>(&'t self, node: &'t ExpressionNode) -> Vec<&'t ExpressionNode> {
        match &node.kind {
            ExprKind::FunctionCall { function, .. } => {
                let skip = usize::from(function.has_target());
                self.children(node).skip(skip).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Left operand of a comparison or binary logical node, the operand of `Not`.
    pub fn left(&self, node: &ExpressionNode) -> Option<&ExpressionNode> {
        match node.kind {
            ExprKind::Comparison { .. } | ExprKind::Logical { .. } => self.child(node, 0),
            _ => None,
        }
    }

    pub fn right(&self, node: &ExpressionNode) -> Option<&ExpressionNode> {
        match node.kind {
            ExprKind::Comparison { .. }
            | ExprKind::Logical {
                operator: LogicalOperator::And | LogicalOperator::Or,
            } => self.child(node, 1),
            _ => None,
        }
    }

    /// Map a node onto the document, given the document offset the parsed text started at.
    pub fn range_of(
        &self,
        node: &ExpressionNode,
        base_offset: usize,
        index: &PositionIndex,
    ) -> Result<Range, PositionError> {
        let start = index.to_position(base_offset + node.start)?;
        let end = index.to_position(base_offset + node.end())?;
        Range::try_new(start, end)
    }
}

fn is_list_item(node: &ExpressionNode) -> bool {
    !matches!(node.kind, ExprKind::ListSeparator { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msbuild::expressions::ast::ExprKind;

    fn sample() -> ExpressionTree {
        // 'A' == $(B)
        let left = Expr::node(
            ExprKind::QuotedString,
            0..3,
            vec![Expr::leaf(
                ExprKind::StringContent {
                    content: "A".into(),
                },
                1..2,
            )],
        );
        let right = Expr::node(
            ExprKind::Evaluate,
            7..11,
            vec![Expr::leaf(ExprKind::symbol("B"), 9..10)],
        );
        let root = Expr::node(
            ExprKind::Comparison {
                comparison: crate::msbuild::expressions::ast::ComparisonKind::Equality,
            },
            0..11,
            vec![left, right],
        );
        let mut tree = ExpressionTree::from(root);
        tree.ensure_relationships();
        tree
    }

    #[test]
    fn test_lowering_is_preorder() {
        let tree = sample();
        let kinds: Vec<_> = tree.iter().map(ExpressionNode::expression_kind).collect();

        assert_eq!(
            kinds,
            vec![
                ExpressionKind::Comparison,
                ExpressionKind::QuotedString,
                ExpressionKind::StringContent,
                ExpressionKind::Evaluate,
                ExpressionKind::Symbol,
            ]
        );
    }

    #[test]
    fn test_relationships_link_parents_and_siblings() {
        let tree = sample();
        let left = tree.left(tree.root()).unwrap();
        let right = tree.right(tree.root()).unwrap();

        assert_eq!(tree.parent(left).map(|n| n.id), Some(tree.root().id));
        assert_eq!(tree.next_sibling(left).map(|n| n.id), Some(right.id));
        assert_eq!(tree.previous_sibling(right).map(|n| n.id), Some(left.id));
        assert!(tree.previous_sibling(left).is_none());
        assert!(tree.parent(tree.root()).is_none());
    }

    #[test]
    fn test_ensure_relationships_is_idempotent() {
        let mut tree = sample();
        let before = tree.clone();
        tree.ensure_relationships();

        assert!(tree.iter().eq(before.iter()));
    }

    #[test]
    fn test_deepest_node_descends_to_leaf() {
        let tree = sample();

        assert_eq!(tree.find_deepest_node_at(9).unwrap().name(), Some("B"));
        assert_eq!(
            tree.find_deepest_node_at(5).unwrap().expression_kind(),
            ExpressionKind::Comparison
        );
        assert_eq!(
            tree.find_deepest_node_at(11).unwrap().expression_kind(),
            ExpressionKind::Comparison
        );
        assert!(tree.find_deepest_node_at(12).is_none());
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let tree = sample();
        let symbol = tree.find_deepest_node_at(9).unwrap();
        let kinds: Vec<_> = tree
            .ancestors(symbol)
            .map(ExpressionNode::expression_kind)
            .collect();

        assert_eq!(
            kinds,
            vec![ExpressionKind::Evaluate, ExpressionKind::Comparison]
        );
        assert_eq!(tree.descendants(tree.root()).len(), 4);
    }

    #[test]
    fn test_metadata_name_is_the_last_child() {
        let metadata = Expr::node(
            ExprKind::ItemMetadata,
            0..17,
            vec![
                Expr::leaf(ExprKind::symbol("Compile"), 2..9),
                Expr::leaf(ExprKind::symbol("Link"), 10..14),
            ],
        );
        let tree = ExpressionTree::from(metadata);

        assert_eq!(tree.metadata_name(tree.root()), Some("Link"));

        let empty = ExpressionTree::from(Expr::leaf(ExprKind::ItemMetadata, 0..3));
        assert_eq!(empty.metadata_name(empty.root()), None);
    }

    #[test]
    fn test_deep_chains_lower_on_a_small_stack() {
        let depth = 100_000;
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || {
                let mut expr = Expr::leaf(ExprKind::symbol("A"), depth..depth + 1);
                for start in (0..depth).rev() {
                    expr = Expr::node(
                        ExprKind::Logical {
                            operator: crate::msbuild::expressions::ast::LogicalOperator::Not,
                        },
                        start..depth + 1,
                        vec![expr],
                    );
                }
                let mut tree = ExpressionTree::from(expr);
                tree.ensure_relationships();

                let leaf = tree.find_deepest_node_at(depth).unwrap();
                (tree.len(), leaf.name().map(str::to_owned), tree.ancestors(leaf).count())
            })
            .unwrap();

        let (len, name, ancestors) = handle.join().unwrap();
        assert_eq!(len, depth + 1);
        assert_eq!(name.as_deref(), Some("A"));
        assert_eq!(ancestors, depth);
    }
}
