//! Building the semantic model from an XML syntax tree

use std::ops;

use super::nodes::{ElementShape, XsAttribute, XsElement, XsNode, XsNodeData, XsNodeId};
use super::path::XsPath;
use crate::msbuild::lookup::PositionalLookup;
use crate::msbuild::text::{PositionIndex, Range};
use crate::msbuild::xml::{XmlAttribute, XmlContent, XmlDocument, XmlElement, XmlText};

/// Every element, attribute, text and whitespace node of one document.
///
/// Nodes live in an arena in discovery order; [`SemanticModel::nodes`] yields them sorted
/// by range. Parent and sibling links are ids into the same arena.
#[derive(Debug, Clone, Default)]
pub struct SemanticModel {
    nodes: Vec<XsNode>,
    order: Vec<XsNodeId>,
    roots: Vec<XsNodeId>,
}

struct Builder<'a> {
    document: &'a XmlDocument,
    index: &'a PositionIndex,
    nodes: Vec<XsNode>,
}

/// An element whose content is still being walked.
struct Frame<'a> {
    id: XsNodeId,
    element: &'a XmlElement,
    /// The element node's span; content outside it is dropped.
    span: ops::Range<usize>,
    path: XsPath,
    next: usize,
    content: Vec<XsNodeId>,
}

impl SemanticModel {
    /// Classify every node of `document`. Pure: the same inputs always give the same model.
    pub fn build(document: &XmlDocument, index: &PositionIndex) -> Self {
        let mut builder = Builder {
            document,
            index,
            nodes: Vec::new(),
        };
        let root_path = XsPath::root();
        let roots = document
            .roots()
            .map(|root| builder.element_tree(root, &root_path))
            .collect();

        let mut model = Self {
            nodes: builder.nodes,
            order: Vec::new(),
            roots,
        };
        model.link_siblings();
        model.order = (0..model.nodes.len()).map(XsNodeId).collect();
        model
            .order
            .sort_by(|&a, &b| model.nodes[a.0].range.cmp(&model.nodes[b.0].range).then(a.cmp(&b)));
        tracing::debug!(nodes = model.nodes.len(), "built semantic model");
        model
    }

    fn link_siblings(&mut self) {
        let lists: Vec<Vec<XsNodeId>> = self
            .nodes
            .iter()
            .filter_map(XsNode::as_element)
            .flat_map(|element| [element.attributes.clone(), element.content.clone()])
            .collect();
        let roots = self.roots.clone();
        for list in lists.iter().chain(std::iter::once(&roots)) {
            for (position, &id) in list.iter().enumerate() {
                let node = &mut self.nodes[id.0];
                node.previous_sibling = position.checked_sub(1).map(|index| list[index]);
                node.next_sibling = list.get(position + 1).copied();
            }
        }
    }

    /// Nodes sorted by range; nodes with equal ranges keep discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = &XsNode> {
        self.order.iter().map(|&id| &self.nodes[id.0])
    }

    pub fn node(&self, id: XsNodeId) -> &XsNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: XsNodeId) -> Option<&XsNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = &XsNode> {
        self.roots.iter().map(|&id| &self.nodes[id.0])
    }

    /// The document element.
    pub fn root(&self) -> Option<&XsNode> {
        self.roots().next()
    }

    pub fn parent(&self, node: &XsNode) -> Option<&XsNode> {
        node.parent.map(|id| &self.nodes[id.0])
    }

    pub fn previous_sibling(&self, node: &XsNode) -> Option<&XsNode> {
        node.previous_sibling.map(|id| &self.nodes[id.0])
    }

    pub fn next_sibling(&self, node: &XsNode) -> Option<&XsNode> {
        node.next_sibling.map(|id| &self.nodes[id.0])
    }

    pub fn attributes<'m>(&'m self, node: &'m XsNode) -> impl Iterator<Item = &'m XsNode> + 'm {
        node.as_element()
            .into_iter()
            .flat_map(|element| element.attributes.iter())
            .map(|&id| &self.nodes[id.0])
    }

    /// Child elements, text and whitespace, in document order.
    pub fn content<'m>(&'m self, node: &'m XsNode) -> impl Iterator<Item = &'m XsNode> + 'm {
        node.as_element()
            .into_iter()
            .flat_map(|element| element.content.iter())
            .map(|&id| &self.nodes[id.0])
    }

    pub fn child_elements<'m>(
        &'m self,
        node: &'m XsNode,
    ) -> impl Iterator<Item = &'m XsNode> + 'm {
        self.content(node).filter(|child| child.as_element().is_some())
    }

    pub fn attribute<'m>(&'m self, node: &'m XsNode, name: &str) -> Option<&'m XsNode> {
        self.attributes(node).find(|attribute| attribute.name() == name)
    }

    pub fn has_attribute(&self, node: &XsNode, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// A lookup index over every node's range.
    pub fn lookup_index(&self) -> PositionalLookup<XsNodeId> {
        PositionalLookup::new(self.nodes.iter().map(|node| (node.range, node.id)))
    }
}

impl<'a> Builder<'a> {
    fn range(&self, span: ops::Range<usize>) -> Range {
        self.index.span_to_range(span)
    }

    fn push(
        &mut self,
        span: ops::Range<usize>,
        path: XsPath,
        parent: Option<XsNodeId>,
        data: XsNodeData,
    ) -> XsNodeId {
        let id = XsNodeId(self.nodes.len());
        self.nodes.push(XsNode {
            id,
            range: self.range(span.clone()),
            span,
            path,
            parent,
            previous_sibling: None,
            next_sibling: None,
            data,
        });
        id
    }

    /// Walk `root` and everything below it in document order, without recursion.
    fn element_tree(&mut self, root: &'a XmlElement, parent_path: &XsPath) -> XsNodeId {
        let document = self.document;
        let root_frame = self.open(root, None, parent_path);
        let root_id = root_frame.id;
        let mut stack = vec![root_frame];

        while let Some(frame) = stack.last_mut() {
            let element = frame.element;
            let Some(item) = element.content.get(frame.next) else {
                if let Some(done) = stack.pop() {
                    self.close(&done);
                    if let Some(parent) = stack.last_mut() {
                        parent.content.push(done.id);
                    }
                }
                continue;
            };
            frame.next += 1;
            match item {
                XmlContent::Element { id: child } => {
                    let child = document.element(*child);
                    let opened = self.open(child, Some(frame.id), &frame.path);
                    stack.push(opened);
                }
                XmlContent::Text(text) | XmlContent::Cdata(text) => {
                    if frame.span.start <= text.span.start && text.span.end <= frame.span.end {
                        let nodes = self.text(text, frame.id, &frame.path);
                        frame.content.extend(nodes);
                    }
                }
                XmlContent::Comment(_) => {}
            }
        }
        root_id
    }

    fn close(&mut self, frame: &Frame<'_>) {
        if let XsNodeData::Element(node) = &mut self.nodes[frame.id.0].data {
            node.content = frame.content.clone();
        }
    }

    /// Classify one element and push its node and attribute nodes.
    fn open(
        &mut self,
        element: &'a XmlElement,
        parent: Option<XsNodeId>,
        parent_path: &XsPath,
    ) -> Frame<'a> {
        let whole = self.range(element.span.clone());
        let blank = element.name.trim().is_empty();
        let opening = element
            .start_tag
            .clone()
            .map_or(whole, |span| self.range(span));
        let attributes_range = element
            .attributes_span
            .clone()
            .map_or(opening, |span| self.range(span));

        let (shape, span) = match &element.end_tag {
            _ if element.is_empty => {
                let shape = if blank {
                    ElementShape::Invalid { has_content: false }
                } else {
                    ElementShape::Empty
                };
                (shape, element.span.clone())
            }
            // Without an end tag the element is only as long as its start tag.
            None => (
                ElementShape::Invalid { has_content: false },
                element
                    .start_tag
                    .clone()
                    .unwrap_or_else(|| element.span.clone()),
            ),
            Some(end_tag) => {
                let closing = self.range(end_tag.clone());
                let content = if opening.end <= closing.start {
                    Range::new(opening.end, closing.start)
                } else {
                    whole
                };
                let shape = if blank || opening == whole || closing == whole || content == whole {
                    ElementShape::Invalid { has_content: true }
                } else {
                    ElementShape::WithContent {
                        opening_tag: opening,
                        content,
                        closing_tag: closing,
                    }
                };
                (shape, element.span.clone())
            }
        };

        let segment = if blank { "#invalid" } else { element.name.as_str() };
        let path = parent_path.join(segment);
        let id = self.push(
            span.clone(),
            path.clone(),
            parent,
            XsNodeData::Element(XsElement {
                name: element.name.clone(),
                prefix: element.prefix.clone(),
                shape,
                attributes_range,
                name_span: element.name_span.clone(),
                start_tag: element.start_tag.clone(),
                attributes_span: element.attributes_span.clone(),
                end_tag: element.end_tag.clone(),
                attributes: Vec::new(),
                content: Vec::new(),
            }),
        );

        let attributes: Vec<XsNodeId> = element
            .attributes
            .iter()
            .map(|attribute| self.attribute(attribute, id, &path))
            .collect();
        if let XsNodeData::Element(node) = &mut self.nodes[id.0].data {
            node.attributes = attributes;
        }

        Frame {
            id,
            element,
            span,
            path,
            next: 0,
            content: Vec::new(),
        }
    }

    fn attribute(&mut self, attribute: &XmlAttribute, parent: XsNodeId, parent_path: &XsPath) -> XsNodeId {
        let range = self.range(attribute.span.clone());
        let name_range = if attribute.name_span.is_empty() {
            range
        } else {
            self.range(attribute.name_span.clone())
        };
        let value_range = self.range(attribute.value_span.clone());
        let valid = !attribute.name.trim().is_empty() && name_range != range && value_range != range;

        self.push(
            attribute.span.clone(),
            parent_path.join(format!("@{}", attribute.name)),
            Some(parent),
            XsNodeData::Attribute(XsAttribute {
                name: attribute.name.clone(),
                value: attribute.value.clone(),
                name_range,
                value_range,
                name_span: attribute.name_span.clone(),
                value_span: attribute.value_span.clone(),
                valid,
            }),
        )
    }

    /// Split a run into leading whitespace, text and trailing whitespace nodes.
    fn text(&mut self, text: &XmlText, parent: XsNodeId, parent_path: &XsPath) -> Vec<XsNodeId> {
        let chars: Vec<char> = text.text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }
        let start = text.span.start;
        let leading = chars.iter().take_while(|c| c.is_whitespace()).count();
        if leading == chars.len() {
            let whitespace = self.whitespace(start..start + chars.len(), &chars, parent, parent_path);
            return vec![whitespace];
        }
        let trailing = chars.iter().rev().take_while(|c| c.is_whitespace()).count();
        let core_end = chars.len() - trailing;

        let mut nodes = Vec::with_capacity(3);
        if leading > 0 {
            nodes.push(self.whitespace(start..start + leading, &chars[..leading], parent, parent_path));
        }
        nodes.push(self.push(
            start + leading..start + core_end,
            parent_path.join("#text"),
            Some(parent),
            XsNodeData::Text {
                text: chars[leading..core_end].iter().collect(),
            },
        ));
        if trailing > 0 {
            nodes.push(self.whitespace(
                start + core_end..start + chars.len(),
                &chars[core_end..],
                parent,
                parent_path,
            ));
        }
        nodes
    }

    fn whitespace(
        &mut self,
        span: ops::Range<usize>,
        chars: &[char],
        parent: XsNodeId,
        parent_path: &XsPath,
    ) -> XsNodeId {
        self.push(
            span,
            parent_path.join("#whitespace"),
            Some(parent),
            XsNodeData::Whitespace {
                text: chars.iter().collect(),
            },
        )
    }
}
