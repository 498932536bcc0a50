//! Semantic node types

use serde::Serialize;
use std::fmt;
use std::ops;

use super::path::XsPath;
use crate::msbuild::text::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct XsNodeId(pub(crate) usize);

impl XsNodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum XsNodeKind {
    Element,
    Attribute,
    Text,
    Whitespace,
}

impl fmt::Display for XsNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How much of an element's structure could be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum ElementShape {
    /// `<a ...>content</a>`, with the three parts as separate ranges.
    WithContent {
        opening_tag: Range,
        content: Range,
        closing_tag: Range,
    },
    /// `<a ... />`
    Empty,
    /// Blank name, missing end tag, or tag boundaries that collapse into the whole element.
    Invalid { has_content: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XsElement {
    pub name: String,
    pub prefix: String,
    pub shape: ElementShape,
    pub attributes_range: Range,
    #[serde(skip)]
    pub name_span: ops::Range<usize>,
    #[serde(skip)]
    pub start_tag: Option<ops::Range<usize>>,
    #[serde(skip)]
    pub attributes_span: Option<ops::Range<usize>>,
    #[serde(skip)]
    pub end_tag: Option<ops::Range<usize>>,
    pub attributes: Vec<XsNodeId>,
    pub content: Vec<XsNodeId>,
}

impl XsElement {
    pub fn has_content(&self) -> bool {
        match self.shape {
            ElementShape::WithContent { .. } => true,
            ElementShape::Empty => false,
            ElementShape::Invalid { has_content } => has_content,
        }
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn is_empty_element(&self) -> bool {
        self.shape == ElementShape::Empty
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XsAttribute {
    pub name: String,
    pub value: String,
    pub name_range: Range,
    pub value_range: Range,
    #[serde(skip)]
    pub name_span: ops::Range<usize>,
    /// Inside the quotes.
    #[serde(skip)]
    pub value_span: ops::Range<usize>,
    pub valid: bool,
}

impl XsAttribute {
    /// `xmlns` or `xmlns:prefix`.
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum XsNodeData {
    Element(XsElement),
    Attribute(XsAttribute),
    Text { text: String },
    Whitespace { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XsNode {
    pub id: XsNodeId,
    pub range: Range,
    /// Character span in the document, half-open.
    #[serde(skip)]
    pub span: ops::Range<usize>,
    pub path: XsPath,
    #[serde(skip)]
    pub parent: Option<XsNodeId>,
    #[serde(skip)]
    pub previous_sibling: Option<XsNodeId>,
    #[serde(skip)]
    pub next_sibling: Option<XsNodeId>,
    #[serde(flatten)]
    pub data: XsNodeData,
}

impl XsNode {
    pub fn kind(&self) -> XsNodeKind {
        match self.data {
            XsNodeData::Element(_) => XsNodeKind::Element,
            XsNodeData::Attribute(_) => XsNodeKind::Attribute,
            XsNodeData::Text { .. } => XsNodeKind::Text,
            XsNodeData::Whitespace { .. } => XsNodeKind::Whitespace,
        }
    }

    pub fn name(&self) -> &str {
        match &self.data {
            XsNodeData::Element(element) => &element.name,
            XsNodeData::Attribute(attribute) => &attribute.name,
            XsNodeData::Text { .. } => "#text",
            XsNodeData::Whitespace { .. } => "#whitespace",
        }
    }

    pub fn is_valid(&self) -> bool {
        match &self.data {
            XsNodeData::Element(element) => {
                !matches!(element.shape, ElementShape::Invalid { .. })
            }
            XsNodeData::Attribute(attribute) => attribute.valid,
            XsNodeData::Text { .. } | XsNodeData::Whitespace { .. } => true,
        }
    }

    pub fn as_element(&self) -> Option<&XsElement> {
        match &self.data {
            XsNodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&XsAttribute> {
        match &self.data {
            XsNodeData::Attribute(attribute) => Some(attribute),
            _ => None,
        }
    }

    /// The text of a text or whitespace node.
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            XsNodeData::Text { text } | XsNodeData::Whitespace { text } => Some(text),
            _ => None,
        }
    }
}
