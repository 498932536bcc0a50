//! XML syntax tree with source locations
//!
//! What the reader produces: elements in an arena, in document order, each carrying the
//! spans of its tags, name and attribute block, plus its [`NodeLocation`]. Spans are
//! half-open character offsets into the document text.

use serde::Serialize;
use std::ops;

use crate::msbuild::text::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where an element or attribute sits: its closed range, nesting depth and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeLocation {
    pub range: Range,
    pub depth: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlAttribute {
    /// Qualified name, `prefix:local` when prefixed.
    pub name: String,
    pub value: String,
    pub span: ops::Range<usize>,
    pub name_span: ops::Range<usize>,
    /// The value without its quotes. Empty values sit just inside the quotes.
    pub value_span: ops::Range<usize>,
    pub location: NodeLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlText {
    pub text: String,
    pub span: ops::Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum XmlContent {
    Element { id: ElementId },
    Text(XmlText),
    /// The text inside `<![CDATA[...]]>`.
    Cdata(XmlText),
    Comment(XmlText),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlElement {
    pub id: ElementId,
    /// Qualified name. Blank for markup that could not be read as a tag name.
    pub name: String,
    pub prefix: String,
    pub span: ops::Range<usize>,
    pub name_span: ops::Range<usize>,
    /// `<name ...>` or `<name ... />`, missing when the start tag is broken.
    pub start_tag: Option<ops::Range<usize>>,
    pub attributes_span: Option<ops::Range<usize>>,
    pub end_tag: Option<ops::Range<usize>>,
    pub is_empty: bool,
    pub attributes: Vec<XmlAttribute>,
    pub content: Vec<XmlContent>,
    #[serde(skip)]
    pub parent: Option<ElementId>,
    pub location: NodeLocation,
}

impl XmlElement {
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Closed by an end tag or self-closing.
    pub fn is_closed(&self) -> bool {
        self.is_empty || self.end_tag.is_some()
    }

    pub fn attribute(&self, name: &str) -> Option<&XmlAttribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.content.iter().filter_map(|content| match content {
            XmlContent::Element { id } => Some(*id),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct XmlDocument {
    pub(crate) elements: Vec<XmlElement>,
    pub(crate) roots: Vec<ElementId>,
}

impl XmlDocument {
    pub fn element(&self, id: ElementId) -> &XmlElement {
        &self.elements[id.0]
    }

    /// All elements in document order.
    pub fn elements(&self) -> &[XmlElement] {
        &self.elements
    }

    /// Top-level elements. A well-formed document has exactly one.
    pub fn roots(&self) -> impl Iterator<Item = &XmlElement> {
        self.roots.iter().map(|&id| &self.elements[id.0])
    }

    pub fn root(&self) -> Option<&XmlElement> {
        self.roots().next()
    }

    /// Locations of every element and attribute, in document order.
    pub fn locations(&self) -> Vec<&NodeLocation> {
        self.elements
            .iter()
            .flat_map(|element| {
                std::iter::once(&element.location)
                    .chain(element.attributes.iter().map(|attribute| &attribute.location))
            })
            .collect()
    }
}
