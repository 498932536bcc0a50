//! Classifying a cursor position within the semantic model

use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::ops;

use super::model::SemanticModel;
use super::nodes::{ElementShape, XsNode, XsNodeData, XsNodeId};
use crate::msbuild::lookup::PositionalLookup;
use crate::msbuild::text::{Position, PositionIndex};

/// Which parts of a node a position falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct XmlLocationFlags(u16);

impl XmlLocationFlags {
    pub const NONE: Self = Self(0);
    pub const ELEMENT: Self = Self(1);
    pub const OPENING_TAG: Self = Self(2);
    pub const CLOSING_TAG: Self = Self(4);
    pub const ATTRIBUTE: Self = Self(8);
    pub const ATTRIBUTES: Self = Self(16);
    pub const NAME: Self = Self(32);
    pub const VALUE: Self = Self(64);
    pub const TEXT: Self = Self(128);
    pub const WHITESPACE: Self = Self(256);
    pub const EMPTY: Self = Self(1024);
    pub const INVALID: Self = Self(2048);

    const NAMES: [(Self, &'static str); 11] = [
        (Self::ELEMENT, "element"),
        (Self::OPENING_TAG, "opening-tag"),
        (Self::CLOSING_TAG, "closing-tag"),
        (Self::ATTRIBUTE, "attribute"),
        (Self::ATTRIBUTES, "attributes"),
        (Self::NAME, "name"),
        (Self::VALUE, "value"),
        (Self::TEXT, "text"),
        (Self::WHITESPACE, "whitespace"),
        (Self::EMPTY, "empty"),
        (Self::INVALID, "invalid"),
    ];

    pub fn bits(self) -> u16 {
        self.0
    }

    /// True when every flag in `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl ops::BitOr for XmlLocationFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for XmlLocationFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for XmlLocationFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl Serialize for XmlLocationFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A position together with the node it falls on and what part of that node it hits.
#[derive(Debug, Clone, Copy)]
pub struct XmlLocation<'m> {
    /// Always one-based.
    pub position: Position,
    /// Character offset of `position` in the document.
    pub offset: usize,
    pub node: &'m XsNode,
    pub flags: XmlLocationFlags,
    model: &'m SemanticModel,
}

impl<'m> XmlLocation<'m> {
    pub fn is_element(&self) -> bool {
        self.flags.contains(XmlLocationFlags::ELEMENT)
    }

    pub fn is_attribute(&self) -> bool {
        self.flags.contains(XmlLocationFlags::ATTRIBUTE)
    }

    pub fn is_element_name(&self) -> bool {
        self.flags
            .contains(XmlLocationFlags::ELEMENT | XmlLocationFlags::NAME)
    }

    pub fn is_attribute_name(&self) -> bool {
        self.flags
            .contains(XmlLocationFlags::ATTRIBUTE | XmlLocationFlags::NAME)
    }

    pub fn is_attribute_value(&self) -> bool {
        self.flags
            .contains(XmlLocationFlags::ATTRIBUTE | XmlLocationFlags::VALUE)
    }

    /// Between an element's tags, including on text and whitespace.
    pub fn is_element_content(&self) -> bool {
        self.flags
            .contains(XmlLocationFlags::ELEMENT | XmlLocationFlags::VALUE)
    }

    pub fn is_opening_tag(&self) -> bool {
        self.flags.contains(XmlLocationFlags::OPENING_TAG)
    }

    pub fn is_closing_tag(&self) -> bool {
        self.flags.contains(XmlLocationFlags::CLOSING_TAG)
    }

    /// Inside a start tag's attribute block but not on any attribute.
    pub fn is_between_attributes(&self) -> bool {
        self.flags
            .contains(XmlLocationFlags::ELEMENT | XmlLocationFlags::ATTRIBUTES)
    }

    pub fn is_text(&self) -> bool {
        self.flags.contains(XmlLocationFlags::TEXT)
    }

    pub fn is_whitespace(&self) -> bool {
        self.flags.contains(XmlLocationFlags::WHITESPACE)
    }

    pub fn is_empty_element(&self) -> bool {
        self.flags
            .contains(XmlLocationFlags::ELEMENT | XmlLocationFlags::EMPTY)
    }

    pub fn is_valid(&self) -> bool {
        !self.flags.contains(XmlLocationFlags::INVALID)
    }

    pub fn parent(&self) -> Option<&'m XsNode> {
        self.model.parent(self.node)
    }

    pub fn previous_sibling(&self) -> Option<&'m XsNode> {
        self.model.previous_sibling(self.node)
    }

    pub fn next_sibling(&self) -> Option<&'m XsNode> {
        self.model.next_sibling(self.node)
    }

    /// The node itself when it is an element, otherwise its owning element.
    pub fn element(&self) -> Option<&'m XsNode> {
        match self.node.data {
            XsNodeData::Element(_) => Some(self.node),
            _ => self.parent(),
        }
    }
}

/// Answers "what is at this position" for one semantic model.
pub struct XmlLocator<'m> {
    model: &'m SemanticModel,
    index: &'m PositionIndex,
    lookup: Cow<'m, PositionalLookup<XsNodeId>>,
}

impl<'m> XmlLocator<'m> {
    pub fn new(model: &'m SemanticModel, index: &'m PositionIndex) -> Self {
        Self {
            model,
            index,
            lookup: Cow::Owned(model.lookup_index()),
        }
    }

    /// Reuse a lookup already built from `model`.
    pub fn with_lookup(
        model: &'m SemanticModel,
        index: &'m PositionIndex,
        lookup: &'m PositionalLookup<XsNodeId>,
    ) -> Self {
        Self {
            model,
            index,
            lookup: Cow::Borrowed(lookup),
        }
    }

    /// Classify `position`, in either basis.
    ///
    /// Returns `None` when no node covers the position or when the position does not
    /// address a character of the text.
    pub fn inspect(&self, position: Position) -> Option<XmlLocation<'m>> {
        let position = position.to_one_based();
        let offset = self.index.to_offset(position).ok()?;
        let mut node = self.model.node(*self.lookup.find(position)?);

        // A position where one node ends and its next sibling starts belongs to the sibling.
        if position == node.range.end {
            if let Some(next) = self.model.next_sibling(node) {
                if next.range.start == position {
                    node = next;
                }
            }
        }

        Some(XmlLocation {
            position,
            offset,
            node,
            flags: classify(node, offset),
            model: self.model,
        })
    }

    /// Classify a character offset.
    pub fn inspect_offset(&self, offset: usize) -> Option<XmlLocation<'m>> {
        let position = self.index.to_position(offset).ok()?;
        self.inspect(position)
    }
}

fn within(span: &Option<ops::Range<usize>>, offset: usize) -> bool {
    span.as_ref().is_some_and(|span| span.contains(&offset))
}

fn classify(node: &XsNode, offset: usize) -> XmlLocationFlags {
    let mut flags = XmlLocationFlags::NONE;
    if !node.is_valid() {
        flags |= XmlLocationFlags::INVALID;
    }

    match &node.data {
        XsNodeData::Element(element) => {
            flags |= XmlLocationFlags::ELEMENT;
            if element.name_span.contains(&offset) {
                flags |= XmlLocationFlags::NAME;
            }
            if within(&element.attributes_span, offset) {
                flags |= XmlLocationFlags::ATTRIBUTES;
            }
            match element.shape {
                ElementShape::Empty => flags |= XmlLocationFlags::EMPTY,
                ElementShape::WithContent { .. } => {
                    if within(&element.start_tag, offset) {
                        flags |= XmlLocationFlags::OPENING_TAG;
                    }
                    if within(&element.end_tag, offset) {
                        flags |= XmlLocationFlags::CLOSING_TAG;
                    }
                    if let (Some(start_tag), Some(end_tag)) = (&element.start_tag, &element.end_tag) {
                        if start_tag.end <= offset && offset <= end_tag.start {
                            flags |= XmlLocationFlags::VALUE;
                        }
                    }
                }
                ElementShape::Invalid { .. } => {}
            }
        }
        XsNodeData::Attribute(attribute) => {
            flags |= XmlLocationFlags::ATTRIBUTE;
            if attribute.name_span.contains(&offset) {
                flags |= XmlLocationFlags::NAME;
            }
            if attribute.value_span.start <= offset && offset <= attribute.value_span.end {
                flags |= XmlLocationFlags::VALUE;
            }
        }
        XsNodeData::Text { .. } => {
            flags |= XmlLocationFlags::TEXT | XmlLocationFlags::ELEMENT | XmlLocationFlags::VALUE;
        }
        XsNodeData::Whitespace { .. } => {
            flags |=
                XmlLocationFlags::WHITESPACE | XmlLocationFlags::ELEMENT | XmlLocationFlags::VALUE;
        }
    }
    flags
}
