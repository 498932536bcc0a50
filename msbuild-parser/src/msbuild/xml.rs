//! XML reading with source locations
//!
//! [`read_document`] turns document text into an [`XmlDocument`]: elements, attributes,
//! text, CDATA and comments, each carrying character spans into the text. Elements and
//! attributes also carry a [`NodeLocation`] (closed range, depth, name) ready for the
//! semantic model.

pub mod reader;
pub mod syntax;

pub use reader::read_document;
pub use syntax::{
    ElementId, NodeLocation, XmlAttribute, XmlContent, XmlDocument, XmlElement, XmlText,
};
