//! Semantic model of an XML document
//!
//! The model re-reads an [`XmlDocument`](crate::msbuild::xml::XmlDocument) as typed nodes:
//! elements classified by shape, attributes with separate name and value ranges, and text
//! split into significant text and whitespace. Every node knows its range, its path from the
//! root and its parent and siblings.
//!
//! ## Modules
//!
//! - [`nodes`] - node types
//! - [`path`] - `/Project/PropertyGroup/@Condition` style paths
//! - [`model`] - building the model and walking its relationships
//! - [`locator`] - classifying a cursor position

pub mod locator;
pub mod model;
pub mod nodes;
pub mod path;

pub use locator::{XmlLocation, XmlLocationFlags, XmlLocator};
pub use model::SemanticModel;
pub use nodes::{ElementShape, XsAttribute, XsElement, XsNode, XsNodeData, XsNodeId, XsNodeKind};
pub use path::XsPath;
