//! # msbuild-parser
//!
//! Position-aware parsing for MSBuild project files, the groundwork for editor tooling.
//!
//! Data flow
//!
//!   text ──► PositionIndex
//!     │
//!     ├──► xml::read_document ──► XmlDocument (spans + locations)
//!     │                               │
//!     │                               ▼
//!     │                         semantic::SemanticModel ──► lookup::PositionalLookup
//!     │                                                          │
//!     │                                                          ▼
//!     └──► expressions::parse (attribute values, text) ◄── semantic::XmlLocator
//!
//! [`msbuild::document::ProjectDocument`] runs all of it once per text snapshot.
//!
//! Everything is pure: no I/O, no global state. Diagnostics go to the
//! [`DiagnosticSink`](msbuild::diagnostics::DiagnosticSink) the caller hands in.
//!
//! For test helpers and sample projects, see the [testing module](msbuild::testing).

pub mod msbuild;
