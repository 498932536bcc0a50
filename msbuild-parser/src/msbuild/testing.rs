//! Test support
//!
//!     Helpers shared by the unit tests and the integration tests under `tests/`.
//!
//!     Two rules keep the tests honest:
//!
//!         1. Prefer the sample projects in [samples] over ad-hoc XML. They are small but
//!            realistic, and a change in reader behaviour then shows up in one place.
//!         2. Find positions with [position_of] instead of counting columns by hand.
//!
//!     Examples:
//!
//!     ```rust,ignore
//!     use msbuild_parser::msbuild::testing::{parse_rule, position_of, samples};
//!
//!     let metadata = parse_rule(|rules| rules.item_metadata, "%(Compile.Link)").unwrap();
//!     let cursor = position_of(samples::CONDITIONAL_PROPERTIES, "Debug");
//!     ```

use crate::msbuild::diagnostics::{Diagnostic, NullSink};
use crate::msbuild::expressions::grammar::{parse_with, ParserError, Rule, Rules};
use crate::msbuild::semantic::SemanticModel;
use crate::msbuild::text::{Position, PositionIndex};
use crate::msbuild::xml::{read_document, XmlDocument};

/// Sample project files.
pub mod samples {
    /// A property group guarded by a condition, one item group, one target.
    pub const CONDITIONAL_PROPERTIES: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup Condition="'$(Configuration)' == 'Debug'">
    <DefineConstants>DEBUG;TRACE</DefineConstants>
    <OutputPath>bin\$(Configuration)\</OutputPath>
  </PropertyGroup>
  <ItemGroup>
    <Compile Include="@(Sources)" Exclude="obj\**" />
    <None Include="%(Compile.Link)" />
  </ItemGroup>
  <Target Name="Build" DependsOnTargets="Restore;Compile" />
</Project>
"#;

    /// Whitespace, text and CDATA mixed in element content.
    pub const MIXED_CONTENT: &str = "<Project>\n  <Message>  Hello <![CDATA[ world ]]>\n  </Message>\n  <!-- note -->\n</Project>\n";

    /// A project in the middle of being typed: an unclosed element and a broken tag.
    pub const BROKEN: &str = "<Project>\n  <PropertyGroup>\n    <Foo>bar\n    <\n  </PropertyGroup>\n</Project>\n";
}

/// Run one grammar rule over the whole of `source`.
pub fn parse_rule<O>(
    select: impl FnOnce(Rules<'static>) -> Rule<'static, O>,
    source: &str,
) -> Result<O, Vec<ParserError>> {
    parse_with(select(Rules::new()), source)
}

/// Read `text` as XML, collecting every diagnostic including traces.
pub fn read_with_diagnostics(text: &str) -> (PositionIndex, XmlDocument, Vec<Diagnostic>) {
    let index = PositionIndex::new(text);
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let document = read_document(text, &index, &mut diagnostics);
    (index, document, diagnostics)
}

pub fn model_from(text: &str) -> SemanticModel {
    let index = PositionIndex::new(text);
    let document = read_document(text, &index, &mut NullSink);
    SemanticModel::build(&document, &index)
}

/// One-based position of the first character of the first occurrence of `needle`.
///
/// # Panics
///
/// Panics when `needle` does not occur in `text`.
pub fn position_of(text: &str, needle: &str) -> Position {
    let byte = text
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} does not occur in the text"));
    let index = PositionIndex::new(text);
    index.position_at(index.byte_to_offset(byte))
}
