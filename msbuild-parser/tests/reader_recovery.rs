use msbuild_parser::msbuild::diagnostics::{DiagnosticSource, Severity};
use msbuild_parser::msbuild::document::ProjectDocument;
use msbuild_parser::msbuild::semantic::{XsNodeKind, XsNodeData};
use msbuild_parser::msbuild::testing::{model_from, position_of, read_with_diagnostics, samples};
use msbuild_parser::msbuild::text::Position;
use proptest::prelude::*;

#[test]
fn test_broken_project_reports_and_keeps_going() {
    let (_, document, diagnostics) = read_with_diagnostics(samples::BROKEN);

    assert!(diagnostics
        .iter()
        .any(|diagnostic| diagnostic.severity == Severity::Error));
    assert!(diagnostics
        .iter()
        .any(|diagnostic| diagnostic.message.contains("<Foo> is not closed")));
    assert!(diagnostics
        .iter()
        .all(|diagnostic| diagnostic.source == DiagnosticSource::Reader));

    let names: Vec<&str> = document
        .elements()
        .iter()
        .map(|element| element.name.as_str())
        .collect();
    assert_eq!(&names[..3], &["Project", "PropertyGroup", "Foo"]);
    assert!(names.contains(&""));

    let project = document.root().unwrap();
    assert!(project.is_closed());
    let foo = &document.elements()[2];
    assert!(!foo.is_closed());
}

#[test]
fn test_locations_stay_inside_the_text() {
    for text in [
        samples::CONDITIONAL_PROPERTIES,
        samples::MIXED_CONTENT,
        samples::BROKEN,
    ] {
        let (index, document, _) = read_with_diagnostics(text);
        let end = index.position_at(index.len());

        for location in document.locations() {
            assert!(location.range.start <= location.range.end, "{location:?}");
            assert!(location.range.end <= end, "{location:?} ends past {end:?}");
        }
    }
}

#[test]
fn test_broken_elements_become_invalid_nodes() {
    let model = model_from(samples::BROKEN);

    let foo = model.nodes().find(|node| node.name() == "Foo").unwrap();
    assert!(!foo.is_valid());

    let blank = model
        .nodes()
        .find(|node| node.kind() == XsNodeKind::Element && node.name().is_empty())
        .unwrap();
    assert!(!blank.is_valid());
    assert_eq!(blank.path.to_string(), "/Project/PropertyGroup/Foo/#invalid");

    let group = model
        .nodes()
        .find(|node| node.name() == "PropertyGroup")
        .unwrap();
    assert!(matches!(group.data, XsNodeData::Element(_)));
    assert!(group.is_valid());
}

#[test]
fn test_document_diagnostics_skip_traces() {
    let document = ProjectDocument::parse(samples::BROKEN);

    assert!(!document.diagnostics().is_empty());
    assert!(document
        .diagnostics()
        .iter()
        .all(|diagnostic| !diagnostic.is_trace()));
}

#[test]
fn test_broken_project_still_answers_lookups() {
    let document = ProjectDocument::parse(samples::BROKEN);

    // Foo is never closed, so its node shrinks to the start tag and the text after it is
    // not part of the model.
    let position = position_of(samples::BROKEN, "bar");
    let location = document.inspect(position).unwrap();
    assert_eq!(location.node.name(), "Foo");
    assert!(location.is_element());
    assert!(!location.is_valid());
    assert!(location.flags.to_string().contains("invalid"));

    let closing = position_of(samples::BROKEN, "</Project").move_by(0, 3);
    let location = document.inspect(closing).unwrap();
    assert_eq!(location.node.name(), "Project");
    assert!(location.is_closing_tag());
}

#[test]
fn test_text_in_closed_element_survives_later_errors() {
    let text = "<Project>\n  <Name>value</Name>\n  <\n</Project>\n";
    let document = ProjectDocument::parse(text);
    assert!(!document.diagnostics().is_empty());

    let location = document.inspect(position_of(text, "alue")).unwrap();
    assert!(location.is_text());
    assert!(location.is_valid());
    assert_eq!(location.element().map(|element| element.name()), Some("Name"));
}

proptest! {
    #[test]
    fn test_any_prefix_reads_without_panicking(cut in 0usize..=samples::CONDITIONAL_PROPERTIES.len()) {
        let text = &samples::CONDITIONAL_PROPERTIES[..cut];
        let document = ProjectDocument::parse(text);

        for node in document.model().nodes() {
            prop_assert!(node.range.start <= node.range.end);
        }
        let _ = document.inspect(Position::one_based(1, 1));
    }
}
