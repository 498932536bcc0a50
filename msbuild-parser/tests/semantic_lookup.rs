use msbuild_parser::msbuild::document::ProjectDocument;
use msbuild_parser::msbuild::expressions::{ExpressionKind, ExpressionSyntax};
use msbuild_parser::msbuild::semantic::{ElementShape, XsNode, XsNodeKind, XsPath};
use msbuild_parser::msbuild::testing::{model_from, position_of, samples};
use msbuild_parser::msbuild::text::{Position, Range};
use rstest::rstest;

#[test]
fn test_lookup_by_element_and_attribute() {
    let text = r#"<node1><node2 attribute1="foo"/></node1>"#;
    let document = ProjectDocument::parse(text);

    let on_name = document.node_at(position_of(text, "node2")).unwrap();
    assert_eq!(on_name.kind(), XsNodeKind::Element);
    assert_eq!(on_name.name(), "node2");

    let in_value = document
        .node_at(position_of(text, "foo").move_by(0, 1))
        .unwrap();
    assert_eq!(in_value.kind(), XsNodeKind::Attribute);
    assert_eq!(in_value.name(), "attribute1");
}

#[test]
fn test_paths_follow_nesting() {
    let model = model_from(samples::CONDITIONAL_PROPERTIES);
    let paths: Vec<String> = model
        .nodes()
        .filter(|node| matches!(node.kind(), XsNodeKind::Element | XsNodeKind::Attribute))
        .map(|node| node.path.to_string())
        .collect();

    assert!(paths.contains(&"/Project/@Sdk".to_string()));
    assert!(paths.contains(&"/Project/PropertyGroup/@Condition".to_string()));
    assert!(paths.contains(&"/Project/ItemGroup/Compile/@Include".to_string()));

    let condition = model
        .nodes()
        .find(|node| node.name() == "Condition")
        .unwrap();
    assert!(condition.path.ends_with(&XsPath::parse("PropertyGroup/@Condition")));
    assert!(condition.path.is_child_of(&XsPath::parse("/Project/PropertyGroup")));
}

#[test]
fn test_every_node_lies_inside_its_parent() {
    let model = model_from(samples::CONDITIONAL_PROPERTIES);

    for node in model.nodes() {
        if let Some(parent) = model.parent(node) {
            assert!(
                parent.range.contains_range(&node.range),
                "{} escapes {}",
                node.path,
                parent.path
            );
        }
    }
}

#[test]
fn test_element_helpers() {
    let model = model_from(samples::CONDITIONAL_PROPERTIES);
    let project = model.root().unwrap();
    let element = project.as_element().unwrap();

    assert!(element.has_attributes());
    assert!(element.has_content());
    assert!(model.has_attribute(project, "Sdk"));
    let children: Vec<&str> = model.child_elements(project).map(XsNode::name).collect();
    assert_eq!(children, vec!["PropertyGroup", "ItemGroup", "Target"]);

    let target = model.child_elements(project).last().unwrap();
    assert_eq!(target.as_element().unwrap().shape, ElementShape::Empty);
}

#[test]
fn test_mixed_content_is_split() {
    let model = model_from(samples::MIXED_CONTENT);
    let message = model
        .nodes()
        .find(|node| node.name() == "Message")
        .unwrap();
    let content: Vec<(XsNodeKind, &str)> = model
        .content(message)
        .map(|node| (node.kind(), node.text().unwrap_or_default()))
        .collect();

    assert_eq!(
        content,
        vec![
            (XsNodeKind::Whitespace, "  "),
            (XsNodeKind::Text, "Hello"),
            (XsNodeKind::Whitespace, " "),
            (XsNodeKind::Whitespace, " "),
            (XsNodeKind::Text, "world"),
            (XsNodeKind::Whitespace, " "),
            (XsNodeKind::Whitespace, "\n  "),
        ]
    );
    let project = model.root().unwrap();
    assert!(model
        .content(project)
        .all(|node| node.kind() != XsNodeKind::Text));
}

#[rstest]
#[case("DefineConstants", 0, "element | opening-tag | name")]
#[case("Condition", 0, "attribute | name")]
#[case("Debug", 0, "attribute | value")]
#[case("DEBUG", 0, "element | value | text")]
#[case("</PropertyGroup", 3, "element | closing-tag")]
#[case(" />", 1, "element | empty")]
fn test_location_flags(#[case] needle: &str, #[case] shift: isize, #[case] expected: &str) {
    let document = ProjectDocument::parse(samples::CONDITIONAL_PROPERTIES);
    let position = position_of(samples::CONDITIONAL_PROPERTIES, needle).move_by(0, shift);
    let location = document.inspect(position).unwrap();

    assert_eq!(location.flags.to_string(), expected);
}

#[test]
fn test_zero_based_positions_match_one_based() {
    let document = ProjectDocument::parse(samples::CONDITIONAL_PROPERTIES);
    let one_based = position_of(samples::CONDITIONAL_PROPERTIES, "Restore");

    let a = document.inspect(one_based).unwrap();
    let b = document.inspect(one_based.to_zero_based()).unwrap();
    assert_eq!(a.node.id, b.node.id);
    assert_eq!(a.offset, b.offset);
}

#[rstest]
#[case("Configuration)' ==", ExpressionSyntax::Root, ExpressionKind::Symbol)]
#[case("TRACE", ExpressionSyntax::List, ExpressionKind::Symbol)]
#[case("Sources", ExpressionSyntax::List, ExpressionKind::Symbol)]
#[case("Link", ExpressionSyntax::List, ExpressionKind::Symbol)]
#[case("obj", ExpressionSyntax::SimpleList, ExpressionKind::SimpleListItem)]
#[case("Compile\"", ExpressionSyntax::List, ExpressionKind::Symbol)]
fn test_expression_at(
    #[case] needle: &str,
    #[case] syntax: ExpressionSyntax,
    #[case] kind: ExpressionKind,
) {
    let document = ProjectDocument::parse(samples::CONDITIONAL_PROPERTIES);
    let position = position_of(samples::CONDITIONAL_PROPERTIES, needle);
    let found = document.expression_at(position).unwrap();

    assert_eq!(found.syntax, syntax);
    assert_eq!(found.node().map(|node| node.expression_kind()), Some(kind));
}

#[test]
fn test_expression_ranges_map_back_to_the_document() {
    let text = samples::CONDITIONAL_PROPERTIES;
    let document = ProjectDocument::parse(text);
    let found = document
        .expression_at(position_of(text, "Sources"))
        .unwrap();
    let node = found.node().unwrap();
    let range = document.expression_range(&found, node).unwrap().unwrap();

    let start = position_of(text, "Sources");
    assert_eq!(range, Range::new(start, start.move_by(0, 7)));
}

#[test]
fn test_positions_past_the_text() {
    let document = ProjectDocument::parse(samples::CONDITIONAL_PROPERTIES);

    assert!(document.inspect(Position::one_based(400, 1)).is_none());
    assert!(document.node_at(Position::one_based(400, 1)).is_none());
}

#[test]
fn test_deeply_nested_elements_on_a_small_stack() {
    let depth = 1000;
    let text = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
    let (len, innermost) = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || {
            let document = ProjectDocument::parse(&text);
            let name = Position::one_based(1, 3 * (depth - 1) + 2);
            let path = document.node_at(name).map(|node| node.path.to_string());
            (document.model().len(), path)
        })
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(len, depth);
    assert_eq!(innermost, Some("/a".repeat(depth)));
}
