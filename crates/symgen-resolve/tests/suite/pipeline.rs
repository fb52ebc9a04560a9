//! End to end: syntax trees and a TOML configuration through the standard pipeline.

use pretty_assertions::assert_eq;
use symgen_config::GeneratorConfig;
use symgen_core::{Error, SourceRef};
use symgen_resolve::Pipeline;
use symgen_syntax::{kinds, TreeNode};

use super::fixtures::signatures;

const CONFIG: &str = r#"
[generator]
utility_class = "Dsl"
test_interface_suffix = "Spec"

[logging]
level = "debug"
"#;

fn type_node(name: &str) -> TreeNode {
    TreeNode::new(kinds::TYPE).child(TreeNode::leaf(kinds::NAME, name))
}

fn sql_interface(name: &str, line: u32) -> TreeNode {
    TreeNode::new(kinds::INTERFACE)
        .at(SourceRef::new("shapes.sdl", line, 1))
        .child(TreeNode::leaf(kinds::MODIFIER, "public"))
        .child(TreeNode::leaf(kinds::NAME, name))
        .child(TreeNode::leaf(kinds::ARCHETYPE, "Sql"))
}

fn shapes_unit() -> TreeNode {
    let rule = TreeNode::new(kinds::RULE)
        .at(SourceRef::new("shapes.sdl", 4, 1))
        .with_image("Shape ::= SHAPE OF Polygon:p")
        .child(TreeNode::new(kinds::TARGET).child(type_node("Shape")))
        .child(TreeNode::leaf(kinds::SYMBOL, "SHAPE OF"))
        .child(
            TreeNode::new(kinds::SYMBOL)
                .child(TreeNode::leaf(kinds::NAME, "p"))
                .child(type_node("Polygon")),
        );
    let circle = TreeNode::new(kinds::CLASS)
        .at(SourceRef::new("shapes.sdl", 6, 1))
        .child(TreeNode::leaf(kinds::MODIFIER, "public"))
        .child(TreeNode::leaf(kinds::MODIFIER, "abstract"))
        .child(TreeNode::leaf(kinds::NAME, "Circle"))
        .child(TreeNode::new(kinds::IMPLEMENTS).child(type_node("Polygon")));

    TreeNode::new(kinds::UNIT)
        .child(TreeNode::new(kinds::IMPORT).with_image("import java.util.List;"))
        .child(sql_interface("Shape", 1))
        .child(sql_interface("Polygon", 2))
        .child(rule)
        .child(circle)
}

fn pipeline() -> Pipeline {
    let config = GeneratorConfig::load_from_str(CONFIG).expect("config parses");
    Pipeline::from_config(&config).expect("archetypes parse")
}

#[test]
fn configuration_drives_the_pipeline() {
    let pipeline = pipeline();
    assert_eq!(pipeline.settings().utility_class, "Dsl");
    assert_eq!(pipeline.settings().test_interface_suffix, "Spec");
    assert_eq!(pipeline.stage_names().len(), 9);

    let resolved = pipeline.run(&[shapes_unit()]).expect("resolves");
    let interfaces: Vec<&str> = resolved.interfaces().map(|def| def.name.as_str()).collect();
    assert_eq!(interfaces, ["Shape", "Polygon"]);
    let classes: Vec<&str> = resolved.classes().map(|def| def.name.as_str()).collect();
    assert_eq!(classes, ["Dsl", "Circle"]);
}

#[test]
fn archetype_methods_are_generated_from_the_catalogue() {
    let resolved = pipeline().run(&[shapes_unit()]).expect("resolves");

    let shape = resolved.model().get("Shape").unwrap();
    assert_eq!(
        signatures(shape),
        ["z$prepare$Shape(SqlContext)", "z$sqlOf$Shape(SqlContext)"]
    );
}

#[test]
fn rule_factories_render_their_anonymous_class() {
    let resolved = pipeline().run(&[shapes_unit()]).expect("resolves");

    assert_eq!(
        resolved
            .render_method("Dsl", "z$Shape$from$Polygon(Polygon)")
            .unwrap(),
        [
            "public static Shape z$Shape$from$Polygon(final Polygon p) {",
            "    return new Shape() {",
            "        public void z$prepare$Shape(SqlContext context) {",
            "            p.z$prepare$Polygon(context);",
            "        }",
            "",
            "        public Sql z$sqlOf$Shape(SqlContext context) {",
            "            return SqlTerms.compose(\"SHAPE OF\", p.z$sqlOf$Polygon(context));",
            "        }",
            "    };",
            "}",
        ]
        .join("\n")
    );
}

#[test]
fn conversions_reach_the_class_and_rules_document_the_target() {
    let resolved = pipeline().run(&[shapes_unit()]).expect("resolves");

    let circle = resolved.model().get("Circle").unwrap();
    assert_eq!(circle.distance_to("Shape"), 1);
    assert_eq!(
        resolved
            .render_method("Circle", "z$sqlOf$Shape(SqlContext)")
            .unwrap(),
        "public Sql z$sqlOf$Shape(SqlContext context) {\n    return Dsl.z$Shape$from$Polygon(this).z$sqlOf$Shape(context);\n}"
    );

    let shape = resolved.model().get("Shape").unwrap();
    assert_eq!(shape.comment, "<pre>\nShape ::= SHAPE OF Polygon:p\n</pre>");
    assert!(resolved
        .imports("Circle")
        .unwrap()
        .contains("import java.util.List;"));
    assert!(resolved
        .imports("Dsl")
        .unwrap()
        .contains("import java.util.List;"));
}

#[test]
fn all_methods_include_inherited_archetype_methods() {
    let resolved = pipeline().run(&[shapes_unit()]).expect("resolves");

    let methods = resolved.all_methods("Circle").unwrap();
    let mut names: Vec<&str> = methods.keys().map(String::as_str).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        [
            "z$prepare$Polygon(SqlContext)",
            "z$prepare$Shape(SqlContext)",
            "z$sqlOf$Polygon(SqlContext)",
            "z$sqlOf$Shape(SqlContext)",
        ]
    );
    assert!(resolved.test_interfaces().is_empty());
}

#[test]
fn unknown_node_kinds_are_located_grammar_errors() {
    let unit = TreeNode::new(kinds::UNIT)
        .child(TreeNode::new("Enum").at(SourceRef::new("shapes.sdl", 9, 3)));
    let err = pipeline().run(&[unit]).unwrap_err();

    let Error::Grammar(grammar) = err else {
        panic!("expected a grammar error");
    };
    assert_eq!(grammar.location, SourceRef::new("shapes.sdl", 9, 3));
    assert_eq!(grammar.message, "unexpected Enum in a compilation unit");
}
