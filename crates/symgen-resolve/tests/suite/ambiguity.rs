use pretty_assertions::assert_eq;
use symgen_core::ModelError;
use symgen_model::lower::Declaration;
use symgen_model::{MethodDefinition, TypeDefinition};

use super::fixtures::{
    abstract_class, conversion, explicit, interface_method, resolve, signatures, sql_interface,
};

/// `Shape` and `Polygon`, an abstract `Circle`, a `Rich` result type with one method, and the
/// given conversions and explicit methods.
fn shapes(
    circle_implements: &[&str],
    conversions: &[(&str, &str)],
    explicit_methods: Vec<MethodDefinition>,
) -> Vec<Declaration> {
    let mut declarations = vec![
        Declaration::Interface(sql_interface("Shape")),
        Declaration::Interface(sql_interface("Polygon")),
        Declaration::Interface(
            TypeDefinition::interface("Rich")
                .with_method(interface_method("Rich", "label", "String", &[])),
        ),
        Declaration::Class(abstract_class("Circle", circle_implements)),
    ];
    declarations.extend(
        conversions
            .iter()
            .map(|(from, to)| Declaration::Rule(conversion(from, to))),
    );
    declarations.extend(explicit_methods.into_iter().map(Declaration::Method));
    declarations
}

#[test]
fn directly_implemented_receiver_beats_a_converted_one() {
    let resolved = resolve(shapes(
        &["Shape"],
        &[("Shape", "Polygon")],
        vec![
            explicit("describe", "String", &[("Shape", "s")]),
            explicit("describe", "String", &[("Polygon", "p")]),
        ],
    ))
    .expect("resolves");

    let circle = resolved.model().get("Circle").unwrap();
    assert_eq!(circle.distance_to("Polygon"), 1);
    assert_eq!(
        resolved.render_method("Circle", "describe()").unwrap(),
        "public final String describe() {\n    return Symqle.describe((Shape) this);\n}"
    );
}

#[test]
fn lower_distance_wins_regardless_of_richness() {
    let resolved = resolve(shapes(
        &["Polygon"],
        &[("Polygon", "Shape")],
        vec![
            explicit("area", "Rich", &[("Shape", "s")]),
            explicit("area", "String", &[("Polygon", "p")]),
        ],
    ))
    .expect("resolves");

    assert_eq!(
        resolved.render_method("Circle", "area()").unwrap(),
        "public final String area() {\n    return Symqle.area((Polygon) this);\n}"
    );
}

#[test]
fn richer_result_breaks_a_distance_tie() {
    let resolved = resolve(shapes(
        &["Shape", "Polygon"],
        &[],
        vec![
            explicit("area", "Rich", &[("Shape", "s")]),
            explicit("area", "String", &[("Polygon", "p")]),
        ],
    ))
    .expect("resolves");

    assert_eq!(
        resolved.render_method("Circle", "area()").unwrap(),
        "public final Rich area() {\n    return Symqle.area((Shape) this);\n}"
    );
}

#[test]
fn full_tie_is_an_error() {
    let err = resolve(shapes(
        &["Shape", "Polygon"],
        &[],
        vec![
            explicit("area", "String", &[("Shape", "s")]),
            explicit("area", "String", &[("Polygon", "p")]),
        ],
    ))
    .unwrap_err();

    assert_eq!(
        err.model_error(),
        Some(&ModelError::Ambiguous {
            class: "Circle".to_string(),
            signature: "area()".to_string(),
            candidates: vec![
                "public static String area(Shape s)".to_string(),
                "public static String area(Polygon p)".to_string(),
            ],
        })
    );
}

#[test]
fn classes_without_a_matching_ancestor_get_nothing() {
    let resolved = resolve(shapes(
        &[],
        &[],
        vec![
            explicit("area", "String", &[("Shape", "s")]),
            explicit("area", "String", &[("Polygon", "p")]),
        ],
    ))
    .expect("resolves");

    let circle = resolved.model().get("Circle").unwrap();
    assert!(signatures(circle).is_empty());
}

#[test]
fn materialized_members_are_documented_and_tested() {
    let resolved = resolve(shapes(
        &["Shape"],
        &[("Shape", "Polygon")],
        vec![
            explicit("describe", "String", &[("Shape", "s")]),
            explicit("describe", "String", &[("Polygon", "p")]),
        ],
    ))
    .expect("resolves");

    let utility = resolved.model().utility().unwrap();
    assert_eq!(
        utility.method("describe(Shape)").unwrap().comment,
        "@see Circle#describe()"
    );
    assert_eq!(utility.method("describe(Polygon)").unwrap().comment, "");

    let tests: Vec<(&str, Vec<String>)> = resolved
        .test_interfaces()
        .iter()
        .map(|def| (def.name.as_str(), signatures(def)))
        .collect();
    assert_eq!(
        tests,
        vec![
            ("CircleTest", vec!["test_describe()".to_string()]),
            ("SymqleTest", vec!["test_describe_0()".to_string()]),
        ]
    );
}
