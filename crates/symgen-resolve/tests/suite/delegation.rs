use pretty_assertions::assert_eq;
use symgen_core::ModelError;
use symgen_model::lower::Declaration;
use symgen_model::{Delegate, TypeDefinition};

use super::fixtures::{
    abstract_class, class_method, explicit, generic, interface_method, resolve, signatures, ty,
};

fn expressions() -> Vec<Declaration> {
    vec![
        Declaration::Interface(
            TypeDefinition::interface("Expr").with_type_params(generic(&["E"])),
        ),
        Declaration::Class(TypeDefinition::class("Column").implementing(ty("Expr<String>"))),
        Declaration::Method(
            explicit("coalesce", "Expr<T>", &[("Expr<T>", "e"), ("Expr<T>", "other")])
                .with_type_params(generic(&["T"])),
        ),
        Declaration::Method(explicit("label", "String", &[("Expr<String>", "e")])),
    ]
}

#[test]
fn unambiguous_explicit_methods_become_interface_members() {
    let resolved = resolve(expressions()).expect("resolves");

    let expr = resolved.model().get("Expr").unwrap();
    assert_eq!(signatures(expr), ["coalesce(Expr)"]);
    let member = expr.method("coalesce(Expr)").unwrap();
    assert_eq!(resolved.declaration(member), "Expr<E> coalesce(Expr<E> other)");
    assert!(member.is_abstract);
    assert_eq!(
        member.delegate,
        Some(Delegate {
            utility: "Symqle".to_string(),
            method: "coalesce".to_string(),
        })
    );
}

#[test]
fn implementing_classes_delegate_to_the_utility_class() {
    let resolved = resolve(expressions()).expect("resolves");

    assert_eq!(
        resolved.render_method("Column", "coalesce(Expr)").unwrap(),
        "public Expr<String> coalesce(Expr<String> other) {\n    return Symqle.coalesce(this, other);\n}"
    );
    let utility = resolved.model().utility().unwrap();
    assert_eq!(
        utility.method("coalesce(Expr,Expr)").unwrap().comment,
        "@see Expr#coalesce(Expr<E>)"
    );
}

#[test]
fn concrete_receiver_bindings_are_not_promoted() {
    let resolved = resolve(expressions()).expect("resolves");

    let expr = resolved.model().get("Expr").unwrap();
    assert!(expr.method("label()").is_none());
    assert!(resolved.model().promotions_of("label(Expr)").is_empty());
}

#[test]
fn test_partition_covers_promoted_receivers_and_interface_arguments() {
    let resolved = resolve(expressions()).expect("resolves");

    let tests: Vec<(&str, Vec<String>)> = resolved
        .test_interfaces()
        .iter()
        .map(|def| (def.name.as_str(), signatures(def)))
        .collect();
    assert_eq!(
        tests,
        vec![
            ("ColumnTest", vec!["test_coalesce()".to_string()]),
            (
                "SymqleTest",
                vec!["test_coalesce_0()".to_string(), "test_coalesce_1()".to_string()]
            ),
        ]
    );
}

#[test]
fn concrete_class_missing_a_method_is_an_error() {
    let err = resolve(vec![
        Declaration::Interface(
            TypeDefinition::interface("Named")
                .with_method(interface_method("Named", "name", "String", &[])),
        ),
        Declaration::Class(TypeDefinition::class("Plain").implementing(ty("Named"))),
    ])
    .unwrap_err();

    assert_eq!(
        err.model_error(),
        Some(&ModelError::MissingImplementation {
            owner: "Plain".to_string(),
            method: "public abstract String name()".to_string(),
        })
    );
}

#[test]
fn abstract_class_declares_unimplemented_methods() {
    let resolved = resolve(vec![
        Declaration::Interface(
            TypeDefinition::interface("Named")
                .with_method(interface_method("Named", "name", "String", &[])),
        ),
        Declaration::Class(abstract_class("Plain", &["Named"])),
        Declaration::Class(
            TypeDefinition::class("Leaf")
                .extending(ty("Plain"))
                .with_method(class_method("Leaf", "name", "String", "return \"leaf\";")),
        ),
    ])
    .expect("resolves");

    assert_eq!(
        resolved.render_method("Plain", "name()").unwrap(),
        "public abstract String name();"
    );
    let leaf = resolved.model().get("Leaf").unwrap();
    assert_eq!(signatures(leaf), ["name()"]);
    let sorted: Vec<&str> = resolved
        .sorted_classes()
        .unwrap()
        .into_iter()
        .map(|def| def.name.as_str())
        .collect();
    assert_eq!(sorted, ["Symqle", "Plain", "Leaf"]);
}

#[test]
fn method_type_parameters_clashing_with_the_interface_are_renamed() {
    let resolved = resolve(vec![
        Declaration::Interface(
            TypeDefinition::interface("Expr").with_type_params(generic(&["E"])),
        ),
        Declaration::Method(
            explicit("tagged", "Expr<T>", &[("Expr<T>", "e"), ("E", "tag")])
                .with_type_params(generic(&["T", "E"])),
        ),
    ])
    .expect("resolves");

    let expr = resolved.model().get("Expr").unwrap();
    let member = expr.method("tagged(Object)").unwrap();
    assert_eq!(resolved.declaration(member), "<E1> Expr<E> tagged(E1 tag)");
}
