use pretty_assertions::assert_eq;
use symgen_core::{Error, ModelError, SourceRef};
use symgen_model::lower::Declaration;
use symgen_model::TypeDefinition;

use super::fixtures::{
    abstract_class, conversion, interface_method, resolve, sql_interface, ty,
};

#[test]
fn reserved_prefix_is_rejected_on_declared_methods() {
    let method = interface_method("Shape", "z$custom", "void", &[])
        .at(SourceRef::new("shapes.sdl", 7, 5));
    let err = resolve(vec![Declaration::Interface(
        sql_interface("Shape").with_method(method),
    )])
    .unwrap_err();

    let Error::Grammar(grammar) = &err else {
        panic!("expected a located error, got {err:?}");
    };
    assert_eq!(grammar.location, SourceRef::new("shapes.sdl", 7, 5));
    assert_eq!(
        err.model_error(),
        Some(&ModelError::ReservedName {
            owner: "Shape".to_string(),
            method: "z$custom".to_string(),
            prefix: "z$".to_string(),
        })
    );
}

#[test]
fn duplicate_type_names_are_rejected() {
    let err = resolve(vec![
        Declaration::Interface(sql_interface("Shape")),
        Declaration::Class(abstract_class("Shape", &[])),
    ])
    .unwrap_err();
    assert_eq!(
        err.model_error(),
        Some(&ModelError::DuplicateType {
            name: "Shape".to_string()
        })
    );
}

#[test]
fn names_differing_only_in_case_are_rejected() {
    let err = resolve(vec![
        Declaration::Interface(sql_interface("Shape")),
        Declaration::Interface(sql_interface("SHAPE")),
    ])
    .unwrap_err();
    assert_eq!(
        err.model_error(),
        Some(&ModelError::CaseInsensitiveClash {
            name: "SHAPE".to_string(),
            existing: "Shape".to_string(),
        })
    );
}

#[test]
fn incompatible_inherited_methods_clash() {
    let err = resolve(vec![
        Declaration::Interface(
            TypeDefinition::interface("X")
                .with_method(interface_method("X", "foo", "int", &[("int", "x")])),
        ),
        Declaration::Interface(
            TypeDefinition::interface("Y")
                .with_method(interface_method("Y", "foo", "String", &[("int", "x")])),
        ),
        Declaration::Interface(
            TypeDefinition::interface("Z")
                .extending(ty("X"))
                .extending(ty("Y")),
        ),
        Declaration::Class(abstract_class("Impl", &["Z"])),
    ])
    .unwrap_err();

    let Some(ModelError::NameClash {
        signature,
        first,
        second,
        ..
    }) = err.model_error()
    else {
        panic!("expected a name clash, got {err:?}");
    };
    assert_eq!(signature, "foo(int)");
    assert_eq!(first, "int foo(int x) in X");
    assert_eq!(second, "String foo(int x) in Y");
}

#[test]
fn unknown_ancestors_are_reported_when_classes_load() {
    let err =
        resolve(vec![Declaration::Class(abstract_class("Circle", &["Shape"]))]).unwrap_err();
    assert_eq!(
        err.model_error(),
        Some(&ModelError::UnknownType {
            name: "Shape".to_string(),
            context: "Circle".to_string(),
        })
    );
}

#[test]
fn inheritance_cycles_are_reported() {
    let err = resolve(vec![
        Declaration::Interface(TypeDefinition::interface("A").extending(ty("B"))),
        Declaration::Interface(TypeDefinition::interface("B").extending(ty("A"))),
    ])
    .unwrap_err();
    assert!(matches!(err.model_error(), Some(ModelError::Cycle { .. })));
}

#[test]
fn rules_must_target_archetyped_interfaces() {
    let mut rule = conversion("Shape", "Plain");
    rule.source = SourceRef::new("rules.sdl", 2, 1);
    let err = resolve(vec![
        Declaration::Interface(sql_interface("Shape")),
        Declaration::Interface(TypeDefinition::interface("Plain")),
        Declaration::Rule(rule),
    ])
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "rules.sdl:2:1: rule target Plain is not an archetyped interface"
    );
}
