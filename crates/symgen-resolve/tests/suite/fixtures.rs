//! Builders for lowered declarations. The settings use a single `Sql` archetype with one
//! `void` method so fixtures stay small.

use std::collections::BTreeSet;

use symgen_core::{Error, SourceRef};
use symgen_model::lower::{Declaration, LoweredUnit, ProductionRule, RuleSymbol};
use symgen_model::{DefinitionKind, FormalParameter, MethodDefinition, OwnerInfo, TypeDefinition};
use symgen_resolve::{Archetype, ArchetypeMethod, Pipeline, Resolved, Settings};
use symgen_types::{Type, TypeParameter, TypeParameters};

pub fn ty(text: &str) -> Type {
    text.parse().expect("valid type expression")
}

pub fn settings() -> Settings {
    Settings {
        utility_class: "Symqle".to_string(),
        reserved_prefix: "z$".to_string(),
        test_interface_suffix: "Test".to_string(),
        archetypes: vec![Archetype {
            kind: "Sql".to_string(),
            methods: vec![ArchetypeMethod {
                verb: "prepare".to_string(),
                result: Type::void(),
                params: vec![FormalParameter::new(ty("Context"), "context")],
                compose: None,
            }],
        }],
    }
}

pub fn sql_interface(name: &str) -> TypeDefinition {
    TypeDefinition::interface(name).with_archetype("Sql")
}

pub fn abstract_class(name: &str, implements: &[&str]) -> TypeDefinition {
    implements.iter().fold(
        TypeDefinition::class(name).with_modifiers(["public", "abstract"]),
        |def, iface| def.implementing(ty(iface)),
    )
}

pub fn generic(names: &[&str]) -> TypeParameters {
    names
        .iter()
        .map(|name| TypeParameter::new(*name, Vec::new()))
        .collect()
}

pub fn interface_method(
    owner: &str,
    name: &str,
    result: &str,
    params: &[(&str, &str)],
) -> MethodDefinition {
    MethodDefinition::new(
        OwnerInfo::new(owner, DefinitionKind::Interface),
        name,
        ty(result),
        parameters(params),
    )
}

/// Public parameterless class method with a body.
pub fn class_method(owner: &str, name: &str, result: &str, body: &str) -> MethodDefinition {
    MethodDefinition::new(
        OwnerInfo::new(owner, DefinitionKind::Class),
        name,
        ty(result),
        Vec::new(),
    )
    .with_modifiers(["public"])
    .with_body(body)
}

/// `public static` method of the utility class.
pub fn explicit(name: &str, result: &str, params: &[(&str, &str)]) -> MethodDefinition {
    MethodDefinition::new(
        OwnerInfo::new("Symqle", DefinitionKind::Class),
        name,
        ty(result),
        parameters(params),
    )
    .with_modifiers(["public", "static"])
    .with_body("throw new UnsupportedOperationException();")
}

fn parameters(params: &[(&str, &str)]) -> Vec<FormalParameter> {
    params
        .iter()
        .map(|(ty_text, name)| FormalParameter::new(ty(ty_text), *name))
        .collect()
}

/// Unnamed single-argument rule `to ::= from:arg`, which registers an implicit conversion.
pub fn conversion(from: &str, to: &str) -> ProductionRule {
    ProductionRule {
        comment: String::new(),
        type_params: TypeParameters::default(),
        target: ty(to),
        symbols: vec![RuleSymbol::Argument {
            name: "arg".to_string(),
            ty: ty(from),
        }],
        name: None,
        image: format!("{to} ::= {from}:arg"),
        source: SourceRef::default(),
    }
}

pub fn resolve(declarations: Vec<Declaration>) -> Result<Resolved, Error> {
    let unit = LoweredUnit {
        imports: BTreeSet::new(),
        declarations,
    };
    Pipeline::new(settings()).run_lowered(&[unit])
}

pub fn implemented_interfaces(resolved: &Resolved, class: &str) -> Vec<String> {
    resolved
        .model()
        .get(class)
        .and_then(TypeDefinition::class_data)
        .expect("class is registered")
        .implements
        .iter()
        .map(ToString::to_string)
        .collect()
}

pub fn signatures(def: &TypeDefinition) -> Vec<String> {
    def.methods().map(MethodDefinition::signature).collect()
}
