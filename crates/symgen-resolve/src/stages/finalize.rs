//! Documentation finalization and the test partition.

use std::collections::HashMap;

use symgen_core::{Error, ModelError};
use symgen_model::{Access, MethodDefinition, Model, TypeDefinition};
use symgen_types::Type;

use crate::settings::Settings;
use crate::stage::{Input, Stage};

pub struct Finalize;

impl Stage for Finalize {
    fn name(&self) -> &'static str {
        "finalize"
    }

    fn requires(&self) -> Option<&'static str> {
        Some("ambiguity-resolution")
    }

    fn run(&self, model: &mut Model, input: &Input<'_>) -> Result<(), Error> {
        document_rules(model);
        document_promotions(model)?;

        let settings = input.settings;
        let utility = model.utility_name().to_string();
        let mut partition = Vec::new();
        for def in model.classes().filter(|def| def.name != utility) {
            partition.push(class_tests(model, settings, def)?);
        }
        partition.push(utility_tests(model, settings)?);
        for def in partition.into_iter().flatten() {
            if model.get(&def.name).is_some() {
                return Err(ModelError::DuplicateType { name: def.name }.into());
            }
            model.add_test_interface(def);
        }

        let methods: usize = model
            .definitions()
            .map(|def| def.methods().count())
            .sum();
        tracing::info!(
            interfaces = model.interfaces().count(),
            classes = model.classes().count(),
            anonymous = model.anonymous_classes().count(),
            methods,
            conversions = model.conversions().len(),
            test_interfaces = model.test_interfaces().len(),
            "resolution finished"
        );
        Ok(())
    }
}

/// Append the grammar rules producing each interface to its documentation.
fn document_rules(model: &mut Model) {
    for name in model.interface_names() {
        let rules: Vec<String> = model.rules_for(&name).iter().map(|r| escape_html(r)).collect();
        if rules.is_empty() {
            continue;
        }
        let Some(def) = model.get_mut(&name) else {
            continue;
        };
        if !def.comment.is_empty() {
            def.comment.push_str("\n\n");
        }
        def.comment.push_str("<pre>\n");
        def.comment.push_str(&rules.join("\n"));
        def.comment.push_str("\n</pre>");
    }
}

/// Point every promoted explicit method at the members generated from it.
fn document_promotions(model: &mut Model) -> Result<(), ModelError> {
    let promoted: Vec<(String, Vec<String>)> = model
        .explicit_methods()
        .into_iter()
        .map(|m| m.signature())
        .map(|sig| {
            let targets = model.promotions_of(&sig).to_vec();
            (sig, targets)
        })
        .filter(|(_, targets)| !targets.is_empty())
        .collect();

    let utility = model.utility_mut()?;
    for (signature, targets) in promoted {
        let Some(method) = utility.method_mut(&signature) else {
            continue;
        };
        for target in targets {
            if !method.comment.is_empty() {
                method.comment.push('\n');
            }
            method.comment.push_str("@see ");
            method.comment.push_str(&target);
        }
    }
    Ok(())
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace("*/", "*&#47;")
}

/// Unique stub names: the first `test_foo`, then `test_foo_2`, `test_foo_3`.
#[derive(Default)]
struct StubNames {
    seen: HashMap<String, usize>,
}

impl StubNames {
    fn next(&mut self, base: String) -> String {
        let count = self.seen.entry(base.clone()).or_default();
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{base}_{count}")
        }
    }
}

fn test_interface(
    name: String,
    stubs: Vec<(String, String)>,
) -> Result<Option<TypeDefinition>, ModelError> {
    if stubs.is_empty() {
        return Ok(None);
    }
    let mut def = TypeDefinition::interface(name);
    def.access = Access::Public;
    let owner = def.owner_info();
    for (stub, comment) in stubs {
        let method = MethodDefinition::new(owner.clone(), stub, Type::void(), Vec::new())
            .with_throws([Type::named("Exception")])
            .with_comment(comment);
        def.add_method(method)?;
    }
    Ok(Some(def))
}

/// `{Class}{suffix}`: one stub per public method of the class.
fn class_tests(
    model: &Model,
    settings: &Settings,
    class: &TypeDefinition,
) -> Result<Option<TypeDefinition>, ModelError> {
    let mut names = StubNames::default();
    let stubs = class
        .all_methods(model)?
        .into_values()
        .filter(|m| m.is_public && !settings.is_reserved(&m.name))
        .map(|m| {
            let stub = names.next(format!("test_{}", m.name));
            (stub, format!("@see {}#{}", class.name, m.signature()))
        })
        .collect();
    test_interface(
        format!("{}{}", class.name, settings.test_interface_suffix),
        stubs,
    )
}

/// `{Utility}{suffix}`: one stub per explicit method and argument position that a class can
/// supply through one of its interfaces. The receiver position counts only once the method was
/// turned into a member.
fn utility_tests(
    model: &Model,
    settings: &Settings,
) -> Result<Option<TypeDefinition>, ModelError> {
    let mut names = StubNames::default();
    let mut stubs = Vec::new();
    for method in model.explicit_methods() {
        let promoted = !model.promotions_of(&method.signature()).is_empty();
        for (position, param) in method.params.iter().enumerate() {
            if position == 0 && !promoted {
                continue;
            }
            let ty = param.param_type();
            if !model.get(ty.simple_name()).is_some_and(TypeDefinition::is_interface) {
                continue;
            }
            let stub = names.next(format!("test_{}_{position}", method.name));
            let comment = format!(
                "@see {}#{} argument {}",
                model.utility_name(),
                method.signature(),
                param.name
            );
            stubs.push((stub, comment));
        }
    }
    test_interface(
        format!("{}{}", model.utility_name(), settings.test_interface_suffix),
        stubs,
    )
}
