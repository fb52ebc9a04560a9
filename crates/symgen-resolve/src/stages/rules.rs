//! Production rules: factory methods, their anonymous classes and implicit conversions.

use symgen_core::{Error, GrammarError, ModelError};
use symgen_model::lower::{ProductionRule, RuleSymbol};
use symgen_model::{
    DefinitionKind, FormalParameter, ImplicitConversion, MethodDefinition, Model, OwnerInfo,
    TypeDefinition,
};
use symgen_types::Type;

use crate::settings::{ArchetypeMethod, Settings};
use crate::stage::{at, Input, Stage};

pub struct ProductionRules;

impl Stage for ProductionRules {
    fn name(&self) -> &'static str {
        "production-rules"
    }

    fn requires(&self) -> Option<&'static str> {
        Some("load-classes")
    }

    fn run(&self, model: &mut Model, input: &Input<'_>) -> Result<(), Error> {
        let mut count = 0usize;
        for (unit, rule) in input.rules() {
            model
                .utility_mut()?
                .imports
                .extend(unit.imports.iter().cloned());
            process_rule(model, input.settings, rule)?;
            count += 1;
        }
        tracing::info!(
            rules = count,
            conversions = model.conversions().len(),
            "processed production rules"
        );
        Ok(())
    }
}

fn process_rule(model: &mut Model, settings: &Settings, rule: &ProductionRule) -> Result<(), Error> {
    let target_name = rule.target.simple_name();
    let kind = model
        .get(target_name)
        .filter(|def| def.is_interface())
        .and_then(|def| def.archetype())
        .map(str::to_string)
        .ok_or_else(|| {
            GrammarError::new(
                rule.source.clone(),
                format!("rule target {} is not an archetyped interface", rule.target),
            )
        })?;

    let utility = model
        .utility()
        .map(TypeDefinition::owner_info)
        .unwrap_or_else(|| OwnerInfo::new(settings.utility_class.clone(), DefinitionKind::Class));
    let arguments: Vec<(&str, &Type)> = rule.arguments().collect();
    let name = match &rule.name {
        Some(name) => name.clone(),
        None => {
            let mut name = format!("{}{}$from", settings.reserved_prefix, target_name);
            for (_, ty) in &arguments {
                name.push('$');
                name.push_str(ty.simple_name());
            }
            name
        }
    };
    let params = arguments
        .iter()
        .map(|(arg, ty)| FormalParameter::new((*ty).clone(), *arg).with_modifier("final"))
        .collect();
    let factory = MethodDefinition::new(utility, name, rule.target.clone(), params)
        .with_modifiers(["public", "static"])
        .with_type_params(rule.type_params.clone())
        .with_comment(rule.comment.clone())
        .at(rule.source.clone());

    let anonymous = anonymous_class(model, settings, rule, &kind).map_err(at(&rule.source))?;
    tracing::debug!(
        factory = %factory.name,
        anonymous = %anonymous.name,
        target = %rule.target,
        "synthesized rule factory"
    );
    model
        .add_anonymous_class(&factory, anonymous)
        .map_err(at(&rule.source))?;

    match (&rule.name, arguments.as_slice()) {
        (None, [(_, from)]) => {
            model.add_conversion(ImplicitConversion {
                type_params: rule.type_params.clone(),
                from: (*from).clone(),
                to: rule.target.clone(),
                method: factory.clone(),
            });
            model.utility_mut()?.add_method(factory).map_err(at(&rule.source))?;
        }
        (None, _) => {
            model.utility_mut()?.add_method(factory).map_err(at(&rule.source))?;
        }
        (Some(_), _) => model.add_explicit_method(factory).map_err(at(&rule.source))?,
    }
    model.add_rule(target_name, rule.image.clone());
    Ok(())
}

/// The anonymous implementation of the rule's target: every archetype method it inherits gets
/// a body built from the rule's symbols.
fn anonymous_class(
    model: &mut Model,
    settings: &Settings,
    rule: &ProductionRule,
    kind: &str,
) -> Result<TypeDefinition, ModelError> {
    let name = model.next_anonymous_name();
    let mut anonymous = TypeDefinition::anonymous(name, rule.target.clone())
        .with_type_params(rule.type_params.clone());

    let target = model.require(rule.target.simple_name(), &anonymous.name)?;
    let mut implemented = Vec::new();
    for method in target.all_methods(model)?.into_values() {
        let Some(archetype_method) = archetype_method_of(model, settings, &method) else {
            continue;
        };
        let mut stub = method.override_for(&anonymous, model)?;
        let body = archetype_body(model, settings, rule, kind, archetype_method, &stub);
        stub.implement(body)?;
        implemented.push(stub);
    }
    for method in implemented {
        anonymous.add_method(method)?;
    }
    Ok(anonymous)
}

/// The catalogue entry a generated archetype method was declared from.
fn archetype_method_of<'s>(
    model: &Model,
    settings: &'s Settings,
    method: &MethodDefinition,
) -> Option<&'s ArchetypeMethod> {
    if !settings.is_reserved(&method.name) {
        return None;
    }
    let kind = model.get(&method.origin)?.archetype()?;
    settings
        .archetype(kind)?
        .methods
        .iter()
        .find(|m| settings.archetype_method_name(&m.verb, &method.origin) == method.name)
}

fn archetype_body(
    model: &Model,
    settings: &Settings,
    rule: &ProductionRule,
    kind: &str,
    archetype_method: &ArchetypeMethod,
    stub: &MethodDefinition,
) -> String {
    let call_args: Vec<&str> = stub.params.iter().map(|p| p.name.as_str()).collect();
    let call_args = call_args.join(", ");
    // `arg.z$verb$Iface(params)` when the argument's interface shares the archetype kind.
    let archetype_call = |arg: &str, ty: &Type| {
        model
            .get(ty.simple_name())
            .filter(|def| def.archetype() == Some(kind))
            .map(|def| {
                let method = settings.archetype_method_name(&archetype_method.verb, &def.name);
                format!("{arg}.{method}({call_args})")
            })
    };

    match &archetype_method.compose {
        Some(compose) if !stub.is_void() => {
            let items: Vec<String> = rule
                .symbols
                .iter()
                .map(|symbol| match symbol {
                    RuleSymbol::Terminal(text) => java_string(text),
                    RuleSymbol::Argument { name, ty } => {
                        archetype_call(name, ty).unwrap_or_else(|| name.clone())
                    }
                })
                .collect();
            format!("return {compose}({});", items.join(", "))
        }
        _ => rule
            .arguments()
            .filter_map(|(name, ty)| archetype_call(name, ty))
            .map(|call| format!("{call};"))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn java_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
