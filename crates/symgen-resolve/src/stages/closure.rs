//! Conversion closure.
//!
//! A class implementing an archetyped interface `T` also implements every interface an implicit
//! conversion reaches from `T`, transitively. Every ancestor gained on the way is explored as
//! well, including plain supertypes of a gained interface. The methods a gained interface
//! introduces are implemented by converting `this` and forwarding the call.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexSet;
use symgen_core::{Error, ModelError};
use symgen_model::{ConversionPath, ImplicitConversion, MethodDefinition, Model};
use symgen_types::Type;

use crate::stage::{at, Input, Stage};

pub struct ConversionClosure;

impl Stage for ConversionClosure {
    fn name(&self) -> &'static str {
        "conversion-closure"
    }

    fn requires(&self) -> Option<&'static str> {
        Some("explicit-methods")
    }

    fn run(&self, model: &mut Model, _input: &Input<'_>) -> Result<(), Error> {
        let utility = model.utility_name().to_string();
        let conversions = model.conversions().to_vec();
        let mut gained = 0usize;
        for class in model.class_names() {
            if class == utility {
                continue;
            }
            let source = model.require(&class, "conversion closure")?.source.clone();
            gained += close_class(model, &class, &utility, &conversions).map_err(at(&source))?;
        }
        tracing::info!(interfaces = gained, "conversion closure reached a fixed point");
        Ok(())
    }
}

fn archetyped(model: &Model, ty: &Type) -> bool {
    model
        .get(ty.simple_name())
        .is_some_and(|def| def.is_interface() && def.archetype().is_some())
}

/// Run the closure for one class. Returns the number of interfaces gained.
fn close_class(
    model: &mut Model,
    class: &str,
    utility: &str,
    conversions: &[ImplicitConversion],
) -> Result<usize, ModelError> {
    let ancestors = model.require(class, class)?.get_all_ancestors(model)?;
    let mut unexplored: VecDeque<Type> = ancestors
        .into_iter()
        .filter(|ty| archetyped(model, ty))
        .collect();
    let mut seen: HashSet<String> = unexplored
        .iter()
        .map(|ty| ty.simple_name().to_string())
        .collect();

    let mut gained = 0usize;
    while let Some(via) = unexplored.pop_front() {
        for conversion in conversions {
            let Ok(subst) = conversion
                .type_params
                .infer_type_arguments(&conversion.from, &via)
            else {
                continue;
            };
            let to = conversion.to.replace_params(&subst)?;
            let def = model.require(class, class)?;
            if to.simple_name() == class || def.find_ancestor(to.simple_name(), model)?.is_some() {
                continue;
            }

            let before = def.get_all_ancestors(model)?;
            let known_methods: HashSet<String> = def.all_methods(model)?.into_keys().collect();
            let distance = def.distance_to(via.simple_name()) + 1;
            tracing::debug!(
                class,
                via = %via,
                to = %to,
                conversion = %conversion.method.name,
                distance,
                "applying implicit conversion"
            );

            model.require_mut(class, class)?.add_interface(to.clone());

            let def = model.require(class, class)?;
            let new_ancestors: Vec<Type> = def
                .get_all_ancestors(model)?
                .into_iter()
                .filter(|ty| !contains_name(&before, ty.simple_name()))
                .collect();
            let redundant: Vec<String> = def
                .redundant_interfaces(model)?
                .iter()
                .map(|ty| ty.simple_name().to_string())
                .collect();
            let mut implemented: Vec<MethodDefinition> = def
                .all_methods(model)?
                .into_values()
                .filter(|m| m.is_placeholder_abstract() && !known_methods.contains(&m.signature()))
                .collect();
            let callee = format!("{utility}.{}(this)", conversion.method.name);
            for method in &mut implemented {
                let body = method.forward(&format!("{callee}.{}", method.name), None);
                method.implement(body)?;
            }

            let def = model.require_mut(class, class)?;
            if let Some(data) = def.class_data_mut() {
                for ty in &new_ancestors {
                    data.conversions
                        .entry(ty.simple_name().to_string())
                        .or_insert_with(|| ConversionPath {
                            via: via.clone(),
                            to: ty.clone(),
                            conversion: conversion.method.name.clone(),
                            distance,
                        });
                }
            }
            if !redundant.is_empty() {
                tracing::debug!(class, ?redundant, "dropping redundant interfaces");
                let names: Vec<&str> = redundant.iter().map(String::as_str).collect();
                def.remove_interfaces(&names);
            }
            for method in implemented {
                def.add_method(method)?;
            }

            gained += 1;
            for ty in new_ancestors {
                if seen.insert(ty.simple_name().to_string()) {
                    unexplored.push_back(ty);
                }
            }
        }
    }
    Ok(gained)
}

fn contains_name(types: &IndexSet<Type>, name: &str) -> bool {
    types.iter().any(|ty| ty.simple_name() == name)
}
