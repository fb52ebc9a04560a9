//! Ambiguity resolution.
//!
//! Explicit methods sharing a reduced signature cannot become interface members: a class
//! implementing two of the receiver interfaces would inherit both. Instead each class gets at
//! most one materialized member per group, choosing the candidate whose receiver the class
//! reaches in the fewest conversion hops and, among those, whose result type is the richest.

use symgen_core::{Error, ModelError};
use symgen_model::{fresh_name, MethodDefinition, Model, TypeDefinition};
use symgen_types::{Substitution, Type, TypeParameters};

use crate::stage::{at, Input, Stage};

pub struct AmbiguityResolution;

impl Stage for AmbiguityResolution {
    fn name(&self) -> &'static str {
        "ambiguity-resolution"
    }

    fn requires(&self) -> Option<&'static str> {
        Some("implement-methods")
    }

    fn run(&self, model: &mut Model, _input: &Input<'_>) -> Result<(), Error> {
        let utility = model.utility_name().to_string();
        let groups: Vec<(String, Vec<MethodDefinition>)> = model
            .ambiguous_groups()
            .into_iter()
            .map(|(reduced, methods)| (reduced, methods.into_iter().cloned().collect()))
            .collect();
        if groups.is_empty() {
            tracing::info!("no ambiguous explicit methods");
            return Ok(());
        }

        let mut materialized = 0usize;
        for class in model.class_names() {
            if class == utility {
                continue;
            }
            for (reduced, candidates) in &groups {
                let def = model.require(&class, "ambiguity resolution")?;
                let source = def.source.clone();
                if def.has_method(reduced) {
                    continue;
                }
                let Some((winner, ancestor, subst)) =
                    select(model, def, candidates).map_err(at(&source))?
                else {
                    continue;
                };
                let member = materialize(def, winner, &ancestor, &subst, &utility)
                    .map_err(at(&source))?;
                let signature = member.signature();
                if def.all_methods(model).map_err(at(&source))?.contains_key(&signature) {
                    tracing::debug!(class, %signature, "class already has the method");
                    continue;
                }

                tracing::debug!(
                    class,
                    %signature,
                    via = %ancestor,
                    "materialized explicit method"
                );
                model.record_promotion(winner, &class, &member);
                model
                    .require_mut(&class, "ambiguity resolution")?
                    .add_method(member)
                    .map_err(at(&source))?;
                materialized += 1;
            }
        }
        tracing::info!(
            groups = groups.len(),
            methods = materialized,
            "resolved ambiguous explicit methods"
        );
        Ok(())
    }
}

/// The single best candidate for `class`, with the ancestor it matched and the bindings of its
/// type parameters. `None` when no candidate applies; an error when the best ones tie.
fn select<'c>(
    model: &Model,
    class: &TypeDefinition,
    candidates: &'c [MethodDefinition],
) -> Result<Option<(&'c MethodDefinition, Type, Substitution)>, ModelError> {
    let ancestors = class.get_all_ancestors(model)?;
    let mut acceptable = Vec::new();
    for candidate in candidates {
        let Some(receiver) = candidate.params.first().map(|p| p.param_type()) else {
            continue;
        };
        let Some(ancestor) = ancestors
            .iter()
            .find(|ty| ty.simple_name() == receiver.simple_name())
        else {
            continue;
        };
        match candidate
            .type_params
            .infer_type_arguments(&receiver, ancestor)
        {
            Ok(subst) => acceptable.push((candidate, ancestor.clone(), subst)),
            Err(err) => {
                tracing::debug!(
                    class = %class.name,
                    candidate = %candidate.declaration(),
                    %err,
                    "rejected candidate"
                );
            }
        }
    }

    let Some(nearest) = acceptable
        .iter()
        .map(|(_, ancestor, _)| class.distance_to(ancestor.simple_name()))
        .min()
    else {
        return Ok(None);
    };
    acceptable.retain(|(_, ancestor, _)| class.distance_to(ancestor.simple_name()) == nearest);

    let mut scored = Vec::with_capacity(acceptable.len());
    for entry in acceptable {
        let score = richness(model, &entry.0.result_type)?;
        scored.push((score, entry));
    }
    let Some(richest) = scored.iter().map(|(score, _)| *score).max() else {
        return Ok(None);
    };
    let mut best: Vec<_> = scored
        .into_iter()
        .filter(|(score, _)| *score == richest)
        .map(|(_, entry)| entry)
        .collect();

    if best.len() > 1 {
        return Err(ModelError::Ambiguous {
            class: class.name.clone(),
            signature: best[0].0.reduced_signature(),
            candidates: best.iter().map(|(c, _, _)| c.declaration()).collect(),
        });
    }
    Ok(best.pop())
}

/// Number of methods of the result type, or `-1` for a type outside the model.
fn richness(model: &Model, result: &Type) -> Result<i64, ModelError> {
    match model.get(result.simple_name()) {
        Some(def) => Ok(def.all_methods(model)?.len() as i64),
        None => Ok(-1),
    }
}

/// `public final` member of `class` that casts `this` to the matched ancestor and forwards to
/// the explicit method.
fn materialize(
    class: &TypeDefinition,
    explicit: &MethodDefinition,
    ancestor: &Type,
    bindings: &Substitution,
    utility: &str,
) -> Result<MethodDefinition, ModelError> {
    let mut subst = bindings.clone();
    let mut type_params = Vec::new();
    for param in explicit.type_params.iter() {
        if matches!(bindings.get(&param.name), Some(Some(_))) {
            continue;
        }
        let name = if class.type_params.contains(&param.name) {
            fresh_name(&param.name, |candidate| {
                class.type_params.contains(candidate) || explicit.type_params.contains(candidate)
            })
        } else {
            param.name.clone()
        };
        subst.set(&param.name, Type::named(name.clone()).into());
        type_params.push(param.rename(name));
    }

    let params = explicit.params[1..]
        .iter()
        .map(|p| p.replace_params(&subst))
        .collect::<Result<Vec<_>, _>>()?;
    let throws = explicit
        .throws
        .iter()
        .map(|t| t.replace_params(&subst))
        .collect::<Result<Vec<_>, _>>()?;
    let member = MethodDefinition::new(
        class.owner_info(),
        explicit.name.clone(),
        explicit.result_type.replace_params(&subst)?,
        params,
    )
    .with_modifiers(["public", "final"])
    .with_type_params(TypeParameters::new(type_params).replace_params(&subst)?)
    .with_throws(throws)
    .with_comment(explicit.comment.clone())
    .at(explicit.source.clone());

    let body = member.forward(
        &format!("{utility}.{}", explicit.name),
        Some(&format!("({ancestor}) this")),
    );
    Ok(member.with_body(body))
}
