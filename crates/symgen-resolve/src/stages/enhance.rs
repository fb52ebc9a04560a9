//! Interface enhancement: an unambiguous explicit method whose first parameter is an interface
//! becomes an instance method of that interface, delegating back to the static method.

use symgen_core::{Error, ModelError};
use symgen_model::{fresh_name, Delegate, MethodDefinition, Model, TypeDefinition};
use symgen_types::{Substitution, Type, TypeArgument, TypeParameters, CAPTURE_PREFIX};

use crate::stage::{at, Input, Stage};

pub struct InterfaceEnhancement;

impl Stage for InterfaceEnhancement {
    fn name(&self) -> &'static str {
        "interface-enhancement"
    }

    fn requires(&self) -> Option<&'static str> {
        Some("conversion-closure")
    }

    fn run(&self, model: &mut Model, _input: &Input<'_>) -> Result<(), Error> {
        let utility = model.utility_name().to_string();
        let candidates: Vec<MethodDefinition> = model
            .explicit_methods()
            .into_iter()
            .filter(|method| model.is_unambiguous(method))
            .cloned()
            .collect();

        let mut promoted = 0usize;
        for method in candidates {
            let Some(receiver) = method.params.first().map(|p| p.param_type()) else {
                continue;
            };
            if method.type_params.contains(receiver.simple_name()) {
                continue;
            }
            let Some(iface) = model
                .get(receiver.simple_name())
                .filter(|def| def.is_interface())
            else {
                continue;
            };
            let Some(member) =
                interface_member(iface, &method, &receiver, &utility).map_err(at(&method.source))?
            else {
                continue;
            };

            let signature = member.signature();
            if let Some(existing) = iface.method(&signature) {
                if existing.matches(&member) {
                    tracing::debug!(interface = %iface.name, %signature, "interface already declares the method");
                    continue;
                }
            }

            let iface_name = iface.name.clone();
            tracing::debug!(interface = %iface_name, method = %member.name, "promoted explicit method");
            model.record_promotion(&method, &iface_name, &member);
            model
                .require_mut(&iface_name, &method.name)?
                .add_method(member)
                .map_err(at(&method.source))?;
            promoted += 1;
        }
        tracing::info!(methods = promoted, "enhanced interfaces");
        Ok(())
    }
}

/// `method` re-expressed as an abstract method of `iface`, or `None` when the receiver type does
/// not map onto the interface's own type parameters.
fn interface_member(
    iface: &TypeDefinition,
    method: &MethodDefinition,
    receiver: &Type,
    utility: &str,
) -> Result<Option<MethodDefinition>, ModelError> {
    let Ok(bindings) = iface
        .type_params
        .infer_type_arguments(&iface.self_type(), receiver)
    else {
        tracing::debug!(interface = %iface.name, %receiver, "receiver does not match the interface type");
        return Ok(None);
    };

    // Each interface parameter must be bound to a distinct method type variable or to a wildcard.
    let mut rename = Substitution::unresolved(method.type_params.names());
    for (param, binding) in bindings.iter() {
        match binding {
            None => {}
            Some(TypeArgument::Type(ty)) if ty.simple_name().starts_with(CAPTURE_PREFIX) => {}
            Some(TypeArgument::Type(ty))
                if ty.type_arguments().is_empty()
                    && !ty.is_array()
                    && method.type_params.contains(ty.simple_name()) =>
            {
                if matches!(rename.get(ty.simple_name()), Some(Some(_))) {
                    return Ok(None);
                }
                rename.set(ty.simple_name(), Type::named(param).into());
            }
            Some(other) => {
                tracing::debug!(interface = %iface.name, param, binding = %other, "receiver binds a concrete type");
                return Ok(None);
            }
        }
    }

    let mut type_params = Vec::new();
    for param in method.type_params.iter() {
        if matches!(rename.get(&param.name), Some(Some(_))) {
            continue;
        }
        let name = if iface.type_params.contains(&param.name) {
            fresh_name(&param.name, |candidate| {
                iface.type_params.contains(candidate) || method.type_params.contains(candidate)
            })
        } else {
            param.name.clone()
        };
        rename.set(&param.name, Type::named(name.clone()).into());
        type_params.push(param.rename(name));
    }

    let params = method.params[1..]
        .iter()
        .map(|p| p.replace_params(&rename))
        .collect::<Result<Vec<_>, _>>()?;
    let throws = method
        .throws
        .iter()
        .map(|t| t.replace_params(&rename))
        .collect::<Result<Vec<_>, _>>()?;
    let member = MethodDefinition::new(
        iface.owner_info(),
        method.name.clone(),
        method.result_type.replace_params(&rename)?,
        params,
    )
    .with_type_params(TypeParameters::new(type_params).replace_params(&rename)?)
    .with_throws(throws)
    .with_comment(method.comment.clone())
    .with_delegate(Delegate {
        utility: utility.to_string(),
        method: method.name.clone(),
    })
    .at(method.source.clone());
    Ok(Some(member))
}
