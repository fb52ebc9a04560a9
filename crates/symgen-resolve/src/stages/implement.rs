use symgen_core::{Error, ModelError};
use symgen_model::{MethodDefinition, Model};

use crate::stage::{at, Input, Stage};

/// Gives every inherited abstract method of a class a body or an abstract declaration.
///
/// Superclasses are handled before their subclasses so that a subclass sees the methods its
/// superclass settled. Anonymous classes come last.
pub struct ImplementMethods;

impl Stage for ImplementMethods {
    fn name(&self) -> &'static str {
        "implement-methods"
    }

    fn requires(&self) -> Option<&'static str> {
        Some("interface-enhancement")
    }

    fn run(&self, model: &mut Model, _input: &Input<'_>) -> Result<(), Error> {
        let utility = model.utility_name().to_string();
        let mut order: Vec<String> = model
            .get_sorted_classes()?
            .into_iter()
            .map(|def| def.name.clone())
            .filter(|name| *name != utility)
            .collect();
        order.extend(model.anonymous_names());

        let (mut delegated, mut declared) = (0usize, 0usize);
        for name in order {
            let def = model.require(&name, "method implementation")?;
            let source = def.source.clone();
            let abstract_owner = def.is_abstract();
            let pending: Vec<MethodDefinition> = def
                .all_methods(model)
                .map_err(at(&source))?
                .into_values()
                .filter(MethodDefinition::is_placeholder_abstract)
                .collect();

            let mut settled = Vec::with_capacity(pending.len());
            for mut method in pending {
                if let Some(delegate) = method.delegate.clone() {
                    let callee = format!("{}.{}", delegate.utility, delegate.method);
                    let body = method.forward(&callee, Some("this"));
                    method.implement(body).map_err(at(&source))?;
                    delegated += 1;
                } else if abstract_owner {
                    method.declare_abstract().map_err(at(&source))?;
                    declared += 1;
                } else {
                    return Err(Error::from(ModelError::MissingImplementation {
                        owner: name.clone(),
                        method: method.declaration(),
                    })
                    .located(&source));
                }
                tracing::debug!(
                    class = %name,
                    method = %method.signature(),
                    state = %method.state,
                    "settled inherited method"
                );
                settled.push(method);
            }

            let def = model.require_mut(&name, "method implementation")?;
            for method in settled {
                def.add_method(method).map_err(at(&source))?;
            }
        }
        tracing::info!(delegated, declared, "implemented inherited methods");
        Ok(())
    }
}
