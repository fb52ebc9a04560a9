use symgen_core::{Error, GrammarError};
use symgen_model::Model;

use crate::stage::{at, Input, Stage};

/// Registers standalone static methods as explicit delegate candidates.
pub struct ExplicitMethods;

impl Stage for ExplicitMethods {
    fn name(&self) -> &'static str {
        "explicit-methods"
    }

    fn requires(&self) -> Option<&'static str> {
        Some("production-rules")
    }

    fn run(&self, model: &mut Model, input: &Input<'_>) -> Result<(), Error> {
        let mut count = 0usize;
        for (unit, method) in input.methods() {
            if !method.is_static() {
                return Err(GrammarError::new(
                    method.source.clone(),
                    format!("standalone method {} must be static", method.name),
                )
                .into());
            }
            if method.params.is_empty() {
                tracing::debug!(method = %method.name, "explicit method without parameters is never a delegate");
            }
            model
                .utility_mut()?
                .imports
                .extend(unit.imports.iter().cloned());
            model
                .add_explicit_method(method.clone())
                .map_err(at(&method.source))?;
            count += 1;
        }
        tracing::info!(methods = count, "registered explicit methods");
        Ok(())
    }
}
