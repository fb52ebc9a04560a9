//! Registration of declared interfaces and classes.

use symgen_core::{Error, GrammarError, ModelError};
use symgen_model::Model;

use crate::stage::{at, Input, Stage};

/// Registers interfaces and adds the archetype methods of tagged interfaces.
pub struct LoadInterfaces;

impl Stage for LoadInterfaces {
    fn name(&self) -> &'static str {
        "load-interfaces"
    }

    fn requires(&self) -> Option<&'static str> {
        None
    }

    fn run(&self, model: &mut Model, input: &Input<'_>) -> Result<(), Error> {
        let settings = input.settings;
        let mut count = 0usize;
        for declared in input.interfaces() {
            let mut def = declared.clone();
            if let Some(method) = def.methods().find(|m| settings.is_reserved(&m.name)) {
                return Err(GrammarError::at(
                    method.source.clone(),
                    ModelError::ReservedName {
                        owner: def.name.clone(),
                        method: method.name.clone(),
                        prefix: settings.reserved_prefix.clone(),
                    },
                )
                .into());
            }

            if let Some(kind) = def.archetype().map(str::to_string) {
                let archetype = settings.archetype(&kind).ok_or_else(|| {
                    GrammarError::new(
                        def.source.clone(),
                        format!("interface {} uses unknown archetype {kind}", def.name),
                    )
                })?;
                for method in &archetype.methods {
                    let generated = method.declare(settings, def.owner_info());
                    tracing::debug!(interface = %def.name, method = %generated.name, "added archetype method");
                    def.add_method(generated).map_err(at(&def.source))?;
                }
            }

            let source = def.source.clone();
            model.add_definition(def).map_err(at(&source))?;
            count += 1;
        }
        tracing::info!(interfaces = count, "loaded interfaces");
        Ok(())
    }
}

/// Registers classes, then checks that every ancestor of every definition is known.
pub struct LoadClasses;

impl Stage for LoadClasses {
    fn name(&self) -> &'static str {
        "load-classes"
    }

    fn requires(&self) -> Option<&'static str> {
        Some("load-interfaces")
    }

    fn run(&self, model: &mut Model, input: &Input<'_>) -> Result<(), Error> {
        let mut count = 0usize;
        for def in input.classes() {
            model.add_definition(def.clone()).map_err(at(&def.source))?;
            count += 1;
        }
        for def in model.definitions() {
            def.get_all_ancestors(model).map_err(at(&def.source))?;
        }
        tracing::info!(classes = count, "loaded classes");
        Ok(())
    }
}
