//! Resolution of a symgen grammar model.
//!
//! [`Pipeline`] lowers syntax trees into model entities and runs a fixed chain of [`Stage`]s
//! over one [`Model`]:
//!
//! 1. `load-interfaces`, `load-classes`: register declarations, adding archetype methods.
//! 2. `production-rules`: factories, anonymous classes and implicit conversions.
//! 3. `explicit-methods`: standalone static methods.
//! 4. `conversion-closure`: classes gain every interface their conversions reach.
//! 5. `interface-enhancement`: unambiguous explicit methods become interface members.
//! 6. `implement-methods`: inherited abstract methods get bodies or abstract declarations.
//! 7. `ambiguity-resolution`: ambiguous explicit methods are materialized per class.
//! 8. `finalize`: documentation and the test partition.
//!
//! The first error aborts the run. The result is queried through [`Resolved`].

mod settings;
mod stage;
pub mod stages;

use std::collections::BTreeSet;

use indexmap::IndexMap;
use symgen_config::GeneratorConfig;
use symgen_core::{Error, ModelError};
use symgen_model::lower::{lower_unit, LoweredUnit};
use symgen_model::{DefinitionKind, MethodDefinition, Model, OwnerInfo, TypeDefinition};
use symgen_syntax::SyntaxNode;

pub use settings::{Archetype, ArchetypeMethod, Settings};
pub use stage::{Input, Stage};

pub struct Pipeline {
    settings: Settings,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// The standard stage chain.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            stages: stages::standard(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self, ModelError> {
        Ok(Self::new(Settings::from_config(config)?))
    }

    /// A custom chain. Every stage must directly follow the stage it requires.
    pub fn with_stages(
        settings: Settings,
        stages: Vec<Box<dyn Stage>>,
    ) -> Result<Self, ModelError> {
        let mut previous: Option<&'static str> = None;
        for stage in &stages {
            if stage.requires() != previous {
                return Err(ModelError::Invalid(format!(
                    "stage {} requires {}, but follows {}",
                    stage.name(),
                    stage.requires().unwrap_or("nothing"),
                    previous.unwrap_or("nothing"),
                )));
            }
            previous = Some(stage.name());
        }
        Ok(Self { settings, stages })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Lower `units` and resolve them.
    pub fn run<N: SyntaxNode>(&self, units: &[N]) -> Result<Resolved, Error> {
        let utility = OwnerInfo::new(self.settings.utility_class.clone(), DefinitionKind::Class);
        let lowered = units
            .iter()
            .map(|unit| lower_unit(unit, &utility))
            .collect::<Result<Vec<_>, _>>()?;
        self.run_lowered(&lowered)
    }

    pub fn run_lowered(&self, units: &[LoweredUnit]) -> Result<Resolved, Error> {
        let mut model = Model::new(self.settings.utility_class.clone());
        let input = Input {
            units,
            settings: &self.settings,
        };
        for stage in &self.stages {
            let _span = tracing::info_span!("stage", name = stage.name()).entered();
            stage.run(&mut model, &input)?;
        }
        Ok(Resolved { model })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

/// The resolved model, as handed to an emitter.
#[derive(Debug)]
pub struct Resolved {
    model: Model,
}

impl Resolved {
    pub fn interfaces(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.model.interfaces()
    }

    /// Classes in registration order, the utility class included.
    pub fn classes(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.model.classes()
    }

    /// Classes with every superclass before its subclasses.
    pub fn sorted_classes(&self) -> Result<Vec<&TypeDefinition>, ModelError> {
        self.model.get_sorted_classes()
    }

    /// Declared and inherited methods of the type called `name`.
    pub fn all_methods(
        &self,
        name: &str,
    ) -> Result<IndexMap<String, MethodDefinition>, ModelError> {
        self.model.require(name, "output")?.all_methods(&self.model)
    }

    pub fn imports(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.model.get(name).map(|def| &def.imports)
    }

    pub fn declaration(&self, method: &MethodDefinition) -> String {
        method.declaration()
    }

    /// Source text of the method `signature` declared by `owner`.
    pub fn render_method(&self, owner: &str, signature: &str) -> Option<String> {
        let method = self.model.get(owner)?.method(signature)?;
        Some(self.model.render_method(method))
    }

    pub fn test_interfaces(&self) -> &[TypeDefinition] {
        self.model.test_interfaces()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }
}
