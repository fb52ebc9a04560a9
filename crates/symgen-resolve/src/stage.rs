use symgen_core::{Error, SourceRef};
use symgen_model::lower::{Declaration, LoweredUnit, ProductionRule};
use symgen_model::{MethodDefinition, Model, TypeDefinition};

use crate::Settings;

/// Everything a stage reads besides the model: the lowered units and the settings.
pub struct Input<'a> {
    pub units: &'a [LoweredUnit],
    pub settings: &'a Settings,
}

impl Input<'_> {
    pub fn interfaces(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.declarations().filter_map(|(_, d)| match d {
            Declaration::Interface(def) => Some(def),
            _ => None,
        })
    }

    pub fn classes(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.declarations().filter_map(|(_, d)| match d {
            Declaration::Class(def) => Some(def),
            _ => None,
        })
    }

    /// Production rules with the unit they come from.
    pub fn rules(&self) -> impl Iterator<Item = (&LoweredUnit, &ProductionRule)> {
        self.declarations().filter_map(|(unit, d)| match d {
            Declaration::Rule(rule) => Some((unit, rule)),
            _ => None,
        })
    }

    /// Standalone methods with the unit they come from.
    pub fn methods(&self) -> impl Iterator<Item = (&LoweredUnit, &MethodDefinition)> {
        self.declarations().filter_map(|(unit, d)| match d {
            Declaration::Method(method) => Some((unit, method)),
            _ => None,
        })
    }

    fn declarations(&self) -> impl Iterator<Item = (&LoweredUnit, &Declaration)> {
        self.units
            .iter()
            .flat_map(|unit| unit.declarations.iter().map(move |d| (unit, d)))
    }
}

/// One step of resolution.
///
/// A stage may rely on every invariant established by the stages it [requires](Stage::requires);
/// the pipeline checks that those run first.
pub trait Stage {
    fn name(&self) -> &'static str;

    /// The stage that must have completed before this one.
    fn requires(&self) -> Option<&'static str>;

    fn run(&self, model: &mut Model, input: &Input<'_>) -> Result<(), Error>;
}

/// Attach `source` to a model error raised while handling the entity declared there.
pub(crate) fn at(source: &SourceRef) -> impl Fn(symgen_core::ModelError) -> Error + '_ {
    move |err| Error::from(err).located(source)
}
