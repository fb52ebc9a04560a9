use symgen_config::{ArchetypeConfig, GeneratorConfig};
use symgen_core::ModelError;
use symgen_model::{FormalParameter, MethodDefinition, OwnerInfo};
use symgen_types::Type;

/// Resolution settings with the archetype catalogue already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub utility_class: String,
    pub reserved_prefix: String,
    pub test_interface_suffix: String,
    pub archetypes: Vec<Archetype>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archetype {
    pub kind: String,
    pub methods: Vec<ArchetypeMethod>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchetypeMethod {
    pub verb: String,
    pub result: Type,
    pub params: Vec<FormalParameter>,
    /// Combines terminals and argument results; set for every non-void method.
    pub compose: Option<String>,
}

impl Settings {
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, ModelError> {
        Ok(Self {
            utility_class: config.generator.utility_class.clone(),
            reserved_prefix: config.generator.reserved_prefix.clone(),
            test_interface_suffix: config.generator.test_interface_suffix.clone(),
            archetypes: config
                .archetypes
                .iter()
                .map(Archetype::from_config)
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn archetype(&self, kind: &str) -> Option<&Archetype> {
        self.archetypes.iter().find(|a| a.kind == kind)
    }

    /// `{prefix}{verb}${interface}`.
    pub fn archetype_method_name(&self, verb: &str, interface: &str) -> String {
        format!("{}{verb}${interface}", self.reserved_prefix)
    }

    pub fn is_reserved(&self, method_name: &str) -> bool {
        method_name.starts_with(&self.reserved_prefix)
    }
}

impl Default for Settings {
    fn default() -> Self {
        // The built-in catalogue always parses.
        Self::from_config(&GeneratorConfig::default()).unwrap_or_else(|_| Self {
            utility_class: "Symqle".to_string(),
            reserved_prefix: "z$".to_string(),
            test_interface_suffix: "Test".to_string(),
            archetypes: Vec::new(),
        })
    }
}

impl Archetype {
    fn from_config(config: &ArchetypeConfig) -> Result<Self, ModelError> {
        let methods = config
            .methods
            .iter()
            .map(|method| -> Result<ArchetypeMethod, ModelError> {
                Ok(ArchetypeMethod {
                    verb: method.verb.clone(),
                    result: method.result.parse()?,
                    params: method
                        .params
                        .iter()
                        .map(|param| parse_parameter(param))
                        .collect::<Result<_, _>>()?,
                    compose: method.compose.clone(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            kind: config.kind.clone(),
            methods,
        })
    }
}

impl ArchetypeMethod {
    /// The abstract method this archetype method declares on `owner`.
    pub fn declare(&self, settings: &Settings, owner: OwnerInfo) -> MethodDefinition {
        let name = settings.archetype_method_name(&self.verb, &owner.name);
        MethodDefinition::new(owner, name, self.result.clone(), self.params.clone())
    }
}

/// `"Type name"` -> a formal parameter.
fn parse_parameter(text: &str) -> Result<FormalParameter, ModelError> {
    let text = text.trim();
    let (ty, name) = text
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| ModelError::Invalid(format!("archetype parameter `{text}` has no name")))?;
    Ok(FormalParameter::new(ty.trim().parse()?, name))
}
