//! Configuration for the symgen generator, loaded from TOML.
//!
//! ```toml
//! [generator]
//! utility_class = "Symqle"
//! reserved_prefix = "z$"
//!
//! [logging]
//! level = "debug"
//!
//! [[archetypes]]
//! kind = "Sql"
//! [[archetypes.methods]]
//! verb = "prepare"
//! result = "void"
//! params = ["SqlContext context"]
//! ```
//!
//! Every table is optional; an empty file yields [`GeneratorConfig::default`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Once;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name looked up by [`discover_config_path`].
pub const CONFIG_FILE_NAME: &str = "symgen.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub generator: GeneratorSection,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Archetype catalogue. Interfaces tagged with one of these kinds receive the listed
    /// methods automatically.
    #[serde(default = "default_archetypes")]
    pub archetypes: Vec<ArchetypeConfig>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorSection::default(),
            logging: LoggingConfig::default(),
            archetypes: default_archetypes(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSection {
    /// Class owning factory methods and explicit static methods.
    #[serde(default = "GeneratorSection::default_utility_class")]
    pub utility_class: String,

    /// Prefix of generated archetype methods. User-declared methods may not start with it.
    #[serde(default = "GeneratorSection::default_reserved_prefix")]
    pub reserved_prefix: String,

    /// Appended to a class name to name its test interface.
    #[serde(default = "GeneratorSection::default_test_interface_suffix")]
    pub test_interface_suffix: String,
}

impl GeneratorSection {
    fn default_utility_class() -> String {
        "Symqle".to_owned()
    }

    fn default_reserved_prefix() -> String {
        "z$".to_owned()
    }

    fn default_test_interface_suffix() -> String {
        "Test".to_owned()
    }
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            utility_class: Self::default_utility_class(),
            reserved_prefix: Self::default_reserved_prefix(),
            test_interface_suffix: Self::default_test_interface_suffix(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchetypeConfig {
    pub kind: String,
    #[serde(default)]
    pub methods: Vec<ArchetypeMethodConfig>,
}

/// One generated method. Its name is `{reserved_prefix}{verb}${Interface}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchetypeMethodConfig {
    pub verb: String,
    /// Result type in type-expression syntax.
    #[serde(default = "ArchetypeMethodConfig::default_result")]
    pub result: String,
    /// Parameters as `"Type name"`.
    #[serde(default)]
    pub params: Vec<String>,
    /// Function combining terminals and argument results in production-rule bodies. Required
    /// unless `result` is `void`.
    #[serde(default)]
    pub compose: Option<String>,
}

impl ArchetypeMethodConfig {
    fn default_result() -> String {
        "void".to_owned()
    }

    pub fn is_void(&self) -> bool {
        self.result.trim() == "void"
    }
}

fn default_archetypes() -> Vec<ArchetypeConfig> {
    vec![ArchetypeConfig {
        kind: "Sql".to_owned(),
        methods: vec![
            ArchetypeMethodConfig {
                verb: "prepare".to_owned(),
                result: "void".to_owned(),
                params: vec!["SqlContext context".to_owned()],
                compose: None,
            },
            ArchetypeMethodConfig {
                verb: "sqlOf".to_owned(),
                result: "Sql".to_owned(),
                params: vec!["SqlContext context".to_owned()],
                compose: Some("SqlTerms.compose".to_owned()),
            },
        ],
    }]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A simple level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    /// The effective `EnvFilter`: the configured level, with `RUST_LOG` merged in when set.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let config_directives = Self::normalize_level_directives(&self.level);
        let fallback = || {
            tracing_subscriber::EnvFilter::try_new(&config_directives).unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::default()
                    .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
            })
        };

        match std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
        {
            Some(env_directives) => {
                tracing_subscriber::EnvFilter::try_new(format!("{config_directives},{env_directives}"))
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(&env_directives))
                    .unwrap_or_else(|_| fallback())
            }
            None => fallback(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // Keep the message but not the source snippet.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl GeneratorConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    /// Parse and validate a TOML document.
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.utility_class.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "generator.utility_class must not be empty".into(),
            ));
        }
        if self.generator.reserved_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "generator.reserved_prefix must not be empty".into(),
            ));
        }

        let mut kinds = BTreeSet::new();
        for archetype in &self.archetypes {
            if !kinds.insert(archetype.kind.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "archetype kind {} is declared twice",
                    archetype.kind
                )));
            }
            let mut verbs = BTreeSet::new();
            for method in &archetype.methods {
                if !verbs.insert(method.verb.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "archetype {} declares verb {} twice",
                        archetype.kind, method.verb
                    )));
                }
                if !method.is_void() && method.compose.is_none() {
                    return Err(ConfigError::Invalid(format!(
                        "archetype {} method {} returns {} but has no `compose` function",
                        archetype.kind, method.verb, method.result
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn archetype(&self, kind: &str) -> Option<&ArchetypeConfig> {
        self.archetypes.iter().find(|a| a.kind == kind)
    }
}

/// Look for [`CONFIG_FILE_NAME`] in `root`.
pub fn discover_config_path(root: &Path) -> Option<PathBuf> {
    let candidate = root.join(CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

/// Load the config file of `root`, or the defaults when there is none.
pub fn load_for_root(root: &Path) -> Result<(GeneratorConfig, Option<PathBuf>), ConfigError> {
    match discover_config_path(root) {
        Some(path) => Ok((GeneratorConfig::load_from_path(&path)?, Some(path))),
        None => Ok((GeneratorConfig::default(), None)),
    }
}

static TRACING_INIT: Once = Once::new();

/// Installs a global `tracing` subscriber writing to stderr.
///
/// Safe to call more than once; only the first call has an effect.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        let result = if config.json {
            builder.json().with_ansi(false).try_init()
        } else {
            builder.try_init()
        };
        if let Err(err) = result {
            // Another subscriber is already installed (e.g. by an embedding tool).
            tracing::debug!(err = %err, "tracing subscriber already installed");
        }
    });
}
