use crate::SourceRef;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A violation of a model invariant that is not tied to one syntax node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("duplicate type name {name}")]
    DuplicateType { name: String },

    #[error("type name {name} clashes with {existing} on case-insensitive file systems")]
    CaseInsensitiveClash { name: String, existing: String },

    #[error("duplicate method {signature} in {owner}")]
    DuplicateMethod { owner: String, signature: String },

    #[error("unknown type {name} referenced from {context}")]
    UnknownType { name: String, context: String },

    #[error("cannot unify {formal} with {actual}: {reason}")]
    Unification {
        formal: String,
        actual: String,
        reason: String,
    },

    #[error("type argument count mismatch for {name}: expected {expected}, found {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("name clash in {owner}: `{first}` and `{second}` have the same erasure {signature}")]
    NameClash {
        owner: String,
        signature: String,
        first: String,
        second: String,
    },

    #[error("ambiguous delegate {signature} for {class}: {}", candidates.join(", "))]
    Ambiguous {
        class: String,
        signature: String,
        candidates: Vec<String>,
    },

    #[error("method {method} in {owner} uses the reserved prefix {prefix}")]
    ReservedName {
        owner: String,
        method: String,
        prefix: String,
    },

    #[error("illegal state transition for {method}: {reason}")]
    IllegalTransition { method: String, reason: String },

    #[error("{owner} does not implement {method}")]
    MissingImplementation { owner: String, method: String },

    #[error("cyclic inheritance involving {}", members.join(" -> "))]
    Cycle { members: Vec<String> },

    #[error("{0}")]
    Invalid(String),
}

/// An error discovered while walking a specific syntax node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{location}: {message}")]
pub struct GrammarError {
    pub location: SourceRef,
    pub message: String,
    #[source]
    pub cause: Option<ModelError>,
}

impl GrammarError {
    pub fn new(location: SourceRef, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
            cause: None,
        }
    }

    /// Annotate a model error with the location of the node that triggered it.
    pub fn at(location: SourceRef, cause: ModelError) -> Self {
        Self {
            location,
            message: cause.to_string(),
            cause: Some(cause),
        }
    }
}

/// Any error the pipeline can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

impl Error {
    /// The underlying model error, if any (directly, or as the cause of a grammar error).
    pub fn model_error(&self) -> Option<&ModelError> {
        match self {
            Error::Model(err) => Some(err),
            Error::Grammar(err) => err.cause.as_ref(),
        }
    }

    /// Attach a source location unless one is already present.
    pub fn located(self, location: &SourceRef) -> Self {
        match self {
            Error::Model(err) if location.is_known() => {
                Error::Grammar(GrammarError::at(location.clone(), err))
            }
            other => other,
        }
    }
}
