//! Core shared types for symgen.
//!
//! This crate is intentionally small: source locations, the error vocabulary shared by every
//! pipeline stage, and a couple of graph helpers.

use std::fmt;

mod error;
pub mod graph;

pub use error::{Error, GrammarError, ModelError, Result};

/// A location in a grammar source file, as reported by the parsing collaborator.
///
/// Lines and columns are 1-based. A default `SourceRef` (empty file, zero line) stands for
/// "synthesized, no source".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceRef {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl SourceRef {
    #[inline]
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// `true` when this location points into an actual source file.
    pub fn is_known(&self) -> bool {
        !self.file.is_empty() || self.line != 0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_known() {
            return f.write_str("<synthetic>");
        }
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
