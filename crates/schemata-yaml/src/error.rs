//! Codec error types

use schemata_core::{ArgumentError, ValidationError};
use thiserror::Error;

/// Errors raised while dumping or loading documents
#[derive(Debug, Error)]
pub enum CodecError {
    /// Malformed YAML or emitter failure
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Instance construction failed while loading
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// Validation failed while dumping or loading
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Dumped instance whose schema is not in the registry
    #[error("class {class} is not registered")]
    Unregistered { class: String },

    /// Document that is not a tagged mapping
    #[error("document is not a tagged mapping (found {found})")]
    NotAnObject { found: String },

    /// Tagged node whose content is not a mapping
    #[error("node tagged {tag} is not a mapping")]
    NotAMapping { tag: String },

    /// Mapping key that is not a string
    #[error("mapping keys must be strings (found {found})")]
    InvalidKey { found: String },

    /// Nesting deeper than the loader accepts
    #[error("nesting deeper than {max_depth} levels")]
    RecursionLimitExceeded { max_depth: usize },

    /// Single-document load found zero or several documents
    #[error("expected exactly one document, found {found}")]
    DocumentCount { found: usize },
}

impl CodecError {
    /// The validation error behind this failure, if any
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}
