//! Error kinds raised by construction, validation and schema declaration
//!
//! Every error aborts the enclosing operation. Nothing here is retried.

use thiserror::Error;

/// Raised while constructing or mutating an instance
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// A required field without a default was not supplied
    #[error("Missing argument to {class}: {field}")]
    MissingArgument { class: String, field: String },

    /// Supplied keys that do not match any declared field
    #[error("Invalid argument to {class}: {}", .keys.join(", "))]
    InvalidArguments { class: String, keys: Vec<String> },

    /// Assignment to a field the schema does not declare
    #[error("{class} has no field named {field}")]
    UnknownField { class: String, field: String },
}

/// Raised during validate, dump and load
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Runtime type does not match the declared kind (strict mode)
    #[error("{path}: \"{value}\" is not a {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        value: String,
    },

    /// No conversion to the declared kind is defined for this value
    #[error("{path}: cannot convert \"{value}\" to {expected}: {reason}")]
    Coercion {
        path: String,
        expected: &'static str,
        value: String,
        reason: String,
    },

    /// Fixed-arity tuple with the wrong number of elements
    #[error("{path} should have length {expected} (got {actual})")]
    Length {
        path: String,
        expected: usize,
        actual: usize,
    },

    /// Reference field holding something other than an instance of the expected class
    #[error("{path}: object is not of required type {expected} (got {found})")]
    NotInstance {
        path: String,
        expected: String,
        found: String,
    },

    /// Tag encountered on load that no schema was registered under
    #[error("unknown tag: {tag}")]
    UnknownTag { tag: String },

    /// Mapping node without a tag where a field value was expected
    #[error("{path}: untagged mapping cannot be used as a field value")]
    UntaggedMapping { path: String },
}

impl ValidationError {
    /// Field path the error was reported at, if it has one
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::Coercion { path, .. }
            | Self::Length { path, .. }
            | Self::NotInstance { path, .. }
            | Self::UntaggedMapping { path } => Some(path),
            Self::UnknownTag { .. } => None,
        }
    }

    /// Prefix the path with the field of the enclosing instance
    pub fn within(mut self, outer: &str) -> Self {
        match &mut self {
            Self::TypeMismatch { path, .. }
            | Self::Coercion { path, .. }
            | Self::Length { path, .. }
            | Self::NotInstance { path, .. }
            | Self::UntaggedMapping { path } => {
                *path = format!("{outer}.{path}");
            }
            Self::UnknownTag { .. } => {}
        }
        self
    }
}

/// Configuration errors detected while declaring or registering schemas
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The same field name was declared twice in one schema
    #[error("schema {schema} declares field {field} more than once")]
    DuplicateField { schema: String, field: String },

    /// A second schema was registered under an existing tag
    #[error("tag {tag} is already registered")]
    DuplicateTag { tag: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_arguments_lists_keys() {
        let err = ArgumentError::InvalidArguments {
            class: "Station".to_string(),
            keys: vec!["foo".to_string(), "bar".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid argument to Station: foo, bar");
    }

    #[test]
    fn within_prefixes_path() {
        let err = ValidationError::TypeMismatch {
            path: "gain".to_string(),
            expected: "float",
            value: "abc".to_string(),
        }
        .within("response");

        assert_eq!(err.path(), Some("response.gain"));
        assert_eq!(err.to_string(), "response.gain: \"abc\" is not a float");
    }

    #[test]
    fn unknown_tag_has_no_path() {
        let err = ValidationError::UnknownTag { tag: "x.Nope".to_string() }.within("outer");
        assert_eq!(err.path(), None);
        assert!(err.to_string().contains("x.Nope"));
    }
}
