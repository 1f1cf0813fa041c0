/// Errors produced while requiring, filtering or assigning parameters.
///
/// Every variant is a deterministic validation failure: retrying the same
/// call with the same input and configuration fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A required key was absent or blank.
    #[error("key not found: {key}")]
    ParameterMissing {
        /// The key that was required
        key: String,
    },

    /// One or more input keys had no matching declaration.
    #[error("found unpermitted parameters: {}", keys.join(", "))]
    UnpermittedParameters {
        /// Rejected keys, in input order
        keys: Vec<String>,
    },

    /// Bulk assignment was attempted from parameters that were never permitted.
    #[error("forbidden attributes: parameters have not been permitted")]
    ForbiddenAttributes,

    /// A declaration could not be parsed.
    #[error("invalid declaration: {message}")]
    InvalidDeclaration {
        /// What was wrong with the declaration
        message: String,
    },

    /// Decoded input was expected to be a mapping at the top level.
    #[error("expected a mapping at the top level, found {found}")]
    NotAnObject {
        /// The kind of value that was found instead
        found: &'static str,
    },
}

impl Error {
    /// Creates a `ParameterMissing` error for `key`.
    pub fn missing(key: impl Into<String>) -> Self {
        Error::ParameterMissing { key: key.into() }
    }

    /// Creates an `UnpermittedParameters` error for `keys`.
    pub fn unpermitted(keys: Vec<String>) -> Self {
        Error::UnpermittedParameters { keys }
    }

    pub(crate) fn invalid_declaration(message: impl Into<String>) -> Self {
        Error::InvalidDeclaration {
            message: message.into(),
        }
    }

    /// Returns the missing key, if this is a `ParameterMissing` error.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::ParameterMissing { key } => Some(key.as_str()),
            _ => None,
        }
    }

    /// Returns the rejected keys, if this is an `UnpermittedParameters` error.
    pub fn keys(&self) -> Option<&[String]> {
        match self {
            Error::UnpermittedParameters { keys } => Some(keys.as_slice()),
            _ => None,
        }
    }
}
