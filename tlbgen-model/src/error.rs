//! Error types for the metadata model and manifest parsing.

use crate::reader::Status;
use crate::types::RefHandle;
use thiserror::Error;

/// Error type for manifest parsing operations.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Unknown element encountered.
    #[error("unknown element '{element}' in context '{context}'")]
    UnknownElement {
        /// Element name.
        element: String,
        /// Parent context.
        context: String,
    },

    /// Malformed type expression.
    #[error("invalid type expression '{expr}'")]
    InvalidType {
        /// Offending expression.
        expr: String,
    },

    /// Invalid manifest structure.
    #[error("invalid manifest structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },
}

impl ParseError {
    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates an unknown element error.
    pub fn unknown_element(element: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnknownElement {
            element: element.into(),
            context: context.into(),
        }
    }

    /// Creates an invalid structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}

/// Error type for operations on the type-library model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The library itself could not be opened.
    #[error("type library '{path}' cannot be loaded: {reason}")]
    CannotLoadLibrary {
        /// Library location.
        path: String,
        /// Why loading failed.
        reason: String,
    },

    /// A reader call failed.
    #[error("reader call '{call}' failed with {status}")]
    External {
        /// Name of the failing call.
        call: &'static str,
        /// Status reported by the reader.
        status: Status,
    },

    /// A type reference could not be resolved.
    #[error("reference {reference} could not be resolved ({status})")]
    Resolution {
        /// Unresolved reference.
        reference: RefHandle,
        /// Status reported by the reader.
        status: Status,
    },

    /// The reader reported a shape the model does not accept.
    #[error("contract violation: {message}")]
    Contract {
        /// Error message.
        message: String,
    },

    /// Manifest parsing error.
    #[error("manifest error: {0}")]
    Parse(#[from] ParseError),
}

impl ModelError {
    /// Creates a reader-call failure.
    pub fn external(call: &'static str, status: Status) -> Self {
        Self::External { call, status }
    }

    /// Creates a contract violation.
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract {
            message: message.into(),
        }
    }

    /// Returns the reader status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::External { status, .. } | Self::Resolution { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the reader reported that a library could not be loaded.
    #[must_use]
    pub fn is_cannot_load(&self) -> bool {
        matches!(self, Self::CannotLoadLibrary { .. })
            || self.status() == Some(Status::CANT_LOAD_LIBRARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::missing_attr("enum", "name");
        assert_eq!(
            err.to_string(),
            "missing required attribute 'name' on element 'enum'"
        );

        let err = ParseError::invalid_attr("union", "alignment", "x");
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn test_model_error_status() {
        let err = ModelError::external("type_info", Status::CANT_LOAD_LIBRARY);
        assert_eq!(err.status(), Some(Status::CANT_LOAD_LIBRARY));
        assert!(err.is_cannot_load());

        let err = ModelError::Resolution {
            reference: RefHandle(7),
            status: Status::ELEMENT_NOT_FOUND,
        };
        assert_eq!(err.status(), Some(Status::ELEMENT_NOT_FOUND));
        assert!(!err.is_cannot_load());

        let err = ModelError::contract("bad shape");
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "contract violation: bad shape");
    }

    #[test]
    fn test_cannot_load_library() {
        let err = ModelError::CannotLoadLibrary {
            path: "missing.xml".to_string(),
            reason: "not found".to_string(),
        };
        assert!(err.is_cannot_load());
        assert!(err.to_string().contains("missing.xml"));
    }

    #[test]
    fn test_from_parse_error() {
        let err: ModelError = ParseError::structure("no typelib element").into();
        assert!(matches!(err, ModelError::Parse(_)));
    }
}
