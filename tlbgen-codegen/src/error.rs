//! Error types for code generation.

use thiserror::Error;
use tlbgen_model::ModelError;

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Model or reader error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The metadata has a shape the generator does not support.
    #[error("contract violation in '{entry}': {message}")]
    Contract {
        /// Entry being generated.
        entry: String,
        /// Error message.
        message: String,
    },
}

impl CodegenError {
    /// Creates a contract violation for the given entry.
    pub fn contract(entry: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Contract {
            entry: entry.into(),
            message: message.into(),
        }
    }

    /// Returns true if a library could not be loaded.
    #[must_use]
    pub fn is_cannot_load(&self) -> bool {
        matches!(self, Self::Model(err) if err.is_cannot_load())
    }

    /// Returns true for contract violations, including those detected by the model.
    #[must_use]
    pub fn is_contract(&self) -> bool {
        matches!(
            self,
            Self::Contract { .. } | Self::Model(ModelError::Contract { .. })
        )
    }
}
