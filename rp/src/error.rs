//! Prompt error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or rendering prompt templates
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Missing variable '{variable}' for template '{template}'")]
    MissingVariable { template: String, variable: String },

    #[error("Invalid document number {0}: documents are numbered from 1")]
    InvalidDocNum(usize),

    #[error("Invalid template '{name}': {message}")]
    InvalidTemplate { name: String, message: String },

    #[error("Failed to render template '{name}': {message}")]
    Render { name: String, message: String },

    #[error("Failed to read prompt {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PromptError {
    /// Check if this is a missing variable error
    pub fn is_missing_variable(&self) -> bool {
        matches!(self, PromptError::MissingVariable { .. })
    }

    /// Name of the missing variable, if this is a missing variable error
    pub fn missing_variable(&self) -> Option<&str> {
        match self {
            PromptError::MissingVariable { variable, .. } => Some(variable),
            _ => None,
        }
    }
}
