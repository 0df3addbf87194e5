//! Error types for Keel editor operations.

use thiserror::Error;

use keel_command::{CommandError, ControllerError, ValidationError};

/// The main error type of the editor facade.
#[derive(Debug, Error)]
pub enum KeelError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl From<ValidationError> for KeelError {
    fn from(error: ValidationError) -> Self {
        Self::Command(error.into())
    }
}

impl KeelError {
    /// The validation error behind this failure, if it was a rejection.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Command(error) => error.validation(),
            Self::Controller(ControllerError::Command(error)) => error.validation(),
            Self::Controller(ControllerError::RedoFailed { source, .. }) => source.validation(),
            _ => None,
        }
    }
}
