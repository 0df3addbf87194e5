//! Error types of the command engine.
//!
//! Failures are split by who has to react to them:
//!
//! - [`ValidationError`] is expected and user-facing. It carries an
//!   [`ErrorCode`] and is returned by `can_execute` before anything changes.
//! - [`CommandError`] is returned by `execute` and `redo`. Apart from
//!   [`CommandError::RollbackFailed`], the model is unchanged when it is
//!   returned.
//! - [`UndoFailure`] means the model no longer matches what an undo expected.
//!   The controller never retries and drops the remaining undo history.
//! - [`OrderingError`] reports that a set of elements has no safe removal
//!   order.
//! - [`ControllerError`] wraps the above at the controller boundary.

mod error_code;
mod validation;

pub use error_code::ErrorCode;
pub use validation::ValidationError;

use std::fmt;

use keel_core::{ElementId, ModelError};
use thiserror::Error;

/// Failure while executing or redoing a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("model update failed: {0}")]
    Model(#[from] ModelError),

    /// A child of a macro failed and the children that already ran were
    /// compensated.
    #[error("`{command}` was rolled back: {source}")]
    RolledBack {
        command: String,
        #[source]
        source: Box<CommandError>,
    },

    /// Compensating an earlier child failed; the model is left partially
    /// updated.
    #[error("rollback of `{command}` failed: {failure}")]
    RollbackFailed {
        command: String,
        #[source]
        failure: UndoFailure,
    },
}

impl CommandError {
    /// Returns the validation error at the root of this failure, if any.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(error) => Some(error),
            Self::RolledBack { source, .. } => source.validation(),
            Self::Model(_) | Self::RollbackFailed { .. } => None,
        }
    }

    /// Returns `true` if the model may have been left partially updated.
    pub fn is_rollback_failure(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }
}

/// An undo that could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot undo `{command}`: {reason}")]
pub struct UndoFailure {
    command: String,
    reason: String,
}

impl UndoFailure {
    pub fn new(command: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    /// Description of the command whose undo failed.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Result of an undo operation.
pub type UndoResult = Result<(), UndoFailure>;

/// A candidate set that cannot be linearized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OrderingError {
    #[error("element {element} is part of a reference cycle")]
    Cycle { element: ElementId },

    #[error("element {0} does not exist")]
    UnknownElement(ElementId),
}

impl From<OrderingError> for ValidationError {
    fn from(error: OrderingError) -> Self {
        match error {
            OrderingError::Cycle { .. } => ValidationError::new(ErrorCode::E300, error.to_string())
                .with_help("break the structural representative loop or delete without undo"),
            OrderingError::UnknownElement(_) => {
                ValidationError::new(ErrorCode::E101, error.to_string())
            }
        }
    }
}

/// Failures reported by the command controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error(transparent)]
    Command(#[from] CommandError),

    /// The undo history was discarded after an undo failed.
    #[error("{source}; discarded {discarded} command(s) from the undo history")]
    UndoFailed {
        #[source]
        source: UndoFailure,
        discarded: usize,
    },

    /// The redo history was discarded after a redo failed.
    #[error("redo failed: {source}; discarded {discarded} command(s) from the redo history")]
    RedoFailed {
        #[source]
        source: CommandError,
        discarded: usize,
    },
}
