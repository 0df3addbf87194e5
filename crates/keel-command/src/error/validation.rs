//! The [`ValidationError`] type reported by `can_execute`.

use std::fmt;

use crate::error::ErrorCode;

/// A user-facing reason why a command cannot execute.
///
/// Validation never mutates the model, so this error always means "nothing
/// happened".
///
/// # Example
///
/// ```
/// # use keel_command::error::{ErrorCode, ValidationError};
/// let error = ValidationError::new(ErrorCode::E202, "`Person` would inherit from itself")
///     .with_help("remove the generalization from `Student` to `Person` first");
///
/// assert_eq!(error.to_string(), "error[E202]: `Person` would inherit from itself");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    code: ErrorCode,
    message: String,
    help: Option<String>,
}

impl ValidationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            help: None,
        }
    }

    /// Attaches a suggestion for resolving the error.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}
