//! The command contract.
//!
//! A command is split into capability traits:
//!
//! - [`Validatable`]: the pure `can_execute` check.
//! - [`Undoable`]: reversal using state captured during execution.
//! - [`Command`]: the forward operation, redo, and the record of touched
//!   elements.
//! - [`Producer`]: commands that create an element and publish its id through
//!   an [`ElementHolder`].
//!
//! Implementors provide the `*_operation` methods; callers use the provided
//! [`Command::execute`], [`Command::undo`] and [`Command::redo`].

use std::fmt;

use log::debug;

use keel_core::{ElementId, Project};

use crate::{
    error::{CommandError, ErrorCode, UndoResult, ValidationError},
    holder::ElementHolder,
    macro_command::MacroCommand,
};

/// A declared argument that must be set before a command can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MandatoryArgument {
    name: &'static str,
    is_set: bool,
}

impl MandatoryArgument {
    pub fn new(name: &'static str, is_set: bool) -> Self {
        Self { name, is_set }
    }

    /// An argument bound through an element holder.
    pub fn holder<T>(name: &'static str, holder: &ElementHolder<T>) -> Self {
        Self::new(name, holder.has_value())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_set(&self) -> bool {
        self.is_set
    }
}

/// Validation half of the command contract.
pub trait Validatable {
    /// Arguments that must be set before any other rule is checked.
    fn mandatory_arguments(&self) -> Vec<MandatoryArgument> {
        Vec::new()
    }

    /// Checks the command's domain rules.
    ///
    /// Only called once every mandatory argument is set.
    fn validate(&self, project: &Project) -> Result<(), ValidationError>;

    /// Checks whether the command can run against `project`.
    ///
    /// Never mutates anything. Fails with [`ErrorCode::E100`] for the first
    /// unset mandatory argument, otherwise with the first broken domain rule.
    fn can_execute(&self, project: &Project) -> Result<(), ValidationError> {
        if let Some(missing) = self
            .mandatory_arguments()
            .into_iter()
            .find(|argument| !argument.is_set())
        {
            return Err(ValidationError::new(
                ErrorCode::E100,
                format!("argument `{}` is not set", missing.name()),
            ));
        }
        self.validate(project)
    }
}

/// Reversal half of the command contract.
pub trait Undoable {
    /// Reverses the last execution using state captured by it.
    ///
    /// A failure means the model no longer matches what the command
    /// recorded. It is never retried.
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult;

    /// Returns `false` if the last execution cannot be undone.
    ///
    /// Queried after execution; the controller drops its history instead of
    /// recording such a command.
    fn is_undoable(&self) -> bool {
        true
    }
}

/// An atomic, undoable mutation of a [`Project`].
pub trait Command: Validatable + Undoable + fmt::Debug {
    /// Human-readable label, shown as "Undo <description>".
    fn description(&self) -> &str;

    /// Performs the mutation.
    ///
    /// Either succeeds completely or leaves the project unchanged.
    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError>;

    /// Re-applies the mutation after an undo.
    ///
    /// Commands whose forward operation would pick a new id or index override
    /// this to replay what the original execution recorded.
    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.command_operation(project)
    }

    /// Hook run after a successful execution or redo.
    fn commands_executed(&mut self) {}

    /// Elements touched by the last execution.
    fn associated_elements(&self) -> Vec<ElementId>;

    /// Returns `Some` for composite commands.
    fn as_macro(&self) -> Option<&MacroCommand> {
        None
    }

    /// Validates, then performs the mutation.
    fn execute(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.can_execute(project)?;
        debug!(command = self.description(); "Executing command");
        self.command_operation(project)?;
        self.commands_executed();
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> UndoResult {
        debug!(command = self.description(); "Undoing command");
        self.undo_operation(project)
    }

    fn redo(&mut self, project: &mut Project) -> Result<(), CommandError> {
        debug!(command = self.description(); "Redoing command");
        self.redo_operation(project)?;
        self.commands_executed();
        Ok(())
    }
}

/// A command that creates a value later commands may consume.
pub trait Producer<T> {
    /// Holder the created value is written to during execution.
    fn produced(&self) -> ElementHolder<T>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NeedsHolder {
        target: ElementHolder<ElementId>,
    }

    impl Validatable for NeedsHolder {
        fn mandatory_arguments(&self) -> Vec<MandatoryArgument> {
            vec![MandatoryArgument::holder("target", &self.target)]
        }

        fn validate(&self, project: &Project) -> Result<(), ValidationError> {
            if project.model().contains(self.target.value()) {
                Ok(())
            } else {
                Err(ValidationError::new(ErrorCode::E101, "missing"))
            }
        }
    }

    #[test]
    fn test_unset_mandatory_argument_fails_first() {
        let command = NeedsHolder {
            target: ElementHolder::new(),
        };

        let error = command.can_execute(&Project::new()).unwrap_err();

        assert_eq!(error.code(), ErrorCode::E100);
        assert_eq!(error.message(), "argument `target` is not set");
    }

    #[test]
    fn test_domain_rules_run_once_arguments_are_set() {
        let command = NeedsHolder {
            target: ElementHolder::with_value(ElementId::new(1)),
        };

        let error = command.can_execute(&Project::new()).unwrap_err();

        assert_eq!(error.code(), ErrorCode::E101);
    }
}
