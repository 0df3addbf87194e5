//! The command controller: executes commands and keeps undo/redo history.

use log::{debug, info, warn};

use keel_core::Project;

use crate::{
    command::Command,
    error::{CommandError, ControllerError},
    macro_command::MacroCommand,
};

/// Notification published after a top-level command completes.
///
/// One event is published for the top-level command, then one for every
/// descendant of a macro, depth first.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionEvent<'a> {
    pub command: &'a dyn Command,
    pub is_part_of_macro: bool,
    pub owning_macro: Option<&'a MacroCommand>,
}

type Listener = Box<dyn FnMut(&ExecutionEvent<'_>)>;

/// Executes commands against a [`Project`] and owns their history.
///
/// The controller is the only writer of its project. Executing a new command
/// clears the redo stack. A failed undo discards the failing command together
/// with everything older on the undo stack.
pub struct CommandController {
    project: Project,
    undo_stack: Vec<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    listeners: Vec<Listener>,
    max_undo_depth: Option<usize>,
}

impl CommandController {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            listeners: Vec::new(),
            max_undo_depth: None,
        }
    }

    /// Limits how many commands the undo stack keeps; the oldest are dropped
    /// first.
    pub fn with_max_undo_depth(mut self, max_undo_depth: Option<usize>) -> Self {
        self.max_undo_depth = max_undo_depth;
        self.trim_undo_stack();
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn into_project(self) -> Project {
        self.project
    }

    /// Registers a listener for [`ExecutionEvent`]s.
    pub fn on_executed(&mut self, listener: impl FnMut(&ExecutionEvent<'_>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn execute(&mut self, command: impl Command + 'static) -> Result<(), ControllerError> {
        self.execute_boxed(Box::new(command))
    }

    /// Validates and executes a top-level command, then records it.
    ///
    /// # Errors
    ///
    /// Validation and rolled-back failures leave the project and the history
    /// untouched. If a rollback failed, the undo history is discarded.
    pub fn execute_boxed(&mut self, mut command: Box<dyn Command>) -> Result<(), ControllerError> {
        if let Err(error) = command.can_execute(&self.project) {
            debug!(command = command.description(), error:% = error; "Command rejected");
            return Err(CommandError::from(error).into());
        }

        if let Err(error) = command.execute(&mut self.project) {
            if error.is_rollback_failure() {
                let discarded = self.undo_stack.len() + self.redo_stack.len();
                self.clear_history();
                warn!(command = command.description(), discarded:?; "Rollback failed, discarded history");
            }
            return Err(error.into());
        }

        info!(command = command.description(); "Executed command");
        Self::notify(&mut self.listeners, command.as_ref());

        if command.is_undoable() {
            self.redo_stack.clear();
            self.undo_stack.push(command);
            self.trim_undo_stack();
        } else {
            let discarded = self.undo_stack.len() + self.redo_stack.len();
            self.clear_history();
            warn!(command = command.description(), discarded:?; "Executed command cannot be undone, discarded history");
        }
        Ok(())
    }

    /// Undoes the most recent command.
    ///
    /// # Errors
    ///
    /// [`ControllerError::UndoFailed`] if the command could not be undone. The
    /// failing command and all older undo entries are discarded; the redo
    /// stack is kept.
    pub fn undo(&mut self) -> Result<(), ControllerError> {
        let mut command = self.undo_stack.pop().ok_or(ControllerError::NothingToUndo)?;

        match command.undo(&mut self.project) {
            Ok(()) => {
                info!(command = command.description(); "Undid command");
                self.redo_stack.push(command);
                Ok(())
            }
            Err(source) => {
                let discarded = self.undo_stack.len() + 1;
                self.undo_stack.clear();
                warn!(command = command.description(), discarded:?, reason = source.reason(); "Undo failed, discarded undo history");
                Err(ControllerError::UndoFailed { source, discarded })
            }
        }
    }

    /// Re-applies the most recently undone command.
    ///
    /// # Errors
    ///
    /// [`ControllerError::RedoFailed`] if the command could not be redone; the
    /// redo stack is discarded.
    pub fn redo(&mut self) -> Result<(), ControllerError> {
        let mut command = self.redo_stack.pop().ok_or(ControllerError::NothingToRedo)?;

        match command.redo(&mut self.project) {
            Ok(()) => {
                info!(command = command.description(); "Redid command");
                self.undo_stack.push(command);
                self.trim_undo_stack();
                Ok(())
            }
            Err(source) => {
                let discarded = self.redo_stack.len() + 1;
                self.redo_stack.clear();
                if source.is_rollback_failure() {
                    self.undo_stack.clear();
                }
                warn!(command = command.description(), discarded:?, error:% = source; "Redo failed, discarded redo history");
                Err(ControllerError::RedoFailed { source, discarded })
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Caption for an undo action, e.g. "Undo Rename class".
    pub fn undo_caption(&self) -> Option<String> {
        self.undo_stack
            .last()
            .map(|command| format!("Undo {}", command.description()))
    }

    /// Caption for a redo action, e.g. "Redo Rename class".
    pub fn redo_caption(&self) -> Option<String> {
        self.redo_stack
            .last()
            .map(|command| format!("Redo {}", command.description()))
    }

    /// Undo stack descriptions, most recent first.
    pub fn undo_descriptions(&self) -> Vec<&str> {
        self.undo_stack
            .iter()
            .rev()
            .map(|command| command.description())
            .collect()
    }

    /// Redo stack descriptions, next to redo first.
    pub fn redo_descriptions(&self) -> Vec<&str> {
        self.redo_stack
            .iter()
            .rev()
            .map(|command| command.description())
            .collect()
    }

    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn trim_undo_stack(&mut self) {
        let Some(max) = self.max_undo_depth else {
            return;
        };
        if self.undo_stack.len() > max {
            let excess = self.undo_stack.len() - max;
            self.undo_stack.drain(..excess);
            debug!(dropped = excess; "Trimmed undo history");
        }
    }

    fn notify(listeners: &mut [Listener], command: &dyn Command) {
        if listeners.is_empty() {
            return;
        }
        let event = ExecutionEvent {
            command,
            is_part_of_macro: false,
            owning_macro: None,
        };
        listeners.iter_mut().for_each(|listener| listener(&event));
        if let Some(macro_command) = command.as_macro() {
            Self::notify_children(listeners, macro_command);
        }
    }

    fn notify_children(listeners: &mut [Listener], macro_command: &MacroCommand) {
        for child in macro_command.children() {
            let event = ExecutionEvent {
                command: child.as_ref(),
                is_part_of_macro: true,
                owning_macro: Some(macro_command),
            };
            listeners.iter_mut().for_each(|listener| listener(&event));
            if let Some(nested) = child.as_macro() {
                Self::notify_children(listeners, nested);
            }
        }
    }
}

impl std::fmt::Debug for CommandController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandController")
            .field("undo", &self.undo_descriptions())
            .field("redo", &self.redo_descriptions())
            .field("listeners", &self.listeners.len())
            .field("max_undo_depth", &self.max_undo_depth)
            .finish_non_exhaustive()
    }
}
