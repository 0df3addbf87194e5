//! Composite commands executed as one transaction.

use indexmap::IndexSet;
use log::{debug, error, warn};

use keel_core::{ElementId, Project};

use crate::{
    command::{Command, Producer, Undoable, Validatable},
    error::{CommandError, ErrorCode, UndoResult, ValidationError},
    holder::ElementHolder,
};

/// A child holder whose value the macro republishes after execution.
#[derive(Debug)]
struct Export {
    source: ElementHolder<ElementId>,
    target: ElementHolder<ElementId>,
}

/// Assembles a [`MacroCommand`].
///
/// Assembly may consult the model and the user; nothing is mutated until the
/// built macro is executed.
///
/// # Examples
///
/// ```
/// use keel_command::{MacroBuilder, commands::{AddToDiagram, CreateClass}, Producer};
/// use keel_core::{DiagramId, Id, ViewState};
///
/// let create = CreateClass::new(Id::new("Customer"));
/// let class = create.produced();
///
/// let command = MacroBuilder::new("Create class in diagram")
///     .command(create)
///     .command(AddToDiagram::new(class.clone(), DiagramId::new(0), ViewState::default()))
///     .check_first_only()
///     .export(&class)
///     .build();
///
/// assert_eq!(command.len(), 2);
/// ```
#[derive(Debug)]
pub struct MacroBuilder {
    description: String,
    children: Vec<Box<dyn Command>>,
    check_first_only: bool,
    exports: Vec<Export>,
}

impl MacroBuilder {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            children: Vec::new(),
            check_first_only: false,
            exports: Vec::new(),
        }
    }

    /// Appends a child command.
    pub fn command(mut self, command: impl Command + 'static) -> Self {
        self.push(command);
        self
    }

    /// Appends a child command in place.
    pub fn push(&mut self, command: impl Command + 'static) -> &mut Self {
        self.children.push(Box::new(command));
        self
    }

    /// Appends an already boxed child command.
    pub fn push_boxed(&mut self, command: Box<dyn Command>) -> &mut Self {
        self.children.push(command);
        self
    }

    /// Only validate the first child in `can_execute`.
    ///
    /// Use when later children read holders the first child populates.
    pub fn check_first_only(mut self) -> Self {
        self.check_first_only = true;
        self
    }

    /// Republishes a child's produced value through the macro.
    ///
    /// The first export is what the macro's [`Producer`] implementation
    /// returns.
    pub fn export(mut self, source: &ElementHolder<ElementId>) -> Self {
        self.exports.push(Export {
            source: source.clone(),
            target: ElementHolder::new(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn build(self) -> MacroCommand {
        MacroCommand {
            description: self.description,
            children: self.children,
            check_first_only: self.check_first_only,
            exports: self.exports,
        }
    }
}

/// An ordered list of commands executed, undone and redone as a unit.
///
/// If a child fails during execution or redo, the children that already ran
/// are undone in reverse, so the macro has no net effect.
#[derive(Debug)]
pub struct MacroCommand {
    description: String,
    children: Vec<Box<dyn Command>>,
    check_first_only: bool,
    exports: Vec<Export>,
}

impl MacroCommand {
    pub fn children(&self) -> &[Box<dyn Command>] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn checks_first_only(&self) -> bool {
        self.check_first_only
    }

    /// Holders republishing child values, in export order.
    pub fn exports(&self) -> Vec<ElementHolder<ElementId>> {
        self.exports
            .iter()
            .map(|export| export.target.clone())
            .collect()
    }

    /// Undoes `self.children[..count]` in reverse after a failure.
    fn compensate(&mut self, project: &mut Project, count: usize) -> Result<(), CommandError> {
        for child in self.children[..count].iter_mut().rev() {
            if let Err(failure) = child.undo(project) {
                error!(
                    command = self.description.as_str(),
                    child = failure.command();
                    "Compensation failed, transaction is partially applied"
                );
                return Err(CommandError::RollbackFailed {
                    command: self.description.clone(),
                    failure,
                });
            }
        }
        Ok(())
    }

    /// Runs `step` on each child in order, compensating on the first failure.
    fn run_forward(
        &mut self,
        project: &mut Project,
        step: fn(&mut (dyn Command + 'static), &mut Project) -> Result<(), CommandError>,
    ) -> Result<(), CommandError> {
        for index in 0..self.children.len() {
            let Err(error) = step(self.children[index].as_mut(), project) else {
                continue;
            };
            if error.is_rollback_failure() {
                return Err(error);
            }
            warn!(
                command = self.description.as_str(),
                failed_child = index,
                error:% = error;
                "Child command failed, rolling back"
            );
            self.compensate(project, index)?;
            return Err(CommandError::RolledBack {
                command: self.description.clone(),
                source: Box::new(error),
            });
        }
        Ok(())
    }
}

impl Validatable for MacroCommand {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        let Some(first) = self.children.first() else {
            return Err(ValidationError::new(
                ErrorCode::E104,
                format!("`{}` contains no commands", self.description),
            ));
        };
        if self.check_first_only {
            return first.can_execute(project);
        }
        self.children
            .iter()
            .try_for_each(|child| child.can_execute(project))
    }
}

impl Undoable for MacroCommand {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        for child in self.children.iter_mut().rev() {
            child.undo(project)?;
        }
        Ok(())
    }

    fn is_undoable(&self) -> bool {
        self.children.iter().all(|child| child.is_undoable())
    }
}

impl Command for MacroCommand {
    fn description(&self) -> &str {
        &self.description
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        debug!(command = self.description.as_str(), children = self.children.len(); "Executing macro");
        self.run_forward(project, |child, project| child.execute(project))
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.run_forward(project, |child, project| child.redo(project))
    }

    fn commands_executed(&mut self) {
        for export in &self.exports {
            if let Some(value) = export.source.get() {
                export.target.set(value);
            }
        }
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        self.children
            .iter()
            .flat_map(|child| child.associated_elements())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    fn as_macro(&self) -> Option<&MacroCommand> {
        Some(self)
    }
}

impl Producer<ElementId> for MacroCommand {
    /// The first exported holder, or an empty holder if nothing is exported.
    fn produced(&self) -> ElementHolder<ElementId> {
        self.exports
            .first()
            .map(|export| export.target.clone())
            .unwrap_or_default()
    }
}
