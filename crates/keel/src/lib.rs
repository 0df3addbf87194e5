//! Keel - an editing engine for linked platform-independent (PIM) and
//! platform-specific (PSM) models.
//!
//! Every change goes through an undoable command; multi-step edits run as
//! transactions that either complete or leave the model untouched.
//! Deletions consult a dependency resolver and remove elements in an order
//! that can be replayed backwards on undo.

pub mod config;

mod confirm;
mod error;

pub use keel_command::{
    Command, CommandController, CommandError, ControllerError, DependencyMap, DependencyScope,
    Dependent, DerivationEdge, ElementHolder, ExecutionEvent, MacroBuilder, MacroCommand,
    Producer, ValidationError, commands, error::ErrorCode,
};
pub use keel_core::{
    Diagram, DiagramId, DiagramKind, Element, ElementId, ElementKind, Id, Model, ModelError,
    Owner, Project, ViewState, pim, psm,
};

pub use confirm::{AcceptDefaults, Confirm};
pub use error::KeelError;

use log::{debug, info};

use keel_command::{
    DependencyResolver,
    commands::{AddToDiagram, CreateClass, DeleteElements, RemoveFromDiagram},
};

use config::AppConfig;

/// An editing session over one project.
///
/// The editor owns the project through its [`CommandController`]; reads go
/// through [`Editor::project`] and every change through a command.
///
/// # Examples
///
/// ```
/// use keel::{DiagramKind, Editor, Id, Project, ViewState, config::AppConfig};
///
/// let mut project = Project::new();
/// let diagram = project.add_diagram(DiagramKind::Pim, Id::new("Overview"));
/// let mut editor = Editor::new(project, AppConfig::default());
///
/// let class = editor
///     .create_class_in_diagram(Id::new("Customer"), diagram, ViewState::default())
///     .unwrap();
/// assert!(editor.project().diagram(diagram).unwrap().is_present(class));
///
/// editor.undo().unwrap();
/// assert!(editor.project().model().is_empty());
/// ```
#[derive(Debug)]
pub struct Editor {
    controller: CommandController,
    config: AppConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Project::new(), AppConfig::default())
    }
}

impl Editor {
    pub fn new(project: Project, config: AppConfig) -> Self {
        let controller =
            CommandController::new(project).with_max_undo_depth(config.history().max_depth());
        Self { controller, config }
    }

    pub fn project(&self) -> &Project {
        self.controller.project()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn into_project(self) -> Project {
        self.controller.into_project()
    }

    /// Validates, executes and records a command.
    pub fn execute(&mut self, command: impl Command + 'static) -> Result<(), KeelError> {
        self.controller.execute(command)?;
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), KeelError> {
        self.controller.undo()?;
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), KeelError> {
        self.controller.redo()?;
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.controller.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.controller.can_redo()
    }

    pub fn undo_caption(&self) -> Option<String> {
        self.controller.undo_caption()
    }

    pub fn redo_caption(&self) -> Option<String> {
        self.controller.redo_caption()
    }

    pub fn undo_descriptions(&self) -> Vec<&str> {
        self.controller.undo_descriptions()
    }

    pub fn redo_descriptions(&self) -> Vec<&str> {
        self.controller.redo_descriptions()
    }

    /// Registers a listener called after every executed top-level command
    /// and each of its macro descendants.
    pub fn on_executed(&mut self, listener: impl FnMut(&ExecutionEvent<'_>) + 'static) {
        self.controller.on_executed(listener);
    }

    /// Creates a class and shows it on `diagram` in one transaction.
    ///
    /// # Errors
    ///
    /// Fails without changes if the class cannot be created or shown.
    pub fn create_class_in_diagram(
        &mut self,
        name: Id,
        diagram: DiagramId,
        view: ViewState,
    ) -> Result<ElementId, KeelError> {
        let create = CreateClass::new(name);
        let class = create.produced();
        let command = MacroBuilder::new("Create class in diagram")
            .command(create)
            .command(AddToDiagram::new(class.clone(), diagram, view))
            .check_first_only()
            .export(&class)
            .build();
        let produced = command.produced();

        self.controller.execute(command)?;
        let id = produced.value();
        info!(class:% = id, diagram:% = diagram; "Created class in diagram");
        Ok(id)
    }

    /// Deletes `elements` and everything depending on them from the model.
    ///
    /// Returns `Ok(false)` if `confirm` declined.
    pub fn delete_from_model(
        &mut self,
        elements: impl IntoIterator<Item = ElementId>,
        confirm: &mut impl Confirm,
    ) -> Result<bool, KeelError> {
        let Some(map) = self.resolve(DependencyScope::Model, elements, confirm) else {
            return Ok(false);
        };
        let deletion = map.deletion_set();
        info!(count = deletion.len(); "Deleting from model");
        self.controller.execute(DeleteElements::new(deletion))?;
        Ok(true)
    }

    /// Hides `elements` and their shown dependents from `diagram`, leaving
    /// the model untouched. Every element must be shown on `diagram`.
    ///
    /// Returns `Ok(false)` if `confirm` declined.
    pub fn remove_from_diagram(
        &mut self,
        diagram: DiagramId,
        elements: impl IntoIterator<Item = ElementId>,
        confirm: &mut impl Confirm,
    ) -> Result<bool, KeelError> {
        self.expect_diagram(diagram)?;
        let elements: Vec<ElementId> = elements.into_iter().collect();
        if let Some(hidden) = elements
            .iter()
            .find(|element| !self.is_shown(diagram, **element))
        {
            return Err(ValidationError::new(
                ErrorCode::E205,
                format!("{hidden} is not shown on {diagram}"),
            )
            .into());
        }
        let Some(map) = self.resolve(DependencyScope::Diagram(diagram), elements, confirm) else {
            return Ok(false);
        };

        let shown: Vec<ElementId> = map
            .deletion_set()
            .into_iter()
            .filter(|element| self.is_shown(diagram, *element))
            .collect();

        let mut builder = MacroBuilder::new("Remove from diagram");
        for element in shown.iter().rev() {
            builder.push(RemoveFromDiagram::new(*element, diagram));
        }
        info!(diagram:% = diagram, count = shown.len(); "Removing from diagram");
        self.controller.execute(builder.build())?;
        Ok(true)
    }

    /// Deletes `elements` and their dependents shown on the PSM `diagram`
    /// from the model.
    ///
    /// With `deletion.allow_unordered` set, a deletion without a safe order
    /// still goes ahead but cannot be undone.
    ///
    /// Returns `Ok(false)` if `confirm` declined.
    pub fn delete_from_psm_diagram(
        &mut self,
        diagram: DiagramId,
        elements: impl IntoIterator<Item = ElementId>,
        confirm: &mut impl Confirm,
    ) -> Result<bool, KeelError> {
        let kind = self.expect_diagram(diagram)?;
        if kind != DiagramKind::Psm {
            return Err(ValidationError::new(
                ErrorCode::E207,
                format!("{diagram} is a {kind} diagram, expected a PSM diagram"),
            )
            .into());
        }
        let Some(map) = self.resolve(DependencyScope::Diagram(diagram), elements, confirm) else {
            return Ok(false);
        };

        let deletion = map.deletion_set();
        info!(diagram:% = diagram, count = deletion.len(); "Deleting from PSM diagram");
        let command = DeleteElements::new(deletion)
            .allow_without_undo(self.config.deletion().allow_unordered());
        self.controller.execute(command)?;
        Ok(true)
    }

    fn expect_diagram(&self, diagram: DiagramId) -> Result<DiagramKind, ValidationError> {
        self.project()
            .diagram(diagram)
            .map(|view| view.kind())
            .ok_or_else(|| {
                ValidationError::new(ErrorCode::E103, format!("{diagram} does not exist"))
            })
    }

    fn is_shown(&self, diagram: DiagramId, element: ElementId) -> bool {
        self.project()
            .diagram(diagram)
            .is_some_and(|view| view.is_present(element))
    }

    /// Resolves dependents and lets `confirm` adjust them. Returns `None` if
    /// the user cancelled.
    fn resolve(
        &self,
        scope: DependencyScope,
        elements: impl IntoIterator<Item = ElementId>,
        confirm: &mut impl Confirm,
    ) -> Option<DependencyMap> {
        let mut map = DependencyResolver::new(self.project(), scope).resolve(elements);
        if map.has_dependents() && !confirm.confirm(&mut map) {
            debug!(scope:? = scope; "Deletion cancelled");
            return None;
        }
        Some(map)
    }
}
