use indexmap::IndexSet;
use log::{debug, warn};

use keel_core::{Detached, DiagramId, ElementId, Project, ViewState};

use super::unknown_element;
use crate::{
    command::{Command, Undoable, Validatable},
    error::{CommandError, ErrorCode, OrderingError, UndoFailure, UndoResult, ValidationError},
    order::RemovalOrder,
};

/// One reversible step of a deletion.
#[derive(Debug, Clone)]
enum Step {
    Unpresent {
        diagram: DiagramId,
        element: ElementId,
        index: usize,
        view: ViewState,
    },
    Detached(Detached),
}

/// Deletes a closed set of elements from the model and from every diagram
/// showing them.
///
/// The set is removed in [`RemovalOrder`], so the exact reverse restores it.
/// When the set has no safe order and [`allow_without_undo`] is set, the
/// elements are removed regardless and the command cannot be undone.
///
/// [`allow_without_undo`]: DeleteElements::allow_without_undo
#[derive(Debug)]
pub struct DeleteElements {
    elements: Vec<ElementId>,
    allow_without_undo: bool,
    journal: Vec<Step>,
    order: Option<Vec<ElementId>>,
    undoable: bool,
}

impl DeleteElements {
    pub fn new(elements: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            elements: elements.into_iter().collect::<IndexSet<_>>().into_iter().collect(),
            allow_without_undo: false,
            journal: Vec::new(),
            order: None,
            undoable: true,
        }
    }

    /// Accepts sets without a safe removal order at the price of undo.
    pub fn allow_without_undo(mut self, allow: bool) -> Self {
        self.allow_without_undo = allow;
        self
    }

    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    /// Removal order used by the last execution, if it had one.
    pub fn order(&self) -> Option<&[ElementId]> {
        self.order.as_deref()
    }

    fn remove_ordered(
        &mut self,
        project: &mut Project,
        order: &[ElementId],
    ) -> Result<(), CommandError> {
        for id in order {
            for diagram_id in project.presence(*id) {
                let removed = project
                    .diagram_mut(diagram_id)
                    .and_then(|diagram| diagram.remove(*id));
                if let Some((index, view)) = removed {
                    self.journal.push(Step::Unpresent {
                        diagram: diagram_id,
                        element: *id,
                        index,
                        view,
                    });
                }
            }
            let detached = project.model_mut().detach(*id)?;
            self.journal.push(Step::Detached(detached));
        }
        Ok(())
    }

    fn remove_unordered(&self, project: &mut Project) -> Result<(), CommandError> {
        for id in &self.elements {
            for diagram_id in project.presence(*id) {
                if let Some(diagram) = project.diagram_mut(diagram_id) {
                    diagram.remove(*id);
                }
            }
        }
        for id in &self.elements {
            project.model_mut().force_detach(*id)?;
        }
        Ok(())
    }

    /// Replays the journal backwards, emptying it.
    fn replay(&mut self, project: &mut Project) -> UndoResult {
        while let Some(step) = self.journal.pop() {
            match step {
                Step::Detached(detached) => {
                    let id = detached.id();
                    project
                        .model_mut()
                        .reattach(detached)
                        .map_err(|err| UndoFailure::new("Delete", err))?;
                    debug!(element:% = id; "Restored deleted element");
                }
                Step::Unpresent {
                    diagram,
                    element,
                    index,
                    view,
                } => {
                    let restored = project
                        .diagram_mut(diagram)
                        .is_some_and(|target| target.insert_at(index, element, view));
                    if !restored {
                        return Err(UndoFailure::new(
                            "Delete",
                            format!("{element} cannot be shown again on {diagram}"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn run(&mut self, project: &mut Project, order: Vec<ElementId>) -> Result<(), CommandError> {
        self.journal.clear();
        if let Err(error) = self.remove_ordered(project, &order) {
            warn!(error:% = error; "Deletion failed, restoring removed elements");
            self.replay(project).map_err(|failure| CommandError::RollbackFailed {
                command: "Delete".to_string(),
                failure,
            })?;
            return Err(error);
        }
        debug!(deleted = order.len(); "Deleted elements");
        self.order = Some(order);
        Ok(())
    }
}

impl Validatable for DeleteElements {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        if self.elements.is_empty() {
            return Err(ValidationError::new(ErrorCode::E104, "nothing to delete"));
        }
        let model = project.model();
        if let Some(missing) = self.elements.iter().find(|id| !model.contains(**id)) {
            return Err(unknown_element(*missing));
        }

        for id in &self.elements {
            let outside: Vec<_> = model
                .required_by(*id)
                .into_iter()
                .filter(|requirer| !self.elements.contains(requirer))
                .collect();
            if !outside.is_empty() {
                let list = outside
                    .iter()
                    .map(ElementId::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(ValidationError::new(
                    ErrorCode::E206,
                    format!("{id} is still required by {list}, which is not being deleted"),
                )
                .with_help("include the dependent elements in the deletion"));
            }
        }

        match RemovalOrder::compute(model, self.elements.iter().copied()) {
            Ok(_) => Ok(()),
            Err(OrderingError::Cycle { .. }) if self.allow_without_undo => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

impl Undoable for DeleteElements {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        if !self.undoable {
            return Err(UndoFailure::new(
                "Delete",
                "the elements were removed without a safe order",
            ));
        }
        self.replay(project)
    }

    fn is_undoable(&self) -> bool {
        self.undoable
    }
}

impl Command for DeleteElements {
    fn description(&self) -> &str {
        "Delete"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        match RemovalOrder::compute(project.model(), self.elements.iter().copied()) {
            Ok(order) => {
                self.undoable = true;
                self.run(project, order.into_vec())
            }
            Err(OrderingError::Cycle { element }) if self.allow_without_undo => {
                warn!(element:% = element, count = self.elements.len(); "No safe removal order, deleting without undo");
                self.journal.clear();
                self.order = None;
                self.undoable = false;
                self.remove_unordered(project)
            }
            Err(error) => Err(ValidationError::from(error).into()),
        }
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        match self.order.clone() {
            Some(order) => self.run(project, order),
            None => self.command_operation(project),
        }
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        self.elements.clone()
    }
}
