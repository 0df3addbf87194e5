use log::debug;

use keel_core::{DiagramId, ElementId, Project, ViewState};

use super::{expect_diagram, unknown_element};
use crate::{
    command::{Command, MandatoryArgument, Undoable, Validatable},
    error::{CommandError, ErrorCode, UndoFailure, UndoResult, ValidationError},
    holder::ElementHolder,
};

fn missing_diagram(id: DiagramId) -> CommandError {
    ValidationError::new(ErrorCode::E103, format!("{id} does not exist")).into()
}

/// Shows a model element on a diagram.
#[derive(Debug)]
pub struct AddToDiagram {
    element: ElementHolder<ElementId>,
    diagram: DiagramId,
    view: ViewState,
    index: Option<usize>,
}

impl AddToDiagram {
    pub fn new(
        element: impl Into<ElementHolder<ElementId>>,
        diagram: DiagramId,
        view: ViewState,
    ) -> Self {
        Self {
            element: element.into(),
            diagram,
            view,
            index: None,
        }
    }
}

impl Validatable for AddToDiagram {
    fn mandatory_arguments(&self) -> Vec<MandatoryArgument> {
        vec![MandatoryArgument::holder("element", &self.element)]
    }

    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        let diagram = expect_diagram(project, self.diagram)?;
        let element = self.element.value();
        let kind = project
            .model()
            .kind(element)
            .ok_or_else(|| unknown_element(element))?;
        if !kind.is_presentable() {
            return Err(ValidationError::new(
                ErrorCode::E102,
                format!("a {kind} cannot be shown on a diagram on its own"),
            ));
        }
        if !diagram.kind().accepts_psm(kind.is_psm()) {
            return Err(ValidationError::new(
                ErrorCode::E207,
                format!("a {kind} cannot be shown on a {} diagram", diagram.kind()),
            ));
        }
        if diagram.is_present(element) {
            return Err(ValidationError::new(
                ErrorCode::E204,
                format!("{element} is already shown on {}", self.diagram),
            ));
        }
        Ok(())
    }
}

impl Undoable for AddToDiagram {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        let element = self.element.value();
        project
            .diagram_mut(self.diagram)
            .and_then(|diagram| diagram.remove(element))
            .map(|_| ())
            .ok_or_else(|| {
                UndoFailure::new(
                    "Add to diagram",
                    format!("{element} is no longer shown on {}", self.diagram),
                )
            })
    }
}

impl Command for AddToDiagram {
    fn description(&self) -> &str {
        "Add to diagram"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let element = self.element.value();
        let diagram = project
            .diagram_mut(self.diagram)
            .ok_or_else(|| missing_diagram(self.diagram))?;
        let index = diagram.len();
        if !diagram.add(element, self.view) {
            return Err(ValidationError::new(
                ErrorCode::E204,
                format!("{element} is already shown on {}", self.diagram),
            )
            .into());
        }
        self.index = Some(index);
        debug!(element:% = element, diagram:% = self.diagram; "Added element to diagram");
        Ok(())
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let element = self.element.value();
        let diagram = project
            .diagram_mut(self.diagram)
            .ok_or_else(|| missing_diagram(self.diagram))?;
        let index = self.index.unwrap_or(diagram.len());
        if !diagram.insert_at(index, element, self.view) {
            return Err(ValidationError::new(
                ErrorCode::E204,
                format!("{element} cannot be shown again on {}", self.diagram),
            )
            .into());
        }
        Ok(())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        self.element.get().into_iter().collect()
    }
}

/// Hides an element from a diagram; the model is not touched.
#[derive(Debug)]
pub struct RemoveFromDiagram {
    element: ElementId,
    diagram: DiagramId,
    removed: Option<(usize, ViewState)>,
}

impl RemoveFromDiagram {
    pub fn new(element: ElementId, diagram: DiagramId) -> Self {
        Self {
            element,
            diagram,
            removed: None,
        }
    }
}

impl Validatable for RemoveFromDiagram {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        let diagram = expect_diagram(project, self.diagram)?;
        if !diagram.is_present(self.element) {
            return Err(ValidationError::new(
                ErrorCode::E205,
                format!("{} is not shown on {}", self.element, self.diagram),
            ));
        }
        Ok(())
    }
}

impl Undoable for RemoveFromDiagram {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        let (index, view) = self.removed.take().ok_or_else(|| {
            UndoFailure::new("Remove from diagram", "the command has not been executed")
        })?;
        let restored = project
            .diagram_mut(self.diagram)
            .is_some_and(|diagram| diagram.insert_at(index, self.element, view));
        if !restored {
            return Err(UndoFailure::new(
                "Remove from diagram",
                format!("{} cannot be shown again on {}", self.element, self.diagram),
            ));
        }
        Ok(())
    }
}

impl Command for RemoveFromDiagram {
    fn description(&self) -> &str {
        "Remove from diagram"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let removed = project
            .diagram_mut(self.diagram)
            .ok_or_else(|| missing_diagram(self.diagram))?
            .remove(self.element)
            .ok_or_else(|| {
                ValidationError::new(
                    ErrorCode::E205,
                    format!("{} is not shown on {}", self.element, self.diagram),
                )
            })?;
        self.removed = Some(removed);
        debug!(element:% = self.element, diagram:% = self.diagram; "Removed element from diagram");
        Ok(())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        vec![self.element]
    }
}

#[cfg(test)]
mod tests {
    use keel_core::{
        DiagramKind, Id, Model, Owner,
        pim::{Attribute, Class, Multiplicity},
        psm::PsmClass,
    };

    use super::*;

    fn fixture() -> (Project, DiagramId, DiagramId, ElementId) {
        let mut model = Model::new();
        let class = model.add(Class::new(Id::new("Customer")), Owner::Classes).unwrap();
        let mut project = Project::with_model(model);
        let pim = project.add_diagram(DiagramKind::Pim, Id::new("Overview"));
        let psm = project.add_diagram(DiagramKind::Psm, Id::new("Schema"));
        (project, pim, psm, class)
    }

    #[test]
    fn test_add_and_undo_restores_diagram() {
        let (mut project, pim, _, class) = fixture();
        let before = project.clone();
        let mut command = AddToDiagram::new(class, pim, ViewState::new(10.0, 20.0));

        command.execute(&mut project).unwrap();
        let diagram = project.diagram(pim).unwrap();
        assert_eq!(diagram.view_state(class), Some(ViewState::new(10.0, 20.0)));

        command.undo(&mut project).unwrap();
        assert_eq!(project, before);
    }

    #[test]
    fn test_add_rejects_wrong_layer_and_duplicates() {
        let (mut project, pim, psm, class) = fixture();

        let error = AddToDiagram::new(class, psm, ViewState::default())
            .can_execute(&project)
            .unwrap_err();
        assert_eq!(error.code(), ErrorCode::E207);

        AddToDiagram::new(class, pim, ViewState::default())
            .execute(&mut project)
            .unwrap();
        let error = AddToDiagram::new(class, pim, ViewState::default())
            .can_execute(&project)
            .unwrap_err();
        assert_eq!(error.code(), ErrorCode::E204);
    }

    #[test]
    fn test_add_rejects_attributes_and_unknown_diagrams() {
        let (mut project, pim, _, class) = fixture();
        let attribute = project
            .model_mut()
            .add(
                Attribute::new(class, Id::new("email"), Multiplicity::ONE),
                Owner::Attributes(class),
            )
            .unwrap();

        let error = AddToDiagram::new(attribute, pim, ViewState::default())
            .can_execute(&project)
            .unwrap_err();
        assert_eq!(error.code(), ErrorCode::E102);

        let error = AddToDiagram::new(class, DiagramId::new(7), ViewState::default())
            .can_execute(&project)
            .unwrap_err();
        assert_eq!(error.code(), ErrorCode::E103);
    }

    #[test]
    fn test_psm_class_goes_on_psm_diagram() {
        let (mut project, _, psm, class) = fixture();
        let psm_class = project
            .model_mut()
            .add(PsmClass::new(Id::new("CustomerView"), class), Owner::PsmRoots)
            .unwrap();

        AddToDiagram::new(psm_class, psm, ViewState::default())
            .execute(&mut project)
            .unwrap();

        assert!(project.diagram(psm).unwrap().is_present(psm_class));
    }

    #[test]
    fn test_remove_restores_drawing_order_on_undo() {
        let (mut project, pim, _, class) = fixture();
        let other = project
            .model_mut()
            .add(Class::new(Id::new("Order")), Owner::Classes)
            .unwrap();
        for (element, x) in [(class, 1.0), (other, 2.0)] {
            AddToDiagram::new(element, pim, ViewState::new(x, 0.0))
                .execute(&mut project)
                .unwrap();
        }
        let before = project.clone();
        let mut command = RemoveFromDiagram::new(class, pim);

        command.execute(&mut project).unwrap();
        assert!(!project.diagram(pim).unwrap().is_present(class));
        assert!(project.model().contains(class));

        command.undo(&mut project).unwrap();
        assert_eq!(project, before);
        assert_eq!(
            project.diagram(pim).unwrap().elements().collect::<Vec<_>>(),
            vec![class, other]
        );
    }

    #[test]
    fn test_remove_absent_element_is_rejected() {
        let (project, pim, _, class) = fixture();

        let error = RemoveFromDiagram::new(class, pim)
            .can_execute(&project)
            .unwrap_err();

        assert_eq!(error.code(), ErrorCode::E205);
    }
}
