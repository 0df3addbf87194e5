use log::debug;

use keel_core::{ElementId, ElementKind, Id, Owner, Project, pim::Class};

use super::{Creation, check_name, check_unique_name, unknown_element};
use crate::{
    command::{Command, MandatoryArgument, Producer, Undoable, Validatable},
    error::{CommandError, ErrorCode, UndoFailure, UndoResult, ValidationError},
    holder::ElementHolder,
};

/// Creates a PIM class.
#[derive(Debug)]
pub struct CreateClass {
    name: Id,
    produced: ElementHolder<ElementId>,
    creation: Creation,
}

impl CreateClass {
    pub fn new(name: Id) -> Self {
        Self {
            name,
            produced: ElementHolder::new(),
            creation: Creation::default(),
        }
    }
}

impl Validatable for CreateClass {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        check_name(self.name)?;
        check_unique_name(project.model(), project.model().classes(), self.name, None)
    }
}

impl Undoable for CreateClass {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        self.creation.undo(project.model_mut(), "Create class")
    }
}

impl Command for CreateClass {
    fn description(&self) -> &str {
        "Create class"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let id = self
            .creation
            .insert(project.model_mut(), Class::new(self.name), Owner::Classes)?;
        debug!(class:% = id, name:% = self.name; "Created class");
        self.produced.set(id);
        Ok(())
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.creation.redo(project.model_mut()).map(|_| ())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        self.creation.id().into_iter().collect()
    }
}

impl Producer<ElementId> for CreateClass {
    fn produced(&self) -> ElementHolder<ElementId> {
        self.produced.clone()
    }
}

/// Renames a named element of either layer.
///
/// Names must be unique among a class's attributes, among a PSM component's
/// attributes, and among PIM classes.
#[derive(Debug)]
pub struct RenameElement {
    element: ElementHolder<ElementId>,
    name: Id,
    previous: Option<Id>,
}

impl RenameElement {
    pub fn new(element: impl Into<ElementHolder<ElementId>>, name: Id) -> Self {
        Self {
            element: element.into(),
            name,
            previous: None,
        }
    }
}

impl Validatable for RenameElement {
    fn mandatory_arguments(&self) -> Vec<MandatoryArgument> {
        vec![MandatoryArgument::holder("element", &self.element)]
    }

    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        let model = project.model();
        let id = self.element.value();
        let element = model.get(id).ok_or_else(|| unknown_element(id))?;
        if element.name().is_none() {
            return Err(ValidationError::new(
                ErrorCode::E102,
                format!("{} {id} has no name to change", element.kind()),
            ));
        }
        check_name(self.name)?;

        let siblings = match element.kind() {
            ElementKind::Class => Some(model.classes()),
            ElementKind::Attribute | ElementKind::PsmAttribute => model
                .owner(id)
                .and_then(|owner| model.collection(owner)),
            _ => None,
        };
        match siblings {
            Some(siblings) => check_unique_name(model, siblings, self.name, Some(id)),
            None => Ok(()),
        }
    }
}

impl Undoable for RenameElement {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        let previous = self
            .previous
            .ok_or_else(|| UndoFailure::new("Rename", "the command has not been executed"))?;
        let id = self.element.value();
        let current = project.model().get(id).and_then(|element| element.name());
        if current != Some(self.name) {
            return Err(UndoFailure::new(
                "Rename",
                format!("{id} is no longer named `{}`", self.name),
            ));
        }
        project
            .model_mut()
            .set_name(id, previous)
            .map(|_| ())
            .map_err(|err| UndoFailure::new("Rename", err))
    }
}

impl Command for RenameElement {
    fn description(&self) -> &str {
        "Rename"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let id = self.element.value();
        self.previous = project.model_mut().set_name(id, self.name)?;
        debug!(element:% = id, name:% = self.name; "Renamed element");
        Ok(())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        self.element.get().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use keel_core::{
        Model,
        pim::{Attribute, Multiplicity},
    };

    use super::*;

    fn project_with(names: &[&str]) -> (Project, Vec<ElementId>) {
        let mut model = Model::new();
        let ids = names
            .iter()
            .map(|name| model.add(Class::new(Id::new(name)), Owner::Classes).unwrap())
            .collect();
        (Project::with_model(model), ids)
    }

    #[test]
    fn test_create_class_populates_holder() {
        let mut project = Project::new();
        let mut command = CreateClass::new(Id::new("Customer"));
        let produced = command.produced();

        command.execute(&mut project).unwrap();

        let id = produced.value();
        assert_eq!(project.model().class(id).map(Class::name), Some(Id::new("Customer")));
        assert_eq!(command.associated_elements(), vec![id]);
    }

    #[test]
    fn test_create_class_redo_reuses_id() {
        let mut project = Project::new();
        let mut command = CreateClass::new(Id::new("Customer"));
        command.execute(&mut project).unwrap();
        let id = command.produced().value();

        command.undo(&mut project).unwrap();
        assert!(project.model().is_empty());
        command.redo(&mut project).unwrap();

        assert_eq!(project.model().classes(), &[id]);
    }

    #[test]
    fn test_create_class_rejects_duplicate_name() {
        let (project, _) = project_with(&["Customer"]);
        let command = CreateClass::new(Id::new("Customer"));

        let error = command.can_execute(&project).unwrap_err();

        assert_eq!(error.code(), ErrorCode::E200);
    }

    #[test]
    fn test_create_class_rejects_blank_name() {
        let command = CreateClass::new(Id::new("  "));

        let error = command.can_execute(&Project::new()).unwrap_err();

        assert_eq!(error.code(), ErrorCode::E100);
    }

    #[test]
    fn test_rename_round_trip() {
        let (mut project, ids) = project_with(&["Customer"]);
        let before = project.clone();
        let mut command = RenameElement::new(ids[0], Id::new("Client"));

        command.execute(&mut project).unwrap();
        assert_eq!(project.model().class(ids[0]).unwrap().name(), Id::new("Client"));

        command.undo(&mut project).unwrap();
        assert_eq!(project, before);
    }

    #[test]
    fn test_rename_attribute_checks_siblings_only() {
        let (mut project, ids) = project_with(&["A", "B"]);
        let model = project.model_mut();
        let x = model
            .add(Attribute::new(ids[0], Id::new("x"), Multiplicity::ONE), Owner::Attributes(ids[0]))
            .unwrap();
        model
            .add(Attribute::new(ids[0], Id::new("y"), Multiplicity::ONE), Owner::Attributes(ids[0]))
            .unwrap();
        model
            .add(Attribute::new(ids[1], Id::new("z"), Multiplicity::ONE), Owner::Attributes(ids[1]))
            .unwrap();

        assert_eq!(
            RenameElement::new(x, Id::new("y"))
                .can_execute(&project)
                .unwrap_err()
                .code(),
            ErrorCode::E200
        );
        assert!(RenameElement::new(x, Id::new("z")).can_execute(&project).is_ok());
    }

    #[test]
    fn test_undo_rename_fails_after_concurrent_rename() {
        let (mut project, ids) = project_with(&["Customer"]);
        let mut command = RenameElement::new(ids[0], Id::new("Client"));
        command.execute(&mut project).unwrap();
        project.model_mut().set_name(ids[0], Id::new("Buyer")).unwrap();

        assert!(command.undo(&mut project).is_err());
    }
}
