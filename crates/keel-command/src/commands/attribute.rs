use log::debug;

use keel_core::{
    ElementId, ElementKind, Id, Owner, Project,
    pim::{Attribute, Multiplicity},
};

use super::{
    Creation, Removal, check_multiplicity, check_name, check_unique_name, check_unreferenced,
    expect_kind,
};
use crate::{
    command::{Command, MandatoryArgument, Producer, Undoable, Validatable},
    error::{CommandError, UndoFailure, UndoResult, ValidationError},
    holder::ElementHolder,
};

/// Appends an attribute to a PIM class.
#[derive(Debug)]
pub struct AddAttribute {
    class: ElementHolder<ElementId>,
    name: Id,
    type_name: Option<Id>,
    multiplicity: Multiplicity,
    produced: ElementHolder<ElementId>,
    creation: Creation,
}

impl AddAttribute {
    pub fn new(
        class: impl Into<ElementHolder<ElementId>>,
        name: Id,
        multiplicity: Multiplicity,
    ) -> Self {
        Self {
            class: class.into(),
            name,
            type_name: None,
            multiplicity,
            produced: ElementHolder::new(),
            creation: Creation::default(),
        }
    }

    pub fn with_type(mut self, type_name: Id) -> Self {
        self.type_name = Some(type_name);
        self
    }
}

impl Validatable for AddAttribute {
    fn mandatory_arguments(&self) -> Vec<MandatoryArgument> {
        vec![MandatoryArgument::holder("class", &self.class)]
    }

    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        let model = project.model();
        let class = self.class.value();
        expect_kind(model, class, ElementKind::Class)?;
        check_name(self.name)?;
        if let Some(siblings) = model.collection(Owner::Attributes(class)) {
            check_unique_name(model, siblings, self.name, None)?;
        }
        check_multiplicity(self.multiplicity)
    }
}

impl Undoable for AddAttribute {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        self.creation.undo(project.model_mut(), "Add attribute")
    }
}

impl Command for AddAttribute {
    fn description(&self) -> &str {
        "Add attribute"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let class = self.class.value();
        let mut attribute = Attribute::new(class, self.name, self.multiplicity);
        if let Some(type_name) = self.type_name {
            attribute = attribute.with_type(type_name);
        }
        let id = self
            .creation
            .insert(project.model_mut(), attribute, Owner::Attributes(class))?;
        debug!(attribute:% = id, class:% = class, name:% = self.name; "Added attribute");
        self.produced.set(id);
        Ok(())
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.creation.redo(project.model_mut()).map(|_| ())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        self.class.get().into_iter().chain(self.creation.id()).collect()
    }
}

impl Producer<ElementId> for AddAttribute {
    fn produced(&self) -> ElementHolder<ElementId> {
        self.produced.clone()
    }
}

/// Removes an attribute that no PSM attribute represents.
#[derive(Debug)]
pub struct RemoveAttribute {
    attribute: ElementId,
    removal: Removal,
}

impl RemoveAttribute {
    pub fn new(attribute: ElementId) -> Self {
        Self {
            attribute,
            removal: Removal::default(),
        }
    }
}

impl Validatable for RemoveAttribute {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        expect_kind(project.model(), self.attribute, ElementKind::Attribute)?;
        check_unreferenced(project.model(), self.attribute)
    }
}

impl Undoable for RemoveAttribute {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        self.removal.restore(project.model_mut(), "Remove attribute")
    }
}

impl Command for RemoveAttribute {
    fn description(&self) -> &str {
        "Remove attribute"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.removal.remove(project.model_mut(), self.attribute)?;
        debug!(attribute:% = self.attribute; "Removed attribute");
        Ok(())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        vec![self.attribute]
    }
}

/// Replaces the multiplicity of an attribute.
#[derive(Debug)]
pub struct ChangeMultiplicity {
    attribute: ElementId,
    multiplicity: Multiplicity,
    previous: Option<Multiplicity>,
}

impl ChangeMultiplicity {
    pub fn new(attribute: ElementId, multiplicity: Multiplicity) -> Self {
        Self {
            attribute,
            multiplicity,
            previous: None,
        }
    }
}

impl Validatable for ChangeMultiplicity {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        expect_kind(project.model(), self.attribute, ElementKind::Attribute)?;
        check_multiplicity(self.multiplicity)
    }
}

impl Undoable for ChangeMultiplicity {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        let previous = self.previous.take().ok_or_else(|| {
            UndoFailure::new("Change multiplicity", "the command has not been executed")
        })?;
        project
            .model_mut()
            .set_multiplicity(self.attribute, previous)
            .map(|_| ())
            .map_err(|err| UndoFailure::new("Change multiplicity", err))
    }
}

impl Command for ChangeMultiplicity {
    fn description(&self) -> &str {
        "Change multiplicity"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let previous = project
            .model_mut()
            .set_multiplicity(self.attribute, self.multiplicity)?;
        self.previous = Some(previous);
        Ok(())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        vec![self.attribute]
    }
}

#[cfg(test)]
mod tests {
    use keel_core::{
        Model,
        pim::Class,
        psm::{PsmAttribute, PsmClass},
    };

    use super::*;
    use crate::error::ErrorCode;

    fn customer() -> (Project, ElementId) {
        let mut model = Model::new();
        let class = model.add(Class::new(Id::new("Customer")), Owner::Classes).unwrap();
        (Project::with_model(model), class)
    }

    #[test]
    fn test_add_attribute_with_unset_class_is_rejected() {
        let (project, _) = customer();
        let command = AddAttribute::new(ElementHolder::new(), Id::new("email"), Multiplicity::ONE);

        let error = command.can_execute(&project).unwrap_err();

        assert_eq!(error.code(), ErrorCode::E100);
    }

    #[test]
    fn test_add_attribute_appends_and_undoes() {
        let (mut project, class) = customer();
        let before = project.clone();
        let mut command = AddAttribute::new(class, Id::new("email"), Multiplicity::OPTIONAL)
            .with_type(Id::new("string"));

        command.execute(&mut project).unwrap();
        let attribute = command.produced().value();
        let stored = project.model().attribute(attribute).unwrap();
        assert_eq!(stored.type_name(), Some(Id::new("string")));
        assert_eq!(project.model().class(class).unwrap().attributes(), &[attribute]);

        command.undo(&mut project).unwrap();
        assert_eq!(project, before);
    }

    #[test]
    fn test_redo_restores_attribute_position() {
        let (mut project, class) = customer();
        let mut first = AddAttribute::new(class, Id::new("name"), Multiplicity::ONE);
        first.execute(&mut project).unwrap();
        let mut second = AddAttribute::new(class, Id::new("email"), Multiplicity::ONE);
        second.execute(&mut project).unwrap();
        let expected = project.clone();

        second.undo(&mut project).unwrap();
        first.undo(&mut project).unwrap();
        first.redo(&mut project).unwrap();
        second.redo(&mut project).unwrap();

        assert_eq!(project, expected);
    }

    #[test]
    fn test_add_attribute_rejects_duplicate_and_empty_range() {
        let (mut project, class) = customer();
        AddAttribute::new(class, Id::new("email"), Multiplicity::ONE)
            .execute(&mut project)
            .unwrap();

        let duplicate = AddAttribute::new(class, Id::new("email"), Multiplicity::ONE);
        assert_eq!(duplicate.can_execute(&project).unwrap_err().code(), ErrorCode::E200);

        let empty = AddAttribute::new(class, Id::new("phone"), Multiplicity::new(2, Some(1)));
        assert_eq!(empty.can_execute(&project).unwrap_err().code(), ErrorCode::E201);
    }

    #[test]
    fn test_remove_represented_attribute_is_rejected() {
        let (mut project, class) = customer();
        let model = project.model_mut();
        let attribute = model
            .add(
                Attribute::new(class, Id::new("email"), Multiplicity::ONE),
                Owner::Attributes(class),
            )
            .unwrap();
        let psm_class = model
            .add(PsmClass::new(Id::new("CustomerView"), class), Owner::PsmRoots)
            .unwrap();
        model
            .add(
                PsmAttribute::new(psm_class, Id::new("email")).representing(attribute),
                Owner::PsmAttributes(psm_class),
            )
            .unwrap();

        let error = RemoveAttribute::new(attribute).can_execute(&project).unwrap_err();

        assert_eq!(error.code(), ErrorCode::E206);
    }

    #[test]
    fn test_remove_attribute_round_trip() {
        let (mut project, class) = customer();
        let attribute = project
            .model_mut()
            .add(
                Attribute::new(class, Id::new("email"), Multiplicity::ONE),
                Owner::Attributes(class),
            )
            .unwrap();
        let before = project.clone();
        let mut command = RemoveAttribute::new(attribute);

        command.execute(&mut project).unwrap();
        assert!(!project.model().contains(attribute));

        command.undo(&mut project).unwrap();
        assert_eq!(project, before);
    }

    #[test]
    fn test_change_multiplicity_round_trip() {
        let (mut project, class) = customer();
        let attribute = project
            .model_mut()
            .add(
                Attribute::new(class, Id::new("email"), Multiplicity::ONE),
                Owner::Attributes(class),
            )
            .unwrap();
        let mut command = ChangeMultiplicity::new(attribute, Multiplicity::MANY);

        command.execute(&mut project).unwrap();
        assert_eq!(
            project.model().attribute(attribute).unwrap().multiplicity(),
            Multiplicity::MANY
        );

        command.undo(&mut project).unwrap();
        assert_eq!(
            project.model().attribute(attribute).unwrap().multiplicity(),
            Multiplicity::ONE
        );
    }

    #[test]
    fn test_change_multiplicity_on_class_is_rejected() {
        let (project, class) = customer();

        let error = ChangeMultiplicity::new(class, Multiplicity::MANY)
            .can_execute(&project)
            .unwrap_err();

        assert_eq!(error.code(), ErrorCode::E102);
    }
}
