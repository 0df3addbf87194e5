use log::debug;

use keel_core::{
    ElementId, ElementKind, Id, Owner, Project,
    pim::{Association, AssociationEnd},
};

use super::{Creation, check_multiplicity, check_name, expect_kind};
use crate::{
    command::{Command, Producer, Undoable, Validatable},
    error::{CommandError, ErrorCode, UndoResult, ValidationError},
    holder::ElementHolder,
};

/// Creates a PIM association between two or more classes.
#[derive(Debug)]
pub struct CreateAssociation {
    name: Option<Id>,
    ends: Vec<AssociationEnd>,
    produced: ElementHolder<ElementId>,
    creation: Creation,
}

impl CreateAssociation {
    pub fn new(ends: Vec<AssociationEnd>) -> Self {
        Self {
            name: None,
            ends,
            produced: ElementHolder::new(),
            creation: Creation::default(),
        }
    }

    pub fn with_name(mut self, name: Id) -> Self {
        self.name = Some(name);
        self
    }
}

impl Validatable for CreateAssociation {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        if self.ends.len() < 2 {
            return Err(ValidationError::new(
                ErrorCode::E100,
                format!(
                    "argument `ends` needs at least two classes, got {}",
                    self.ends.len()
                ),
            ));
        }
        if let Some(name) = self.name {
            check_name(name)?;
        }
        for end in &self.ends {
            expect_kind(project.model(), end.class(), ElementKind::Class)?;
            check_multiplicity(end.multiplicity())?;
        }
        Ok(())
    }
}

impl Undoable for CreateAssociation {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        self.creation.undo(project.model_mut(), "Create association")
    }
}

impl Command for CreateAssociation {
    fn description(&self) -> &str {
        "Create association"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let association = Association::new(self.name, self.ends.clone());
        let id = self
            .creation
            .insert(project.model_mut(), association, Owner::Associations)?;
        debug!(association:% = id, ends = self.ends.len(); "Created association");
        self.produced.set(id);
        Ok(())
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.creation.redo(project.model_mut()).map(|_| ())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        let mut elements: Vec<_> = self.ends.iter().map(AssociationEnd::class).collect();
        elements.dedup();
        elements.extend(self.creation.id());
        elements
    }
}

impl Producer<ElementId> for CreateAssociation {
    fn produced(&self) -> ElementHolder<ElementId> {
        self.produced.clone()
    }
}
