use log::debug;

use keel_core::{ElementId, ElementKind, Owner, Project, pim::Generalization};

use super::{Creation, Removal, check_unreferenced, expect_kind};
use crate::{
    command::{Command, Producer, Undoable, Validatable},
    error::{CommandError, ErrorCode, UndoResult, ValidationError},
    holder::ElementHolder,
};

/// Makes `specific` a specialization of `general`.
#[derive(Debug)]
pub struct CreateGeneralization {
    general: ElementId,
    specific: ElementId,
    produced: ElementHolder<ElementId>,
    creation: Creation,
}

impl CreateGeneralization {
    pub fn new(general: ElementId, specific: ElementId) -> Self {
        Self {
            general,
            specific,
            produced: ElementHolder::new(),
            creation: Creation::default(),
        }
    }
}

impl Validatable for CreateGeneralization {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        let model = project.model();
        expect_kind(model, self.general, ElementKind::Class)?;
        expect_kind(model, self.specific, ElementKind::Class)?;

        if self.general == self.specific || model.is_ancestor(self.specific, self.general) {
            return Err(ValidationError::new(
                ErrorCode::E202,
                format!(
                    "making {} a specialization of {} would close a generalization cycle",
                    self.specific, self.general
                ),
            ));
        }
        if let Some(existing) = model.generalization_between(self.general, self.specific) {
            return Err(ValidationError::new(
                ErrorCode::E203,
                format!(
                    "{} already specializes {} through {existing}",
                    self.specific, self.general
                ),
            ));
        }
        Ok(())
    }
}

impl Undoable for CreateGeneralization {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        self.creation.undo(project.model_mut(), "Create generalization")
    }
}

impl Command for CreateGeneralization {
    fn description(&self) -> &str {
        "Create generalization"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let id = self.creation.insert(
            project.model_mut(),
            Generalization::new(self.general, self.specific),
            Owner::Generalizations,
        )?;
        debug!(generalization:% = id, general:% = self.general, specific:% = self.specific; "Created generalization");
        self.produced.set(id);
        Ok(())
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.creation.redo(project.model_mut()).map(|_| ())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        [self.general, self.specific]
            .into_iter()
            .chain(self.creation.id())
            .collect()
    }
}

impl Producer<ElementId> for CreateGeneralization {
    fn produced(&self) -> ElementHolder<ElementId> {
        self.produced.clone()
    }
}

/// Removes a generalization no PSM element derives through.
#[derive(Debug)]
pub struct RemoveGeneralization {
    generalization: ElementId,
    removal: Removal,
}

impl RemoveGeneralization {
    pub fn new(generalization: ElementId) -> Self {
        Self {
            generalization,
            removal: Removal::default(),
        }
    }
}

impl Validatable for RemoveGeneralization {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        expect_kind(project.model(), self.generalization, ElementKind::Generalization)?;
        check_unreferenced(project.model(), self.generalization)
    }
}

impl Undoable for RemoveGeneralization {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        self.removal
            .restore(project.model_mut(), "Remove generalization")
    }
}

impl Command for RemoveGeneralization {
    fn description(&self) -> &str {
        "Remove generalization"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.removal
            .remove(project.model_mut(), self.generalization)?;
        Ok(())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        vec![self.generalization]
    }
}
