//! The concrete command set.
//!
//! Every command follows the same pattern: constructor plus optional
//! builder-style setters, a pure `validate`, and state captured during
//! execution that `undo` and `redo` replay. Commands creating an element
//! implement [`Producer`](crate::Producer) so later commands of the same
//! macro can refer to the element before it exists.

mod association;
mod attribute;
mod class;
mod delete;
mod diagram;
mod generalization;
mod psm;

pub use association::CreateAssociation;
pub use attribute::{AddAttribute, ChangeMultiplicity, RemoveAttribute};
pub use class::{CreateClass, RenameElement};
pub use delete::DeleteElements;
pub use diagram::{AddToDiagram, RemoveFromDiagram};
pub use generalization::{CreateGeneralization, RemoveGeneralization};
pub use psm::{
    AddAttributeContainer, AddContentContainer, AddPsmAssociation, AddPsmAttribute,
    DerivePsmClass, SetStructuralRepresentative,
};

use keel_core::{
    Detached, Diagram, DiagramId, Element, ElementId, ElementKind, Id, Model, ModelError, Owner,
    Project, pim::Multiplicity,
};

use crate::error::{CommandError, ErrorCode, UndoFailure, UndoResult, ValidationError};

/// Checks that `id` exists and is of `kind`.
fn expect_kind(model: &Model, id: ElementId, kind: ElementKind) -> Result<(), ValidationError> {
    match model.kind(id) {
        Some(actual) if actual == kind => Ok(()),
        Some(actual) => Err(ValidationError::new(
            ErrorCode::E102,
            format!("{id} is a {actual}, expected a {kind}"),
        )),
        None => Err(unknown_element(id)),
    }
}

fn unknown_element(id: ElementId) -> ValidationError {
    ValidationError::new(ErrorCode::E101, format!("element {id} does not exist"))
}

fn expect_diagram(project: &Project, id: DiagramId) -> Result<&Diagram, ValidationError> {
    project
        .diagram(id)
        .ok_or_else(|| ValidationError::new(ErrorCode::E103, format!("{id} does not exist")))
}

fn check_name(name: Id) -> Result<(), ValidationError> {
    if name.is_blank() {
        return Err(ValidationError::new(ErrorCode::E100, "argument `name` is blank"));
    }
    Ok(())
}

/// Fails with E200 if another element of `siblings` already has `name`.
fn check_unique_name(
    model: &Model,
    siblings: &[ElementId],
    name: Id,
    except: Option<ElementId>,
) -> Result<(), ValidationError> {
    let taken = siblings
        .iter()
        .filter(|sibling| Some(**sibling) != except)
        .any(|sibling| model.get(*sibling).and_then(Element::name) == Some(name));
    if taken {
        return Err(ValidationError::new(
            ErrorCode::E200,
            format!("the name `{name}` is already taken"),
        )
        .with_help("choose a different name"));
    }
    Ok(())
}

fn check_multiplicity(multiplicity: Multiplicity) -> Result<(), ValidationError> {
    if !multiplicity.is_valid() {
        return Err(ValidationError::new(
            ErrorCode::E201,
            format!("multiplicity `{multiplicity}` describes an empty range"),
        ));
    }
    Ok(())
}

/// Fails with E206 if anything still requires `id`.
fn check_unreferenced(model: &Model, id: ElementId) -> Result<(), ValidationError> {
    let by = model.required_by(id);
    if by.is_empty() {
        return Ok(());
    }
    let list = by
        .iter()
        .map(ElementId::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(
        ValidationError::new(ErrorCode::E206, format!("{id} is still required by {list}"))
            .with_help("remove the dependent elements first"),
    )
}

/// Insert/undo/redo bookkeeping of a command that creates one element.
///
/// The first execution allocates the id; redo puts the very same element
/// back at the position the undo took it from.
#[derive(Debug, Default)]
struct Creation {
    id: Option<ElementId>,
    detached: Option<Detached>,
}

impl Creation {
    fn id(&self) -> Option<ElementId> {
        self.id
    }

    fn insert(
        &mut self,
        model: &mut Model,
        element: impl Into<Element>,
        owner: Owner,
    ) -> Result<ElementId, ModelError> {
        let id = model.allocate_id();
        model.insert(id, element.into(), owner, None)?;
        self.id = Some(id);
        self.detached = None;
        Ok(id)
    }

    fn undo(&mut self, model: &mut Model, command: &str) -> UndoResult {
        let id = self
            .id
            .ok_or_else(|| UndoFailure::new(command, "the command has not been executed"))?;
        let detached = model
            .detach(id)
            .map_err(|err| UndoFailure::new(command, err))?;
        self.detached = Some(detached);
        Ok(())
    }

    fn redo(&mut self, model: &mut Model) -> Result<ElementId, CommandError> {
        let detached = self.detached.take().ok_or_else(|| {
            ValidationError::new(ErrorCode::E101, "nothing to redo: the element was never removed")
        })?;
        let id = detached.id();
        if let Err(error) = model.reattach(detached.clone()) {
            self.detached = Some(detached);
            return Err(error.into());
        }
        Ok(id)
    }
}

/// Detach/reattach bookkeeping of a command that removes one element.
#[derive(Debug, Default)]
struct Removal {
    detached: Option<Detached>,
}

impl Removal {
    fn remove(&mut self, model: &mut Model, id: ElementId) -> Result<(), ModelError> {
        self.detached = Some(model.detach(id)?);
        Ok(())
    }

    fn restore(&mut self, model: &mut Model, command: &str) -> UndoResult {
        let detached = self
            .detached
            .take()
            .ok_or_else(|| UndoFailure::new(command, "the command has not been executed"))?;
        model
            .reattach(detached)
            .map(|_| ())
            .map_err(|err| UndoFailure::new(command, err))
    }
}

#[cfg(test)]
mod tests {
    use keel_core::pim::Class;

    use super::*;

    #[test]
    fn test_expect_kind_codes() {
        let mut model = Model::new();
        let class = model.add(Class::new(Id::new("A")), Owner::Classes).unwrap();

        assert!(expect_kind(&model, class, ElementKind::Class).is_ok());
        assert_eq!(
            expect_kind(&model, class, ElementKind::Attribute).unwrap_err().code(),
            ErrorCode::E102
        );
        assert_eq!(
            expect_kind(&model, ElementId::new(42), ElementKind::Class)
                .unwrap_err()
                .code(),
            ErrorCode::E101
        );
    }

    #[test]
    fn test_check_unique_name_skips_the_renamed_element() {
        let mut model = Model::new();
        let class = model.add(Class::new(Id::new("A")), Owner::Classes).unwrap();

        assert!(check_unique_name(&model, model.classes(), Id::new("A"), Some(class)).is_ok());
        assert_eq!(
            check_unique_name(&model, model.classes(), Id::new("A"), None)
                .unwrap_err()
                .code(),
            ErrorCode::E200
        );
    }

    #[test]
    fn test_creation_redo_reuses_id() {
        let mut model = Model::new();
        let mut creation = Creation::default();

        let id = creation
            .insert(&mut model, Class::new(Id::new("A")), Owner::Classes)
            .unwrap();
        creation.undo(&mut model, "create").unwrap();
        assert!(model.is_empty());

        assert_eq!(creation.redo(&mut model).unwrap(), id);
        assert_eq!(creation.id(), Some(id));
        assert!(model.contains(id));
    }
}
