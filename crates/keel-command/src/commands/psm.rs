//! Commands building the PSM layer: derived classes, their attributes, and
//! the tree structure that nests them.

use log::{debug, warn};

use keel_core::{
    Element, ElementId, ElementKind, Id, Model, Owner, Project,
    psm::{
        NestingJoin, PsmAssociation, PsmAttribute, PsmAttributeContainer, PsmClass,
        PsmContentContainer,
    },
};

use super::{Creation, check_name, check_unique_name, expect_kind, unknown_element};
use crate::{
    command::{Command, MandatoryArgument, Producer, Undoable, Validatable},
    error::{CommandError, ErrorCode, UndoFailure, UndoResult, ValidationError},
    holder::ElementHolder,
};

fn placement_error(message: impl Into<String>) -> ValidationError {
    ValidationError::new(ErrorCode::E209, message)
}

/// Checks that `parent` can own subordinate components.
fn expect_superordinate(model: &Model, parent: ElementId) -> Result<(), ValidationError> {
    let kind = model.kind(parent).ok_or_else(|| unknown_element(parent))?;
    if !kind.is_superordinate() {
        return Err(placement_error(format!(
            "a {kind} cannot own subordinate components"
        )));
    }
    Ok(())
}

/// The structural parent of a PSM component, if it has one.
fn component_parent(model: &Model, id: ElementId) -> Option<ElementId> {
    match model.get(id)? {
        Element::PsmClass(_) => model
            .parent_association(id)
            .and_then(|association| model.psm_association(association))
            .map(PsmAssociation::parent),
        Element::PsmContentContainer(container) => container.parent(),
        Element::PsmAttributeContainer(container) => Some(container.parent()),
        Element::PsmAssociation(association) => Some(association.parent()),
        _ => None,
    }
}

/// Returns `true` if `ancestor` lies on the path from `id` to its root.
fn is_component_ancestor(model: &Model, ancestor: ElementId, id: ElementId) -> bool {
    let mut current = id;
    for _ in 0..model.len() {
        match component_parent(model, current) {
            Some(parent) if parent == ancestor => return true,
            Some(parent) => current = parent,
            None => return false,
        }
    }
    false
}

/// The PIM class a PSM class or attribute container ultimately represents.
fn represented_class(model: &Model, owner: ElementId) -> Option<ElementId> {
    match model.get(owner)? {
        Element::PsmClass(class) => Some(class.represented()),
        Element::PsmAttributeContainer(container) => model
            .psm_class(container.parent())
            .map(PsmClass::represented),
        _ => None,
    }
}

/// Derives a PSM class from a PIM class.
///
/// Without a parent the class becomes a new root. With a parent it is nested
/// below it through a fresh PSM association.
#[derive(Debug)]
pub struct DerivePsmClass {
    represented: ElementHolder<ElementId>,
    name: Option<Id>,
    parent: Option<ElementId>,
    produced: ElementHolder<ElementId>,
    class: Creation,
    association: Creation,
}

impl DerivePsmClass {
    pub fn new(represented: impl Into<ElementHolder<ElementId>>) -> Self {
        Self {
            represented: represented.into(),
            name: None,
            parent: None,
            produced: ElementHolder::new(),
            class: Creation::default(),
            association: Creation::default(),
        }
    }

    /// Overrides the name, which otherwise follows the PIM class.
    pub fn with_name(mut self, name: Id) -> Self {
        self.name = Some(name);
        self
    }

    pub fn nested_in(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl Validatable for DerivePsmClass {
    fn mandatory_arguments(&self) -> Vec<MandatoryArgument> {
        vec![MandatoryArgument::holder("represented", &self.represented)]
    }

    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        let model = project.model();
        expect_kind(model, self.represented.value(), ElementKind::Class)?;
        if let Some(name) = self.name {
            check_name(name)?;
        }
        if let Some(parent) = self.parent {
            expect_superordinate(model, parent)?;
        }
        Ok(())
    }
}

impl Undoable for DerivePsmClass {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        let model = project.model_mut();
        if self.parent.is_some() {
            self.association.undo(model, "Derive PSM class")?;
        }
        self.class.undo(model, "Derive PSM class")
    }
}

impl Command for DerivePsmClass {
    fn description(&self) -> &str {
        "Derive PSM class"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let model = project.model_mut();
        let represented = self.represented.value();
        let name = match self.name {
            Some(name) => name,
            None => model
                .class(represented)
                .map(|class| class.name())
                .ok_or_else(|| unknown_element(represented))?,
        };
        let class = PsmClass::new(name, represented);

        let Some(parent) = self.parent else {
            let id = self.class.insert(model, class, Owner::PsmRoots)?;
            debug!(psm_class:% = id, represented:% = represented; "Derived PSM root");
            self.produced.set(id);
            return Ok(());
        };

        let id = self.class.insert(model, class, Owner::PsmClasses)?;
        if let Err(error) =
            self.association
                .insert(model, PsmAssociation::new(parent, id), Owner::Components(parent))
        {
            model.detach(id)?;
            return Err(error.into());
        }
        debug!(psm_class:% = id, represented:% = represented, parent:% = parent; "Derived nested PSM class");
        self.produced.set(id);
        Ok(())
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let model = project.model_mut();
        let id = self.class.redo(model)?;
        if self.parent.is_some() {
            if let Err(error) = self.association.redo(model) {
                self.class
                    .undo(model, "Derive PSM class")
                    .map_err(|failure| CommandError::RollbackFailed {
                        command: "Derive PSM class".to_string(),
                        failure,
                    })?;
                return Err(error);
            }
        }
        debug!(psm_class:% = id; "Restored derived PSM class");
        Ok(())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        self.represented
            .get()
            .into_iter()
            .chain(self.parent)
            .chain(self.class.id())
            .chain(self.association.id())
            .collect()
    }
}

impl Producer<ElementId> for DerivePsmClass {
    fn produced(&self) -> ElementHolder<ElementId> {
        self.produced.clone()
    }
}

/// Adds an attribute to a PSM class or attribute container.
///
/// The attribute may represent a PIM attribute of the owner's class or of one
/// of its generals, optionally recording the generalizations it was derived
/// through.
#[derive(Debug)]
pub struct AddPsmAttribute {
    owner: ElementId,
    name: Id,
    represented: Option<ElementId>,
    through: Vec<ElementId>,
    produced: ElementHolder<ElementId>,
    creation: Creation,
}

impl AddPsmAttribute {
    pub fn new(owner: ElementId, name: Id) -> Self {
        Self {
            owner,
            name,
            represented: None,
            through: Vec::new(),
            produced: ElementHolder::new(),
            creation: Creation::default(),
        }
    }

    pub fn representing(mut self, attribute: ElementId) -> Self {
        self.represented = Some(attribute);
        self
    }

    pub fn through(mut self, generalization: ElementId) -> Self {
        self.through.push(generalization);
        self
    }
}

impl Validatable for AddPsmAttribute {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        let model = project.model();
        let owner_class = represented_class(model, self.owner);
        let Some(owner_class) = owner_class else {
            return match model.kind(self.owner) {
                Some(kind) => Err(placement_error(format!("a {kind} cannot own PSM attributes"))),
                None => Err(unknown_element(self.owner)),
            };
        };
        check_name(self.name)?;
        if let Some(siblings) = model.collection(Owner::PsmAttributes(self.owner)) {
            check_unique_name(model, siblings, self.name, None)?;
        }

        if let Some(represented) = self.represented {
            expect_kind(model, represented, ElementKind::Attribute)?;
            let class = model
                .attribute(represented)
                .map(|attribute| attribute.class())
                .ok_or_else(|| unknown_element(represented))?;
            if class != owner_class && !model.is_ancestor(class, owner_class) {
                return Err(placement_error(format!(
                    "{represented} belongs to {class}, which is neither {owner_class} nor one of its generals"
                )));
            }
        }
        self.through
            .iter()
            .try_for_each(|id| expect_kind(model, *id, ElementKind::Generalization))
    }
}

impl Undoable for AddPsmAttribute {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        self.creation.undo(project.model_mut(), "Add PSM attribute")
    }
}

impl Command for AddPsmAttribute {
    fn description(&self) -> &str {
        "Add PSM attribute"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let mut attribute = PsmAttribute::new(self.owner, self.name);
        if let Some(represented) = self.represented {
            attribute = attribute.representing(represented);
        }
        for generalization in &self.through {
            attribute = attribute.through(*generalization);
        }
        let id = self.creation.insert(
            project.model_mut(),
            attribute,
            Owner::PsmAttributes(self.owner),
        )?;
        debug!(psm_attribute:% = id, owner:% = self.owner; "Added PSM attribute");
        self.produced.set(id);
        Ok(())
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.creation.redo(project.model_mut()).map(|_| ())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        [self.owner]
            .into_iter()
            .chain(self.represented)
            .chain(self.creation.id())
            .collect()
    }
}

impl Producer<ElementId> for AddPsmAttribute {
    fn produced(&self) -> ElementHolder<ElementId> {
        self.produced.clone()
    }
}

/// Nests an existing non-root PSM class below a superordinate component.
#[derive(Debug)]
pub struct AddPsmAssociation {
    parent: ElementId,
    child: ElementId,
    nesting_joins: Vec<NestingJoin>,
    generalizations: Vec<ElementId>,
    produced: ElementHolder<ElementId>,
    creation: Creation,
}

impl AddPsmAssociation {
    pub fn new(parent: ElementId, child: ElementId) -> Self {
        Self {
            parent,
            child,
            nesting_joins: Vec::new(),
            generalizations: Vec::new(),
            produced: ElementHolder::new(),
            creation: Creation::default(),
        }
    }

    pub fn with_nesting_join(mut self, join: NestingJoin) -> Self {
        self.nesting_joins.push(join);
        self
    }

    pub fn with_generalization(mut self, generalization: ElementId) -> Self {
        self.generalizations.push(generalization);
        self
    }
}

impl Validatable for AddPsmAssociation {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        let model = project.model();
        expect_superordinate(model, self.parent)?;
        expect_kind(model, self.child, ElementKind::PsmClass)?;

        if model.owner(self.child) != Some(Owner::PsmClasses) {
            return Err(placement_error(format!(
                "{} is a PSM root and cannot be nested",
                self.child
            )));
        }
        if let Some(existing) = model.parent_association(self.child) {
            return Err(placement_error(format!(
                "{} is already nested through {existing}",
                self.child
            )));
        }
        if self.parent == self.child || is_component_ancestor(model, self.child, self.parent) {
            return Err(placement_error(format!(
                "nesting {} below {} would close a cycle",
                self.child, self.parent
            )));
        }

        for join in &self.nesting_joins {
            join.path()
                .iter()
                .try_for_each(|id| expect_kind(model, *id, ElementKind::Association))?;
        }
        self.generalizations
            .iter()
            .try_for_each(|id| expect_kind(model, *id, ElementKind::Generalization))
    }
}

impl Undoable for AddPsmAssociation {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        self.creation.undo(project.model_mut(), "Add PSM association")
    }
}

impl Command for AddPsmAssociation {
    fn description(&self) -> &str {
        "Add PSM association"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let mut association = PsmAssociation::new(self.parent, self.child);
        for join in &self.nesting_joins {
            association = association.with_nesting_join(join.clone());
        }
        for generalization in &self.generalizations {
            association = association.with_generalization(*generalization);
        }
        let id = self.creation.insert(
            project.model_mut(),
            association,
            Owner::Components(self.parent),
        )?;
        debug!(psm_association:% = id, parent:% = self.parent, child:% = self.child; "Added PSM association");
        self.produced.set(id);
        Ok(())
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.creation.redo(project.model_mut()).map(|_| ())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        [self.parent, self.child]
            .into_iter()
            .chain(self.creation.id())
            .collect()
    }
}

impl Producer<ElementId> for AddPsmAssociation {
    fn produced(&self) -> ElementHolder<ElementId> {
        self.produced.clone()
    }
}

/// Adds an attribute container below a PSM class.
#[derive(Debug)]
pub struct AddAttributeContainer {
    parent: ElementId,
    produced: ElementHolder<ElementId>,
    creation: Creation,
}

impl AddAttributeContainer {
    pub fn new(parent: ElementId) -> Self {
        Self {
            parent,
            produced: ElementHolder::new(),
            creation: Creation::default(),
        }
    }
}

impl Validatable for AddAttributeContainer {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        match project.model().kind(self.parent) {
            Some(ElementKind::PsmClass) => Ok(()),
            Some(kind) => Err(placement_error(format!(
                "attribute containers can only be placed in a PSM class, not in a {kind}"
            ))),
            None => Err(unknown_element(self.parent)),
        }
    }
}

impl Undoable for AddAttributeContainer {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        self.creation
            .undo(project.model_mut(), "Add attribute container")
    }
}

impl Command for AddAttributeContainer {
    fn description(&self) -> &str {
        "Add attribute container"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let id = self.creation.insert(
            project.model_mut(),
            PsmAttributeContainer::new(self.parent),
            Owner::Components(self.parent),
        )?;
        self.produced.set(id);
        Ok(())
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.creation.redo(project.model_mut()).map(|_| ())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        [self.parent].into_iter().chain(self.creation.id()).collect()
    }
}

impl Producer<ElementId> for AddAttributeContainer {
    fn produced(&self) -> ElementHolder<ElementId> {
        self.produced.clone()
    }
}

/// Adds a named content container, as a root or below a superordinate
/// component.
#[derive(Debug)]
pub struct AddContentContainer {
    name: Id,
    parent: Option<ElementId>,
    produced: ElementHolder<ElementId>,
    creation: Creation,
}

impl AddContentContainer {
    pub fn new(name: Id) -> Self {
        Self {
            name,
            parent: None,
            produced: ElementHolder::new(),
            creation: Creation::default(),
        }
    }

    pub fn nested_in(mut self, parent: ElementId) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl Validatable for AddContentContainer {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        check_name(self.name)?;
        match self.parent {
            Some(parent) => expect_superordinate(project.model(), parent),
            None => Ok(()),
        }
    }
}

impl Undoable for AddContentContainer {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        self.creation
            .undo(project.model_mut(), "Add content container")
    }
}

impl Command for AddContentContainer {
    fn description(&self) -> &str {
        "Add content container"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let owner = self.parent.map_or(Owner::PsmRoots, Owner::Components);
        let id = self.creation.insert(
            project.model_mut(),
            PsmContentContainer::new(self.name, self.parent),
            owner,
        )?;
        self.produced.set(id);
        Ok(())
    }

    fn redo_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        self.creation.redo(project.model_mut()).map(|_| ())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        self.parent.into_iter().chain(self.creation.id()).collect()
    }
}

impl Producer<ElementId> for AddContentContainer {
    fn produced(&self) -> ElementHolder<ElementId> {
        self.produced.clone()
    }
}

/// Points a PSM class at another PSM class of the same PIM class whose
/// content it reuses, or clears the link.
#[derive(Debug)]
pub struct SetStructuralRepresentative {
    class: ElementId,
    representative: Option<ElementId>,
    previous: Option<Option<ElementId>>,
}

impl SetStructuralRepresentative {
    pub fn new(class: ElementId, representative: Option<ElementId>) -> Self {
        Self {
            class,
            representative,
            previous: None,
        }
    }
}

impl Validatable for SetStructuralRepresentative {
    fn validate(&self, project: &Project) -> Result<(), ValidationError> {
        let model = project.model();
        expect_kind(model, self.class, ElementKind::PsmClass)?;
        let Some(representative) = self.representative else {
            return Ok(());
        };

        let invalid = |message: String| Err(ValidationError::new(ErrorCode::E208, message));
        if representative == self.class {
            return invalid(format!("{} cannot represent itself", self.class));
        }
        let (Some(class), Some(target)) = (
            model.psm_class(self.class),
            model.psm_class(representative),
        ) else {
            return invalid(format!("{representative} is not a PSM class"));
        };
        if class.represented() != target.represented() {
            return invalid(format!(
                "{representative} represents {}, but {} represents {}",
                target.represented(),
                self.class,
                class.represented()
            ));
        }
        Ok(())
    }
}

impl Undoable for SetStructuralRepresentative {
    fn undo_operation(&mut self, project: &mut Project) -> UndoResult {
        let previous = self.previous.take().ok_or_else(|| {
            UndoFailure::new("Set structural representative", "the command has not been executed")
        })?;
        project
            .model_mut()
            .set_representative(self.class, previous)
            .map(|_| ())
            .map_err(|err| UndoFailure::new("Set structural representative", err))
    }
}

impl Command for SetStructuralRepresentative {
    fn description(&self) -> &str {
        "Set structural representative"
    }

    fn command_operation(&mut self, project: &mut Project) -> Result<(), CommandError> {
        let model = project.model_mut();
        let previous = model.set_representative(self.class, self.representative)?;
        self.previous = Some(previous);

        if representative_loop(model, self.class) {
            warn!(psm_class:% = self.class; "Structural representatives form a loop");
        }
        Ok(())
    }

    fn associated_elements(&self) -> Vec<ElementId> {
        [self.class].into_iter().chain(self.representative).collect()
    }
}

/// Returns `true` if following representatives from `class` leads back to it.
fn representative_loop(model: &Model, class: ElementId) -> bool {
    let mut current = class;
    for _ in 0..model.len() {
        match model.psm_class(current).and_then(PsmClass::representative) {
            Some(next) if next == class => return true,
            Some(next) => current = next,
            None => return false,
        }
    }
    false
}
