//! The element arena shared by both model layers.
//!
//! [`Model`] stores every element under its [`ElementId`] together with the
//! single [`Owner`] collection it belongs to. The mutation primitives keep the
//! graph free of dangling references:
//!
//! - [`Model::insert`] and [`Model::reattach`] refuse an element whose owner or
//!   references are missing, or whose recorded index is out of range.
//! - [`Model::detach`] refuses an element that something else still requires,
//!   and returns a [`Detached`] record that restores the element at exactly the
//!   same position.
//!
//! Callers removing several elements at once must therefore remove requirers
//! before what they require, and restore in the opposite order.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fmt,
};

use log::trace;
use thiserror::Error;

use crate::{
    element::{Element, ElementId, ElementKind},
    identifier::Id,
    pim::{Association, Attribute, Class, Generalization, Multiplicity},
    psm::{PsmAssociation, PsmAttribute, PsmAttributeContainer, PsmClass, PsmContentContainer},
};

/// The ordered collection an element lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Classes,
    Associations,
    Generalizations,
    /// Roots of the PSM forest.
    PsmRoots,
    /// Non-root PSM classes, reachable through a PSM association.
    PsmClasses,
    /// Attributes of a PIM class.
    Attributes(ElementId),
    /// Attributes of a PSM class or attribute container.
    PsmAttributes(ElementId),
    /// Subordinate components of a PSM superordinate component.
    Components(ElementId),
}

impl Owner {
    /// Returns the owning element for element-owned collections.
    pub fn element(&self) -> Option<ElementId> {
        match self {
            Self::Attributes(id) | Self::PsmAttributes(id) | Self::Components(id) => Some(*id),
            Self::Classes
            | Self::Associations
            | Self::Generalizations
            | Self::PsmRoots
            | Self::PsmClasses => None,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classes => write!(f, "classes"),
            Self::Associations => write!(f, "associations"),
            Self::Generalizations => write!(f, "generalizations"),
            Self::PsmRoots => write!(f, "PSM roots"),
            Self::PsmClasses => write!(f, "PSM classes"),
            Self::Attributes(id) => write!(f, "attributes of {id}"),
            Self::PsmAttributes(id) => write!(f, "PSM attributes of {id}"),
            Self::Components(id) => write!(f, "components of {id}"),
        }
    }
}

/// Location of an element inside its owner collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    owner: Owner,
    index: usize,
}

impl Position {
    pub fn new(owner: Owner, index: usize) -> Self {
        Self { owner, index }
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// An element removed from the model, with everything needed to put it back.
#[derive(Debug, Clone, PartialEq)]
pub struct Detached {
    id: ElementId,
    element: Element,
    position: Position,
}

impl Detached {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

/// Failures of the model mutation primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("element {0} does not exist")]
    UnknownElement(ElementId),

    #[error("element {0} already exists")]
    DuplicateElement(ElementId),

    #[error("element {0} must not own other elements when inserted")]
    NonEmptyElement(ElementId),

    #[error("{kind} {element} cannot be placed in {owner}")]
    OwnerMismatch {
        element: ElementId,
        kind: ElementKind,
        owner: Owner,
    },

    #[error("{owner} of element {element} do not exist")]
    MissingOwner { element: ElementId, owner: Owner },

    #[error("element {element} requires missing element {reference}")]
    MissingReference {
        element: ElementId,
        reference: ElementId,
    },

    #[error("element {element} is still required by {}", join_ids(.by))]
    StillReferenced {
        element: ElementId,
        by: Vec<ElementId>,
    },

    #[error("index {index} is out of range for {owner} with {len} element(s)")]
    IndexOutOfRange {
        owner: Owner,
        index: usize,
        len: usize,
    },

    #[error("{element} is a {actual}, expected a {expected}")]
    WrongKind {
        element: ElementId,
        expected: ElementKind,
        actual: ElementKind,
    },
}

fn join_ids(ids: &[ElementId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Arena of PIM and PSM elements with ordered owner collections.
#[derive(Debug, Clone, Default)]
pub struct Model {
    next_id: u32,
    elements: BTreeMap<ElementId, Element>,
    owners: HashMap<ElementId, Owner>,
    classes: Vec<ElementId>,
    associations: Vec<ElementId>,
    generalizations: Vec<ElementId>,
    psm_roots: Vec<ElementId>,
    psm_classes: Vec<ElementId>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a fresh element id.
    pub fn allocate_id(&mut self) -> ElementId {
        let id = ElementId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Allocates an id and appends `element` to `owner`.
    pub fn add(&mut self, element: impl Into<Element>, owner: Owner) -> Result<ElementId, ModelError> {
        let id = self.allocate_id();
        self.insert(id, element.into(), owner, None)?;
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn kind(&self, id: ElementId) -> Option<ElementKind> {
        self.get(id).map(Element::kind)
    }

    /// Iterates all elements in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements.iter().map(|(id, element)| (*id, element))
    }

    pub fn class(&self, id: ElementId) -> Option<&Class> {
        self.get(id).and_then(Element::as_class)
    }

    pub fn attribute(&self, id: ElementId) -> Option<&Attribute> {
        self.get(id).and_then(Element::as_attribute)
    }

    pub fn association(&self, id: ElementId) -> Option<&Association> {
        self.get(id).and_then(Element::as_association)
    }

    pub fn generalization(&self, id: ElementId) -> Option<&Generalization> {
        self.get(id).and_then(Element::as_generalization)
    }

    pub fn psm_class(&self, id: ElementId) -> Option<&PsmClass> {
        self.get(id).and_then(Element::as_psm_class)
    }

    pub fn psm_attribute(&self, id: ElementId) -> Option<&PsmAttribute> {
        self.get(id).and_then(Element::as_psm_attribute)
    }

    pub fn psm_attribute_container(&self, id: ElementId) -> Option<&PsmAttributeContainer> {
        self.get(id).and_then(Element::as_psm_attribute_container)
    }

    pub fn psm_association(&self, id: ElementId) -> Option<&PsmAssociation> {
        self.get(id).and_then(Element::as_psm_association)
    }

    pub fn psm_content_container(&self, id: ElementId) -> Option<&PsmContentContainer> {
        self.get(id).and_then(Element::as_psm_content_container)
    }

    pub fn classes(&self) -> &[ElementId] {
        &self.classes
    }

    pub fn associations(&self) -> &[ElementId] {
        &self.associations
    }

    pub fn generalizations(&self) -> &[ElementId] {
        &self.generalizations
    }

    pub fn psm_roots(&self) -> &[ElementId] {
        &self.psm_roots
    }

    pub fn psm_classes(&self) -> &[ElementId] {
        &self.psm_classes
    }

    pub fn owner(&self, id: ElementId) -> Option<Owner> {
        self.owners.get(&id).copied()
    }

    /// Returns the current position of an element inside its owner.
    pub fn position(&self, id: ElementId) -> Option<Position> {
        let owner = self.owner(id)?;
        let index = self.collection(owner)?.iter().position(|item| *item == id)?;
        Some(Position::new(owner, index))
    }

    /// Returns the ordered contents of an owner collection, or `None` if the
    /// owning element does not exist or cannot own that collection.
    pub fn collection(&self, owner: Owner) -> Option<&[ElementId]> {
        let items: &[ElementId] = match owner {
            Owner::Classes => &self.classes,
            Owner::Associations => &self.associations,
            Owner::Generalizations => &self.generalizations,
            Owner::PsmRoots => &self.psm_roots,
            Owner::PsmClasses => &self.psm_classes,
            Owner::Attributes(id) => self.class(id)?.attributes(),
            Owner::PsmAttributes(id) => match self.get(id)? {
                Element::PsmClass(class) => class.attributes(),
                Element::PsmAttributeContainer(container) => container.attributes(),
                _ => return None,
            },
            Owner::Components(id) => match self.get(id)? {
                Element::PsmClass(class) => class.components(),
                Element::PsmContentContainer(container) => container.components(),
                _ => return None,
            },
        };
        Some(items)
    }

    fn collection_mut(&mut self, owner: Owner) -> Option<&mut Vec<ElementId>> {
        match owner {
            Owner::Classes => Some(&mut self.classes),
            Owner::Associations => Some(&mut self.associations),
            Owner::Generalizations => Some(&mut self.generalizations),
            Owner::PsmRoots => Some(&mut self.psm_roots),
            Owner::PsmClasses => Some(&mut self.psm_classes),
            Owner::Attributes(id) => match self.elements.get_mut(&id)? {
                Element::Class(class) => Some(class.attributes_mut()),
                _ => None,
            },
            Owner::PsmAttributes(id) => match self.elements.get_mut(&id)? {
                Element::PsmClass(class) => Some(class.attributes_mut()),
                Element::PsmAttributeContainer(container) => Some(container.attributes_mut()),
                _ => None,
            },
            Owner::Components(id) => match self.elements.get_mut(&id)? {
                Element::PsmClass(class) => Some(class.components_mut()),
                Element::PsmContentContainer(container) => Some(container.components_mut()),
                _ => None,
            },
        }
    }

    /// Checks that `element` may live in `owner`.
    fn check_owner(&self, id: ElementId, element: &Element, owner: Owner) -> Result<(), ModelError> {
        let accepted = match (owner, element) {
            (Owner::Classes, Element::Class(_))
            | (Owner::Associations, Element::Association(_))
            | (Owner::Generalizations, Element::Generalization(_))
            | (Owner::PsmRoots, Element::PsmClass(_))
            | (Owner::PsmClasses, Element::PsmClass(_)) => true,
            (Owner::PsmRoots, Element::PsmContentContainer(container)) => {
                container.parent().is_none()
            }
            (Owner::Attributes(class), Element::Attribute(attribute)) => attribute.class() == class,
            (Owner::PsmAttributes(parent), Element::PsmAttribute(attribute)) => {
                attribute.owner() == parent
            }
            (Owner::Components(parent), Element::PsmAttributeContainer(container)) => {
                container.parent() == parent
                    && self.kind(parent).is_none_or(|kind| kind == ElementKind::PsmClass)
            }
            (Owner::Components(parent), Element::PsmAssociation(association)) => {
                association.parent() == parent
            }
            (Owner::Components(parent), Element::PsmContentContainer(container)) => {
                container.parent() == Some(parent)
            }
            _ => false,
        };

        if !accepted {
            return Err(ModelError::OwnerMismatch {
                element: id,
                kind: element.kind(),
                owner,
            });
        }

        if self.collection(owner).is_none() {
            return match owner.element() {
                Some(parent) if self.contains(parent) => Err(ModelError::OwnerMismatch {
                    element: id,
                    kind: element.kind(),
                    owner,
                }),
                _ => Err(ModelError::MissingOwner { element: id, owner }),
            };
        }

        Ok(())
    }

    /// Inserts `element` under `id` into `owner` at `index` (appending when
    /// `None`).
    ///
    /// # Errors
    ///
    /// Fails without mutating the model if the id is taken, the element
    /// already owns children, the owner is missing or unsuitable, a required
    /// element is missing, or the index is out of range.
    pub fn insert(
        &mut self,
        id: ElementId,
        element: Element,
        owner: Owner,
        index: Option<usize>,
    ) -> Result<Position, ModelError> {
        if self.contains(id) {
            return Err(ModelError::DuplicateElement(id));
        }
        if !element.owned().is_empty() {
            return Err(ModelError::NonEmptyElement(id));
        }
        self.check_owner(id, &element, owner)?;
        if let Some(reference) = element
            .requirements()
            .into_iter()
            .find(|required| !self.contains(*required))
        {
            return Err(ModelError::MissingReference {
                element: id,
                reference,
            });
        }

        let collection = self
            .collection_mut(owner)
            .ok_or(ModelError::MissingOwner { element: id, owner })?;
        let index = index.unwrap_or(collection.len());
        if index > collection.len() {
            return Err(ModelError::IndexOutOfRange {
                owner,
                index,
                len: collection.len(),
            });
        }
        collection.insert(index, id);

        trace!(element:% = id, kind:% = element.kind(), owner:% = owner, index:?; "Inserted element");
        self.elements.insert(id, element);
        self.owners.insert(id, owner);
        Ok(Position::new(owner, index))
    }

    /// Puts a detached element back at its recorded position.
    pub fn reattach(&mut self, detached: Detached) -> Result<Position, ModelError> {
        let Detached {
            id,
            element,
            position,
        } = detached;
        self.insert(id, element, position.owner, Some(position.index))
    }

    /// Removes an element that nothing else requires.
    ///
    /// # Errors
    ///
    /// [`ModelError::StillReferenced`] if any element still requires `id`.
    pub fn detach(&mut self, id: ElementId) -> Result<Detached, ModelError> {
        if !self.contains(id) {
            return Err(ModelError::UnknownElement(id));
        }
        let by = self.required_by(id);
        if !by.is_empty() {
            return Err(ModelError::StillReferenced { element: id, by });
        }
        self.remove_unchecked(id)
    }

    /// Removes an element even if other elements still require it.
    ///
    /// Only sound when every requirer is removed in the same operation; the
    /// returned record may not be reattachable.
    pub fn force_detach(&mut self, id: ElementId) -> Result<Detached, ModelError> {
        if !self.contains(id) {
            return Err(ModelError::UnknownElement(id));
        }
        self.remove_unchecked(id)
    }

    fn remove_unchecked(&mut self, id: ElementId) -> Result<Detached, ModelError> {
        let owner = self.owner(id).ok_or(ModelError::UnknownElement(id))?;
        let mut index = 0;
        if let Some(collection) = self.collection_mut(owner) {
            if let Some(found) = collection.iter().position(|item| *item == id) {
                collection.remove(found);
                index = found;
            }
        }
        let element = self
            .elements
            .remove(&id)
            .ok_or(ModelError::UnknownElement(id))?;
        self.owners.remove(&id);

        trace!(element:% = id, owner:% = owner, index:?; "Detached element");
        Ok(Detached {
            id,
            element,
            position: Position::new(owner, index),
        })
    }

    /// Returns every element that structurally requires `id`, in id order.
    pub fn required_by(&self, id: ElementId) -> Vec<ElementId> {
        self.iter()
            .filter(|(_, element)| element.requirements().contains(&id))
            .map(|(requirer, _)| requirer)
            .collect()
    }

    /// Renames a named element, returning the previous name.
    pub fn set_name(&mut self, id: ElementId, name: Id) -> Result<Option<Id>, ModelError> {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(ModelError::UnknownElement(id))?;
        let previous = element.name();
        if !element.set_name(name) {
            return Ok(None);
        }
        Ok(previous)
    }

    /// Replaces an attribute's multiplicity, returning the previous bounds.
    pub fn set_multiplicity(
        &mut self,
        id: ElementId,
        multiplicity: Multiplicity,
    ) -> Result<Multiplicity, ModelError> {
        match self.elements.get_mut(&id) {
            Some(Element::Attribute(attribute)) => {
                let previous = attribute.multiplicity();
                attribute.set_multiplicity(multiplicity);
                Ok(previous)
            }
            Some(other) => Err(ModelError::WrongKind {
                element: id,
                expected: ElementKind::Attribute,
                actual: other.kind(),
            }),
            None => Err(ModelError::UnknownElement(id)),
        }
    }

    /// Points a PSM class at a structural representative (or clears it),
    /// returning the previous representative.
    pub fn set_representative(
        &mut self,
        id: ElementId,
        representative: Option<ElementId>,
    ) -> Result<Option<ElementId>, ModelError> {
        if let Some(target) = representative {
            match self.kind(target) {
                Some(ElementKind::PsmClass) => {}
                Some(actual) => {
                    return Err(ModelError::WrongKind {
                        element: target,
                        expected: ElementKind::PsmClass,
                        actual,
                    });
                }
                None => {
                    return Err(ModelError::MissingReference {
                        element: id,
                        reference: target,
                    });
                }
            }
        }
        match self.elements.get_mut(&id) {
            Some(Element::PsmClass(class)) => {
                let previous = class.representative();
                class.set_representative(representative);
                Ok(previous)
            }
            Some(other) => Err(ModelError::WrongKind {
                element: id,
                expected: ElementKind::PsmClass,
                actual: other.kind(),
            }),
            None => Err(ModelError::UnknownElement(id)),
        }
    }

    /// Finds a PIM class by name.
    pub fn class_named(&self, name: Id) -> Option<ElementId> {
        self.classes
            .iter()
            .copied()
            .find(|id| self.class(*id).is_some_and(|class| class.name() == name))
    }

    /// Finds an attribute of `class` by name.
    pub fn attribute_named(&self, class: ElementId, name: Id) -> Option<ElementId> {
        self.class(class)?
            .attributes()
            .iter()
            .copied()
            .find(|id| self.attribute(*id).is_some_and(|attribute| attribute.name() == name))
    }

    /// Direct generals of `class`.
    pub fn generals(&self, class: ElementId) -> Vec<ElementId> {
        self.generalizations
            .iter()
            .filter_map(|id| self.generalization(*id))
            .filter(|generalization| generalization.specific() == class)
            .map(Generalization::general)
            .collect()
    }

    /// All transitive generals of `class`, nearest first.
    pub fn ancestors(&self, class: ElementId) -> Vec<ElementId> {
        let mut ancestors = Vec::new();
        let mut queue = VecDeque::from([class]);
        while let Some(current) = queue.pop_front() {
            for general in self.generals(current) {
                if general != class && !ancestors.contains(&general) {
                    ancestors.push(general);
                    queue.push_back(general);
                }
            }
        }
        ancestors
    }

    /// Returns `true` if `ancestor` is a transitive general of `class`.
    pub fn is_ancestor(&self, ancestor: ElementId, class: ElementId) -> bool {
        self.ancestors(class).contains(&ancestor)
    }

    /// The generalization from `specific` to `general`, if one exists.
    pub fn generalization_between(&self, general: ElementId, specific: ElementId) -> Option<ElementId> {
        self.generalizations.iter().copied().find(|id| {
            self.generalization(*id).is_some_and(|generalization| {
                generalization.general() == general && generalization.specific() == specific
            })
        })
    }

    /// PSM classes derived from the PIM class `class`.
    pub fn derived_psm_classes(&self, class: ElementId) -> Vec<ElementId> {
        self.iter()
            .filter(|(_, element)| {
                element
                    .as_psm_class()
                    .is_some_and(|psm_class| psm_class.represented() == class)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// The PSM association whose child is `psm_class`.
    pub fn parent_association(&self, psm_class: ElementId) -> Option<ElementId> {
        self.iter()
            .find(|(_, element)| {
                element
                    .as_psm_association()
                    .is_some_and(|association| association.child() == psm_class)
            })
            .map(|(id, _)| id)
    }

    /// PSM classes using `psm_class` as their structural representative.
    pub fn representatives_of(&self, psm_class: ElementId) -> Vec<ElementId> {
        self.iter()
            .filter(|(_, element)| {
                element
                    .as_psm_class()
                    .is_some_and(|class| class.representative() == Some(psm_class))
            })
            .map(|(id, _)| id)
            .collect()
    }
}

/// Equality of model content; id allocation state is not observable and is
/// ignored.
impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
            && self.owners == other.owners
            && self.classes == other.classes
            && self.associations == other.associations
            && self.generalizations == other.generalizations
            && self.psm_roots == other.psm_roots
            && self.psm_classes == other.psm_classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pim::AssociationEnd;

    fn model_with_classes(names: &[&str]) -> (Model, Vec<ElementId>) {
        let mut model = Model::new();
        let ids = names
            .iter()
            .map(|name| {
                model
                    .add(Class::new(Id::new(name)), Owner::Classes)
                    .expect("class insertion should succeed")
            })
            .collect();
        (model, ids)
    }

    #[test]
    fn test_add_and_lookup() {
        let (model, ids) = model_with_classes(&["Customer", "Order"]);

        assert_eq!(model.len(), 2);
        assert_eq!(model.classes(), ids.as_slice());
        assert_eq!(model.class(ids[0]).map(Class::name), Some(Id::new("Customer")));
        assert_eq!(model.class_named(Id::new("Order")), Some(ids[1]));
        assert_eq!(model.owner(ids[1]), Some(Owner::Classes));
    }

    #[test]
    fn test_insert_at_index() {
        let (mut model, ids) = model_with_classes(&["A", "B"]);
        let id = model.allocate_id();

        let position = model
            .insert(id, Class::new(Id::new("Middle")).into(), Owner::Classes, Some(1))
            .expect("insert should succeed");

        assert_eq!(position.index(), 1);
        assert_eq!(model.classes(), &[ids[0], id, ids[1]]);
    }

    #[test]
    fn test_insert_rejects_out_of_range_index() {
        let (mut model, _) = model_with_classes(&["A"]);
        let id = model.allocate_id();

        let result = model.insert(id, Class::new(Id::new("B")).into(), Owner::Classes, Some(5));

        assert_eq!(
            result,
            Err(ModelError::IndexOutOfRange {
                owner: Owner::Classes,
                index: 5,
                len: 1
            })
        );
        assert!(!model.contains(id));
    }

    #[test]
    fn test_insert_rejects_missing_reference() {
        let (mut model, ids) = model_with_classes(&["A"]);
        let missing = ElementId::new(99);

        let result = model.add(Generalization::new(ids[0], missing), Owner::Generalizations);

        assert!(matches!(
            result,
            Err(ModelError::MissingReference { reference, .. }) if reference == missing
        ));
        assert!(model.generalizations().is_empty());
    }

    #[test]
    fn test_insert_rejects_owner_mismatch() {
        let (mut model, ids) = model_with_classes(&["A", "B"]);
        let attribute = Attribute::new(ids[0], Id::new("name"), Multiplicity::ONE);

        let result = model.add(attribute, Owner::Attributes(ids[1]));

        assert!(matches!(result, Err(ModelError::OwnerMismatch { .. })));
    }

    #[test]
    fn test_detach_and_reattach_restore_position() {
        let (mut model, ids) = model_with_classes(&["A"]);
        let class = ids[0];
        let first = model
            .add(Attribute::new(class, Id::new("x"), Multiplicity::ONE), Owner::Attributes(class))
            .unwrap();
        let second = model
            .add(Attribute::new(class, Id::new("y"), Multiplicity::ONE), Owner::Attributes(class))
            .unwrap();
        let before = model.clone();

        let detached = model.detach(first).expect("detach should succeed");
        assert_eq!(detached.position(), Position::new(Owner::Attributes(class), 0));
        assert_eq!(model.class(class).unwrap().attributes(), &[second]);

        model.reattach(detached).expect("reattach should succeed");
        assert_eq!(model, before);
    }

    #[test]
    fn test_detach_refuses_required_element() {
        let (mut model, ids) = model_with_classes(&["A", "B"]);
        let association = model
            .add(
                Association::new(
                    None,
                    vec![
                        AssociationEnd::new(ids[0], Multiplicity::ONE),
                        AssociationEnd::new(ids[1], Multiplicity::MANY),
                    ],
                ),
                Owner::Associations,
            )
            .unwrap();

        let result = model.detach(ids[0]);

        assert_eq!(
            result,
            Err(ModelError::StillReferenced {
                element: ids[0],
                by: vec![association]
            })
        );
        assert!(model.contains(ids[0]));
    }

    #[test]
    fn test_force_detach_ignores_requirers() {
        let (mut model, ids) = model_with_classes(&["A"]);
        model
            .add(Attribute::new(ids[0], Id::new("x"), Multiplicity::ONE), Owner::Attributes(ids[0]))
            .unwrap();

        assert!(model.force_detach(ids[0]).is_ok());
        assert!(!model.contains(ids[0]));
    }

    #[test]
    fn test_ancestors_are_transitive() {
        let (mut model, ids) = model_with_classes(&["Base", "Middle", "Leaf"]);
        model
            .add(Generalization::new(ids[0], ids[1]), Owner::Generalizations)
            .unwrap();
        model
            .add(Generalization::new(ids[1], ids[2]), Owner::Generalizations)
            .unwrap();

        assert_eq!(model.ancestors(ids[2]), vec![ids[1], ids[0]]);
        assert!(model.is_ancestor(ids[0], ids[2]));
        assert!(!model.is_ancestor(ids[2], ids[0]));
    }

    #[test]
    fn test_psm_tree_queries() {
        let (mut model, ids) = model_with_classes(&["Order"]);
        let root = model
            .add(PsmClass::new(Id::new("Order"), ids[0]), Owner::PsmRoots)
            .unwrap();
        let child = model
            .add(PsmClass::new(Id::new("Item"), ids[0]), Owner::PsmClasses)
            .unwrap();
        let association = model
            .add(PsmAssociation::new(root, child), Owner::Components(root))
            .unwrap();
        let representative = model
            .add(
                PsmClass::new(Id::new("OrderRef"), ids[0]).with_representative(root),
                Owner::PsmRoots,
            )
            .unwrap();

        assert_eq!(model.parent_association(child), Some(association));
        assert_eq!(model.representatives_of(root), vec![representative]);
        assert_eq!(model.derived_psm_classes(ids[0]).len(), 3);
        assert_eq!(model.psm_class(root).unwrap().components(), &[association]);
    }

    #[test]
    fn test_attribute_container_requires_psm_class_parent() {
        let mut model = Model::new();
        let container = model
            .add(PsmContentContainer::new(Id::new("root"), None), Owner::PsmRoots)
            .unwrap();

        let result = model.add(PsmAttributeContainer::new(container), Owner::Components(container));

        assert!(matches!(result, Err(ModelError::OwnerMismatch { .. })));
    }

    #[test]
    fn test_setters_return_previous_values() {
        let (mut model, ids) = model_with_classes(&["A"]);
        let attribute = model
            .add(Attribute::new(ids[0], Id::new("x"), Multiplicity::ONE), Owner::Attributes(ids[0]))
            .unwrap();

        assert_eq!(model.set_name(ids[0], Id::new("B")), Ok(Some(Id::new("A"))));
        assert_eq!(
            model.set_multiplicity(attribute, Multiplicity::MANY),
            Ok(Multiplicity::ONE)
        );
        assert!(matches!(
            model.set_multiplicity(ids[0], Multiplicity::MANY),
            Err(ModelError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_model_equality_ignores_id_allocation() {
        let (mut model, _) = model_with_classes(&["A"]);
        let before = model.clone();

        model.allocate_id();

        assert_eq!(model, before);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// A class with `count` attributes plus the index of one of them.
    fn attribute_list_strategy() -> impl Strategy<Value = (usize, usize)> {
        (1..12usize).prop_flat_map(|count| (Just(count), 0..count))
    }

    fn class_with_attributes(count: usize) -> (Model, ElementId, Vec<ElementId>) {
        let mut model = Model::new();
        let class = model
            .add(Class::new(Id::new("Holder")), Owner::Classes)
            .expect("class insertion");
        let attributes = (0..count)
            .map(|index| {
                model
                    .add(
                        Attribute::new(class, Id::new(&format!("a{index}")), Multiplicity::ONE),
                        Owner::Attributes(class),
                    )
                    .expect("attribute insertion")
            })
            .collect();
        (model, class, attributes)
    }

    // ===================
    // Checks
    // ===================

    fn check_detach_reattach_round_trip(count: usize, pick: usize) -> Result<(), TestCaseError> {
        let (mut model, class, attributes) = class_with_attributes(count);
        let before = model.clone();

        let detached = model
            .detach(attributes[pick])
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(detached.position().index(), pick);
        prop_assert_eq!(
            model.class(class).map(|c| c.attributes().len()),
            Some(count - 1)
        );

        model
            .reattach(detached)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(model, before);
        Ok(())
    }

    fn check_detach_all_in_reverse_restores(count: usize) -> Result<(), TestCaseError> {
        let (mut model, _, attributes) = class_with_attributes(count);
        let before = model.clone();

        let mut journal = Vec::new();
        for id in &attributes {
            journal.push(
                model
                    .detach(*id)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?,
            );
        }
        prop_assert!(journal.iter().all(|d| d.position().index() == 0));

        for detached in journal.into_iter().rev() {
            model
                .reattach(detached)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
        }
        prop_assert_eq!(model, before);
        Ok(())
    }

    proptest! {
        #[test]
        fn detach_reattach_round_trip((count, pick) in attribute_list_strategy()) {
            check_detach_reattach_round_trip(count, pick)?;
        }

        #[test]
        fn detach_all_in_reverse_restores(count in 1..12usize) {
            check_detach_all_in_reverse_restores(count)?;
        }
    }
}
