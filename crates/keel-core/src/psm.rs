//! Platform-specific model (PSM) elements.
//!
//! A PSM schema is a forest. Superordinate components ([`PsmClass`],
//! [`PsmContentContainer`]) own subordinate components
//! ([`PsmAssociation`], [`PsmAttributeContainer`], nested
//! [`PsmContentContainer`]); a [`PsmAssociation`] leads from its parent to a
//! child [`PsmClass`]. Every PSM class is derived from exactly one PIM class.

use crate::{element::ElementId, identifier::Id};

/// A PSM class derived from a PIM class.
///
/// A class with a structural representative reuses the structure of the
/// represented PSM class instead of repeating it.
#[derive(Debug, Clone, PartialEq)]
pub struct PsmClass {
    name: Id,
    represented: ElementId,
    attributes: Vec<ElementId>,
    components: Vec<ElementId>,
    representative: Option<ElementId>,
}

impl PsmClass {
    pub fn new(name: Id, represented: ElementId) -> Self {
        Self {
            name,
            represented,
            attributes: Vec::new(),
            components: Vec::new(),
            representative: None,
        }
    }

    pub fn with_representative(mut self, representative: ElementId) -> Self {
        self.representative = Some(representative);
        self
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn set_name(&mut self, name: Id) {
        self.name = name;
    }

    /// The PIM class this class is derived from.
    pub fn represented(&self) -> ElementId {
        self.represented
    }

    pub fn attributes(&self) -> &[ElementId] {
        &self.attributes
    }

    /// Subordinate components in order.
    pub fn components(&self) -> &[ElementId] {
        &self.components
    }

    /// The PSM class whose structure this class reuses.
    pub fn representative(&self) -> Option<ElementId> {
        self.representative
    }

    pub fn set_representative(&mut self, representative: Option<ElementId>) {
        self.representative = representative;
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Vec<ElementId> {
        &mut self.attributes
    }

    pub(crate) fn components_mut(&mut self) -> &mut Vec<ElementId> {
        &mut self.components
    }
}

/// An attribute of a PSM class or attribute container.
#[derive(Debug, Clone, PartialEq)]
pub struct PsmAttribute {
    owner: ElementId,
    name: Id,
    represented: Option<ElementId>,
    derived_through: Vec<ElementId>,
}

impl PsmAttribute {
    pub fn new(owner: ElementId, name: Id) -> Self {
        Self {
            owner,
            name,
            represented: None,
            derived_through: Vec::new(),
        }
    }

    /// Sets the PIM attribute this attribute is derived from.
    pub fn representing(mut self, attribute: ElementId) -> Self {
        self.represented = Some(attribute);
        self
    }

    /// Records that the represented attribute was inherited through
    /// `generalization`.
    pub fn through(mut self, generalization: ElementId) -> Self {
        self.derived_through.push(generalization);
        self
    }

    /// The owning PSM class or attribute container.
    pub fn owner(&self) -> ElementId {
        self.owner
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn set_name(&mut self, name: Id) {
        self.name = name;
    }

    pub fn represented(&self) -> Option<ElementId> {
        self.represented
    }

    /// Generalizations the represented attribute was inherited through.
    pub fn derived_through(&self) -> &[ElementId] {
        &self.derived_through
    }
}

/// Groups attributes of a PSM class, e.g. into an XML element.
#[derive(Debug, Clone, PartialEq)]
pub struct PsmAttributeContainer {
    parent: ElementId,
    attributes: Vec<ElementId>,
}

impl PsmAttributeContainer {
    pub fn new(parent: ElementId) -> Self {
        Self {
            parent,
            attributes: Vec::new(),
        }
    }

    pub fn parent(&self) -> ElementId {
        self.parent
    }

    pub fn attributes(&self) -> &[ElementId] {
        &self.attributes
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Vec<ElementId> {
        &mut self.attributes
    }
}

/// Path of PIM associations walked between a PSM association's parent and
/// child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestingJoin {
    path: Vec<ElementId>,
}

impl NestingJoin {
    pub fn new(path: Vec<ElementId>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &[ElementId] {
        &self.path
    }

    pub fn uses(&self, association: ElementId) -> bool {
        self.path.contains(&association)
    }
}

/// Tree edge from a superordinate component to a child PSM class.
#[derive(Debug, Clone, PartialEq)]
pub struct PsmAssociation {
    parent: ElementId,
    child: ElementId,
    nesting_joins: Vec<NestingJoin>,
    generalizations: Vec<ElementId>,
}

impl PsmAssociation {
    pub fn new(parent: ElementId, child: ElementId) -> Self {
        Self {
            parent,
            child,
            nesting_joins: Vec::new(),
            generalizations: Vec::new(),
        }
    }

    pub fn with_nesting_join(mut self, join: NestingJoin) -> Self {
        self.nesting_joins.push(join);
        self
    }

    /// Records a generalization the association was derived through.
    pub fn with_generalization(mut self, generalization: ElementId) -> Self {
        self.generalizations.push(generalization);
        self
    }

    pub fn parent(&self) -> ElementId {
        self.parent
    }

    pub fn child(&self) -> ElementId {
        self.child
    }

    pub fn nesting_joins(&self) -> &[NestingJoin] {
        &self.nesting_joins
    }

    pub fn generalizations(&self) -> &[ElementId] {
        &self.generalizations
    }
}

/// Superordinate component that is not derived from a PIM class.
///
/// A container without a parent is a schema root.
#[derive(Debug, Clone, PartialEq)]
pub struct PsmContentContainer {
    name: Id,
    parent: Option<ElementId>,
    components: Vec<ElementId>,
}

impl PsmContentContainer {
    pub fn new(name: Id, parent: Option<ElementId>) -> Self {
        Self {
            name,
            parent,
            components: Vec::new(),
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn set_name(&mut self, name: Id) {
        self.name = name;
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn components(&self) -> &[ElementId] {
        &self.components
    }

    pub(crate) fn components_mut(&mut self) -> &mut Vec<ElementId> {
        &mut self.components
    }
}
