//! Platform-independent model (PIM) elements.
//!
//! Classes own an ordered attribute list; associations and generalizations
//! are top-level elements that reference classes by [`ElementId`].

use std::fmt;

use crate::{element::ElementId, identifier::Id};

/// Cardinality bounds of an attribute or association end.
///
/// An `upper` of `None` means unbounded (`*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multiplicity {
    lower: u32,
    upper: Option<u32>,
}

impl Multiplicity {
    /// Exactly one, `[1..1]`.
    pub const ONE: Self = Self::new(1, Some(1));

    /// Optional, `[0..1]`.
    pub const OPTIONAL: Self = Self::new(0, Some(1));

    /// Any number, `[0..*]`.
    pub const MANY: Self = Self::new(0, None);

    /// Creates multiplicity bounds without checking them.
    ///
    /// See [`Multiplicity::is_valid`].
    pub const fn new(lower: u32, upper: Option<u32>) -> Self {
        Self { lower, upper }
    }

    pub fn lower(&self) -> u32 {
        self.lower
    }

    pub fn upper(&self) -> Option<u32> {
        self.upper
    }

    /// Returns `true` if the bounds describe a non-empty range with a
    /// positive upper bound.
    pub fn is_valid(&self) -> bool {
        match self.upper {
            Some(upper) => upper > 0 && self.lower <= upper,
            None => true,
        }
    }
}

impl Default for Multiplicity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "[{}..{}]", self.lower, upper),
            None => write!(f, "[{}..*]", self.lower),
        }
    }
}

/// A PIM class.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    name: Id,
    attributes: Vec<ElementId>,
}

impl Class {
    pub fn new(name: Id) -> Self {
        Self {
            name,
            attributes: Vec::new(),
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn set_name(&mut self, name: Id) {
        self.name = name;
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> &[ElementId] {
        &self.attributes
    }

    pub(crate) fn attributes_mut(&mut self) -> &mut Vec<ElementId> {
        &mut self.attributes
    }
}

/// An attribute owned by a PIM class.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    class: ElementId,
    name: Id,
    type_name: Option<Id>,
    multiplicity: Multiplicity,
}

impl Attribute {
    pub fn new(class: ElementId, name: Id, multiplicity: Multiplicity) -> Self {
        Self {
            class,
            name,
            type_name: None,
            multiplicity,
        }
    }

    pub fn with_type(mut self, type_name: Id) -> Self {
        self.type_name = Some(type_name);
        self
    }

    /// The owning class.
    pub fn class(&self) -> ElementId {
        self.class
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn set_name(&mut self, name: Id) {
        self.name = name;
    }

    pub fn type_name(&self) -> Option<Id> {
        self.type_name
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    pub fn set_multiplicity(&mut self, multiplicity: Multiplicity) {
        self.multiplicity = multiplicity;
    }
}

/// One end of a PIM association.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationEnd {
    class: ElementId,
    multiplicity: Multiplicity,
    role: Option<Id>,
}

impl AssociationEnd {
    pub fn new(class: ElementId, multiplicity: Multiplicity) -> Self {
        Self {
            class,
            multiplicity,
            role: None,
        }
    }

    pub fn with_role(mut self, role: Id) -> Self {
        self.role = Some(role);
        self
    }

    pub fn class(&self) -> ElementId {
        self.class
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    pub fn role(&self) -> Option<Id> {
        self.role
    }
}

/// A PIM association connecting two or more classes.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    name: Option<Id>,
    ends: Vec<AssociationEnd>,
}

impl Association {
    pub fn new(name: Option<Id>, ends: Vec<AssociationEnd>) -> Self {
        Self { name, ends }
    }

    pub fn name(&self) -> Option<Id> {
        self.name
    }

    pub fn set_name(&mut self, name: Option<Id>) {
        self.name = name;
    }

    pub fn ends(&self) -> &[AssociationEnd] {
        &self.ends
    }

    /// Returns `true` if any end is attached to `class`.
    pub fn connects(&self, class: ElementId) -> bool {
        self.ends.iter().any(|end| end.class == class)
    }
}

/// A PIM generalization: `specific` inherits from `general`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generalization {
    general: ElementId,
    specific: ElementId,
}

impl Generalization {
    pub fn new(general: ElementId, specific: ElementId) -> Self {
        Self { general, specific }
    }

    pub fn general(&self) -> ElementId {
        self.general
    }

    pub fn specific(&self) -> ElementId {
        self.specific
    }

    /// Returns `true` if `class` is either side of this generalization.
    pub fn involves(&self, class: ElementId) -> bool {
        self.general == class || self.specific == class
    }
}
