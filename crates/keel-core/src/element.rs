//! Element identity and the closed set of element variants.
//!
//! Every model element, PIM or PSM, lives in the [`Model`](crate::model::Model)
//! arena under an [`ElementId`] and is one of the [`Element`] variants.

use std::fmt;

use crate::{
    identifier::Id,
    pim::{Association, Attribute, Class, Generalization},
    psm::{PsmAssociation, PsmAttribute, PsmAttributeContainer, PsmClass, PsmContentContainer},
};

/// Stable identity of a model element.
///
/// Ids are allocated by the model and never reused, so an element that is
/// detached and later reattached keeps its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    /// Wraps a raw id value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminant of an [`Element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Class,
    Attribute,
    Association,
    Generalization,
    PsmClass,
    PsmAttribute,
    PsmAttributeContainer,
    PsmAssociation,
    PsmContentContainer,
}

impl ElementKind {
    /// Returns `true` for platform-specific (PSM) element kinds.
    pub fn is_psm(self) -> bool {
        matches!(
            self,
            Self::PsmClass
                | Self::PsmAttribute
                | Self::PsmAttributeContainer
                | Self::PsmAssociation
                | Self::PsmContentContainer
        )
    }

    /// Returns `true` if elements of this kind are shown on a diagram on
    /// their own, rather than only inside their owner.
    pub fn is_presentable(self) -> bool {
        !matches!(self, Self::Attribute | Self::PsmAttribute)
    }

    /// Returns `true` for PSM kinds that can own subordinate components.
    pub fn is_superordinate(self) -> bool {
        matches!(self, Self::PsmClass | Self::PsmContentContainer)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Class => "class",
            Self::Attribute => "attribute",
            Self::Association => "association",
            Self::Generalization => "generalization",
            Self::PsmClass => "PSM class",
            Self::PsmAttribute => "PSM attribute",
            Self::PsmAttributeContainer => "PSM attribute container",
            Self::PsmAssociation => "PSM association",
            Self::PsmContentContainer => "PSM content container",
        };
        f.write_str(name)
    }
}

/// A model element of either layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Class(Class),
    Attribute(Attribute),
    Association(Association),
    Generalization(Generalization),
    PsmClass(PsmClass),
    PsmAttribute(PsmAttribute),
    PsmAttributeContainer(PsmAttributeContainer),
    PsmAssociation(PsmAssociation),
    PsmContentContainer(PsmContentContainer),
}

impl Element {
    /// Returns the kind of this element.
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Class(_) => ElementKind::Class,
            Self::Attribute(_) => ElementKind::Attribute,
            Self::Association(_) => ElementKind::Association,
            Self::Generalization(_) => ElementKind::Generalization,
            Self::PsmClass(_) => ElementKind::PsmClass,
            Self::PsmAttribute(_) => ElementKind::PsmAttribute,
            Self::PsmAttributeContainer(_) => ElementKind::PsmAttributeContainer,
            Self::PsmAssociation(_) => ElementKind::PsmAssociation,
            Self::PsmContentContainer(_) => ElementKind::PsmContentContainer,
        }
    }

    /// Returns the element's name, if its kind carries one.
    pub fn name(&self) -> Option<Id> {
        match self {
            Self::Class(class) => Some(class.name()),
            Self::Attribute(attribute) => Some(attribute.name()),
            Self::Association(association) => association.name(),
            Self::PsmClass(class) => Some(class.name()),
            Self::PsmAttribute(attribute) => Some(attribute.name()),
            Self::PsmContentContainer(container) => Some(container.name()),
            Self::Generalization(_)
            | Self::PsmAttributeContainer(_)
            | Self::PsmAssociation(_) => None,
        }
    }

    /// Replaces the element's name.
    ///
    /// Returns `false`, leaving the element untouched, if its kind is unnamed.
    pub fn set_name(&mut self, name: Id) -> bool {
        match self {
            Self::Class(class) => class.set_name(name),
            Self::Attribute(attribute) => attribute.set_name(name),
            Self::Association(association) => association.set_name(Some(name)),
            Self::PsmClass(class) => class.set_name(name),
            Self::PsmAttribute(attribute) => attribute.set_name(name),
            Self::PsmContentContainer(container) => container.set_name(name),
            Self::Generalization(_)
            | Self::PsmAttributeContainer(_)
            | Self::PsmAssociation(_) => return false,
        }
        true
    }

    /// Returns every element this element structurally requires to be
    /// present: its owner plus anything it references.
    ///
    /// The result has no duplicates and keeps declaration order.
    pub fn requirements(&self) -> Vec<ElementId> {
        let mut required = Vec::new();
        let mut push = |id: ElementId| {
            if !required.contains(&id) {
                required.push(id);
            }
        };

        match self {
            Self::Class(_) => {}
            Self::Attribute(attribute) => push(attribute.class()),
            Self::Association(association) => {
                association.ends().iter().for_each(|end| push(end.class()));
            }
            Self::Generalization(generalization) => {
                push(generalization.general());
                push(generalization.specific());
            }
            Self::PsmClass(class) => {
                push(class.represented());
                if let Some(representative) = class.representative() {
                    push(representative);
                }
            }
            Self::PsmAttribute(attribute) => {
                push(attribute.owner());
                if let Some(represented) = attribute.represented() {
                    push(represented);
                }
                attribute.derived_through().iter().copied().for_each(push);
            }
            Self::PsmAttributeContainer(container) => push(container.parent()),
            Self::PsmAssociation(association) => {
                push(association.parent());
                push(association.child());
                association
                    .nesting_joins()
                    .iter()
                    .flat_map(|join| join.path().iter().copied())
                    .for_each(&mut push);
                association.generalizations().iter().copied().for_each(push);
            }
            Self::PsmContentContainer(container) => {
                if let Some(parent) = container.parent() {
                    push(parent);
                }
            }
        }

        required
    }

    /// Returns the ids held in this element's owned collections.
    pub fn owned(&self) -> Vec<ElementId> {
        match self {
            Self::Class(class) => class.attributes().to_vec(),
            Self::PsmClass(class) => class
                .attributes()
                .iter()
                .chain(class.components())
                .copied()
                .collect(),
            Self::PsmAttributeContainer(container) => container.attributes().to_vec(),
            Self::PsmContentContainer(container) => container.components().to_vec(),
            _ => Vec::new(),
        }
    }

    pub fn as_class(&self) -> Option<&Class> {
        match self {
            Self::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_attribute(&self) -> Option<&Attribute> {
        match self {
            Self::Attribute(attribute) => Some(attribute),
            _ => None,
        }
    }

    pub fn as_association(&self) -> Option<&Association> {
        match self {
            Self::Association(association) => Some(association),
            _ => None,
        }
    }

    pub fn as_generalization(&self) -> Option<&Generalization> {
        match self {
            Self::Generalization(generalization) => Some(generalization),
            _ => None,
        }
    }

    pub fn as_psm_class(&self) -> Option<&PsmClass> {
        match self {
            Self::PsmClass(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_psm_attribute(&self) -> Option<&PsmAttribute> {
        match self {
            Self::PsmAttribute(attribute) => Some(attribute),
            _ => None,
        }
    }

    pub fn as_psm_attribute_container(&self) -> Option<&PsmAttributeContainer> {
        match self {
            Self::PsmAttributeContainer(container) => Some(container),
            _ => None,
        }
    }

    pub fn as_psm_association(&self) -> Option<&PsmAssociation> {
        match self {
            Self::PsmAssociation(association) => Some(association),
            _ => None,
        }
    }

    pub fn as_psm_content_container(&self) -> Option<&PsmContentContainer> {
        match self {
            Self::PsmContentContainer(container) => Some(container),
            _ => None,
        }
    }
}

impl From<Class> for Element {
    fn from(class: Class) -> Self {
        Self::Class(class)
    }
}

impl From<Attribute> for Element {
    fn from(attribute: Attribute) -> Self {
        Self::Attribute(attribute)
    }
}

impl From<Association> for Element {
    fn from(association: Association) -> Self {
        Self::Association(association)
    }
}

impl From<Generalization> for Element {
    fn from(generalization: Generalization) -> Self {
        Self::Generalization(generalization)
    }
}

impl From<PsmClass> for Element {
    fn from(class: PsmClass) -> Self {
        Self::PsmClass(class)
    }
}

impl From<PsmAttribute> for Element {
    fn from(attribute: PsmAttribute) -> Self {
        Self::PsmAttribute(attribute)
    }
}

impl From<PsmAttributeContainer> for Element {
    fn from(container: PsmAttributeContainer) -> Self {
        Self::PsmAttributeContainer(container)
    }
}

impl From<PsmAssociation> for Element {
    fn from(association: PsmAssociation) -> Self {
        Self::PsmAssociation(association)
    }
}

impl From<PsmContentContainer> for Element {
    fn from(container: PsmContentContainer) -> Self {
        Self::PsmContentContainer(container)
    }
}
