//! Discovery of elements that depend on a set of seed elements.
//!
//! Before elements are deleted (or removed from a diagram) the caller asks
//! [`DependencyResolver`] which other elements structurally depend on them.
//! The result is a [`DependencyMap`] from each seed to its dependents; every
//! dependent carries the [`DerivationEdge`] that found it and an "include"
//! flag the caller may flip before building the final command.

use std::{collections::VecDeque, fmt};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use keel_core::{DiagramId, Element, ElementId, Project};

/// Where dependents are looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyScope {
    /// Anywhere in the model.
    Model,
    /// Only elements shown on this diagram, plus features that never appear
    /// on a diagram on their own (attributes). PSM components reached
    /// through a containment edge are followed whether shown or not, since
    /// they exist only as part of their superordinate.
    Diagram(DiagramId),
}

/// Why an element depends on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivationEdge {
    /// PIM class to its attributes.
    OwnedAttribute,
    /// PIM class to associations with an end at it.
    IncidentAssociation,
    /// PIM class to generalizations it takes part in.
    IncidentGeneralization,
    /// PIM class to PSM classes derived from it.
    DerivedPsmClass,
    /// PIM attribute to PSM attributes derived from it.
    DerivedPsmAttribute,
    /// Generalization to PSM attributes and associations derived through it.
    DerivedThroughGeneralization,
    /// PIM association to PSM associations whose nesting joins walk it.
    NestingJoin,
    /// PSM superordinate component to its attributes and components.
    Subordinate,
    /// PSM class to the PSM association leading to it.
    ParentAssociation,
    /// PSM association to its child PSM class.
    AssociationChild,
    /// PSM attribute to the attribute container it is the last attribute of.
    EmptiedContainer,
    /// PSM class to PSM classes using it as structural representative.
    StructuralRepresentative,
}

impl DerivationEdge {
    /// Whether dependents found through this edge are included by default.
    pub fn included_by_default(self) -> bool {
        !matches!(self, Self::EmptiedContainer)
    }

    /// Whether the dependent is structurally part of the element it was
    /// reached from.
    pub fn is_containment(self) -> bool {
        matches!(
            self,
            Self::Subordinate | Self::ParentAssociation | Self::AssociationChild
        )
    }
}

impl fmt::Display for DerivationEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::OwnedAttribute => "owned attribute",
            Self::IncidentAssociation => "incident association",
            Self::IncidentGeneralization => "incident generalization",
            Self::DerivedPsmClass => "derived PSM class",
            Self::DerivedPsmAttribute => "derived PSM attribute",
            Self::DerivedThroughGeneralization => "derived through generalization",
            Self::NestingJoin => "nesting join",
            Self::Subordinate => "subordinate component",
            Self::ParentAssociation => "parent association",
            Self::AssociationChild => "association child",
            Self::EmptiedContainer => "emptied container",
            Self::StructuralRepresentative => "structural representative",
        };
        f.write_str(label)
    }
}

/// An element found to depend on a seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependent {
    element: ElementId,
    edge: DerivationEdge,
    include: bool,
}

impl Dependent {
    pub fn new(element: ElementId, edge: DerivationEdge) -> Self {
        Self {
            element,
            edge,
            include: edge.included_by_default(),
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn edge(&self) -> DerivationEdge {
        self.edge
    }

    pub fn include(&self) -> bool {
        self.include
    }

    pub fn set_include(&mut self, include: bool) {
        self.include = include;
    }
}

/// Seeds and their dependents, in discovery order.
///
/// An element reachable from several seeds is listed under the first seed
/// that reached it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    entries: IndexMap<ElementId, Vec<Dependent>>,
}

impl DependencyMap {
    pub fn seeds(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.entries.keys().copied()
    }

    /// Dependents of `seed`, or an empty slice for an unknown seed.
    pub fn dependents(&self, seed: ElementId) -> &[Dependent] {
        self.entries.get(&seed).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &[Dependent])> {
        self.entries
            .iter()
            .map(|(seed, dependents)| (*seed, dependents.as_slice()))
    }

    /// Returns `true` if any seed has a dependent.
    pub fn has_dependents(&self) -> bool {
        self.entries.values().any(|dependents| !dependents.is_empty())
    }

    /// Sets the include flag of `element` wherever it is listed.
    ///
    /// Returns `false` if the element is not a dependent.
    pub fn set_include(&mut self, element: ElementId, include: bool) -> bool {
        let mut found = false;
        for dependent in self.entries.values_mut().flatten() {
            if dependent.element == element {
                dependent.include = include;
                found = true;
            }
        }
        found
    }

    /// Sets every include flag at once.
    pub fn include_all(&mut self, include: bool) {
        self.entries
            .values_mut()
            .flatten()
            .for_each(|dependent| dependent.include = include);
    }

    /// Seeds followed by their included dependents, without duplicates.
    pub fn deletion_set(&self) -> Vec<ElementId> {
        let mut set = IndexSet::new();
        for (seed, dependents) in &self.entries {
            set.insert(*seed);
            set.extend(
                dependents
                    .iter()
                    .filter(|dependent| dependent.include)
                    .map(|dependent| dependent.element),
            );
        }
        set.into_iter().collect()
    }
}

/// Computes [`DependencyMap`]s against a project.
#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver<'a> {
    project: &'a Project,
    scope: DependencyScope,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(project: &'a Project, scope: DependencyScope) -> Self {
        Self { project, scope }
    }

    /// Finds the dependents of every seed.
    ///
    /// Derivation edges are followed breadth first. Structural representative
    /// back-references are not part of that walk; they are collected
    /// afterwards, repeatedly, until no new representative turns up, and each
    /// representative found brings its own derivation closure along. A shared
    /// discovered set keeps every element listed once.
    pub fn resolve(&self, seeds: impl IntoIterator<Item = ElementId>) -> DependencyMap {
        let mut entries: IndexMap<ElementId, Vec<Dependent>> = IndexMap::new();
        for seed in seeds {
            entries.entry(seed).or_default();
        }
        let mut discovered: IndexSet<ElementId> = entries.keys().copied().collect();
        let seeds: Vec<ElementId> = entries.keys().copied().collect();

        for seed in &seeds {
            let found = self.expand(*seed, &mut discovered);
            entries[seed].extend(found);
        }

        loop {
            let mut grew = false;
            for seed in &seeds {
                let mut reached = vec![*seed];
                reached.extend(entries[seed].iter().map(Dependent::element));

                let mut found = Vec::new();
                for element in reached {
                    for representative in self.project.model().representatives_of(element) {
                        if !self.in_scope(representative) || !discovered.insert(representative) {
                            continue;
                        }
                        found.push(Dependent::new(
                            representative,
                            DerivationEdge::StructuralRepresentative,
                        ));
                        found.extend(self.expand(representative, &mut discovered));
                    }
                }
                if !found.is_empty() {
                    grew = true;
                    entries[seed].extend(found);
                }
            }
            if !grew {
                break;
            }
        }

        let map = DependencyMap { entries };
        debug!(
            scope:? = self.scope,
            seeds = seeds.len(),
            dependents = discovered.len() - seeds.len();
            "Resolved dependencies"
        );
        trace!(map:?; "Dependency map");
        map
    }

    /// Breadth-first walk over derivation edges from `start`.
    fn expand(&self, start: ElementId, discovered: &mut IndexSet<ElementId>) -> Vec<Dependent> {
        let mut found = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for (element, edge) in self.direct_dependents(current) {
                let in_scope = edge.is_containment() || self.in_scope(element);
                if !in_scope || !discovered.insert(element) {
                    continue;
                }
                found.push(Dependent::new(element, edge));
                queue.push_back(element);
            }
        }
        found
    }

    fn in_scope(&self, element: ElementId) -> bool {
        match self.scope {
            DependencyScope::Model => true,
            DependencyScope::Diagram(diagram) => {
                let presentable = self
                    .project
                    .model()
                    .kind(element)
                    .is_some_and(|kind| kind.is_presentable());
                !presentable
                    || self
                        .project
                        .diagram(diagram)
                        .is_some_and(|diagram| diagram.is_present(element))
            }
        }
    }

    /// Elements depending on `id` through a single derivation edge.
    fn direct_dependents(&self, id: ElementId) -> Vec<(ElementId, DerivationEdge)> {
        let model = self.project.model();
        let Some(element) = model.get(id) else {
            return Vec::new();
        };
        let mut dependents = Vec::new();

        match element {
            Element::Class(class) => {
                dependents.extend(tagged(
                    DerivationEdge::OwnedAttribute,
                    class.attributes().iter().copied(),
                ));
                dependents.extend(tagged(
                    DerivationEdge::IncidentAssociation,
                    model.associations().iter().copied().filter(|association| {
                        model
                            .association(*association)
                            .is_some_and(|association| association.connects(id))
                    }),
                ));
                dependents.extend(tagged(
                    DerivationEdge::IncidentGeneralization,
                    model.generalizations().iter().copied().filter(|generalization| {
                        model
                            .generalization(*generalization)
                            .is_some_and(|generalization| generalization.involves(id))
                    }),
                ));
                dependents.extend(tagged(
                    DerivationEdge::DerivedPsmClass,
                    model.derived_psm_classes(id),
                ));
            }
            Element::Attribute(_) => dependents.extend(tagged(
                DerivationEdge::DerivedPsmAttribute,
                model.iter().filter_map(|(candidate, element)| {
                    element
                        .as_psm_attribute()
                        .filter(|attribute| attribute.represented() == Some(id))
                        .map(|_| candidate)
                }),
            )),
            Element::Association(_) => dependents.extend(tagged(
                DerivationEdge::NestingJoin,
                model.iter().filter_map(|(candidate, element)| {
                    element
                        .as_psm_association()
                        .filter(|association| {
                            association.nesting_joins().iter().any(|join| join.uses(id))
                        })
                        .map(|_| candidate)
                }),
            )),
            Element::Generalization(_) => dependents.extend(tagged(
                DerivationEdge::DerivedThroughGeneralization,
                model.iter().filter_map(|(candidate, element)| {
                    let through = match element {
                        Element::PsmAttribute(attribute) => {
                            attribute.derived_through().contains(&id)
                        }
                        Element::PsmAssociation(association) => {
                            association.generalizations().contains(&id)
                        }
                        _ => false,
                    };
                    through.then_some(candidate)
                }),
            )),
            Element::PsmClass(class) => {
                dependents.extend(tagged(
                    DerivationEdge::Subordinate,
                    class.attributes().iter().chain(class.components()).copied(),
                ));
                dependents.extend(tagged(
                    DerivationEdge::ParentAssociation,
                    model.parent_association(id),
                ));
            }
            Element::PsmAttributeContainer(container) => dependents.extend(tagged(
                DerivationEdge::Subordinate,
                container.attributes().iter().copied(),
            )),
            Element::PsmContentContainer(container) => dependents.extend(tagged(
                DerivationEdge::Subordinate,
                container.components().iter().copied(),
            )),
            Element::PsmAssociation(association) => dependents.extend(tagged(
                DerivationEdge::AssociationChild,
                [association.child()],
            )),
            Element::PsmAttribute(attribute) => {
                let emptied = model
                    .psm_attribute_container(attribute.owner())
                    .filter(|container| container.attributes() == [id])
                    .map(|_| attribute.owner());
                dependents.extend(tagged(DerivationEdge::EmptiedContainer, emptied));
            }
        }

        dependents
    }
}

fn tagged(
    edge: DerivationEdge,
    elements: impl IntoIterator<Item = ElementId>,
) -> impl Iterator<Item = (ElementId, DerivationEdge)> {
    elements.into_iter().map(move |element| (element, edge))
}
