//! Safe removal order for a set of elements.
//!
//! Removing elements one at a time only works if every element goes before
//! anything it requires: an association before its end classes, a component
//! before its container, an attribute before its class. [`RemovalOrder`]
//! restricts the "requires" relation to the candidate set and sorts it
//! topologically; restoring in the exact reverse order puts every requirement
//! back before the elements that need it.

use indexmap::IndexMap;
use log::trace;
use petgraph::{algo::toposort, graph::DiGraph};

use keel_core::{ElementId, Model};

use crate::error::OrderingError;

/// A deletion order over a candidate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalOrder {
    deletion: Vec<ElementId>,
}

impl RemovalOrder {
    /// Orders `candidates` so that every element precedes what it requires.
    ///
    /// Duplicates are ignored.
    ///
    /// # Errors
    ///
    /// - [`OrderingError::UnknownElement`] if a candidate is not in the model.
    /// - [`OrderingError::Cycle`] if the candidates require each other in a
    ///   loop, which only structural representatives can produce.
    pub fn compute(
        model: &Model,
        candidates: impl IntoIterator<Item = ElementId>,
    ) -> Result<Self, OrderingError> {
        let mut graph = DiGraph::<ElementId, ()>::new();
        let mut nodes = IndexMap::new();

        for id in candidates {
            if !model.contains(id) {
                return Err(OrderingError::UnknownElement(id));
            }
            nodes.entry(id).or_insert_with(|| graph.add_node(id));
        }

        for (id, node) in &nodes {
            let Some(element) = model.get(*id) else {
                continue;
            };
            for required in element.requirements() {
                if let Some(target) = nodes.get(&required) {
                    graph.add_edge(*node, *target, ());
                }
            }
        }

        let sorted = toposort(&graph, None).map_err(|cycle| OrderingError::Cycle {
            element: graph[cycle.node_id()],
        })?;
        let deletion: Vec<_> = sorted.into_iter().map(|node| graph[node]).collect();

        trace!(deletion:?; "Computed removal order");
        Ok(Self { deletion })
    }

    /// Elements in the order they can be removed.
    pub fn deletion_order(&self) -> &[ElementId] {
        &self.deletion
    }

    /// Elements in the order they can be restored.
    pub fn restoration_order(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.deletion.iter().rev().copied()
    }

    pub fn len(&self) -> usize {
        self.deletion.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deletion.is_empty()
    }

    pub fn into_vec(self) -> Vec<ElementId> {
        self.deletion
    }
}


#[cfg(test)]
mod proptest_tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use keel_core::{
        Id, Owner,
        pim::{Association, AssociationEnd, Attribute, Class, Generalization, Multiplicity},
        psm::{PsmAssociation, PsmAttribute, PsmClass},
    };

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// A PIM model of `n` classes with attributes, associations and
    /// generalizations between random classes.
    fn pim_model_strategy() -> impl Strategy<Value = Model> {
        (2..8usize)
            .prop_flat_map(|classes| {
                (
                    Just(classes),
                    prop::collection::vec(0..classes, 0..8),
                    prop::collection::vec((0..classes, 0..classes), 0..10),
                    prop::collection::vec((0..classes, 0..classes), 0..5),
                )
            })
            .prop_map(|(classes, attributes, associations, generalizations)| {
                let mut model = Model::new();
                let ids: Vec<_> = (0..classes)
                    .map(|index| {
                        model
                            .add(Class::new(Id::new(&format!("C{index}"))), Owner::Classes)
                            .expect("class insertion")
                    })
                    .collect();
                for (index, owner) in attributes.into_iter().enumerate() {
                    let class = ids[owner];
                    model
                        .add(
                            Attribute::new(class, Id::new(&format!("a{index}")), Multiplicity::ONE),
                            Owner::Attributes(class),
                        )
                        .expect("attribute insertion");
                }
                for (a, b) in associations {
                    let ends = vec![
                        AssociationEnd::new(ids[a], Multiplicity::ONE),
                        AssociationEnd::new(ids[b], Multiplicity::MANY),
                    ];
                    model
                        .add(Association::new(None, ends), Owner::Associations)
                        .expect("association insertion");
                }
                for (general, specific) in generalizations {
                    if general < specific {
                        model
                            .add(
                                Generalization::new(ids[general], ids[specific]),
                                Owner::Generalizations,
                            )
                            .expect("generalization insertion");
                    }
                }
                model
            })
    }

    /// A PSM forest over one PIM class: each new PSM class either becomes a
    /// root or hangs below an earlier class through a PSM association.
    fn psm_model_strategy() -> impl Strategy<Value = Model> {
        prop::collection::vec((any::<bool>(), any::<prop::sample::Index>(), 0..3usize), 1..10)
            .prop_map(|nodes| {
                let mut model = Model::new();
                let class = model
                    .add(Class::new(Id::new("Item")), Owner::Classes)
                    .expect("class insertion");
                let mut psm_classes: Vec<ElementId> = Vec::new();
                for (index, (is_root, parent, attributes)) in nodes.into_iter().enumerate() {
                    let name = Id::new(&format!("P{index}"));
                    let id = if is_root || psm_classes.is_empty() {
                        model
                            .add(PsmClass::new(name, class), Owner::PsmRoots)
                            .expect("root insertion")
                    } else {
                        let parent = *parent.get(&psm_classes);
                        let child = model
                            .add(PsmClass::new(name, class), Owner::PsmClasses)
                            .expect("class insertion");
                        model
                            .add(PsmAssociation::new(parent, child), Owner::Components(parent))
                            .expect("association insertion");
                        child
                    };
                    for attribute in 0..attributes {
                        model
                            .add(
                                PsmAttribute::new(id, Id::new(&format!("p{attribute}"))),
                                Owner::PsmAttributes(id),
                            )
                            .expect("attribute insertion");
                    }
                    psm_classes.push(id);
                }
                model
            })
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Every element is deleted before anything it requires, so the order
    /// detaches cleanly and the reverse order restores the model exactly.
    fn check_order_detaches_and_restores(model: Model) -> Result<(), TestCaseError> {
        let candidates: Vec<_> = model.iter().map(|(id, _)| id).collect();
        let order = RemovalOrder::compute(&model, candidates.iter().copied())
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        prop_assert_eq!(order.len(), candidates.len());

        let positions: HashMap<_, _> = order
            .deletion_order()
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index))
            .collect();
        for (id, element) in model.iter() {
            for required in element.requirements() {
                prop_assert!(positions[&id] < positions[&required]);
            }
        }

        let mut working = model.clone();
        let mut detached = Vec::new();
        for id in order.deletion_order() {
            let record = working
                .detach(*id)
                .map_err(|err| TestCaseError::fail(err.to_string()))?;
            detached.push(record);
        }
        prop_assert!(working.is_empty());

        for record in detached.into_iter().rev() {
            working
                .reattach(record)
                .map_err(|err| TestCaseError::fail(err.to_string()))?;
        }
        prop_assert_eq!(working, model);
        Ok(())
    }

    /// Associations are removed before both of their end classes.
    fn check_associations_precede_endpoints(model: Model) -> Result<(), TestCaseError> {
        let order = RemovalOrder::compute(&model, model.iter().map(|(id, _)| id))
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let position = |id: ElementId| order.deletion_order().iter().position(|item| *item == id);

        for (id, element) in model.iter() {
            let endpoints: Vec<ElementId> = match (element.as_association(), element.as_psm_association()) {
                (Some(association), _) => association.ends().iter().map(AssociationEnd::class).collect(),
                (_, Some(association)) => vec![association.parent(), association.child()],
                _ => continue,
            };
            for endpoint in endpoints {
                prop_assert!(position(id) < position(endpoint));
            }
        }
        Ok(())
    }

    // ===================
    // Property Tests
    // ===================

    proptest! {
        #[test]
        fn pim_order_detaches_and_restores(model in pim_model_strategy()) {
            check_order_detaches_and_restores(model)?;
        }

        #[test]
        fn psm_order_detaches_and_restores(model in psm_model_strategy()) {
            check_order_detaches_and_restores(model)?;
        }

        #[test]
        fn pim_associations_precede_endpoints(model in pim_model_strategy()) {
            check_associations_precede_endpoints(model)?;
        }

        #[test]
        fn psm_associations_precede_endpoints(model in psm_model_strategy()) {
            check_associations_precede_endpoints(model)?;
        }
    }
}
