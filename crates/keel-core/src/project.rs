//! A project: one model and the diagrams that show it.

use indexmap::IndexMap;
use log::debug;

use crate::{
    diagram::{Diagram, DiagramId, DiagramKind},
    element::ElementId,
    identifier::Id,
    model::Model,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    model: Model,
    diagrams: IndexMap<DiagramId, Diagram>,
    next_diagram: u32,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing model without diagrams.
    pub fn with_model(model: Model) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn diagram(&self, id: DiagramId) -> Option<&Diagram> {
        self.diagrams.get(&id)
    }

    pub fn diagram_mut(&mut self, id: DiagramId) -> Option<&mut Diagram> {
        self.diagrams.get_mut(&id)
    }

    /// Diagrams in creation order.
    pub fn diagrams(&self) -> impl Iterator<Item = &Diagram> {
        self.diagrams.values()
    }

    /// Creates an empty diagram.
    pub fn add_diagram(&mut self, kind: DiagramKind, name: Id) -> DiagramId {
        let id = DiagramId::new(self.next_diagram);
        self.next_diagram += 1;
        debug!(diagram:% = id, kind:% = kind, name:% = name; "Created diagram");
        self.diagrams.insert(id, Diagram::new(id, kind, name));
        id
    }

    /// Diagrams on which `element` is present, in creation order.
    pub fn presence(&self, element: ElementId) -> Vec<DiagramId> {
        self.diagrams
            .values()
            .filter(|diagram| diagram.is_present(element))
            .map(Diagram::id)
            .collect()
    }
}
