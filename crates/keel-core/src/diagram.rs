//! Diagrams and their presence maps.
//!
//! A diagram shows a subset of the model's elements. Geometry belongs to the
//! host; the diagram only keeps an ordered presence map from element to an
//! opaque [`ViewState`] so that removing and re-adding an element restores
//! both its position in the drawing order and its view data.

use std::fmt;

use indexmap::IndexMap;

use crate::{element::ElementId, identifier::Id};

/// Identity of a diagram within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiagramId(u32);

impl DiagramId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DiagramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "diagram {}", self.0)
    }
}

/// Which model layer a diagram shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagramKind {
    Pim,
    Psm,
}

impl DiagramKind {
    /// Returns `true` if elements of the given layer may be shown.
    pub fn accepts_psm(self, is_psm: bool) -> bool {
        matches!((self, is_psm), (Self::Psm, true) | (Self::Pim, false))
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pim => write!(f, "PIM"),
            Self::Psm => write!(f, "PSM"),
        }
    }
}

/// Host-owned view data of an element on a diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewState {
    pub x: f32,
    pub y: f32,
}

impl ViewState {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A diagram and its ordered set of present elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    id: DiagramId,
    kind: DiagramKind,
    name: Id,
    present: IndexMap<ElementId, ViewState>,
}

impl Diagram {
    pub fn new(id: DiagramId, kind: DiagramKind, name: Id) -> Self {
        Self {
            id,
            kind,
            name,
            present: IndexMap::new(),
        }
    }

    pub fn id(&self) -> DiagramId {
        self.id
    }

    pub fn kind(&self) -> DiagramKind {
        self.kind
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn is_present(&self, element: ElementId) -> bool {
        self.present.contains_key(&element)
    }

    pub fn view_state(&self, element: ElementId) -> Option<ViewState> {
        self.present.get(&element).copied()
    }

    /// Present elements in drawing order.
    pub fn elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.present.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    /// Appends an element.
    ///
    /// Returns `false`, leaving the diagram unchanged, if it is already
    /// present.
    pub fn add(&mut self, element: ElementId, view: ViewState) -> bool {
        if self.is_present(element) {
            return false;
        }
        self.present.insert(element, view);
        true
    }

    /// Inserts an element at `index` in drawing order.
    ///
    /// Returns `false` if it is already present or `index` is past the end.
    pub fn insert_at(&mut self, index: usize, element: ElementId, view: ViewState) -> bool {
        if self.is_present(element) || index > self.present.len() {
            return false;
        }
        self.present.shift_insert(index, element, view);
        true
    }

    /// Removes an element, returning its former index and view state.
    pub fn remove(&mut self, element: ElementId) -> Option<(usize, ViewState)> {
        self.present
            .shift_remove_full(&element)
            .map(|(index, _, view)| (index, view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagram() -> Diagram {
        Diagram::new(DiagramId::new(0), DiagramKind::Pim, Id::new("Main"))
    }

    #[test]
    fn test_add_is_idempotent_per_element() {
        let mut diagram = diagram();
        let element = ElementId::new(1);

        assert!(diagram.add(element, ViewState::new(1.0, 2.0)));
        assert!(!diagram.add(element, ViewState::default()));
        assert_eq!(diagram.len(), 1);
        assert_eq!(diagram.view_state(element), Some(ViewState::new(1.0, 2.0)));
    }

    #[test]
    fn test_remove_and_insert_at_restore_order() {
        let mut diagram = diagram();
        let ids: Vec<_> = (0..3).map(ElementId::new).collect();
        for id in &ids {
            diagram.add(*id, ViewState::default());
        }
        let before = diagram.clone();

        let (index, view) = diagram.remove(ids[1]).expect("element should be present");
        assert_eq!(index, 1);
        assert_eq!(diagram.elements().collect::<Vec<_>>(), vec![ids[0], ids[2]]);

        assert!(diagram.insert_at(index, ids[1], view));
        assert_eq!(diagram, before);
    }

    #[test]
    fn test_insert_at_rejects_out_of_range() {
        let mut diagram = diagram();

        assert!(!diagram.insert_at(1, ElementId::new(0), ViewState::default()));
        assert!(diagram.is_empty());
    }

    #[test]
    fn test_kind_accepts_layer() {
        assert!(DiagramKind::Psm.accepts_psm(true));
        assert!(!DiagramKind::Psm.accepts_psm(false));
        assert!(DiagramKind::Pim.accepts_psm(false));
    }
}
