//! Keel Core Types
//!
//! This crate provides the model that Keel's command engine edits:
//!
//! - **Identifiers**: string-interned element names ([`identifier::Id`])
//! - **Elements**: element identity and the closed set of PIM and PSM element
//!   variants ([`element`], [`pim`], [`psm`])
//! - **Model**: the element arena with ordered owner collections and the
//!   `detach`/`reattach` primitives ([`model::Model`])
//! - **Diagrams**: presence maps of elements shown on a diagram ([`diagram`])
//! - **Project**: a model together with its diagrams ([`project::Project`])

pub mod diagram;
pub mod element;
pub mod identifier;
pub mod model;
pub mod pim;
pub mod project;
pub mod psm;

pub use diagram::{Diagram, DiagramId, DiagramKind, ViewState};
pub use element::{Element, ElementId, ElementKind};
pub use identifier::Id;
pub use model::{Detached, Model, ModelError, Owner, Position};
pub use project::Project;
