//! Keel Command Engine
//!
//! Every change to a Keel [`Project`](keel_core::Project) goes through a
//! command. This crate provides:
//!
//! - **Commands**: the [`Command`] contract and the concrete PIM, PSM and
//!   diagram commands ([`commands`])
//! - **Transactions**: [`MacroCommand`] runs a sequence of commands as one
//!   unit and compensates on failure
//! - **History**: [`CommandController`] executes commands and keeps the undo
//!   and redo stacks
//! - **Dependencies**: [`DependencyResolver`] computes what has to go when an
//!   element is deleted
//! - **Ordering**: [`RemovalOrder`] finds an order in which a set of
//!   elements can be removed and restored

pub mod commands;
pub mod error;

mod command;
mod controller;
mod dependency;
mod holder;
mod macro_command;
mod order;

pub use command::{Command, MandatoryArgument, Producer, Undoable, Validatable};
pub use controller::{CommandController, ExecutionEvent};
pub use dependency::{
    DependencyMap, DependencyResolver, DependencyScope, Dependent, DerivationEdge,
};
pub use error::{CommandError, ControllerError, OrderingError, UndoFailure, ValidationError};
pub use holder::ElementHolder;
pub use macro_command::{MacroBuilder, MacroCommand};
pub use order::RemovalOrder;
