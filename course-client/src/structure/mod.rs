//! Course structure editor
//!
//! - [`drag`]: resolve a drop into a single-scope move
//! - [`reducer`]: `Idle` / `Reordering` / `Reconciling` state machine
//! - [`controller`]: optimistic mirror, snapshots and rollback
//! - [`gateway`]: the remote call behind a reorder

pub mod controller;
pub mod drag;
pub mod gateway;
pub mod reducer;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{ConcurrencyMode, Dispatch, ReorderController, SharedController};
pub use drag::{MovePlan, ResolutionError, move_item, resolve_drag};
pub use gateway::ReorderGateway;
pub use reducer::{Action, ControllerState, Effect, Outcome, Phase, Ticket, reduce};
