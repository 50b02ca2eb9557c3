//! Container state reconciliation.
//!
//! Everything here is stateless between calls: each operation takes a fresh
//! snapshot from the runtime and never caches container state.

pub mod action;
pub mod inventory;
pub mod lifecycle;
pub mod record;
pub mod snapshot;
pub mod status;
pub mod sync;

pub use action::Action;
pub use lifecycle::Outcome;
pub use record::ContainerRecord;
