//! `junction-store` – cross-cycle decision state.
//!
//! Holds everything the planner must remember between planning cycles within
//! one process run.  Nothing here is persisted to disk: a restart resets every
//! intersection to [`StopSignStatus::Unknown`][junction_types::StopSignStatus::Unknown].
//!
//! # Modules
//!
//! - [`decision_store`] – [`DecisionStore`][decision_store::DecisionStore]:
//!   a key-addressed table of typed values.  Entries under the same key but
//!   of different types are independent; a missing or differently-typed
//!   entry simply reads as absent.
//! - [`record`] – [`StopSignRecord`][record::StopSignRecord] and
//!   [`WatchVehicles`][record::WatchVehicles]: the per-intersection state the
//!   stop-sign rule advances every cycle.
//! - [`context`] – [`DecisionContext`][context::DecisionContext]: the
//!   session-owned handle passed into the rules, exposing a strongly-typed
//!   stop-sign view over the store.

pub mod context;
pub mod decision_store;
pub mod record;

pub use context::{DecisionContext, stop_sign_key};
pub use decision_store::DecisionStore;
pub use record::{StopSignRecord, WatchVehicles, WatchedVehicle};
