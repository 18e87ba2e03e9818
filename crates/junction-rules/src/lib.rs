//! `junction-rules` – traffic-rule decisions.
//!
//! Turns one cycle's ego, map and perception snapshot into per-intersection
//! STOP/CRUISE decisions, persisting cross-cycle state in the session's
//! [`DecisionContext`][junction_store::DecisionContext].
//!
//! # Modules
//!
//! - [`rule_set`] – [`TrafficRule`][rule_set::TrafficRule] and
//!   [`RuleSet`][rule_set::RuleSet]: every enabled rule is evaluated once per
//!   cycle in registration order and their decisions and faults collected.
//! - [`map`] – [`StopSignMap`][map::StopSignMap]: the map-topology seam that
//!   resolves a stop-sign identity to its lane grouping.
//! - [`right_of_way`] – [`RightOfWayTracker`][right_of_way::RightOfWayTracker]:
//!   decides which peer vehicles arrived first and must be waited out.
//! - [`stop_sign`] – [`StopSignRule`][stop_sign::StopSignRule]: the
//!   `UNKNOWN → TO_STOP → STOPPING → STOP_DONE` state machine.

pub mod map;
pub mod right_of_way;
pub mod rule_set;
pub mod stop_sign;

pub use map::{StaticStopSignMap, StopSignGroup, StopSignMap};
pub use right_of_way::{EgoArrival, RightOfWayConfig, RightOfWayOutcome, RightOfWayTracker};
pub use rule_set::{RuleInput, RuleOutcome, RuleSet, TrafficRule};
pub use stop_sign::{StopSignConfig, StopSignRule};
