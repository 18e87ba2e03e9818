//! `junction-types` – shared vocabulary of the junction planner.
//!
//! Identifiers, timestamps, per-cycle inputs and the decision record that
//! every other crate in the workspace speaks.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────────────────────────────────────

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identity of one stop-sign group: every lane and stop line that together
    /// form a single regulated intersection feature (e.g. `"1017"`).
    StopSignId
);

string_id!(
    /// A map lane identifier (e.g. `"868_1_-1"`).
    LaneId
);

string_id!(
    /// A perception track identifier (e.g. `"4059"`).
    VehicleId
);

// ────────────────────────────────────────────────────────────────────────────
// Time
// ────────────────────────────────────────────────────────────────────────────

/// A point in time, in seconds since an arbitrary epoch shared by the clock
/// and by perception's arrival estimates.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(f64);

impl Timestamp {
    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is in
    /// the future).
    pub fn secs_since(self, earlier: Timestamp) -> f64 {
        self.0 - earlier.0
    }

    /// Shift this timestamp by `secs` (may be negative).
    pub fn offset(self, secs: f64) -> Self {
        Self(self.0 + secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stop-sign status & decision
// ────────────────────────────────────────────────────────────────────────────

/// Progress of the ego vehicle through one stop-sign encounter.
///
/// The only legal order is `Unknown → ToStop → Stopping → StopDone`; a record
/// that leaves `StopDone` is removed and the identity reads `Unknown` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopSignStatus {
    #[default]
    Unknown,
    ToStop,
    Stopping,
    StopDone,
}

impl StopSignStatus {
    /// The decision this status imposes on downstream trajectory planning.
    pub fn action(self) -> DecisionAction {
        match self {
            StopSignStatus::ToStop | StopSignStatus::Stopping => DecisionAction::Stop,
            StopSignStatus::Unknown | StopSignStatus::StopDone => DecisionAction::Cruise,
        }
    }

    /// The status that follows this one, or `None` for `StopDone`.
    pub fn successor(self) -> Option<StopSignStatus> {
        match self {
            StopSignStatus::Unknown => Some(StopSignStatus::ToStop),
            StopSignStatus::ToStop => Some(StopSignStatus::Stopping),
            StopSignStatus::Stopping => Some(StopSignStatus::StopDone),
            StopSignStatus::StopDone => None,
        }
    }

    /// `true` when moving from `self` to `next` is a hold or a single step
    /// forward.
    pub fn can_advance_to(self, next: StopSignStatus) -> bool {
        self == next || self.successor() == Some(next)
    }
}

impl fmt::Display for StopSignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopSignStatus::Unknown => "UNKNOWN",
            StopSignStatus::ToStop => "TO_STOP",
            StopSignStatus::Stopping => "STOPPING",
            StopSignStatus::StopDone => "STOP_DONE",
        };
        f.write_str(s)
    }
}

/// Longitudinal action requested from trajectory planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionAction {
    Stop,
    Cruise,
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionAction::Stop => f.write_str("STOP"),
            DecisionAction::Cruise => f.write_str("CRUISE"),
        }
    }
}

/// One decision per stop-sign identity per planning cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopSignDecision {
    pub stop_sign_id: StopSignId,
    pub action: DecisionAction,
    /// Status after this cycle; `Unknown` when no record is held.
    pub status: StopSignStatus,
}

impl StopSignDecision {
    /// Decision that imposes no stop constraint.
    pub fn cruise(stop_sign_id: StopSignId, status: StopSignStatus) -> Self {
        Self {
            stop_sign_id,
            action: DecisionAction::Cruise,
            status,
        }
    }

    /// Decision derived directly from `status`.
    pub fn for_status(stop_sign_id: StopSignId, status: StopSignStatus) -> Self {
        Self {
            stop_sign_id,
            action: status.action(),
            status,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cycle inputs
// ────────────────────────────────────────────────────────────────────────────

/// Ego vehicle snapshot from localization and chassis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgoState {
    /// Lane the ego vehicle is approaching the intersection on.
    pub lane: LaneId,
    /// Longitudinal speed (m/s).
    pub speed: f64,
}

/// A stop sign on the ego's reference path this cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopSignApproach {
    pub id: StopSignId,
    /// Distance along the ego path to the stop line (metres); negative once
    /// the ego front has passed it.
    pub distance_to_stop_line: f64,
}

/// A perceived peer vehicle with its predicted stop-line arrival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleTrack {
    pub id: VehicleId,
    /// Lane the track is assigned to, if any.
    #[serde(default)]
    pub lane: Option<LaneId>,
    /// Distance to the track's own stop line (metres); negative once passed.
    pub distance_to_stop_line: f64,
    /// Estimated (or observed) arrival time at its stop line.
    #[serde(default)]
    pub stop_line_arrival: Option<Timestamp>,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Conditions the planner reports but never escalates: each degrades to a
/// conservative decision rather than failing the cycle.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlannerError {
    #[error("Stop-sign grouping for {stop_sign} is unusable: {details}")]
    Configuration {
        stop_sign: StopSignId,
        details: String,
    },

    #[error("Perception/prediction snapshot missing in cycle {cycle}")]
    TransientInputGap { cycle: u64 },

    #[error("Decision store key {key} holds a value of another type")]
    StoreTypeMismatch { key: String },
}
