//! [`StopSignRule`] – the stop-sign state machine.
//!
//! One record per stop-sign identity lives in the session's
//! [`DecisionContext`].  Each cycle the rule applies at most one transition
//! per identity:
//!
//! | From | To | When | Decision |
//! |---|---|---|---|
//! | absent | `TO_STOP` | ego within the trigger distance of the stop line | STOP |
//! | `TO_STOP` | `STOPPING` | speed ≤ stop-speed threshold and −0.5 m ≤ distance ≤ stop-distance threshold | STOP |
//! | `STOPPING` | `STOPPING` | waited < `min_wait_secs`, or a watched peer is still present | STOP |
//! | `STOPPING` | `STOP_DONE` | waited ≥ `min_wait_secs` and clear to proceed | CRUISE |
//! | any | removed | ego more than `exit_distance` past the stop line | CRUISE |
//! | any | removed | stop sign no longer on the ego path | – |
//!
//! Only a stop within `stop_distance_threshold` before the line (or just past
//! it) counts; an ego that rolls through the line without stopping keeps its
//! `TO_STOP` record until it leaves the zone, and the record is then dropped
//! with a warning.
//!
//! A stop sign whose map grouping cannot be resolved is treated as disabled
//! for that identity: the decision is CRUISE, the record is left alone and
//! the fault is logged once until the grouping resolves again.
//!
//! # Example
//!
//! ```
//! use junction_rules::{RuleInput, StaticStopSignMap, StopSignConfig, StopSignGroup, StopSignRule, TrafficRule};
//! use junction_store::DecisionContext;
//! use junction_types::{DecisionAction, EgoState, StopSignApproach, StopSignStatus, Timestamp};
//!
//! let map = StaticStopSignMap::new([StopSignGroup::new("1017", &["ego_lane", "peer_lane"])]);
//! let mut rule = StopSignRule::new(StopSignConfig::default());
//! let mut ctx = DecisionContext::new();
//!
//! let ego = EgoState { lane: "ego_lane".into(), speed: 8.0 };
//! let approaches = [StopSignApproach { id: "1017".into(), distance_to_stop_line: 30.0 }];
//! let input = RuleInput {
//!     cycle: 0,
//!     now: Timestamp::from_secs(0.0),
//!     ego: &ego,
//!     approaches: &approaches,
//!     tracks: Some(&[]),
//!     map: &map,
//! };
//!
//! let outcome = rule.evaluate(&input, &mut ctx);
//! assert_eq!(outcome.decisions[0].action, DecisionAction::Stop);
//! assert_eq!(outcome.decisions[0].status, StopSignStatus::ToStop);
//! ```

use std::collections::HashSet;

use junction_store::{DecisionContext, StopSignRecord};
use junction_types::{PlannerError, StopSignApproach, StopSignDecision, StopSignId, StopSignStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::map::StopSignGroup;
use crate::right_of_way::{EgoArrival, RightOfWayConfig, RightOfWayTracker, STOP_LINE_TOLERANCE};
use crate::rule_set::{RuleInput, RuleOutcome, TrafficRule};

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Thresholds consulted by [`StopSignRule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopSignConfig {
    pub enabled: bool,
    /// Ego speed (m/s) at or below which it counts as stopped.
    pub stop_speed_threshold: f64,
    /// Distance to the stop line (m) within which a stop counts.
    pub stop_distance_threshold: f64,
    /// Minimum full-stop duration before proceeding (s).
    pub min_wait_secs: f64,
    /// Trigger distance used when the map grouping has none (m).
    pub default_trigger_distance: f64,
    /// How far past the stop line (m) the influence zone ends.
    pub exit_distance: f64,
    pub right_of_way: RightOfWayConfig,
}

impl Default for StopSignConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stop_speed_threshold: 0.3,
            stop_distance_threshold: 3.5,
            min_wait_secs: 3.0,
            default_trigger_distance: 50.0,
            exit_distance: 3.0,
            right_of_way: RightOfWayConfig::default(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// StopSignRule
// ────────────────────────────────────────────────────────────────────────────

/// Drives every stop sign on the ego path through its status sequence.
pub struct StopSignRule {
    config: StopSignConfig,
    tracker: RightOfWayTracker,
    /// Identities whose grouping fault has already been logged.
    misconfigured: HashSet<StopSignId>,
    /// Identities whose store type mismatch has already been logged.
    mismatched: HashSet<StopSignId>,
}

impl StopSignRule {
    pub fn new(config: StopSignConfig) -> Self {
        let tracker = RightOfWayTracker::new(config.right_of_way.clone());
        Self {
            config,
            tracker,
            misconfigured: HashSet::new(),
            mismatched: HashSet::new(),
        }
    }

    pub fn config(&self) -> &StopSignConfig {
        &self.config
    }

    /// Advance the stop sign `approach` by one cycle, collecting any faults
    /// reported on the way into `faults`.
    fn step(
        &mut self,
        input: &RuleInput<'_>,
        ctx: &mut DecisionContext,
        approach: &StopSignApproach,
        faults: &mut Vec<PlannerError>,
    ) -> StopSignDecision {
        let id = &approach.id;

        if let Err(fault) = ctx.check_stop_sign_type(id) {
            if self.mismatched.insert(id.clone()) {
                warn!(stop_sign = %id, error = %fault, "treating foreign store entry as absent");
            }
            faults.push(fault);
        } else {
            self.mismatched.remove(id);
        }

        let group = match input.map.group(id) {
            Ok(group) => {
                if self.misconfigured.remove(id) {
                    info!(stop_sign = %id, "stop-sign grouping resolved; rule re-enabled");
                }
                group
            }
            Err(fault) => {
                if self.misconfigured.insert(id.clone()) {
                    warn!(stop_sign = %id, error = %fault, "stop-sign rule disabled for identity");
                }
                faults.push(fault);
                return StopSignDecision::cruise(id.clone(), ctx.stop_sign_status(id));
            }
        };

        self.transition(input, ctx, approach, group)
    }

    fn transition(
        &self,
        input: &RuleInput<'_>,
        ctx: &mut DecisionContext,
        approach: &StopSignApproach,
        group: &StopSignGroup,
    ) -> StopSignDecision {
        let id = &approach.id;
        let distance = approach.distance_to_stop_line;

        let Some(record) = ctx.stop_sign_mut(id) else {
            return self.enter(input, ctx, approach, group);
        };

        if distance < -self.config.exit_distance {
            let from = record.status();
            ctx.remove_stop_sign(id);
            if from == StopSignStatus::StopDone {
                info!(stop_sign = %id, distance, "left stop-sign influence zone");
            } else {
                warn!(
                    stop_sign = %id,
                    %from,
                    distance,
                    "passed stop line without completing the stop"
                );
            }
            return StopSignDecision::cruise(id.clone(), StopSignStatus::Unknown);
        }

        match record.status() {
            StopSignStatus::ToStop => {
                if let Some(tracks) = input.tracks {
                    let (lanes, watch) = record.right_of_way_mut();
                    self.tracker
                        .note_sightings(watch, lanes, &input.ego.lane, tracks, input.cycle);
                }
                let stop_zone = -STOP_LINE_TOLERANCE..=self.config.stop_distance_threshold;
                let at_line = stop_zone.contains(&distance);
                if input.ego.speed <= self.config.stop_speed_threshold && at_line {
                    record.begin_stopping(input.now, input.cycle);
                    info!(
                        stop_sign = %id,
                        from = %StopSignStatus::ToStop,
                        to = %StopSignStatus::Stopping,
                        start = %input.now,
                        "ego stopped at stop line"
                    );
                    self.wait_at_line(input, record);
                } else {
                    debug!(stop_sign = %id, speed = input.ego.speed, distance, "approaching stop line");
                }
                StopSignDecision::for_status(id.clone(), record.status())
            }
            StopSignStatus::Stopping => {
                let waited = record.waited_secs(input.now).unwrap_or(0.0);
                let clear = self.wait_at_line(input, record);
                if waited >= self.config.min_wait_secs && clear {
                    record.complete();
                    info!(
                        stop_sign = %id,
                        from = %StopSignStatus::Stopping,
                        to = %StopSignStatus::StopDone,
                        waited,
                        "stop complete; proceeding"
                    );
                } else {
                    debug!(
                        stop_sign = %id,
                        waited,
                        watched = record.watch_vehicles().len(),
                        "holding at stop line"
                    );
                }
                StopSignDecision::for_status(id.clone(), record.status())
            }
            StopSignStatus::StopDone => {
                StopSignDecision::cruise(id.clone(), StopSignStatus::StopDone)
            }
            StopSignStatus::Unknown => {
                StopSignDecision::cruise(id.clone(), StopSignStatus::Unknown)
            }
        }
    }

    /// Handle an identity with no record: create one in `TO_STOP` once the ego
    /// is inside the trigger distance.
    fn enter(
        &self,
        input: &RuleInput<'_>,
        ctx: &mut DecisionContext,
        approach: &StopSignApproach,
        group: &StopSignGroup,
    ) -> StopSignDecision {
        let id = &approach.id;
        let distance = approach.distance_to_stop_line;
        let trigger = group
            .trigger_distance
            .unwrap_or(self.config.default_trigger_distance);

        if !(0.0..=trigger).contains(&distance) {
            return StopSignDecision::cruise(id.clone(), StopSignStatus::Unknown);
        }

        let mut record = StopSignRecord::to_stop(id.clone(), group.lanes.clone());
        if let Some(tracks) = input.tracks {
            let (lanes, watch) = record.right_of_way_mut();
            self.tracker
                .note_sightings(watch, lanes, &input.ego.lane, tracks, input.cycle);
        }
        ctx.insert_stop_sign(record);
        info!(
            stop_sign = %id,
            from = %StopSignStatus::Unknown,
            to = %StopSignStatus::ToStop,
            distance,
            lanes = group.lanes.len(),
            "approaching stop sign"
        );
        StopSignDecision::for_status(id.clone(), StopSignStatus::ToStop)
    }

    /// Update right-of-way for a `STOPPING` record; returns "clear to proceed".
    fn wait_at_line(&self, input: &RuleInput<'_>, record: &mut StopSignRecord) -> bool {
        let Some(ego) = record
            .stop_start_time()
            .zip(record.stop_start_cycle())
            .map(|(time, cycle)| EgoArrival { time, cycle })
        else {
            return false;
        };
        let (lanes, watch) = record.right_of_way_mut();
        let outcome = self.tracker.update(
            watch,
            lanes,
            &input.ego.lane,
            ego,
            input.tracks,
            input.cycle,
        );
        if outcome.stale {
            debug!(
                stop_sign = %record.stop_sign_id(),
                watched = record.watch_vehicles().len(),
                "no perception snapshot; reusing watch lists"
            );
        }
        outcome.clear_to_proceed
    }
}

impl TrafficRule for StopSignRule {
    fn name(&self) -> &str {
        "stop_sign"
    }

    fn enabled(&self) -> bool {
        self.config.enabled
    }

    fn evaluate(&mut self, input: &RuleInput<'_>, ctx: &mut DecisionContext) -> RuleOutcome {
        let mut outcome = RuleOutcome::default();
        for approach in input.approaches {
            let decision = self.step(input, ctx, approach, &mut outcome.faults);
            outcome.decisions.push(decision);
        }

        // A sign that dropped off the path has been passed or abandoned.
        let on_path: HashSet<&StopSignId> = input.approaches.iter().map(|a| &a.id).collect();
        for id in ctx.stop_sign_ids() {
            if !on_path.contains(&id)
                && let Some(record) = ctx.remove_stop_sign(&id)
            {
                info!(stop_sign = %id, from = %record.status(), "stop sign left reference path");
            }
        }
        self.misconfigured.retain(|id| on_path.contains(id));
        self.mismatched.retain(|id| on_path.contains(id));
        outcome
    }
}
