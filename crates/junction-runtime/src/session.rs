//! [`PlanningSession`] – the planning-cycle driver.
//!
//! Each call to [`PlanningSession::run_cycle`] is one planning cycle:
//!
//! 1. **Clock** – read the injected [`Clock`] once; every rule sees the same
//!    `now`.
//! 2. **Input health** – feed the [`PerceptionMonitor`]; a missing perception
//!    snapshot is reported as [`PlannerError::TransientInputGap`] and the
//!    rules reuse the retained watch lists.
//! 3. **Rules** – evaluate the [`RuleSet`] against the session's
//!    [`DecisionContext`].
//! 4. **Report** – return the decisions and every fault raised on the way as a
//!    [`CycleReport`].
//!
//! A cycle never fails.  The worst case for a degraded input is a
//! conservative STOP or, for a misconfigured stop sign, CRUISE with the fault
//! in the report.
//!
//! # Example
//!
//! ```
//! use junction_rules::{StaticStopSignMap, StopSignGroup};
//! use junction_runtime::{CycleFrame, ManualClock, PlannerConfig, PlanningSession};
//! use junction_types::{DecisionAction, EgoState, StopSignApproach, Timestamp};
//!
//! let clock = ManualClock::new(Timestamp::from_secs(0.0));
//! let mut session = PlanningSession::new(PlannerConfig::default(), Box::new(clock.clone()))
//!     .expect("default config is valid");
//! let map = StaticStopSignMap::new([StopSignGroup::new("1017", &["ego", "peer"])]);
//!
//! let frame = CycleFrame {
//!     ego: EgoState { lane: "ego".into(), speed: 6.0 },
//!     stop_signs: vec![StopSignApproach { id: "1017".into(), distance_to_stop_line: 20.0 }],
//!     tracks: Some(vec![]),
//! };
//! let report = session.run_cycle(&frame, &map);
//! assert_eq!(report.decisions[0].action, DecisionAction::Stop);
//! ```

use junction_rules::{RuleInput, RuleSet, StopSignMap, StopSignRule};
use junction_store::DecisionContext;
use junction_types::{
    EgoState, PlannerError, StopSignApproach, StopSignDecision, Timestamp, VehicleTrack,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::{ConfigError, PlannerConfig};
use crate::perception_monitor::{InputHealth, PerceptionMonitor};

// ─────────────────────────────────────────────────────────────────────────────
// Cycle input / output
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshots handed in for one planning cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleFrame {
    pub ego: EgoState,
    /// Stop signs on the ego's reference path.
    #[serde(default)]
    pub stop_signs: Vec<StopSignApproach>,
    /// Perceived vehicles; `None` when perception/prediction produced no
    /// snapshot this cycle.
    #[serde(default)]
    pub tracks: Option<Vec<VehicleTrack>>,
}

/// Everything one cycle produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub timestamp: Timestamp,
    /// One decision per stop sign in the frame, in frame order.
    pub decisions: Vec<StopSignDecision>,
    /// Degraded conditions raised during the cycle.
    pub faults: Vec<PlannerError>,
}

// ─────────────────────────────────────────────────────────────────────────────
// PlanningSession
// ─────────────────────────────────────────────────────────────────────────────

/// Owns the cross-cycle state of one planning session.
///
/// Dropping the session drops every stop-sign record, so a new session starts
/// with every stop sign at `UNKNOWN`.
pub struct PlanningSession {
    id: Uuid,
    clock: Box<dyn Clock>,
    rules: RuleSet,
    context: DecisionContext,
    monitor: PerceptionMonitor,
    cycle: u64,
}

impl PlanningSession {
    /// Validate `config` and build a session with the rules it enables.
    pub fn new(config: PlannerConfig, clock: Box<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rules = RuleSet::new();
        rules.add_rule(Box::new(StopSignRule::new(config.stop_sign.clone())));
        for (flag, enabled) in [
            ("enable_crosswalk", config.enable_crosswalk),
            ("enable_keep_clear", config.enable_keep_clear),
            ("enable_traffic_light", config.enable_traffic_light),
        ] {
            if enabled {
                warn!(flag, "rule has no implementation in this planner; ignored");
            }
        }

        let id = Uuid::new_v4();
        info!(
            session = %id,
            rules = ?rules.enabled_rules(),
            upper_speed_limit = config.upper_speed_limit,
            "planning session started"
        );

        Ok(Self {
            id,
            clock,
            rules,
            context: DecisionContext::new(),
            monitor: PerceptionMonitor::new(config.max_stale_cycles),
            cycle: 0,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Index the next cycle will run with.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Stop-sign records carried across cycles.
    pub fn context(&self) -> &DecisionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut DecisionContext {
        &mut self.context
    }

    /// Classification of the perception input after the last cycle.
    pub fn input_health(&self) -> InputHealth {
        self.monitor.health()
    }

    /// Run one planning cycle.
    pub fn run_cycle(&mut self, frame: &CycleFrame, map: &dyn StopSignMap) -> CycleReport {
        let cycle = self.cycle;
        let span = info_span!("planning_cycle", session = %self.id, cycle);
        let _enter = span.enter();

        let now = self.clock.now();
        let mut faults = Vec::new();

        match self.monitor.observe(cycle, frame.tracks.is_some()) {
            InputHealth::Fresh => {}
            InputHealth::Gap { cycles } => {
                debug!(cycles, "perception snapshot missing; reusing previous watch lists");
                faults.push(PlannerError::TransientInputGap { cycle });
            }
            InputHealth::Stale { cycles } => {
                warn!(
                    cycles,
                    last_snapshot = ?self.monitor.last_snapshot_cycle(),
                    "perception input stale; holding retained watch lists"
                );
                faults.push(PlannerError::TransientInputGap { cycle });
            }
        }

        let input = RuleInput {
            cycle,
            now,
            ego: &frame.ego,
            approaches: &frame.stop_signs,
            tracks: frame.tracks.as_deref(),
            map,
        };
        let outcome = self.rules.evaluate(&input, &mut self.context);
        faults.extend(outcome.faults);

        debug!(
            %now,
            decisions = outcome.decisions.len(),
            faults = faults.len(),
            "cycle complete"
        );
        self.cycle += 1;

        CycleReport {
            cycle,
            timestamp: now,
            decisions: outcome.decisions,
            faults,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
