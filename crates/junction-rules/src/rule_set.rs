//! [`RuleSet`] – ordered collection of traffic rules.
//!
//! Every planning cycle the session hands one [`RuleInput`] to
//! [`RuleSet::evaluate`].  Each registered [`TrafficRule`] that is enabled is
//! evaluated in insertion order against the shared
//! [`DecisionContext`]; decisions and reported faults are concatenated into a
//! single [`RuleOutcome`].  A rule never fails the cycle: conditions it cannot
//! resolve are reported as [`PlannerError`] values next to a conservative
//! decision.

use junction_store::DecisionContext;
use junction_types::{
    EgoState, PlannerError, StopSignApproach, StopSignDecision, Timestamp, VehicleTrack,
};

use crate::map::StopSignMap;

// ────────────────────────────────────────────────────────────────────────────
// Inputs & outputs
// ────────────────────────────────────────────────────────────────────────────

/// Cycle-local snapshot every rule evaluates against.
pub struct RuleInput<'a> {
    /// Monotonic cycle index, starting at 0.
    pub cycle: u64,
    /// Clock reading for this cycle.
    pub now: Timestamp,
    pub ego: &'a EgoState,
    /// Stop signs on the ego's reference path this cycle.
    pub approaches: &'a [StopSignApproach],
    /// Perceived peer vehicles; `None` when the snapshot is missing.
    pub tracks: Option<&'a [VehicleTrack]>,
    pub map: &'a dyn StopSignMap,
}

/// Decisions and reported faults produced by one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub decisions: Vec<StopSignDecision>,
    pub faults: Vec<PlannerError>,
}

impl RuleOutcome {
    pub fn extend(&mut self, other: RuleOutcome) {
        self.decisions.extend(other.decisions);
        self.faults.extend(other.faults);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TrafficRule trait
// ────────────────────────────────────────────────────────────────────────────

/// A single traffic rule that contributes decisions each cycle.
pub trait TrafficRule: Send {
    /// Name used in logs (e.g. `"stop_sign"`).
    fn name(&self) -> &str;

    /// Disabled rules are skipped entirely by [`RuleSet::evaluate`].
    fn enabled(&self) -> bool {
        true
    }

    /// Advance the rule by one cycle.
    fn evaluate(&mut self, input: &RuleInput<'_>, ctx: &mut DecisionContext) -> RuleOutcome;
}

// ────────────────────────────────────────────────────────────────────────────
// RuleSet
// ────────────────────────────────────────────────────────────────────────────

/// Ordered set of [`TrafficRule`]s sharing one [`DecisionContext`].
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn TrafficRule>>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule.  Rules are evaluated in insertion order.
    pub fn add_rule(&mut self, rule: Box<dyn TrafficRule>) {
        self.rules.push(rule);
    }

    /// Names of the registered rules that are currently enabled.
    pub fn enabled_rules(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|rule| rule.enabled())
            .map(|rule| rule.name())
            .collect()
    }

    /// Evaluate every enabled rule against `input`.
    pub fn evaluate(&mut self, input: &RuleInput<'_>, ctx: &mut DecisionContext) -> RuleOutcome {
        let mut outcome = RuleOutcome::default();
        for rule in self.rules.iter_mut().filter(|rule| rule.enabled()) {
            outcome.extend(rule.evaluate(input, ctx));
        }
        outcome
    }
}
