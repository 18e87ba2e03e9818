//! Drives a [`PlanningSession`] through a recorded [`Scenario`].

use colored::Colorize;
use junction_runtime::{ConfigError, CycleReport, ManualClock, PlannerConfig, PlanningSession};
use junction_store::StopSignRecord;
use junction_types::{DecisionAction, PlannerError};
use tracing::info;

use crate::scenario::Scenario;

/// Result of a complete replay.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub reports: Vec<CycleReport>,
    /// Stop-sign records still live after the last frame.
    pub final_state: Vec<StopSignRecord>,
}

impl ReplayOutcome {
    pub fn fault_count(&self) -> usize {
        self.reports.iter().map(|r| r.faults.len()).sum()
    }
}

/// Replay every frame of `scenario`, one planning cycle per frame.
///
/// The session clock is set to each frame's timestamp before its cycle runs.
pub fn run(scenario: &Scenario, config: PlannerConfig) -> Result<ReplayOutcome, ConfigError> {
    let Some(first) = scenario.frames.first() else {
        return Ok(ReplayOutcome {
            reports: Vec::new(),
            final_state: Vec::new(),
        });
    };
    let clock = ManualClock::new(first.timestamp);
    let mut session = PlanningSession::new(config, Box::new(clock.clone()))?;
    let map = scenario.map();

    info!(
        scenario = scenario.name.as_deref().unwrap_or("<unnamed>"),
        frames = scenario.frames.len(),
        stop_signs = map.len(),
        "replaying scenario"
    );

    let reports = scenario
        .frames
        .iter()
        .map(|frame| {
            clock.set(frame.timestamp);
            session.run_cycle(&frame.cycle_frame(), &map)
        })
        .collect();

    Ok(ReplayOutcome {
        reports,
        final_state: session.context().snapshot(),
    })
}

/// One line per decision, followed by one line per fault.
pub fn render_report(report: &CycleReport) -> Vec<String> {
    let prefix = format!("[{:>4}] {}", report.cycle, report.timestamp);
    let mut lines: Vec<String> = report
        .decisions
        .iter()
        .map(|d| {
            let padded = format!("{:<6}", d.action);
            let action = match d.action {
                DecisionAction::Stop => padded.red().bold(),
                DecisionAction::Cruise => padded.green().bold(),
            };
            format!(
                "{}  stop sign {}  {}  {}",
                prefix.dimmed(),
                d.stop_sign_id.as_str().bold(),
                action,
                d.status.to_string().dimmed()
            )
        })
        .collect();
    lines.extend(report.faults.iter().map(|fault| {
        let label = match fault {
            PlannerError::Configuration { .. } => "config",
            PlannerError::TransientInputGap { .. } => "input",
            PlannerError::StoreTypeMismatch { .. } => "store",
        };
        format!("{}  {} {}", prefix.dimmed(), format!("⚠ {label}:").yellow(), fault)
    }));
    if lines.is_empty() {
        lines.push(format!("{}  {}", prefix.dimmed(), "no stop signs".dimmed()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use junction_types::{StopSignId, StopSignStatus, Timestamp};

    use super::*;

    fn scenario() -> Scenario {
        Scenario::parse(
            r#"{
            "name": "sunnyvale loop, stop sign 1017",
            "map": { "stop_signs": [ { "id": "1017", "lanes": ["9762", "868_1_-1"] } ] },
            "frames": [
                { "timestamp": 100.0, "ego": { "lane": "9762", "speed": 6.0 },
                  "stop_signs": [ { "id": "1017", "distance_to_stop_line": 25.0 } ], "tracks": [] },
                { "timestamp": 103.0, "ego": { "lane": "9762", "speed": 0.0 },
                  "stop_signs": [ { "id": "1017", "distance_to_stop_line": 0.3 } ],
                  "tracks": [ { "id": "4059", "lane": "868_1_-1", "distance_to_stop_line": 0.8,
                                "stop_line_arrival": 102.0 } ] },
                { "timestamp": 105.0, "ego": { "lane": "9762", "speed": 0.0 },
                  "stop_signs": [ { "id": "1017", "distance_to_stop_line": 0.3 } ], "tracks": null },
                { "timestamp": 107.0, "ego": { "lane": "9762", "speed": 0.0 },
                  "stop_signs": [ { "id": "1017", "distance_to_stop_line": 0.3 } ],
                  "tracks": [ { "id": "4059", "lane": "868_1_-1", "distance_to_stop_line": 0.8,
                                "stop_line_arrival": 102.0 } ] },
                { "timestamp": 108.0, "ego": { "lane": "9762", "speed": 0.0 },
                  "stop_signs": [ { "id": "1017", "distance_to_stop_line": 0.3 } ], "tracks": [] },
                { "timestamp": 108.5, "ego": { "lane": "9762", "speed": 0.0 },
                  "stop_signs": [ { "id": "1017", "distance_to_stop_line": 0.3 } ], "tracks": [] }
            ]
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn replay_follows_stop_sign_sequence() {
        let outcome = run(&scenario(), PlannerConfig::default()).unwrap();
        let statuses: Vec<_> = outcome
            .reports
            .iter()
            .map(|r| r.decisions[0].status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                StopSignStatus::ToStop,
                StopSignStatus::Stopping,
                StopSignStatus::Stopping,
                StopSignStatus::Stopping,
                StopSignStatus::Stopping,
                StopSignStatus::StopDone,
            ]
        );
        assert_eq!(outcome.reports[4].decisions[0].action, DecisionAction::Stop);
        assert_eq!(outcome.reports[5].decisions[0].action, DecisionAction::Cruise);
        assert_eq!(outcome.fault_count(), 1);
    }

    #[test]
    fn final_state_holds_live_records() {
        let outcome = run(&scenario(), PlannerConfig::default()).unwrap();
        assert_eq!(outcome.final_state.len(), 1);
        let record = &outcome.final_state[0];
        assert_eq!(record.stop_sign_id(), &StopSignId::from("1017"));
        assert_eq!(record.status(), StopSignStatus::StopDone);
        assert!(record.watch_vehicles().is_empty());
    }

    #[test]
    fn passed_sign_leaves_no_state_behind() {
        let mut scenario = scenario();
        let mut passed = scenario.frames[5].clone();
        passed.timestamp = Timestamp::from_secs(110.0);
        passed.ego.speed = 5.0;
        passed.stop_signs.clear();
        scenario.frames.push(passed);

        let outcome = run(&scenario, PlannerConfig::default()).unwrap();
        assert!(outcome.reports[6].decisions.is_empty());
        assert!(outcome.final_state.is_empty());
    }

    #[test]
    fn invalid_config_aborts_replay() {
        let mut config = PlannerConfig::default();
        config.upper_speed_limit = 0.0;
        assert!(run(&scenario(), config).is_err());
    }

    #[test]
    fn render_lists_decisions_and_faults() {
        colored::control::set_override(false);
        let outcome = run(&scenario(), PlannerConfig::default()).unwrap();

        let lines = render_report(&outcome.reports[0]);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("stop sign 1017"));
        assert!(lines[0].contains("STOP"));
        assert!(lines[0].contains("TO_STOP"));

        let gap = render_report(&outcome.reports[2]);
        assert_eq!(gap.len(), 2);
        assert!(gap[1].contains("input:"));
    }
}
