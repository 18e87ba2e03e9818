//! `junction-runtime` – the planning-cycle driver.
//!
//! Owns everything that lives for a planning session and runs one cycle at a
//! time: fresh perception, localization and map snapshots go in, one
//! STOP/CRUISE decision per stop sign comes out.
//!
//! # Modules
//!
//! - [`session`] – [`PlanningSession`][session::PlanningSession]: owns the
//!   [`DecisionContext`][junction_store::DecisionContext], the
//!   [`RuleSet`][junction_rules::RuleSet] and the clock, and turns each
//!   [`CycleFrame`][session::CycleFrame] into a
//!   [`CycleReport`][session::CycleReport].  Cycles never overlap.
//! - [`config`] – [`PlannerConfig`][config::PlannerConfig]: rule enable flags
//!   and thresholds, with validation.
//! - [`clock`] – [`Clock`][clock::Clock]: injected time source;
//!   [`ManualClock`][clock::ManualClock] makes replays and tests
//!   deterministic.
//! - [`perception_monitor`] – [`PerceptionMonitor`][perception_monitor::PerceptionMonitor]:
//!   counts cycles without a perception snapshot and classifies the input as
//!   fresh, gapped or stale.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.

pub mod clock;
pub mod config;
pub mod perception_monitor;
pub mod session;
pub mod telemetry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, LogFormat, PlannerConfig};
pub use perception_monitor::{InputHealth, PerceptionMonitor};
pub use session::{CycleFrame, CycleReport, PlanningSession};
pub use telemetry::{TracerProviderGuard, init_tracing};
