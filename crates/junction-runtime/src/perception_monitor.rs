//! [`PerceptionMonitor`] – perception/prediction input health.
//!
//! The session calls [`PerceptionMonitor::observe`] once per cycle with
//! whether a perception snapshot arrived.  A missing snapshot is a transient
//! gap; the rules reuse the previous cycle's watch lists.  After more than
//! `max_stale_cycles` consecutive gaps the input is reported stale.  Stale
//! input is still handled conservatively (watched vehicles are never cleared
//! by missing data), it is only escalated in the logs.

/// Health of the perception input as of the latest cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputHealth {
    /// A snapshot arrived this cycle.
    Fresh,
    /// No snapshot for `cycles` consecutive cycles, within tolerance.
    Gap { cycles: u32 },
    /// No snapshot for more than the tolerated number of cycles.
    Stale { cycles: u32 },
}

/// Tracks consecutive cycles without a perception snapshot.
///
/// # Example
///
/// ```
/// use junction_runtime::perception_monitor::{InputHealth, PerceptionMonitor};
///
/// let mut monitor = PerceptionMonitor::new(2);
/// assert_eq!(monitor.observe(0, true), InputHealth::Fresh);
/// assert_eq!(monitor.observe(1, false), InputHealth::Gap { cycles: 1 });
/// assert_eq!(monitor.observe(2, false), InputHealth::Gap { cycles: 2 });
/// assert_eq!(monitor.observe(3, false), InputHealth::Stale { cycles: 3 });
/// assert_eq!(monitor.observe(4, true), InputHealth::Fresh);
/// ```
#[derive(Debug, Clone)]
pub struct PerceptionMonitor {
    max_stale_cycles: u32,
    consecutive_gaps: u32,
    last_snapshot_cycle: Option<u64>,
}

impl PerceptionMonitor {
    /// Create a monitor that tolerates up to `max_stale_cycles` consecutive
    /// gaps before reporting [`InputHealth::Stale`].
    pub fn new(max_stale_cycles: u32) -> Self {
        Self {
            max_stale_cycles,
            consecutive_gaps: 0,
            last_snapshot_cycle: None,
        }
    }

    /// Record whether a snapshot arrived in `cycle` and classify the input.
    pub fn observe(&mut self, cycle: u64, has_snapshot: bool) -> InputHealth {
        if has_snapshot {
            self.consecutive_gaps = 0;
            self.last_snapshot_cycle = Some(cycle);
        } else {
            self.consecutive_gaps = self.consecutive_gaps.saturating_add(1);
        }
        self.health()
    }

    /// Classification as of the last [`observe`][Self::observe] call.
    pub fn health(&self) -> InputHealth {
        match self.consecutive_gaps {
            0 => InputHealth::Fresh,
            cycles if cycles <= self.max_stale_cycles => InputHealth::Gap { cycles },
            cycles => InputHealth::Stale { cycles },
        }
    }

    /// Cycle of the most recent snapshot, if any has arrived.
    pub fn last_snapshot_cycle(&self) -> Option<u64> {
        self.last_snapshot_cycle
    }
}
