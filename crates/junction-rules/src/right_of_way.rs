//! [`RightOfWayTracker`] – who reached the intersection first.
//!
//! While the ego waits at a stop line, peers on the other approach lanes of the
//! same stop-sign group that arrived *before* the ego hold right-of-way.  The
//! tracker maintains those peers in [`WatchVehicles`] and reports the ego
//! clear to proceed once every list is empty.
//!
//! # Algorithm
//!
//! Each cycle with a perception snapshot:
//!
//! 1. Every peer inside an associated lane's approach zone has its first
//!    sighting recorded.
//! 2. Watched vehicles no longer inside their lane's zone accrue a missed
//!    cycle; after `departure_confirm_cycles` consecutive misses they are
//!    dropped.
//! 3. Unwatched peers whose stop-line arrival precedes the ego's become
//!    watched.  Arrivals within `tie_epsilon_secs` of the ego's are decided by
//!    first-sighting cycle against the ego's stop-start cycle, which gives a
//!    deterministic first-come-first-served order.
//!
//! A cycle with no snapshot leaves the watch lists untouched.
//!
//! The tracker never touches the decision store; it only edits the
//! [`WatchVehicles`] it is handed.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use junction_store::{WatchVehicles, WatchedVehicle};
use junction_types::{LaneId, Timestamp, VehicleId, VehicleTrack};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How far past its stop line (metres) a peer still counts as waiting at it.
pub(crate) const STOP_LINE_TOLERANCE: f64 = 0.5;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Tuning for [`RightOfWayTracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RightOfWayConfig {
    /// Arrival times closer than this (seconds) are treated as simultaneous.
    pub tie_epsilon_secs: f64,
    /// Length of the approach/stop zone before a peer's stop line (metres).
    pub watch_zone_length: f64,
    /// Consecutive snapshots a watched vehicle must be missing from its zone
    /// before it counts as departed.
    pub departure_confirm_cycles: u32,
}

impl Default for RightOfWayConfig {
    fn default() -> Self {
        Self {
            tie_epsilon_secs: 0.05,
            watch_zone_length: 10.0,
            departure_confirm_cycles: 2,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Inputs & outputs
// ────────────────────────────────────────────────────────────────────────────

/// When and in which cycle the ego came to rest at its stop line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EgoArrival {
    pub time: Timestamp,
    pub cycle: u64,
}

/// Result of one [`RightOfWayTracker::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RightOfWayOutcome {
    /// `true` iff no lane has an outstanding watched vehicle.
    pub clear_to_proceed: bool,
    pub newly_watched: Vec<VehicleId>,
    pub departed: Vec<VehicleId>,
    /// The snapshot was missing and the previous lists were reused.
    pub stale: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// RightOfWayTracker
// ────────────────────────────────────────────────────────────────────────────

/// Computes which peers must be waited out before the ego may proceed.
#[derive(Debug, Clone, Default)]
pub struct RightOfWayTracker {
    config: RightOfWayConfig,
}

impl RightOfWayTracker {
    pub fn new(config: RightOfWayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RightOfWayConfig {
        &self.config
    }

    /// `true` when `track` is in the approach/stop zone of `lane`.
    pub fn in_zone(&self, track: &VehicleTrack, lane: &LaneId) -> bool {
        track.lane.as_ref() == Some(lane)
            && track.distance_to_stop_line >= -STOP_LINE_TOLERANCE
            && track.distance_to_stop_line <= self.config.watch_zone_length
    }

    /// Record first sightings of peers on the associated lanes other than
    /// `ego_lane`.
    pub fn note_sightings(
        &self,
        watch: &mut WatchVehicles,
        associated_lanes: &BTreeSet<LaneId>,
        ego_lane: &LaneId,
        tracks: &[VehicleTrack],
        cycle: u64,
    ) {
        for track in tracks {
            if let Some(lane) = self.peer_lane(track, associated_lanes, ego_lane) {
                let first = watch.note_sighting(&track.id, cycle);
                if first == cycle {
                    debug!(vehicle = %track.id, lane = %lane, cycle, "peer first sighted");
                }
            }
        }
    }

    /// `true` when a peer arriving at `peer_arrival`, first seen in
    /// `peer_first_seen`, goes before the ego.
    pub fn has_priority(&self, peer_arrival: Timestamp, peer_first_seen: u64, ego: EgoArrival) -> bool {
        let lead = ego.time.secs_since(peer_arrival);
        if lead > self.config.tie_epsilon_secs {
            true
        } else if lead >= -self.config.tie_epsilon_secs {
            peer_first_seen < ego.cycle
        } else {
            false
        }
    }

    /// Advance the watch lists by one cycle.
    ///
    /// `tracks` is `None` when perception/prediction produced nothing this
    /// cycle; the lists are then reused as they are.
    pub fn update(
        &self,
        watch: &mut WatchVehicles,
        associated_lanes: &BTreeSet<LaneId>,
        ego_lane: &LaneId,
        ego: EgoArrival,
        tracks: Option<&[VehicleTrack]>,
        cycle: u64,
    ) -> RightOfWayOutcome {
        let Some(tracks) = tracks else {
            return RightOfWayOutcome {
                clear_to_proceed: watch.is_empty(),
                stale: true,
                ..RightOfWayOutcome::default()
            };
        };

        self.note_sightings(watch, associated_lanes, ego_lane, tracks, cycle);

        let confirm = self.config.departure_confirm_cycles.max(1);
        let departed: Vec<VehicleId> = watch
            .retain(|lane, vehicle| {
                let present = tracks
                    .iter()
                    .any(|t| t.id == vehicle.id && self.in_zone(t, lane));
                if present {
                    vehicle.missed_cycles = 0;
                    return true;
                }
                vehicle.missed_cycles += 1;
                vehicle.missed_cycles < confirm
            })
            .into_iter()
            .map(|(lane, vehicle)| {
                debug!(vehicle = %vehicle.id, lane = %lane, "watched vehicle departed");
                vehicle.id
            })
            .collect();

        let mut candidates: Vec<(LaneId, WatchedVehicle)> = tracks
            .iter()
            .filter(|t| !watch.is_watching(&t.id))
            .filter_map(|t| {
                let lane = self.peer_lane(t, associated_lanes, ego_lane)?;
                let arrival = t.stop_line_arrival?;
                let first_seen_cycle = watch.first_seen(&t.id).unwrap_or(cycle);
                self.has_priority(arrival, first_seen_cycle, ego).then(|| {
                    (
                        lane.clone(),
                        WatchedVehicle {
                            id: t.id.clone(),
                            arrival,
                            first_seen_cycle,
                            missed_cycles: 0,
                        },
                    )
                })
            })
            .collect();
        self.order_by_arrival(&mut candidates);

        let mut newly_watched = Vec::with_capacity(candidates.len());
        for (lane, vehicle) in candidates {
            let id = vehicle.id.clone();
            if watch.push(lane.clone(), vehicle) {
                debug!(vehicle = %id, lane = %lane, "watching vehicle with right-of-way");
                newly_watched.push(id);
            }
        }

        RightOfWayOutcome {
            clear_to_proceed: watch.is_empty(),
            newly_watched,
            departed,
            stale: false,
        }
    }

    // ── internals ──────────────────────────────────────────────────────────

    /// The associated lane `track` is waiting on, excluding the ego's own.
    fn peer_lane<'a>(
        &self,
        track: &VehicleTrack,
        associated_lanes: &'a BTreeSet<LaneId>,
        ego_lane: &LaneId,
    ) -> Option<&'a LaneId> {
        let lane = associated_lanes.get(track.lane.as_ref()?)?;
        (lane != ego_lane && self.in_zone(track, lane)).then_some(lane)
    }

    /// Sort by arrival; runs of arrivals within the tie epsilon of the run's
    /// first member are ordered by first sighting, then by id.
    fn order_by_arrival(&self, candidates: &mut [(LaneId, WatchedVehicle)]) {
        candidates.sort_by(|a, b| a.1.arrival.as_secs().total_cmp(&b.1.arrival.as_secs()));

        let mut start = 0;
        while start < candidates.len() {
            let anchor = candidates[start].1.arrival;
            let end = candidates[start..]
                .iter()
                .position(|(_, v)| v.arrival.secs_since(anchor) > self.config.tie_epsilon_secs)
                .map_or(candidates.len(), |offset| start + offset);
            candidates[start..end].sort_by(|a, b| tie_break(&a.1, &b.1));
            start = end;
        }
    }
}

fn tie_break(a: &WatchedVehicle, b: &WatchedVehicle) -> Ordering {
    a.first_seen_cycle
        .cmp(&b.first_seen_cycle)
        .then_with(|| a.id.cmp(&b.id))
}
