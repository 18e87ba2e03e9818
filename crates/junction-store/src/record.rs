//! Per-intersection stop-sign state.
//!
//! A [`StopSignRecord`] exists from the cycle the ego first approaches a stop
//! sign until it has passed the stop line and left the influence zone.  Its
//! status only moves forward; the fields that matter for right-of-way live in
//! [`WatchVehicles`].

use std::collections::{BTreeMap, BTreeSet};

use junction_types::{LaneId, StopSignId, StopSignStatus, Timestamp, VehicleId};
use serde::Serialize;

// ────────────────────────────────────────────────────────────────────────────
// WatchVehicles
// ────────────────────────────────────────────────────────────────────────────

/// A peer vehicle that reached its stop line before the ego did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchedVehicle {
    pub id: VehicleId,
    /// Stop-line arrival recorded when the vehicle became watched.
    pub arrival: Timestamp,
    /// Cycle in which the vehicle was first seen on an associated lane.
    pub first_seen_cycle: u64,
    /// Consecutive snapshots in which the vehicle was absent from its zone.
    pub missed_cycles: u32,
}

/// Peer vehicles holding priority over the ego, per approach lane.
///
/// Lists are kept in the order vehicles became watched.  Lanes with no
/// watched vehicle are never stored, so [`WatchVehicles::is_empty`] is the
/// "clear to proceed" condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WatchVehicles {
    lanes: BTreeMap<LaneId, Vec<WatchedVehicle>>,
    /// First cycle each peer was seen on any associated lane.
    first_seen: BTreeMap<VehicleId, u64>,
}

impl WatchVehicles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watched vehicles on `lane`, oldest first.
    pub fn lane(&self, lane: &LaneId) -> &[WatchedVehicle] {
        self.lanes.get(lane).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Identifiers watched on `lane`, oldest first.
    pub fn vehicle_ids(&self, lane: &LaneId) -> Vec<&VehicleId> {
        self.lane(lane).iter().map(|v| &v.id).collect()
    }

    /// Iterate over every non-empty lane list.
    pub fn lanes(&self) -> impl Iterator<Item = (&LaneId, &[WatchedVehicle])> {
        self.lanes.iter().map(|(lane, list)| (lane, list.as_slice()))
    }

    /// `true` when `id` is watched on any lane.
    pub fn is_watching(&self, id: &VehicleId) -> bool {
        self.lanes.values().flatten().any(|v| &v.id == id)
    }

    /// Number of watched vehicles across all lanes.
    pub fn len(&self) -> usize {
        self.lanes.values().map(Vec::len).sum()
    }

    /// `true` when no lane has an outstanding watched vehicle.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Append `vehicle` to `lane` unless it is already watched there.
    pub fn push(&mut self, lane: LaneId, vehicle: WatchedVehicle) -> bool {
        let list = self.lanes.entry(lane).or_default();
        if list.iter().any(|v| v.id == vehicle.id) {
            return false;
        }
        list.push(vehicle);
        true
    }

    /// Keep only the watched vehicles for which `keep` returns `true`,
    /// dropping lanes that become empty.  Returns the removed vehicles.
    pub fn retain(
        &mut self,
        mut keep: impl FnMut(&LaneId, &mut WatchedVehicle) -> bool,
    ) -> Vec<(LaneId, WatchedVehicle)> {
        let mut removed = Vec::new();
        for (lane, list) in self.lanes.iter_mut() {
            let mut kept = Vec::with_capacity(list.len());
            for mut vehicle in list.drain(..) {
                if keep(lane, &mut vehicle) {
                    kept.push(vehicle);
                } else {
                    removed.push((lane.clone(), vehicle));
                }
            }
            *list = kept;
        }
        self.lanes.retain(|_, list| !list.is_empty());
        removed
    }

    /// Record that `id` was seen in `cycle`; returns the first cycle it was
    /// ever seen.
    pub fn note_sighting(&mut self, id: &VehicleId, cycle: u64) -> u64 {
        *self.first_seen.entry(id.clone()).or_insert(cycle)
    }

    /// First cycle `id` was seen, if it has been seen at all.
    pub fn first_seen(&self, id: &VehicleId) -> Option<u64> {
        self.first_seen.get(id).copied()
    }

    /// Forget every watched vehicle and sighting.
    pub fn clear(&mut self) {
        self.lanes.clear();
        self.first_seen.clear();
    }
}

// ────────────────────────────────────────────────────────────────────────────
// StopSignRecord
// ────────────────────────────────────────────────────────────────────────────

/// Cross-cycle state of one stop-sign encounter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopSignRecord {
    stop_sign_id: StopSignId,
    status: StopSignStatus,
    stop_start_time: Option<Timestamp>,
    stop_start_cycle: Option<u64>,
    associated_lanes: BTreeSet<LaneId>,
    watch_vehicles: WatchVehicles,
}

impl StopSignRecord {
    /// A fresh record in [`StopSignStatus::ToStop`].
    pub fn to_stop(stop_sign_id: StopSignId, associated_lanes: BTreeSet<LaneId>) -> Self {
        Self {
            stop_sign_id,
            status: StopSignStatus::ToStop,
            stop_start_time: None,
            stop_start_cycle: None,
            associated_lanes,
            watch_vehicles: WatchVehicles::new(),
        }
    }

    /// A record already in [`StopSignStatus::Stopping`] since `start`.
    pub fn stopping(
        stop_sign_id: StopSignId,
        associated_lanes: BTreeSet<LaneId>,
        start: Timestamp,
        start_cycle: u64,
    ) -> Self {
        let mut record = Self::to_stop(stop_sign_id, associated_lanes);
        record.begin_stopping(start, start_cycle);
        record
    }

    pub fn stop_sign_id(&self) -> &StopSignId {
        &self.stop_sign_id
    }

    pub fn status(&self) -> StopSignStatus {
        self.status
    }

    pub fn stop_start_time(&self) -> Option<Timestamp> {
        self.stop_start_time
    }

    pub fn stop_start_cycle(&self) -> Option<u64> {
        self.stop_start_cycle
    }

    pub fn associated_lanes(&self) -> &BTreeSet<LaneId> {
        &self.associated_lanes
    }

    pub fn watch_vehicles(&self) -> &WatchVehicles {
        &self.watch_vehicles
    }

    pub fn watch_vehicles_mut(&mut self) -> &mut WatchVehicles {
        &mut self.watch_vehicles
    }

    /// Borrow the lane set alongside the mutable watch lists, for the
    /// right-of-way update.
    pub fn right_of_way_mut(&mut self) -> (&BTreeSet<LaneId>, &mut WatchVehicles) {
        (&self.associated_lanes, &mut self.watch_vehicles)
    }

    /// Enter [`StopSignStatus::Stopping`].  The start time is recorded only
    /// on the first call; later calls leave it untouched.
    ///
    /// Returns `false` (and does nothing) unless the record is in `ToStop`
    /// or already `Stopping`.
    pub fn begin_stopping(&mut self, now: Timestamp, cycle: u64) -> bool {
        if !self.status.can_advance_to(StopSignStatus::Stopping) {
            return false;
        }
        self.status = StopSignStatus::Stopping;
        if self.stop_start_time.is_none() {
            self.stop_start_time = Some(now);
            self.stop_start_cycle = Some(cycle);
        }
        true
    }

    /// Enter [`StopSignStatus::StopDone`], dropping all right-of-way state.
    ///
    /// Returns `false` (and does nothing) unless the record is `Stopping`.
    pub fn complete(&mut self) -> bool {
        if self.status != StopSignStatus::Stopping {
            return false;
        }
        self.status = StopSignStatus::StopDone;
        self.watch_vehicles.clear();
        true
    }

    /// Seconds waited since entering `Stopping`, clamped at zero.
    pub fn waited_secs(&self, now: Timestamp) -> Option<f64> {
        self.stop_start_time
            .map(|start| now.secs_since(start).max(0.0))
    }
}
