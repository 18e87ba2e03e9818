//! [`DecisionContext`] – session-owned decision state.
//!
//! The planning session owns exactly one context and lends it to the rules
//! each cycle.  Stop-sign records are addressed by [`StopSignId`], never by
//! hand-built strings; the underlying [`DecisionStore`] is still reachable for
//! rules that keep their own typed entries.

use junction_types::{PlannerError, StopSignId, StopSignStatus};
use tracing::debug;

use crate::decision_store::DecisionStore;
use crate::record::StopSignRecord;

/// Store key under which the record for `id` lives.
pub fn stop_sign_key(id: &StopSignId) -> String {
    format!("stop_sign/{id}")
}

/// Strongly-typed view over the session's [`DecisionStore`].
#[derive(Debug, Default)]
pub struct DecisionContext {
    store: DecisionStore,
}

impl DecisionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The record for `id`, or `None` when the identity is `Unknown`.
    pub fn stop_sign(&self, id: &StopSignId) -> Option<&StopSignRecord> {
        self.store.get::<StopSignRecord>(&stop_sign_key(id))
    }

    pub fn stop_sign_mut(&mut self, id: &StopSignId) -> Option<&mut StopSignRecord> {
        self.store.get_mut::<StopSignRecord>(&stop_sign_key(id))
    }

    /// Current status of `id`; absence reads as [`StopSignStatus::Unknown`].
    pub fn stop_sign_status(&self, id: &StopSignId) -> StopSignStatus {
        self.stop_sign(id)
            .map_or(StopSignStatus::Unknown, StopSignRecord::status)
    }

    /// Store `record` under its own identity, replacing any previous record.
    ///
    /// A value of another type left under the same key is discarded, so the
    /// key holds nothing but the record from here on.
    pub fn insert_stop_sign(&mut self, record: StopSignRecord) {
        let key = stop_sign_key(record.stop_sign_id());
        if self.store.holds_other_type::<StopSignRecord>(&key) {
            let dropped = self.store.clear_key(&key);
            debug!(key = %key, dropped, "discarded foreign entries under stop-sign key");
        }
        self.store.set(&key, record);
    }

    /// Remove the whole record for `id` (status, start time, lanes and watch
    /// lists together).
    pub fn remove_stop_sign(&mut self, id: &StopSignId) -> Option<StopSignRecord> {
        let removed = self.store.clear::<StopSignRecord>(&stop_sign_key(id));
        if removed.is_some() {
            debug!(stop_sign = %id, "stop-sign record removed");
        }
        removed
    }

    /// Report a [`PlannerError::StoreTypeMismatch`] when the key for `id`
    /// holds something other than a [`StopSignRecord`].
    pub fn check_stop_sign_type(&self, id: &StopSignId) -> Result<(), PlannerError> {
        let key = stop_sign_key(id);
        if self.store.holds_other_type::<StopSignRecord>(&key) {
            return Err(PlannerError::StoreTypeMismatch { key });
        }
        Ok(())
    }

    /// Identities that currently have a record, in no particular order.
    pub fn stop_sign_ids(&self) -> Vec<StopSignId> {
        self.store
            .keys()
            .filter_map(|key| self.store.get::<StopSignRecord>(key))
            .map(|record| record.stop_sign_id().clone())
            .collect()
    }

    /// Copies of every live stop-sign record, ordered by identity.
    pub fn snapshot(&self) -> Vec<StopSignRecord> {
        let mut records: Vec<StopSignRecord> = self
            .store
            .keys()
            .filter_map(|key| self.store.get::<StopSignRecord>(key))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.stop_sign_id().cmp(b.stop_sign_id()));
        records
    }

    pub fn store(&self) -> &DecisionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DecisionStore {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use junction_types::{LaneId, Timestamp};

    use super::*;

    fn record(id: &str) -> StopSignRecord {
        let lanes: BTreeSet<LaneId> = ["743_1_-1", "868_1_-1"]
            .iter()
            .map(|l| LaneId::from(*l))
            .collect();
        StopSignRecord::to_stop(StopSignId::from(id), lanes)
    }

    #[test]
    fn absent_identity_is_unknown() {
        let ctx = DecisionContext::new();
        assert_eq!(
            ctx.stop_sign_status(&StopSignId::from("1017")),
            StopSignStatus::Unknown
        );
    }

    #[test]
    fn identities_do_not_interfere() {
        let mut ctx = DecisionContext::new();
        ctx.insert_stop_sign(record("1017"));
        ctx.insert_stop_sign(record("9762"));

        ctx.stop_sign_mut(&StopSignId::from("9762"))
            .unwrap()
            .begin_stopping(Timestamp::from_secs(1.0), 1);

        assert_eq!(
            ctx.stop_sign_status(&StopSignId::from("1017")),
            StopSignStatus::ToStop
        );
        assert_eq!(
            ctx.stop_sign_status(&StopSignId::from("9762")),
            StopSignStatus::Stopping
        );
    }

    #[test]
    fn remove_clears_everything_for_identity() {
        let mut ctx = DecisionContext::new();
        ctx.insert_stop_sign(record("9762"));
        ctx.insert_stop_sign(record("1017"));

        let removed = ctx.remove_stop_sign(&StopSignId::from("9762"));
        assert!(removed.is_some());
        assert!(ctx.stop_sign(&StopSignId::from("9762")).is_none());
        assert!(ctx.stop_sign(&StopSignId::from("1017")).is_some());
        assert!(ctx.remove_stop_sign(&StopSignId::from("9762")).is_none());
    }

    #[test]
    fn foreign_type_under_key_is_reported_and_reads_absent() {
        let mut ctx = DecisionContext::new();
        let id = StopSignId::from("1017");
        ctx.store_mut().set(&stop_sign_key(&id), 3.0_f64);

        assert_eq!(ctx.stop_sign_status(&id), StopSignStatus::Unknown);
        assert!(matches!(
            ctx.check_stop_sign_type(&id),
            Err(PlannerError::StoreTypeMismatch { .. })
        ));

        ctx.insert_stop_sign(record("1017"));
        assert!(ctx.check_stop_sign_type(&id).is_ok());
        assert_eq!(ctx.stop_sign_status(&id), StopSignStatus::ToStop);
    }

    #[test]
    fn reinitialising_over_foreign_entry_discards_it() {
        let mut ctx = DecisionContext::new();
        let id = StopSignId::from("1017");
        let key = stop_sign_key(&id);
        ctx.store_mut().set(&key, "STOPPING".to_string());

        ctx.insert_stop_sign(record("1017"));
        assert!(ctx.store().get::<String>(&key).is_none());
        assert_eq!(ctx.store().len(), 1);

        ctx.remove_stop_sign(&id);
        assert!(ctx.check_stop_sign_type(&id).is_ok());
        assert!(ctx.store().is_empty());
    }

    #[test]
    fn stop_sign_ids_lists_only_records() {
        let mut ctx = DecisionContext::new();
        ctx.insert_stop_sign(record("9762"));
        ctx.insert_stop_sign(record("1017"));
        ctx.store_mut().set("stop_sign/4000", 1_u8);

        let mut ids = ctx.stop_sign_ids();
        ids.sort();
        assert_eq!(ids, vec![StopSignId::from("1017"), StopSignId::from("9762")]);
    }

    #[test]
    fn snapshot_is_sorted_by_identity() {
        let mut ctx = DecisionContext::new();
        ctx.insert_stop_sign(record("9762"));
        ctx.insert_stop_sign(record("1017"));
        ctx.store_mut().set("unrelated", 1_u8);

        let ids: Vec<String> = ctx
            .snapshot()
            .iter()
            .map(|r| r.stop_sign_id().to_string())
            .collect();
        assert_eq!(ids, vec!["1017", "9762"]);
    }
}
