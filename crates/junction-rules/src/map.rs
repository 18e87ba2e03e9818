//! Map-topology seam for stop-sign groupings.
//!
//! The map service owns the grouping of lanes into stop-sign identities; the
//! rules only need to resolve an identity to its [`StopSignGroup`].  A missing
//! or malformed grouping is a [`PlannerError::Configuration`], which the
//! stop-sign rule turns into "disabled for this identity".

use std::collections::{BTreeSet, HashMap};

use junction_types::{LaneId, PlannerError, StopSignId};
use serde::{Deserialize, Serialize};

/// All lanes regulated by one stop-sign identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopSignGroup {
    pub id: StopSignId,
    /// Approach lanes sharing the intersection, the ego's included.
    pub lanes: BTreeSet<LaneId>,
    /// Distance before the stop line at which the rule engages; the rule's
    /// configured default applies when absent.
    #[serde(default)]
    pub trigger_distance: Option<f64>,
}

impl StopSignGroup {
    pub fn new(id: impl Into<StopSignId>, lanes: &[&str]) -> Self {
        Self {
            id: id.into(),
            lanes: lanes.iter().map(|lane| LaneId::from(*lane)).collect(),
            trigger_distance: None,
        }
    }

    /// Check the grouping is usable.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.lanes.is_empty() {
            return Err(PlannerError::Configuration {
                stop_sign: self.id.clone(),
                details: "grouping has no associated lanes".to_string(),
            });
        }
        if let Some(trigger) = self.trigger_distance
            && !(trigger.is_finite() && trigger > 0.0)
        {
            return Err(PlannerError::Configuration {
                stop_sign: self.id.clone(),
                details: format!("trigger distance {trigger} is not a positive distance"),
            });
        }
        Ok(())
    }
}

/// Resolves stop-sign identities to lane groupings.
pub trait StopSignMap: Send + Sync {
    /// The validated grouping for `id`.
    fn group(&self, id: &StopSignId) -> Result<&StopSignGroup, PlannerError>;
}

/// In-memory [`StopSignMap`] built from a fixed list of groupings.
#[derive(Debug, Clone, Default)]
pub struct StaticStopSignMap {
    groups: HashMap<StopSignId, StopSignGroup>,
}

impl StaticStopSignMap {
    pub fn new(groups: impl IntoIterator<Item = StopSignGroup>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.id.clone(), g)).collect(),
        }
    }

    /// Add or replace a grouping.
    pub fn insert(&mut self, group: StopSignGroup) {
        self.groups.insert(group.id.clone(), group);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl StopSignMap for StaticStopSignMap {
    fn group(&self, id: &StopSignId) -> Result<&StopSignGroup, PlannerError> {
        let group = self
            .groups
            .get(id)
            .ok_or_else(|| PlannerError::Configuration {
                stop_sign: id.clone(),
                details: "no grouping in map".to_string(),
            })?;
        group.validate()?;
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_group() {
        let map = StaticStopSignMap::new([StopSignGroup::new("1022", &["868_1_-1", "743_1_-1"])]);
        let group = map.group(&StopSignId::from("1022")).unwrap();
        assert_eq!(group.lanes.len(), 2);
    }

    #[test]
    fn unknown_identity_is_configuration_error() {
        let map = StaticStopSignMap::default();
        assert!(matches!(
            map.group(&StopSignId::from("404")),
            Err(PlannerError::Configuration { .. })
        ));
    }

    #[test]
    fn empty_grouping_is_rejected() {
        let map = StaticStopSignMap::new([StopSignGroup::new("1017", &[])]);
        let err = map.group(&StopSignId::from("1017")).unwrap_err();
        assert!(err.to_string().contains("no associated lanes"));
    }

    #[test]
    fn non_positive_trigger_is_rejected() {
        let mut group = StopSignGroup::new("1017", &["a"]);
        group.trigger_distance = Some(0.0);
        assert!(group.validate().is_err());
        group.trigger_distance = Some(f64::NAN);
        assert!(group.validate().is_err());
        group.trigger_distance = Some(40.0);
        assert!(group.validate().is_ok());
    }

    #[test]
    fn group_deserializes_without_trigger() {
        let group: StopSignGroup =
            serde_json::from_str(r#"{"id":"9762","lanes":["743_1_-1","743_1_-2"]}"#).unwrap();
        assert_eq!(group.trigger_distance, None);
        assert!(group.lanes.contains(&LaneId::from("743_1_-2")));
    }
}
