//! [`PlannerConfig`] – per-session planner configuration.
//!
//! Rule enable flags and thresholds are read by the session when it is built.
//! Every field has a default, so a partial TOML table deserializes cleanly.

use junction_rules::StopSignConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid planner configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Output format of the `tracing` subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Planner settings for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub stop_sign: StopSignConfig,
    pub enable_crosswalk: bool,
    pub enable_keep_clear: bool,
    pub enable_traffic_light: bool,
    /// Cruise speed cap handed to the speed planner (m/s).
    pub upper_speed_limit: f64,
    /// Consecutive cycles without perception before the input is reported
    /// stale.
    pub max_stale_cycles: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            stop_sign: StopSignConfig::default(),
            enable_crosswalk: false,
            enable_keep_clear: false,
            enable_traffic_light: false,
            upper_speed_limit: 12.5,
            max_stale_cycles: 5,
        }
    }
}

impl PlannerConfig {
    /// Reject thresholds the rules cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let stop_sign = &self.stop_sign;
        non_negative("stop_sign.stop_speed_threshold", stop_sign.stop_speed_threshold)?;
        non_negative("stop_sign.stop_distance_threshold", stop_sign.stop_distance_threshold)?;
        non_negative("stop_sign.min_wait_secs", stop_sign.min_wait_secs)?;
        non_negative("stop_sign.exit_distance", stop_sign.exit_distance)?;
        positive("stop_sign.default_trigger_distance", stop_sign.default_trigger_distance)?;
        if stop_sign.stop_distance_threshold > stop_sign.default_trigger_distance {
            return Err(ConfigError::InvalidValue {
                field: "stop_sign.stop_distance_threshold",
                reason: "must not exceed stop_sign.default_trigger_distance".to_string(),
            });
        }
        let right_of_way = &stop_sign.right_of_way;
        non_negative("stop_sign.right_of_way.tie_epsilon_secs", right_of_way.tie_epsilon_secs)?;
        positive("stop_sign.right_of_way.watch_zone_length", right_of_way.watch_zone_length)?;
        if right_of_way.departure_confirm_cycles == 0 {
            return Err(ConfigError::InvalidValue {
                field: "stop_sign.right_of_way.departure_confirm_cycles",
                reason: "must be at least 1".to_string(),
            });
        }
        positive("upper_speed_limit", self.upper_speed_limit)?;
        if self.upper_speed_limit <= stop_sign.stop_speed_threshold {
            return Err(ConfigError::InvalidValue {
                field: "upper_speed_limit",
                reason: "must exceed stop_sign.stop_speed_threshold".to_string(),
            });
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("{value} is not a non-negative number"),
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field,
            reason: format!("{value} is not a positive number"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.stop_sign.enabled);
        assert!(!config.enable_crosswalk);
        assert_eq!(config.upper_speed_limit, 12.5);
    }

    #[test]
    fn negative_wait_is_rejected() {
        let mut config = PlannerConfig::default();
        config.stop_sign.min_wait_secs = -1.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "stop_sign.min_wait_secs",
                reason: "-1 is not a non-negative number".to_string(),
            })
        );
    }

    #[test]
    fn stop_distance_beyond_trigger_is_rejected() {
        let mut config = PlannerConfig::default();
        config.stop_sign.stop_distance_threshold = 60.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stop_sign.stop_distance_threshold"));
    }

    #[test]
    fn zero_departure_cycles_is_rejected() {
        let mut config = PlannerConfig::default();
        config.stop_sign.right_of_way.departure_confirm_cycles = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_speed_limit_is_rejected() {
        let config = PlannerConfig {
            upper_speed_limit: f64::NAN,
            ..PlannerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn speed_limit_below_stop_speed_is_rejected() {
        let config = PlannerConfig {
            upper_speed_limit: 0.2,
            ..PlannerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stop_speed_threshold"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PlannerConfig =
            serde_json::from_str(r#"{"enable_crosswalk":true,"stop_sign":{"min_wait_secs":2.0}}"#)
                .unwrap();
        assert!(config.enable_crosswalk);
        assert_eq!(config.stop_sign.min_wait_secs, 2.0);
        assert_eq!(config.stop_sign.stop_speed_threshold, 0.3);
        assert_eq!(config.max_stale_cycles, 5);
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("Compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
