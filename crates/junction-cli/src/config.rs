//! CLI configuration – reads `~/.junction/config.toml` or an explicit path.
//!
//! ```toml
//! log_format = "json"
//!
//! [planner]
//! max_stale_cycles = 5
//!
//! [planner.stop_sign]
//! min_wait_secs = 3.0
//! stop_speed_threshold = 0.3
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use junction_runtime::{LogFormat, PlannerConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} not found", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Invalid(#[from] junction_runtime::ConfigError),
}

/// Effective configuration of the `junction` binary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_format: LogFormat,
    pub planner: PlannerConfig,
}

/// Return the path to `~/.junction/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".junction").join("config.toml")
}

/// Resolve the effective configuration.
///
/// An explicit `path` must exist; the default location may be absent, in
/// which case built-in defaults apply.  Environment overrides are applied
/// last and the result is validated.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut cfg = match path {
        Some(path) => load_from(path)?.ok_or_else(|| ConfigError::NotFound {
            path: path.to_path_buf(),
        })?,
        None => load_from(&config_path())?.unwrap_or_default(),
    };
    apply_env_overrides(&mut cfg);
    cfg.planner.validate()?;
    Ok(cfg)
}

/// Load the config from `path`.  Returns `None` if the file does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(cfg))
}

/// Apply `JUNCTION_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `JUNCTION_MIN_WAIT_SECS` | `planner.stop_sign.min_wait_secs` |
/// | `JUNCTION_STOP_SPEED_THRESHOLD` | `planner.stop_sign.stop_speed_threshold` |
/// | `JUNCTION_ENABLE_STOP_SIGN` | `planner.stop_sign.enabled` |
/// | `JUNCTION_LOG_FORMAT` | `log_format` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |name| std::env::var(name).ok());
}

pub(crate) fn apply_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    let stop_sign = &mut cfg.planner.stop_sign;
    if let Some(v) = var("JUNCTION_MIN_WAIT_SECS")
        && let Ok(secs) = v.parse::<f64>()
    {
        stop_sign.min_wait_secs = secs;
    }
    if let Some(v) = var("JUNCTION_STOP_SPEED_THRESHOLD")
        && let Ok(speed) = v.parse::<f64>()
    {
        stop_sign.stop_speed_threshold = speed;
    }
    if let Some(v) = var("JUNCTION_ENABLE_STOP_SIGN")
        && let Ok(enabled) = v.parse::<bool>()
    {
        stop_sign.enabled = enabled;
    }
    if let Some(v) = var("JUNCTION_LOG_FORMAT")
        && let Ok(format) = v.parse::<LogFormat>()
    {
        cfg.log_format = format;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn write(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    fn config_path_points_to_junction_dir() {
        let p = config_path_for_home("/home/testuser");
        assert_eq!(p, PathBuf::from("/home/testuser/.junction/config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let err = load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = write(
            &dir,
            "log_format = \"json\"\n\n[planner.stop_sign]\nmin_wait_secs = 2.5\n",
        );
        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.planner.stop_sign.min_wait_secs, 2.5);
        assert_eq!(cfg.planner.stop_sign.stop_distance_threshold, 3.5);
        assert_eq!(cfg.planner.upper_speed_limit, 12.5);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = write(&dir, "[planner\nmin_wait_secs = ");
        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn invalid_thresholds_are_rejected_on_load() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = write(&dir, "[planner.stop_sign]\nmin_wait_secs = -4.0\n");
        let err = load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn roundtrip_through_toml() {
        let mut cfg = Config::default();
        cfg.planner.enable_traffic_light = true;
        let raw = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&raw).expect("parse");
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn overrides_apply_to_stop_sign_settings() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            vars(&[
                ("JUNCTION_MIN_WAIT_SECS", "4.5"),
                ("JUNCTION_STOP_SPEED_THRESHOLD", "0.1"),
                ("JUNCTION_ENABLE_STOP_SIGN", "false"),
                ("JUNCTION_LOG_FORMAT", "json"),
            ]),
        );
        assert_eq!(cfg.planner.stop_sign.min_wait_secs, 4.5);
        assert_eq!(cfg.planner.stop_sign.stop_speed_threshold, 0.1);
        assert!(!cfg.planner.stop_sign.enabled);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn unparseable_overrides_are_ignored() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            vars(&[
                ("JUNCTION_MIN_WAIT_SECS", "three"),
                ("JUNCTION_ENABLE_STOP_SIGN", "maybe"),
                ("JUNCTION_LOG_FORMAT", "xml"),
            ]),
        );
        assert_eq!(cfg, Config::default());
    }
}
