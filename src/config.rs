//! Startup configuration, read from the environment.

use crate::attendance::default_late_cutoff;
use crate::model::hhmm;
use chrono::{NaiveDateTime, NaiveTime};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Workspace opened before the first request, if any.
    pub workspace: Option<PathBuf>,
    /// Student check-ins after this minute are recorded as late.
    pub late_cutoff: NaiveTime,
    /// Pinned local wall-clock time for demos and end-to-end tests.
    pub fixed_now: Option<NaiveDateTime>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: None,
            late_cutoff: default_late_cutoff(),
            fixed_now: None,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        cfg.workspace = lookup("PORTALD_WORKSPACE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        if let Some(raw) = lookup("PORTALD_LATE_CUTOFF") {
            cfg.late_cutoff = hhmm::parse(&raw).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "PORTALD_LATE_CUTOFF".to_string(),
                    format!("'{}' is not an HH:MM time", raw),
                )
            })?;
        }

        if let Some(raw) = lookup("PORTALD_NOW").filter(|s| !s.trim().is_empty()) {
            let t = raw.trim();
            let parsed = NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M"))
                .map_err(|e| ConfigError::InvalidValue("PORTALD_NOW".to_string(), e.to_string()))?;
            cfg.fixed_now = Some(parsed);
        }

        if let Some(filter) = lookup("RUST_LOG").filter(|s| !s.trim().is_empty()) {
            cfg.log_filter = filter;
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_lookup(lookup(&[])).unwrap();
        assert!(cfg.workspace.is_none());
        assert_eq!(cfg.late_cutoff, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn reads_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("PORTALD_WORKSPACE", "/tmp/school"),
            ("PORTALD_LATE_CUTOFF", "07:15"),
            ("RUST_LOG", "portald=debug"),
        ]))
        .unwrap();
        assert_eq!(cfg.workspace, Some(PathBuf::from("/tmp/school")));
        assert_eq!(cfg.late_cutoff, NaiveTime::from_hms_opt(7, 15, 0).unwrap());
        assert_eq!(cfg.log_filter, "portald=debug");
        assert!(cfg.fixed_now.is_none());
    }

    #[test]
    fn reads_pinned_clock() {
        let cfg = Config::from_lookup(lookup(&[("PORTALD_NOW", "2026-10-19T07:45")])).unwrap();
        let expected = chrono::NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(7, 45, 0)
            .unwrap();
        assert_eq!(cfg.fixed_now, Some(expected));
        assert!(Config::from_lookup(lookup(&[("PORTALD_NOW", "tomorrow")])).is_err());
    }

    #[test]
    fn rejects_bad_cutoff() {
        let err = Config::from_lookup(lookup(&[("PORTALD_LATE_CUTOFF", "half past seven")]));
        assert!(matches!(err, Err(ConfigError::InvalidValue(..))));
    }
}
