//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`DashboardSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply `CCDASH_*` environment overrides (highest priority)
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::DashboardSettings;

/// Resolve the path to the settings file (`~/.claude/dashboard/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home)
        .join(".claude")
        .join("dashboard")
        .join("settings.json")
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<DashboardSettings> {
    load_settings_with(path, |name| std::env::var(name).ok())
}

/// Load settings from `path`, resolving overrides through `lookup`.
pub fn load_settings_with<F>(path: &Path, lookup: F) -> Result<DashboardSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(DashboardSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: DashboardSettings = serde_json::from_value(merged)?;
    apply_overrides(&mut settings, lookup);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `CCDASH_*` overrides resolved through `lookup`.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_overrides<F>(settings: &mut DashboardSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(v) = read("CCDASH_HOST") {
        settings.host = v;
    }
    if let Some(v) = read("CCDASH_PORT") {
        match parse_u16_range(&v, 1, 65535) {
            Some(port) => settings.port = port,
            None => warn!(key = "CCDASH_PORT", value = %v, "invalid port env var, ignoring"),
        }
    }
    if let Some(v) = read("CCDASH_IDLE_TIMEOUT_MS") {
        match parse_u64_range(&v, 1, u64::MAX) {
            Some(ms) => settings.idle_timeout_ms = ms,
            None => warn!(key = "CCDASH_IDLE_TIMEOUT_MS", value = %v, "invalid u64 env var, ignoring"),
        }
    }
    if let Some(v) = read("CCDASH_REAPER_INTERVAL_MS") {
        match parse_u64_range(&v, 1, u64::MAX) {
            Some(ms) => settings.reaper_interval_ms = ms,
            None => warn!(key = "CCDASH_REAPER_INTERVAL_MS", value = %v, "invalid u64 env var, ignoring"),
        }
    }
    if let Some(v) = read("CCDASH_KEEP_ALIVE_SECS") {
        match parse_u64_range(&v, 0, 3_600) {
            Some(secs) => settings.keep_alive_secs = secs,
            None => warn!(key = "CCDASH_KEEP_ALIVE_SECS", value = %v, "invalid u64 env var, ignoring"),
        }
    }
    if let Some(v) = read("CCDASH_LOG_LEVEL") {
        settings.log_level = v;
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::errors::SettingsError;
    use assert_matches::assert_matches;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_simple_override() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": 10});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 10);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn merge_nested_and_arrays() {
        let target = serde_json::json!({"x": {"y": 1, "z": 2}, "items": [1, 2, 3]});
        let source = serde_json::json!({"x": {"y": 9}, "items": [4]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["x"]["y"], 9);
        assert_eq!(merged["x"]["z"], 2);
        assert_eq!(merged["items"], serde_json::json!([4]));
    }

    // ── load_settings_with ──────────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let path = Path::new("/nonexistent/settings.json");
        let settings = load_settings_with(path, no_env).unwrap();
        assert_eq!(settings, DashboardSettings::default());
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"port": 9100, "idleTimeoutMs": 1000}"#).unwrap();

        let settings = load_settings_with(&path, no_env).unwrap();
        assert_eq!(settings.port, 9100);
        assert_eq!(settings.idle_timeout_ms, 1000);
        assert_eq!(settings.reaper_interval_ms, 30_000);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_with(&path, no_env);
        assert_matches!(result, Err(SettingsError::Json(_)));
    }

    #[test]
    fn load_rejects_zero_interval_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"reaperIntervalMs": 0}"#).unwrap();

        let result = load_settings_with(&path, no_env);
        assert_matches!(result, Err(SettingsError::InvalidValue(_)));
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"port": 9100}"#).unwrap();

        let settings = load_settings_with(
            &path,
            env(&[("CCDASH_PORT", "9200"), ("CCDASH_REAPER_INTERVAL_MS", "50")]),
        )
        .unwrap();
        assert_eq!(settings.port, 9200);
        assert_eq!(settings.reaper_interval_ms, 50);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut settings = DashboardSettings::default();
        apply_overrides(
            &mut settings,
            env(&[
                ("CCDASH_PORT", "0"),
                ("CCDASH_IDLE_TIMEOUT_MS", "soon"),
                ("CCDASH_KEEP_ALIVE_SECS", "-1"),
            ]),
        );
        assert_eq!(settings, DashboardSettings::default());
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut settings = DashboardSettings::default();
        apply_overrides(&mut settings, env(&[("CCDASH_HOST", ""), ("CCDASH_LOG_LEVEL", "")]));
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn string_overrides_apply() {
        let mut settings = DashboardSettings::default();
        apply_overrides(
            &mut settings,
            env(&[("CCDASH_HOST", "::1"), ("CCDASH_LOG_LEVEL", "debug")]),
        );
        assert_eq!(settings.host, "::1");
        assert_eq!(settings.log_level, "debug");
    }

    // ── range parsing ───────────────────────────────────────────────

    #[test]
    fn parse_u16_bounds() {
        assert_eq!(parse_u16_range("8377", 1, 65535), Some(8377));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("99999", 1, 65535), None);
        assert_eq!(parse_u16_range("abc", 1, 65535), None);
    }

    #[test]
    fn parse_u64_bounds() {
        assert_eq!(parse_u64_range("30000", 1, u64::MAX), Some(30_000));
        assert_eq!(parse_u64_range("0", 1, u64::MAX), None);
        assert_eq!(parse_u64_range("7200", 0, 3_600), None);
    }
}
