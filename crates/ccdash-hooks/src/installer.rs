//! Marker-based merge into the agent `settings.json`.
//!
//! Install and remove both follow the same shape: read the file (missing
//! means `{}`), strip entries whose `statusMessage` matches the target
//! markers, optionally append fresh entries, then write it back pretty
//! printed. Groups, event keys, and the `hooks` object are pruned once a
//! removal leaves them empty.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::errors::{HooksError, Result};
use crate::markers::{HOOK_EVENTS, MARKER_LEGACY, MARKER_QUICK, RemovalMode};

/// The agent configuration directory (`~/.claude`).
pub fn default_config_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".claude")
}

/// Settings file inside a configuration directory.
pub fn settings_file(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.json")
}

/// Shell command that pipes the hook payload on stdin to the dashboard.
pub fn hook_command(port: u16) -> String {
    if cfg!(windows) {
        format!(
            "powershell -NoProfile -Command \"$input | Invoke-WebRequest -Uri http://localhost:{port}/api/hook -Method POST -ContentType 'application/json' -ErrorAction SilentlyContinue | Out-Null\""
        )
    } else {
        format!(
            "curl -s -X POST -H \"Content-Type: application/json\" -d @- http://localhost:{port}/api/hook > /dev/null 2>&1"
        )
    }
}

/// Register forwarding hooks for every event in [`HOOK_EVENTS`].
///
/// Earlier quick and legacy entries are replaced; permanently installed
/// entries and foreign hooks are left alone. Returns the patched file path.
pub fn install_event_forwarding(port: u16, config_dir: &Path) -> Result<PathBuf> {
    let path = settings_file(config_dir);
    let mut settings = read_settings(&path)?;
    backup_settings(&path);

    let _ = remove_by_markers(&mut settings, &[MARKER_QUICK, MARKER_LEGACY])?;

    let command = hook_command(port);
    let hooks = settings
        .entry("hooks")
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(events) = hooks else {
        return Err(HooksError::InvalidShape("`hooks` is not an object".into()));
    };

    for event in HOOK_EVENTS {
        let groups = events
            .entry(*event)
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(groups) = groups else {
            return Err(HooksError::InvalidShape(format!(
                "`hooks.{event}` is not an array"
            )));
        };
        groups.push(json!({
            "hooks": [{
                "type": "command",
                "command": command,
                "async": true,
                "statusMessage": MARKER_QUICK,
            }]
        }));
    }

    write_settings(&path, settings)?;
    info!(port, path = %path.display(), "installed dashboard hooks");
    Ok(path)
}

/// Remove dashboard hooks selected by `mode`.
///
/// A missing settings file is a no-op. Returns the number of hook entries
/// removed.
pub fn remove_event_forwarding(config_dir: &Path, mode: RemovalMode) -> Result<usize> {
    let path = settings_file(config_dir);
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, nothing to remove");
        return Ok(0);
    }

    let mut settings = read_settings(&path)?;
    let removed = remove_by_markers(&mut settings, mode.markers())?;
    write_settings(&path, settings)?;
    info!(removed, ?mode, path = %path.display(), "removed dashboard hooks");
    Ok(removed)
}

/// Read the settings object. Unparseable content is copied to
/// `settings.json.bak` and replaced by an empty object.
fn read_settings(path: &Path) -> Result<Map<String, Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e.into()),
    };

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&content) {
        return Ok(map);
    }

    let bak = path.with_extension("json.bak");
    match std::fs::copy(path, &bak) {
        Ok(_) => warn!(backup = %bak.display(), "invalid settings file backed up"),
        Err(e) => warn!(error = %e, "invalid settings file could not be backed up"),
    }
    Ok(Map::new())
}

/// Copy the current file to `settings.pre-dashboard.json` before rewriting.
fn backup_settings(path: &Path) {
    let backup = path.with_extension("pre-dashboard.json");
    match std::fs::copy(path, &backup) {
        Ok(_) => debug!(backup = %backup.display(), "settings backed up"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(error = %e, "settings backup failed"),
    }
}

fn write_settings(path: &Path, settings: Map<String, Value>) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let mut out = serde_json::to_string_pretty(&Value::Object(settings))?;
    out.push('\n');
    std::fs::write(path, out)?;
    Ok(())
}

fn is_marked(hook: &Value, markers: &[&str]) -> bool {
    hook.get("statusMessage")
        .and_then(Value::as_str)
        .is_some_and(|m| markers.contains(&m))
}

/// Strip marked hook entries and prune containers they leave empty.
fn remove_by_markers(settings: &mut Map<String, Value>, markers: &[&str]) -> Result<usize> {
    let Some(hooks) = settings.get_mut("hooks") else {
        return Ok(0);
    };
    let Value::Object(events) = hooks else {
        return Err(HooksError::InvalidShape("`hooks` is not an object".into()));
    };

    let mut removed = 0;
    let mut emptied = Vec::new();

    for (event, groups) in events.iter_mut() {
        // Foreign shapes are not ours to touch.
        let Value::Array(groups) = groups else {
            continue;
        };
        let before = removed;
        groups.retain_mut(|group| {
            let Some(entries) = group.get_mut("hooks").and_then(Value::as_array_mut) else {
                return true;
            };
            let len = entries.len();
            entries.retain(|h| !is_marked(h, markers));
            removed += len - entries.len();
            !(entries.is_empty() && len > 0)
        });
        if groups.is_empty() && removed > before {
            emptied.push(event.clone());
        }
    }

    for event in emptied {
        let _ = events.remove(&event);
    }
    if events.is_empty() {
        let _ = settings.remove("hooks");
    }
    Ok(removed)
}
