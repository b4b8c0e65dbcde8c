//! Layered settings loading.
//!
//! Compiled defaults are serialized to JSON, the user file (if any) is
//! deep-merged over them, the result is deserialized back, and `CHATLOG_*`
//! variables are applied last. In the merge, objects combine key by key,
//! while arrays and scalars from the file replace the default outright.
//! Explicit `null`s in the file are ignored, so they keep the default.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::ChatlogSettings;

/// Resolve the path to the settings file (`~/.chatlog/settings.json`).
pub fn settings_path() -> PathBuf {
    crate::types::chatlog_home().join("settings.json")
}

/// Settings from `~/.chatlog/settings.json` plus the process environment.
pub fn load_settings() -> Result<ChatlogSettings> {
    load_settings_from_path(&settings_path())
}

/// Settings from `path` plus the process environment.
///
/// A missing file means defaults. An unreadable or malformed file is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ChatlogSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

/// Defaults merged with the settings file, without env overrides.
fn load_file_layer(path: &Path) -> Result<ChatlogSettings> {
    let defaults = serde_json::to_value(ChatlogSettings::default())?;

    let merged = if path.exists() {
        debug!(path = %path.display(), "reading settings file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        deep_merge(defaults, user)
    } else {
        debug!(path = %path.display(), "no settings file, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Merge `source` over `target`, recursing into objects.
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

/// Apply environment overrides read through `lookup`.
///
/// Invalid values are ignored with a warning and the file/default value wins.
pub fn apply_env_overrides<F>(settings: &mut ChatlogSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Database ────────────────────────────────────────────────────
    if let Some(v) = env.string("CHATLOG_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = env.u32_range("CHATLOG_POOL_SIZE", 1, 256) {
        settings.database.pool_size = v;
    }
    if let Some(v) = env.u32_range("CHATLOG_BUSY_TIMEOUT_MS", 0, 600_000) {
        settings.database.busy_timeout_ms = v;
    }
    if let Some(v) = env.bool("CHATLOG_SKIP_MIGRATIONS") {
        settings.database.skip_migrations = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("CHATLOG_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("CHATLOG_MUTE_ERRORS") {
        settings.logging.mute_errors = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`, any case.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u32` within an inclusive range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u32_range(&self, name: &str, min: u32, max: u32) -> Option<u32> {
        let val = (self.lookup)(name)?;
        let result = parse_u32_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u32 env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
