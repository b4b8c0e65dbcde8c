//! # chatlog-settings
//!
//! Configuration for the chat log store, loaded from three layers (in
//! priority order):
//! 1. **Compiled defaults**: [`ChatlogSettings::default()`]
//! 2. **User file**: `~/.chatlog/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `CHATLOG_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{ChatlogSettings, DatabaseSettings, LoggingSettings};

use std::sync::OnceLock;

static SETTINGS: OnceLock<ChatlogSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// Loaded on first call; falls back to compiled defaults if loading fails.
pub fn get_settings() -> &'static ChatlogSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            ChatlogSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns `Err(settings)` if they were already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: ChatlogSettings) -> std::result::Result<(), ChatlogSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
