//! # ccdash-settings
//!
//! Dashboard configuration with layered sources.
//!
//! Settings are resolved from three layers (in priority order):
//! 1. **Compiled defaults**: [`DashboardSettings::default()`]
//! 2. **User file**: `~/.claude/dashboard/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `CCDASH_*` overrides (highest priority)
//!
//! The binary applies CLI flags on top of the loaded value. Nothing is
//! reloaded after the server starts.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_overrides, deep_merge, load_settings_from_path, load_settings_with, settings_path,
};
pub use types::DashboardSettings;
