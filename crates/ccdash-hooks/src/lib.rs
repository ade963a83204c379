//! # ccdash-hooks
//!
//! Registers and unregisters the command hooks that forward agent lifecycle
//! events to `POST /api/hook`.
//!
//! Hooks live in the agent's `settings.json` under
//! `hooks.<EventName>[].hooks[]`. Every entry this crate writes carries a
//! marker string in `statusMessage`, so installs replace earlier dashboard
//! entries and removals never touch foreign ones.

#![deny(unsafe_code)]

pub mod errors;
pub mod installer;
pub mod markers;

pub use errors::{HooksError, Result};
pub use installer::{
    default_config_dir, hook_command, install_event_forwarding, remove_event_forwarding,
    settings_file,
};
pub use markers::{HOOK_EVENTS, MARKER_INSTALL, MARKER_LEGACY, MARKER_QUICK, RemovalMode};
