//! Marker strings and the events the dashboard listens to.

/// Tags hooks installed for the lifetime of one server run.
pub const MARKER_QUICK: &str = "__claude_code_dashboard_quick__";

/// Tags hooks left behind by a permanent install. Only ever removed.
pub const MARKER_INSTALL: &str = "__claude_code_dashboard_install__";

/// Tag written by older releases. Always cleaned up.
pub const MARKER_LEGACY: &str = "__claude_code_dashboard__";

/// Hook events forwarded to the dashboard.
pub const HOOK_EVENTS: &[&str] = &[
    "SessionStart",
    "UserPromptSubmit",
    "PreToolUse",
    "Stop",
    "SessionEnd",
];

/// Which dashboard hooks a removal targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemovalMode {
    /// Hooks from a running server (plus legacy).
    Quick,
    /// Every dashboard hook, including permanent-install leftovers.
    #[default]
    All,
}

impl RemovalMode {
    /// Markers whose entries this mode removes.
    pub fn markers(self) -> &'static [&'static str] {
        match self {
            Self::Quick => &[MARKER_QUICK, MARKER_LEGACY],
            Self::All => &[MARKER_QUICK, MARKER_INSTALL, MARKER_LEGACY],
        }
    }
}
