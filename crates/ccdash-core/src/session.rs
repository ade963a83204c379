//! Session records.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a tracked session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The agent is working on a prompt.
    Running,
    /// The agent is blocked on the user (fresh session or interactive tool).
    Waiting,
    /// The agent finished its turn.
    Done,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Waiting => write!(f, "waiting"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// One externally observed agent session.
///
/// Timestamps are milliseconds since the Unix epoch. `started_at` is fixed at
/// creation; `updated_at` moves on every mutating event and never falls
/// behind `started_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque external identifier.
    pub session_id: String,
    /// Current lifecycle phase.
    pub status: SessionStatus,
    /// Last known working directory, empty if never supplied.
    pub cwd: String,
    /// Label of the most recent event (event name, or tool name for tool use).
    pub last_event: String,
    /// Creation time.
    pub started_at: i64,
    /// Time of the last mutating event.
    pub updated_at: i64,
}

impl Session {
    /// Create a record whose start and update times are both `now`.
    pub fn new(
        session_id: impl Into<String>,
        status: SessionStatus,
        cwd: Option<&str>,
        last_event: impl Into<String>,
        now: i64,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            status,
            cwd: cwd.unwrap_or_default().to_owned(),
            last_event: last_event.into(),
            started_at: now,
            updated_at: now,
        }
    }

    /// Milliseconds since the last update, as seen at `now`.
    pub fn idle_ms(&self, now: i64) -> i64 {
        now.saturating_sub(self.updated_at)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
