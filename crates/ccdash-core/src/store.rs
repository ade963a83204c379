//! The session store: lifecycle transitions and idle eviction.
//!
//! Pure state machine over session ids. No I/O and no failure modes: ids are
//! opaque strings and every operation runs to completion. Callers that share
//! a store across tasks wrap it in a lock and publish after each mutation.

use indexmap::IndexMap;
use tracing::debug;

use crate::event::{HookEvent, HookPayload};
use crate::session::{Session, SessionStatus, now_ms};

/// Owned mapping from session id to record, iterated in creation order.
#[derive(Debug, Default, Clone)]
pub struct SessionStore {
    sessions: IndexMap<String, Session>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a hook event at the current wall-clock time.
    pub fn apply_event(&mut self, payload: &HookPayload) -> Option<Session> {
        self.apply_event_at(payload, now_ms())
    }

    /// Apply a hook event as if it arrived at `now`.
    ///
    /// Returns the resulting record, or `None` for liveness probes and
    /// termination events.
    pub fn apply_event_at(&mut self, payload: &HookPayload, now: i64) -> Option<Session> {
        let event = payload.event();
        let id = payload.session_id.as_str();

        match event {
            HookEvent::Ping => None,
            HookEvent::SessionEnd => {
                if self.sessions.shift_remove(id).is_some() {
                    debug!(session_id = id, "session ended");
                }
                None
            }
            HookEvent::Unrecognized => {
                if let Some(existing) = self.sessions.get(id) {
                    return Some(existing.clone());
                }
                let session = Session::new(
                    id,
                    SessionStatus::Waiting,
                    payload.non_empty_cwd(),
                    payload.hook_event_name.as_str(),
                    now,
                );
                debug!(session_id = id, event = %payload.hook_event_name, "session created by unrecognized event");
                let _ = self.sessions.insert(id.to_owned(), session.clone());
                Some(session)
            }
            HookEvent::SessionStart
            | HookEvent::UserPromptSubmit
            | HookEvent::Stop
            | HookEvent::PreToolUse => {
                let (status, label) = resolve_transition(event, payload)?;
                Some(self.upsert(payload, status, label, now))
            }
        }
    }

    fn upsert(
        &mut self,
        payload: &HookPayload,
        status: SessionStatus,
        label: &str,
        now: i64,
    ) -> Session {
        let id = payload.session_id.as_str();
        if let Some(existing) = self.sessions.get_mut(id) {
            existing.status = status;
            existing.last_event = label.to_owned();
            existing.updated_at = now.max(existing.started_at);
            if let Some(cwd) = payload.non_empty_cwd() {
                cwd.clone_into(&mut existing.cwd);
            }
            debug!(session_id = id, %status, last_event = label, "session updated");
            return existing.clone();
        }

        let session = Session::new(id, status, payload.non_empty_cwd(), label, now);
        debug!(session_id = id, %status, last_event = label, "session created");
        let _ = self.sessions.insert(id.to_owned(), session.clone());
        session
    }

    /// Point-in-time copy of every record, in creation order.
    pub fn get_all(&self) -> Vec<Session> {
        self.sessions.values().cloned().collect()
    }

    /// Look up one record.
    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// Administrative removal. Returns `true` if a record was deleted.
    pub fn remove(&mut self, session_id: &str) -> bool {
        self.sessions.shift_remove(session_id).is_some()
    }

    /// Evict records idle for longer than `max_idle_ms`, measured now.
    pub fn evict_idle(&mut self, max_idle_ms: u64) -> Vec<String> {
        self.evict_idle_at(max_idle_ms, now_ms())
    }

    /// Evict records with `now - updated_at > max_idle_ms`.
    ///
    /// Returns the removed ids in iteration order.
    pub fn evict_idle_at(&mut self, max_idle_ms: u64, now: i64) -> Vec<String> {
        let max_idle = i64::try_from(max_idle_ms).unwrap_or(i64::MAX);
        let mut removed = Vec::new();
        self.sessions.retain(|id, session| {
            if session.idle_ms(now) > max_idle {
                removed.push(id.clone());
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            debug!(count = removed.len(), ids = ?removed, "evicted idle sessions");
        }
        removed
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Status and display label for a table-matched event.
///
/// Tool-use events are labelled with the tool name; interactive tools force
/// `Waiting`.
fn resolve_transition(event: HookEvent, payload: &HookPayload) -> Option<(SessionStatus, &str)> {
    let status = event.table_status()?;
    if event != HookEvent::PreToolUse {
        return Some((status, payload.hook_event_name.as_str()));
    }
    let label = payload
        .tool_name
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(payload.hook_event_name.as_str());
    if payload.is_interactive_tool() {
        Some((SessionStatus::Waiting, label))
    } else {
        Some((status, label))
    }
}
