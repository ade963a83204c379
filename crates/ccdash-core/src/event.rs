//! Hook payloads and event classification.
//!
//! A hook payload is the JSON body an agent hook runner POSTs for every
//! lifecycle event. Only four fields matter here; anything else in the body
//! is ignored.

use serde::Deserialize;

use crate::errors::PayloadError;
use crate::session::SessionStatus;

/// Tools that block on the user. A `PreToolUse` for one of these forces
/// the session into [`SessionStatus::Waiting`].
pub const INTERACTIVE_TOOLS: &[&str] = &["AskUserQuestion", "ExitPlanMode"];

/// Classified hook event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// A session was opened.
    SessionStart,
    /// The user submitted a prompt.
    UserPromptSubmit,
    /// The agent stopped at the end of its turn.
    Stop,
    /// A tool is about to run.
    PreToolUse,
    /// The session was closed. Removes the record.
    SessionEnd,
    /// Liveness probe. Never touches state.
    Ping,
    /// Anything else.
    Unrecognized,
}

impl HookEvent {
    /// Classify a raw `hook_event_name`.
    pub fn parse(name: &str) -> Self {
        match name {
            "SessionStart" => Self::SessionStart,
            "UserPromptSubmit" => Self::UserPromptSubmit,
            "Stop" => Self::Stop,
            "PreToolUse" => Self::PreToolUse,
            "SessionEnd" => Self::SessionEnd,
            "Ping" => Self::Ping,
            _ => Self::Unrecognized,
        }
    }

    /// Status from the event table, before any tool refinement.
    ///
    /// `None` for events outside the table (termination, probe, unrecognized).
    pub fn table_status(self) -> Option<SessionStatus> {
        match self {
            Self::SessionStart => Some(SessionStatus::Waiting),
            Self::UserPromptSubmit | Self::PreToolUse => Some(SessionStatus::Running),
            Self::Stop => Some(SessionStatus::Done),
            Self::SessionEnd | Self::Ping | Self::Unrecognized => None,
        }
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionStart => write!(f, "SessionStart"),
            Self::UserPromptSubmit => write!(f, "UserPromptSubmit"),
            Self::Stop => write!(f, "Stop"),
            Self::PreToolUse => write!(f, "PreToolUse"),
            Self::SessionEnd => write!(f, "SessionEnd"),
            Self::Ping => write!(f, "Ping"),
            Self::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

/// Wire shape before validation. Mandatory fields are optional here so a
/// missing field can be reported as such instead of as a parse error.
#[derive(Deserialize)]
struct RawHookPayload {
    session_id: Option<String>,
    hook_event_name: Option<String>,
    cwd: Option<String>,
    tool_name: Option<String>,
}

/// A validated hook payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookPayload {
    /// Session the event belongs to. Never empty.
    pub session_id: String,
    /// Raw event name. Never empty.
    pub hook_event_name: String,
    /// Working directory reported by the hook runner.
    pub cwd: Option<String>,
    /// Tool name for tool-use events.
    pub tool_name: Option<String>,
}

impl HookPayload {
    /// Build a payload with only the mandatory fields.
    pub fn new(session_id: impl Into<String>, hook_event_name: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            hook_event_name: hook_event_name.into(),
            cwd: None,
            tool_name: None,
        }
    }

    /// Attach a working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Attach a tool name.
    #[must_use]
    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    /// Decode and validate a request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(PayloadError::InvalidJson)?;
        let raw: RawHookPayload =
            serde_json::from_value(value).map_err(PayloadError::InvalidShape)?;

        let session_id = raw
            .session_id
            .filter(|s| !s.is_empty())
            .ok_or(PayloadError::MissingField("session_id"))?;
        let hook_event_name = raw
            .hook_event_name
            .filter(|s| !s.is_empty())
            .ok_or(PayloadError::MissingField("hook_event_name"))?;

        Ok(Self {
            session_id,
            hook_event_name,
            cwd: raw.cwd,
            tool_name: raw.tool_name,
        })
    }

    /// Classified event.
    pub fn event(&self) -> HookEvent {
        HookEvent::parse(&self.hook_event_name)
    }

    /// Working directory if one was supplied and is non-empty.
    pub fn non_empty_cwd(&self) -> Option<&str> {
        self.cwd.as_deref().filter(|c| !c.is_empty())
    }

    /// Whether the tool name is in [`INTERACTIVE_TOOLS`].
    pub fn is_interactive_tool(&self) -> bool {
        self.tool_name
            .as_deref()
            .is_some_and(|t| INTERACTIVE_TOOLS.contains(&t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parse_known_names() {
        assert_eq!(HookEvent::parse("SessionStart"), HookEvent::SessionStart);
        assert_eq!(HookEvent::parse("UserPromptSubmit"), HookEvent::UserPromptSubmit);
        assert_eq!(HookEvent::parse("Stop"), HookEvent::Stop);
        assert_eq!(HookEvent::parse("PreToolUse"), HookEvent::PreToolUse);
        assert_eq!(HookEvent::parse("SessionEnd"), HookEvent::SessionEnd);
        assert_eq!(HookEvent::parse("Ping"), HookEvent::Ping);
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert_eq!(HookEvent::parse("stop"), HookEvent::Unrecognized);
        assert_eq!(HookEvent::parse("Notification"), HookEvent::Unrecognized);
    }

    #[test]
    fn table_covers_only_lifecycle_events() {
        assert_eq!(HookEvent::SessionStart.table_status(), Some(SessionStatus::Waiting));
        assert_eq!(HookEvent::UserPromptSubmit.table_status(), Some(SessionStatus::Running));
        assert_eq!(HookEvent::PreToolUse.table_status(), Some(SessionStatus::Running));
        assert_eq!(HookEvent::Stop.table_status(), Some(SessionStatus::Done));
        assert!(HookEvent::SessionEnd.table_status().is_none());
        assert!(HookEvent::Ping.table_status().is_none());
        assert!(HookEvent::Unrecognized.table_status().is_none());
    }

    #[test]
    fn display_round_trips_known_names() {
        for event in [
            HookEvent::SessionStart,
            HookEvent::UserPromptSubmit,
            HookEvent::Stop,
            HookEvent::PreToolUse,
            HookEvent::SessionEnd,
            HookEvent::Ping,
        ] {
            assert_eq!(HookEvent::parse(&event.to_string()), event);
        }
    }

    #[test]
    fn decode_full_payload_ignores_extra_fields() {
        let body = br#"{"session_id":"s1","hook_event_name":"PreToolUse","cwd":"/x","tool_name":"Bash","transcript_path":"/t","tool_input":{"command":"ls"}}"#;
        let payload = HookPayload::from_slice(body).unwrap();
        assert_eq!(payload.session_id, "s1");
        assert_eq!(payload.event(), HookEvent::PreToolUse);
        assert_eq!(payload.cwd.as_deref(), Some("/x"));
        assert_eq!(payload.tool_name.as_deref(), Some("Bash"));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let err = HookPayload::from_slice(b"not json").unwrap_err();
        assert_matches!(err, PayloadError::InvalidJson(_));
    }

    #[test]
    fn decode_rejects_non_object() {
        let err = HookPayload::from_slice(b"[1,2,3]").unwrap_err();
        assert_matches!(err, PayloadError::InvalidShape(_));
    }

    #[test]
    fn decode_rejects_wrong_field_type() {
        let err = HookPayload::from_slice(br#"{"session_id":7,"hook_event_name":"Stop"}"#)
            .unwrap_err();
        assert_matches!(err, PayloadError::InvalidShape(_));
    }

    #[test]
    fn decode_rejects_non_string_cwd() {
        let err = HookPayload::from_slice(
            br#"{"session_id":"s","hook_event_name":"Stop","cwd":["/x"]}"#,
        )
        .unwrap_err();
        assert_matches!(err, PayloadError::InvalidShape(_));
    }

    #[test]
    fn decode_rejects_missing_event_name() {
        let err = HookPayload::from_slice(br#"{"session_id":"x"}"#).unwrap_err();
        assert_eq!(err.missing_field(), Some("hook_event_name"));
    }

    #[test]
    fn decode_rejects_empty_session_id() {
        let err = HookPayload::from_slice(br#"{"session_id":"","hook_event_name":"Stop"}"#)
            .unwrap_err();
        assert_eq!(err.missing_field(), Some("session_id"));
    }

    #[test]
    fn null_optional_fields_are_none() {
        let payload = HookPayload::from_slice(
            br#"{"session_id":"s","hook_event_name":"Stop","cwd":null,"tool_name":null}"#,
        )
        .unwrap();
        assert!(payload.cwd.is_none());
        assert!(payload.tool_name.is_none());
    }

    #[test]
    fn empty_cwd_is_not_reported() {
        let payload = HookPayload::new("s", "Stop").with_cwd("");
        assert!(payload.non_empty_cwd().is_none());
    }

    #[test]
    fn interactive_tool_detection() {
        assert!(HookPayload::new("s", "PreToolUse").with_tool("AskUserQuestion").is_interactive_tool());
        assert!(HookPayload::new("s", "PreToolUse").with_tool("ExitPlanMode").is_interactive_tool());
        assert!(!HookPayload::new("s", "PreToolUse").with_tool("Bash").is_interactive_tool());
        assert!(!HookPayload::new("s", "PreToolUse").is_interactive_tool());
    }
}
