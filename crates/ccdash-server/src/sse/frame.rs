//! Push frames and their text-event-stream encoding.

use std::sync::Arc;

use axum::response::sse::Event;
use ccdash_core::Session;

use crate::shutdown::ControlSignal;

/// Data line carried by terminal frames. Browsers drop SSE events with an
/// empty data buffer, so terminal frames carry a JSON `null`.
pub const TERMINAL_DATA: &str = "null";

/// One message on a subscriber's stream.
///
/// Snapshot JSON is encoded once per publish and shared across
/// subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Snapshot sent once, right after subscribing.
    Init(Arc<str>),
    /// Snapshot sent after every mutation.
    Update(Arc<str>),
    /// Last frame before the stream closes.
    Terminal(ControlSignal),
}

impl Frame {
    /// Encode an `init` frame.
    pub fn init(sessions: &[Session]) -> serde_json::Result<Self> {
        Ok(Self::Init(encode(sessions)?))
    }

    /// Encode an `update` frame.
    pub fn update(sessions: &[Session]) -> serde_json::Result<Self> {
        Ok(Self::Update(encode(sessions)?))
    }

    /// SSE `event:` label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Update(_) => "update",
            Self::Terminal(signal) => signal.label(),
        }
    }

    /// SSE `data:` payload.
    pub fn data(&self) -> &str {
        match self {
            Self::Init(json) | Self::Update(json) => json,
            Self::Terminal(_) => TERMINAL_DATA,
        }
    }

    /// Whether the stream ends after this frame.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    /// Convert to an axum SSE event.
    pub fn to_event(&self) -> Event {
        Event::default().event(self.label()).data(self.data())
    }
}

fn encode(sessions: &[Session]) -> serde_json::Result<Arc<str>> {
    serde_json::to_string(sessions).map(Arc::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccdash_core::SessionStatus;

    #[test]
    fn init_of_empty_snapshot() {
        let frame = Frame::init(&[]).unwrap();
        assert_eq!(frame.label(), "init");
        assert_eq!(frame.data(), "[]");
        assert!(!frame.is_terminal());
    }

    #[test]
    fn update_carries_camel_case_snapshot() {
        let session = Session::new("s1", SessionStatus::Running, Some("/w"), "Bash", 1_000);
        let frame = Frame::update(&[session]).unwrap();
        assert_eq!(frame.label(), "update");
        let parsed: serde_json::Value = serde_json::from_str(frame.data()).unwrap();
        assert_eq!(parsed[0]["sessionId"], "s1");
        assert_eq!(parsed[0]["status"], "running");
        assert_eq!(parsed[0]["lastEvent"], "Bash");
    }

    #[test]
    fn terminal_frames() {
        let frame = Frame::Terminal(ControlSignal::Shutdown);
        assert_eq!(frame.label(), "shutdown");
        assert_eq!(frame.data(), TERMINAL_DATA);
        assert!(frame.is_terminal());
        assert_eq!(Frame::Terminal(ControlSignal::Restart).label(), "restart");
    }

    #[test]
    fn cloned_frames_share_the_encoding() {
        let frame = Frame::update(&[]).unwrap();
        let copy = frame.clone();
        match (&frame, &copy) {
            (Frame::Update(a), Frame::Update(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => unreachable!(),
        }
    }
}
