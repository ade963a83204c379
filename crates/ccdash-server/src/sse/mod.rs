//! SSE push channel: frames, subscribers, and the broadcast hub.

pub mod frame;
pub mod hub;
pub mod subscriber;
