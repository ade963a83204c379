//! # ccdash-server
//!
//! Axum HTTP + SSE server that turns hook callbacks into live session
//! snapshots.
//!
//! - `POST /api/hook` feeds the [`ccdash_core::SessionStore`]
//! - Every mutation re-publishes the full snapshot to all SSE subscribers
//! - A background reaper evicts idle sessions
//! - Shutdown and restart fan out a terminal frame, then hand off to the owner

#![deny(unsafe_code)]

pub mod dashboard;
pub mod errors;
pub mod health;
pub mod reaper;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod sse;

pub use errors::{ApiError, ServerError};
pub use server::DashboardServer;
pub use shutdown::ControlSignal;
