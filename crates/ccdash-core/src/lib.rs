//! # ccdash-core
//!
//! Foundation types for the session dashboard.
//!
//! - [`Session`] records and their [`SessionStatus`] lifecycle phase
//! - [`HookPayload`] decoding and [`HookEvent`] classification
//! - [`SessionStore`]: the authoritative in-memory model and its transition rules
//! - [`logging::init_subscriber`] for the `tracing` subscriber

#![deny(unsafe_code)]

pub mod errors;
pub mod event;
pub mod logging;
pub mod session;
pub mod store;

pub use errors::PayloadError;
pub use event::{HookEvent, HookPayload, INTERACTIVE_TOOLS};
pub use session::{Session, SessionStatus, now_ms};
pub use store::SessionStore;
