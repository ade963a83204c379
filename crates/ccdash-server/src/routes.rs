//! HTTP handlers.

use std::convert::Infallible;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use ccdash_core::{HookPayload, Session};
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::dashboard::render_dashboard_document;
use crate::errors::ApiError;
use crate::health::{self, HealthResponse};
use crate::server::AppState;
use crate::shutdown::ControlSignal;

/// `{"ok": true}` acknowledgement body.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Ack {
    /// Always `true`.
    pub ok: bool,
}

impl Ack {
    const OK: Self = Self { ok: true };
}

/// GET /
pub async fn dashboard() -> Html<&'static str> {
    Html(render_dashboard_document())
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.hub.subscriber_count(),
        state.hub.session_count(),
    ))
}

/// POST /api/hook
#[instrument(skip_all)]
pub async fn ingest(State(state): State<AppState>, body: Bytes) -> Result<Json<Ack>, ApiError> {
    let payload = HookPayload::from_slice(&body).inspect_err(|e| {
        debug!(error = %e, bytes = body.len(), "rejected hook payload");
    })?;
    let session = state.hub.ingest(&payload);
    debug!(
        session_id = %payload.session_id,
        event = %payload.hook_event_name,
        status = ?session.as_ref().map(|s| s.status),
        "hook ingested"
    );
    Ok(Json(Ack::OK))
}

/// GET /api/sessions
pub async fn sessions(State(state): State<AppState>) -> Json<Vec<Session>> {
    Json(state.hub.snapshot())
}

/// DELETE /api/sessions/{id}
#[instrument(skip_all, fields(session_id = %session_id))]
pub async fn remove_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Ack>, ApiError> {
    if state.hub.remove_session(&session_id) {
        info!("session removed");
        Ok(Json(Ack::OK))
    } else {
        Err(ApiError::NotFound(format!("Session not found: {session_id}")))
    }
}

/// GET /api/events
pub async fn events(State(state): State<AppState>) -> Result<Response, ApiError> {
    let subscription = state.hub.subscribe()?;
    info!(subscriber = subscription.id(), "subscriber connected");

    let stream = subscription.map(|frame| Ok::<_, Infallible>(frame.to_event()));
    let sse = Sse::new(stream);
    Ok(match state.keep_alive {
        Some(interval) => sse
            .keep_alive(KeepAlive::new().interval(interval))
            .into_response(),
        None => sse.into_response(),
    })
}

/// POST /api/shutdown
pub async fn shutdown(State(state): State<AppState>) -> Json<Ack> {
    state.signal(ControlSignal::Shutdown);
    Json(Ack::OK)
}

/// POST /api/restart
pub async fn restart(State(state): State<AppState>) -> Json<Ack> {
    state.signal(ControlSignal::Restart);
    Json(Ack::OK)
}

/// Anything that matches no route or method.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".into())
}
