//! `DashboardServer`: Axum HTTP + SSE server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::routing::{delete, get, post};
use ccdash_settings::DashboardSettings;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::errors::ServerError;
use crate::reaper;
use crate::routes;
use crate::shutdown::{ControlSignal, ShutdownCoordinator};
use crate::sse::hub::BroadcastHub;

/// Upper bound on how long `close` waits for background tasks.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session store and subscriber registry.
    pub hub: Arc<BroadcastHub>,
    /// Background tasks and owner callbacks.
    pub coordinator: Arc<ShutdownCoordinator>,
    /// When the server was created.
    pub start_time: Instant,
    /// SSE keep-alive period.
    pub keep_alive: Option<Duration>,
}

impl AppState {
    /// Fan out a terminal frame, then schedule the owner callback.
    pub fn signal(&self, signal: ControlSignal) {
        let _ = self.hub.terminate(signal);
        let _ = self.coordinator.schedule_callback(signal);
    }
}

/// The dashboard server.
pub struct DashboardServer {
    settings: DashboardSettings,
    hub: Arc<BroadcastHub>,
    coordinator: Arc<ShutdownCoordinator>,
    start_time: Instant,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl DashboardServer {
    /// Create a server. Nothing is bound until [`listen`](Self::listen).
    pub fn new(settings: DashboardSettings) -> Self {
        let hub = Arc::new(BroadcastHub::new(settings.subscriber_buffer));
        Self {
            settings,
            hub,
            coordinator: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            local_addr: Mutex::new(None),
        }
    }

    /// Callback invoked once after a shutdown request.
    #[must_use]
    pub fn on_shutdown(self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.coordinator
            .set_callback(ControlSignal::Shutdown, Box::new(callback));
        self
    }

    /// Callback invoked once after a restart request.
    #[must_use]
    pub fn on_restart(self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.coordinator
            .set_callback(ControlSignal::Restart, Box::new(callback));
        self
    }

    fn state(&self) -> AppState {
        AppState {
            hub: self.hub.clone(),
            coordinator: self.coordinator.clone(),
            start_time: self.start_time,
            keep_alive: self.settings.keep_alive(),
        }
    }

    /// Build the Axum router with all routes.
    ///
    /// Wrong methods on known paths fall through to the same 404 as
    /// unknown paths.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(routes::dashboard).fallback(routes::not_found))
            .route("/health", get(routes::health).fallback(routes::not_found))
            .route("/api/hook", post(routes::ingest).fallback(routes::not_found))
            .route("/api/sessions", get(routes::sessions).fallback(routes::not_found))
            .route(
                "/api/sessions/{id}",
                delete(routes::remove_session).fallback(routes::not_found),
            )
            .route("/api/events", get(routes::events).fallback(routes::not_found))
            .route("/api/shutdown", post(routes::shutdown).fallback(routes::not_found))
            .route("/api/restart", post(routes::restart).fallback(routes::not_found))
            .fallback(routes::not_found)
            .with_state(self.state())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind, then spawn the HTTP task and the idle reaper.
    ///
    /// Returns the bound address (useful with port `0`).
    pub async fn listen(&self) -> Result<SocketAddr, ServerError> {
        if let Some(addr) = *self.local_addr.lock() {
            return Err(ServerError::AlreadyListening(addr));
        }

        let addr = self.settings.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        *self.local_addr.lock() = Some(local_addr);

        let router = self.router();
        let token = self.coordinator.token();
        self.coordinator.track(tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(token.cancelled_owned())
                .await;
            if let Err(e) = result {
                warn!(error = %e, "http server exited with error");
            }
        }));

        self.coordinator.track(reaper::spawn_reaper(
            self.hub.clone(),
            self.settings.idle_timeout(),
            self.settings.reaper_interval(),
            self.coordinator.token(),
        ));

        info!(
            %local_addr,
            idle_timeout_ms = self.settings.idle_timeout_ms,
            reaper_interval_ms = self.settings.reaper_interval_ms,
            "dashboard listening"
        );
        Ok(local_addr)
    }

    /// Address bound by [`listen`](Self::listen), if any.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Fan out `signal` and schedule its owner callback, the same as the
    /// HTTP control endpoints.
    pub fn signal(&self, signal: ControlSignal) {
        self.state().signal(signal);
    }

    /// End every subscriber stream, stop accepting connections, and wait
    /// for the HTTP task and the reaper. Safe to call more than once.
    pub async fn close(&self) {
        let ended = self.hub.close();
        info!(subscribers = ended, "closing dashboard server");
        self.coordinator.graceful_shutdown(Some(CLOSE_TIMEOUT)).await;
    }

    /// Session store and subscriber registry.
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// Shutdown coordinator.
    pub fn coordinator(&self) -> &Arc<ShutdownCoordinator> {
        &self.coordinator
    }
}
