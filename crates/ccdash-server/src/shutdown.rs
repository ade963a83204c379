//! Shutdown coordination and owner callbacks.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default timeout for graceful shutdown before tasks are aborted.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between the control fan-out and the owner callback, so the
/// triggering HTTP response can flush first.
pub const FLUSH_DELAY: Duration = Duration::from_millis(10);

/// Owner-supplied lifecycle callback.
pub type OwnerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Terminal control signal sent to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlSignal {
    /// The server is going away.
    Shutdown,
    /// The server is being relaunched; reconnect shortly.
    Restart,
}

impl ControlSignal {
    /// SSE event label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::Restart => "restart",
        }
    }
}

impl std::fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Coordinates background tasks and owner callbacks for one server.
///
/// Each callback is stored as an `Option` and taken on first use, so it
/// runs at most once no matter how many requests race for it.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    on_shutdown: Mutex<Option<OwnerCallback>>,
    on_restart: Mutex<Option<OwnerCallback>>,
}

impl ShutdownCoordinator {
    /// Create a coordinator with no callbacks.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
            on_shutdown: Mutex::new(None),
            on_restart: Mutex::new(None),
        }
    }

    /// Get a clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Install (or replace) the callback for `signal`.
    pub fn set_callback(&self, signal: ControlSignal, callback: OwnerCallback) {
        *self.slot(signal).lock() = Some(callback);
    }

    /// Take the callback for `signal`. Returns `None` after the first call.
    pub fn take_callback(&self, signal: ControlSignal) -> Option<OwnerCallback> {
        self.slot(signal).lock().take()
    }

    /// Run the callback for `signal` after [`FLUSH_DELAY`], at most once.
    ///
    /// Returns `true` if a callback was scheduled by this call.
    pub fn schedule_callback(&self, signal: ControlSignal) -> bool {
        let Some(callback) = self.take_callback(signal) else {
            debug!(%signal, "no pending owner callback");
            return false;
        };
        let _ = tokio::spawn(async move {
            tokio::time::sleep(FLUSH_DELAY).await;
            info!(%signal, "invoking owner callback");
            callback();
        });
        true
    }

    /// Track a background task so teardown can await it.
    pub fn track(&self, handle: JoinHandle<()>) {
        self.tasks.lock().push(handle);
    }

    /// Number of tracked tasks not yet drained.
    pub fn task_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Cancel the token and wait for every tracked task.
    ///
    /// Tasks still running after `timeout` are aborted. Calling this again
    /// only cancels (already cancelled) and returns immediately.
    pub async fn graceful_shutdown(&self, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);
        let handles = std::mem::take(&mut *self.tasks.lock());

        self.token.cancel();
        if handles.is_empty() {
            return;
        }
        info!(
            task_count = handles.len(),
            ?timeout,
            "waiting for tasks to complete"
        );

        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        let drain = futures::future::join_all(handles);

        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!("shutdown timed out after {timeout:?}, aborting remaining tasks");
            for abort in aborts {
                abort.abort();
            }
        }
    }

    fn slot(&self, signal: ControlSignal) -> &Mutex<Option<OwnerCallback>> {
        match signal {
            ControlSignal::Shutdown => &self.on_shutdown,
            ControlSignal::Restart => &self.on_restart,
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
