//! The session store and its subscriber registry behind one lock.
//!
//! Every operation that mutates the store publishes while still holding
//! the lock, so subscribers see snapshots in mutation order. Subscribing
//! encodes `init` and registers under the same lock, so no update can
//! slip between the two.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use ccdash_core::{HookPayload, Session, SessionStore};
use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::frame::Frame;
use super::subscriber::{Delivery, Subscriber};
use crate::errors::ServerError;
use crate::shutdown::ControlSignal;

struct HubInner {
    store: SessionStore,
    subscribers: HashMap<String, Arc<Subscriber>>,
    closed: bool,
}

impl HubInner {
    /// Encode the current snapshot and push it to every subscriber.
    fn publish(&mut self) {
        match Frame::update(&self.store.get_all()) {
            Ok(frame) => self.fan_out(&frame),
            Err(e) => warn!(error = %e, "failed to encode snapshot"),
        }
    }

    /// Deliver `frame` to each subscriber. Subscribers whose stream is gone
    /// or whose buffer is exhausted are deregistered; dropping the sender
    /// ends their stream and the client resubscribes for a fresh `init`.
    fn fan_out(&mut self, frame: &Frame) {
        let recipients = self.subscribers.len();
        self.subscribers.retain(|id, sub| match sub.send(frame.clone()) {
            Delivery::Sent => true,
            Delivery::Lagging => {
                warn!(subscriber = %id, "subscriber lagging, disconnecting");
                false
            }
            Delivery::Closed => {
                debug!(subscriber = %id, "subscriber gone");
                false
            }
        });
        debug!(
            label = frame.label(),
            recipients,
            remaining = self.subscribers.len(),
            "published frame"
        );
    }

    /// Deregister everyone, sending `frame` first if given.
    fn drain(&mut self, frame: Option<&Frame>) -> usize {
        let subscribers: Vec<_> = self.subscribers.drain().collect();
        if let Some(frame) = frame {
            for (id, sub) in &subscribers {
                if sub.send(frame.clone()) != Delivery::Sent {
                    debug!(subscriber = %id, label = frame.label(), "terminal frame not delivered");
                }
            }
        }
        subscribers.len()
    }
}

/// Owns the [`SessionStore`] and fans snapshots out to SSE subscribers.
pub struct BroadcastHub {
    inner: Mutex<HubInner>,
    buffer: usize,
}

impl BroadcastHub {
    /// Create a hub whose subscribers buffer up to `buffer` snapshots.
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Mutex::new(HubInner {
                store: SessionStore::new(),
                subscribers: HashMap::new(),
                closed: false,
            }),
            buffer: buffer.max(1),
        }
    }

    /// Apply a hook event, then publish the snapshot whether or not
    /// anything changed.
    pub fn ingest(&self, payload: &HookPayload) -> Option<Session> {
        let mut inner = self.inner.lock();
        let session = inner.store.apply_event(payload);
        inner.publish();
        session
    }

    /// Point-in-time snapshot of every session.
    pub fn snapshot(&self) -> Vec<Session> {
        self.inner.lock().store.get_all()
    }

    /// Remove a session by ID. Publishes only if a record was removed.
    pub fn remove_session(&self, session_id: &str) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.store.remove(session_id);
        if removed {
            inner.publish();
        }
        removed
    }

    /// Evict idle sessions. Publishes only if something was evicted.
    pub fn evict_idle(&self, max_idle_ms: u64) -> Vec<String> {
        let mut inner = self.inner.lock();
        let removed = inner.store.evict_idle(max_idle_ms);
        if !removed.is_empty() {
            inner.publish();
        }
        removed
    }

    /// Register a subscriber. Its first frame is always `init`.
    pub fn subscribe(self: &Arc<Self>) -> Result<Subscription, ServerError> {
        let mut inner = self.inner.lock();
        if inner.closed {
            return Err(ServerError::Closed);
        }

        let init = Frame::init(&inner.store.get_all())?;
        let id = format!("sub_{}", Uuid::now_v7());
        let (subscriber, rx) = Subscriber::channel(self.buffer);
        let _ = subscriber.send(init);
        let _ = inner.subscribers.insert(id.clone(), Arc::new(subscriber));
        debug!(subscriber = %id, total = inner.subscribers.len(), "subscriber registered");

        Ok(Subscription {
            id,
            rx,
            hub: Arc::clone(self),
        })
    }

    /// Deregister a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, subscriber_id: &str) -> bool {
        let removed = self.inner.lock().subscribers.remove(subscriber_id).is_some();
        if removed {
            debug!(subscriber = %subscriber_id, "subscriber deregistered");
        }
        removed
    }

    /// Send `signal` to every subscriber and deregister them all.
    ///
    /// The hub stays open: new subscribers may join afterwards.
    pub fn terminate(&self, signal: ControlSignal) -> usize {
        let notified = self.inner.lock().drain(Some(&Frame::Terminal(signal)));
        info!(%signal, notified, "terminal frame sent to subscribers");
        notified
    }

    /// End every subscriber stream and refuse new subscribers.
    pub fn close(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.drain(None)
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Number of tracked sessions.
    pub fn session_count(&self) -> usize {
        self.inner.lock().store.len()
    }
}

/// Receiving side of a subscription.
///
/// Dropping it deregisters the subscriber, which is how a client
/// disconnect is noticed.
pub struct Subscription {
    id: String,
    rx: mpsc::Receiver<Frame>,
    hub: Arc<BroadcastHub>,
}

impl Subscription {
    /// Subscriber ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the next frame. `None` once the hub has let go.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = Frame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Frame>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.hub.unsubscribe(&self.id);
    }
}
