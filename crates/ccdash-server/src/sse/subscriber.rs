//! A single SSE subscriber.
//!
//! Each channel holds one slot more than its snapshot buffer. Snapshots may
//! never take that last slot, so a terminal frame always fits.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::frame::Frame;

/// Slots kept free for the terminal frame.
const TERMINAL_RESERVE: usize = 1;

/// Result of a non-blocking delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued on the subscriber's channel.
    Sent,
    /// Snapshot buffer exhausted. The subscriber can no longer be kept
    /// current and must be deregistered.
    Lagging,
    /// The subscriber's stream is gone.
    Closed,
}

/// Registry-side handle of one subscriber.
pub struct Subscriber {
    tx: mpsc::Sender<Frame>,
}

impl Subscriber {
    /// Create a subscriber with room for `buffer` snapshots plus the
    /// terminal frame.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(buffer.max(1) + TERMINAL_RESERVE);
        (Self { tx }, rx)
    }

    /// Queue a frame without waiting.
    pub fn send(&self, frame: Frame) -> Delivery {
        if self.tx.is_closed() {
            return Delivery::Closed;
        }
        if !frame.is_terminal() && self.tx.capacity() <= TERMINAL_RESERVE {
            return Delivery::Lagging;
        }
        match self.tx.try_send(frame) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => Delivery::Lagging,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::ControlSignal;

    #[tokio::test]
    async fn send_success() {
        let (sub, mut rx) = Subscriber::channel(4);
        assert_eq!(sub.send(Frame::update(&[]).unwrap()), Delivery::Sent);
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.label(), "update");
    }

    #[test]
    fn full_snapshot_buffer_reports_lagging() {
        let (sub, _rx) = Subscriber::channel(2);
        assert_eq!(sub.send(Frame::init(&[]).unwrap()), Delivery::Sent);
        assert_eq!(sub.send(Frame::update(&[]).unwrap()), Delivery::Sent);
        assert_eq!(sub.send(Frame::update(&[]).unwrap()), Delivery::Lagging);
    }

    #[tokio::test]
    async fn terminal_frame_fits_behind_a_full_buffer() {
        let (sub, mut rx) = Subscriber::channel(1);
        assert_eq!(sub.send(Frame::init(&[]).unwrap()), Delivery::Sent);
        assert_eq!(sub.send(Frame::update(&[]).unwrap()), Delivery::Lagging);
        assert_eq!(sub.send(Frame::Terminal(ControlSignal::Shutdown)), Delivery::Sent);

        drop(sub);
        assert_eq!(rx.recv().await.unwrap().label(), "init");
        assert_eq!(rx.recv().await, Some(Frame::Terminal(ControlSignal::Shutdown)));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn receiving_frees_snapshot_slots() {
        let (sub, mut rx) = Subscriber::channel(1);
        assert_eq!(sub.send(Frame::init(&[]).unwrap()), Delivery::Sent);
        let _ = rx.recv().await.unwrap();
        assert_eq!(sub.send(Frame::update(&[]).unwrap()), Delivery::Sent);
    }

    #[test]
    fn closed_channel_reports_closed() {
        let (sub, rx) = Subscriber::channel(4);
        drop(rx);
        assert_eq!(sub.send(Frame::Terminal(ControlSignal::Shutdown)), Delivery::Closed);
        assert_eq!(sub.send(Frame::update(&[]).unwrap()), Delivery::Closed);
    }
}
