//! Shared, set-once shutdown signal.
//!
//! Every producer (either forwarder, or an external interrupt) calls
//! [`Shutdown::trigger`]. The first call wins and records its reason; later
//! calls are no-ops. The signal never reverts.

use crate::forwarder::{Direction, StopCause};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// Why the bridge is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// A forwarder stopped on its own.
    Forwarder {
        direction: Direction,
        cause: StopCause,
    },
    /// An operator asked the process to stop (Ctrl-C, SIGTERM).
    Interrupted,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Forwarder { direction, cause } => write!(f, "{}: {}", direction, cause),
            ShutdownReason::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Cloneable handle to the shutdown signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    state: Arc<watch::Sender<Option<ShutdownReason>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// Sets the signal. Returns `true` only for the call that set it.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        let first = self.state.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(reason);
            true
        });

        if first {
            tracing::debug!("Shutdown triggered ({})", reason);
        }
        first
    }

    /// Returns whether the signal has been set. Never blocks.
    pub fn is_triggered(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Returns the reason recorded by the first trigger.
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.state.borrow()
    }

    /// Waits until the signal is set and returns the first reason.
    ///
    /// Returns immediately if it is already set. Cancel safe.
    pub async fn wait(&self) -> ShutdownReason {
        let mut rx = self.state.subscribe();
        loop {
            if let Some(reason) = *rx.borrow_and_update() {
                return reason;
            }
            if rx.changed().await.is_err() {
                // The sender lives in `self`, so this cannot happen.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn closed(direction: Direction) -> ShutdownReason {
        ShutdownReason::Forwarder {
            direction,
            cause: StopCause::SourceClosed,
        }
    }

    #[test]
    fn test_starts_unset() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
        assert_eq!(shutdown.reason(), None);
    }

    #[test]
    fn test_first_trigger_wins() {
        let shutdown = Shutdown::new();
        let other = shutdown.clone();

        assert!(shutdown.trigger(closed(Direction::HostToServer)));
        assert!(!other.trigger(closed(Direction::ServerToHost)));
        assert!(!other.trigger(ShutdownReason::Interrupted));

        assert!(other.is_triggered());
        assert_eq!(other.reason(), Some(closed(Direction::HostToServer)));
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns_immediately() {
        let shutdown = Shutdown::new();
        shutdown.trigger(ShutdownReason::Interrupted);
        assert_eq!(shutdown.wait().await, ShutdownReason::Interrupted);
    }

    #[tokio::test]
    async fn test_waiter_unblocks_once_on_repeated_triggers() {
        let shutdown = Shutdown::new();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.wait().await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        let producers: Vec<_> = [
            closed(Direction::ServerToHost),
            closed(Direction::HostToServer),
            ShutdownReason::Interrupted,
        ]
        .into_iter()
        .map(|reason| {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.trigger(reason) })
        })
        .collect();

        let mut winners = 0;
        for producer in producers {
            if producer.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);

        let reason = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Some(reason), shutdown.reason());
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(
            closed(Direction::HostToServer).to_string(),
            "host->server: source closed"
        );
        assert_eq!(ShutdownReason::Interrupted.to_string(), "interrupted");
    }
}
