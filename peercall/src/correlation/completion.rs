//! Settle-once completion handle for a pending request.
//!
//! A request is represented by two halves:
//!
//! ```text
//!   Completion (kept in the pending table)  ──settle──▶  Reply (held by the caller)
//! ```
//!
//! The completion side settles at most once. The value is buffered in a
//! `oneshot` channel, so a reply that is awaited only after settlement
//! resolves immediately instead of waiting for a wakeup that already happened.

use crate::messaging::Payload;
use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::sync::oneshot;

/// How a request ended, with the value handed to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The expected responder answered.
    Responded(Payload),

    /// The responder sent a failure; the caller gets its fallback.
    Failed {
        /// Description of the remote failure.
        error: String,
        /// Value handed to the caller.
        fallback: Payload,
    },

    /// The deadline passed; the caller gets its fallback.
    TimedOut(Payload),

    /// The engine stopped before anything else happened.
    Released(Payload),
}

impl Outcome {
    /// The payload the caller receives.
    pub fn value(&self) -> &Payload {
        match self {
            Outcome::Responded(value)
            | Outcome::TimedOut(value)
            | Outcome::Released(value)
            | Outcome::Failed {
                fallback: value, ..
            } => value,
        }
    }

    /// Consume into the payload the caller receives.
    pub fn into_value(self) -> Payload {
        match self {
            Outcome::Responded(value)
            | Outcome::TimedOut(value)
            | Outcome::Released(value)
            | Outcome::Failed {
                fallback: value, ..
            } => value,
        }
    }

    /// Check if the responder answered successfully.
    pub fn is_response(&self) -> bool {
        matches!(self, Outcome::Responded(_))
    }
}

/// Settling side of a request.
///
/// # Thread Safety
///
/// Uses `Cell` for the completion flag (single-threaded execution). The
/// sender is moved in and consumed on the first settlement.
pub struct Completion {
    sender: Cell<Option<oneshot::Sender<Outcome>>>,
    settled: Cell<bool>,
}

impl Completion {
    /// Create an unset completion and the reply that observes it.
    ///
    /// `fallback` is what the reply yields if the completion is dropped
    /// without ever settling.
    pub fn new(fallback: Payload) -> (Self, Reply) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            sender: Cell::new(Some(tx)),
            settled: Cell::new(false),
        };
        (completion, Reply::new(rx, fallback))
    }

    /// Check if this completion has settled.
    pub fn is_settled(&self) -> bool {
        self.settled.get()
    }

    /// Settle with an outcome.
    ///
    /// Returns false and changes nothing if already settled. A caller that
    /// dropped its reply is not an error.
    pub fn settle(&self, outcome: Outcome) -> bool {
        if self.settled.replace(true) {
            tracing::warn!("Completion::settle: already settled (double settlement?)");
            return false;
        }

        if let Some(sender) = self.sender.take() {
            if sender.send(outcome).is_err() {
                tracing::debug!("Completion::settle: reply dropped before settlement");
            }
        }
        true
    }
}

/// Future the caller awaits for the value of a request.
///
/// Awaiting yields only the payload: the response value, or the fallback on
/// failure, timeout or release. Use [`Reply::outcome`] to learn which.
pub struct Reply {
    /// `None` once the channel has yielded its outcome or closed.
    rx: Option<oneshot::Receiver<Outcome>>,

    /// Outcome taken by [`Reply::try_outcome`], handed out again on await.
    settled: Option<Outcome>,

    fallback: Payload,
}

impl Reply {
    fn new(rx: oneshot::Receiver<Outcome>, fallback: Payload) -> Self {
        Self {
            rx: Some(rx),
            settled: None,
            fallback,
        }
    }

    /// Wait for the full outcome of the request.
    pub async fn outcome(mut self) -> Outcome {
        std::future::poll_fn(|cx| self.poll_outcome(cx)).await
    }

    /// Return the outcome if the request already settled, without waiting.
    ///
    /// A completion dropped without settling counts as released. The reply
    /// can still be awaited afterwards and yields the same outcome.
    pub fn try_outcome(&mut self) -> Option<Outcome> {
        if self.settled.is_none() {
            let rx = self.rx.as_mut()?;
            let outcome = match rx.try_recv() {
                Ok(outcome) => outcome,
                Err(oneshot::error::TryRecvError::Empty) => return None,
                Err(oneshot::error::TryRecvError::Closed) => {
                    Outcome::Released(self.fallback.clone())
                }
            };
            self.rx = None;
            self.settled = Some(outcome);
        }
        self.settled.clone()
    }

    fn poll_outcome(&mut self, cx: &mut Context<'_>) -> Poll<Outcome> {
        if let Some(outcome) = self.settled.take() {
            return Poll::Ready(outcome);
        }

        let Some(rx) = self.rx.as_mut() else {
            return Poll::Ready(Outcome::Released(self.fallback.clone()));
        };

        let outcome = match ready!(Pin::new(rx).poll(cx)) {
            Ok(outcome) => outcome,
            Err(_) => Outcome::Released(self.fallback.clone()),
        };
        self.rx = None;
        Poll::Ready(outcome)
    }
}

impl Future for Reply {
    type Output = Payload;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().poll_outcome(cx).map(Outcome::into_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_settle_before_await_is_observed() {
        let (completion, reply) = Completion::new(Payload::null());

        assert!(!completion.is_settled());
        assert!(completion.settle(Outcome::Responded(Payload::from(10))));
        assert!(completion.is_settled());

        assert_eq!(reply.await, Payload::from(10));
    }

    #[tokio::test]
    async fn test_settles_only_once() {
        let (completion, reply) = Completion::new(Payload::from(-1));

        assert!(completion.settle(Outcome::TimedOut(Payload::from(-1))));
        assert!(!completion.settle(Outcome::Responded(Payload::from(99))));

        assert_eq!(reply.outcome().await, Outcome::TimedOut(Payload::from(-1)));
    }

    #[tokio::test]
    async fn test_failed_yields_fallback() {
        let (completion, reply) = Completion::new(Payload::from("fallback"));
        completion.settle(Outcome::Failed {
            error: "access denied".to_string(),
            fallback: Payload::from("fallback"),
        });

        assert_eq!(reply.await, Payload::from("fallback"));
    }

    #[tokio::test]
    async fn test_dropped_completion_releases_with_fallback() {
        let (completion, reply) = Completion::new(Payload::from(0));
        drop(completion);

        assert_eq!(reply.outcome().await, Outcome::Released(Payload::from(0)));
    }

    #[test]
    fn test_settle_after_reply_dropped() {
        let (completion, reply) = Completion::new(Payload::null());
        drop(reply);

        assert!(completion.settle(Outcome::Responded(Payload::null())));
        assert!(completion.is_settled());
    }

    #[test]
    fn test_try_outcome() {
        let (completion, mut reply) = Completion::new(Payload::null());
        assert!(reply.try_outcome().is_none());

        completion.settle(Outcome::Responded(Payload::from(1)));
        assert_eq!(reply.try_outcome(), Some(Outcome::Responded(Payload::from(1))));
    }

    #[tokio::test]
    async fn test_await_after_try_outcome() {
        let (completion, mut reply) = Completion::new(Payload::null());
        completion.settle(Outcome::Responded(Payload::from(10)));

        assert_eq!(reply.try_outcome(), Some(Outcome::Responded(Payload::from(10))));
        assert_eq!(reply.try_outcome(), Some(Outcome::Responded(Payload::from(10))));
        assert_eq!(reply.await, Payload::from(10));
    }

    #[tokio::test]
    async fn test_outcome_after_try_outcome() {
        let (completion, mut reply) = Completion::new(Payload::from(-1));
        completion.settle(Outcome::TimedOut(Payload::from(-1)));

        assert!(reply.try_outcome().is_some());
        assert_eq!(reply.outcome().await, Outcome::TimedOut(Payload::from(-1)));
    }

    #[tokio::test]
    async fn test_try_outcome_sees_dropped_completion() {
        let (completion, mut reply) = Completion::new(Payload::from("fallback"));
        drop(completion);

        assert_eq!(
            reply.try_outcome(),
            Some(Outcome::Released(Payload::from("fallback")))
        );
        assert_eq!(reply.await, Payload::from("fallback"));
    }
}
