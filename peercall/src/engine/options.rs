//! Per-request overrides.

use crate::messaging::Payload;
use std::time::Duration;

/// Options of one outbound request.
///
/// # Example
///
/// ```rust,ignore
/// let reply = engine.send_message_with(
///     PeerId::new(2),
///     "ping",
///     RequestOptions::new()
///         .timeout(Duration::from_millis(500))
///         .fallback("no answer"),
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// `None` uses the engine default. `Some(ZERO)` disables the deadline.
    pub timeout: Option<Duration>,

    /// Value handed back if the request ends without a success response.
    pub fallback: Payload,
}

impl RequestOptions {
    /// Engine-default timeout, null fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the timeout. A zero duration means the request never expires.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait for the response indefinitely.
    pub fn no_timeout(self) -> Self {
        self.timeout(Duration::ZERO)
    }

    /// Value returned on timeout, failure or release.
    pub fn fallback(mut self, fallback: impl Into<Payload>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Deadline of a request sent at `now`, or `None` if it never expires.
    pub(crate) fn deadline(&self, now: Duration, default_timeout: Duration) -> Option<Duration> {
        let timeout = self.timeout.unwrap_or(default_timeout);
        if timeout.is_zero() {
            None
        } else {
            Some(now + timeout)
        }
    }
}
