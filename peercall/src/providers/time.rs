//! Monotonic clock and sleeping.

use async_trait::async_trait;
use std::time::Duration;

/// Provider trait for time operations.
///
/// `now()` is a monotonic offset from an arbitrary origin. Deadlines of
/// pending requests are expressed on this scale.
#[async_trait(?Send)]
pub trait TimeProvider: Clone {
    /// Sleep for the specified duration.
    async fn sleep(&self, duration: Duration);

    /// Elapsed time since the provider was created.
    fn now(&self) -> Duration;
}

/// Real time provider using Tokio's time facilities.
///
/// Built on `tokio::time::Instant`, so it follows a paused test clock.
#[derive(Debug, Clone)]
pub struct TokioTimeProvider {
    start_time: tokio::time::Instant,
}

impl TokioTimeProvider {
    /// Create a new Tokio time provider.
    pub fn new() -> Self {
        Self {
            start_time: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl TimeProvider for TokioTimeProvider {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_now_follows_paused_clock() {
        let time = TokioTimeProvider::new();
        assert_eq!(time.now(), Duration::ZERO);

        time.sleep(Duration::from_millis(250)).await;
        assert_eq!(time.now(), Duration::from_millis(250));
    }
}
