//! Counters describing what an engine has done since it was built.

use crate::error::InvocationErrorKind;
use std::collections::BTreeMap;

/// Snapshot of an engine's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Requests registered in the pending table
    pub requests_sent: u64,

    /// Requests whose transport send failed (left to the sweeper)
    pub send_failures: u64,

    /// Requests settled by a success response
    pub responses_settled: u64,

    /// Requests settled by a failure response
    pub failures_received: u64,

    /// Requests released by the sweeper
    pub timeouts: u64,

    /// Requests released by `stop`
    pub released_on_stop: u64,

    /// Responses dropped because their id wasn't pending
    pub unknown_responses: u64,

    /// Responses dropped because they came from the wrong peer
    pub spoofed_responses: u64,

    /// Inbound frames that could not be decoded
    pub malformed_frames: u64,

    /// Inbound messages answered
    pub messages_answered: u64,

    /// Inbound invocations answered successfully
    pub invocations_answered: u64,

    /// Inbound invocations refused, by reason
    pub rejections: BTreeMap<InvocationErrorKind, u64>,
}

impl EngineStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a refused invocation.
    pub fn record_rejection(&mut self, kind: InvocationErrorKind) {
        *self.rejections.entry(kind).or_insert(0) += 1;
    }

    /// Number of invocations refused for `kind`.
    pub fn rejected(&self, kind: InvocationErrorKind) -> u64 {
        self.rejections.get(&kind).copied().unwrap_or(0)
    }

    /// Number of invocations refused for any reason.
    pub fn total_rejections(&self) -> u64 {
        self.rejections.values().sum()
    }

    /// Requests settled one way or another.
    pub fn requests_settled(&self) -> u64 {
        self.responses_settled + self.failures_received + self.timeouts + self.released_on_stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_counters() {
        let mut stats = EngineStats::new();
        stats.record_rejection(InvocationErrorKind::AccessDenied);
        stats.record_rejection(InvocationErrorKind::AccessDenied);
        stats.record_rejection(InvocationErrorKind::TargetNotFound);

        assert_eq!(stats.rejected(InvocationErrorKind::AccessDenied), 2);
        assert_eq!(stats.rejected(InvocationErrorKind::CallLocalViolation), 0);
        assert_eq!(stats.total_rejections(), 3);
    }

    #[test]
    fn test_requests_settled() {
        let stats = EngineStats {
            responses_settled: 3,
            failures_received: 1,
            timeouts: 2,
            released_on_stop: 4,
            ..EngineStats::default()
        };
        assert_eq!(stats.requests_settled(), 10);
    }
}
