//! Periodic release of overdue requests.
//!
//! The sweep interval is independent of any request's timeout: a request is
//! released at most one interval after its deadline. Nothing is sent on the
//! wire; the caller simply receives its fallback value.

use crate::correlation::PendingTable;
use crate::providers::TimeProvider;
use std::time::Duration;

/// Release every overdue entry of `table`. Returns how many were released.
pub fn sweep(table: &PendingTable, now: Duration) -> usize {
    let expired = table.expire(now);
    let count = expired.len();

    for entry in expired {
        tracing::debug!(
            request_id = %entry.id(),
            responder = %entry.responder(),
            "request timed out, releasing with fallback"
        );
        entry.time_out();
    }

    count
}

/// Call `tick` once per `interval` until it returns false.
///
/// The engine hands in a closure that upgrades a weak reference to itself,
/// so the loop ends on its own once the engine is dropped.
pub async fn run<T, F>(time: T, interval: Duration, mut tick: F)
where
    T: TimeProvider,
    F: FnMut() -> bool,
{
    loop {
        time.sleep(interval).await;
        if !tick() {
            tracing::debug!("timeout sweeper exiting");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::{Outcome, PendingEntry};
    use crate::id::PeerId;
    use crate::messaging::Payload;
    use crate::providers::TokioTimeProvider;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_sweep_releases_with_fallback() {
        let table = PendingTable::new();
        let (entry, reply) = PendingEntry::new(
            table.next_id(),
            PeerId::new(2),
            Some(Duration::from_millis(100)),
            Payload::from(-1),
        );
        table.insert(entry);

        assert_eq!(sweep(&table, Duration::from_millis(50)), 0);
        assert_eq!(sweep(&table, Duration::from_millis(150)), 1);
        assert!(table.is_empty());
        assert_eq!(reply.outcome().await, Outcome::TimedOut(Payload::from(-1)));
    }

    #[tokio::test]
    async fn test_sweep_never_releases_entries_without_deadline() {
        let table = PendingTable::new();
        let (entry, _reply) =
            PendingEntry::new(table.next_id(), PeerId::new(2), None, Payload::null());
        table.insert(entry);

        assert_eq!(sweep(&table, Duration::from_secs(86_400 * 365)), 0);
        assert_eq!(table.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_until_told_to_stop() {
        let time = TokioTimeProvider::new();
        let ticks = Cell::new(0);

        run(time.clone(), Duration::from_millis(100), || {
            ticks.set(ticks.get() + 1);
            ticks.get() < 3
        })
        .await;

        assert_eq!(ticks.get(), 3);
        assert_eq!(time.now(), Duration::from_millis(300));
    }
}
