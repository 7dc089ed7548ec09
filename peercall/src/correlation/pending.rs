//! Pending request table and correlation id allocation.
//!
//! # Architecture
//!
//! ```text
//! Request Flow:
//!   1. Allocate RequestId
//!   2. Insert PendingEntry (Completion + deadline + responder + fallback)
//!   3. Send request envelope
//!   4. Caller awaits the Reply
//!
//! Response Flow:
//!   5. Response arrives from sender S
//!   6. take(id, S): unknown id or S != responder → dropped, entry untouched
//!   7. Entry removed, Completion settled, caller resumes
//!
//! Timeout Flow:
//!   5. Sweeper calls expire(now)
//!   6. Overdue entries removed and settled with their fallback
//! ```
//!
//! Removal and settlement are never interleaved with other table access:
//! everything runs on one thread and no borrow is held across an await.

use crate::correlation::{Completion, Outcome, Reply};
use crate::id::{PeerId, RequestId};
use crate::messaging::Payload;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

/// State of one in-flight request.
///
/// # Lifecycle
///
/// 1. **Created**: by the dispatcher, before the request is sent
/// 2. **Pending**: stored in the [`PendingTable`], never updated in place
/// 3. **Settled**: removed by a response, a failure, the sweeper or a stop
pub struct PendingEntry {
    id: RequestId,
    completion: Completion,
    deadline: Option<Duration>,
    responder: PeerId,
    fallback: Payload,
}

impl PendingEntry {
    /// Create an entry and the reply its caller will await.
    ///
    /// `deadline` is an absolute time on the engine clock; `None` means the
    /// entry never expires.
    pub fn new(
        id: RequestId,
        responder: PeerId,
        deadline: Option<Duration>,
        fallback: Payload,
    ) -> (Self, Reply) {
        let (completion, reply) = Completion::new(fallback.clone());
        let entry = Self {
            id,
            completion,
            deadline,
            responder,
            fallback,
        };
        (entry, reply)
    }

    /// Correlation id of this request.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Peer expected to answer.
    pub fn responder(&self) -> PeerId {
        self.responder
    }

    /// Absolute deadline, if any.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Value handed to the caller on failure, timeout or release.
    pub fn fallback(&self) -> &Payload {
        &self.fallback
    }

    /// Check if the deadline is set and has passed.
    pub fn is_expired(&self, now: Duration) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Settle with the responder's value.
    pub fn respond(self, value: Payload) {
        self.completion.settle(Outcome::Responded(value));
    }

    /// Settle with the fallback after a remote failure.
    pub fn fail(self, error: String) {
        self.completion.settle(Outcome::Failed {
            error,
            fallback: self.fallback,
        });
    }

    /// Settle with the fallback after the deadline passed.
    pub fn time_out(self) {
        self.completion.settle(Outcome::TimedOut(self.fallback));
    }

    /// Settle with the fallback because the engine is stopping.
    pub fn release(self) {
        self.completion.settle(Outcome::Released(self.fallback));
    }
}

/// Why a response could not be matched to a pending entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// No entry with this id: never sent, already settled, or timed out.
    UnknownId,

    /// The entry expects an answer from a different peer.
    WrongSender {
        /// Peer the entry was sent to.
        expected: PeerId,
    },
}

/// Registry of in-flight requests keyed by correlation id.
///
/// # Single-Threaded Design
///
/// Uses `Cell` and `RefCell` for interior mutability (no Send/Sync required).
pub struct PendingTable {
    next_id: Cell<u64>,
    entries: RefCell<BTreeMap<RequestId, PendingEntry>>,
}

impl PendingTable {
    /// Create an empty table. The first id handed out is 1.
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            entries: RefCell::new(BTreeMap::new()),
        }
    }

    /// Allocate the next correlation id.
    ///
    /// Ids increase monotonically. On wrap-around, 0 and ids still pending
    /// are skipped so an id is never shared by two in-flight requests.
    pub fn next_id(&self) -> RequestId {
        let entries = self.entries.borrow();
        loop {
            let candidate = self.next_id.get();
            self.next_id.set(candidate.wrapping_add(1));
            if candidate != 0 && !entries.contains_key(&RequestId::new(candidate)) {
                return RequestId::new(candidate);
            }
        }
    }

    /// Store an entry.
    ///
    /// # Panics
    ///
    /// Panics if an entry with the same id is already pending; ids come from
    /// [`PendingTable::next_id`], so this is a caller bug.
    pub fn insert(&self, entry: PendingEntry) {
        let previous = self.entries.borrow_mut().insert(entry.id(), entry);
        assert!(previous.is_none(), "request id reused while still pending");
    }

    /// Remove the entry for `id` if `sender` is the peer it expects.
    ///
    /// On mismatch the entry stays in the table untouched.
    pub fn take(&self, id: RequestId, sender: PeerId) -> Result<PendingEntry, Mismatch> {
        let mut entries = self.entries.borrow_mut();
        let expected = entries.get(&id).ok_or(Mismatch::UnknownId)?.responder();
        if expected != sender {
            return Err(Mismatch::WrongSender { expected });
        }
        entries.remove(&id).ok_or(Mismatch::UnknownId)
    }

    /// Remove every entry whose deadline has passed at `now`.
    pub fn expire(&self, now: Duration) -> Vec<PendingEntry> {
        let mut entries = self.entries.borrow_mut();
        let expired: Vec<RequestId> = entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .map(PendingEntry::id)
            .collect();

        expired
            .into_iter()
            .filter_map(|id| entries.remove(&id))
            .collect()
    }

    /// Remove every entry.
    pub fn drain(&self) -> Vec<PendingEntry> {
        std::mem::take(&mut *self.entries.borrow_mut())
            .into_values()
            .collect()
    }

    /// Check if a request is in flight.
    pub fn contains(&self, id: RequestId) -> bool {
        self.entries.borrow().contains_key(&id)
    }

    /// Number of requests in flight.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Check if no request is in flight.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Default for PendingTable {
    fn default() -> Self {
        Self::new()
    }
}
