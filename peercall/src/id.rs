//! Core identifier types for peers and requests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a peer on the network.
///
/// Peer ids are assigned by the transport layer and are only ever read from
/// an inbound delivery, never from payload contents.
///
/// # Conventions
///
/// - `PeerId::AUTHORITY` (1) is the default authority of every target
/// - `0` is never a valid peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub u64);

impl PeerId {
    /// The peer that owns targets unless told otherwise.
    pub const AUTHORITY: PeerId = PeerId(1);

    /// Create a new PeerId.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Correlation id tying a request to its eventual response.
///
/// # Invariants
///
/// - A response carries the id of the request it answers
/// - One id corresponds to at most one pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl RequestId {
    /// Create a new RequestId.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
