//! Wire envelopes exchanged between peers.

use crate::error::InvocationError;
use crate::id::{PeerId, RequestId};
use crate::messaging::Payload;
use serde::{Deserialize, Serialize};

/// Unit of communication between two correlation engines.
///
/// # State Transitions
///
/// ```text
/// Message    → Success            (listener result)
/// Invocation → Success | Failure  (procedure result or validation error)
/// ```
///
/// A response always copies the id of the request it answers. The sender of
/// an envelope is never part of it: the transport supplies it on delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Envelope {
    /// Generic data request, answered by the message listeners.
    Message {
        /// Correlation id chosen by the requester.
        id: RequestId,
        /// Data handed to the listeners.
        payload: Payload,
    },

    /// Remote procedure invocation.
    Invocation {
        /// Correlation id chosen by the requester.
        id: RequestId,
        /// Method to run on the target.
        method: String,
        /// Path of the target on the responder.
        target_path: String,
        /// Bound arguments, in order.
        args: Vec<Payload>,
    },

    /// Successful answer to either request kind.
    Success {
        /// Id of the request being answered.
        id: RequestId,
        /// Listener result or procedure return value.
        value: Payload,
    },

    /// The responder refused or failed the invocation.
    Failure {
        /// Id of the request being answered.
        id: RequestId,
        /// Why the invocation was refused or failed.
        error: InvocationError,
    },
}

impl Envelope {
    /// The correlation id carried by this envelope.
    pub fn id(&self) -> RequestId {
        match self {
            Envelope::Message { id, .. }
            | Envelope::Invocation { id, .. }
            | Envelope::Success { id, .. }
            | Envelope::Failure { id, .. } => *id,
        }
    }

    /// Check if this envelope expects an answer.
    pub fn is_request(&self) -> bool {
        matches!(self, Envelope::Message { .. } | Envelope::Invocation { .. })
    }
}

/// An encoded envelope as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Peer that sent the frame, as observed by the transport.
    pub sender: PeerId,

    /// Encoded [`Envelope`].
    pub frame: Vec<u8>,
}

impl Delivery {
    /// Create a delivery from a sender and an encoded frame.
    pub fn new(sender: PeerId, frame: Vec<u8>) -> Self {
        Self { sender, frame }
    }
}
