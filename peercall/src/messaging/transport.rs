//! Transport abstraction and an in-process implementation.
//!
//! The engine only needs point-to-point delivery of byte frames to an
//! identified peer, plus the sender identity of every inbound frame.
//! [`MemoryNetwork`] provides exactly that between engines living on the same
//! thread, which is what the test-suite uses.

use crate::error::TransportError;
use crate::id::PeerId;
use crate::messaging::Delivery;
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tokio::sync::{mpsc, Mutex};

/// Trait for moving encoded envelopes between peers.
///
/// Takes `&self` everywhere so it can be shared behind an `Rc`.
#[async_trait(?Send)]
pub trait Transport {
    /// Identity of this peer on the network.
    fn local_peer(&self) -> PeerId;

    /// Queue a frame for `to`. Never waits for the peer.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: frame handed to the network (delivery is not guaranteed)
    /// - `Err(TransportError)`: destination known to be unreachable
    fn send(&self, to: PeerId, frame: Vec<u8>) -> Result<(), TransportError>;

    /// Wait for the next inbound frame.
    ///
    /// Returns `None` once the transport is closed.
    async fn recv(&self) -> Option<Delivery>;
}

/// Shared routing state of a [`MemoryNetwork`].
#[derive(Default)]
struct Routes {
    inboxes: HashMap<PeerId, mpsc::UnboundedSender<Delivery>>,
    departed: HashSet<PeerId>,
}

/// In-process network connecting several [`MemoryTransport`]s.
///
/// # Example
///
/// ```rust,ignore
/// let network = MemoryNetwork::new();
/// let server = network.join(PeerId::new(1));
/// let client = network.join(PeerId::new(2));
/// ```
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    routes: Rc<RefCell<Routes>>,
}

impl MemoryNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new peer and return its transport.
    ///
    /// Joining again with the same id replaces the previous inbox.
    pub fn join(&self, peer: PeerId) -> MemoryTransport {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut routes = self.routes.borrow_mut();
        routes.departed.remove(&peer);
        routes.inboxes.insert(peer, tx);
        tracing::debug!(peer = %peer, "peer joined memory network");

        MemoryTransport {
            local_peer: peer,
            network: self.clone(),
            inbox: Mutex::new(rx),
        }
    }

    /// Detach a peer. Frames sent to it fail and its `recv` ends.
    pub fn disconnect(&self, peer: PeerId) {
        let mut routes = self.routes.borrow_mut();
        if routes.inboxes.remove(&peer).is_some() {
            routes.departed.insert(peer);
            tracing::debug!(peer = %peer, "peer left memory network");
        }
    }

    /// Check if a peer is currently attached.
    pub fn is_connected(&self, peer: PeerId) -> bool {
        self.routes.borrow().inboxes.contains_key(&peer)
    }

    fn deliver(&self, from: PeerId, to: PeerId, frame: Vec<u8>) -> Result<(), TransportError> {
        let routes = self.routes.borrow();
        let Some(inbox) = routes.inboxes.get(&to) else {
            return Err(if routes.departed.contains(&to) {
                TransportError::Disconnected(to)
            } else {
                TransportError::UnknownPeer(to)
            });
        };

        inbox
            .send(Delivery::new(from, frame))
            .map_err(|_| TransportError::Disconnected(to))
    }
}

/// One peer's endpoint on a [`MemoryNetwork`].
pub struct MemoryTransport {
    local_peer: PeerId,
    network: MemoryNetwork,
    inbox: Mutex<mpsc::UnboundedReceiver<Delivery>>,
}

impl MemoryTransport {
    /// The network this transport is attached to.
    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }
}

#[async_trait(?Send)]
impl Transport for MemoryTransport {
    fn local_peer(&self) -> PeerId {
        self.local_peer
    }

    fn send(&self, to: PeerId, frame: Vec<u8>) -> Result<(), TransportError> {
        if !self.network.is_connected(self.local_peer) {
            return Err(TransportError::Closed);
        }
        self.network.deliver(self.local_peer, to, frame)
    }

    async fn recv(&self) -> Option<Delivery> {
        self.inbox.lock().await.recv().await
    }
}
