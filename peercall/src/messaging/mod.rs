//! Wire envelopes, codecs, transports and the inbound message subscription point.

pub mod codec;
pub mod envelope;
pub mod listeners;
pub mod payload;
pub mod transport;

// Re-exports
pub use codec::{JsonCodec, MessageCodec};
pub use envelope::{Delivery, Envelope};
pub use listeners::{FnListener, ListenerId, ListenerRegistry, MessageCarrier, MessageListener};
pub use payload::Payload;
pub use transport::{MemoryNetwork, MemoryTransport, Transport};
