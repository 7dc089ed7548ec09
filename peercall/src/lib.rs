//! # peercall
//!
//! Request/response correlation for peer-to-peer networks.
//!
//! Peers exchange one-way envelopes over an unreliable transport. This crate
//! turns that into awaitable requests:
//!
//! - **Messages**: send any payload, get back whatever the remote listeners
//!   put in the [`MessageCarrier`](messaging::MessageCarrier)
//! - **Invocations**: run a named procedure on a target object of the remote
//!   peer, subject to its access-control declarations
//!
//! Every request gets a correlation id, a deadline and a fallback value. A
//! request ends exactly once: answered by the peer it was sent to, refused,
//! timed out by the sweeper, or released when the engine stops.
//!
//! ## Modules
//!
//! - [`engine`]: [`CorrelationEngine`] and its builder
//! - [`correlation`]: pending table, completion handles, timeout sweeper
//! - [`invocation`]: targets, procedures and access control
//! - [`messaging`]: payloads, envelopes, codec, transport, listeners
//! - [`providers`]: clock and task spawning
//!
//! ## Single-Threaded Design
//!
//! Everything runs on one thread inside a `tokio::task::LocalSet`; shared
//! state uses `Rc`, `Cell` and `RefCell`.
//!
//! ## Example
//!
//! ```rust,ignore
//! let network = MemoryNetwork::new();
//!
//! let server = CorrelationEngine::builder()
//!     .transport(network.join(PeerId::new(1)))
//!     .build()?;
//! server.subscribe_fn(|carrier| {
//!     let n: i64 = carrier.data.decode().unwrap_or(0);
//!     carrier.reply(n * 2);
//! });
//! server.start();
//!
//! let client = CorrelationEngine::builder()
//!     .transport(network.join(PeerId::new(2)))
//!     .build()?;
//! client.start();
//!
//! assert_eq!(client.send_message(PeerId::new(1), 5).await, Payload::from(10));
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod id;
pub mod invocation;
pub mod messaging;
pub mod prelude;
pub mod providers;

pub use config::EngineConfig;
pub use correlation::{Outcome, Reply};
pub use engine::{CorrelationEngine, EngineBuilder, EngineStats, RequestOptions};
pub use error::{
    CodecError, ConfigError, InvocationError, InvocationErrorKind, PeerCallError, ProcedureError,
    TransportError,
};
pub use id::{PeerId, RequestId};
pub use invocation::{ProcedureRef, RpcConfig, RpcMode};
pub use messaging::{MessageCarrier, Payload};
