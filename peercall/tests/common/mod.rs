//! Shared setup for the integration tests.

#![allow(dead_code)]

use std::rc::Rc;

use peercall::engine::{CorrelationEngine, EngineBuilder};
use peercall::invocation::{ProcedureHost, ProcedureTable, TargetRegistry};
use peercall::messaging::{Envelope, JsonCodec, MemoryNetwork, MessageCodec, Transport};
use peercall::PeerId;
use tracing_subscriber::EnvFilter;

pub const SERVER: PeerId = PeerId(1);
pub const CLIENT: PeerId = PeerId(2);

/// Install a test-writer subscriber once. `RUST_LOG` overrides the filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// One started engine and the targets it hosts.
pub struct Peer {
    pub engine: Rc<CorrelationEngine>,
    pub targets: Rc<TargetRegistry>,
}

impl Peer {
    /// Join `network` as `id` and start an engine with default settings.
    pub fn join(network: &MemoryNetwork, id: PeerId) -> Self {
        Self::join_with(network, id, EngineBuilder::new())
    }

    /// Join `network` as `id` with a pre-configured builder.
    pub fn join_with(network: &MemoryNetwork, id: PeerId, builder: EngineBuilder) -> Self {
        let targets = Rc::new(TargetRegistry::new());
        let engine = builder
            .transport(network.join(id))
            .resolver(targets.clone())
            .build()
            .unwrap();
        engine.start();
        Self { engine, targets }
    }

    /// Host `procedures` at `path`.
    pub fn host(&self, path: &str, procedures: ProcedureTable) {
        self.targets.add(Rc::new(ProcedureHost::new(path, procedures)));
    }

    /// Host a target at `path` that declares no remote procedures.
    pub fn host_bare(&self, path: &str) {
        self.targets.add(Rc::new(ProcedureHost::bare(path)));
    }
}

/// Encode and push a hand-made envelope from a raw transport.
pub fn inject(from: &impl Transport, to: PeerId, envelope: &Envelope) {
    let frame = JsonCodec.encode(envelope).unwrap();
    from.send(to, frame).unwrap();
}

/// Let every ready local task run.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
