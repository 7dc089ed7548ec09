//! The correlation engine: outbound dispatch, inbound routing and lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ CorrelationEngine                           │
//! │                                             │
//! │  send_message / send_invocation             │
//! │    → PendingTable::insert → Transport::send │
//! │                                             │
//! │  inbound pump (local task)                  │
//! │    Transport::recv → handle_delivery        │
//! │      Message     → listener task            │
//! │      Invocation  → invocation task          │
//! │      Success     → PendingTable::take       │
//! │      Failure     → PendingTable::take       │
//! │                                             │
//! │  sweeper (local task)                       │
//! │    every sweep_interval → expire overdue    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Single-Threaded Design
//!
//! Uses `Cell` and `RefCell` for interior mutability and spawns with
//! `spawn_local`, so an engine must live inside a `tokio::task::LocalSet`.

use crate::config::EngineConfig;
use crate::correlation::{sweeper, Mismatch, PendingEntry, PendingTable, Reply};
use crate::engine::{EngineStats, RequestOptions};
use crate::error::InvocationError;
use crate::id::{PeerId, RequestId};
use crate::invocation::{ProcedureRef, TargetResolver};
use crate::messaging::{
    Delivery, Envelope, FnListener, JsonCodec, ListenerId, ListenerRegistry, MessageCarrier,
    MessageCodec, MessageListener, Payload, Transport,
};
use crate::providers::{Providers, TaskProvider, TimeProvider, TokioProviders};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tokio::task::JoinHandle;

/// Request/response correlation over an unreliable peer-to-peer transport.
///
/// Always handled through an `Rc`; see
/// [`EngineBuilder`](crate::engine::EngineBuilder).
///
/// # Example
///
/// ```rust,ignore
/// let engine = CorrelationEngine::builder()
///     .transport(network.join(PeerId::new(2)))
///     .build()?;
/// engine.start();
///
/// let answer = engine.send_message(PeerId::new(1), 5).await;
/// ```
pub struct CorrelationEngine<P = TokioProviders, C = JsonCodec>
where
    P: Providers,
    C: MessageCodec,
{
    config: EngineConfig,
    providers: P,
    codec: C,
    transport: Rc<dyn Transport>,
    pub(crate) resolver: Rc<dyn TargetResolver>,
    pending: PendingTable,
    pub(crate) listeners: ListenerRegistry,
    pub(crate) stats: RefCell<EngineStats>,
    running: Cell<bool>,
    tasks: RefCell<Vec<JoinHandle<()>>>,
}

impl CorrelationEngine {
    /// Start building an engine on the Tokio providers.
    pub fn builder() -> crate::engine::EngineBuilder {
        crate::engine::EngineBuilder::new()
    }
}

impl<P, C> CorrelationEngine<P, C>
where
    P: Providers,
    C: MessageCodec,
{
    pub(crate) fn new(
        config: EngineConfig,
        providers: P,
        codec: C,
        transport: Rc<dyn Transport>,
        resolver: Rc<dyn TargetResolver>,
    ) -> Self {
        Self {
            config,
            providers,
            codec,
            transport,
            resolver,
            pending: PendingTable::new(),
            listeners: ListenerRegistry::new(),
            stats: RefCell::new(EngineStats::new()),
            running: Cell::new(false),
            tasks: RefCell::new(Vec::new()),
        }
    }

    /// Identity of this peer.
    pub fn local_peer(&self) -> PeerId {
        self.transport.local_peer()
    }

    /// Settings the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of requests awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Check if `id` is still awaiting a response.
    pub fn is_pending(&self, id: RequestId) -> bool {
        self.pending.contains(id)
    }

    /// Snapshot of the engine counters.
    pub fn stats(&self) -> EngineStats {
        self.stats.borrow().clone()
    }

    /// Check if the inbound pump and sweeper are running.
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawn the inbound pump and the timeout sweeper.
    ///
    /// Both tasks hold only a weak reference to the engine and end once it is
    /// dropped. Calling `start` on a running engine does nothing.
    pub fn start(self: &Rc<Self>) {
        if self.running.replace(true) {
            return;
        }

        let weak = Rc::downgrade(self);
        let transport = self.transport.clone();
        let pump = self
            .providers
            .task()
            .spawn_task("peercall-inbound", async move {
                while let Some(delivery) = transport.recv().await {
                    let Some(engine) = weak.upgrade() else {
                        break;
                    };
                    engine.handle_delivery(delivery);
                }
                tracing::debug!("inbound pump exiting");
            });

        let weak: Weak<Self> = Rc::downgrade(self);
        let sweep = sweeper::run(
            self.providers.time().clone(),
            self.config.sweep_interval,
            move || match weak.upgrade() {
                Some(engine) => {
                    engine.sweep();
                    true
                }
                None => false,
            },
        );
        let sweeper = self.providers.task().spawn_task("peercall-sweeper", sweep);

        self.tasks.borrow_mut().extend([pump, sweeper]);

        tracing::info!(
            peer = %self.local_peer(),
            default_timeout = ?self.config.default_timeout,
            sweep_interval = ?self.config.sweep_interval,
            "correlation engine started"
        );
    }

    /// Stop the background tasks and release every pending request.
    ///
    /// Released callers receive their fallback. The engine can be started
    /// again afterwards.
    pub fn stop(&self) {
        let was_running = self.running.replace(false);
        for task in self.tasks.borrow_mut().drain(..) {
            task.abort();
        }

        let released = self.pending.drain();
        let count = released.len();
        for entry in released {
            entry.release();
        }
        self.stats.borrow_mut().released_on_stop += count as u64;

        if was_running || count > 0 {
            tracing::info!(
                peer = %self.local_peer(),
                released = count,
                "correlation engine stopped"
            );
        }
    }

    /// Release every overdue request now. Returns how many were released.
    ///
    /// The sweeper task calls this once per `sweep_interval`.
    pub fn sweep(&self) -> usize {
        let released = sweeper::sweep(&self.pending, self.providers.time().now());
        if released > 0 {
            self.stats.borrow_mut().timeouts += released as u64;
        }
        released
    }

    // =========================================================================
    // Outbound dispatch
    // =========================================================================

    /// Send `payload` to the message listeners of `to`.
    ///
    /// Resolves to the listeners' result, or null if the request times out
    /// after the default timeout.
    pub fn send_message(&self, to: PeerId, payload: impl Into<Payload>) -> Reply {
        self.send_message_with(to, payload, RequestOptions::new())
    }

    /// [`send_message`](Self::send_message) with a custom timeout or fallback.
    pub fn send_message_with(
        &self,
        to: PeerId,
        payload: impl Into<Payload>,
        options: RequestOptions,
    ) -> Reply {
        let id = self.pending.next_id();
        let envelope = Envelope::Message {
            id,
            payload: payload.into(),
        };
        self.dispatch(to, id, envelope, options)
    }

    /// Run `procedure` on peer `to`.
    ///
    /// Resolves to the procedure's return value. If the call is refused or
    /// fails remotely, or times out, resolves to null.
    ///
    /// # Panics
    ///
    /// Panics if `procedure.target_path` does not resolve locally: a peer
    /// can only invoke methods on objects that exist on its own side too.
    pub fn send_invocation(&self, to: PeerId, procedure: ProcedureRef) -> Reply {
        self.send_invocation_with(to, procedure, RequestOptions::new())
    }

    /// [`send_invocation`](Self::send_invocation) with a custom timeout or
    /// fallback.
    ///
    /// # Panics
    ///
    /// Same as [`send_invocation`](Self::send_invocation).
    pub fn send_invocation_with(
        &self,
        to: PeerId,
        procedure: ProcedureRef,
        options: RequestOptions,
    ) -> Reply {
        assert!(
            self.resolver.resolve(&procedure.target_path).is_some(),
            "cannot invoke {}: target is not in the local tree",
            procedure
        );

        let id = self.pending.next_id();
        let envelope = Envelope::Invocation {
            id,
            method: procedure.method,
            target_path: procedure.target_path,
            args: procedure.args,
        };
        self.dispatch(to, id, envelope, options)
    }

    fn dispatch(
        &self,
        to: PeerId,
        id: RequestId,
        envelope: Envelope,
        options: RequestOptions,
    ) -> Reply {
        let now = self.providers.time().now();
        let deadline = options.deadline(now, self.config.default_timeout);
        let (entry, reply) = PendingEntry::new(id, to, deadline, options.fallback);

        // Registered before sending: a loopback response may arrive at once.
        self.pending.insert(entry);
        self.stats.borrow_mut().requests_sent += 1;

        let frame = match self.codec.encode(&envelope) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(request_id = %id, error = %e, "failed to encode request");
                if let Ok(entry) = self.pending.take(id, to) {
                    entry.fail(e.to_string());
                }
                return reply;
            }
        };

        tracing::debug!(
            request_id = %id,
            to = %to,
            deadline = ?deadline,
            request = ?envelope,
            "sending request"
        );

        if let Err(e) = self.transport.send(to, frame) {
            // The entry stays; the sweeper releases it at its deadline.
            tracing::warn!(request_id = %id, to = %to, error = %e, "failed to send request");
            self.stats.borrow_mut().send_failures += 1;
        }

        reply
    }

    /// Encode and send a response envelope. Failures are logged only.
    pub(crate) fn send_response(&self, to: PeerId, envelope: Envelope) {
        let id = envelope.id();
        let frame = match self.codec.encode(&envelope) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(request_id = %id, error = %e, "failed to encode response");
                return;
            }
        };

        if let Err(e) = self.transport.send(to, frame) {
            tracing::warn!(request_id = %id, to = %to, error = %e, "failed to send response");
        }
    }

    // =========================================================================
    // Inbound routing
    // =========================================================================

    /// Route one inbound frame.
    ///
    /// Requests are answered from their own local task, so a listener or
    /// procedure that suspends never holds up other frames. Responses settle
    /// their pending entry immediately.
    pub fn handle_delivery(self: &Rc<Self>, delivery: Delivery) {
        let Delivery { sender, frame } = delivery;

        let envelope: Envelope = match self.codec.decode(&frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(from = %sender, error = %e, "dropping malformed frame");
                self.stats.borrow_mut().malformed_frames += 1;
                return;
            }
        };

        match envelope {
            Envelope::Message { id, payload } => {
                let engine = self.clone();
                self.providers.task().spawn_task("peercall-message", async move {
                    engine.respond_to_message(sender, id, payload).await;
                });
            }
            Envelope::Invocation {
                id,
                method,
                target_path,
                args,
            } => {
                let engine = self.clone();
                self.providers.task().spawn_task("peercall-invocation", async move {
                    engine
                        .respond_to_invocation(sender, id, method, target_path, args)
                        .await;
                });
            }
            Envelope::Success { id, value } => self.on_success(sender, id, value),
            Envelope::Failure { id, error } => self.on_failure(sender, id, error),
        }
    }

    fn on_success(&self, sender: PeerId, id: RequestId, value: Payload) {
        match self.pending.take(id, sender) {
            Ok(entry) => {
                tracing::debug!(request_id = %id, from = %sender, "request answered");
                self.stats.borrow_mut().responses_settled += 1;
                entry.respond(value);
            }
            Err(mismatch) => self.drop_response(sender, id, mismatch),
        }
    }

    fn on_failure(&self, sender: PeerId, id: RequestId, error: InvocationError) {
        match self.pending.take(id, sender) {
            Ok(entry) => {
                tracing::error!(
                    request_id = %id,
                    from = %sender,
                    error = %error,
                    "remote invocation failed"
                );
                self.stats.borrow_mut().failures_received += 1;
                entry.fail(error.to_string());
            }
            Err(mismatch) => self.drop_response(sender, id, mismatch),
        }
    }

    fn drop_response(&self, sender: PeerId, id: RequestId, mismatch: Mismatch) {
        let mut stats = self.stats.borrow_mut();
        match mismatch {
            Mismatch::UnknownId => {
                stats.unknown_responses += 1;
                tracing::warn!(
                    request_id = %id,
                    from = %sender,
                    "dropping response to unknown request"
                );
            }
            Mismatch::WrongSender { expected } => {
                stats.spoofed_responses += 1;
                tracing::warn!(
                    request_id = %id,
                    from = %sender,
                    expected = %expected,
                    "dropping response from unexpected peer"
                );
            }
        }
    }

    // =========================================================================
    // Message listeners
    // =========================================================================

    /// Register a listener for inbound messages.
    pub fn subscribe(&self, listener: Rc<dyn MessageListener>) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    /// Register a synchronous closure as a message listener.
    pub fn subscribe_fn<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&mut MessageCarrier) + 'static,
    {
        self.subscribe(Rc::new(FnListener(listener)))
    }

    /// Remove a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

impl<P, C> Drop for CorrelationEngine<P, C>
where
    P: Providers,
    C: MessageCodec,
{
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
