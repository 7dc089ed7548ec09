//! Subscription point for inbound data messages.
//!
//! Every inbound message request is wrapped in a [`MessageCarrier`] and
//! handed, in registration order, to each subscribed [`MessageListener`].
//! Whatever ends up in `carrier.result` is sent back to the requester.

use crate::id::{PeerId, RequestId};
use crate::messaging::Payload;
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Mutable request/result pair visited by the listeners of one message.
#[derive(Debug)]
pub struct MessageCarrier {
    sender: PeerId,
    id: RequestId,

    /// Inbound payload.
    pub data: Payload,

    /// Outbound payload. Unset results are answered with [`Payload::null`].
    pub result: Option<Payload>,
}

impl MessageCarrier {
    /// Wrap an inbound payload.
    pub fn new(sender: PeerId, id: RequestId, data: Payload) -> Self {
        Self {
            sender,
            id,
            data,
            result: None,
        }
    }

    /// Peer that sent the request.
    pub fn sender(&self) -> PeerId {
        self.sender
    }

    /// Correlation id of the request.
    pub fn request_id(&self) -> RequestId {
        self.id
    }

    /// Overwrite the result. The last write wins.
    pub fn reply(&mut self, result: impl Into<Payload>) {
        self.result = Some(result.into());
    }

    /// Consume the carrier into the payload to send back.
    pub fn into_result(self) -> Payload {
        self.result.unwrap_or_default()
    }
}

/// Receives inbound data messages.
///
/// A listener may suspend; the engine does not time it out, so a listener
/// that never completes stalls the response to that one message.
#[async_trait(?Send)]
pub trait MessageListener {
    /// Inspect the request and optionally write a result.
    async fn on_message(&self, carrier: &mut MessageCarrier);
}

/// Adapter for synchronous closures.
pub struct FnListener<F>(pub F);

#[async_trait(?Send)]
impl<F> MessageListener for FnListener<F>
where
    F: Fn(&mut MessageCarrier),
{
    async fn on_message(&self, carrier: &mut MessageCarrier) {
        (self.0)(carrier)
    }
}

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered set of message listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Rc<dyn MessageListener>)>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; it runs after every listener added before it.
    pub fn subscribe(&self, listener: Rc<dyn MessageListener>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Remove a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Number of subscribed listeners.
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Check if no listener is subscribed.
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Run every listener over the carrier, in registration order.
    ///
    /// The listener list is snapshotted first, so listeners may subscribe or
    /// unsubscribe while running; the change applies to the next message.
    pub async fn dispatch(&self, carrier: &mut MessageCarrier) {
        let snapshot: Vec<Rc<dyn MessageListener>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in snapshot {
            listener.on_message(carrier).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier(data: impl Into<Payload>) -> MessageCarrier {
        MessageCarrier::new(PeerId::new(2), RequestId::new(1), data.into())
    }

    #[tokio::test]
    async fn test_last_write_wins_in_registration_order() {
        let registry = ListenerRegistry::new();
        registry.subscribe(Rc::new(FnListener(|c: &mut MessageCarrier| c.reply("first"))));
        registry.subscribe(Rc::new(FnListener(|c: &mut MessageCarrier| c.reply("second"))));

        let mut c = carrier(0);
        registry.dispatch(&mut c).await;
        assert_eq!(c.into_result(), Payload::from("second"));
    }

    #[tokio::test]
    async fn test_unset_result_is_null() {
        let registry = ListenerRegistry::new();
        registry.subscribe(Rc::new(FnListener(|_: &mut MessageCarrier| {})));

        let mut c = carrier(1);
        registry.dispatch(&mut c).await;
        assert!(c.into_result().is_null());
    }

    #[tokio::test]
    async fn test_listener_sees_previous_result() {
        let registry = ListenerRegistry::new();
        registry.subscribe(Rc::new(FnListener(|c: &mut MessageCarrier| {
            let n: i64 = c.data.decode().unwrap_or(0);
            c.reply(n + 1);
        })));
        registry.subscribe(Rc::new(FnListener(|c: &mut MessageCarrier| {
            let n: i64 = c.result.as_ref().and_then(|r| r.decode().ok()).unwrap_or(0);
            c.reply(n * 10);
        })));

        let mut c = carrier(4);
        registry.dispatch(&mut c).await;
        assert_eq!(c.into_result(), Payload::from(50));
    }

    #[test]
    fn test_unsubscribe() {
        let registry = ListenerRegistry::new();
        let a = registry.subscribe(Rc::new(FnListener(|_: &mut MessageCarrier| {})));
        let b = registry.subscribe(Rc::new(FnListener(|_: &mut MessageCarrier| {})));
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        assert!(registry.unsubscribe(a));
        assert!(!registry.unsubscribe(a));
        assert_eq!(registry.len(), 1);
    }
}
