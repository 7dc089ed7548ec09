//! Integration tests for data messages between engines.
//!
//! Covers listener dispatch on the responder and correlation on the requester:
//! - listener results travel back to the caller
//! - responses may arrive in any order
//! - forged or stray responses never settle a request

#[path = "common/mod.rs"]
mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use common::{init_tracing, inject, settle, Peer, CLIENT, SERVER};
use peercall::messaging::{Envelope, MemoryNetwork, MessageCarrier, MessageListener, Transport};
use peercall::{InvocationError, Outcome, Payload, PeerId, RequestId, RequestOptions};
use tokio::task::LocalSet;

/// Answers after sleeping for as many milliseconds as the request says.
struct Delayed;

#[async_trait(?Send)]
impl MessageListener for Delayed {
    async fn on_message(&self, carrier: &mut MessageCarrier) {
        let millis: u64 = carrier.data.decode().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(millis)).await;
        carrier.reply(millis);
    }
}

#[tokio::test(start_paused = true)]
async fn test_listener_doubles_data() {
    init_tracing();
    LocalSet::new()
        .run_until(async {
            let network = MemoryNetwork::new();
            let server = Peer::join(&network, SERVER);
            let client = Peer::join(&network, CLIENT);

            server.engine.subscribe_fn(|carrier| {
                let n: i64 = carrier.data.decode().unwrap_or(0);
                carrier.reply(n * 2);
            });

            let answer = client.engine.send_message(SERVER, 5).await;
            assert_eq!(answer, Payload::from(10));

            assert_eq!(client.engine.pending_count(), 0);
            assert_eq!(client.engine.stats().responses_settled, 1);
            assert_eq!(server.engine.stats().messages_answered, 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_listeners_run_in_order_last_write_wins() {
    init_tracing();
    LocalSet::new()
        .run_until(async {
            let network = MemoryNetwork::new();
            let server = Peer::join(&network, SERVER);
            let client = Peer::join(&network, CLIENT);

            let seen = Rc::new(RefCell::new(Vec::new()));
            let log = seen.clone();
            server.engine.subscribe_fn(move |carrier| {
                log.borrow_mut().push("first");
                carrier.reply("first");
            });
            let log = seen.clone();
            server.engine.subscribe_fn(move |carrier| {
                log.borrow_mut().push("second");
                assert_eq!(carrier.result, Some(Payload::from("first")));
                carrier.reply("second");
            });

            let answer = client.engine.send_message(SERVER, Payload::null()).await;
            assert_eq!(answer, Payload::from("second"));
            assert_eq!(*seen.borrow(), vec!["first", "second"]);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_message_yields_null() {
    init_tracing();
    LocalSet::new()
        .run_until(async {
            let network = MemoryNetwork::new();
            let server = Peer::join(&network, SERVER);
            let client = Peer::join(&network, CLIENT);

            let id = server.engine.subscribe_fn(|carrier| carrier.reply(1));
            assert!(server.engine.unsubscribe(id));
            assert!(!server.engine.unsubscribe(id));

            let outcome = client.engine.send_message(SERVER, "anyone?").outcome().await;
            assert_eq!(outcome, Outcome::Responded(Payload::null()));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_carrier_exposes_sender_and_increasing_ids() {
    init_tracing();
    LocalSet::new()
        .run_until(async {
            let network = MemoryNetwork::new();
            let server = Peer::join(&network, SERVER);
            let client = Peer::join(&network, CLIENT);

            let seen = Rc::new(RefCell::new(Vec::new()));
            let log = seen.clone();
            server.engine.subscribe_fn(move |carrier| {
                log.borrow_mut().push((carrier.sender(), carrier.request_id()));
            });

            for n in 0..3 {
                client.engine.send_message(SERVER, n).await;
            }

            assert_eq!(
                *seen.borrow(),
                vec![
                    (CLIENT, RequestId::new(1)),
                    (CLIENT, RequestId::new(2)),
                    (CLIENT, RequestId::new(3)),
                ]
            );
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_responses() {
    init_tracing();
    LocalSet::new()
        .run_until(async {
            let network = MemoryNetwork::new();
            let server = Peer::join(&network, SERVER);
            let client = Peer::join(&network, CLIENT);
            server.engine.subscribe(Rc::new(Delayed));

            let slow = client.engine.send_message(SERVER, 300);
            let fast = client.engine.send_message(SERVER, 100);

            let fast = fast.await;
            // The slow request is still in flight when the fast one returns.
            assert_eq!(client.engine.pending_count(), 1);
            let slow = slow.await;

            assert_eq!(fast, Payload::from(100));
            assert_eq!(slow, Payload::from(300));
            assert_eq!(client.engine.pending_count(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_self_addressed_message() {
    init_tracing();
    LocalSet::new()
        .run_until(async {
            let network = MemoryNetwork::new();
            let peer = Peer::join(&network, SERVER);
            peer.engine.subscribe_fn(|carrier| {
                let text: String = carrier.data.decode().unwrap_or_default();
                carrier.reply(text.to_uppercase());
            });

            let answer = peer.engine.send_message(SERVER, "loop").await;
            assert_eq!(answer, Payload::from("LOOP"));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_spoofed_and_stray_responses_are_dropped() {
    init_tracing();
    LocalSet::new()
        .run_until(async {
            let network = MemoryNetwork::new();
            let client = Peer::join(&network, CLIENT);
            // Raw transports: nothing answers automatically.
            let responder = network.join(PeerId::new(4));
            let intruder = network.join(PeerId::new(5));

            let reply = client.engine.send_message_with(
                PeerId::new(4),
                "question",
                RequestOptions::new().no_timeout(),
            );
            let request = responder.recv().await.unwrap();
            assert_eq!(request.sender, CLIENT);
            let id = RequestId::new(1);

            // Right id, wrong peer.
            inject(
                &intruder,
                CLIENT,
                &Envelope::Success {
                    id,
                    value: Payload::from("forged"),
                },
            );
            // Forged refusal from the wrong peer.
            inject(
                &intruder,
                CLIENT,
                &Envelope::Failure {
                    id,
                    error: InvocationError::AccessDenied {
                        method: "question".to_string(),
                        caller: CLIENT,
                        authority: PeerId::new(5),
                    },
                },
            );
            // Right peer, unknown id.
            inject(
                &responder,
                CLIENT,
                &Envelope::Success {
                    id: RequestId::new(99),
                    value: Payload::from("stray"),
                },
            );
            settle().await;

            let stats = client.engine.stats();
            assert_eq!(stats.spoofed_responses, 2);
            assert_eq!(stats.failures_received, 0);
            assert_eq!(stats.unknown_responses, 1);
            assert!(client.engine.is_pending(id));

            inject(
                &responder,
                CLIENT,
                &Envelope::Success {
                    id,
                    value: Payload::from("genuine"),
                },
            );
            assert_eq!(reply.await, Payload::from("genuine"));

            // A second answer to a settled request is stray too.
            inject(
                &responder,
                CLIENT,
                &Envelope::Success {
                    id,
                    value: Payload::from("again"),
                },
            );
            settle().await;
            assert_eq!(client.engine.stats().unknown_responses, 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frames_do_not_stop_the_pump() {
    init_tracing();
    LocalSet::new()
        .run_until(async {
            let network = MemoryNetwork::new();
            let server = Peer::join(&network, SERVER);
            server.engine.subscribe_fn(|carrier| carrier.reply(true));

            let raw = network.join(PeerId::new(7));
            raw.send(SERVER, b"not an envelope".to_vec()).unwrap();
            inject(
                &raw,
                SERVER,
                &Envelope::Message {
                    id: RequestId::new(1),
                    payload: Payload::null(),
                },
            );

            let answer = raw.recv().await.unwrap();
            assert_eq!(answer.sender, SERVER);
            assert_eq!(server.engine.stats().malformed_frames, 1);
            assert_eq!(server.engine.stats().messages_answered, 1);
        })
        .await;
}
