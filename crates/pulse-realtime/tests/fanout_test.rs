//! Integration tests for the full fan-out path: connection registration,
//! subscribe requests, bus publish, filtered routing, delivery.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use pulse_core::config::GatewayConfig;
use pulse_core::principal::Principal;
use pulse_core::types::{ConversationId, SessionId, SubscriptionId, UserId};
use pulse_core::{ErrorKind, Event};

use pulse_realtime::bus::{EventBus, MemoryEventBus};
use pulse_realtime::connection::handle::ConnectionHandle;
use pulse_realtime::filter::predicates::AllowAllPolicy;
use pulse_realtime::message::types::OutboundMessage;
use pulse_realtime::server::RealtimeGateway;

struct TestGateway {
    gateway: RealtimeGateway,
    bus: Arc<MemoryEventBus>,
}

async fn start_gateway() -> TestGateway {
    let mut config = GatewayConfig::default();
    config.server.shutdown_grace_seconds = 1;

    let bus = Arc::new(MemoryEventBus::new(64));
    let gateway = RealtimeGateway::new(&config, bus.clone(), Arc::new(AllowAllPolicy));
    gateway.start().await.expect("router must start");

    // Let the router's bus subscription attach before tests publish.
    tokio::time::sleep(Duration::from_millis(20)).await;

    TestGateway { gateway, bus }
}

fn principal() -> Principal {
    Principal::authenticated(UserId::new(), SessionId::new(), vec![])
}

async fn connect(
    gw: &TestGateway,
    principal: Principal,
) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
    gw.gateway.connections.register(principal)
}

/// Issues a subscribe frame and consumes the acknowledgment.
async fn subscribe(
    gw: &TestGateway,
    handle: &Arc<ConnectionHandle>,
    rx: &mut mpsc::Receiver<OutboundMessage>,
    channel: &str,
) -> SubscriptionId {
    let frame = format!(r#"{{"type":"subscribe","channel":"{channel}"}}"#);
    gw.gateway.connections.handle_inbound(handle.id, &frame).await;

    match timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("ack must arrive")
        .expect("connection open")
    {
        OutboundMessage::Subscribed {
            subscription_id, ..
        } => subscription_id,
        other => panic!("expected subscribe ack, got {other:?}"),
    }
}

async fn next_event(rx: &mut mpsc::Receiver<OutboundMessage>) -> (String, serde_json::Value) {
    match timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("event must arrive")
        .expect("connection open")
    {
        OutboundMessage::Event {
            channel, payload, ..
        } => (channel, payload),
        other => panic!("expected event frame, got {other:?}"),
    }
}

async fn assert_no_event(rx: &mut mpsc::Receiver<OutboundMessage>) {
    let outcome = timeout(Duration::from_millis(150), rx.recv()).await;
    assert!(outcome.is_err(), "expected silence, got {outcome:?}");
}

#[tokio::test]
async fn test_message_delivered_exactly_once() {
    let gw = start_gateway().await;
    let alice = principal();
    let (handle, mut rx) = connect(&gw, alice).await;

    let conversation = ConversationId::new();
    subscribe(&gw, &handle, &mut rx, &format!("messageReceived.{conversation}")).await;

    let sender = UserId::new();
    gw.gateway
        .publisher
        .message_received(
            conversation,
            sender,
            serde_json::json!({"id": "m1", "content": "hi"}),
        )
        .await
        .unwrap();

    let (channel, payload) = next_event(&mut rx).await;
    assert_eq!(channel, format!("messageReceived.{conversation}"));
    assert_eq!(payload, serde_json::json!({"id": "m1", "content": "hi"}));

    assert_no_event(&mut rx).await;
}

#[tokio::test]
async fn test_own_presence_is_not_echoed() {
    let gw = start_gateway().await;
    let alice = principal();
    let alice_id = alice.user_id;
    let (handle, mut rx) = connect(&gw, alice).await;

    subscribe(&gw, &handle, &mut rx, "presence.*").await;

    // A's own presence change is suppressed by the exclude-self filter.
    gw.gateway
        .publisher
        .presence_changed(alice_id, serde_json::json!({"status": "online"}))
        .await
        .unwrap();
    assert_no_event(&mut rx).await;

    // Another user's presence change is delivered, with the originator
    // merged into the payload.
    let bob_id = UserId::new();
    gw.gateway
        .publisher
        .presence_changed(bob_id, serde_json::json!({"status": "away"}))
        .await
        .unwrap();

    let (channel, payload) = next_event(&mut rx).await;
    assert_eq!(channel, format!("presence.{bob_id}"));
    assert_eq!(payload["status"], "away");
    assert_eq!(payload["userId"], bob_id.to_string());
}

#[tokio::test]
async fn test_disconnect_before_publish_is_silent() {
    let gw = start_gateway().await;
    let alice = principal();
    let (handle, mut rx) = connect(&gw, alice).await;

    let conversation = ConversationId::new();
    subscribe(&gw, &handle, &mut rx, &format!("typingStatus.{conversation}")).await;

    gw.gateway.connections.unregister(handle.id);
    assert_eq!(gw.gateway.registry.total_subscriptions(), 0);

    // Publishing after teardown must not error and must target nothing.
    gw.gateway
        .publisher
        .typing_status(conversation, UserId::new(), serde_json::json!({"typing": true}))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gw.gateway.connections.connection_count(), 0);
}

#[tokio::test]
async fn test_friend_status_reaches_both_participants_once() {
    let gw = start_gateway().await;
    let alice = principal();
    let bob = principal();
    let alice_user = alice.user_id;
    let bob_user = bob.user_id;

    let (alice_handle, mut alice_rx) = connect(&gw, alice).await;
    let (bob_handle, mut bob_rx) = connect(&gw, bob).await;

    subscribe(
        &gw,
        &alice_handle,
        &mut alice_rx,
        &format!("friendStatus.{alice_user}"),
    )
    .await;
    subscribe(
        &gw,
        &bob_handle,
        &mut bob_rx,
        &format!("friendStatus.{bob_user}"),
    )
    .await;

    gw.gateway
        .publisher
        .friend_status_changed(alice_user, bob_user, serde_json::json!({"status": "accepted"}))
        .await
        .unwrap();

    let (alice_channel, _) = next_event(&mut alice_rx).await;
    assert_eq!(alice_channel, format!("friendStatus.{alice_user}"));
    assert_no_event(&mut alice_rx).await;

    let (bob_channel, _) = next_event(&mut bob_rx).await;
    assert_eq!(bob_channel, format!("friendStatus.{bob_user}"));
    assert_no_event(&mut bob_rx).await;
}

#[tokio::test]
async fn test_broker_outage_and_recovery() {
    let gw = start_gateway().await;
    let alice = principal();
    let (handle, mut rx) = connect(&gw, alice).await;
    subscribe(&gw, &handle, &mut rx, "activity.*").await;

    gw.bus.set_healthy(false);
    assert!(!gw.gateway.is_ready());

    let err = gw
        .gateway
        .publisher
        .activity_changed(UserId::new(), serde_json::json!({"active": true}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::BrokerUnavailable);

    // Existing connections stay open through the outage.
    assert_eq!(gw.gateway.connections.connection_count(), 1);

    gw.bus.set_healthy(true);
    assert!(gw.gateway.is_ready());

    gw.gateway
        .publisher
        .activity_changed(UserId::new(), serde_json::json!({"active": true}))
        .await
        .unwrap();
    let (channel, _) = next_event(&mut rx).await;
    assert!(channel.starts_with("activity."));
}

#[tokio::test]
async fn test_delivery_failure_is_isolated_per_connection() {
    let gw = start_gateway().await;
    let alice = principal();
    let bob = principal();

    let (alice_handle, mut alice_rx) = connect(&gw, alice).await;
    let (bob_handle, mut bob_rx) = connect(&gw, bob).await;

    // Subscribe both through the registry path; alice's outbound receiver
    // is then dropped to simulate a peer that is gone.
    subscribe(&gw, &alice_handle, &mut alice_rx, "activity.*").await;
    subscribe(&gw, &bob_handle, &mut bob_rx, "activity.*").await;
    drop(alice_rx);

    gw.gateway
        .publisher
        .activity_changed(UserId::new(), serde_json::json!({"active": true}))
        .await
        .unwrap();

    // Bob still receives despite alice's dead outbound.
    let (channel, _) = next_event(&mut bob_rx).await;
    assert!(channel.starts_with("activity."));

    // Alice's write failure was treated as an implicit disconnect.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(gw.gateway.connections.connection_count(), 1);
    assert!(gw.gateway.connections.get(alice_handle.id).is_none());
}

#[tokio::test]
async fn test_malformed_event_fails_closed_and_loop_survives() {
    let gw = start_gateway().await;
    let alice = principal();
    let (handle, mut rx) = connect(&gw, alice).await;
    subscribe(&gw, &handle, &mut rx, "presence.*").await;

    // No origin and a non-string userId: filter evaluation fails closed.
    gw.bus
        .publish(Event::new(
            "presence.u1",
            serde_json::json!({"userId": 42, "status": "online"}),
        ))
        .await
        .unwrap();
    assert_no_event(&mut rx).await;

    // The delivery loop keeps routing subsequent events.
    let bob_id = UserId::new();
    gw.gateway
        .publisher
        .presence_changed(bob_id, serde_json::json!({"status": "online"}))
        .await
        .unwrap();
    let (channel, _) = next_event(&mut rx).await;
    assert_eq!(channel, format!("presence.{bob_id}"));
}

#[tokio::test]
async fn test_graceful_shutdown_closes_connections() {
    let gw = start_gateway().await;
    let (handle, mut rx) = connect(&gw, principal()).await;

    gw.gateway.shutdown().await;
    assert_eq!(gw.gateway.connections.connection_count(), 0);
    assert!(!handle.is_alive());

    // Once the pool's reference is gone, the outbound channel closes.
    drop(handle);
    let next = timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(matches!(next, Ok(None)));
}
