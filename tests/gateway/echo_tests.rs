//! Echo and Heartbeat Probe Tests
//!
//! Binary frames come back verbatim, exactly once, to the sender only;
//! protocol-level pings come back as pongs with the same payload.

use pretty_assertions::assert_eq;

use tokio_tungstenite::tungstenite::Message;

use crate::common::{spawn_app, WsClient};

#[tokio::test]
async fn binary_payload_echoes_verbatim_to_unregistered_sender() {
    let server = spawn_app().await;
    let mut client = WsClient::connect_and_welcome(&server).await;

    let payload = vec![0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x7F];
    client.send_binary(payload.clone()).await;

    assert_eq!(client.recv_binary().await, payload);
    // Exactly once
    client.assert_silent().await;
}

#[tokio::test]
async fn binary_payload_echoes_to_registered_sender_without_broadcast() {
    let server = spawn_app().await;
    let mut alice = WsClient::connect_and_welcome(&server).await;
    alice.register("alice").await;
    let mut bob = WsClient::connect_and_welcome(&server).await;
    let _joined = alice.recv_envelope().await;

    let payload: Vec<u8> = (0..=255).collect();
    alice.send_binary(payload.clone()).await;

    assert_eq!(alice.recv_binary().await, payload);
    bob.assert_silent().await;
}

#[tokio::test]
async fn empty_binary_payload_echoes_as_empty() {
    let server = spawn_app().await;
    let mut client = WsClient::connect_and_welcome(&server).await;

    client.send_binary(Vec::new()).await;

    assert_eq!(client.recv_binary().await, Vec::<u8>::new());
}

#[tokio::test]
async fn protocol_ping_answers_with_matching_pong() {
    let server = spawn_app().await;
    let mut client = WsClient::connect_and_welcome(&server).await;

    let payload = b"heartbeat-42".to_vec();
    client.send_ping(payload.clone()).await;

    match client.recv().await {
        Message::Pong(data) => assert_eq!(data.to_vec(), payload),
        other => panic!("expected pong frame, got {other:?}"),
    }
}
