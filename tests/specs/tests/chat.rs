// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end chat tests: the real router served in-process, driven by raw
//! WebSocket clients and by the huddle client library.

use serde_json::json;

use huddle::session::{ClientState, SessionEvent, WsConnector, WsSession};
use huddle_server::protocol::PresenceKind;
use huddle_specs::{ChatClient, TestServer};

// -- HTTP surface -------------------------------------------------------------

#[tokio::test]
async fn health_reports_empty_server() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let health = server.health().await?;
    assert_eq!(health["status"], "running");
    assert_eq!(health["rooms"], json!(0));
    assert_eq!(health["sessions"], json!(0));

    let rooms = server.rooms().await?;
    assert_eq!(rooms["rooms"], json!([]));
    Ok(())
}

#[tokio::test]
async fn unknown_route_gets_error_envelope() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let resp = reqwest::get(format!("{}/api/v1/nope", server.base_url())).await?;
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    Ok(())
}

// -- Join, message, leave -----------------------------------------------------

#[tokio::test]
async fn two_members_exchange_messages() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut alice = ChatClient::join(&server.ws_url(), "Alice", "ABC123").await?;
    server.wait_for_sessions(1).await?;

    let rooms = server.rooms().await?;
    assert_eq!(rooms["rooms"], json!([{ "room": "ABC123", "members": ["Alice"] }]));

    let mut bob = ChatClient::join(&server.ws_url(), "Bob", "ABC123").await?;

    // Alice is told about Bob; Bob is not told about himself.
    let presence = alice.next_frame().await?;
    assert_eq!(presence["event"], "joined");
    assert_eq!(presence["sender"], "Bob");
    bob.expect_silence().await?;

    let rooms = server.rooms().await?;
    assert_eq!(rooms["rooms"], json!([{ "room": "ABC123", "members": ["Alice", "Bob"] }]));

    // Bob's message reaches Alice, with no echo back to Bob.
    bob.send_text("hi").await?;
    let msg = alice.next_frame().await?;
    assert_eq!(msg["sender"], "Bob");
    assert_eq!(msg["message"], "hi");
    assert_eq!(msg["receiver"], "Everyone");
    assert!(msg.get("event").is_none());
    bob.expect_silence().await?;
    Ok(())
}

#[tokio::test]
async fn leaving_empties_and_drops_the_room() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut alice = ChatClient::join(&server.ws_url(), "Alice", "ABC123").await?;
    let mut bob = ChatClient::join(&server.ws_url(), "Bob", "ABC123").await?;
    let _ = alice.next_frame().await?; // Bob's join presence

    alice.leave().await?;
    let presence = bob.next_frame().await?;
    assert_eq!(presence["event"], "left");
    assert_eq!(presence["sender"], "Alice");

    server.wait_for_sessions(1).await?;
    let rooms = server.rooms().await?;
    assert_eq!(rooms["rooms"], json!([{ "room": "ABC123", "members": ["Bob"] }]));

    bob.leave().await?;
    server.wait_for_sessions(0).await?;
    let rooms = server.rooms().await?;
    assert_eq!(rooms["rooms"], json!([]), "room entry must vanish with its last member");
    Ok(())
}

#[tokio::test]
async fn rooms_are_isolated() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut one = ChatClient::join(&server.ws_url(), "Alice", "AAA111").await?;
    let mut two = ChatClient::join(&server.ws_url(), "Bob", "BBB222").await?;
    server.wait_for_sessions(2).await?;

    one.send_text("secret").await?;
    two.expect_silence().await?;
    Ok(())
}

#[tokio::test]
async fn room_codes_are_case_insensitive() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut alice = ChatClient::join(&server.ws_url(), "Alice", "ABC123").await?;
    let mut bob = ChatClient::join(&server.ws_url(), "Bob", "abc123").await?;

    let presence = alice.next_frame().await?;
    assert_eq!(presence["sender"], "Bob");

    bob.send_text("same room").await?;
    let msg = alice.next_frame().await?;
    assert_eq!(msg["message"], "same room");

    let rooms = server.rooms().await?;
    assert_eq!(rooms["rooms"][0]["room"], "ABC123");
    Ok(())
}

// -- Teardown edge cases ------------------------------------------------------

#[tokio::test]
async fn abrupt_disconnect_is_cleaned_up_once() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut alice = ChatClient::join(&server.ws_url(), "Alice", "ABC123").await?;
    let bob = ChatClient::join(&server.ws_url(), "Bob", "ABC123").await?;
    let _ = alice.next_frame().await?; // Bob's join presence
    server.wait_for_sessions(2).await?;

    // No leave frame, no close handshake.
    bob.abandon();

    let presence = alice.next_frame().await?;
    assert_eq!(presence["event"], "left");
    assert_eq!(presence["sender"], "Bob");

    server.wait_for_sessions(1).await?;
    let rooms = server.rooms().await?;
    assert_eq!(rooms["rooms"], json!([{ "room": "ABC123", "members": ["Alice"] }]));

    // Exactly once: no second announcement follows.
    alice.expect_silence().await?;
    Ok(())
}

// -- Untrusted input ----------------------------------------------------------

#[tokio::test]
async fn malformed_frames_are_ignored() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut alice = ChatClient::join(&server.ws_url(), "Alice", "ABC123").await?;
    let mut probe = ChatClient::connect(&server.ws_url(), "Mallory", "ABC123").await?;

    // Garbage, unknown types, and pre-join messages all drop silently.
    probe.send_raw("not json at all").await?;
    probe.send_raw(r#"{"type":"shout","data":{}}"#).await?;
    probe.send_text("sent before join").await?;
    alice.expect_silence().await?;
    server.wait_for_sessions(1).await?;

    // The connection survived: a valid join still works.
    probe.send_join().await?;
    let presence = alice.next_frame().await?;
    assert_eq!(presence["sender"], "Mallory");

    probe.send_text("now it counts").await?;
    let msg = alice.next_frame().await?;
    assert_eq!(msg["message"], "now it counts");
    Ok(())
}

#[tokio::test]
async fn invalid_join_is_rejected_without_closing() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut client = ChatClient::connect(&server.ws_url(), "   ", "ABC123").await?;
    client.send_join().await?;

    // No session was created for the blank name.
    server.wait_for_sessions(0).await?;

    // Same connection, corrected name: the join goes through.
    let mut retry = ChatClient::connect(&server.ws_url(), "Alice", "ABC123").await?;
    retry.send_join().await?;
    server.wait_for_sessions(1).await?;

    client.send_raw(r#"{"type":"join","data":{"name":"Mallory","message":[],"room":"ABC123"}}"#)
        .await?;
    let presence = retry.next_frame().await?;
    assert_eq!(presence["sender"], "Mallory");
    Ok(())
}

// -- Client library against the real server -----------------------------------

#[tokio::test]
async fn client_sessions_chat_end_to_end() -> anyhow::Result<()> {
    let server = TestServer::start().await?;

    let mut alice = WsSession::new(WsConnector, server.ws_url());
    alice.submit("Alice", "abc123").await?;
    assert_eq!(alice.state(), ClientState::Joined);
    assert_eq!(alice.room(), "ABC123");

    let mut bob = WsSession::new(WsConnector, server.ws_url());
    bob.submit("Bob", "ABC123").await?;

    // Alice sees Bob arrive.
    let Some(SessionEvent::Message(entry)) = alice.recv().await else {
        anyhow::bail!("expected Bob's join presence");
    };
    assert_eq!(entry.event, Some(PresenceKind::Joined));
    assert_eq!(entry.sender, "Bob");

    // Bob's log gets the optimistic copy, Alice's log the delivery.
    let sent = bob.send("hi")?;
    assert!(sent.own);
    let Some(SessionEvent::Message(received)) = alice.recv().await else {
        anyhow::bail!("expected Bob's message");
    };
    assert!(!received.own);
    assert_eq!(received.sender, "Bob");
    assert_eq!(received.text, "hi");
    assert_eq!(alice.log().len(), 2);
    assert_eq!(bob.log().len(), 1);

    bob.leave();
    assert_eq!(bob.state(), ClientState::Left);
    let Some(SessionEvent::Message(entry)) = alice.recv().await else {
        anyhow::bail!("expected Bob's leave presence");
    };
    assert_eq!(entry.event, Some(PresenceKind::Left));

    server.wait_for_sessions(1).await?;
    Ok(())
}
