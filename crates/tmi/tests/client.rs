//! Integration tests for the chat client: handshake, probe handling, event
//! dispatch, and both directions of close.
//!
//! A plain `tokio-tungstenite` server stands in for the chat server. It
//! sees exactly the lines the client writes and sends whatever frames a
//! test scripts.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tmi::prelude::*;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ServerWs = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

const WAIT: Duration = Duration::from_secs(5);

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have local addr");
    (listener, format!("ws://{addr}"))
}

async fn accept(listener: &TcpListener) -> ServerWs {
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .expect("client should connect in time")
        .expect("should accept");
    tokio_tungstenite::accept_async(stream)
        .await
        .expect("handshake should succeed")
}

/// Next text line from the client, or `None` once it has closed.
async fn next_line(ws: &mut ServerWs) -> Option<String> {
    loop {
        let msg = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("client should write in time");
        match msg {
            Some(Ok(Message::Text(text))) => return Some(text.as_str().to_owned()),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

async fn send(ws: &mut ServerWs, line: &str) {
    ws.send(Message::text(format!("{line}\r\n")))
        .await
        .expect("server send");
}

/// Accepts the client and consumes its three handshake lines.
async fn accept_and_handshake(listener: &TcpListener) -> ServerWs {
    let mut ws = accept(listener).await;
    assert_eq!(next_line(&mut ws).await.as_deref(), Some("PASS oauth:abc123"));
    assert_eq!(next_line(&mut ws).await.as_deref(), Some("NICK bot"));
    assert_eq!(
        next_line(&mut ws).await.as_deref(),
        Some("CAP REQ :twitch.tv/commands")
    );
    ws
}

fn start(url: &str) -> (ChatClient, mpsc::UnboundedReceiver<ChatEvent>) {
    let mut builder = ChatClient::builder().endpoint(url);
    let events = builder.subscribe();
    (builder.connect(Credentials::new("bot", "abc123")), events)
}

async fn next_event(events: &mut mpsc::UnboundedReceiver<ChatEvent>) -> ChatEvent {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("event should arrive in time")
        .expect("event channel open")
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_handshake_then_ready() {
    let (listener, url) = listen().await;
    let (client, mut events) = start(&url);
    assert_eq!(client.state(), SessionState::Connecting);

    let _ws = accept_and_handshake(&listener).await;

    assert_eq!(next_event(&mut events).await, ChatEvent::Ready);
    assert_eq!(
        client.wait_for(SessionState::Authenticated).await,
        SessionState::Authenticated
    );
}

#[tokio::test]
async fn test_join_sends_single_normalized_line() {
    let (listener, url) = listen().await;
    let (client, mut events) = start(&url);
    let mut ws = accept_and_handshake(&listener).await;
    assert_eq!(next_event(&mut events).await, ChatEvent::Ready);

    client.join_channel("bar").unwrap();
    client.send_message("#bar", "hi: all").unwrap();

    assert_eq!(next_line(&mut ws).await.as_deref(), Some("JOIN #bar"));
    assert_eq!(next_line(&mut ws).await.as_deref(), Some("PRIVMSG #bar :hi: all"));
}

#[tokio::test]
async fn test_commands_queued_while_connecting_follow_handshake() {
    let (listener, url) = listen().await;
    let (client, _events) = start(&url);

    // Issued before the socket is even accepted.
    client.join_channel("early").unwrap();

    let mut ws = accept_and_handshake(&listener).await;
    assert_eq!(next_line(&mut ws).await.as_deref(), Some("JOIN #early"));
}

// =========================================================================
// Probe
// =========================================================================

#[tokio::test]
async fn test_ping_answered_with_fixed_pong() {
    let (listener, url) = listen().await;
    let (client, mut events) = start(&url);
    let mut ws = accept_and_handshake(&listener).await;
    assert_eq!(next_event(&mut events).await, ChatEvent::Ready);
    let before = client.last_ping();

    tokio::time::sleep(Duration::from_millis(5)).await;
    send(&mut ws, "PING :tmi.twitch.tv").await;

    assert_eq!(next_line(&mut ws).await.as_deref(), Some("PONG :tmi.twitch.tv"));
    assert!(client.last_ping() > before);

    // Exactly one reply: the next thing the server sees is our own command.
    client.leave_channel("bar").unwrap();
    assert_eq!(next_line(&mut ws).await.as_deref(), Some("PART #bar"));
}

// =========================================================================
// Inbound routing
// =========================================================================

#[tokio::test]
async fn test_message_and_notice_events_in_order() {
    let (listener, url) = listen().await;
    let (_client, mut events) = start(&url);
    let mut ws = accept_and_handshake(&listener).await;
    assert_eq!(next_event(&mut events).await, ChatEvent::Ready);

    // One frame carrying several lines, including ones nobody listens for.
    ws.send(Message::text(
        ":tmi.twitch.tv 001 bot :Welcome, GLHF!\r\n\
         :alice!alice@alice.tmi.twitch.tv PRIVMSG #bar :look: colons\r\n\
         :tmi.twitch.tv CAP * ACK :twitch.tv/commands\r\n\
         :tmi.twitch.tv NOTICE #bar :Now hosting friend.\r\n",
    ))
    .await
    .unwrap();

    match next_event(&mut events).await {
        ChatEvent::Message(msg) => {
            assert_eq!(msg.user, "alice");
            assert_eq!(msg.kind, MessageKind::Privmsg);
            assert_eq!(msg.channel, "#bar");
            assert_eq!(msg.content, "look: colons");
        }
        other => panic!("expected message, got {other:?}"),
    }
    match next_event(&mut events).await {
        ChatEvent::Notice(notice) => {
            assert_eq!(notice.channel, "#bar");
            assert_eq!(notice.content, "Now hosting friend.");
        }
        other => panic!("expected notice, got {other:?}"),
    }
    assert!(events.try_recv().is_err(), "unrecognized lines raise nothing");
}

#[tokio::test]
async fn test_callback_listeners_run_in_registration_order() {
    let (listener, url) = listen().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let first = tx.clone();
    let second = tx;
    let _client = ChatClient::builder()
        .endpoint(url)
        .on_message(move |m| {
            let _ = first.send(format!("first:{}", m.content));
        })
        .on_message(move |m| {
            let _ = second.send(format!("second:{}", m.content));
        })
        .connect(Credentials::new("bot", "abc123"));

    let mut ws = accept_and_handshake(&listener).await;
    send(&mut ws, ":a!a@a PRIVMSG #c :x").await;

    let a = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    let b = tokio::time::timeout(WAIT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(a, "first:x");
    assert_eq!(b, "second:x");
}

// =========================================================================
// Close
// =========================================================================

#[tokio::test]
async fn test_server_close_fires_close_once() {
    let (listener, url) = listen().await;
    let (client, mut events) = start(&url);
    let mut ws = accept_and_handshake(&listener).await;
    assert_eq!(next_event(&mut events).await, ChatEvent::Ready);

    ws.send(Message::Close(None)).await.unwrap();

    assert_eq!(next_event(&mut events).await, ChatEvent::Close);
    assert_eq!(
        client.wait_for(SessionState::Closed).await,
        SessionState::Closed
    );
    assert_eq!(client.join_channel("bar"), Err(SessionError::Closed));

    let handle = client.handle();
    tokio::time::timeout(WAIT, client.closed())
        .await
        .expect("driver should finish")
        .expect("clean close");

    // Driver is gone and the channel drained: no second close.
    let after = tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("channel should close with the driver");
    assert!(after.is_none());
    assert_eq!(handle.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_client_close_closes_socket_without_quit() {
    let (listener, url) = listen().await;
    let (client, mut events) = start(&url);
    let mut ws = accept_and_handshake(&listener).await;
    assert_eq!(next_event(&mut events).await, ChatEvent::Ready);

    client.close();
    client.close();

    // The server sees the socket close, not a QUIT line.
    assert_eq!(next_line(&mut ws).await, None);
    assert_eq!(next_event(&mut events).await, ChatEvent::Close);
    tokio::time::timeout(WAIT, client.closed())
        .await
        .expect("driver should finish")
        .expect("clean close");
}

#[tokio::test]
async fn test_connect_refused_surfaces_as_close() {
    // Take a free port, then release it so nothing answers.
    let (listener, url) = listen().await;
    drop(listener);

    let (client, mut events) = start(&url);

    assert_eq!(next_event(&mut events).await, ChatEvent::Close);
    let result = tokio::time::timeout(WAIT, client.closed())
        .await
        .expect("driver should finish");
    assert!(matches!(result, Err(TmiError::Transport(_))));
}

#[tokio::test]
async fn test_dropping_every_handle_closes_connection() {
    let (listener, url) = listen().await;
    let (client, mut events) = start(&url);
    let mut ws = accept_and_handshake(&listener).await;
    assert_eq!(next_event(&mut events).await, ChatEvent::Ready);

    drop(client);

    assert_eq!(next_line(&mut ws).await, None);
    assert_eq!(next_event(&mut events).await, ChatEvent::Close);
}
