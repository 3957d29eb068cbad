use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use quadbot::catalog::Catalog;
use quadbot::dialogue::{BookingLedger, DialogueEngine};
use quadbot::history::InMemoryTranscript;
use quadbot::occupancy::OccupancySimulator;
use quadbot::router::Assistant;
use quadbot::wire;

// ── Test infrastructure ──────────────────────────────────────

async fn start_test_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let catalog = Arc::new(Catalog::new());
    let ledger = Arc::new(BookingLedger::new(catalog.clone()));
    let dialogue = Arc::new(DialogueEngine::new(catalog.clone(), ledger));
    let sim = Arc::new(OccupancySimulator::new(catalog));
    let assistant = Arc::new(Assistant::new(
        dialogue,
        sim,
        Arc::new(InMemoryTranscript::new()),
        None,
    ));

    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let assistant = assistant.clone();
            tokio::spawn(async move {
                let _ = wire::process_connection(socket, assistant).await;
            });
        }
    });

    addr
}

struct Client {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, writer) = stream.into_split();
        Client {
            reader: BufReader::new(read),
            writer,
        }
    }

    async fn send(&mut self, request: Value) -> Value {
        self.send_raw(&request.to_string()).await
    }

    async fn send_raw(&mut self, line: &str) -> Value {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .unwrap();
        let mut reply = String::new();
        self.reader.read_line(&mut reply).await.unwrap();
        serde_json::from_str(&reply).unwrap()
    }
}

// ── Protocol behavior ────────────────────────────────────────

#[tokio::test]
async fn message_round_trip() {
    let addr = start_test_server().await;
    let mut client = Client::connect(addr).await;

    let reply = client
        .send(json!({
            "type": "message",
            "text": "hello",
            "user_id": "u1",
            "session_id": "s1",
        }))
        .await;

    assert_eq!(reply["type"], "message");
    assert_eq!(reply["intent"], "greeting");
    assert_eq!(reply["category"], "student");
    assert!(reply["text"].as_str().unwrap().contains("Hello"));
    assert!(reply["confidence"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn booking_conversation_over_the_socket() {
    let addr = start_test_server().await;
    let mut client = Client::connect(addr).await;

    let msg = |text: &str| {
        json!({
            "type": "message",
            "text": text,
            "user_id": "u1",
            "session_id": "sock-1",
        })
    };

    let reply = client.send(msg("I want to book a study room")).await;
    assert_eq!(reply["intent"], "room_booking_purpose");

    let reply = client.send(msg("group project")).await;
    assert_eq!(reply["intent"], "room_booking_attendees");

    let reply = client.send(msg("3")).await;
    assert_eq!(reply["intent"], "room_booking_location");
}

#[tokio::test]
async fn history_request_returns_ordered_turns() {
    let addr = start_test_server().await;
    let mut client = Client::connect(addr).await;

    client
        .send(json!({
            "type": "message",
            "text": "hello",
            "user_id": "u9",
            "session_id": "s9",
        }))
        .await;

    let reply = client
        .send(json!({
            "type": "history",
            "user_id": "u9",
            "session_id": "s9",
        }))
        .await;

    assert_eq!(reply["type"], "history");
    let turns = reply["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["text"], "hello");
    assert_eq!(turns[1]["role"], "assistant");
    assert_eq!(turns[1]["intent"], "greeting");
}

#[tokio::test]
async fn insight_reply_is_nullable() {
    let addr = start_test_server().await;
    let mut client = Client::connect(addr).await;

    let reply = client
        .send(json!({"type": "insight", "session_id": "s1"}))
        .await;
    assert_eq!(reply["type"], "insight");
    // Depends on the hour and the dice; either way the field is present.
    assert!(reply.as_object().unwrap().contains_key("text"));
}

#[tokio::test]
async fn malformed_json_gets_an_error_reply() {
    let addr = start_test_server().await;
    let mut client = Client::connect(addr).await;

    let reply = client.send_raw("this is not json").await;
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().contains("invalid request"));

    // The connection survives and keeps serving.
    let reply = client
        .send(json!({"type": "message", "text": "hello", "session_id": "s2"}))
        .await;
    assert_eq!(reply["type"], "message");
}

#[tokio::test]
async fn unknown_request_type_is_an_error() {
    let addr = start_test_server().await;
    let mut client = Client::connect(addr).await;

    let reply = client.send(json!({"type": "shutdown"})).await;
    assert_eq!(reply["type"], "error");
}
