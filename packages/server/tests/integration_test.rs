//! Integration tests: the full router served in-process on an ephemeral port,
//! driven over WebSocket (tokio-tungstenite) and HTTP (reqwest).

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use huddle_server::ui::{AppState, Server};
use huddle_shared::time::SystemClock;
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle, time::timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Helper struct to manage the in-process server lifecycle
struct TestServer {
    handle: JoinHandle<()>,
    port: u16,
}

impl TestServer {
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = Server::new(AppState::in_memory(Arc::new(SystemClock), 30));
        let handle = tokio::spawn(async move {
            server.serve(listener).await.unwrap();
        });
        TestServer { handle, port }
    }

    fn ws_url(&self, room: &str) -> String {
        format!("ws://127.0.0.1:{}/ws?room={}", self.port, room)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn connect(url: &str) -> Socket {
    let (socket, _) = connect_async(url).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, frame: Value) {
    socket
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

/// Next JSON frame, skipping pings
async fn recv(socket: &mut Socket) -> Value {
    loop {
        let message = timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("Timeout waiting for frame")
            .unwrap()
            .unwrap();
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

fn participant_count(frame: &Value) -> usize {
    frame["participants"].as_array().map_or(0, Vec::len)
}

/// Read frames until one of type `kind` satisfies `predicate`
async fn recv_until(socket: &mut Socket, kind: &str, predicate: impl Fn(&Value) -> bool) -> Value {
    loop {
        let frame = recv(socket).await;
        if frame["type"] == kind && predicate(&frame) {
            return frame;
        }
    }
}

#[tokio::test]
async fn test_room_join_vote_reveal() {
    // テスト項目: 2人が参加して投票し、公開すると平均と合意度が全員に配信される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = connect(&server.ws_url("sprint")).await;
    let mut bob = connect(&server.ws_url("sprint")).await;
    assert_eq!(recv(&mut alice).await["type"], "roomState");
    assert_eq!(recv(&mut bob).await["type"], "roomState");

    send(&mut alice, json!({"type": "join", "name": "alice"})).await;
    send(&mut bob, json!({"type": "join", "name": "bob"})).await;
    recv_until(&mut alice, "roomState", |f| participant_count(f) == 2).await;

    // when (操作):
    send(&mut alice, json!({"type": "vote", "value": 3})).await;
    send(&mut bob, json!({"type": "vote", "value": 3})).await;
    recv_until(&mut alice, "roomState", |f| {
        f["participants"]
            .as_array()
            .is_some_and(|p| p.iter().all(|x| x["vote"] == 3.0))
    })
    .await;
    send(&mut alice, json!({"type": "reveal"})).await;

    // then (期待する結果):
    let state = recv_until(&mut bob, "roomState", |f| f["isRevealed"] == true).await;
    assert_eq!(state["averageVote"], 3.0);
    assert!(state["agreement"]["symbol"].is_string());

    let snapshot: Value = reqwest::get(server.http_url("/api/rooms/sprint"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot["isRevealed"], true);
}

#[tokio::test]
async fn test_reset_users_forces_logout() {
    // テスト項目: resetUsers で全接続に forceLogout が届き、参加者が空になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = connect(&server.ws_url("retro")).await;
    recv(&mut alice).await;
    send(&mut alice, json!({"type": "join", "name": "alice"})).await;
    recv_until(&mut alice, "roomState", |f| participant_count(f) == 1).await;

    // when (操作):
    send(&mut alice, json!({"type": "resetUsers"})).await;

    // then (期待する結果):
    recv_until(&mut alice, "forceLogout", |_| true).await;
    let state = recv_until(&mut alice, "roomState", |_| true).await;
    assert_eq!(state["participants"], json!([]));
    assert_eq!(state["agreement"], Value::Null);
}

#[tokio::test]
async fn test_ledger_flow_updates_statistics() {
    // テスト項目: HTTP で作成 → 投票 → 公開 → 完了すると集計が1回だけ加算され、statsChanged が配信される
    // given (前提条件):
    let server = TestServer::start().await;
    let http = reqwest::Client::new();
    let mut watcher = connect(&server.ws_url("lobby")).await;
    recv(&mut watcher).await;

    let alice = uuid_like(1);
    let bob = uuid_like(2);
    let session: Value = http
        .post(server.http_url("/api/sessions"))
        .json(&json!({"createdBy": alice, "title": "Sprint 42"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = session["id"].as_str().unwrap().to_string();
    for (user, name, value) in [(&alice, "alice", 3), (&bob, "bob", 5)] {
        let response = http
            .post(server.http_url(&format!("/api/sessions/{}/votes", id)))
            .json(&json!({"userId": user, "username": name, "value": value}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    // when (操作):
    let revealed: Value = http
        .post(server.http_url(&format!("/api/sessions/{}/reveal", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let completed: Value = http
        .post(server.http_url(&format!("/api/sessions/{}/complete", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(revealed["session"]["status"], "revealed");
    assert_eq!(revealed["aggregation"]["outcome"], "folded");
    assert_eq!(completed["session"]["status"], "completed");
    assert_eq!(completed["aggregation"]["outcome"], "completionCounted");
    recv_until(&mut watcher, "statsChanged", |_| true).await;

    let global: Value = http
        .get(server.http_url("/api/stats/global"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(global["totalSessions"], 1);
    assert_eq!(global["completedSessions"], 1);
    assert_eq!(global["processedSessionIds"], json!([id]));

    let history: Value = http
        .get(server.http_url(&format!("/api/users/{}/sessions?limit=5", bob)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["total"], 1);
    assert_eq!(history["items"][0]["title"], "Sprint 42");
}

#[tokio::test]
async fn test_http_errors_use_error_body() {
    // テスト項目: 不正な ID は 400、存在しないセッションは 404 で、どちらもエラー本文を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let http = reqwest::Client::new();

    // when (操作):
    let malformed = http
        .get(server.http_url("/api/sessions/abc/statistics"))
        .send()
        .await
        .unwrap();
    let missing = http
        .get(server.http_url(&format!("/api/sessions/{}", uuid_like(9))))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(malformed.status(), 400);
    assert_eq!(malformed.json::<Value>().await.unwrap()["error"], "invalidIdentifier");
    assert_eq!(missing.status(), 404);
    assert_eq!(missing.json::<Value>().await.unwrap()["error"], "notFound");
}

fn uuid_like(n: u8) -> String {
    format!("00000000-0000-4000-8000-0000000000{:02x}", n)
}
