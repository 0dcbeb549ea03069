//! End-to-end tests: a real server on an ephemeral port, driven by WebSocket
//! and HTTP clients.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use hibiki_server::{
    domain::ConnectionRegistry,
    infrastructure::registry::InMemoryConnectionRegistry,
    ui::{Server, ServerError},
    usecase::{BroadcastPublisher, HeartbeatMonitor, ProtocolDispatcher},
};
use serde_json::{Value, json};
use tokio::{net::TcpStream, sync::oneshot, task::JoinHandle, time::timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Helper struct to manage an in-process server's lifecycle
struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
}

impl TestServer {
    async fn start(heartbeat: Duration) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let registry: Arc<dyn ConnectionRegistry> = Arc::new(InMemoryConnectionRegistry::new());
        let server = Server::new(
            registry.clone(),
            Arc::new(ProtocolDispatcher::new(registry.clone(), heartbeat)),
            Arc::new(BroadcastPublisher::new(registry.clone())),
            Arc::new(HeartbeatMonitor::new(registry, heartbeat)),
        );

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(server.serve(listener, async move {
            let _ = rx.await;
        }));

        TestServer {
            addr,
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    /// Request shutdown and wait for `serve` to return.
    async fn shutdown(&mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let task = self.task.take().expect("server already shut down");
        timeout(RECV_TIMEOUT, task)
            .await
            .expect("server did not shut down in time")
            .expect("server task panicked")
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Connect and consume the handshake.
    async fn connect(&self) -> Client {
        let (mut client, _) = connect_async(self.ws_url()).await.unwrap();
        let handshake = next_envelope(&mut client).await;
        assert_eq!(handshake["op"], 1);
        client
    }

    async fn publish(&self, body: Value) -> Value {
        reqwest::Client::new()
            .post(self.http_url("/messages/new"))
            .json(&body)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn connection_count(&self) -> u64 {
        let health: Value = reqwest::get(self.http_url("/api/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        health["connections"].as_u64().unwrap()
    }

    /// Poll the health endpoint until the registry holds `expected` connections.
    async fn wait_for_connections(&self, expected: u64) {
        let result = timeout(RECV_TIMEOUT, async {
            while self.connection_count().await != expected {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        assert!(result.is_ok(), "registry never reached {} connections", expected);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Next text frame as JSON, skipping control frames.
async fn next_envelope(client: &mut Client) -> Value {
    timeout(RECV_TIMEOUT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(text.as_str()).unwrap(),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                other => panic!("expected a text frame, got {:?}", other),
            }
        }
    })
    .await
    .expect("timed out waiting for an envelope")
}

/// True once the server closed the connection (close frame, error or EOF).
async fn wait_for_close(client: &mut Client, within: Duration) -> bool {
    timeout(within, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await
    .is_ok()
}

async fn send(client: &mut Client, text: &str) {
    client.send(Message::text(text)).await.unwrap();
}

#[tokio::test]
async fn test_handshake_then_heartbeat_ack() {
    // given:
    let server = TestServer::start(Duration::from_millis(30000)).await;
    let (mut client, _) = connect_async(server.ws_url()).await.unwrap();

    // when / then: the handshake announces the heartbeat cadence
    assert_eq!(
        next_envelope(&mut client).await,
        json!({"op": 1, "data": {"heartbeat": 30000}})
    );

    // when / then: a heartbeat is acknowledged
    send(&mut client, r#"{"op":10}"#).await;
    assert_eq!(next_envelope(&mut client).await, json!({"op": 11}));
}

#[tokio::test]
async fn test_root_path_also_accepts_websocket() {
    let server = TestServer::start(Duration::from_millis(30000)).await;

    let (mut client, _) = connect_async(format!("ws://{}/", server.addr)).await.unwrap();

    assert_eq!(next_envelope(&mut client).await["op"], 1);
}

#[tokio::test]
async fn test_unknown_op_is_rejected_and_connection_stays_open() {
    // given:
    let server = TestServer::start(Duration::from_millis(30000)).await;
    let mut client = server.connect().await;

    // when:
    send(&mut client, r#"{"op":99}"#).await;

    // then:
    assert_eq!(next_envelope(&mut client).await, json!({"error": 4000}));
    assert_eq!(server.connection_count().await, 1);

    // the session is still usable
    send(&mut client, r#"{"op":10}"#).await;
    assert_eq!(next_envelope(&mut client).await, json!({"op": 11}));
}

#[tokio::test]
async fn test_malformed_json_is_rejected_and_connection_stays_open() {
    let server = TestServer::start(Duration::from_millis(30000)).await;
    let mut client = server.connect().await;

    send(&mut client, "this is not json").await;
    assert_eq!(next_envelope(&mut client).await, json!({"error": 4000}));

    send(&mut client, r#"{"op":10}"#).await;
    assert_eq!(next_envelope(&mut client).await, json!({"op": 11}));
}

#[tokio::test]
async fn test_publish_reaches_open_connections_only() {
    // given: A and B open, C disconnected before publishing
    let server = TestServer::start(Duration::from_millis(30000)).await;
    let mut a = server.connect().await;
    let mut b = server.connect().await;
    let mut c = server.connect().await;
    c.close(None).await.unwrap();
    server.wait_for_connections(2).await;

    // when:
    let response = server.publish(json!({"content": "hello"})).await;

    // then:
    assert_eq!(response, json!({"success": true}));
    let expected = json!({"op": 0, "event": "MESSAGE_CREATED", "data": {"content": "hello"}});
    assert_eq!(next_envelope(&mut a).await, expected);
    assert_eq!(next_envelope(&mut b).await, expected);
}

#[tokio::test]
async fn test_publish_delivers_in_order_per_connection() {
    let server = TestServer::start(Duration::from_millis(30000)).await;
    let mut client = server.connect().await;

    server.publish(json!({"content": "one"})).await;
    server.publish(json!({"content": "two"})).await;

    assert_eq!(next_envelope(&mut client).await["data"]["content"], "one");
    assert_eq!(next_envelope(&mut client).await["data"]["content"], "two");
}

#[tokio::test]
async fn test_publish_without_content_fails() {
    // given:
    let server = TestServer::start(Duration::from_millis(30000)).await;
    let expected = json!({"success": false, "data": {"message": "Missing content."}});

    // when / then:
    assert_eq!(server.publish(json!({})).await, expected);
    assert_eq!(server.publish(json!({"content": ""})).await, expected);
    assert_eq!(server.publish(json!({"content": 42})).await, expected);

    let response: Value = reqwest::Client::new()
        .post(server.http_url("/messages/new"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response, expected);
}

#[tokio::test]
async fn test_publish_accepts_form_encoded_body() {
    // given:
    let server = TestServer::start(Duration::from_millis(30000)).await;
    let mut client = server.connect().await;

    // when:
    let response: Value = reqwest::Client::new()
        .post(server.http_url("/messages/new"))
        .form(&[("content", "hi")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then:
    assert_eq!(response, json!({"success": true}));
    assert_eq!(
        next_envelope(&mut client).await,
        json!({"op": 0, "event": "MESSAGE_CREATED", "data": {"content": "hi"}})
    );
}

#[tokio::test]
async fn test_publish_form_with_empty_content_fails() {
    // given:
    let server = TestServer::start(Duration::from_millis(30000)).await;

    // when:
    let response: Value = reqwest::Client::new()
        .post(server.http_url("/messages/new"))
        .form(&[("content", "")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then:
    assert_eq!(
        response,
        json!({"success": false, "data": {"message": "Missing content."}})
    );
}

#[tokio::test]
async fn test_failed_publish_sends_nothing() {
    let server = TestServer::start(Duration::from_millis(30000)).await;
    let mut client = server.connect().await;

    server.publish(json!({"content": ""})).await;
    server.publish(json!({"content": "after"})).await;

    // the first frame after the handshake is the valid publish
    assert_eq!(next_envelope(&mut client).await["data"]["content"], "after");
}

#[tokio::test]
async fn test_silent_connection_is_terminated() {
    // given:
    let heartbeat = Duration::from_millis(200);
    let server = TestServer::start(heartbeat).await;
    let mut client = server.connect().await;

    // when: the client never heartbeats
    let closed = wait_for_close(&mut client, heartbeat * 10).await;

    // then:
    assert!(closed, "silent connection was not terminated");
    server.wait_for_connections(0).await;
}

#[tokio::test]
async fn test_heartbeating_connection_survives_sweeps() {
    // given:
    let heartbeat = Duration::from_millis(200);
    let server = TestServer::start(heartbeat).await;
    let mut client = server.connect().await;

    // when: heartbeat twice per interval across several sweeps
    for _ in 0..10 {
        tokio::time::sleep(heartbeat / 2).await;
        send(&mut client, r#"{"op":10}"#).await;
        assert_eq!(next_envelope(&mut client).await, json!({"op": 11}));
    }

    // then:
    assert_eq!(server.connection_count().await, 1);
}

#[tokio::test]
async fn test_debug_connections_lists_registry() {
    let server = TestServer::start(Duration::from_millis(30000)).await;
    let _client = server.connect().await;

    let connections: Value = reqwest::get(server.http_url("/debug/connections"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let connections = connections.as_array().unwrap();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0]["alive"], true);
    assert!(connections[0]["connected_at"].is_string());
}

#[tokio::test]
async fn test_http_responses_carry_security_headers() {
    // given:
    let server = TestServer::start(Duration::from_millis(30000)).await;

    // when:
    let response = reqwest::get(server.http_url("/api/health")).await.unwrap();

    // then:
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
}

#[tokio::test]
async fn test_shutdown_closes_open_connections() {
    // given: an idle client that would otherwise stay connected for a long time
    let mut server = TestServer::start(Duration::from_millis(30000)).await;
    let mut client = server.connect().await;
    server.wait_for_connections(1).await;

    // when:
    let result = server.shutdown().await;

    // then: serving ended cleanly and the client saw the connection close
    assert!(result.is_ok());
    assert!(
        wait_for_close(&mut client, RECV_TIMEOUT).await,
        "client was not closed on shutdown"
    );
}
