// Shared one-time server bootstrap for the integration tests.
#![allow(dead_code)]

use futures::StreamExt;
use std::{
    // `Arc` shares the published address with the server thread; `OnceLock` writes once.
    sync::{Arc, OnceLock},
    time::Duration,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

// Base URL of the shared server once it has bound its port.
static SERVER_URL: OnceLock<String> = OnceLock::new();
// Guards the bootstrap so concurrent tests start exactly one server.
static SERVER_READY: OnceLock<()> = OnceLock::new();

// Ensure the test server is running and return the shared base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // Own OS thread and runtime so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Ephemeral port avoids collisions with a locally running server.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));

                // Empty, seeded universe so test bodies are the only heavy ones around.
                let settings = grav_server::ServerSettings {
                    seed: Some(7),
                    initial_bodies: 0,
                    ..grav_server::ServerSettings::from_env()
                };
                // Serve until the test process exits.
                grav_server::serve(listener, settings, std::future::pending())
                    .await
                    .expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

// Websocket URL for the game endpoint of the shared server.
pub fn game_url() -> String {
    let base_url = ensure_server();
    format!("{}/game", base_url.replacen("http://", "ws://", 1))
}

pub async fn connect() -> WsStream {
    let (ws, _response) = tokio_tungstenite::connect_async(game_url())
        .await
        .expect("websocket handshake should succeed");
    ws
}

// Next text frame parsed as JSON; non-text frames are skipped.
pub async fn next_json(ws: &mut WsStream) -> serde_json::Value {
    loop {
        let msg = next_message(ws).await;
        if msg.is_text() {
            let text = msg.to_text().expect("text frame");
            return serde_json::from_str(text).expect("server sends valid json");
        }
    }
}

pub async fn next_message(ws: &mut WsStream) -> Message {
    tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("message before timeout")
        .expect("stream still open")
        .expect("valid websocket frame")
}

// Reads the bootstrap frame and returns the assigned body id.
pub async fn assigned_body_id(ws: &mut WsStream) -> String {
    let first = next_json(ws).await;
    first["AssignedBodyId"]
        .as_str()
        .expect("first message carries AssignedBodyId")
        .to_string()
}

// Reads game states until `predicate` holds for one, or panics after `max_frames`.
pub async fn wait_for_state<P>(ws: &mut WsStream, max_frames: usize, predicate: P) -> serde_json::Value
where
    P: Fn(&serde_json::Value) -> bool,
{
    for _ in 0..max_frames {
        let msg = next_json(ws).await;
        let state = &msg["GameState"];
        if state.is_object() && predicate(state) {
            return state.clone();
        }
    }
    panic!("no matching game state within {max_frames} frames");
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    // Strip the scheme so we can use host:port for raw TCP readiness checks.
    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}
