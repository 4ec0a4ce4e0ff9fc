use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use babelcall_api::state::AppState;
use babelcall_api::build_router;
use babelcall_config::{RecognitionSettings, Settings};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use super::mock_backends::{MockSpeech, MockTranslator};

/// Spawns the real router on an ephemeral port with scripted backends.
pub struct TestApp {
    pub addr: SocketAddr,
    pub speech: Arc<MockSpeech>,
    pub state: AppState,
    pub http: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(
            RecognitionSettings {
                restart_delay_ms: 50,
                ..RecognitionSettings::default()
            },
            MockTranslator::default(),
        )
        .await
    }

    pub async fn spawn_with(recognition: RecognitionSettings, translator: MockTranslator) -> Self {
        let mut settings = Settings::default();
        settings.recognition = recognition;

        let speech = MockSpeech::new();
        let state = AppState::new(settings, speech.clone(), Arc::new(translator));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let router = build_router(state.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                panic!("test server on {addr} exited: {e}");
            }
        });

        Self {
            addr,
            speech,
            state,
            http: reqwest::Client::new(),
        }
    }

    /// `query` is the raw query string, without the leading `?`.
    pub async fn connect(&self, query: &str) -> WsClient {
        let url = if query.is_empty() {
            format!("ws://{}/ws", self.addr)
        } else {
            format!("ws://{}/ws?{}", self.addr, query)
        };
        let (stream, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("websocket connect");
        WsClient { stream }
    }

    pub async fn get_json(&self, path: &str) -> (u16, serde_json::Value) {
        let resp = self
            .http
            .get(format!("http://{}{}", self.addr, path))
            .send()
            .await
            .expect("http request");
        let status = resp.status().as_u16();
        let body = resp.json().await.unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    /// Re-sends one audio chunk until the given recognizer stream sees
    /// it, or the deadline passes. Audio sent before a stream is fully
    /// live is dropped by design, so single-shot sends are racy.
    pub async fn pump_audio_until_received(
        &self,
        client: &mut WsClient,
        stream_idx: usize,
        deadline: Duration,
    ) -> bool {
        let start = tokio::time::Instant::now();
        while start.elapsed() < deadline {
            client.send_audio(vec![7u8; 320]).await;
            let stream = self.speech.stream(stream_idx);
            if stream.recv_audio(Duration::from_millis(50)).await.is_some() {
                return true;
            }
        }
        false
    }

    /// Polls until the registry reaches the expected participant count,
    /// so tests can wait out asynchronous disconnect cleanup.
    pub async fn wait_for_participants(&self, n: usize) {
        for _ in 0..400 {
            if self.state.registry.participant_count() == n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "registry never reached {n} participants (got {})",
            self.state.registry.participant_count()
        );
    }
}

pub struct WsClient {
    stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
}

impl WsClient {
    pub async fn send_audio(&mut self, chunk: Vec<u8>) {
        self.stream
            .send(Message::Binary(chunk.into()))
            .await
            .expect("send audio frame");
    }

    pub async fn send_text(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("send text frame");
    }

    /// Next caption payload, skipping protocol frames.
    pub async fn next_caption(&mut self, wait: Duration) -> serde_json::Value {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let remaining = deadline
                .checked_duration_since(tokio::time::Instant::now())
                .expect("timed out waiting for caption");
            let msg = tokio::time::timeout(remaining, self.stream.next())
                .await
                .expect("timed out waiting for caption")
                .expect("connection closed")
                .expect("websocket error");
            match msg {
                Message::Text(text) => {
                    return serde_json::from_str(text.as_str()).expect("caption is JSON");
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    /// Waits for a protocol-level ping from the server, skipping any
    /// other frames that arrive first.
    pub async fn expect_ping(&mut self, wait: Duration) {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let remaining = deadline
                .checked_duration_since(tokio::time::Instant::now())
                .expect("timed out waiting for ping");
            let msg = tokio::time::timeout(remaining, self.stream.next())
                .await
                .expect("timed out waiting for ping")
                .expect("connection closed")
                .expect("websocket error");
            if matches!(msg, Message::Ping(_)) {
                return;
            }
        }
    }

    /// Waits for the server to close this connection.
    pub async fn expect_server_close(&mut self, wait: Duration) {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let remaining = deadline
                .checked_duration_since(tokio::time::Instant::now())
                .expect("server did not close the connection");
            match tokio::time::timeout(remaining, self.stream.next()).await {
                Ok(None) | Ok(Some(Ok(Message::Close(_)))) | Ok(Some(Err(_))) => return,
                Ok(Some(Ok(_))) => continue,
                Err(_) => panic!("server did not close the connection"),
            }
        }
    }

    /// Asserts that no caption arrives within `wait`.
    pub async fn expect_no_caption(&mut self, wait: Duration) {
        let result = tokio::time::timeout(wait, self.stream.next()).await;
        match result {
            Err(_) => {}
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {}
            Ok(other) => panic!("expected silence, got {other:?}"),
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
