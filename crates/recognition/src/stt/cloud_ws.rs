use anyhow::Context;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use super::{RecognitionEvent, SpeechStream, StreamConfig};

/// Streaming STT backend speaking JSON-over-WebSocket.
///
/// Protocol: after connecting, a JSON start frame configures the stream;
/// audio follows as binary frames; the server replies with JSON result
/// frames until it closes the socket. Recognizers in this family close
/// the stream after a bounded stretch of silence, so callers must be
/// prepared to reopen at any time.
pub struct WsSpeechBackend {
    url: String,
    api_key: String,
    /// Acoustic model variant requested at stream start, e.g.
    /// "enhanced_phone_call".
    model: String,
}

#[derive(Serialize)]
struct StartRequest<'a> {
    api_key: &'a str,
    model: &'a str,
    audio_format: &'a str,
    sample_rate_hz: u32,
    language: &'a str,
    interim_results: bool,
    enable_automatic_punctuation: bool,
}

#[derive(Deserialize, Debug, Default)]
struct ResultFrame {
    #[serde(default)]
    text: String,
    #[serde(default)]
    is_final: bool,
    #[serde(default)]
    error: Option<String>,
}

impl WsSpeechBackend {
    pub fn new(url: &str, api_key: &str, model: &str) -> Self {
        Self {
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SpeechStream for WsSpeechBackend {
    async fn open(
        &self,
        config: StreamConfig,
    ) -> anyhow::Result<(mpsc::Sender<Vec<u8>>, mpsc::Receiver<RecognitionEvent>)> {
        let (ws, _) = connect_async(&self.url)
            .await
            .with_context(|| format!("failed to connect to recognizer at '{}'", self.url))?;
        let (mut sink, mut stream) = ws.split();

        let start = StartRequest {
            api_key: &self.api_key,
            model: &self.model,
            audio_format: "pcm_s16le",
            sample_rate_hz: config.sample_rate,
            language: &config.language,
            interim_results: config.interim_results,
            enable_automatic_punctuation: config.automatic_punctuation,
        };
        let start_json = serde_json::to_string(&start)?;
        sink.send(Message::Text(start_json.into()))
            .await
            .context("failed to send recognizer start frame")?;

        let (audio_tx, mut audio_rx) = mpsc::channel::<Vec<u8>>(64);
        let (event_tx, event_rx) = mpsc::channel::<RecognitionEvent>(64);

        // Audio feed: binary frames until the caller drops the sender,
        // then a close frame so the server flushes its last results.
        tokio::spawn(async move {
            while let Some(chunk) = audio_rx.recv().await {
                if sink.send(Message::Binary(chunk.into())).await.is_err() {
                    break;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
            debug!("recognizer audio feed closed");
        });

        // Result feed: runs until the server closes or errors, which for
        // callers shows up as the event receiver closing.
        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(raw)) => {
                        let frame: ResultFrame = match serde_json::from_str(raw.as_str()) {
                            Ok(f) => f,
                            Err(e) => {
                                debug!(%e, "unparseable recognizer frame, skipping");
                                continue;
                            }
                        };
                        if let Some(err) = frame.error {
                            warn!(%err, "recognizer reported stream error");
                            break;
                        }
                        let event = RecognitionEvent {
                            text: frame.text,
                            is_final: frame.is_final,
                        };
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!(%e, "recognizer stream transport error");
                        break;
                    }
                }
            }
            debug!("recognizer result feed ended");
        });

        Ok((audio_tx, event_rx))
    }
}
