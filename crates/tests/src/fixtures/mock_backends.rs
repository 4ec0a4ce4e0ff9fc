use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use babelcall_recognition::stt::{RecognitionEvent, SpeechStream, StreamConfig};
use babelcall_services::translate::Translator;
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Scripted recognizer backend: every `open` hands the test a handle it
/// can use to inject recognition events and observe forwarded audio.
pub struct MockSpeech {
    streams: Mutex<Vec<MockStreamHandle>>,
}

#[derive(Clone)]
pub struct MockStreamHandle {
    /// `None` once the stream has been failed; the session sees the
    /// event receiver close.
    events: Arc<Mutex<Option<mpsc::Sender<RecognitionEvent>>>>,
    audio: Arc<tokio::sync::Mutex<mpsc::Receiver<Vec<u8>>>>,
    pub language: String,
}

impl MockSpeech {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            streams: Mutex::new(Vec::new()),
        })
    }

    pub fn opened(&self) -> usize {
        self.streams.lock().len()
    }

    pub fn stream(&self, idx: usize) -> MockStreamHandle {
        self.streams.lock()[idx].clone()
    }

    /// Polls until at least `n` streams have been opened.
    pub async fn wait_for_streams(&self, n: usize) {
        for _ in 0..400 {
            if self.opened() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("recognizer never reached {n} opened streams (got {})", self.opened());
    }
}

impl MockStreamHandle {
    pub async fn emit(&self, text: &str, is_final: bool) {
        let sender = self.events.lock().clone();
        let sender = sender.expect("stream already failed");
        sender
            .send(RecognitionEvent {
                text: text.to_string(),
                is_final,
            })
            .await
            .expect("session dropped its event receiver");
    }

    /// Simulates the backend killing the stream (error or end).
    pub fn fail(&self) {
        self.events.lock().take();
    }

    /// Next audio chunk forwarded into this stream, if any arrives in time.
    pub async fn recv_audio(&self, wait: Duration) -> Option<Vec<u8>> {
        let mut audio = self.audio.lock().await;
        tokio::time::timeout(wait, audio.recv()).await.ok().flatten()
    }
}

#[async_trait]
impl SpeechStream for MockSpeech {
    async fn open(
        &self,
        config: StreamConfig,
    ) -> anyhow::Result<(mpsc::Sender<Vec<u8>>, mpsc::Receiver<RecognitionEvent>)> {
        let (audio_tx, audio_rx) = mpsc::channel(64);
        let (event_tx, event_rx) = mpsc::channel(64);
        self.streams.lock().push(MockStreamHandle {
            events: Arc::new(Mutex::new(Some(event_tx))),
            audio: Arc::new(tokio::sync::Mutex::new(audio_rx)),
            language: config.language,
        });
        Ok((audio_tx, event_rx))
    }
}

/// Deterministic translator: prefixes the target language so tests can
/// tell which language a payload was translated into.
#[derive(Default)]
pub struct MockTranslator {
    /// Target language for which every call fails.
    pub fail_target: Option<String>,
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> anyhow::Result<String> {
        if self.fail_target.as_deref() == Some(target) {
            anyhow::bail!("scripted failure for '{target}'");
        }
        Ok(format!("[{target}] {text}"))
    }
}
