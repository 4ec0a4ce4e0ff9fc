use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RecognitionConfig;
use crate::filter::CaptionFilter;
use crate::lang;
use crate::stt::{SpeechStream, StreamConfig};
use crate::CaptionSink;

/// Lifecycle of a recognition session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Opening the first (or a replacement) recognizer stream.
    Starting,
    /// Stream is up; audio is forwarded and events flow.
    Live,
    /// Stream lost; a replacement will be opened after a short delay.
    /// Audio arriving now is dropped, never queued.
    Restarting,
    /// Participant disconnected; the session will not come back.
    Stopped,
}

/// One participant's live recognizer stream, kept functioning across
/// backend failures and idle disconnects.
///
/// A supervisor task owns the stream end to end: it opens the stream,
/// consumes its events through the pacing filter into the caption sink,
/// and on stream loss waits out the restart delay and reopens. Running
/// the whole lifecycle in one loop means at most one recreation can
/// ever be in flight, and event handling for one participant is
/// naturally serialized.
pub struct RecognitionSession {
    participant_id: String,
    call_id: String,
    source_lang: String,
    config: RecognitionConfig,
    state: Mutex<SessionState>,
    audio_tx: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    last_audio: Mutex<Instant>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl RecognitionSession {
    /// Opens a session for one participant and starts its supervisor.
    pub fn start(
        participant_id: &str,
        call_id: &str,
        source_lang: &str,
        backend: Arc<dyn SpeechStream>,
        sink: Arc<dyn CaptionSink>,
        config: RecognitionConfig,
    ) -> Arc<Self> {
        let session = Arc::new(Self {
            participant_id: participant_id.to_string(),
            call_id: call_id.to_string(),
            source_lang: source_lang.to_string(),
            config,
            state: Mutex::new(SessionState::Starting),
            audio_tx: Mutex::new(None),
            last_audio: Mutex::new(Instant::now()),
            supervisor: Mutex::new(None),
        });

        let handle = tokio::spawn(Arc::clone(&session).supervise(backend, sink));
        *session.supervisor.lock() = Some(handle);

        info!(
            participant_id = %session.participant_id,
            call_id = %session.call_id,
            source_lang = %session.source_lang,
            "recognition session started"
        );
        session
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Forwards an audio chunk to the live stream. Chunks arriving while
    /// the stream is down, or while its channel is full, are dropped —
    /// a brief gap in captions beats unbounded queueing.
    pub fn write_audio(&self, chunk: Vec<u8>) {
        *self.last_audio.lock() = Instant::now();

        if *self.state.lock() != SessionState::Live {
            debug!(participant_id = %self.participant_id, "audio dropped, stream not live");
            return;
        }
        if let Some(tx) = self.audio_tx.lock().as_ref()
            && tx.try_send(chunk).is_err()
        {
            debug!(participant_id = %self.participant_id, "audio dropped, stream backpressure");
        }
    }

    /// Tears the session down. Idempotent; safe against duplicate close
    /// signals from the transport.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock();
            if *state == SessionState::Stopped {
                return;
            }
            *state = SessionState::Stopped;
        }
        self.audio_tx.lock().take();
        if let Some(handle) = self.supervisor.lock().take() {
            handle.abort();
        }
        info!(
            participant_id = %self.participant_id,
            call_id = %self.call_id,
            "recognition session stopped"
        );
    }

    fn is_stopped(&self) -> bool {
        *self.state.lock() == SessionState::Stopped
    }

    async fn supervise(self: Arc<Self>, backend: Arc<dyn SpeechStream>, sink: Arc<dyn CaptionSink>) {
        let restart_delay = Duration::from_millis(self.config.restart_delay_ms);
        let idle_check = Duration::from_secs(self.config.idle_check_secs);
        let idle_timeout = Duration::from_secs(self.config.idle_timeout_secs);

        loop {
            if self.is_stopped() {
                return;
            }
            *self.state.lock() = SessionState::Starting;

            let stream_config = StreamConfig {
                language: lang::stt_code(&self.source_lang).to_string(),
                sample_rate: 16_000,
                interim_results: true,
                automatic_punctuation: true,
            };

            let (audio_tx, mut event_rx) = match backend.open(stream_config).await {
                Ok(pair) => pair,
                Err(e) => {
                    if self.is_stopped() {
                        return;
                    }
                    *self.state.lock() = SessionState::Restarting;
                    warn!(
                        participant_id = %self.participant_id,
                        %e,
                        "recognizer stream open failed, retrying"
                    );
                    tokio::time::sleep(restart_delay).await;
                    continue;
                }
            };

            {
                let mut state = self.state.lock();
                if *state == SessionState::Stopped {
                    return;
                }
                // Install the new stream handle and go live in one step so
                // audio is never written against a defunct handle.
                *self.audio_tx.lock() = Some(audio_tx);
                *state = SessionState::Live;
            }
            *self.last_audio.lock() = Instant::now();
            debug!(participant_id = %self.participant_id, "recognizer stream live");

            // Fresh filter per stream: duplicate-suppression state does not
            // survive a recreation.
            let mut filter = CaptionFilter::new(&self.config);
            let mut idle = tokio::time::interval_at(
                tokio::time::Instant::now() + idle_check,
                idle_check,
            );
            idle.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            let lost_reason = loop {
                tokio::select! {
                    event = event_rx.recv() => match event {
                        Some(event) => {
                            let text = event.text.trim();
                            if text.is_empty() {
                                continue;
                            }
                            if filter.accept(text, event.is_final, Instant::now()) {
                                sink.deliver(
                                    &self.call_id,
                                    &self.participant_id,
                                    &self.source_lang,
                                    text,
                                    event.is_final,
                                )
                                .await;
                            }
                        }
                        None => break "stream ended",
                    },
                    _ = idle.tick() => {
                        if self.last_audio.lock().elapsed() > idle_timeout {
                            break "idle timeout";
                        }
                    }
                }
            };

            // Drop the audio sender first so no chunk hits the dead stream.
            self.audio_tx.lock().take();
            if self.is_stopped() {
                return;
            }
            *self.state.lock() = SessionState::Restarting;
            warn!(
                participant_id = %self.participant_id,
                reason = lost_reason,
                "recognizer stream lost, recreating"
            );
            tokio::time::sleep(restart_delay).await;
        }
    }
}
