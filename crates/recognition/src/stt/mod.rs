pub mod cloud_ws;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub use cloud_ws::WsSpeechBackend;

/// Configuration for one recognizer stream.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// BCP-47 language tag (e.g. "es-ES").
    pub language: String,
    /// Sample rate of the inbound PCM audio (always 16000 here).
    pub sample_rate: u32,
    /// Request interim (provisional) results in addition to finals.
    pub interim_results: bool,
    pub automatic_punctuation: bool,
}

/// A recognition result, interim or final.
#[derive(Debug, Clone)]
pub struct RecognitionEvent {
    pub text: String,
    pub is_final: bool,
}

/// Trait for streaming speech-to-text backends.
///
/// `open` returns a sender for raw PCM-16LE audio chunks and a receiver
/// for recognition events. The backend delivers events in order; the
/// receiver closing signals that the stream ended, normally or not.
/// Dropping the sender ends the audio feed.
#[async_trait]
pub trait SpeechStream: Send + Sync + 'static {
    async fn open(
        &self,
        config: StreamConfig,
    ) -> anyhow::Result<(mpsc::Sender<Vec<u8>>, mpsc::Receiver<RecognitionEvent>)>;
}
