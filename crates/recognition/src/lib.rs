pub mod config;
pub mod filter;
pub mod lang;
pub mod session;
pub mod stt;

pub use config::RecognitionConfig;
pub use filter::CaptionFilter;
pub use session::{RecognitionSession, SessionState};
pub use stt::{RecognitionEvent, SpeechStream, StreamConfig};

use async_trait::async_trait;

/// Downstream consumer of accepted transcripts.
///
/// The session awaits each `deliver` call before reading the next
/// recognizer event, so deliveries for one speaker never reorder or
/// overlap. Implementations handle their own failures; a delivery
/// problem must never propagate back into the session.
#[async_trait]
pub trait CaptionSink: Send + Sync + 'static {
    async fn deliver(
        &self,
        call_id: &str,
        speaker_id: &str,
        source_lang: &str,
        text: &str,
        is_final: bool,
    );
}
