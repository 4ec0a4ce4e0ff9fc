use std::sync::Arc;

use babelcall_config::Settings;
use babelcall_recognition::stt::SpeechStream;
use babelcall_recognition::{CaptionSink, RecognitionConfig};
use babelcall_services::registry::CallRegistry;
use babelcall_services::translate::Translator;
use babelcall_services::TranslationFanout;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<CallRegistry>,
    pub speech: Arc<dyn SpeechStream>,
    pub sink: Arc<dyn CaptionSink>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        speech: Arc<dyn SpeechStream>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let registry = Arc::new(CallRegistry::new());
        let sink = Arc::new(TranslationFanout::new(Arc::clone(&registry), translator));
        Self {
            settings: Arc::new(settings),
            registry,
            speech,
            sink,
        }
    }

    pub fn recognition_config(&self) -> RecognitionConfig {
        let r = &self.settings.recognition;
        RecognitionConfig {
            min_interval_ms: r.min_interval_ms,
            duplicate_window_ms: r.duplicate_window_ms,
            restart_delay_ms: r.restart_delay_ms,
            idle_check_secs: r.idle_check_secs,
            idle_timeout_secs: r.idle_timeout_secs,
        }
    }
}
