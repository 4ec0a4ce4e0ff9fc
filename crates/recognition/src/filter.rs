use std::time::{Duration, Instant};

use crate::config::RecognitionConfig;

/// Pacing and duplicate suppression for recognizer output.
///
/// Streaming recognizers emit many interim results per utterance;
/// forwarding every one floods clients and wastes translation calls.
/// The filter throttles interims to one per `min_interval` and drops
/// any event whose text exactly matches the previously accepted one
/// inside `duplicate_window`. Finals bypass the interval throttle but
/// not the duplicate window, so a final restating an already-sent
/// interim is suppressed while a genuinely repeated utterance (after
/// the window) still gets through.
pub struct CaptionFilter {
    min_interval: Duration,
    duplicate_window: Duration,
    last_accepted_at: Option<Instant>,
    last_text: Option<String>,
}

impl CaptionFilter {
    pub fn new(config: &RecognitionConfig) -> Self {
        Self {
            min_interval: Duration::from_millis(config.min_interval_ms),
            duplicate_window: Duration::from_millis(config.duplicate_window_ms),
            last_accepted_at: None,
            last_text: None,
        }
    }

    /// Returns `true` if the event should be forwarded downstream.
    pub fn accept(&mut self, text: &str, is_final: bool, now: Instant) -> bool {
        if let (Some(last_text), Some(at)) = (&self.last_text, self.last_accepted_at)
            && last_text == text
            && now.duration_since(at) < self.duplicate_window
        {
            return false;
        }

        if !is_final
            && let Some(at) = self.last_accepted_at
            && now.duration_since(at) < self.min_interval
        {
            return false;
        }

        self.last_accepted_at = Some(now);
        self.last_text = Some(text.to_string());
        true
    }
}
