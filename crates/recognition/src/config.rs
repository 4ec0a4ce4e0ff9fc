use serde::{Deserialize, Serialize};

/// Timing configuration for recognition sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Minimum gap in milliseconds between accepted interim results.
    pub min_interval_ms: u64,
    /// Window in milliseconds in which an exact-duplicate transcript is
    /// suppressed, final or not.
    pub duplicate_window_ms: u64,
    /// Delay in milliseconds before a failed recognizer stream is recreated.
    pub restart_delay_ms: u64,
    /// How often the idle monitor wakes up.
    pub idle_check_secs: u64,
    /// Audio silence after which the stream is proactively recycled. Cloud
    /// recognizers tend to stop emitting results, or close outright, after
    /// a bounded stretch without audio.
    pub idle_timeout_secs: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 600,
            duplicate_window_ms: 2000,
            restart_delay_ms: 1000,
            idle_check_secs: 8,
            idle_timeout_secs: 20,
        }
    }
}
