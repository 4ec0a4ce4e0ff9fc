use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Process-wide settings, loaded from defaults, an optional `babelcall.toml`
/// and `BABELCALL_*` environment variables (double underscore separates
/// sections, e.g. `BABELCALL_SERVER__PORT=9000`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub stt: SttSettings,
    pub translation: TranslationSettings,
    pub recognition: RecognitionSettings,
    pub prober: ProberSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Streaming speech-to-text backend connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttSettings {
    /// WebSocket endpoint of the streaming recognizer.
    pub url: String,
    pub api_key: String,
    /// Acoustic model variant requested at stream start.
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    /// REST endpoint accepting `{q, source, target, format}`.
    pub url: String,
    pub api_key: Option<String>,
}

/// Timing knobs for the per-participant recognition sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Minimum gap between accepted interim results.
    pub min_interval_ms: u64,
    /// Window in which an exact-duplicate transcript is suppressed.
    pub duplicate_window_ms: u64,
    /// Delay before recreating a failed recognizer stream.
    pub restart_delay_ms: u64,
    pub idle_check_secs: u64,
    /// Audio silence after which the recognizer stream is proactively recycled.
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProberSettings {
    pub ping_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            stt: SttSettings::default(),
            translation: TranslationSettings::default(),
            recognition: RecognitionSettings::default(),
            prober: ProberSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for SttSettings {
    fn default() -> Self {
        Self {
            url: "wss://localhost:9090/v1/stream".to_string(),
            api_key: String::new(),
            model: "enhanced_phone_call".to_string(),
        }
    }
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000/translate".to_string(),
            api_key: None,
        }
    }
}

impl Default for RecognitionSettings {
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

impl Default for ProberSettings {
    fn default() -> Self {
        Self {
            ping_interval_secs: 25,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&Settings::default())?;
        Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("babelcall").required(false))
            .add_source(Environment::with_prefix("BABELCALL").separator("__"))
            .build()?
            .try_deserialize()
    }
}
