use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caption delivered to one recipient, translated into that recipient's
/// target language. Constructed fresh per delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionPayload {
    /// Speaker's participant id.
    #[serde(rename = "userID")]
    pub user_id: String,
    /// Transcript as recognized in the speaker's language.
    pub texto_original: String,
    /// Transcript translated into the recipient's target language.
    pub traduccion: String,
    #[serde(rename = "sourceLang")]
    pub source_lang: String,
    #[serde(rename = "targetLang")]
    pub target_lang: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "isFinal")]
    pub is_final: bool,
    /// Set when the payload echoes back to the speaker itself.
    #[serde(rename = "isSelf", default, skip_serializing_if = "is_false")]
    pub is_self: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}
