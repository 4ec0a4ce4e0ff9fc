//! Language tag normalization.
//!
//! Clients send short ISO 639-1 tags; the streaming recognizer wants
//! BCP-47 region forms while the translation backend wants the short
//! form back. Unknown tags pass through unchanged rather than failing
//! the connection.

/// Maps a short language tag to the region form the recognizer expects.
/// Already-regioned tags pass through.
pub fn stt_code(tag: &str) -> &str {
    match tag {
        "en" => "en-US",
        "es" => "es-ES",
        "fr" => "fr-FR",
        "de" => "de-DE",
        "it" => "it-IT",
        "pt" => "pt-BR",
        "nl" => "nl-NL",
        "ja" => "ja-JP",
        "zh" => "zh-CN",
        other => other,
    }
}

/// Maps a (possibly regioned) tag to the short form the translation
/// backend expects.
pub fn translation_code(tag: &str) -> &str {
    match tag.split_once('-') {
        Some((short, _)) => short,
        None => tag,
    }
}
