use std::sync::Arc;

use async_trait::async_trait;
use babelcall_recognition::{CaptionSink, lang};
use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::payload::CaptionPayload;
use crate::registry::{CallRegistry, OutboundFrame, Participant};
use crate::translate::Translator;

/// Delivers one recognized utterance to every member of a call,
/// translated per recipient.
///
/// The speaker is included so its own client can render a live caption
/// of itself. Each recipient's translation is an independent backend
/// call; a failure skips that single delivery and never touches the
/// others. Delivery order across recipients is unspecified.
pub struct TranslationFanout {
    registry: Arc<CallRegistry>,
    translator: Arc<dyn Translator>,
}

impl TranslationFanout {
    pub fn new(registry: Arc<CallRegistry>, translator: Arc<dyn Translator>) -> Self {
        Self {
            registry,
            translator,
        }
    }

    async fn deliver_to(
        &self,
        recipient: Participant,
        speaker_id: &str,
        source_lang: &str,
        text: &str,
        is_final: bool,
    ) {
        let source = lang::translation_code(source_lang);
        let target = lang::translation_code(&recipient.target_lang);

        let traduccion = if source == target {
            text.to_string()
        } else {
            match self.translator.translate(text, source, target).await {
                Ok(translated) => translated,
                Err(e) => {
                    warn!(
                        recipient = %recipient.id,
                        %target,
                        %e,
                        "translation failed, skipping this delivery"
                    );
                    return;
                }
            }
        };

        let payload = CaptionPayload {
            user_id: speaker_id.to_string(),
            texto_original: text.to_string(),
            traduccion,
            source_lang: source.to_string(),
            target_lang: target.to_string(),
            timestamp: Utc::now(),
            is_final,
            is_self: recipient.id == speaker_id,
        };

        let json = match serde_json::to_string(&payload) {
            Ok(json) => json,
            Err(e) => {
                warn!(%e, "failed to serialize caption payload");
                return;
            }
        };
        if recipient
            .sender
            .try_send(OutboundFrame::Caption(json))
            .is_err()
        {
            debug!(recipient = %recipient.id, "recipient queue closed or full, caption dropped");
        }
    }
}

#[async_trait]
impl CaptionSink for TranslationFanout {
    async fn deliver(
        &self,
        call_id: &str,
        speaker_id: &str,
        source_lang: &str,
        text: &str,
        is_final: bool,
    ) {
        let members = self.registry.members(call_id);
        if members.is_empty() {
            return;
        }
        debug!(%call_id, %speaker_id, recipients = members.len(), is_final, "fanning out caption");

        join_all(
            members
                .into_iter()
                .map(|recipient| self.deliver_to(recipient, speaker_id, source_lang, text, is_final)),
        )
        .await;
    }
}
