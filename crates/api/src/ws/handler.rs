use axum::{
    extract::{Query, State, WebSocketUpgrade, ws::{Message, WebSocket}},
    response::Response,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use nanoid::nanoid;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use babelcall_recognition::RecognitionSession;
use babelcall_services::registry::{OutboundFrame, Participant};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    #[serde(rename = "callID", default = "default_call_id")]
    pub call_id: String,
    #[serde(rename = "userID")]
    pub user_id: Option<String>,
    #[serde(rename = "sourceLang", default = "default_source_lang")]
    pub source_lang: String,
    #[serde(rename = "targetLang", default = "default_target_lang")]
    pub target_lang: String,
}

fn default_call_id() -> String {
    "default".to_string()
}

fn default_source_lang() -> String {
    "es".to_string()
}

fn default_target_lang() -> String {
    "en".to_string()
}

pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params))
}

async fn handle_socket(socket: WebSocket, state: AppState, params: WsParams) {
    let call_id = params.call_id;
    let participant_id = params
        .user_id
        .unwrap_or_else(|| format!("u-{}-{}", Utc::now().timestamp_millis(), nanoid!(6)));

    info!(
        %call_id,
        %participant_id,
        source_lang = %params.source_lang,
        target_lang = %params.target_lang,
        "participant connected"
    );

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (frame_tx, mut frame_rx) = mpsc::channel::<OutboundFrame>(64);
    let pong_tx = frame_tx.clone();
    let conn_token = nanoid!(8);

    let displaced = state.registry.join(
        &call_id,
        Participant {
            id: participant_id.clone(),
            conn_token: conn_token.clone(),
            source_lang: params.source_lang.clone(),
            target_lang: params.target_lang.clone(),
            sender: frame_tx,
        },
    );
    if let Some(old) = displaced {
        // Same participant id reconnected; shut the old socket down so
        // only one connection and one recognition session remain.
        info!(%call_id, %participant_id, "displacing an earlier connection for this participant");
        let _ = old.sender.try_send(OutboundFrame::Close);
    }

    let session = RecognitionSession::start(
        &participant_id,
        &call_id,
        &params.source_lang,
        state.speech.clone(),
        state.sink.clone(),
        state.recognition_config(),
    );

    // Outbound forwarder: drains the participant's frame queue into the
    // socket. Ends when the registry entry (and with it the last queue
    // sender) is dropped, or when the socket goes away.
    let forwarder = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            let message = match frame {
                OutboundFrame::Caption(json) => Message::text(json),
                OutboundFrame::Ping => Message::Ping(Vec::new().into()),
                OutboundFrame::Pong(data) => Message::Pong(data.into()),
                OutboundFrame::Close => {
                    let _ = ws_sender.send(Message::Close(None)).await;
                    break;
                }
            };
            if ws_sender.send(message).await.is_err() {
                break;
            }
        }
        debug!("outbound forwarder exited");
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Binary(audio)) => {
                session.write_audio(audio.to_vec());
            }
            Ok(Message::Text(_)) => {
                // Reserved control channel; no transcription effect.
            }
            Ok(Message::Ping(data)) => {
                let _ = pong_tx.try_send(OutboundFrame::Pong(data.to_vec()));
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(%call_id, %participant_id, %e, "websocket error, closing connection");
                break;
            }
        }
    }

    // Same cleanup path for client close, transport error and shutdown;
    // both steps are idempotent.
    session.stop();
    let call_released = state.registry.leave(&call_id, &participant_id, &conn_token);
    forwarder.abort();

    info!(%call_id, %participant_id, call_released, "participant disconnected");
}
