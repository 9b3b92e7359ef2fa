use axum::extract::ws::Message;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::{
    error::{RelayError, RelayResult},
    gateway::{self, Translation},
    ids::{MessageId, RoomId, UserId},
    mailbox::{Envelope, MessageKind},
    AppState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct BindFrame {
    pub(crate) user_id: UserId,
    pub(crate) room_id: RoomId,
    pub(crate) lang: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatFrame {
    message_type: MessageKind,
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeliveryFrame<'a> {
    message_id: MessageId,
    user_id: UserId,
    user_name: &'a str,
    lang: &'a str,
    text: String,
    audio: Vec<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeliveryErrorFrame<'a> {
    message_id: MessageId,
    user_id: UserId,
    user_name: &'a str,
    lang: &'a str,
    error: String,
}

/// Who a connection speaks for, fixed for the connection's lifetime.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) user_id: UserId,
    pub(crate) user_name: String,
    pub(crate) room_id: RoomId,
    pub(crate) lang: String,
}

/// Audio arrives as a data url; everything up to the first comma is metadata.
pub(crate) fn decode_content(kind: MessageKind, content: &str) -> RelayResult<Vec<u8>> {
    match kind {
        MessageKind::Text if content.trim().is_empty() => Err(RelayError::invalid("empty text message")),
        MessageKind::Text => Ok(content.as_bytes().to_vec()),
        MessageKind::Audio => {
            let encoded = content.split_once(',').map_or(content, |(_, data)| data);
            STANDARD
                .decode(encoded.trim())
                .map_err(|err| RelayError::invalid(format!("audio content: {err}")))
        }
    }
}

/// Stores the payload once and leaves an envelope in every current member's mailbox.
pub(crate) fn send_msg(state: &AppState, sender: &Binding, raw: &str) -> RelayResult<MessageId> {
    let ChatFrame { message_type, content } = serde_json::from_str(raw)
        .map_err(|err| RelayError::invalid(format!("chat frame: {err}")))?;
    let payload = decode_content(message_type, &content)?;

    let recipients: Vec<UserId> = state
        .rooms
        .members(sender.room_id)?
        .into_iter()
        .filter(|member| state.config.self_delivery || *member != sender.user_id)
        .collect();

    let message_id = MessageId::new();
    state.contents.put(message_id, payload, recipients.len());

    for recipient in &recipients {
        state.mailboxes.enqueue(*recipient, Envelope {
            message_id,
            sender_id: sender.user_id,
            sender_name: sender.user_name.clone(),
            sender_lang: sender.lang.clone(),
            kind: message_type,
        });
    }

    tracing::debug!(
        message = %message_id,
        user = %sender.user_id,
        room = %sender.room_id,
        kind = ?message_type,
        recipients = recipients.len(),
        "fanned out"
    );
    Ok(message_id)
}

async fn translate(state: &AppState, envelope: &Envelope, target: &str) -> Result<Translation, RelayError> {
    let payload = state.contents.checkout(envelope.message_id)?;
    let gateway = state.gateway.as_ref();

    let call = async {
        match envelope.kind {
            MessageKind::Text => {
                let text = String::from_utf8_lossy(&payload);
                gateway.translate_text(&text, &envelope.sender_lang, target).await
            }
            MessageKind::Audio => gateway.translate_audio(&payload, target).await,
        }
    };

    Ok(gateway::with_timeout(state.config.gateway_timeout, call).await?)
}

/// Translates one envelope into the recipient's language. Failures become an
/// error frame for this message only.
pub(crate) async fn deliver(state: &AppState, envelope: &Envelope, target: &str) -> Message {
    let json = match translate(state, envelope, target).await {
        Ok(Translation { text, audio }) => serde_json::to_string(&DeliveryFrame {
            message_id: envelope.message_id,
            user_id: envelope.sender_id,
            user_name: &envelope.sender_name,
            lang: &envelope.sender_lang,
            text,
            audio,
        }),
        Err(err) => {
            tracing::warn!(message = %envelope.message_id, error = %err, "delivery failed");
            serde_json::to_string(&DeliveryErrorFrame {
                message_id: envelope.message_id,
                user_id: envelope.sender_id,
                user_name: &envelope.sender_name,
                lang: &envelope.sender_lang,
                error: err.to_string(),
            })
        }
    };

    // Both frames are plain structs of strings and numbers.
    Message::Text(json.unwrap_or_default().into())
}
