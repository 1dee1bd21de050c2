//! Operator channel (Telegram Bot API shaped).
//!
//! Outbound: plain messages and video messages carrying an approve/reject
//! action pair. Inbound: long-polled updates, either a text command or a
//! pressed action. The wire encoding of an action is `approve_<id>` /
//! `reject_<id>`; everything past the channel boundary works with the
//! structured [`OperatorAction`].

use crate::errors::ChannelError;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

/// What the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Approve,
    Reject,
}

impl ActionKind {
    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::Approve => "approve",
            ActionKind::Reject => "reject",
        }
    }
}

/// A decoded operator action referencing one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorAction {
    pub kind: ActionKind,
    pub item_id: String,
}

impl OperatorAction {
    /// Decode callback data of the form `approve_<id>` / `reject_<id>`.
    ///
    /// Splits on the *first* separator only: item ids contain underscores
    /// (`idea_1700000000000_ab12cd34`), so everything after the verb is the
    /// id, rejoined as-is.
    pub fn parse(data: &str) -> Option<Self> {
        let (verb, item_id) = data.split_once('_')?;
        if item_id.is_empty() {
            return None;
        }
        let kind = match verb {
            "approve" => ActionKind::Approve,
            "reject" => ActionKind::Reject,
            _ => return None,
        };
        Some(Self {
            kind,
            item_id: item_id.to_string(),
        })
    }

    /// Encode back to the wire form.
    pub fn encode(&self) -> String {
        format!("{}_{}", self.kind.verb(), self.item_id)
    }
}

/// One inbound update from the channel.
#[derive(Debug, Clone)]
pub enum Update {
    /// A plain text message from the operator.
    Message { chat_id: i64, text: String },
    /// A pressed inline action. `callback_id` acknowledges the press,
    /// `message_id` locates the prompt whose keyboard should be cleared.
    Action {
        callback_id: String,
        chat_id: i64,
        message_id: i64,
        data: String,
    },
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<RawMessage>,
    #[serde(default)]
    callback_query: Option<RawCallback>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    message_id: i64,
    chat: RawChat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RawCallback {
    id: String,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    message: Option<RawMessage>,
}

/// Reqwest client for the Bot API. One instance per process.
pub struct OperatorChannel {
    client: reqwest::Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl OperatorChannel {
    pub fn new(api_base: &str, token: &str, chat_id: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T: serde::de::DeserializeOwned + Default>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, ChannelError> {
        let resp = self
            .client
            .post(self.url(method))
            .json(&body)
            .send()
            .await?;
        let envelope: ApiEnvelope<T> = resp.json().await?;
        if !envelope.ok {
            return Err(ChannelError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| format!("{method} failed")),
            ));
        }
        envelope
            .result
            .ok_or_else(|| ChannelError::Api(format!("{method} returned no result")))
    }

    /// Send a plain text message to the operator.
    pub async fn send_message(&self, text: &str) -> Result<(), ChannelError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                json!({ "chat_id": self.chat_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    /// Send a rendered video with the approve/reject action pair for `item_id`.
    pub async fn send_approval_prompt(
        &self,
        video: &Path,
        caption: &str,
        item_id: &str,
    ) -> Result<(), ChannelError> {
        let approve = OperatorAction {
            kind: ActionKind::Approve,
            item_id: item_id.to_string(),
        };
        let reject = OperatorAction {
            kind: ActionKind::Reject,
            item_id: item_id.to_string(),
        };
        let keyboard = json!({
            "inline_keyboard": [[
                { "text": "Approve upload", "callback_data": approve.encode() },
                { "text": "Discard", "callback_data": reject.encode() },
            ]]
        });

        let bytes = tokio::fs::read(video).await?;
        let file_name = video
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        let form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .text("reply_markup", keyboard.to_string())
            .part(
                "video",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let resp = self
            .client
            .post(self.url("sendVideo"))
            .multipart(form)
            .send()
            .await?;
        let envelope: ApiEnvelope<serde_json::Value> = resp.json().await?;
        if !envelope.ok {
            return Err(ChannelError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "sendVideo failed".to_string()),
            ));
        }
        Ok(())
    }

    /// Acknowledge a pressed action immediately so the operator's client does
    /// not treat the press as dropped.
    pub async fn acknowledge(&self, callback_id: &str, text: &str) -> Result<(), ChannelError> {
        // answerCallbackQuery returns plain `true`.
        let _: bool = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": callback_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    /// Strip the action keyboard from a prompt so a double press cannot
    /// re-invoke a stage. Best-effort: old messages may refuse the edit.
    pub async fn clear_actions(&self, chat_id: i64, message_id: i64) -> Result<(), ChannelError> {
        let _: serde_json::Value = self
            .call(
                "editMessageReplyMarkup",
                json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "reply_markup": { "inline_keyboard": [] },
                }),
            )
            .await?;
        Ok(())
    }

    /// Long-poll for inbound updates. Returns the updates plus the next offset
    /// to pass back in.
    pub async fn poll_updates(
        &self,
        offset: i64,
        timeout_secs: u32,
    ) -> Result<(Vec<Update>, i64), ChannelError> {
        let raw: Vec<RawUpdate> = self
            .call(
                "getUpdates",
                json!({ "offset": offset, "timeout": timeout_secs }),
            )
            .await?;

        let mut next_offset = offset;
        let mut updates = Vec::new();
        for u in raw {
            next_offset = next_offset.max(u.update_id + 1);
            if let Some(cb) = u.callback_query {
                let (chat_id, message_id) = match &cb.message {
                    Some(m) => (m.chat.id, m.message_id),
                    None => continue,
                };
                let Some(data) = cb.data else { continue };
                updates.push(Update::Action {
                    callback_id: cb.id,
                    chat_id,
                    message_id,
                    data,
                });
            } else if let Some(m) = u.message
                && let Some(text) = m.text
            {
                updates.push(Update::Message {
                    chat_id: m.chat.id,
                    text,
                });
            }
        }
        Ok((updates, next_offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_approve_with_underscored_id() {
        let action = OperatorAction::parse("approve_idea_1700000000000_ab12cd34").unwrap();
        assert_eq!(action.kind, ActionKind::Approve);
        // Everything after the first separator survives, underscores included.
        assert_eq!(action.item_id, "idea_1700000000000_ab12cd34");
    }

    #[test]
    fn test_parse_reject() {
        let action = OperatorAction::parse("reject_idea_9_x").unwrap();
        assert_eq!(action.kind, ActionKind::Reject);
        assert_eq!(action.item_id, "idea_9_x");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(OperatorAction::parse("publish_idea_1").is_none());
        assert!(OperatorAction::parse("approve").is_none());
        assert!(OperatorAction::parse("approve_").is_none());
        assert!(OperatorAction::parse("").is_none());
    }

    #[test]
    fn test_encode_parse_roundtrip() {
        let action = OperatorAction {
            kind: ActionKind::Reject,
            item_id: "idea_1_a_b_c".into(),
        };
        assert_eq!(OperatorAction::parse(&action.encode()).unwrap(), action);
    }

    #[test]
    fn test_raw_update_parses_callback() {
        let json = r#"{
            "update_id": 42,
            "callback_query": {
                "id": "cb-1",
                "data": "approve_idea_1_aa",
                "message": { "message_id": 7, "chat": { "id": 99 } }
            }
        }"#;
        let raw: RawUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(raw.update_id, 42);
        let cb = raw.callback_query.unwrap();
        assert_eq!(cb.data.as_deref(), Some("approve_idea_1_aa"));
        assert_eq!(cb.message.unwrap().chat.id, 99);
    }

    #[test]
    fn test_raw_update_parses_text_message() {
        let json = r#"{
            "update_id": 43,
            "message": { "message_id": 8, "chat": { "id": 99 }, "text": "/run" }
        }"#;
        let raw: RawUpdate = serde_json::from_str(json).unwrap();
        assert_eq!(raw.message.unwrap().text.as_deref(), Some("/run"));
    }
}
