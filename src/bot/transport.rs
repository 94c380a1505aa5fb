//! Telegram Bot API transport
//!
//! Blocking reqwest client; the poll loop owns its own OS thread so there is
//! no runtime to block. Everything the command handler needs from Telegram
//! goes through [`ChatTransport`], which keeps the handler testable.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::config::BotConfig;

/// Headroom on top of the long-poll timeout before the HTTP call gives up
const HTTP_SLACK_SECS: u64 = 10;

#[derive(Debug)]
pub enum BotError {
    /// No token configured
    NotConfigured,
    /// Request never got an answer
    Network(String),
    /// Telegram answered with `ok: false` or a non-2xx status
    Api { status: u16, description: String },
    /// Response body did not have the expected shape
    Parse(String),
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "Bot token not configured"),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Api {
                status,
                description,
            } => write!(f, "Telegram API error ({}): {}", status, description),
            Self::Parse(msg) => write!(f, "Unexpected Telegram response: {}", msg),
        }
    }
}

impl std::error::Error for BotError {}

impl From<reqwest::Error> for BotError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL embeds the token
        Self::Network(e.without_url().to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types (only the fields we read)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
    pub document: Option<Document>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

/// Envelope around every Bot API result
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, status: u16) -> Result<T, BotError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(BotError::Parse("missing result".to_string())),
            (false, _) => Err(BotError::Api {
                status: self.error_code.unwrap_or(status),
                description: self
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// What the bot needs from a messaging service
pub trait ChatTransport: Send + Sync {
    /// Long-poll for updates with `update_id >= offset`
    fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, BotError>;

    /// Send a plain-text message, optionally as a reply
    fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i64>)
        -> Result<(), BotError>;

    /// Upload a file
    fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        content: Vec<u8>,
        caption: &str,
    ) -> Result<(), BotError>;

    /// Fetch the bytes of a file someone sent us
    fn download_file(&self, file_id: &str) -> Result<Vec<u8>, BotError>;
}

/// Bot API client
pub struct TelegramClient {
    client: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(config: &BotConfig) -> Result<Self, BotError> {
        let token = config.token.clone().ok_or(BotError::NotConfigured)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(
                config.poll_timeout_secs + HTTP_SLACK_SECS,
            ))
            .build()
            .map_err(|e| BotError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Decode the envelope of a Bot API response
    fn parse<T: DeserializeOwned>(
        response: reqwest::blocking::Response,
    ) -> Result<T, BotError> {
        let status = response.status().as_u16();
        let text = response.text()?;
        let envelope: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            if (200..300).contains(&status) {
                BotError::Parse(e.to_string())
            } else {
                BotError::Api {
                    status,
                    description: text.chars().take(200).collect(),
                }
            }
        })?;
        envelope.into_result(status)
    }
}

impl ChatTransport for TelegramClient {
    fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, BotError> {
        let response = self
            .client
            .post(self.method_url("getUpdates"))
            .json(&json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }))
            .send()?;
        Self::parse(response)
    }

    fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<(), BotError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(message_id) = reply_to {
            body["reply_parameters"] = json!({
                "message_id": message_id,
                "allow_sending_without_reply": true,
            });
        }
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()?;
        Self::parse::<serde_json::Value>(response).map(|_| ())
    }

    fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        content: Vec<u8>,
        caption: &str,
    ) -> Result<(), BotError> {
        let part = Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str("application/json")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()?;
        Self::parse::<serde_json::Value>(response).map(|_| ())
    }

    fn download_file(&self, file_id: &str) -> Result<Vec<u8>, BotError> {
        let response = self
            .client
            .post(self.method_url("getFile"))
            .json(&json!({ "file_id": file_id }))
            .send()?;
        let info: FileInfo = Self::parse(response)?;
        let path = info
            .file_path
            .ok_or_else(|| BotError::Parse("file has no download path".to_string()))?;

        let url = format!("{}/file/bot{}/{}", self.api_base, self.token, path);
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(BotError::Api {
                status: status.as_u16(),
                description: "file download failed".to_string(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_ok() {
        let envelope: ApiResponse<Vec<Update>> = serde_json::from_str(
            r#"{"ok": true, "result": [
                {"update_id": 7, "message": {"message_id": 1, "chat": {"id": 42, "type": "private"},
                 "date": 0, "text": "/start"}},
                {"update_id": 8, "edited_message": {}}
            ]}"#,
        )
        .unwrap();
        let updates = envelope.into_result(200).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].message.as_ref().unwrap().chat.id, 42);
        assert!(updates[1].message.is_none());
    }

    #[test]
    fn test_envelope_error() {
        let envelope: ApiResponse<Vec<Update>> = serde_json::from_str(
            r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#,
        )
        .unwrap();
        let err = envelope.into_result(401).unwrap_err();
        assert_eq!(err.to_string(), "Telegram API error (401): Unauthorized");
    }

    #[test]
    fn test_document_message() {
        let message: Message = serde_json::from_str(
            r#"{"message_id": 3, "chat": {"id": 1},
                "document": {"file_id": "abc", "file_name": "backup.json", "file_size": 10}}"#,
        )
        .unwrap();
        let doc = message.document.unwrap();
        assert_eq!(doc.file_id, "abc");
        assert_eq!(doc.file_name.as_deref(), Some("backup.json"));
        assert!(message.text.is_none());
    }

    #[test]
    fn test_client_requires_token() {
        assert!(matches!(
            TelegramClient::new(&BotConfig::default()),
            Err(BotError::NotConfigured)
        ));
    }
}
