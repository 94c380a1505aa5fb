//! Chat command handling
//!
//! One incoming message in, zero or more replies out through the
//! [`ChatTransport`]. Storage failures become plain-text replies; transport
//! failures are returned to the poll loop, which logs them.

use chrono::NaiveDateTime;

use super::broadcast_backup;
use super::sessions::{Credentials, Role, Sessions};
use super::transport::{BotError, ChatTransport, Document, Message};
use crate::backup::{backup_file_name, export_json, restore_json};
use crate::store::Store;
use crate::util::truncate_utf8_safe;

/// Telegram caps messages at 4096 characters
const MAX_REPLY_BYTES: usize = 4000;

pub struct CommandHandler {
    store: Store,
    sessions: Sessions,
    credentials: Credentials,
}

/// Split `/cmd@botname rest` into (`/cmd`, `rest`)
fn split_command(text: &str) -> (&str, &str) {
    let (head, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let command = head.split('@').next().unwrap_or(head);
    (command, rest.trim())
}

impl CommandHandler {
    pub fn new(store: Store, sessions: Sessions, credentials: Credentials) -> Self {
        Self {
            store,
            sessions,
            credentials,
        }
    }

    pub fn handle(
        &self,
        transport: &dyn ChatTransport,
        message: &Message,
        now: NaiveDateTime,
    ) -> Result<(), BotError> {
        let chat_id = message.chat.id;
        let reply = |text: &str| {
            transport.send_message(
                chat_id,
                truncate_utf8_safe(text, MAX_REPLY_BYTES),
                Some(message.message_id),
            )
        };

        if let Some(document) = &message.document {
            return match self.sessions.role(chat_id) {
                Some(Role::Admin) => self.handle_restore(transport, document, now, &reply),
                _ => Ok(()),
            };
        }

        let Some(text) = message.text.as_deref().map(str::trim) else {
            return Ok(());
        };
        if text.is_empty() {
            return Ok(());
        }

        let (command, arg) = split_command(text);
        match command {
            "/start" => return reply("Enter your password:"),
            "/logout" => {
                if self.sessions.forget(chat_id).is_some() {
                    tracing::info!(chat_id, "Chat logged out");
                    return reply("ok");
                }
                return Ok(());
            }
            _ => {}
        }

        match self.sessions.role(chat_id) {
            None => self.handle_login(chat_id, text, &reply),
            Some(Role::User) => reply(&self.handle_user(command, arg, text, now)),
            Some(Role::Admin) => {
                if command == "/backup" {
                    self.send_backup_now(transport, now)
                } else {
                    reply("Send me a backup .json file to restore, or /backup")
                }
            }
        }
    }

    fn handle_login(
        &self,
        chat_id: i64,
        attempt: &str,
        reply: &dyn Fn(&str) -> Result<(), BotError>,
    ) -> Result<(), BotError> {
        match self.credentials.check(attempt) {
            Some(role) => {
                self.sessions.grant(chat_id, role);
                tracing::info!(chat_id, ?role, "Chat authenticated");
                match role {
                    Role::User => reply("✅ User Mode."),
                    Role::Admin => reply("👨‍💻 Admin Mode."),
                }
            }
            None => {
                tracing::warn!(chat_id, "Wrong chat password");
                reply("❌ wrong password.")
            }
        }
    }

    /// Board and journal commands; returns the reply text
    fn handle_user(&self, command: &str, arg: &str, text: &str, now: NaiveDateTime) -> String {
        match command {
            "/b" => {
                if arg.is_empty() {
                    return "Usage: /b <note>".to_string();
                }
                match self.store.add_board_item(arg, now) {
                    Ok(_) => "📌 added.".to_string(),
                    Err(e) => format!("DB Error: {:#}", e),
                }
            }
            "/list" => match self.store.list_board_items() {
                Ok(items) if items.is_empty() => "Empty.".to_string(),
                Ok(items) => items
                    .iter()
                    .map(|item| format!("{}. {}", item.id, item.text))
                    .collect::<Vec<_>>()
                    .join("\n"),
                Err(e) => format!("DB Error: {:#}", e),
            },
            "/del" => {
                let Ok(id) = arg.parse::<i64>() else {
                    return "Usage: /del <id>".to_string();
                };
                match self.store.delete_board_item(id) {
                    Ok(true) => "🗑 ok.".to_string(),
                    Ok(false) => format!("Note {} not found.", id),
                    Err(e) => format!("DB Error: {:#}", e),
                }
            }
            _ => match self.store.append_journal(now.date(), now.time(), text) {
                Ok(_) => "🐦 saved.".to_string(),
                Err(e) => format!("DB Error: {:#}", e),
            },
        }
    }

    fn send_backup_now(
        &self,
        transport: &dyn ChatTransport,
        now: NaiveDateTime,
    ) -> Result<(), BotError> {
        let json = match export_json(&self.store) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Backup export failed: {:#}", e);
                for admin in self.sessions.admins() {
                    transport.send_message(admin, &format!("❌ Error: {:#}", e), None)?;
                }
                return Ok(());
            }
        };
        let sent = broadcast_backup(transport, &self.sessions, &backup_file_name(now), &json);
        tracing::info!(recipients = sent, "On-demand backup sent");
        Ok(())
    }

    fn handle_restore(
        &self,
        transport: &dyn ChatTransport,
        document: &Document,
        now: NaiveDateTime,
        reply: &dyn Fn(&str) -> Result<(), BotError>,
    ) -> Result<(), BotError> {
        let is_json = document
            .file_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().ends_with(".json"));
        if !is_json {
            return reply("❌ I need an .json file");
        }

        let bytes = match transport.download_file(&document.file_id) {
            Ok(bytes) => bytes,
            Err(e) => return reply(&format!("Error: {}", e)),
        };
        let json = match String::from_utf8(bytes) {
            Ok(json) => json,
            Err(_) => return reply("Error: file is not UTF-8 text"),
        };

        reply("⏳ restoring...")?;
        match restore_json(&self.store, &json, now) {
            Ok(summary) => {
                tracing::info!(%summary, "Restore from chat finished");
                reply(&format!("✅ {}", summary))
            }
            Err(e) => {
                tracing::error!("Restore from chat failed: {:#}", e);
                reply(&format!("❌ Error: {:#}", e))
            }
        }
    }
}
