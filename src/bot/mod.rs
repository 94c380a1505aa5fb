//! Telegram companion bot
//!
//! Long-polls the Bot API on a dedicated OS thread so the blocking client
//! never touches the async runtime.
//!
//! ```text
//! getUpdates ──→ CommandHandler ──→ Store (board, journal, restore)
//!                     │
//!                     └──→ sendMessage / sendDocument
//!
//! BackupScheduler ──→ AdminBroadcaster ──→ sendDocument (every admin chat)
//! ```
//!
//! Roles live in memory only; a restart logs everyone out.

pub mod commands;
pub mod sessions;
pub mod transport;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Local;

use crate::backup::BackupSink;
use crate::config::BotConfig;
use crate::store::Store;

pub use commands::CommandHandler;
pub use sessions::{hash_password, Credentials, Role, Sessions};
pub use transport::{BotError, ChatTransport, TelegramClient};

/// Pause after a failed poll before trying again
const RETRY_DELAY: Duration = Duration::from_secs(5);

const BACKUP_CAPTION: &str = "📦 Full Backup (JSON)";

/// Send `json` as a document to every admin chat. Returns how many got it.
pub fn broadcast_backup(
    transport: &dyn ChatTransport,
    sessions: &Sessions,
    file_name: &str,
    json: &str,
) -> usize {
    let mut delivered = 0;
    for chat_id in sessions.admins() {
        match transport.send_document(chat_id, file_name, json.as_bytes().to_vec(), BACKUP_CAPTION)
        {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(chat_id, "Failed to send backup: {}", e),
        }
    }
    delivered
}

/// Fetch one batch of updates and handle them. Returns the next offset.
pub fn poll_once(
    transport: &dyn ChatTransport,
    handler: &CommandHandler,
    offset: i64,
    timeout_secs: u64,
) -> Result<i64, BotError> {
    let mut next = offset;
    for update in transport.get_updates(offset, timeout_secs)? {
        next = next.max(update.update_id + 1);
        let Some(message) = update.message else {
            continue;
        };
        if let Err(e) = handler.handle(transport, &message, Local::now().naive_local()) {
            tracing::warn!(chat_id = message.chat.id, "Failed to answer message: {}", e);
        }
    }
    Ok(next)
}

/// Delivers scheduled backups to admin chats
#[derive(Clone)]
pub struct AdminBroadcaster {
    transport: Arc<dyn ChatTransport>,
    sessions: Sessions,
}

impl BackupSink for AdminBroadcaster {
    fn deliver(&self, file_name: &str, json: &str) -> anyhow::Result<usize> {
        Ok(broadcast_backup(
            self.transport.as_ref(),
            &self.sessions,
            file_name,
            json,
        ))
    }
}

/// Running bot: poll thread plus the shared session table
pub struct BotService {
    transport: Arc<dyn ChatTransport>,
    sessions: Sessions,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl BotService {
    /// Connect with the configured token and start polling
    pub fn start(config: &BotConfig, store: Store) -> anyhow::Result<Self> {
        let client = TelegramClient::new(config)?;
        Self::with_transport(Arc::new(client), config, store)
    }

    pub fn with_transport(
        transport: Arc<dyn ChatTransport>,
        config: &BotConfig,
        store: Store,
    ) -> anyhow::Result<Self> {
        let sessions = Sessions::default();
        let handler = CommandHandler::new(store, sessions.clone(), Credentials::from_config(config));
        let stop = Arc::new(AtomicBool::new(false));

        if config.user_hash.is_none() && config.admin_hash.is_none() {
            tracing::warn!("Bot has no password hashes configured; nobody can log in");
        }

        let thread_transport = transport.clone();
        let thread_stop = stop.clone();
        let timeout_secs = config.poll_timeout_secs;
        let handle = thread::Builder::new()
            .name("telegram-bot".into())
            .spawn(move || {
                Self::poll_thread(thread_transport.as_ref(), &handler, &thread_stop, timeout_secs)
            })?;

        tracing::info!("Telegram bot polling started");
        Ok(Self {
            transport,
            sessions,
            stop,
            handle: Some(handle),
        })
    }

    /// Sink for the backup scheduler sharing this bot's sessions
    pub fn broadcaster(&self) -> AdminBroadcaster {
        AdminBroadcaster {
            transport: self.transport.clone(),
            sessions: self.sessions.clone(),
        }
    }

    /// Ask the poll thread to stop.
    ///
    /// A long poll in flight is not interrupted; if the thread has not
    /// finished yet it is left to exit on its own.
    pub fn shutdown(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
        tracing::debug!("Telegram bot stopped");
    }

    fn poll_thread(
        transport: &dyn ChatTransport,
        handler: &CommandHandler,
        stop: &AtomicBool,
        timeout_secs: u64,
    ) {
        let mut offset = 0;
        while !stop.load(Ordering::SeqCst) {
            match poll_once(transport, handler, offset, timeout_secs) {
                Ok(next) => offset = next,
                Err(e) => {
                    tracing::warn!("Telegram poll failed: {}", e);
                    thread::sleep(RETRY_DELAY);
                }
            }
        }
    }
}

impl Drop for BotService {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}
