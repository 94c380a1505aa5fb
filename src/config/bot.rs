//! Chat bot and scheduled backup configuration

use chrono::NaiveTime;
use serde::Deserialize;

// ─────────────────────────────────────────────────────────────────────────────
// Bot
// ─────────────────────────────────────────────────────────────────────────────

/// Telegram bot settings. The bot only runs when a token is configured.
#[derive(Clone, PartialEq)]
pub struct BotConfig {
    /// Bot API token (`TG_BOT_TOKEN`)
    pub token: Option<String>,
    /// SHA-256 hex of the user password (`HASH_USER`)
    pub user_hash: Option<String>,
    /// SHA-256 hex of the admin password (`HASH_ADMIN`)
    pub admin_hash: Option<String>,
    /// Long-poll timeout passed to getUpdates
    pub poll_timeout_secs: u64,
    /// Bot API base URL
    pub api_base: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            user_hash: None,
            admin_hash: None,
            poll_timeout_secs: 30,
            api_base: "https://api.telegram.org".to_string(),
        }
    }
}

// Keep the token out of `config --show` and debug logs
impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_hash", &self.user_hash)
            .field("admin_hash", &self.admin_hash)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Bot settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileBot {
    pub token: Option<String>,
    pub user_hash: Option<String>,
    pub admin_hash: Option<String>,
    pub poll_timeout_secs: Option<u64>,
    pub api_base: Option<String>,
}

/// Secrets read from the environment; they win over the file
#[derive(Debug, Default)]
pub struct BotEnv {
    pub token: Option<String>,
    pub user_hash: Option<String>,
    pub admin_hash: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl BotConfig {
    pub fn from_file(file: Option<FileBot>, env: BotEnv) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            token: non_empty(env.token.or(file.token)),
            user_hash: non_empty(env.user_hash.or(file.user_hash)).map(|h| h.to_lowercase()),
            admin_hash: non_empty(env.admin_hash.or(file.admin_hash)).map(|h| h.to_lowercase()),
            poll_timeout_secs: file
                .poll_timeout_secs
                .unwrap_or(defaults.poll_timeout_secs),
            api_base: file
                .api_base
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduled backup
// ─────────────────────────────────────────────────────────────────────────────

/// Daily export to admin chats
#[derive(Debug, Clone, PartialEq)]
pub struct BackupConfig {
    pub enabled: bool,
    /// Local time of day to fire
    pub time: NaiveTime,
}

pub(super) fn default_backup_time() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            time: default_backup_time(),
        }
    }
}

/// Backup settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileBackup {
    pub enabled: Option<bool>,
    /// "HH:MM"
    pub time: Option<String>,
}

impl BackupConfig {
    pub fn from_file(file: Option<FileBackup>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let time = match file.time {
            Some(raw) => match NaiveTime::parse_from_str(raw.trim(), "%H:%M") {
                Ok(t) => t,
                Err(_) => {
                    eprintln!(
                        "Warning: invalid [backup] time {:?} (expected HH:MM), using {}",
                        raw,
                        defaults.time.format("%H:%M")
                    );
                    defaults.time
                }
            },
            None => defaults.time,
        };

        Self {
            enabled: file.enabled.unwrap_or(defaults.enabled),
            time,
        }
    }
}
