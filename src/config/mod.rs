//! Configuration for the tracker
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/lifetracker/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod bot;
mod observability;
mod serialization;

#[cfg(test)]
mod tests;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports
// ─────────────────────────────────────────────────────────────────────────────

pub use bot::{BackupConfig, BotConfig, BotEnv, FileBackup, FileBot};
pub use observability::{FileLogging, LogRotation, LoggingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND: &str = "127.0.0.1:8000";
const DEFAULT_DB: &str = "./data/lifetracker.db";

/// Dashboard buckets; threads with any other category land in the last one
pub fn default_categories() -> Vec<String> {
    ["work", "self care", "home and family", "frogs"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Address for the HTTP API
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub db_path: PathBuf,

    /// Dashboard category order
    pub categories: Vec<String>,

    /// Telegram bot
    pub bot: BotConfig,

    /// Daily export to admin chats
    pub backup: BackupConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            db_path: PathBuf::from(DEFAULT_DB),
            categories: default_categories(),
            bot: BotConfig::default(),
            backup: BackupConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub bind_addr: Option<String>,
    pub db_path: Option<String>,
    pub categories: Option<Vec<String>>,

    /// Optional [bot] section
    pub bot: Option<FileBot>,

    /// Optional [backup] section
    pub backup: Option<FileBackup>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Print a boxed error and exit
fn config_fatal(title: &str, path: Option<&std::path::Path>, detail: &str) -> ! {
    eprintln!("\n╔══════════════════════════════════════════════════════════════╗");
    eprintln!("║  CONFIG ERROR - {:<45}║", title);
    eprintln!("╚══════════════════════════════════════════════════════════════╝\n");
    if let Some(path) = path {
        eprintln!("  File: {}\n", path.display());
    }
    eprintln!("  Error: {}\n", detail);
    eprintln!("  To reset, run `lifetracker config --reset`.\n");
    std::process::exit(1);
}

impl Config {
    /// Get the config file path: ~/.config/lifetracker/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("lifetracker").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Config is optional
            }
        }

        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists. Exits on a file that cannot be read or parsed.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => config_fatal(
                    "Failed to parse configuration file",
                    Some(&path),
                    &e.to_string(),
                ),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => config_fatal(
                "Cannot read configuration file",
                Some(&path),
                &e.to_string(),
            ),
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();
        match Self::resolve(file, |key| std::env::var(key).ok()) {
            Ok(config) => config,
            Err(msg) => config_fatal("Invalid setting", Self::config_path().as_deref(), &msg),
        }
    }

    /// Merge a parsed file with environment lookups
    pub(crate) fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        // Bind address: env > file > default
        let bind_raw = env("LIFETRACKER_BIND")
            .or(file.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|e| format!("bind address {:?}: {}", bind_raw, e))?;

        // Database: env > file > default
        let db_path = env("LIFETRACKER_DB")
            .or(file.db_path)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB));

        // Categories: file > default; an empty list would leave no fallback bucket
        let categories = file
            .categories
            .filter(|c| !c.is_empty())
            .unwrap_or_else(default_categories);

        let bot = BotConfig::from_file(
            file.bot,
            BotEnv {
                token: env("TG_BOT_TOKEN"),
                user_hash: env("HASH_USER"),
                admin_hash: env("HASH_ADMIN"),
            },
        );
        let backup = BackupConfig::from_file(file.backup);
        let logging = LoggingConfig::from_file(file.logging);

        Ok(Self {
            bind_addr,
            db_path,
            categories,
            bot,
            backup,
            logging,
        })
    }
}
