//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

/// `key = "value"`, or a commented placeholder when unset
fn optional_line(key: &str, value: Option<&str>, placeholder: &str) -> String {
    match value {
        Some(v) => format!("{} = {:?}\n", key, v),
        None => format!("# {} = {:?}\n", key, placeholder),
    }
}

impl Config {
    /// Render the full config file, comments included
    pub fn to_toml(&self) -> String {
        let mut out = String::new();

        out.push_str("# lifetracker configuration\n");
        out.push_str("#\n");
        out.push_str("# Precedence: environment variables > this file > built-in defaults\n\n");

        out.push_str("# HTTP API address (env: LIFETRACKER_BIND)\n");
        out.push_str(&format!("bind_addr = {:?}\n\n", self.bind_addr.to_string()));

        out.push_str("# SQLite database file (env: LIFETRACKER_DB)\n");
        out.push_str(&format!(
            "db_path = {:?}\n\n",
            self.db_path.display().to_string()
        ));

        out.push_str("# Dashboard category order; unknown categories go to the last one\n");
        out.push_str(&format!("categories = {:?}\n\n", self.categories));

        // [bot]
        out.push_str("[bot]\n");
        out.push_str("# Telegram bot token (env: TG_BOT_TOKEN). The bot is off without one.\n");
        out.push_str(&optional_line(
            "token",
            self.bot.token.as_deref(),
            "123456:ABC-your-token",
        ));
        out.push_str("# SHA-256 hex of the passwords (env: HASH_USER / HASH_ADMIN)\n");
        out.push_str("# Generate with: lifetracker hash-password\n");
        out.push_str(&optional_line(
            "user_hash",
            self.bot.user_hash.as_deref(),
            "sha256-hex",
        ));
        out.push_str(&optional_line(
            "admin_hash",
            self.bot.admin_hash.as_deref(),
            "sha256-hex",
        ));
        out.push_str(&format!(
            "poll_timeout_secs = {}\n",
            self.bot.poll_timeout_secs
        ));
        out.push_str(&format!("api_base = {:?}\n\n", self.bot.api_base));

        // [backup]
        out.push_str("[backup]\n");
        out.push_str("# Daily export sent to every logged-in admin chat\n");
        out.push_str(&format!("enabled = {}\n", self.backup.enabled));
        out.push_str(&format!(
            "time = {:?}  # local time, HH:MM\n\n",
            self.backup.time.format("%H:%M").to_string()
        ));

        // [logging]
        out.push_str("[logging]\n");
        out.push_str("# trace, debug, info, warn, error (RUST_LOG overrides)\n");
        out.push_str(&format!("level = {:?}\n", self.logging.level));
        out.push_str("# JSON log files in addition to stdout\n");
        out.push_str(&format!("file_enabled = {}\n", self.logging.file_enabled));
        out.push_str(&format!(
            "file_dir = {:?}\n",
            self.logging.file_dir.display().to_string()
        ));
        out.push_str(&format!(
            "file_rotation = {:?}  # hourly, daily, never\n",
            self.logging.file_rotation.as_str()
        ));
        out.push_str(&format!("file_prefix = {:?}\n", self.logging.file_prefix));

        out
    }
}
