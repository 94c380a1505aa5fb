// Startup module - banner and module status
//
// Printed to stdout before the server starts, and mirrored into the log so
// file-only deployments still record what was enabled.

use crate::config::{Config, VERSION};

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const MAGENTA: &str = "\x1b[35m";
}

/// Module loading result for display
#[derive(Debug, PartialEq)]
pub struct ModuleStatus {
    pub name: &'static str,
    pub enabled: bool,
    pub description: String,
}

/// Status of every module based on config
pub fn module_status(config: &Config) -> Vec<ModuleStatus> {
    let bot_enabled = config.bot.is_enabled();
    vec![
        ModuleStatus {
            name: "web",
            enabled: true,
            description: format!("HTTP API on {}", config.bind_addr),
        },
        ModuleStatus {
            name: "bot",
            enabled: bot_enabled,
            description: if bot_enabled {
                "Telegram long polling".to_string()
            } else {
                "Telegram bot (set TG_BOT_TOKEN)".to_string()
            },
        },
        ModuleStatus {
            name: "scheduler",
            // Backups go to admin chats, so no bot means nowhere to send
            enabled: bot_enabled && config.backup.enabled,
            description: format!("Daily backup at {}", config.backup.time.format("%H:%M")),
        },
        ModuleStatus {
            name: "file-log",
            enabled: config.logging.file_enabled,
            description: format!(
                "JSON logs in {} ({})",
                config.logging.file_dir.display(),
                config.logging.file_rotation.as_str()
            ),
        },
    ]
}

/// Print the startup banner and module status
pub fn print_startup(config: &Config) {
    use colors::*;

    println!();
    println!("  {BOLD}{CYAN}Lifetracker{RESET} {DIM}v{VERSION}{RESET}");
    println!("  {DIM}Threads, chains and a daily journal{RESET}");
    println!();

    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("  {DIM}Config:{RESET} {GREEN}✓{RESET} {}", path.display());
        } else {
            println!("  {DIM}Config:{RESET} {DIM}(using defaults){RESET}");
        }
    }
    println!("  {DIM}Database:{RESET} {}", config.db_path.display());
    println!();

    println!("  {DIM}Loading modules...{RESET}");
    for module in &module_status(config) {
        print_module_status(module);
    }
    println!();

    println!(
        "  {MAGENTA}▸{RESET} Dashboard API on {BOLD}http://{}{RESET}",
        config.bind_addr
    );
    if config.bot.is_enabled() && config.bot.admin_hash.is_none() {
        println!("  {YELLOW}▸{RESET} {YELLOW}No admin password set{RESET} {DIM}(HASH_ADMIN){RESET}");
    }
    println!();
}

fn print_module_status(module: &ModuleStatus) {
    use colors::*;

    let (icon, style) = if module.enabled {
        (format!("{GREEN}✓{RESET}"), "")
    } else {
        (format!("{DIM}○{RESET}"), DIM)
    };

    println!(
        "    {icon} {style}{:<10}{RESET} {DIM}{}{RESET}",
        module.name, module.description
    );
}

/// Mirror the startup status into the log
pub fn log_startup(config: &Config) {
    tracing::info!("Lifetracker v{} starting", VERSION);
    tracing::info!("Database: {}", config.db_path.display());
    for module in &module_status(config) {
        let icon = if module.enabled { "✓" } else { "○" };
        tracing::info!("  {} {} - {}", icon, module.name, module.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_only_web_enabled() {
        let modules = module_status(&Config::default());
        let enabled: Vec<&str> = modules
            .iter()
            .filter(|m| m.enabled)
            .map(|m| m.name)
            .collect();
        assert_eq!(enabled, vec!["web"]);
        assert!(modules[0].description.contains("127.0.0.1:8000"));
        assert!(modules[2].description.contains("23:59"));
    }

    #[test]
    fn test_scheduler_follows_bot() {
        let mut config = Config::default();
        config.bot.token = Some("123:abc".to_string());
        let modules = module_status(&config);
        assert!(modules[1].enabled);
        assert!(modules[2].enabled);

        config.backup.enabled = false;
        assert!(!module_status(&config)[2].enabled);
    }
}
