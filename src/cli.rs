// CLI module - command-line argument parsing and handlers
//
// Without a subcommand the server runs. Subcommands:
// - config --show|--path|--reset|--edit: configuration file management
// - export [--output FILE]: write a JSON backup
// - restore FILE: replace the database with a JSON backup
// - hash-password: SHA-256 hex for HASH_USER / HASH_ADMIN

use crate::backup::{export_json, restore_json};
use crate::bot::hash_password;
use crate::config::{Config, VERSION};
use crate::store::Store;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Habit tracker with threads, chains and a companion Telegram bot
#[derive(Parser)]
#[command(name = "lifetracker")]
#[command(version = VERSION)]
#[command(about = "Habit tracker with threads, chains and a Telegram bot", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(long)]
        edit: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Export the database as a JSON backup
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Replace the database with a JSON backup
    Restore {
        /// Backup file produced by `export` or the bot
        file: PathBuf,
    },

    /// Print the SHA-256 hex of a password read from stdin
    HashPassword,
}

/// Handle CLI commands. Returns true if a command was handled (exit after).
pub fn handle_cli() -> bool {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config {
            show,
            reset,
            edit,
            path,
        }) => {
            if path {
                handle_config_path();
            } else if show {
                handle_config_show();
            } else if reset {
                handle_config_reset();
            } else if edit {
                handle_config_edit();
            } else {
                println!("Usage: lifetracker config [--show|--reset|--edit|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --reset   Reset config file to defaults");
                println!("  --edit    Open config file in $EDITOR");
                println!("  --path    Show config file path");
            }
            true
        }
        Some(Commands::Export { output }) => {
            handle_export(output);
            true
        }
        Some(Commands::Restore { file }) => {
            handle_restore(&file);
            true
        }
        Some(Commands::HashPassword) => {
            handle_hash_password();
            true
        }
        None => false, // No subcommand, run the server
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn open_store(config: &Config) -> Store {
    match Store::open(&config.db_path) {
        Ok(store) => store,
        Err(e) => fail(&format!("{:#}", e)),
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => fail("Could not determine config path"),
    }
}

fn handle_config_show() {
    let mut config = Config::from_env();
    if config.bot.token.is_some() {
        config.bot.token = Some("<redacted>".to_string());
    }

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        fail("Could not determine config path");
    };

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        let _ = std::io::stderr().flush();

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err()
            || !input.trim().eq_ignore_ascii_case("y")
        {
            println!("Aborted.");
            return;
        }
    }

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            fail(&format!("Cannot create directory: {}", e));
        }
    }

    if let Err(e) = std::fs::write(&path, Config::default().to_toml()) {
        fail(&format!("Cannot write config: {}", e));
    }

    println!("Config reset to defaults: {}", path.display());
}

fn handle_config_edit() {
    let Some(path) = Config::config_path() else {
        fail("Could not determine config path");
    };

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    match Command::new(&editor).arg(&path).status() {
        Ok(s) if s.success() => {}
        Ok(s) => fail(&format!("Editor exited with status: {}", s)),
        Err(e) => fail(&format!(
            "Failed to launch editor '{}': {}. Set $EDITOR to your preferred editor",
            editor, e
        )),
    }
}

fn handle_export(output: Option<PathBuf>) {
    let config = Config::from_env();
    let store = open_store(&config);

    let json = match export_json(&store) {
        Ok(json) => json,
        Err(e) => fail(&format!("{:#}", e)),
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, json) {
                fail(&format!("Cannot write {}: {}", path.display(), e));
            }
            eprintln!("Backup written to {}", path.display());
        }
        None => println!("{}", json),
    }
}

fn handle_restore(file: &Path) {
    let json = match std::fs::read_to_string(file) {
        Ok(json) => json,
        Err(e) => fail(&format!("Cannot read {}: {}", file.display(), e)),
    };

    let config = Config::from_env();
    let store = open_store(&config);

    match restore_json(&store, &json, Local::now().naive_local()) {
        Ok(summary) => println!("{}", summary),
        Err(e) => fail(&format!("{:#}", e)),
    }
}

fn handle_hash_password() {
    eprint!("Password: ");
    let _ = std::io::stderr().flush();

    let mut line = String::new();
    if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
        fail(&format!("Cannot read stdin: {}", e));
    }
    if line.trim().is_empty() {
        fail("Empty password");
    }
    println!("{}", hash_password(&line));
}
