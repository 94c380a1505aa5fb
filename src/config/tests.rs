//! Configuration tests
//!
//! The round-trip tests guard `to_toml()`: every field written to the
//! template must parse back into the same value.

use super::*;
use chrono::NaiveTime;
use std::collections::HashMap;

fn no_env(_: &str) -> Option<String> {
    None
}

fn parse(toml_str: &str) -> FileConfig {
    match toml::from_str(toml_str) {
        Ok(file) => file,
        Err(e) => panic!("TOML should parse.\nTOML:\n{}\nError: {}", toml_str, e),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let file = parse(&config.to_toml());
    let restored = Config::resolve(file, no_env).unwrap();
    assert_eq!(restored, config);
}

#[test]
fn test_config_roundtrip_custom_values() {
    let config = Config {
        bind_addr: "0.0.0.0:9090".parse().unwrap(),
        db_path: PathBuf::from("/var/lib/lifetracker/db.sqlite"),
        categories: vec!["deep work".to_string(), "other \"stuff\"".to_string()],
        bot: BotConfig {
            token: Some("42:secret".to_string()),
            user_hash: Some("aa".repeat(32)),
            admin_hash: Some("bb".repeat(32)),
            poll_timeout_secs: 10,
            api_base: "http://localhost:8081".to_string(),
        },
        backup: BackupConfig {
            enabled: false,
            time: NaiveTime::from_hms_opt(6, 30, 0).unwrap(),
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            file_enabled: true,
            file_dir: PathBuf::from("/tmp/logs"),
            file_rotation: LogRotation::Hourly,
            file_prefix: "lt".to_string(),
        },
    };

    let file = parse(&config.to_toml());
    let restored = Config::resolve(file, no_env).unwrap();
    assert_eq!(restored, config);
}

#[test]
fn test_default_template_leaves_secrets_commented() {
    let toml_str = Config::default().to_toml();
    assert!(toml_str.contains("# token = "));
    assert!(toml_str.contains("# user_hash = "));
    assert!(toml_str.contains("# admin_hash = "));
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_env_overrides_file() {
    let file = parse(
        r#"
        bind_addr = "127.0.0.1:1111"
        db_path = "file.db"

        [bot]
        token = "file-token"
        user_hash = "FILEHASH"
        "#,
    );
    let env: HashMap<&str, &str> = [
        ("LIFETRACKER_BIND", "127.0.0.1:2222"),
        ("TG_BOT_TOKEN", "env-token"),
    ]
    .into_iter()
    .collect();

    let config = Config::resolve(file, |k| env.get(k).map(|v| v.to_string())).unwrap();
    assert_eq!(config.bind_addr.port(), 2222);
    assert_eq!(config.db_path, PathBuf::from("file.db"));
    assert_eq!(config.bot.token.as_deref(), Some("env-token"));
    // Hashes are compared in lowercase
    assert_eq!(config.bot.user_hash.as_deref(), Some("filehash"));
    assert!(config.bot.is_enabled());
}

#[test]
fn test_blank_env_token_disables_bot() {
    let env = |k: &str| (k == "TG_BOT_TOKEN").then(|| "  ".to_string());
    let config = Config::resolve(FileConfig::default(), env).unwrap();
    assert!(!config.bot.is_enabled());
}

#[test]
fn test_invalid_bind_address_is_an_error() {
    let file = parse(r#"bind_addr = "not-an-address""#);
    let err = Config::resolve(file, no_env).unwrap_err();
    assert!(err.contains("not-an-address"));
}

#[test]
fn test_empty_categories_fall_back_to_defaults() {
    let file = parse("categories = []");
    let config = Config::resolve(file, no_env).unwrap();
    assert_eq!(config.categories, default_categories());
}

#[test]
fn test_invalid_backup_time_uses_default() {
    let file = parse("[backup]\ntime = \"25:99\"");
    let config = Config::resolve(file, no_env).unwrap();
    assert_eq!(config.backup.time, NaiveTime::from_hms_opt(23, 59, 0).unwrap());
}

#[test]
fn test_unknown_rotation_defaults_to_daily() {
    assert_eq!(LogRotation::parse("weekly"), LogRotation::Daily);
    assert_eq!(LogRotation::parse("HOURLY"), LogRotation::Hourly);
}

#[test]
fn test_logging_values_are_normalized() {
    let file = parse("[logging]\nlevel = \" DEBUG \"\nfile_dir = \"\"\nfile_prefix = \" \"");
    let logging = Config::resolve(file, no_env).unwrap().logging;
    assert_eq!(logging.level, "debug");
    assert_eq!(logging.file_dir, PathBuf::from("./logs"));
    assert_eq!(logging.file_prefix, "lifetracker");

    let file = parse("[logging]\nlevel = \"verbose\"");
    assert_eq!(Config::resolve(file, no_env).unwrap().logging.level, "info");
}

#[test]
fn test_rotation_maps_to_appender() {
    use tracing_appender::rolling::Rotation;
    assert_eq!(LogRotation::Hourly.rotation(), Rotation::HOURLY);
    assert_eq!(LogRotation::Never.rotation(), Rotation::NEVER);
    assert_eq!(LogRotation::default().rotation(), Rotation::DAILY);
}

#[test]
fn test_bot_config_debug_hides_token() {
    let bot = BotConfig {
        token: Some("42:secret".to_string()),
        ..Default::default()
    };
    let shown = format!("{:?}", bot);
    assert!(!shown.contains("secret"));
    assert!(shown.contains("<redacted>"));
}
