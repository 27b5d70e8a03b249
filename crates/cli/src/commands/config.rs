use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use balloonbot_core::config::{resolve_config_path, AppConfig, TOKEN_ENV_ALIAS};
use secrecy::ExposeSecret;
use toml::Value;

use super::{load_options, CommandResult, EXIT_CONFIG_FAILURE};

/// Prints the effective configuration without validating it, so a missing
/// token still shows where every other value came from.
pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let config = match AppConfig::load_unvalidated(load_options(config_path.clone())) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_load",
                format!("config could not be loaded: {error}"),
                EXIT_CONFIG_FAILURE,
            );
        }
    };

    let file_path = resolve_config_path(config_path.as_deref());
    let file_doc = load_config_file_doc(file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, file_doc.as_ref(), file_path.as_deref())
    };

    let telegram = &config.telegram;
    let server = &config.server;
    let fields = [
        (
            "telegram.bot_token",
            redact_token(telegram.bot_token.expose_secret()),
            source("telegram.bot_token", &["BALLOONBOT_TELEGRAM_BOT_TOKEN", TOKEN_ENV_ALIAS]),
        ),
        (
            "telegram.required_channel",
            telegram.required_channel.clone(),
            source("telegram.required_channel", &["BALLOONBOT_TELEGRAM_REQUIRED_CHANNEL"]),
        ),
        (
            "telegram.api_base_url",
            telegram.api_base_url.clone(),
            source("telegram.api_base_url", &["BALLOONBOT_TELEGRAM_API_BASE_URL"]),
        ),
        (
            "telegram.poll_timeout_secs",
            telegram.poll_timeout_secs.to_string(),
            source("telegram.poll_timeout_secs", &["BALLOONBOT_TELEGRAM_POLL_TIMEOUT_SECS"]),
        ),
        (
            "telegram.request_timeout_secs",
            telegram.request_timeout_secs.to_string(),
            source(
                "telegram.request_timeout_secs",
                &["BALLOONBOT_TELEGRAM_REQUEST_TIMEOUT_SECS"],
            ),
        ),
        (
            "server.bind_address",
            server.bind_address.clone(),
            source("server.bind_address", &["BALLOONBOT_SERVER_BIND_ADDRESS"]),
        ),
        (
            "server.health_check_port",
            server.health_check_port.to_string(),
            source("server.health_check_port", &["BALLOONBOT_SERVER_HEALTH_CHECK_PORT"]),
        ),
        (
            "server.graceful_shutdown_secs",
            server.graceful_shutdown_secs.to_string(),
            source(
                "server.graceful_shutdown_secs",
                &["BALLOONBOT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            ),
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            source("logging.level", &["BALLOONBOT_LOGGING_LEVEL", "BALLOONBOT_LOG_LEVEL"]),
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            source("logging.format", &["BALLOONBOT_LOGGING_FORMAT", "BALLOONBOT_LOG_FORMAT"]),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|(key, value, source)| render_line(key, value, source)));
    CommandResult::output(lines.join("\n"))
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: &str) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the bot id before the colon; the secret half never prints.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.split_once(':') {
        Some((bot_id, _)) if !bot_id.is_empty() => format!("{bot_id}:***"),
        _ => "<redacted>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, redact_token};

    #[test]
    fn redaction_keeps_only_the_bot_id() {
        assert_eq!(redact_token("123456:AA-secret"), "123456:***");
        assert_eq!(redact_token("   "), "<empty>");
        assert_eq!(redact_token("no-colon-here"), "<redacted>");
        assert_eq!(redact_token(":secret"), "<redacted>");
    }

    #[test]
    fn nested_keys_are_found_in_the_file_document() {
        let doc: Value = "[telegram]\nrequired_channel = \"@other\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "telegram.required_channel"));
        assert!(!contains_path(&doc, "telegram.bot_token"));
        assert!(!contains_path(&doc, "server.bind_address"));
    }
}
