use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flows::engine::DEFAULT_REQUIRED_CHANNEL;

pub const CONFIG_FILE_NAME: &str = "balloonbot.toml";
pub const TOKEN_ENV_ALIAS: &str = "TELEGRAM_BOT_TOKEN";

/// Long-poll timeouts above this are clamped by the Bot API anyway.
const MAX_POLL_TIMEOUT_SECS: u64 = 50;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    pub required_channel: String,
    pub api_base_url: String,
    pub poll_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bot_token: Option<String>,
    pub required_channel: Option<String>,
    pub api_base_url: Option<String>,
    pub health_check_port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                bot_token: String::new().into(),
                required_channel: DEFAULT_REQUIRED_CHANNEL.to_string(),
                api_base_url: "https://api.telegram.org".to_string(),
                poll_timeout_secs: 30,
                request_timeout_secs: 45,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::load_unvalidated(options)?;
        config.telegram.api_base_url =
            config.telegram.api_base_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    /// Runs every layer except validation. Diagnostics use this to report
    /// all problems instead of stopping at the first.
    pub fn load_unvalidated(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(options.config_path.as_deref()) {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(telegram) = patch.telegram {
            if let Some(bot_token) = telegram.bot_token {
                self.telegram.bot_token = bot_token.into();
            }
            if let Some(required_channel) = telegram.required_channel {
                self.telegram.required_channel = required_channel;
            }
            if let Some(api_base_url) = telegram.api_base_url {
                self.telegram.api_base_url = api_base_url;
            }
            if let Some(poll_timeout_secs) = telegram.poll_timeout_secs {
                self.telegram.poll_timeout_secs = poll_timeout_secs;
            }
            if let Some(request_timeout_secs) = telegram.request_timeout_secs {
                self.telegram.request_timeout_secs = request_timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let bot_token =
            read_env("BALLOONBOT_TELEGRAM_BOT_TOKEN").or_else(|| read_env(TOKEN_ENV_ALIAS));
        if let Some(value) = bot_token {
            self.telegram.bot_token = value.into();
        }
        if let Some(value) = read_env("BALLOONBOT_TELEGRAM_REQUIRED_CHANNEL") {
            self.telegram.required_channel = value;
        }
        if let Some(value) = read_env("BALLOONBOT_TELEGRAM_API_BASE_URL") {
            self.telegram.api_base_url = value;
        }
        if let Some(value) = read_env("BALLOONBOT_TELEGRAM_POLL_TIMEOUT_SECS") {
            self.telegram.poll_timeout_secs =
                parse_u64("BALLOONBOT_TELEGRAM_POLL_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("BALLOONBOT_TELEGRAM_REQUEST_TIMEOUT_SECS") {
            self.telegram.request_timeout_secs =
                parse_u64("BALLOONBOT_TELEGRAM_REQUEST_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("BALLOONBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BALLOONBOT_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("BALLOONBOT_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("BALLOONBOT_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("BALLOONBOT_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("BALLOONBOT_LOGGING_LEVEL").or_else(|| read_env("BALLOONBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BALLOONBOT_LOGGING_FORMAT").or_else(|| read_env("BALLOONBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bot_token) = overrides.bot_token {
            self.telegram.bot_token = bot_token.into();
        }
        if let Some(required_channel) = overrides.required_channel {
            self.telegram.required_channel = required_channel;
        }
        if let Some(api_base_url) = overrides.api_base_url {
            self.telegram.api_base_url = api_base_url;
        }
        if let Some(health_check_port) = overrides.health_check_port {
            self.server.health_check_port = health_check_port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_telegram(&self.telegram)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), Path::new("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

/// Checks that a token looks like `<bot id>:<secret>` without contacting Telegram.
pub fn bot_token_shape_is_valid(token: &str) -> bool {
    match token.split_once(':') {
        Some((bot_id, secret)) => {
            !bot_id.is_empty()
                && bot_id.chars().all(|ch| ch.is_ascii_digit())
                && !secret.is_empty()
                && !secret.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
    let bot_token = telegram.bot_token.expose_secret();
    if bot_token.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "telegram.bot_token is required. Set {TOKEN_ENV_ALIAS} (or \
             BALLOONBOT_TELEGRAM_BOT_TOKEN) to the token issued by @BotFather"
        )));
    }
    if !bot_token_shape_is_valid(bot_token) {
        return Err(ConfigError::Validation(
            "telegram.bot_token must look like `<bot id>:<secret>` as issued by @BotFather"
                .to_string(),
        ));
    }

    let channel = telegram.required_channel.trim();
    let username = channel.strip_prefix('@').is_some_and(|name| !name.is_empty());
    let numeric = channel.strip_prefix('-').unwrap_or(channel);
    let numeric = !numeric.is_empty() && numeric.chars().all(|ch| ch.is_ascii_digit());
    if !username && !numeric {
        return Err(ConfigError::Validation(
            "telegram.required_channel must be `@channelname` or a numeric chat id".to_string(),
        ));
    }

    let base_url = &telegram.api_base_url;
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "telegram.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    if telegram.poll_timeout_secs > MAX_POLL_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "telegram.poll_timeout_secs must be in range 0..={MAX_POLL_TIMEOUT_SECS}"
        )));
    }

    if telegram.request_timeout_secs <= telegram.poll_timeout_secs {
        return Err(ConfigError::Validation(
            "telegram.request_timeout_secs must be greater than telegram.poll_timeout_secs"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    telegram: Option<TelegramPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramPatch {
    bot_token: Option<String>,
    required_channel: Option<String>,
    api_base_url: Option<String>,
    poll_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        bot_token_shape_is_valid, AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat,
    };

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const TOKEN_VARS: [&str; 2] = ["BALLOONBOT_TELEGRAM_BOT_TOKEN", "TELEGRAM_BOT_TOKEN"];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        env::set_var("TEST_BALLOON_TOKEN", "123456:from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("balloonbot.toml");
            fs::write(
                &path,
                r#"
[telegram]
bot_token = "${TEST_BALLOON_TOKEN}"
required_channel = "@otherchannel"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.telegram.bot_token.expose_secret() == "123456:from-env",
                "bot token should be interpolated from environment",
            )?;
            ensure(
                config.telegram.required_channel == "@otherchannel",
                "required channel should come from the file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_BALLOON_TOKEN"]);
        result
    }

    #[test]
    fn plain_telegram_token_variable_is_accepted() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        env::set_var("TELEGRAM_BOT_TOKEN", "42:plain-alias");
        env::set_var("BALLOONBOT_LOG_LEVEL", "warn");
        env::set_var("BALLOONBOT_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.telegram.bot_token.expose_secret() == "42:plain-alias",
                "unprefixed token variable should be honored",
            )?;
            ensure(config.logging.level == "warn", "log level alias should be honored")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "log format alias should be honored",
            )?;
            ensure(
                config.telegram.required_channel == "@maxdecorkrd",
                "default channel should apply",
            )?;
            Ok(())
        })();

        clear_vars(&["TELEGRAM_BOT_TOKEN", "BALLOONBOT_LOG_LEVEL", "BALLOONBOT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        env::set_var("BALLOONBOT_TELEGRAM_BOT_TOKEN", "1:from-env");
        env::set_var("TELEGRAM_BOT_TOKEN", "2:loses-to-prefixed");
        env::set_var("BALLOONBOT_SERVER_HEALTH_CHECK_PORT", "9090");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("balloonbot.toml");
            fs::write(
                &path,
                r#"
[telegram]
bot_token = "3:from-file"
api_base_url = "http://localhost:8081/"

[server]
health_check_port = 7070

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.telegram.bot_token.expose_secret() == "1:from-env",
                "prefixed env token should win over alias and file",
            )?;
            ensure(config.server.health_check_port == 9090, "env port should win over file")?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            ensure(
                config.telegram.api_base_url == "http://localhost:8081",
                "trailing slash should be trimmed from api base url",
            )?;
            Ok(())
        })();

        clear_vars(&[
            "BALLOONBOT_TELEGRAM_BOT_TOKEN",
            "TELEGRAM_BOT_TOKEN",
            "BALLOONBOT_SERVER_HEALTH_CHECK_PORT",
        ]);
        result
    }

    #[test]
    fn missing_token_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure but config load succeeded".into()),
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message)
                if message.contains("TELEGRAM_BOT_TOKEN") && message.contains("@BotFather")
        );
        ensure(has_message, "validation failure should name the token variable")
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        env::set_var("TELEGRAM_BOT_TOKEN", "42:secret");
        env::set_var("BALLOONBOT_TELEGRAM_POLL_TIMEOUT_SECS", "soon");

        let result = match AppConfig::load(LoadOptions::default()) {
            Err(ConfigError::InvalidEnvOverride { key, .. }) => ensure(
                key == "BALLOONBOT_TELEGRAM_POLL_TIMEOUT_SECS",
                "error should name the offending key",
            ),
            Err(other) => Err(format!("unexpected error: {other}")),
            Ok(_) => Err("expected invalid override error".to_string()),
        };

        clear_vars(&["TELEGRAM_BOT_TOKEN", "BALLOONBOT_TELEGRAM_POLL_TIMEOUT_SECS"]);
        result
    }

    #[test]
    fn request_timeout_must_exceed_poll_timeout() -> Result<(), String> {
        let mut config = AppConfig::default();
        config.telegram.bot_token = "42:secret".to_string().into();
        config.telegram.poll_timeout_secs = 30;
        config.telegram.request_timeout_secs = 30;

        let rejected = matches!(
            config.validate(),
            Err(ConfigError::Validation(ref message)) if message.contains("request_timeout_secs")
        );
        ensure(rejected, "equal timeouts should be rejected")
    }

    #[test]
    fn required_channel_accepts_username_or_numeric_id() -> Result<(), String> {
        let mut config = AppConfig::default();
        config.telegram.bot_token = "42:secret".to_string().into();

        config.telegram.required_channel = "-1001234567890".to_string();
        ensure(config.validate().is_ok(), "numeric channel id should be accepted")?;

        config.telegram.required_channel = "maxdecorkrd".to_string();
        ensure(config.validate().is_err(), "bare channel name should be rejected")
    }

    #[test]
    fn token_shape_check() {
        assert!(bot_token_shape_is_valid("123456:ABC-def_ghi"));
        assert!(!bot_token_shape_is_valid("ABC:123"));
        assert!(!bot_token_shape_is_valid("123456"));
        assert!(!bot_token_shape_is_valid("123456:"));
        assert!(!bot_token_shape_is_valid("123 456:abc"));
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&TOKEN_VARS);

        env::set_var("BALLOONBOT_TELEGRAM_BOT_TOKEN", "777:very-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("very-secret-value"),
                "debug output should not contain bot token",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&["BALLOONBOT_TELEGRAM_BOT_TOKEN"]);
        result
    }
}
