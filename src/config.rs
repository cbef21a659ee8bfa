//! Process configuration, read once from the environment at startup.

use std::env::VarError;
use std::path::PathBuf;

use url::Url;

/// Signing key used when `REDIRECT_SECRET` is unset. Development only.
pub const DEFAULT_SECRET: &str = "unsafe-dev-secret";

const DEFAULT_REDIRECT_URL: &str = "https://example.com";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_PORT: u16 = 3000;

/// Credentials for the notification sink.
#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    /// Base URL of the Bot API; overridable so any compatible sink can stand in.
    pub api_url: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Immutable gate configuration.
#[derive(Clone)]
pub struct Config {
    /// HMAC key for redirect tokens.
    pub secret: String,
    /// Referrer/origin prefixes that may reach the gate. Empty = unrestricted.
    pub allowed_refs: Vec<String>,
    /// The protected destination.
    pub redirect_url: Url,
    /// `None` disables notifications.
    pub telegram: Option<TelegramConfig>,
    pub port: u16,
    /// Optional page template on disk; `None` uses the built-in page.
    pub template_path: Option<PathBuf>,
    /// User-agent signatures blocked in addition to the built-in list.
    pub extra_bot_signatures: Vec<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret", &"<redacted>")
            .field("allowed_refs", &self.allowed_refs)
            .field("redirect_url", &self.redirect_url.as_str())
            .field("telegram", &self.telegram)
            .field("port", &self.port)
            .field("template_path", &self.template_path)
            .field("extra_bot_signatures", &self.extra_bot_signatures)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Tests supply variables this way without mutating process-global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        // Empty and whitespace-only values count as unset.
        let get = |key: &str| {
            reader(key)
                .ok()
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let secret = get("REDIRECT_SECRET").unwrap_or_else(|| DEFAULT_SECRET.to_owned());

        let allowed_refs = get("ALLOWED_REF").map(|v| split_list(&v)).unwrap_or_default();

        let raw_url = get("REDIRECT_URL").unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_owned());
        let redirect_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidValue("REDIRECT_URL".into(), e.to_string()))?;
        if !matches!(redirect_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue(
                "REDIRECT_URL".into(),
                "must be an absolute http(s) URL".into(),
            ));
        }

        let telegram = match (get("TELEGRAM_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Some(TelegramConfig {
                token,
                chat_id,
                api_url: get("TELEGRAM_API_URL")
                    .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_owned())
                    .trim_end_matches('/')
                    .to_owned(),
            }),
            _ => None,
        };

        let port = match get("PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue("PORT".into(), e.to_string()))?,
            None => DEFAULT_PORT,
        };

        let template_path = get("REDIRECT_TEMPLATE").map(PathBuf::from);

        let extra_bot_signatures = get("BOT_SIGNATURES")
            .map(|v| split_list(&v).into_iter().map(|s| s.to_ascii_lowercase()).collect())
            .unwrap_or_default();

        Ok(Self {
            secret,
            allowed_refs,
            redirect_url,
            telegram,
            port,
            template_path,
            extra_bot_signatures,
        })
    }

    /// True when running on [`DEFAULT_SECRET`]; tokens are then forgeable by anyone.
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
