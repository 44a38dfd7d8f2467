use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use diary_core::backup::DATABASE_PATH_ENV;
use diary_core::pagination::DEFAULT_PAGE_SIZE;
use diary_core::services::OwnerScope;
use diary_core::session::MIN_SECRET_LEN;
use diary_core::util::is_http_url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_path: PathBuf,
    pub session_secret: String,
    pub auth_clock_skew: Duration,
    pub login_url: String,
    pub page_size: usize,
    pub owner_scope: OwnerScope,
    pub backup_command: Vec<String>,
    pub mail: MailConfig,
}

#[derive(Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub relay_url: Option<String>,
    pub relay_token: Option<String>,
    pub from: String,
    pub recipients: Vec<String>,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MailConfig")
            .field("relay_url", &self.relay_url)
            .field(
                "relay_token",
                &self.relay_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("from", &self.from)
            .field("recipients", &self.recipients)
            .finish()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_path", &self.database_path)
            .field("session_secret", &"[REDACTED]")
            .field("auth_clock_skew", &self.auth_clock_skew)
            .field("login_url", &self.login_url)
            .field("page_size", &self.page_size)
            .field("owner_scope", &self.owner_scope)
            .field("backup_command", &self.backup_command)
            .field("mail", &self.mail)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "DIARY_BIND_ADDR", "127.0.0.1:8000");
        let database_path = PathBuf::from(value_or_default(
            &lookup,
            DATABASE_PATH_ENV,
            "diary.db",
        ));

        let session_secret = required_trimmed(&lookup, "DIARY_SESSION_SECRET")?;
        if session_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "DIARY_SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        let auth_clock_skew_secs = value_or_default(&lookup, "DIARY_AUTH_CLOCK_SKEW_SECS", "60")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "DIARY_AUTH_CLOCK_SKEW_SECS must be an integer in [0, 300]".to_string(),
                )
            })?;
        if auth_clock_skew_secs > 300 {
            return Err(ConfigError::Invalid(
                "DIARY_AUTH_CLOCK_SKEW_SECS must be in [0, 300]".to_string(),
            ));
        }

        let login_url = value_or_default(&lookup, "DIARY_LOGIN_URL", "/accounts/login/");
        if !login_url.starts_with('/') && !is_http_url(&login_url) {
            return Err(ConfigError::Invalid(
                "DIARY_LOGIN_URL must be a path or an http(s) URL".to_string(),
            ));
        }

        let page_size = value_or_default(&lookup, "DIARY_PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::Invalid("DIARY_PAGE_SIZE must be an integer in [1, 100]".to_string())
            })?;
        if !(1..=100).contains(&page_size) {
            return Err(ConfigError::Invalid(
                "DIARY_PAGE_SIZE must be in [1, 100]".to_string(),
            ));
        }

        let owner_scope = if parse_bool(&lookup, "DIARY_OWNER_SCOPED_ACCESS")? {
            OwnerScope::AllOperations
        } else {
            OwnerScope::ListOnly
        };

        let backup_command = value_or_default(&lookup, "DIARY_BACKUP_COMMAND", "diary backup")
            .split_whitespace()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mail = parse_mail_config(&lookup)?;

        Ok(Self {
            bind_addr,
            database_path,
            session_secret,
            auth_clock_skew: Duration::from_secs(auth_clock_skew_secs),
            login_url,
            page_size,
            owner_scope,
            backup_command,
            mail,
        })
    }
}

fn parse_mail_config(lookup: impl Fn(&str) -> Option<String>) -> Result<MailConfig, ConfigError> {
    let relay_url = optional_trimmed(&lookup, "MAIL_RELAY_URL");
    if let Some(relay_url) = relay_url.as_deref() {
        let parsed = url::Url::parse(relay_url).map_err(|error| {
            ConfigError::Invalid(format!("MAIL_RELAY_URL is not a valid URL: {error}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(
                "MAIL_RELAY_URL must start with http:// or https://".to_string(),
            ));
        }
    }
    let relay_token = optional_trimmed(&lookup, "MAIL_RELAY_TOKEN");
    if relay_token.is_some() && relay_url.is_none() {
        return Err(ConfigError::MissingVar("MAIL_RELAY_URL"));
    }

    let from = value_or_default(&lookup, "MAIL_FROM", "diary@localhost");
    let recipients = value_or_default(&lookup, "INQUIRY_RECIPIENTS", "admin@localhost")
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if recipients.is_empty() {
        return Err(ConfigError::Invalid(
            "INQUIRY_RECIPIENTS must list at least one address".to_string(),
        ));
    }

    Ok(MailConfig {
        relay_url,
        relay_token,
        from,
        recipients,
    })
}

fn parse_bool(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Result<bool, ConfigError> {
    let Some(value) = optional_trimmed(lookup, name) else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!("{name} must be a boolean"))),
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
