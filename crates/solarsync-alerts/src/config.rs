//! Configuration management for SolarSync alerts
//!
//! Everything is read once, at startup, from the process environment (or any
//! key lookup in tests) and handed to the components that need it.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.solarsync-volcasolar.fr";

/// Default log file, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "logs/solarsync-alerts.log";

/// Deployment environment the run is labelled with
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    Dev,
    /// Pre-production
    Staging,
    /// Production
    #[default]
    Production,
}

impl Environment {
    /// Lowercase label used in reports and notifications
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment label
    pub environment: Environment,

    /// Monitoring API configuration
    pub api: ApiConfig,

    /// Notification channels
    pub notifications: NotificationConfig,
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env(environment: Environment) -> Result<Self> {
        Self::from_lookup(environment, |key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(environment: Environment, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            environment,
            api: ApiConfig::from_lookup(&lookup)?,
            notifications: NotificationConfig::from_lookup(&lookup)?,
        })
    }
}

/// Monitoring API configuration
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ApiConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = non_empty(lookup("SOLARSYNC_API_KEY"))
            .ok_or_else(|| Error::config("SOLARSYNC_API_KEY is not set"))?;

        let base_url = non_empty(lookup("SOLARSYNC_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::config(format!(
                "SOLARSYNC_BASE_URL must be an http(s) URL, got '{base_url}'"
            )));
        }

        let timeout_secs = match non_empty(lookup("SOLARSYNC_TIMEOUT_SECS")) {
            Some(raw) => raw.parse().map_err(|_| {
                Error::config(format!("SOLARSYNC_TIMEOUT_SECS is not a number: '{raw}'"))
            })?,
            None => 10,
        };

        Ok(Self {
            base_url,
            api_key,
            timeout_secs,
        })
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Notification channel configuration
#[derive(Debug, Clone, Default)]
pub struct NotificationConfig {
    /// Slack compatible incoming webhook
    pub slack_webhook_url: Option<String>,
    /// Email recipients
    pub email_recipients: Vec<String>,
    /// SMTP transport, used when recipients are configured
    pub smtp: SmtpConfig,
}

impl NotificationConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email_recipients = lookup("EMAIL_RECIPIENTS")
            .map(|raw| parse_recipients(&raw))
            .unwrap_or_default();

        Ok(Self {
            slack_webhook_url: non_empty(lookup("SLACK_WEBHOOK_URL")),
            email_recipients,
            smtp: SmtpConfig::from_lookup(lookup)?,
        })
    }

    /// Whether at least one channel is configured
    pub fn has_channels(&self) -> bool {
        self.slack_webhook_url.is_some() || !self.email_recipients.is_empty()
    }
}

/// SMTP transport configuration
#[derive(Clone)]
pub struct SmtpConfig {
    /// Relay host
    pub host: String,
    /// Relay port
    pub port: u16,
    /// Username; STARTTLS is used when credentials are set
    pub username: Option<String>,
    /// Password, required along with the username
    pub password: Option<String>,
    /// Sender address
    pub from: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 25,
            username: None,
            password: None,
            from: "solarsync-monitor@volcasolar.fr".to_string(),
        }
    }
}

impl SmtpConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let username = non_empty(lookup("SMTP_USERNAME"));
        let password = non_empty(lookup("SMTP_PASSWORD"));

        if username.is_some() != password.is_some() {
            return Err(Error::config(
                "SMTP_USERNAME and SMTP_PASSWORD must be set together",
            ));
        }

        let mut smtp = Self {
            host: non_empty(lookup("SMTP_HOST")).unwrap_or(defaults.host),
            port: defaults.port,
            username,
            password,
            from: non_empty(lookup("EMAIL_FROM")).unwrap_or(defaults.from),
        };

        smtp.port = match non_empty(lookup("SMTP_PORT")) {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::config(format!("SMTP_PORT is not a valid port: '{raw}'")))?,
            // Authenticated relays listen on the submission port
            None if smtp.credentials().is_some() => 587,
            None => defaults.port,
        };

        Ok(smtp)
    }

    /// Username and password, when the relay requires authentication
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from", &self.from)
            .finish()
    }
}

/// Log output format on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Append-only log file; `None` disables the file sink
    pub file: Option<PathBuf>,
    /// Stderr format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Logging settings from the process environment. Never fails so that
    /// logging can be up before the rest of the configuration is validated.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Logging settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match lookup("SOLARSYNC_LOG_FILE") {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(PathBuf::from(raw.trim())),
            None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        };

        let format = match lookup("SOLARSYNC_LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self { file, format }
    }
}

/// Split a comma separated recipient list, dropping blanks
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
