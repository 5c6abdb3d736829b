//! Notification delivery for alert summaries

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{NotificationConfig, SmtpConfig};
use crate::models::{NotificationEvent, Severity};

/// A channel able to deliver a notification event
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name used in logs and results
    fn channel(&self) -> &'static str;

    /// Deliver one event
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotificationError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn channel(&self) -> &'static str {
        (**self).channel()
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        (**self).send(event).await
    }
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn channel(&self) -> &'static str {
        (**self).channel()
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        (**self).send(event).await
    }
}

/// Notification errors
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Webhook request failed or was rejected
    #[error("HTTP error: {0}")]
    Http(String),

    /// Message could not be built or sent over SMTP
    #[error("Email error: {0}")]
    Email(String),

    /// Channel misconfigured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Some channels of a fan-out failed
    #[error("{failed} of {attempted} channel(s) failed")]
    Partial {
        /// Channels that failed
        failed: usize,
        /// Channels tried
        attempted: usize,
    },
}

/// Result of sending a notification on one channel
#[derive(Debug, Clone)]
pub struct NotificationResult {
    /// Channel name
    pub channel_type: String,
    /// Whether delivery succeeded
    pub success: bool,
    /// Failure reason
    pub error: Option<String>,
    /// When delivery was attempted
    pub sent_at: DateTime<Utc>,
}

/// Sends one event through every configured channel
#[derive(Default)]
pub struct NotificationSender {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotificationSender {
    /// Create an empty sender
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the channels described by the configuration
    pub fn from_config(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let mut sender = Self::new();

        if let Some(url) = &config.slack_webhook_url {
            sender = sender.with_channel(SlackNotifier::new(url)?);
        }

        if !config.email_recipients.is_empty() {
            sender = sender.with_channel(EmailNotifier::new(&config.smtp, &config.email_recipients)?);
        }

        Ok(sender)
    }

    /// Add a channel
    pub fn with_channel(mut self, channel: impl Notifier + 'static) -> Self {
        self.channels.push(Box::new(channel));
        self
    }

    /// Number of configured channels
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channel is configured
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Send to every channel, one after the other, without stopping at failures
    pub async fn send_all(&self, event: &NotificationEvent) -> Vec<NotificationResult> {
        let mut results = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let sent_at = Utc::now();
            let result = channel.send(event).await;

            if let Err(e) = &result {
                warn!(channel = channel.channel(), error = %e, "Notification delivery failed");
            }

            results.push(NotificationResult {
                channel_type: channel.channel().to_string(),
                success: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
                sent_at,
            });
        }

        results
    }
}

#[async_trait]
impl Notifier for NotificationSender {
    fn channel(&self) -> &'static str {
        "all"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        if self.channels.is_empty() {
            info!(severity = %event.severity, "No notification channel configured");
            return Ok(());
        }

        let results = self.send_all(event).await;
        let failed = results.iter().filter(|r| !r.success).count();

        if failed > 0 {
            return Err(NotificationError::Partial {
                failed,
                attempted: results.len(),
            });
        }

        Ok(())
    }
}

/// Slack compatible incoming webhook
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
}

impl SlackNotifier {
    /// Create a new Slack notifier
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, NotificationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotificationError::Config(e.to_string()))?;

        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn channel(&self) -> &'static str {
        "slack"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        let payload = build_slack_payload(event);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Http(format!(
                "Slack returned {}: {}",
                status, body
            )));
        }

        info!(severity = %event.severity, "Slack notification sent");
        Ok(())
    }
}

/// Build the webhook payload for an event
pub fn build_slack_payload(event: &NotificationEvent) -> SlackPayload {
    let (color, emoji) = match event.severity {
        Severity::Critical => ("#dc3545", "🚨"),
        Severity::High => ("#ffc107", "⚠️"),
        _ => ("#17a2b8", "ℹ️"),
    };

    let tally = &event.tally;

    SlackPayload {
        text: format!("{} [{}] {}", emoji, event.environment.as_str().to_uppercase(), event.message),
        attachments: vec![SlackAttachment {
            color: color.to_string(),
            fields: vec![
                SlackField::short("Sévérité", event.severity.as_str().to_uppercase()),
                SlackField::short("Site", event.scope()),
                SlackField::short("Critiques", tally.critical.to_string()),
                SlackField::short("Hautes", tally.high.to_string()),
                SlackField::short("Moyennes", tally.medium.to_string()),
                SlackField::short("Total", tally.total.to_string()),
                SlackField::short("Environnement", event.environment.as_str()),
            ],
            footer: Some("SolarSync Monitoring".to_string()),
            ts: Some(event.created_at.timestamp()),
        }],
    }
}

/// Incoming webhook body
#[derive(Debug, Serialize)]
pub struct SlackPayload {
    /// Main line
    pub text: String,
    /// Colored detail block
    pub attachments: Vec<SlackAttachment>,
}

/// Webhook attachment
#[derive(Debug, Serialize)]
pub struct SlackAttachment {
    /// Hex color of the side bar
    pub color: String,
    /// Key/value fields
    pub fields: Vec<SlackField>,
    /// Footer text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    /// Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

/// Attachment field
#[derive(Debug, Serialize)]
pub struct SlackField {
    /// Label
    pub title: String,
    /// Value
    pub value: String,
    /// Rendered side by side with the next field
    pub short: bool,
}

impl SlackField {
    fn short(title: &str, value: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            value: value.into(),
            short: true,
        }
    }
}

/// Plain-text email over SMTP
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailNotifier {
    /// Create a new email notifier.
    ///
    /// STARTTLS relay when credentials are configured, plain SMTP otherwise.
    pub fn new(config: &SmtpConfig, recipients: &[String]) -> Result<Self, NotificationError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| NotificationError::Config(format!("invalid sender '{}': {e}", config.from)))?;

        let to = recipients
            .iter()
            .map(|r| {
                r.parse::<Mailbox>()
                    .map_err(|e| NotificationError::Config(format!("invalid recipient '{r}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let transport = match config.credentials() {
            Some((user, password)) => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| NotificationError::Config(e.to_string()))?
                    .port(config.port)
                    .credentials(Credentials::new(user.to_string(), password.to_string()))
                    .build()
            }
            None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .build(),
        };

        Ok(Self { transport, from, to })
    }

    /// Build the message for an event
    pub fn build_message(&self, event: &NotificationEvent) -> Result<Message, NotificationError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email_subject(event))
            .header(ContentType::TEXT_PLAIN);

        for to in &self.to {
            builder = builder.to(to.clone());
        }

        builder
            .body(email_body(event))
            .map_err(|e| NotificationError::Email(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        let message = self.build_message(event)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Email(e.to_string()))?;

        info!(recipients = self.to.len(), severity = %event.severity, "Email notification sent");
        Ok(())
    }
}

/// Subject line, e.g. `[SolarSync][PRODUCTION] CRITICAL - VS-PDD-001`
pub fn email_subject(event: &NotificationEvent) -> String {
    format!(
        "[SolarSync][{}] {} - {}",
        event.environment.as_str().to_uppercase(),
        event.severity.as_str().to_uppercase(),
        event.scope()
    )
}

/// Plain-text body
pub fn email_body(event: &NotificationEvent) -> String {
    let tally = &event.tally;
    format!(
        "{message}\n\n\
         Site : {scope}\n\
         Environnement : {env}\n\
         Date : {date}\n\n\
         Critiques : {critical}\n\
         Hautes : {high}\n\
         Moyennes : {medium}\n\
         Basses : {low}\n\
         Total : {total}\n",
        message = event.message,
        scope = event.scope(),
        env = event.environment,
        date = event.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        critical = tally.critical,
        high = tally.high,
        medium = tally.medium,
        low = tally.low,
        total = tally.total,
    )
}
