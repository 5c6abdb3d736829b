//! Alerting pipeline for SolarSync
//!
//! Fetches the alert snapshot, tallies it by severity and dispatches at most
//! one notification per run.

mod classifier;
mod dispatcher;
mod fetcher;
mod monitor;
mod notifier;

pub use classifier::classify;
pub use dispatcher::{Decision, Dispatcher, Outcome};
pub use fetcher::{parse_alerts, AlertFetcher};
pub use monitor::{outcome_of, run_once, AlertMonitor};
pub use notifier::{
    build_slack_payload, email_body, email_subject, EmailNotifier, NotificationError,
    NotificationResult, NotificationSender, Notifier, SlackAttachment, SlackField, SlackNotifier,
    SlackPayload,
};
