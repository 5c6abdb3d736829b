//! One monitoring run: fetch, classify, dispatch

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::{Config, Environment};
use crate::error::{Error, Result};
use crate::models::{normalize_site_id, Severity, SeverityTally};
use crate::report::RunReport;

use super::classifier::classify;
use super::dispatcher::{Dispatcher, Outcome};
use super::fetcher::AlertFetcher;
use super::notifier::{NotificationSender, Notifier};

/// Wires the fetcher, classifier and dispatcher together
pub struct AlertMonitor<N> {
    fetcher: AlertFetcher,
    dispatcher: Dispatcher<N>,
    environment: Environment,
}

impl AlertMonitor<NotificationSender> {
    /// Build a monitor with the channels described by the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        if !config.notifications.has_channels() {
            warn!("No notification channel configured, alerts will only be reported");
        }

        let sender = NotificationSender::from_config(&config.notifications)
            .map_err(|e| Error::config(e.to_string()))?;

        info!(
            channels = sender.len(),
            base_url = %config.api.base_url,
            environment = %config.environment,
            "Monitor initialized"
        );

        Ok(Self::new(
            AlertFetcher::new(&config.api)?,
            Dispatcher::new(sender, config.environment),
            config.environment,
        ))
    }
}

impl<N: Notifier> AlertMonitor<N> {
    /// Create a monitor from its parts
    pub fn new(fetcher: AlertFetcher, dispatcher: Dispatcher<N>, environment: Environment) -> Self {
        Self {
            fetcher,
            dispatcher,
            environment,
        }
    }

    /// Run once. A fetch failure aborts before classification.
    pub async fn run(&self, site_id: Option<&str>) -> Result<RunReport> {
        info!(site_id = ?site_id, environment = %self.environment, "Starting alert check");

        let alerts = self.fetcher.fetch(site_id).await.map_err(|e| {
            error!(error = %e, site_id = ?site_id, "Alert fetch failed");
            e
        })?;

        let tally: SeverityTally = classify(&alerts);
        let decision = self.dispatcher.dispatch(&tally, site_id).await;

        info!(
            outcome = ?decision.outcome,
            exit_code = decision.outcome.exit_code(),
            total = tally.total,
            "Alert check finished"
        );

        let flagged = alerts
            .into_iter()
            .filter(|a| a.severity >= Severity::High)
            .collect();

        Ok(RunReport {
            environment: self.environment,
            site_id: site_id.map(String::from),
            generated_at: Utc::now(),
            tally,
            outcome: decision.outcome,
            notification: decision.event,
            flagged,
        })
    }
}

/// One complete check as the CLI runs it: load the configuration through
/// `lookup`, normalize the site filter, then fetch, classify and dispatch.
///
/// Configuration is validated before any request is sent.
pub async fn run_once<F>(
    environment: Environment,
    site: Option<&str>,
    lookup: F,
) -> Result<RunReport>
where
    F: Fn(&str) -> Option<String>,
{
    let config = Config::from_lookup(environment, lookup)?;

    let site_id = site.map(normalize_site_id).filter(|s| !s.is_empty());

    let monitor = AlertMonitor::from_config(&config)?;
    monitor.run(site_id.as_deref()).await
}

/// Outcome of a finished or aborted run. Any error is a fetch failure.
pub fn outcome_of(result: &Result<RunReport>) -> Outcome {
    match result {
        Ok(report) => report.outcome,
        Err(_) => Outcome::FetchFailed,
    }
}
