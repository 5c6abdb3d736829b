//! Notification decision and dispatch

use std::fmt;
use std::process::ExitCode;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Environment;
use crate::models::{NotificationEvent, Severity, SeverityTally};

use super::notifier::{NotificationError, Notifier};

/// How a run ended, as seen by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No high or critical alert
    Clean,
    /// High alerts present, no critical
    HighSeverity,
    /// At least one critical alert
    Critical,
    /// The alert listing could not be fetched
    FetchFailed,
}

impl Outcome {
    /// Process exit status
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Clean => 0,
            Outcome::HighSeverity | Outcome::FetchFailed => 1,
            Outcome::Critical => 2,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.exit_code())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Clean => "aucune alerte haute ou critique",
            Outcome::HighSeverity => "alertes haute priorité",
            Outcome::Critical => "alertes critiques",
            Outcome::FetchFailed => "échec de récupération",
        };
        f.write_str(label)
    }
}

/// What the dispatcher decided for one tally
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Outcome of the run
    pub outcome: Outcome,
    /// Notification to deliver, if any
    pub event: Option<NotificationEvent>,
}

/// Turns a tally into at most one notification and an outcome
pub struct Dispatcher<N> {
    notifier: N,
    environment: Environment,
}

impl<N: Notifier> Dispatcher<N> {
    /// Create a dispatcher delivering through `notifier`
    pub fn new(notifier: N, environment: Environment) -> Self {
        Self {
            notifier,
            environment,
        }
    }

    /// The injected notifier
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Decide without side effects. Critical strictly preempts high.
    pub fn decide(&self, tally: &SeverityTally, site_id: Option<&str>) -> Decision {
        let Some(severity) = [Severity::Critical, Severity::High]
            .into_iter()
            .find(|s| tally.count(*s) > 0)
        else {
            return Decision {
                outcome: Outcome::Clean,
                event: None,
            };
        };

        let count = tally.count(severity);
        let (outcome, message) = if severity == Severity::Critical {
            (
                Outcome::Critical,
                format!("{count} alerte(s) critique(s) nécessitent une intervention immédiate"),
            )
        } else {
            (
                Outcome::HighSeverity,
                format!("{count} alerte(s) haute priorité nécessitent une attention rapide"),
            )
        };

        Decision {
            outcome,
            event: Some(NotificationEvent {
                severity,
                message,
                site_id: site_id.map(String::from),
                count,
                tally: *tally,
                environment: self.environment,
                created_at: Utc::now(),
            }),
        }
    }

    /// Decide and deliver. Delivery failures are logged and never change
    /// the outcome.
    pub async fn dispatch(&self, tally: &SeverityTally, site_id: Option<&str>) -> Decision {
        let decision = self.decide(tally, site_id);

        match &decision.event {
            Some(event) => {
                warn!(
                    severity = %event.severity,
                    count = event.count,
                    site_id = ?event.site_id,
                    "{}",
                    event.message
                );

                match self.notifier.send(event).await {
                    Ok(()) => {}
                    // Each failed channel was already reported by the sender
                    Err(e @ NotificationError::Partial { .. }) => {
                        debug!(error = %e, "Notification not delivered on every channel");
                    }
                    Err(e) => {
                        warn!(channel = self.notifier.channel(), error = %e, "Notification not delivered");
                    }
                }
            }
            None => info!(total = tally.total, "No high or critical alert"),
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::notifier::NotificationSender;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<NotificationEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn channel(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
            self.sent.lock().unwrap().push(event.clone());
            if self.fail {
                return Err(NotificationError::Http("unreachable".to_string()));
            }
            Ok(())
        }
    }

    fn tally(critical: usize, high: usize, medium: usize) -> SeverityTally {
        SeverityTally {
            total: critical + high + medium,
            critical,
            high,
            medium,
            ..SeverityTally::default()
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Outcome::Clean.exit_code(), 0);
        assert_eq!(Outcome::HighSeverity.exit_code(), 1);
        assert_eq!(Outcome::FetchFailed.exit_code(), 1);
        assert_eq!(Outcome::Critical.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_critical_preempts_high() {
        let dispatcher = Dispatcher::new(RecordingNotifier::default(), Environment::Production);

        let decision = dispatcher.dispatch(&tally(1, 2, 0), Some("VS-PDD-001")).await;

        assert_eq!(decision.outcome, Outcome::Critical);
        let sent = dispatcher.notifier().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].severity, Severity::Critical);
        assert_eq!(
            sent[0].message,
            "1 alerte(s) critique(s) nécessitent une intervention immédiate"
        );
        assert_eq!(sent[0].site_id.as_deref(), Some("VS-PDD-001"));
    }

    #[tokio::test]
    async fn test_high_only() {
        let dispatcher = Dispatcher::new(RecordingNotifier::default(), Environment::Staging);

        let decision = dispatcher.dispatch(&tally(0, 3, 5), None).await;

        assert_eq!(decision.outcome, Outcome::HighSeverity);
        let sent = dispatcher.notifier().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].severity, Severity::High);
        assert_eq!(sent[0].count, 3);
        assert!(sent[0].message.starts_with("3 alerte(s) haute priorité"));
        assert_eq!(sent[0].environment, Environment::Staging);
    }

    #[tokio::test]
    async fn test_clean_sends_nothing() {
        let dispatcher = Dispatcher::new(RecordingNotifier::default(), Environment::Production);

        let decision = dispatcher.dispatch(&tally(0, 0, 4), None).await;

        assert_eq!(decision.outcome, Outcome::Clean);
        assert!(decision.event.is_none());
        assert!(dispatcher.notifier().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_outcome() {
        let notifier = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        let dispatcher = Dispatcher::new(notifier, Environment::Production);

        let decision = dispatcher.dispatch(&tally(2, 0, 0), None).await;

        assert_eq!(decision.outcome, Outcome::Critical);
        assert_eq!(dispatcher.notifier().sent.lock().unwrap().len(), 1);
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_channel_is_warned_once() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let failing = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };
        let sender = NotificationSender::new().with_channel(failing);
        let dispatcher = Dispatcher::new(sender, Environment::Production);

        let decision = dispatcher.dispatch(&tally(1, 0, 0), None).await;
        assert_eq!(decision.outcome, Outcome::Critical);

        let logs = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let delivery_warnings = logs
            .lines()
            .filter(|line| line.contains("WARN") && line.contains("Notification"))
            .count();
        assert_eq!(delivery_warnings, 1, "{logs}");
    }

    proptest! {
        #[test]
        fn prop_decision_follows_priority(critical in 0usize..50, high in 0usize..50, medium in 0usize..50) {
            let dispatcher = Dispatcher::new(RecordingNotifier::default(), Environment::Production);
            let decision = dispatcher.decide(&tally(critical, high, medium), None);

            if critical > 0 {
                prop_assert_eq!(decision.outcome, Outcome::Critical);
                prop_assert_eq!(decision.event.map(|e| e.severity), Some(Severity::Critical));
            } else if high > 0 {
                prop_assert_eq!(decision.outcome, Outcome::HighSeverity);
                prop_assert_eq!(decision.event.map(|e| e.severity), Some(Severity::High));
            } else {
                prop_assert_eq!(decision.outcome.exit_code(), 0);
                prop_assert!(decision.event.is_none());
            }
        }
    }
}
