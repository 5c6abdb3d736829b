//! Notification event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alert::Severity;
use super::tally::SeverityTally;
use crate::config::Environment;

/// The single notification a run may emit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Severity that triggered the notification (critical or high)
    pub severity: Severity,

    /// Operator-facing message
    pub message: String,

    /// Site scope of the run, `None` for all sites
    pub site_id: Option<String>,

    /// Number of alerts at `severity`
    pub count: usize,

    /// Full tally of the snapshot
    pub tally: SeverityTally,

    /// Environment label
    pub environment: Environment,

    /// When the event was built
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    /// Site label for display
    pub fn scope(&self) -> &str {
        self.site_id.as_deref().unwrap_or("Tous les sites")
    }
}
