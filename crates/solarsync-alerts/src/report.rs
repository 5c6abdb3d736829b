//! Run summary printed on stdout

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alerting::Outcome;
use crate::config::Environment;
use crate::error::Result;
use crate::models::{Alert, NotificationEvent, SeverityTally};

const RULE: &str = "============================================================";

/// Summary of one monitoring run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Environment label
    pub environment: Environment,
    /// Site filter of the run, `None` for all sites
    pub site_id: Option<String>,
    /// When the report was built
    pub generated_at: DateTime<Utc>,
    /// Counts by severity
    pub tally: SeverityTally,
    /// How the run ended
    pub outcome: Outcome,
    /// Notification that was dispatched, if any
    pub notification: Option<NotificationEvent>,
    /// High and critical alerts of the snapshot, in API order
    pub flagged: Vec<Alert>,
}

impl RunReport {
    /// Exit status for this run
    pub fn exit_code(&self) -> u8 {
        self.outcome.exit_code()
    }

    /// Framed text report
    pub fn render_text(&self) -> String {
        self.to_string()
    }

    /// Pretty-printed JSON report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.tally;

        writeln!(f, "{RULE}")?;
        writeln!(
            f,
            "RAPPORT D'ALERTES SOLARSYNC - {}",
            self.environment.as_str().to_uppercase()
        )?;
        writeln!(
            f,
            "Périmètre: {}",
            self.site_id.as_deref().unwrap_or("Tous les sites")
        )?;
        writeln!(f, "Date: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "{RULE}")?;
        writeln!(f)?;
        writeln!(f, "ALERTES: {}", t.total)?;
        writeln!(f, "  • Critiques: {}", t.critical)?;
        writeln!(f, "  • Hautes:    {}", t.high)?;
        writeln!(f, "  • Moyennes:  {}", t.medium)?;
        writeln!(f, "  • Basses:    {}", t.low)?;
        if t.unrecognized > 0 {
            writeln!(f, "  • Inconnues: {}", t.unrecognized)?;
        }
        writeln!(f)?;

        if self.flagged.is_empty() {
            writeln!(f, "Aucune alerte haute ou critique")?;
        }
        for (i, alert) in self.flagged.iter().enumerate() {
            let message = if alert.message.is_empty() {
                "N/A"
            } else {
                alert.message.as_str()
            };
            writeln!(
                f,
                "  {}. [{}] {} - {}",
                i + 1,
                alert.severity.as_str().to_uppercase(),
                alert.site_id.as_deref().unwrap_or("N/A"),
                message
            )?;
        }
        writeln!(f)?;

        match &self.notification {
            Some(event) => writeln!(f, "NOTIFICATION: {}", event.message)?,
            None => writeln!(f, "NOTIFICATION: aucune")?,
        }
        writeln!(
            f,
            "RÉSULTAT: {} (code {})",
            self.outcome,
            self.outcome.exit_code()
        )?;
        writeln!(f, "{RULE}")
    }
}
