//! Per-severity alert counts

use serde::{Deserialize, Serialize};

use super::alert::Severity;

/// Counts of a fetched alert snapshot, by severity
///
/// `total` always equals the sum of the buckets, `unrecognized` included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityTally {
    /// Number of alerts in the snapshot
    pub total: usize,
    /// Critical alerts
    pub critical: usize,
    /// High severity alerts
    pub high: usize,
    /// Medium severity alerts
    pub medium: usize,
    /// Low severity alerts
    pub low: usize,
    /// Alerts whose severity was missing or not recognized
    pub unrecognized: usize,
}

impl SeverityTally {
    /// Count one alert of the given severity
    pub fn record(&mut self, severity: Severity) {
        self.total += 1;
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
            Severity::Unknown => self.unrecognized += 1,
        }
    }

    /// Count for a single bucket
    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Unknown => self.unrecognized,
        }
    }
}
