//! Severity classification of an alert snapshot

use tracing::debug;

use crate::models::{Alert, SeverityTally};

/// Tally a snapshot by severity.
///
/// Single pass. Unrecognized severities only count toward `total` and
/// `unrecognized`.
pub fn classify(alerts: &[Alert]) -> SeverityTally {
    let tally = alerts.iter().fold(SeverityTally::default(), |mut tally, alert| {
        tally.record(alert.severity);
        tally
    });

    debug!(
        total = tally.total,
        critical = tally.critical,
        high = tally.high,
        medium = tally.medium,
        low = tally.low,
        unrecognized = tally.unrecognized,
        "Alerts classified"
    );

    tally
}
