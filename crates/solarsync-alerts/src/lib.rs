//! # SolarSync alerts
//!
//! Polls the SolarSync monitoring API for alerts and forwards a summary to
//! Slack and email.
//!
//! ## Architecture
//!
//! - **Fetcher**: one authenticated `GET /v2/alerts`, optionally per site
//! - **Classifier**: per-severity tally of the snapshot
//! - **Dispatcher**: at most one notification per run, critical before high
//! - **Notifiers**: Slack webhook and SMTP email behind the [`alerting::Notifier`] trait
//!
//! ## Quick Start
//!
//! ```bash
//! export SOLARSYNC_API_KEY=...
//! solarsync-alerts --env production --site VS-PDD-001
//! echo $?   # 0 clean, 1 high or failure, 2 critical
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerting;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::{AlertFetcher, AlertMonitor, Dispatcher, Notifier, Outcome};
    pub use crate::config::{Config, Environment};
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::report::RunReport;
}
