//! Data models for SolarSync alerts

mod alert;
mod notification;
mod site;
mod tally;

pub use alert::*;
pub use notification::*;
pub use site::*;
pub use tally::*;
