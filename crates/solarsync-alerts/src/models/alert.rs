//! Alert data models

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Alert severity level
///
/// Ordered so that `Critical` is the maximum. Values the API sends that we
/// do not recognize land in `Unknown`, which sorts below everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Value")]
pub enum Severity {
    /// Unrecognized or missing severity
    #[default]
    Unknown,
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
    /// Critical
    Critical,
}

impl Severity {
    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Parse a wire value, case-insensitively
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            _ => Severity::Unknown,
        }
    }
}

impl From<Value> for Severity {
    fn from(value: Value) -> Self {
        value.as_str().map_or(Severity::Unknown, Severity::parse)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an alert on the SolarSync side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Value")]
pub enum AlertStatus {
    /// Alert is currently active
    Active,
    /// Alert has been acknowledged
    Acknowledged,
    /// Alert has been resolved
    Resolved,
    /// Unrecognized or missing status
    #[default]
    Unknown,
}

impl From<Value> for AlertStatus {
    fn from(value: Value) -> Self {
        match value.as_str().map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("active") => AlertStatus::Active,
            Some("acknowledged") => AlertStatus::Acknowledged,
            Some("resolved") => AlertStatus::Resolved,
            _ => AlertStatus::Unknown,
        }
    }
}

/// An alert as returned by `GET /v2/alerts`
///
/// Every field is optional on the wire and a value of the wrong type is
/// dropped rather than rejected, so one odd record never hides the others.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Identifier (the API sends either a string or a number)
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,

    /// Site the alert belongs to (e.g. `VS-PDD-001`)
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub site_id: Option<String>,

    /// Alert kind (e.g. `inverter_fault`)
    #[serde(
        default,
        rename = "type",
        deserialize_with = "deserialize_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub alert_type: Option<String>,

    /// Severity level
    #[serde(default)]
    pub severity: Severity,

    /// Current status
    #[serde(default)]
    pub status: AlertStatus,

    /// Human-readable message
    #[serde(default, deserialize_with = "deserialize_message")]
    pub message: String,

    /// When the alert was raised
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn deserialize_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn deserialize_message<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl Alert {
    /// Build an alert from one element of the listing.
    ///
    /// Elements that are not objects still become an alert, of unknown
    /// severity, so that they are counted.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

/// Parse the timestamp layouts the API has been seen to emit.
/// Naive layouts are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%d %H:%M:%S"];
    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .map(|naive| naive.and_utc())
    })
}
