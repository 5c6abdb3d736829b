//! SolarSync API client for the alert listing

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::Alert;

const ALERTS_PATH: &str = "/v2/alerts";
const CLIENT_ID: &str = "solarsync-internal-monitor";

/// Body of `GET /v2/alerts`: either a bare array or the gateway envelope.
/// Elements are kept raw and converted one by one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AlertsResponse {
    List(Vec<Value>),
    Envelope { alerts: Vec<Value> },
}

impl From<AlertsResponse> for Vec<Alert> {
    fn from(response: AlertsResponse) -> Self {
        let (AlertsResponse::List(items) | AlertsResponse::Envelope { alerts: items }) = response;
        items
            .into_iter()
            .map(|item| {
                if !item.is_object() {
                    warn!(element = %item, "Alert listing element is not an object");
                }
                Alert::from_value(item)
            })
            .collect()
    }
}

/// Fetches the current alert snapshot
pub struct AlertFetcher {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlertFetcher {
    /// Create a new fetcher
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("solarsync-alerts/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Fetch all alerts, optionally restricted to one site.
    ///
    /// One request, no retry. Anything but HTTP 200 is a transport error.
    pub async fn fetch(&self, site_id: Option<&str>) -> Result<Vec<Alert>> {
        let url = format!("{}{}", self.base_url, ALERTS_PATH);

        let mut request = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("X-Client-ID", CLIENT_ID);

        if let Some(site_id) = site_id {
            request = request.query(&[("site_id", site_id)]);
        }

        debug!(url = %url, site_id = ?site_id, "Fetching alerts");

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(Error::transport(status.as_u16(), &body));
        }

        let alerts: Vec<Alert> = parse_alerts(&body)?;
        info!(count = alerts.len(), site_id = ?site_id, "Alerts fetched");

        Ok(alerts)
    }
}

/// Parse an alert listing body
pub fn parse_alerts(body: &str) -> Result<Vec<Alert>> {
    serde_json::from_str::<AlertsResponse>(body)
        .map(Into::into)
        .map_err(|e| Error::parse(format!("invalid alert listing: {e}")))
}
