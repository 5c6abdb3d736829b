//! End-to-end runs against a mocked SolarSync API and Slack webhook

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use solarsync_alerts::alerting::{
    outcome_of, run_once, AlertFetcher, AlertMonitor, Dispatcher, NotificationError, Notifier,
    Outcome,
};
use solarsync_alerts::config::{ApiConfig, Config, Environment};
use solarsync_alerts::models::{NotificationEvent, Severity, SeverityTally};
use solarsync_alerts::Error;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<NotificationEvent>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(event.clone());
        Ok(())
    }
}

async fn api_returning(status: u16, body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/alerts"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(&server)
        .await;
    server
}

fn monitor(server: &MockServer) -> (AlertMonitor<Arc<RecordingNotifier>>, Arc<RecordingNotifier>) {
    let api = ApiConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        timeout_secs: 5,
    };
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = AlertMonitor::new(
        AlertFetcher::new(&api).unwrap(),
        Dispatcher::new(notifier.clone(), Environment::Production),
        Environment::Production,
    );
    (monitor, notifier)
}

#[tokio::test]
async fn critical_alert_exits_2_with_one_notification() {
    let server = api_returning(
        200,
        json!([
            {"id": "1", "site_id": "VS-PDD-001", "severity": "critical", "message": "Onduleur hors ligne"},
            {"id": "2", "site_id": "VS-PDD-001", "severity": "high", "message": "Température panneau élevée"},
            {"id": "3", "site_id": "VS-PDD-001", "severity": "high", "message": "Baisse de production"}
        ]),
    )
    .await;
    let (monitor, notifier) = monitor(&server);

    let report = monitor.run(None).await.unwrap();

    assert_eq!(
        report.tally,
        SeverityTally {
            total: 3,
            critical: 1,
            high: 2,
            medium: 0,
            low: 0,
            unrecognized: 0,
        }
    );
    assert_eq!(report.outcome, Outcome::Critical);
    assert_eq!(report.exit_code(), 2);
    assert_eq!(report.flagged.len(), 3);

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].severity, Severity::Critical);
}

#[tokio::test]
async fn empty_snapshot_exits_0_without_notification() {
    let server = api_returning(200, json!([])).await;
    let (monitor, notifier) = monitor(&server);

    let report = monitor.run(None).await.unwrap();

    assert_eq!(report.tally, SeverityTally::default());
    assert_eq!(report.outcome, Outcome::Clean);
    assert_eq!(report.exit_code(), 0);
    assert!(report.notification.is_none());
    assert!(notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn server_error_aborts_before_classification() {
    let server = api_returning(500, json!({"error": "internal"})).await;
    let (monitor, notifier) = monitor(&server);

    let result = monitor.run(None).await;

    assert!(matches!(result, Err(Error::Transport { status: 500, .. })));
    assert_eq!(outcome_of(&result), Outcome::FetchFailed);
    assert_eq!(outcome_of(&result).exit_code(), 1);
    assert!(notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn refused_connection_is_http_error() {
    // Bind then release a port so nothing listens on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let api = ApiConfig {
        base_url: format!("http://127.0.0.1:{port}"),
        api_key: "test-key".to_string(),
        timeout_secs: 2,
    };
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = AlertMonitor::new(
        AlertFetcher::new(&api).unwrap(),
        Dispatcher::new(notifier.clone(), Environment::Production),
        Environment::Production,
    );

    let result = monitor.run(None).await;

    assert!(matches!(result, Err(Error::Http(_))));
    assert_eq!(outcome_of(&result).exit_code(), 1);
    assert!(notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_api_key_exits_1_without_any_request() {
    let server = api_returning(200, json!([{"id": "1", "severity": "critical"}])).await;

    let vars: HashMap<&str, String> = HashMap::from([("SOLARSYNC_BASE_URL", server.uri())]);
    let result = run_once(Environment::Production, None, |key| vars.get(key).cloned()).await;

    assert!(matches!(result, Err(Error::Config(_))));
    assert_eq!(outcome_of(&result), Outcome::FetchFailed);
    assert_eq!(outcome_of(&result).exit_code(), 1);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn run_once_normalizes_site_and_keeps_critical_next_to_bad_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/alerts"))
        .and(query_param("site_id", "VS-PDD-001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "severity": "critical", "message": null, "type": 5},
            null
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let vars: HashMap<&str, String> = HashMap::from([
        ("SOLARSYNC_API_KEY", "test-key".to_string()),
        ("SOLARSYNC_BASE_URL", server.uri()),
    ]);
    let result = run_once(Environment::Production, Some("pdd001"), |key| {
        vars.get(key).cloned()
    })
    .await;

    let report = result.as_ref().unwrap();
    assert_eq!(report.tally.total, 2);
    assert_eq!(report.tally.critical, 1);
    assert_eq!(report.tally.unrecognized, 1);
    assert_eq!(report.site_id.as_deref(), Some("VS-PDD-001"));
    assert_eq!(outcome_of(&result).exit_code(), 2);
}

#[tokio::test]
async fn site_scope_is_forwarded_to_api_and_event() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/alerts"))
        .and(query_param("site_id", "VS-LYO-007"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "alerts": [{"id": 9, "site_id": "VS-LYO-007", "severity": "HIGH"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let (monitor, notifier) = monitor(&server);

    let report = monitor.run(Some("VS-LYO-007")).await.unwrap();

    assert_eq!(report.outcome, Outcome::HighSeverity);
    assert_eq!(report.site_id.as_deref(), Some("VS-LYO-007"));
    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent[0].site_id.as_deref(), Some("VS-LYO-007"));
}

#[tokio::test]
async fn configured_slack_webhook_receives_summary() {
    let api = api_returning(
        200,
        json!([{"id": "1", "severity": "critical"}, {"id": "2", "severity": "medium"}]),
    )
    .await;

    let slack = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/T000/B000/XXXX"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&slack)
        .await;

    let vars: HashMap<&str, String> = HashMap::from([
        ("SOLARSYNC_API_KEY", "test-key".to_string()),
        ("SOLARSYNC_BASE_URL", api.uri()),
        (
            "SLACK_WEBHOOK_URL",
            format!("{}/services/T000/B000/XXXX", slack.uri()),
        ),
    ]);
    let config = Config::from_lookup(Environment::Staging, |key| vars.get(key).cloned()).unwrap();

    let report = AlertMonitor::from_config(&config)
        .unwrap()
        .run(None)
        .await
        .unwrap();
    assert_eq!(report.outcome, Outcome::Critical);

    let requests = slack.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["text"]
        .as_str()
        .unwrap()
        .contains("1 alerte(s) critique(s) nécessitent une intervention immédiate"));
    assert_eq!(body["attachments"][0]["color"], "#dc3545");
}

#[tokio::test]
async fn unreachable_webhook_does_not_change_outcome() {
    let api = api_returning(200, json!([{"id": "1", "severity": "high"}])).await;

    let slack = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&slack)
        .await;

    let vars: HashMap<&str, String> = HashMap::from([
        ("SOLARSYNC_API_KEY", "test-key".to_string()),
        ("SOLARSYNC_BASE_URL", api.uri()),
        ("SLACK_WEBHOOK_URL", slack.uri()),
    ]);
    let config = Config::from_lookup(Environment::Production, |key| vars.get(key).cloned()).unwrap();

    let report = AlertMonitor::from_config(&config)
        .unwrap()
        .run(None)
        .await
        .unwrap();

    assert_eq!(report.outcome, Outcome::HighSeverity);
    assert_eq!(report.exit_code(), 1);
}
