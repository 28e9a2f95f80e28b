//! End-to-end tests for the relay: a real server on an ephemeral port,
//! a real HTTP client, and a wiremock stand-in for the Conversions API.
//!
//! Run with: `cargo test --test relay_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use capi_relay::{AppState, CapiClient, Config, build_router};

/// Test fixture: the app server wired to a mock upstream.
struct TestApp {
    base_url: String,
    client: reqwest::Client,
    upstream: MockServer,
}

impl TestApp {
    /// Spawn the app with credentials configured and the Graph API pointed
    /// at a fresh mock server. `configure` can override anything else.
    async fn spawn(configure: impl FnOnce(&mut Config)) -> Self {
        let upstream = MockServer::start().await;

        let mut config = Config {
            pixel_id: Some("1234567890".to_string()),
            access_token: Some("test-token".to_string()),
            graph_api_base_url: upstream.uri(),
            metrics_port: 0,
            ..Config::default()
        };
        configure(&mut config);

        let capi = CapiClient::new(&config).unwrap();
        let state = AppState::new(capi, config);
        let app = build_router(state).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            upstream,
        }
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.base_url)
    }

    /// Mount a 200 upstream response on the expected ingestion path.
    async fn mock_upstream_accepts(&self) {
        Mock::given(method("POST"))
            .and(path("/v19.0/1234567890/events"))
            .and(query_param("access_token", "test-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"events_received": 1})),
            )
            .mount(&self.upstream)
            .await;
    }

    /// The single event the upstream received in its `n`-th request.
    async fn relayed_event(&self, n: usize) -> Value {
        let requests: Vec<Request> = self.upstream.received_requests().await.unwrap();
        let body: Value = requests.get(n).unwrap().body_json().unwrap();
        body["data"].as_array().unwrap().first().unwrap().clone()
    }
}

// =============================================================================
// Guard Tests
// =============================================================================

#[tokio::test]
async fn non_post_methods_are_rejected_with_405() {
    let app = TestApp::spawn(|_| {}).await;

    let get = app.client.get(app.events_url()).send().await.unwrap();
    assert_eq!(get.status(), 405);
    assert_eq!(get.text().await.unwrap(), "Method Not Allowed");

    let delete = app.client.delete(app.events_url()).send().await.unwrap();
    assert_eq!(delete.status(), 405);
}

#[tokio::test]
async fn missing_config_is_500_naming_the_variables() {
    let app = TestApp::spawn(|config| {
        config.pixel_id = None;
        config.access_token = None;
    })
    .await;

    // Regardless of body validity
    for body in ["{}", "{not json", ""] {
        let response = app
            .client
            .post(app.events_url())
            .body(body.to_string())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        let text = response.text().await.unwrap();
        assert!(text.contains("META_PIXEL_ID"));
        assert!(text.contains("META_CAPI_ACCESS_TOKEN"));
    }

    // No outbound call was attempted
    assert!(app.upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_config_names_only_the_absent_variable() {
    let app = TestApp::spawn(|config| {
        config.access_token = None;
    })
    .await;

    let response = app
        .client
        .post(app.events_url())
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let text = response.text().await.unwrap();
    assert!(text.contains("META_CAPI_ACCESS_TOKEN"));
    assert!(!text.contains("META_PIXEL_ID"));
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = TestApp::spawn(|_| {}).await;
    app.mock_upstream_accepts().await;

    for body in ["{not json", "[1, 2]", "\"PageView\""] {
        let response = app
            .client
            .post(app.events_url())
            .body(body.to_string())
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        assert_eq!(response.text().await.unwrap(), "Invalid JSON");
    }
}

#[tokio::test]
async fn empty_body_is_a_default_page_view() {
    let app = TestApp::spawn(|_| {}).await;
    app.mock_upstream_accepts().await;

    let response = app.client.post(app.events_url()).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert!(!body["event_id"].as_str().unwrap().is_empty());

    let event = app.relayed_event(0).await;
    assert_eq!(event["event_name"], "PageView");
    assert_eq!(event["action_source"], "website");
    assert!(event["event_time"].as_i64().unwrap() > 0);
}

// =============================================================================
// Signal Derivation Tests
// =============================================================================

#[tokio::test]
async fn cdn_header_wins_ip_resolution() {
    let app = TestApp::spawn(|_| {}).await;
    app.mock_upstream_accepts().await;

    let response = app
        .client
        .post(app.events_url())
        .header("cf-connecting-ip", "1.1.1.1")
        .header("x-forwarded-for", "2.2.2.2, 3.3.3.3")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let event = app.relayed_event(0).await;
    assert_eq!(event["user_data"]["client_ip_address"], "1.1.1.1");
}

#[tokio::test]
async fn forwarded_for_resolves_to_first_entry() {
    let app = TestApp::spawn(|_| {}).await;
    app.mock_upstream_accepts().await;

    app.client
        .post(app.events_url())
        .header("x-forwarded-for", "2.2.2.2, 3.3.3.3")
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    let event = app.relayed_event(0).await;
    assert_eq!(event["user_data"]["client_ip_address"], "2.2.2.2");
}

#[tokio::test]
async fn pixel_cookies_are_parsed_and_decoded() {
    let app = TestApp::spawn(|_| {}).await;
    app.mock_upstream_accepts().await;

    app.client
        .post(app.events_url())
        .header("cookie", "_fbp=abc.1.2; _fbc=xyz%3D1")
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    let event = app.relayed_event(0).await;
    assert_eq!(event["user_data"]["fbp"], "abc.1.2");
    assert_eq!(event["user_data"]["fbc"], "xyz=1");
}

#[tokio::test]
async fn referer_header_fills_missing_source_url() {
    let app = TestApp::spawn(|_| {}).await;
    app.mock_upstream_accepts().await;

    app.client
        .post(app.events_url())
        .header("referer", "https://shop.example/landing")
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    let event = app.relayed_event(0).await;
    assert_eq!(event["event_source_url"], "https://shop.example/landing");
}

#[tokio::test]
async fn user_data_is_empty_object_when_nothing_resolves() {
    let app = TestApp::spawn(|_| {}).await;
    app.mock_upstream_accepts().await;

    // No UA (reqwest sends none by default), no cookies, no overrides,
    // no proxy headers
    app.client
        .post(app.events_url())
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    let event = app.relayed_event(0).await;
    assert_eq!(event["user_data"], json!({}));
    assert!(event.get("event_source_url").is_none());
}

#[tokio::test]
async fn explicit_event_id_is_stable_generated_ids_are_unique() {
    let app = TestApp::spawn(|_| {}).await;
    app.mock_upstream_accepts().await;

    for _ in 0..2 {
        app.client
            .post(app.events_url())
            .json(&json!({"event_id": "abc123"}))
            .send()
            .await
            .unwrap();
    }
    for _ in 0..2 {
        app.client
            .post(app.events_url())
            .json(&json!({}))
            .send()
            .await
            .unwrap();
    }

    let first = app.relayed_event(0).await;
    let second = app.relayed_event(1).await;
    assert_eq!(first["event_id"], "abc123");
    assert_eq!(second["event_id"], "abc123");

    let third = app.relayed_event(2).await;
    let fourth = app.relayed_event(3).await;
    assert_ne!(third["event_id"], fourth["event_id"]);
}

// =============================================================================
// Upstream Mapping Tests
// =============================================================================

#[tokio::test]
async fn upstream_success_maps_to_200_with_meta() {
    let app = TestApp::spawn(|_| {}).await;
    app.mock_upstream_accepts().await;

    let response = app
        .client
        .post(app.events_url())
        .header("user-agent", "TestAgent/1.0")
        .json(&json!({"event_name": "Purchase", "event_id": "abc123"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["meta"], json!({"events_received": 1}));
    assert_eq!(body["event_id"], "abc123");

    let event = app.relayed_event(0).await;
    assert_eq!(event["event_name"], "Purchase");
    assert_eq!(event["user_data"]["client_user_agent"], "TestAgent/1.0");
}

#[tokio::test]
async fn upstream_rejection_maps_to_500_with_meta() {
    let app = TestApp::spawn(|_| {}).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad token"})))
        .mount(&app.upstream)
        .await;

    let response = app
        .client
        .post(app.events_url())
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["meta"], json!({"error": "bad token"}));
    assert!(!body["event_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn transport_failure_maps_to_500_with_error_string() {
    let app = TestApp::spawn(|config| {
        // Nothing is listening here
        config.graph_api_base_url = "http://127.0.0.1:9".to_string();
    })
    .await;

    let response = app
        .client
        .post(app.events_url())
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert!(!body["error"].as_str().unwrap().is_empty());
    // No completed exchange, so no upstream meta and no event id
    assert!(body.get("meta").is_none());
    assert!(body.get("event_id").is_none());
}

// =============================================================================
// Ambient Endpoint Tests
// =============================================================================

#[tokio::test]
async fn health_reports_configuration_state() {
    let app = TestApp::spawn(|_| {}).await;

    let response = app
        .client
        .get(format!("{}/health", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["upstream_configured"], true);
}

#[tokio::test]
async fn readiness_is_503_without_credentials() {
    let app = TestApp::spawn(|config| {
        config.pixel_id = None;
        config.access_token = None;
    })
    .await;

    let ready = app
        .client
        .get(format!("{}/ready", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status(), 503);

    let health = app
        .client
        .get(format!("{}/health", app.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), 200);
    let body: Value = health.json().await.unwrap();
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn rate_limit_answers_429_when_exhausted() {
    let app = TestApp::spawn(|config| {
        config.rate_limit_rps = 1;
        config.rate_limit_burst = 1;
    })
    .await;
    app.mock_upstream_accepts().await;

    let first = app
        .client
        .post(app.events_url())
        .header("x-real-ip", "9.9.9.9")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let second = app
        .client
        .post(app.events_url())
        .header("x-real-ip", "9.9.9.9")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 429);
    assert!(second.headers().contains_key("retry-after"));
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = TestApp::spawn(|_| {}).await;
    app.mock_upstream_accepts().await;

    let response = app
        .client
        .post(app.events_url())
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
