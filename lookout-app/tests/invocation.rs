mod common;

use chrono::Utc;
use lookout_app::runner::{Mode, Runner, NO_UPDATES_PLACEHOLDER};
use lookout_common::LookoutError;
use lookout_config::{Config, ConfigLoader};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn config(webhook: &MockServer, handles: &str, debug: bool) -> Config {
    let vars: Vec<(&str, String)> = vec![
        ("GROK_API_KEY", "xai-test".to_string()),
        ("DISCORD_WEBHOOK_URL", webhook.uri()),
        ("X_HANDLES", handles.to_string()),
        ("HTTP_TIMEOUT", "5".to_string()),
        ("DEBUG", if debug { "1" } else { "0" }.to_string()),
    ];
    ConfigLoader::with_vars(vars).load().unwrap()
}

fn envelope_body(inner: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "cmpl-1",
        "model": "grok-4-latest",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": inner.to_string()},
            "finish_reason": "stop"
        }]
    })
}

fn content_of(req: &Request) -> String {
    let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
    body["content"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn run_filters_to_window_and_debug_precedes_summary() {
    common::init_test_tracing();
    let search = MockServer::start().await;
    let webhook = MockServer::start().await;

    let recent = (Utc::now() - chrono::Duration::hours(2))
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string();
    let inner = json!({"items": [
        {"account": "alice", "title": "fresh post", "url": "https://x.com/alice/1",
         "posted_at_utc": recent},
        {"account": "bob", "title": "stale post", "url": "https://x.com/bob/9",
         "posted_at_utc": "2020-01-01T00:00:00Z"}
    ]});

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope_body(inner)))
        .expect(1)
        .mount(&search)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&webhook)
        .await;

    let cfg = config(&webhook, "alice,bob", true);
    let runner = Runner::with_search_base(&cfg, &search.uri()).unwrap();
    let report = runner.execute(Mode::Run).await.unwrap();
    assert!(report.ok);
    assert!(report.error.is_none());

    let requests = webhook.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let debug_msg = content_of(&requests[0]);
    assert!(debug_msg.starts_with("Grok raw response"), "{debug_msg}");

    let summary = content_of(&requests[1]);
    assert!(summary.contains("alice、fresh post、"), "{summary}");
    assert!(!summary.contains("stale post"), "{summary}");
}

#[tokio::test]
async fn empty_digest_posts_placeholder() {
    let search = MockServer::start().await;
    let webhook = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope_body(json!({"items": []}))),
        )
        .mount(&search)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&webhook)
        .await;

    let cfg = config(&webhook, "alice", false);
    let runner = Runner::with_search_base(&cfg, &search.uri()).unwrap();
    let report = runner.execute(Mode::Run).await.unwrap();
    assert!(report.ok);

    let requests = webhook.received_requests().await.unwrap();
    assert_eq!(content_of(&requests[0]), NO_UPDATES_PLACEHOLDER);
}

/// Malformed inner content must degrade to the placeholder, never crash.
#[tokio::test]
async fn malformed_model_content_degrades_to_placeholder() {
    let search = MockServer::start().await;
    let webhook = MockServer::start().await;

    let body = json!({"choices": [{
        "message": {"role": "assistant", "content": "{not json"}
    }]});
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&search)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&webhook)
        .await;

    let cfg = config(&webhook, "alice", false);
    let runner = Runner::with_search_base(&cfg, &search.uri()).unwrap();
    let report = runner.execute(Mode::Run).await.unwrap();
    assert!(report.ok);

    let requests = webhook.received_requests().await.unwrap();
    assert_eq!(content_of(&requests[0]), NO_UPDATES_PLACEHOLDER);
}

/// Search failing on both tiers is a handled outcome: the combined error is
/// posted to the webhook and the report says ok=false instead of crashing.
#[tokio::test]
async fn search_failure_is_reported_not_propagated() {
    let search = MockServer::start().await;
    let webhook = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"error": {"message": "backend down"}})),
        )
        .expect(2)
        .mount(&search)
        .await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&webhook)
        .await;

    let cfg = config(&webhook, "alice", false);
    let runner = Runner::with_search_base(&cfg, &search.uri()).unwrap();
    let report = runner.execute(Mode::Run).await.unwrap();
    assert!(!report.ok);
    let error = report.error.unwrap();
    assert!(error.contains("backend down"), "{error}");

    let requests = webhook.received_requests().await.unwrap();
    let warning = content_of(&requests[0]);
    assert!(warning.contains("search failed"), "{warning}");
    assert!(warning.contains("backend down"), "{warning}");
    search.verify().await;
}

#[tokio::test]
async fn probe_lists_models_and_touches_nothing_else() {
    let search = MockServer::start().await;
    let webhook = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "grok-4-latest"}, {"id": "grok-3"}]
        })))
        .expect(1)
        .mount(&search)
        .await;

    let cfg = config(&webhook, "alice", false);
    let runner = Runner::with_search_base(&cfg, &search.uri()).unwrap();
    let report = runner.execute(Mode::Probe).await.unwrap();
    assert!(report.ok);
    assert_eq!(report.models_count, Some(2));

    assert!(webhook.received_requests().await.unwrap().is_empty());
    let search_requests = search.received_requests().await.unwrap();
    assert_eq!(search_requests.len(), 1);
    assert_eq!(search_requests[0].method.to_string(), "GET");
}

#[tokio::test]
async fn empty_handles_fail_before_any_network_call() {
    let search = MockServer::start().await;
    let webhook = MockServer::start().await;

    let cfg = config(&webhook, "", false);
    let runner = Runner::with_search_base(&cfg, &search.uri()).unwrap();
    let err = runner.execute(Mode::Run).await.unwrap_err();
    assert!(matches!(err, LookoutError::Config(_)), "{err:?}");

    assert!(search.received_requests().await.unwrap().is_empty());
    assert!(webhook.received_requests().await.unwrap().is_empty());
}
