use lookout_notify::{DiscordWebhook, NotifyError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn hook(server: &MockServer) -> DiscordWebhook {
    DiscordWebhook::new(&server.uri()).unwrap()
}

fn content_of(req: &Request) -> String {
    let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
    body["content"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn notify_posts_content_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"content": "alice、hi、2025-11-03 13:15、u"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    hook(&server)
        .notify("alice、hi、2025-11-03 13:15、u")
        .await
        .unwrap();
    server.verify().await;
}

#[tokio::test]
async fn rejected_message_surfaces_status_and_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid Form Body"})),
        )
        .mount(&server)
        .await;

    let err = hook(&server).notify("x").await.unwrap_err();
    match err {
        NotifyError::Rejected { status, message } => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "Invalid Form Body");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn chunked_delivery_labels_parts_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let text = "a".repeat(1900) + &"b".repeat(1900);
    hook(&server).notify_chunked("Raw response", &text).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let first = content_of(&requests[0]);
    let second = content_of(&requests[1]);
    assert!(first.starts_with("Raw response (part 1/2)\n"), "{first}");
    assert!(second.starts_with("Raw response (part 2/2)\n"), "{second}");

    let body_1 = first.split_once('\n').unwrap().1.to_string();
    let body_2 = second.split_once('\n').unwrap().1.to_string();
    assert_eq!(body_1 + &body_2, text);
}

#[tokio::test]
async fn single_chunk_keeps_bare_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    hook(&server).notify_chunked("Raw response", "short").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(content_of(&requests[0]), "Raw response\nshort");
}

#[tokio::test]
async fn notify_json_posts_a_fenced_block() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    hook(&server)
        .notify_json("Grok raw response", &json!({"choices": []}))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let content = content_of(&requests[0]);
    assert!(content.starts_with("Grok raw response\n```json\n"), "{content}");
    assert!(content.ends_with("\n```"), "{content}");
}
