use serde_json::json;
use velox_agents::{CompletionProvider, ImageProvider, OpenAiProvider, WorkersAiProvider};
use velox_common::{Error, Turn};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn completion_posts_system_prompt_then_history() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "llama-test",
            "temperature": 0.6,
            "max_tokens": 1024,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "model": "llama-test",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hi!"},
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(
        "test-key",
        Some("llama-test".to_string()),
        Some(format!("{}/openai/v1", server.uri())),
    );

    let reply = provider
        .complete(&[Turn::user("hello")], "be brief")
        .await
        .expect("completion should succeed");

    assert_eq!(reply, "Hi!");
}

#[tokio::test]
async fn completion_surfaces_provider_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("k", None, Some(server.uri()));
    let err = provider
        .complete(&[Turn::user("hello")], "s")
        .await
        .expect_err("429 should fail");

    match err {
        Error::Upstream { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "rate limited");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn image_returns_raw_bytes() {
    let server = MockServer::start().await;
    let png: &[u8] = b"\x89PNG\r\n\x1a\nfake";

    Mock::given(method("POST"))
        .and(path("/accounts/acct/ai/run/@cf/test/sdxl"))
        .and(header("authorization", "Bearer cf-token"))
        .and(body_partial_json(json!({"prompt": "a red fox", "num_steps": 20})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png.to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = WorkersAiProvider::new("acct", "cf-token")
        .with_base_url(server.uri())
        .with_model("@cf/test/sdxl");

    let bytes = provider.generate("a red fox").await.expect("image should render");
    assert_eq!(bytes.as_ref(), png);
}

#[tokio::test]
async fn image_failure_carries_response_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("{\"errors\":[\"bad prompt\"]}"))
        .mount(&server)
        .await;

    let provider = WorkersAiProvider::new("acct", "t").with_base_url(server.uri());
    let err = provider.generate("x").await.expect_err("400 should fail");

    assert!(matches!(err, Error::Upstream { status: 400, ref body } if body.contains("bad prompt")));
}
