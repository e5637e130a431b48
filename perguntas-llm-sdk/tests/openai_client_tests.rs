use mockito::Matcher;
use perguntas_llm_sdk::client::{EmbeddingClient, LlmClient};
use perguntas_llm_sdk::error::LlmError;
use perguntas_llm_sdk::openai::OpenAIClient;
use perguntas_llm_sdk::types::{CompletionRequest, EmbeddingRequest, Message};

fn completion_request(prompt: &str) -> CompletionRequest {
    CompletionRequest {
        messages: vec![Message::user(prompt)],
        max_tokens: 128,
        model: "gpt-4o-mini".to_string(),
        system: None,
        temperature: Some(0.0),
        top_p: None,
        stop_sequences: None,
    }
}

#[tokio::test]
async fn test_complete_returns_first_choice() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "gpt-4o-mini",
            "temperature": 0.0,
            "messages": [{"role": "user", "content": "Pergunta"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "id": "chatcmpl-1",
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "SELECT 1 LIMIT 100"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
            }"#,
        )
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key")
        .unwrap()
        .with_base_url(server.url());
    let response = client.complete(completion_request("Pergunta")).await.unwrap();

    assert_eq!(response.text(), "SELECT 1 LIMIT 100");
    assert_eq!(response.usage.input_tokens, 12);
    assert_eq!(response.usage.output_tokens, 5);
    assert_eq!(response.stop_reason.as_deref(), Some("stop"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_complete_sends_system_prompt_first() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "messages": [
                {"role": "system", "content": "Responda em SQL"},
                {"role": "user", "content": "Pergunta"}
            ]
        })))
        .with_status(200)
        .with_body(
            r#"{"id":"c","model":"gpt-4o-mini","choices":[{"index":0,"message":{"role":"assistant","content":"ok"}}]}"#,
        )
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key")
        .unwrap()
        .with_base_url(server.url());
    let mut request = completion_request("Pergunta");
    request.system = Some("Responda em SQL".to_string());
    client.complete(request).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_complete_without_choices_is_internal_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(r#"{"id":"c","model":"gpt-4o-mini","choices":[]}"#)
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key")
        .unwrap()
        .with_base_url(server.url());
    let err = client.complete(completion_request("x")).await.unwrap_err();
    assert!(matches!(err, LlmError::Internal { .. }));
}

#[tokio::test]
async fn test_api_errors_are_mapped_by_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#)
        .create_async()
        .await;

    let client = OpenAIClient::new("bad-key")
        .unwrap()
        .with_base_url(server.url());
    let err = client.complete(completion_request("x")).await.unwrap_err();
    match err {
        LlmError::Authentication { message } => {
            assert_eq!(message, "Incorrect API key provided")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/embeddings")
        .with_status(429)
        .with_header("retry-after", "7")
        .with_body("slow down")
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key")
        .unwrap()
        .with_base_url(server.url());
    let err = client
        .embed(EmbeddingRequest::single("text-embedding-3-large", "vendas"))
        .await
        .unwrap_err();
    match err {
        LlmError::RateLimit {
            message,
            retry_after,
        } => {
            assert_eq!(message, "slow down");
            assert_eq!(retry_after, Some(7));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_embed_orders_vectors_by_index() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/embeddings")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "text-embedding-3-large",
            "input": ["vendas", "clientes"],
            "encoding_format": "float"
        })))
        .with_status(200)
        .with_body(
            r#"{
                "object": "list",
                "data": [
                    {"object": "embedding", "embedding": [0.0, 1.0], "index": 1},
                    {"object": "embedding", "embedding": [1.0, 0.0], "index": 0}
                ],
                "model": "text-embedding-3-large",
                "usage": {"prompt_tokens": 4, "total_tokens": 4}
            }"#,
        )
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key")
        .unwrap()
        .with_base_url(format!("{}/", server.url()));
    let response = client
        .embed(EmbeddingRequest {
            model: "text-embedding-3-large".to_string(),
            input: vec!["vendas".to_string(), "clientes".to_string()],
            dimensions: None,
        })
        .await
        .unwrap();

    assert_eq!(response.embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    assert_eq!(response.usage.input_tokens, 4);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_embed_rejects_count_mismatch() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/embeddings")
        .with_status(200)
        .with_body(
            r#"{"object":"list","data":[],"model":"text-embedding-3-large","usage":{"prompt_tokens":1,"total_tokens":1}}"#,
        )
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key")
        .unwrap()
        .with_base_url(server.url());
    let err = client
        .embed(EmbeddingRequest::single("text-embedding-3-large", "vendas"))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Internal { .. }));
}

#[tokio::test]
async fn test_embed_requires_input() {
    let client = OpenAIClient::new("test-key").unwrap();
    let err = client
        .embed(EmbeddingRequest {
            model: "text-embedding-3-large".to_string(),
            input: Vec::new(),
            dimensions: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::InvalidRequest { .. }));
}

#[tokio::test]
async fn test_message_builder_requires_a_message() {
    let client = OpenAIClient::new("test-key").unwrap();
    let err = client.message_builder().send().await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidRequest { .. }));
}

#[tokio::test]
async fn test_message_builder_sends_configured_model() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "gpt-4o",
            "max_completion_tokens": 64,
            "temperature": 0.0,
            "messages": [
                {"role": "system", "content": "Gere apenas SQL"},
                {"role": "user", "content": "Quantos clientes?"}
            ]
        })))
        .with_status(200)
        .with_body(
            r#"{"id":"c","model":"gpt-4o","choices":[{"index":0,"message":{"role":"assistant","content":"SELECT COUNT(*) FROM clientes"},"finish_reason":"stop"}],"usage":{"prompt_tokens":9,"completion_tokens":6,"total_tokens":15}}"#,
        )
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key")
        .unwrap()
        .with_base_url(server.url())
        .with_chat_model("gpt-4o");
    let response = client
        .message_builder()
        .system_message("Gere apenas SQL")
        .user_message("Quantos clientes?")
        .max_completion_tokens(64)
        .temperature(0.0)
        .send()
        .await
        .unwrap();

    assert_eq!(response.choices[0].message.content, "SELECT COUNT(*) FROM clientes");
    assert_eq!(response.usage.total_tokens, 15);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_embedding_builder_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/embeddings")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "text-embedding-3-small",
            "input": ["vendas: id, produto", "clientes: id, nome"],
            "dimensions": 2,
            "encoding_format": "float"
        })))
        .with_status(200)
        .with_body(
            r#"{"object":"list","data":[
                {"object":"embedding","embedding":[0.0,1.0],"index":1},
                {"object":"embedding","embedding":[1.0,0.0],"index":0}
            ],"model":"text-embedding-3-small","usage":{"prompt_tokens":8,"total_tokens":8}}"#,
        )
        .create_async()
        .await;

    let client = OpenAIClient::new("test-key")
        .unwrap()
        .with_base_url(server.url());
    let response = client
        .embedding_builder()
        .model("text-embedding-3-small")
        .input("vendas: id, produto")
        .inputs(["clientes: id, nome"])
        .dimensions(2)
        .send()
        .await
        .unwrap();

    assert_eq!(response.model, "text-embedding-3-small");
    assert_eq!(
        response.into_ordered_vectors(),
        vec![vec![1.0, 0.0], vec![0.0, 1.0]]
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_embedding_builder_requires_input() {
    let client = OpenAIClient::new("test-key").unwrap();
    let err = client.embedding_builder().send().await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidRequest { .. }));
}
