use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AdviceError, AdvicePrompt, AdviceProvider, non_empty_or_placeholder, status_error};

pub const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.1-8b-instant";

/// OpenAI-compatible chat completion endpoint (Groq, OpenAI, llama.cpp, vLLM, ...).
#[derive(Debug, Clone)]
pub struct ChatCompletionProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl ChatCompletionProvider {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }
}

#[async_trait]
impl AdviceProvider for ChatCompletionProvider {
    fn name(&self) -> &str {
        "chat"
    }

    async fn request_advice(&self, prompt: &AdvicePrompt) -> Result<String, AdviceError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt.as_str(),
            }],
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(url = %self.url, model = %self.model, "requesting chat completion");
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let bytes = response.bytes().await?;
        let parsed: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| AdviceError::MalformedResponse(e.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AdviceError::MalformedResponse("response has no choices".to_string()))?;

        Ok(non_empty_or_placeholder(choice.message.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::NO_INSIGHTS;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, api_key: Option<&str>) -> ChatCompletionProvider {
        ChatCompletionProvider::new(
            reqwest::Client::new(),
            format!("{}/v1/chat/completions", server.uri()),
            "test-model",
            api_key.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn sends_chat_request_and_reads_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_json(json!({
                "model": "test-model",
                "messages": [{"role": "user", "content": "how am I doing?"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "You are on track."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let advice = provider(&server, Some("test-key"))
            .request_advice(&AdvicePrompt::from_text("how am I doing?"))
            .await
            .expect("request should succeed");
        assert_eq!(advice, "You are on track.");
    }

    #[tokio::test]
    async fn empty_content_becomes_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": ""}}]
            })))
            .mount(&server)
            .await;

        let advice = provider(&server, None)
            .request_advice(&AdvicePrompt::from_text("x"))
            .await
            .expect("request should succeed");
        assert_eq!(advice, NO_INSIGHTS);
    }

    #[tokio::test]
    async fn error_status_carries_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Invalid API Key", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let err = provider(&server, Some("bad"))
            .request_advice(&AdvicePrompt::from_text("x"))
            .await
            .expect_err("401 must fail");
        match err {
            AdviceError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API Key");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_choices_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider(&server, None)
            .request_advice(&AdvicePrompt::from_text("x"))
            .await
            .expect_err("empty choices must fail");
        assert!(matches!(err, AdviceError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = provider(&server, None)
            .request_advice(&AdvicePrompt::from_text("x"))
            .await
            .expect_err("html must fail");
        assert!(matches!(err, AdviceError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let provider = ChatCompletionProvider::new(
            reqwest::Client::new(),
            format!("http://127.0.0.1:{port}/v1/chat/completions"),
            "test-model",
            None,
        );

        let err = provider
            .request_advice(&AdvicePrompt::from_text("x"))
            .await
            .expect_err("closed server must fail");
        assert!(matches!(err, AdviceError::Transport(_)));
    }
}
