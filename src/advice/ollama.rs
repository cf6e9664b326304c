use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AdviceError, AdvicePrompt, AdviceProvider, non_empty_or_placeholder, status_error};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama2";

/// Locally hosted Ollama server, non-streaming `/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

impl OllamaProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/generate", self.base_url)
    }
}

#[async_trait]
impl AdviceProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn request_advice(&self, prompt: &AdvicePrompt) -> Result<String, AdviceError> {
        let url = self.generate_url();
        let body = GenerateRequest {
            model: &self.model,
            prompt: prompt.as_str(),
            stream: false,
        };

        tracing::debug!(%url, model = %self.model, "requesting ollama generation");
        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let bytes = response.bytes().await?;
        let parsed: GenerateResponse = serde_json::from_slice(&bytes)
            .map_err(|e| AdviceError::MalformedResponse(e.to_string()))?;
        Ok(non_empty_or_placeholder(parsed.response))
    }
}
