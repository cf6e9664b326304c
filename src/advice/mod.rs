//! Narrative advice from an external text-generation service.
//!
//! The numeric model never depends on anything here. Callers render an
//! [`AdvicePrompt`] from inputs and a finished projection, then hand it to
//! an [`AdviceSession`], which enforces one request in flight, a timeout
//! and cancellation around whichever [`AdviceProvider`] is configured.
//!
//! Every failure surfaces as an [`AdviceError`]; [`AdviceError::user_message`]
//! turns it into text that can be shown where the advice would have been.

mod chat;
mod ollama;
mod prompt;
mod session;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use chat::{ChatCompletionProvider, DEFAULT_CHAT_COMPLETIONS_URL, DEFAULT_CHAT_MODEL};
pub use ollama::{DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, OllamaProvider};
pub use prompt::{AdvicePrompt, format_money};
pub use session::AdviceSession;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_ERROR_MESSAGE_CHARS: usize = 300;

/// Shown when a provider answers successfully but with no text.
pub const NO_INSIGHTS: &str = "No insights generated.";

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("advice is disabled")]
    Disabled,
    #[error("an advice request is already in flight")]
    InFlight,
    #[error("advice request was cancelled")]
    Cancelled,
    #[error("advice request timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not reach advice endpoint: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("advice endpoint returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed advice response: {0}")]
    MalformedResponse(String),
}

impl AdviceError {
    pub fn user_message(&self) -> String {
        match self {
            AdviceError::Disabled => {
                "AI advice is not configured. Restart the server with --advisor chat or \
                 --advisor ollama to enable it."
                    .to_string()
            }
            AdviceError::InFlight => {
                "An analysis is already running. Wait for it to finish or cancel it.".to_string()
            }
            AdviceError::Cancelled => "The analysis was cancelled.".to_string(),
            other => format!(
                "Error connecting to AI: {other}\n\nPlease ensure:\n\
                 1. The AI endpoint is running and reachable\n\
                 2. The configured model is available\n\
                 3. The API key, if required, is valid"
            ),
        }
    }
}

#[async_trait]
pub trait AdviceProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn request_advice(&self, prompt: &AdvicePrompt) -> Result<String, AdviceError>;
}

/// Returns the same prose for every prompt. For offline use and tests.
#[derive(Debug, Clone)]
pub struct StubProvider {
    advice: String,
}

impl StubProvider {
    pub fn new(advice: impl Into<String>) -> Self {
        Self {
            advice: advice.into(),
        }
    }
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new(
            "Advice is running in offline mode. Review the projection above: \
             if it shows a shortfall, consider raising contributions or retiring later.",
        )
    }
}

#[async_trait]
impl AdviceProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn request_advice(&self, _prompt: &AdvicePrompt) -> Result<String, AdviceError> {
        Ok(self.advice.clone())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProvider;

#[async_trait]
impl AdviceProvider for NoopProvider {
    fn name(&self) -> &str {
        "none"
    }

    async fn request_advice(&self, _prompt: &AdvicePrompt) -> Result<String, AdviceError> {
        Err(AdviceError::Disabled)
    }
}

pub fn http_client(timeout: Duration) -> Result<reqwest::Client, AdviceError> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Text(String),
    Object { message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorField,
}

/// Builds a `Status` error, preferring the `error` field of a JSON body.
pub(crate) async fn status_error(response: reqwest::Response) -> AdviceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            error: ErrorField::Text(message) | ErrorField::Object { message },
        }) => message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.trim().chars().take(MAX_ERROR_MESSAGE_CHARS).collect(),
    };
    AdviceError::Status {
        status: status.as_u16(),
        message,
    }
}

pub(crate) fn non_empty_or_placeholder(text: Option<String>) -> String {
    match text {
        Some(text) if !text.trim().is_empty() => text,
        _ => NO_INSIGHTS.to_string(),
    }
}
