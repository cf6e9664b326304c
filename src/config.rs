use std::sync::Arc;
use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::advice::{
    AdviceError, AdviceProvider, AdviceSession, ChatCompletionProvider, DEFAULT_CHAT_COMPLETIONS_URL,
    DEFAULT_CHAT_MODEL, DEFAULT_OLLAMA_MODEL, DEFAULT_OLLAMA_URL, NoopProvider, OllamaProvider,
    StubProvider, http_client,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum AdvisorKind {
    /// OpenAI-compatible chat completions endpoint
    Chat,
    /// Local Ollama server
    Ollama,
    /// Fixed offline text
    Stub,
    /// Advice disabled
    None,
}

#[derive(Args, Debug, Clone)]
pub struct AdvisorConfig {
    #[arg(
        long = "advisor",
        env = "NESTEGG_ADVISOR",
        value_enum,
        default_value_t = AdvisorKind::None,
        help = "Which advice backend to call"
    )]
    pub kind: AdvisorKind,
    #[arg(
        long = "advisor-url",
        env = "NESTEGG_ADVISOR_URL",
        help = "Endpoint URL; defaults depend on --advisor"
    )]
    pub url: Option<String>,
    #[arg(long = "advisor-model", env = "NESTEGG_ADVISOR_MODEL")]
    pub model: Option<String>,
    #[arg(
        long = "advisor-api-key",
        env = "NESTEGG_API_KEY",
        hide_env_values = true,
        help = "Bearer token for the chat backend"
    )]
    pub api_key: Option<String>,
    #[arg(
        long = "advisor-timeout-secs",
        env = "NESTEGG_ADVISOR_TIMEOUT_SECS",
        default_value_t = 60,
        help = "Upper bound on a single advice request"
    )]
    pub timeout_secs: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            kind: AdvisorKind::None,
            url: None,
            model: None,
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl AdvisorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("--advisor-timeout-secs must be > 0".to_string());
        }
        if let Some(url) = &self.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err("--advisor-url must start with http:// or https://".to_string());
            }
        }
        Ok(())
    }

    pub fn build_provider(&self) -> Result<Arc<dyn AdviceProvider>, AdviceError> {
        let provider: Arc<dyn AdviceProvider> = match self.kind {
            AdvisorKind::Chat => Arc::new(ChatCompletionProvider::new(
                http_client(self.timeout())?,
                self.url.as_deref().unwrap_or(DEFAULT_CHAT_COMPLETIONS_URL),
                self.model.as_deref().unwrap_or(DEFAULT_CHAT_MODEL),
                self.api_key.clone(),
            )),
            AdvisorKind::Ollama => Arc::new(OllamaProvider::new(
                http_client(self.timeout())?,
                self.url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL),
                self.model.as_deref().unwrap_or(DEFAULT_OLLAMA_MODEL),
            )),
            AdvisorKind::Stub => Arc::new(StubProvider::default()),
            AdvisorKind::None => Arc::new(NoopProvider),
        };
        Ok(provider)
    }

    pub fn build_session(&self) -> Result<AdviceSession, AdviceError> {
        Ok(AdviceSession::new(self.build_provider()?, self.timeout()))
    }
}
