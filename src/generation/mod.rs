//! Text generation boundary
//!
//! A GenerationClient turns a prompt into raw model text. It holds no
//! business logic; everything it returns is treated as untrusted.

use crate::config::GenerationConfig;
use crate::error::AdvisoryError;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub mod gemini;
pub use gemini::GeminiClient;

/// Single-shot text generation (no retries, no caching)
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Client used when no model is configured.
/// Every call fails, so every advisor serves its fallback.
pub struct OfflineClient {
    reason: String,
}

impl OfflineClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl GenerationClient for OfflineClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(AdvisoryError::Transport(self.reason.clone()))
    }
}

type Responder = dyn Fn(&str) -> Result<String> + Send + Sync;

/// Client that answers from a closure, for development & testing
pub struct ScriptedClient {
    responder: Box<Responder>,
    delay: Option<Duration>,
}

impl ScriptedClient {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: None,
        }
    }

    /// Always answer with the same text
    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(prompt)
    }
}

/// Pick the client for a process: Gemini when a key is configured,
/// offline otherwise.
pub fn client_from_config(config: &GenerationConfig) -> Result<Arc<dyn GenerationClient>> {
    if config.has_api_key() {
        Ok(Arc::new(GeminiClient::new(config)?))
    } else {
        warn!("GEMINI_API_KEY not configured; all advisors will use fallback calculations");
        Ok(Arc::new(OfflineClient::new("GEMINI_API_KEY not configured")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_client_fails_with_transport() {
        let client = OfflineClient::new("disabled");
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, AdvisoryError::Transport(_)));
    }

    #[tokio::test]
    async fn test_scripted_client_sees_prompt() {
        let client = ScriptedClient::new(|prompt| Ok(format!("echo: {}", prompt)));
        assert_eq!(client.generate("hi").await.unwrap(), "echo: hi");
    }

    #[test]
    fn test_client_from_config_without_key() {
        let config = GenerationConfig::default();
        assert!(client_from_config(&config).is_ok());
    }
}
