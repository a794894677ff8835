pub mod gemini;
pub mod openai_compatible;
pub mod orchestrator;
pub mod prompts;
pub mod validator;

use std::sync::Arc;
use std::time::Duration;

use axum::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::{AiConfig, ProviderKind};

pub use orchestrator::AiOrchestrator;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// System and user message pair sent to a generative backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Transport-level failure of a single backend call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("backend returned no content")]
    EmptyResponse,

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Keeps error bodies short enough for a log line.
    pub(crate) fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = match status.as_u16() {
            401 | 403 => "authentication rejected".to_string(),
            429 => "rate limited".to_string(),
            _ => body.chars().take(200).collect(),
        };
        Self::Status {
            status: status.as_u16(),
            message,
        }
    }
}

/// One generative backend. Implementations turn a [`Prompt`] into the raw
/// text the model produced; validation happens upstream.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;
    fn enabled(&self) -> bool;
    async fn invoke(&self, prompt: &Prompt) -> Result<String, ProviderError>;
}

/// Instantiates one adapter per configured backend, in priority order.
/// A single HTTP client is shared by all of them.
pub fn build_adapters(cfg: &AiConfig) -> anyhow::Result<Vec<Arc<dyn ProviderAdapter>>> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(cfg.request_timeout)
        .build()?;

    let adapters = cfg
        .providers
        .iter()
        .map(|settings| -> Arc<dyn ProviderAdapter> {
            match settings.kind {
                ProviderKind::OpenAiCompatible => Arc::new(
                    openai_compatible::OpenAiCompatibleAdapter::new(
                        client.clone(),
                        settings,
                        cfg.temperature,
                    ),
                ),
                ProviderKind::Gemini => Arc::new(gemini::GeminiAdapter::new(
                    client.clone(),
                    settings,
                    cfg.temperature,
                )),
            }
        })
        .collect();
    Ok(adapters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderSettings;

    #[test]
    fn builds_adapters_in_configured_order() {
        let settings = |name: &str, kind, key: Option<&str>| ProviderSettings {
            name: name.into(),
            kind,
            api_key: key.map(Into::into),
            model: "m".into(),
            base_url: "http://localhost".into(),
        };
        let cfg = AiConfig {
            providers: vec![
                settings("gemini", ProviderKind::Gemini, None),
                settings("openai", ProviderKind::OpenAiCompatible, Some("sk-test")),
            ],
            request_timeout: Duration::from_secs(5),
            temperature: 0.7,
        };

        let adapters = build_adapters(&cfg).unwrap();
        let names: Vec<_> = adapters.iter().map(|a| a.name()).collect();
        assert_eq!(names, ["gemini", "openai"]);
        assert!(!adapters[0].enabled());
        assert!(adapters[1].enabled());
    }

    #[test]
    fn auth_failures_drop_the_body() {
        let err = ProviderError::from_status(reqwest::StatusCode::UNAUTHORIZED, "bad key sk-123");
        assert!(!err.to_string().contains("sk-123"));
    }
}
