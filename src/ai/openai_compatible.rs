use axum::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{Prompt, ProviderAdapter, ProviderError};
use crate::config::ProviderSettings;

/// Chat-completions backend (OpenAI, DeepSeek, Qwen compatible mode).
pub struct OpenAiCompatibleAdapter {
    client: Client,
    name: String,
    model: String,
    base_url: String,
    api_key: Option<String>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiCompatibleAdapter {
    pub fn new(client: Client, settings: &ProviderSettings, temperature: f32) -> Self {
        Self {
            client,
            name: settings.name.clone(),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            temperature,
        }
    }

    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn enabled(&self) -> bool {
        self.api_key.is_some()
    }

    async fn invoke(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt.system },
                { "role": "user", "content": prompt.user },
            ],
            "temperature": self.temperature,
            "response_format": { "type": "json_object" },
        });

        debug!(provider = %self.name, model = %self.model, "sending chat completion");
        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::from_status(status, &text));
        }

        let completion: ChatCompletion = serde_json::from_str(&text).map_err(|e| {
            ProviderError::Status {
                status: status.as_u16(),
                message: format!("malformed completion envelope: {e}"),
            }
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(ProviderError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(base_url: &str, key: Option<&str>) -> OpenAiCompatibleAdapter {
        let settings = ProviderSettings {
            name: "deepseek".into(),
            kind: ProviderKind::OpenAiCompatible,
            api_key: key.map(Into::into),
            model: "deepseek-chat".into(),
            base_url: format!("{base_url}/"),
        };
        OpenAiCompatibleAdapter::new(Client::new(), &settings, 0.7)
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "You are a nutritionist.".into(),
            user: "Plan my day.".into(),
        }
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "deepseek-chat",
                "response_format": { "type": "json_object" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": " {\"meals\":[]} " } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = adapter(&server.uri(), Some("sk-test")).invoke(&prompt()).await.unwrap();
        assert_eq!(out, "{\"meals\":[]}");
    }

    #[tokio::test]
    async fn maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = adapter(&server.uri(), Some("sk-test")).invoke(&prompt()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn empty_choices_are_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = adapter(&server.uri(), Some("sk-test")).invoke(&prompt()).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn missing_key_never_calls_out() {
        let a = adapter("http://127.0.0.1:9", None);
        assert!(!a.enabled());
        assert!(matches!(a.invoke(&prompt()).await, Err(ProviderError::NotConfigured)));
    }
}
