use axum::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{Prompt, ProviderAdapter, ProviderError};
use crate::config::ProviderSettings;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?i)```(?:json)?[ \t]*\r?\n?").unwrap();
}

/// Google Generative Language backend.
pub struct GeminiAdapter {
    client: Client,
    name: String,
    model: String,
    base_url: String,
    api_key: Option<String>,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiAdapter {
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

    fn build_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Gemini tends to wrap JSON in markdown fences even when asked not to.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
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
            "systemInstruction": { "parts": [{ "text": prompt.system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt.user }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "responseMimeType": "application/json",
                "candidateCount": 1,
            },
        });

        debug!(provider = %self.name, model = %self.model, "sending generateContent");
        let response = self
            .client
            .post(self.build_url())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::from_status(status, &text));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Status {
                status: status.as_u16(),
                message: format!("malformed generateContent envelope: {e}"),
            })?;

        let joined: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let cleaned = strip_code_fences(&joined);
        if cleaned.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(base_url: &str) -> GeminiAdapter {
        let settings = ProviderSettings {
            name: "gemini".into(),
            kind: ProviderKind::Gemini,
            api_key: Some("g-key".into()),
            model: "gemini-1.5-flash".into(),
            base_url: base_url.into(),
        };
        GeminiAdapter::new(Client::new(), &settings, 0.7)
    }

    #[test]
    fn strips_markdown_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn joins_parts_and_strips_fences() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "```json\n{\"foods\":" }, { "text": "[]}\n```" }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prompt = Prompt {
            system: "sys".into(),
            user: "user".into(),
        };
        let out = adapter(&server.uri()).invoke(&prompt).await.unwrap();
        assert_eq!(out, "{\"foods\":[]}");
    }

    #[tokio::test]
    async fn no_candidates_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let prompt = Prompt {
            system: "sys".into(),
            user: "user".into(),
        };
        let err = adapter(&server.uri()).invoke(&prompt).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }
}
