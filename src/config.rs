use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

/// Wire protocol spoken by a generative backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenAiCompatible,
    Gemini,
}

/// One configured backend. A backend without an API key is kept in the
/// list but reported as disabled.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub name: String,
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl ProviderSettings {
    pub fn enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Priority order, highest first.
    pub providers: Vec<ProviderSettings>,
    pub request_timeout: Duration,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfig {
    /// Regional cuisine named in the seeding and plan prompts.
    pub cuisine: String,
    /// Fixed seed for the rule-based composer; entropy when unset.
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub ai: AiConfig,
    pub plan: PlanConfig,
}

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TEMPERATURE: f32 = 0.7;

// (name, kind, key var, model var, default model, base url var, default base url)
const KNOWN_PROVIDERS: &[(&str, ProviderKind, &str, &str, &str, &str, &str)] = &[
    (
        "openai",
        ProviderKind::OpenAiCompatible,
        "OPENAI_API_KEY",
        "OPENAI_MODEL",
        "gpt-4o-mini",
        "OPENAI_BASE_URL",
        "https://api.openai.com/v1",
    ),
    (
        "deepseek",
        ProviderKind::OpenAiCompatible,
        "DEEPSEEK_API_KEY",
        "DEEPSEEK_MODEL",
        "deepseek-chat",
        "DEEPSEEK_BASE_URL",
        "https://api.deepseek.com",
    ),
    (
        "gemini",
        ProviderKind::Gemini,
        "GEMINI_API_KEY",
        "GEMINI_MODEL",
        "gemini-1.5-flash",
        "GEMINI_BASE_URL",
        "https://generativelanguage.googleapis.com/v1beta",
    ),
    (
        "qwen",
        ProviderKind::OpenAiCompatible,
        "QWEN_API_KEY",
        "QWEN_MODEL",
        "qwen-turbo",
        "QWEN_BASE_URL",
        "https://dashscope-intl.aliyuncs.com/compatible-mode/v1",
    ),
];

impl AiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the provider list from any key/value source.
    ///
    /// `AI_PROVIDER_ORDER` (comma separated names) replaces the default
    /// order; providers it does not name are left out.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut providers: Vec<ProviderSettings> = KNOWN_PROVIDERS
            .iter()
            .map(
                |&(name, kind, key_var, model_var, model, url_var, url)| ProviderSettings {
                    name: name.to_string(),
                    kind,
                    api_key: lookup(key_var).filter(|k| !k.trim().is_empty()),
                    model: lookup(model_var).unwrap_or_else(|| model.to_string()),
                    base_url: lookup(url_var).unwrap_or_else(|| url.to_string()),
                },
            )
            .collect();

        if let Some(order) = lookup("AI_PROVIDER_ORDER") {
            let mut ordered = Vec::new();
            for wanted in order.split(',').map(|s| s.trim().to_lowercase()) {
                if wanted.is_empty() {
                    continue;
                }
                match providers.iter().position(|p| p.name == wanted) {
                    Some(idx) => ordered.push(providers.remove(idx)),
                    None => tracing::warn!(provider = %wanted, "unknown provider in AI_PROVIDER_ORDER"),
                }
            }
            providers = ordered;
        }

        let timeout_secs = lookup("AI_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let temperature = lookup("AI_TEMPERATURE")
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        Self {
            providers,
            request_timeout: Duration::from_secs(timeout_secs),
            temperature,
        }
    }
}

impl PlanConfig {
    pub fn from_env() -> Self {
        Self {
            cuisine: std::env::var("PLAN_CUISINE").unwrap_or_else(|_| "Pakistani".into()),
            rng_seed: std::env::var("PLAN_RNG_SEED")
                .ok()
                .and_then(|v| v.parse::<u64>().ok()),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutriplan".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutriplan-users".into()),
        };
        Ok(Self {
            database_url,
            jwt,
            ai: AiConfig::from_env(),
            plan: PlanConfig::from_env(),
        })
    }
}
