use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use super::prompts::{diet_plan_prompt, food_catalog_prompt};
use super::validator::{parse_food_list, validate_plan, ValidatedPlan};
use super::{Prompt, ProviderAdapter, ProviderError};
use crate::error::PlanError;
use crate::foods::model::FoodItem;
use crate::nutrition::NutritionTargets;
use crate::profiles::Profile;

pub const DEFAULT_CUISINE: &str = "Pakistani";

/// Every enabled backend was tried and none produced acceptable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("all {attempted} generative providers failed")]
pub struct ChainExhausted {
    pub attempted: usize,
}

/// Walks the enabled backends in priority order, one at a time, and returns
/// the first response that validates.
pub struct AiOrchestrator {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
    attempt_timeout: Duration,
    cuisine: String,
}

impl AiOrchestrator {
    pub fn new(adapters: Vec<Arc<dyn ProviderAdapter>>, attempt_timeout: Duration) -> Self {
        let (enabled, disabled): (Vec<_>, Vec<_>) = adapters.into_iter().partition(|a| a.enabled());
        for a in &disabled {
            info!(provider = a.name(), "provider disabled: no API key");
        }
        for a in &enabled {
            info!(provider = a.name(), model = a.model(), "provider enabled");
        }
        Self {
            adapters: enabled,
            attempt_timeout,
            cuisine: DEFAULT_CUISINE.to_string(),
        }
    }

    /// An orchestrator with no backends; every call reports exhaustion.
    pub fn disabled() -> Self {
        Self {
            adapters: Vec::new(),
            attempt_timeout: Duration::from_secs(1),
            cuisine: DEFAULT_CUISINE.to_string(),
        }
    }

    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = cuisine.into();
        self
    }

    pub fn cuisine(&self) -> &str {
        &self.cuisine
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub async fn generate_plan(
        &self,
        profile: &Profile,
        targets: &NutritionTargets,
        foods: &[FoodItem],
    ) -> Result<ValidatedPlan, ChainExhausted> {
        let prompt = diet_plan_prompt(profile, targets, foods, &self.cuisine);
        self.run_chain("diet_plan", &prompt, |raw| validate_plan(raw, targets))
            .await
    }

    pub async fn generate_foods(&self) -> Result<Vec<FoodItem>, ChainExhausted> {
        let prompt = food_catalog_prompt(&self.cuisine);
        self.run_chain("food_catalog", &prompt, parse_food_list).await
    }

    async fn run_chain<T, F>(
        &self,
        purpose: &'static str,
        prompt: &Prompt,
        accept: F,
    ) -> Result<T, ChainExhausted>
    where
        F: Fn(&str) -> Result<T, PlanError>,
    {
        for adapter in &self.adapters {
            let provider = adapter.name();
            info!(provider, model = adapter.model(), purpose, "invoking provider");

            let outcome = match timeout(self.attempt_timeout, adapter.invoke(prompt)).await {
                Ok(res) => res,
                Err(_) => Err(ProviderError::Timeout(self.attempt_timeout)),
            };

            let raw = match outcome {
                Ok(raw) => raw,
                Err(e) => {
                    let err = PlanError::ProviderUnavailable {
                        provider: provider.to_string(),
                        reason: e.to_string(),
                    };
                    warn!(provider, purpose, error = %err, "provider failed, trying next");
                    continue;
                }
            };

            match accept(&raw) {
                Ok(value) => {
                    info!(provider, purpose, "provider succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    warn!(provider, purpose, error = %err, "provider output rejected, trying next");
                }
            }
        }

        warn!(purpose, attempted = self.adapters.len(), "provider chain exhausted");
        Err(ChainExhausted {
            attempted: self.adapters.len(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use axum::async_trait;

    use super::*;

    /// What a scripted backend does on one call.
    pub enum Reply {
        Text(String),
        Fail,
        Hang,
    }

    /// Backend double that replays a fixed script and records calls.
    pub struct ScriptedAdapter {
        pub name: String,
        pub enabled: bool,
        script: Mutex<VecDeque<Reply>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedAdapter {
        pub fn new(
            name: &str,
            replies: Vec<Reply>,
            calls: Arc<Mutex<Vec<String>>>,
        ) -> Arc<dyn ProviderAdapter> {
            Arc::new(Self {
                name: name.to_string(),
                enabled: true,
                script: Mutex::new(replies.into()),
                calls,
            })
        }

        pub fn without_key(name: &str, calls: Arc<Mutex<Vec<String>>>) -> Arc<dyn ProviderAdapter> {
            Arc::new(Self {
                name: name.to_string(),
                enabled: false,
                script: Mutex::new(VecDeque::new()),
                calls,
            })
        }
    }

    #[async_trait]
    impl ProviderAdapter for ScriptedAdapter {
        fn name(&self) -> &str {
            &self.name
        }

        fn model(&self) -> &str {
            "scripted"
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        async fn invoke(&self, _prompt: &Prompt) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(self.name.clone());
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Reply::Text(t)) => Ok(t),
                Some(Reply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(ProviderError::EmptyResponse)
                }
                Some(Reply::Fail) | None => Err(ProviderError::Status {
                    status: 500,
                    message: "scripted failure".into(),
                }),
            }
        }
    }

    pub fn plan_json() -> String {
        r#"{"meals":[{"mealType":"lunch","items":[{"name":"Daal","quantity":150,"unit":"grams","calories":174,"protein":10.5,"carbs":30,"fats":2.3}],"totalCalories":174}]}"#.to_string()
    }
}
