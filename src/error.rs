use axum::http::StatusCode;
use thiserror::Error;

/// Failure taxonomy of the diet-plan pipeline.
///
/// `ProviderUnavailable` and `InvalidAiOutput` are recovered inside the
/// provider chain and only reach callers through logs; the remaining
/// variants surface to the HTTP layer.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    #[error("provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("invalid AI output: {0}")]
    InvalidAiOutput(String),

    #[error("food catalog exhausted: no meal could be composed")]
    FoodCatalogExhausted,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl PlanError {
    pub fn invalid_profile(msg: impl Into<String>) -> Self {
        Self::InvalidProfile(msg.into())
    }

    pub fn invalid_output(msg: impl Into<String>) -> Self {
        Self::InvalidAiOutput(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            PlanError::InvalidProfile(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PlanError::FoodCatalogExhausted => StatusCode::SERVICE_UNAVAILABLE,
            PlanError::ProviderUnavailable { .. } => StatusCode::BAD_GATEWAY,
            PlanError::InvalidAiOutput(_) => StatusCode::BAD_GATEWAY,
            PlanError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PlanError> for (StatusCode, String) {
    fn from(err: PlanError) -> Self {
        let status = err.status();
        let body = match &err {
            // storage details stay in the logs
            PlanError::Storage(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        (status, body)
    }
}
