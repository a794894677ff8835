use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use super::dto::{parse_generate_body, parse_plan_date};
use super::model::StoredDietPlan;
use crate::auth::AuthUser;
use crate::error::PlanError;
use crate::profiles::model::local_today;
use crate::profiles::repo::find_by_user;
use crate::state::AppState;

pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/diet-plans/generate", post(generate_plan))
        .route("/diet-plans/:date", get(get_plan))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error".into())
}

fn plan_error(e: PlanError) -> (StatusCode, String) {
    if e.status().is_server_error() {
        error!(error = %e, "diet plan generation failed");
    }
    e.into()
}

/// POST /diet-plans/generate
#[instrument(skip(state, body))]
pub async fn generate_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Bytes,
) -> Result<Json<StoredDietPlan>, (StatusCode, String)> {
    let requested = parse_generate_body(&body)?
        .date
        .map(|raw| parse_plan_date(&raw))
        .transpose()?;

    let row = find_by_user(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "profile not found".to_string()))?;

    let today = local_today(row.timezone());
    let date = requested.unwrap_or(today);
    let profile = row.into_profile(today);

    let stored = state
        .planner
        .generate(user_id, &profile, date)
        .await
        .map_err(plan_error)?;
    Ok(Json(stored))
}

/// GET /diet-plans/:date
#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(raw_date): Path<String>,
) -> Result<Json<StoredDietPlan>, (StatusCode, String)> {
    let date = parse_plan_date(&raw_date)?;
    state
        .planner
        .find(user_id, date)
        .await
        .map_err(plan_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "diet plan not found".into()))
}
