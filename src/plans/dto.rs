use axum::http::StatusCode;
use serde::Deserialize;
use time::{macros::format_description, Date};

#[derive(Debug, Default, Deserialize)]
pub struct GeneratePlanRequest {
    /// `YYYY-MM-DD`; today in the user's timezone when absent.
    #[serde(default)]
    pub date: Option<String>,
}

/// Decodes the optional generate body. An empty body means "no options";
/// anything else must be a well-formed request object.
pub fn parse_generate_body(body: &[u8]) -> Result<GeneratePlanRequest, (StatusCode, String)> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GeneratePlanRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid request body: {e}")))
}

pub fn parse_plan_date(raw: &str) -> Result<Date, (StatusCode, String)> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("invalid date {raw:?}, expected YYYY-MM-DD"),
        )
    })
}
