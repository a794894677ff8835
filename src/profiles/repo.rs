use anyhow::Context;
use sqlx::{types::Json, FromRow, PgPool};
use time::Date;
use tracing::warn;
use uuid::Uuid;

use super::model::{age_on, Allergy, Profile};

/// Row of the `profiles` table owned by the profile collaborator.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub user_id: Uuid,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub weight: Option<f64>,
    pub weight_unit: String,
    pub height: Option<f64>,
    pub height_unit: String,
    pub activity_level: Option<String>,
    pub health_goals: Vec<String>,
    pub dietary_preferences: Vec<String>,
    pub allergies: Json<Vec<Allergy>>,
    pub timezone: Option<String>,
}

pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<ProfileRow>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT user_id, date_of_birth, gender, weight, weight_unit, height, height_unit,
               activity_level, health_goals, dietary_preferences, allergies, timezone
          FROM profiles
         WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("load profile")?;
    Ok(row)
}

impl ProfileRow {
    pub fn timezone(&self) -> &str {
        self.timezone
            .as_deref()
            .filter(|tz| !tz.trim().is_empty())
            .unwrap_or("UTC")
    }

    /// Converts the stored strings into the typed snapshot, computing age
    /// as of `today`. Unrecognized enum values are dropped with a warning
    /// rather than failing the whole profile.
    pub fn into_profile(self, today: Date) -> Profile {
        let user_id = self.user_id;
        let timezone = self.timezone().to_string();
        Profile {
            age: self.date_of_birth.and_then(|dob| age_on(dob, today)),
            gender: parse_lenient(user_id, "gender", self.gender.as_deref()),
            weight: self.weight,
            weight_unit: parse_lenient(user_id, "weight_unit", Some(&self.weight_unit))
                .unwrap_or_default(),
            height: self.height,
            height_unit: parse_lenient(user_id, "height_unit", Some(&self.height_unit))
                .unwrap_or_default(),
            activity_level: parse_lenient(user_id, "activity_level", self.activity_level.as_deref()),
            health_goals: self
                .health_goals
                .iter()
                .filter_map(|g| parse_lenient(user_id, "health_goal", Some(g)))
                .collect(),
            dietary_preferences: self
                .dietary_preferences
                .iter()
                .filter_map(|p| parse_lenient(user_id, "dietary_preference", Some(p)))
                .collect(),
            allergies: self.allergies.0,
            timezone,
        }
    }
}

fn parse_lenient<T: std::str::FromStr<Err = String>>(
    user_id: Uuid,
    field: &'static str,
    raw: Option<&str>,
) -> Option<T> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(%user_id, field, error = %e, "ignoring unrecognized profile value");
            None
        }
    }
}
