#[cfg(test)]
use std::collections::HashMap;

use anyhow::Context;
use axum::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::{Date, OffsetDateTime};
#[cfg(test)]
use tokio::sync::Mutex;
use uuid::Uuid;

use super::model::{DietPlan, Meal, StoredDietPlan};
use crate::nutrition::NutritionTargets;

/// Persistence of plans keyed by (user, date). `upsert` replaces an
/// existing plan in place and keeps its id.
#[async_trait]
pub trait DietPlanStore: Send + Sync {
    async fn upsert(&self, user_id: Uuid, plan: &DietPlan) -> anyhow::Result<StoredDietPlan>;
    async fn find(&self, user_id: Uuid, date: Date) -> anyhow::Result<Option<StoredDietPlan>>;
}

#[derive(Debug, FromRow)]
struct DietPlanRow {
    id: Uuid,
    user_id: Uuid,
    plan_date: Date,
    meals: Json<Vec<Meal>>,
    daily_calories: i32,
    daily_protein: i32,
    daily_carbs: i32,
    daily_fats: i32,
    generated_by_ai: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl DietPlanRow {
    fn into_stored(self) -> StoredDietPlan {
        let grams = |v: i32| u32::try_from(v).unwrap_or(0);
        StoredDietPlan {
            id: self.id,
            user_id: self.user_id,
            plan: DietPlan {
                date: self.plan_date,
                meals: self.meals.0,
                targets: NutritionTargets {
                    daily_calories: grams(self.daily_calories),
                    daily_protein: grams(self.daily_protein),
                    daily_carbs: grams(self.daily_carbs),
                    daily_fats: grams(self.daily_fats),
                },
                generated_by_ai: self.generated_by_ai,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn to_i32(v: u32, field: &str) -> anyhow::Result<i32> {
    i32::try_from(v).with_context(|| format!("{field} out of range: {v}"))
}

#[derive(Clone)]
pub struct PgDietPlanStore {
    db: PgPool,
}

impl PgDietPlanStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DietPlanStore for PgDietPlanStore {
    async fn upsert(&self, user_id: Uuid, plan: &DietPlan) -> anyhow::Result<StoredDietPlan> {
        let t = &plan.targets;
        let row = sqlx::query_as::<_, DietPlanRow>(
            r#"
            INSERT INTO diet_plans (id, user_id, plan_date, meals, daily_calories, daily_protein,
                                    daily_carbs, daily_fats, generated_by_ai)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id, plan_date) DO UPDATE
               SET meals = EXCLUDED.meals,
                   daily_calories = EXCLUDED.daily_calories,
                   daily_protein = EXCLUDED.daily_protein,
                   daily_carbs = EXCLUDED.daily_carbs,
                   daily_fats = EXCLUDED.daily_fats,
                   generated_by_ai = EXCLUDED.generated_by_ai,
                   updated_at = now()
            RETURNING id, user_id, plan_date, meals, daily_calories, daily_protein, daily_carbs,
                      daily_fats, generated_by_ai, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(plan.date)
        .bind(Json(&plan.meals))
        .bind(to_i32(t.daily_calories, "daily_calories")?)
        .bind(to_i32(t.daily_protein, "daily_protein")?)
        .bind(to_i32(t.daily_carbs, "daily_carbs")?)
        .bind(to_i32(t.daily_fats, "daily_fats")?)
        .bind(plan.generated_by_ai)
        .fetch_one(&self.db)
        .await
        .context("upsert diet plan")?;
        Ok(row.into_stored())
    }

    async fn find(&self, user_id: Uuid, date: Date) -> anyhow::Result<Option<StoredDietPlan>> {
        let row = sqlx::query_as::<_, DietPlanRow>(
            r#"
            SELECT id, user_id, plan_date, meals, daily_calories, daily_protein, daily_carbs,
                   daily_fats, generated_by_ai, created_at, updated_at
              FROM diet_plans
             WHERE user_id = $1 AND plan_date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await
        .context("load diet plan")?;
        Ok(row.map(DietPlanRow::into_stored))
    }
}

/// Process-local store used by tests; a single lock makes each upsert atomic.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryDietPlanStore {
    plans: Mutex<HashMap<(Uuid, Date), StoredDietPlan>>,
}

#[cfg(test)]
impl InMemoryDietPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.plans.lock().await.len()
    }
}

#[cfg(test)]
#[async_trait]
impl DietPlanStore for InMemoryDietPlanStore {
    async fn upsert(&self, user_id: Uuid, plan: &DietPlan) -> anyhow::Result<StoredDietPlan> {
        let now = OffsetDateTime::now_utc();
        let mut plans = self.plans.lock().await;
        let stored = plans
            .entry((user_id, plan.date))
            .and_modify(|existing| {
                existing.plan = plan.clone();
                existing.updated_at = now;
            })
            .or_insert_with(|| StoredDietPlan {
                id: Uuid::new_v4(),
                user_id,
                plan: plan.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(stored.clone())
    }

    async fn find(&self, user_id: Uuid, date: Date) -> anyhow::Result<Option<StoredDietPlan>> {
        Ok(self.plans.lock().await.get(&(user_id, date)).cloned())
    }
}
