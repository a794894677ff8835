use anyhow::Context;
use axum::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
#[cfg(test)]
use tokio::sync::RwLock;

use super::model::{FoodFilter, FoodItem};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Read/insert access to the shared food catalog. Entries are unique by name.
#[async_trait]
pub trait FoodCatalog: Send + Sync {
    async fn query(&self, filter: &FoodFilter) -> anyhow::Result<Vec<FoodItem>>;
    async fn count(&self) -> anyhow::Result<i64>;
    /// Inserts every new name; names already present are skipped, not updated.
    async fn insert_many(&self, foods: &[FoodItem]) -> anyhow::Result<InsertReport>;
}

#[derive(Clone)]
pub struct PgFoodCatalog {
    db: PgPool,
}

impl PgFoodCatalog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FoodCatalog for PgFoodCatalog {
    async fn query(&self, filter: &FoodFilter) -> anyhow::Result<Vec<FoodItem>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT name, calories, protein, carbs, fats, meal_types, category,
                   typical_serving, serving_unit, is_vegetarian, is_vegan,
                   is_gluten_free, is_dairy_free, allergens
              FROM foods
             WHERE TRUE"#,
        );
        if let Some(tag) = &filter.meal_type {
            qb.push(" AND ")
                .push_bind(tag.to_lowercase())
                .push(" = ANY(meal_types)");
        }
        if let Some(category) = &filter.category {
            qb.push(" AND category = ").push_bind(category.to_lowercase());
        }
        if !filter.any_flags.is_empty() {
            qb.push(" AND (");
            let mut flags = qb.separated(" OR ");
            for flag in &filter.any_flags {
                flags.push(flag.column());
            }
            qb.push(")");
        }
        qb.push(" ORDER BY name");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let rows = qb
            .build_query_as::<FoodItem>()
            .fetch_all(&self.db)
            .await
            .context("query foods")?;
        Ok(rows)
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM foods")
            .fetch_one(&self.db)
            .await
            .context("count foods")?;
        Ok(n)
    }

    async fn insert_many(&self, foods: &[FoodItem]) -> anyhow::Result<InsertReport> {
        let mut tx = self.db.begin().await?;
        let mut report = InsertReport::default();

        for food in foods {
            let res = sqlx::query(
                r#"
                INSERT INTO foods (name, calories, protein, carbs, fats, meal_types, category,
                                   typical_serving, serving_unit, is_vegetarian, is_vegan,
                                   is_gluten_free, is_dairy_free, allergens)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(&food.name)
            .bind(food.calories)
            .bind(food.protein)
            .bind(food.carbs)
            .bind(food.fats)
            .bind(&food.meal_type)
            .bind(&food.category)
            .bind(food.typical_serving)
            .bind(&food.serving_unit)
            .bind(food.is_vegetarian)
            .bind(food.is_vegan)
            .bind(food.is_gluten_free)
            .bind(food.is_dairy_free)
            .bind(&food.allergens)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("insert food {}", food.name))?;

            if res.rows_affected() == 1 {
                report.inserted += 1;
            } else {
                report.skipped += 1;
            }
        }

        tx.commit().await?;
        Ok(report)
    }
}

/// Process-local catalog used by tests.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryFoodCatalog {
    foods: RwLock<Vec<FoodItem>>,
}

#[cfg(test)]
impl InMemoryFoodCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_foods(foods: Vec<FoodItem>) -> Self {
        Self {
            foods: RwLock::new(foods),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl FoodCatalog for InMemoryFoodCatalog {
    async fn query(&self, filter: &FoodFilter) -> anyhow::Result<Vec<FoodItem>> {
        let foods = self.foods.read().await;
        let mut hits: Vec<FoodItem> = foods.iter().filter(|f| filter.matches(f)).cloned().collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(limit) = filter.limit {
            hits.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }
        Ok(hits)
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.foods.read().await.len() as i64)
    }

    async fn insert_many(&self, new_foods: &[FoodItem]) -> anyhow::Result<InsertReport> {
        let mut foods = self.foods.write().await;
        let mut report = InsertReport::default();
        for food in new_foods {
            if foods.iter().any(|f| f.name == food.name) {
                report.skipped += 1;
            } else {
                foods.push(food.clone());
                report.inserted += 1;
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foods::builtin::builtin_foods;
    use crate::foods::model::DietaryFlag;

    #[tokio::test]
    async fn duplicate_names_are_skipped() {
        let catalog = InMemoryFoodCatalog::new();
        let foods = builtin_foods();

        let first = catalog.insert_many(&foods).await.unwrap();
        assert_eq!(first, InsertReport { inserted: 21, skipped: 0 });

        let second = catalog.insert_many(&foods[..5]).await.unwrap();
        assert_eq!(second, InsertReport { inserted: 0, skipped: 5 });
        assert_eq!(catalog.count().await.unwrap(), 21);
    }

    #[tokio::test]
    async fn query_applies_filter_and_limit() {
        let catalog = InMemoryFoodCatalog::with_foods(builtin_foods());

        let vegan = catalog
            .query(&FoodFilter::any_of(vec![DietaryFlag::Vegan]))
            .await
            .unwrap();
        assert!(!vegan.is_empty());
        assert!(vegan.iter().all(|f| f.is_vegan));

        let limited = catalog.query(&FoodFilter::all().limit(3)).await.unwrap();
        assert_eq!(limited.len(), 3);
    }
}
