use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use super::builtin::builtin_foods;
use super::catalog::{FoodCatalog, InsertReport};
use crate::ai::AiOrchestrator;
use crate::error::PlanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    AlreadyPopulated,
    Generated(InsertReport),
    BuiltIn(InsertReport),
}

/// One-time bootstrap of an empty catalog. Concurrent callers share a
/// single seeding attempt; later callers see the populated catalog.
pub struct CatalogSeeder {
    catalog: Arc<dyn FoodCatalog>,
    orchestrator: Arc<AiOrchestrator>,
    gate: Mutex<()>,
    seeded: AtomicBool,
}

impl CatalogSeeder {
    pub fn new(catalog: Arc<dyn FoodCatalog>, orchestrator: Arc<AiOrchestrator>) -> Self {
        Self {
            catalog,
            orchestrator,
            gate: Mutex::new(()),
            seeded: AtomicBool::new(false),
        }
    }

    #[instrument(skip(self))]
    pub async fn ensure_seeded(&self) -> Result<SeedOutcome, PlanError> {
        if self.seeded.load(Ordering::Acquire) {
            return Ok(SeedOutcome::AlreadyPopulated);
        }

        let _guard = self.gate.lock().await;
        if self.seeded.load(Ordering::Acquire) {
            return Ok(SeedOutcome::AlreadyPopulated);
        }

        if self.catalog.count().await? > 0 {
            self.seeded.store(true, Ordering::Release);
            return Ok(SeedOutcome::AlreadyPopulated);
        }

        info!(cuisine = self.orchestrator.cuisine(), "food catalog is empty, seeding");
        let outcome = match self.orchestrator.generate_foods().await {
            Ok(foods) => {
                let report = self.catalog.insert_many(&foods).await?;
                info!(inserted = report.inserted, skipped = report.skipped, "seeded generated foods");
                SeedOutcome::Generated(report)
            }
            Err(exhausted) => {
                warn!(attempted = exhausted.attempted, "food generation unavailable, using built-in list");
                let report = self.catalog.insert_many(&builtin_foods()).await?;
                info!(inserted = report.inserted, skipped = report.skipped, "seeded built-in foods");
                SeedOutcome::BuiltIn(report)
            }
        };

        self.seeded.store(true, Ordering::Release);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use super::*;
    use crate::ai::orchestrator::testing::{Reply, ScriptedAdapter};
    use crate::foods::catalog::InMemoryFoodCatalog;
    use crate::foods::model::FoodFilter;

    #[tokio::test]
    async fn seeds_builtin_list_once_under_concurrency() {
        let catalog = Arc::new(InMemoryFoodCatalog::new());
        let seeder = Arc::new(CatalogSeeder::new(
            catalog.clone(),
            Arc::new(AiOrchestrator::disabled()),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = seeder.clone();
                tokio::spawn(async move { s.ensure_seeded().await.unwrap() })
            })
            .collect();

        let mut builtin_runs = 0;
        for h in handles {
            if let SeedOutcome::BuiltIn(report) = h.await.unwrap() {
                assert_eq!(report.inserted, 21);
                builtin_runs += 1;
            }
        }
        assert_eq!(builtin_runs, 1);
        assert_eq!(catalog.count().await.unwrap(), 21);
    }

    #[tokio::test]
    async fn prefers_generated_foods() {
        let calls = Arc::new(StdMutex::new(Vec::new()));
        let orchestrator = AiOrchestrator::new(
            vec![ScriptedAdapter::new(
                "openai",
                vec![Reply::Text(
                    r#"{"foods":[{"name":"Nihari","calories":210,"mealType":["dinner"]},{"name":"Haleem","calories":180}]}"#.into(),
                )],
                calls,
            )],
            Duration::from_secs(5),
        );
        let catalog = Arc::new(InMemoryFoodCatalog::new());
        let seeder = CatalogSeeder::new(catalog.clone(), Arc::new(orchestrator));

        let outcome = seeder.ensure_seeded().await.unwrap();
        assert_eq!(
            outcome,
            SeedOutcome::Generated(InsertReport { inserted: 2, skipped: 0 })
        );
        let names: Vec<_> = catalog
            .query(&FoodFilter::all())
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Haleem", "Nihari"]);
    }

    #[tokio::test]
    async fn populated_catalog_is_left_alone() {
        let catalog = Arc::new(InMemoryFoodCatalog::with_foods(builtin_foods()[..3].to_vec()));
        let seeder = CatalogSeeder::new(catalog.clone(), Arc::new(AiOrchestrator::disabled()));
        assert_eq!(seeder.ensure_seeded().await.unwrap(), SeedOutcome::AlreadyPopulated);
        assert_eq!(catalog.count().await.unwrap(), 3);
    }
}
