use std::sync::Arc;

use time::Date;
use tracing::{info, instrument};
use uuid::Uuid;

use super::assembler::{assemble, PlanSource};
use super::candidates::select_candidates;
use super::composer::{RandomSource, RuleBasedMealComposer};
use super::model::StoredDietPlan;
use super::repo::DietPlanStore;
use crate::ai::AiOrchestrator;
use crate::error::PlanError;
use crate::foods::catalog::FoodCatalog;
use crate::foods::seeder::CatalogSeeder;
use crate::nutrition::compute_targets;
use crate::profiles::Profile;

/// Generates and stores one plan per (user, date).
///
/// Targets are computed first and a bad profile stops there. The catalog is
/// seeded if empty, then the generative backends are tried in order; when
/// all of them fail the rule-based composer builds the plan from the same
/// candidate foods. Nothing is persisted unless a plan was produced.
pub struct DietPlanService {
    catalog: Arc<dyn FoodCatalog>,
    store: Arc<dyn DietPlanStore>,
    orchestrator: Arc<AiOrchestrator>,
    seeder: CatalogSeeder,
    composer: RuleBasedMealComposer,
    random: RandomSource,
}

impl DietPlanService {
    pub fn new(
        catalog: Arc<dyn FoodCatalog>,
        store: Arc<dyn DietPlanStore>,
        orchestrator: Arc<AiOrchestrator>,
        random: RandomSource,
    ) -> Self {
        let seeder = CatalogSeeder::new(catalog.clone(), orchestrator.clone());
        Self {
            catalog,
            store,
            orchestrator,
            seeder,
            composer: RuleBasedMealComposer,
            random,
        }
    }

    #[instrument(skip(self, profile), fields(%user_id, %date))]
    pub async fn generate(
        &self,
        user_id: Uuid,
        profile: &Profile,
        date: Date,
    ) -> Result<StoredDietPlan, PlanError> {
        let targets = compute_targets(profile)?;
        info!(daily_calories = targets.daily_calories, "computed targets");

        self.seeder.ensure_seeded().await?;

        let foods = select_candidates(self.catalog.as_ref(), profile).await?;
        if foods.is_empty() {
            return Err(PlanError::FoodCatalogExhausted);
        }

        let source = match self.orchestrator.generate_plan(profile, &targets, &foods).await {
            Ok(plan) => PlanSource::Generated(plan),
            Err(exhausted) => {
                info!(attempted = exhausted.attempted, "using rule-based composer");
                let mut rng = self.random.rng();
                PlanSource::RuleBased(self.composer.compose(&targets, &foods, &mut rng)?)
            }
        };

        let plan = assemble(date, targets, source);
        let stored = self.store.upsert(user_id, &plan).await?;
        info!(
            plan_id = %stored.id,
            generated_by_ai = stored.plan.generated_by_ai,
            meals = stored.plan.meals.len(),
            "diet plan stored"
        );
        Ok(stored)
    }

    pub async fn find(&self, user_id: Uuid, date: Date) -> Result<Option<StoredDietPlan>, PlanError> {
        Ok(self.store.find(user_id, date).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::ai::orchestrator::testing::{plan_json, Reply, ScriptedAdapter};
    use crate::ai::ProviderAdapter;
    use crate::foods::catalog::InMemoryFoodCatalog;
    use crate::plans::model::MealType;
    use crate::plans::repo::InMemoryDietPlanStore;
    use crate::profiles::model::{ActivityLevel, Gender};
    use time::macros::date;

    fn profile() -> Profile {
        Profile {
            age: Some(30),
            gender: Some(Gender::Male),
            weight: Some(70.0),
            height: Some(175.0),
            activity_level: Some(ActivityLevel::ModeratelyActive),
            ..Profile::default()
        }
    }

    fn service(
        adapters: Vec<Arc<dyn ProviderAdapter>>,
    ) -> (DietPlanService, Arc<InMemoryFoodCatalog>, Arc<InMemoryDietPlanStore>) {
        let catalog = Arc::new(InMemoryFoodCatalog::new());
        let store = Arc::new(InMemoryDietPlanStore::new());
        let orchestrator = Arc::new(AiOrchestrator::new(adapters, Duration::from_secs(5)));
        let svc = DietPlanService::new(
            catalog.clone(),
            store.clone(),
            orchestrator,
            RandomSource::Seeded(42),
        );
        (svc, catalog, store)
    }

    #[tokio::test]
    async fn no_providers_seeds_builtin_and_composes_rule_based_plan() {
        let (svc, catalog, store) = service(vec![]);
        let user = Uuid::new_v4();

        let stored = svc.generate(user, &profile(), date!(2025 - 01 - 02)).await.unwrap();

        assert_eq!(catalog.count().await.unwrap(), 21);
        assert!(!stored.plan.generated_by_ai);
        assert_eq!(stored.plan.targets.daily_calories, 2628);
        let slots: Vec<_> = stored.plan.meals.iter().map(|m| m.meal_type).collect();
        assert_eq!(slots, MealType::ALL.to_vec());
        let snack = stored.plan.meals.last().unwrap();
        assert_eq!(snack.notes.as_deref(), Some("Healthy snack option"));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn regenerating_the_same_day_overwrites_in_place() {
        let (svc, _catalog, store) = service(vec![]);
        let user = Uuid::new_v4();
        let day = date!(2025 - 01 - 02);

        let first = svc.generate(user, &profile(), day).await.unwrap();
        let second = svc.generate(user, &profile(), day).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.count().await, 1);
        assert_eq!(svc.find(user, day).await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn first_failing_provider_falls_back_to_second() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (svc, catalog, _store) = service(vec![
            ScriptedAdapter::new("openai", vec![Reply::Fail], calls.clone()),
            ScriptedAdapter::new("gemini", vec![Reply::Text(plan_json())], calls.clone()),
        ]);
        catalog
            .insert_many(&crate::foods::builtin::builtin_foods())
            .await
            .unwrap();

        let stored = svc
            .generate(Uuid::new_v4(), &profile(), date!(2025 - 01 - 03))
            .await
            .unwrap();

        assert!(stored.plan.generated_by_ai);
        assert_eq!(stored.plan.meals.len(), 1);
        assert_eq!(stored.plan.meals[0].items[0].name, "Daal");
        // targets backfilled from the computed values
        assert_eq!(stored.plan.targets.daily_calories, 2628);
        assert_eq!(*calls.lock().unwrap(), vec!["openai", "gemini"]);
    }

    #[tokio::test]
    async fn rejected_output_everywhere_falls_back_to_rules() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let (svc, catalog, _store) = service(vec![
            ScriptedAdapter::new("openai", vec![Reply::Text("[]".into())], calls.clone()),
            ScriptedAdapter::new("qwen", vec![Reply::Text(r#"{"meals":[]}"#.into())], calls.clone()),
        ]);
        catalog
            .insert_many(&crate::foods::builtin::builtin_foods())
            .await
            .unwrap();

        let stored = svc
            .generate(Uuid::new_v4(), &profile(), date!(2025 - 01 - 04))
            .await
            .unwrap();

        assert!(!stored.plan.generated_by_ai);
        assert_eq!(stored.plan.meals.len(), 4);
        assert_eq!(*calls.lock().unwrap(), vec!["openai", "qwen"]);
    }

    #[tokio::test]
    async fn invalid_profile_fails_before_any_work() {
        let (svc, catalog, store) = service(vec![]);
        let broken = Profile {
            age: None,
            ..profile()
        };

        let err = svc
            .generate(Uuid::new_v4(), &broken, date!(2025 - 01 - 02))
            .await
            .unwrap_err();

        assert!(matches!(err, PlanError::InvalidProfile(_)));
        assert_eq!(catalog.count().await.unwrap(), 0);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn catalog_with_only_unusable_foods_is_exhausted() {
        let (svc, catalog, store) = service(vec![]);
        let mut bad = crate::foods::builtin::builtin_foods()[0].clone();
        bad.typical_serving = 0.0;
        catalog.insert_many(&[bad]).await.unwrap();

        let err = svc
            .generate(Uuid::new_v4(), &profile(), date!(2025 - 01 - 02))
            .await
            .unwrap_err();

        assert!(matches!(err, PlanError::FoodCatalogExhausted));
        assert_eq!(store.count().await, 0);
    }
}
