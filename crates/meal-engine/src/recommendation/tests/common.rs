use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Condvar, Mutex};

use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::recommendation::domain::{
    ArmState, BetaArm, FeedbackEvent, FeedbackSignal, MacroTargets, MealCandidate, MealId,
    MealSlot, Nutrition, RecommendationContext, UserId, UserProfile,
};
use crate::recommendation::repository::{
    BanditStateStore, RecommendationHistoryRecord, RecommendationHistoryStore, StoreError,
};
use crate::recommendation::{recommendation_router, EngineConfig, RecommendationService};

pub(super) const USER: &str = "user-17";

pub(super) fn profile() -> UserProfile {
    UserProfile {
        user_id: UserId(USER.to_string()),
        demographics: Default::default(),
        goals: BTreeSet::new(),
        dietary_patterns: BTreeSet::new(),
        allergies: Vec::new(),
        intolerances: Vec::new(),
        restrictions: BTreeSet::new(),
        biomarkers: Default::default(),
        macro_targets: None,
        taste: Default::default(),
        bandit_arms: ArmState::new(),
    }
}

pub(super) fn profile_with_targets() -> UserProfile {
    let mut profile = profile();
    profile.macro_targets = Some(MacroTargets {
        kcal: Some(2000.0),
        protein_g: Some(120.0),
        carbs_g: Some(200.0),
        fat_g: Some(70.0),
    });
    profile
}

pub(super) fn context(request_id: &str, slot: MealSlot) -> RecommendationContext {
    RecommendationContext {
        request_id: request_id.to_string(),
        timezone: "UTC".to_string(),
        meal_slot: slot,
        remaining_budget: None,
        max_results: 5,
        diversity_strength: 0.0,
        exploration_strength: 0.0,
        allow_substitutions: false,
    }
}

/// A plain lunch/dinner bowl no default rule rejects.
pub(super) fn meal(id: &str) -> MealCandidate {
    MealCandidate {
        id: MealId(id.to_string()),
        title: format!("Meal {id}"),
        slots: vec![MealSlot::Lunch, MealSlot::Dinner],
        nutrition: Nutrition {
            kcal: 480.0,
            protein_g: 32.0,
            carbs_g: 45.0,
            fat_g: 16.0,
            fiber_g: Some(7.0),
            sodium_mg: Some(450.0),
        },
        tags: vec!["high_protein".to_string()],
        cuisine: Some("Mediterranean".to_string()),
        ingredients: vec![
            "chicken breast".to_string(),
            "quinoa".to_string(),
            "spinach".to_string(),
        ],
        allergens: Vec::new(),
        prep_minutes: 20,
        substitution_hints: Vec::new(),
    }
}

pub(super) fn meal_with(id: &str, ingredients: &[&str]) -> MealCandidate {
    let mut candidate = meal(id);
    candidate.ingredients = ingredients.iter().map(|item| item.to_string()).collect();
    candidate
}

pub(super) fn peanut_stir_fry() -> MealCandidate {
    let mut candidate = meal_with(
        "peanut-stir-fry",
        &["chicken thigh", "peanut sauce", "broccoli", "jasmine rice"],
    );
    candidate.title = "Peanut chicken stir-fry".to_string();
    candidate.cuisine = Some("Thai".to_string());
    candidate
}

pub(super) fn catalog() -> Vec<MealCandidate> {
    let mut salmon = meal_with("salmon-bowl", &["salmon", "brown rice", "cucumber", "avocado"]);
    salmon.cuisine = Some("Japanese".to_string());
    salmon.tags = vec!["omega_3".to_string(), "low_gi".to_string()];

    let mut lentil = meal_with("lentil-curry", &["lentils", "tomato", "onion", "coconut milk"]);
    lentil.cuisine = Some("Indian".to_string());
    lentil.tags = vec!["vegan".to_string(), "high_fiber".to_string()];
    lentil.nutrition.protein_g = 18.0;

    let mut omelette = meal_with("veggie-omelette", &["eggs", "spinach", "feta", "tomato"]);
    omelette.slots = vec![MealSlot::Breakfast];
    omelette.cuisine = Some("French".to_string());

    vec![
        meal("chicken-quinoa"),
        salmon,
        lentil,
        omelette,
        peanut_stir_fry(),
    ]
}

pub(super) fn feedback(meal_id: &str, signal: FeedbackSignal) -> FeedbackEvent {
    FeedbackEvent {
        user_id: UserId(USER.to_string()),
        meal_id: MealId(meal_id.to_string()),
        timestamp: Utc
            .with_ymd_and_hms(2025, 3, 4, 12, 30, 0)
            .single()
            .expect("valid timestamp"),
        signal,
        strength: 1.0,
    }
}

pub(super) fn engine_config(seed: u64) -> EngineConfig {
    EngineConfig {
        rng_seed: Some(seed),
        ..EngineConfig::default()
    }
}

pub(super) fn build_service(
    seed: u64,
) -> (
    RecommendationService<MemoryBanditStore, MemoryHistory>,
    Arc<MemoryBanditStore>,
    Arc<MemoryHistory>,
) {
    let bandit = Arc::new(MemoryBanditStore::default());
    let history = Arc::new(MemoryHistory::default());
    let service = RecommendationService::new(bandit.clone(), history.clone(), engine_config(seed));
    (service, bandit, history)
}

#[derive(Default, Clone)]
pub(super) struct MemoryBanditStore {
    pub(super) arms: Arc<Mutex<HashMap<UserId, ArmState>>>,
}

impl MemoryBanditStore {
    pub(super) fn arm(&self, key: &str) -> Option<BetaArm> {
        self.arms
            .lock()
            .expect("bandit mutex poisoned")
            .get(&UserId(USER.to_string()))
            .and_then(|arms| arms.get(key).copied())
    }

    pub(super) fn seed_arm(&self, key: &str, arm: BetaArm) {
        self.arms
            .lock()
            .expect("bandit mutex poisoned")
            .entry(UserId(USER.to_string()))
            .or_default()
            .insert(key.to_string(), arm);
    }
}

impl BanditStateStore for MemoryBanditStore {
    fn get(&self, user_id: &UserId) -> Result<ArmState, StoreError> {
        let guard = self.arms.lock().expect("bandit mutex poisoned");
        Ok(guard.get(user_id).cloned().unwrap_or_default())
    }

    fn set(
        &self,
        user_id: &UserId,
        arm_key: &str,
        alpha: f64,
        beta: f64,
    ) -> Result<(), StoreError> {
        self.arms
            .lock()
            .expect("bandit mutex poisoned")
            .entry(user_id.clone())
            .or_default()
            .insert(arm_key.to_string(), BetaArm { alpha, beta });
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryHistory {
    records: Arc<Mutex<Vec<RecommendationHistoryRecord>>>,
}

impl MemoryHistory {
    pub(super) fn records(&self) -> Vec<RecommendationHistoryRecord> {
        self.records.lock().expect("history mutex poisoned").clone()
    }
}

impl RecommendationHistoryStore for MemoryHistory {
    fn append(&self, record: RecommendationHistoryRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .expect("history mutex poisoned")
            .push(record);
        Ok(())
    }
}

/// Holds every `set` until `open` is called; reads pass straight through.
#[derive(Default)]
pub(super) struct GatedBanditStore {
    pub(super) inner: MemoryBanditStore,
    gate: (Mutex<bool>, Condvar),
}

impl GatedBanditStore {
    pub(super) fn open(&self) {
        let (opened, signal) = &self.gate;
        *opened.lock().expect("gate mutex poisoned") = true;
        signal.notify_all();
    }
}

impl BanditStateStore for GatedBanditStore {
    fn get(&self, user_id: &UserId) -> Result<ArmState, StoreError> {
        self.inner.get(user_id)
    }

    fn set(
        &self,
        user_id: &UserId,
        arm_key: &str,
        alpha: f64,
        beta: f64,
    ) -> Result<(), StoreError> {
        let (opened, signal) = &self.gate;
        let mut guard = opened.lock().expect("gate mutex poisoned");
        while !*guard {
            guard = signal.wait(guard).expect("gate mutex poisoned");
        }
        drop(guard);
        self.inner.set(user_id, arm_key, alpha, beta)
    }
}

pub(super) struct UnavailableBanditStore;

impl BanditStateStore for UnavailableBanditStore {
    fn get(&self, _user_id: &UserId) -> Result<ArmState, StoreError> {
        Err(StoreError::Unavailable("redis offline".to_string()))
    }

    fn set(
        &self,
        _user_id: &UserId,
        _arm_key: &str,
        _alpha: f64,
        _beta: f64,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("redis offline".to_string()))
    }
}

pub(super) struct UnavailableHistory;

impl RecommendationHistoryStore for UnavailableHistory {
    fn append(&self, _record: RecommendationHistoryRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("warehouse offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn recommendation_router_with_service(
    service: Arc<RecommendationService<MemoryBanditStore, MemoryHistory>>,
) -> axum::Router {
    recommendation_router(service)
}
