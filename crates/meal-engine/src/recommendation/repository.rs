use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ArmState, BetaArm, MealId, MealSlot, UserId};
use super::filter::FilteredOutCounts;

/// Bandit arm storage keyed by user; implementations must tolerate concurrent callers.
pub trait BanditStateStore: Send + Sync {
    fn get(&self, user_id: &UserId) -> Result<ArmState, StoreError>;
    fn set(
        &self,
        user_id: &UserId,
        arm_key: &str,
        alpha: f64,
        beta: f64,
    ) -> Result<(), StoreError>;
}

/// Append-only log of issued recommendations.
pub trait RecommendationHistoryStore: Send + Sync {
    fn append(&self, record: RecommendationHistoryRecord) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedMeal {
    pub meal_id: MealId,
    pub score: f64,
}

/// History entry written once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationHistoryRecord {
    pub request_id: String,
    pub user_id: UserId,
    pub meal_slot: MealSlot,
    pub recommended: Vec<RecommendedMeal>,
    pub fallback_invoked: bool,
    pub filtered_out: FilteredOutCounts,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected write for {key}: {reason}")]
    Rejected { key: String, reason: String },
}

#[derive(Default, Clone)]
pub struct InMemoryBanditStore {
    arms: Arc<Mutex<HashMap<UserId, ArmState>>>,
}

impl InMemoryBanditStore {
    pub fn snapshot(&self, user_id: &UserId) -> ArmState {
        self.arms
            .lock()
            .map(|guard| guard.get(user_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl BanditStateStore for InMemoryBanditStore {
    fn get(&self, user_id: &UserId) -> Result<ArmState, StoreError> {
        let guard = self
            .arms
            .lock()
            .map_err(|_| StoreError::Unavailable("bandit store mutex poisoned".to_string()))?;
        Ok(guard.get(user_id).cloned().unwrap_or_default())
    }

    fn set(
        &self,
        user_id: &UserId,
        arm_key: &str,
        alpha: f64,
        beta: f64,
    ) -> Result<(), StoreError> {
        if !alpha.is_finite() || !beta.is_finite() {
            return Err(StoreError::Rejected {
                key: arm_key.to_string(),
                reason: "non-finite parameters".to_string(),
            });
        }
        let mut guard = self
            .arms
            .lock()
            .map_err(|_| StoreError::Unavailable("bandit store mutex poisoned".to_string()))?;
        guard
            .entry(user_id.clone())
            .or_insert_with(BTreeMap::new)
            .insert(arm_key.to_string(), BetaArm::new(alpha, beta));
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryHistoryStore {
    records: Arc<Mutex<Vec<RecommendationHistoryRecord>>>,
}

impl InMemoryHistoryStore {
    pub fn records(&self) -> Vec<RecommendationHistoryRecord> {
        self.records
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl RecommendationHistoryStore for InMemoryHistoryStore {
    fn append(&self, record: RecommendationHistoryRecord) -> Result<(), StoreError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| StoreError::Unavailable("history store mutex poisoned".to_string()))?;
        guard.push(record);
        Ok(())
    }
}
