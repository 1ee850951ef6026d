use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::adjuster::Adjustments;
use super::domain::{BetaArm, MealId};
use super::fallback::FallbackBlock;
use super::filter::FilteredOutCounts;
use super::scoring::ScoringWeights;

pub const RESPONSE_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRecommendation {
    pub meal_id: MealId,
    pub score: f64,
    pub reasons: Vec<String>,
    pub adjustments: Adjustments,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanditUpdates {
    pub applied: bool,
    pub arms: BTreeMap<String, BetaArm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditBlock {
    pub rules_applied: Vec<String>,
    pub scoring_weights: ScoringWeights,
}

/// Stable response contract returned by `recommend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub version: String,
    pub request_id: String,
    pub filtered_out_counts: FilteredOutCounts,
    pub recommendations: Vec<MealRecommendation>,
    pub fallback: FallbackBlock,
    pub bandit_updates: BanditUpdates,
    pub audit: AuditBlock,
}
