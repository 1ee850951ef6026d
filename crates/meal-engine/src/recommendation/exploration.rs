use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::domain::{ArmState, BetaArm, FeedbackEvent, MealCandidate, MealId, UserId};
use super::keywords;
use super::sampler::ProbabilitySampler;

const TRACKED_TAGS: usize = 3;

/// Granularity of a bandit arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmLevel {
    Meal,
    Cuisine,
    Tag,
}

impl ArmLevel {
    /// Blending weight when averaging arm samples.
    pub fn weight(self) -> f64 {
        match self {
            ArmLevel::Meal => 2.0,
            ArmLevel::Cuisine => 1.0,
            ArmLevel::Tag => 0.5,
        }
    }

    /// Fraction of a feedback event's increment credited to this arm.
    pub fn update_share(self) -> f64 {
        match self {
            ArmLevel::Meal => 1.0,
            ArmLevel::Cuisine => 0.5,
            ArmLevel::Tag => 0.3,
        }
    }
}

pub fn meal_arm(id: &MealId) -> String {
    format!("meal:{}", id.0)
}

pub fn cuisine_arm(cuisine: &str) -> String {
    format!("cuisine:{}", keywords::normalize(cuisine))
}

pub fn tag_arm(tag: &str) -> String {
    format!("tag:{}", keywords::normalize(tag))
}

/// Arms a candidate contributes to: its meal, its cuisine, and its first three tags.
pub fn candidate_arms(candidate: &MealCandidate) -> Vec<(String, ArmLevel)> {
    let mut arms = vec![(meal_arm(&candidate.id), ArmLevel::Meal)];
    if let Some(cuisine) = candidate
        .cuisine
        .as_deref()
        .filter(|cuisine| !cuisine.trim().is_empty())
    {
        arms.push((cuisine_arm(cuisine), ArmLevel::Cuisine));
    }
    arms.extend(
        candidate
            .tags
            .iter()
            .filter(|tag| !tag.trim().is_empty())
            .take(TRACKED_TAGS)
            .map(|tag| (tag_arm(tag), ArmLevel::Tag)),
    );
    arms
}

/// Pseudo-count increments accumulated for one arm during a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmDelta {
    pub alpha: f64,
    pub beta: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackApplication {
    pub applied: usize,
    pub skipped: usize,
    pub deltas: BTreeMap<String, ArmDelta>,
}

impl FeedbackApplication {
    pub fn is_empty(&self) -> bool {
        self.applied == 0
    }
}

/// Hierarchical Thompson sampling over meal, cuisine, and tag arms.
#[derive(Debug, Clone, Default)]
pub struct ExplorationEngine;

impl ExplorationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Weighted mean of one Beta draw per arm, scaled by `strength`.
    ///
    /// Arms are always sampled, even when `strength` is zero, so the random stream advances
    /// identically regardless of the configured strength.
    pub fn exploration_bonus<R: Rng + ?Sized>(
        &self,
        candidate: &MealCandidate,
        arms: &ArmState,
        strength: f64,
        rng: &mut R,
    ) -> f64 {
        let mut sampler = ProbabilitySampler::new(rng);
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;

        for (key, level) in candidate_arms(candidate) {
            let arm = arms.get(&key).copied().unwrap_or(BetaArm::PRIOR);
            weighted_sum += level.weight() * sampler.beta(arm.alpha, arm.beta);
            total_weight += level.weight();
        }

        let sample = if total_weight > 0.0 {
            weighted_sum / total_weight
        } else {
            0.0
        };
        sample * strength
    }

    /// Fold feedback into `arms`, returning the increments applied per arm.
    ///
    /// Events for another user or with a non-positive strength are skipped. Meals missing
    /// from `catalog` only update their `meal:` arm; a duplicated id resolves to its first
    /// occurrence, matching the filter.
    pub fn apply_feedback(
        &self,
        user_id: &UserId,
        arms: &mut ArmState,
        events: &[FeedbackEvent],
        catalog: &[MealCandidate],
    ) -> FeedbackApplication {
        let mut by_id: HashMap<&MealId, &MealCandidate> = HashMap::new();
        for candidate in catalog {
            by_id.entry(&candidate.id).or_insert(candidate);
        }
        let mut outcome = FeedbackApplication::default();

        for event in events {
            if event.user_id != *user_id {
                tracing::warn!(
                    event_user = %event.user_id.0,
                    meal_id = %event.meal_id,
                    "skipping feedback for another user"
                );
                outcome.skipped += 1;
                continue;
            }
            if !event.strength.is_finite() || event.strength <= 0.0 {
                tracing::warn!(
                    meal_id = %event.meal_id,
                    strength = event.strength,
                    "skipping feedback with non-positive strength"
                );
                outcome.skipped += 1;
                continue;
            }

            let (alpha, beta) = event.signal.increments(event.strength);
            let targets = match by_id.get(&event.meal_id) {
                Some(candidate) => candidate_arms(candidate),
                None => vec![(meal_arm(&event.meal_id), ArmLevel::Meal)],
            };
            for (key, level) in targets {
                let share = level.update_share();
                reinforce(arms, &mut outcome.deltas, key, alpha * share, beta * share);
            }
            outcome.applied += 1;
        }

        if outcome.applied > 0 || outcome.skipped > 0 {
            tracing::debug!(
                applied = outcome.applied,
                skipped = outcome.skipped,
                arms = outcome.deltas.len(),
                "feedback folded into bandit arms"
            );
        }
        outcome
    }
}

fn reinforce(
    arms: &mut ArmState,
    deltas: &mut BTreeMap<String, ArmDelta>,
    key: String,
    alpha: f64,
    beta: f64,
) {
    arms.entry(key.clone())
        .or_insert(BetaArm::PRIOR)
        .reinforce(alpha, beta);
    let delta = deltas.entry(key).or_default();
    delta.alpha += alpha;
    delta.beta += beta;
}
