use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use chrono::Utc;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::adjuster;
use super::domain::{
    ArmState, BetaArm, FeedbackEvent, MealCandidate, RecommendationContext, UserId, UserProfile,
};
use super::exploration::{ArmDelta, ExplorationEngine};
use super::fallback::{FallbackBlock, FallbackHandler};
use super::filter::ConstraintFilter;
use super::repository::{
    BanditStateStore, RecommendationHistoryRecord, RecommendationHistoryStore, RecommendedMeal,
};
use super::response::{
    AuditBlock, BanditUpdates, MealRecommendation, RecommendationResponse, RESPONSE_VERSION,
};
use super::scoring::{ScoringEngine, ScoringWeights};

/// Tunables for the recommendation service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    pub scoring_weights: ScoringWeights,
    /// Fixed seed for the exploration sampler; entropy-seeded when absent.
    pub rng_seed: Option<u64>,
}

/// Linear request lifecycle, logged as the pipeline advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    FeedbackApplied,
    Filtered,
    Fallback,
    Scored,
    Ranked,
    Persisted,
    Done,
}

/// Service composing the filter, adjuster, scorer, exploration engine, and stores.
pub struct RecommendationService<B, H> {
    bandit_store: Arc<B>,
    history: Arc<H>,
    scoring: ScoringEngine,
    exploration: ExplorationEngine,
    fallback: FallbackHandler,
    rng: Mutex<ChaCha8Rng>,
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl<B, H> RecommendationService<B, H>
where
    B: BanditStateStore + 'static,
    H: RecommendationHistoryStore + 'static,
{
    pub fn new(bandit_store: Arc<B>, history: Arc<H>, config: EngineConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            bandit_store,
            history,
            scoring: ScoringEngine::new(config.scoring_weights),
            exploration: ExplorationEngine::new(),
            fallback: FallbackHandler,
            rng: Mutex::new(rng),
            user_locks: Mutex::new(HashMap::new()),
            pending_writes: Mutex::new(Vec::new()),
        }
    }

    /// Produce a ranked, safety-filtered response for one meal slot.
    ///
    /// Only structurally invalid requests fail; rejections, fallbacks, and store outages are
    /// reported inside the response or logged.
    pub fn recommend(
        &self,
        profile: &UserProfile,
        context: &RecommendationContext,
        candidates: &[MealCandidate],
        feedback: &[FeedbackEvent],
    ) -> Result<RecommendationResponse, RecommendationError> {
        let context = validate(profile, context)?;
        let request_id = context.request_id.as_str();
        stage(request_id, PipelineStage::Start);

        let baseline = self.load_arms(profile);
        let mut arms = baseline.clone();
        let feedback_outcome =
            self.exploration
                .apply_feedback(&profile.user_id, &mut arms, feedback, candidates);
        let bandit_updates = BanditUpdates {
            applied: !feedback_outcome.is_empty(),
            arms: feedback_outcome
                .deltas
                .keys()
                .filter_map(|key| arms.get(key).map(|arm| (key.clone(), *arm)))
                .collect(),
        };
        stage(request_id, PipelineStage::FeedbackApplied);

        let filter = ConstraintFilter::for_profile(profile);
        let filtered = filter.apply(candidates, &context);
        stage(request_id, PipelineStage::Filtered);

        let mut rules_applied = filtered.rules_applied.clone();
        if bandit_updates.applied {
            rules_applied.push("feedback_update".to_string());
        }

        let (recommendations, fallback) = if FallbackHandler::should_fall_back(
            filtered.survivors.len(),
        ) {
            stage(request_id, PipelineStage::Fallback);
            rules_applied.push("fallback".to_string());
            let block = self.fallback.respond(
                profile,
                &filter,
                context.meal_slot,
                filtered.survivors.len(),
            );
            (Vec::new(), block)
        } else {
            if context.remaining_budget.is_some() {
                rules_applied.push("portion_adjustment".to_string());
            }
            if context.allow_substitutions {
                rules_applied.push("sodium_substitution".to_string());
            }
            rules_applied.push("thompson_sampling".to_string());

            let scored = self.score_all(profile, &context, &filtered.survivors, &arms);
            stage(request_id, PipelineStage::Scored);
            let ranked = rank(scored, context.max_results);
            stage(request_id, PipelineStage::Ranked);
            (ranked, FallbackBlock::not_invoked())
        };

        let response = RecommendationResponse {
            version: RESPONSE_VERSION.to_string(),
            request_id: context.request_id.clone(),
            filtered_out_counts: filtered.counts,
            recommendations,
            fallback,
            bandit_updates,
            audit: AuditBlock {
                rules_applied,
                scoring_weights: self.scoring.weights().clone(),
            },
        };

        self.persist(PersistJob::new(
            profile,
            &context,
            &baseline,
            feedback_outcome.deltas,
            &response,
        ));
        stage(request_id, PipelineStage::Persisted);
        stage(request_id, PipelineStage::Done);
        Ok(response)
    }

    fn load_arms(&self, profile: &UserProfile) -> ArmState {
        let mut arms: ArmState = profile
            .bandit_arms
            .iter()
            .map(|(key, arm)| (key.clone(), BetaArm::new(arm.alpha, arm.beta)))
            .collect();

        match self.bandit_store.get(&profile.user_id) {
            Ok(stored) => {
                for (key, arm) in stored {
                    arms.insert(key, BetaArm::new(arm.alpha, arm.beta));
                }
            }
            Err(error) => {
                tracing::warn!(
                    user_id = %profile.user_id.0,
                    %error,
                    "bandit store read failed; using profile arms"
                );
            }
        }
        arms
    }

    fn score_all(
        &self,
        profile: &UserProfile,
        context: &RecommendationContext,
        survivors: &[MealCandidate],
        arms: &ArmState,
    ) -> Vec<MealRecommendation> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        survivors
            .iter()
            .map(|candidate| {
                let adjustments = adjuster::adjust(candidate, context);
                let exploration_bonus = self.exploration.exploration_bonus(
                    candidate,
                    arms,
                    context.exploration_strength,
                    &mut *rng,
                );
                let card = self.scoring.score(
                    candidate,
                    profile,
                    context,
                    adjustments.portion_multiplier,
                    exploration_bonus,
                );
                MealRecommendation {
                    meal_id: candidate.id.clone(),
                    score: card.total,
                    reasons: card.top_reasons(),
                    adjustments,
                }
            })
            .collect()
    }

    /// Hands the store writes to a background writer so a slow store never delays the
    /// response. Writes for one user serialize on that user's lock.
    fn persist(&self, job: PersistJob) {
        let lock = self.user_lock(&job.user_id);
        let bandit_store = Arc::clone(&self.bandit_store);
        let history = Arc::clone(&self.history);
        let request_id = job.record.request_id.clone();

        let spawned = thread::Builder::new()
            .name("recommendation-persist".to_string())
            .spawn(move || {
                let _serialized = lock.lock().unwrap_or_else(PoisonError::into_inner);
                job.write(bandit_store.as_ref(), history.as_ref());
            });

        match spawned {
            Ok(handle) => {
                let mut pending = self
                    .pending_writes
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                pending.retain(|writer| !writer.is_finished());
                pending.push(handle);
            }
            Err(error) => {
                tracing::warn!(
                    %request_id,
                    %error,
                    "could not start persistence writer; updates dropped"
                );
            }
        }
    }

    fn user_lock(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(user_id.clone()).or_default().clone()
    }
}

impl<B, H> RecommendationService<B, H> {
    /// Blocks until every queued store write has finished.
    pub fn wait_for_persistence(&self) {
        let writers = std::mem::take(
            &mut *self
                .pending_writes
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for writer in writers {
            if writer.join().is_err() {
                tracing::error!("recommendation persistence writer panicked");
            }
        }
    }
}

impl<B, H> Drop for RecommendationService<B, H> {
    fn drop(&mut self) {
        self.wait_for_persistence();
    }
}

/// Everything the background writer needs, detached from the request borrows.
struct PersistJob {
    user_id: UserId,
    baseline: ArmState,
    deltas: BTreeMap<String, ArmDelta>,
    record: RecommendationHistoryRecord,
}

impl PersistJob {
    fn new(
        profile: &UserProfile,
        context: &RecommendationContext,
        baseline: &ArmState,
        deltas: BTreeMap<String, ArmDelta>,
        response: &RecommendationResponse,
    ) -> Self {
        let baseline = deltas
            .keys()
            .filter_map(|key| baseline.get(key).map(|arm| (key.clone(), *arm)))
            .collect();
        let record = RecommendationHistoryRecord {
            request_id: response.request_id.clone(),
            user_id: profile.user_id.clone(),
            meal_slot: context.meal_slot,
            recommended: response
                .recommendations
                .iter()
                .map(|recommendation| RecommendedMeal {
                    meal_id: recommendation.meal_id.clone(),
                    score: recommendation.score,
                })
                .collect(),
            fallback_invoked: response.fallback.invoked,
            filtered_out: response.filtered_out_counts.clone(),
            created_at: Utc::now(),
        };

        Self {
            user_id: profile.user_id.clone(),
            baseline,
            deltas,
            record,
        }
    }

    /// Re-reads stored arms and applies this request's increments; failures are logged.
    fn write<B, H>(self, bandit_store: &B, history: &H)
    where
        B: BanditStateStore + ?Sized,
        H: RecommendationHistoryStore + ?Sized,
    {
        let user_id = &self.user_id;

        if !self.deltas.is_empty() {
            match bandit_store.get(user_id) {
                Ok(current) => {
                    for (key, delta) in &self.deltas {
                        let mut arm = current
                            .get(key)
                            .or_else(|| self.baseline.get(key))
                            .map(|arm| BetaArm::new(arm.alpha, arm.beta))
                            .unwrap_or(BetaArm::PRIOR);
                        arm.reinforce(delta.alpha, delta.beta);
                        if let Err(error) = bandit_store.set(user_id, key, arm.alpha, arm.beta) {
                            tracing::warn!(
                                user_id = %user_id.0,
                                arm = %key,
                                %error,
                                "failed to persist bandit arm"
                            );
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        user_id = %user_id.0,
                        %error,
                        "bandit store unavailable; arm updates dropped"
                    );
                }
            }
        }

        let request_id = self.record.request_id.clone();
        if let Err(error) = history.append(self.record) {
            tracing::warn!(
                %request_id,
                %error,
                "failed to append recommendation history"
            );
        }
    }
}

fn stage(request_id: &str, stage: PipelineStage) {
    tracing::debug!(request_id, ?stage, "recommendation pipeline");
}

/// Descending by score, ties broken by meal id so equal scores rank deterministically.
fn rank(mut scored: Vec<MealRecommendation>, max_results: usize) -> Vec<MealRecommendation> {
    scored.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then_with(|| left.meal_id.cmp(&right.meal_id))
    });
    scored.truncate(max_results);
    scored
}

fn validate(
    profile: &UserProfile,
    context: &RecommendationContext,
) -> Result<RecommendationContext, RecommendationError> {
    if context.request_id.trim().is_empty() {
        return Err(RecommendationError::MissingRequestId);
    }
    if profile.user_id.0.trim().is_empty() {
        return Err(RecommendationError::MissingUserId);
    }
    if context.max_results == 0 {
        return Err(RecommendationError::InvalidMaxResults);
    }

    let mut sanitized = context.clone();
    sanitized.diversity_strength = bounded("diversityStrength", context.diversity_strength)?;
    sanitized.exploration_strength =
        bounded("explorationStrength", context.exploration_strength)?;
    Ok(sanitized)
}

fn bounded(field: &'static str, value: f64) -> Result<f64, RecommendationError> {
    if !value.is_finite() {
        return Err(RecommendationError::NonFiniteStrength { field, value });
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        tracing::warn!(field, value, clamped, "strength outside [0, 1] clamped");
    }
    Ok(clamped)
}

/// Structurally invalid requests; everything else is reported inside the response.
#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("requestId must not be blank")]
    MissingRequestId,
    #[error("profile userId must not be blank")]
    MissingUserId,
    #[error("maxResults must be at least 1")]
    InvalidMaxResults,
    #[error("{field} must be a finite number (found {value})")]
    NonFiniteStrength { field: &'static str, value: f64 },
}
