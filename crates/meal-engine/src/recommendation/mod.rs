//! Meal recommendation pipeline: safety filtering, portion adjustment, multi-objective
//! scoring, and Thompson-sampling exploration over per-user bandit arms.
//!
//! Safety rules always run before anything preference-driven. A candidate that conflicts with
//! an allergy, intolerance, dietary pattern, restriction, or biomarker rule is never ranked;
//! it only shows up in the filtered-out counters.

pub mod adjuster;
pub mod catalog;
pub mod domain;
pub mod exploration;
pub mod fallback;
pub mod filter;
pub(crate) mod keywords;
pub mod repository;
pub mod response;
pub mod router;
pub(crate) mod sampler;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use adjuster::{Adjustments, Substitution};
pub use catalog::{load_catalog, parse_catalog_csv, parse_catalog_json, CatalogError};
pub use domain::{
    ArmState, BetaArm, BiomarkerSnapshot, Demographics, DietaryPattern, FeedbackEvent,
    FeedbackSignal, HealthGoal, MacroBudget, MacroTargets, MealCandidate, MealId, MealSlot,
    Nutrition, RecommendationContext, Restriction, SubstitutionHint, TastePreferences, UserId,
    UserProfile,
};
pub use exploration::ExplorationEngine;
pub use fallback::{FallbackBlock, FallbackHandler, DIETITIAN_ADVISORY};
pub use filter::{ConstraintFilter, FilteredOutCounts, RejectionCategory};
pub use repository::{
    BanditStateStore, InMemoryBanditStore, InMemoryHistoryStore, RecommendationHistoryRecord,
    RecommendationHistoryStore, RecommendedMeal, StoreError,
};
pub use response::{
    AuditBlock, BanditUpdates, MealRecommendation, RecommendationResponse, RESPONSE_VERSION,
};
pub use router::{recommendation_router, RecommendationRequest};
pub use scoring::{ScoringEngine, ScoringWeights};
pub use service::{EngineConfig, PipelineStage, RecommendationError, RecommendationService};
