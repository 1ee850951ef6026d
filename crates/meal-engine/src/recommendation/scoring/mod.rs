mod config;
mod rules;

pub use config::ScoringWeights;

use serde::{Deserialize, Serialize};

use super::domain::{MealCandidate, MealId, RecommendationContext, UserProfile};

/// Sub-score dimensions, in the order used to break ties between reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreFactor {
    GoalAlignment,
    MacroFit,
    TasteMatch,
    DiversityBonus,
    ExplorationBonus,
    PrepTimeBonus,
}

impl ScoreFactor {
    pub fn reason(self) -> &'static str {
        match self {
            ScoreFactor::GoalAlignment => "Supports your health goals",
            ScoreFactor::MacroFit => "Fits your macro targets",
            ScoreFactor::TasteMatch => "Matches your taste preferences",
            ScoreFactor::DiversityBonus => "Adds variety to your meals",
            ScoreFactor::ExplorationBonus => "Something new worth trying",
            ScoreFactor::PrepTimeBonus => "Quick to prepare",
        }
    }
}

/// Discrete contribution to a candidate's score, kept for audits and reasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub score: f64,
    pub weight: f64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub meal_id: MealId,
    pub total: f64,
    pub components: Vec<ScoreComponent>,
}

impl ScoreCard {
    /// Reasons for the two strongest sub-scores.
    pub fn top_reasons(&self) -> Vec<String> {
        let mut ranked: Vec<&ScoreComponent> = self.components.iter().collect();
        ranked.sort_by(|left, right| right.score.total_cmp(&left.score));
        ranked
            .into_iter()
            .take(2)
            .map(|component| component.factor.reason().to_string())
            .collect()
    }

    pub fn component(&self, factor: ScoreFactor) -> Option<&ScoreComponent> {
        self.components
            .iter()
            .find(|component| component.factor == factor)
    }
}

/// Stateless scorer blending six bounded sub-scores with fixed weights.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// `exploration_bonus` comes from the exploration engine, already scaled by strength.
    pub fn score(
        &self,
        candidate: &MealCandidate,
        profile: &UserProfile,
        context: &RecommendationContext,
        portion_multiplier: f64,
        exploration_bonus: f64,
    ) -> ScoreCard {
        let weights = &self.weights;
        let (goal, goal_notes) = rules::goal_alignment(candidate, profile, portion_multiplier);
        let (fit, fit_notes) =
            rules::macro_fit(candidate, profile, context.meal_slot, portion_multiplier);
        let (taste, taste_notes) = rules::taste_match(candidate, profile);
        let (diversity, diversity_notes) = rules::diversity_bonus(context.diversity_strength);
        let (prep, prep_notes) = rules::prep_time_bonus(candidate.prep_minutes);
        let exploration = exploration_bonus.clamp(0.0, 1.0);

        let components = vec![
            component(ScoreFactor::GoalAlignment, goal, weights.goal_alignment, goal_notes),
            component(ScoreFactor::MacroFit, fit, weights.macro_fit, fit_notes),
            component(ScoreFactor::TasteMatch, taste, weights.taste_match, taste_notes),
            component(
                ScoreFactor::DiversityBonus,
                diversity,
                weights.diversity_bonus,
                diversity_notes,
            ),
            component(
                ScoreFactor::ExplorationBonus,
                exploration,
                weights.exploration_bonus,
                format!("thompson sample {exploration:.3}"),
            ),
            component(ScoreFactor::PrepTimeBonus, prep, weights.prep_time_bonus, prep_notes),
        ];

        let weighted: f64 = components
            .iter()
            .map(|component| component.weight * component.score)
            .sum();

        ScoreCard {
            meal_id: candidate.id.clone(),
            total: round4(weighted.clamp(0.0, 1.0)),
            components,
        }
    }
}

fn component(factor: ScoreFactor, score: f64, weight: f64, notes: String) -> ScoreComponent {
    ScoreComponent {
        factor,
        score,
        weight,
        notes,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
