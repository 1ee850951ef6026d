use serde::{Deserialize, Serialize};

/// Weights blending the six sub-scores; reported verbatim in the audit block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringWeights {
    pub goal_alignment: f64,
    pub macro_fit: f64,
    pub taste_match: f64,
    pub diversity_bonus: f64,
    pub exploration_bonus: f64,
    pub prep_time_bonus: f64,
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.goal_alignment
            + self.macro_fit
            + self.taste_match
            + self.diversity_bonus
            + self.exploration_bonus
            + self.prep_time_bonus
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            goal_alignment: 0.25,
            macro_fit: 0.20,
            taste_match: 0.10,
            diversity_bonus: 0.10,
            exploration_bonus: 0.30,
            prep_time_bonus: 0.05,
        }
    }
}
