use serde::{Deserialize, Serialize};

use super::domain::{MacroBudget, MealCandidate, RecommendationContext};
use super::keywords;

pub const MIN_PORTION_MULTIPLIER: f64 = 0.6;
pub const MAX_PORTION_MULTIPLIER: f64 = 1.0;
const SUBSTITUTION_SODIUM_THRESHOLD_MG: f64 = 800.0;

/// Advisory ingredient swap; nutrition numbers are not recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustments {
    pub portion_multiplier: f64,
    pub substitutions: Vec<Substitution>,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            portion_multiplier: MAX_PORTION_MULTIPLIER,
            substitutions: Vec::new(),
        }
    }
}

pub fn adjust(candidate: &MealCandidate, context: &RecommendationContext) -> Adjustments {
    let portion_multiplier = context
        .remaining_budget
        .as_ref()
        .map(|budget| portion_multiplier(candidate, budget))
        .unwrap_or(MAX_PORTION_MULTIPLIER);

    let substitutions = if context.allow_substitutions {
        sodium_substitutions(candidate)
    } else {
        Vec::new()
    };

    Adjustments {
        portion_multiplier,
        substitutions,
    }
}

/// Smallest budget/serving ratio across over-budget macros, applied only inside [0.6, 1.0].
pub fn portion_multiplier(candidate: &MealCandidate, budget: &MacroBudget) -> f64 {
    let nutrition = &candidate.nutrition;
    let pairs = [
        (nutrition.kcal, budget.kcal),
        (nutrition.protein_g, budget.protein_g),
        (nutrition.carbs_g, budget.carbs_g),
        (nutrition.fat_g, budget.fat_g),
    ];

    let ratio = pairs
        .into_iter()
        .filter_map(|(serving, target)| {
            let target = target?;
            (serving > target && serving > 0.0).then(|| target.max(0.0) / serving)
        })
        .fold(None, |lowest: Option<f64>, ratio| {
            Some(lowest.map_or(ratio, |lowest| lowest.min(ratio)))
        });

    match ratio {
        Some(ratio) if (MIN_PORTION_MULTIPLIER..=MAX_PORTION_MULTIPLIER).contains(&ratio) => {
            let rounded = (ratio * 100.0).round() / 100.0;
            rounded.clamp(MIN_PORTION_MULTIPLIER, MAX_PORTION_MULTIPLIER)
        }
        _ => MAX_PORTION_MULTIPLIER,
    }
}

fn sodium_substitutions(candidate: &MealCandidate) -> Vec<Substitution> {
    let sodium_mg = match candidate.nutrition.sodium_mg {
        Some(sodium_mg) if sodium_mg > SUBSTITUTION_SODIUM_THRESHOLD_MG => sodium_mg,
        _ => return Vec::new(),
    };

    let substitutions: Vec<Substitution> = candidate
        .ingredients
        .iter()
        .filter_map(|ingredient| {
            let generic = keywords::sodium_substitute_for(ingredient)?;
            let hinted = candidate
                .substitution_hints
                .iter()
                .find(|hint| hint.ingredient.eq_ignore_ascii_case(ingredient))
                .map(|hint| hint.alternative.clone());
            Some(Substitution {
                from: ingredient.clone(),
                to: hinted.unwrap_or_else(|| generic.to_string()),
            })
        })
        .collect();

    if !substitutions.is_empty() {
        tracing::debug!(
            meal_id = %candidate.id,
            sodium_mg,
            count = substitutions.len(),
            "proposed lower-sodium substitutions"
        );
    }
    substitutions
}
