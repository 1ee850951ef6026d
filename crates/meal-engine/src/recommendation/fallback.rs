use serde::{Deserialize, Serialize};

use super::domain::{DietaryPattern, MealCandidate, MealId, MealSlot, Nutrition, UserProfile};
use super::filter::ConstraintFilter;

/// Surviving-candidate count below which ranked results are replaced by generic suggestions.
pub const MIN_RANKABLE_CANDIDATES: usize = 3;
const MAX_SUGGESTIONS: usize = 3;
/// Returned only when every generic meal, last resorts included, is screened out.
pub const DIETITIAN_ADVISORY: &str =
    "No generic meal fits every restriction on this profile; please consult your dietitian";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackBlock {
    pub invoked: bool,
    pub reason: Option<String>,
    pub suggestions: Vec<String>,
}

impl FallbackBlock {
    pub fn not_invoked() -> Self {
        Self::default()
    }
}

struct GenericMeal {
    title: &'static str,
    ingredients: &'static [&'static str],
}

const VEGAN_MEALS: &[GenericMeal] = &[
    GenericMeal {
        title: "Lentil and vegetable stew",
        ingredients: &["lentils", "carrot", "celery", "tomato", "olive oil"],
    },
    GenericMeal {
        title: "Quinoa bowl with roasted chickpeas and greens",
        ingredients: &["quinoa", "chickpeas", "spinach", "lemon", "olive oil"],
    },
    GenericMeal {
        title: "Tofu and vegetable stir-fry with brown rice",
        ingredients: &["tofu", "broccoli", "bell pepper", "brown rice", "ginger"],
    },
];

const VEGETARIAN_MEALS: &[GenericMeal] = &[
    GenericMeal {
        title: "Vegetable omelette with whole-grain toast",
        ingredients: &["eggs", "spinach", "tomato", "whole-grain bread"],
    },
    GenericMeal {
        title: "Greek yogurt with berries and oats",
        ingredients: &["greek yogurt", "berries", "oats"],
    },
    GenericMeal {
        title: "Black bean and sweet potato bowl",
        ingredients: &["black beans", "sweet potato", "avocado", "lime"],
    },
];

const OMNIVORE_MEALS: &[GenericMeal] = &[
    GenericMeal {
        title: "Grilled chicken with quinoa and roasted vegetables",
        ingredients: &["chicken breast", "quinoa", "zucchini", "olive oil"],
    },
    GenericMeal {
        title: "Baked salmon with sweet potato and greens",
        ingredients: &["salmon", "sweet potato", "kale", "lemon"],
    },
    GenericMeal {
        title: "Turkey and avocado lettuce wraps",
        ingredients: &["turkey breast", "avocado", "lettuce", "tomato"],
    },
];

const LAST_RESORT_MEALS: &[GenericMeal] = &[
    GenericMeal {
        title: "Steamed seasonal vegetables with plain rice",
        ingredients: &["carrot", "broccoli", "zucchini", "white rice"],
    },
    GenericMeal {
        title: "Baked potato with sauteed spinach",
        ingredients: &["potato", "spinach", "olive oil"],
    },
];

/// Produces generic, screened suggestions when the candidate pool is starved.
#[derive(Debug, Clone, Default)]
pub struct FallbackHandler;

impl FallbackHandler {
    pub fn should_fall_back(surviving: usize) -> bool {
        surviving < MIN_RANKABLE_CANDIDATES
    }

    pub fn respond(
        &self,
        profile: &UserProfile,
        filter: &ConstraintFilter,
        slot: MealSlot,
        surviving: usize,
    ) -> FallbackBlock {
        let menu = if profile.has_pattern(DietaryPattern::Vegan) {
            VEGAN_MEALS
        } else if profile.has_pattern(DietaryPattern::Vegetarian)
            || profile.has_pattern(DietaryPattern::Pescatarian)
        {
            VEGETARIAN_MEALS
        } else {
            OMNIVORE_MEALS
        };

        let mut suggestions = screened(menu, filter, slot, MAX_SUGGESTIONS);
        if suggestions.is_empty() {
            suggestions = screened(LAST_RESORT_MEALS, filter, slot, 1);
        }
        if suggestions.is_empty() {
            tracing::warn!(
                user_id = %profile.user_id.0,
                "every generic meal screened out; returning dietitian advisory"
            );
            suggestions.push(DIETITIAN_ADVISORY.to_string());
        }

        tracing::info!(
            user_id = %profile.user_id.0,
            surviving,
            suggestions = suggestions.len(),
            "candidate pool too small; returning fallback suggestions"
        );

        FallbackBlock {
            invoked: true,
            reason: Some(format!(
                "only {surviving} candidate(s) passed safety and preference filters; at least \
                 {MIN_RANKABLE_CANDIDATES} are needed to rank"
            )),
            suggestions,
        }
    }
}

fn screened(
    menu: &[GenericMeal],
    filter: &ConstraintFilter,
    slot: MealSlot,
    limit: usize,
) -> Vec<String> {
    menu.iter()
        .filter(|meal| filter.screen(&as_candidate(meal, slot), None).is_none())
        .take(limit)
        .map(|meal| meal.title.to_string())
        .collect()
}

/// Generic meals carry no nutrition facts, so only ingredient rules can reject them.
fn as_candidate(meal: &GenericMeal, slot: MealSlot) -> MealCandidate {
    MealCandidate {
        id: MealId(format!("fallback:{}", meal.title)),
        title: meal.title.to_string(),
        slots: vec![slot],
        nutrition: Nutrition::default(),
        tags: Vec::new(),
        cuisine: None,
        ingredients: meal.ingredients.iter().map(|item| item.to_string()).collect(),
        allergens: Vec::new(),
        prep_minutes: 0,
        substitution_hints: Vec::new(),
    }
}
