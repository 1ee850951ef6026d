use super::super::domain::{HealthGoal, MealCandidate, MealSlot, UserProfile};

const NEUTRAL: f64 = 0.5;

pub(crate) fn goal_alignment(
    candidate: &MealCandidate,
    profile: &UserProfile,
    portion_multiplier: f64,
) -> (f64, String) {
    let nutrition = &candidate.nutrition;
    let fiber_g = nutrition.fiber_g.unwrap_or(0.0);
    let mut score = NEUTRAL;
    let mut matched = Vec::new();

    for goal in &profile.goals {
        let bonus = match goal {
            HealthGoal::FatLoss => {
                bonus_if(nutrition.protein_g >= 25.0, 0.15)
                    + bonus_if(nutrition.kcal <= 500.0, 0.10)
                    + bonus_if(fiber_g >= 5.0, 0.05)
            }
            HealthGoal::MuscleGain => {
                bonus_if(nutrition.protein_g >= 30.0, 0.20) + bonus_if(nutrition.kcal >= 400.0, 0.05)
            }
            HealthGoal::MetabolicHealth => {
                bonus_if(fiber_g >= 5.0, 0.10) + bonus_if(candidate.has_tag("low_gi"), 0.10)
            }
            HealthGoal::BpControl => bonus_if(
                nutrition.sodium_mg.map(|sodium| sodium <= 500.0).unwrap_or(false),
                0.15,
            ),
            HealthGoal::GlucoseControl => {
                bonus_if(nutrition.carbs_g <= 30.0, 0.15) + bonus_if(fiber_g >= 5.0, 0.05)
            }
            HealthGoal::Unrecognized => 0.0,
        };
        if bonus > 0.0 {
            matched.push(goal.label());
        }
        score += bonus;
    }

    let score = (score * portion_multiplier).clamp(0.0, 1.0);
    let notes = if matched.is_empty() {
        "no goal-specific bonus".to_string()
    } else {
        format!("supports {}", matched.join(", "))
    };
    (score, notes)
}

/// One minus the mean relative error against the slot share of each daily macro target.
pub(crate) fn macro_fit(
    candidate: &MealCandidate,
    profile: &UserProfile,
    slot: MealSlot,
    portion_multiplier: f64,
) -> (f64, String) {
    let Some(targets) = profile.macro_targets.as_ref() else {
        return (NEUTRAL, "no macro targets on profile".to_string());
    };

    let nutrition = &candidate.nutrition;
    let fraction = slot.daily_fraction();
    let errors: Vec<f64> = [
        (nutrition.protein_g, targets.protein_g),
        (nutrition.carbs_g, targets.carbs_g),
        (nutrition.fat_g, targets.fat_g),
    ]
    .into_iter()
    .filter_map(|(actual, daily)| {
        let slot_target = daily? * fraction;
        (slot_target > 0.0)
            .then(|| ((actual * portion_multiplier) - slot_target).abs() / slot_target)
    })
    .collect();

    if errors.is_empty() {
        return (NEUTRAL, "no usable macro targets".to_string());
    }

    let average_error = errors.iter().sum::<f64>() / errors.len() as f64;
    let score = (1.0 - average_error).max(0.0);
    (
        score,
        format!(
            "average macro deviation {:.0}% for {}",
            average_error * 100.0,
            slot.label()
        ),
    )
}

pub(crate) fn taste_match(candidate: &MealCandidate, profile: &UserProfile) -> (f64, String) {
    let taste = &profile.taste;
    if taste.is_empty() {
        return (NEUTRAL, "no taste preferences".to_string());
    }

    let liked_tags = count_tags(candidate, &taste.liked_tags);
    let disliked_tags = count_tags(candidate, &taste.disliked_tags);
    let liked_ingredients = count_ingredients(candidate, &taste.liked_ingredients);
    let disliked_ingredients = count_ingredients(candidate, &taste.disliked_ingredients);

    let score = NEUTRAL + 0.1 * liked_tags as f64 - 0.2 * disliked_tags as f64
        + 0.05 * liked_ingredients as f64
        - 0.15 * disliked_ingredients as f64;

    (
        score.clamp(0.0, 1.0),
        format!(
            "{liked_tags} liked / {disliked_tags} disliked tags, {liked_ingredients} liked / \
             {disliked_ingredients} disliked ingredients"
        ),
    )
}

/// Scales with the requested diversity strength until recent-meal history is tracked.
pub(crate) fn diversity_bonus(diversity_strength: f64) -> (f64, String) {
    (
        diversity_strength.clamp(0.0, 1.0),
        format!("diversity strength {diversity_strength:.2}"),
    )
}

pub(crate) fn prep_time_bonus(prep_minutes: u32) -> (f64, String) {
    let score = match prep_minutes {
        0..=15 => 1.0,
        16..=30 => 0.7,
        31..=45 => 0.5,
        _ => 0.3,
    };
    (score, format!("{prep_minutes} minutes to prepare"))
}

fn bonus_if(condition: bool, bonus: f64) -> f64 {
    if condition {
        bonus
    } else {
        0.0
    }
}

fn count_tags(candidate: &MealCandidate, tags: &[String]) -> usize {
    tags.iter().filter(|tag| candidate.has_tag(tag.trim())).count()
}

fn count_ingredients(candidate: &MealCandidate, wanted: &[String]) -> usize {
    wanted
        .iter()
        .map(|needle| needle.trim().to_lowercase())
        .filter(|needle| !needle.is_empty())
        .filter(|needle| {
            candidate
                .ingredients
                .iter()
                .any(|ingredient| ingredient.to_lowercase().contains(needle.as_str()))
        })
        .count()
}
