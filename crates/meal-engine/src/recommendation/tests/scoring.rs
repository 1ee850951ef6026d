use super::common::*;
use crate::recommendation::domain::{HealthGoal, MealSlot, TastePreferences};
use crate::recommendation::scoring::{ScoreFactor, ScoringEngine, ScoringWeights};

fn engine() -> ScoringEngine {
    ScoringEngine::new(ScoringWeights::default())
}

fn sub_score(card: &crate::recommendation::scoring::ScoreCard, factor: ScoreFactor) -> f64 {
    card.component(factor).expect("component present").score
}

#[test]
fn default_weights_sum_to_one() {
    let weights = ScoringWeights::default();
    assert!((weights.total() - 1.0).abs() < 1e-9);
}

#[test]
fn missing_profile_data_degrades_to_neutral_scores() {
    let card = engine().score(
        &meal("chicken-quinoa"),
        &profile(),
        &context("req-1", MealSlot::Lunch),
        1.0,
        0.0,
    );

    assert_eq!(sub_score(&card, ScoreFactor::GoalAlignment), 0.5);
    assert_eq!(sub_score(&card, ScoreFactor::MacroFit), 0.5);
    assert_eq!(sub_score(&card, ScoreFactor::TasteMatch), 0.5);
    assert_eq!(sub_score(&card, ScoreFactor::PrepTimeBonus), 0.7);
    // 0.25*0.5 + 0.20*0.5 + 0.10*0.5 + 0.05*0.7
    assert_eq!(card.total, 0.31);
}

#[test]
fn goal_bonuses_reward_matching_nutrition() {
    let mut profile = profile();
    profile.goals.insert(HealthGoal::FatLoss);
    let candidate = meal("chicken-quinoa");

    let card = engine().score(
        &candidate,
        &profile,
        &context("req-2", MealSlot::Lunch),
        1.0,
        0.0,
    );

    // protein >= 25, kcal <= 500, fiber >= 5
    assert!((sub_score(&card, ScoreFactor::GoalAlignment) - 0.8).abs() < 1e-9);
}

#[test]
fn smaller_portions_scale_goal_alignment() {
    let mut profile = profile();
    profile.goals.insert(HealthGoal::MuscleGain);
    let candidate = meal("chicken-quinoa");
    let context = context("req-3", MealSlot::Dinner);

    let full = engine().score(&candidate, &profile, &context, 1.0, 0.0);
    let reduced = engine().score(&candidate, &profile, &context, 0.6, 0.0);

    assert!(
        sub_score(&reduced, ScoreFactor::GoalAlignment)
            < sub_score(&full, ScoreFactor::GoalAlignment)
    );
}

#[test]
fn macro_fit_uses_the_slot_share_of_daily_targets() {
    let profile = profile_with_targets();
    let mut on_target = meal("on-target");
    // 28% of 120/200/70
    on_target.nutrition.protein_g = 33.6;
    on_target.nutrition.carbs_g = 56.0;
    on_target.nutrition.fat_g = 19.6;
    let mut oversized = meal("oversized");
    oversized.nutrition.protein_g = 70.0;
    oversized.nutrition.carbs_g = 130.0;
    oversized.nutrition.fat_g = 45.0;
    let context = context("req-4", MealSlot::Lunch);

    let fit = engine().score(&on_target, &profile, &context, 1.0, 0.0);
    let miss = engine().score(&oversized, &profile, &context, 1.0, 0.0);

    assert!(sub_score(&fit, ScoreFactor::MacroFit) > 0.99);
    assert_eq!(sub_score(&miss, ScoreFactor::MacroFit), 0.0);
}

#[test]
fn taste_preferences_shift_the_taste_score() {
    let mut profile = profile();
    profile.taste = TastePreferences {
        liked_tags: vec!["high_protein".to_string()],
        disliked_tags: Vec::new(),
        liked_ingredients: vec!["quinoa".to_string()],
        disliked_ingredients: vec!["spinach".to_string()],
    };

    let card = engine().score(
        &meal("chicken-quinoa"),
        &profile,
        &context("req-5", MealSlot::Lunch),
        1.0,
        0.0,
    );

    // 0.5 + 0.1 + 0.05 - 0.15
    assert!((sub_score(&card, ScoreFactor::TasteMatch) - 0.5).abs() < 1e-9);
}

#[test]
fn totals_stay_in_unit_range_and_round_to_four_places() {
    let mut profile = profile_with_targets();
    profile.goals.insert(HealthGoal::FatLoss);
    profile.goals.insert(HealthGoal::MetabolicHealth);
    let mut context = context("req-6", MealSlot::Lunch);
    context.diversity_strength = 1.0;

    let card = engine().score(&catalog()[1], &profile, &context, 1.0, 1.0);

    assert!((0.0..=1.0).contains(&card.total));
    assert_eq!(card.total, (card.total * 10_000.0).round() / 10_000.0);
}

#[test]
fn top_reasons_follow_the_strongest_sub_scores() {
    let mut candidate = meal("quick-bowl");
    candidate.prep_minutes = 10;
    let mut context = context("req-7", MealSlot::Lunch);
    context.diversity_strength = 0.9;

    let card = engine().score(&candidate, &profile(), &context, 1.0, 0.0);

    assert_eq!(
        card.top_reasons(),
        vec![
            ScoreFactor::PrepTimeBonus.reason().to_string(),
            ScoreFactor::DiversityBonus.reason().to_string(),
        ]
    );
}
