use super::common::*;
use crate::recommendation::domain::{
    BiomarkerSnapshot, DietaryPattern, MacroBudget, MealSlot, Restriction,
};
use crate::recommendation::filter::{ConstraintFilter, RejectionCategory, RejectionReason};

#[test]
fn peanut_allergy_rejects_stir_fry_by_ingredient() {
    let mut profile = profile();
    profile.allergies = vec!["Peanut".to_string()];
    let filter = ConstraintFilter::for_profile(&profile);

    let outcome = filter.apply(&catalog(), &context("req-1", MealSlot::Dinner));

    assert_eq!(outcome.counts.allergy_conflict, 1);
    assert!(outcome
        .survivors
        .iter()
        .all(|candidate| candidate.id.0 != "peanut-stir-fry"));
    match &outcome.trace[..] {
        [.., last] if last.meal_id.0 == "peanut-stir-fry" => match &last.reason {
            RejectionReason::AllergenIngredient {
                allergy,
                ingredient,
            } => {
                assert_eq!(allergy, "peanut");
                assert_eq!(ingredient, "peanut sauce");
            }
            other => panic!("expected allergen ingredient, got {other:?}"),
        },
        other => panic!("unexpected trace {other:?}"),
    }
}

#[test]
fn declared_allergen_tags_match_after_normalization() {
    let mut profile = profile();
    profile.allergies = vec!["tree nuts".to_string()];
    let mut candidate = meal("granola-bowl");
    candidate.allergens = vec!["Tree-Nuts".to_string()];

    let reason = ConstraintFilter::for_profile(&profile)
        .screen(&candidate, None)
        .expect("allergen tag rejects");

    assert_eq!(reason.category(), RejectionCategory::AllergyConflict);
    assert!(matches!(reason, RejectionReason::AllergenTag { .. }));
}

#[test]
fn allergen_tag_aliases_reject_the_canonical_allergy() {
    for (allergy, tag) in [("peanut", "peanuts"), ("dairy", "milk"), ("eggs", "egg")] {
        let mut profile = profile();
        profile.allergies = vec![allergy.to_string()];
        let mut candidate = meal_with("house-stir-fry", &["house stir-fry sauce", "rice"]);
        candidate.allergens = vec![tag.to_string()];

        let reason = ConstraintFilter::for_profile(&profile).screen(&candidate, None);

        assert!(
            matches!(reason, Some(RejectionReason::AllergenTag { .. })),
            "{allergy} allergy should reject tag {tag}, got {reason:?}"
        );
    }
}

#[test]
fn allergen_tags_are_checked_against_the_keyword_table() {
    let mut profile = profile();
    profile.allergies = vec!["dairy".to_string()];
    let mut candidate = meal_with("house-curry", &["curry paste", "rice"]);
    candidate.allergens = vec!["Cow's milk".to_string()];

    let reason = ConstraintFilter::for_profile(&profile).screen(&candidate, None);

    assert!(matches!(reason, Some(RejectionReason::AllergenTag { .. })));
}

#[test]
fn unknown_allergy_matches_its_own_name() {
    let mut profile = profile();
    profile.allergies = vec!["kiwi".to_string()];
    let candidate = meal_with("fruit-salad", &["kiwi slices", "strawberries"]);

    let reason = ConstraintFilter::for_profile(&profile).screen(&candidate, None);

    assert!(matches!(
        reason,
        Some(RejectionReason::AllergenIngredient { .. })
    ));
}

#[test]
fn duplicates_and_slot_mismatches_are_counted_before_content_rules() {
    let mut profile = profile();
    profile.allergies = vec!["egg".to_string()];
    let candidates = vec![meal("a"), meal("a"), catalog()[3].clone()];

    let outcome =
        ConstraintFilter::for_profile(&profile).apply(&candidates, &context("req-2", MealSlot::Lunch));

    assert_eq!(outcome.survivors.len(), 1);
    assert_eq!(outcome.counts.duplicates, 1);
    assert_eq!(outcome.counts.slot_mismatch, 1);
    assert_eq!(outcome.counts.allergy_conflict, 0);
}

#[test]
fn every_candidate_is_either_kept_or_counted_once() {
    let mut profile = profile();
    profile.allergies = vec!["peanut".to_string()];
    profile.dietary_patterns.insert(DietaryPattern::Pescatarian);
    let candidates = catalog();

    let outcome =
        ConstraintFilter::for_profile(&profile).apply(&candidates, &context("req-3", MealSlot::Dinner));

    assert_eq!(
        outcome.survivors.len() + outcome.counts.total() as usize,
        candidates.len()
    );
    assert_eq!(outcome.trace.len(), outcome.counts.total() as usize);
}

#[test]
fn kosher_with_restrictions_excludes_pork_and_shellfish() {
    let mut profile = profile();
    profile.dietary_patterns.insert(DietaryPattern::Kosher);
    profile.restrictions.insert(Restriction::NoPork);
    profile.restrictions.insert(Restriction::NoShellfish);
    let candidates = vec![
        meal_with("pork-chop", &["pork chop", "apple", "green beans"]),
        meal_with("paella", &["rice", "shrimp", "mussels", "saffron"]),
        meal_with("cheeseburger", &["beef patty", "cheddar cheese", "bun"]),
        meal("chicken-quinoa"),
    ];

    let outcome =
        ConstraintFilter::for_profile(&profile).apply(&candidates, &context("req-4", MealSlot::Dinner));

    assert_eq!(outcome.counts.dietary_pattern_conflict, 3);
    let kept: Vec<&str> = outcome
        .survivors
        .iter()
        .map(|candidate| candidate.id.0.as_str())
        .collect();
    assert_eq!(kept, vec!["chicken-quinoa"]);
    assert!(outcome.trace.iter().any(|entry| matches!(
        entry.reason,
        RejectionReason::KosherMeatAndDairy { .. }
    )));
}

#[test]
fn restrictions_apply_without_a_dietary_pattern() {
    let mut profile = profile();
    profile.restrictions.insert(Restriction::NoAlcohol);
    let candidate = meal_with("risotto", &["arborio rice", "white wine", "parmesan"]);

    let reason = ConstraintFilter::for_profile(&profile).screen(&candidate, None);

    match reason {
        Some(RejectionReason::RestrictedIngredient {
            restriction,
            ingredient,
        }) => {
            assert_eq!(restriction, Restriction::NoAlcohol);
            assert_eq!(ingredient, "white wine");
        }
        other => panic!("expected restricted ingredient, got {other:?}"),
    }
}

#[test]
fn vegan_rejects_honey_and_keto_rejects_carbs() {
    let mut vegan = profile();
    vegan.dietary_patterns.insert(DietaryPattern::Vegan);
    let oats = meal_with("overnight-oats", &["rolled oats", "oat milk", "honey"]);
    assert!(ConstraintFilter::for_profile(&vegan)
        .screen(&oats, None)
        .is_some());

    let mut keto = profile();
    keto.dietary_patterns.insert(DietaryPattern::Keto);
    let mut steak = meal_with("steak", &["ribeye steak", "asparagus"]);
    steak.nutrition.carbs_g = 5.0;
    let pasta = meal_with("pasta", &["penne", "tomato"]);
    let filter = ConstraintFilter::for_profile(&keto);
    assert!(filter.screen(&steak, None).is_none());
    assert!(matches!(
        filter.screen(&pasta, None),
        Some(RejectionReason::ExcessCarbs { .. })
    ));
}

#[test]
fn unrecognized_patterns_fire_no_rule() {
    let mut profile = profile();
    profile.dietary_patterns.insert(DietaryPattern::Unrecognized);
    profile.restrictions.insert(Restriction::Unrecognized);
    let filter = ConstraintFilter::for_profile(&profile);

    assert!(filter.screen(&meal("chicken-quinoa"), None).is_none());
    assert_eq!(filter.rules_applied(None), vec!["duplicate_id", "meal_slot"]);
}

#[test]
fn biomarker_rules_reject_sodium_saturated_fat_and_fiberless_carbs() {
    let mut profile = profile();
    profile.biomarkers = BiomarkerSnapshot {
        systolic_bp: Some(142.0),
        ldl_mg_dl: Some(171.0),
        hba1c_percent: Some(7.1),
        ..BiomarkerSnapshot::default()
    };
    let filter = ConstraintFilter::for_profile(&profile);

    let mut salty = meal("ramen");
    salty.nutrition.sodium_mg = Some(1450.0);
    let mut fatty = meal("carbonara");
    fatty.nutrition.fat_g = 34.0;
    let mut starchy = meal("white-rice-bowl");
    starchy.nutrition.carbs_g = 70.0;
    starchy.nutrition.fiber_g = None;
    let mut fibrous = meal("farro-bowl");
    fibrous.nutrition.carbs_g = 70.0;
    let mut unknown_sodium = meal("unlabelled");
    unknown_sodium.nutrition.sodium_mg = None;

    for candidate in [&salty, &fatty, &starchy] {
        let reason = filter.screen(candidate, None).expect("biomarker rejects");
        assert_eq!(reason.category(), RejectionCategory::BiomarkerRuleConflict);
    }
    assert!(filter.screen(&fibrous, None).is_none());
    assert!(filter.screen(&unknown_sodium, None).is_none());
    assert!(filter
        .rules_applied(None)
        .contains(&"biomarker:high_hba1c".to_string()));
}

#[test]
fn macro_overflow_tolerates_twenty_percent() {
    let filter = ConstraintFilter::for_profile(&profile());
    let budget = MacroBudget {
        kcal: Some(400.0),
        ..MacroBudget::default()
    };

    let mut within = meal("within");
    within.nutrition.kcal = 470.0;
    let mut over = meal("over");
    over.nutrition.kcal = 520.0;

    assert!(filter.screen(&within, Some(&budget)).is_none());
    match filter.screen(&over, Some(&budget)) {
        Some(RejectionReason::MacroOverflow {
            nutrient, budget, ..
        }) => {
            assert_eq!(nutrient, "kcal");
            assert_eq!(budget, 400.0);
        }
        other => panic!("expected macro overflow, got {other:?}"),
    }
}

#[test]
fn malformed_nutrition_is_counted_as_other() {
    let mut broken = meal("broken");
    broken.nutrition.kcal = f64::NAN;
    let candidates = vec![broken, meal("fine")];

    let outcome = ConstraintFilter::for_profile(&profile())
        .apply(&candidates, &context("req-5", MealSlot::Lunch));

    assert_eq!(outcome.counts.other, 1);
    assert_eq!(outcome.survivors.len(), 1);
}

#[test]
fn rules_applied_lists_profile_rules_in_evaluation_order() {
    let mut profile = profile();
    profile.allergies = vec!["Shellfish".to_string()];
    profile.intolerances = vec!["lactose".to_string()];
    profile.dietary_patterns.insert(DietaryPattern::Halal);
    profile.restrictions.insert(Restriction::NoBeef);
    let budget = MacroBudget::default();

    let rules = ConstraintFilter::for_profile(&profile).rules_applied(Some(&budget));

    assert_eq!(
        rules,
        vec![
            "duplicate_id",
            "meal_slot",
            "allergy:shellfish",
            "intolerance:lactose",
            "dietary_pattern:halal",
            "restriction:no_beef",
            "macro_overflow",
        ]
    );
}
