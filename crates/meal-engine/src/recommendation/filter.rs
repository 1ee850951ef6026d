use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::domain::{
    DietaryPattern, MacroBudget, MealCandidate, MealId, RecommendationContext, Restriction,
    UserProfile,
};
use super::keywords;

const KETO_MAX_CARBS_G: f64 = 20.0;
const LOW_CARB_MAX_CARBS_G: f64 = 50.0;
const ELEVATED_BP_MAX_SODIUM_MG: f64 = 600.0;
const HIGH_LDL_MAX_SATURATED_FAT_G: f64 = 7.0;
const HIGH_HBA1C_MAX_CARBS_G: f64 = 45.0;
const MACRO_OVERFLOW_TOLERANCE: f64 = 1.2;

/// Counter bucket a rejected candidate is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectionCategory {
    Duplicates,
    SlotMismatch,
    AllergyConflict,
    IntoleranceConflict,
    DietaryPatternConflict,
    BiomarkerRuleConflict,
    MacroOverflowConflict,
    Other,
}

/// Rejected-candidate counters, one bucket per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredOutCounts {
    pub allergy_conflict: u32,
    pub intolerance_conflict: u32,
    pub dietary_pattern_conflict: u32,
    pub biomarker_rule_conflict: u32,
    pub macro_overflow_conflict: u32,
    pub slot_mismatch: u32,
    pub duplicates: u32,
    pub other: u32,
}

impl FilteredOutCounts {
    pub fn record(&mut self, category: RejectionCategory) {
        let bucket = match category {
            RejectionCategory::Duplicates => &mut self.duplicates,
            RejectionCategory::SlotMismatch => &mut self.slot_mismatch,
            RejectionCategory::AllergyConflict => &mut self.allergy_conflict,
            RejectionCategory::IntoleranceConflict => &mut self.intolerance_conflict,
            RejectionCategory::DietaryPatternConflict => &mut self.dietary_pattern_conflict,
            RejectionCategory::BiomarkerRuleConflict => &mut self.biomarker_rule_conflict,
            RejectionCategory::MacroOverflowConflict => &mut self.macro_overflow_conflict,
            RejectionCategory::Other => &mut self.other,
        };
        *bucket += 1;
    }

    pub fn total(&self) -> u32 {
        self.allergy_conflict
            + self.intolerance_conflict
            + self.dietary_pattern_conflict
            + self.biomarker_rule_conflict
            + self.macro_overflow_conflict
            + self.slot_mismatch
            + self.duplicates
            + self.other
    }
}

/// Why a single candidate was rejected, for audit trails and debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RejectionReason {
    DuplicateId,
    SlotNotOffered,
    AllergenTag { allergy: String },
    AllergenIngredient { allergy: String, ingredient: String },
    Intolerance { intolerance: String, ingredient: String },
    ExcessCarbs { pattern: DietaryPattern, carbs_g: f64, limit_g: f64 },
    ForbiddenIngredient { pattern: DietaryPattern, ingredient: String },
    KosherMeatAndDairy { meat: String, dairy: String },
    RestrictedIngredient { restriction: Restriction, ingredient: String },
    SodiumForBloodPressure { sodium_mg: f64 },
    SaturatedFatForLdl { saturated_fat_g: f64 },
    CarbsForHba1c { carbs_g: f64 },
    MacroOverflow { nutrient: &'static str, value: f64, budget: f64 },
    MalformedNutrition,
}

impl RejectionReason {
    pub fn category(&self) -> RejectionCategory {
        match self {
            RejectionReason::DuplicateId => RejectionCategory::Duplicates,
            RejectionReason::SlotNotOffered => RejectionCategory::SlotMismatch,
            RejectionReason::AllergenTag { .. } | RejectionReason::AllergenIngredient { .. } => {
                RejectionCategory::AllergyConflict
            }
            RejectionReason::Intolerance { .. } => RejectionCategory::IntoleranceConflict,
            RejectionReason::ExcessCarbs { .. }
            | RejectionReason::ForbiddenIngredient { .. }
            | RejectionReason::KosherMeatAndDairy { .. }
            | RejectionReason::RestrictedIngredient { .. } => {
                RejectionCategory::DietaryPatternConflict
            }
            RejectionReason::SodiumForBloodPressure { .. }
            | RejectionReason::SaturatedFatForLdl { .. }
            | RejectionReason::CarbsForHba1c { .. } => RejectionCategory::BiomarkerRuleConflict,
            RejectionReason::MacroOverflow { .. } => RejectionCategory::MacroOverflowConflict,
            RejectionReason::MalformedNutrition => RejectionCategory::Other,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            RejectionReason::DuplicateId => "duplicate meal id".to_string(),
            RejectionReason::SlotNotOffered => "not offered for requested slot".to_string(),
            RejectionReason::AllergenTag { allergy } => format!("tagged allergen {allergy}"),
            RejectionReason::AllergenIngredient {
                allergy,
                ingredient,
            } => format!("ingredient '{ingredient}' matches allergy {allergy}"),
            RejectionReason::Intolerance {
                intolerance,
                ingredient,
            } => format!("ingredient '{ingredient}' matches intolerance {intolerance}"),
            RejectionReason::ExcessCarbs {
                pattern,
                carbs_g,
                limit_g,
            } => format!(
                "{:.1}g carbs exceeds {} limit {:.0}g",
                carbs_g,
                pattern.label(),
                limit_g
            ),
            RejectionReason::ForbiddenIngredient {
                pattern,
                ingredient,
            } => format!("ingredient '{ingredient}' not {}", pattern.label()),
            RejectionReason::KosherMeatAndDairy { meat, dairy } => {
                format!("kosher forbids '{meat}' with '{dairy}'")
            }
            RejectionReason::RestrictedIngredient {
                restriction,
                ingredient,
            } => format!("ingredient '{ingredient}' violates {}", restriction.label()),
            RejectionReason::SodiumForBloodPressure { sodium_mg } => {
                format!("{sodium_mg:.0}mg sodium with elevated blood pressure")
            }
            RejectionReason::SaturatedFatForLdl { saturated_fat_g } => {
                format!("~{saturated_fat_g:.1}g saturated fat with high LDL")
            }
            RejectionReason::CarbsForHba1c { carbs_g } => {
                format!("{carbs_g:.1}g carbs without fiber with high HbA1c")
            }
            RejectionReason::MacroOverflow {
                nutrient,
                value,
                budget,
            } => format!("{nutrient} {value:.1} exceeds 120% of remaining {budget:.1}"),
            RejectionReason::MalformedNutrition => "malformed nutrition facts".to_string(),
        }
    }
}

/// Audit entry for one rejected candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterTrace {
    pub meal_id: MealId,
    pub category: RejectionCategory,
    pub reason: RejectionReason,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub survivors: Vec<MealCandidate>,
    pub counts: FilteredOutCounts,
    pub trace: Vec<FilterTrace>,
    pub rules_applied: Vec<String>,
}

/// Pure safety and compliance screen over a candidate pool.
#[derive(Debug, Clone)]
pub struct ConstraintFilter {
    rules: ProfileRules,
}

#[derive(Debug, Clone)]
struct ProfileRules {
    allergies: Vec<(String, Vec<String>)>,
    intolerances: Vec<(String, Vec<String>)>,
    patterns: Vec<DietaryPattern>,
    restrictions: Vec<Restriction>,
    elevated_bp: bool,
    high_ldl: bool,
    high_hba1c: bool,
}

impl ConstraintFilter {
    pub fn for_profile(profile: &UserProfile) -> Self {
        let allergies = profile
            .allergies
            .iter()
            .map(|allergy| keywords::normalize(allergy))
            .filter(|allergy| !allergy.is_empty())
            .map(|allergy| {
                let table = keywords::allergy_keywords(&allergy);
                let keywords = if table.is_empty() {
                    vec![allergy.replace('_', " ")]
                } else {
                    table.into_iter().map(str::to_string).collect()
                };
                (allergy, keywords)
            })
            .collect();

        let intolerances = profile
            .intolerances
            .iter()
            .map(|intolerance| keywords::normalize(intolerance))
            .filter(|intolerance| !intolerance.is_empty())
            .map(|intolerance| {
                let table = keywords::intolerance_keywords(&intolerance);
                let keywords = if table.is_empty() {
                    vec![intolerance.replace('_', " ")]
                } else {
                    table.into_iter().map(str::to_string).collect()
                };
                (intolerance, keywords)
            })
            .collect();

        Self {
            rules: ProfileRules {
                allergies,
                intolerances,
                patterns: profile
                    .dietary_patterns
                    .iter()
                    .copied()
                    .filter(|pattern| *pattern != DietaryPattern::Unrecognized)
                    .collect(),
                restrictions: profile
                    .restrictions
                    .iter()
                    .copied()
                    .filter(|restriction| *restriction != Restriction::Unrecognized)
                    .collect(),
                elevated_bp: profile.biomarkers.elevated_blood_pressure(),
                high_ldl: profile.biomarkers.high_ldl(),
                high_hba1c: profile.biomarkers.high_hba1c(),
            },
        }
    }

    /// Rule identifiers this filter enforces, in evaluation order.
    pub fn rules_applied(&self, budget: Option<&MacroBudget>) -> Vec<String> {
        let mut rules = vec!["duplicate_id".to_string(), "meal_slot".to_string()];
        rules.extend(
            self.rules
                .allergies
                .iter()
                .map(|(allergy, _)| format!("allergy:{allergy}")),
        );
        rules.extend(
            self.rules
                .intolerances
                .iter()
                .map(|(intolerance, _)| format!("intolerance:{intolerance}")),
        );
        rules.extend(
            self.rules
                .patterns
                .iter()
                .map(|pattern| format!("dietary_pattern:{}", pattern.label())),
        );
        rules.extend(
            self.rules
                .restrictions
                .iter()
                .map(|restriction| format!("restriction:{}", restriction.label())),
        );
        if self.rules.elevated_bp {
            rules.push("biomarker:elevated_bp".to_string());
        }
        if self.rules.high_ldl {
            rules.push("biomarker:high_ldl".to_string());
        }
        if self.rules.high_hba1c {
            rules.push("biomarker:high_hba1c".to_string());
        }
        if budget.is_some() {
            rules.push("macro_overflow".to_string());
        }
        rules
    }

    pub fn apply(
        &self,
        candidates: &[MealCandidate],
        context: &RecommendationContext,
    ) -> FilterOutcome {
        let budget = context.remaining_budget.as_ref();
        let mut seen: HashSet<&MealId> = HashSet::new();
        let mut survivors = Vec::new();
        let mut counts = FilteredOutCounts::default();
        let mut trace = Vec::new();

        for candidate in candidates {
            let verdict = if !seen.insert(&candidate.id) {
                Some(RejectionReason::DuplicateId)
            } else if !candidate.slots.contains(&context.meal_slot) {
                Some(RejectionReason::SlotNotOffered)
            } else {
                self.screen(candidate, budget)
            };

            match verdict {
                Some(reason) => {
                    let category = reason.category();
                    counts.record(category);
                    tracing::debug!(
                        meal_id = %candidate.id,
                        ?category,
                        reason = %reason.summary(),
                        "candidate filtered"
                    );
                    trace.push(FilterTrace {
                        meal_id: candidate.id.clone(),
                        category,
                        reason,
                    });
                }
                None => survivors.push(candidate.clone()),
            }
        }

        FilterOutcome {
            survivors,
            counts,
            trace,
            rules_applied: self.rules_applied(budget),
        }
    }

    /// Content rules only (no duplicate or slot checks); `None` when the candidate passes.
    pub fn screen(
        &self,
        candidate: &MealCandidate,
        budget: Option<&MacroBudget>,
    ) -> Option<RejectionReason> {
        self.allergy_conflict(candidate)
            .or_else(|| self.intolerance_conflict(candidate))
            .or_else(|| self.pattern_conflict(candidate))
            .or_else(|| self.biomarker_conflict(candidate))
            .or_else(|| budget.and_then(|budget| macro_overflow(candidate, budget)))
            .or_else(|| {
                (!candidate.nutrition.is_well_formed()).then_some(RejectionReason::MalformedNutrition)
            })
    }

    fn allergy_conflict(&self, candidate: &MealCandidate) -> Option<RejectionReason> {
        for (allergy, allergy_keywords) in &self.rules.allergies {
            let canonical = keywords::canonical_allergen(allergy);
            let keyword_refs: Vec<&str> = allergy_keywords.iter().map(String::as_str).collect();
            let tagged = candidate.allergens.iter().any(|tag| {
                keywords::canonical_allergen(&keywords::normalize(tag)) == canonical
            }) || keywords::first_match(&candidate.allergens, &keyword_refs).is_some();
            if tagged {
                return Some(RejectionReason::AllergenTag {
                    allergy: allergy.clone(),
                });
            }

            if let Some(ingredient) = keywords::first_match(&candidate.ingredients, &keyword_refs) {
                return Some(RejectionReason::AllergenIngredient {
                    allergy: allergy.clone(),
                    ingredient: ingredient.to_string(),
                });
            }
        }
        None
    }

    fn intolerance_conflict(&self, candidate: &MealCandidate) -> Option<RejectionReason> {
        self.rules
            .intolerances
            .iter()
            .find_map(|(intolerance, intolerance_keywords)| {
                let keyword_refs: Vec<&str> =
                    intolerance_keywords.iter().map(String::as_str).collect();
                keywords::first_match(&candidate.ingredients, &keyword_refs).map(|ingredient| {
                    RejectionReason::Intolerance {
                        intolerance: intolerance.clone(),
                        ingredient: ingredient.to_string(),
                    }
                })
            })
    }

    fn pattern_conflict(&self, candidate: &MealCandidate) -> Option<RejectionReason> {
        self.rules
            .patterns
            .iter()
            .find_map(|pattern| pattern_violation(*pattern, candidate))
            .or_else(|| {
                self.rules
                    .restrictions
                    .iter()
                    .find_map(|restriction| restriction_violation(*restriction, candidate))
            })
    }

    fn biomarker_conflict(&self, candidate: &MealCandidate) -> Option<RejectionReason> {
        let nutrition = &candidate.nutrition;

        if self.rules.elevated_bp {
            if let Some(sodium_mg) = nutrition.sodium_mg {
                if sodium_mg > ELEVATED_BP_MAX_SODIUM_MG {
                    return Some(RejectionReason::SodiumForBloodPressure { sodium_mg });
                }
            }
        }

        if self.rules.high_ldl {
            let saturated_fat_g = nutrition.estimated_saturated_fat_g();
            if saturated_fat_g > HIGH_LDL_MAX_SATURATED_FAT_G {
                return Some(RejectionReason::SaturatedFatForLdl { saturated_fat_g });
            }
        }

        if self.rules.high_hba1c
            && nutrition.carbs_g > HIGH_HBA1C_MAX_CARBS_G
            && !nutrition.has_fiber()
        {
            return Some(RejectionReason::CarbsForHba1c {
                carbs_g: nutrition.carbs_g,
            });
        }

        None
    }
}

fn pattern_violation(
    pattern: DietaryPattern,
    candidate: &MealCandidate,
) -> Option<RejectionReason> {
    let ingredients = &candidate.ingredients;
    let forbidden = |keywords: Vec<&'static str>| {
        keywords::first_match(ingredients, &keywords).map(|ingredient| {
            RejectionReason::ForbiddenIngredient {
                pattern,
                ingredient: ingredient.to_string(),
            }
        })
    };
    let carb_limit = |limit_g: f64| {
        (candidate.nutrition.carbs_g > limit_g).then(|| RejectionReason::ExcessCarbs {
            pattern,
            carbs_g: candidate.nutrition.carbs_g,
            limit_g,
        })
    };

    match pattern {
        DietaryPattern::Vegan => forbidden(keywords::animal_product_keywords()),
        DietaryPattern::Vegetarian => forbidden(keywords::meat_keywords()),
        DietaryPattern::Pescatarian => forbidden(keywords::non_fish_meat_keywords()),
        DietaryPattern::Keto => carb_limit(KETO_MAX_CARBS_G),
        DietaryPattern::LowCarb => carb_limit(LOW_CARB_MAX_CARBS_G),
        DietaryPattern::GlutenFree => forbidden(keywords::gluten_keywords()),
        DietaryPattern::DairyFree => forbidden(keywords::dairy_keywords()),
        DietaryPattern::Halal => forbidden(keywords::halal_forbidden_keywords()),
        DietaryPattern::Kosher => forbidden(keywords::kosher_forbidden_keywords()).or_else(|| {
            let meat = keywords::first_match(ingredients, &keywords::non_fish_meat_keywords())?;
            let dairy = keywords::first_match(ingredients, &keywords::dairy_keywords())?;
            Some(RejectionReason::KosherMeatAndDairy {
                meat: meat.to_string(),
                dairy: dairy.to_string(),
            })
        }),
        DietaryPattern::Unrecognized => None,
    }
}

fn restriction_violation(
    restriction: Restriction,
    candidate: &MealCandidate,
) -> Option<RejectionReason> {
    let keywords = match restriction {
        Restriction::NoPork => keywords::pork_keywords(),
        Restriction::NoBeef => keywords::beef_keywords(),
        Restriction::NoShellfish => keywords::shellfish_keywords(),
        Restriction::NoAlcohol => keywords::alcohol_keywords(),
        Restriction::Unrecognized => return None,
    };
    keywords::first_match(&candidate.ingredients, &keywords).map(|ingredient| {
        RejectionReason::RestrictedIngredient {
            restriction,
            ingredient: ingredient.to_string(),
        }
    })
}

fn macro_overflow(candidate: &MealCandidate, budget: &MacroBudget) -> Option<RejectionReason> {
    let nutrition = &candidate.nutrition;
    let checks = [
        ("kcal", Some(nutrition.kcal), budget.kcal),
        ("protein_g", Some(nutrition.protein_g), budget.protein_g),
        ("carbs_g", Some(nutrition.carbs_g), budget.carbs_g),
        ("fat_g", Some(nutrition.fat_g), budget.fat_g),
        ("sodium_mg", nutrition.sodium_mg, budget.sodium_mg),
    ];

    checks.into_iter().find_map(|(nutrient, value, limit)| {
        let (value, budget) = (value?, limit?);
        (value > budget * MACRO_OVERFLOW_TOLERANCE).then_some(RejectionReason::MacroOverflow {
            nutrient,
            value,
            budget,
        })
    })
}
