use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for users.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for catalog meals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MealId(pub String);

impl std::fmt::Display for MealId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealSlot {
    /// Share of the daily macro target allotted to one meal in this slot.
    pub fn daily_fraction(self) -> f64 {
        match self {
            MealSlot::Breakfast | MealSlot::Lunch | MealSlot::Dinner => 0.28,
            MealSlot::Snack => 0.15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
            MealSlot::Snack => "snack",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthGoal {
    #[serde(alias = "weight_loss")]
    FatLoss,
    MuscleGain,
    MetabolicHealth,
    #[serde(alias = "blood_pressure")]
    BpControl,
    #[serde(alias = "blood_sugar")]
    GlucoseControl,
    #[serde(other)]
    Unrecognized,
}

impl HealthGoal {
    pub fn label(self) -> &'static str {
        match self {
            HealthGoal::FatLoss => "fat_loss",
            HealthGoal::MuscleGain => "muscle_gain",
            HealthGoal::MetabolicHealth => "metabolic_health",
            HealthGoal::BpControl => "bp_control",
            HealthGoal::GlucoseControl => "glucose_control",
            HealthGoal::Unrecognized => "unrecognized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryPattern {
    Vegan,
    Vegetarian,
    Pescatarian,
    Keto,
    LowCarb,
    GlutenFree,
    DairyFree,
    Halal,
    Kosher,
    #[serde(other)]
    Unrecognized,
}

impl DietaryPattern {
    pub fn label(self) -> &'static str {
        match self {
            DietaryPattern::Vegan => "vegan",
            DietaryPattern::Vegetarian => "vegetarian",
            DietaryPattern::Pescatarian => "pescatarian",
            DietaryPattern::Keto => "keto",
            DietaryPattern::LowCarb => "low_carb",
            DietaryPattern::GlutenFree => "gluten_free",
            DietaryPattern::DairyFree => "dairy_free",
            DietaryPattern::Halal => "halal",
            DietaryPattern::Kosher => "kosher",
            DietaryPattern::Unrecognized => "unrecognized",
        }
    }
}

/// Cultural or ethical exclusions layered on top of dietary patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Restriction {
    NoPork,
    NoBeef,
    NoShellfish,
    NoAlcohol,
    #[serde(other)]
    Unrecognized,
}

impl Restriction {
    pub fn label(self) -> &'static str {
        match self {
            Restriction::NoPork => "no_pork",
            Restriction::NoBeef => "no_beef",
            Restriction::NoShellfish => "no_shellfish",
            Restriction::NoAlcohol => "no_alcohol",
            Restriction::Unrecognized => "unrecognized",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    #[serde(default)]
    pub age_years: Option<u8>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
}

/// Latest lab and vitals readings relevant to meal safety rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiomarkerSnapshot {
    #[serde(default)]
    pub systolic_bp: Option<f64>,
    #[serde(default)]
    pub diastolic_bp: Option<f64>,
    #[serde(default)]
    pub ldl_mg_dl: Option<f64>,
    #[serde(default)]
    pub hba1c_percent: Option<f64>,
    #[serde(default)]
    pub fasting_glucose_mg_dl: Option<f64>,
}

impl BiomarkerSnapshot {
    pub fn elevated_blood_pressure(&self) -> bool {
        self.systolic_bp.map(|value| value >= 130.0).unwrap_or(false)
            || self.diastolic_bp.map(|value| value >= 80.0).unwrap_or(false)
    }

    pub fn high_ldl(&self) -> bool {
        self.ldl_mg_dl.map(|value| value >= 160.0).unwrap_or(false)
    }

    pub fn high_hba1c(&self) -> bool {
        self.hba1c_percent.map(|value| value >= 6.5).unwrap_or(false)
    }
}

/// Daily calorie and macro targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroTargets {
    #[serde(default)]
    pub kcal: Option<f64>,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub carbs_g: Option<f64>,
    #[serde(default)]
    pub fat_g: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TastePreferences {
    #[serde(default)]
    pub liked_tags: Vec<String>,
    #[serde(default)]
    pub disliked_tags: Vec<String>,
    #[serde(default)]
    pub liked_ingredients: Vec<String>,
    #[serde(default)]
    pub disliked_ingredients: Vec<String>,
}

impl TastePreferences {
    pub fn is_empty(&self) -> bool {
        self.liked_tags.is_empty()
            && self.disliked_tags.is_empty()
            && self.liked_ingredients.is_empty()
            && self.disliked_ingredients.is_empty()
    }
}

/// Beta posterior for one bandit arm. Both parameters stay at or above the uniform prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaArm {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaArm {
    pub const PRIOR: BetaArm = BetaArm {
        alpha: 1.0,
        beta: 1.0,
    };

    pub fn new(alpha: f64, beta: f64) -> Self {
        Self {
            alpha: floor_at_prior(alpha),
            beta: floor_at_prior(beta),
        }
    }

    /// Add non-negative pseudo-counts; negative or non-finite increments are ignored.
    pub fn reinforce(&mut self, alpha_delta: f64, beta_delta: f64) {
        if alpha_delta.is_finite() && alpha_delta > 0.0 {
            self.alpha += alpha_delta;
        }
        if beta_delta.is_finite() && beta_delta > 0.0 {
            self.beta += beta_delta;
        }
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }
}

impl Default for BetaArm {
    fn default() -> Self {
        Self::PRIOR
    }
}

fn floor_at_prior(value: f64) -> f64 {
    if value.is_finite() && value > 1.0 {
        value
    } else {
        1.0
    }
}

pub type ArmState = BTreeMap<String, BetaArm>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: UserId,
    #[serde(default)]
    pub demographics: Demographics,
    #[serde(default)]
    pub goals: BTreeSet<HealthGoal>,
    #[serde(default)]
    pub dietary_patterns: BTreeSet<DietaryPattern>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub intolerances: Vec<String>,
    #[serde(default)]
    pub restrictions: BTreeSet<Restriction>,
    #[serde(default)]
    pub biomarkers: BiomarkerSnapshot,
    #[serde(default)]
    pub macro_targets: Option<MacroTargets>,
    #[serde(default)]
    pub taste: TastePreferences,
    #[serde(default)]
    pub bandit_arms: ArmState,
}

impl UserProfile {
    pub fn has_pattern(&self, pattern: DietaryPattern) -> bool {
        self.dietary_patterns.contains(&pattern)
    }
}

/// Per-serving nutrition facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    pub kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    #[serde(default)]
    pub fiber_g: Option<f64>,
    #[serde(default)]
    pub sodium_mg: Option<f64>,
}

impl Nutrition {
    pub fn is_well_formed(&self) -> bool {
        let required = [self.kcal, self.protein_g, self.carbs_g, self.fat_g];
        let optional = [self.fiber_g, self.sodium_mg];
        required
            .iter()
            .chain(optional.iter().flatten())
            .all(|value| value.is_finite() && *value >= 0.0)
    }

    pub fn estimated_saturated_fat_g(&self) -> f64 {
        self.fat_g * 0.3
    }

    pub fn has_fiber(&self) -> bool {
        self.fiber_g.map(|fiber| fiber > 0.0).unwrap_or(false)
    }
}

/// Candidate-provided replacement for one of its ingredients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionHint {
    pub ingredient: String,
    pub alternative: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealCandidate {
    pub id: MealId,
    pub title: String,
    pub slots: Vec<MealSlot>,
    pub nutrition: Nutrition,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    pub prep_minutes: u32,
    #[serde(default)]
    pub substitution_hints: Vec<SubstitutionHint>,
}

impl MealCandidate {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate.eq_ignore_ascii_case(tag))
    }
}

/// Remaining budget for the slot being planned; unspecified nutrients are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroBudget {
    #[serde(default)]
    pub kcal: Option<f64>,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub carbs_g: Option<f64>,
    #[serde(default)]
    pub fat_g: Option<f64>,
    #[serde(default)]
    pub sodium_mg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationContext {
    pub request_id: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub meal_slot: MealSlot,
    #[serde(default)]
    pub remaining_budget: Option<MacroBudget>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub diversity_strength: f64,
    #[serde(default)]
    pub exploration_strength: f64,
    #[serde(default)]
    pub allow_substitutions: bool,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_max_results() -> usize {
    5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSignal {
    Like,
    Dislike,
    Saved,
    Completed,
}

impl FeedbackSignal {
    /// Returns the (alpha, beta) increments for a full-strength event.
    pub fn increments(self, strength: f64) -> (f64, f64) {
        match self {
            FeedbackSignal::Like | FeedbackSignal::Completed => (strength, 0.0),
            FeedbackSignal::Dislike => (0.0, strength),
            FeedbackSignal::Saved => (0.7 * strength, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub user_id: UserId,
    pub meal_id: MealId,
    pub timestamp: DateTime<Utc>,
    pub signal: FeedbackSignal,
    #[serde(default = "default_strength")]
    pub strength: f64,
}

fn default_strength() -> f64 {
    1.0
}
