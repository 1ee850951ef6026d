//! Candidate pool import from CSV or JSON exports.
//!
//! CSV list columns (`slots`, `tags`, `ingredients`, `allergens`) are `|`-separated.
//! `substitutions` holds `ingredient=alternative` pairs, also `|`-separated.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use super::domain::{MealCandidate, MealId, MealSlot, Nutrition, SubstitutionHint};

const LIST_SEPARATOR: char = '|';

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid catalog JSON data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}

/// Load a catalog file, choosing the format from the extension (`.json`, otherwise CSV).
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Vec<MealCandidate>, CatalogError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let is_json = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let candidates = if is_json {
        parse_catalog_json(reader)?
    } else {
        parse_catalog_csv(reader)?
    };
    tracing::debug!(path = %path.display(), candidates = candidates.len(), "catalog loaded");
    Ok(candidates)
}

pub fn parse_catalog_json<R: Read>(reader: R) -> Result<Vec<MealCandidate>, CatalogError> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn parse_catalog_csv<R: Read>(reader: R) -> Result<Vec<MealCandidate>, CatalogError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut candidates = Vec::new();

    for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
        let row = record?;
        candidates.push(row.into_candidate(index + 1)?);
    }

    Ok(candidates)
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: String,
    title: String,
    slots: String,
    kcal: f64,
    protein_g: f64,
    carbs_g: f64,
    fat_g: f64,
    #[serde(default)]
    fiber_g: Option<f64>,
    #[serde(default)]
    sodium_mg: Option<f64>,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    cuisine: Option<String>,
    #[serde(default)]
    ingredients: String,
    #[serde(default)]
    allergens: String,
    prep_minutes: u32,
    #[serde(default)]
    substitutions: String,
}

impl CatalogRow {
    fn into_candidate(self, row: usize) -> Result<MealCandidate, CatalogError> {
        if self.id.is_empty() {
            return Err(CatalogError::InvalidRow {
                row,
                reason: "missing meal id".to_string(),
            });
        }

        let slots = split_list(&self.slots)
            .into_iter()
            .map(|raw| {
                parse_slot(&raw).ok_or_else(|| CatalogError::InvalidRow {
                    row,
                    reason: format!("unknown meal slot '{raw}'"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let substitution_hints = split_list(&self.substitutions)
            .into_iter()
            .map(|pair| match pair.split_once('=') {
                Some((ingredient, alternative))
                    if !ingredient.trim().is_empty() && !alternative.trim().is_empty() =>
                {
                    Ok(SubstitutionHint {
                        ingredient: ingredient.trim().to_string(),
                        alternative: alternative.trim().to_string(),
                    })
                }
                _ => Err(CatalogError::InvalidRow {
                    row,
                    reason: format!("substitution '{pair}' must look like ingredient=alternative"),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MealCandidate {
            id: MealId(self.id),
            title: self.title,
            slots,
            nutrition: Nutrition {
                kcal: self.kcal,
                protein_g: self.protein_g,
                carbs_g: self.carbs_g,
                fat_g: self.fat_g,
                fiber_g: self.fiber_g,
                sodium_mg: self.sodium_mg,
            },
            tags: split_list(&self.tags),
            cuisine: self.cuisine.filter(|cuisine| !cuisine.trim().is_empty()),
            ingredients: split_list(&self.ingredients),
            allergens: split_list(&self.allergens),
            prep_minutes: self.prep_minutes,
            substitution_hints,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_slot(raw: &str) -> Option<MealSlot> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "breakfast" => Some(MealSlot::Breakfast),
        "lunch" => Some(MealSlot::Lunch),
        "dinner" => Some(MealSlot::Dinner),
        "snack" => Some(MealSlot::Snack),
        _ => None,
    }
}
