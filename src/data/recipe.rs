//! Recipe records as returned by TheMealDB

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Number of numbered ingredient slots in a full recipe record
const INGREDIENT_SLOTS: usize = 20;

/// A single recipe record
///
/// Only the fields the application reads are typed. Everything else, such as
/// the numbered `strIngredientN`/`strMeasureN` pairs, is kept in `extra` so a
/// record written to the cache or favorites file reads back unchanged.
/// Filter endpoints return partial records with only id, name and thumbnail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Unique identifier, e.g. "52772"
    #[serde(rename = "idMeal")]
    pub id: String,
    /// Display name
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strCategory", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "strArea", default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(rename = "strInstructions", default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(rename = "strMealThumb", default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Comma separated tags
    #[serde(rename = "strTags", default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(rename = "strYoutube", default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    /// Remaining fields of the record
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Recipe {
    /// Creates a minimal recipe with only an id and a name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: None,
            area: None,
            instructions: None,
            thumbnail: None,
            tags: None,
            youtube: None,
            extra: BTreeMap::new(),
        }
    }

    /// Sets the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Returns the non-blank (ingredient, measure) pairs in slot order
    ///
    /// The measure is an empty string when the record has none for a slot.
    pub fn ingredients(&self) -> Vec<(String, String)> {
        (1..=INGREDIENT_SLOTS)
            .filter_map(|i| {
                let ingredient = self.text_field(&format!("strIngredient{}", i))?;
                let measure = self
                    .text_field(&format!("strMeasure{}", i))
                    .unwrap_or_default();
                Some((ingredient, measure))
            })
            .collect()
    }

    /// Tags split on commas, trimmed, blanks dropped
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn text_field(&self, field: &str) -> Option<String> {
        match self.extra.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}
