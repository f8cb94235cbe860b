//! Allergen detection against a fixed keyword table.
//!
//! Matching is case-insensitive substring containment, so "Soybean Oil"
//! triggers Soy even though refined soybean oil is often allergen-safe.

use std::collections::BTreeSet;

/// Allergy name to keyword stems. Fixed: changing it changes results.
pub const ALLERGEN_KEYWORDS: &[(&str, &[&str])] = &[
    ("Peanuts", &["peanut", "groundnut"]),
    (
        "Dairy",
        &["milk", "cheese", "butter", "cream", "whey", "casein", "lactose"],
    ),
    ("Gluten", &["wheat", "barley", "rye", "gluten"]),
    ("Soy", &["soy", "soybean", "tofu"]),
    ("Eggs", &["egg", "albumin"]),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct AllergenDetector;

impl AllergenDetector {
    pub fn new() -> Self {
        Self
    }

    /// Keywords for an allergy. Lookup is by exact name; unknown allergies
    /// match on their own lower-cased name.
    pub fn keywords_for(&self, allergy: &str) -> Vec<String> {
        ALLERGEN_KEYWORDS
            .iter()
            .find(|(name, _)| *name == allergy)
            .map(|(_, stems)| stems.iter().map(|s| s.to_string()).collect())
            .unwrap_or_else(|| vec![allergy.to_lowercase()])
    }

    /// Returns the subset of `user_allergies` found in `ingredients`.
    ///
    /// An empty allergy set means no check is performed and yields an empty set.
    pub fn detect(&self, ingredients: &[String], user_allergies: &BTreeSet<String>) -> BTreeSet<String> {
        if user_allergies.is_empty() {
            return BTreeSet::new();
        }

        let lowered: Vec<String> = ingredients.iter().map(|i| i.to_lowercase()).collect();

        user_allergies
            .iter()
            .filter(|allergy| {
                self.keywords_for(allergy)
                    .iter()
                    .any(|kw| lowered.iter().any(|ing| ing.contains(kw.as_str())))
            })
            .cloned()
            .collect()
    }

    /// Maps free-form user input onto the table's spelling ("dairy" -> "Dairy").
    /// Input with no table entry is returned trimmed and unchanged.
    pub fn canonical_name(input: &str) -> String {
        let trimmed = input.trim();
        ALLERGEN_KEYWORDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
            .map(|(name, _)| name.to_string())
            .unwrap_or_else(|| trimmed.to_string())
    }
}
