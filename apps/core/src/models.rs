use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Letter grade summarizing a packaged food's nutritional quality, as reported
/// by the product database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutriGrade {
    A,
    B,
    C,
    D,
    E,
    #[default]
    Unknown,
}

impl NutriGrade {
    /// Parses the API's grade code (`"a"`..`"e"`, any case). Anything else is `Unknown`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "a" => NutriGrade::A,
            "b" => NutriGrade::B,
            "c" => NutriGrade::C,
            "d" => NutriGrade::D,
            "e" => NutriGrade::E,
            _ => NutriGrade::Unknown,
        }
    }

    /// Returns the display letter, or `N/A` when the grade is unknown.
    pub fn label(&self) -> &'static str {
        match self {
            NutriGrade::A => "A",
            NutriGrade::B => "B",
            NutriGrade::C => "C",
            NutriGrade::D => "D",
            NutriGrade::E => "E",
            NutriGrade::Unknown => "N/A",
        }
    }

    /// Position on a gauge running from E (0) to A (4).
    pub fn gauge_position(&self) -> Option<u8> {
        match self {
            NutriGrade::A => Some(4),
            NutriGrade::B => Some(3),
            NutriGrade::C => Some(2),
            NutriGrade::D => Some(1),
            NutriGrade::E => Some(0),
            NutriGrade::Unknown => None,
        }
    }

    /// Reference colour of the grade band (hex).
    pub fn color(&self) -> Option<&'static str> {
        match self {
            NutriGrade::A => Some("#038141"),
            NutriGrade::B => Some("#85BB2F"),
            NutriGrade::C => Some("#FECB02"),
            NutriGrade::D => Some("#EE8100"),
            NutriGrade::E => Some("#E63E11"),
            NutriGrade::Unknown => None,
        }
    }
}

impl fmt::Display for NutriGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Where a nutrition record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    #[default]
    OpenFoodFacts,
    LocalCache,
    Custom,
}

impl RecordSource {
    pub fn label(&self) -> &'static str {
        match self {
            RecordSource::OpenFoodFacts => "Open Food Facts",
            RecordSource::LocalCache => "local database",
            RecordSource::Custom => "custom ingredients",
        }
    }
}

/// Normalized nutrition data for one product, per 100 g.
///
/// Numeric fields are `None` when the source did not report them. Scoring
/// treats a missing value as zero; display code shows it as `N/A`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionRecord {
    pub name: String,
    pub brand: Option<String>,
    pub category_labels: BTreeSet<String>,
    pub energy_kcal_per_100g: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbohydrates_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub saturated_fat_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sodium_g: Option<f64>,
    pub nutri_grade: NutriGrade,
    pub ingredients_text: String,
    pub image_url: Option<String>,
    pub source: RecordSource,
}

impl NutritionRecord {
    /// Formats an optional nutrient value the way the reports show it.
    pub fn display_value(value: Option<f64>) -> String {
        match value {
            Some(v) if v.fract() == 0.0 => format!("{:.0}", v),
            Some(v) => format!("{}", (v * 100.0).round() / 100.0),
            None => "N/A".to_string(),
        }
    }

    /// One-line nutrition summary, e.g. `Nutella (Ferrero) - 539 kcal, 6.3g protein, 56.3g sugar per 100g`.
    pub fn summary(&self) -> String {
        let brand = self
            .brand
            .as_deref()
            .filter(|b| !b.is_empty())
            .map(|b| format!(" ({})", b))
            .unwrap_or_default();
        format!(
            "{}{} - {} kcal, {}g protein, {}g sugar per 100g",
            self.name,
            brand,
            Self::display_value(self.energy_kcal_per_100g),
            Self::display_value(self.protein_g),
            Self::display_value(self.sugar_g),
        )
    }
}

/// Personal health profile used for allergen checks. Lives for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserProfile {
    /// Free-text health goals.
    #[validate(length(max = 500))]
    pub health_goals: String,
    /// Declared allergies, e.g. `Dairy`, `Gluten`.
    pub allergies: BTreeSet<String>,
    /// Declared dietary preferences, e.g. `Vegan`, `Keto`.
    pub dietary_preferences: BTreeSet<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            health_goals: "Stay healthy".to_string(),
            allergies: BTreeSet::new(),
            dietary_preferences: BTreeSet::new(),
        }
    }
}

impl UserProfile {
    /// Whether an allergen check can be performed at all.
    pub fn has_allergies(&self) -> bool {
        !self.allergies.is_empty()
    }
}

/// Allergy options offered by the profile editor.
pub const ALLERGY_OPTIONS: &[&str] = &[
    "Peanuts", "Dairy", "Gluten", "Soy", "Eggs", "Shellfish", "Tree Nuts", "Fish",
];

/// Dietary preference options offered by the profile editor.
pub const DIETARY_OPTIONS: &[&str] = &[
    "Vegetarian", "Vegan", "Keto", "Low-Carb", "Low-Fat", "High-Protein", "Paleo",
];

/// A user-defined ingredient added during the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CustomIngredient {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub calories: f64,
    #[validate(range(min = 0.0))]
    pub protein: f64,
    #[validate(range(min = 0.0))]
    pub fat: f64,
    #[validate(range(min = 0.0))]
    pub sugar: f64,
    #[validate(range(min = 0.0))]
    pub sodium: f64,
    /// Comma-separated labels, e.g. `Organic, Vegan`.
    pub labels: String,
}

impl CustomIngredient {
    pub fn to_record(&self) -> NutritionRecord {
        NutritionRecord {
            name: self.name.clone(),
            category_labels: split_labels(&self.labels),
            energy_kcal_per_100g: Some(self.calories),
            protein_g: Some(self.protein),
            fat_g: Some(self.fat),
            sugar_g: Some(self.sugar),
            sodium_g: Some(self.sodium),
            source: RecordSource::Custom,
            ..NutritionRecord::default()
        }
    }
}

/// Splits a label list on `,` or `;`, trimming and dropping empty entries.
pub fn split_labels(raw: &str) -> BTreeSet<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// The role of a chat transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Represents a single message in the session's chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Local>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            created_at: Local::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            created_at: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_parsing() {
        assert_eq!(NutriGrade::from_code("a"), NutriGrade::A);
        assert_eq!(NutriGrade::from_code(" E "), NutriGrade::E);
        assert_eq!(NutriGrade::from_code("not-applicable"), NutriGrade::Unknown);
        assert_eq!(NutriGrade::from_code(""), NutriGrade::Unknown);
    }

    #[test]
    fn test_grade_gauge_and_colors() {
        assert_eq!(NutriGrade::A.gauge_position(), Some(4));
        assert_eq!(NutriGrade::E.gauge_position(), Some(0));
        assert_eq!(NutriGrade::Unknown.gauge_position(), None);
        assert_eq!(NutriGrade::C.color(), Some("#FECB02"));
        assert_eq!(NutriGrade::Unknown.to_string(), "N/A");
    }

    #[test]
    fn test_display_value() {
        assert_eq!(NutritionRecord::display_value(Some(52.0)), "52");
        assert_eq!(NutritionRecord::display_value(Some(0.456)), "0.46");
        assert_eq!(NutritionRecord::display_value(None), "N/A");
    }

    #[test]
    fn test_split_labels() {
        let labels = split_labels("Vegan, Gluten-Free;;organic ");
        assert_eq!(labels.len(), 3);
        assert!(labels.contains("Gluten-Free"));
        assert!(labels.contains("organic"));
    }

    #[test]
    fn test_custom_ingredient_validation() {
        let mut ingredient = CustomIngredient {
            name: "Organic Honey".to_string(),
            calories: 304.0,
            protein: 0.3,
            fat: 0.0,
            sugar: 82.0,
            sodium: 0.004,
            labels: "Organic".to_string(),
        };
        assert!(ingredient.validate().is_ok());

        ingredient.sugar = -1.0;
        assert!(ingredient.validate().is_err());

        ingredient.sugar = 82.0;
        ingredient.name.clear();
        assert!(ingredient.validate().is_err());
    }

    #[test]
    fn test_custom_ingredient_record() {
        let record = CustomIngredient {
            name: "Kale Chips".to_string(),
            calories: 480.0,
            protein: 12.0,
            fat: 30.0,
            sugar: 2.0,
            sodium: 0.9,
            labels: "Vegan, Snack".to_string(),
        }
        .to_record();
        assert_eq!(record.source, RecordSource::Custom);
        assert_eq!(record.protein_g, Some(12.0));
        assert_eq!(record.fiber_g, None);
        assert!(record.category_labels.contains("Snack"));
    }

    #[test]
    fn test_profile_goal_length_is_bounded() {
        let profile = UserProfile {
            health_goals: "x".repeat(501),
            ..UserProfile::default()
        };
        assert!(profile.validate().is_err());
        assert!(UserProfile::default().validate().is_ok());
    }
}
