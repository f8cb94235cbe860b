//! Intent classification using keyword sets.
//!
//! Case-insensitive substring matching against four fixed keyword groups,
//! checked in priority order. This is a heuristic, not NLP: "vs" also
//! matches inside "canvas", and that is accepted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Detected intent type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Side-by-side comparison of two products (compare, vs, etc.)
    Comparison,
    /// Safety question about a product (safe, diabetic, allergic, etc.)
    SafetyCheck,
    /// Nutrition facts request (calories, protein, sugar, etc.)
    NutritionInfo,
    /// Anything else
    General,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Intent {
    /// Returns the wire label for the intent
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Comparison => "comparison",
            Intent::SafetyCheck => "safety_check",
            Intent::NutritionInfo => "nutrition_info",
            Intent::General => "general_query",
        }
    }
}

/// Result of intent classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Detected intent
    pub intent: Intent,
    /// Keywords of the winning group found in the query
    pub matched_keywords: Vec<String>,
}

const COMPARISON_KEYWORDS: &[&str] = &[
    "compare",
    "vs",
    "versus",
    "side by side",
    "better than",
    "difference",
];

const SAFETY_KEYWORDS: &[&str] = &[
    "safe", "diabetic", "allergic", "risk", "bad for", "warning", "danger",
];

const NUTRITION_KEYWORDS: &[&str] = &[
    "nutrition",
    "calories",
    "info",
    "protein",
    "sugar",
    "carbs",
    "nutrients",
];

/// Keyword group for one intent
struct IntentKeywords {
    intent: Intent,
    keywords: &'static [&'static str],
}

/// Groups in priority order; the first group with any hit wins.
const PRIORITY: [IntentKeywords; 3] = [
    IntentKeywords {
        intent: Intent::Comparison,
        keywords: COMPARISON_KEYWORDS,
    },
    IntentKeywords {
        intent: Intent::SafetyCheck,
        keywords: SAFETY_KEYWORDS,
    },
    IntentKeywords {
        intent: Intent::NutritionInfo,
        keywords: NUTRITION_KEYWORDS,
    },
];

/// Intent classifier using keyword groups
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify the intent of a query
    pub fn classify(&self, query: &str) -> Intent {
        self.classify_detailed(query).intent
    }

    /// Classify and report which keywords of the winning group matched
    pub fn classify_detailed(&self, query: &str) -> IntentResult {
        let lowered = query.to_lowercase();

        for group in &PRIORITY {
            let matched: Vec<String> = group
                .keywords
                .iter()
                .filter(|kw| lowered.contains(*kw))
                .map(|kw| kw.to_string())
                .collect();

            if !matched.is_empty() {
                return IntentResult {
                    intent: group.intent,
                    matched_keywords: matched,
                };
            }
        }

        IntentResult {
            intent: Intent::General,
            matched_keywords: vec![],
        }
    }
}
