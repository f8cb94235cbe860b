//! Ingredient list parsing and quick ingredient warnings.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Tokens this short (in characters) are treated as noise.
const MIN_TOKEN_CHARS: usize = 3;

// NOTE: expect() is acceptable here: the patterns are constants.
static LABEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(ingredients?|contains)\s*:?").expect("Invalid regex: ingredient label prefix")
});

static LIST_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;]").expect("Invalid regex: ingredient separators"));

/// Joining word that separates ingredients when it stands alone.
const JOINER: &str = "and";

/// Splits raw ingredient text into normalized ingredient names
#[derive(Debug, Clone, Copy, Default)]
pub struct IngredientParser;

impl IngredientParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a raw ingredient list.
    ///
    /// Strips a leading `Ingredients:` / `Contains:` label, splits on commas,
    /// semicolons and the standalone word "and", drops tokens of two
    /// characters or fewer and title-cases the rest. Order and duplicates are
    /// kept. Unparsable input simply yields an empty list.
    pub fn parse(&self, raw_text: &str) -> Vec<String> {
        let body = LABEL_PREFIX.replace(raw_text, "");

        LIST_SEPARATORS
            .split(&body)
            .flat_map(split_on_joiner)
            .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
            .map(|token| title_case(&token))
            .collect()
    }
}

/// Splits one list item on every whitespace-delimited "and".
///
/// Hyphenated words such as `sweet-and-sour` are a single word and stay whole.
fn split_on_joiner(item: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in item.split_whitespace() {
        if word.eq_ignore_ascii_case(JOINER) {
            if !current.is_empty() {
                parts.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(word);
        }
    }
    if !current.is_empty() {
        parts.push(current.join(" "));
    }

    parts
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
///
/// `"whole MILK (3.5%)"` becomes `"Whole Milk (3.5%)"`, `"e-numbers"` becomes `"E-Numbers"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }

    out
}

/// Red flags raised by the quick ingredient analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientWarning {
    HighSugar,
    HighSodium,
    Artificial,
    PalmOil,
}

impl IngredientWarning {
    /// Substrings (lower-case) that trigger the warning
    fn triggers(&self) -> &'static [&'static str] {
        match self {
            IngredientWarning::HighSugar => &["sugar"],
            IngredientWarning::HighSodium => &["sodium", "salt"],
            IngredientWarning::Artificial => &["artificial", "flavor"],
            IngredientWarning::PalmOil => &["palm oil"],
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            IngredientWarning::HighSugar => "High Sugar detected - may spike blood glucose levels",
            IngredientWarning::HighSodium => "High Sodium detected - monitor if you have blood pressure concerns",
            IngredientWarning::Artificial => "Artificial ingredients detected - consider natural alternatives",
            IngredientWarning::PalmOil => "Palm Oil detected - environmental and health concerns",
        }
    }

    const ALL: [IngredientWarning; 4] = [
        IngredientWarning::HighSugar,
        IngredientWarning::HighSodium,
        IngredientWarning::Artificial,
        IngredientWarning::PalmOil,
    ];

    /// Warnings raised by a parsed ingredient list, in a fixed order
    pub fn scan(ingredients: &[String]) -> Vec<IngredientWarning> {
        let lowered: Vec<String> = ingredients.iter().map(|i| i.to_lowercase()).collect();

        Self::ALL
            .into_iter()
            .filter(|warning| {
                warning
                    .triggers()
                    .iter()
                    .any(|t| lowered.iter().any(|ing| ing.contains(t)))
            })
            .collect()
    }
}

impl fmt::Display for IngredientWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_stripped_and_title_cased() {
        let parser = IngredientParser::new();
        assert_eq!(
            parser.parse("Ingredients: Water, Sugar, Salt"),
            vec!["Water", "Sugar", "Salt"]
        );
        assert_eq!(
            parser.parse("CONTAINS: milk; soy lecithin"),
            vec!["Milk", "Soy Lecithin"]
        );
    }

    #[test]
    fn test_split_on_standalone_and() {
        let parser = IngredientParser::new();
        assert_eq!(
            parser.parse("flour, butter and sugar"),
            vec!["Flour", "Butter", "Sugar"]
        );
        // "and" inside a word is not a separator
        assert_eq!(parser.parse("candied almonds"), vec!["Candied Almonds"]);
        assert_eq!(parser.parse("sugar, and salt"), vec!["Sugar", "Salt"]);
    }

    #[test]
    fn test_and_after_separator_or_repeated() {
        let parser = IngredientParser::new();
        assert_eq!(parser.parse("sugar and and salt"), vec!["Sugar", "Salt"]);
        assert_eq!(parser.parse("milk,and sugar"), vec!["Milk", "Sugar"]);
        assert_eq!(parser.parse("oats;AND honey"), vec!["Oats", "Honey"]);
        assert_eq!(parser.parse("and"), Vec::<String>::new());
    }

    #[test]
    fn test_hyphenated_and_kept_whole() {
        let parser = IngredientParser::new();
        assert_eq!(
            parser.parse("sweet-and-sour sauce, rice"),
            vec!["Sweet-And-Sour Sauce", "Rice"]
        );
    }

    #[test]
    fn test_short_tokens_dropped() {
        let parser = IngredientParser::new();
        assert_eq!(parser.parse("E1, water, ok, tea"), vec!["Water", "Tea"]);
    }

    #[test]
    fn test_empty_input() {
        let parser = IngredientParser::new();
        assert!(parser.parse("").is_empty());
        assert!(parser.parse("   \n\t ").is_empty());
        assert!(parser.parse("Ingredients:").is_empty());
    }

    #[test]
    fn test_duplicates_and_order_kept() {
        let parser = IngredientParser::new();
        assert_eq!(
            parser.parse("salt, pepper, salt"),
            vec!["Salt", "Pepper", "Salt"]
        );
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("whole MILK (3.5%)"), "Whole Milk (3.5%)");
        assert_eq!(title_case("e-numbers"), "E-Numbers");
    }

    #[test]
    fn test_quick_warnings() {
        let parser = IngredientParser::new();
        let ingredients = parser.parse("Sugar, Sea Salt, Natural Flavor, Palm Oil");
        assert_eq!(
            IngredientWarning::scan(&ingredients),
            vec![
                IngredientWarning::HighSugar,
                IngredientWarning::HighSodium,
                IngredientWarning::Artificial,
                IngredientWarning::PalmOil,
            ]
        );

        let clean = parser.parse("Oats, Water");
        assert!(IngredientWarning::scan(&clean).is_empty());
    }
}
