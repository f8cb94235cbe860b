//! Copilot - orchestrator for the rules engine.
//!
//! Routes a chat message through intent classification to the matching
//! branch, runs lookups, scoring and allergen checks, and records the outcome
//! in the caller's [`Session`]. The presentation layer only renders what comes
//! back.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::allergens::AllergenDetector;
use super::comparison::{split_comparison_query, ComparisonEngine, ComparisonResult, PartialFailure};
use super::ingredients::{IngredientParser, IngredientWarning};
use super::intent::{Intent, IntentClassifier};
use super::scoring::{HealthScorer, NutrientWarning, ScoreAdjustment};
use crate::activity::ActionKind;
use crate::lookup::{DatabaseStats, LocalFood, LocalFoodDatabase, ProductSource};
use crate::models::{ChatMessage, NutritionRecord, RecordSource, UserProfile};
use crate::session::Session;

const NEED_TWO_ITEMS: &str = "Please name two products to compare, e.g. 'Compare Coke vs Pepsi'.";
const NO_SAFETY_DATA: &str = "I couldn't find safety data for that product. Try using the barcode scanner!";
const NO_NUTRITION_DATA: &str =
    "I couldn't find nutrition data. Try being more specific or use the barcode scanner!";
const NO_DATA: &str = "I couldn't find specific data. Try:\n\
- Comparing products ('Compare X vs Y')\n\
- Scanning a barcode\n\
- Asking about nutrition\n\
- Checking safety for your profile";

/// Allergen findings for one product or ingredient list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllergenCheck {
    /// False when the profile declares no allergies.
    pub performed: bool,
    pub found: BTreeSet<String>,
}

impl AllergenCheck {
    pub fn is_clear(&self) -> bool {
        self.found.is_empty()
    }

    fn describe(&self) -> String {
        if !self.performed {
            "No allergies are set in your profile, so no allergen check was performed.".to_string()
        } else if self.is_clear() {
            "No allergens detected based on your profile.".to_string()
        } else {
            format!(
                "Warning! Contains allergens you're sensitive to: {}.",
                join(&self.found)
            )
        }
    }
}

/// A single product with its score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductReport {
    pub record: NutritionRecord,
    pub health_score: u8,
    pub breakdown: Vec<ScoreAdjustment>,
    pub allergens: AllergenCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyReport {
    pub record: NutritionRecord,
    pub ingredients: Vec<String>,
    pub allergens: AllergenCheck,
    pub warnings: Vec<NutrientWarning>,
}

/// Result of analyzing a pasted ingredient list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickAnalysis {
    pub ingredients: Vec<String>,
    pub warnings: Vec<IngredientWarning>,
    pub allergens: AllergenCheck,
}

/// Structured payload of a chat reply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ReplyKind {
    Comparison(Box<ComparisonResult>),
    PartialComparison(PartialFailure),
    NeedTwoItems,
    Safety(SafetyReport),
    Product(ProductReport),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub intent: Intent,
    pub kind: ReplyKind,
    /// Rendered text, also appended to the transcript.
    pub message: String,
}

pub struct Copilot {
    remote: Arc<dyn ProductSource>,
    catalog: Arc<LocalFoodDatabase>,
    classifier: IntentClassifier,
    parser: IngredientParser,
    detector: AllergenDetector,
    scorer: HealthScorer,
    comparison: ComparisonEngine,
}

impl Copilot {
    /// `remote` serves name and barcode lookups; `catalog` is the offline fallback.
    pub fn new(remote: Arc<dyn ProductSource>, catalog: LocalFoodDatabase) -> Self {
        Self {
            comparison: ComparisonEngine::new(Arc::clone(&remote)),
            remote,
            catalog: Arc::new(catalog),
            classifier: IntentClassifier::new(),
            parser: IngredientParser::new(),
            detector: AllergenDetector::new(),
            scorer: HealthScorer::new(),
        }
    }

    /// Answers one chat message and records the exchange in the session.
    #[instrument(skip(self, session), fields(session = %session.id()))]
    pub async fn handle_query(&self, session: &mut Session, query: &str) -> ChatReply {
        session.push_message(ChatMessage::user(query));
        session.count_analysis();

        let intent = self.classifier.classify(query);
        debug!("Classified '{}' as {}", query, intent);

        let (kind, message) = match intent {
            Intent::Comparison => self.comparison_branch(session, query).await,
            Intent::SafetyCheck => self.safety_branch(session, query).await,
            Intent::NutritionInfo => self.nutrition_branch(session, query).await,
            Intent::General => self.general_branch(session, query).await,
        };

        session.push_message(ChatMessage::assistant(message.clone()));
        ChatReply { intent, kind, message }
    }

    async fn comparison_branch(&self, session: &mut Session, query: &str) -> (ReplyKind, String) {
        let Some((item_a, item_b)) = split_comparison_query(query) else {
            return (ReplyKind::NeedTwoItems, NEED_TWO_ITEMS.to_string());
        };

        match self.compare(session, &item_a, &item_b).await {
            Ok(result) => {
                let message = format!(
                    "Comparison complete! {} appears to be the healthier choice with a health score of {}/100 ({} scored {}/100).",
                    result.winner_record().name,
                    result.score_a.max(result.score_b),
                    result.loser_record().name,
                    result.score_a.min(result.score_b),
                );
                (ReplyKind::Comparison(Box::new(result)), message)
            }
            Err(failure) => {
                let message = match &failure {
                    PartialFailure::MissingA { query_a, record_b } => format!(
                        "Found data for {}, but couldn't find {}. {}",
                        item_b,
                        query_a,
                        record_b.summary()
                    ),
                    PartialFailure::MissingB { query_b, record_a } => format!(
                        "Found data for {}, but couldn't find {}. {}",
                        item_a,
                        query_b,
                        record_a.summary()
                    ),
                    PartialFailure::MissingBoth { .. } => {
                        "I couldn't find data for those products. Try scanning their barcodes!".to_string()
                    }
                };
                (ReplyKind::PartialComparison(failure), message)
            }
        }
    }

    async fn safety_branch(&self, session: &mut Session, query: &str) -> (ReplyKind, String) {
        let Some(subject) = safety_subject(query) else {
            return (ReplyKind::NotFound, NO_SAFETY_DATA.to_string());
        };

        let Some(record) = self.remote.find_by_name(subject).await else {
            return (ReplyKind::NotFound, NO_SAFETY_DATA.to_string());
        };

        let ingredients = self.parser.parse(&record.ingredients_text);
        let allergens = self.check_allergens(&ingredients, session.profile());
        let warnings = NutrientWarning::for_record(&record);

        let mut message = format!("{}: {}", record.name, allergens.describe());
        if allergens.performed && allergens.is_clear() {
            message.push_str(" This product appears safe for your dietary restrictions.");
        } else if !allergens.is_clear() {
            message.push_str(" I recommend avoiding it.");
        }
        for warning in &warnings {
            message.push_str("\n\n");
            message.push_str(warning.message());
        }

        session.activity_mut().record(ActionKind::SafetyCheck, query);
        info!("Safety check for '{}': {} allergen(s)", record.name, allergens.found.len());

        let report = SafetyReport {
            record,
            ingredients,
            allergens,
            warnings,
        };
        (ReplyKind::Safety(report), message)
    }

    async fn nutrition_branch(&self, session: &mut Session, query: &str) -> (ReplyKind, String) {
        if let Some(record) = self.remote.find_by_name(query).await {
            let report = self.product_report(record, session.profile());
            let message = format!(
                "Here's the nutrition info for {}. Health score: {}/100.",
                report.record.summary(),
                report.health_score
            );
            session.activity_mut().record(ActionKind::NutritionQuery, query);
            return (ReplyKind::Product(report), message);
        }

        match self.find_offline(session, query) {
            Some(record) => {
                let report = self.product_report(record, session.profile());
                let message = format!(
                    "From the {}: {}.{}",
                    report.record.source.label(),
                    report.record.summary(),
                    labels_suffix(&report.record)
                );
                (ReplyKind::Product(report), message)
            }
            None => (ReplyKind::NotFound, NO_NUTRITION_DATA.to_string()),
        }
    }

    async fn general_branch(&self, session: &mut Session, query: &str) -> (ReplyKind, String) {
        if let Some(record) = self.find_offline(session, query) {
            let report = self.product_report(record, session.profile());
            let message = format!(
                "I found {} in the {}: {} kcal, {}g protein, {}g sugar.{}",
                report.record.name,
                report.record.source.label(),
                NutritionRecord::display_value(report.record.energy_kcal_per_100g),
                NutritionRecord::display_value(report.record.protein_g),
                NutritionRecord::display_value(report.record.sugar_g),
                labels_suffix(&report.record)
            );
            return (ReplyKind::Product(report), message);
        }

        match self.remote.find_by_name(query).await {
            Some(record) => {
                let report = self.product_report(record, session.profile());
                let message = format!(
                    "Found {} on {}: {} kcal, Nutri-Score {}",
                    report.record.name,
                    report.record.source.label(),
                    NutritionRecord::display_value(report.record.energy_kcal_per_100g),
                    report.record.nutri_grade
                );
                (ReplyKind::Product(report), message)
            }
            None => (ReplyKind::NotFound, NO_DATA.to_string()),
        }
    }

    /// Compares two products by name. Successful comparisons are counted and logged.
    pub async fn compare(
        &self,
        session: &mut Session,
        item_a: &str,
        item_b: &str,
    ) -> Result<ComparisonResult, PartialFailure> {
        let result = self.comparison.compare(item_a, item_b).await?;
        session.count_comparison();
        session
            .activity_mut()
            .record(ActionKind::Comparison, format!("Compared {} vs {}", item_a, item_b));
        Ok(result)
    }

    /// Looks a barcode up, scores it and checks it against the profile.
    #[instrument(skip(self, session), fields(session = %session.id()))]
    pub async fn scan_barcode(&self, session: &mut Session, code: &str) -> Option<ProductReport> {
        let record = self.remote.find_by_barcode(code).await?;
        let report = self.product_report(record, session.profile());

        session
            .activity_mut()
            .record(ActionKind::BarcodeScan, format!("Scanned {}", report.record.name));
        info!("Scanned {} ({}): score {}", code, report.record.name, report.health_score);
        Some(report)
    }

    /// Parses pasted ingredient text and raises warnings. Returns `None` when
    /// nothing parses, in which case nothing is logged.
    pub fn quick_analyze(&self, session: &mut Session, text: &str) -> Option<QuickAnalysis> {
        let ingredients = self.parser.parse(text);
        if ingredients.is_empty() {
            return None;
        }

        let warnings = IngredientWarning::scan(&ingredients);
        let allergens = self.check_allergens(&ingredients, session.profile());

        session.activity_mut().record(
            ActionKind::QuickAnalysis,
            format!("Analyzed {} ingredients", ingredients.len()),
        );
        Some(QuickAnalysis {
            ingredients,
            warnings,
            allergens,
        })
    }

    /// Catalog and custom ingredient counts for the session.
    pub fn stats(&self, session: &Session) -> DatabaseStats {
        self.catalog.stats(session.custom_ingredients())
    }

    fn product_report(&self, record: NutritionRecord, profile: &UserProfile) -> ProductReport {
        let ingredients = self.parser.parse(&record.ingredients_text);
        ProductReport {
            health_score: self.scorer.score(&record),
            breakdown: self.scorer.breakdown(&record),
            allergens: self.check_allergens(&ingredients, profile),
            record,
        }
    }

    fn check_allergens(&self, ingredients: &[String], profile: &UserProfile) -> AllergenCheck {
        AllergenCheck {
            performed: profile.has_allergies(),
            found: self.detector.detect(ingredients, &profile.allergies),
        }
    }

    /// Local catalog first, then the session's custom ingredients.
    fn find_offline(&self, session: &Session, query: &str) -> Option<NutritionRecord> {
        self.catalog
            .search(query)
            .map(LocalFood::to_record)
            .or_else(|| session.find_custom(query))
    }
}

/// The word a safety question is about: the last word, punctuation trimmed.
pub fn safety_subject(prompt: &str) -> Option<&str> {
    let last = prompt.split_whitespace().last()?;
    let word = last.trim_matches(|c: char| !c.is_alphanumeric());
    (!word.is_empty()).then_some(word)
}

fn labels_suffix(record: &NutritionRecord) -> String {
    if record.category_labels.is_empty() || record.source == RecordSource::OpenFoodFacts {
        String::new()
    } else {
        format!(" Labels: {}", join(&record.category_labels))
    }
}

fn join(items: &BTreeSet<String>) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_subject() {
        assert_eq!(safety_subject("Is Nutella safe?"), Some("safe"));
        assert_eq!(safety_subject("is it bad for diabetics?"), Some("diabetics"));
        assert_eq!(safety_subject("safe for nutella!"), Some("nutella"));
        assert_eq!(safety_subject("   "), None);
        assert_eq!(safety_subject("safe ???"), None);
    }

    #[test]
    fn test_allergen_check_text() {
        let skipped = AllergenCheck {
            performed: false,
            found: BTreeSet::new(),
        };
        assert!(skipped.describe().contains("no allergen check"));

        let hit = AllergenCheck {
            performed: true,
            found: ["Dairy".to_string(), "Soy".to_string()].into_iter().collect(),
        };
        assert!(!hit.is_clear());
        assert!(hit.describe().ends_with("Dairy, Soy."));
    }

    #[test]
    fn test_reply_kind_stays_small() {
        assert!(std::mem::size_of::<ReplyKind>() < std::mem::size_of::<ComparisonResult>());
    }
}
