//! Engine Tests
//!
//! Pipelines across the pure engine components and the comparison engine
//! driven by an in-memory product source.

use crate::engine::{
    AllergenDetector, ComparisonEngine, HealthScorer, IngredientParser, IngredientWarning, Intent,
    IntentClassifier, NutrientWarning, PartialFailure, Side,
};
use crate::lookup::ProductSource;
use crate::models::NutritionRecord;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

// ============================================================================
// Test Fixtures
// ============================================================================

fn record(name: &str, protein: f64, fiber: f64, sugar: f64, sat_fat: f64, sodium: f64) -> NutritionRecord {
    NutritionRecord {
        name: name.to_string(),
        protein_g: Some(protein),
        fiber_g: Some(fiber),
        sugar_g: Some(sugar),
        saturated_fat_g: Some(sat_fat),
        sodium_g: Some(sodium),
        ..NutritionRecord::default()
    }
}

fn allergies(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Name-keyed source with exact, case-insensitive matching
struct MapSource {
    records: HashMap<String, NutritionRecord>,
}

impl MapSource {
    fn new(records: Vec<NutritionRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.name.to_lowercase(), r))
                .collect(),
        }
    }
}

#[async_trait]
impl ProductSource for MapSource {
    async fn find_by_name(&self, query: &str) -> Option<NutritionRecord> {
        self.records.get(&query.to_lowercase()).cloned()
    }

    async fn find_by_barcode(&self, _code: &str) -> Option<NutritionRecord> {
        None
    }
}

/// Source whose lookups only complete once two of them are in flight
struct RendezvousSource {
    barrier: Barrier,
}

#[async_trait]
impl ProductSource for RendezvousSource {
    async fn find_by_name(&self, query: &str) -> Option<NutritionRecord> {
        self.barrier.wait().await;
        Some(record(query, 0.0, 0.0, 0.0, 0.0, 0.0))
    }

    async fn find_by_barcode(&self, _code: &str) -> Option<NutritionRecord> {
        None
    }
}

// ============================================================================
// Label Pipeline Tests
// ============================================================================

#[cfg(test)]
mod label_pipeline_tests {
    use super::*;

    #[test]
    fn test_parse_then_detect() {
        let parser = IngredientParser::new();
        let detector = AllergenDetector::new();

        let ingredients = parser.parse("INGREDIENTS: whole milk, wheat flour; sugar and soybean oil");
        assert_eq!(
            ingredients,
            vec!["Whole Milk", "Wheat Flour", "Sugar", "Soybean Oil"]
        );

        let found = detector.detect(&ingredients, &allergies(&["Dairy", "Gluten", "Soy", "Peanuts"]));
        assert_eq!(found, allergies(&["Dairy", "Gluten", "Soy"]));
    }

    #[test]
    fn test_detection_requires_declared_allergies() {
        let parser = IngredientParser::new();
        let detector = AllergenDetector::new();

        let ingredients = parser.parse("peanuts, milk, eggs");
        assert!(detector.detect(&ingredients, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_found_allergies_are_a_subset_of_declared() {
        let parser = IngredientParser::new();
        let detector = AllergenDetector::new();
        let declared = allergies(&["Eggs", "Fish"]);

        let found = detector.detect(&parser.parse("egg whites, salmon, dill"), &declared);
        assert!(found.is_subset(&declared));
        assert_eq!(found, allergies(&["Eggs"]));
    }

    #[test]
    fn test_quick_warnings_from_raw_text() {
        let parser = IngredientParser::new();
        let warnings = IngredientWarning::scan(&parser.parse("Contains: oats, cane sugar, artificial vanilla"));
        assert_eq!(
            warnings,
            vec![IngredientWarning::HighSugar, IngredientWarning::Artificial]
        );
    }
}

// ============================================================================
// Scoring Tests
// ============================================================================

#[cfg(test)]
mod scoring_tests {
    use super::*;

    #[test]
    fn test_score_is_bounded_and_deterministic() {
        let scorer = HealthScorer::new();
        let values = [0.0, 0.5, 3.0, 5.0, 10.0, 15.0, 100.0];

        for &protein in &values {
            for &sugar in &values {
                for &sodium in &values {
                    let r = record("x", protein, protein, sugar, sugar, sodium);
                    let first = scorer.score(&r);
                    assert!(first <= 100);
                    assert_eq!(first, scorer.score(&r));
                }
            }
        }
    }

    #[test]
    fn test_breakdown_sums_to_score() {
        let scorer = HealthScorer::new();
        let r = record("Protein Bar", 20.0, 6.0, 18.0, 7.0, 0.2);

        let delta: i32 = scorer.breakdown(&r).iter().map(|a| a.delta).sum();
        assert_eq!(scorer.score(&r) as i32, 50 + delta);
        assert_eq!(scorer.score(&r), 50);
    }

    #[test]
    fn test_nutrient_warnings_share_score_thresholds() {
        let just_under = record("a", 0.0, 0.0, 15.0, 0.0, 0.5);
        assert!(NutrientWarning::for_record(&just_under).is_empty());

        let over = record("b", 0.0, 0.0, 15.1, 0.0, 0.51);
        assert_eq!(NutrientWarning::for_record(&over).len(), 2);
    }

    #[test]
    fn test_classifier_routes_reference_prompts() {
        let classifier = IntentClassifier::new();
        let cases = [
            ("Which is better than the other?", Intent::Comparison),
            ("is nutella bad for me", Intent::SafetyCheck),
            ("nutrients in kale", Intent::NutritionInfo),
            ("oat milk", Intent::General),
        ];

        for (prompt, expected) in cases {
            assert_eq!(classifier.classify(prompt), expected, "prompt: {}", prompt);
        }
    }
}

// ============================================================================
// Comparison Engine Tests
// ============================================================================

#[cfg(test)]
mod comparison_engine_tests {
    use super::*;

    fn engine(records: Vec<NutritionRecord>) -> ComparisonEngine {
        ComparisonEngine::new(Arc::new(MapSource::new(records)))
    }

    #[tokio::test]
    async fn test_higher_score_wins() {
        let engine = engine(vec![
            record("Cola", 0.0, 0.0, 10.6, 0.0, 0.01),
            record("Lentils", 24.0, 8.0, 2.0, 0.2, 0.0),
        ]);

        let result = engine.compare("cola", "lentils").await.unwrap();
        assert_eq!(result.score_a, 50);
        assert_eq!(result.score_b, 75);
        assert_eq!(result.winner, Side::B);
        assert_eq!(result.winner_record().name, "Lentils");
        assert_eq!(result.loser_record().name, "Cola");
    }

    #[tokio::test]
    async fn test_tie_goes_to_item_a() {
        let engine = engine(vec![
            record("Water", 0.0, 0.0, 0.0, 0.0, 0.0),
            record("Tea", 0.0, 0.0, 0.0, 0.0, 0.0),
        ]);

        let result = engine.compare("tea", "water").await.unwrap();
        assert!(result.is_tie());
        assert_eq!(result.winner, Side::A);
        assert_eq!(result.winner_record().name, "Tea");

        let report = result.render_report(chrono::Local::now());
        assert!(report.contains("Verdict: tie at 50/100"));
    }

    #[tokio::test]
    async fn test_partial_failure_names_failed_side() {
        let engine = engine(vec![record("Cola", 0.0, 0.0, 10.6, 0.0, 0.01)]);

        let missing_b = engine.compare("cola", "unicorn juice").await.unwrap_err();
        assert_eq!(missing_b.failed_sides(), vec![Side::B]);
        match &missing_b {
            PartialFailure::MissingB { query_b, record_a } => {
                assert_eq!(query_b, "unicorn juice");
                assert_eq!(record_a.name, "Cola");
            }
            other => panic!("Unexpected failure: {:?}", other),
        }

        let missing_a = engine.compare("unicorn juice", "cola").await.unwrap_err();
        assert_eq!(missing_a.failed_sides(), vec![Side::A]);

        let missing_both = engine.compare("x", "y").await.unwrap_err();
        assert_eq!(missing_both.failed_sides(), vec![Side::A, Side::B]);
    }

    #[tokio::test]
    async fn test_lookups_run_concurrently() {
        let engine = ComparisonEngine::new(Arc::new(RendezvousSource {
            barrier: Barrier::new(2),
        }));

        // Sequential lookups would wait on the barrier forever.
        let result = tokio::time::timeout(Duration::from_secs(5), engine.compare("a", "b"))
            .await
            .expect("Lookups did not run concurrently");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_report_lists_both_products() {
        let engine = engine(vec![
            NutritionRecord {
                brand: Some("Acme".to_string()),
                ..record("Granola", 8.0, 7.0, 22.0, 1.5, 0.1)
            },
            record("Oats", 13.0, 10.0, 1.0, 1.2, 0.0),
        ]);

        let result = engine.compare("granola", "oats").await.unwrap();
        let report = result.render_report(chrono::Local::now());

        assert!(report.starts_with("WiseWhisk Comparison: granola vs oats"));
        assert!(report.contains("[A] Granola"));
        assert!(report.contains("Brand: Acme"));
        assert!(report.contains("[B] Oats"));
        assert!(report.contains("Verdict: Oats is the healthier choice (75 vs 45)."));
    }
}
