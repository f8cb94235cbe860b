//! Health score heuristic.
//!
//! Base 50, adjusted by strict thresholds on five nutrients and clamped to
//! 0..=100. This is WiseWhisk's own heuristic, distinct from the Nutri-Score
//! grade, and comparison winners depend on it being reproduced exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::NutritionRecord;

pub const BASE_SCORE: i32 = 50;
pub const HIGH_PROTEIN_G: f64 = 10.0;
pub const HIGH_FIBER_G: f64 = 3.0;
pub const HIGH_SUGAR_G: f64 = 15.0;
pub const HIGH_SATURATED_FAT_G: f64 = 5.0;
pub const HIGH_SODIUM_G: f64 = 0.5;

/// One triggered adjustment of the health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreAdjustment {
    pub reason: &'static str,
    pub delta: i32,
}

impl fmt::Display for ScoreAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+} {}", self.delta, self.reason)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HealthScorer;

impl HealthScorer {
    pub fn new() -> Self {
        Self
    }

    /// Adjustments triggered by the record, in evaluation order.
    /// Missing nutrients count as zero.
    pub fn breakdown(&self, record: &NutritionRecord) -> Vec<ScoreAdjustment> {
        let value = |v: Option<f64>| v.unwrap_or(0.0);
        let rules = [
            (value(record.protein_g) > HIGH_PROTEIN_G, "high protein", 15),
            (value(record.fiber_g) > HIGH_FIBER_G, "high fiber", 10),
            (value(record.sugar_g) > HIGH_SUGAR_G, "high sugar", -15),
            (value(record.saturated_fat_g) > HIGH_SATURATED_FAT_G, "high saturated fat", -10),
            (value(record.sodium_g) > HIGH_SODIUM_G, "high sodium", -10),
        ];

        rules
            .into_iter()
            .filter(|(triggered, _, _)| *triggered)
            .map(|(_, reason, delta)| ScoreAdjustment { reason, delta })
            .collect()
    }

    /// Score in `0..=100`.
    pub fn score(&self, record: &NutritionRecord) -> u8 {
        let total: i32 = BASE_SCORE + self.breakdown(record).iter().map(|a| a.delta).sum::<i32>();
        total.clamp(0, 100) as u8
    }
}

/// Nutrient-level cautions shown by the safety check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientWarning {
    HighSugar,
    HighSodium,
}

impl NutrientWarning {
    /// Warnings for a record, using the scorer's sugar and sodium thresholds.
    pub fn for_record(record: &NutritionRecord) -> Vec<NutrientWarning> {
        let mut warnings = Vec::new();
        if record.sugar_g.unwrap_or(0.0) > HIGH_SUGAR_G {
            warnings.push(NutrientWarning::HighSugar);
        }
        if record.sodium_g.unwrap_or(0.0) > HIGH_SODIUM_G {
            warnings.push(NutrientWarning::HighSodium);
        }
        warnings
    }

    pub fn message(&self) -> &'static str {
        match self {
            NutrientWarning::HighSugar => "High sugar content - exercise caution if diabetic.",
            NutrientWarning::HighSodium => "High sodium - monitor if you have blood pressure concerns.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(protein: f64, fiber: f64, sugar: f64, sat_fat: f64, sodium: f64) -> NutritionRecord {
        NutritionRecord {
            name: "test".to_string(),
            protein_g: Some(protein),
            fiber_g: Some(fiber),
            sugar_g: Some(sugar),
            saturated_fat_g: Some(sat_fat),
            sodium_g: Some(sodium),
            ..NutritionRecord::default()
        }
    }

    #[test]
    fn test_reference_scores() {
        let scorer = HealthScorer::new();
        assert_eq!(scorer.score(&record(12.0, 0.0, 20.0, 0.0, 0.0)), 50);
        assert_eq!(scorer.score(&record(0.0, 0.0, 0.0, 0.0, 0.0)), 50);
        assert_eq!(scorer.score(&record(20.0, 5.0, 0.0, 0.0, 0.0)), 75);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let scorer = HealthScorer::new();
        assert_eq!(scorer.score(&record(10.0, 3.0, 15.0, 5.0, 0.5)), 50);
        assert_eq!(scorer.score(&record(10.01, 3.01, 0.0, 0.0, 0.0)), 75);
    }

    #[test]
    fn test_worst_case() {
        let scorer = HealthScorer::new();
        // 50 - 15 - 10 - 10
        assert_eq!(scorer.score(&record(0.0, 0.0, 40.0, 12.0, 2.0)), 15);
    }

    #[test]
    fn test_missing_nutrients_count_as_zero() {
        let scorer = HealthScorer::new();
        let empty = NutritionRecord::default();
        assert_eq!(scorer.score(&empty), 50);
        assert!(scorer.breakdown(&empty).is_empty());
    }

    #[test]
    fn test_breakdown_reasons() {
        let scorer = HealthScorer::new();
        let adjustments = scorer.breakdown(&record(20.0, 0.0, 30.0, 0.0, 0.0));
        assert_eq!(adjustments.len(), 2);
        assert_eq!(adjustments[0].to_string(), "+15 high protein");
        assert_eq!(adjustments[1].to_string(), "-15 high sugar");
    }

    #[test]
    fn test_nutrient_warnings() {
        assert_eq!(
            NutrientWarning::for_record(&record(0.0, 0.0, 16.0, 0.0, 0.6)),
            vec![NutrientWarning::HighSugar, NutrientWarning::HighSodium]
        );
        assert!(NutrientWarning::for_record(&NutritionRecord::default()).is_empty());
    }
}
