//! Side-by-side product comparison.
//!
//! Looks both products up concurrently, scores them, and declares the higher
//! score the winner. Equal scores go to item A.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use super::scoring::HealthScorer;
use crate::lookup::ProductSource;
use crate::models::NutritionRecord;

/// One side of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    A,
    B,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub query_a: String,
    pub query_b: String,
    pub record_a: NutritionRecord,
    pub record_b: NutritionRecord,
    pub score_a: u8,
    pub score_b: u8,
    pub winner: Side,
}

impl ComparisonResult {
    pub fn winner_record(&self) -> &NutritionRecord {
        match self.winner {
            Side::A => &self.record_a,
            Side::B => &self.record_b,
        }
    }

    pub fn loser_record(&self) -> &NutritionRecord {
        match self.winner {
            Side::A => &self.record_b,
            Side::B => &self.record_a,
        }
    }

    pub fn is_tie(&self) -> bool {
        self.score_a == self.score_b
    }

    /// Plain-text report for display or download.
    pub fn render_report(&self, generated_at: DateTime<Local>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "WiseWhisk Comparison: {} vs {}", self.query_a, self.query_b);
        let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"));
        out.push('\n');

        for (label, record, score) in [
            ("A", &self.record_a, self.score_a),
            ("B", &self.record_b, self.score_b),
        ] {
            let _ = writeln!(out, "[{}] {}", label, record.name);
            if let Some(brand) = record.brand.as_deref() {
                let _ = writeln!(out, "    Brand: {}", brand);
            }
            let _ = writeln!(out, "    Nutri-Score: {}", record.nutri_grade);
            let _ = writeln!(out, "    Health score: {}/100", score);
            let _ = writeln!(
                out,
                "    Per 100g: {} kcal, {}g protein, {}g sugar, {}g fat, {}g saturated fat, {}g fiber, {}g sodium",
                NutritionRecord::display_value(record.energy_kcal_per_100g),
                NutritionRecord::display_value(record.protein_g),
                NutritionRecord::display_value(record.sugar_g),
                NutritionRecord::display_value(record.fat_g),
                NutritionRecord::display_value(record.saturated_fat_g),
                NutritionRecord::display_value(record.fiber_g),
                NutritionRecord::display_value(record.sodium_g),
            );
            out.push('\n');
        }

        if self.is_tie() {
            let _ = writeln!(
                out,
                "Verdict: tie at {}/100, {} is listed first and taken as the pick.",
                self.score_a,
                self.winner_record().name
            );
        } else {
            let _ = writeln!(
                out,
                "Verdict: {} is the healthier choice ({} vs {}).",
                self.winner_record().name,
                self.score_a.max(self.score_b),
                self.score_a.min(self.score_b)
            );
        }
        out.push_str("\nAnalyzed by WiseWhisk.\n");
        out
    }
}

/// A comparison where at least one lookup came back empty
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "missing", rename_all = "snake_case")]
pub enum PartialFailure {
    #[error("no data found for '{query_a}'")]
    MissingA {
        query_a: String,
        record_b: Box<NutritionRecord>,
    },
    #[error("no data found for '{query_b}'")]
    MissingB {
        query_b: String,
        record_a: Box<NutritionRecord>,
    },
    #[error("no data found for '{query_a}' or '{query_b}'")]
    MissingBoth { query_a: String, query_b: String },
}

impl PartialFailure {
    /// Sides whose lookup failed.
    pub fn failed_sides(&self) -> Vec<Side> {
        match self {
            PartialFailure::MissingA { .. } => vec![Side::A],
            PartialFailure::MissingB { .. } => vec![Side::B],
            PartialFailure::MissingBoth { .. } => vec![Side::A, Side::B],
        }
    }
}

/// Orchestrates two lookups and two scores
#[derive(Clone)]
pub struct ComparisonEngine {
    source: Arc<dyn ProductSource>,
    scorer: HealthScorer,
}

impl ComparisonEngine {
    pub fn new(source: Arc<dyn ProductSource>) -> Self {
        Self {
            source,
            scorer: HealthScorer::new(),
        }
    }

    #[instrument(skip(self))]
    pub async fn compare(&self, query_a: &str, query_b: &str) -> Result<ComparisonResult, PartialFailure> {
        let (found_a, found_b) = tokio::join!(
            self.source.find_by_name(query_a),
            self.source.find_by_name(query_b)
        );

        let (record_a, record_b) = match (found_a, found_b) {
            (Some(a), Some(b)) => (a, b),
            (None, Some(b)) => {
                return Err(PartialFailure::MissingA {
                    query_a: query_a.to_string(),
                    record_b: Box::new(b),
                })
            }
            (Some(a), None) => {
                return Err(PartialFailure::MissingB {
                    query_b: query_b.to_string(),
                    record_a: Box::new(a),
                })
            }
            (None, None) => {
                return Err(PartialFailure::MissingBoth {
                    query_a: query_a.to_string(),
                    query_b: query_b.to_string(),
                })
            }
        };

        let score_a = self.scorer.score(&record_a);
        let score_b = self.scorer.score(&record_b);
        let winner = if score_b > score_a { Side::B } else { Side::A };

        info!(
            "Compared '{}' ({}) with '{}' ({}): winner {:?}",
            record_a.name, score_a, record_b.name, score_b, winner
        );

        Ok(ComparisonResult {
            query_a: query_a.to_string(),
            query_b: query_b.to_string(),
            record_a,
            record_b,
            score_a,
            score_b,
            winner,
        })
    }
}

/// Extracts the two item names from a chat prompt such as
/// `"Compare Coke vs Pepsi"` or `"oats and granola side by side"`.
pub fn split_comparison_query(prompt: &str) -> Option<(String, String)> {
    let lowered = prompt.to_lowercase();
    let cleaned = lowered
        .replace("compare", "")
        .replace("versus", "vs")
        .replace("side by side", "");

    let mut items: Vec<&str> = cleaned.split(" vs ").collect();
    if items.len() < 2 {
        items = lowered.split(" and ").collect();
    }

    let first = items.first()?.trim();
    let second = items.get(1)?.trim();
    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some((first.to_string(), second.to_string()))
}
