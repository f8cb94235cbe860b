//! # Engine Module
//!
//! Rules engine behind the WiseWhisk chat. Pure, network-free components plus
//! the orchestrators that drive them through a [`ProductSource`](crate::lookup::ProductSource).
//!
//! ## Components
//! - `intent`: keyword-based intent classification
//! - `ingredients`: ingredient list parsing and quick warnings
//! - `allergens`: allergen detection against a fixed keyword table
//! - `scoring`: 0-100 health score heuristic
//! - `comparison`: concurrent two-product comparison
//! - `copilot`: chat orchestrator

pub mod allergens;
pub mod comparison;
pub mod copilot;
pub mod ingredients;
pub mod intent;
pub mod scoring;

pub use allergens::{AllergenDetector, ALLERGEN_KEYWORDS};
pub use comparison::{split_comparison_query, ComparisonEngine, ComparisonResult, PartialFailure, Side};
pub use copilot::{AllergenCheck, ChatReply, Copilot, ProductReport, QuickAnalysis, ReplyKind, SafetyReport};
pub use ingredients::{IngredientParser, IngredientWarning};
pub use intent::{Intent, IntentClassifier, IntentResult};
pub use scoring::{HealthScorer, NutrientWarning, ScoreAdjustment};
