//! Session activity log.
//!
//! Append-only record of what the user did during a session. Entries are never
//! edited; the only removal is an explicit [`ActivityLog::clear`]. There is no
//! size bound: a session's log lives and dies with the session.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Timestamp format used in exports.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Well-known action kinds recorded by the copilot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Comparison,
    SafetyCheck,
    NutritionQuery,
    BarcodeScan,
    QuickAnalysis,
    ProfileUpdate,
    AddIngredient,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Comparison => "Comparison",
            ActionKind::SafetyCheck => "Safety Check",
            ActionKind::NutritionQuery => "Nutrition Query",
            ActionKind::BarcodeScan => "Barcode Scan",
            ActionKind::QuickAnalysis => "Quick Analysis",
            ActionKind::ProfileUpdate => "Profile Update",
            ActionKind::AddIngredient => "Add Ingredient",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.label().to_string()
    }
}

/// A single logged action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub action_kind: String,
    pub details: String,
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    timestamp: String,
    action_type: &'a str,
    details: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: Vec<HistoryEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry stamped with the current local time.
    pub fn record(&mut self, kind: impl Into<String>, details: impl Into<String>) {
        self.entries.push(HistoryEntry {
            timestamp: Local::now(),
            action_kind: kind.into(),
            details: details.into(),
        });
    }

    /// Returns up to `n` entries, most recent first.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        self.entries.iter().rev().take(n).cloned().collect()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Serializes the log as CSV (`timestamp,action_type,details`), oldest first.
    pub fn to_csv(&self) -> AppResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for entry in &self.entries {
            writer.serialize(HistoryRow {
                timestamp: entry.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                action_type: &entry.action_kind,
                details: &entry.details,
            })?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Io(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| AppError::Validation(format!("History export is not UTF-8: {}", e)))
    }
}
