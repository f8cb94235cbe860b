//! Per-user session state.
//!
//! A [`Session`] owns everything that changes while someone uses the copilot:
//! profile, activity log, chat transcript, custom ingredients and counters.
//! Sessions never share state; the [`SessionStore`] only hands them out by id.

use std::collections::HashMap;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::activity::{ActionKind, ActivityLog};
use crate::engine::allergens::AllergenDetector;
use crate::error::AppResult;
use crate::models::{ChatMessage, CustomIngredient, NutritionRecord, UserProfile};

/// First assistant message of every transcript.
pub const WELCOME_MESSAGE: &str = "Hi! I'm WiseWhisk, your ingredient co-pilot. I can:\n\
- Compare products: \"Compare Coke vs Pepsi\"\n\
- Check safety against your profile: \"Is Nutella safe for diabetics?\"\n\
- Look up nutrition: \"Calories in oat milk\"\n\
- Scan barcodes and analyze ingredient lists";

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    profile: UserProfile,
    activity: ActivityLog,
    transcript: Vec<ChatMessage>,
    custom_ingredients: Vec<CustomIngredient>,
    analysis_count: u32,
    comparisons_made: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            profile: UserProfile::default(),
            activity: ActivityLog::new(),
            transcript: vec![ChatMessage::assistant(WELCOME_MESSAGE)],
            custom_ingredients: Vec::new(),
            analysis_count: 0,
            comparisons_made: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn activity_mut(&mut self) -> &mut ActivityLog {
        &mut self.activity
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn custom_ingredients(&self) -> &[CustomIngredient] {
        &self.custom_ingredients
    }

    pub fn analysis_count(&self) -> u32 {
        self.analysis_count
    }

    pub fn comparisons_made(&self) -> u32 {
        self.comparisons_made
    }

    /// Replaces the profile after validation. Allergy names are normalized to
    /// the allergen table's spelling where one exists.
    pub fn update_profile(&mut self, mut profile: UserProfile) -> AppResult<()> {
        profile.validate()?;
        profile.allergies = profile
            .allergies
            .iter()
            .map(|a| AllergenDetector::canonical_name(a))
            .filter(|a| !a.is_empty())
            .collect();

        info!(session = %self.id, allergies = profile.allergies.len(), "Profile updated");
        self.profile = profile;
        self.activity.record(ActionKind::ProfileUpdate, "Updated health profile");
        Ok(())
    }

    pub fn add_custom_ingredient(&mut self, mut ingredient: CustomIngredient) -> AppResult<()> {
        ingredient.name = ingredient.name.trim().to_string();
        ingredient.validate()?;

        info!(session = %self.id, "Custom ingredient added: {}", ingredient.name);
        self.activity
            .record(ActionKind::AddIngredient, format!("Added {}", ingredient.name));
        self.custom_ingredients.push(ingredient);
        Ok(())
    }

    pub fn clear_custom_ingredients(&mut self) {
        self.custom_ingredients.clear();
    }

    /// First custom ingredient whose name contains `query`, case-insensitively.
    pub fn find_custom(&self, query: &str) -> Option<NutritionRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.custom_ingredients
            .iter()
            .find(|c| c.name.to_lowercase().contains(&needle))
            .map(CustomIngredient::to_record)
    }

    pub(crate) fn push_message(&mut self, message: ChatMessage) {
        self.transcript.push(message);
    }

    pub(crate) fn count_analysis(&mut self) {
        self.analysis_count += 1;
    }

    pub(crate) fn count_comparison(&mut self) {
        self.comparisons_made += 1;
    }
}

/// Independent sessions keyed by id
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<Uuid, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a fresh session and returns its id.
    pub fn create(&mut self) -> Uuid {
        let session = Session::new();
        let id = session.id();
        info!(session = %id, "Session created");
        self.sessions.insert(id, session);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    /// Removes the session, returning its final state.
    pub fn end(&mut self, id: &Uuid) -> Option<Session> {
        let ended = self.sessions.remove(id);
        if ended.is_some() {
            info!(session = %id, "Session ended");
        }
        ended
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
