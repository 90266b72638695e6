// src/document.rs
//! Headless stand-in for the page DOM.
//!
//! Pages write rendered fragments, text, form values and style properties into
//! a [`Document`]; callers (the CLI, tests) read them back. Nothing here knows
//! about the application's data.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Element ids shared by the pages and their readers.
pub mod ids {
    pub const WORKOUT_LIST: &str = "workoutList";
    pub const MEALS_LIST: &str = "mealsList";
    pub const NOTES_GRID: &str = "notesGrid";
    pub const CALORIE_SUMMARY: &str = "calorieSummary";

    pub const TOTAL_CALORIES: &str = "totalCalories";
    pub const CALORIES_BURNED: &str = "dashboardCaloriesBurned";
    pub const MOTIVATION_CARD: &str = "motivationCard";
    pub const MOTIVATION_TEXT: &str = "motivationText";

    pub const CURRENT_CALORIES: &str = "currentCalories";
    pub const GOAL_CALORIES: &str = "goalCalories";
    pub const PROGRESS_PERCENTAGE: &str = "progressPercentage";
    pub const SUMMARY_DESCRIPTION: &str = "summaryDescription";
    pub const FOOD_INPUT: &str = "foodInput";
    pub const PORTION_INPUT: &str = "portionInput";
    pub const CALORIES_INPUT: &str = "caloriesInput";

    pub const NOTE_TITLE: &str = "noteTitle";
    pub const NOTE_CONTENT: &str = "noteContent";
    pub const NOTE_CATEGORY: &str = "noteCategory";
    pub const NOTE_MODAL_TITLE: &str = "modalTitle";
    pub const NOTE_SAVE_BUTTON: &str = "saveNoteBtn";
    pub const NOTE_SEARCH: &str = "noteSearch";

    pub const SETTINGS_GOAL_DISPLAY: &str = "settingsGoalDisplay";
    pub const CALORIE_GOAL_INPUT: &str = "calorieGoal";
    pub const THEME_ICON: &str = "themeIcon";
}

/// Groups of mutually exclusive buttons; one value per group is "active".
pub mod groups {
    pub const WORKOUT_FILTER: &str = "filter";
    pub const NOTE_CATEGORY_FILTER: &str = "noteFilter";
    pub const UNITS: &str = "unit";
    pub const THEME: &str = "theme";
    pub const ACCENT_COLOR: &str = "color";
}

/// Blocking prompts shown to the user.
pub trait Dialog {
    /// Asks a yes/no question. `true` means the user confirmed.
    fn confirm(&mut self, message: &str) -> bool;
    fn alert(&mut self, message: &str);
}

/// Dialog that answers confirmations from a script and swallows alerts.
/// Once the script runs out, `fallback` is used.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDialog {
    answers: VecDeque<bool>,
    fallback: bool,
}

impl ScriptedDialog {
    #[must_use]
    pub fn accepting() -> Self {
        Self {
            answers: VecDeque::new(),
            fallback: true,
        }
    }

    #[must_use]
    pub fn declining() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_answers(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            fallback: false,
        }
    }
}

impl Dialog for ScriptedDialog {
    fn confirm(&mut self, _message: &str) -> bool {
        self.answers.pop_front().unwrap_or(self.fallback)
    }

    fn alert(&mut self, _message: &str) {}
}

/// A file offered to the user for saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub contents: String,
}

#[derive(Debug, Default, Clone)]
pub struct Document {
    location: String,
    containers: BTreeMap<String, String>,
    text: BTreeMap<String, String>,
    values: BTreeMap<String, String>,
    checked: BTreeMap<String, bool>,
    readonly: BTreeSet<String>,
    hidden: BTreeSet<String>,
    root_attributes: BTreeMap<String, String>,
    body_attributes: BTreeMap<String, String>,
    style_properties: BTreeMap<String, String>,
    active: BTreeMap<String, String>,
    avatar_image: Option<String>,
    alerts: Vec<String>,
    downloads: Vec<Download>,
    navigation: Option<String>,
}

impl Document {
    #[must_use]
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Replaces the whole content of a container.
    pub fn set_inner_html(&mut self, id: &str, html: String) {
        self.containers.insert(id.to_string(), html);
    }

    #[must_use]
    pub fn inner_html(&self, id: &str) -> Option<&str> {
        self.containers.get(id).map(String::as_str)
    }

    pub fn set_text(&mut self, id: &str, text: impl Into<String>) {
        self.text.insert(id.to_string(), text.into());
    }

    #[must_use]
    pub fn text(&self, id: &str) -> Option<&str> {
        self.text.get(id).map(String::as_str)
    }

    pub fn set_value(&mut self, id: &str, value: impl Into<String>) {
        self.values.insert(id.to_string(), value.into());
    }

    #[must_use]
    pub fn value(&self, id: &str) -> Option<&str> {
        self.values.get(id).map(String::as_str)
    }

    pub fn clear_values(&mut self, ids: &[&str]) {
        for id in ids {
            self.values.remove(*id);
        }
    }

    pub fn set_checked(&mut self, id: &str, checked: bool) {
        self.checked.insert(id.to_string(), checked);
    }

    #[must_use]
    pub fn is_checked(&self, id: &str) -> Option<bool> {
        self.checked.get(id).copied()
    }

    pub fn set_readonly(&mut self, id: &str) {
        self.readonly.insert(id.to_string());
    }

    #[must_use]
    pub fn is_readonly(&self, id: &str) -> bool {
        self.readonly.contains(id)
    }

    pub fn set_hidden(&mut self, id: &str, hidden: bool) {
        if hidden {
            self.hidden.insert(id.to_string());
        } else {
            self.hidden.remove(id);
        }
    }

    #[must_use]
    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden.contains(id)
    }

    pub fn set_root_attribute(&mut self, name: &str, value: &str) {
        self.root_attributes.insert(name.to_string(), value.to_string());
    }

    #[must_use]
    pub fn root_attribute(&self, name: &str) -> Option<&str> {
        self.root_attributes.get(name).map(String::as_str)
    }

    pub fn set_body_attribute(&mut self, name: &str, value: &str) {
        self.body_attributes.insert(name.to_string(), value.to_string());
    }

    #[must_use]
    pub fn body_attribute(&self, name: &str) -> Option<&str> {
        self.body_attributes.get(name).map(String::as_str)
    }

    pub fn set_style_property(&mut self, name: &str, value: impl Into<String>) {
        self.style_properties.insert(name.to_string(), value.into());
    }

    #[must_use]
    pub fn style_property(&self, name: &str) -> Option<&str> {
        self.style_properties.get(name).map(String::as_str)
    }

    /// Marks `value` as the active button of `group`, deactivating the others.
    pub fn set_active(&mut self, group: &str, value: impl Into<String>) {
        self.active.insert(group.to_string(), value.into());
    }

    #[must_use]
    pub fn active(&self, group: &str) -> Option<&str> {
        self.active.get(group).map(String::as_str)
    }

    pub fn set_avatar_image(&mut self, data_uri: Option<String>) {
        self.avatar_image = data_uri;
    }

    #[must_use]
    pub fn avatar_image(&self) -> Option<&str> {
        self.avatar_image.as_deref()
    }

    pub(crate) fn record_alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    /// Every alert shown on this page load, oldest first.
    #[must_use]
    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn offer_download(&mut self, filename: String, contents: String) {
        self.downloads.push(Download { filename, contents });
    }

    #[must_use]
    pub fn downloads(&self) -> &[Download] {
        &self.downloads
    }

    pub fn navigate(&mut self, target: &str) {
        self.navigation = Some(target.to_string());
    }

    /// Where the user asked to go, if anywhere.
    #[must_use]
    pub fn navigation(&self) -> Option<&str> {
        self.navigation.as_deref()
    }
}
