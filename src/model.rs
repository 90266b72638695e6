// src/model.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Units {
    #[default]
    Metric, // e.g., kg, cm
    Imperial, // e.g., lbs, in
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

// Stored categories are free text. Known names are matched without regard to
// case; any other label is kept as `Custom` and written back as it was read.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
#[serde(from = "String", into = "String")]
pub enum WorkoutCategory {
    Legs,
    Arms,
    Core,
    #[default]
    Other,
    Custom(String),
}

impl WorkoutCategory {
    /// One of the built-in categories, or `None` for any other label.
    #[must_use]
    pub fn known(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "legs" => Some(Self::Legs),
            "arms" => Some(Self::Arms),
            "core" => Some(Self::Core),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Legs => "legs",
            Self::Arms => "arms",
            Self::Core => "core",
            Self::Other => "other",
            Self::Custom(label) => label,
        }
    }

    /// Icon token shown next to a workout of this category.
    #[must_use]
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Legs => "directions_run",
            Self::Arms => "fitness_center",
            Self::Core => "self_improvement",
            Self::Other | Self::Custom(_) => "exercise",
        }
    }
}

impl From<String> for WorkoutCategory {
    fn from(value: String) -> Self {
        if value.trim().is_empty() {
            return Self::Other;
        }
        Self::known(&value).unwrap_or(Self::Custom(value))
    }
}

impl From<WorkoutCategory> for String {
    fn from(value: WorkoutCategory) -> Self {
        match value {
            WorkoutCategory::Custom(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for WorkoutCategory {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.to_string().into())
    }
}

impl fmt::Display for WorkoutCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
#[serde(from = "String", into = "String")]
pub enum NoteCategory {
    Workout,
    Nutrition,
    Personal,
    #[default]
    Other,
    Custom(String),
}

impl NoteCategory {
    #[must_use]
    pub fn known(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "workout" => Some(Self::Workout),
            "nutrition" => Some(Self::Nutrition),
            "personal" => Some(Self::Personal),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Workout => "workout",
            Self::Nutrition => "nutrition",
            Self::Personal => "personal",
            Self::Other => "other",
            Self::Custom(label) => label,
        }
    }
}

impl From<String> for NoteCategory {
    fn from(value: String) -> Self {
        if value.trim().is_empty() {
            return Self::Other;
        }
        Self::known(&value).unwrap_or(Self::Custom(value))
    }
}

impl From<NoteCategory> for String {
    fn from(value: NoteCategory) -> Self {
        match value {
            NoteCategory::Custom(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for NoteCategory {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.to_string().into())
    }
}

impl fmt::Display for NoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Workout {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sets: i64,
    #[serde(default)]
    pub reps: i64,
    #[serde(default)]
    pub category: WorkoutCategory,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub icon: String,
}

/// Form data for a workout that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkout {
    pub name: String,
    pub sets: i64,
    pub reps: i64,
    pub category: WorkoutCategory,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Meal {
    pub id: i64,
    pub food: String,
    #[serde(default)]
    pub portion: String,
    #[serde(default)]
    pub calories: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMeal {
    pub food: String,
    pub portion: String,
    pub calories: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: NoteCategory,
    /// Attached picture as a data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub starred: bool,
    pub timestamp: DateTime<Utc>,
}

/// Contents of the note form, used for both creating and editing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    pub image: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub age: Option<f64>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Alex Johnson".to_string(),
            email: "alex.j@example.com".to_string(),
            age: Some(28.0),
            weight: Some(70.0),
            height: Some(175.0),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub calorie_goal: u32,
    pub units: Units,
    pub motivational_quotes: bool,
    pub theme: Theme,
    pub accent_color: String,
    // The three reminder flags are stored but nothing acts on them yet.
    pub workout_reminders: bool,
    pub nutrition_reminders: bool,
    pub progress_updates: bool,
    pub profile: Profile,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            calorie_goal: 2500,
            units: Units::Metric,
            motivational_quotes: true,
            theme: Theme::Dark,
            accent_color: "#13ecc8".to_string(),
            workout_reminders: true,
            nutrition_reminders: true,
            progress_updates: false,
            profile: Profile::default(),
        }
    }
}

/// Boolean switches on the settings page, keyed by their checkbox element id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum SettingsFlag {
    MotivationalQuotes,
    WorkoutReminders,
    NutritionReminders,
    ProgressUpdates,
}

impl Settings {
    #[must_use]
    pub const fn flag(&self, flag: SettingsFlag) -> bool {
        match flag {
            SettingsFlag::MotivationalQuotes => self.motivational_quotes,
            SettingsFlag::WorkoutReminders => self.workout_reminders,
            SettingsFlag::NutritionReminders => self.nutrition_reminders,
            SettingsFlag::ProgressUpdates => self.progress_updates,
        }
    }

    pub fn set_flag(&mut self, flag: SettingsFlag, value: bool) {
        match flag {
            SettingsFlag::MotivationalQuotes => self.motivational_quotes = value,
            SettingsFlag::WorkoutReminders => self.workout_reminders = value,
            SettingsFlag::NutritionReminders => self.nutrition_reminders = value,
            SettingsFlag::ProgressUpdates => self.progress_updates = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProfileField {
    Name,
    Email,
    Age,
    Weight,
    Height,
}

impl ProfileField {
    /// Element id of the matching input on the settings page.
    #[must_use]
    pub const fn input_id(self) -> &'static str {
        match self {
            Self::Name => "userName",
            Self::Email => "userEmail",
            Self::Age => "userAge",
            Self::Weight => "userWeight",
            Self::Height => "userHeight",
        }
    }
}

impl Profile {
    /// Sets a field from raw form text. Numeric fields that fail to parse are cleared.
    pub fn set_field(&mut self, field: ProfileField, raw: &str) {
        let number = || raw.trim().parse::<f64>().ok().filter(|n| n.is_finite());
        match field {
            ProfileField::Name => self.name = raw.to_string(),
            ProfileField::Email => self.email = raw.to_string(),
            ProfileField::Age => self.age = number(),
            ProfileField::Weight => self.weight = number(),
            ProfileField::Height => self.height = number(),
        }
    }

    #[must_use]
    pub fn field_text(&self, field: ProfileField) -> String {
        let number = |n: Option<f64>| n.map_or_else(String::new, |v| v.to_string());
        match field {
            ProfileField::Name => self.name.clone(),
            ProfileField::Email => self.email.clone(),
            ProfileField::Age => number(self.age),
            ProfileField::Weight => number(self.weight),
            ProfileField::Height => number(self.height),
        }
    }
}

/// Entry of the `workout_todos` list kept by the separate workout planner.
/// Only the fields the dashboard needs are read.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct WorkoutTodo {
    pub completed: bool,
    pub calories: Option<f64>,
}

// --- Seed data used when a collection is missing from storage ---

#[must_use]
pub fn default_workouts() -> Vec<Workout> {
    let seed = [
        (1, "Squats", 12, WorkoutCategory::Legs, "fitness_center"),
        (2, "Push-ups", 15, WorkoutCategory::Arms, "exercise"),
        (3, "Crunches", 20, WorkoutCategory::Core, "self_improvement"),
        (4, "Pull-ups", 10, WorkoutCategory::Arms, "sports_gymnastics"),
        (5, "Lunges", 15, WorkoutCategory::Legs, "accessibility_new"),
    ];
    seed.into_iter()
        .map(|(id, name, reps, category, icon)| Workout {
            id,
            name: name.to_string(),
            sets: 3,
            reps,
            category,
            completed: false,
            icon: icon.to_string(),
        })
        .collect()
}

#[must_use]
pub fn default_meals(now: DateTime<Utc>) -> Vec<Meal> {
    let seed = [
        (1, "Grilled Chicken Salad", "1 bowl", 350),
        (2, "Greek Yogurt", "1 cup", 150),
        (3, "Banana", "1 medium", 105),
    ];
    seed.into_iter()
        .map(|(id, food, portion, calories)| Meal {
            id,
            food: food.to_string(),
            portion: portion.to_string(),
            calories,
            timestamp: now,
        })
        .collect()
}

#[must_use]
pub fn default_notes(now: DateTime<Utc>) -> Vec<Note> {
    let seed = [
        (1, "Morning Run", "A quick run to start the day", NoteCategory::Workout),
        (2, "Evening Yoga", "Relaxing yoga session", NoteCategory::Workout),
        (3, "Healthy Recipes", "Collection of healthy recipes", NoteCategory::Nutrition),
    ];
    seed.into_iter()
        .map(|(id, title, content, category)| Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
            category,
            image: None,
            pinned: false,
            starred: false,
            timestamp: now,
        })
        .collect()
}
