// src/transfer.rs
//! Files going in and out: backups written by export and read back by
//! import, and pictures read for notes and the profile.

use std::path::Path;

use base64::{engine::general_purpose, Engine};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Serialize};

use crate::model::{Meal, Note, Settings, Workout};

/// Everything a backup file contains.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle<'a> {
    pub workouts: &'a [Workout],
    pub meals: &'a [Meal],
    pub notes: &'a [Note],
    pub settings: &'a Settings,
    pub export_date: DateTime<Utc>,
}

/// Pretty-printed JSON for a backup file.
/// # Errors
/// Returns `serde_json::Error` if serialization fails.
pub fn export_json(bundle: &ExportBundle<'_>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(bundle)
}

#[must_use]
pub fn export_filename(date: NaiveDate) -> String {
    format!("fitlife-backup-{}.json", date.format("%Y-%m-%d"))
}

/// A parsed backup file. Any subset of the collections may be present;
/// extra keys such as `exportDate` are ignored.
#[derive(Deserialize, Debug, Default)]
pub struct ImportBundle {
    #[serde(default)]
    pub workouts: Option<Vec<Workout>>,
    #[serde(default)]
    pub meals: Option<Vec<Meal>>,
    #[serde(default)]
    pub notes: Option<Vec<Note>>,
    #[serde(default)]
    pub settings: Option<Settings>,
}

impl ImportBundle {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.workouts.is_none() && self.meals.is_none() && self.notes.is_none() && self.settings.is_none()
    }
}

/// # Errors
/// Returns `serde_json::Error` when `contents` is not a JSON object of the
/// expected shape, or when its settings carry a calorie goal of zero.
pub fn parse_import(contents: &str) -> Result<ImportBundle, serde_json::Error> {
    let bundle: ImportBundle = serde_json::from_str(contents)?;
    if bundle.settings.as_ref().is_some_and(|s| s.calorie_goal == 0) {
        return Err(de::Error::custom("calorieGoal must be a positive integer"));
    }
    Ok(bundle)
}

/// Reads a picture into the `data:` URI form stored for note images and the
/// profile picture.
/// # Errors
/// Returns the I/O error if the file cannot be read.
pub fn image_data_uri(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(format!(
        "data:{};base64,{}",
        mime.essence_str(),
        general_purpose::STANDARD.encode(bytes)
    ))
}
