// src/pages/mod.rs
//! One controller per page, plus the context every controller is handed.

use std::collections::VecDeque;
use std::time::Duration;

use strum_macros::{Display, IntoStaticStr};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::broadcast::{self, AppEvent};
use crate::document::{Dialog, Document};
use crate::model::{
    NewMeal, NewWorkout, NoteCategory, NoteDraft, ProfileField, Settings, SettingsFlag, Theme, Units,
};
use crate::render::CategoryFilter;
use crate::state::AppState;
use crate::store::StoreError;

mod dashboard;
mod notes;
mod nutrition;
mod settings;
mod workout;

pub use dashboard::{DashboardPage, MOTIVATIONAL_QUOTES};
pub use notes::NotesPage;
pub use nutrition::NutritionPage;
pub use settings::SettingsPage;
pub use workout::WorkoutPage;

pub const SAVE_FAILED_MESSAGE: &str =
    "Unable to save data. Your browser may have disabled localStorage or storage is full.";
pub const EXPORT_DONE_MESSAGE: &str = "Data exported successfully!";
pub const IMPORT_DONE_MESSAGE: &str = "Data imported successfully!";
pub const IMPORT_FAILED_MESSAGE: &str = "Error importing data. Please check the file format.";
pub const RESET_DONE_MESSAGE: &str = "All data has been reset!";
pub const CONFIRM_DELETE_NOTE: &str = "Are you sure you want to delete this note?";
pub const CONFIRM_RESET: &str =
    "Are you sure you want to reset all data? This action cannot be undone.";

/// Delay between a finished import/reset and the page reload.
pub const RELOAD_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PageId {
    Dashboard,
    Workout,
    Nutrition,
    Notes,
    Settings,
    Unknown,
}

impl PageId {
    /// Picks the page from the last segment of a location path.
    /// Query strings and fragments are ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        match path.rsplit('/').next().unwrap_or_default() {
            "" | "index.html" => Self::Dashboard,
            "workout.html" => Self::Workout,
            "nutrition.html" => Self::Nutrition,
            "note.html" => Self::Notes,
            "settings.html" => Self::Settings,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn file_name(self) -> Option<&'static str> {
        match self {
            Self::Dashboard => Some("index.html"),
            Self::Workout => Some("workout.html"),
            Self::Nutrition => Some("nutrition.html"),
            Self::Notes => Some("note.html"),
            Self::Settings => Some("settings.html"),
            Self::Unknown => None,
        }
    }

    #[must_use]
    pub fn controller(self) -> Box<dyn Page> {
        match self {
            Self::Dashboard => Box::new(DashboardPage::default()),
            Self::Workout => Box::new(WorkoutPage::default()),
            Self::Nutrition => Box::new(NutritionPage),
            Self::Notes => Box::new(NotesPage::default()),
            Self::Settings => Box::new(SettingsPage),
            Self::Unknown => Box::new(NoPage),
        }
    }
}

/// Something the user did on a page.
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Action {
    // Workout page
    FilterWorkouts(CategoryFilter),
    AddWorkout(NewWorkout),
    ToggleWorkout(i64),
    DeleteWorkout(i64),

    // Nutrition page
    AddMeal(NewMeal),
    /// Moves a meal back into the form: fills the inputs and removes the meal.
    EditMeal(i64),
    /// Swaps a meal for new values in one step. Nothing is removed when the
    /// new values are rejected.
    ReplaceMeal { id: i64, meal: NewMeal },
    DeleteMeal(i64),
    SetCalorieGoal(i64),

    // Notes page
    SearchNotes(String),
    FilterNotes(Option<NoteCategory>),
    NewNote,
    EditNote(i64),
    /// Submits the note form. A draft carrying an image is saved once the
    /// image has been read.
    SaveNote(NoteDraft),
    DeleteNote(i64),
    TogglePin(i64),
    ToggleStar(i64),
    DropNote { dragged: i64, target: i64 },
    AttachNoteImage { id: i64, data_uri: String },

    // Settings page
    SetFlag(SettingsFlag, bool),
    SetUnits(Units),
    SetTheme(Theme),
    SetAccentColor(String),
    SetProfileField(ProfileField, String),
    UploadProfileImage(String),
    ExportData,
    /// Contents of the chosen backup file.
    ImportData(String),
    ResetAllData,

    // Every page
    ToggleTheme,
    VisibilityChanged(bool),
    AvatarClicked,
}

impl Action {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// A file read started by a page. It completes on a later `Tab::pump`.
#[derive(Debug, Clone, PartialEq)]
pub enum FileRead {
    NoteForm { editing: Option<i64>, draft: NoteDraft },
    NoteImage { id: i64, data_uri: String },
    ProfileImage(String),
    Import(String),
}

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Action '{action}' is not available on the {page} page")]
    ActionNotSupported { page: PageId, action: &'static str },
    #[error("Calorie goal must be a positive number (got {0})")]
    InvalidCalorieGoal(i64),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl PageError {
    pub(crate) fn unsupported(page: PageId, action: &Action) -> Self {
        Self::ActionNotSupported {
            page,
            action: action.name(),
        }
    }
}

/// Everything a page may touch while handling one event.
pub struct PageContext<'a> {
    pub state: &'a mut AppState,
    pub document: &'a mut Document,
    pub(crate) dialog: &'a mut dyn Dialog,
    pub(crate) events: &'a mut VecDeque<AppEvent>,
    pub(crate) reads: &'a mut VecDeque<FileRead>,
    pub(crate) reload_at: &'a mut Option<Duration>,
    pub(crate) now: Duration,
}

impl PageContext<'_> {
    pub fn alert(&mut self, message: &str) {
        info!(message, "alert shown");
        self.document.record_alert(message);
        self.dialog.alert(message);
    }

    pub fn confirm(&mut self, message: &str) -> bool {
        let answer = self.dialog.confirm(message);
        debug!(message, answer, "confirmation answered");
        answer
    }

    /// Reports a failed write to the user. The value of a successful write is
    /// passed through.
    pub fn saved<T>(&mut self, result: Result<T, StoreError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                error!(error = %e, "error saving data");
                self.alert(SAVE_FAILED_MESSAGE);
                None
            }
        }
    }

    /// Changes the settings, stores them and announces the change to this
    /// tab and to every other tab sharing the store.
    pub fn change_settings(&mut self, f: impl FnOnce(&mut Settings)) {
        let written = self.state.update_settings(f);
        let settings = self.state.settings().clone();
        let result = match written {
            Ok(()) => broadcast::publish(self.events, self.state.storage(), &settings),
            Err(e) => {
                self.events.push_back(AppEvent::SettingsUpdated(settings));
                Err(e)
            }
        };
        self.saved(result);
    }

    pub fn start_read(&mut self, read: FileRead) {
        debug!(?read, "file read started");
        self.reads.push_back(read);
    }

    pub fn schedule_reload(&mut self) {
        *self.reload_at = Some(self.now + RELOAD_DELAY);
        debug!(delay_ms = %RELOAD_DELAY.as_millis(), "reload scheduled");
    }
}

pub trait Page {
    fn id(&self) -> PageId;

    /// Fills the freshly loaded document.
    fn init(&mut self, ctx: &mut PageContext<'_>);

    /// # Errors
    /// Returns `PageError` when the action does not belong to this page or its
    /// input is rejected.
    fn handle(&mut self, ctx: &mut PageContext<'_>, action: Action) -> Result<(), PageError>;

    /// Called after the tab adopted new settings and re-applied the theme.
    fn on_settings_changed(&mut self, _ctx: &mut PageContext<'_>) {}

    /// # Errors
    /// Returns `PageError` when the completed read cannot be used.
    fn on_file_read(&mut self, _ctx: &mut PageContext<'_>, read: FileRead) -> Result<(), PageError> {
        debug!(page = %self.id(), ?read, "file read not handled by this page");
        Ok(())
    }

    fn teardown(&mut self, _ctx: &mut PageContext<'_>) {}
}

/// Controller for locations that are not one of the application's pages.
/// Only the behaviour shared by every page runs.
pub struct NoPage;

impl Page for NoPage {
    fn id(&self) -> PageId {
        PageId::Unknown
    }

    fn init(&mut self, _ctx: &mut PageContext<'_>) {}

    fn handle(&mut self, _ctx: &mut PageContext<'_>, action: Action) -> Result<(), PageError> {
        Err(PageError::unsupported(PageId::Unknown, &action))
    }
}
