//! FitLife: workouts, meals, notes and display settings kept in a shared
//! key-value store, rendered by one controller per page.
//!
//! The browser is modelled headlessly. A [`SharedStore`] stands in for the
//! origin's storage, each [`Tab`] is one page load with its own [`Document`],
//! and tabs learn about each other's settings changes through storage events.

pub mod broadcast;
pub mod config;
pub mod document;
pub mod model;
pub mod pages;
pub mod render;
pub mod state;
pub mod store;
pub mod sync;
pub mod tab;
pub mod transfer;

pub use config::{
    get_config_path as get_config_path_util, load_config as load_config_util, parse_color,
    save_config as save_config_util, Config, ConfigError, StandardColor,
};
pub use document::{Dialog, Document, ScriptedDialog};
pub use model::{
    Meal, NewMeal, NewWorkout, Note, NoteCategory, NoteDraft, Profile, ProfileField, Settings,
    SettingsFlag, Theme, Units, Workout, WorkoutCategory,
};
pub use pages::{Action, PageError, PageId};
pub use state::AppState;
pub use store::{default_store_path, KeyValueStore, MemoryStore, SqliteStore, StoreError};
pub use sync::{SharedStore, StorageEvent, TabStorage};
pub use tab::Tab;
