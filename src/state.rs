// src/state.rs
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{
    default_meals, default_notes, default_workouts, Meal, NewMeal, NewWorkout, Note, NoteDraft,
    Settings, Workout,
};
use crate::store::{StoreError, MEALS_KEY, NOTES_KEY, SETTINGS_KEY, WORKOUTS_KEY};
use crate::sync::TabStorage;

/// The collections that are written back to storage as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Workouts,
    Meals,
    Notes,
    Settings,
}

impl Collection {
    pub const ALL: [Self; 4] = [Self::Workouts, Self::Meals, Self::Notes, Self::Settings];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Workouts => WORKOUTS_KEY,
            Self::Meals => MEALS_KEY,
            Self::Notes => NOTES_KEY,
            Self::Settings => SETTINGS_KEY,
        }
    }
}

/// In-memory snapshot of everything the pages show, bound to one tab's storage.
///
/// Every mutator changes memory first and then writes the affected collection.
/// When that write fails the change is kept in memory and the error is returned;
/// memory and storage disagree until a later write succeeds.
pub struct AppState {
    storage: TabStorage,
    workouts: Vec<Workout>,
    meals: Vec<Meal>,
    notes: Vec<Note>,
    settings: Settings,
    last_id: i64,
}

/// Parses the JSON stored under `key`. Missing or malformed values give `None`;
/// only a failing backend is an error.
pub(crate) fn read_json<T: DeserializeOwned>(
    storage: &TabStorage,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "stored value is not valid, using defaults");
            Ok(None)
        }
    }
}

impl AppState {
    /// Builds the snapshot from storage, falling back to seed data per collection.
    /// # Errors
    /// Returns `StoreError` only when the storage backend itself cannot be read.
    pub fn load(storage: TabStorage) -> Result<Self, StoreError> {
        let now = Utc::now();
        let workouts = read_json(&storage, WORKOUTS_KEY)?.unwrap_or_else(default_workouts);
        let meals = read_json(&storage, MEALS_KEY)?.unwrap_or_else(|| default_meals(now));
        let notes = read_json(&storage, NOTES_KEY)?.unwrap_or_else(|| default_notes(now));
        let settings = read_json(&storage, SETTINGS_KEY)?.unwrap_or_default();
        let mut state = Self {
            storage,
            workouts,
            meals,
            notes,
            settings,
            last_id: 0,
        };
        state.last_id = state.max_id();
        debug!(
            workouts = state.workouts.len(),
            meals = state.meals.len(),
            notes = state.notes.len(),
            "application state loaded"
        );
        Ok(state)
    }

    /// Re-reads every collection, discarding in-memory changes.
    /// # Errors
    /// Returns `StoreError` when the storage backend cannot be read.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        let now = Utc::now();
        self.workouts = read_json(&self.storage, WORKOUTS_KEY)?.unwrap_or_else(default_workouts);
        self.meals = read_json(&self.storage, MEALS_KEY)?.unwrap_or_else(|| default_meals(now));
        self.notes = read_json(&self.storage, NOTES_KEY)?.unwrap_or_else(|| default_notes(now));
        self.settings = read_json(&self.storage, SETTINGS_KEY)?.unwrap_or_default();
        self.last_id = self.max_id();
        Ok(())
    }

    fn max_id(&self) -> i64 {
        let workouts = self.workouts.iter().map(|w| w.id);
        let meals = self.meals.iter().map(|m| m.id);
        let notes = self.notes.iter().map(|n| n.id);
        workouts.chain(meals).chain(notes).max().unwrap_or(0)
    }

    /// Ids come from the creation time in milliseconds, bumped past the last
    /// issued id so two creations in the same millisecond stay distinct.
    fn next_id(&mut self) -> i64 {
        let id = Utc::now().timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }

    #[must_use]
    pub const fn storage(&self) -> &TabStorage {
        &self.storage
    }

    #[must_use]
    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    #[must_use]
    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    // --- Persistence ---

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.storage.set(key, &json)?;
        debug!(key, bytes = json.len(), "collection saved");
        Ok(())
    }

    /// Writes one collection as it currently is in memory.
    /// # Errors
    /// Returns `StoreError` if the write fails.
    pub fn save(&self, collection: Collection) -> Result<(), StoreError> {
        match collection {
            Collection::Workouts => self.write(WORKOUTS_KEY, &self.workouts),
            Collection::Meals => self.write(MEALS_KEY, &self.meals),
            Collection::Notes => self.write(NOTES_KEY, &self.notes),
            Collection::Settings => self.write(SETTINGS_KEY, &self.settings),
        }
    }

    /// Writes all four collections, stopping at the first failure.
    /// # Errors
    /// Returns `StoreError` from the first failed write.
    pub fn save_all(&self) -> Result<(), StoreError> {
        Collection::ALL.into_iter().try_for_each(|c| self.save(c))
    }

    // --- Workouts ---

    /// # Errors
    /// Returns `StoreError` if saving fails; the workout stays in memory.
    pub fn add_workout(&mut self, new: NewWorkout) -> Result<i64, StoreError> {
        let id = self.next_id();
        self.workouts.push(Workout {
            id,
            icon: new.category.icon().to_string(),
            name: new.name,
            sets: new.sets,
            reps: new.reps,
            category: new.category,
            completed: false,
        });
        self.save(Collection::Workouts)?;
        Ok(id)
    }

    /// Flips the completed flag. Returns `false` if no workout has this id.
    /// # Errors
    /// Returns `StoreError` if saving fails.
    pub fn toggle_workout(&mut self, id: i64) -> Result<bool, StoreError> {
        let Some(workout) = self.workouts.iter_mut().find(|w| w.id == id) else {
            return Ok(false);
        };
        workout.completed = !workout.completed;
        self.save(Collection::Workouts)?;
        Ok(true)
    }

    /// # Errors
    /// Returns `StoreError` if saving fails.
    pub fn delete_workout(&mut self, id: i64) -> Result<bool, StoreError> {
        let before = self.workouts.len();
        self.workouts.retain(|w| w.id != id);
        if self.workouts.len() == before {
            return Ok(false);
        }
        self.save(Collection::Workouts)?;
        Ok(true)
    }

    // --- Meals ---

    /// # Errors
    /// Returns `StoreError` if saving fails; the meal stays in memory.
    pub fn add_meal(&mut self, new: NewMeal) -> Result<i64, StoreError> {
        let id = self.next_id();
        self.meals.push(Meal {
            id,
            food: new.food,
            portion: new.portion,
            calories: new.calories,
            timestamp: Utc::now(),
        });
        self.save(Collection::Meals)?;
        Ok(id)
    }

    /// # Errors
    /// Returns `StoreError` if saving fails.
    pub fn delete_meal(&mut self, id: i64) -> Result<bool, StoreError> {
        Ok(self.take_meal(id)?.is_some())
    }

    /// Removes a meal and hands it back so its values can refill the form.
    /// Editing a meal is this followed by a fresh `add_meal`.
    /// # Errors
    /// Returns `StoreError` if saving fails.
    pub fn take_meal(&mut self, id: i64) -> Result<Option<Meal>, StoreError> {
        let Some(index) = self.meals.iter().position(|m| m.id == id) else {
            return Ok(None);
        };
        let meal = self.meals.remove(index);
        self.save(Collection::Meals)?;
        Ok(Some(meal))
    }

    #[must_use]
    pub fn total_calories(&self) -> i64 {
        self.meals.iter().map(|m| m.calories).sum()
    }

    // --- Notes ---

    /// # Errors
    /// Returns `StoreError` if saving fails; the note stays in memory.
    pub fn add_note(&mut self, draft: NoteDraft) -> Result<i64, StoreError> {
        let id = self.next_id();
        self.notes.push(Note {
            id,
            title: draft.title,
            content: draft.content,
            category: draft.category,
            image: draft.image,
            pinned: false,
            starred: false,
            timestamp: Utc::now(),
        });
        self.save(Collection::Notes)?;
        Ok(id)
    }

    /// Replaces the form fields of an existing note. The image is only replaced
    /// when the draft carries one. Pin, star and timestamp are kept.
    /// # Errors
    /// Returns `StoreError` if saving fails.
    pub fn update_note(&mut self, id: i64, draft: NoteDraft) -> Result<bool, StoreError> {
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        note.title = draft.title;
        note.content = draft.content;
        note.category = draft.category;
        if draft.image.is_some() {
            note.image = draft.image;
        }
        self.save(Collection::Notes)?;
        Ok(true)
    }

    /// # Errors
    /// Returns `StoreError` if saving fails.
    pub fn delete_note(&mut self, id: i64) -> Result<bool, StoreError> {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() == before {
            return Ok(false);
        }
        self.save(Collection::Notes)?;
        Ok(true)
    }

    fn modify_note(&mut self, id: i64, f: impl FnOnce(&mut Note)) -> Result<bool, StoreError> {
        let Some(note) = self.notes.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        f(note);
        self.save(Collection::Notes)?;
        Ok(true)
    }

    /// # Errors
    /// Returns `StoreError` if saving fails.
    pub fn toggle_pin(&mut self, id: i64) -> Result<bool, StoreError> {
        self.modify_note(id, |n| n.pinned = !n.pinned)
    }

    /// # Errors
    /// Returns `StoreError` if saving fails.
    pub fn toggle_star(&mut self, id: i64) -> Result<bool, StoreError> {
        self.modify_note(id, |n| n.starred = !n.starred)
    }

    /// # Errors
    /// Returns `StoreError` if saving fails.
    pub fn set_note_image(&mut self, id: i64, data_uri: String) -> Result<bool, StoreError> {
        self.modify_note(id, |n| n.image = Some(data_uri))
    }

    /// Moves the dragged note to the position the drop target occupied.
    /// Returns `false` when either id is unknown or both are the same note.
    /// # Errors
    /// Returns `StoreError` if saving fails.
    pub fn move_note(&mut self, dragged_id: i64, target_id: i64) -> Result<bool, StoreError> {
        if dragged_id == target_id {
            return Ok(false);
        }
        let from = self.notes.iter().position(|n| n.id == dragged_id);
        let to = self.notes.iter().position(|n| n.id == target_id);
        let (Some(from), Some(to)) = (from, to) else {
            return Ok(false);
        };
        let note = self.notes.remove(from);
        self.notes.insert(to, note);
        self.save(Collection::Notes)?;
        Ok(true)
    }

    // --- Settings ---

    /// Applies `f` to the settings and writes them.
    /// # Errors
    /// Returns `StoreError` if saving fails; the change stays in memory.
    pub fn update_settings(&mut self, f: impl FnOnce(&mut Settings)) -> Result<(), StoreError> {
        f(&mut self.settings);
        self.save(Collection::Settings)
    }

    /// Replaces the in-memory settings without writing them. Used when another
    /// tab already stored the value.
    pub fn adopt_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Replaces whichever collections are present. Nothing is written.
    pub fn replace(
        &mut self,
        workouts: Option<Vec<Workout>>,
        meals: Option<Vec<Meal>>,
        notes: Option<Vec<Note>>,
        settings: Option<Settings>,
    ) {
        if let Some(w) = workouts {
            self.workouts = w;
        }
        if let Some(m) = meals {
            self.meals = m;
        }
        if let Some(n) = notes {
            self.notes = n;
        }
        if let Some(s) = settings {
            self.settings = s;
        }
        self.last_id = self.last_id.max(self.max_id());
    }
}
