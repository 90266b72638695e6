use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use fitlife::broadcast::hex_to_rgb;
use fitlife::render::{
    escape_html, filter_workouts, render_notes, render_workouts, rendered_ids, visible_notes,
    CalorieSummary, CategoryFilter, NoteQuery,
};
use fitlife::store::{NOTES_KEY, SETTINGS_KEY, WORKOUTS_KEY};
use fitlife::transfer::{export_filename, export_json, image_data_uri, parse_import, ExportBundle};
use fitlife::{
    AppState, KeyValueStore, Meal, MemoryStore, NewMeal, NewWorkout, Note, NoteCategory, NoteDraft,
    PageId, Settings, SharedStore, SqliteStore, StoreError, TabStorage, Theme, Units, Workout,
    WorkoutCategory,
};

// Helper function to create state over a fresh in-memory store
fn create_test_state() -> Result<(SharedStore, AppState)> {
    let shared = SharedStore::new(MemoryStore::new());
    let state = AppState::load(shared.attach())?;
    Ok((shared, state))
}

fn note(id: i64, title: &str, minutes_ago: i64) -> Note {
    Note {
        id,
        title: title.to_string(),
        content: format!("{title} content"),
        category: NoteCategory::Personal,
        image: None,
        pinned: false,
        starred: false,
        timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() - Duration::minutes(minutes_ago),
    }
}

#[test]
fn test_seed_data_on_empty_store() -> Result<()> {
    let (_shared, state) = create_test_state()?;

    assert_eq!(state.workouts().len(), 5);
    assert_eq!(state.meals().len(), 3);
    assert_eq!(state.notes().len(), 3);
    assert_eq!(state.settings(), &Settings::default());
    assert_eq!(state.total_calories(), 605);

    Ok(())
}

#[test]
fn test_changes_survive_reload_from_store() -> Result<()> {
    let (shared, mut state) = create_test_state()?;

    state.add_workout(NewWorkout {
        name: "Deadlift".to_string(),
        sets: 5,
        reps: 5,
        category: WorkoutCategory::Legs,
    })?;
    state.toggle_workout(2)?;
    state.add_meal(NewMeal {
        food: "Oatmeal".to_string(),
        portion: "1 bowl".to_string(),
        calories: 300,
    })?;
    let note_id = state.add_note(NoteDraft {
        title: "Progress photo".to_string(),
        content: "Week 4".to_string(),
        category: NoteCategory::Personal,
        image: Some("data:image/png;base64,AAAA".to_string()),
    })?;
    state.toggle_pin(note_id)?;
    state.toggle_star(note_id)?;
    state.toggle_star(1)?;
    state.update_settings(|s| {
        s.theme = Theme::Light;
        s.calorie_goal = 2100;
        s.profile.name = "Sam".to_string();
        s.profile.weight = Some(72.5);
    })?;

    // A second tab loading from the same store sees exactly the same data
    let other = AppState::load(shared.attach())?;
    assert_eq!(other.workouts(), state.workouts());
    assert_eq!(other.meals(), state.meals());
    assert_eq!(other.notes(), state.notes());
    assert_eq!(other.settings(), state.settings());

    let saved = other.notes().iter().find(|n| n.id == note_id).unwrap();
    assert!(saved.pinned && saved.starred);
    assert_eq!(saved.image.as_deref(), Some("data:image/png;base64,AAAA"));

    Ok(())
}

#[test]
fn test_deletes_reach_the_store() -> Result<()> {
    let (shared, mut state) = create_test_state()?;
    let reload = || AppState::load(shared.attach());

    assert!(state.delete_workout(3)?);
    let ids: Vec<i64> = reload()?.workouts().iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 5]);

    assert!(state.delete_meal(2)?);
    let ids: Vec<i64> = reload()?.meals().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 3]);

    assert!(state.delete_note(1)?);
    let reloaded = reload()?;
    let ids: Vec<i64> = reloaded.notes().iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![2, 3]);

    // Earlier deletes are still in place after later ones
    assert_eq!(reloaded.workouts(), state.workouts());
    assert_eq!(reloaded.meals(), state.meals());

    Ok(())
}

#[test]
fn test_new_ids_are_unique() -> Result<()> {
    let (_shared, mut state) = create_test_state()?;

    let first = state.add_workout(NewWorkout {
        name: "A".to_string(),
        sets: 1,
        reps: 1,
        category: WorkoutCategory::Other,
    })?;
    let second = state.add_workout(NewWorkout {
        name: "B".to_string(),
        sets: 1,
        reps: 1,
        category: WorkoutCategory::Other,
    })?;
    let third = state.add_note(NoteDraft {
        title: "C".to_string(),
        ..Default::default()
    })?;

    assert!(second > first);
    assert!(third > second);
    // New workouts get the icon of their category
    let added = state.workouts().iter().find(|w| w.id == first).unwrap();
    assert_eq!(added.icon, "exercise");

    Ok(())
}

#[test]
fn test_delete_and_toggle_by_id() -> Result<()> {
    let (_shared, mut state) = create_test_state()?;

    assert!(state.toggle_workout(2)?);
    assert!(state.workouts().iter().find(|w| w.id == 2).unwrap().completed);
    assert!(!state.toggle_workout(999)?);

    assert!(state.delete_workout(3)?);
    let ids: Vec<i64> = state.workouts().iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 5]);
    assert!(!state.delete_workout(3)?);

    assert!(state.delete_meal(2)?);
    assert_eq!(state.total_calories(), 455);

    Ok(())
}

#[test]
fn test_update_note_keeps_image_pin_and_timestamp() -> Result<()> {
    let (_shared, mut state) = create_test_state()?;

    state.set_note_image(1, "data:image/png;base64,AAAA".to_string())?;
    state.toggle_pin(1)?;
    let before = state.notes()[0].timestamp;

    let updated = state.update_note(
        1,
        NoteDraft {
            title: "Morning Run (5k)".to_string(),
            content: "Faster than last week".to_string(),
            category: NoteCategory::Personal,
            image: None,
        },
    )?;
    assert!(updated);

    let note = &state.notes()[0];
    assert_eq!(note.title, "Morning Run (5k)");
    assert_eq!(note.category, NoteCategory::Personal);
    assert_eq!(note.image.as_deref(), Some("data:image/png;base64,AAAA"));
    assert!(note.pinned);
    assert_eq!(note.timestamp, before);

    assert!(!state.update_note(999, NoteDraft::default())?);

    Ok(())
}

#[test]
fn test_move_note_takes_target_position() -> Result<()> {
    let (_shared, mut state) = create_test_state()?;

    // Drag the first note onto the last one
    assert!(state.move_note(1, 3)?);
    let order: Vec<i64> = state.notes().iter().map(|n| n.id).collect();
    assert_eq!(order, vec![2, 3, 1]);

    // Dropping onto itself or an unknown note does nothing
    assert!(!state.move_note(2, 2)?);
    assert!(!state.move_note(2, 42)?);
    let order: Vec<i64> = state.notes().iter().map(|n| n.id).collect();
    assert_eq!(order, vec![2, 3, 1]);

    Ok(())
}

#[test]
fn test_visible_notes_sort_pinned_then_starred_then_newest() {
    let newest = note(1, "A", 0);
    let mut pinned = note(2, "B", 60);
    pinned.pinned = true;
    let mut starred = note(3, "C", 30);
    starred.starred = true;
    let notes = vec![newest, pinned, starred];

    let titles: Vec<&str> = visible_notes(&notes, &NoteQuery::default())
        .iter()
        .map(|n| n.title.as_str())
        .collect();
    assert_eq!(titles, vec!["B", "C", "A"]);
}

#[test]
fn test_note_query_filters_by_text_and_category() {
    let mut workout_note = note(1, "Leg Day", 0);
    workout_note.category = NoteCategory::Workout;
    let mut recipe = note(2, "Smoothie", 5);
    recipe.content = "Banana and SPINACH".to_string();
    let notes = vec![workout_note, recipe];

    let search = NoteQuery {
        search: "spinach".to_string(),
        category: None,
    };
    assert_eq!(rendered_ids(&render_notes(&notes, &search)), vec![2]);

    let category = NoteQuery {
        search: String::new(),
        category: Some(NoteCategory::Workout),
    };
    assert_eq!(rendered_ids(&render_notes(&notes, &category)), vec![1]);

    let nothing = NoteQuery {
        search: "swimming".to_string(),
        category: None,
    };
    assert!(render_notes(&notes, &nothing).contains("No notes found."));
}

#[test]
fn test_note_preview_is_truncated() {
    let mut long = note(1, "Long", 0);
    long.content = "x".repeat(150);
    let html = render_notes(&[long], &NoteQuery::default());

    assert!(html.contains(&format!("{}...", "x".repeat(100))));
    assert!(!html.contains(&"x".repeat(101)));
    assert!(html.contains("2024-03-01"));
}

#[test]
fn test_rendering_is_idempotent_and_escaped() -> Result<()> {
    let (_shared, mut state) = create_test_state()?;
    state.add_workout(NewWorkout {
        name: "<script>alert('x')</script>".to_string(),
        sets: 3,
        reps: 8,
        category: WorkoutCategory::Arms,
    })?;

    let first = render_workouts(state.workouts(), &CategoryFilter::All);
    let second = render_workouts(state.workouts(), &CategoryFilter::All);
    assert_eq!(first, second);

    assert!(!first.contains("<script>"));
    assert!(first.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    assert!(first.contains("3 sets of 8 reps"));
    assert_eq!(escape_html(r#"a & "b""#), "a &amp; &quot;b&quot;");

    Ok(())
}

#[test]
fn test_workout_category_filter() -> Result<()> {
    let (_shared, state) = create_test_state()?;

    let legs = filter_workouts(state.workouts(), &CategoryFilter::Only(WorkoutCategory::Legs));
    let names: Vec<&str> = legs.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["Squats", "Lunges"]);

    assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
    assert_eq!(CategoryFilter::parse("ARMS"), CategoryFilter::Only(WorkoutCategory::Arms));
    assert_eq!(CategoryFilter::parse("cardio"), CategoryFilter::All);

    let html = render_workouts(state.workouts(), &CategoryFilter::Only(WorkoutCategory::Core));
    assert_eq!(rendered_ids(&html), vec![3]);

    Ok(())
}

#[test]
fn test_calorie_summary() -> Result<()> {
    let (_shared, state) = create_test_state()?;

    let summary = CalorieSummary::compute(state.meals(), state.settings().calorie_goal);
    assert_eq!(summary.current, 605);
    assert_eq!(summary.goal, 2500);
    assert_eq!(summary.rounded_percentage(), 24);
    assert_eq!(summary.description(), "You've consumed 24% of your daily calorie goal.");

    // Going over the goal caps the bar
    let over = CalorieSummary::compute(state.meals(), 500);
    assert_eq!(over.rounded_percentage(), 100);
    assert_eq!(over.bar_width(), "100%");

    let no_goal = CalorieSummary::compute(state.meals(), 0);
    assert_eq!(no_goal.rounded_percentage(), 100);

    Ok(())
}

#[test]
fn test_hex_to_rgb() {
    assert_eq!(hex_to_rgb("#13ecc8"), Some((19, 236, 200)));
    assert_eq!(hex_to_rgb("FF8800"), Some((255, 136, 0)));
    assert_eq!(hex_to_rgb("#fff"), Some((255, 255, 255)));
    assert_eq!(hex_to_rgb("#12345"), None);
    assert_eq!(hex_to_rgb("#gggggg"), None);
    assert_eq!(hex_to_rgb("teal"), None);
}

#[test]
fn test_page_id_from_path() {
    assert_eq!(PageId::from_path(""), PageId::Dashboard);
    assert_eq!(PageId::from_path("/app/index.html"), PageId::Dashboard);
    assert_eq!(PageId::from_path("workout.html"), PageId::Workout);
    assert_eq!(PageId::from_path("/nutrition.html"), PageId::Nutrition);
    assert_eq!(PageId::from_path("note.html?search=run"), PageId::Notes);
    assert_eq!(PageId::from_path("settings.html#profile"), PageId::Settings);
    assert_eq!(PageId::from_path("about.html"), PageId::Unknown);
    assert_eq!(PageId::Notes.file_name(), Some("note.html"));
}

#[test]
fn test_stored_values_are_read_leniently() -> Result<()> {
    // Known categories ignore case; other labels are kept as written
    let workout: Workout = serde_json::from_str(r#"{"id":7,"name":"Rowing","category":"cardio"}"#)?;
    assert_eq!(workout.category, WorkoutCategory::Custom("cardio".to_string()));
    assert_eq!(workout.category.icon(), "exercise");
    assert_eq!(workout.sets, 0);
    assert_eq!(serde_json::to_value(&workout)?["category"], "cardio");
    let workout: Workout = serde_json::from_str(r#"{"id":8,"name":"Squats","category":"Legs"}"#)?;
    assert_eq!(workout.category, WorkoutCategory::Legs);
    let workout: Workout = serde_json::from_str(r#"{"id":9,"name":"Plank","category":""}"#)?;
    assert_eq!(workout.category, WorkoutCategory::Other);

    // A custom label only passes the "all" filter
    let workouts = [serde_json::from_str::<Workout>(r#"{"id":7,"name":"Rowing","category":"cardio"}"#)?];
    assert_eq!(filter_workouts(&workouts, &CategoryFilter::All).len(), 1);
    assert!(filter_workouts(&workouts, &CategoryFilter::Only(WorkoutCategory::Other)).is_empty());

    // Missing settings fields take their defaults
    let settings: Settings = serde_json::from_str(r#"{"theme":"light","units":"imperial"}"#)?;
    assert_eq!(settings.theme, Theme::Light);
    assert_eq!(settings.units, Units::Imperial);
    assert_eq!(settings.calorie_goal, 2500);
    assert!(settings.motivational_quotes);

    let meal: Meal = serde_json::from_str(r#"{"id":1,"food":"Apple","timestamp":"2024-03-01T08:00:00Z"}"#)?;
    assert_eq!(meal.calories, 0);
    assert_eq!(meal.portion, "");

    Ok(())
}

#[test]
fn test_custom_note_category_survives_a_save() -> Result<()> {
    let shared = SharedStore::new(MemoryStore::new());
    shared.set_external(
        NOTES_KEY,
        r#"[{"id":1,"title":"Q3","content":"Run a 10k","category":"goals","pinned":false,"starred":false,"timestamp":"2024-03-01T08:00:00Z"}]"#,
    )?;

    let mut state = AppState::load(shared.attach())?;
    assert_eq!(state.notes()[0].category, NoteCategory::Custom("goals".to_string()));
    assert!(state.toggle_pin(1)?);

    let stored: serde_json::Value = serde_json::from_str(&shared.get(NOTES_KEY)?.unwrap())?;
    assert_eq!(stored[0]["category"], "goals");
    assert_eq!(stored[0]["pinned"], true);

    // The label is shown as stored, escaped
    let html = render_notes(state.notes(), &NoteQuery::default());
    assert!(html.contains("goals"));

    Ok(())
}

#[test]
fn test_malformed_stored_value_falls_back_to_seed() -> Result<()> {
    let shared = SharedStore::new(MemoryStore::new());
    shared.set_external(WORKOUTS_KEY, "not json at all")?;
    shared.set_external(SETTINGS_KEY, r#"{"theme":"light"}"#)?;

    let state = AppState::load(shared.attach())?;
    assert_eq!(state.workouts().len(), 5);
    assert_eq!(state.settings().theme, Theme::Light);

    Ok(())
}

#[test]
fn test_storage_events_skip_the_writer() -> Result<()> {
    let shared = SharedStore::new(MemoryStore::new());
    let writer = shared.attach();
    let reader = shared.attach();
    assert_eq!(shared.attached_tabs(), 2);

    writer.set("key", "one")?;
    assert_eq!(writer.pending_events(), 0);
    let events = reader.take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].key.as_deref(), Some("key"));
    assert_eq!(events[0].old_value, None);
    assert_eq!(events[0].new_value.as_deref(), Some("one"));

    // Writing the same value again is not a change
    writer.set("key", "one")?;
    assert_eq!(reader.pending_events(), 0);

    writer.clear()?;
    let events = reader.take_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].key, None);
    assert!(shared.keys()?.is_empty());

    drop(reader);
    assert_eq!(shared.attached_tabs(), 1);

    Ok(())
}

// Backend that drops a tab handle while a write is in progress.
struct DroppingStore {
    inner: MemoryStore,
    victim: Rc<RefCell<Option<TabStorage>>>,
}

impl KeyValueStore for DroppingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        drop(self.victim.borrow_mut().take());
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.inner.clear()
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.keys()
    }
}

#[test]
fn test_tab_dropped_during_write_is_detached_later() -> Result<()> {
    let victim = Rc::new(RefCell::new(None));
    let shared = SharedStore::new(DroppingStore {
        inner: MemoryStore::new(),
        victim: Rc::clone(&victim),
    });
    let writer = shared.attach();
    *victim.borrow_mut() = Some(shared.attach());
    assert_eq!(shared.attached_tabs(), 2);

    // The handle is dropped while the store is busy, so its mailbox stays for now
    writer.set("key", "one")?;
    assert!(victim.borrow().is_none());
    assert_eq!(shared.attached_tabs(), 2);

    // and is removed on the next write
    writer.set("key", "two")?;
    assert_eq!(shared.attached_tabs(), 1);
    assert_eq!(shared.get("key")?.as_deref(), Some("two"));

    Ok(())
}

#[test]
fn test_sqlite_store_persists_between_opens() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data").join("fitlife.sqlite");

    {
        let mut store = SqliteStore::open(&path)?;
        store.set("b", "2")?;
        store.set("a", "1")?;
        store.set("a", "updated")?;
    }

    let mut store = SqliteStore::open(&path)?;
    assert_eq!(store.get("a")?.as_deref(), Some("updated"));
    assert_eq!(store.keys()?, vec!["a".to_string(), "b".to_string()]);

    store.remove("b")?;
    assert_eq!(store.get("b")?, None);
    store.clear()?;
    assert!(store.keys()?.is_empty());

    Ok(())
}

#[test]
fn test_memory_store_quota() -> Result<()> {
    let mut store = MemoryStore::with_quota(16);
    store.set("key", "value")?;

    let result = store.set("other", "a value that is far too long");
    assert!(matches!(result, Err(StoreError::QuotaExceeded { .. })));
    assert_eq!(store.get("other")?, None);

    // Replacing a value only counts the new size
    store.set("key", "value2")?;

    Ok(())
}

#[test]
fn test_export_and_import_bundle() -> Result<()> {
    let (_shared, state) = create_test_state()?;
    let bundle = ExportBundle {
        workouts: state.workouts(),
        meals: state.meals(),
        notes: state.notes(),
        settings: state.settings(),
        export_date: Utc::now(),
    };
    let json = export_json(&bundle)?;
    assert!(json.contains("\"exportDate\""));
    assert!(json.contains("\"calorieGoal\": 2500"));

    let parsed = parse_import(&json)?;
    assert_eq!(parsed.workouts.as_deref(), Some(state.workouts()));
    assert_eq!(parsed.notes.as_deref(), Some(state.notes()));
    assert_eq!(parsed.settings.as_ref(), Some(state.settings()));

    let partial = parse_import(r#"{"settings":{"calorieGoal":1800}}"#)?;
    assert!(partial.workouts.is_none());
    assert_eq!(partial.settings.map(|s| s.calorie_goal), Some(1800));

    assert!(parse_import("{}")?.is_empty());
    assert!(parse_import("not json").is_err());
    assert!(parse_import(r#"{"workouts":"nope"}"#).is_err());
    // A calorie goal must be positive
    assert!(parse_import(r#"{"settings":{"calorieGoal":0}}"#).is_err());
    assert!(parse_import(r#"{"settings":{"calorieGoal":-5}}"#).is_err());

    let date = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap().date_naive();
    assert_eq!(export_filename(date), "fitlife-backup-2024-03-09.json");

    Ok(())
}

#[test]
fn test_image_data_uri() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("photo.png");
    std::fs::write(&path, b"abc")?;

    assert_eq!(image_data_uri(&path)?, "data:image/png;base64,YWJj");
    assert!(image_data_uri(&dir.path().join("missing.png")).is_err());

    Ok(())
}
