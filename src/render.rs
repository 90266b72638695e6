// src/render.rs
//! HTML fragments for the list pages.
//!
//! Everything here is a pure function of its arguments. Every value that came
//! from the user goes through [`escape_html`] before it is placed in markup.

use std::cmp::Reverse;
use std::fmt::Write as _;

use crate::model::{Meal, Note, NoteCategory, Workout, WorkoutCategory};

const NOTE_PREVIEW_CHARS: usize = 100;

/// Escapes text for use in element content and quoted attribute values.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(WorkoutCategory),
}

impl CategoryFilter {
    /// Parses a filter button value; `"all"` and unknown values mean no filter.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        WorkoutCategory::known(value).map_or(Self::All, Self::Only)
    }

    #[must_use]
    pub fn matches(&self, workout: &Workout) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => workout.category == *category,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Only(category) => category.to_string(),
        }
    }
}

#[must_use]
pub fn filter_workouts<'a>(workouts: &'a [Workout], filter: &CategoryFilter) -> Vec<&'a Workout> {
    workouts.iter().filter(|w| filter.matches(w)).collect()
}

#[must_use]
pub fn render_workouts(workouts: &[Workout], filter: &CategoryFilter) -> String {
    let mut html = String::new();
    for workout in filter_workouts(workouts, filter) {
        let completed_class = if workout.completed { " completed" } else { "" };
        let checked = if workout.completed { " checked" } else { "" };
        let _ = write!(
            html,
            r#"<div class="workout-item{completed_class}" data-id="{id}">
    <div class="workout-icon"><span class="material-symbols-outlined">{icon}</span></div>
    <div class="workout-content">
        <p class="workout-name">{name}</p>
        <p class="workout-details">{sets} sets of {reps} reps</p>
    </div>
    <div class="workout-actions">
        <input type="checkbox" class="workout-checkbox"{checked} data-workout-id="{id}" data-action="toggle">
        <button class="workout-menu" data-workout-id="{id}" data-action="delete"><span class="material-symbols-outlined">delete</span></button>
    </div>
</div>
"#,
            id = workout.id,
            icon = escape_html(&workout.icon),
            name = escape_html(&workout.name),
            sets = workout.sets,
            reps = workout.reps,
        );
    }
    html
}

#[must_use]
pub fn render_meals(meals: &[Meal]) -> String {
    let mut html = String::new();
    for meal in meals {
        let _ = write!(
            html,
            r#"<div class="meal-item" data-id="{id}">
    <div class="meal-info">
        <p class="meal-name">{food}</p>
        <p class="meal-portion">{portion}</p>
    </div>
    <div class="meal-calories">{calories} kcal</div>
    <div class="meal-actions">
        <button class="meal-action-btn" data-meal-id="{id}" data-action="edit"><span class="material-symbols-outlined">edit</span></button>
        <button class="meal-action-btn danger" data-meal-id="{id}" data-action="delete"><span class="material-symbols-outlined">delete</span></button>
    </div>
</div>
"#,
            id = meal.id,
            food = escape_html(&meal.food),
            portion = escape_html(&meal.portion),
            calories = meal.calories,
        );
    }
    html
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalorieSummary {
    pub current: i64,
    pub goal: u32,
    /// Share of the goal consumed, capped at 100.
    pub percentage: f64,
}

impl CalorieSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(meals: &[Meal], goal: u32) -> Self {
        let current: i64 = meals.iter().map(|m| m.calories).sum();
        // A zero goal only comes from hand-edited storage; treat it as fully consumed.
        let percentage = if goal == 0 {
            100.0
        } else {
            (current as f64 / f64::from(goal) * 100.0).clamp(0.0, 100.0)
        };
        Self {
            current,
            goal,
            percentage,
        }
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rounded_percentage(&self) -> i64 {
        self.percentage.round() as i64
    }

    /// Width of the progress bar fill, as a CSS value.
    #[must_use]
    pub fn bar_width(&self) -> String {
        format!("{}%", self.percentage)
    }

    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "You've consumed {}% of your daily calorie goal.",
            self.rounded_percentage()
        )
    }
}

#[must_use]
pub fn render_calorie_summary(summary: &CalorieSummary) -> String {
    format!(
        r#"<div class="calorie-summary">
    <p><span id="currentCalories">{current}</span> / <span id="goalCalories">{goal}</span> kcal</p>
    <div class="progress-bar"><div id="progressFill" class="progress-fill" style="width: {width}"></div></div>
    <p id="progressPercentage">{rounded}%</p>
    <p id="summaryDescription">{description}</p>
</div>
"#,
        current = summary.current,
        goal = summary.goal,
        width = summary.bar_width(),
        rounded = summary.rounded_percentage(),
        description = summary.description(),
    )
}

/// Search text and category filter of the notes page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteQuery {
    pub search: String,
    pub category: Option<NoteCategory>,
}

impl NoteQuery {
    #[must_use]
    pub fn matches(&self, note: &Note) -> bool {
        if self.category.as_ref().is_some_and(|c| *c != note.category) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || note.title.to_lowercase().contains(&needle)
            || note.content.to_lowercase().contains(&needle)
    }
}

/// Notes that pass `query`, pinned first, then starred, then newest.
/// Notes that tie keep their stored order.
#[must_use]
pub fn visible_notes<'a>(notes: &'a [Note], query: &NoteQuery) -> Vec<&'a Note> {
    let mut visible: Vec<&Note> = notes.iter().filter(|n| query.matches(n)).collect();
    visible.sort_by_key(|n| (Reverse(n.pinned), Reverse(n.starred), Reverse(n.timestamp)));
    visible
}

fn preview(content: &str) -> String {
    if content.chars().count() > NOTE_PREVIEW_CHARS {
        let cut: String = content.chars().take(NOTE_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}

#[must_use]
pub fn render_notes(notes: &[Note], query: &NoteQuery) -> String {
    let visible = visible_notes(notes, query);
    if visible.is_empty() {
        return "<p class=\"notes-empty\">No notes found.</p>\n".to_string();
    }

    let mut html = String::new();
    for note in visible {
        let mut classes = String::from("note-card");
        if note.pinned {
            classes.push_str(" pinned");
        }
        if note.starred {
            classes.push_str(" starred");
        }
        let image = note.image.as_deref().map_or_else(String::new, |src| {
            format!(
                "\n        <img class=\"note-image\" src=\"{}\" alt=\"\">",
                escape_html(src)
            )
        });
        let _ = write!(
            html,
            r#"<div class="{classes}" data-id="{id}" draggable="true">
    <div class="note-content">{image}
        <h3 class="note-title">{title}</h3>
        <p class="note-description">{description}</p>
        <p class="note-category">{category}</p>
        <p class="note-date">{date}</p>
    </div>
    <div class="note-actions">
        <button class="note-action-btn{pin_active}" data-note-id="{id}" data-action="pin"><span class="material-symbols-outlined">push_pin</span></button>
        <button class="note-action-btn{star_active}" data-note-id="{id}" data-action="star"><span class="material-symbols-outlined">star</span></button>
        <button class="note-action-btn" data-note-id="{id}" data-action="edit"><span class="material-symbols-outlined">edit</span></button>
        <button class="note-action-btn" data-note-id="{id}" data-action="delete"><span class="material-symbols-outlined">delete</span></button>
    </div>
</div>
"#,
            id = note.id,
            title = escape_html(&note.title),
            description = escape_html(&preview(&note.content)),
            category = escape_html(&note.category.to_string()),
            date = note.timestamp.format("%Y-%m-%d"),
            pin_active = if note.pinned { " active" } else { "" },
            star_active = if note.starred { " active" } else { "" },
        );
    }
    html
}

/// Ids in the order `html` lists its items (`data-id` attributes).
#[must_use]
pub fn rendered_ids(html: &str) -> Vec<i64> {
    html.split("data-id=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .filter_map(|id| id.parse().ok())
        .collect()
}
