// src/pages/workout.rs
use tracing::debug;

use super::{Action, Page, PageContext, PageError, PageId};
use crate::document::{groups, ids};
use crate::model::NewWorkout;
use crate::render::{render_workouts, CategoryFilter};

#[derive(Debug, Default)]
pub struct WorkoutPage {
    filter: CategoryFilter,
}

impl WorkoutPage {
    fn render(&self, ctx: &mut PageContext<'_>) {
        let html = render_workouts(ctx.state.workouts(), &self.filter);
        ctx.document.set_inner_html(ids::WORKOUT_LIST, html);
    }
}

fn validate(new: &NewWorkout) -> Result<(), PageError> {
    if new.name.trim().is_empty() {
        return Err(PageError::InvalidInput("Exercise name cannot be empty".into()));
    }
    if new.sets <= 0 || new.reps <= 0 {
        return Err(PageError::InvalidInput(format!(
            "Sets and reps must be positive (got {} sets of {} reps)",
            new.sets, new.reps
        )));
    }
    Ok(())
}

impl Page for WorkoutPage {
    fn id(&self) -> PageId {
        PageId::Workout
    }

    fn init(&mut self, ctx: &mut PageContext<'_>) {
        ctx.document.set_active(groups::WORKOUT_FILTER, self.filter.as_str());
        self.render(ctx);
    }

    fn handle(&mut self, ctx: &mut PageContext<'_>, action: Action) -> Result<(), PageError> {
        match action {
            Action::FilterWorkouts(filter) => {
                ctx.document.set_active(groups::WORKOUT_FILTER, filter.as_str());
                self.filter = filter;
            }
            Action::AddWorkout(new) => {
                validate(&new)?;
                let result = ctx.state.add_workout(new);
                if let Some(id) = ctx.saved(result) {
                    debug!(id, "workout added");
                }
            }
            Action::ToggleWorkout(id) => {
                let result = ctx.state.toggle_workout(id);
                ctx.saved(result);
            }
            Action::DeleteWorkout(id) => {
                let result = ctx.state.delete_workout(id);
                ctx.saved(result);
            }
            other => return Err(PageError::unsupported(PageId::Workout, &other)),
        }
        self.render(ctx);
        Ok(())
    }
}
