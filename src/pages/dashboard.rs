// src/pages/dashboard.rs
use rand::seq::SliceRandom;
use tracing::warn;

use super::{Action, Page, PageContext, PageError, PageId};
use crate::document::ids;
use crate::model::WorkoutTodo;
use crate::state::read_json;
use crate::store::WORKOUT_TODOS_KEY;

pub const MOTIVATIONAL_QUOTES: [&str; 5] = [
    "Consistency is key. Small, daily efforts lead to significant results over time. Keep pushing!",
    "Your body can do it. It's your mind you need to convince.",
    "The groundwork for all happiness is good health.",
    "Success is the sum of small efforts repeated day in and day out.",
    "Take care of your body. It's the only place you have to live.",
];

#[derive(Debug, Default)]
pub struct DashboardPage;

impl DashboardPage {
    fn update_stats(ctx: &mut PageContext<'_>) {
        let consumed = ctx.state.total_calories();
        ctx.document.set_text(ids::TOTAL_CALORIES, consumed.to_string());
        let burned = calories_burned(ctx);
        ctx.document.set_text(ids::CALORIES_BURNED, burned.to_string());
    }

    fn update_motivational_tip(ctx: &mut PageContext<'_>) {
        if !ctx.state.settings().motivational_quotes {
            ctx.document.set_hidden(ids::MOTIVATION_CARD, true);
            ctx.document.set_text(ids::MOTIVATION_TEXT, "");
            return;
        }
        ctx.document.set_hidden(ids::MOTIVATION_CARD, false);
        if let Some(quote) = MOTIVATIONAL_QUOTES.choose(&mut rand::thread_rng()) {
            ctx.document.set_text(ids::MOTIVATION_TEXT, *quote);
        }
    }
}

/// Calories of the completed entries kept by the workout planner.
fn calories_burned(ctx: &PageContext<'_>) -> f64 {
    match read_json::<Vec<WorkoutTodo>>(ctx.state.storage(), WORKOUT_TODOS_KEY) {
        Ok(todos) => todos
            .unwrap_or_default()
            .iter()
            .filter(|t| t.completed)
            .filter_map(|t| t.calories)
            .sum(),
        Err(e) => {
            warn!(error = %e, "error reading workout todos for dashboard calories");
            0.0
        }
    }
}

impl Page for DashboardPage {
    fn id(&self) -> PageId {
        PageId::Dashboard
    }

    fn init(&mut self, ctx: &mut PageContext<'_>) {
        Self::update_stats(ctx);
        Self::update_motivational_tip(ctx);
    }

    fn handle(&mut self, _ctx: &mut PageContext<'_>, action: Action) -> Result<(), PageError> {
        Err(PageError::unsupported(PageId::Dashboard, &action))
    }

    fn on_settings_changed(&mut self, ctx: &mut PageContext<'_>) {
        Self::update_motivational_tip(ctx);
        Self::update_stats(ctx);
    }
}
