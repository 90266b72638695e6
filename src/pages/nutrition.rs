// src/pages/nutrition.rs
use tracing::debug;

use super::{Action, Page, PageContext, PageError, PageId};
use crate::document::ids;
use crate::model::NewMeal;
use crate::render::{render_calorie_summary, render_meals, CalorieSummary};

const FORM_INPUTS: [&str; 3] = [ids::FOOD_INPUT, ids::PORTION_INPUT, ids::CALORIES_INPUT];

#[derive(Debug, Default)]
pub struct NutritionPage;

impl NutritionPage {
    fn render_meals(ctx: &mut PageContext<'_>) {
        let html = render_meals(ctx.state.meals());
        ctx.document.set_inner_html(ids::MEALS_LIST, html);
    }

    fn update_calorie_summary(ctx: &mut PageContext<'_>) {
        let summary = CalorieSummary::compute(ctx.state.meals(), ctx.state.settings().calorie_goal);
        let doc = &mut *ctx.document;
        doc.set_text(ids::CURRENT_CALORIES, summary.current.to_string());
        doc.set_text(ids::GOAL_CALORIES, summary.goal.to_string());
        doc.set_text(ids::PROGRESS_PERCENTAGE, format!("{}%", summary.rounded_percentage()));
        doc.set_text(ids::SUMMARY_DESCRIPTION, summary.description());
        doc.set_inner_html(ids::CALORIE_SUMMARY, render_calorie_summary(&summary));
    }
}

fn validate(new: &NewMeal) -> Result<(), PageError> {
    if new.food.trim().is_empty() {
        return Err(PageError::InvalidInput("Food name cannot be empty".into()));
    }
    if new.calories < 0 {
        return Err(PageError::InvalidInput(format!(
            "Calories cannot be negative (got {})",
            new.calories
        )));
    }
    Ok(())
}

impl Page for NutritionPage {
    fn id(&self) -> PageId {
        PageId::Nutrition
    }

    fn init(&mut self, ctx: &mut PageContext<'_>) {
        Self::render_meals(ctx);
        Self::update_calorie_summary(ctx);
    }

    fn handle(&mut self, ctx: &mut PageContext<'_>, action: Action) -> Result<(), PageError> {
        match action {
            Action::AddMeal(new) => {
                validate(&new)?;
                let result = ctx.state.add_meal(new);
                ctx.saved(result);
                ctx.document.clear_values(&FORM_INPUTS);
            }
            Action::EditMeal(id) => {
                let Some(meal) = ctx.state.meals().iter().find(|m| m.id == id).cloned() else {
                    debug!(id, "edit requested for unknown meal");
                    return Ok(());
                };
                ctx.document.set_value(ids::FOOD_INPUT, meal.food);
                ctx.document.set_value(ids::PORTION_INPUT, meal.portion);
                ctx.document.set_value(ids::CALORIES_INPUT, meal.calories.to_string());
                let result = ctx.state.delete_meal(id);
                ctx.saved(result);
            }
            Action::ReplaceMeal { id, meal } => {
                validate(&meal)?;
                if ctx.state.meals().iter().all(|m| m.id != id) {
                    debug!(id, "replace requested for unknown meal");
                    return Ok(());
                }
                let result = ctx.state.delete_meal(id);
                ctx.saved(result);
                let result = ctx.state.add_meal(meal);
                ctx.saved(result);
            }
            Action::DeleteMeal(id) => {
                let result = ctx.state.delete_meal(id);
                ctx.saved(result);
            }
            Action::SetCalorieGoal(goal) => {
                let goal = u32::try_from(goal)
                    .ok()
                    .filter(|g| *g > 0)
                    .ok_or(PageError::InvalidCalorieGoal(goal))?;
                ctx.change_settings(|s| s.calorie_goal = goal);
            }
            other => return Err(PageError::unsupported(PageId::Nutrition, &other)),
        }
        Self::render_meals(ctx);
        Self::update_calorie_summary(ctx);
        Ok(())
    }

    fn on_settings_changed(&mut self, ctx: &mut PageContext<'_>) {
        Self::update_calorie_summary(ctx);
    }
}
