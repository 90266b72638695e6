// src/pages/settings.rs
use chrono::Utc;
use strum::IntoEnumIterator;
use tracing::{info, warn};

use super::{
    Action, FileRead, Page, PageContext, PageError, PageId, CONFIRM_RESET, EXPORT_DONE_MESSAGE,
    IMPORT_DONE_MESSAGE, IMPORT_FAILED_MESSAGE, RESET_DONE_MESSAGE,
};
use crate::document::{groups, ids};
use crate::model::{ProfileField, SettingsFlag};
use crate::store::{StoreError, PROFILE_IMAGE_KEY};
use crate::transfer::{export_filename, export_json, parse_import, ExportBundle};

#[derive(Debug, Default)]
pub struct SettingsPage;

impl SettingsPage {
    fn load_values(ctx: &mut PageContext<'_>) {
        let settings = ctx.state.settings().clone();
        let doc = &mut *ctx.document;

        // The goal is edited on the nutrition page only.
        doc.set_text(ids::SETTINGS_GOAL_DISPLAY, settings.calorie_goal.to_string());
        doc.set_value(ids::CALORIE_GOAL_INPUT, settings.calorie_goal.to_string());
        doc.set_readonly(ids::CALORIE_GOAL_INPUT);

        for flag in SettingsFlag::iter() {
            doc.set_checked(&flag.to_string(), settings.flag(flag));
        }
        for field in ProfileField::iter() {
            doc.set_value(field.input_id(), settings.profile.field_text(field));
        }

        doc.set_active(groups::UNITS, settings.units.to_string());
        doc.set_active(groups::THEME, settings.theme.to_string());
        doc.set_active(groups::ACCENT_COLOR, settings.accent_color);
    }

    fn export(ctx: &mut PageContext<'_>) -> Result<(), PageError> {
        let now = Utc::now();
        let bundle = ExportBundle {
            workouts: ctx.state.workouts(),
            meals: ctx.state.meals(),
            notes: ctx.state.notes(),
            settings: ctx.state.settings(),
            export_date: now,
        };
        let json = export_json(&bundle).map_err(StoreError::from)?;
        let filename = export_filename(now.date_naive());
        info!(filename = %filename, bytes = json.len(), "data exported");
        ctx.document.offer_download(filename, json);
        ctx.alert(EXPORT_DONE_MESSAGE);
        Ok(())
    }

    fn reset(ctx: &mut PageContext<'_>) {
        if !ctx.confirm(CONFIRM_RESET) {
            return;
        }
        let result = ctx.state.storage().clear();
        if ctx.saved(result).is_some() {
            info!("all data reset");
            ctx.alert(RESET_DONE_MESSAGE);
            ctx.schedule_reload();
        }
    }

    fn import(ctx: &mut PageContext<'_>, contents: &str) {
        let bundle = match parse_import(contents) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(error = %e, "import file rejected");
                ctx.alert(IMPORT_FAILED_MESSAGE);
                return;
            }
        };
        if bundle.is_empty() {
            warn!("import file contains no known collections");
        }
        ctx.state
            .replace(bundle.workouts, bundle.meals, bundle.notes, bundle.settings);
        let result = ctx.state.save_all();
        ctx.saved(result);
        info!("data imported");
        ctx.alert(IMPORT_DONE_MESSAGE);
        ctx.schedule_reload();
    }
}

impl Page for SettingsPage {
    fn id(&self) -> PageId {
        PageId::Settings
    }

    fn init(&mut self, ctx: &mut PageContext<'_>) {
        Self::load_values(ctx);
    }

    fn handle(&mut self, ctx: &mut PageContext<'_>, action: Action) -> Result<(), PageError> {
        match action {
            Action::SetFlag(flag, value) => ctx.change_settings(|s| s.set_flag(flag, value)),
            Action::SetUnits(units) => ctx.change_settings(|s| s.units = units),
            Action::SetTheme(theme) => ctx.change_settings(|s| s.theme = theme),
            Action::SetAccentColor(color) => {
                let color = color.trim().to_string();
                if color.is_empty() {
                    return Err(PageError::InvalidInput("Accent color cannot be empty".into()));
                }
                ctx.change_settings(|s| s.accent_color = color);
            }
            Action::SetProfileField(field, raw) => {
                ctx.change_settings(|s| s.profile.set_field(field, &raw));
            }
            Action::UploadProfileImage(data_uri) => {
                ctx.start_read(FileRead::ProfileImage(data_uri));
                return Ok(());
            }
            Action::ExportData => return Self::export(ctx),
            Action::ImportData(contents) => {
                ctx.start_read(FileRead::Import(contents));
                return Ok(());
            }
            Action::ResetAllData => {
                Self::reset(ctx);
                return Ok(());
            }
            other => return Err(PageError::unsupported(PageId::Settings, &other)),
        }
        Self::load_values(ctx);
        Ok(())
    }

    fn on_settings_changed(&mut self, ctx: &mut PageContext<'_>) {
        Self::load_values(ctx);
    }

    fn on_file_read(&mut self, ctx: &mut PageContext<'_>, read: FileRead) -> Result<(), PageError> {
        match read {
            FileRead::ProfileImage(data_uri) => {
                let result = ctx.state.storage().set(PROFILE_IMAGE_KEY, &data_uri);
                if ctx.saved(result).is_some() {
                    ctx.document.set_avatar_image(Some(data_uri));
                }
            }
            FileRead::Import(contents) => Self::import(ctx, &contents),
            other => warn!(read = ?other, "read not meant for the settings page"),
        }
        Ok(())
    }
}
