// src/broadcast.rs
//! Applying settings to a document and telling everyone else they changed.

use std::collections::VecDeque;

use chrono::Utc;
use tracing::{debug, warn};

use crate::document::{ids, Document};
use crate::model::{Settings, Theme};
use crate::store::{StoreError, SETTINGS_LAST_UPDATE_KEY};
use crate::sync::TabStorage;

pub const THEME_ATTRIBUTE: &str = "data-theme";
pub const PRIMARY_COLOR_PROPERTY: &str = "--primary-color";
pub const ACCENT_COLOR_PROPERTY: &str = "--accent-color";
pub const PRIMARY_RGB_PROPERTY: &str = "--primary-rgb";

/// Events raised inside a tab and handled by that same tab.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    SettingsUpdated(Settings),
}

/// Parses `#rgb` or `#rrggbb` (the `#` is optional).
#[must_use]
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let cleaned = hex.trim().trim_start_matches('#');
    if !cleaned.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match cleaned.len() {
        3 => {
            let doubled: Vec<String> = cleaned.chars().map(|c| format!("{c}{c}")).collect();
            Some((channel(&doubled[0])?, channel(&doubled[1])?, channel(&doubled[2])?))
        }
        6 => Some((
            channel(&cleaned[0..2])?,
            channel(&cleaned[2..4])?,
            channel(&cleaned[4..6])?,
        )),
        _ => None,
    }
}

pub fn apply_theme(document: &mut Document, theme: Theme) {
    let value = theme.to_string();
    document.set_body_attribute(THEME_ATTRIBUTE, &value);
    document.set_root_attribute(THEME_ATTRIBUTE, &value);
}

/// Sets the colour variables. An unparsable colour still sets the two colour
/// properties but leaves `--primary-rgb` as it was.
pub fn apply_accent_color(document: &mut Document, color: &str) {
    document.set_style_property(PRIMARY_COLOR_PROPERTY, color);
    document.set_style_property(ACCENT_COLOR_PROPERTY, color);
    match hex_to_rgb(color) {
        Some((r, g, b)) => document.set_style_property(PRIMARY_RGB_PROPERTY, format!("{r}, {g}, {b}")),
        None => debug!(color, "accent color is not a hex value, keeping previous rgb"),
    }
}

pub fn apply_settings(document: &mut Document, settings: &Settings) {
    apply_theme(document, settings.theme);
    apply_accent_color(document, &settings.accent_color);
}

/// The header toggle shows the theme you would switch *to*.
pub fn update_theme_icon(document: &mut Document, theme: Theme) {
    let icon = match theme {
        Theme::Dark => "light_mode",
        Theme::Light => "dark_mode",
    };
    document.set_text(ids::THEME_ICON, icon);
}

/// Announces a settings change that has already been written under the
/// settings key: queues the in-tab event and bumps the last-update stamp.
///
/// The in-tab event is queued even when the stamp cannot be written.
/// # Errors
/// Returns `StoreError` if the stamp write fails.
pub fn publish(
    events: &mut VecDeque<AppEvent>,
    storage: &TabStorage,
    settings: &Settings,
) -> Result<(), StoreError> {
    events.push_back(AppEvent::SettingsUpdated(settings.clone()));
    let stamp = next_stamp(storage)?;
    storage.set(SETTINGS_LAST_UPDATE_KEY, &stamp.to_string())?;
    debug!(stamp, "settings change published");
    Ok(())
}

/// Milliseconds since the epoch, strictly greater than the stored stamp.
fn next_stamp(storage: &TabStorage) -> Result<i64, StoreError> {
    let now = Utc::now().timestamp_millis();
    let previous = match storage.get(SETTINGS_LAST_UPDATE_KEY)? {
        Some(raw) => raw.trim().parse::<i64>().unwrap_or_else(|e| {
            warn!(raw = %raw, error = %e, "ignoring unreadable settings stamp");
            0
        }),
        None => 0,
    };
    Ok(now.max(previous + 1))
}
