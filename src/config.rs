//src/config.rs
//! Settings of the command-line front end, kept in `config.toml`. The
//! application's own settings live in the store, not here.

use comfy_table::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_CONFIG_DIR: &str = "fitlife";
pub const CONFIG_ENV_VAR: &str = "FITLIFE_CONFIG_DIR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration directory found; set FITLIFE_CONFIG_DIR to choose one.")]
    CannotDetermineConfigDir,
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config file is not valid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Could not write config as TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Unknown table color '{0}'")]
    InvalidColor(String),
}

/// Terminal colors usable for table headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum StandardColor {
    Black,
    Grey,
    DarkGrey,
    White,
    Red,
    DarkRed,
    Green,
    DarkGreen,
    Yellow,
    DarkYellow,
    Blue,
    DarkBlue,
    Magenta,
    DarkMagenta,
    Cyan,
    DarkCyan,
}

impl From<StandardColor> for Color {
    fn from(value: StandardColor) -> Self {
        match value {
            StandardColor::Black => Self::Black,
            StandardColor::Grey => Self::Grey,
            StandardColor::DarkGrey => Self::DarkGrey,
            StandardColor::White => Self::White,
            StandardColor::Red => Self::Red,
            StandardColor::DarkRed => Self::DarkRed,
            StandardColor::Green => Self::Green,
            StandardColor::DarkGreen => Self::DarkGreen,
            StandardColor::Yellow => Self::Yellow,
            StandardColor::DarkYellow => Self::DarkYellow,
            StandardColor::Blue => Self::Blue,
            StandardColor::DarkBlue => Self::DarkBlue,
            StandardColor::Magenta => Self::Magenta,
            StandardColor::DarkMagenta => Self::DarkMagenta,
            StandardColor::Cyan => Self::Cyan,
            StandardColor::DarkCyan => Self::DarkCyan,
        }
    }
}

/// Parses a color name, ignoring case and surrounding spaces (`"darkgrey"`, `" Cyan"`).
/// # Errors
/// Returns `ConfigError::InvalidColor` for unknown names.
pub fn parse_color(name: &str) -> Result<StandardColor, ConfigError> {
    name.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidColor(name.to_string()))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ThemeConfig {
    pub header_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            header_color: StandardColor::Cyan.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// SQLite file to use instead of the one in the data directory.
    pub store_path: Option<PathBuf>,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Ask on stdin before destructive actions. When off, they need `--yes`.
    pub confirm_destructive: bool,
    /// Where `export` writes backups; the current directory when unset.
    pub export_dir: Option<PathBuf>,
    pub theme: ThemeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: None,
            log_level: "warn".to_string(),
            confirm_destructive: true,
            export_dir: None,
            theme: ThemeConfig::default(),
        }
    }
}

impl Config {
    /// Header color for tables; an unknown name gives cyan.
    #[must_use]
    pub fn header_color(&self) -> Color {
        parse_color(&self.theme.header_color)
            .unwrap_or(StandardColor::Cyan)
            .into()
    }
}

/// Location of `config.toml`: `$FITLIFE_CONFIG_DIR` if set, else the platform
/// config directory. The directory is created on first use.
/// # Errors
/// Returns `ConfigError` if no directory can be found or created.
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os(CONFIG_ENV_VAR) {
        Some(custom) => PathBuf::from(custom),
        None => dirs::config_dir()
            .ok_or(ConfigError::CannotDetermineConfigDir)?
            .join(APP_CONFIG_DIR),
    };
    fs::create_dir_all(&dir)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Reads the config file. A missing file is written with the defaults first.
/// # Errors
/// Returns `ConfigError` on I/O or TOML errors.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        let defaults = Config::default();
        save_config(path, &defaults)?;
        return Ok(defaults);
    }
    let text = fs::read_to_string(path)?;
    Ok(toml::from_str(&text)?)
}

/// # Errors
/// Returns `ConfigError` on I/O or TOML errors.
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, toml::to_string_pretty(config)?)?;
    Ok(())
}
