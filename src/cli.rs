// src/cli.rs
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use strum::IntoEnumIterator;

use fitlife::{NoteCategory, ProfileField, SettingsFlag, Theme, Units, WorkoutCategory};

#[derive(Parser, Debug)]
#[command(author, version, about = "Track workouts, meals and notes with FitLife", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    /// Print lists as CSV instead of tables
    #[arg(long, global = true)]
    pub export_csv: bool,
    /// Skip confirmation prompts for destructive actions
    #[arg(short, long, global = true)]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the workout list (workout page)
    #[command(subcommand)]
    Workout(WorkoutCommand),
    /// Manage meals and the calorie goal (nutrition page)
    #[command(subcommand)]
    Meal(MealCommand),
    /// Manage notes (notes page)
    #[command(subcommand)]
    Note(NoteCommand),
    /// Show or change settings (settings page)
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Show today's totals and a motivational tip
    Dashboard,
    /// Print the HTML a page renders
    Render {
        #[arg(value_enum)]
        page: PageArg,
    },
    /// Write a JSON backup of all data
    Export {
        /// Directory to write the backup to (overrides config)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Replace data with the contents of a JSON backup
    Import {
        file: PathBuf,
    },
    /// Delete every stored value
    Reset,
    /// Show the path of the data store file
    StorePath,
    /// Generate shell completion scripts
    GenerateCompletion {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageArg {
    Dashboard,
    Workout,
    Nutrition,
    Notes,
    Settings,
}

impl PageArg {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "index.html",
            Self::Workout => "workout.html",
            Self::Nutrition => "nutrition.html",
            Self::Notes => "note.html",
            Self::Settings => "settings.html",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum WorkoutCommand {
    /// List workouts, optionally only one category
    List {
        #[arg(short, long)]
        category: Option<WorkoutCategory>,
    },
    /// Add an exercise
    Add {
        name: String,
        #[arg(short, long, default_value_t = 3)]
        sets: i64,
        #[arg(short, long, default_value_t = 10)]
        reps: i64,
        #[arg(short, long, default_value_t = WorkoutCategory::Other)]
        category: WorkoutCategory,
    },
    /// Mark a workout done, or not done again
    Toggle { id: i64 },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
pub enum MealCommand {
    List,
    Add {
        food: String,
        #[arg(short, long, default_value = "")]
        portion: String,
        #[arg(short, long)]
        calories: i64,
    },
    /// Change a meal; fields not given keep their old value
    Edit {
        id: i64,
        #[arg(long)]
        food: Option<String>,
        #[arg(short, long)]
        portion: Option<String>,
        #[arg(short, long)]
        calories: Option<i64>,
    },
    Delete { id: i64 },
    /// Set the daily calorie goal
    Goal { calories: i64 },
}

#[derive(Args, Debug)]
pub struct NoteFields {
    #[arg(short, long)]
    pub content: Option<String>,
    #[arg(long)]
    pub category: Option<NoteCategory>,
    /// Image file to attach
    #[arg(short, long)]
    pub image: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum NoteCommand {
    /// List notes the way the notes page orders them
    List {
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<NoteCategory>,
    },
    Add {
        title: String,
        #[command(flatten)]
        fields: NoteFields,
    },
    Edit {
        id: i64,
        #[arg(short, long)]
        title: Option<String>,
        #[command(flatten)]
        fields: NoteFields,
    },
    Delete { id: i64 },
    Pin { id: i64 },
    Star { id: i64 },
    /// Move a note to the position of another one
    Move { id: i64, onto: i64 },
    /// Attach an image file to a note
    Attach { id: i64, image: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,
    Theme { theme: Theme },
    ToggleTheme,
    /// Set the accent color (hex, e.g. "#13ecc8")
    Accent { color: String },
    Units { units: Units },
    /// Turn a switch on or off
    Flag {
        #[arg(value_parser = parse_flag)]
        flag: SettingsFlag,
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Set a profile field (name, email, age, weight, height)
    Profile { field: ProfileField, value: String },
    /// Use an image file as the profile picture
    Avatar { image: PathBuf },
}

/// Accepts `motivationalQuotes`, `motivational-quotes` or `motivational_quotes`.
fn parse_flag(s: &str) -> Result<SettingsFlag, String> {
    let wanted = s.replace(['-', '_'], "").to_lowercase();
    SettingsFlag::iter()
        .find(|flag| flag.to_string().to_lowercase() == wanted)
        .ok_or_else(|| format!("unknown setting '{s}'"))
}

// Function to parse arguments (called from main)
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
