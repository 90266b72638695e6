//src/main.rs
mod cli;

use anyhow::{bail, Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::io::{self, stdin, stdout, Write};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing_subscriber::EnvFilter;

use fitlife::document::ids;
use fitlife::render::{filter_workouts, visible_notes, CalorieSummary, CategoryFilter, NoteQuery};
use fitlife::transfer::image_data_uri;
use fitlife::{
    default_store_path, Action, Config, Dialog, Meal, NewMeal, NewWorkout, Note, NoteDraft,
    ProfileField, Settings, SettingsFlag, SharedStore, SqliteStore, Tab, Workout,
};

use cli::{Commands, MealCommand, NoteCommand, PageArg, SettingsCommand, WorkoutCommand};

/// How destructive actions get confirmed on the terminal.
enum ConfirmMode {
    Prompt,
    Assume(bool),
}

struct TerminalDialog {
    mode: ConfirmMode,
}

impl TerminalDialog {
    fn new(config: &Config, assume_yes: bool) -> Self {
        let mode = if assume_yes {
            ConfirmMode::Assume(true)
        } else if config.confirm_destructive {
            ConfirmMode::Prompt
        } else {
            ConfirmMode::Assume(false)
        };
        Self { mode }
    }
}

impl Dialog for TerminalDialog {
    fn confirm(&mut self, message: &str) -> bool {
        match self.mode {
            ConfirmMode::Assume(true) => true,
            ConfirmMode::Assume(false) => {
                eprintln!("{message}");
                eprintln!("Prompts are disabled in the config; re-run with --yes to confirm.");
                false
            }
            ConfirmMode::Prompt => {
                print!("{message} [y/N]: ");
                if stdout().flush().is_err() {
                    return false;
                }
                let mut input = String::new();
                if stdin().read_line(&mut input).is_err() {
                    return false;
                }
                matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
            }
        }
    }

    fn alert(&mut self, message: &str) {
        println!("{message}");
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

struct App {
    shared: SharedStore,
    config: Config,
    assume_yes: bool,
    export_csv: bool,
}

impl App {
    fn open(&self, path: &str) -> Result<Tab> {
        let dialog = Box::new(TerminalDialog::new(&self.config, self.assume_yes));
        Tab::open(&self.shared, path, dialog).with_context(|| format!("Failed to load page '{path}'"))
    }

    fn header_color(&self) -> Color {
        self.config.header_color()
    }
}

fn main() -> Result<()> {
    let cli_args = cli::parse_args();

    if let Commands::GenerateCompletion { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();
        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    let config_path = fitlife::get_config_path_util().context("Failed to determine config path")?;
    let config = fitlife::load_config_util(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    init_tracing(&config.log_level);

    let store_path = match &config.store_path {
        Some(path) => path.clone(),
        None => default_store_path().context("Failed to determine data store path")?,
    };
    if let Commands::StorePath = cli_args.command {
        println!("{}", store_path.display());
        return Ok(());
    }

    let store = SqliteStore::open(&store_path)
        .with_context(|| format!("Failed to open data store at {}", store_path.display()))?;
    let app = App {
        shared: SharedStore::new(store),
        config,
        assume_yes: cli_args.yes,
        export_csv: cli_args.export_csv,
    };

    match cli_args.command {
        // Both answered before the store is opened.
        Commands::GenerateCompletion { .. } | Commands::StorePath => Ok(()),
        Commands::Workout(command) => run_workout(&app, command),
        Commands::Meal(command) => run_meal(&app, command),
        Commands::Note(command) => run_note(&app, command),
        Commands::Settings(command) => run_settings(&app, command),
        Commands::Dashboard => run_dashboard(&app),
        Commands::Render { page } => run_render(&app, page),
        Commands::Export { dir } => run_export(&app, dir),
        Commands::Import { file } => run_import(&app, &file),
        Commands::Reset => {
            let mut tab = app.open("settings.html")?;
            tab.dispatch(Action::ResetAllData)?;
            Ok(())
        }
    }
}

// --- Workouts ---

fn run_workout(app: &App, command: WorkoutCommand) -> Result<()> {
    let mut tab = app.open("workout.html")?;
    match command {
        WorkoutCommand::List { category } => {
            let filter = category.map_or(CategoryFilter::All, CategoryFilter::Only);
            let workouts = filter_workouts(tab.state().workouts(), &filter);
            if workouts.is_empty() {
                println!("No workouts found.");
            } else if app.export_csv {
                print_workout_csv(&workouts)?;
            } else {
                print_workout_table(&workouts, app.header_color());
            }
        }
        WorkoutCommand::Add { name, sets, reps, category } => {
            tab.dispatch(Action::AddWorkout(NewWorkout { name, sets, reps, category }))?;
            if let Some(workout) = tab.state().workouts().last() {
                println!("Added workout '{}' (ID: {})", workout.name, workout.id);
            }
        }
        WorkoutCommand::Toggle { id } => {
            require_workout(&tab, id)?;
            tab.dispatch(Action::ToggleWorkout(id))?;
            let done = tab.state().workouts().iter().any(|w| w.id == id && w.completed);
            println!("Workout {id} marked as {}.", if done { "done" } else { "not done" });
        }
        WorkoutCommand::Delete { id } => {
            require_workout(&tab, id)?;
            tab.dispatch(Action::DeleteWorkout(id))?;
            println!("Deleted workout {id}.");
        }
    }
    Ok(())
}

fn require_workout(tab: &Tab, id: i64) -> Result<()> {
    if !tab.state().workouts().iter().any(|w| w.id == id) {
        bail!("Workout ID {id} not found.");
    }
    Ok(())
}

fn print_workout_table(workouts: &[&Workout], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Category").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new("Done").fg(header_color),
        ]);

    for workout in workouts {
        table.add_row(vec![
            Cell::new(workout.id.to_string()),
            Cell::new(&workout.name),
            Cell::new(workout.category.to_string()),
            Cell::new(workout.sets.to_string()),
            Cell::new(workout.reps.to_string()),
            Cell::new(if workout.completed { "yes" } else { "-" }),
        ]);
    }
    println!("{table}");
}

fn print_workout_csv(workouts: &[&Workout]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["ID", "Exercise", "Category", "Sets", "Reps", "Completed"])?;
    for workout in workouts {
        writer.write_record([
            workout.id.to_string(),
            workout.name.clone(),
            workout.category.to_string(),
            workout.sets.to_string(),
            workout.reps.to_string(),
            workout.completed.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

// --- Meals ---

fn run_meal(app: &App, command: MealCommand) -> Result<()> {
    let mut tab = app.open("nutrition.html")?;
    match command {
        MealCommand::List => {
            let meals = tab.state().meals();
            if app.export_csv {
                print_meal_csv(meals)?;
            } else {
                if meals.is_empty() {
                    println!("No meals logged.");
                } else {
                    print_meal_table(meals, app.header_color());
                }
                let summary = CalorieSummary::compute(meals, tab.state().settings().calorie_goal);
                println!(
                    "{} / {} kcal. {}",
                    summary.current,
                    summary.goal,
                    summary.description()
                );
            }
        }
        MealCommand::Add { food, portion, calories } => {
            tab.dispatch(Action::AddMeal(NewMeal { food, portion, calories }))?;
            if let Some(meal) = tab.state().meals().last() {
                println!("Logged '{}' ({} kcal, ID: {})", meal.food, meal.calories, meal.id);
            }
        }
        MealCommand::Edit { id, food, portion, calories } => {
            let Some(current) = tab.state().meals().iter().find(|m| m.id == id).cloned() else {
                bail!("Meal ID {id} not found.");
            };
            let meal = NewMeal {
                food: food.unwrap_or(current.food),
                portion: portion.unwrap_or(current.portion),
                calories: calories.unwrap_or(current.calories),
            };
            tab.dispatch(Action::ReplaceMeal { id, meal })?;
            if let Some(meal) = tab.state().meals().last() {
                println!("Updated meal '{}' (new ID: {})", meal.food, meal.id);
            }
        }
        MealCommand::Delete { id } => {
            if !tab.state().meals().iter().any(|m| m.id == id) {
                bail!("Meal ID {id} not found.");
            }
            tab.dispatch(Action::DeleteMeal(id))?;
            println!("Deleted meal {id}.");
        }
        MealCommand::Goal { calories } => {
            tab.dispatch(Action::SetCalorieGoal(calories))?;
            println!("Daily calorie goal set to {calories} kcal.");
        }
    }
    Ok(())
}

fn print_meal_table(meals: &[Meal], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Logged (UTC)").fg(header_color),
            Cell::new("Food").fg(header_color),
            Cell::new("Portion").fg(header_color),
            Cell::new("Calories").fg(header_color),
        ]);

    for meal in meals {
        table.add_row(vec![
            Cell::new(meal.id.to_string()),
            Cell::new(meal.timestamp.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(&meal.food),
            Cell::new(if meal.portion.is_empty() { "-" } else { &meal.portion }),
            Cell::new(meal.calories.to_string()),
        ]);
    }
    println!("{table}");
}

fn print_meal_csv(meals: &[Meal]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["ID", "Timestamp_UTC", "Food", "Portion", "Calories"])?;
    for meal in meals {
        writer.write_record([
            meal.id.to_string(),
            meal.timestamp.to_rfc3339(),
            meal.food.clone(),
            meal.portion.clone(),
            meal.calories.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

// --- Notes ---

fn read_image(path: Option<&Path>) -> Result<Option<String>> {
    path.map(|p| image_data_uri(p).with_context(|| format!("Failed to read image {}", p.display())))
        .transpose()
}

fn require_note(tab: &Tab, id: i64) -> Result<()> {
    if !tab.state().notes().iter().any(|n| n.id == id) {
        bail!("Note ID {id} not found.");
    }
    Ok(())
}

fn run_note(app: &App, command: NoteCommand) -> Result<()> {
    let mut tab = app.open("note.html")?;
    match command {
        NoteCommand::List { search, category } => {
            let query = NoteQuery {
                search: search.unwrap_or_default(),
                category,
            };
            let notes = visible_notes(tab.state().notes(), &query);
            if notes.is_empty() {
                println!("No notes found.");
            } else if app.export_csv {
                print_note_csv(&notes)?;
            } else {
                print_note_table(&notes, app.header_color());
            }
        }
        NoteCommand::Add { title, fields } => {
            let draft = NoteDraft {
                title,
                content: fields.content.unwrap_or_default(),
                category: fields.category.unwrap_or_default(),
                image: read_image(fields.image.as_deref())?,
            };
            tab.dispatch(Action::NewNote)?;
            tab.dispatch(Action::SaveNote(draft))?;
            tab.pump()?;
            if let Some(note) = tab.state().notes().last() {
                println!("Added note '{}' (ID: {})", note.title, note.id);
            }
        }
        NoteCommand::Edit { id, title, fields } => {
            require_note(&tab, id)?;
            tab.dispatch(Action::EditNote(id))?;
            let form = |input: &str| tab.document().value(input).unwrap_or_default().to_string();
            let draft = NoteDraft {
                title: title.unwrap_or_else(|| form(ids::NOTE_TITLE)),
                content: fields.content.unwrap_or_else(|| form(ids::NOTE_CONTENT)),
                category: fields
                    .category
                    .unwrap_or_else(|| form(ids::NOTE_CATEGORY).into()),
                image: read_image(fields.image.as_deref())?,
            };
            tab.dispatch(Action::SaveNote(draft))?;
            tab.pump()?;
            println!("Updated note {id}.");
        }
        NoteCommand::Delete { id } => {
            require_note(&tab, id)?;
            tab.dispatch(Action::DeleteNote(id))?;
            if tab.state().notes().iter().any(|n| n.id == id) {
                println!("Note {id} kept.");
            } else {
                println!("Deleted note {id}.");
            }
        }
        NoteCommand::Pin { id } => {
            require_note(&tab, id)?;
            tab.dispatch(Action::TogglePin(id))?;
            let pinned = tab.state().notes().iter().any(|n| n.id == id && n.pinned);
            println!("Note {id} {}.", if pinned { "pinned" } else { "unpinned" });
        }
        NoteCommand::Star { id } => {
            require_note(&tab, id)?;
            tab.dispatch(Action::ToggleStar(id))?;
            let starred = tab.state().notes().iter().any(|n| n.id == id && n.starred);
            println!("Note {id} {}.", if starred { "starred" } else { "unstarred" });
        }
        NoteCommand::Move { id, onto } => {
            require_note(&tab, id)?;
            require_note(&tab, onto)?;
            tab.dispatch(Action::DropNote { dragged: id, target: onto })?;
            println!("Moved note {id} to the position of note {onto}.");
        }
        NoteCommand::Attach { id, image } => {
            require_note(&tab, id)?;
            let data_uri = image_data_uri(&image)
                .with_context(|| format!("Failed to read image {}", image.display()))?;
            tab.dispatch(Action::AttachNoteImage { id, data_uri })?;
            tab.pump()?;
            println!("Attached {} to note {id}.", image.display());
        }
    }
    Ok(())
}

fn note_preview(note: &Note) -> String {
    const MAX: usize = 40;
    let mut preview: String = note.content.chars().take(MAX).collect();
    if note.content.chars().count() > MAX {
        preview.push_str("...");
    }
    preview
}

fn print_note_table(notes: &[&Note], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Title").fg(header_color),
            Cell::new("Category").fg(header_color),
            Cell::new("Flags").fg(header_color),
            Cell::new("Created (UTC)").fg(header_color),
            Cell::new("Content").fg(header_color),
        ]);

    for note in notes {
        let mut flags = Vec::new();
        if note.pinned {
            flags.push("pinned");
        }
        if note.starred {
            flags.push("starred");
        }
        if note.image.is_some() {
            flags.push("image");
        }
        table.add_row(vec![
            Cell::new(note.id.to_string()),
            Cell::new(&note.title),
            Cell::new(note.category.to_string()),
            Cell::new(if flags.is_empty() { "-".to_string() } else { flags.join(", ") }),
            Cell::new(note.timestamp.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(note_preview(note)),
        ]);
    }
    println!("{table}");
}

fn print_note_csv(notes: &[&Note]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["ID", "Title", "Category", "Pinned", "Starred", "Timestamp_UTC", "Content"])?;
    for note in notes {
        writer.write_record([
            note.id.to_string(),
            note.title.clone(),
            note.category.to_string(),
            note.pinned.to_string(),
            note.starred.to_string(),
            note.timestamp.to_rfc3339(),
            note.content.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

// --- Settings ---

fn run_settings(app: &App, command: SettingsCommand) -> Result<()> {
    let mut tab = app.open("settings.html")?;
    match command {
        SettingsCommand::Show => {
            let avatar = tab.document().avatar_image().is_some();
            if app.export_csv {
                print_settings_csv(tab.state().settings(), avatar)?;
            } else {
                print_settings_table(tab.state().settings(), avatar, app.header_color());
            }
            return Ok(());
        }
        SettingsCommand::Theme { theme } => tab.dispatch(Action::SetTheme(theme))?,
        SettingsCommand::ToggleTheme => tab.dispatch(Action::ToggleTheme)?,
        SettingsCommand::Accent { color } => tab.dispatch(Action::SetAccentColor(color))?,
        SettingsCommand::Units { units } => tab.dispatch(Action::SetUnits(units))?,
        SettingsCommand::Flag { flag, value } => tab.dispatch(Action::SetFlag(flag, value))?,
        SettingsCommand::Profile { field, value } => {
            tab.dispatch(Action::SetProfileField(field, value))?;
        }
        SettingsCommand::Avatar { image } => {
            let data_uri = image_data_uri(&image)
                .with_context(|| format!("Failed to read image {}", image.display()))?;
            tab.dispatch(Action::UploadProfileImage(data_uri))?;
            tab.pump()?;
            println!("Profile picture updated.");
            return Ok(());
        }
    }
    let settings = tab.state().settings();
    println!(
        "Settings saved (theme: {}, accent: {}, units: {}).",
        settings.theme, settings.accent_color, settings.units
    );
    Ok(())
}

fn settings_rows(settings: &Settings, avatar: bool) -> Vec<(String, String)> {
    let mut rows = vec![
        ("calorieGoal".to_string(), settings.calorie_goal.to_string()),
        ("units".to_string(), settings.units.to_string()),
        ("theme".to_string(), settings.theme.to_string()),
        ("accentColor".to_string(), settings.accent_color.clone()),
    ];
    rows.extend(SettingsFlag::iter().map(|flag| (flag.to_string(), settings.flag(flag).to_string())));
    rows.extend(
        ProfileField::iter().map(|field| (format!("profile.{field}"), settings.profile.field_text(field))),
    );
    rows.push(("profileImage".to_string(), if avatar { "set" } else { "none" }.to_string()));
    rows
}

fn print_settings_table(settings: &Settings, avatar: bool, header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Setting").fg(header_color),
            Cell::new("Value").fg(header_color),
        ]);
    for (name, value) in settings_rows(settings, avatar) {
        table.add_row(vec![Cell::new(name), Cell::new(if value.is_empty() { "-".to_string() } else { value })]);
    }
    println!("{table}");
}

fn print_settings_csv(settings: &Settings, avatar: bool) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["Setting", "Value"])?;
    for (name, value) in settings_rows(settings, avatar) {
        writer.write_record([name, value])?;
    }
    writer.flush()?;
    Ok(())
}

// --- Dashboard, rendering, backups ---

fn run_dashboard(app: &App) -> Result<()> {
    let tab = app.open("index.html")?;
    let doc = tab.document();
    println!("Calories consumed: {} kcal", doc.text(ids::TOTAL_CALORIES).unwrap_or("0"));
    println!("Calories burned:   {} kcal", doc.text(ids::CALORIES_BURNED).unwrap_or("0"));
    if !doc.is_hidden(ids::MOTIVATION_CARD) {
        if let Some(quote) = doc.text(ids::MOTIVATION_TEXT).filter(|q| !q.is_empty()) {
            println!();
            println!("\"{quote}\"");
        }
    }
    Ok(())
}

fn run_render(app: &App, page: PageArg) -> Result<()> {
    let tab = app.open(page.path())?;
    let doc = tab.document();
    let containers: &[&str] = match page {
        PageArg::Dashboard | PageArg::Settings => &[],
        PageArg::Workout => &[ids::WORKOUT_LIST],
        PageArg::Nutrition => &[ids::MEALS_LIST, ids::CALORIE_SUMMARY],
        PageArg::Notes => &[ids::NOTES_GRID],
    };
    if containers.is_empty() {
        bail!("The {} page has no rendered list.", tab.page_id());
    }
    for id in containers {
        println!("<!-- #{id} -->");
        print!("{}", doc.inner_html(id).unwrap_or_default());
    }
    Ok(())
}

fn run_export(app: &App, dir: Option<PathBuf>) -> Result<()> {
    let mut tab = app.open("settings.html")?;
    tab.dispatch(Action::ExportData)?;
    let Some(download) = tab.document().downloads().last() else {
        bail!("Export produced no file.");
    };
    let dir = dir
        .or_else(|| app.config.export_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    let path = dir.join(&download.filename);
    std::fs::write(&path, &download.contents)
        .with_context(|| format!("Failed to write backup to {}", path.display()))?;
    println!("Backup written to {}", path.display());
    Ok(())
}

fn run_import(app: &App, file: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read backup file {}", file.display()))?;
    let mut tab = app.open("settings.html")?;
    tab.dispatch(Action::ImportData(contents))?;
    tab.pump()?;
    Ok(())
}
