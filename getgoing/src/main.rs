//! getgoing - CLI tool to inspect and drive the GetGoing local data store
//!
//! Boots the same startup path the app uses (database, preferences,
//! navigation gate) and exposes the persisted state as subcommands.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/getgoing/getgoing.db (~/.local/share/getgoing/getgoing.db)
//! - Preferences: $XDG_DATA_HOME/getgoing/preferences.json
//! - Logs: $XDG_STATE_HOME/getgoing/getgoing.log (~/.local/state/getgoing/getgoing.log)
//! - Config: $XDG_CONFIG_HOME/getgoing/config.toml (~/.config/getgoing/config.toml)

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use getgoing_core::db::require_habit;
use getgoing_core::prefs::{ThemeStore, ONBOARDING_KEY};
use getgoing_core::{AppContext, Config, Frequency, Goal, Habit, Priority, Route};

#[derive(Parser)]
#[command(name = "getgoing")]
#[command(about = "Inspect and drive the GetGoing local data store")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show database, onboarding and theme state
    Status,

    /// Create the database and apply the schema
    Init,

    /// Onboarding completion flag
    Onboarding {
        #[command(subcommand)]
        action: OnboardingAction,
    },

    /// Theme preference
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },

    /// Goals
    Goal {
        #[command(subcommand)]
        action: GoalAction,
    },

    /// Habits
    Habit {
        #[command(subcommand)]
        action: HabitAction,
    },
}

#[derive(Subcommand)]
enum OnboardingAction {
    /// Mark onboarding as finished
    Complete,
    /// Forget the completion flag so the next launch shows onboarding again
    Reset,
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Print the active theme id
    Get,
    /// Activate a theme by id
    Set { id: String },
    /// List every theme
    List,
}

#[derive(Subcommand)]
enum GoalAction {
    /// Create a goal
    Add {
        title: String,

        #[arg(short, long, default_value = "general")]
        category: String,

        #[arg(short, long)]
        description: Option<String>,

        /// low, medium or high
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
    },
    /// List goals, newest first
    List,
    /// Delete a goal (its milestones go with it, its habits are kept)
    Delete { id: String },
}

#[derive(Subcommand)]
enum HabitAction {
    /// Create a habit
    Add {
        title: String,

        /// Goal this habit supports
        #[arg(short, long)]
        goal: Option<String>,

        /// daily, weekly or monthly
        #[arg(short, long, default_value = "daily")]
        frequency: Frequency,
    },
    /// Record a completion and extend the streak
    Complete {
        id: String,

        #[arg(short, long)]
        note: Option<String>,
    },
    /// List habits
    List {
        /// Include inactive habits
        #[arg(short, long)]
        all: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        getgoing_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("getgoing starting");

    let ctx = AppContext::new(config);
    ctx.start().context("failed to open database")?;

    let result = match args.command {
        Command::Status => cmd_status(&ctx),
        Command::Init => cmd_init(&ctx),
        Command::Onboarding { action } => cmd_onboarding(&ctx, action),
        Command::Theme { action } => cmd_theme(&ctx, action),
        Command::Goal { action } => cmd_goal(&ctx, action),
        Command::Habit { action } => cmd_habit(&ctx, action),
    };

    ctx.shutdown().context("failed to close database")?;
    result
}

fn cmd_status(ctx: &AppContext) -> Result<()> {
    let db_path = ctx.config.resolved_database_path();
    let version = ctx.db.schema_version().context("failed to read schema version")?;

    println!("GetGoing Status");
    println!("===============");
    println!();
    println!("Database:        {}", db_path.display());
    println!("Schema version:  {}", version);
    println!("Preferences:     {}", ctx.config.resolved_preferences_path().display());
    println!("Route:           {}", ctx.gate.route());
    println!("Theme:           {}", ctx.theme.get());
    println!("API:             {}", ctx.config.api.effective_base_url());
    println!(
        "Log file:        {}",
        getgoing_core::logging::log_file_path().display()
    );
    println!();
    println!("Goals:           {}", ctx.db.count_rows("goals")?);
    println!("Habits:          {}", ctx.db.count_rows("habits")?);
    println!("Tasks:           {}", ctx.db.count_rows("tasks")?);

    Ok(())
}

fn cmd_init(ctx: &AppContext) -> Result<()> {
    println!(
        "Database ready: {}",
        ctx.config.resolved_database_path().display()
    );
    Ok(())
}

fn cmd_onboarding(ctx: &AppContext, action: OnboardingAction) -> Result<()> {
    match action {
        OnboardingAction::Complete => {
            if ctx.gate.route() == Route::Main {
                println!("Onboarding already complete");
                return Ok(());
            }
            ctx.gate
                .complete_onboarding()
                .context("failed to save onboarding state")?;
            println!("Onboarding complete");
        }
        OnboardingAction::Reset => {
            ctx.kv
                .remove(ONBOARDING_KEY)
                .context("failed to clear onboarding state")?;
            tracing::info!("Onboarding flag cleared");
            println!("Onboarding reset; the next launch starts at onboarding");
        }
    }
    Ok(())
}

fn cmd_theme(ctx: &AppContext, action: ThemeAction) -> Result<()> {
    match action {
        ThemeAction::Get => println!("{}", ctx.theme.get()),
        ThemeAction::Set { id } => {
            if !ctx.theme.set(&id).context("failed to save theme")? {
                bail!("unknown theme '{}' (see `getgoing theme list`)", id);
            }
            println!("Theme set to {}", ctx.theme.get());
        }
        ThemeAction::List => {
            let active = ctx.theme.get();
            for theme in ThemeStore::available() {
                let marker = if theme.id == active { "*" } else { " " };
                println!(
                    "{} {:<16} {:<16} {}",
                    marker, theme.id, theme.name, theme.description
                );
            }
        }
    }
    Ok(())
}

fn cmd_goal(ctx: &AppContext, action: GoalAction) -> Result<()> {
    match action {
        GoalAction::Add {
            title,
            category,
            description,
            priority,
        } => {
            let mut goal = Goal::new(title, category);
            goal.description = description;
            goal.priority = priority;
            ctx.db.insert_goal(&goal).context("failed to add goal")?;
            println!("{}", goal.id);
        }
        GoalAction::List => {
            let goals = ctx.db.list_goals().context("failed to list goals")?;
            if goals.is_empty() {
                println!("No goals");
            }
            for goal in goals {
                let status = if goal.is_completed { "done" } else { "open" };
                println!(
                    "{}  {:>3}%  {:<4}  {:<6}  {}",
                    goal.id, goal.progress, status, goal.priority, goal.title
                );
            }
        }
        GoalAction::Delete { id } => {
            if !ctx.db.delete_goal(&id).context("failed to delete goal")? {
                bail!("goal not found: {}", id);
            }
            println!("Deleted goal {}", id);
        }
    }
    Ok(())
}

fn cmd_habit(ctx: &AppContext, action: HabitAction) -> Result<()> {
    match action {
        HabitAction::Add {
            title,
            goal,
            frequency,
        } => {
            let mut habit = Habit::new(title);
            habit.goal_id = goal;
            habit.frequency = frequency;
            ctx.db.insert_habit(&habit).context("failed to add habit")?;
            println!("{}", habit.id);
        }
        HabitAction::Complete { id, note } => {
            require_habit(&ctx.db, &id)?;
            ctx.db
                .record_habit_completion(&id, note.as_deref())
                .context("failed to record completion")?;
            let habit = require_habit(&ctx.db, &id)?;
            println!(
                "{}: streak {} (best {})",
                habit.title, habit.current_streak, habit.longest_streak
            );
        }
        HabitAction::List { all } => {
            let habits = ctx.db.list_habits(!all).context("failed to list habits")?;
            if habits.is_empty() {
                println!("No habits");
            }
            for habit in habits {
                println!(
                    "{}  {:<7}  streak {:>3}  {}",
                    habit.id, habit.frequency, habit.current_streak, habit.title
                );
            }
        }
    }
    Ok(())
}
