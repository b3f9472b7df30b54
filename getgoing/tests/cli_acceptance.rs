use getgoing_core::prefs::{FileKvStore, KvStore, ONBOARDING_KEY, THEME_KEY};
use getgoing_core::Database;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn db_path(&self) -> PathBuf {
        self.xdg_data.join("getgoing/getgoing.db")
    }

    fn preferences(&self) -> FileKvStore {
        FileKvStore::new(self.xdg_data.join("getgoing/preferences.json"))
    }
}

fn run(env: &CliTestEnv, args: &[&str]) -> Output {
    Command::new(assert_cmd::cargo::cargo_bin!("getgoing"))
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG")
        .env_remove("GETGOING_API_URL")
        .output()
        .unwrap_or_else(|e| panic!("failed to execute getgoing: {e}"))
}

fn render(args: &[&str]) -> String {
    args.iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run and require success, returning stdout.
fn run_ok(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run(env, args);
    if !output.status.success() {
        panic!(
            "getgoing {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
            render(args),
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn init_creates_database_with_schema() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["init"]);
    assert!(stdout.contains("Database ready:"));

    let db_path = env.db_path();
    assert!(
        db_path.exists(),
        "database file should exist at {}",
        db_path.display()
    );

    let db = Database::open(&db_path).expect("failed to open db");
    assert_eq!(db.schema_version().expect("failed to read version"), 1);

    let status = run_ok(&env, &["status"]);
    assert!(status.contains("Schema version:  1"));
    assert!(status.contains("Route:           onboarding"));
    assert!(status.contains("Theme:           futuristic"));
    assert!(status.contains("API:             https://api.getgoing.app"));
}

#[test]
fn onboarding_complete_and_reset() {
    let env = CliTestEnv::new();

    assert!(run_ok(&env, &["onboarding", "complete"]).contains("Onboarding complete"));
    assert_eq!(
        env.preferences().get(ONBOARDING_KEY).unwrap().as_deref(),
        Some("true")
    );
    assert!(run_ok(&env, &["status"]).contains("Route:           main"));
    assert!(run_ok(&env, &["onboarding", "complete"]).contains("already complete"));

    run_ok(&env, &["onboarding", "reset"]);
    assert_eq!(env.preferences().get(ONBOARDING_KEY).unwrap(), None);
    assert!(run_ok(&env, &["status"]).contains("Route:           onboarding"));
}

#[test]
fn theme_set_get_and_reject_unknown() {
    let env = CliTestEnv::new();

    assert_eq!(run_ok(&env, &["theme", "get"]).trim(), "futuristic");

    run_ok(&env, &["theme", "set", "calm"]);
    assert_eq!(run_ok(&env, &["theme", "get"]).trim(), "calm");
    assert_eq!(
        env.preferences().get(THEME_KEY).unwrap().as_deref(),
        Some("calm")
    );

    let rejected = run(&env, &["theme", "set", "not-a-real-theme"]);
    assert!(!rejected.status.success());
    assert!(String::from_utf8_lossy(&rejected.stderr).contains("unknown theme"));
    assert_eq!(run_ok(&env, &["theme", "get"]).trim(), "calm");

    let list = run_ok(&env, &["theme", "list"]);
    assert_eq!(list.lines().count(), 10);
    assert!(list
        .lines()
        .any(|line| line.starts_with('*') && line.contains("calm")));
    assert!(list.contains("Natural earth tones for grounding and connection"));
}

#[test]
fn goal_delete_detaches_habit() {
    let env = CliTestEnv::new();

    let goal_id = run_ok(&env, &["goal", "add", "Run a 10k", "--category", "fitness"])
        .trim()
        .to_string();
    let habit_id = run_ok(&env, &["habit", "add", "Jog 20 minutes", "--goal", &goal_id])
        .trim()
        .to_string();

    assert!(run_ok(&env, &["goal", "list"]).contains("Run a 10k"));

    let completed = run_ok(&env, &["habit", "complete", &habit_id, "--note", "felt good"]);
    assert!(completed.contains("streak 1 (best 1)"));

    run_ok(&env, &["goal", "delete", &goal_id]);
    assert!(run_ok(&env, &["goal", "list"]).contains("No goals"));

    let db = Database::open(env.db_path()).expect("failed to open db");
    let habit = db
        .get_habit(&habit_id)
        .expect("failed to query habit")
        .expect("habit should survive its goal");
    assert_eq!(habit.goal_id, None);
    assert_eq!(habit.current_streak, 1);

    let missing = run(&env, &["goal", "delete", &goal_id]);
    assert!(!missing.status.success());
}

#[test]
fn invalid_input_is_rejected() {
    let env = CliTestEnv::new();

    let short = run(&env, &["goal", "add", "Go"]);
    assert!(!short.status.success());
    assert!(String::from_utf8_lossy(&short.stderr).contains("validation failed"));

    let priority = run(&env, &["goal", "add", "Read more", "--priority", "urgent"]);
    assert!(!priority.status.success());

    let ghost = run(&env, &["habit", "complete", "no-such-habit"]);
    assert!(!ghost.status.success());
    assert!(String::from_utf8_lossy(&ghost.stderr).contains("habit not found"));
}
