//! Database schema
//!
//! A single static DDL script applied on every open. Every statement is
//! `IF NOT EXISTS`, so reapplying against an existing file is a no-op. The
//! version is stamped into `PRAGMA user_version`.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Tables in creation order
pub const TABLES: &[&str] = &[
    "users",
    "goals",
    "milestones",
    "habits",
    "tasks",
    "subtasks",
    "habit_completions",
    "reminders",
    "virtual_pets",
    "focus_sessions",
    "ai_coaching",
];

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id               TEXT PRIMARY KEY,
        email            TEXT UNIQUE NOT NULL,
        name             TEXT NOT NULL,
        avatar           TEXT,
        is_premium       INTEGER DEFAULT 0,
        created_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at       DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS goals (
        id               TEXT PRIMARY KEY,
        title            TEXT NOT NULL,
        description      TEXT,
        category         TEXT NOT NULL,
        priority         TEXT DEFAULT 'medium',  -- 'low', 'medium', 'high'
        start_date       DATETIME NOT NULL,
        end_date         DATETIME,
        is_completed     INTEGER DEFAULT 0,
        progress         INTEGER DEFAULT 0,
        created_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at       DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS milestones (
        id               TEXT PRIMARY KEY,
        goal_id          TEXT NOT NULL,
        title            TEXT NOT NULL,
        description      TEXT,
        due_date         DATETIME,
        is_completed     INTEGER DEFAULT 0,
        created_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (goal_id) REFERENCES goals (id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS habits (
        id               TEXT PRIMARY KEY,
        goal_id          TEXT,
        title            TEXT NOT NULL,
        description      TEXT,
        frequency        TEXT DEFAULT 'daily',   -- 'daily', 'weekly', 'monthly'
        target_count     INTEGER DEFAULT 1,
        current_streak   INTEGER DEFAULT 0,
        longest_streak   INTEGER DEFAULT 0,
        is_active        INTEGER DEFAULT 1,
        created_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (goal_id) REFERENCES goals (id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id               TEXT PRIMARY KEY,
        milestone_id     TEXT,
        title            TEXT NOT NULL,
        description      TEXT,
        priority         TEXT DEFAULT 'medium',
        due_date         DATETIME,
        is_completed     INTEGER DEFAULT 0,
        tags             TEXT,                   -- JSON array
        created_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (milestone_id) REFERENCES milestones (id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS subtasks (
        id               TEXT PRIMARY KEY,
        task_id          TEXT NOT NULL,
        title            TEXT NOT NULL,
        is_completed     INTEGER DEFAULT 0,
        created_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (task_id) REFERENCES tasks (id) ON DELETE CASCADE
    );

    -- Append-only
    CREATE TABLE IF NOT EXISTS habit_completions (
        id               TEXT PRIMARY KEY,
        habit_id         TEXT NOT NULL,
        completed_at     DATETIME DEFAULT CURRENT_TIMESTAMP,
        note             TEXT,
        FOREIGN KEY (habit_id) REFERENCES habits (id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS reminders (
        id               TEXT PRIMARY KEY,
        habit_id         TEXT NOT NULL,
        time             TEXT NOT NULL,
        is_active        INTEGER DEFAULT 1,
        created_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (habit_id) REFERENCES habits (id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS virtual_pets (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        level            INTEGER DEFAULT 1,
        xp               INTEGER DEFAULT 0,
        health           INTEGER DEFAULT 100,
        happiness        INTEGER DEFAULT 100,
        type             TEXT DEFAULT 'cat',     -- 'cat', 'dog', 'bird', 'fish'
        accessories      TEXT,                   -- JSON array
        last_fed         DATETIME DEFAULT CURRENT_TIMESTAMP,
        created_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at       DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS focus_sessions (
        id               TEXT PRIMARY KEY,
        duration         INTEGER NOT NULL,       -- seconds
        type             TEXT DEFAULT 'work',    -- 'work', 'short-break', 'long-break'
        start_time       DATETIME NOT NULL,
        end_time         DATETIME,
        is_completed     INTEGER DEFAULT 0,
        task_id          TEXT,
        created_at       DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (task_id) REFERENCES tasks (id) ON DELETE SET NULL
    );

    -- Append-only apart from is_read
    CREATE TABLE IF NOT EXISTS ai_coaching (
        id               TEXT PRIMARY KEY,
        type             TEXT NOT NULL,          -- 'suggestion', 'insight', 'motivation'
        content          TEXT NOT NULL,
        is_read          INTEGER DEFAULT 0,
        created_at       DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_goals_created_at ON goals(created_at);
    CREATE INDEX IF NOT EXISTS idx_milestones_goal_id ON milestones(goal_id);
    CREATE INDEX IF NOT EXISTS idx_habits_goal_id ON habits(goal_id);
    CREATE INDEX IF NOT EXISTS idx_tasks_milestone_id ON tasks(milestone_id);
    CREATE INDEX IF NOT EXISTS idx_subtasks_task_id ON subtasks(task_id);
    CREATE INDEX IF NOT EXISTS idx_habit_completions_habit_id ON habit_completions(habit_id);
    CREATE INDEX IF NOT EXISTS idx_focus_sessions_start_time ON focus_sessions(start_time);
"#;

/// Enable foreign keys and apply the schema.
///
/// Foreign-key enforcement is per connection in SQLite and must be on before
/// any delete, or the cascade and set-null rules silently do nothing.
pub fn apply(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::debug!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Applying database schema"
    );

    conn.execute_batch(SCHEMA)?;

    if current_version != SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {};", SCHEMA_VERSION))?;
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Schema version stamped"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_objects(conn: &Connection, kind: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = ? AND name NOT LIKE 'sqlite_%'",
            [kind],
            |r| r.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_apply_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        apply(&conn).unwrap();
        let tables = count_objects(&conn, "table");
        let indexes = count_objects(&conn, "index");

        // Second application must neither fail nor duplicate anything
        apply(&conn).unwrap();
        assert_eq!(count_objects(&conn, "table"), tables);
        assert_eq!(count_objects(&conn, "index"), indexes);

        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();

        for table in TABLES {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_foreign_key_policies() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |r| r.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);

        // (table, referenced table, on_delete)
        let expected = [
            ("milestones", "goals", "CASCADE"),
            ("habits", "goals", "SET NULL"),
            ("tasks", "milestones", "SET NULL"),
            ("subtasks", "tasks", "CASCADE"),
            ("habit_completions", "habits", "CASCADE"),
            ("reminders", "habits", "CASCADE"),
            ("focus_sessions", "tasks", "SET NULL"),
        ];

        for (table, parent, on_delete) in expected {
            let fks: Vec<(String, String)> = conn
                .prepare(&format!("PRAGMA foreign_key_list({})", table))
                .unwrap()
                .query_map([], |row| {
                    Ok((row.get::<_, String>(2)?, row.get::<_, String>(6)?))
                })
                .unwrap()
                .filter_map(|r| r.ok())
                .collect();

            assert!(
                fks.iter().any(|(t, d)| t == parent && d == on_delete),
                "{} should reference {} with ON DELETE {}",
                table,
                parent,
                on_delete
            );
        }
    }
}
