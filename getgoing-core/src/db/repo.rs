//! Database repository layer
//!
//! Typed insert/get/list/update/delete for every entity, built on the
//! [`Gateway`] primitives. Deletes rely on the schema's foreign-key rules for
//! cascading and detaching children.

use super::gateway::{Database, FromRow, Gateway, Scalar, Statement};
use crate::codec::{decode_list, encode_list};
use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::Row;
use std::str::FromStr;

// ============================================
// Parameter helpers
// ============================================

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn opt_text(s: Option<&str>) -> Value {
    s.map(text).unwrap_or(Value::Null)
}

fn ts(t: &DateTime<Utc>) -> Value {
    Value::Text(t.to_rfc3339())
}

fn opt_ts(t: Option<&DateTime<Utc>>) -> Value {
    t.map(ts).unwrap_or(Value::Null)
}

fn flag(b: bool) -> Value {
    Value::Integer(i64::from(b))
}

fn int(i: i64) -> Value {
    Value::Integer(i)
}

// ============================================
// Row helpers
// ============================================

fn conversion_error(row: &Row, column: &str, err: Error) -> rusqlite::Error {
    let idx = row.as_ref().column_index(column).unwrap_or(0);
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn get_ts(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    parse_timestamp(&raw).ok_or_else(|| {
        conversion_error(
            row,
            column,
            Error::InvalidValue {
                field: "timestamp",
                value: raw.clone(),
            },
        )
    })
}

fn get_opt_ts(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(column)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw).map(Some).ok_or_else(|| {
            conversion_error(
                row,
                column,
                Error::InvalidValue {
                    field: "timestamp",
                    value: raw.clone(),
                },
            )
        }),
    }
}

fn get_enum<T>(row: &Row, column: &str, field: &'static str) -> rusqlite::Result<T>
where
    T: FromStr + Default,
{
    match row.get::<_, Option<String>>(column)? {
        None => Ok(T::default()),
        Some(raw) => raw.parse().map_err(|_| {
            conversion_error(row, column, Error::InvalidValue { field, value: raw })
        }),
    }
}

fn get_flag(row: &Row, column: &str, default: bool) -> rusqlite::Result<bool> {
    Ok(row.get::<_, Option<bool>>(column)?.unwrap_or(default))
}

fn get_int(row: &Row, column: &str, default: i64) -> rusqlite::Result<i64> {
    Ok(row.get::<_, Option<i64>>(column)?.unwrap_or(default))
}

fn get_list(row: &Row, column: &'static str) -> rusqlite::Result<Vec<String>> {
    let raw: Option<String> = row.get(column)?;
    decode_list(column, raw.as_deref()).map_err(|e| conversion_error(row, column, e))
}

// ============================================
// Row mapping
// ============================================

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get("id")?,
            email: row.get("email")?,
            name: row.get("name")?,
            avatar: row.get("avatar")?,
            is_premium: get_flag(row, "is_premium", false)?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

impl FromRow for Goal {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Goal {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            category: row.get("category")?,
            priority: get_enum(row, "priority", Priority::FIELD)?,
            start_date: get_ts(row, "start_date")?,
            end_date: get_opt_ts(row, "end_date")?,
            is_completed: get_flag(row, "is_completed", false)?,
            progress: get_int(row, "progress", 0)?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

impl FromRow for Milestone {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Milestone {
            id: row.get("id")?,
            goal_id: row.get("goal_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            due_date: get_opt_ts(row, "due_date")?,
            is_completed: get_flag(row, "is_completed", false)?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

impl FromRow for Habit {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Habit {
            id: row.get("id")?,
            goal_id: row.get("goal_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            frequency: get_enum(row, "frequency", Frequency::FIELD)?,
            target_count: get_int(row, "target_count", 1)?,
            current_streak: get_int(row, "current_streak", 0)?,
            longest_streak: get_int(row, "longest_streak", 0)?,
            is_active: get_flag(row, "is_active", true)?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

impl FromRow for Task {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Task {
            id: row.get("id")?,
            milestone_id: row.get("milestone_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            priority: get_enum(row, "priority", Priority::FIELD)?,
            due_date: get_opt_ts(row, "due_date")?,
            is_completed: get_flag(row, "is_completed", false)?,
            tags: get_list(row, "tags")?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

impl FromRow for Subtask {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subtask {
            id: row.get("id")?,
            task_id: row.get("task_id")?,
            title: row.get("title")?,
            is_completed: get_flag(row, "is_completed", false)?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

impl FromRow for HabitCompletion {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(HabitCompletion {
            id: row.get("id")?,
            habit_id: row.get("habit_id")?,
            completed_at: get_ts(row, "completed_at")?,
            note: row.get("note")?,
        })
    }
}

impl FromRow for Reminder {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Reminder {
            id: row.get("id")?,
            habit_id: row.get("habit_id")?,
            time: row.get("time")?,
            is_active: get_flag(row, "is_active", true)?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

impl FromRow for VirtualPet {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(VirtualPet {
            id: row.get("id")?,
            name: row.get("name")?,
            level: get_int(row, "level", 1)?,
            xp: get_int(row, "xp", 0)?,
            health: get_int(row, "health", 100)?,
            happiness: get_int(row, "happiness", 100)?,
            species: get_enum(row, "type", PetSpecies::FIELD)?,
            accessories: get_list(row, "accessories")?,
            last_fed: get_ts(row, "last_fed")?,
            created_at: get_ts(row, "created_at")?,
            updated_at: get_ts(row, "updated_at")?,
        })
    }
}

impl FromRow for FocusSession {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(FocusSession {
            id: row.get("id")?,
            duration: row.get("duration")?,
            kind: get_enum(row, "type", FocusKind::FIELD)?,
            start_time: get_ts(row, "start_time")?,
            end_time: get_opt_ts(row, "end_time")?,
            is_completed: get_flag(row, "is_completed", false)?,
            task_id: row.get("task_id")?,
            created_at: get_ts(row, "created_at")?,
        })
    }
}

impl FromRow for Coaching {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Coaching {
            id: row.get("id")?,
            kind: get_enum(row, "type", CoachingKind::FIELD)?,
            content: row.get("content")?,
            is_read: get_flag(row, "is_read", false)?,
            created_at: get_ts(row, "created_at")?,
        })
    }
}

impl Database {
    fn first<T: FromRow>(&self, sql: &str, params: &[Value]) -> Result<Option<T>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    fn require<T>(found: Option<T>, entity: &'static str, id: &str) -> Result<T> {
        found.ok_or_else(|| Error::NotFound {
            entity,
            id: id.to_string(),
        })
    }

    /// Run an update that targets exactly one row by id.
    fn update_one(
        &self,
        entity: &'static str,
        id: &str,
        sql: &str,
        params: &[Value],
    ) -> Result<()> {
        let result = self.execute(sql, params)?;
        if result.changes == 0 {
            return Err(Error::NotFound {
                entity,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn delete_by_id(&self, table: &str, id: &str) -> Result<bool> {
        let result = self.execute(&format!("DELETE FROM {} WHERE id = ?", table), &[text(id)])?;
        tracing::debug!(table, id, deleted = result.changes, "Delete");
        Ok(result.changes > 0)
    }

    /// Number of rows in `table`.
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        let rows: Vec<Scalar<i64>> = self.query(&format!("SELECT COUNT(*) FROM {}", table), &[])?;
        Ok(rows.first().map(|s| s.0).unwrap_or(0))
    }

    // ============================================
    // User operations
    // ============================================

    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.execute(
            r#"
            INSERT INTO users (id, email, name, avatar, is_premium, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            &[
                text(&user.id),
                text(&user.email),
                text(&user.name),
                opt_text(user.avatar.as_deref()),
                flag(user.is_premium),
                ts(&user.created_at),
                ts(&user.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.first("SELECT * FROM users WHERE id = ?", &[text(id)])
    }

    // ============================================
    // Goal operations
    // ============================================

    pub fn insert_goal(&self, goal: &Goal) -> Result<()> {
        GOAL_LIMITS.check(&goal.title, goal.description.as_deref())?;
        self.execute(
            r#"
            INSERT INTO goals (id, title, description, category, priority, start_date, end_date,
                               is_completed, progress, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            &[
                text(&goal.id),
                text(&goal.title),
                opt_text(goal.description.as_deref()),
                text(&goal.category),
                text(goal.priority.as_str()),
                ts(&goal.start_date),
                opt_ts(goal.end_date.as_ref()),
                flag(goal.is_completed),
                int(goal.progress),
                ts(&goal.created_at),
                ts(&goal.updated_at),
            ],
        )?;
        tracing::debug!(id = %goal.id, "Goal inserted");
        Ok(())
    }

    pub fn get_goal(&self, id: &str) -> Result<Option<Goal>> {
        self.first("SELECT * FROM goals WHERE id = ?", &[text(id)])
    }

    /// All goals, newest first
    pub fn list_goals(&self) -> Result<Vec<Goal>> {
        self.query("SELECT * FROM goals ORDER BY created_at DESC", &[])
    }

    /// Rewrite every mutable column of a goal.
    pub fn update_goal(&self, goal: &Goal) -> Result<()> {
        GOAL_LIMITS.check(&goal.title, goal.description.as_deref())?;
        self.update_one(
            "goal",
            &goal.id,
            r#"
            UPDATE goals SET title = ?2, description = ?3, category = ?4, priority = ?5,
                             start_date = ?6, end_date = ?7, is_completed = ?8, progress = ?9,
                             updated_at = ?10
            WHERE id = ?1
            "#,
            &[
                text(&goal.id),
                text(&goal.title),
                opt_text(goal.description.as_deref()),
                text(&goal.category),
                text(goal.priority.as_str()),
                ts(&goal.start_date),
                opt_ts(goal.end_date.as_ref()),
                flag(goal.is_completed),
                int(goal.progress),
                ts(&Utc::now()),
            ],
        )
    }

    /// Set progress (clamped to 0..=100). Reaching 100 marks the goal completed.
    pub fn set_goal_progress(&self, id: &str, progress: i64) -> Result<()> {
        let progress = progress.clamp(0, 100);
        self.update_one(
            "goal",
            id,
            r#"
            UPDATE goals SET progress = ?2,
                             is_completed = CASE WHEN ?2 >= 100 THEN 1 ELSE is_completed END,
                             updated_at = ?3
            WHERE id = ?1
            "#,
            &[text(id), int(progress), ts(&Utc::now())],
        )
    }

    pub fn set_goal_completed(&self, id: &str, completed: bool) -> Result<()> {
        self.update_one(
            "goal",
            id,
            "UPDATE goals SET is_completed = ?2, updated_at = ?3 WHERE id = ?1",
            &[text(id), flag(completed), ts(&Utc::now())],
        )
    }

    /// Delete a goal. Its milestones go with it; its habits are detached.
    pub fn delete_goal(&self, id: &str) -> Result<bool> {
        self.delete_by_id("goals", id)
    }

    // ============================================
    // Milestone operations
    // ============================================

    pub fn insert_milestone(&self, milestone: &Milestone) -> Result<()> {
        self.execute(
            r#"
            INSERT INTO milestones (id, goal_id, title, description, due_date, is_completed,
                                    created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            &[
                text(&milestone.id),
                text(&milestone.goal_id),
                text(&milestone.title),
                opt_text(milestone.description.as_deref()),
                opt_ts(milestone.due_date.as_ref()),
                flag(milestone.is_completed),
                ts(&milestone.created_at),
                ts(&milestone.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_milestone(&self, id: &str) -> Result<Option<Milestone>> {
        self.first("SELECT * FROM milestones WHERE id = ?", &[text(id)])
    }

    /// Milestones of a goal, earliest due first (undated last)
    pub fn list_milestones(&self, goal_id: &str) -> Result<Vec<Milestone>> {
        self.query(
            r#"
            SELECT * FROM milestones WHERE goal_id = ?
            ORDER BY due_date IS NULL, due_date ASC, created_at ASC
            "#,
            &[text(goal_id)],
        )
    }

    pub fn set_milestone_completed(&self, id: &str, completed: bool) -> Result<()> {
        self.update_one(
            "milestone",
            id,
            "UPDATE milestones SET is_completed = ?2, updated_at = ?3 WHERE id = ?1",
            &[text(id), flag(completed), ts(&Utc::now())],
        )
    }

    /// Delete a milestone. Its tasks survive with `milestone_id = NULL`.
    pub fn delete_milestone(&self, id: &str) -> Result<bool> {
        self.delete_by_id("milestones", id)
    }

    // ============================================
    // Habit operations
    // ============================================

    pub fn insert_habit(&self, habit: &Habit) -> Result<()> {
        HABIT_LIMITS.check(&habit.title, habit.description.as_deref())?;
        self.execute(
            r#"
            INSERT INTO habits (id, goal_id, title, description, frequency, target_count,
                                current_streak, longest_streak, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            &[
                text(&habit.id),
                opt_text(habit.goal_id.as_deref()),
                text(&habit.title),
                opt_text(habit.description.as_deref()),
                text(habit.frequency.as_str()),
                int(habit.target_count),
                int(habit.current_streak),
                int(habit.longest_streak),
                flag(habit.is_active),
                ts(&habit.created_at),
                ts(&habit.updated_at),
            ],
        )?;
        tracing::debug!(id = %habit.id, "Habit inserted");
        Ok(())
    }

    pub fn get_habit(&self, id: &str) -> Result<Option<Habit>> {
        self.first("SELECT * FROM habits WHERE id = ?", &[text(id)])
    }

    pub fn list_habits(&self, active_only: bool) -> Result<Vec<Habit>> {
        let sql = if active_only {
            "SELECT * FROM habits WHERE is_active = 1 ORDER BY created_at ASC"
        } else {
            "SELECT * FROM habits ORDER BY created_at ASC"
        };
        self.query(sql, &[])
    }

    pub fn list_habits_for_goal(&self, goal_id: &str) -> Result<Vec<Habit>> {
        self.query(
            "SELECT * FROM habits WHERE goal_id = ? ORDER BY created_at ASC",
            &[text(goal_id)],
        )
    }

    pub fn set_habit_active(&self, id: &str, active: bool) -> Result<()> {
        self.update_one(
            "habit",
            id,
            "UPDATE habits SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            &[text(id), flag(active), ts(&Utc::now())],
        )
    }

    /// Log a completion and extend the streak, atomically.
    ///
    /// `longest_streak` follows `current_streak` when it is overtaken.
    pub fn record_habit_completion(
        &self,
        habit_id: &str,
        note: Option<&str>,
    ) -> Result<HabitCompletion> {
        let completion = HabitCompletion {
            id: new_id(),
            habit_id: habit_id.to_string(),
            completed_at: Utc::now(),
            note: note.map(str::to_string),
        };

        self.transact(&[
            Statement::new(
                "INSERT INTO habit_completions (id, habit_id, completed_at, note) VALUES (?1, ?2, ?3, ?4)",
                vec![
                    text(&completion.id),
                    text(habit_id),
                    ts(&completion.completed_at),
                    opt_text(note),
                ],
            ),
            Statement::new(
                r#"
                UPDATE habits SET current_streak = current_streak + 1,
                                  longest_streak = MAX(longest_streak, current_streak + 1),
                                  updated_at = ?2
                WHERE id = ?1
                "#,
                vec![text(habit_id), ts(&completion.completed_at)],
            ),
        ])?;

        tracing::debug!(habit_id, completion_id = %completion.id, "Habit completion recorded");
        Ok(completion)
    }

    /// Break the streak. `longest_streak` is kept.
    pub fn reset_habit_streak(&self, id: &str) -> Result<()> {
        self.update_one(
            "habit",
            id,
            "UPDATE habits SET current_streak = 0, updated_at = ?2 WHERE id = ?1",
            &[text(id), ts(&Utc::now())],
        )
    }

    /// Completions of a habit, newest first
    pub fn list_habit_completions(&self, habit_id: &str) -> Result<Vec<HabitCompletion>> {
        self.query(
            "SELECT * FROM habit_completions WHERE habit_id = ? ORDER BY completed_at DESC",
            &[text(habit_id)],
        )
    }

    /// Delete a habit together with its completions and reminders.
    pub fn delete_habit(&self, id: &str) -> Result<bool> {
        self.delete_by_id("habits", id)
    }

    // ============================================
    // Reminder operations
    // ============================================

    pub fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        self.execute(
            r#"
            INSERT INTO reminders (id, habit_id, time, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            &[
                text(&reminder.id),
                text(&reminder.habit_id),
                text(&reminder.time),
                flag(reminder.is_active),
                ts(&reminder.created_at),
                ts(&reminder.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn list_reminders(&self, habit_id: &str) -> Result<Vec<Reminder>> {
        self.query(
            "SELECT * FROM reminders WHERE habit_id = ? ORDER BY time ASC",
            &[text(habit_id)],
        )
    }

    pub fn set_reminder_active(&self, id: &str, active: bool) -> Result<()> {
        self.update_one(
            "reminder",
            id,
            "UPDATE reminders SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            &[text(id), flag(active), ts(&Utc::now())],
        )
    }

    pub fn delete_reminder(&self, id: &str) -> Result<bool> {
        self.delete_by_id("reminders", id)
    }

    // ============================================
    // Task operations
    // ============================================

    pub fn insert_task(&self, task: &Task) -> Result<()> {
        TASK_LIMITS.check(&task.title, task.description.as_deref())?;
        self.execute(
            r#"
            INSERT INTO tasks (id, milestone_id, title, description, priority, due_date,
                               is_completed, tags, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            &[
                text(&task.id),
                opt_text(task.milestone_id.as_deref()),
                text(&task.title),
                opt_text(task.description.as_deref()),
                text(task.priority.as_str()),
                opt_ts(task.due_date.as_ref()),
                flag(task.is_completed),
                Value::Text(encode_list(&task.tags)),
                ts(&task.created_at),
                ts(&task.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        self.first("SELECT * FROM tasks WHERE id = ?", &[text(id)])
    }

    /// Tasks ordered by due date (undated last)
    pub fn list_tasks(&self, include_completed: bool) -> Result<Vec<Task>> {
        let sql = if include_completed {
            "SELECT * FROM tasks ORDER BY due_date IS NULL, due_date ASC, created_at ASC"
        } else {
            "SELECT * FROM tasks WHERE is_completed = 0 ORDER BY due_date IS NULL, due_date ASC, created_at ASC"
        };
        self.query(sql, &[])
    }

    pub fn list_tasks_for_milestone(&self, milestone_id: &str) -> Result<Vec<Task>> {
        self.query(
            "SELECT * FROM tasks WHERE milestone_id = ? ORDER BY created_at ASC",
            &[text(milestone_id)],
        )
    }

    pub fn set_task_completed(&self, id: &str, completed: bool) -> Result<()> {
        self.update_one(
            "task",
            id,
            "UPDATE tasks SET is_completed = ?2, updated_at = ?3 WHERE id = ?1",
            &[text(id), flag(completed), ts(&Utc::now())],
        )
    }

    pub fn set_task_tags(&self, id: &str, tags: &[String]) -> Result<()> {
        self.update_one(
            "task",
            id,
            "UPDATE tasks SET tags = ?2, updated_at = ?3 WHERE id = ?1",
            &[text(id), Value::Text(encode_list(tags)), ts(&Utc::now())],
        )
    }

    /// Delete a task with its subtasks. Focus sessions on it are detached.
    pub fn delete_task(&self, id: &str) -> Result<bool> {
        self.delete_by_id("tasks", id)
    }

    // ============================================
    // Subtask operations
    // ============================================

    pub fn insert_subtask(&self, subtask: &Subtask) -> Result<()> {
        self.execute(
            r#"
            INSERT INTO subtasks (id, task_id, title, is_completed, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            &[
                text(&subtask.id),
                text(&subtask.task_id),
                text(&subtask.title),
                flag(subtask.is_completed),
                ts(&subtask.created_at),
                ts(&subtask.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn list_subtasks(&self, task_id: &str) -> Result<Vec<Subtask>> {
        self.query(
            "SELECT * FROM subtasks WHERE task_id = ? ORDER BY created_at ASC",
            &[text(task_id)],
        )
    }

    pub fn set_subtask_completed(&self, id: &str, completed: bool) -> Result<()> {
        self.update_one(
            "subtask",
            id,
            "UPDATE subtasks SET is_completed = ?2, updated_at = ?3 WHERE id = ?1",
            &[text(id), flag(completed), ts(&Utc::now())],
        )
    }

    pub fn delete_subtask(&self, id: &str) -> Result<bool> {
        self.delete_by_id("subtasks", id)
    }

    // ============================================
    // Virtual pet operations
    // ============================================

    pub fn insert_pet(&self, pet: &VirtualPet) -> Result<()> {
        self.execute(
            r#"
            INSERT INTO virtual_pets (id, name, level, xp, health, happiness, type, accessories,
                                      last_fed, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            &[
                text(&pet.id),
                text(&pet.name),
                int(pet.level),
                int(pet.xp),
                int(pet.health),
                int(pet.happiness),
                text(pet.species.as_str()),
                Value::Text(encode_list(&pet.accessories)),
                ts(&pet.last_fed),
                ts(&pet.created_at),
                ts(&pet.updated_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_pet(&self, id: &str) -> Result<Option<VirtualPet>> {
        self.first("SELECT * FROM virtual_pets WHERE id = ?", &[text(id)])
    }

    /// The install's pet: the oldest one, created with `name`/`species` if none exists.
    pub fn get_or_create_pet(&self, name: &str, species: PetSpecies) -> Result<VirtualPet> {
        if let Some(pet) =
            self.first("SELECT * FROM virtual_pets ORDER BY created_at ASC LIMIT 1", &[])?
        {
            return Ok(pet);
        }

        let pet = VirtualPet::new(name, species);
        self.insert_pet(&pet)?;
        tracing::info!(id = %pet.id, name, species = %species, "Virtual pet created");
        Ok(pet)
    }

    pub fn feed_pet(&self, id: &str) -> Result<()> {
        let now = Utc::now();
        self.update_one(
            "pet",
            id,
            "UPDATE virtual_pets SET last_fed = ?2, updated_at = ?2 WHERE id = ?1",
            &[text(id), ts(&now)],
        )
    }

    pub fn set_pet_accessories(&self, id: &str, accessories: &[String]) -> Result<()> {
        self.update_one(
            "pet",
            id,
            "UPDATE virtual_pets SET accessories = ?2, updated_at = ?3 WHERE id = ?1",
            &[text(id), Value::Text(encode_list(accessories)), ts(&Utc::now())],
        )
    }

    /// Add the reward's XP and recompute the level. Returns the updated pet.
    pub fn award_pet_xp(&self, id: &str, reward: XpReward) -> Result<VirtualPet> {
        self.with_transaction(|tx| {
            let mut stmt = tx.prepare("SELECT * FROM virtual_pets WHERE id = ?")?;
            let mut pet = stmt
                .query_map([id], VirtualPet::from_row)?
                .next()
                .transpose()?;
            let pet = pet.as_mut().ok_or_else(|| Error::NotFound {
                entity: "pet",
                id: id.to_string(),
            })?;

            let previous_level = pet.level;
            pet.xp += reward.points();
            pet.level = level_for_xp(pet.xp);
            pet.updated_at = Utc::now();

            tx.execute(
                "UPDATE virtual_pets SET xp = ?2, level = ?3, updated_at = ?4 WHERE id = ?1",
                rusqlite::params![id, pet.xp, pet.level, pet.updated_at.to_rfc3339()],
            )?;

            if pet.level > previous_level {
                tracing::info!(id, level = pet.level, "Virtual pet levelled up");
            }
            Ok(pet.clone())
        })
    }

    // ============================================
    // Focus session operations
    // ============================================

    pub fn insert_focus_session(&self, session: &FocusSession) -> Result<()> {
        self.execute(
            r#"
            INSERT INTO focus_sessions (id, duration, type, start_time, end_time, is_completed,
                                        task_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            &[
                text(&session.id),
                int(session.duration),
                text(session.kind.as_str()),
                ts(&session.start_time),
                opt_ts(session.end_time.as_ref()),
                flag(session.is_completed),
                opt_text(session.task_id.as_deref()),
                ts(&session.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_focus_session(&self, id: &str) -> Result<Option<FocusSession>> {
        self.first("SELECT * FROM focus_sessions WHERE id = ?", &[text(id)])
    }

    /// Mark a session finished at `end_time`.
    pub fn complete_focus_session(&self, id: &str, end_time: DateTime<Utc>) -> Result<()> {
        self.update_one(
            "focus session",
            id,
            "UPDATE focus_sessions SET end_time = ?2, is_completed = 1 WHERE id = ?1",
            &[text(id), ts(&end_time)],
        )
    }

    /// Sessions started at or after `since`, oldest first
    pub fn list_focus_sessions_since(&self, since: DateTime<Utc>) -> Result<Vec<FocusSession>> {
        self.query(
            "SELECT * FROM focus_sessions WHERE start_time >= ? ORDER BY start_time ASC",
            &[ts(&since)],
        )
    }

    /// Completed work sessions started at or after `since`; drives the long-break cadence.
    pub fn count_completed_work_sessions(&self, since: DateTime<Utc>) -> Result<u32> {
        let rows: Vec<Scalar<i64>> = self.query(
            "SELECT COUNT(*) FROM focus_sessions WHERE type = 'work' AND is_completed = 1 AND start_time >= ?",
            &[ts(&since)],
        )?;
        Ok(rows.first().map(|s| s.0).unwrap_or(0) as u32)
    }

    // ============================================
    // Coaching operations
    // ============================================

    pub fn insert_coaching(&self, coaching: &Coaching) -> Result<()> {
        self.execute(
            r#"
            INSERT INTO ai_coaching (id, type, content, is_read, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            &[
                text(&coaching.id),
                text(coaching.kind.as_str()),
                text(&coaching.content),
                flag(coaching.is_read),
                ts(&coaching.created_at),
            ],
        )?;
        Ok(())
    }

    /// Coaching messages, newest first
    pub fn list_coaching(&self, unread_only: bool) -> Result<Vec<Coaching>> {
        let sql = if unread_only {
            "SELECT * FROM ai_coaching WHERE is_read = 0 ORDER BY created_at DESC"
        } else {
            "SELECT * FROM ai_coaching ORDER BY created_at DESC"
        };
        self.query(sql, &[])
    }

    pub fn mark_coaching_read(&self, id: &str) -> Result<()> {
        self.update_one(
            "coaching",
            id,
            "UPDATE ai_coaching SET is_read = 1 WHERE id = ?1",
            &[text(id)],
        )
    }
}

/// Look up a goal or fail with [`Error::NotFound`].
pub fn require_goal(db: &Database, id: &str) -> Result<Goal> {
    Database::require(db.get_goal(id)?, "goal", id)
}

/// Look up a habit or fail with [`Error::NotFound`].
pub fn require_habit(db: &Database, id: &str) -> Result<Habit> {
    Database::require(db.get_habit(id)?, "habit", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_goal_crud() {
        let db = test_db();
        let mut goal = Goal::new("Run a half marathon", "fitness");
        goal.description = Some("Spring race".to_string());
        goal.priority = Priority::High;

        db.insert_goal(&goal).unwrap();
        assert_eq!(db.get_goal(&goal.id).unwrap().unwrap(), goal);

        db.set_goal_progress(&goal.id, 40).unwrap();
        let stored = require_goal(&db, &goal.id).unwrap();
        assert_eq!(stored.progress, 40);
        assert!(!stored.is_completed);

        db.set_goal_progress(&goal.id, 250).unwrap();
        let stored = require_goal(&db, &goal.id).unwrap();
        assert_eq!(stored.progress, 100);
        assert!(stored.is_completed);

        assert_eq!(db.list_goals().unwrap().len(), 1);
        assert!(db.delete_goal(&goal.id).unwrap());
        assert!(!db.delete_goal(&goal.id).unwrap());
        assert!(db.get_goal(&goal.id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_row_is_not_found() {
        let db = test_db();
        let err = db.set_task_completed("missing", true).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "task", .. }));
    }

    #[test]
    fn test_insert_validates_titles() {
        let db = test_db();
        let err = db.insert_goal(&Goal::new("Go", "misc")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(db.count_rows("goals").unwrap(), 0);
    }

    #[test]
    fn test_task_tags_roundtrip() {
        let db = test_db();
        let mut task = Task::new("Buy running shoes");
        task.tags = vec!["errand".to_string(), "gear, shoes".to_string()];
        db.insert_task(&task).unwrap();

        assert_eq!(db.get_task(&task.id).unwrap().unwrap().tags, task.tags);

        db.set_task_tags(&task.id, &["done".to_string()]).unwrap();
        assert_eq!(
            db.get_task(&task.id).unwrap().unwrap().tags,
            vec!["done".to_string()]
        );
    }

    #[test]
    fn test_corrupt_tags_surface_as_query_error() {
        let db = test_db();
        let task = Task::new("Water the plants");
        db.insert_task(&task).unwrap();
        db.execute(
            "UPDATE tasks SET tags = 'not json' WHERE id = ?",
            &[text(&task.id)],
        )
        .unwrap();

        assert!(matches!(db.get_task(&task.id), Err(Error::Query { .. })));
    }

    #[test]
    fn test_habit_completion_extends_streak() {
        let db = test_db();
        let mut habit = Habit::new("Meditate");
        habit.longest_streak = 2;
        db.insert_habit(&habit).unwrap();

        db.record_habit_completion(&habit.id, Some("10 minutes")).unwrap();
        let stored = require_habit(&db, &habit.id).unwrap();
        assert_eq!(stored.current_streak, 1);
        assert_eq!(stored.longest_streak, 2);

        db.record_habit_completion(&habit.id, None).unwrap();
        db.record_habit_completion(&habit.id, None).unwrap();
        let stored = require_habit(&db, &habit.id).unwrap();
        assert_eq!(stored.current_streak, 3);
        assert_eq!(stored.longest_streak, 3);

        db.reset_habit_streak(&habit.id).unwrap();
        let stored = require_habit(&db, &habit.id).unwrap();
        assert_eq!(stored.current_streak, 0);
        assert_eq!(stored.longest_streak, 3);

        let completions = db.list_habit_completions(&habit.id).unwrap();
        assert_eq!(completions.len(), 3);
        assert!(completions
            .iter()
            .any(|c| c.note.as_deref() == Some("10 minutes")));
    }

    #[test]
    fn test_completion_for_missing_habit_changes_nothing() {
        let db = test_db();
        assert!(db.record_habit_completion("ghost", None).is_err());
        assert_eq!(db.count_rows("habit_completions").unwrap(), 0);
    }

    #[test]
    fn test_pet_lifecycle() {
        let db = test_db();
        let pet = db.get_or_create_pet("Pip", PetSpecies::Bird).unwrap();
        let again = db.get_or_create_pet("Other", PetSpecies::Dog).unwrap();
        assert_eq!(pet.id, again.id);
        assert_eq!(again.name, "Pip");
        assert_eq!(db.count_rows("virtual_pets").unwrap(), 1);

        let pet = db.award_pet_xp(&pet.id, XpReward::CompleteGoal).unwrap();
        assert_eq!(pet.xp, 100);
        assert_eq!(pet.level, 2);

        let stored = db.get_pet(&pet.id).unwrap().unwrap();
        assert_eq!(stored.xp, 100);
        assert_eq!(stored.level, 2);

        db.set_pet_accessories(&pet.id, &["scarf".to_string()]).unwrap();
        db.feed_pet(&pet.id).unwrap();
        let stored = db.get_pet(&pet.id).unwrap().unwrap();
        assert_eq!(stored.accessories, vec!["scarf".to_string()]);
        assert!(stored.last_fed >= pet.last_fed);

        assert!(matches!(
            db.award_pet_xp("missing", XpReward::FocusSession),
            Err(Error::NotFound { entity: "pet", .. })
        ));
    }

    #[test]
    fn test_focus_sessions() {
        let db = test_db();
        let since = Utc::now() - chrono::Duration::hours(1);

        for _ in 0..2 {
            let session = FocusSession::start(FocusKind::Work, None);
            db.insert_focus_session(&session).unwrap();
            db.complete_focus_session(&session.id, Utc::now()).unwrap();
        }
        let open = FocusSession::start(FocusKind::ShortBreak, None);
        db.insert_focus_session(&open).unwrap();

        assert_eq!(db.list_focus_sessions_since(since).unwrap().len(), 3);
        assert_eq!(db.count_completed_work_sessions(since).unwrap(), 2);

        let stored = db.get_focus_session(&open.id).unwrap().unwrap();
        assert_eq!(stored.kind, FocusKind::ShortBreak);
        assert_eq!(stored.duration, 300);
        assert!(stored.end_time.is_none());
    }

    #[test]
    fn test_coaching_read_flag() {
        let db = test_db();
        let tip = Coaching::new(CoachingKind::Insight, "You focus best before noon.");
        db.insert_coaching(&tip).unwrap();
        db.insert_coaching(&Coaching::new(CoachingKind::Motivation, "Keep going!"))
            .unwrap();

        assert_eq!(db.list_coaching(true).unwrap().len(), 2);
        db.mark_coaching_read(&tip.id).unwrap();
        assert_eq!(db.list_coaching(true).unwrap().len(), 1);
        assert_eq!(db.list_coaching(false).unwrap().len(), 2);
    }

    #[test]
    fn test_user_unique_email() {
        let db = test_db();
        let now = Utc::now();
        let user = User {
            id: new_id(),
            email: "sam@example.com".to_string(),
            name: "Sam".to_string(),
            avatar: None,
            is_premium: false,
            created_at: now,
            updated_at: now,
        };
        db.insert_user(&user).unwrap();
        assert_eq!(db.get_user(&user.id).unwrap().unwrap(), user);

        let dup = User {
            id: new_id(),
            ..user.clone()
        };
        assert!(db.insert_user(&dup).unwrap_err().is_constraint_violation());
    }

    #[test]
    fn test_schema_default_timestamps_parse() {
        let db = test_db();
        db.execute(
            "INSERT INTO ai_coaching (id, type, content) VALUES ('c1', 'suggestion', 'Drink water')",
            &[],
        )
        .unwrap();
        let all = db.list_coaching(false).unwrap();
        assert_eq!(all.len(), 1);
        assert!(!all[0].is_read);
    }
}
