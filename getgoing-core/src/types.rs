//! Core domain types for getgoing
//!
//! These types mirror the rows of the local relational store. Every entity is
//! keyed by a caller-supplied opaque string id; [`new_id`] produces one.
//!
//! ## Ownership
//!
//! | Parent | Child | On parent delete |
//! |--------|-------|------------------|
//! | Goal | Milestone | cascade |
//! | Goal | Habit | detach (`goal_id = NULL`) |
//! | Milestone | Task | detach (`milestone_id = NULL`) |
//! | Task | Subtask | cascade |
//! | Task | FocusSession | detach (`task_id = NULL`) |
//! | Habit | HabitCompletion, Reminder | cascade |

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generate a fresh primary key.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Parse a stored timestamp.
///
/// Rows written by this crate carry RFC 3339 text; rows that fell back to the
/// schema's `CURRENT_TIMESTAMP` default carry `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal, default = $default:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Column name used in error messages
            pub const FIELD: &'static str = $field;

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("unknown {}: {}", $field, s)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }
    };
}

text_enum! {
    /// Priority shared by goals and tasks
    Priority, "priority", default = Medium {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

text_enum! {
    /// How often a habit is expected to be performed
    Frequency, "frequency", default = Daily {
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
    }
}

text_enum! {
    /// Virtual pet species
    PetSpecies, "type", default = Cat {
        Cat => "cat",
        Dog => "dog",
        Bird => "bird",
        Fish => "fish",
    }
}

text_enum! {
    /// Kind of focus session
    FocusKind, "type", default = Work {
        Work => "work",
        ShortBreak => "short-break",
        LongBreak => "long-break",
    }
}

text_enum! {
    /// Kind of coaching message
    CoachingKind, "type", default = Suggestion {
        Suggestion => "suggestion",
        Insight => "insight",
        Motivation => "motivation",
    }
}

// ============================================
// Focus timer
// ============================================

/// Work sessions between long breaks.
pub const LONG_BREAK_INTERVAL: u32 = 4;

impl FocusKind {
    /// Default timer length in seconds
    pub fn default_duration_secs(&self) -> i64 {
        match self {
            FocusKind::Work => 25 * 60,
            FocusKind::ShortBreak => 5 * 60,
            FocusKind::LongBreak => 15 * 60,
        }
    }
}

/// Kind of session that follows `current`, given how many work sessions have
/// been completed so far (including `current` if it was work).
pub fn next_focus_kind(current: FocusKind, completed_work_sessions: u32) -> FocusKind {
    match current {
        FocusKind::Work
            if completed_work_sessions > 0
                && completed_work_sessions % LONG_BREAK_INTERVAL == 0 =>
        {
            FocusKind::LongBreak
        }
        FocusKind::Work => FocusKind::ShortBreak,
        FocusKind::ShortBreak | FocusKind::LongBreak => FocusKind::Work,
    }
}

// ============================================
// Gamification
// ============================================

/// Actions that earn the pet experience points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XpReward {
    CompleteHabit,
    CompleteTask,
    CompleteMilestone,
    CompleteGoal,
    FocusSession,
}

impl XpReward {
    pub fn points(&self) -> i64 {
        match self {
            XpReward::CompleteHabit => 10,
            XpReward::CompleteTask => 15,
            XpReward::CompleteMilestone => 50,
            XpReward::CompleteGoal => 100,
            XpReward::FocusSession => 5,
        }
    }
}

/// Minimum XP for each level; level N starts at `LEVEL_THRESHOLDS[N - 1]`.
pub const LEVEL_THRESHOLDS: [i64; 11] = [
    0, 100, 250, 500, 1000, 2000, 3500, 5500, 8000, 12000, 17000,
];

/// Level reached with `xp` experience points (1-based, capped at the last threshold).
pub fn level_for_xp(xp: i64) -> i64 {
    LEVEL_THRESHOLDS.iter().filter(|&&t| xp >= t).count().max(1) as i64
}

// ============================================
// Validation
// ============================================

/// Title and description length limits for a user-authored entity
#[derive(Debug, Clone, Copy)]
pub struct TextLimits {
    pub entity: &'static str,
    pub title_min: usize,
    pub title_max: usize,
    pub description_max: usize,
}

pub const GOAL_LIMITS: TextLimits = TextLimits {
    entity: "goal",
    title_min: 3,
    title_max: 100,
    description_max: 500,
};

pub const HABIT_LIMITS: TextLimits = TextLimits {
    entity: "habit",
    title_min: 3,
    title_max: 50,
    description_max: 200,
};

pub const TASK_LIMITS: TextLimits = TextLimits {
    entity: "task",
    title_min: 3,
    title_max: 100,
    description_max: 300,
};

impl TextLimits {
    /// Check a title/description pair; lengths count characters, not bytes.
    pub fn check(&self, title: &str, description: Option<&str>) -> crate::Result<()> {
        let title_len = title.trim().chars().count();
        if title_len < self.title_min || title_len > self.title_max {
            return Err(crate::Error::Validation(format!(
                "{} title must be {}-{} characters, got {}",
                self.entity, self.title_min, self.title_max, title_len
            )));
        }
        if let Some(desc) = description {
            let desc_len = desc.chars().count();
            if desc_len > self.description_max {
                return Err(crate::Error::Validation(format!(
                    "{} description must be at most {} characters, got {}",
                    self.entity, self.description_max, desc_len
                )));
            }
        }
        Ok(())
    }
}

// ============================================
// Entities
// ============================================

/// The local account. Present in the schema but unreferenced by other tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: Priority,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    /// Percentage, 0 to 100
    pub progress: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// A new, incomplete goal starting now.
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title: title.into(),
            description: None,
            category: category.into(),
            priority: Priority::default(),
            start_date: now,
            end_date: None,
            is_completed: false,
            progress: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub goal_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Milestone {
    pub fn new(goal_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            goal_id: goal_id.into(),
            title: title.into(),
            description: None,
            due_date: None,
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: String,
    pub goal_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub target_count: i64,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            goal_id: None,
            title: title.into(),
            description: None,
            frequency: Frequency::default(),
            target_count: 1,
            current_streak: 0,
            longest_streak: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub milestone_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            milestone_id: None,
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
            is_completed: false,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub task_id: String,
    pub title: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subtask {
    pub fn new(task_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            task_id: task_id.into(),
            title: title.into(),
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One check-off of a habit. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitCompletion {
    pub id: String,
    pub habit_id: String,
    pub completed_at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub habit_id: String,
    /// Time of day, `HH:MM`
    pub time: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    pub fn new(habit_id: impl Into<String>, time: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            habit_id: habit_id.into(),
            time: time.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualPet {
    pub id: String,
    pub name: String,
    pub level: i64,
    pub xp: i64,
    pub health: i64,
    pub happiness: i64,
    pub species: PetSpecies,
    pub accessories: Vec<String>,
    pub last_fed: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VirtualPet {
    pub fn new(name: impl Into<String>, species: PetSpecies) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.into(),
            level: 1,
            xp: 0,
            health: 100,
            happiness: 100,
            species,
            accessories: Vec::new(),
            last_fed: now,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSession {
    pub id: String,
    /// Planned length in seconds
    pub duration: i64,
    pub kind: FocusKind,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub task_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FocusSession {
    /// A session of `kind` starting now with the default duration.
    pub fn start(kind: FocusKind, task_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            duration: kind.default_duration_secs(),
            kind,
            start_time: now,
            end_time: None,
            is_completed: false,
            task_id,
            created_at: now,
        }
    }
}

/// A coaching message shown to the user. Only `is_read` ever changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coaching {
    pub id: String,
    pub kind: CoachingKind,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Coaching {
    pub fn new(kind: CoachingKind, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            kind,
            content: content.into(),
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
