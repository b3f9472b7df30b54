//! Persisted preferences outside the relational store
//!
//! Small string values (onboarding flag, theme) live in a key-value file next
//! to the database.

pub mod kv;
pub mod onboarding;
pub mod theme;

pub use kv::{FileKvStore, KvStore, MemoryKvStore};
pub use onboarding::{OnboardingStore, ONBOARDING_KEY};
pub use theme::{ThemeId, ThemeInfo, ThemeStore, THEME_KEY};
