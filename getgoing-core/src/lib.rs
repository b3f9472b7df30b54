//! # getgoing-core
//!
//! Core library for GetGoing - a goals, habits and focus productivity app.
//!
//! This library provides:
//! - The local relational store: schema, persistence gateway, typed repository
//! - A no-op mock gateway with the same contract
//! - Persisted preferences: onboarding completion and theme
//! - The navigation gate that picks the first screen
//! - Configuration management and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use getgoing_core::{AppContext, Config, Goal, Route};
//!
//! let config = Config::load().expect("failed to load config");
//! let ctx = AppContext::new(config);
//!
//! if ctx.start().expect("failed to start") == Route::Onboarding {
//!     ctx.gate.complete_onboarding().expect("failed to save onboarding");
//! }
//!
//! ctx.db.insert_goal(&Goal::new("Read 12 books", "growth")).expect("insert failed");
//! ```

// Re-export commonly used items at the crate root
pub use app::AppContext;
pub use config::Config;
pub use db::{Database, Gateway, MockDatabase};
pub use error::{Error, InitializationSource, Result};
pub use gate::{NavigationGate, Route};
pub use prefs::{OnboardingStore, ThemeId, ThemeStore};
pub use subscription::Subscription;
pub use types::*;

// Public modules
pub mod app;
pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod logging;
pub mod prefs;
pub mod subscription;
pub mod types;
