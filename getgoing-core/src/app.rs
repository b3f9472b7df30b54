//! Application context
//!
//! Owns everything the app needs at startup: configuration, the database,
//! the preference stores and the navigation gate. Construct one per process
//! and pass it down; there are no globals.

use crate::config::Config;
use crate::db::{Database, Gateway};
use crate::error::Result;
use crate::gate::{NavigationGate, Route};
use crate::prefs::{FileKvStore, KvStore, OnboardingStore, ThemeStore};
use std::sync::Arc;

pub struct AppContext {
    pub config: Config,
    pub db: Database,
    pub kv: Arc<dyn KvStore>,
    pub onboarding: OnboardingStore,
    pub theme: ThemeStore,
    pub gate: NavigationGate,
}

impl AppContext {
    /// Wire up the on-disk backends named by `config`. Nothing is opened yet.
    pub fn new(config: Config) -> Self {
        let db = Database::new(config.resolved_database_path());
        let kv: Arc<dyn KvStore> = Arc::new(FileKvStore::new(config.resolved_preferences_path()));
        Self::with_backends(config, db, kv)
    }

    /// Wire up explicit backends (for testing).
    pub fn with_backends(config: Config, db: Database, kv: Arc<dyn KvStore>) -> Self {
        let onboarding = OnboardingStore::new(kv.clone());
        let theme = ThemeStore::load(kv.clone());
        let gate = NavigationGate::new(onboarding.clone());
        Self {
            config,
            db,
            kv,
            onboarding,
            theme,
            gate,
        }
    }

    /// App launch: open the database and decide the first route.
    pub fn start(&self) -> Result<Route> {
        self.db.initialize()?;
        let route = self.gate.resolve();
        tracing::info!(
            route = %route,
            theme = %self.theme.get(),
            database = ?self.db.path(),
            "Application started"
        );
        Ok(route)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.db.shutdown()
    }
}
