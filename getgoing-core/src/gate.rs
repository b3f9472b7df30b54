//! Navigation gate
//!
//! Decides whether the app opens on the onboarding flow or the main screen.
//!
//! ```text
//! Loading ──resolve()──> Onboarding ──complete_onboarding()──> Main
//!    └─────resolve()─────────────────────────────────────────────^
//! ```
//!
//! `Main` is terminal for the process lifetime.

use crate::error::{Error, Result};
use crate::prefs::OnboardingStore;
use crate::subscription::{Publisher, Subscription};
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

/// Top-level route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Completion flag not read yet
    Loading,
    Onboarding,
    Main,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Loading => "loading",
            Route::Onboarding => "onboarding",
            Route::Main => "main",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

pub struct NavigationGate {
    onboarding: OnboardingStore,
    route: Publisher<Route>,
    // Held across read-decide-publish so transitions never interleave
    transition: Mutex<()>,
}

impl NavigationGate {
    /// A gate in [`Route::Loading`]. Nothing is read until [`resolve`](Self::resolve).
    pub fn new(onboarding: OnboardingStore) -> Self {
        Self {
            onboarding,
            route: Publisher::new(Route::Loading),
            transition: Mutex::new(()),
        }
    }

    pub fn route(&self) -> Route {
        self.route.get()
    }

    /// Leave `Loading` based on the persisted flag.
    ///
    /// The flag is read once; later calls return the current route unchanged.
    pub fn resolve(&self) -> Route {
        let _guard = self.lock();
        let current = self.route.get();
        if current != Route::Loading {
            return current;
        }

        let next = if self.onboarding.is_complete() {
            Route::Main
        } else {
            Route::Onboarding
        };
        self.route.publish(next);
        tracing::info!(route = %next, "Navigation resolved");
        next
    }

    /// Persist completion and move `Onboarding -> Main`.
    ///
    /// A no-op in `Main`. Fails with [`Error::InvalidTransition`] while still
    /// `Loading`. If persisting fails the gate stays in `Onboarding`.
    pub fn complete_onboarding(&self) -> Result<()> {
        let _guard = self.lock();
        match self.route.get() {
            Route::Main => Ok(()),
            Route::Loading => Err(Error::InvalidTransition(
                "cannot complete onboarding before the route is resolved".to_string(),
            )),
            Route::Onboarding => {
                self.onboarding.mark_complete()?;
                self.route.publish(Route::Main);
                tracing::info!(route = %Route::Main, "Onboarding finished");
                Ok(())
            }
        }
    }

    pub fn subscribe(&self) -> Subscription<Route> {
        self.route.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::{KvStore, MemoryKvStore, ONBOARDING_KEY};
    use std::sync::Arc;

    fn gate_over(kv: Arc<MemoryKvStore>) -> NavigationGate {
        NavigationGate::new(OnboardingStore::new(kv))
    }

    #[test]
    fn test_fresh_install_goes_to_onboarding() {
        let gate = gate_over(Arc::new(MemoryKvStore::new()));
        assert_eq!(gate.route(), Route::Loading);
        assert_eq!(gate.resolve(), Route::Onboarding);
    }

    #[test]
    fn test_completed_install_goes_to_main() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set(ONBOARDING_KEY, "true").unwrap();
        assert_eq!(gate_over(kv).resolve(), Route::Main);
    }

    #[test]
    fn test_complete_onboarding_transitions() {
        let kv = Arc::new(MemoryKvStore::new());
        let gate = gate_over(kv.clone());
        let mut sub = gate.subscribe();

        assert!(matches!(
            gate.complete_onboarding(),
            Err(Error::InvalidTransition(_))
        ));
        assert_eq!(kv.get(ONBOARDING_KEY).unwrap(), None);

        gate.resolve();
        assert_eq!(sub.try_next(), Some(Route::Onboarding));

        gate.complete_onboarding().unwrap();
        assert_eq!(gate.route(), Route::Main);
        assert_eq!(sub.try_next(), Some(Route::Main));
        assert_eq!(kv.get(ONBOARDING_KEY).unwrap().as_deref(), Some("true"));

        gate.complete_onboarding().unwrap();
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_resolve_reads_flag_once() {
        let kv = Arc::new(MemoryKvStore::new());
        let gate = gate_over(kv.clone());
        assert_eq!(gate.resolve(), Route::Onboarding);

        kv.set(ONBOARDING_KEY, "true").unwrap();
        assert_eq!(gate.resolve(), Route::Onboarding);
    }
}
