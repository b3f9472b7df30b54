//! Theme preference
//!
//! One persisted theme id, loaded once at startup and broadcast to
//! subscribers on change. Unknown ids never reach storage.

use super::kv::KvStore;
use crate::error::Result;
use crate::subscription::{Publisher, Subscription};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Storage key of the active theme id.
pub const THEME_KEY: &str = "@GetGoing:theme_mode";

/// Available visual themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeId {
    Calm,
    Energetic,
    Focus,
    Wellness,
    Night,
    Minimalist,
    NatureInspired,
    Corporate,
    Retro,
    Futuristic,
}

impl ThemeId {
    pub const ALL: [ThemeId; 10] = [
        ThemeId::Calm,
        ThemeId::Energetic,
        ThemeId::Focus,
        ThemeId::Wellness,
        ThemeId::Night,
        ThemeId::Minimalist,
        ThemeId::NatureInspired,
        ThemeId::Corporate,
        ThemeId::Retro,
        ThemeId::Futuristic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeId::Calm => "calm",
            ThemeId::Energetic => "energetic",
            ThemeId::Focus => "focus",
            ThemeId::Wellness => "wellness",
            ThemeId::Night => "night",
            ThemeId::Minimalist => "minimalist",
            ThemeId::NatureInspired => "nature-inspired",
            ThemeId::Corporate => "corporate",
            ThemeId::Retro => "retro",
            ThemeId::Futuristic => "futuristic",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ThemeId::Calm => "Calm",
            ThemeId::Energetic => "Energetic",
            ThemeId::Focus => "Focus",
            ThemeId::Wellness => "Wellness",
            ThemeId::Night => "Night",
            ThemeId::Minimalist => "Minimalist",
            ThemeId::NatureInspired => "Nature Inspired",
            ThemeId::Corporate => "Corporate",
            ThemeId::Retro => "Retro",
            ThemeId::Futuristic => "Futuristic",
        }
    }

    /// One-line description for the theme selector
    pub fn description(&self) -> &'static str {
        match self {
            ThemeId::Calm => "Calming blue gradient for focus and productivity",
            ThemeId::Energetic => "Energetic sunset gradient for motivation and action",
            ThemeId::Focus => "Neutral gray gradient for deep focus sessions",
            ThemeId::Wellness => "Sage green gradient for mental wellness and balance",
            ThemeId::Night => "Dark gradient for evening and night sessions",
            ThemeId::Minimalist => "Clean minimalist gradient for distraction-free focus",
            ThemeId::NatureInspired => "Natural earth tones for grounding and connection",
            ThemeId::Corporate => "Professional blue gradient for business environments",
            ThemeId::Retro => "Vintage warm gradient for nostalgic productivity",
            ThemeId::Futuristic => "Cyberpunk neon gradient for innovative thinking",
        }
    }
}

impl Default for ThemeId {
    fn default() -> Self {
        ThemeId::Futuristic
    }
}

impl FromStr for ThemeId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ThemeId::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown theme: {}", s))
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Theme selector entry
#[derive(Debug, Clone, Serialize)]
pub struct ThemeInfo {
    pub id: ThemeId,
    pub name: &'static str,
    pub description: &'static str,
}

pub struct ThemeStore {
    kv: Arc<dyn KvStore>,
    active: Publisher<ThemeId>,
}

impl ThemeStore {
    /// Read the persisted theme. Missing, unknown or unreadable -> default.
    pub fn load(kv: Arc<dyn KvStore>) -> Self {
        let theme = match kv.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Ignoring unknown stored theme");
                ThemeId::default()
            }),
            Ok(None) => ThemeId::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read theme preference, using default");
                ThemeId::default()
            }
        };

        tracing::debug!(theme = %theme, "Theme loaded");
        Self {
            kv,
            active: Publisher::new(theme),
        }
    }

    pub fn get(&self) -> ThemeId {
        self.active.get()
    }

    /// Switch theme by id.
    ///
    /// Returns `Ok(false)` and changes nothing for an unknown id. A valid id
    /// is activated and broadcast, then persisted. A persistence failure is
    /// returned but the theme stays active for this run.
    pub fn set(&self, id: &str) -> Result<bool> {
        let theme = match id.parse::<ThemeId>() {
            Ok(theme) => theme,
            Err(_) => {
                tracing::debug!(id, "Rejected unknown theme id");
                return Ok(false);
            }
        };

        self.active.publish(theme);
        tracing::info!(theme = %theme, "Theme changed");

        if let Err(e) = self.kv.set(THEME_KEY, theme.as_str()) {
            tracing::warn!(theme = %theme, error = %e, "Failed to save theme preference");
            return Err(e);
        }
        Ok(true)
    }

    pub fn subscribe(&self) -> Subscription<ThemeId> {
        self.active.subscribe()
    }

    /// Every theme with its display name and description.
    pub fn available() -> Vec<ThemeInfo> {
        ThemeId::ALL
            .into_iter()
            .map(|id| ThemeInfo {
                id,
                name: id.display_name(),
                description: id.description(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::prefs::kv::MemoryKvStore;

    /// Backend whose writes always fail.
    struct ReadOnlyKv;

    impl KvStore for ReadOnlyKv {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_theme_id_text() {
        for theme in ThemeId::ALL {
            assert_eq!(theme.as_str().parse::<ThemeId>().unwrap(), theme);
        }
        assert_eq!(
            "nature-inspired".parse::<ThemeId>().unwrap(),
            ThemeId::NatureInspired
        );
        assert!("Calm".parse::<ThemeId>().is_err());
    }

    #[test]
    fn test_load_defaults() {
        let kv = Arc::new(MemoryKvStore::new());
        assert_eq!(ThemeStore::load(kv.clone()).get(), ThemeId::Futuristic);

        kv.set(THEME_KEY, "sepia").unwrap();
        assert_eq!(ThemeStore::load(kv.clone()).get(), ThemeId::Futuristic);

        kv.set(THEME_KEY, "retro").unwrap();
        assert_eq!(ThemeStore::load(kv).get(), ThemeId::Retro);
    }

    #[test]
    fn test_set_invalid_changes_nothing() {
        let kv = Arc::new(MemoryKvStore::new());
        let store = ThemeStore::load(kv.clone());
        let mut sub = store.subscribe();

        assert!(!store.set("not-a-real-theme").unwrap());
        assert_eq!(store.get(), ThemeId::Futuristic);
        assert_eq!(kv.get(THEME_KEY).unwrap(), None);
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_set_valid_persists_and_broadcasts() {
        let kv = Arc::new(MemoryKvStore::new());
        let store = ThemeStore::load(kv.clone());
        let mut sub = store.subscribe();

        assert!(store.set("calm").unwrap());
        assert_eq!(store.get(), ThemeId::Calm);
        assert_eq!(kv.get(THEME_KEY).unwrap().as_deref(), Some("calm"));
        assert_eq!(sub.try_next(), Some(ThemeId::Calm));
    }

    #[test]
    fn test_available_lists_every_theme() {
        let themes = ThemeStore::available();
        assert_eq!(themes.len(), 10);
        let night = themes.iter().find(|t| t.id == ThemeId::Night).unwrap();
        assert_eq!(night.description, "Dark gradient for evening and night sessions");
    }

    #[test]
    fn test_set_activates_even_when_save_fails() {
        let store = ThemeStore::load(Arc::new(ReadOnlyKv));
        let mut sub = store.subscribe();

        assert!(matches!(store.set("calm"), Err(Error::Io(_))));
        assert_eq!(store.get(), ThemeId::Calm);
        assert_eq!(sub.try_next(), Some(ThemeId::Calm));
    }
}
