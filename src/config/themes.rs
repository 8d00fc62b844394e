use std::sync::Arc;

use super::ThemeName;
use crate::storage::KeyValueStore;

/// The active theme, mirrored to its own key in the store.
pub struct ThemePreference {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    current: ThemeName,
}

impl ThemePreference {
    /// Saved theme if there is a readable one, `fallback` otherwise.
    pub fn load(kv: Arc<dyn KeyValueStore>, key: impl Into<String>, fallback: ThemeName) -> Self {
        let key = key.into();
        let current = match kv.get(&key) {
            Ok(Some(raw)) => raw.trim().parse::<ThemeName>().unwrap_or_else(|_| {
                tracing::warn!(%raw, "ignoring unknown saved theme");
                fallback
            }),
            Ok(None) => fallback,
            Err(err) => {
                tracing::warn!(?err, "failed to read saved theme");
                fallback
            }
        };
        Self { kv, key, current }
    }

    pub fn current(&self) -> ThemeName {
        self.current
    }

    pub fn set(&mut self, theme: ThemeName) {
        self.current = theme;
        if let Err(err) = self.kv.set(&self.key, &theme.to_string()) {
            tracing::warn!(?err, %theme, "failed to persist theme");
        }
    }

    pub fn toggle(&mut self) -> ThemeName {
        let next = self.current.toggled();
        self.set(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn falls_back_until_a_theme_is_saved() {
        let kv = Arc::new(MemoryStore::new());
        let mut pref = ThemePreference::load(kv.clone(), "theme", ThemeName::Dark);
        assert_eq!(pref.current(), ThemeName::Dark);

        assert_eq!(pref.toggle(), ThemeName::Light);
        assert_eq!(kv.get("theme").unwrap().as_deref(), Some("light"));

        let reloaded = ThemePreference::load(kv, "theme", ThemeName::Dark);
        assert_eq!(reloaded.current(), ThemeName::Light);
    }

    #[test]
    fn unknown_saved_value_uses_fallback() {
        let kv = Arc::new(MemoryStore::new());
        kv.set("theme", "sepia").unwrap();
        let pref = ThemePreference::load(kv, "theme", ThemeName::Light);
        assert_eq!(pref.current(), ThemeName::Light);
    }
}
