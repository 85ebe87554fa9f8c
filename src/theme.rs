//! Theme preference.
//!
//! The only state this application persists: whether the reader prefers the
//! dark or the light theme. Stored under one key in the preference database;
//! a missing or unrecognized value means dark.

use anyhow::Result;

use crate::storage::Database;

/// Preference key holding the theme variant name
pub const THEME_KEY: &str = "theme.variant";

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    /// Cycle to the next variant: Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    /// Stored and displayed name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

// ============================================================================
// ThemePreference
// ============================================================================

/// The persisted theme choice, read once and written through on change.
pub struct ThemePreference {
    variant: ThemeVariant,
}

impl ThemePreference {
    /// Read the stored variant, defaulting to dark.
    pub async fn load(db: &Database) -> Result<Self> {
        let stored = db.get_preference(THEME_KEY).await?;
        let variant = match stored.as_deref().map(ThemeVariant::from_str_name) {
            Some(Some(variant)) => variant,
            Some(None) => {
                tracing::warn!(value = ?stored, "Unrecognized stored theme, using dark");
                ThemeVariant::default()
            }
            None => ThemeVariant::default(),
        };
        Ok(Self { variant })
    }

    pub fn variant(&self) -> ThemeVariant {
        self.variant
    }

    /// Persist `variant` and make it current.
    pub async fn set(&mut self, db: &Database, variant: ThemeVariant) -> Result<()> {
        db.set_preference(THEME_KEY, variant.name()).await?;
        self.variant = variant;
        tracing::debug!(theme = variant.name(), "Theme preference saved");
        Ok(())
    }

    /// Switch to the other variant and persist it.
    pub async fn toggle(&mut self, db: &Database) -> Result<ThemeVariant> {
        let next = self.variant.next();
        self.set(db, next).await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[test]
    fn variant_from_str_name() {
        assert_eq!(ThemeVariant::from_str_name("dark"), Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::from_str_name("LIGHT"), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::from_str_name(" Light "), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::from_str_name("solarized"), None);
    }

    #[test]
    fn variant_next_cycles() {
        assert_eq!(ThemeVariant::Dark.next(), ThemeVariant::Light);
        assert_eq!(ThemeVariant::Light.next(), ThemeVariant::Dark);
    }

    #[tokio::test]
    async fn load_defaults_to_dark() {
        let db = test_db().await;
        let pref = ThemePreference::load(&db).await.unwrap();
        assert_eq!(pref.variant(), ThemeVariant::Dark);
    }

    #[tokio::test]
    async fn load_ignores_garbage() {
        let db = test_db().await;
        db.set_preference(THEME_KEY, "neon").await.unwrap();
        let pref = ThemePreference::load(&db).await.unwrap();
        assert_eq!(pref.variant(), ThemeVariant::Dark);
    }

    #[tokio::test]
    async fn toggle_persists() {
        let db = test_db().await;
        let mut pref = ThemePreference::load(&db).await.unwrap();

        assert_eq!(pref.toggle(&db).await.unwrap(), ThemeVariant::Light);
        assert_eq!(
            db.get_preference(THEME_KEY).await.unwrap().as_deref(),
            Some("light")
        );

        let reloaded = ThemePreference::load(&db).await.unwrap();
        assert_eq!(reloaded.variant(), ThemeVariant::Light);

        assert_eq!(pref.toggle(&db).await.unwrap(), ThemeVariant::Dark);
    }
}
