//! Observable light/dark theme cell.
//!
//! [`ThemeStore`] always starts as [`Theme::Dark`] so that the first render is
//! identical regardless of environment.  Once the real preference is known
//! the owner calls [`ThemeStore::reconcile`].  Subscribers observe changes
//! through a [`tokio::sync::watch`] channel and only ever see the latest
//! value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::ActionError;

/// Display theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    /// The opposite theme.
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(ActionError::Config {
                reason: format!("unknown theme `{other}` (expected `light` or `dark`)"),
            }),
        }
    }
}

/// Single-owner theme cell with change notification.
///
/// Only the owner can write; any number of [`watch::Receiver`]s may observe.
#[derive(Debug)]
pub struct ThemeStore {
    sender: watch::Sender<Theme>,
}

impl ThemeStore {
    /// Create a store holding [`Theme::Dark`].
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Theme::default());
        Self { sender }
    }

    /// The current theme.
    pub fn get(&self) -> Theme {
        *self.sender.borrow()
    }

    /// Replace the theme.  Subscribers are notified only on an actual change.
    ///
    /// Returns `true` if the value changed.
    pub fn set(&self, theme: Theme) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if *current == theme {
                return false;
            }
            *current = theme;
            true
        });
        if changed {
            tracing::debug!(theme = %theme, "theme changed");
        }
        changed
    }

    /// Flip between light and dark, returning the new theme.
    pub fn toggle(&self) -> Theme {
        let next = self.get().toggled();
        self.set(next);
        next
    }

    /// Apply the user's actual preference once the environment is known.
    ///
    /// `None` (no stored preference) keeps the current value.
    pub fn reconcile(&self, preference: Option<Theme>) -> Theme {
        if let Some(theme) = preference {
            self.set(theme);
        }
        self.get()
    }

    /// Observe future changes.
    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.sender.subscribe()
    }
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_dark() {
        assert_eq!(ThemeStore::new().get(), Theme::Dark);
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("Light".parse::<Theme>().unwrap(), Theme::Light);
        assert_eq!(Theme::Dark.to_string(), "dark");
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn reconcile_without_preference_keeps_value() {
        let store = ThemeStore::new();
        assert_eq!(store.reconcile(None), Theme::Dark);
        assert_eq!(store.reconcile(Some(Theme::Light)), Theme::Light);
    }

    #[test]
    fn toggle_flips() {
        let store = ThemeStore::new();
        assert_eq!(store.toggle(), Theme::Light);
        assert_eq!(store.toggle(), Theme::Dark);
    }

    #[tokio::test]
    async fn subscribers_notified_on_change_only() {
        let store = ThemeStore::new();
        let mut rx = store.subscribe();

        assert!(!store.set(Theme::Dark));
        assert!(!rx.has_changed().unwrap());

        assert!(store.set(Theme::Light));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Theme::Light);
    }
}
