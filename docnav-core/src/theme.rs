//! Light/dark theme preference

use crate::config::ThemeVariant;
use crate::dom::Dom;
use crate::store::KeyValueStore;

pub const THEME_ATTR: &str = "data-theme";

/// Resolves and persists the page theme under `"<app>_theme"`
#[derive(Debug, Clone)]
pub struct ThemePreference {
    key: String,
    configured: Option<ThemeVariant>,
}

impl ThemePreference {
    pub fn new(app_name: &str, configured: Option<ThemeVariant>) -> Self {
        Self {
            key: format!("{}_theme", app_name),
            configured,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The persisted choice, if any
    pub fn stored(&self, store: &dyn KeyValueStore) -> Option<ThemeVariant> {
        match store.get(&self.key) {
            Ok(value) => value.as_deref().and_then(ThemeVariant::parse),
            Err(e) => {
                log::warn!("failed to read theme preference: {:#}", e);
                None
            }
        }
    }

    /// Stored choice, then the configured theme, then the platform signal
    pub fn resolve(&self, store: &dyn KeyValueStore, system_prefers_dark: bool) -> ThemeVariant {
        self.stored(store)
            .or(self.configured)
            .unwrap_or(if system_prefers_dark {
                ThemeVariant::Dark
            } else {
                ThemeVariant::Light
            })
    }

    /// Flip the theme applied to `dom`, persist it and apply it
    pub fn toggle(&self, dom: &mut Dom, store: &mut dyn KeyValueStore) -> ThemeVariant {
        let next = current_theme(dom).toggled();
        if let Err(e) = store.set(&self.key, next.as_str()) {
            log::warn!("failed to save theme preference: {:#}", e);
        }
        apply_theme(dom, next);
        next
    }
}

/// Mirror the theme on the document root
pub fn apply_theme(dom: &mut Dom, theme: ThemeVariant) {
    let root = dom.root();
    dom.set_attr(root, THEME_ATTR, theme.as_str());
}

/// Theme currently applied; an unset root reads as light
pub fn current_theme(dom: &Dom) -> ThemeVariant {
    dom.attr(dom.root(), THEME_ATTR)
        .and_then(ThemeVariant::parse)
        .unwrap_or(ThemeVariant::Light)
}

/// Best-effort platform dark-mode signal from the environment
///
/// Honors `COLORFGBG` (background color index); anything unknown reads as dark,
/// which suits most terminals.
pub fn system_prefers_dark() -> bool {
    match std::env::var("COLORFGBG") {
        Ok(value) => value
            .rsplit(';')
            .next()
            .and_then(|bg| bg.parse::<u8>().ok())
            .map(|bg| !matches!(bg, 7 | 15))
            .unwrap_or(true),
        Err(_) => true,
    }
}
