//! Configuration management for docnav

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name used for the config directory and storage key prefixes
pub const APP_NAME: &str = "docnav";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix for persisted keys (`<app>_theme`, `<app>.search.recent`)
    pub app_name: String,
    /// Theme used when nothing is persisted; `None` follows the platform
    pub theme: Option<ThemeVariant>,
    pub toc: TocConfig,
    pub search: SearchConfig,
    pub tracker: TrackerConfig,
    pub motion: MotionConfig,
    #[cfg(feature = "watch")]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeVariant::Dark => "dark",
            ThemeVariant::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(ThemeVariant::Dark),
            "light" => Some(ThemeVariant::Light),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeVariant::Dark => ThemeVariant::Light,
            ThemeVariant::Light => ThemeVariant::Dark,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    pub enabled: bool,
    pub side: TocSide,
    pub width: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TocSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub suggest_hide_delay_ms: u64,
    pub max_recent: usize,
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn suggest_hide_delay(&self) -> Duration {
        Duration::from_millis(self.suggest_hide_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Distance below the header at which a heading counts as scrolled past
    pub activation_offset: f64,
    /// Slack allowed when comparing a heading top against the activation line
    pub tolerance: f64,
    /// Margin kept around the active entry inside the navigation panel
    pub nav_padding: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub reduced_motion: bool,
}

#[cfg(feature = "watch")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enabled: bool,
    pub auto_reload: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            theme: None,
            toc: TocConfig::default(),
            search: SearchConfig::default(),
            tracker: TrackerConfig::default(),
            motion: MotionConfig::default(),
            #[cfg(feature = "watch")]
            watch: WatchConfig::default(),
        }
    }
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            side: TocSide::Left,
            width: 32,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 120,
            suggest_hide_delay_ms: 120,
            max_recent: 5,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            activation_offset: 16.0,
            tolerance: 2.0,
            nav_padding: 12.0,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            reduced_motion: false,
        }
    }
}

#[cfg(feature = "watch")]
impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_reload: true,
        }
    }
}

impl Config {
    /// Get the platform-specific config file path
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", APP_NAME)
            .map(|proj_dirs| proj_dirs.config_dir().join(format!("{}.toml", APP_NAME)))
    }

    /// Load configuration from the platform path, falling back to defaults if missing
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        // Check config file permissions (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat config file: {}", path.display()))?;
            if metadata.permissions().mode() & 0o002 != 0 {
                anyhow::bail!(
                    "Config file {} is world-writable (insecure permissions)",
                    path.display()
                );
            }
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.app_name, "docnav");
        assert_eq!(config.theme, None);
        assert!(config.toc.enabled);
        assert_eq!(config.toc.side, TocSide::Left);
        assert_eq!(config.toc.width, 32);
        assert_eq!(config.search.debounce(), Duration::from_millis(120));
        assert_eq!(config.search.max_recent, 5);
        assert_eq!(config.tracker.activation_offset, 16.0);
        assert_eq!(config.tracker.tolerance, 2.0);
        assert_eq!(config.tracker.nav_padding, 12.0);
        assert!(!config.motion.reduced_motion);
    }

    #[test]
    fn test_load_valid_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        let toml_content = "app_name = \"manual\"\n\
theme = \"light\"\n\
\n\
[toc]\n\
enabled = false\n\
side = \"Right\"\n\
width = 40\n\
\n\
[search]\n\
debounce_ms = 200\n\
\n\
[motion]\n\
reduced_motion = true\n";
        file.write_all(toml_content.as_bytes())?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.app_name, "manual");
        assert_eq!(config.theme, Some(ThemeVariant::Light));
        assert!(!config.toc.enabled);
        assert_eq!(config.toc.side, TocSide::Right);
        assert_eq!(config.toc.width, 40);
        assert_eq!(config.search.debounce_ms, 200);
        assert_eq!(config.search.suggest_hide_delay_ms, 120);
        assert!(config.motion.reduced_motion);

        Ok(())
    }

    #[test]
    fn test_load_partial_toml() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"[tracker]\nactivation_offset = 24.0\n")?;

        let config = Config::load_from(file.path())?;
        assert_eq!(config.tracker.activation_offset, 24.0);
        assert_eq!(config.tracker.tolerance, 2.0);
        assert_eq!(config.app_name, "docnav");

        Ok(())
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"invalid toml [[[syntax").unwrap();

        let result = Config::load_from(file.path());
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_world_writable_config_rejected() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let file = NamedTempFile::new()?;
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o666))?;

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("world-writable"));

        Ok(())
    }

    #[test]
    fn test_config_path_returns_some() {
        let path = Config::config_path();
        assert!(path.is_some());
        if let Some(p) = path {
            assert!(p.to_string_lossy().contains("docnav"));
            assert!(p.to_string_lossy().ends_with("docnav.toml"));
        }
    }

    #[test]
    fn test_theme_variant_round_trip() -> Result<()> {
        let config = Config {
            theme: Some(ThemeVariant::Dark),
            ..Default::default()
        };

        let toml_str = toml::to_string(&config)?;
        assert!(toml_str.contains("theme = \"dark\""));

        let parsed: Config = toml::from_str(&toml_str)?;
        assert_eq!(parsed.theme, Some(ThemeVariant::Dark));
        assert_eq!(ThemeVariant::parse("light"), Some(ThemeVariant::Light));
        assert_eq!(ThemeVariant::parse("sepia"), None);
        assert_eq!(ThemeVariant::Light.toggled(), ThemeVariant::Dark);

        Ok(())
    }
}
