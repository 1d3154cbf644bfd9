/// Timing configuration for the board editor state layer.
/// Read from `<config_dir>/lexera/board-editor.json` when present.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Coalescing window for redraws after a board replacement.
    pub render_debounce_ms: u64,
    /// Window during which a second drop event is ignored.
    pub drop_guard_ms: u64,
    /// Delay before a menu closes once the pointer has left it.
    pub menu_close_delay_ms: u64,
    /// Delay between dispatching a menu action and closing the menu.
    pub menu_action_close_delay_ms: u64,
    /// Window in which identical creation requests are suppressed.
    pub duplicate_window_ms: u64,
    pub save_retry_delay_ms: u64,
    /// Failed saves older than this are not retried automatically.
    pub save_retry_max_age_secs: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            render_debounce_ms: 50,
            drop_guard_ms: 1000,
            menu_close_delay_ms: 300,
            menu_action_close_delay_ms: 10,
            duplicate_window_ms: 2000,
            save_retry_delay_ms: 1500,
            save_retry_max_age_secs: 300,
        }
    }
}

impl EditorConfig {
    pub fn render_debounce(&self) -> Duration {
        Duration::from_millis(self.render_debounce_ms)
    }

    pub fn drop_guard(&self) -> Duration {
        Duration::from_millis(self.drop_guard_ms)
    }

    pub fn menu_close_delay(&self) -> Duration {
        Duration::from_millis(self.menu_close_delay_ms)
    }

    pub fn menu_action_close_delay(&self) -> Duration {
        Duration::from_millis(self.menu_action_close_delay_ms)
    }

    pub fn duplicate_window(&self) -> Duration {
        Duration::from_millis(self.duplicate_window_ms)
    }

    pub fn save_retry_delay(&self) -> Duration {
        Duration::from_millis(self.save_retry_delay_ms)
    }

    pub fn save_retry_max_age(&self) -> Duration {
        Duration::from_secs(self.save_retry_max_age_secs)
    }
}

/// Default config path: ~/.config/lexera/board-editor.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexera")
        .join("board-editor.json")
}

/// Read and parse a config file, surfacing IO and parse errors.
pub fn read_config(path: &Path) -> Result<EditorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load config from path. Returns defaults if the file doesn't exist or
/// cannot be parsed.
pub fn load_config(path: &Path) -> EditorConfig {
    match read_config(path) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            EditorConfig::default()
        }
        Err(e) => {
            log::warn!(
                "[lexera.config] Failed to load config {}: {}",
                path.display(),
                e
            );
            EditorConfig::default()
        }
    }
}
