use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::history::HistoryStore;
use crate::providers::{ProviderConfig, ProviderId};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_provider")]
    pub active_provider: ProviderId,
    #[serde(default = "default_model")]
    pub model: String,
    /// `None` means auto-detect.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_max_history_entries")]
    pub max_history_entries: usize,
    /// Overrides the default `~/.voxdrop/history.json`.
    #[serde(default)]
    pub history_path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub auto_copy: bool,
    #[serde(default)]
    pub provider_configs: HashMap<ProviderId, ProviderConfig>,
}

fn default_provider() -> ProviderId {
    ProviderId::WhisperCli
}

fn default_model() -> String {
    "base".into()
}

fn default_max_history_entries() -> usize {
    HistoryStore::DEFAULT_MAX_ENTRIES
}

fn default_true() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            active_provider: default_provider(),
            model: default_model(),
            language: None,
            max_history_entries: default_max_history_entries(),
            history_path: None,
            auto_copy: true,
            provider_configs: HashMap::new(),
        }
    }
}

impl AppSettings {
    /// `<home>/.voxdrop/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".voxdrop").join(SETTINGS_FILE))
    }

    /// Read settings from `path`, falling back to defaults when the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid settings in {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    pub fn get_provider_config(&self, id: &ProviderId) -> ProviderConfig {
        self.provider_configs
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Where the transcription history lives: the configured override, else the per-user default.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_path
            .clone()
            .or_else(HistoryStore::default_storage_path)
    }
}
