use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use crate::history::HistoryStore;
use crate::providers::ProviderManager;
use crate::settings::AppSettings;

pub struct AppState {
    pub provider_manager: Arc<Mutex<ProviderManager>>,
    pub settings: Arc<Mutex<AppSettings>>,
    pub history: Arc<Mutex<HistoryStore>>,
    pub is_transcribing: Arc<Mutex<bool>>,
}

impl AppState {
    /// Build the state from settings, opening the history file they point at.
    pub fn new(settings: AppSettings) -> Result<Self> {
        let history_path = settings
            .history_path()
            .ok_or_else(|| anyhow!("Could not determine a home directory for the history file"))?;
        let history = HistoryStore::new(settings.max_history_entries, history_path);
        let provider_manager = ProviderManager::new(&settings);
        Ok(Self::from_parts(settings, provider_manager, history))
    }

    pub fn from_parts(
        settings: AppSettings,
        provider_manager: ProviderManager,
        history: HistoryStore,
    ) -> Self {
        Self {
            provider_manager: Arc::new(Mutex::new(provider_manager)),
            settings: Arc::new(Mutex::new(settings)),
            history: Arc::new(Mutex::new(history)),
            is_transcribing: Arc::new(Mutex::new(false)),
        }
    }
}

/// Lock a shared value, turning a poisoned lock into an error.
pub fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|e| anyhow!(e.to_string()))
}
