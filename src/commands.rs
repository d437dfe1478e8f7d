use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};

use crate::audio::file_name;
use crate::history::TranscriptionRecord;
use crate::providers::{transcribe_files, ProviderInfo};
use crate::settings::AppSettings;
use crate::state::{lock, AppState};

/// Clears the transcribing flag when dropped, whatever way the transcription ended.
struct TranscribingGuard(Arc<Mutex<bool>>);

impl Drop for TranscribingGuard {
    fn drop(&mut self) {
        if let Ok(mut flag) = self.0.lock() {
            *flag = false;
        }
    }
}

fn begin_transcribing(state: &AppState) -> Result<TranscribingGuard> {
    let mut flag = lock(&state.is_transcribing)?;
    if *flag {
        bail!("Already transcribing. Please wait...");
    }
    *flag = true;
    Ok(TranscribingGuard(Arc::clone(&state.is_transcribing)))
}

/// Transcribe `paths` with the active provider, copy the text and record it in history.
pub async fn transcribe_and_record<F>(
    state: &AppState,
    paths: Vec<PathBuf>,
    on_progress: F,
) -> Result<TranscriptionRecord>
where
    F: FnMut(usize, usize, &str) + Send,
{
    let _guard = begin_transcribing(state)?;

    // Drop locks before await
    let (provider, model, language, auto_copy) = {
        let pm = lock(&state.provider_manager)?;
        let settings = lock(&state.settings)?;
        let provider = pm
            .get_active()
            .ok_or_else(|| anyhow!("No transcription provider available"))?;
        (
            provider,
            settings.model.clone(),
            settings.language.clone(),
            settings.auto_copy,
        )
    };

    log::info!(
        "Transcribing {} file(s) with {} ({})",
        paths.len(),
        provider.name(),
        model
    );
    let text = transcribe_files(
        provider.as_ref(),
        &paths,
        &model,
        language.as_deref(),
        on_progress,
    )
    .await?;

    if auto_copy {
        if let Err(e) = crate::clipboard::copy_text(&text) {
            log::error!("Failed to copy transcription to clipboard: {}", e);
        }
    }

    let file_names = paths.iter().map(|p| file_name(p)).collect();
    let record = lock(&state.history)?.save(text, file_names, model)?;
    Ok(record)
}

pub fn is_transcribing(state: &AppState) -> Result<bool> {
    Ok(*lock(&state.is_transcribing)?)
}

pub fn get_history(state: &AppState) -> Result<Vec<TranscriptionRecord>> {
    Ok(lock(&state.history)?.get_all())
}

/// `(id, label)` for every history entry, newest first.
pub fn history_labels(state: &AppState) -> Result<Vec<(String, String)>> {
    Ok(lock(&state.history)?
        .get_all()
        .iter()
        .map(|r| (r.id().to_string(), r.menu_label()))
        .collect())
}

/// Copy a past transcription to the clipboard. Returns `false` if the id is unknown.
pub fn copy_history_entry(state: &AppState, id: &str) -> Result<bool> {
    let text = match lock(&state.history)?.get_by_id(id) {
        Some(record) => record.text().to_string(),
        None => return Ok(false),
    };
    crate::clipboard::copy_text(&text)?;
    Ok(true)
}

pub fn delete_history_entry(state: &AppState, id: &str) -> Result<bool> {
    lock(&state.history)?.delete(id)
}

pub fn clear_history(state: &AppState) -> Result<()> {
    lock(&state.history)?.clear()
}

pub fn get_settings(state: &AppState) -> Result<AppSettings> {
    Ok(lock(&state.settings)?.clone())
}

/// Persist new settings and apply them. History size and location apply on next start.
pub fn save_settings(state: &AppState, settings: AppSettings, path: &Path) -> Result<()> {
    settings.save(path)?;
    lock(&state.provider_manager)?.set_active(settings.active_provider.clone());
    *lock(&state.settings)? = settings;
    Ok(())
}

pub fn get_providers(state: &AppState) -> Result<Vec<ProviderInfo>> {
    Ok(lock(&state.provider_manager)?.list_providers())
}
