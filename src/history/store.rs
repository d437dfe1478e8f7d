use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tempfile::NamedTempFile;

use super::TranscriptionRecord;

const APP_DIR: &str = ".voxdrop";
const HISTORY_FILE: &str = "history.json";

/// Bounded, most-recent-first transcription history mirrored to a JSON file.
///
/// Every mutation rewrites the whole file. The disk is only read once, in
/// [`HistoryStore::new`]; a file that cannot be read back as a list of records
/// is moved aside and the history starts empty.
#[derive(Debug)]
pub struct HistoryStore {
    entries: Vec<TranscriptionRecord>,
    max_entries: usize,
    storage_path: PathBuf,
}

impl HistoryStore {
    pub const DEFAULT_MAX_ENTRIES: usize = 10;

    pub fn new(max_entries: usize, storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();
        if max_entries == 0 {
            log::warn!("History size of 0 requested, keeping 1 entry instead");
        }

        if let Err(e) = fs::create_dir_all(storage_dir(&storage_path)) {
            log::error!(
                "Failed to create history directory for {:?}: {}",
                storage_path,
                e
            );
        }

        let max_entries = max_entries.max(1);
        let mut entries = load_entries(&storage_path);
        if entries.len() > max_entries {
            log::info!(
                "Dropping {} history entries beyond the limit of {}",
                entries.len() - max_entries,
                max_entries
            );
            entries.truncate(max_entries);
        }

        Self {
            entries,
            max_entries,
            storage_path,
        }
    }

    /// `<home>/.voxdrop/history.json`, or `None` when there is no home directory.
    pub fn default_storage_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(APP_DIR).join(HISTORY_FILE))
    }

    /// Record a new transcription at the front of the history.
    ///
    /// The in-memory history keeps the record even if writing the file fails;
    /// the next successful write brings the file up to date.
    pub fn save(
        &mut self,
        text: impl Into<String>,
        file_names: Vec<String>,
        model: impl Into<String>,
    ) -> Result<TranscriptionRecord> {
        let record = TranscriptionRecord::create(text, file_names, model);
        self.entries.insert(0, record.clone());
        self.entries.truncate(self.max_entries);
        self.persist()?;
        Ok(record)
    }

    pub fn get_all(&self) -> Vec<TranscriptionRecord> {
        self.entries.clone()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&TranscriptionRecord> {
        self.entries.iter().find(|r| r.id() == id)
    }

    /// Remove the record with `id`. Returns `Ok(false)` if there is no such record.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        match self.entries.iter().position(|r| r.id() == id) {
            Some(index) => {
                self.entries.remove(index);
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Write the full history next to the target and rename it into place.
    fn persist(&self) -> Result<()> {
        log::debug!(
            "Persisting {} history entries to {:?}",
            self.entries.len(),
            self.storage_path
        );

        let json = serde_json::to_string_pretty(&self.entries)?;

        let mut file = NamedTempFile::new_in(storage_dir(&self.storage_path))
            .with_context(|| format!("Failed to create temp file for {:?}", self.storage_path))?;
        file.write_all(json.as_bytes())
            .context("Failed to write history")?;
        file.as_file()
            .sync_all()
            .context("Failed to sync history")?;
        file.persist(&self.storage_path)
            .with_context(|| format!("Failed to replace {:?}", self.storage_path))?;

        Ok(())
    }
}

fn storage_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn load_entries(path: &Path) -> Vec<TranscriptionRecord> {
    if !path.exists() {
        log::debug!("No history file at {:?}, starting empty", path);
        return Vec::new();
    }

    match read_entries(path) {
        Ok(entries) => {
            log::info!("Loaded {} history entries from {:?}", entries.len(), path);
            entries
        }
        Err(e) => {
            let backup = corrupt_backup_path(path);
            log::warn!(
                "History file {:?} is unreadable ({}), moving it to {:?} and starting empty",
                path,
                e,
                backup
            );
            if let Err(e) = fs::rename(path, &backup) {
                log::error!("Failed to move corrupt history aside: {}", e);
            }
            Vec::new()
        }
    }
}

fn read_entries(path: &Path) -> Result<Vec<TranscriptionRecord>> {
    let content = fs::read_to_string(path)?;
    let entries: Vec<TranscriptionRecord> = serde_json::from_str(&content)?;

    if let Some(bad) = entries.iter().find(|r| !r.is_consistent()) {
        anyhow::bail!("record {} is inconsistent", bad.id());
    }
    Ok(entries)
}

/// `<file>.corrupt-<local time>`, with a counter appended if that name is taken.
fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut base = path.as_os_str().to_os_string();
    base.push(format!(".corrupt-{}", Local::now().format("%Y%m%d%H%M%S%3f")));

    let mut candidate = PathBuf::from(&base);
    let mut n = 1;
    while candidate.exists() {
        let mut name = base.clone();
        name.push(format!("-{}", n));
        candidate = PathBuf::from(name);
        n += 1;
    }
    candidate
}
