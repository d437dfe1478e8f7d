pub mod openai_whisper;
pub mod whisper_cli;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::audio::{file_name, filter_supported};
use crate::settings::AppSettings;

/// Whisper model sizes offered for local transcription, smallest first.
pub const MODELS: &[&str] = &["tiny", "base", "small", "medium", "large"];

/// Language choices as `(code, display name)`. `None` lets the engine detect it.
pub const LANGUAGES: &[(Option<&str>, &str)] = &[
    (None, "Auto-detect"),
    (Some("pt"), "Portuguese (PT-BR)"),
    (Some("en"), "English (EN-US)"),
    (Some("es"), "Spanish"),
    (Some("fr"), "French"),
    (Some("de"), "German"),
    (Some("zh"), "Chinese"),
    (Some("ja"), "Japanese"),
    (Some("ko"), "Korean"),
    (Some("ar"), "Arabic"),
    (Some("it"), "Italian"),
    (Some("nl"), "Dutch"),
    (Some("ru"), "Russian"),
    (Some("hi"), "Hindi"),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProviderId {
    WhisperCli,
    OpenAiWhisper,
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderId::WhisperCli => write!(f, "Local Whisper"),
            ProviderId::OpenAiWhisper => write!(f, "OpenAI Whisper"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// whisper.cpp executable; looked up on `PATH` when unset.
    #[serde(default)]
    pub binary_path: Option<String>,
    /// Directory holding `ggml-<model>.bin` files.
    #[serde(default)]
    pub models_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: ProviderId,
    pub name: String,
    pub available: bool,
}

#[async_trait]
pub trait SttProvider: Send + Sync {
    fn id(&self) -> ProviderId;
    fn name(&self) -> &str;
    fn is_available(&self) -> bool;
    /// Transcribe a single audio file. `language` of `None` means auto-detect.
    async fn transcribe_file(
        &self,
        path: &Path,
        model: &str,
        language: Option<&str>,
    ) -> Result<String>;
}

/// Transcribe a batch of files with `provider` and combine the results.
///
/// Unsupported files are skipped. `on_progress(current, total, file_name)` is
/// called before each file, with `current` counting from 1. Results of several
/// files are separated by a blank line.
pub async fn transcribe_files<F>(
    provider: &dyn SttProvider,
    paths: &[PathBuf],
    model: &str,
    language: Option<&str>,
    mut on_progress: F,
) -> Result<String>
where
    F: FnMut(usize, usize, &str),
{
    if paths.is_empty() {
        return Ok(String::new());
    }

    let files = filter_supported(paths);
    if files.is_empty() {
        bail!("No supported audio files provided");
    }

    let total = files.len();
    let mut transcriptions = Vec::with_capacity(total);
    for (i, path) in files.iter().enumerate() {
        on_progress(i + 1, total, &file_name(path));
        let text = provider.transcribe_file(path, model, language).await?;
        transcriptions.push(text.trim().to_string());
    }

    Ok(transcriptions.join("\n\n"))
}

pub struct ProviderManager {
    providers: Vec<Arc<dyn SttProvider>>,
    active_provider: ProviderId,
}

impl ProviderManager {
    pub fn new(settings: &AppSettings) -> Self {
        let providers: Vec<Arc<dyn SttProvider>> = vec![
            Arc::new(whisper_cli::WhisperCliProvider::new(
                &settings.get_provider_config(&ProviderId::WhisperCli),
            )),
            Arc::new(openai_whisper::OpenAiWhisperProvider::new(
                &settings.get_provider_config(&ProviderId::OpenAiWhisper),
            )),
        ];

        Self::with_providers(providers, settings.active_provider.clone())
    }

    pub fn with_providers(providers: Vec<Arc<dyn SttProvider>>, active_provider: ProviderId) -> Self {
        Self {
            providers,
            active_provider,
        }
    }

    pub fn set_active(&mut self, id: ProviderId) {
        self.active_provider = id;
    }

    /// Returns an Arc clone of the active provider (safe to use across await points).
    /// Falls back to the first registered provider; `None` only when there are none.
    pub fn get_active(&self) -> Option<Arc<dyn SttProvider>> {
        self.providers
            .iter()
            .find(|p| p.id() == self.active_provider)
            .or_else(|| self.providers.first())
            .cloned()
    }

    pub fn list_providers(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|p| ProviderInfo {
                id: p.id(),
                name: p.name().to_string(),
                available: p.is_available(),
            })
            .collect()
    }

    pub fn active_id(&self) -> &ProviderId {
        &self.active_provider
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    /// Returns `"<model>:<file name>"` for every file, or fails on files named `fail.*`.
    pub(crate) struct EchoProvider {
        pub calls: Mutex<Vec<(PathBuf, String, Option<String>)>>,
    }

    impl EchoProvider {
        pub(crate) fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SttProvider for EchoProvider {
        fn id(&self) -> ProviderId {
            ProviderId::WhisperCli
        }

        fn name(&self) -> &str {
            "Echo"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn transcribe_file(
            &self,
            path: &Path,
            model: &str,
            language: Option<&str>,
        ) -> Result<String> {
            self.calls.lock().unwrap().push((
                path.to_path_buf(),
                model.to_string(),
                language.map(str::to_string),
            ));
            let name = file_name(path);
            if name.starts_with("fail.") {
                return Err(anyhow!("engine failed on {}", name));
            }
            Ok(format!("  {}:{}\n", model, name))
        }
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[tokio::test]
    async fn test_single_file_returns_trimmed_text() {
        let provider = EchoProvider::new();
        let text = transcribe_files(&provider, &paths(&["a.opus"]), "base", None, |_, _, _| {})
            .await
            .unwrap();
        assert_eq!(text, "base:a.opus");
    }

    #[tokio::test]
    async fn test_multiple_files_joined_with_blank_line() {
        let provider = EchoProvider::new();
        let text = transcribe_files(
            &provider,
            &paths(&["a.opus", "b.mp3"]),
            "small",
            Some("pt"),
            |_, _, _| {},
        )
        .await
        .unwrap();
        assert_eq!(text, "small:a.opus\n\nsmall:b.mp3");

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].2.as_deref(), Some("pt"));
    }

    #[tokio::test]
    async fn test_progress_skips_unsupported_files() {
        let provider = EchoProvider::new();
        let mut progress = Vec::new();
        transcribe_files(
            &provider,
            &paths(&["/x/a.opus", "/x/notes.txt", "/x/b.WAV"]),
            "base",
            None,
            |current, total, name| progress.push((current, total, name.to_string())),
        )
        .await
        .unwrap();

        assert_eq!(
            progress,
            vec![(1, 2, "a.opus".to_string()), (2, 2, "b.WAV".to_string())]
        );
    }

    #[tokio::test]
    async fn test_no_supported_files_is_an_error() {
        let provider = EchoProvider::new();
        let err = transcribe_files(&provider, &paths(&["a.txt", "b.flac"]), "base", None, |_, _, _| {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No supported audio files"));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty_text() {
        let provider = EchoProvider::new();
        let text = transcribe_files(&provider, &[], "base", None, |_, _, _| {})
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_engine_failure_propagates() {
        let provider = EchoProvider::new();
        let result = transcribe_files(
            &provider,
            &paths(&["a.opus", "fail.mp3", "c.wav"]),
            "base",
            None,
            |_, _, _| {},
        )
        .await;
        assert!(result.is_err());
        assert_eq!(provider.calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_manager_falls_back_to_first_provider() {
        let echo: Arc<dyn SttProvider> = Arc::new(EchoProvider::new());
        let manager = ProviderManager::with_providers(vec![echo], ProviderId::OpenAiWhisper);
        let active = manager.get_active().unwrap();
        assert_eq!(active.name(), "Echo");
        assert_eq!(manager.active_id(), &ProviderId::OpenAiWhisper);
    }

    #[test]
    fn test_manager_without_providers() {
        let manager = ProviderManager::with_providers(Vec::new(), ProviderId::WhisperCli);
        assert!(manager.get_active().is_none());
        assert!(manager.list_providers().is_empty());
    }

    #[test]
    fn test_default_manager_lists_both_providers() {
        let mut manager = ProviderManager::new(&AppSettings::default());
        let ids: Vec<ProviderId> = manager.list_providers().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![ProviderId::WhisperCli, ProviderId::OpenAiWhisper]);

        manager.set_active(ProviderId::OpenAiWhisper);
        assert_eq!(manager.get_active().unwrap().id(), ProviderId::OpenAiWhisper);
    }

    #[test]
    fn test_models_and_languages() {
        assert!(MODELS.contains(&"base"));
        assert_eq!(LANGUAGES[0], (None, "Auto-detect"));
    }
}
