use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart;
use std::path::Path;

use super::{ProviderConfig, ProviderId, SttProvider};
use crate::audio::file_name;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";
const API_MODEL: &str = "whisper-1";

/// Uploads each file to the OpenAI transcription API.
///
/// The hosted service has a single Whisper model, so the local model name is
/// only recorded in history and not sent.
pub struct OpenAiWhisperProvider {
    api_key: Option<String>,
    endpoint: String,
}

#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

impl OpenAiWhisperProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        }
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("wav") => "audio/wav",
        Some("opus") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl SttProvider for OpenAiWhisperProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAiWhisper
    }

    fn name(&self) -> &str {
        "OpenAI Whisper"
    }

    fn is_available(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn transcribe_file(
        &self,
        path: &Path,
        _model: &str,
        language: Option<&str>,
    ) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("OpenAI API key not configured"))?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read audio file {:?}", path))?;

        let file_part = multipart::Part::bytes(bytes)
            .file_name(file_name(path))
            .mime_str(mime_for(path))?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("model", API_MODEL);

        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let client = reqwest::Client::new();
        let response = client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error ({}): {}", status, body));
        }

        let result: WhisperResponse = response.json().await?;
        log::debug!("OpenAI transcribed {:?} ({} chars)", path, result.text.len());
        Ok(result.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_only_with_api_key() {
        let provider = OpenAiWhisperProvider::new(&ProviderConfig::default());
        assert!(!provider.is_available());

        let provider = OpenAiWhisperProvider::new(&ProviderConfig {
            api_key: Some("sk-test".into()),
            ..Default::default()
        });
        assert!(provider.is_available());
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_for(Path::new("a.MP3")), "audio/mpeg");
        assert_eq!(mime_for(Path::new("a.opus")), "audio/ogg");
        assert_eq!(mime_for(Path::new("a.bin")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_reading() {
        let provider = OpenAiWhisperProvider::new(&ProviderConfig::default());
        let err = provider
            .transcribe_file(Path::new("/does/not/exist.opus"), "base", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("API key"));
    }
}
