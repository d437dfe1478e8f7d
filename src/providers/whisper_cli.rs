//! whisper.cpp command line backend.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::{ProviderConfig, ProviderId, SttProvider};

const DEFAULT_BINARY: &str = "whisper-cli";

pub struct WhisperCliProvider {
    binary: String,
    models_dir: Option<PathBuf>,
}

impl WhisperCliProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        let models_dir = config
            .models_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(default_models_dir);
        Self {
            binary: config
                .binary_path
                .clone()
                .unwrap_or_else(|| DEFAULT_BINARY.to_string()),
            models_dir,
        }
    }

    /// `<models_dir>/ggml-<model>.bin`
    pub fn model_path(&self, model: &str) -> Option<PathBuf> {
        self.models_dir
            .as_ref()
            .map(|dir| dir.join(format!("ggml-{}.bin", model)))
    }

    fn args(model_path: &Path, audio_path: &Path, language: Option<&str>) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-m".into(),
            model_path.into(),
            "-f".into(),
            audio_path.into(),
            "-nt".into(),
        ];
        if let Some(code) = language {
            args.push("-l".into());
            args.push(code.into());
        }
        args
    }
}

fn default_models_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".voxdrop").join("models"))
}

#[async_trait]
impl SttProvider for WhisperCliProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WhisperCli
    }

    fn name(&self) -> &str {
        "Local Whisper"
    }

    fn is_available(&self) -> bool {
        self.models_dir.as_ref().is_some_and(|dir| dir.is_dir())
    }

    async fn transcribe_file(
        &self,
        path: &Path,
        model: &str,
        language: Option<&str>,
    ) -> Result<String> {
        let model_path = self
            .model_path(model)
            .ok_or_else(|| anyhow!("No whisper models directory configured"))?;
        if !model_path.exists() {
            bail!("Whisper model '{}' not found at {:?}", model, model_path);
        }

        let output = Command::new(&self.binary)
            .args(Self::args(&model_path, path, language))
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Whisper failed on {:?}: {}", path, stderr.trim());
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn provider_in(dir: &Path) -> WhisperCliProvider {
        WhisperCliProvider::new(&ProviderConfig {
            models_dir: Some(dir.to_string_lossy().to_string()),
            binary_path: Some("/nonexistent/whisper-cli".into()),
            ..Default::default()
        })
    }

    #[test]
    fn test_model_path() {
        let provider = provider_in(Path::new("/models"));
        assert_eq!(
            provider.model_path("base"),
            Some(PathBuf::from("/models/ggml-base.bin"))
        );
    }

    #[test]
    fn test_args_include_language_only_when_set() {
        let args = WhisperCliProvider::args(Path::new("m.bin"), Path::new("a.opus"), None);
        assert_eq!(args, ["-m", "m.bin", "-f", "a.opus", "-nt"].map(OsString::from));

        let args = WhisperCliProvider::args(Path::new("m.bin"), Path::new("a.opus"), Some("pt"));
        assert_eq!(&args[5..], ["-l", "pt"].map(OsString::from));
    }

    #[test]
    fn test_availability_follows_models_dir() {
        let dir = TempDir::new().unwrap();
        assert!(provider_in(dir.path()).is_available());
        assert!(!provider_in(&dir.path().join("missing")).is_available());
    }

    #[tokio::test]
    async fn test_missing_model_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = provider_in(dir.path())
            .transcribe_file(Path::new("a.opus"), "large", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'large' not found"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ggml-tiny.bin"), b"").unwrap();
        let err = provider_in(dir.path())
            .transcribe_file(Path::new("a.opus"), "tiny", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to run"));
    }
}
