//! Transcription history and the glue around it for the VoxDrop menu-bar app:
//! audio files go through a speech-to-text provider, the text is copied to the
//! clipboard and kept in a small, bounded history file.

pub mod audio;
pub mod clipboard;
pub mod commands;
pub mod history;
pub mod providers;
pub mod settings;
pub mod state;

pub use history::{HistoryStore, TranscriptionRecord};
pub use settings::AppSettings;
pub use state::AppState;
