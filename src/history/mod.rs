mod record;
mod store;

pub use record::{TranscriptionRecord, MAX_PREVIEW_CHARS, PREVIEW_CHARS};
pub use store::HistoryStore;
