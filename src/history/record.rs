use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Number of characters of the text kept in a preview.
pub const PREVIEW_CHARS: usize = 50;
const ELLIPSIS: &str = "...";
/// Longest preview a record can carry: the kept characters plus the ellipsis.
pub const MAX_PREVIEW_CHARS: usize = PREVIEW_CHARS + ELLIPSIS.len();

/// One finished transcription, as shown in the history menu and stored on disk.
///
/// Records are only ever built by [`TranscriptionRecord::create`] (or read back
/// from disk) and are never modified afterwards, so the fields are private.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptionRecord {
    id: String,
    text: String,
    preview: String,
    file_names: Vec<String>,
    file_count: usize,
    model: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    timestamp: DateTime<Local>,
}

impl TranscriptionRecord {
    /// Build a record for a transcription that just finished.
    pub fn create(text: impl Into<String>, file_names: Vec<String>, model: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: Uuid::new_v4().to_string(),
            preview: make_preview(&text),
            file_count: file_names.len(),
            file_names,
            text,
            model: model.into(),
            timestamp: Local::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Human readable age of the record, relative to the current time.
    pub fn time_ago(&self) -> String {
        self.time_ago_at(Local::now())
    }

    /// Age of the record relative to `now`. Timestamps in the future count as "just now".
    pub fn time_ago_at(&self, now: DateTime<Local>) -> String {
        let seconds = (now - self.timestamp).num_seconds();

        if seconds < 60 {
            "just now".to_string()
        } else if seconds < 3600 {
            format!("{}m ago", seconds / 60)
        } else if seconds < 86400 {
            format!("{}h ago", seconds / 3600)
        } else {
            format!("{}d ago", seconds / 86400)
        }
    }

    /// Label for the history menu entry, e.g. `"Hello there" (5m ago)`.
    pub fn menu_label(&self) -> String {
        format!("\"{}\" ({})", self.preview, self.time_ago())
    }

    /// Checks the invariants that serde alone cannot express.
    pub(crate) fn is_consistent(&self) -> bool {
        self.file_count == self.file_names.len()
            && self.preview.chars().count() <= MAX_PREVIEW_CHARS
    }
}

/// RFC 3339, or a naive ISO-8601 date-time read as local time.
fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    let naive = raw.parse::<NaiveDateTime>().ok()?;
    Local.from_local_datetime(&naive).earliest()
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn make_preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    let mut preview = head.replace('\n', " ").trim().to_string();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str(ELLIPSIS);
    }
    preview
}
