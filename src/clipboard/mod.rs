use anyhow::Result;
use arboard::Clipboard;

/// Replace the system clipboard contents with `text`.
pub fn copy_text(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new()?;
    clipboard.set_text(text)?;
    Ok(())
}
