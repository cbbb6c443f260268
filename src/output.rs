use std::fs;
use std::path::Path;

use almanac_core::Document;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::info;

use crate::error::Result;

/// Writes the document as four-space indented JSON.
///
/// The content goes to a sibling temporary file first, so an interrupted
/// write never leaves a truncated document behind.
pub fn write(document: &Document, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    document.serialize(&mut serializer)?;
    buffer.push(b'\n');

    let temporary = path.with_extension("json.tmp");
    fs::write(&temporary, &buffer)?;
    fs::rename(&temporary, path)?;

    info!("Wrote {} ({} extensions)", path.display(), document.extensions.len());
    Ok(())
}

pub fn read(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
