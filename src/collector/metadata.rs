use std::fs;

use almanac_core::{Localized, VersionRecord, STANDARD_COMPATIBILITY_VERSIONS};
use serde_json::Value;
use tracing::debug;

use crate::collector::Tree;
use crate::error::{Error, Result};

pub const FILE_NAME: &str = "extension.json";

/// Assumed for metadata that predates the `compatibility` list.
pub const LEGACY_COMPATIBILITY: &str = "1.1";

/// `extension.json` after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub name: Localized<String>,
    pub description: Localized<String>,
    pub compatibility: Vec<String>,
}

/// Normalizes raw `extension.json` content read for `language`.
///
/// Plain-string `name` and `description` values become `{language: value}`.
/// A missing or plain-string `compatibility` becomes `["1.1"]`.
pub fn normalize(raw: &Value, language: &str) -> Metadata {
    Metadata {
        name: localize(raw.get("name"), language),
        description: localize(raw.get("description"), language),
        compatibility: compatibility(raw.get("compatibility")),
    }
}

fn localize(value: Option<&Value>, language: &str) -> Localized<String> {
    match value {
        Some(Value::String(s)) => Localized::from([(language.to_string(), s.clone())]),
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect(),
        _ => Localized::new(),
    }
}

fn compatibility(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => vec![LEGACY_COMPATIBILITY.to_string()],
    }
}

/// Copies the name, description and (in English only) compatibility of a tree.
///
/// A missing file is an error in English and no contribution otherwise.
pub fn extract(tree: &Tree, record: &mut VersionRecord) -> Result<()> {
    let path = tree.path(FILE_NAME);
    if !path.is_file() {
        if tree.is_english() {
            return Err(Error::MissingMetadata(path));
        }
        debug!("No {} in {}", FILE_NAME, tree.root.display());
        return Ok(());
    }

    let raw: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let metadata = normalize(&raw, tree.language);

    if let Some(name) = metadata.name.get(tree.language) {
        record.name.insert(tree.language.to_string(), name.clone());
    }
    if let Some(description) = metadata.description.get(tree.language) {
        record.description.insert(tree.language.to_string(), description.clone());
    }

    // Translations never redeclare compatibility.
    if tree.is_english() {
        for standard in STANDARD_COMPATIBILITY_VERSIONS {
            let compatible = metadata.compatibility.iter().any(|c| c == standard);
            record.standard_compatibility.insert(standard.to_string(), compatible);
        }
    }

    Ok(())
}
