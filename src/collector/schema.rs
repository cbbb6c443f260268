use std::fs;

use almanac_core::{Localized, VersionRecord};
use serde_json::Value;
use tracing::{debug, warn};

use crate::collector::{parse_error, read_error, Tree};

/// The schema files an extension may ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Release,
    RecordPackage,
    ReleasePackage,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 3] = [
        SchemaKind::Release,
        SchemaKind::RecordPackage,
        SchemaKind::ReleasePackage,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            SchemaKind::Release => "release-schema.json",
            SchemaKind::RecordPackage => "record-package-schema.json",
            SchemaKind::ReleasePackage => "release-package-schema.json",
        }
    }

    fn slot(self, record: &mut VersionRecord) -> &mut Option<Localized<Value>> {
        match self {
            SchemaKind::Release => &mut record.release_schema,
            SchemaKind::RecordPackage => &mut record.record_package_schema,
            SchemaKind::ReleasePackage => &mut record.release_package_schema,
        }
    }
}

/// Stores one schema file of a tree under its language, if the file exists.
pub fn extract(tree: &Tree, kind: SchemaKind, record: &mut VersionRecord) {
    let path = tree.path(kind.file_name());
    if !path.is_file() {
        debug!("No {} in {}", kind.file_name(), tree.root.display());
        return;
    }

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            record.errors.push(read_error(kind.file_name(), &e));
            return;
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(value) => {
            kind.slot(record)
                .get_or_insert_with(Localized::new)
                .insert(tree.language.to_string(), value);
        }
        Err(e) => {
            warn!("Failed to parse {}: {}", path.display(), e);
            record.errors.push(parse_error(kind.file_name(), &e));
        }
    }
}
