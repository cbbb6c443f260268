//! Per-version collection.
//!
//! A [`Collector`] reads one version's file trees (English first, then any
//! translated trees) and merges them into a single [`VersionRecord`]. Problems
//! with individual files end up in the record's `errors` list rather than
//! aborting the version.

use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use almanac_core::{ErrorEntry, VersionDescriptor, VersionRecord};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::layout::{is_english, Layout, ENGLISH};

pub mod codelist;
pub mod docs;
pub mod metadata;
pub mod schema;

use schema::SchemaKind;

/// One language's file tree of one version.
#[derive(Debug, Clone)]
pub struct Tree<'a> {
    pub root: PathBuf,
    pub language: &'a str,
}

impl<'a> Tree<'a> {
    pub fn new(root: PathBuf, language: &'a str) -> Self {
        Self { root, language }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn is_english(&self) -> bool {
        self.language == ENGLISH
    }
}

pub struct Collector<'a> {
    layout: &'a Layout,
}

impl<'a> Collector<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    /// Collects a materialized version in English and in each of `languages`.
    ///
    /// Languages are skipped when the English pass fails.
    pub fn collect(
        &self,
        version: &VersionDescriptor,
        languages: &[String],
    ) -> Result<VersionRecord> {
        let (mut record, complete) = self.collect_english(version)?;
        if complete {
            for language in languages.iter().filter(|l| !is_english(l)) {
                self.collect_language(version, language, &mut record);
            }
        }
        Ok(record)
    }

    /// Collects the English tree only.
    ///
    /// The flag is false when the English metadata could not be read, in
    /// which case nothing else may be merged into the record.
    pub fn collect_english(&self, version: &VersionDescriptor) -> Result<(VersionRecord, bool)> {
        if !self.layout.is_materialized(&version.id, &version.version) {
            return Err(Error::NotMaterialized {
                id: version.id.clone(),
                version: version.version.clone(),
            });
        }

        let mut record = VersionRecord::new(version);
        let complete = self.collect_language(version, ENGLISH, &mut record);
        Ok((record, complete))
    }

    /// Merges one language's tree into an existing record.
    ///
    /// English must have been collected into `record` before any other
    /// language, since translated codelists are aligned against it. Returns
    /// false if the tree is English and its metadata is missing or broken.
    pub fn collect_language(
        &self,
        version: &VersionDescriptor,
        language: &str,
        record: &mut VersionRecord,
    ) -> bool {
        let tree = Tree::new(self.layout.tree(&version.id, &version.version, language), language);
        debug!(
            "Collecting {}=={} [{}] from {}",
            version.id,
            version.version,
            language,
            tree.root.display()
        );

        if let Err(e) = metadata::extract(&tree, record) {
            record.errors.push(metadata_error(&e));
            if tree.is_english() {
                warn!("Skipping {}=={}: {}", version.id, version.version, e);
                return false;
            }
            warn!("Ignoring {} metadata of {}=={}: {}", language, version.id, version.version, e);
        }

        docs::extract_readme(&tree, record);
        docs::extract_docs(&tree, record);
        codelist::extract(&tree, record);
        for kind in SchemaKind::ALL {
            schema::extract(&tree, kind, record);
        }
        true
    }
}

fn metadata_error(error: &Error) -> ErrorEntry {
    match error {
        Error::MissingMetadata(_) => {
            ErrorEntry::new(format!("Missing required file {}", metadata::FILE_NAME))
        }
        Error::Json(e) => parse_error(metadata::FILE_NAME, e),
        Error::Io(e) => read_error(metadata::FILE_NAME, e),
        other => ErrorEntry::new(other.to_string()),
    }
}

pub(crate) fn parse_error(file: &str, error: impl Display) -> ErrorEntry {
    ErrorEntry::new(format!("Error while trying to parse {}: {}", file, error))
}

pub(crate) fn read_error(file: &str, error: impl Display) -> ErrorEntry {
    ErrorEntry::new(format!("Error while trying to read {}: {}", file, error))
}

/// Names of the regular files directly inside `dir`, sorted.
pub(crate) fn file_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
