//! Core record types for the almanac extension data collector.
//!
//! This crate provides the data types shared by the collector and by any
//! consumer that reads the aggregated `data.json` document it produces.
//!
//! # Overview
//!
//! The main types are:
//!
//! - [`VersionDescriptor`] - One registry entry: an extension id plus a version label
//! - [`VersionRecord`] - Everything collected for one version, across languages
//! - [`Codelist`] - A codelist's localized headers and rows
//! - [`ExtensionRecord`] - All versions of one extension plus roll-up fields
//! - [`Document`] - The top-level `{"extensions": {...}}` document
//!
//! # Example
//!
//! Reading a previously written document:
//!
//! ```ignore
//! use almanac_core::Document;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let content = std::fs::read_to_string("output/data.json")?;
//! let document: Document = serde_json::from_str(&content)?;
//!
//! for (id, extension) in &document.extensions {
//!     let main = extension.main_version.as_deref().unwrap_or("?");
//!     println!("{} ({}): {:?}", id, main, extension.name.get("en"));
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use indexmap::IndexMap;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

/// Standard versions an extension can declare compatibility with.
pub const STANDARD_COMPATIBILITY_VERSIONS: &[&str] = &["1.1"];

/// The label of the perpetually-moving development version.
pub const MASTER: &str = "master";

/// A value per language code (e.g. `{"en": "Lots", "es": "Lotes"}`).
pub type Localized<T> = BTreeMap<String, T>;

/// One codelist row: localized header to cell value, in column order.
pub type Row = IndexMap<String, String>;

/// One published version of one extension, as listed by the registry.
///
/// The pair (`id`, `version`) is unique within a collection run.
///
/// # Example
///
/// ```
/// use almanac_core::VersionDescriptor;
///
/// let version = VersionDescriptor {
///     id: "lots".to_string(),
///     version: "master".to_string(),
///     category: "tender".to_string(),
///     core: true,
///     date: None,
///     base_url: "https://raw.githubusercontent.com/open-contracting/ocds_lots_extension/master/".to_string(),
///     download_url: "https://github.com/open-contracting/ocds_lots_extension/archive/master.zip".to_string(),
/// };
///
/// assert!(version.is_live());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    /// Identifier of the parent extension (e.g., `"lots"`).
    pub id: String,
    /// Version label (e.g., `"master"` or `"v1.1.3"`).
    pub version: String,
    /// Registry category of the parent extension.
    pub category: String,
    /// Whether the parent extension is a core extension.
    pub core: bool,
    /// Release date. Live versions have none.
    pub date: Option<Date>,
    /// URL that relative file names of this version resolve against.
    pub base_url: String,
    /// URL of the zip archive of this version.
    pub download_url: String,
}

impl VersionDescriptor {
    /// A live version has no release date, so its contents may still change.
    pub fn is_live(&self) -> bool {
        self.date.is_none()
    }

    /// Frozen versions of core extensions are trusted not to change.
    pub fn is_frozen_core(&self) -> bool {
        self.core && self.version != MASTER
    }
}

/// A problem encountered while reading one file of a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Human-readable description naming the file.
    pub message: String,
}

impl ErrorEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Localized headers and rows of one codelist file.
///
/// Both maps are keyed by values from the English file: `fieldnames` by the
/// English header and `items` by the English code. Translations only add
/// language keys beneath those.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Codelist {
    /// English header to its header text per language, in English column order.
    pub fieldnames: IndexMap<String, Localized<String>>,
    /// Code to the full row per language.
    pub items: IndexMap<String, Localized<Row>>,
}

/// Everything collected for one version, merged across languages.
///
/// Optional fields are omitted from the serialized form when the source
/// file does not exist for any language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Release date, copied from the descriptor.
    pub date: Option<Date>,
    /// Base URL, copied from the descriptor.
    pub base_url: String,
    /// Download URL, copied from the descriptor.
    pub download_url: String,
    /// Extension name per language.
    #[serde(default)]
    pub name: Localized<String>,
    /// Extension description per language.
    #[serde(default)]
    pub description: Localized<String>,
    /// Standard version to whether the extension declares compatibility.
    #[serde(default)]
    pub standard_compatibility: BTreeMap<String, bool>,
    /// Parsed `release-schema.json` per language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_schema: Option<Localized<serde_json::Value>>,
    /// Parsed `record-package-schema.json` per language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_package_schema: Option<Localized<serde_json::Value>>,
    /// Parsed `release-package-schema.json` per language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_package_schema: Option<Localized<serde_json::Value>>,
    /// Problems found while reading this version's files, in encounter order.
    #[serde(default)]
    pub errors: Vec<ErrorEntry>,
    /// Codelist file name to its contents.
    #[serde(default)]
    pub codelists: BTreeMap<String, Codelist>,
    /// Documentation file name to its text per language.
    #[serde(default)]
    pub docs: BTreeMap<String, Localized<String>>,
    /// Readme text per language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<Localized<String>>,
}

impl VersionRecord {
    /// Creates an empty record for a version.
    ///
    /// Every known standard version starts out as incompatible.
    ///
    /// # Example
    ///
    /// ```
    /// use almanac_core::{VersionDescriptor, VersionRecord};
    ///
    /// let version = VersionDescriptor {
    ///     id: "bids".to_string(),
    ///     version: "master".to_string(),
    ///     category: "tender".to_string(),
    ///     core: false,
    ///     date: None,
    ///     base_url: "https://example.com/bids/".to_string(),
    ///     download_url: "https://example.com/bids.zip".to_string(),
    /// };
    ///
    /// let record = VersionRecord::new(&version);
    /// assert_eq!(record.standard_compatibility.get("1.1"), Some(&false));
    /// assert!(record.release_schema.is_none());
    /// ```
    pub fn new(version: &VersionDescriptor) -> Self {
        Self {
            date: version.date,
            base_url: version.base_url.clone(),
            download_url: version.download_url.clone(),
            standard_compatibility: STANDARD_COMPATIBILITY_VERSIONS
                .iter()
                .map(|v| (v.to_string(), false))
                .collect(),
            ..Default::default()
        }
    }
}

/// All collected versions of one extension plus fields rolled up from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    /// Version label to its record, in registry order.
    pub versions: IndexMap<String, VersionRecord>,
    /// Registry category.
    pub category: String,
    /// Whether this is a core extension.
    pub core: bool,
    /// Label of the version used for the summary fields below.
    pub main_version: Option<String>,
    /// Name per language, from the main version.
    pub name: Localized<String>,
    /// Description per language, from the main version.
    pub description: Localized<String>,
    /// All version labels, sorted lexicographically.
    pub list_version_keys_all: Vec<String>,
}

impl ExtensionRecord {
    /// Creates an empty extension record from the first version seen of it.
    pub fn new(version: &VersionDescriptor) -> Self {
        Self {
            category: version.category.clone(),
            core: version.core,
            ..Default::default()
        }
    }
}

/// The aggregated document written to `data.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Extension id to its record, in registry order.
    pub extensions: IndexMap<String, ExtensionRecord>,
}
