use std::fs;
use std::path::PathBuf;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Language of the source files.
pub const ENGLISH: &str = "en";

/// Whether a language code names English, regional variants (`en_GB`,
/// `en-US`) included. Those never get a translated tree of their own.
pub fn is_english(language: &str) -> bool {
    language.split(['_', '-']).next() == Some(ENGLISH)
}

/// Bumped whenever the on-disk arrangement of downloaded files changes.
pub const DISK_DATA_LAYOUT_VERSION: u32 = 1;

/// Where everything lives under the output directory.
///
/// Directory structure:
/// ```text
/// {root}/data.json
/// {root}/{id}/{version}/...
/// {root}/{id}/{version}-status.json
/// {root}/locale/{language}/TRANSLATIONS/{id}/{version}/...
/// ```
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

/// Marker written once a version has been fully extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub disk_data_layout_version: u32,
    #[serde(default)]
    pub checksum_sha256: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub downloaded_at: Option<Timestamp>,
}

impl Status {
    pub fn new(checksum_sha256: String, size_bytes: u64) -> Self {
        Self {
            disk_data_layout_version: DISK_DATA_LAYOUT_VERSION,
            checksum_sha256: Some(checksum_sha256),
            size_bytes: Some(size_bytes),
            downloaded_at: Some(Timestamp::now()),
        }
    }
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join("data.json")
    }

    pub fn extension_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    pub fn version_dir(&self, id: &str, version: &str) -> PathBuf {
        self.extension_dir(id).join(version)
    }

    pub fn status_path(&self, id: &str, version: &str) -> PathBuf {
        self.extension_dir(id).join(format!("{}-status.json", version))
    }

    pub fn locale_dir(&self) -> PathBuf {
        self.root.join("locale")
    }

    pub fn translated_version_dir(&self, id: &str, version: &str, language: &str) -> PathBuf {
        self.locale_dir()
            .join(language)
            .join("TRANSLATIONS")
            .join(id)
            .join(version)
    }

    /// Root of a version's file tree in the given language.
    pub fn tree(&self, id: &str, version: &str, language: &str) -> PathBuf {
        if language == ENGLISH {
            self.version_dir(id, version)
        } else {
            self.translated_version_dir(id, version, language)
        }
    }

    /// A version is materialized once its directory exists next to a marker
    /// written for the current disk layout.
    pub fn is_materialized(&self, id: &str, version: &str) -> bool {
        if !self.version_dir(id, version).is_dir() {
            return false;
        }
        matches!(
            self.read_status(id, version),
            Ok(Some(status)) if status.disk_data_layout_version == DISK_DATA_LAYOUT_VERSION
        )
    }

    pub fn read_status(&self, id: &str, version: &str) -> Result<Option<Status>> {
        let path = self.status_path(id, version);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn write_status(&self, id: &str, version: &str, status: &Status) -> Result<()> {
        let path = self.status_path(id, version);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(status)?)?;
        Ok(())
    }

    /// Removes the marker and the extracted files of a version, if present.
    pub fn clear_version(&self, id: &str, version: &str) -> Result<()> {
        let status = self.status_path(id, version);
        if status.is_file() {
            fs::remove_file(&status)?;
        }
        let dir = self.version_dir(id, version);
        if dir.is_dir() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}
