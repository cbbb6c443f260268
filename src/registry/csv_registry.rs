use std::collections::HashMap;

use almanac_core::VersionDescriptor;
use jiff::civil::Date;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::registry::{Location, Source};

/// A row of `extensions.csv`.
#[derive(Debug, Deserialize)]
struct ExtensionRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Category", default)]
    category: String,
    #[serde(rename = "Core", default)]
    core: String,
}

/// A row of `extension_versions.csv`.
#[derive(Debug, Deserialize)]
struct VersionRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Date", default)]
    date: String,
    #[serde(rename = "Version")]
    version: String,
    #[serde(rename = "Base URL", default)]
    base_url: String,
    #[serde(rename = "Download URL", default)]
    download_url: String,
}

/// Registry published as two CSV documents.
///
/// Versions come out in `extension_versions.csv` order, each joined with its
/// row from `extensions.csv`.
pub struct CsvRegistry {
    extensions: Location,
    extension_versions: Location,
    client: Client,
}

impl CsvRegistry {
    pub fn new(extensions: Location, extension_versions: Location, client: Client) -> Self {
        Self {
            extensions,
            extension_versions,
            client,
        }
    }

    /// Joins the contents of `extensions.csv` and `extension_versions.csv`.
    pub fn parse(extensions: &str, extension_versions: &str) -> Result<Vec<VersionDescriptor>> {
        let mut by_id = HashMap::new();
        let mut reader = csv::Reader::from_reader(extensions.as_bytes());
        for row in reader.deserialize::<ExtensionRow>() {
            let row = row?;
            by_id.insert(row.id.clone(), row);
        }

        let mut versions = Vec::new();
        let mut reader = csv::Reader::from_reader(extension_versions.as_bytes());
        for row in reader.deserialize::<VersionRow>() {
            let row = row?;
            let date = parse_date(&row)?;
            let (category, core) = match by_id.get(&row.id) {
                Some(extension) => (
                    extension.category.clone(),
                    extension.core.trim().eq_ignore_ascii_case("true"),
                ),
                None => {
                    warn!("Extension {} is not listed in extensions.csv", row.id);
                    (String::new(), false)
                }
            };
            versions.push(VersionDescriptor {
                id: row.id,
                version: row.version,
                category,
                core,
                date,
                base_url: row.base_url,
                download_url: row.download_url,
            });
        }

        Ok(versions)
    }
}

fn parse_date(row: &VersionRow) -> Result<Option<Date>> {
    let date = row.date.trim();
    if date.is_empty() {
        return Ok(None);
    }
    date.parse::<Date>().map(Some).map_err(|e| {
        Error::InvalidRegistry(format!(
            "invalid date '{}' for {}=={}: {}",
            date, row.id, row.version, e
        ))
    })
}

impl Source for CsvRegistry {
    fn versions(&self) -> Result<Vec<VersionDescriptor>> {
        let extensions = self.extensions.read(&self.client)?;
        let extension_versions = self.extension_versions.read(&self.client)?;
        let versions = Self::parse(&extensions, &extension_versions)?;
        info!("Registry lists {} versions", versions.len());
        Ok(versions)
    }
}
