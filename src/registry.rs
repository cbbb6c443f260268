use std::fs;
use std::path::PathBuf;

use almanac_core::VersionDescriptor;
use reqwest::blocking::Client;
use tracing::debug;

use crate::error::Result;

pub mod csv_registry;

/// The extension registry's list of extensions.
pub const EXTENSIONS_URL: &str =
    "https://raw.githubusercontent.com/open-contracting/extension_registry/master/extensions.csv";

/// The extension registry's list of extension versions.
pub const EXTENSION_VERSIONS_URL: &str =
    "https://raw.githubusercontent.com/open-contracting/extension_registry/master/extension_versions.csv";

/// Source of the versions to collect.
pub trait Source {
    /// All versions, in the order they should be collected.
    fn versions(&self) -> Result<Vec<VersionDescriptor>>;
}

/// Where a registry document is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Url(String),
    Path(PathBuf),
}

impl Location {
    /// Anything that is not an `http(s)://` URL is treated as a local path.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            Location::Url(value.to_string())
        } else {
            Location::Path(PathBuf::from(value))
        }
    }

    pub fn read(&self, client: &Client) -> Result<String> {
        match self {
            Location::Url(url) => {
                debug!("Fetching {}", url);
                let response = client.get(url).send()?.error_for_status()?;
                Ok(response.text()?)
            }
            Location::Path(path) => {
                debug!("Reading {}", path.display());
                Ok(fs::read_to_string(path)?)
            }
        }
    }
}
