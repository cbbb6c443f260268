use std::collections::BTreeMap;

use almanac_core::VersionDescriptor;
use tracing::info;

use crate::error::{Error, Result};
use crate::materialize::Materializer;
use crate::registry::Source;

/// Which versions of which extensions to download.
///
/// Empty means everything. An extension given without versions means all
/// of its versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    versions: BTreeMap<String, Vec<String>>,
}

impl Selection {
    /// Parses values like `bids` or `lots==master`.
    pub fn parse<S: AsRef<str>>(values: &[S]) -> Result<Self> {
        let mut versions: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for value in values {
            let value = value.as_ref();
            if let Some((id, version)) = value.split_once("==") {
                versions.entry(id.to_string()).or_default().push(version.to_string());
            } else if value.contains('=') {
                return Err(Error::InvalidSelection(value.to_string()));
            } else {
                versions.entry(value.to_string()).or_default();
            }
        }
        Ok(Self { versions })
    }

    pub fn includes(&self, version: &VersionDescriptor) -> bool {
        if self.versions.is_empty() {
            return true;
        }
        match self.versions.get(&version.id) {
            Some(labels) => labels.is_empty() || labels.contains(&version.version),
            None => false,
        }
    }
}

/// Materializes every selected version. Returns how many were selected.
pub fn download(
    source: &dyn Source,
    materializer: &dyn Materializer,
    selection: &Selection,
) -> Result<usize> {
    let mut count = 0;
    for version in source.versions()? {
        if !selection.includes(&version) {
            continue;
        }
        materializer.materialize(&version)?;
        count += 1;
    }
    info!("Downloaded {} versions", count);
    Ok(count)
}
