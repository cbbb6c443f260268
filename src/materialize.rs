//! Getting a version's files onto disk.
//!
//! [`HttpMaterializer`] downloads the version's zip archive and extracts it
//! into `{output}/{id}/{version}/`, then writes the status marker.
//! [`OfflineMaterializer`] only accepts versions that are already there.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Component, Path};

use almanac_core::VersionDescriptor;
use bytes::Bytes;
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::layout::{Layout, Status};

/// Archive entries that are never extracted.
const SKIPPED_FILES: &[&str] = &[".travis.yml"];

/// Ensures a version's English files exist on disk.
pub trait Materializer {
    fn materialize(&self, version: &VersionDescriptor) -> Result<()>;
}

/// When an already downloaded version is downloaded again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Reuse frozen versions of core extensions, re-download everything else.
    #[default]
    Auto,
    /// Always re-download.
    Any,
    /// Never re-download.
    None,
    /// Re-download only live versions.
    Live,
    /// Fail if the version directory already exists.
    Refuse,
}

impl RefreshPolicy {
    /// Whether `version` has to be (re-)downloaded.
    pub fn should_fetch(self, layout: &Layout, version: &VersionDescriptor) -> Result<bool> {
        let materialized = layout.is_materialized(&version.id, &version.version);
        Ok(match self {
            RefreshPolicy::Auto => !(materialized && version.is_frozen_core()),
            RefreshPolicy::Any => true,
            RefreshPolicy::None => !materialized,
            RefreshPolicy::Live => !materialized || version.is_live(),
            RefreshPolicy::Refuse => {
                let dir = layout.version_dir(&version.id, &version.version);
                if dir.exists() {
                    return Err(Error::AlreadyExists(dir));
                }
                true
            }
        })
    }
}

pub struct HttpMaterializer {
    layout: Layout,
    client: Client,
    policy: RefreshPolicy,
}

impl HttpMaterializer {
    pub fn new(layout: Layout, client: Client) -> Self {
        Self {
            layout,
            client,
            policy: RefreshPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?)
    }
}

impl Materializer for HttpMaterializer {
    fn materialize(&self, version: &VersionDescriptor) -> Result<()> {
        if !self.policy.should_fetch(&self.layout, version)? {
            debug!("Reusing downloaded {}=={}", version.id, version.version);
            return Ok(());
        }

        self.layout.clear_version(&version.id, &version.version)?;

        let archive = self.fetch(&version.download_url)?;
        let dir = self.layout.version_dir(&version.id, &version.version);
        fs::create_dir_all(&dir)?;
        let files = extract_archive(&archive, &dir)?;

        // The marker goes last: its presence means the extraction completed.
        let status = Status::new(checksum(&archive), archive.len() as u64);
        self.layout.write_status(&version.id, &version.version, &status)?;

        info!(
            "Downloaded {}=={} ({} bytes, {} files)",
            version.id,
            version.version,
            archive.len(),
            files
        );
        Ok(())
    }
}

/// Uses whatever was downloaded before, never the network.
pub struct OfflineMaterializer {
    layout: Layout,
}

impl OfflineMaterializer {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }
}

impl Materializer for OfflineMaterializer {
    fn materialize(&self, version: &VersionDescriptor) -> Result<()> {
        if self.layout.is_materialized(&version.id, &version.version) {
            Ok(())
        } else {
            Err(Error::NotMaterialized {
                id: version.id.clone(),
                version: version.version.clone(),
            })
        }
    }
}

pub fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Extracts a zip archive into `dest`, dropping its top-level directory.
///
/// Returns the number of files written.
pub fn extract_archive(archive: &[u8], dest: &Path) -> Result<usize> {
    let mut zip = ZipArchive::new(Cursor::new(archive))?;
    if zip.is_empty() {
        return Err(Error::InvalidArchive("archive is empty".into()));
    }

    let prefix = zip.by_index(0)?.name().to_string();
    if !prefix.ends_with('/') {
        return Err(Error::InvalidArchive(format!(
            "expected a top-level directory, found {}",
            prefix
        )));
    }

    let mut files = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        let relative = name.strip_prefix(&prefix).ok_or_else(|| {
            Error::InvalidArchive(format!("{} is outside {}", name, prefix))
        })?;
        if relative.is_empty() || SKIPPED_FILES.contains(&relative) {
            continue;
        }

        let relative = Path::new(relative);
        if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(Error::InvalidArchive(format!("unsafe entry {}", name)));
        }

        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        files += 1;
    }

    Ok(files)
}
