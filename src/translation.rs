use std::fs;

use almanac_core::VersionDescriptor;
use tracing::debug;

use crate::error::Result;
use crate::layout::{is_english, Layout};

/// Reports which translated trees exist for a version.
///
/// Producing those trees (catalog extraction, the translation platform,
/// compiling catalogs into translated files) happens outside this crate.
pub trait Translator {
    /// Non-English languages whose tree of `version` is on disk.
    fn languages(&self, version: &VersionDescriptor) -> Result<Vec<String>>;
}

/// Discovers translated trees under `{output}/locale/{language}/TRANSLATIONS/`.
pub struct LocaleTree {
    layout: Layout,
}

impl LocaleTree {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }
}

impl Translator for LocaleTree {
    fn languages(&self, version: &VersionDescriptor) -> Result<Vec<String>> {
        let locale_dir = self.layout.locale_dir();
        if !locale_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut languages = Vec::new();
        for entry in fs::read_dir(&locale_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(language) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            if is_english(&language) {
                continue;
            }
            if self
                .layout
                .translated_version_dir(&version.id, &version.version, &language)
                .is_dir()
            {
                languages.push(language);
            }
        }
        languages.sort();

        debug!("Translations of {}=={}: {:?}", version.id, version.version, languages);
        Ok(languages)
    }
}
