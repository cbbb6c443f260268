//! The aggregation driver.
//!
//! Pulls versions from a [`Source`], has each one materialized and
//! collected, optionally merges translations, then rolls up the
//! extension-level fields and writes the document.

use almanac_core::{Document, ErrorEntry, ExtensionRecord, VersionDescriptor, VersionRecord};
use tracing::{debug, info, warn};

use crate::collector::Collector;
use crate::error::Result;
use crate::layout::{is_english, Layout};
use crate::materialize::Materializer;
use crate::output;
use crate::registry::Source;
use crate::rollup;
use crate::translation::Translator;

pub struct Runner {
    layout: Layout,
    source: Box<dyn Source>,
    materializer: Box<dyn Materializer>,
    translator: Option<Box<dyn Translator>>,
    limit: Option<usize>,
}

impl Runner {
    pub fn new(
        layout: Layout,
        source: Box<dyn Source>,
        materializer: Box<dyn Materializer>,
    ) -> Self {
        Self {
            layout,
            source,
            materializer,
            translator: None,
            limit: None,
        }
    }

    /// Stop once this many distinct extensions have been collected. Zero
    /// means no limit.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.filter(|&n| n > 0);
        self
    }

    pub fn with_translator(mut self, translator: Box<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Collects everything and writes `{output}/data.json`.
    pub fn run(&self) -> Result<Document> {
        let document = self.collect()?;
        output::write(&document, &self.layout.output_path())?;
        Ok(document)
    }

    pub fn collect(&self) -> Result<Document> {
        let collector = Collector::new(&self.layout);
        let mut document = Document::default();
        // Versions whose English pass succeeded, the only ones open to translations.
        let mut complete = Vec::new();

        for version in self.source.versions()? {
            if self.limit_reached(&document) {
                debug!("Reached the limit of {} extensions", document.extensions.len());
                break;
            }

            let (record, english) = self.collect_version(&collector, &version)?;
            document
                .extensions
                .entry(version.id.clone())
                .or_insert_with(|| ExtensionRecord::new(&version))
                .versions
                .insert(version.version.clone(), record);
            if english {
                complete.push(version);
            }
        }

        if let Some(translator) = &self.translator {
            merge_translations(translator.as_ref(), &collector, &complete, &mut document);
        }

        for (id, extension) in document.extensions.iter_mut() {
            rollup::roll_up(id, extension)?;
        }

        Ok(document)
    }

    fn limit_reached(&self, document: &Document) -> bool {
        self.limit
            .is_some_and(|limit| document.extensions.len() >= limit)
    }

    /// Problems confined to the version end up in the returned record's errors.
    /// The flag tells whether the English pass succeeded.
    fn collect_version(
        &self,
        collector: &Collector,
        version: &VersionDescriptor,
    ) -> Result<(VersionRecord, bool)> {
        info!("Collecting {}=={}", version.id, version.version);

        if let Err(e) = self.materializer.materialize(version) {
            if !e.is_version_level() {
                return Err(e);
            }
            warn!("Failed to materialize {}=={}: {}", version.id, version.version, e);
            let mut record = VersionRecord::new(version);
            record.errors.push(ErrorEntry::new(format!(
                "Error while trying to download {}: {}",
                version.download_url, e
            )));
            return Ok((record, false));
        }

        match collector.collect_english(version) {
            Ok(collected) => Ok(collected),
            Err(e) if e.is_version_level() => {
                warn!("Failed to collect {}=={}: {}", version.id, version.version, e);
                let mut record = VersionRecord::new(version);
                record.errors.push(ErrorEntry::new(e.to_string()));
                Ok((record, false))
            }
            Err(e) => Err(e),
        }
    }
}

fn merge_translations(
    translator: &dyn Translator,
    collector: &Collector,
    versions: &[VersionDescriptor],
    document: &mut Document,
) {
    for version in versions {
        let languages = match translator.languages(version) {
            Ok(languages) => languages,
            Err(e) => {
                warn!("Failed to list translations of {}=={}: {}", version.id, version.version, e);
                continue;
            }
        };

        let Some(record) = document
            .extensions
            .get_mut(&version.id)
            .and_then(|extension| extension.versions.get_mut(&version.version))
        else {
            continue;
        };

        for language in languages.iter().filter(|l| !is_english(l)) {
            collector.collect_language(version, language, record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;

    use pretty_assertions::assert_eq;

    use crate::collector::tests::{version, Fixture};
    use crate::error::Error;
    use crate::materialize::OfflineMaterializer;
    use crate::translation::LocaleTree;

    struct Listed(Vec<VersionDescriptor>);

    impl Source for Listed {
        fn versions(&self) -> Result<Vec<VersionDescriptor>> {
            Ok(self.0.clone())
        }
    }

    struct Counting {
        inner: OfflineMaterializer,
        calls: std::rc::Rc<RefCell<usize>>,
    }

    impl Materializer for Counting {
        fn materialize(&self, version: &VersionDescriptor) -> Result<()> {
            *self.calls.borrow_mut() += 1;
            self.inner.materialize(version)
        }
    }

    fn write_extension(fixture: &Fixture, version: &VersionDescriptor, name: &str) {
        fixture.write(
            version,
            "en",
            "extension.json",
            &format!(r#"{{"name": "{}", "description": "{} description"}}"#, name, name),
        );
    }

    #[test]
    fn test_collects_and_rolls_up() {
        let fixture = Fixture::new();
        let master = version("foo", "master");
        let v1 = version("foo", "v1.0");
        write_extension(&fixture, &master, "Foo");
        write_extension(&fixture, &v1, "Foo 1.0");

        let runner = Runner::new(
            fixture.layout.clone(),
            Box::new(Listed(vec![v1, master])),
            Box::new(OfflineMaterializer::new(fixture.layout.clone())),
        );
        let document = runner.run().unwrap();

        let foo = &document.extensions["foo"];
        assert_eq!(foo.main_version.as_deref(), Some("master"));
        assert_eq!(foo.name["en"], "Foo");
        assert_eq!(foo.list_version_keys_all, vec!["master", "v1.0"]);
        assert_eq!(foo.category, "tender");
        assert_eq!(output::read(&fixture.layout.output_path()).unwrap(), document);
    }

    #[test]
    fn test_limit_counts_distinct_extensions() {
        let fixture = Fixture::new();
        let versions = vec![
            version("bids", "master"),
            version("bids", "v1.1"),
            version("lots", "master"),
            version("lots", "v1.1"),
            version("charges", "master"),
            version("bids", "v2.0"),
        ];
        for v in &versions {
            write_extension(&fixture, v, &v.id);
        }
        let calls = std::rc::Rc::new(RefCell::new(0));

        let runner = Runner::new(
            fixture.layout.clone(),
            Box::new(Listed(versions)),
            Box::new(Counting {
                inner: OfflineMaterializer::new(fixture.layout.clone()),
                calls: calls.clone(),
            }),
        )
        .with_limit(Some(2));
        let document = runner.collect().unwrap();

        let ids: Vec<&String> = document.extensions.keys().collect();
        assert_eq!(ids, vec!["bids", "lots"]);
        assert_eq!(document.extensions["bids"].versions.len(), 2);
        assert_eq!(document.extensions["lots"].list_version_keys_all, vec!["master"]);
        assert_eq!(*calls.borrow(), 3);
    }

    #[test]
    fn test_zero_limit_collects_everything() {
        let fixture = Fixture::new();
        let versions = vec![version("bids", "master"), version("lots", "master")];
        for v in &versions {
            write_extension(&fixture, v, &v.id);
        }

        let runner = Runner::new(
            fixture.layout.clone(),
            Box::new(Listed(versions)),
            Box::new(OfflineMaterializer::new(fixture.layout.clone())),
        )
        .with_limit(Some(0));
        let document = runner.collect().unwrap();

        assert_eq!(document.extensions.len(), 2);
    }

    #[test]
    fn test_translations_skip_versions_without_english_metadata() {
        let fixture = Fixture::new();
        let master = version("foo", "master");
        let broken = version("foo", "v1.0");
        let missing = version("foo", "v2.0");
        write_extension(&fixture, &master, "Foo");
        fixture.write(&broken, "en", "README.md", "# Foo");
        fixture.write(&broken, "es", "extension.json", r#"{"name": {"es": "Fu"}, "description": {"es": "D"}}"#);
        fixture.write(&broken, "es", "README.md", "# Fu");
        // Translated, but never downloaded.
        let translated = fixture.layout.translated_version_dir("foo", "v2.0", "es");
        std::fs::create_dir_all(&translated).unwrap();
        std::fs::write(translated.join("extension.json"), r#"{"name": {"es": "Fu 2"}}"#).unwrap();

        let runner = Runner::new(
            fixture.layout.clone(),
            Box::new(Listed(vec![master, broken, missing])),
            Box::new(OfflineMaterializer::new(fixture.layout.clone())),
        )
        .with_translator(Box::new(LocaleTree::new(fixture.layout.clone())));
        let document = runner.collect().unwrap();

        let foo = &document.extensions["foo"];
        let v1 = &foo.versions["v1.0"];
        assert!(v1.name.is_empty());
        assert!(v1.readme.is_none());
        assert_eq!(v1.errors.len(), 1);
        let v2 = &foo.versions["v2.0"];
        assert!(v2.name.is_empty());
        assert_eq!(v2.errors.len(), 1);
    }

    #[test]
    fn test_unmaterialized_version_is_recorded() {
        let fixture = Fixture::new();
        let master = version("foo", "master");
        write_extension(&fixture, &master, "Foo");
        let missing = version("foo", "v2.0");

        let runner = Runner::new(
            fixture.layout.clone(),
            Box::new(Listed(vec![master, missing])),
            Box::new(OfflineMaterializer::new(fixture.layout.clone())),
        );
        let document = runner.collect().unwrap();

        let record = &document.extensions["foo"].versions["v2.0"];
        assert_eq!(record.errors.len(), 1);
        assert!(record.errors[0].message.starts_with("Error while trying to download"));
        assert!(record.name.is_empty());
        assert!(document.extensions["foo"].versions["master"].errors.is_empty());
    }

    #[test]
    fn test_translations_reach_the_extension_summary() {
        let fixture = Fixture::new();
        let master = version("foo", "master");
        write_extension(&fixture, &master, "Foo");
        fixture.write(&master, "es", "extension.json", r#"{"name": {"es": "Fu"}, "description": {"es": "Descripción"}}"#);

        let runner = Runner::new(
            fixture.layout.clone(),
            Box::new(Listed(vec![master])),
            Box::new(OfflineMaterializer::new(fixture.layout.clone())),
        )
        .with_translator(Box::new(LocaleTree::new(fixture.layout.clone())));
        let document = runner.collect().unwrap();

        let foo = &document.extensions["foo"];
        assert_eq!(foo.versions["master"].name["es"], "Fu");
        assert_eq!(foo.name["es"], "Fu");
        assert_eq!(foo.name["en"], "Foo");
    }

    #[test]
    fn test_source_failure_fails_the_run() {
        struct Broken;

        impl Source for Broken {
            fn versions(&self) -> Result<Vec<VersionDescriptor>> {
                Err(Error::InvalidRegistry("unreadable".into()))
            }
        }

        let fixture = Fixture::new();
        let runner = Runner::new(
            fixture.layout.clone(),
            Box::new(Broken),
            Box::new(OfflineMaterializer::new(fixture.layout.clone())),
        );

        assert!(matches!(runner.run(), Err(Error::InvalidRegistry(_))));
        assert!(!fixture.layout.output_path().exists());
    }
}
