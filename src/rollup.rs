//! Extension-level fields computed once every version is collected.

use almanac_core::{ExtensionRecord, MASTER};
use tracing::warn;

use crate::error::{Error, Result};

/// Picks the version whose name and description represent the extension.
///
/// `master` when present. Otherwise the most recently released version, and
/// failing that the lexicographically greatest label.
pub fn main_version(extension: &ExtensionRecord) -> Option<&str> {
    if extension.versions.contains_key(MASTER) {
        return Some(MASTER);
    }

    extension
        .versions
        .iter()
        .filter_map(|(label, record)| record.date.map(|date| (date, label)))
        .max()
        .map(|(_, label)| label.as_str())
        .or_else(|| extension.versions.keys().max().map(String::as_str))
}

/// Fills `main_version`, `name`, `description` and `list_version_keys_all`.
pub fn roll_up(id: &str, extension: &mut ExtensionRecord) -> Result<()> {
    let main = main_version(extension)
        .ok_or_else(|| Error::NoMainVersion(id.to_string()))?
        .to_string();
    if main != MASTER {
        warn!("Extension {} has no {} version, using {}", id, MASTER, main);
    }

    let record = &extension.versions[&main];
    extension.name = record.name.clone();
    extension.description = record.description.clone();
    extension.main_version = Some(main);

    // Lexicographic, so "v10" sorts before "v2".
    let mut keys: Vec<String> = extension.versions.keys().cloned().collect();
    keys.sort();
    extension.list_version_keys_all = keys;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use almanac_core::{Localized, VersionRecord};
    use jiff::civil::date;
    use pretty_assertions::assert_eq;

    fn record(name: &str, released: Option<jiff::civil::Date>) -> VersionRecord {
        VersionRecord {
            date: released,
            name: Localized::from([("en".to_string(), name.to_string())]),
            description: Localized::from([("en".to_string(), format!("{} description", name))]),
            ..Default::default()
        }
    }

    fn extension(versions: Vec<(&str, VersionRecord)>) -> ExtensionRecord {
        ExtensionRecord {
            versions: versions
                .into_iter()
                .map(|(label, record)| (label.to_string(), record))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_master_is_main() {
        let mut foo = extension(vec![
            ("v1.0", record("Foo 1.0", Some(date(2020, 1, 1)))),
            ("master", record("Foo", None)),
        ]);

        roll_up("foo", &mut foo).unwrap();

        assert_eq!(foo.main_version.as_deref(), Some("master"));
        assert_eq!(foo.name["en"], "Foo");
        assert_eq!(foo.description["en"], "Foo description");
        assert_eq!(foo.list_version_keys_all, vec!["master", "v1.0"]);
    }

    #[test]
    fn test_latest_release_without_master() {
        let foo = extension(vec![
            ("v1.1", record("Foo 1.1", Some(date(2019, 6, 1)))),
            ("v1.0", record("Foo 1.0", Some(date(2018, 1, 1)))),
            ("develop", record("Foo dev", None)),
        ]);

        assert_eq!(main_version(&foo), Some("v1.1"));
    }

    #[test]
    fn test_greatest_label_without_dates() {
        let foo = extension(vec![("beta", record("Foo beta", None)), ("alpha", record("Foo alpha", None))]);

        assert_eq!(main_version(&foo), Some("beta"));
    }

    #[test]
    fn test_lexicographic_version_keys() {
        let mut foo = extension(vec![
            ("v2", record("Foo 2", Some(date(2019, 1, 1)))),
            ("v10", record("Foo 10", Some(date(2021, 1, 1)))),
            ("master", record("Foo", None)),
        ]);

        roll_up("foo", &mut foo).unwrap();

        assert_eq!(foo.list_version_keys_all, vec!["master", "v10", "v2"]);
    }

    #[test]
    fn test_no_versions() {
        let mut empty = ExtensionRecord::default();
        assert!(matches!(roll_up("empty", &mut empty), Err(Error::NoMainVersion(_))));
    }
}
