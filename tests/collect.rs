use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use almanac::layout::{Layout, Status};
use almanac::materialize::OfflineMaterializer;
use almanac::output;
use almanac::registry::csv_registry::CsvRegistry;
use almanac::registry::Location;
use almanac::translation::LocaleTree;
use almanac::Runner;

const EXTENSIONS: &str = "\
Id,Category,Core
widgets,tender,true
gadgets,item,false
";

const EXTENSION_VERSIONS: &str = "\
Id,Date,Version,Base URL,Download URL
widgets,,master,https://example.com/widgets/master/,https://example.com/widgets/master.zip
widgets,2020-01-01,v1.0,https://example.com/widgets/v1.0/,https://example.com/widgets/v1.0.zip
gadgets,2019-05-01,v2.0,https://example.com/gadgets/v2.0/,https://example.com/gadgets/v2.0.zip
gadgets,2018-03-01,v1.0,https://example.com/gadgets/v1.0/,https://example.com/gadgets/v1.0.zip
";

struct Registry {
    temp_dir: TempDir,
    layout: Layout,
}

impl Registry {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("extensions.csv"), EXTENSIONS).unwrap();
        fs::write(temp_dir.path().join("extension_versions.csv"), EXTENSION_VERSIONS).unwrap();
        let layout = Layout::new(temp_dir.path().join("output"));
        Self { temp_dir, layout }
    }

    fn csv(&self, name: &str) -> Location {
        Location::Path(self.temp_dir.path().join(name))
    }

    fn write(&self, dir: PathBuf, name: &str, content: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Writes an English file and marks the version downloaded.
    fn english(&self, id: &str, version: &str, name: &str, content: &str) {
        self.write(self.layout.version_dir(id, version), name, content);
        self.layout
            .write_status(id, version, &Status::new(String::new(), 0))
            .unwrap();
    }

    fn translated(&self, id: &str, version: &str, language: &str, name: &str, content: &str) {
        self.write(self.layout.translated_version_dir(id, version, language), name, content);
    }

    fn runner(&self, translate: bool) -> Runner {
        let source = CsvRegistry::new(
            self.csv("extensions.csv"),
            self.csv("extension_versions.csv"),
            reqwest::blocking::Client::new(),
        );
        let runner = Runner::new(
            self.layout.clone(),
            Box::new(source),
            Box::new(OfflineMaterializer::new(self.layout.clone())),
        );
        if translate {
            runner.with_translator(Box::new(LocaleTree::new(self.layout.clone())))
        } else {
            runner
        }
    }

    fn data(&self) -> serde_json::Value {
        read_json(&self.layout.output_path())
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn widgets(registry: &Registry) {
    registry.english(
        "widgets",
        "master",
        "extension.json",
        r#"{"name": {"en": "Widgets"}, "description": {"en": "Adds widgets"}, "compatibility": ["1.1"]}"#,
    );
    registry.english(
        "widgets",
        "master",
        "release-schema.json",
        r#"{"properties": {"widget": {"type": "string"}}}"#,
    );
    registry.english("widgets", "master", "codelists/widgetType.csv", "Code,Title\nsmall,Small\nlarge,Large\n");
    registry.english("widgets", "master", "docs/usage.md", "# Usage\n");
    registry.english("widgets", "master", "README.md", "# Widgets\n");

    registry.english("widgets", "v1.0", "extension.json", r#"{"name": "Widgets 1.0", "description": "Old"}"#);
}

fn gadgets(registry: &Registry) {
    registry.english("gadgets", "v2.0", "extension.json", r#"{"name": "Gadgets", "description": "Adds gadgets"}"#);
    registry.english("gadgets", "v1.0", "extension.json", r#"{"name": "Gadgets 1.0", "description": "Old"}"#);
}

#[test]
fn test_collect_document() {
    let registry = Registry::new();
    widgets(&registry);
    gadgets(&registry);

    registry.runner(false).run().unwrap();
    let data = registry.data();

    let master = &data["extensions"]["widgets"]["versions"]["master"];
    assert_eq!(master["name"], json!({"en": "Widgets"}));
    assert_eq!(master["description"], json!({"en": "Adds widgets"}));
    assert_eq!(master["standard_compatibility"], json!({"1.1": true}));
    assert_eq!(
        master["release_schema"],
        json!({"en": {"properties": {"widget": {"type": "string"}}}})
    );
    assert!(master.get("record_package_schema").is_none());
    assert_eq!(
        master["codelists"]["widgetType.csv"],
        json!({
            "fieldnames": {"Code": {"en": "Code"}, "Title": {"en": "Title"}},
            "items": {
                "small": {"en": {"Code": "small", "Title": "Small"}},
                "large": {"en": {"Code": "large", "Title": "Large"}}
            }
        })
    );
    assert_eq!(master["docs"], json!({"usage.md": {"en": "# Usage\n"}}));
    assert_eq!(master["readme"], json!({"en": "# Widgets\n"}));
    assert_eq!(master["errors"], json!([]));
    assert_eq!(master["date"], json!(null));

    let old = &data["extensions"]["widgets"]["versions"]["v1.0"];
    assert_eq!(old["date"], json!("2020-01-01"));
    assert_eq!(old["standard_compatibility"], json!({"1.1": true}));
}

#[test]
fn test_roll_up() {
    let registry = Registry::new();
    widgets(&registry);
    gadgets(&registry);

    registry.runner(false).run().unwrap();
    let data = registry.data();

    let widgets = &data["extensions"]["widgets"];
    assert_eq!(widgets["main_version"], "master");
    assert_eq!(widgets["name"], json!({"en": "Widgets"}));
    assert_eq!(widgets["category"], "tender");
    assert_eq!(widgets["core"], true);
    assert_eq!(widgets["list_version_keys_all"], json!(["master", "v1.0"]));

    // No master, so the latest release stands in.
    let gadgets = &data["extensions"]["gadgets"];
    assert_eq!(gadgets["main_version"], "v2.0");
    assert_eq!(gadgets["name"], json!({"en": "Gadgets"}));
    assert_eq!(gadgets["core"], false);

    let ids: Vec<&String> = data["extensions"].as_object().unwrap().keys().collect();
    assert_eq!(ids, vec!["widgets", "gadgets"]);
}

#[test]
fn test_translations() {
    let registry = Registry::new();
    widgets(&registry);
    gadgets(&registry);
    registry.translated(
        "widgets",
        "master",
        "es",
        "extension.json",
        r#"{"name": {"es": "Artilugios"}, "description": {"es": "Añade artilugios"}}"#,
    );
    registry.translated(
        "widgets",
        "master",
        "es",
        "codelists/widgetType.csv",
        "Código,Título\nsmall,Pequeño\nlarge,Grande\n",
    );

    registry.runner(true).run().unwrap();
    let data = registry.data();

    let widgets = &data["extensions"]["widgets"];
    let master = &widgets["versions"]["master"];
    assert_eq!(master["name"], json!({"en": "Widgets", "es": "Artilugios"}));
    assert_eq!(
        master["codelists"]["widgetType.csv"]["fieldnames"]["Title"],
        json!({"en": "Title", "es": "Título"})
    );
    assert_eq!(
        master["codelists"]["widgetType.csv"]["items"]["small"]["es"],
        json!({"Código": "small", "Título": "Pequeño"})
    );
    assert_eq!(widgets["name"]["es"], "Artilugios");
    assert_eq!(data["extensions"]["gadgets"]["name"], json!({"en": "Gadgets"}));
}

#[test]
fn test_missing_version_is_recorded() {
    let registry = Registry::new();
    widgets(&registry);
    registry.english("gadgets", "v2.0", "extension.json", r#"{"name": "Gadgets", "description": "Adds gadgets"}"#);

    registry.runner(false).run().unwrap();
    let data = registry.data();

    let errors = data["extensions"]["gadgets"]["versions"]["v1.0"]["errors"]
        .as_array()
        .unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Error while trying to download https://example.com/gadgets/v1.0.zip"));
    assert_eq!(data["extensions"]["gadgets"]["main_version"], "v2.0");
}

#[test]
fn test_missing_english_metadata() {
    let registry = Registry::new();
    widgets(&registry);
    gadgets(&registry);
    fs::remove_file(registry.layout.version_dir("widgets", "v1.0").join("extension.json")).unwrap();
    registry.english("widgets", "v1.0", "README.md", "# Old\n");

    registry.runner(false).run().unwrap();
    let data = registry.data();

    let old = &data["extensions"]["widgets"]["versions"]["v1.0"];
    assert_eq!(old["errors"], json!([{"message": "Missing required file extension.json"}]));
    assert!(old.get("readme").is_none());
    assert_eq!(data["extensions"]["widgets"]["versions"]["master"]["errors"], json!([]));
}

#[test]
fn test_output_round_trips() {
    let registry = Registry::new();
    widgets(&registry);
    gadgets(&registry);

    let document = registry.runner(false).run().unwrap();

    assert_eq!(output::read(&registry.layout.output_path()).unwrap(), document);
    let content = fs::read_to_string(registry.layout.output_path()).unwrap();
    assert!(content.starts_with("{\n    \"extensions\": {\n"));
}
