use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::registry::{EXTENSIONS_URL, EXTENSION_VERSIONS_URL};

/// Collector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Output directory (default: "./output")
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Stop after this many extensions
    #[serde(default)]
    pub limit: Option<usize>,
    /// Merge translated trees into the document
    #[serde(default)]
    pub translate: bool,
    /// Only use versions that are already downloaded
    #[serde(default)]
    pub offline: bool,
    /// Where the extension registry lives
    #[serde(default)]
    pub registry: RegistryConfig,
}

fn default_output() -> PathBuf {
    PathBuf::from("./output")
}

/// Registry CSV locations, URLs or local paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_extensions")]
    pub extensions: String,
    #[serde(default = "default_extension_versions")]
    pub extension_versions: String,
}

fn default_extensions() -> String {
    EXTENSIONS_URL.to_string()
}

fn default_extension_versions() -> String {
    EXTENSION_VERSIONS_URL.to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            extension_versions: default_extension_versions(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: default_output(),
            limit: None,
            translate: false,
            offline: false,
            registry: RegistryConfig::default(),
        }
    }
}

/// Values given on the command line. `None`/`false` leaves the setting alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub limit: Option<usize>,
    pub translate: bool,
    pub offline: bool,
    pub extensions: Option<String>,
    pub extension_versions: Option<String>,
}

impl Config {
    /// Load configuration from file, environment, and CLI arguments
    pub fn load(config_path: Option<&PathBuf>, overrides: &Overrides) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else if let Ok(content) = std::fs::read_to_string("almanac.toml") {
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env(|name| std::env::var(name).ok());
        config.apply_overrides(overrides);

        Ok(config)
    }

    /// Applies `ALMANAC_*` variables, as returned by `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(output) = var("ALMANAC_OUTPUT") {
            self.output = PathBuf::from(output);
        }
        if let Some(limit) = var("ALMANAC_LIMIT") {
            if let Ok(n) = limit.parse() {
                self.limit = Some(n);
            }
        }
        if let Some(translate) = var("ALMANAC_TRANSLATE") {
            self.translate = is_truthy(&translate);
        }
        if let Some(offline) = var("ALMANAC_OFFLINE") {
            self.offline = is_truthy(&offline);
        }
        if let Some(url) = var("ALMANAC_EXTENSIONS_URL") {
            self.registry.extensions = url;
        }
        if let Some(url) = var("ALMANAC_EXTENSION_VERSIONS_URL") {
            self.registry.extension_versions = url;
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(output) = &overrides.output {
            self.output = output.clone();
        }
        if let Some(limit) = overrides.limit {
            self.limit = Some(limit);
        }
        if overrides.translate {
            self.translate = true;
        }
        if overrides.offline {
            self.offline = true;
        }
        if let Some(url) = &overrides.extensions {
            self.registry.extensions = url.clone();
        }
        if let Some(url) = &overrides.extension_versions {
            self.registry.extension_versions = url.clone();
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
