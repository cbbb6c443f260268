//! Collects extension data into a single document.
//!
//! Every version listed in the extension registry is downloaded, its files
//! (metadata, schemas, codelists, docs and readme) are read in English and in
//! any translated languages, and the result is written to `data.json`.
//!
//! # Example
//!
//! ```no_run
//! use almanac::layout::Layout;
//! use almanac::materialize::OfflineMaterializer;
//! use almanac::registry::{csv_registry::CsvRegistry, Location};
//! use almanac::Runner;
//!
//! let layout = Layout::new("./output");
//! let source = CsvRegistry::new(
//!     Location::parse("extensions.csv"),
//!     Location::parse("extension_versions.csv"),
//!     reqwest::blocking::Client::new(),
//! );
//! let runner = Runner::new(
//!     layout.clone(),
//!     Box::new(source),
//!     Box::new(OfflineMaterializer::new(layout)),
//! );
//! runner.run()?;
//! # Ok::<(), almanac::Error>(())
//! ```

pub mod collector;
pub mod config;
pub mod download;
pub mod error;
pub mod layout;
pub mod materialize;
pub mod output;
pub mod registry;
pub mod rollup;
pub mod runner;
pub mod translation;

pub use collector::Collector;
pub use error::{Error, Result};
pub use registry::Source;
pub use runner::Runner;
