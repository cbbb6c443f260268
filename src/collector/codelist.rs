//! Codelist CSV extraction and cross-language merging.
//!
//! English files establish the canonical headers and codes. Translated files
//! carry no mapping back to English, so their headers are aligned with the
//! English ones by column position (see [`align_positionally`]). Reordered or
//! added columns in a translation therefore produce misaligned entries.

use std::path::Path;

use almanac_core::{Codelist, Row, VersionRecord};
use tracing::{debug, warn};

use crate::collector::{file_names, parse_error, read_error, Tree};
use crate::error::Result;
use crate::layout::ENGLISH;

pub const DIR_NAME: &str = "codelists";

/// English header of the column holding each row's code.
pub const CODE_FIELD: &str = "Code";

/// A parsed codelist file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .cloned()
            .zip(record.iter().map(String::from))
            .collect();
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

/// Merges every codelist file of a tree into the record.
pub fn extract(tree: &Tree, record: &mut VersionRecord) {
    let dir = tree.path(DIR_NAME);
    if !dir.is_dir() {
        return;
    }

    let names = match file_names(&dir) {
        Ok(names) => names,
        Err(e) => {
            record.errors.push(read_error(DIR_NAME, &e));
            return;
        }
    };

    for name in names {
        let relative = format!("{}/{}", DIR_NAME, name);
        match read_table(&dir.join(&name)) {
            Ok(table) => {
                let codelist = record.codelists.entry(name).or_default();
                merge(codelist, &table, tree.language, &relative);
            }
            Err(e) => {
                warn!("Failed to parse {}: {}", dir.join(&name).display(), e);
                record.errors.push(parse_error(&relative, &e));
            }
        }
    }
}

/// Merges one language's table into a codelist, keeping what is already there.
pub fn merge(codelist: &mut Codelist, table: &Table, language: &str, file: &str) {
    if language == ENGLISH {
        for header in &table.headers {
            codelist
                .fieldnames
                .entry(header.clone())
                .or_default()
                .insert(ENGLISH.to_string(), header.clone());
        }
    } else {
        let aligned = align_positionally(codelist.fieldnames.keys(), &table.headers);
        if aligned.len() < table.headers.len() {
            debug!(
                "{} [{}] has {} columns beyond the English ones",
                file,
                language,
                table.headers.len() - aligned.len()
            );
        }
        for (key, header) in aligned {
            if let Some(localized) = codelist.fieldnames.get_mut(&key) {
                localized.insert(language.to_string(), header);
            }
        }
    }

    let code_header = match codelist.fieldnames.get(CODE_FIELD).and_then(|f| f.get(language)) {
        Some(header) => header.clone(),
        None => {
            warn!("{} not found in the [{}] headers of {}", CODE_FIELD, language, file);
            return;
        }
    };

    for row in &table.rows {
        if let Some(code) = row.get(&code_header).filter(|code| !code.is_empty()) {
            codelist
                .items
                .entry(code.clone())
                .or_default()
                .insert(language.to_string(), row.clone());
        }
    }
}

/// Pairs each English header with the translated header in the same column.
///
/// Translated columns beyond the English ones are dropped, and English
/// headers beyond the translated ones get no pair.
pub fn align_positionally<'a>(
    english: impl Iterator<Item = &'a String>,
    translated: &[String],
) -> Vec<(String, String)> {
    english
        .zip(translated)
        .map(|(key, header)| (key.clone(), header.clone()))
        .collect()
}
