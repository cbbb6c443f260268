use std::fs;

use almanac_core::{Localized, VersionRecord};

use crate::collector::{file_names, read_error, Tree};

pub const DIR_NAME: &str = "docs";

/// Readme file names, in order of preference.
pub const README_NAMES: [&str; 2] = ["README.md", "readme.md"];

/// Stores the text of every file in the tree's docs directory.
pub fn extract_docs(tree: &Tree, record: &mut VersionRecord) {
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
        match fs::read_to_string(dir.join(&name)) {
            Ok(content) => {
                record
                    .docs
                    .entry(name)
                    .or_default()
                    .insert(tree.language.to_string(), content);
            }
            Err(e) => {
                record.errors.push(read_error(&format!("{}/{}", DIR_NAME, name), &e));
            }
        }
    }
}

/// Stores the first readme found in the tree.
pub fn extract_readme(tree: &Tree, record: &mut VersionRecord) {
    for name in README_NAMES {
        let path = tree.path(name);
        if !path.is_file() {
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(content) => {
                record
                    .readme
                    .get_or_insert_with(Localized::new)
                    .insert(tree.language.to_string(), content);
            }
            Err(e) => record.errors.push(read_error(name, &e)),
        }
        return;
    }
}
