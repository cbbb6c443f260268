use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Version not materialized: {id}=={version}")]
    NotMaterialized { id: String, version: String },

    #[error("Missing required file: {0}")]
    MissingMetadata(PathBuf),

    #[error("No main version for extension: {0}")]
    NoMainVersion(String),

    #[error("Invalid registry data: {0}")]
    InvalidRegistry(String),

    #[error("Couldn't parse '{0}'. Use '==' not '='.")]
    InvalidSelection(String),

    #[error("File {0} already exists! Set the --overwrite option.")]
    AlreadyExists(PathBuf),

    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error only concerns a single version, so the run can go on.
    pub fn is_version_level(&self) -> bool {
        matches!(
            self,
            Error::NotMaterialized { .. }
                | Error::MissingMetadata(_)
                | Error::InvalidArchive(_)
                | Error::Http(_)
                | Error::Zip(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
