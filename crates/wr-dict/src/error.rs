//! Error types for dictionary and control-file access.

use std::path::PathBuf;

pub type DictResult<T> = Result<T, DictError>;

#[derive(thiserror::Error, Debug)]
pub enum DictError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File {path} is not valid UTF-8 (first bad byte at offset {offset})")]
    Decode { path: PathBuf, offset: usize },

    #[error("Expected pattern '{pattern}' not found in {context}")]
    MissingPatchOrPattern { pattern: String, context: String },

    #[error("Missing key '{key}' in control file")]
    MissingKey { key: String },

    #[error("No value given for key '{key}' in control file")]
    EmptyValue { key: String },

    #[error("Invalid value for '{key}': {value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}

impl DictError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DictError::Io {
            path: path.into(),
            source,
        }
    }
}
