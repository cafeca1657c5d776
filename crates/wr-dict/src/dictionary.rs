//! `key value;` parameters in case dictionaries.

use std::path::{Path, PathBuf};

use regex::{Captures, Regex};

use crate::store::{self, ReadMode};
use crate::{DictError, DictResult};

fn parameter_pattern(key: &str) -> DictResult<Regex> {
    let pattern = format!(r"(?m)^(\s*{}\s+)([^;\n]*?)(\s*;)", regex::escape(key));
    Ok(Regex::new(&pattern)?)
}

/// Value of the first `key value;` entry, trimmed.
pub fn read_parameter(content: &str, key: &str) -> DictResult<Option<String>> {
    let re = parameter_pattern(key)?;
    Ok(re
        .captures(content)
        .map(|caps| caps[2].trim().to_string()))
}

/// Replace the value of every `key value;` entry.
pub fn replace_parameter(content: &str, key: &str, value: &str) -> DictResult<String> {
    let re = parameter_pattern(key)?;
    if !re.is_match(content) {
        return Err(DictError::MissingPatchOrPattern {
            pattern: format!("{key} <value>;"),
            context: "dictionary".to_string(),
        });
    }
    let replaced = re.replace_all(content, |caps: &Captures| {
        format!("{}{}{}", &caps[1], value, &caps[3])
    });
    Ok(replaced.into_owned())
}

/// A dictionary on disk plus the text it had when opened.
#[derive(Debug, Clone)]
pub struct DictionaryFile {
    path: PathBuf,
    original: String,
    content: String,
}

impl DictionaryFile {
    pub fn open(path: &Path) -> DictResult<Self> {
        let content = store::read(path, ReadMode::Raw)?;
        Ok(Self {
            path: path.to_path_buf(),
            original: content.clone(),
            content,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn get(&self, key: &str) -> DictResult<Option<String>> {
        read_parameter(&self.content, key)
    }

    /// Replace `key` and write the file.
    pub fn set(&mut self, key: &str, value: &str) -> DictResult<()> {
        let updated = replace_parameter(&self.content, key, value).map_err(|e| match e {
            DictError::MissingPatchOrPattern { pattern, .. } => DictError::MissingPatchOrPattern {
                pattern,
                context: self.path.display().to_string(),
            },
            other => other,
        })?;
        self.content = updated;
        self.save()
    }

    pub fn save(&self) -> DictResult<()> {
        store::write(&self.path, &self.content)
    }

    /// Write back the text the file had when it was opened.
    pub fn restore_original(&mut self) -> DictResult<()> {
        self.content = self.original.clone();
        self.save()
    }
}
