//! Legacy `key: value` control files.
//!
//! ```text
//! # Meteorology
//! wspeeds: 3.0 5.0
//! wdirs: 0 45 90
//! initialize: setWindInlet "setFields -dict extra"
//! ```
//!
//! A key is looked up at the start of a line; the value is the rest of
//! that line. Comment lines are dropped when the file is read.

use std::path::Path;

use crate::store::{self, ReadMode};
use crate::{DictError, DictResult};

#[derive(Debug, Clone)]
pub struct ControlFile {
    content: String,
}

impl ControlFile {
    pub fn open(path: &Path) -> DictResult<Self> {
        Self::open_with(path, ReadMode::StripComments)
    }

    pub fn open_with(path: &Path, mode: ReadMode) -> DictResult<Self> {
        Ok(Self {
            content: store::read(path, mode)?,
        })
    }

    pub fn parse(text: &str, mode: ReadMode) -> Self {
        let content = match mode {
            ReadMode::Raw => text.to_string(),
            ReadMode::StripComments => store::strip_comments(text),
        };
        Self { content }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }

    fn raw(&self, key: &str) -> Option<&str> {
        let prefix = format!("{key}:");
        self.content.lines().find_map(|line| {
            line.trim_start()
                .strip_prefix(prefix.as_str())
                .map(str::trim)
        })
    }

    /// `None` when the key is absent or has an empty value.
    fn optional(&self, key: &str) -> Option<&str> {
        self.raw(key).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> DictResult<&str> {
        match self.raw(key) {
            None => Err(DictError::MissingKey {
                key: key.to_string(),
            }),
            Some("") => Err(DictError::EmptyValue {
                key: key.to_string(),
            }),
            Some(v) => Ok(v),
        }
    }

    pub fn string(&self, key: &str) -> DictResult<String> {
        self.required(key).map(unquote)
    }

    pub fn opt_string(&self, key: &str) -> Option<String> {
        self.optional(key).map(unquote)
    }

    pub fn float(&self, key: &str) -> DictResult<f64> {
        parse_float(key, self.required(key)?)
    }

    pub fn opt_float(&self, key: &str) -> DictResult<Option<f64>> {
        self.optional(key).map(|v| parse_float(key, v)).transpose()
    }

    pub fn int(&self, key: &str) -> DictResult<usize> {
        parse_int(key, self.required(key)?)
    }

    pub fn opt_int(&self, key: &str) -> DictResult<Option<usize>> {
        self.optional(key).map(|v| parse_int(key, v)).transpose()
    }

    pub fn bool(&self, key: &str) -> DictResult<bool> {
        parse_bool(key, self.required(key)?)
    }

    pub fn opt_bool(&self, key: &str) -> DictResult<Option<bool>> {
        self.optional(key).map(|v| parse_bool(key, v)).transpose()
    }

    pub fn float_list(&self, key: &str) -> DictResult<Vec<f64>> {
        self.required(key)?
            .split_whitespace()
            .map(|item| parse_float(key, item))
            .collect()
    }

    pub fn string_list(&self, key: &str) -> DictResult<Vec<String>> {
        Ok(split_quoted(self.required(key)?))
    }

    pub fn opt_string_list(&self, key: &str) -> Option<Vec<String>> {
        self.optional(key).map(split_quoted)
    }
}

fn unquote(value: &str) -> String {
    value.replace('"', "")
}

fn parse_float(key: &str, value: &str) -> DictResult<f64> {
    value.parse::<f64>().map_err(|_| DictError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected a number".to_string(),
    })
}

fn parse_int(key: &str, value: &str) -> DictResult<usize> {
    if let Ok(v) = value.parse::<usize>() {
        return Ok(v);
    }
    // control files written by hand often carry `16.0`
    match value.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 => Ok(v as usize),
        _ => Err(DictError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a non-negative integer".to_string(),
        }),
    }
}

fn parse_bool(key: &str, value: &str) -> DictResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(DictError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected True or False".to_string(),
        }),
    }
}

/// Split on whitespace; double-quoted items may contain spaces.
fn split_quoted(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in value.chars() {
        match ch {
            '"' => {
                if in_quotes && !current.is_empty() {
                    items.push(std::mem::take(&mut current));
                }
                in_quotes = !in_quotes;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    items.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        items.push(current);
    }
    items
}
