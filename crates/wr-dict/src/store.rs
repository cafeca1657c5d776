//! Read, write and pattern-substitute access to structured text files.
//!
//! Files whose name ends in `.gz` are gunzipped on read and gzipped on write,
//! so callers edit compressed fields exactly like plain ones.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use regex::{NoExpand, Regex};

use crate::{DictError, DictResult};

const GZ_SUFFIX: &str = ".gz";

/// How comment lines are treated on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Drop every line whose first non-whitespace character is `#`.
    StripComments,
    /// Return the content unchanged.
    #[default]
    Raw,
}

pub fn is_compressed(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(GZ_SUFFIX))
}

/// File name with a trailing `.gz` removed (`U.gz` -> `U`).
pub fn logical_name(file_name: &str) -> &str {
    file_name.strip_suffix(GZ_SUFFIX).unwrap_or(file_name)
}

pub fn read(path: &Path, mode: ReadMode) -> DictResult<String> {
    let bytes = read_bytes(path)?;
    let text = String::from_utf8(bytes).map_err(|e| DictError::Decode {
        path: path.to_path_buf(),
        offset: e.utf8_error().valid_up_to(),
    })?;

    Ok(match mode {
        ReadMode::Raw => text,
        ReadMode::StripComments => strip_comments(&text),
    })
}

pub fn write(path: &Path, content: &str) -> DictResult<()> {
    let mut file = File::create(path).map_err(|e| DictError::io(path, e))?;
    if is_compressed(path) {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(content.as_bytes())
            .map_err(|e| DictError::io(path, e))?;
        encoder.finish().map_err(|e| DictError::io(path, e))?;
    } else {
        file.write_all(content.as_bytes())
            .map_err(|e| DictError::io(path, e))?;
    }
    Ok(())
}

fn read_bytes(path: &Path) -> DictResult<Vec<u8>> {
    let file = File::open(path).map_err(|e| DictError::io(path, e))?;
    let mut bytes = Vec::new();
    if is_compressed(path) {
        GzDecoder::new(file)
            .read_to_end(&mut bytes)
            .map_err(|e| DictError::io(path, e))?;
    } else {
        let mut file = file;
        file.read_to_end(&mut bytes)
            .map_err(|e| DictError::io(path, e))?;
    }
    Ok(bytes)
}

/// Remove comment lines, keeping every other line (and its line ending) as is.
pub fn strip_comments(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect()
}

/// Replace every match of `pattern` with the literal `replacement`.
///
/// Returns the new content and the number of matches.
pub fn substitute(content: &str, pattern: &Regex, replacement: &str) -> (String, usize) {
    let count = pattern.find_iter(content).count();
    if count == 0 {
        return (content.to_string(), 0);
    }
    let replaced = pattern.replace_all(content, NoExpand(replacement));
    (replaced.into_owned(), count)
}

/// Like [`substitute`], but a pattern that matches nothing is an error.
pub fn substitute_required(
    content: &str,
    pattern: &Regex,
    replacement: &str,
    context: &str,
) -> DictResult<String> {
    let (replaced, count) = substitute(content, pattern, replacement);
    if count == 0 {
        return Err(DictError::MissingPatchOrPattern {
            pattern: pattern.as_str().to_string(),
            context: context.to_string(),
        });
    }
    Ok(replaced)
}
