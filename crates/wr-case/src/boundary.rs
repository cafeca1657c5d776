//! Patch blocks inside field files.
//!
//! A patch block is a patch name at the start of a line followed by a
//! brace-delimited body:
//!
//! ```text
//!     north
//!     {
//!         type            zeroGradient;
//!     }
//! ```
//!
//! Rewriting replaces the whole block with a canonical layout, so rewriting
//! with the same condition twice gives the same text. Everything outside
//! the matched block is left untouched.

use regex::Regex;
use wr_dict::{DictResult, substitute_required};

const PATCH_INDENT: &str = "    ";
const ENTRY_INDENT: &str = "        ";

pub fn patch_block_pattern(patch: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"(?m)^[ \t]*{}\s*\{{[^{{}}]*\}}", regex::escape(patch)))
}

/// Canonical text of a patch block holding `condition`.
pub fn render_patch_block(patch: &str, condition: &str) -> String {
    let mut block = format!("{PATCH_INDENT}{patch}\n{PATCH_INDENT}{{\n");
    for line in condition.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        block.push_str(ENTRY_INDENT);
        block.push_str(line);
        block.push('\n');
    }
    block.push_str(PATCH_INDENT);
    block.push('}');
    block
}

/// Replace the block of `patch` with `condition`; the patch must exist.
pub fn rewrite_patch(
    content: &str,
    patch: &str,
    condition: &str,
    context: &str,
) -> DictResult<String> {
    let pattern = patch_block_pattern(patch)?;
    substitute_required(content, &pattern, &render_patch_block(patch, condition), context)
}

/// Value of the `type` entry in the block of `patch`.
pub fn read_patch_type(content: &str, patch: &str) -> DictResult<Option<String>> {
    let pattern = patch_block_pattern(patch)?;
    let type_entry = Regex::new(r"(?m)^\s*type\s+([^;]+);")?;
    Ok(pattern
        .find(content)
        .and_then(|block| type_entry.captures(block.as_str()))
        .map(|caps| caps[1].trim().to_string()))
}
