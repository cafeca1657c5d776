//! wr-dict: access to line-oriented case dictionaries and control files.
//!
//! - store: read/write/substitute with comment stripping and transparent gzip
//! - dictionary: `key value;` parameter lookup and replacement
//! - control_file: `key: value` run specification lookups

pub mod control_file;
pub mod dictionary;
pub mod error;
pub mod store;

pub use control_file::ControlFile;
pub use dictionary::{DictionaryFile, read_parameter, replace_parameter};
pub use error::{DictError, DictResult};
pub use store::{
    ReadMode, is_compressed, logical_name, read, strip_comments, substitute, substitute_required,
    write,
};
