//! Archive of result fields from batch runs.
//!
//! Layout: `<parent>/<name>/<key>/<field>[.gz]`. Files are gzipped after
//! they are placed when compression is on; lookups accept either variant
//! and always hand back the plain file.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::{Span, debug, info};

use crate::{ArchiveError, ArchiveResult};

const GZ_SUFFIX: &str = ".gz";

/// How archived files reach a runtime directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    #[default]
    Symlink,
    Copy,
}

#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
    compress: bool,
    span: Span,
}

fn is_artifact(name: &str) -> bool {
    name.contains(".bak") || name.contains('~') || name.starts_with('#')
}

fn gz_name(name: &str) -> String {
    format!("{name}{GZ_SUFFIX}")
}

/// `U.gz` -> `U`
fn logical_name(name: &str) -> &str {
    name.strip_suffix(GZ_SUFFIX).unwrap_or(name)
}

/// Split like `base.ext`; a leading dot is part of the base.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i..]),
        _ => (name, ""),
    }
}

fn gzip_in_place(path: &Path) -> ArchiveResult<PathBuf> {
    let target = path.with_file_name(gz_name(
        &path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
    ));
    let mut input = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
    let output = File::create(&target).map_err(|e| ArchiveError::io(&target, e))?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut input, &mut encoder).map_err(|e| ArchiveError::io(&target, e))?;
    encoder.finish().map_err(|e| ArchiveError::io(&target, e))?;
    fs::remove_file(path).map_err(|e| ArchiveError::io(path, e))?;
    Ok(target)
}

fn gunzip_to(src: &Path, dest: &Path) -> ArchiveResult<()> {
    let input = File::open(src).map_err(|e| ArchiveError::io(src, e))?;
    let mut output = File::create(dest).map_err(|e| ArchiveError::io(dest, e))?;
    io::copy(&mut GzDecoder::new(input), &mut output).map_err(|e| ArchiveError::io(src, e))?;
    Ok(())
}

impl Archive {
    /// Open (creating if needed) the archive `name` inside `parent`.
    pub fn open(parent: &Path, name: &str, compress: bool, span: Span) -> ArchiveResult<Self> {
        if !parent.is_dir() {
            return Err(ArchiveError::ParentMissing {
                path: parent.to_path_buf(),
            });
        }
        let root = parent.join(name);
        fs::create_dir_all(&root).map_err(|e| ArchiveError::io(&root, e))?;
        debug!(parent: &span, archive = %root.display(), "archive opened");
        Ok(Self {
            root,
            compress,
            span,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    fn dir(&self, subdir: Option<&str>) -> PathBuf {
        match subdir {
            Some(d) => self.root.join(d),
            None => self.root.clone(),
        }
    }

    /// Archived path of `file_name`, plain first and then `.gz`.
    fn locate(&self, subdir: Option<&str>, file_name: &str) -> Option<PathBuf> {
        let dir = self.dir(subdir);
        let plain = dir.join(file_name);
        if plain.is_file() {
            return Some(plain);
        }
        let gz = dir.join(gz_name(file_name));
        gz.is_file().then_some(gz)
    }

    fn miss(&self, subdir: Option<&str>, file_name: &str) -> ArchiveError {
        ArchiveError::ArchiveMiss {
            name: file_name.to_string(),
            path: self.dir(subdir),
        }
    }

    /// Copy `source` into the archive, under `subdir` when given.
    ///
    /// Returns the path of the stored file.
    pub fn add_file(&self, source: &Path, subdir: Option<&str>) -> ArchiveResult<PathBuf> {
        let Some(name) = source.file_name().filter(|_| source.is_file()) else {
            return Err(ArchiveError::SourceMissing {
                path: source.to_path_buf(),
            });
        };
        let dir = self.dir(subdir);
        fs::create_dir_all(&dir).map_err(|e| ArchiveError::io(&dir, e))?;

        let stored = dir.join(name);
        fs::copy(source, &stored).map_err(|e| ArchiveError::io(source, e))?;

        let already_gz = name.to_string_lossy().ends_with(GZ_SUFFIX);
        if self.compress && !already_gz {
            return gzip_in_place(&stored);
        }
        Ok(stored)
    }

    /// Write the archived `file_name` to `dest`, decompressing a `.gz`
    /// variant so that `dest` always holds the plain content.
    pub fn get_file(
        &self,
        dest: &Path,
        file_name: &str,
        subdir: Option<&str>,
    ) -> ArchiveResult<()> {
        let Some(src) = self.locate(subdir, file_name) else {
            return Err(self.miss(subdir, file_name));
        };
        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
            && !parent.is_dir()
        {
            return Err(ArchiveError::DestinationMissing {
                path: parent.to_path_buf(),
            });
        }

        let archived_gz = src.to_string_lossy().ends_with(GZ_SUFFIX);
        if archived_gz && !file_name.ends_with(GZ_SUFFIX) {
            gunzip_to(&src, dest)
        } else {
            fs::copy(&src, dest)
                .map(|_| ())
                .map_err(|e| ArchiveError::io(&src, e))
        }
    }

    /// Whether a directory, a file or a file inside a directory exists.
    pub fn contains(&self, subdir: Option<&str>, file_name: Option<&str>) -> ArchiveResult<bool> {
        match (subdir, file_name) {
            (None, None) => Err(ArchiveError::InvalidQuery),
            (Some(d), None) => Ok(self.root.join(d).is_dir()),
            (d, Some(f)) => Ok(self.locate(d, f).is_some()),
        }
    }

    /// Copy files of `subdir` into `dest_dir` under their plain names.
    ///
    /// With `file_names` unset every file of `subdir` is restored. All
    /// requested files are checked before anything is copied.
    pub fn restore(
        &self,
        subdir: &str,
        dest_dir: &Path,
        file_names: Option<&[String]>,
    ) -> ArchiveResult<Vec<String>> {
        let names: Vec<String> = match file_names {
            Some(names) => names.to_vec(),
            None => self
                .list_files_under(subdir)?
                .iter()
                .map(|n| logical_name(n).to_string())
                .collect(),
        };
        if let Some(missing) = names.iter().find(|n| self.locate(Some(subdir), n).is_none()) {
            return Err(self.miss(Some(subdir), missing));
        }
        if !dest_dir.is_dir() {
            return Err(ArchiveError::DestinationMissing {
                path: dest_dir.to_path_buf(),
            });
        }

        for name in &names {
            self.get_file(&dest_dir.join(logical_name(name)), name, Some(subdir))?;
        }
        debug!(parent: &self.span, key = subdir, files = ?names, "restored archived fields");
        Ok(names)
    }

    /// Stored file names under `subdir`, sorted, editor artifacts skipped.
    pub fn list_files_under(&self, subdir: &str) -> ArchiveResult<Vec<String>> {
        let dir = self.root.join(subdir);
        if !dir.is_dir() {
            return Err(ArchiveError::ArchiveMiss {
                name: subdir.to_string(),
                path: self.root.clone(),
            });
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| ArchiveError::io(&dir, e))? {
            let entry = entry.map_err(|e| ArchiveError::io(&dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_file() && !is_artifact(&name) {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn list_dirs(&self) -> ArchiveResult<Vec<String>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| ArchiveError::io(&self.root, e))? {
            let entry = entry.map_err(|e| ArchiveError::io(&self.root, e))?;
            if entry.path().is_dir() {
                dirs.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Make every archived `<dir>/<base><ext>` available as
    /// `<dest>/<base>_<dir><ext>`. Returns the number of files exported.
    pub fn export_to_runtime(&self, dest: &Path, mode: ExportMode) -> ArchiveResult<usize> {
        if !dest.is_dir() {
            return Err(ArchiveError::DestinationMissing {
                path: dest.to_path_buf(),
            });
        }

        let mut count = 0;
        for dir in self.list_dirs()? {
            for file in self.list_files_under(&dir)? {
                let (base, ext) = split_extension(&file);
                let src = self.root.join(&dir).join(&file);
                let dst = dest.join(format!("{base}_{dir}{ext}"));
                match mode {
                    ExportMode::Symlink => link(&src, &dst)?,
                    ExportMode::Copy => {
                        fs::copy(&src, &dst).map_err(|e| ArchiveError::io(&src, e))?;
                    }
                }
                count += 1;
            }
        }
        info!(
            parent: &self.span,
            destination = %dest.display(),
            files = count,
            "transferred archived fields to destination directory"
        );
        Ok(count)
    }
}

#[cfg(unix)]
fn link(src: &Path, dst: &Path) -> ArchiveResult<()> {
    std::os::unix::fs::symlink(src, dst).map_err(|e| ArchiveError::io(dst, e))
}

#[cfg(not(unix))]
fn link(src: &Path, dst: &Path) -> ArchiveResult<()> {
    fs::copy(src, dst)
        .map(|_| ())
        .map_err(|e| ArchiveError::io(src, e))
}
