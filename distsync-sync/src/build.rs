//! Build output handed over by the host build tool.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use distsync_core::keys;

use crate::error::{io_err, SyncError};

/// Files produced by one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// Absolute directory every filename is relative to.
    pub output_dir: PathBuf,
    /// Relative, `/`-separated filenames.
    pub files: Vec<String>,
}

impl BuildOutput {
    pub fn new<I, S>(output_dir: impl Into<PathBuf>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            output_dir: output_dir.into(),
            files: files
                .into_iter()
                .map(|f| keys::normalize_filename(f.as_ref()))
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    /// Collect every regular file below `dir`, sorted.
    pub fn scan(dir: &Path) -> Result<Self, SyncError> {
        if !dir.is_dir() {
            return Err(SyncError::OutputDirMissing(dir.to_path_buf()));
        }
        let root = fs::canonicalize(dir).map_err(|e| io_err(dir, e))?;
        let files = collect_files(&root)?;
        Ok(Self::new(root, files))
    }

    /// Absolute path of `filename` on disk.
    pub fn local_path(&self, filename: &str) -> PathBuf {
        filename
            .split('/')
            .fold(self.output_dir.clone(), |path, segment| path.join(segment))
    }

    /// Split into files that will be uploaded and markup files that will not.
    pub fn partition(&self) -> (Vec<&str>, Vec<&str>) {
        self.files
            .iter()
            .map(String::as_str)
            .partition(|f| !keys::is_markup(f))
    }
}

/// Breadth-first walk returning paths relative to `root`.
fn collect_files(root: &Path) -> Result<Vec<String>, SyncError> {
    let mut dirs = vec![root.to_path_buf()];
    let mut files = Vec::new();
    let mut cursor = 0;
    while cursor < dirs.len() {
        let current = dirs[cursor].clone();
        cursor += 1;
        let entries = match fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => return Err(io_err(&current, err)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&current, e))?;
            let path = entry.path();
            let ty = entry.file_type().map_err(|e| io_err(&path, e))?;
            // Linked files are uploaded; linked directories are not descended.
            if ty.is_dir() {
                dirs.push(path);
            } else if ty.is_file() || (ty.is_symlink() && path.is_file()) {
                if let Ok(relative) = path.strip_prefix(root) {
                    let name = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect::<Vec<_>>()
                        .join("/");
                    files.push(name);
                }
            }
        }
    }
    files.sort();
    Ok(files)
}
