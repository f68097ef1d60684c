//! Scoped working directory

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;

use crate::errors::PagesmithError;
use crate::filesys::file::File;
use crate::filesys::path::{ensure_resolves_within, sanitize_relative_path};

/// A temporary directory owned by one publish run.
///
/// The directory and everything in it is removed when the value is dropped,
/// whichever way the run ends.
#[derive(Debug)]
pub struct WorkDir {
    inner: TempDir,
}

impl WorkDir {
    /// Create a fresh working directory, under `parent` when given
    pub fn create(prefix: &str, parent: Option<&Path>) -> Result<Self, PagesmithError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        let inner = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        Ok(Self { inner })
    }

    /// Get the directory path
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Get a file inside the directory, rejecting names that escape it,
    /// either textually or through symbolic links already on disk
    pub fn file(&self, name: &str) -> Result<File, PagesmithError> {
        let relative = sanitize_relative_path(name)?;
        ensure_resolves_within(self.path(), &relative)?;
        Ok(File::new(self.path().join(relative)))
    }

    /// List every regular file below the directory, relative to it, sorted.
    ///
    /// The `.git` directory is skipped.
    pub async fn list_files(&self) -> Result<Vec<PathBuf>, PagesmithError> {
        let root = self.path();
        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    if entry.file_name() != ".git" {
                        pending.push(path);
                    }
                } else if file_type.is_file() {
                    if let Ok(relative) = path.strip_prefix(root) {
                        files.push(relative.to_path_buf());
                    }
                }
            }
        }

        files.sort();
        Ok(files)
    }
}
