//! Directory operations

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::errors::PagesmithError;
use crate::models::task::GeneratedFiles;

/// A directory wrapper with path
#[derive(Debug, Clone)]
pub struct Dir {
    path: PathBuf,
}

impl Dir {
    /// Create a new directory reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the directory exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Read every top-level regular file as text, keyed by file name.
    ///
    /// Subdirectories are ignored. Files that are not valid UTF-8 fail the read.
    pub async fn read_text_files(&self) -> Result<GeneratedFiles, PagesmithError> {
        if !self.exists().await {
            return Err(PagesmithError::ConfigError(format!(
                "directory not found: {}",
                self.path.display()
            )));
        }

        let mut files = GeneratedFiles::new();
        let mut entries = fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let contents = fs::read_to_string(entry.path()).await?;
            files.insert(name, contents);
        }

        Ok(files)
    }
}
