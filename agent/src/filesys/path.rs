//! Relative path validation
//!
//! Names coming from callers (attachments) or from the agent (generated
//! files) are joined onto the working directory. They must stay inside it.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::errors::PagesmithError;

/// Validate `name` as a path relative to, and contained in, some root.
///
/// Rejects empty names, absolute paths, drive prefixes and any `..`
/// component. `.` components are dropped.
pub fn sanitize_relative_path(name: &str) -> Result<PathBuf, PagesmithError> {
    if name.trim().is_empty() {
        return Err(PagesmithError::materialization(name, "empty filename"));
    }
    if name.contains('\0') {
        return Err(PagesmithError::materialization(name, "filename contains NUL"));
    }

    let mut clean = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(PagesmithError::materialization(
                    name,
                    "parent directory references are not allowed",
                ));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PagesmithError::materialization(
                    name,
                    "absolute paths are not allowed",
                ));
            }
        }
    }

    if clean.as_os_str().is_empty() {
        return Err(PagesmithError::materialization(name, "empty filename"));
    }
    // .git is owned by version control, never by generated content
    if clean.components().next() == Some(Component::Normal(".git".as_ref())) {
        return Err(PagesmithError::materialization(
            name,
            "writing into .git is not allowed",
        ));
    }
    Ok(clean)
}

/// Check that `relative` (already sanitized) resolves inside `root` once
/// symbolic links on disk are followed.
///
/// The deepest existing part of the path is canonicalized and compared with
/// the canonical root. A dangling link is rejected, since writing through it
/// would create its target wherever it points.
pub fn ensure_resolves_within(root: &Path, relative: &Path) -> Result<(), PagesmithError> {
    let name = relative.to_string_lossy();
    let root = root.canonicalize()?;

    let mut existing = root.join(relative);
    while fs::symlink_metadata(&existing).is_err() {
        if !existing.pop() {
            break;
        }
    }

    let resolved = existing.canonicalize().map_err(|_| {
        PagesmithError::materialization(&*name, "path goes through a dangling symbolic link")
    })?;
    if !resolved.starts_with(&root) {
        return Err(PagesmithError::materialization(
            &*name,
            "path resolves outside the working directory",
        ));
    }
    Ok(())
}
