//! Write generated files only when their content changes.
//!
//! Leaving an unchanged file untouched keeps its modification time, so build
//! systems that depend on the generated sources do not rebuild needlessly.
//! Changed files are staged in a sibling temporary file first and renamed
//! into place on commit, so related files can be updated together.

use std::fs::Permissions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{EmbedError, Result};

/// What [`write_if_changed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Existing content was identical; the file was not touched.
    Unchanged,
    /// The file was created or overwritten.
    Written,
}

impl WriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Written => "written",
        }
    }
}

/// A generated file prepared by [`stage_if_changed`] but not yet in place.
///
/// Dropping a pending write without committing it removes the staged copy
/// and leaves the target untouched.
#[derive(Debug)]
pub enum StagedWrite {
    /// The target already holds the text.
    Unchanged(PathBuf),
    /// The text sits in a sibling temporary file.
    Pending { path: PathBuf, staged: NamedTempFile },
}

impl StagedWrite {
    pub fn path(&self) -> &Path {
        match self {
            Self::Unchanged(path) | Self::Pending { path, .. } => path,
        }
    }

    /// Move the staged copy over the target.
    pub fn commit(self) -> Result<WriteOutcome> {
        match self {
            Self::Unchanged(_) => Ok(WriteOutcome::Unchanged),
            Self::Pending { path, staged } => {
                staged.persist(&path).map_err(|e| EmbedError::OutputWrite {
                    path: path.clone(),
                    source: e.error,
                })?;
                tracing::debug!(path = %path.display(), "wrote generated file");
                Ok(WriteOutcome::Written)
            }
        }
    }
}

/// Prepare `text` for `path` unless the file already holds exactly `text`.
///
/// An unreadable or missing file counts as having no prior content. Parent
/// directories are created only when a write is needed. The target itself
/// is not modified until [`StagedWrite::commit`].
pub fn stage_if_changed(text: &str, path: &Path) -> Result<StagedWrite> {
    match std::fs::read(path) {
        Ok(existing) if existing == text.as_bytes() => {
            tracing::debug!(path = %path.display(), "generated file unchanged");
            return Ok(StagedWrite::Unchanged(path.to_path_buf()));
        }
        Ok(_) => {}
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no prior generated file");
        }
    }

    let to_output_error = |source| EmbedError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };
    if path.is_dir() {
        return Err(to_output_error(std::io::Error::other(
            "a directory exists at this path",
        )));
    }

    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(to_output_error)?;
            parent
        }
        None => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(parent).map_err(to_output_error)?;
    staged.write_all(text.as_bytes()).map_err(to_output_error)?;
    staged.flush().map_err(to_output_error)?;
    if let Some(permissions) = target_permissions(path) {
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(to_output_error)?;
    }

    tracing::debug!(
        path = %path.display(),
        staged = %staged.path().display(),
        bytes = text.len(),
        "staged generated file"
    );
    Ok(StagedWrite::Pending {
        path: path.to_path_buf(),
        staged,
    })
}

/// Permissions for the generated file: those of the file it replaces, or a
/// plain readable file. Temporary files start out private.
fn target_permissions(path: &Path) -> Option<Permissions> {
    if let Ok(meta) = std::fs::metadata(path) {
        return Some(meta.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Stage and commit in one step.
pub fn write_if_changed(text: &str, path: &Path) -> Result<WriteOutcome> {
    stage_if_changed(text, path)?.commit()
}
