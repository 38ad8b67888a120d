//! Enumeration of the members of an unpacked template archive.
//!
//! Member names are the file paths relative to the unpack root, joined with
//! `/` regardless of the host separator, which is exactly how they are named
//! inside the archive. Traversal is sorted by file name within each directory,
//! so a fixed tree always yields the same order.

use std::path::{Component, Path};

use walkdir::WalkDir;

use crate::error::{EmbedError, Result};

/// One named entry of the template archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Archive-internal name, e.g. `word/document.xml`.
    pub name: String,
    /// Raw bytes. May be empty.
    pub content: Vec<u8>,
}

impl Member {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Walk `root` recursively and read every regular file as a [`Member`].
///
/// Directories and symlinks produce no members. Any unreadable file aborts
/// the whole enumeration.
pub fn enumerate(root: &Path) -> Result<Vec<Member>> {
    let mut members = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => EmbedError::Io(io),
            None => EmbedError::Other(anyhow::anyhow!(
                "filesystem loop while walking {}",
                root.display()
            )),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let name = member_name(root, path)?;
        let content = read_member(path)?;

        tracing::debug!(member = %name, bytes = content.len(), "read member");
        members.push(Member { name, content });
    }

    Ok(members)
}

fn read_member(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| EmbedError::MemberRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Archive name of `path` relative to `root`, using `/` separators.
fn member_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| EmbedError::InvalidMemberName(path.to_path_buf()))?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| EmbedError::InvalidMemberName(path.to_path_buf()))?;
                parts.push(part);
            }
            _ => return Err(EmbedError::InvalidMemberName(path.to_path_buf())),
        }
    }
    Ok(parts.join("/"))
}
