//! Template archive extraction.
//!
//! Two collaborators implement [`Unpacker`]: [`LibraryUnpacker`] extracts
//! in-process with the `zip` crate and is the default, [`UnzipCommand`]
//! runs the system `unzip` binary.

use std::fs::File;
use std::path::Path;
use std::process::Command;

use zip::ZipArchive;

use crate::config::UnpackerKind;
use crate::error::{EmbedError, Result};

/// Extracts every member of an archive into a directory, preserving
/// relative paths.
pub trait Unpacker {
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;

    /// Extract `archive` into `dest`. `dest` does not exist yet.
    fn unpack(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// In-process extraction via [`zip::ZipArchive::extract`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LibraryUnpacker;

impl Unpacker for LibraryUnpacker {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn unpack(&self, archive: &Path, dest: &Path) -> Result<()> {
        let to_archive_error = |source| EmbedError::Archive {
            path: archive.to_path_buf(),
            source,
        };
        let file = File::open(archive)?;
        let mut zip = ZipArchive::new(file).map_err(to_archive_error)?;
        std::fs::create_dir_all(dest)?;
        zip.extract(dest).map_err(to_archive_error)?;
        Ok(())
    }
}

/// Extraction by running `unzip -q -d <dest> <archive>`.
#[derive(Debug, Clone)]
pub struct UnzipCommand {
    binary: String,
}

impl UnzipCommand {
    /// Create a new wrapper, verifying `unzip` is installed.
    pub fn new() -> Result<Self> {
        which::which("unzip").map_err(|_| EmbedError::MissingTool {
            name: "unzip".into(),
            install: "install the Info-ZIP `unzip` package".into(),
        })?;
        Ok(Self {
            binary: "unzip".into(),
        })
    }
}

impl Unpacker for UnzipCommand {
    fn name(&self) -> &'static str {
        "unzip"
    }

    fn unpack(&self, archive: &Path, dest: &Path) -> Result<()> {
        let output = Command::new(&self.binary)
            .arg("-q")
            .arg("-d")
            .arg(dest)
            .arg(archive)
            .output();

        match output {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(EmbedError::ExternalTool {
                tool: self.binary.clone(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EmbedError::MissingTool {
                name: self.binary.clone(),
                install: "install the Info-ZIP `unzip` package".into(),
            }),
            Err(e) => Err(EmbedError::ExternalTool {
                tool: self.binary.clone(),
                stderr: e.to_string(),
            }),
        }
    }
}

/// Create the unpacker selected in the configuration.
pub fn create_unpacker(kind: UnpackerKind) -> Result<Box<dyn Unpacker>> {
    match kind {
        UnpackerKind::Library => Ok(Box::new(LibraryUnpacker)),
        UnpackerKind::Unzip => Ok(Box::new(UnzipCommand::new()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveWriter, ZipArchiveWriter};

    fn write_zip(path: &Path, members: &[(&str, &[u8])]) {
        let mut writer = ZipArchiveWriter::new(File::create(path).unwrap());
        for (name, bytes) in members {
            writer.write_member(name, bytes).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_library_unpacker_preserves_paths() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("template.docx");
        write_zip(
            &archive,
            &[
                ("[Content_Types].xml", &b"<Types/>"[..]),
                ("word/document.xml", &b"<w:document/>"[..]),
            ],
        );

        let dest = dir.path().join("template.docx.dir");
        LibraryUnpacker.unpack(&archive, &dest).unwrap();

        assert_eq!(std::fs::read(dest.join("[Content_Types].xml")).unwrap(), b"<Types/>");
        assert_eq!(
            std::fs::read(dest.join("word/document.xml")).unwrap(),
            b"<w:document/>"
        );
    }

    #[test]
    fn test_library_unpacker_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.docx");
        std::fs::write(&archive, b"definitely not a zip").unwrap();

        let result = LibraryUnpacker.unpack(&archive, &dir.path().join("out"));
        assert!(matches!(result, Err(EmbedError::Archive { .. })));
    }

    #[test]
    fn test_library_unpacker_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let result = LibraryUnpacker.unpack(&dir.path().join("nope.docx"), &dir.path().join("out"));
        assert!(matches!(result, Err(EmbedError::Io(_))));
    }

    #[test]
    fn test_unzip_command_reports_failure() {
        // Only meaningful where unzip is installed.
        let Ok(unzip) = UnzipCommand::new() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.docx");
        std::fs::write(&archive, b"definitely not a zip").unwrap();

        let result = unzip.unpack(&archive, &dir.path().join("out"));
        assert!(matches!(result, Err(EmbedError::ExternalTool { .. })));
    }

    #[test]
    fn test_create_unpacker_library() {
        let unpacker = create_unpacker(UnpackerKind::Library).unwrap();
        assert_eq!(unpacker.name(), "zip");
    }
}
