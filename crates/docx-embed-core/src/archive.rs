//! Archive-writer collaborator and zip helpers.
//!
//! Generated C code calls a `write_member(handle, bytes, length, name)`
//! function supplied by the downstream library. [`ArchiveWriter`] is the same
//! contract on the Rust side, which lets a [`crate::codegen::ReassemblyPlan`]
//! be replayed and checked without compiling the generated sources.

use std::io::{Read, Seek, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::members::Member;

/// Writes named members into an output archive.
pub trait ArchiveWriter {
    type Error;

    /// Write one member. An error aborts the re-assembly.
    fn write_member(&mut self, name: &str, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// [`ArchiveWriter`] over a [`zip::ZipWriter`], storing entries uncompressed.
pub struct ZipArchiveWriter<W: Write + Seek> {
    inner: ZipWriter<W>,
}

impl<W: Write + Seek> ZipArchiveWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            inner: ZipWriter::new(sink),
        }
    }

    /// Write the central directory and return the underlying sink.
    pub fn finish(self) -> zip::result::ZipResult<W> {
        self.inner.finish()
    }
}

impl<W: Write + Seek> ArchiveWriter for ZipArchiveWriter<W> {
    type Error = zip::result::ZipError;

    fn write_member(&mut self, name: &str, bytes: &[u8]) -> Result<(), Self::Error> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        self.inner.start_file(name, options)?;
        self.inner.write_all(bytes)?;
        Ok(())
    }
}

/// Read every file member of a zip archive, in central-directory order.
pub fn read_archive_members<R: Read + Seek>(reader: R) -> zip::result::ZipResult<Vec<Member>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut members = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let mut content = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut content)?;
        members.push(Member::new(file.name(), content));
    }

    Ok(members)
}
