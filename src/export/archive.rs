use std::io::{Cursor, Read, Write};

use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

use crate::foundation::error::EncodeError;

/// One file of an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path inside the archive, `/`-separated.
    pub name: String,
    /// Contents.
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    /// Entry `name` holding `bytes`.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

fn archive_err(e: impl std::fmt::Display) -> EncodeError {
    EncodeError::Archive(e.to_string())
}

/// Deflate `entries` into a zip, in order.
pub fn write_zip(entries: &[ArchiveEntry]) -> Result<Vec<u8>, EncodeError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for entry in entries {
        zip.start_file(entry.name.as_str(), opts)
            .map_err(archive_err)?;
        zip.write_all(&entry.bytes).map_err(archive_err)?;
    }
    let cursor = zip.finish().map_err(archive_err)?;
    Ok(cursor.into_inner())
}

/// Entry names of a zip, in archive order.
pub fn zip_entry_names(bytes: &[u8]) -> Result<Vec<String>, EncodeError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(archive_err)?;
    (0..archive.len())
        .map(|i| {
            archive
                .by_index(i)
                .map(|f| f.name().to_owned())
                .map_err(archive_err)
        })
        .collect()
}

/// Contents of entry `name`.
pub fn read_zip_entry(bytes: &[u8], name: &str) -> Result<Vec<u8>, EncodeError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(archive_err)?;
    let mut file = archive.by_name(name).map_err(archive_err)?;
    let mut out = Vec::new();
    file.read_to_end(&mut out).map_err(archive_err)?;
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/export/archive.rs"]
mod tests;
