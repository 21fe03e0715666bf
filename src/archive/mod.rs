//! ZIP container access.
//!
//! A `.kra` file is a ZIP archive with `maindoc.xml` at its root and one
//! binary blob per paint layer under `{documentName}/layers/`. The document
//! parser only needs byte extraction by entry name, so that capability is a
//! trait seam: [`BlobSource`]. [`KraArchive`] is the on-disk implementation;
//! tests substitute an in-memory map.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::util::{Error, Result};

/// Manifest entry that every KRA archive must carry at its root.
pub const MAIN_DOC: &str = "maindoc.xml";

/// Byte-extraction interface over a layered-image container.
pub trait BlobSource {
    /// Check whether a named entry exists without extracting it.
    fn has_entry(&mut self, path: &str) -> bool;

    /// Extract the full contents of a named entry.
    fn entry(&mut self, path: &str) -> Result<Vec<u8>>;
}

/// A KRA file opened for reading.
pub struct KraArchive {
    zip: ZipArchive<File>,
    path: PathBuf,
}

impl KraArchive {
    /// Open a `.kra` file and verify it carries a manifest.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let zip = ZipArchive::new(file).map_err(|e| match e {
            ZipError::InvalidArchive(_) | ZipError::UnsupportedArchive(_) => {
                Error::NotAnArchive(path.to_path_buf())
            }
            other => Error::Zip(other),
        })?;

        let mut archive = Self {
            zip,
            path: path.to_path_buf(),
        };
        if !archive.has_entry(MAIN_DOC) {
            return Err(Error::EntryNotFound(MAIN_DOC.to_string()));
        }
        Ok(archive)
    }

    /// Path this archive was opened from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries in the container.
    #[inline]
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.zip.is_empty()
    }
}

impl BlobSource for KraArchive {
    fn has_entry(&mut self, path: &str) -> bool {
        self.zip.index_for_name(path).is_some()
    }

    fn entry(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut entry = self.zip.by_name(path).map_err(|e| match e {
            ZipError::FileNotFound => Error::EntryNotFound(path.to_string()),
            other => Error::Zip(other),
        })?;
        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_open_and_extract() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.kra");
        write_archive(&path, &[(MAIN_DOC, b"<DOC/>"), ("Sample/layers/layer2", b"abc")]);

        let mut archive = KraArchive::open(&path).unwrap();
        assert!(archive.has_entry("Sample/layers/layer2"));
        assert!(!archive.has_entry("Sample/layers/layer3"));
        assert_eq!(archive.entry(MAIN_DOC).unwrap(), b"<DOC/>");
        assert_eq!(archive.entry("Sample/layers/layer2").unwrap(), b"abc");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = KraArchive::open(dir.path().join("nope.kra"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.kra");
        std::fs::write(&path, b"definitely not a zip archive").unwrap();
        let result = KraArchive::open(&path);
        assert!(matches!(result, Err(Error::NotAnArchive(_))));
    }

    #[test]
    fn test_manifest_required() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.kra");
        write_archive(&path, &[("unrelated.txt", b"hi")]);
        let result = KraArchive::open(&path);
        assert!(matches!(result, Err(Error::EntryNotFound(_))));
    }

    #[test]
    fn test_missing_entry_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.kra");
        write_archive(&path, &[(MAIN_DOC, b"<DOC/>")]);

        let mut archive = KraArchive::open(&path).unwrap();
        let result = archive.entry("Sample/layers/missing");
        assert!(matches!(result, Err(Error::EntryNotFound(_))));
    }
}
