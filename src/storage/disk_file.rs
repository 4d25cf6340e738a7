//! Positional file access.
//!
//! `DiskFile` is the only place that touches the file system. Every call
//! names its byte offset explicitly; there is no shared cursor state that
//! callers need to reason about.

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// How to open an inn file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpenMode {
    /// Existing file, no writes
    ReadOnly,
    /// Existing file, read and write
    ReadWrite,
    /// Read and write, creating the file and missing parent directories
    #[default]
    Create,
}

impl OpenMode {
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::ReadOnly)
    }
}

/// An open file addressed by absolute byte positions
#[derive(Debug)]
pub struct DiskFile {
    file: File,
    path: PathBuf,
}

impl DiskFile {
    /// Open a file in the given mode
    pub fn open(path: &Path, mode: OpenMode) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.read(true);
        match mode {
            OpenMode::ReadOnly => {}
            OpenMode::ReadWrite => {
                options.write(true);
            }
            OpenMode::Create => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                options.write(true).create(true).truncate(false);
            }
        }

        let file = options.open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the file in bytes
    pub fn size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Read into `buf` starting at `pos`.
    ///
    /// Returns the number of bytes read, which is short only at end of file.
    pub fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<usize> {
        self.file.seek(SeekFrom::Start(pos))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    /// Write all of `data` starting at `pos`
    pub fn write_at(&mut self, pos: u64, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Truncate or extend the file
    pub fn set_len(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        Ok(())
    }

    /// Flush file data and metadata to the device
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Flush file data to the device
    pub fn sync_data(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_positional_io() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.inn");

        let mut file = DiskFile::open(&path, OpenMode::Create)?;
        assert_eq!(file.size()?, 0);

        file.write_at(10, b"hello")?;
        assert_eq!(file.size()?, 15);

        let mut buf = [0u8; 5];
        assert_eq!(file.read_at(10, &mut buf)?, 5);
        assert_eq!(&buf, b"hello");

        // Short read at end of file
        let mut buf = [0u8; 8];
        assert_eq!(file.read_at(12, &mut buf)?, 3);
        assert_eq!(&buf[..3], b"llo");

        file.set_len(4)?;
        assert_eq!(file.size()?, 4);

        Ok(())
    }

    #[test]
    fn test_create_makes_parent_dirs() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("data.inn");

        let file = DiskFile::open(&path, OpenMode::Create)?;
        assert_eq!(file.path(), path.as_path());
        assert!(path.exists());

        Ok(())
    }

    #[test]
    fn test_read_write_requires_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.inn");

        assert!(DiskFile::open(&path, OpenMode::ReadWrite).is_err());
        assert!(DiskFile::open(&path, OpenMode::ReadOnly).is_err());
    }
}
