//! # Inn Storage
//!
//! A file-backed space manager for persisting variable-length records.
//!
//! ## Architecture
//!
//! - **Types** (`types`): positions, block sizes and room tags as distinct types
//! - **Storage Layer** (`storage`): file and room header codecs, positional file I/O
//! - **Inn Layer** (`inn`): the room allocator (`InnFile`) and room handles (`RoomKey`)
//! - **Pool** (`pool`): free-room reuse on top of the allocator, behind a lock
//!
//! The allocator itself is single threaded and does not track free rooms.
//! `RoomPool` is one way to layer that policy on top.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use inn_storage::{Config, InnFile, RoomType};
//!
//! let mut config = Config::new("records.inn").block_size(64);
//! let mut inn = InnFile::new();
//! inn.open(&mut config)?;
//!
//! let mut key = inn.make_new_room(RoomType::new(0x10), 10)?;
//! inn.write_bytes(&mut key, 0, b"hello")?;
//!
//! let mut out = Vec::new();
//! inn.read_all(&key, &mut out)?;
//!
//! inn.free_room(key, RoomType::FREE)?;
//! ```

pub mod error;
pub mod inn;
pub mod pool;
pub mod storage;
pub mod types;

pub use error::{InnError, Result};
pub use inn::{ExRoomHeader, InnFile, RoomKey, Rooms};
pub use pool::RoomPool;
pub use storage::OpenMode;
pub use types::{BlockCount, BlockSize, RoomPos, RoomType, SizeT, DEFAULT_BLOCK_SIZE};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Inn file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Path to the inn file
    pub path: PathBuf,
    /// Requested block size for a new file (default: 64).
    /// Replaced with the stored block size when an existing file is opened.
    pub block_size: u32,
    /// How to open the file (default: create if missing)
    pub mode: OpenMode,
    /// Whether to sync data after every mutating room operation (default: false)
    pub sync_on_write: bool,
}

impl Config {
    /// Create a new configuration with default settings
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            block_size: DEFAULT_BLOCK_SIZE,
            mode: OpenMode::default(),
            sync_on_write: false,
        }
    }

    /// Set the requested block size
    pub fn block_size(mut self, size: u32) -> Self {
        self.block_size = size;
        self
    }

    /// Set the open mode
    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable sync on write for durability
    pub fn sync_on_write(mut self, enabled: bool) -> Self {
        self.sync_on_write = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_defaults() {
        let config = Config::new("a.inn");
        assert_eq!(config.block_size, 64);
        assert_eq!(config.mode, OpenMode::Create);
        assert!(!config.sync_on_write);
    }

    #[test]
    fn test_config_serde() {
        let config = Config::new("a.inn")
            .block_size(128)
            .mode(OpenMode::ReadOnly);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"blockSize\":128"));
        assert!(json.contains("\"readOnly\""));

        let restored: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.block_size, 128);
        assert_eq!(restored.mode, OpenMode::ReadOnly);
    }

    #[test]
    fn test_three_room_walk() -> Result<()> {
        let dir = tempdir().unwrap();
        let mut config = Config::new(dir.path().join("walk.inn"));
        let mut inn = InnFile::new();
        inn.open(&mut config)?;

        let created: Vec<RoomPos> = (1..=3u8)
            .map(|i| inn.make_new_room(RoomType::new(i), 10 * i as u32).map(|k| k.pos()))
            .collect::<Result<_>>()?;

        let mut visited = Vec::new();
        let mut key = inn.make_room_key(RoomPos::new(inn.header_size() as u64))?;
        while let Some(k) = key {
            visited.push(k.pos());
            key = inn.make_next_room_key(&k)?;
        }
        assert_eq!(visited, created);

        Ok(())
    }

    #[test]
    fn test_read_only_reopen() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ro.inn");
        {
            let mut inn = InnFile::new();
            inn.open(&mut Config::new(&path))?;
            let mut key = inn.make_new_room(RoomType::new(1), 10)?;
            inn.write_bytes(&mut key, 0, b"frozen")?;
        }

        let mut inn = InnFile::new();
        inn.open(&mut Config::new(&path).mode(OpenMode::ReadOnly))?;
        let mut key = inn.make_room_key(RoomPos::NONE)?.unwrap();
        let mut out = Vec::new();
        inn.read_all(&key, &mut out)?;
        assert_eq!(out, b"frozen");

        assert!(inn.write_bytes(&mut key, 0, b"x").is_err());

        Ok(())
    }
}
