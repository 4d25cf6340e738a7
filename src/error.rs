//! Error types for the inn storage engine.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::RoomPos;

/// Result type alias for inn operations
pub type Result<T> = std::result::Result<T, InnError>;

/// Errors that can occur in the inn storage engine
#[derive(Error, Debug)]
pub enum InnError {
    /// I/O error from the underlying file system
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File header magic, header size or block size is not what we expect
    #[error("Invalid inn file format: {0}")]
    Format(String),

    /// The engine already holds an open file
    #[error("Inn file already open: {}", .0.display())]
    AlreadyOpen(PathBuf),

    /// The engine has no open file
    #[error("Inn file not open: {0}")]
    NotOpen(&'static str),

    /// A room position is misaligned, out of range, or points at a broken room
    #[error("Bad room position {pos}: {msg}")]
    RoomPos { pos: RoomPos, msg: String },

    /// The room cannot hold the requested data
    #[error("Room {pos} too small: {msg} (need {needed} bytes, room size {room_size})")]
    RoomSize {
        pos: RoomPos,
        needed: u64,
        room_size: u32,
        msg: &'static str,
    },

    /// The caller asked for more bytes than the source holds
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl InnError {
    /// Create a file format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create a room position error
    pub fn room_pos(pos: RoomPos, msg: impl Into<String>) -> Self {
        Self::RoomPos {
            pos,
            msg: msg.into(),
        }
    }

    /// Create a room size error
    pub fn room_size(pos: RoomPos, needed: u64, room_size: u32, msg: &'static str) -> Self {
        Self::RoomSize {
            pos,
            needed,
            room_size,
            msg,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for errors that leave the room untouched because of a bad size request
    pub fn is_room_size(&self) -> bool {
        matches!(self, Self::RoomSize { .. })
    }

    /// True for position errors
    pub fn is_room_pos(&self) -> bool {
        matches!(self, Self::RoomPos { .. })
    }
}
