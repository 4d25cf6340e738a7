//! Room position type.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{BlockSize, SizeT, ROOM_HEADER_SIZE};

/// Byte offset of a room header in the inn file.
///
/// Position 0 is the file header and never a room, so it doubles as
/// "no room" in embedded `NextRoomPos` fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomPos(pub u64);

impl RoomPos {
    /// The "no room" position
    pub const NONE: RoomPos = RoomPos(0);

    /// Create a new room position
    pub const fn new(pos: u64) -> Self {
        Self(pos)
    }

    /// Get the raw byte offset
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Check if this is a non-zero position
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }

    /// True if the position sits on a block boundary past the file header
    pub fn is_aligned(self, header_size: SizeT, block_size: BlockSize) -> bool {
        let header_size = header_size as u64;
        self.0 >= header_size && (self.0 - header_size) % block_size.as_u64() == 0
    }

    /// Byte offset of payload byte `offset` in this room
    pub const fn payload_offset(self, offset: SizeT) -> u64 {
        self.0 + ROOM_HEADER_SIZE as u64 + offset as u64
    }

    /// Decode a big-endian `NextRoomPos` field, 0 meaning none
    pub fn from_be_bytes(bytes: [u8; 8]) -> Option<Self> {
        let pos = RoomPos(u64::from_be_bytes(bytes));
        pos.is_some().then_some(pos)
    }

    /// Encode as a big-endian `NextRoomPos` field
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for RoomPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RoomPos {
    fn from(pos: u64) -> Self {
        Self(pos)
    }
}

impl From<RoomPos> for u64 {
    fn from(pos: RoomPos) -> Self {
        pos.0
    }
}
