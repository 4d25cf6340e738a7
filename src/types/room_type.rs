//! Room type tag.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One-byte room tag stored in every room header.
///
/// The engine does not interpret the value. The constants below are the
/// shared conventions that callers build on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomType(pub u8);

impl RoomType {
    /// A released room. Still visible to scans and reusable.
    pub const FREE: RoomType = RoomType(0x7f);

    /// Flag bit: the room's payload starts with a `NextRoomPos` field
    pub const HAS_NEXT_ROOM_POS: RoomType = RoomType(0x80);

    /// A released room linked into a caller-managed free chain
    pub const FREE_LIST: RoomType = RoomType(0x7f | 0x80);

    /// First room of a file holding caller metadata (e.g. a table catalog)
    pub const EX_FILE_HEADER: RoomType = RoomType(0x80 | 0x01);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Check whether the `HasNextRoomPos` flag is set
    pub const fn has_next_room_pos(self) -> bool {
        self.0 & Self::HAS_NEXT_ROOM_POS.0 != 0
    }

    /// Same tag with the `HasNextRoomPos` flag set
    pub const fn with_next_room_pos(self) -> Self {
        Self(self.0 | Self::HAS_NEXT_ROOM_POS.0)
    }

    /// True for `FREE` and `FREE_LIST`
    pub const fn is_free(self) -> bool {
        self.0 & !Self::HAS_NEXT_ROOM_POS.0 == Self::FREE.0
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl From<u8> for RoomType {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_values() {
        assert_eq!(RoomType::FREE.value(), 0x7f);
        assert_eq!(RoomType::FREE_LIST.value(), 0xff);
        assert_eq!(RoomType::EX_FILE_HEADER.value(), 0x81);
    }

    #[test]
    fn test_flags() {
        assert!(!RoomType::FREE.has_next_room_pos());
        assert!(RoomType::FREE_LIST.has_next_room_pos());
        assert!(RoomType::EX_FILE_HEADER.has_next_room_pos());
        assert_eq!(RoomType::FREE.with_next_room_pos(), RoomType::FREE_LIST);

        assert!(RoomType::FREE.is_free());
        assert!(RoomType::FREE_LIST.is_free());
        assert!(!RoomType::new(0x10).is_free());
        assert!(!RoomType::EX_FILE_HEADER.is_free());
    }

    #[test]
    fn test_display() {
        assert_eq!(RoomType::new(0x10).to_string(), "0x10");
    }
}
