//! Room handle.

use crate::storage::RoomHeader;
use crate::types::{RoomPos, RoomType, SizeT, ROOM_HEADER_SIZE};

/// Caller-owned handle to one room.
///
/// A `RoomKey` always names a real room; "no room" is expressed as
/// `Option<RoomKey>`. Keys are move-only and carry no reference back to the
/// engine, so several keys may describe the same position. Keeping them
/// consistent with each other is up to the caller.
///
/// Dropping a key leaves the room untouched on disk. `InnFile::make_room_key`
/// at the same position rebuilds an equal key.
#[derive(Debug, PartialEq, Eq)]
pub struct RoomKey {
    pub(crate) pos: RoomPos,
    pub(crate) room_size: SizeT,
    pub(crate) data_size: SizeT,
    pub(crate) current_type: RoomType,
    pub(crate) pending_type: RoomType,
    note: u16,
    note4: u32,
}

impl RoomKey {
    pub(crate) fn from_header(pos: RoomPos, room_size: SizeT, header: &RoomHeader) -> Self {
        Self {
            pos,
            room_size,
            data_size: header.data_size,
            current_type: header.room_type,
            pending_type: header.room_type,
            note: 0,
            note4: 0,
        }
    }

    /// Position of this room's header in the file
    pub fn pos(&self) -> RoomPos {
        self.pos
    }

    /// Position of the room physically following this one
    pub fn next_room_pos(&self) -> RoomPos {
        RoomPos::new(self.pos.value() + self.room_size as u64 + ROOM_HEADER_SIZE as u64)
    }

    /// Room type as stored on disk
    pub fn current_room_type(&self) -> RoomType {
        self.current_type
    }

    /// Room type written by the next `write`, `rewrite` or `reduce`
    pub fn pending_room_type(&self) -> RoomType {
        self.pending_type
    }

    pub fn set_pending_room_type(&mut self, room_type: RoomType) {
        self.pending_type = room_type;
    }

    /// Caller annotation, never persisted
    pub fn note(&self) -> u16 {
        self.note
    }

    pub fn set_note(&mut self, note: u16) {
        self.note = note;
    }

    /// Second caller annotation, independent of `note`, never persisted
    pub fn note4(&self) -> u32 {
        self.note4
    }

    pub fn set_note4(&mut self, note4: u32) {
        self.note4 = note4;
    }

    /// Bytes of valid payload
    pub fn data_size(&self) -> SizeT {
        self.data_size
    }

    /// Payload capacity, excluding the room header
    pub fn room_size(&self) -> SizeT {
        self.room_size
    }

    /// Unused capacity past the valid payload
    pub fn remain_size(&self) -> SizeT {
        self.room_size - self.data_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockCount;

    fn key() -> RoomKey {
        let header = RoomHeader {
            block_count: BlockCount::new(2),
            room_type: RoomType::new(0x10),
            data_size: 20,
        };
        RoomKey::from_header(RoomPos::new(64), 119, &header)
    }

    #[test]
    fn test_accessors() {
        let key = key();
        assert_eq!(key.pos(), RoomPos::new(64));
        assert_eq!(key.room_size(), 119);
        assert_eq!(key.data_size(), 20);
        assert_eq!(key.remain_size(), 99);
        assert_eq!(key.current_room_type(), RoomType::new(0x10));
        assert_eq!(key.pending_room_type(), RoomType::new(0x10));
        assert_eq!(key.next_room_pos(), RoomPos::new(64 + 128));
    }

    #[test]
    fn test_notes_are_independent() {
        let mut key = key();
        key.set_note(7);
        key.set_note4(0xDEAD_BEEF);
        assert_eq!(key.note(), 7);
        assert_eq!(key.note4(), 0xDEAD_BEEF);

        key.set_note(0);
        assert_eq!(key.note4(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_pending_type() {
        let mut key = key();
        key.set_pending_room_type(RoomType::FREE);
        assert_eq!(key.pending_room_type(), RoomType::FREE);
        assert_eq!(key.current_room_type(), RoomType::new(0x10));
    }
}
