//! Room header structure.
//!
//! Every room starts with a fixed 9-byte header. Fixed-width fields keep the
//! header size stable so rooms never move, and let a reader sanity check the
//! values it loads.

use crate::types::{BlockCount, RoomType, SizeT, ROOM_HEADER_SIZE};

/// Room header size in bytes
pub const ROOM_HEADER_LEN: usize = ROOM_HEADER_SIZE as usize;

/// Offset of the part that changes after creation (room type + data size)
pub const ROOM_STATE_OFFSET: usize = 4;

/// Room header
///
/// Layout:
/// ```text
/// Offset  Size  Description
/// 0       4     Block count, including the header
/// 4       1     Room type
/// 5       4     Data size in this room
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomHeader {
    pub block_count: BlockCount,
    pub room_type: RoomType,
    pub data_size: SizeT,
}

impl RoomHeader {
    /// Read a room header from bytes
    pub fn read(bytes: &[u8; ROOM_HEADER_LEN]) -> Self {
        Self {
            block_count: BlockCount::new(u32::from_be_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ])),
            room_type: RoomType::new(bytes[4]),
            data_size: u32::from_be_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]),
        }
    }

    /// Write this header to bytes
    pub fn write(&self, bytes: &mut [u8]) {
        bytes[0..4].copy_from_slice(&self.block_count.value().to_be_bytes());
        Self::write_state(self.room_type, self.data_size, &mut bytes[ROOM_STATE_OFFSET..]);
    }

    /// Encode the mutable tail (room type + data size)
    pub fn write_state(room_type: RoomType, data_size: SizeT, bytes: &mut [u8]) {
        bytes[0] = room_type.value();
        bytes[1..5].copy_from_slice(&data_size.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let header = RoomHeader {
            block_count: BlockCount::new(3),
            room_type: RoomType::new(0x10),
            data_size: 0x0102,
        };
        let mut bytes = [0u8; ROOM_HEADER_LEN];
        header.write(&mut bytes);

        assert_eq!(bytes, [0, 0, 0, 3, 0x10, 0, 0, 1, 2]);
        assert_eq!(RoomHeader::read(&bytes), header);
    }

    #[test]
    fn test_state_only_touches_tail() {
        let mut bytes = [0xAAu8; ROOM_HEADER_LEN];
        RoomHeader::write_state(RoomType::FREE, 0, &mut bytes[ROOM_STATE_OFFSET..]);

        assert_eq!(&bytes[0..4], &[0xAA; 4]);
        assert_eq!(&bytes[4..], &[0x7f, 0, 0, 0, 0]);
    }
}
