//! Common types used throughout the inn storage engine.

mod block;
mod room_pos;
mod room_type;

pub use block::{BlockCount, BlockSize};
pub use room_pos::RoomPos;
pub use room_type::RoomType;

/// Payload offsets and lengths inside a room
pub type SizeT = u32;

/// File header size in bytes (magic + header size + block size + padding)
pub const INN_HEADER_SIZE: SizeT = 64;

/// Room header size: block count (4) + room type (1) + data size (4)
pub const ROOM_HEADER_SIZE: SizeT = 9;

/// Width of an embedded `NextRoomPos` field
pub const NEXT_ROOM_POS_SIZE: SizeT = 8;

/// Block sizes are always a multiple of this
pub const BLOCK_SIZE_ALIGN: SizeT = 32;

/// Block size used when the caller does not ask for one
pub const DEFAULT_BLOCK_SIZE: SizeT = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_block_size_is_aligned() {
        assert_eq!(DEFAULT_BLOCK_SIZE % BLOCK_SIZE_ALIGN, 0);
        assert!(DEFAULT_BLOCK_SIZE > ROOM_HEADER_SIZE);
    }
}
