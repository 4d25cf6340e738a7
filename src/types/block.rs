//! Block size and block count types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{SizeT, BLOCK_SIZE_ALIGN, ROOM_HEADER_SIZE};

/// Allocation granularity of an inn file, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockSize(u32);

impl BlockSize {
    /// Wrap a raw block size without checking it
    pub const fn new(size: u32) -> Self {
        Self(size)
    }

    /// Round a requested size up to the next multiple of `BLOCK_SIZE_ALIGN`.
    ///
    /// Zero becomes one alignment unit.
    pub fn aligned(requested: u32) -> Self {
        if requested == 0 {
            return Self(BLOCK_SIZE_ALIGN);
        }
        let size = requested
            .div_ceil(BLOCK_SIZE_ALIGN)
            .checked_mul(BLOCK_SIZE_ALIGN)
            .unwrap_or(u32::MAX / BLOCK_SIZE_ALIGN * BLOCK_SIZE_ALIGN);
        Self(size)
    }

    /// True if non-zero and a multiple of `BLOCK_SIZE_ALIGN`
    pub const fn is_valid(self) -> bool {
        self.0 != 0 && self.0 % BLOCK_SIZE_ALIGN == 0
    }

    /// Get the raw size
    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn as_u64(self) -> u64 {
        self.0 as u64
    }

    /// Number of blocks needed for a room carrying `size` payload bytes.
    ///
    /// Returns `None` if the count does not fit the on-disk field.
    pub fn blocks_for(self, size: SizeT) -> Option<BlockCount> {
        let total = size as u64 + ROOM_HEADER_SIZE as u64;
        let count = total.div_ceil(self.as_u64());
        u32::try_from(count).ok().map(BlockCount)
    }

    /// Payload capacity of a room spanning `count` blocks.
    ///
    /// Returns `None` if it would not fit a `SizeT`.
    pub fn room_size(self, count: BlockCount) -> Option<SizeT> {
        if count.0 == 0 {
            return Some(0);
        }
        let bytes = self.as_u64() * count.0 as u64 - ROOM_HEADER_SIZE as u64;
        SizeT::try_from(bytes).ok()
    }
}

impl Default for BlockSize {
    fn default() -> Self {
        Self(super::DEFAULT_BLOCK_SIZE)
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of blocks, either of one room or of the whole file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockCount(pub u32);

impl BlockCount {
    pub const fn new(count: u32) -> Self {
        Self(count)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Bytes spanned by this many blocks
    pub const fn bytes(self, block_size: BlockSize) -> u64 {
        self.0 as u64 * block_size.as_u64()
    }
}

impl fmt::Display for BlockCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned() {
        assert_eq!(BlockSize::aligned(0).value(), BLOCK_SIZE_ALIGN);
        assert_eq!(BlockSize::aligned(1).value(), BLOCK_SIZE_ALIGN);
        assert_eq!(BlockSize::aligned(64).value(), 64);
        assert_eq!(BlockSize::aligned(65).value(), 96);
        assert_eq!(BlockSize::aligned(128).value(), 128);
    }

    #[test]
    fn test_validity() {
        assert!(BlockSize::new(64).is_valid());
        assert!(!BlockSize::new(0).is_valid());
        assert!(!BlockSize::new(100).is_valid());
    }

    #[test]
    fn test_blocks_for() {
        let bs = BlockSize::new(64);
        assert_eq!(bs.blocks_for(0), Some(BlockCount(1)));
        assert_eq!(bs.blocks_for(10), Some(BlockCount(1)));
        assert_eq!(bs.blocks_for(55), Some(BlockCount(1)));
        assert_eq!(bs.blocks_for(56), Some(BlockCount(2)));
        assert_eq!(bs.blocks_for(119), Some(BlockCount(2)));
        assert_eq!(bs.blocks_for(120), Some(BlockCount(3)));
    }

    #[test]
    fn test_room_size() {
        let bs = BlockSize::new(64);
        assert_eq!(bs.room_size(BlockCount(0)), Some(0));
        assert_eq!(bs.room_size(BlockCount(1)), Some(55));
        assert_eq!(bs.room_size(BlockCount(2)), Some(119));
        assert_eq!(bs.room_size(BlockCount(u32::MAX)), None);
    }
}
