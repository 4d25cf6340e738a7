//! Inn file header.
//!
//! The first 64 bytes of every inn file identify the format and record the
//! block size that all room positions are aligned to.

use crate::error::{InnError, Result};
use crate::types::{BlockSize, SizeT, INN_HEADER_SIZE};

/// Magic string identifying an inn file, zero-padded to 20 bytes
pub const MAGIC: &[u8; 20] = b"fon9.inn.0001\n\0\0\0\0\0\0";

/// File header size
pub const FILE_HEADER_SIZE: usize = INN_HEADER_SIZE as usize;

/// Inn file header
///
/// Layout:
/// ```text
/// Offset  Size  Description
/// 0       20    Magic string "fon9.inn.0001\n", zero padded
/// 20      4     Header size (always 64)
/// 24      4     Block size, a multiple of BLOCK_SIZE_ALIGN
/// 28      36    Zero padding
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Header size in bytes
    pub header_size: SizeT,
    /// Allocation granularity for rooms
    pub block_size: BlockSize,
}

impl FileHeader {
    /// Create a header for a new file
    pub fn new(block_size: BlockSize) -> Self {
        Self {
            header_size: INN_HEADER_SIZE,
            block_size,
        }
    }

    /// Read a file header from bytes
    pub fn read(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FILE_HEADER_SIZE {
            return Err(InnError::format("header too short"));
        }

        if &bytes[0..20] != MAGIC {
            return Err(InnError::format("invalid magic bytes"));
        }

        let header_size = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
        let block_size = u32::from_be_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);

        if header_size != INN_HEADER_SIZE {
            return Err(InnError::format(format!(
                "unsupported header size: {} (expected {})",
                header_size, INN_HEADER_SIZE
            )));
        }

        let block_size = BlockSize::new(block_size);
        if !block_size.is_valid() {
            return Err(InnError::format(format!("bad block size: {}", block_size)));
        }

        Ok(Self {
            header_size,
            block_size,
        })
    }

    /// Write this header to bytes
    pub fn write(&self, bytes: &mut [u8]) {
        bytes[..FILE_HEADER_SIZE].fill(0);
        bytes[0..20].copy_from_slice(MAGIC);
        bytes[20..24].copy_from_slice(&self.header_size.to_be_bytes());
        bytes[24..28].copy_from_slice(&self.block_size.value().to_be_bytes());
    }

    /// Encode into a fresh header-sized buffer
    pub fn to_bytes(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut bytes = [0u8; FILE_HEADER_SIZE];
        self.write(&mut bytes);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = FileHeader::new(BlockSize::new(128));
        let bytes = header.to_bytes();

        let restored = FileHeader::read(&bytes).unwrap();
        assert_eq!(restored, header);
    }

    #[test]
    fn test_header_layout() {
        let bytes = FileHeader::new(BlockSize::new(64)).to_bytes();
        assert_eq!(&bytes[0..14], b"fon9.inn.0001\n");
        assert!(bytes[14..20].iter().all(|&b| b == 0));
        assert_eq!(&bytes[20..24], &[0, 0, 0, 64]);
        assert_eq!(&bytes[24..28], &[0, 0, 0, 64]);
        assert!(bytes[28..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_invalid_magic() {
        let mut bytes = FileHeader::new(BlockSize::new(64)).to_bytes();
        bytes[0..4].copy_from_slice(b"fonX");

        assert!(matches!(FileHeader::read(&bytes), Err(InnError::Format(_))));
    }

    #[test]
    fn test_inconsistent_header_size() {
        let mut bytes = FileHeader::new(BlockSize::new(64)).to_bytes();
        bytes[23] = 32;

        assert!(matches!(FileHeader::read(&bytes), Err(InnError::Format(_))));
    }

    #[test]
    fn test_unaligned_block_size() {
        let mut bytes = FileHeader::new(BlockSize::new(64)).to_bytes();
        bytes[27] = 65;

        assert!(matches!(FileHeader::read(&bytes), Err(InnError::Format(_))));
    }

    #[test]
    fn test_short_buffer() {
        assert!(FileHeader::read(&[0u8; 10]).is_err());
    }
}
