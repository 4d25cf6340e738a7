//! Extra room header decoding.
//!
//! Callers may reserve the first payload bytes of a room for their own
//! header. When the room type carries the `HasNextRoomPos` flag, those bytes
//! start with a big-endian `NextRoomPos`, which is how free chains and
//! continuation rooms are linked. The engine never follows these links.

use crate::error::{InnError, Result};
use crate::types::{RoomPos, RoomType, NEXT_ROOM_POS_SIZE};

const NEXT_LEN: usize = NEXT_ROOM_POS_SIZE as usize;

/// Decoded extra room header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExRoomHeader<'a> {
    /// Caller bytes with no engine-known structure
    Plain(&'a [u8]),
    /// Leading `NextRoomPos` followed by caller bytes
    Linked {
        next: Option<RoomPos>,
        rest: &'a [u8],
    },
}

impl<'a> ExRoomHeader<'a> {
    /// Decode the extra header of a room of type `room_type`
    pub fn decode(room_type: RoomType, bytes: &'a [u8]) -> Result<Self> {
        if !room_type.has_next_room_pos() {
            return Ok(Self::Plain(bytes));
        }
        if bytes.len() < NEXT_LEN {
            return Err(InnError::invalid_argument(format!(
                "room type {} needs {} extra header bytes, got {}",
                room_type,
                NEXT_LEN,
                bytes.len()
            )));
        }
        let (head, rest) = bytes.split_at(NEXT_LEN);
        let mut raw = [0u8; NEXT_LEN];
        raw.copy_from_slice(head);
        Ok(Self::Linked {
            next: RoomPos::from_be_bytes(raw),
            rest,
        })
    }

    /// Linked successor, if any
    pub fn next_room_pos(&self) -> Option<RoomPos> {
        match self {
            Self::Plain(_) => None,
            Self::Linked { next, .. } => *next,
        }
    }

    /// Encode back into the on-disk byte form
    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            Self::Plain(bytes) => bytes.to_vec(),
            Self::Linked { next, rest } => {
                let mut out = Vec::with_capacity(NEXT_LEN + rest.len());
                out.extend_from_slice(&next.unwrap_or(RoomPos::NONE).to_be_bytes());
                out.extend_from_slice(rest);
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_room_type() {
        let bytes = [1u8, 2, 3];
        let ex = ExRoomHeader::decode(RoomType::new(0x10), &bytes).unwrap();
        assert_eq!(ex, ExRoomHeader::Plain(&bytes));
        assert_eq!(ex.next_room_pos(), None);
    }

    #[test]
    fn test_linked_room_type() {
        let mut bytes = RoomPos::new(192).to_be_bytes().to_vec();
        bytes.extend_from_slice(b"tail");

        let ex = ExRoomHeader::decode(RoomType::FREE_LIST, &bytes).unwrap();
        assert_eq!(ex.next_room_pos(), Some(RoomPos::new(192)));
        match ex {
            ExRoomHeader::Linked { rest, .. } => assert_eq!(rest, b"tail"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(ex.to_vec(), bytes);
    }

    #[test]
    fn test_linked_end_of_chain() {
        let bytes = [0u8; 8];
        let ex = ExRoomHeader::decode(RoomType::FREE_LIST, &bytes).unwrap();
        assert_eq!(ex.next_room_pos(), None);
        assert_eq!(ex.to_vec(), bytes.to_vec());
    }

    #[test]
    fn test_linked_too_short() {
        let bytes = [0u8; 4];
        assert!(matches!(
            ExRoomHeader::decode(RoomType::EX_FILE_HEADER, &bytes),
            Err(InnError::InvalidArgument(_))
        ));
    }
}
