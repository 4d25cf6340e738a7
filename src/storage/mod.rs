//! Storage layer: on-disk headers and positional file I/O.
//!
//! This module provides the byte-level pieces of the inn file format and the
//! file primitive the engine reads and writes through.

mod disk_file;
mod file_header;
mod room_header;

pub use disk_file::{DiskFile, OpenMode};
pub use file_header::{FileHeader, FILE_HEADER_SIZE, MAGIC};
pub use room_header::{RoomHeader, ROOM_HEADER_LEN, ROOM_STATE_OFFSET};
