//! Inn layer: the room allocator and its handles.
//!
//! An inn file is a 64-byte file header followed by rooms. Each room is a
//! whole number of blocks and starts with a 9-byte room header:
//!
//! ```text
//! +-------------+---------------------------+---------------------------+----
//! | file header | room hdr | payload ...    | room hdr | payload ...    | ...
//! | 64 bytes    | 9 bytes  | block aligned  | 9 bytes  | block aligned  |
//! +-------------+---------------------------+---------------------------+----
//! ```
//!
//! There is no directory. Rooms are found by walking from the first room to
//! the end of the file, one room length at a time.

mod ex_header;
mod inn_file;
mod room_key;

pub use ex_header::ExRoomHeader;
pub use inn_file::{InnFile, Rooms};
pub use room_key::RoomKey;
