//! The room allocator.
//!
//! `InnFile` hands out file space the way a memory allocator hands out heap
//! blocks. Rooms are appended at the end of the file or reused in place; a
//! room never grows or moves once created. Every call goes straight to the
//! file; nothing is cached besides the header and the logical end of file.

use bytes::{Buf, BufMut};
use std::path::Path;

use crate::error::{InnError, Result};
use crate::inn::RoomKey;
use crate::storage::{
    DiskFile, FileHeader, RoomHeader, FILE_HEADER_SIZE, ROOM_HEADER_LEN, ROOM_STATE_OFFSET,
};
use crate::types::{
    BlockCount, BlockSize, RoomPos, RoomType, SizeT, INN_HEADER_SIZE, NEXT_ROOM_POS_SIZE,
};
use crate::Config;

/// File-backed room allocator.
///
/// Not thread safe: every method takes `&mut self`, and callers that share
/// an engine wrap it in their own lock (see [`crate::RoomPool`]).
#[derive(Debug)]
pub struct InnFile {
    storage: Option<DiskFile>,
    block_size: BlockSize,
    header_size: SizeT,
    /// Logical end of file, always on a block boundary
    file_size: u64,
    sync_on_write: bool,
}

impl Default for InnFile {
    fn default() -> Self {
        Self::new()
    }
}

impl InnFile {
    /// Create a closed engine
    pub fn new() -> Self {
        Self {
            storage: None,
            block_size: BlockSize::default(),
            header_size: INN_HEADER_SIZE,
            file_size: 0,
            sync_on_write: false,
        }
    }

    /// Open or create the inn file described by `config`.
    ///
    /// A new or empty file gets a header with `config.block_size` rounded up
    /// to the block alignment. For an existing file, `config.block_size` is
    /// overwritten with the stored block size. Returns the number of blocks
    /// the file's rooms occupy.
    pub fn open(&mut self, config: &mut Config) -> Result<BlockCount> {
        if let Some(storage) = &self.storage {
            return Err(InnError::AlreadyOpen(storage.path().to_path_buf()));
        }

        let mut storage = DiskFile::open(&config.path, config.mode)?;
        let size = storage.size()?;

        let header = if size == 0 {
            if !config.mode.is_writable() {
                return Err(InnError::format("empty file opened read-only"));
            }
            let header = FileHeader::new(BlockSize::aligned(config.block_size));
            storage.write_at(0, &header.to_bytes())?;
            storage.sync_data()?;
            header
        } else {
            if size < FILE_HEADER_SIZE as u64 {
                return Err(InnError::format(format!(
                    "file is {} bytes, shorter than its header",
                    size
                )));
            }
            let mut buf = [0u8; FILE_HEADER_SIZE];
            if storage.read_at(0, &mut buf)? < FILE_HEADER_SIZE {
                return Err(InnError::format("header truncated"));
            }
            FileHeader::read(&buf)?
        };

        let block_size = header.block_size;
        let payload = size.saturating_sub(header.header_size as u64);
        let partial = payload % block_size.as_u64();
        if partial != 0 {
            tracing::warn!(
                "{}: ignoring {} trailing bytes of an incomplete block",
                config.path.display(),
                partial
            );
        }
        let blocks = u32::try_from(payload / block_size.as_u64())
            .map_err(|_| InnError::format("block count exceeds format limit"))?;
        let blocks = BlockCount::new(blocks);

        config.block_size = block_size.value();
        self.block_size = block_size;
        self.header_size = header.header_size;
        self.file_size = header.header_size as u64 + blocks.bytes(block_size);
        self.sync_on_write = config.sync_on_write;
        self.storage = Some(storage);

        tracing::debug!(
            "opened {} (block size {}, {} blocks)",
            config.path.display(),
            block_size,
            blocks
        );
        Ok(blocks)
    }

    /// Close the file. Keys handed out earlier stay valid for a later reopen.
    pub fn close(&mut self) {
        if let Some(storage) = self.storage.take() {
            tracing::debug!("closed {}", storage.path().display());
        }
        self.file_size = 0;
    }

    /// Flush everything written so far to the device
    pub fn sync(&mut self) -> Result<()> {
        self.storage_mut("sync")?.sync()
    }

    pub fn is_open(&self) -> bool {
        self.storage.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.storage.as_ref().map(|s| s.path())
    }

    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    pub fn header_size(&self) -> SizeT {
        self.header_size
    }

    /// Logical end of file: header plus all complete blocks
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Number of blocks used by rooms
    pub fn blocks_used(&self) -> BlockCount {
        let payload = self.file_size.saturating_sub(self.header_size as u64);
        BlockCount::new((payload / self.block_size.as_u64()) as u32)
    }

    /// True if `pos` is on a block boundary past the file header
    pub fn is_good_room_pos(&self, pos: RoomPos) -> bool {
        pos.is_aligned(self.header_size, self.block_size)
    }

    /// Like `is_good_room_pos`, failing with `msg` when the check does not hold
    pub fn check_room_pos(&self, pos: RoomPos, msg: &str) -> Result<()> {
        if self.storage.is_none() {
            return Err(InnError::NotOpen("room access"));
        }
        if !self.is_good_room_pos(pos) {
            return Err(InnError::room_pos(pos, msg));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Room keys
    // -------------------------------------------------------------------------

    /// Load the room at `pos`. `RoomPos::NONE` means the first room.
    ///
    /// Returns `None` when `pos` is at or past the end of the file.
    pub fn make_room_key(&mut self, pos: RoomPos) -> Result<Option<RoomKey>> {
        self.make_room_key_ex(pos, &mut [])
    }

    /// Load the room at `pos` and copy its first payload bytes into `ex_header`.
    ///
    /// The copy is not limited by the room's data size. Callers check
    /// `key.data_size() >= ex_header.len()` before trusting the bytes.
    pub fn make_room_key_ex(
        &mut self,
        pos: RoomPos,
        ex_header: &mut [u8],
    ) -> Result<Option<RoomKey>> {
        let pos = if pos.is_some() {
            pos
        } else {
            RoomPos::new(self.header_size as u64)
        };
        self.check_room_pos(pos, "make room key")?;
        if pos.value() >= self.file_size {
            return Ok(None);
        }

        let file_size = self.file_size;
        let block_size = self.block_size;
        let storage = self.storage_mut("make room key")?;

        let mut raw = [0u8; ROOM_HEADER_LEN];
        if storage.read_at(pos.value(), &mut raw)? < ROOM_HEADER_LEN {
            return Err(InnError::room_pos(pos, "room header truncated"));
        }
        let header = RoomHeader::read(&raw);

        if header.block_count.value() == 0 {
            return Err(InnError::room_pos(pos, "room has zero blocks"));
        }
        if pos.value() + header.block_count.bytes(block_size) > file_size {
            return Err(InnError::room_pos(pos, "room runs past end of file"));
        }
        let room_size = block_size
            .room_size(header.block_count)
            .ok_or_else(|| InnError::room_pos(pos, "room block count out of range"))?;
        if header.data_size > room_size {
            return Err(InnError::room_size(
                pos,
                header.data_size as u64,
                room_size,
                "stored data size exceeds room",
            ));
        }

        if !ex_header.is_empty() {
            let len = ex_header.len().min(room_size as usize);
            let (head, tail) = ex_header.split_at_mut(len);
            let got = storage.read_at(pos.payload_offset(0), head)?;
            head[got..].fill(0);
            tail.fill(0);
        }

        Ok(Some(RoomKey::from_header(pos, room_size, &header)))
    }

    /// Load the room physically following `key`
    pub fn make_next_room_key(&mut self, key: &RoomKey) -> Result<Option<RoomKey>> {
        self.make_next_room_key_ex(key, &mut [])
    }

    pub fn make_next_room_key_ex(
        &mut self,
        key: &RoomKey,
        ex_header: &mut [u8],
    ) -> Result<Option<RoomKey>> {
        self.check_room_pos(key.pos(), "make next room key from a bad key")?;
        self.make_room_key_ex(key.next_room_pos(), ex_header)
    }

    /// Walk every room in position order
    pub fn rooms(&mut self) -> Rooms<'_> {
        Rooms {
            inn: self,
            next: Some(RoomPos::NONE),
        }
    }

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------

    /// Append a room able to hold `size` payload bytes at the end of the file
    pub fn make_new_room(&mut self, room_type: RoomType, size: SizeT) -> Result<RoomKey> {
        let block_size = self.block_size;
        let pos = RoomPos::new(self.file_size);
        self.check_room_pos(pos, "end of file is not block aligned")?;

        let block_count = block_size
            .blocks_for(size)
            .filter(|count| block_size.room_size(*count).is_some())
            .ok_or_else(|| {
                InnError::invalid_argument(format!("room size {} exceeds format limit", size))
            })?;
        let room_bytes = block_count.bytes(block_size);
        let room_size = block_size.room_size(block_count).unwrap_or_default();

        let header = RoomHeader {
            block_count,
            room_type,
            data_size: 0,
        };
        let mut buf = vec![0u8; room_bytes as usize];
        header.write(&mut buf);

        let storage = self.storage_mut("make new room")?;
        if let Err(e) = storage.write_at(pos.value(), &buf) {
            // Drop whatever part of the room reached the file
            let _ = storage.set_len(pos.value());
            return Err(e);
        }
        self.file_size += room_bytes;
        self.after_write()?;

        tracing::debug!(
            "new room {} at {} ({} blocks, room size {})",
            room_type,
            pos,
            block_count,
            room_size
        );
        Ok(RoomKey::from_header(pos, room_size, &header))
    }

    /// Reuse the existing room at `pos` for `room_type`, clearing its data.
    ///
    /// Fails with a size error, changing nothing, if the room holds less than
    /// `required_size` bytes.
    pub fn realloc_room(
        &mut self,
        pos: RoomPos,
        room_type: RoomType,
        required_size: SizeT,
    ) -> Result<RoomKey> {
        let mut key = self
            .make_room_key(pos)?
            .ok_or_else(|| InnError::room_pos(pos, "no room at or past end of file"))?;
        if key.room_size() < required_size {
            return Err(InnError::room_size(
                key.pos(),
                required_size as u64,
                key.room_size(),
                "realloc room",
            ));
        }
        key.set_pending_room_type(room_type);
        self.clear_room(&mut key)?;
        Ok(key)
    }

    /// Return a room, tagging it `room_type` and clearing its data.
    ///
    /// The blocks stay in the file; tracking them for reuse is the caller's job.
    pub fn free_room(&mut self, mut key: RoomKey, room_type: RoomType) -> Result<()> {
        self.check_room_pos(key.pos(), "free room")?;
        key.set_pending_room_type(room_type);
        self.clear_room(&mut key)
    }

    // -------------------------------------------------------------------------
    // Read
    // -------------------------------------------------------------------------

    /// Append up to `size` bytes of payload, starting at `offset`, to `sink`.
    ///
    /// Reading at or past the data size returns 0.
    pub fn read<B: BufMut>(
        &mut self,
        key: &RoomKey,
        offset: SizeT,
        size: SizeT,
        sink: &mut B,
    ) -> Result<SizeT> {
        let len = self.readable_len(key, offset, size)?.min(sink.remaining_mut());
        if len == 0 {
            return Ok(0);
        }
        let mut buf = vec![0u8; len];
        let got = self.storage_mut("read")?.read_at(key.pos().payload_offset(offset), &mut buf)?;
        sink.put_slice(&buf[..got]);
        Ok(got as SizeT)
    }

    /// Copy payload starting at `offset` into `buf`, at most `buf.len()` bytes
    pub fn read_into(&mut self, key: &RoomKey, offset: SizeT, buf: &mut [u8]) -> Result<SizeT> {
        let size = SizeT::try_from(buf.len()).unwrap_or(SizeT::MAX);
        let len = self.readable_len(key, offset, size)?;
        if len == 0 {
            return Ok(0);
        }
        let got = self
            .storage_mut("read")?
            .read_at(key.pos().payload_offset(offset), &mut buf[..len])?;
        Ok(got as SizeT)
    }

    /// Append the whole payload to `sink`
    pub fn read_all<B: BufMut>(&mut self, key: &RoomKey, sink: &mut B) -> Result<SizeT> {
        self.read(key, 0, key.data_size(), sink)
    }

    fn readable_len(&self, key: &RoomKey, offset: SizeT, size: SizeT) -> Result<usize> {
        self.check_room_pos(key.pos(), "read")?;
        if offset >= key.data_size() {
            return Ok(0);
        }
        Ok(size.min(key.data_size() - offset) as usize)
    }

    // -------------------------------------------------------------------------
    // Write
    // -------------------------------------------------------------------------

    /// Write `size` bytes from `source` at payload `offset`.
    ///
    /// The data size grows to `offset + size` when the write reaches past
    /// it. Returns `size`.
    pub fn write<B: Buf>(
        &mut self,
        key: &mut RoomKey,
        offset: SizeT,
        size: SizeT,
        source: &mut B,
    ) -> Result<SizeT> {
        self.check_room_pos(key.pos(), "write")?;
        if size as usize > source.remaining() {
            return Err(InnError::invalid_argument(format!(
                "write of {} bytes from a source holding {}",
                size,
                source.remaining()
            )));
        }
        let end = offset as u64 + size as u64;
        if end > key.room_size() as u64 {
            return Err(InnError::room_size(key.pos(), end, key.room_size(), "write"));
        }

        let mut data = vec![0u8; size as usize];
        source.copy_to_slice(&mut data);
        if !data.is_empty() {
            self.storage_mut("write")?
                .write_at(key.pos().payload_offset(offset), &data)?;
        }

        let end = end as SizeT;
        if end > key.data_size() || key.pending_type != key.current_type {
            let data_size = end.max(key.data_size());
            self.update_room_header(key, data_size)?;
        }
        self.after_write()?;
        Ok(size)
    }

    /// `write` from a byte slice
    pub fn write_bytes(&mut self, key: &mut RoomKey, offset: SizeT, data: &[u8]) -> Result<SizeT> {
        let mut source = data;
        let size = SizeT::try_from(data.len()).map_err(|_| {
            InnError::invalid_argument(format!("write of {} bytes exceeds format limit", data.len()))
        })?;
        self.write(key, offset, size, &mut source)
    }

    /// Replace the whole payload with everything left in `source`.
    ///
    /// Fails with a size error, changing nothing, if it does not fit.
    pub fn rewrite<B: Buf>(&mut self, key: &mut RoomKey, source: &mut B) -> Result<SizeT> {
        self.check_room_pos(key.pos(), "rewrite")?;
        let len = source.remaining();
        if len as u64 > key.room_size() as u64 {
            return Err(InnError::room_size(key.pos(), len as u64, key.room_size(), "rewrite"));
        }

        let mut data = vec![0u8; len];
        source.copy_to_slice(&mut data);
        if !data.is_empty() {
            self.storage_mut("rewrite")?
                .write_at(key.pos().payload_offset(0), &data)?;
        }
        self.update_room_header(key, len as SizeT)?;
        self.after_write()?;
        Ok(len as SizeT)
    }

    /// `rewrite` from a byte slice
    pub fn rewrite_bytes(&mut self, key: &mut RoomKey, data: &[u8]) -> Result<SizeT> {
        let mut source = data;
        self.rewrite(key, &mut source)
    }

    /// Shrink the data size to `new_data_size`, first writing `ex_header` at
    /// the start of the payload.
    ///
    /// Growing the data size here is a size error. No blocks are released.
    pub fn reduce(&mut self, key: &mut RoomKey, new_data_size: SizeT, ex_header: &[u8]) -> Result<()> {
        self.check_room_pos(key.pos(), "reduce")?;
        if new_data_size > key.data_size() {
            return Err(InnError::room_size(
                key.pos(),
                new_data_size as u64,
                key.room_size(),
                "reduce cannot grow data size",
            ));
        }
        if ex_header.len() as u64 > key.room_size() as u64 {
            return Err(InnError::room_size(
                key.pos(),
                ex_header.len() as u64,
                key.room_size(),
                "extra room header",
            ));
        }

        if !ex_header.is_empty() {
            self.storage_mut("reduce")?
                .write_at(key.pos().payload_offset(0), ex_header)?;
        }
        self.update_room_header(key, new_data_size)?;
        self.after_write()
    }

    // -------------------------------------------------------------------------
    // Linked rooms
    // -------------------------------------------------------------------------

    /// Read the `NextRoomPos` embedded in a room with the `HasNextRoomPos` flag.
    ///
    /// Returns `None` for unflagged rooms, rooms too short to hold the field,
    /// and end-of-chain markers.
    pub fn read_next_room_pos(&mut self, key: &RoomKey) -> Result<Option<RoomPos>> {
        if !key.current_room_type().has_next_room_pos() || key.data_size() < NEXT_ROOM_POS_SIZE {
            return Ok(None);
        }
        let mut raw = [0u8; NEXT_ROOM_POS_SIZE as usize];
        if self.read_into(key, 0, &mut raw)? < NEXT_ROOM_POS_SIZE {
            return Ok(None);
        }
        Ok(RoomPos::from_be_bytes(raw))
    }

    /// Point this room at `next` and trim its data to `new_data_size`.
    ///
    /// Sets the `HasNextRoomPos` flag on the pending room type. `new_data_size`
    /// must still cover the pointer.
    pub fn link_next_room(
        &mut self,
        key: &mut RoomKey,
        next: Option<RoomPos>,
        new_data_size: SizeT,
    ) -> Result<()> {
        if new_data_size < NEXT_ROOM_POS_SIZE {
            return Err(InnError::invalid_argument(format!(
                "linked room keeps {} bytes, the next room position needs {}",
                new_data_size, NEXT_ROOM_POS_SIZE
            )));
        }
        if let Some(next) = next {
            if !self.is_good_room_pos(next) {
                return Err(InnError::room_pos(next, "link to a bad room position"));
            }
        }
        let pending = key.pending_room_type();
        key.set_pending_room_type(pending.with_next_room_pos());
        let result = self.reduce(key, new_data_size, &next.unwrap_or(RoomPos::NONE).to_be_bytes());
        if result.is_err() {
            key.set_pending_room_type(pending);
        }
        result
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn storage_mut(&mut self, what: &'static str) -> Result<&mut DiskFile> {
        self.storage.as_mut().ok_or(InnError::NotOpen(what))
    }

    fn after_write(&mut self) -> Result<()> {
        if self.sync_on_write {
            self.storage_mut("sync")?.sync_data()?;
        }
        Ok(())
    }

    /// Commit the pending room type and `data_size` to the room header
    fn update_room_header(&mut self, key: &mut RoomKey, data_size: SizeT) -> Result<()> {
        let mut state = [0u8; ROOM_HEADER_LEN - ROOM_STATE_OFFSET];
        RoomHeader::write_state(key.pending_type, data_size, &mut state);
        self.storage_mut("update room header")?
            .write_at(key.pos().value() + ROOM_STATE_OFFSET as u64, &state)?;

        tracing::trace!(
            "room {} header: type {}, data size {}",
            key.pos(),
            key.pending_type,
            data_size
        );
        key.current_type = key.pending_type;
        key.data_size = data_size;
        Ok(())
    }

    fn clear_room(&mut self, key: &mut RoomKey) -> Result<()> {
        self.update_room_header(key, 0)?;
        self.after_write()
    }
}

/// Iterator over every room of an inn file, in position order.
///
/// Yields an error once and then stops if a room header is damaged.
pub struct Rooms<'a> {
    inn: &'a mut InnFile,
    next: Option<RoomPos>,
}

impl Iterator for Rooms<'_> {
    type Item = Result<RoomKey>;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.next.take()?;
        match self.inn.make_room_key(pos) {
            Ok(Some(key)) => {
                self.next = Some(key.next_room_pos());
                Some(Ok(key))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
