//! Free room reuse.
//!
//! `InnFile` never decides which room to reuse. `RoomPool` is a small policy
//! layer on top of it: it indexes free rooms by capacity in memory, hands the
//! best fitting one out on allocation, and only grows the file when nothing
//! fits. The index is rebuilt from a full room scan on open, so nothing
//! beyond the room type tags needs to be persisted.

use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::inn::{InnFile, RoomKey};
use crate::types::{BlockCount, RoomPos, RoomType, SizeT};
use crate::Config;

/// Free rooms keyed by capacity
#[derive(Debug, Default)]
struct FreeRooms {
    by_size: BTreeMap<SizeT, Vec<RoomPos>>,
    len: usize,
}

impl FreeRooms {
    fn push(&mut self, room_size: SizeT, pos: RoomPos) {
        self.by_size.entry(room_size).or_default().push(pos);
        self.len += 1;
    }

    /// Remove and return the smallest room holding at least `required` bytes
    fn take_fit(&mut self, required: SizeT) -> Option<(SizeT, RoomPos)> {
        let (&room_size, positions) = self.by_size.range_mut(required..).next()?;
        let pos = positions.pop()?;
        if positions.is_empty() {
            self.by_size.remove(&room_size);
        }
        self.len -= 1;
        Some((room_size, pos))
    }

    fn len(&self) -> usize {
        self.len
    }
}

struct PoolState {
    inn: InnFile,
    free: FreeRooms,
}

/// A lock-guarded `InnFile` that recycles freed rooms.
///
/// Rooms freed through `with_inn` instead of `free` are not indexed until the
/// next open.
pub struct RoomPool {
    state: Mutex<PoolState>,
}

impl RoomPool {
    /// Open the inn file and index its free rooms
    pub fn open(config: &mut Config) -> Result<Self> {
        let mut inn = InnFile::new();
        inn.open(config)?;

        let mut free = FreeRooms::default();
        for key in inn.rooms() {
            let key = key?;
            if key.current_room_type().is_free() {
                free.push(key.room_size(), key.pos());
            }
        }
        tracing::debug!(
            "room pool on {}: {} free rooms",
            config.path.display(),
            free.len()
        );

        Ok(Self {
            state: Mutex::new(PoolState { inn, free }),
        })
    }

    /// Get a room of `room_type` able to hold `size` bytes.
    ///
    /// Reuses the smallest fitting free room, or appends a new one.
    pub fn alloc(&self, room_type: RoomType, size: SizeT) -> Result<RoomKey> {
        let mut state = self.state.lock();
        let PoolState { inn, free } = &mut *state;

        while let Some((room_size, pos)) = free.take_fit(size) {
            let still_free = matches!(
                inn.make_room_key(pos)?,
                Some(key) if key.current_room_type().is_free()
            );
            if !still_free {
                continue;
            }
            return match inn.realloc_room(pos, room_type, size) {
                Ok(key) => Ok(key),
                Err(e) => {
                    free.push(room_size, pos);
                    Err(e)
                }
            };
        }
        inn.make_new_room(room_type, size)
    }

    /// Release a room and make it available to `alloc`
    pub fn free(&self, key: RoomKey) -> Result<()> {
        let mut state = self.state.lock();
        let (pos, room_size) = (key.pos(), key.room_size());
        state.inn.free_room(key, RoomType::FREE)?;
        state.free.push(room_size, pos);
        Ok(())
    }

    /// Run `f` against the locked allocator
    pub fn with_inn<R>(&self, f: impl FnOnce(&mut InnFile) -> R) -> R {
        f(&mut self.state.lock().inn)
    }

    /// Number of indexed free rooms
    pub fn free_room_count(&self) -> usize {
        self.state.lock().free.len()
    }

    pub fn blocks_used(&self) -> BlockCount {
        self.state.lock().inn.blocks_used()
    }

    pub fn sync(&self) -> Result<()> {
        self.state.lock().inn.sync()
    }
}
