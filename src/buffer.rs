//! Append-only byte buffer.

use smallvec::{CollectionAllocErr, SmallVec};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Bytes kept inline before the first heap spill.
const INLINE_CAPACITY: usize = 160;

/// Append-only byte container backing the builder. Small values stay in an
/// inline region; the first overflow moves the bytes to the heap. All
/// positions handed out by the builder are offsets, so growth never
/// invalidates them.
#[derive(Clone, Default)]
pub struct Buffer {
    bytes: SmallVec<[u8; INLINE_CAPACITY]>,
}

impl Buffer {
    #[inline]
    pub fn new() -> Self {
        Buffer { bytes: SmallVec::new() }
    }

    /// Reserves room for at least `additional` more bytes, reporting
    /// allocation failure to the caller.
    #[inline]
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), CollectionAllocErr> {
        self.bytes.try_reserve(additional)
    }

    /// Reserves room for at least `additional` more bytes.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.bytes.reserve(additional);
    }

    #[inline]
    pub fn push_u8(&mut self, value: u8) {
        debug_assert!(self.bytes.len() < self.bytes.capacity());
        self.bytes.push(value);
    }

    #[inline]
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= self.bytes.capacity() - self.bytes.len());
        self.bytes.extend_from_slice(bytes);
    }

    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    /// Drops the content but keeps the capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Deref for Buffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for Buffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl fmt::Debug for Buffer {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer").field("len", &self.bytes.len()).finish()
    }
}
