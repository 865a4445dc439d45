//! Buffers outside the managed heap.
//!
//! A native box's referenced storage lives here. The collector never traces
//! or moves these buffers; they are released by the finalization sweep.

#![allow(
    unsafe_code,
    reason = "foreign buffers are raw allocations released manually by the finalizer sweep"
)]

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::{memory_error, EngineResult};

/// Byte pattern written over freed buffers when poisoning is enabled.
pub const POISON_BYTE: u8 = 0xbb;

/// A separately allocated byte buffer.
///
/// Not `Clone`: exactly one owner may release it.
pub struct ForeignBuf {
    ptr: NonNull<u8>,
    len: usize,
}

impl ForeignBuf {
    /// Alignment of buffers from [`ForeignBuf::alloc_zeroed`].
    pub const ALIGN: usize = 16;

    /// Allocate `len` zeroed bytes.
    pub fn alloc_zeroed(len: usize) -> EngineResult<Self> {
        let layout = Self::layout(len)?;
        // SAFETY: layout has non-zero size and a power-of-two alignment
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or_else(|| memory_error(len))?;
        Ok(ForeignBuf { ptr, len })
    }

    /// Wrap memory managed by someone else.
    ///
    /// The engine never frees such a buffer unless the value holding it is
    /// adopted.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` bytes for as long as
    /// any value refers to it. If the value may be adopted, the memory must
    /// have come from [`ForeignBuf::alloc_zeroed`] with the same `len`.
    pub unsafe fn from_raw_parts(ptr: NonNull<u8>, len: usize) -> Self {
        ForeignBuf { ptr, len }
    }

    /// Give up ownership, returning the raw parts.
    pub fn into_raw_parts(self) -> (NonNull<u8>, usize) {
        (self.ptr, self.len)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for len bytes while self is alive
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr is valid for len bytes and uniquely borrowed through self
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Free the buffer, pattern-filling it first if `poison` is set.
    ///
    /// Only for buffers from [`ForeignBuf::alloc_zeroed`].
    pub(crate) fn release(mut self, poison: bool) {
        if poison {
            self.poison();
        }
        if let Ok(layout) = Self::layout(self.len) {
            // SAFETY: See alloc_zeroed; the layout is recomputed from the same len
            unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) }
        }
    }

    /// Overwrite every byte with [`POISON_BYTE`].
    pub(crate) fn poison(&mut self) {
        self.as_mut_slice().fill(POISON_BYTE);
    }

    fn layout(len: usize) -> EngineResult<Layout> {
        Layout::from_size_align(len.max(1), Self::ALIGN).map_err(|_| memory_error(len))
    }
}

impl std::fmt::Debug for ForeignBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignBuf")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .finish()
    }
}
