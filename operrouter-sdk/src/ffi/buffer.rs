//! Ownership guards for memory allocated by the native library.
use super::library::{FreeStringFn, ProtoFreeFn};
use std::{
    ffi::{CStr, c_char},
    ptr::NonNull,
    str::Utf8Error,
};

/// Byte buffer exchanged by value with the `*_proto` entry points.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ProtoBuffer {
    pub data: *mut u8,
    pub len: usize,
}

/// Backing storage for empty requests: the boundary rejects a null data pointer,
/// even with a zero length.
static EMPTY_INPUT: [u8; 1] = [0];

/// Returns the `(ptr, len)` pair to pass for `bytes`. The pointer is never null.
pub(crate) fn input_parts(bytes: &[u8]) -> (*const u8, usize) {
    if bytes.is_empty() {
        (EMPTY_INPUT.as_ptr(), 0)
    } else {
        (bytes.as_ptr(), bytes.len())
    }
}

/// A C string returned by the library, released with `operrouter_free_string` on drop.
pub(crate) struct OwnedCString {
    ptr: NonNull<c_char>,
    free: FreeStringFn,
}

impl OwnedCString {
    /// Takes ownership of `ptr`. Returns `None` for a null pointer, which needs no release.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a NUL-terminated string allocated by the library, not yet
    /// released, that `free` knows how to release.
    pub(crate) unsafe fn from_raw(ptr: *mut c_char, free: FreeStringFn) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, free })
    }

    pub(crate) fn to_str(&self) -> Result<&str, Utf8Error> {
        // SAFETY: the constructor contract guarantees a live NUL-terminated string.
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }.to_str()
    }
}

impl Drop for OwnedCString {
    fn drop(&mut self) {
        // SAFETY: the pointer is owned by this guard and released only here.
        unsafe { (self.free)(self.ptr.as_ptr()) }
    }
}

/// A [`ProtoBuffer`] returned by the library, released with `proto_buffer_free` on drop.
pub(crate) struct OwnedProtoBuffer {
    buffer: ProtoBuffer,
    free: ProtoFreeFn,
}

impl OwnedProtoBuffer {
    /// Takes ownership of `buffer`. Returns `None` when its data pointer is null.
    ///
    /// # Safety
    ///
    /// A non-null `buffer.data` must point to `buffer.len` readable bytes allocated by
    /// the library, not yet released, that `free` knows how to release.
    pub(crate) unsafe fn from_raw(buffer: ProtoBuffer, free: ProtoFreeFn) -> Option<Self> {
        (!buffer.data.is_null()).then(|| Self { buffer, free })
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        if self.buffer.len == 0 {
            return &[];
        }
        // SAFETY: the constructor contract guarantees `len` readable bytes at `data`.
        unsafe { std::slice::from_raw_parts(self.buffer.data, self.buffer.len) }
    }
}

impl Drop for OwnedProtoBuffer {
    fn drop(&mut self) {
        // SAFETY: the buffer is owned by this guard and released only here.
        unsafe { (self.free)(self.buffer) }
    }
}
