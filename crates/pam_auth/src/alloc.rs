//! Memory that crosses into PAM's ownership.
//!
//! PAM frees conversation responses with the C library's `free`, so every
//! buffer handed to it must come from the C allocator rather than from Rust's
//! global allocator. [`NativeAllocator`] wraps the C allocation routines and
//! [`NativeString`] marks a string that lives in that allocation domain.

use std::ffi::CStr;
use std::ptr::NonNull;

use pam_auth_common::sys::{CallocFn, FreeFn, StrdupFn};

use crate::error::{Error, Result};

/// The C allocator routines used for buffers whose ownership passes to PAM.
#[derive(Clone, Copy)]
pub struct NativeAllocator {
    calloc: CallocFn,
    strdup: StrdupFn,
    free: FreeFn,
}

impl NativeAllocator {
    pub fn new(calloc: CallocFn, strdup: StrdupFn, free: FreeFn) -> Self {
        NativeAllocator { calloc, strdup, free }
    }

    /// The allocator of the C library this process is linked against.
    pub fn process() -> Self {
        NativeAllocator::new(libc::calloc, libc::strdup, libc::free)
    }

    /// Allocate zeroed storage for `count` elements of `size` bytes each.
    ///
    /// At least one element is always requested so that a null return can
    /// only mean the allocator is exhausted.
    pub fn allocate_zeroed(&self, count: usize, size: usize) -> Result<NonNull<libc::c_void>> {
        // SAFETY: calloc accepts any sizes and checks the multiplication itself.
        let ptr = unsafe { (self.calloc)(count.max(1), size) };
        NonNull::new(ptr).ok_or(Error::AllocationFailure {
            bytes: count.max(1).saturating_mul(size),
        })
    }

    /// Copy `s` (including its terminator) into C-allocated memory.
    pub fn duplicate_string(&self, s: &CStr) -> Result<NativeString> {
        // SAFETY: `s` is a valid NUL-terminated string for the duration of the call.
        let ptr = unsafe { (self.strdup)(s.as_ptr()) };
        NonNull::new(ptr)
            .map(|ptr| NativeString { ptr })
            .ok_or(Error::AllocationFailure { bytes: s.to_bytes_with_nul().len() })
    }

    /// Return memory obtained from this allocator.
    ///
    /// # Safety
    /// `ptr` must be null or have been returned by this allocator's `calloc`
    /// or `strdup`, and must not be used afterwards.
    pub unsafe fn release(&self, ptr: *mut libc::c_void) {
        // SAFETY: Upheld by the caller.
        unsafe { (self.free)(ptr) }
    }
}

impl std::fmt::Debug for NativeAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeAllocator").finish_non_exhaustive()
    }
}

/// A NUL-terminated string allocated by the C allocator.
///
/// It can only be created by [`NativeAllocator::duplicate_string`] and is
/// never freed from Rust: its sole purpose is to be handed to PAM, which
/// releases it. Dropping it without calling [`NativeString::into_raw`] leaks
/// the buffer.
#[must_use = "a NativeString must be handed over with into_raw"]
#[derive(Debug)]
pub struct NativeString {
    ptr: NonNull<libc::c_char>,
}

impl NativeString {
    pub fn as_c_str(&self) -> &CStr {
        // SAFETY: The pointer came from strdup and is still owned by us.
        unsafe { CStr::from_ptr(self.ptr.as_ptr()) }
    }

    /// Give up ownership; the receiver becomes responsible for freeing it.
    pub fn into_raw(self) -> *mut libc::c_char {
        self.ptr.as_ptr()
    }
}
