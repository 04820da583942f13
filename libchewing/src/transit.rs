//! Strings and arrays crossing the C boundary.
//!
//! Every boundary function hands out text in exactly one of two modes, and
//! each mode has its own type:
//!
//! - [`OwnedString`] becomes a `*mut c_char` allocated for this call. The
//!   caller releases it with `chewing_free`.
//! - [`BorrowedStr`] becomes a `*const c_char` pointing into session storage
//!   ([`StaticSlot`]). It stays valid until the next mutating call on that
//!   session and is never released.
//!
//! Owned allocations are recorded in a registry so that `chewing_free` only
//! ever releases memory this library handed out. Freeing anything else,
//! including a borrowed string or the same pointer twice, is ignored.

use std::collections::BTreeMap;
use std::ffi::{c_char, c_int, c_uint, c_ushort, c_void, CStr, CString};
use std::marker::PhantomData;
use std::ptr;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use tracing::warn;

enum Allocation {
    Text,
    Ints(usize),
    Shorts(usize),
}

static OWNED: Lazy<Mutex<BTreeMap<usize, Allocation>>> = Lazy::new(Default::default);

fn registry() -> MutexGuard<'static, BTreeMap<usize, Allocation>> {
    OWNED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn register(ptr: *mut c_void, allocation: Allocation) {
    registry().insert(ptr as usize, allocation);
}

/// NUL bytes cannot cross as C strings; they are dropped.
pub(crate) fn to_cstring(s: &str) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

/// Text the caller must release.
#[must_use = "the string leaks unless it is handed to the caller"]
#[derive(Debug, Default)]
pub struct OwnedString(CString);

impl OwnedString {
    pub fn new(s: &str) -> Self {
        Self(to_cstring(s))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn into_raw(self) -> *mut c_char {
        let raw = self.0.into_raw();
        register(raw.cast(), Allocation::Text);
        raw
    }
}

/// An empty boxed slice does not allocate, so every empty array would share
/// one dangling address. Give it a single zero element instead.
fn pad_empty<T: Default>(values: &mut Vec<T>) {
    if values.is_empty() {
        values.push(T::default());
    }
}

/// A caller-owned `int` array.
pub fn owned_ints(mut values: Vec<c_int>) -> *mut c_int {
    pad_empty(&mut values);
    let len = values.len();
    let raw = Box::into_raw(values.into_boxed_slice()).cast::<c_int>();
    register(raw.cast(), Allocation::Ints(len));
    raw
}

/// A caller-owned `unsigned short` array.
pub fn owned_shorts(mut values: Vec<c_ushort>) -> *mut c_ushort {
    pad_empty(&mut values);
    let len = values.len();
    let raw = Box::into_raw(values.into_boxed_slice()).cast::<c_ushort>();
    register(raw.cast(), Allocation::Shorts(len));
    raw
}

/// Release memory previously handed out as owned. Returns false (and does
/// nothing) for null or unknown pointers.
///
/// # Safety
///
/// `ptr` must not be used again after a successful release.
pub unsafe fn release(ptr: *mut c_void) -> bool {
    if ptr.is_null() {
        return false;
    }
    let Some(allocation) = registry().remove(&(ptr as usize)) else {
        warn!("ignoring free of a pointer this library does not own");
        return false;
    };
    match allocation {
        Allocation::Text => drop(CString::from_raw(ptr.cast())),
        Allocation::Ints(len) => drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
            ptr.cast::<c_int>(),
            len,
        ))),
        Allocation::Shorts(len) => drop(Box::from_raw(ptr::slice_from_raw_parts_mut(
            ptr.cast::<c_ushort>(),
            len,
        ))),
    }
    true
}

/// A view into engine storage. Never released by the caller.
#[derive(Debug, Clone, Copy)]
pub struct BorrowedStr<'a> {
    ptr: *const c_char,
    _owner: PhantomData<&'a CStr>,
}

static EMPTY: &[u8] = b"\0";

impl<'a> BorrowedStr<'a> {
    pub fn new(s: &'a CStr) -> Self {
        Self {
            ptr: s.as_ptr(),
            _owner: PhantomData,
        }
    }

    /// An empty string with static lifetime, used when there is no session.
    pub fn empty() -> BorrowedStr<'static> {
        BorrowedStr {
            ptr: EMPTY.as_ptr().cast(),
            _owner: PhantomData,
        }
    }

    pub fn as_ptr(self) -> *const c_char {
        self.ptr
    }
}

/// Session-held storage behind one borrowed-string accessor.
#[derive(Debug, Default)]
pub struct StaticSlot(CString);

impl StaticSlot {
    /// Replace the stored text; earlier views of this slot are invalidated.
    pub fn set(&mut self, s: &str) -> BorrowedStr<'_> {
        self.0 = to_cstring(s);
        BorrowedStr::new(&self.0)
    }
}

/// Read a caller-supplied C string. Null or invalid UTF-8 gives `None`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn str_from_ptr<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Copy `s` plus a terminating NUL into a caller buffer of `cap` bytes.
/// Returns false when it does not fit.
///
/// # Safety
///
/// `buf` must be null or valid for writes of `cap` bytes.
pub unsafe fn copy_to_buf(s: &str, buf: *mut c_char, cap: c_uint) -> bool {
    if buf.is_null() {
        return true;
    }
    let bytes = s.as_bytes();
    if bytes.len() + 1 > cap as usize {
        return false;
    }
    ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), bytes.len());
    *buf.add(bytes.len()) = 0;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_string_is_released_once() {
        let raw = OwnedString::new("綠茶").into_raw();
        assert_eq!(unsafe { CStr::from_ptr(raw) }.to_str().unwrap(), "綠茶");
        assert!(unsafe { release(raw.cast()) });
        assert!(!unsafe { release(raw.cast()) });
    }

    #[test]
    fn foreign_and_null_pointers_are_ignored() {
        let mut slot = StaticSlot::default();
        let borrowed = slot.set("preedit").as_ptr();
        assert!(!unsafe { release(borrowed as *mut c_void) });
        assert!(!unsafe { release(ptr::null_mut()) });
    }

    #[test]
    fn arrays_round_trip() {
        let ints = owned_ints(vec![49, 50, 0]);
        assert_eq!(unsafe { *ints.add(1) }, 50);
        assert!(unsafe { release(ints.cast()) });
        let shorts = owned_shorts(Vec::new());
        assert!(unsafe { release(shorts.cast()) });
    }

    #[test]
    fn empty_arrays_are_distinct_allocations() {
        let first = owned_shorts(Vec::new());
        let second = owned_shorts(Vec::new());
        assert_ne!(first, second);
        assert_eq!(unsafe { *first }, 0);
        assert!(unsafe { release(first.cast()) });
        assert!(unsafe { release(second.cast()) });
        let ints = owned_ints(Vec::new());
        assert!(!ints.is_null());
        assert!(unsafe { release(ints.cast()) });
    }

    #[test]
    fn interior_nul_is_dropped() {
        let raw = OwnedString::new("a\0b").into_raw();
        assert_eq!(unsafe { CStr::from_ptr(raw) }.to_bytes(), b"ab");
        unsafe { release(raw.cast()) };
    }

    #[test]
    fn copy_respects_capacity() {
        let mut buf = [1 as c_char; 4];
        assert!(!unsafe { copy_to_buf("abcd", buf.as_mut_ptr(), 4) });
        assert!(unsafe { copy_to_buf("abc", buf.as_mut_ptr(), 4) });
        assert_eq!(buf[3], 0);
        let empty = BorrowedStr::empty().as_ptr();
        assert_eq!(unsafe { CStr::from_ptr(empty) }.to_bytes(), b"");
    }
}
