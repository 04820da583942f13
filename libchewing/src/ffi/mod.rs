//! Flat C ABI.
//!
//! Every `chewing_*` function takes the context handle returned by
//! [`chewing_new`] or [`chewing_new2`]. Passing a null or deleted handle is
//! always safe and yields the function's documented sentinel: `-1` for status and
//! numeric results, `0` for predicates, an empty string for text, null for
//! arrays, and nothing at all for functions without a result.
//!
//! Text comes back in one of two forms that differ by type. A `*mut c_char`
//! is owned by the caller and released with [`chewing_free`]. A
//! `*const c_char` (the `_static` functions) points into the context and
//! stays valid until the next call that changes that context.
//!
//! Callbacks run synchronously inside the call that triggered them and must
//! not call back into the same context.

pub mod context;
pub mod keys;
pub mod output;
pub mod simplified;

use std::collections::BTreeSet;
use std::ffi::{c_char, c_int, c_void};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;

use crate::logger::{LogFn, LogLevel};
use crate::session::Session;
use crate::transit::{to_cstring, StaticSlot};

pub const CHINESE_MODE: c_int = 1;
pub const SYMBOL_MODE: c_int = 0;
pub const FULLSHAPE_MODE: c_int = 1;
pub const HALFSHAPE_MODE: c_int = 0;

pub const SIMPLE_CONVERSION_ENGINE: c_int = 0;
pub const CHEWING_CONVERSION_ENGINE: c_int = 1;
pub const FUZZY_CHEWING_CONVERSION_ENGINE: c_int = 2;

pub const MAX_SELKEY: usize = 10;

pub const CHEWING_LOG_VERBOSE: c_int = 1;
pub const CHEWING_LOG_DEBUG: c_int = 2;
pub const CHEWING_LOG_INFO: c_int = 3;
pub const CHEWING_LOG_WARN: c_int = 4;
pub const CHEWING_LOG_ERROR: c_int = 5;
pub const CHEWING_LOG_CRITICAL: c_int = 6;

pub(crate) const OK: c_int = 0;
pub(crate) const ERROR: c_int = -1;

/// The classic printf-style logger. It is always called with format `"%s"`.
pub type ChewingLogger = unsafe extern "C" fn(data: *mut c_void, level: c_int, fmt: *const c_char, ...);

/// Opaque per-session handle.
pub struct ChewingContext {
    pub(crate) session: Session,
    pub(crate) commit_slot: StaticSlot,
    pub(crate) buffer_slot: StaticSlot,
    pub(crate) bopomofo_slot: StaticSlot,
    pub(crate) aux_slot: StaticSlot,
    pub(crate) cand_slot: StaticSlot,
    pub(crate) kbtype_slot: StaticSlot,
}

impl ChewingContext {
    pub(crate) fn new(session: Session) -> Self {
        Self {
            session,
            commit_slot: StaticSlot::default(),
            buffer_slot: StaticSlot::default(),
            bopomofo_slot: StaticSlot::default(),
            aux_slot: StaticSlot::default(),
            cand_slot: StaticSlot::default(),
            kbtype_slot: StaticSlot::default(),
        }
    }
}

/// Handles returned by `chewing_new*` and not yet deleted.
static LIVE: Lazy<Mutex<BTreeSet<usize>>> = Lazy::new(Default::default);

pub(crate) fn live() -> MutexGuard<'static, BTreeSet<usize>> {
    LIVE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// True for handles returned by `chewing_new*` and not yet deleted. Null
/// and released handles are both dead.
pub(crate) fn is_live(ctx: *const ChewingContext) -> bool {
    !ctx.is_null() && live().contains(&(ctx as usize))
}

/// Opaque pointer handed back to C callbacks untouched.
#[derive(Clone, Copy)]
pub(crate) struct UserData(*mut c_void);

// The pointer is only passed back to the caller's own callbacks.
unsafe impl Send for UserData {}

impl UserData {
    pub(crate) fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub(crate) fn get(self) -> *mut c_void {
        self.0
    }
}

pub(crate) fn c_logger(logger: ChewingLogger, data: *mut c_void) -> LogFn {
    let data = UserData::new(data);
    Box::new(move |level: LogLevel, message: &str| {
        let message = to_cstring(message);
        unsafe {
            logger(
                data.get(),
                level.to_c(),
                b"%s\0".as_ptr().cast(),
                message.as_ptr(),
            )
        }
    })
}

/// Borrow the context behind `ctx`, or return `$sentinel` when the handle
/// is null or already deleted.
macro_rules! ctx_ref {
    ($ctx:expr) => {
        ctx_ref!($ctx, ())
    };
    ($ctx:expr, $sentinel:expr) => {{
        let ptr = $ctx;
        if !$crate::ffi::is_live(ptr as *const $crate::ffi::ChewingContext) {
            return $sentinel;
        }
        match unsafe { ptr.as_ref() } {
            Some(ctx) => ctx,
            None => return $sentinel,
        }
    }};
}

macro_rules! ctx_mut {
    ($ctx:expr) => {
        ctx_mut!($ctx, ())
    };
    ($ctx:expr, $sentinel:expr) => {{
        let ptr = $ctx;
        if !$crate::ffi::is_live(ptr as *const $crate::ffi::ChewingContext) {
            return $sentinel;
        }
        match unsafe { ptr.as_mut() } {
            Some(ctx) => ctx,
            None => return $sentinel,
        }
    }};
}

pub(crate) use {ctx_mut, ctx_ref};

pub(crate) fn status(ok: bool) -> c_int {
    if ok {
        OK
    } else {
        ERROR
    }
}

pub use context::*;
pub use keys::*;
pub use output::*;
pub use simplified::*;
