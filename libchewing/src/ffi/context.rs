//! Context lifecycle, callbacks and configuration.

use std::ffi::{c_char, c_int, c_void};
use std::path::PathBuf;
use std::ptr;

use libchewing_core::{AddDirection, CharacterForm, KeyboardLayout, LanguageMode};
use tracing::warn;

use super::{
    c_logger, ctx_mut, ctx_ref, live, status, ChewingContext, ChewingLogger, UserData, ERROR,
    MAX_SELKEY, OK,
};
use crate::callbacks::{CandidateInfo, Callbacks};
use crate::config::{OptionKind, SessionConfig};
use crate::logger::LogLevel;
use crate::session::Session;
use crate::transit::{self, owned_ints, str_from_ptr, to_cstring, BorrowedStr, OwnedString};

static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Library version. The string is static and never freed.
#[no_mangle]
pub extern "C" fn chewing_version() -> *const c_char {
    VERSION.as_ptr().cast()
}

/// Open a context with paths taken from the environment.
///
/// # Safety
///
/// Always safe to call; the result must be released with [`chewing_delete`].
#[no_mangle]
pub unsafe extern "C" fn chewing_new() -> *mut ChewingContext {
    chewing_new2(ptr::null(), ptr::null(), None, ptr::null_mut())
}

/// Open a context. A null `syspath` or `userpath` is resolved from the
/// environment. Returns null when the dictionary or the user store cannot
/// be opened; the reason goes to `logger`.
///
/// # Safety
///
/// Paths must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn chewing_new2(
    syspath: *const c_char,
    userpath: *const c_char,
    logger: Option<ChewingLogger>,
    logger_data: *mut c_void,
) -> *mut ChewingContext {
    let mut config = SessionConfig::default();
    config.data_path = str_from_ptr(syspath).map(PathBuf::from);
    config.user_path = str_from_ptr(userpath).map(PathBuf::from);
    let mut callbacks = Callbacks::new();
    if let Some(logger) = logger {
        callbacks.log = Some(c_logger(logger, logger_data));
    }
    match Session::open(config, callbacks) {
        Ok(session) => {
            let raw = Box::into_raw(Box::new(ChewingContext::new(session)));
            live().insert(raw as usize);
            raw
        }
        Err(_) => ptr::null_mut(),
    }
}

/// Release a context. Null and already released handles are ignored.
///
/// # Safety
///
/// `ctx` must be null or a handle from `chewing_new*`.
#[no_mangle]
pub unsafe extern "C" fn chewing_delete(ctx: *mut ChewingContext) {
    if ctx.is_null() || !live().remove(&(ctx as usize)) {
        return;
    }
    drop(Box::from_raw(ctx));
}

/// Release a string or array returned as owned.
///
/// # Safety
///
/// `ptr` must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn chewing_free(ptr: *mut c_void) {
    transit::release(ptr);
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_Reset(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    ctx.session.reset();
    OK
}

/// Clear the commit buffer.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_ack(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    ctx.session.ack();
    OK
}

/// Replace the log callback. A null `logger` silences logging.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_set_logger(
    ctx: *mut ChewingContext,
    logger: Option<ChewingLogger>,
    logger_data: *mut c_void,
) {
    let ctx = ctx_mut!(ctx);
    ctx.session
        .set_log_callback(logger.map(|l| c_logger(l, logger_data)));
}

/// Per-context callback table. Every slot may be null.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ChewingCallbacks {
    pub candidate_info: Option<
        unsafe extern "C" fn(
            user_data: *mut c_void,
            page_size: c_int,
            total_pages: c_int,
            current_page: c_int,
            total_choices: c_int,
            candidates: *const *const c_char,
            count: c_int,
        ),
    >,
    pub buffer: Option<unsafe extern "C" fn(user_data: *mut c_void, text: *const c_char)>,
    pub bopomofo: Option<unsafe extern "C" fn(user_data: *mut c_void, text: *const c_char)>,
    pub commit: Option<unsafe extern "C" fn(user_data: *mut c_void, text: *const c_char)>,
    pub logger:
        Option<unsafe extern "C" fn(user_data: *mut c_void, level: c_int, message: *const c_char)>,
}

type TextCallback = unsafe extern "C" fn(*mut c_void, *const c_char);

fn text_callback(f: TextCallback, data: UserData) -> impl FnMut(&str) + Send + 'static {
    move |text: &str| {
        let text = to_cstring(text);
        unsafe { f(data.get(), text.as_ptr()) }
    }
}

pub(crate) fn callbacks_from_table(table: &ChewingCallbacks, data: UserData) -> Callbacks {
    let mut callbacks = Callbacks::new();
    if let Some(f) = table.candidate_info {
        callbacks = callbacks.on_candidate_info(move |info: &CandidateInfo<'_>| {
            let texts: Vec<_> = info.candidates.iter().map(|c| to_cstring(c)).collect();
            let ptrs: Vec<*const c_char> = texts.iter().map(|c| c.as_ptr()).collect();
            unsafe {
                f(
                    data.get(),
                    info.page_size as c_int,
                    info.total_pages as c_int,
                    info.current_page as c_int,
                    info.total_choices as c_int,
                    ptrs.as_ptr(),
                    ptrs.len() as c_int,
                )
            }
        });
    }
    if let Some(f) = table.buffer {
        callbacks = callbacks.on_buffer(text_callback(f, data));
    }
    if let Some(f) = table.bopomofo {
        callbacks = callbacks.on_preedit(text_callback(f, data));
    }
    if let Some(f) = table.commit {
        callbacks = callbacks.on_commit(text_callback(f, data));
    }
    if let Some(f) = table.logger {
        callbacks = callbacks.on_log(move |level: LogLevel, message: &str| {
            let message = to_cstring(message);
            unsafe { f(data.get(), level.to_c(), message.as_ptr()) }
        });
    }
    callbacks
}

/// Install the callback table for this context. `user_data` is passed to
/// every callback. A null table clears all callbacks, including the logger.
///
/// # Safety
///
/// `ctx` must be null or a live handle; `callbacks` null or valid.
#[no_mangle]
pub unsafe extern "C" fn chewing_set_callbacks(
    ctx: *mut ChewingContext,
    callbacks: *const ChewingCallbacks,
    user_data: *mut c_void,
) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    let table = callbacks.as_ref().copied().unwrap_or_default();
    ctx.session
        .set_callbacks(callbacks_from_table(&table, UserData::new(user_data)));
    OK
}

// ----- string-keyed configuration -----

/// 1 when `name` is a known option, 0 otherwise.
///
/// # Safety
///
/// `ctx` must be null or a live handle; `name` null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn chewing_config_has_option(
    ctx: *const ChewingContext,
    name: *const c_char,
) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    str_from_ptr(name).is_some_and(|n| ctx.session.has_option(n)) as c_int
}

/// Integer option value, -1 for unknown or string options.
///
/// # Safety
///
/// `ctx` must be null or a live handle; `name` null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn chewing_config_get_int(
    ctx: *const ChewingContext,
    name: *const c_char,
) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    str_from_ptr(name)
        .and_then(|n| ctx.session.get_int(n).ok())
        .unwrap_or(ERROR)
}

/// Returns 0 when the value was stored, -1 when it was rejected.
///
/// # Safety
///
/// `ctx` must be null or a live handle; `name` null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn chewing_config_set_int(
    ctx: *mut ChewingContext,
    name: *const c_char,
    value: c_int,
) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    let Some(name) = str_from_ptr(name) else {
        return ERROR;
    };
    status(ctx.session.set_int(name, value).is_ok())
}

/// Store a string option into `*value` as an owned string.
///
/// # Safety
///
/// `ctx` must be null or a live handle; `name` null or NUL-terminated;
/// `value` null or writable.
#[no_mangle]
pub unsafe extern "C" fn chewing_config_get_str(
    ctx: *const ChewingContext,
    name: *const c_char,
    value: *mut *mut c_char,
) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    let Some(out) = value.as_mut() else {
        return ERROR;
    };
    match str_from_ptr(name).map(|n| ctx.session.get_str(n)) {
        Some(Ok(s)) => {
            *out = OwnedString::new(&s).into_raw();
            OK
        }
        _ => ERROR,
    }
}

/// # Safety
///
/// `ctx` must be null or a live handle; `name` and `value` null or
/// NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn chewing_config_set_str(
    ctx: *mut ChewingContext,
    name: *const c_char,
    value: *const c_char,
) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    match (str_from_ptr(name), str_from_ptr(value)) {
        (Some(name), Some(value)) => status(ctx.session.set_str(name, value).is_ok()),
        _ => ERROR,
    }
}

// ----- keyboard layout -----

/// Select a layout by id. Unknown or unsupported ids select `KB_DEFAULT`
/// and return -1.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_set_KBType(ctx: *mut ChewingContext, kbtype: c_int) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    match KeyboardLayout::from_id(kbtype) {
        Some(layout) => status(ctx.session.set_keyboard_layout(layout).is_ok()),
        None => {
            warn!(kbtype, "unknown keyboard layout id");
            let _ = ctx.session.set_keyboard_layout(KeyboardLayout::Default);
            ERROR
        }
    }
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_get_KBType(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.keyboard_layout().id()
}

/// Layout name, owned by the caller.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_get_KBString(ctx: *const ChewingContext) -> *mut c_char {
    let ctx = ctx_ref!(ctx, OwnedString::empty().into_raw());
    OwnedString::new(ctx.session.keyboard_layout().name()).into_raw()
}

/// Layout id for a name such as `"KB_HSU"`; unknown names give `KB_DEFAULT`.
///
/// # Safety
///
/// `name` must be null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn chewing_KBStr2Num(name: *const c_char) -> c_int {
    str_from_ptr(name)
        .and_then(|n| n.parse::<KeyboardLayout>().ok())
        .map_or(0, KeyboardLayout::id)
}

// ----- typed options -----

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_set_ChiEngMode(ctx: *mut ChewingContext, mode: c_int) {
    let ctx = ctx_mut!(ctx);
    match LanguageMode::from_id(mode) {
        Some(mode) => ctx.session.set_language_mode(mode),
        None => warn!(mode, "invalid language mode"),
    }
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_get_ChiEngMode(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.language_mode().id()
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_set_ShapeMode(ctx: *mut ChewingContext, mode: c_int) {
    let ctx = ctx_mut!(ctx);
    match CharacterForm::from_id(mode) {
        Some(form) => ctx.session.set_character_form(form),
        None => warn!(mode, "invalid shape mode"),
    }
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_get_ShapeMode(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.character_form().id()
}

/// Out of range values are ignored.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_set_candPerPage(ctx: *mut ChewingContext, n: c_int) {
    let ctx = ctx_mut!(ctx);
    let _ = ctx.session.set_candidates_per_page(n);
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_get_candPerPage(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.candidates_per_page() as c_int
}

/// Out of range values are ignored.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_set_maxChiSymbolLen(ctx: *mut ChewingContext, n: c_int) {
    let ctx = ctx_mut!(ctx);
    let _ = ctx.session.set_max_symbol_len(n);
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_get_maxChiSymbolLen(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.max_symbol_len() as c_int
}

/// Set the selection keys from `len` key codes. `len` must equal the
/// current candidates per page; otherwise the keys are left unchanged.
///
/// # Safety
///
/// `ctx` must be null or a live handle; `keys` null or valid for `len`
/// reads.
#[no_mangle]
pub unsafe extern "C" fn chewing_set_selKey(ctx: *mut ChewingContext, keys: *const c_int, len: c_int) {
    let ctx = ctx_mut!(ctx);
    let Ok(len) = usize::try_from(len) else {
        return;
    };
    if keys.is_null() || len > MAX_SELKEY {
        warn!(len, "rejecting selection keys");
        return;
    }
    let codes = std::slice::from_raw_parts(keys, len);
    let keys: Option<String> = codes
        .iter()
        .map(|&k| u8::try_from(k).ok().filter(u8::is_ascii).map(char::from))
        .collect();
    match keys {
        Some(keys) => {
            let _ = ctx.session.set_selection_keys(&keys);
        }
        None => warn!("selection keys must be ASCII"),
    }
}

/// The selection keys as an owned array of [`MAX_SELKEY`] key codes,
/// zero padded.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_get_selKey(ctx: *const ChewingContext) -> *mut c_int {
    let ctx = ctx_ref!(ctx, ptr::null_mut());
    let mut codes: Vec<c_int> = ctx.session.selection_keys().bytes().map(c_int::from).collect();
    codes.resize(MAX_SELKEY, 0);
    owned_ints(codes)
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_set_addPhraseDirection(ctx: *mut ChewingContext, direction: c_int) {
    let ctx = ctx_mut!(ctx);
    match AddDirection::from_id(direction) {
        Some(d) => ctx.session.set_add_direction(d),
        None => warn!(direction, "invalid phrase direction"),
    }
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_get_addPhraseDirection(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.add_direction().id()
}

macro_rules! toggle_functions {
    ($($set:ident, $get:ident => $session_set:ident, $session_get:ident;)*) => {
        $(
            /// Any nonzero value turns the option on.
            ///
            /// # Safety
            ///
            /// `ctx` must be null or a live handle.
            #[no_mangle]
            pub unsafe extern "C" fn $set(ctx: *mut ChewingContext, mode: c_int) {
                let ctx = ctx_mut!(ctx);
                ctx.session.$session_set(mode != 0);
            }

            /// # Safety
            ///
            /// `ctx` must be null or a live handle.
            #[no_mangle]
            pub unsafe extern "C" fn $get(ctx: *const ChewingContext) -> c_int {
                let ctx = ctx_ref!(ctx, ERROR);
                ctx.session.$session_get() as c_int
            }
        )*
    };
}

toggle_functions! {
    chewing_set_spaceAsSelection, chewing_get_spaceAsSelection
        => set_space_is_select_key, space_is_select_key;
    chewing_set_escCleanAllBuf, chewing_get_escCleanAllBuf
        => set_esc_clear_all_buffer, esc_clear_all_buffer;
    chewing_set_autoShiftCur, chewing_get_autoShiftCur
        => set_auto_shift_cursor, auto_shift_cursor;
    chewing_set_easySymbolInput, chewing_get_easySymbolInput
        => set_easy_symbol_input, easy_symbol_input;
    chewing_set_phraseChoiceRearward, chewing_get_phraseChoiceRearward
        => set_phrase_choice_rearward, phrase_choice_rearward;
    chewing_set_autoLearn, chewing_get_autoLearn
        => set_disable_auto_learn_phrase, disable_auto_learn_phrase;
}

/// Kind of a configuration option: 0 integer, 1 string, -1 unknown.
///
/// # Safety
///
/// `ctx` must be null or a live handle; `name` null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn chewing_config_option_kind(
    ctx: *const ChewingContext,
    name: *const c_char,
) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    match str_from_ptr(name).and_then(|n| ctx.session.option_kind(n)) {
        Some(OptionKind::Int) => 0,
        Some(OptionKind::Str) => 1,
        None => ERROR,
    }
}

/// Empty borrowed string returned when there is no context.
pub(crate) fn empty_static() -> *const c_char {
    BorrowedStr::empty().as_ptr()
}
