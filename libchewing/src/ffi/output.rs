//! Buffers, candidates, cursors and user phrases.

use std::ffi::{c_char, c_int, c_uint, c_ushort};
use std::ptr;

use libchewing_core::{KeyBehavior, KeyboardLayout};

use super::context::empty_static;
use super::{ctx_mut, ctx_ref, status, ChewingContext, ERROR, OK};
use crate::transit::{copy_to_buf, owned_shorts, str_from_ptr, OwnedString};

fn owned_empty() -> *mut c_char {
    OwnedString::empty().into_raw()
}

fn owned(s: &str) -> *mut c_char {
    OwnedString::new(s).into_raw()
}

// ----- commit, buffer and preedit -----

/// 1 when the last call committed text.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_commit_Check(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.has_commit() as c_int
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_commit_String(ctx: *const ChewingContext) -> *mut c_char {
    let ctx = ctx_ref!(ctx, owned_empty());
    owned(ctx.session.commit_string())
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_commit_String_static(ctx: *mut ChewingContext) -> *const c_char {
    let ctx = ctx_mut!(ctx, empty_static());
    let text = ctx.session.commit_string().to_string();
    ctx.commit_slot.set(&text).as_ptr()
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_buffer_String(ctx: *const ChewingContext) -> *mut c_char {
    let ctx = ctx_ref!(ctx, owned_empty());
    owned(&ctx.session.buffer_string())
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_buffer_String_static(ctx: *mut ChewingContext) -> *const c_char {
    let ctx = ctx_mut!(ctx, empty_static());
    let text = ctx.session.buffer_string();
    ctx.buffer_slot.set(&text).as_ptr()
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_buffer_Check(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    (ctx.session.buffer_len() > 0) as c_int
}

/// Number of symbols in the composition buffer.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_buffer_Len(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.buffer_len() as c_int
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_bopomofo_String(ctx: *const ChewingContext) -> *mut c_char {
    let ctx = ctx_ref!(ctx, owned_empty());
    owned(&ctx.session.bopomofo_string())
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_bopomofo_String_static(ctx: *mut ChewingContext) -> *const c_char {
    let ctx = ctx_mut!(ctx, empty_static());
    let text = ctx.session.bopomofo_string();
    ctx.bopomofo_slot.set(&text).as_ptr()
}

/// 1 while a syllable is being spelled.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_bopomofo_Check(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    !ctx.session.bopomofo_string().is_empty() as c_int
}

/// Inverse of [`chewing_bopomofo_Check`], kept for old callers.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_zuin_Check(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.bopomofo_string().is_empty() as c_int
}

/// Owned preedit text; its length in characters goes to `count` when
/// that is not null.
///
/// # Safety
///
/// `ctx` must be null or a live handle; `count` null or writable.
#[no_mangle]
pub unsafe extern "C" fn chewing_zuin_String(
    ctx: *const ChewingContext,
    count: *mut c_int,
) -> *mut c_char {
    let ctx = ctx_ref!(ctx, owned_empty());
    let text = ctx.session.bopomofo_string();
    if let Some(count) = count.as_mut() {
        *count = text.chars().count() as c_int;
    }
    owned(&text)
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cursor_Current(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.cursor() as c_int
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_commit_preedit_buf(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    if ctx.session.is_selecting() {
        return ERROR;
    }
    status(ctx.session.commit_preedit())
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_clean_preedit_buf(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    if ctx.session.is_selecting() {
        return ERROR;
    }
    ctx.session.clean_preedit();
    OK
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_clean_bopomofo_buf(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    ctx.session.clean_bopomofo();
    OK
}

/// Phone codes of the syllables in the buffer, owned by the caller.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_get_phoneSeq(ctx: *const ChewingContext) -> *mut c_ushort {
    let ctx = ctx_ref!(ctx, ptr::null_mut());
    owned_shorts(ctx.session.phone_seq())
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_get_phoneSeqLen(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.phone_seq().len() as c_int
}

// ----- aux and keystroke outcome -----

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_aux_Check(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    !ctx.session.aux_string().is_empty() as c_int
}

/// Length of the aux message in characters.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_aux_Length(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.aux_string().chars().count() as c_int
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_aux_String(ctx: *const ChewingContext) -> *mut c_char {
    let ctx = ctx_ref!(ctx, owned_empty());
    owned(ctx.session.aux_string())
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_aux_String_static(ctx: *mut ChewingContext) -> *const c_char {
    let ctx = ctx_mut!(ctx, empty_static());
    let text = ctx.session.aux_string().to_string();
    ctx.aux_slot.set(&text).as_ptr()
}

/// 1 when the last key was not handled and belongs to the application.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_keystroke_CheckIgnore(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    (ctx.session.last_behavior() == KeyBehavior::Ignore) as c_int
}

/// 1 when the last key was consumed.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_keystroke_CheckAbsorb(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    matches!(
        ctx.session.last_behavior(),
        KeyBehavior::Absorb | KeyBehavior::Commit
    ) as c_int
}

// ----- candidate window -----

/// 1 when no candidate window is open.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_CheckDone(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    !ctx.session.is_selecting() as c_int
}

/// Pages in the open window; 0 when the window is closed.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_TotalPage(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.cand_total_pages() as c_int
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_ChoicePerPage(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.cand_choice_per_page() as c_int
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_TotalChoice(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.cand_total_choices() as c_int
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_CurrentPage(ctx: *const ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.cand_current_page() as c_int
}

/// Start walking the open candidate list from its first entry.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_Enumerate(ctx: *mut ChewingContext) {
    let ctx = ctx_mut!(ctx);
    ctx.session.cand_enumerate();
}

/// 1 while the walk has entries left. A walk invalidated by a key or a
/// selection reports 0 until [`chewing_cand_Enumerate`] is called again.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_hasNext(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    ctx.session.cand_has_next() as c_int
}

/// Next candidate of the walk, owned; empty once the walk is over.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_String(ctx: *mut ChewingContext) -> *mut c_char {
    let ctx = ctx_mut!(ctx, owned_empty());
    match ctx.session.cand_next() {
        Some(text) => owned(&text),
        None => owned_empty(),
    }
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_String_static(ctx: *mut ChewingContext) -> *const c_char {
    let ctx = ctx_mut!(ctx, empty_static());
    let text = ctx.session.cand_next().unwrap_or_default();
    ctx.cand_slot.set(&text).as_ptr()
}

/// Candidate at `index` over the whole open list, owned.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_string_by_index(
    ctx: *const ChewingContext,
    index: c_int,
) -> *mut c_char {
    let ctx = ctx_ref!(ctx, owned_empty());
    usize::try_from(index)
        .ok()
        .and_then(|i| ctx.session.cand_string_by_index(i))
        .map_or_else(owned_empty, owned)
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_string_by_index_static(
    ctx: *mut ChewingContext,
    index: c_int,
) -> *const c_char {
    let ctx = ctx_mut!(ctx, empty_static());
    let text = usize::try_from(index)
        .ok()
        .and_then(|i| ctx.session.cand_string_by_index(i))
        .unwrap_or_default()
        .to_string();
    ctx.cand_slot.set(&text).as_ptr()
}

/// Pick the candidate at `index` over the whole open list.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_choose_by_index(ctx: *mut ChewingContext, index: c_int) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    match usize::try_from(index) {
        Ok(index) => status(ctx.session.choose_by_index(index)),
        Err(_) => ERROR,
    }
}

/// Open the candidate window for the span at the cursor.
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_open(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    status(ctx.session.cand_open())
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_close(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    ctx.session.cand_close();
    OK
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_list_has_next(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, 0);
    ctx.session.cand_list_has_next() as c_int
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_cand_list_has_prev(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, 0);
    ctx.session.cand_list_has_prev() as c_int
}

macro_rules! list_moves {
    ($($name:ident => $method:ident;)*) => {
        $(
            /// Switch to another phrase-length list; -1 when there is none.
            ///
            /// # Safety
            ///
            /// `ctx` must be null or a live handle.
            #[no_mangle]
            pub unsafe extern "C" fn $name(ctx: *mut ChewingContext) -> c_int {
                let ctx = ctx_mut!(ctx, ERROR);
                status(ctx.session.$method())
            }
        )*
    };
}

list_moves! {
    chewing_cand_list_first => cand_list_first;
    chewing_cand_list_last => cand_list_last;
    chewing_cand_list_next => cand_list_next;
    chewing_cand_list_prev => cand_list_prev;
}

// ----- intervals -----

/// A converted phrase span, in symbol offsets.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntervalType {
    pub from: c_int,
    pub to: c_int,
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_interval_Enumerate(ctx: *mut ChewingContext) {
    let ctx = ctx_mut!(ctx);
    ctx.session.interval_enumerate();
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_interval_hasNext(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.interval_has_next() as c_int
}

/// Write the next interval into `it`. Past the end `it` is left untouched.
///
/// # Safety
///
/// `ctx` must be null or a live handle; `it` null or writable.
#[no_mangle]
pub unsafe extern "C" fn chewing_interval_Get(ctx: *mut ChewingContext, it: *mut IntervalType) {
    let ctx = ctx_mut!(ctx);
    let Some(it) = it.as_mut() else {
        return;
    };
    if let Some(interval) = ctx.session.interval_next() {
        it.from = interval.start as c_int;
        it.to = interval.end as c_int;
    }
}

// ----- keyboard layouts -----

/// Number of layout ids, supported or not.
#[no_mangle]
pub extern "C" fn chewing_kbtype_Total(_ctx: *const ChewingContext) -> c_int {
    KeyboardLayout::ALL.len() as c_int
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_kbtype_Enumerate(ctx: *mut ChewingContext) {
    let ctx = ctx_mut!(ctx);
    ctx.session.kbtype_enumerate();
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_kbtype_hasNext(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_ref!(ctx, ERROR);
    ctx.session.kbtype_has_next() as c_int
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_kbtype_String(ctx: *mut ChewingContext) -> *mut c_char {
    let ctx = ctx_mut!(ctx, owned_empty());
    ctx.session
        .kbtype_next()
        .map_or_else(owned_empty, |layout| owned(layout.name()))
}

/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_kbtype_String_static(ctx: *mut ChewingContext) -> *const c_char {
    let ctx = ctx_mut!(ctx, empty_static());
    let name = ctx.session.kbtype_next().map_or("", KeyboardLayout::name);
    ctx.kbtype_slot.set(name).as_ptr()
}

// ----- user phrases -----

/// Snapshot the user phrases for [`chewing_userphrase_get`].
///
/// # Safety
///
/// `ctx` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn chewing_userphrase_enumerate(ctx: *mut ChewingContext) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    ctx.session.userphrase_enumerate();
    OK
}

/// 1 when another phrase is available. The buffer sizes it needs, NUL
/// included, go to `phrase_len` and `bopomofo_len`.
///
/// # Safety
///
/// `ctx` must be null or a live handle; the length pointers null or
/// writable.
#[no_mangle]
pub unsafe extern "C" fn chewing_userphrase_has_next(
    ctx: *mut ChewingContext,
    phrase_len: *mut c_uint,
    bopomofo_len: *mut c_uint,
) -> c_int {
    let ctx = ctx_ref!(ctx, 0);
    let Some(entry) = ctx.session.userphrase_peek() else {
        return 0;
    };
    if let Some(len) = phrase_len.as_mut() {
        *len = (entry.phrase.len() + 1) as c_uint;
    }
    if let Some(len) = bopomofo_len.as_mut() {
        *len = (entry.bopomofo.len() + 1) as c_uint;
    }
    1
}

/// Copy the next phrase into the caller's buffers. -1 when the walk is
/// over or a buffer is too small; the walk only advances on success.
///
/// # Safety
///
/// `ctx` must be null or a live handle; each buffer null or writable for
/// its length.
#[no_mangle]
pub unsafe extern "C" fn chewing_userphrase_get(
    ctx: *mut ChewingContext,
    phrase_buf: *mut c_char,
    phrase_len: c_uint,
    bopomofo_buf: *mut c_char,
    bopomofo_len: c_uint,
) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    let Some(entry) = ctx.session.userphrase_peek() else {
        return ERROR;
    };
    let fits = phrase_buf.is_null() || entry.phrase.len() < phrase_len as usize;
    let fits = fits && (bopomofo_buf.is_null() || entry.bopomofo.len() < bopomofo_len as usize);
    if !fits {
        return ERROR;
    }
    copy_to_buf(&entry.phrase, phrase_buf, phrase_len);
    copy_to_buf(&entry.bopomofo, bopomofo_buf, bopomofo_len);
    ctx.session.userphrase_next();
    OK
}

/// 1 when added, 0 when not (already present or unparsable bopomofo),
/// -1 without a phrase.
///
/// # Safety
///
/// `ctx` must be null or a live handle; strings null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn chewing_userphrase_add(
    ctx: *mut ChewingContext,
    phrase: *const c_char,
    bopomofo: *const c_char,
) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    let Some(phrase) = str_from_ptr(phrase) else {
        return ERROR;
    };
    let Some(bopomofo) = str_from_ptr(bopomofo) else {
        return 0;
    };
    ctx.session
        .add_user_phrase(phrase, bopomofo)
        .map_or(0, |added| added as c_int)
}

/// 1 when removed, 0 when it was not there, -1 without a phrase.
///
/// # Safety
///
/// `ctx` must be null or a live handle; strings null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn chewing_userphrase_remove(
    ctx: *mut ChewingContext,
    phrase: *const c_char,
    bopomofo: *const c_char,
) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    let Some(phrase) = str_from_ptr(phrase) else {
        return ERROR;
    };
    let Some(bopomofo) = str_from_ptr(bopomofo) else {
        return 0;
    };
    ctx.session
        .remove_user_phrase(phrase, bopomofo)
        .map_or(0, |removed| removed as c_int)
}

/// 1 when the phrase is stored under `bopomofo`. A null phrase matches any
/// phrase under it; a null `bopomofo` matches the phrase under any key.
///
/// # Safety
///
/// `ctx` must be null or a live handle; strings null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn chewing_userphrase_lookup(
    ctx: *mut ChewingContext,
    phrase: *const c_char,
    bopomofo: *const c_char,
) -> c_int {
    let ctx = ctx_ref!(ctx, 0);
    ctx.session
        .lookup_user_phrase(str_from_ptr(phrase), str_from_ptr(bopomofo)) as c_int
}
