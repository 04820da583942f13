//! C surface of the single-listener API.
//!
//! The `cs_*` callbacks carry no user data, so only the most recently
//! initialized session can reach them. See [`crate::simplified`].

#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_int};
use std::path::PathBuf;

use libchewing_core::KeyboardLayout;

use crate::callbacks::{CandidateInfo, Callbacks};
use crate::config::SessionConfig;
use crate::logger::LogLevel;
use crate::simplified;
use crate::transit::{str_from_ptr, to_cstring};

pub type cs_candidate_info_callback_t = Option<
    unsafe extern "C" fn(
        page_size: c_int,
        num_pages: c_int,
        candidates_on_page: c_int,
        total_choices: c_int,
        candidates: *const *const c_char,
    ),
>;
pub type cs_text_callback_t = Option<unsafe extern "C" fn(text: *const c_char)>;
pub type cs_logger_callback_t = Option<unsafe extern "C" fn(level: c_int, message: *const c_char)>;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct cs_config_t {
    pub data_path: *const c_char,
    pub cand_per_page: c_int,
    pub max_chi_symbol_len: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct cs_callbacks_t {
    pub candidate_info: cs_candidate_info_callback_t,
    pub buffer: cs_text_callback_t,
    pub bopomofo: cs_text_callback_t,
    pub commit: cs_text_callback_t,
    pub logger: cs_logger_callback_t,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct cs_context_t {
    pub config: cs_config_t,
    pub callbacks: cs_callbacks_t,
}

/// Entries of the current page, given the whole list's shape.
fn on_page(info: &CandidateInfo<'_>) -> usize {
    let shown = info.current_page * info.page_size;
    info.total_choices.saturating_sub(shown).min(info.page_size)
}

fn text_callback(
    f: unsafe extern "C" fn(*const c_char),
) -> impl FnMut(&str) + Send + 'static {
    move |text: &str| {
        let text = to_cstring(text);
        unsafe { f(text.as_ptr()) }
    }
}

fn callbacks_from_table(table: &cs_callbacks_t) -> Callbacks {
    let mut callbacks = Callbacks::new();
    if let Some(f) = table.candidate_info {
        callbacks = callbacks.on_candidate_info(move |info: &CandidateInfo<'_>| {
            let texts: Vec<_> = info.candidates.iter().map(|c| to_cstring(c)).collect();
            let ptrs: Vec<*const c_char> = texts.iter().map(|c| c.as_ptr()).collect();
            unsafe {
                f(
                    info.page_size as c_int,
                    info.total_pages as c_int,
                    on_page(info) as c_int,
                    info.total_choices as c_int,
                    ptrs.as_ptr(),
                )
            }
        });
    }
    if let Some(f) = table.buffer {
        callbacks = callbacks.on_buffer(text_callback(f));
    }
    if let Some(f) = table.bopomofo {
        callbacks = callbacks.on_preedit(text_callback(f));
    }
    if let Some(f) = table.commit {
        callbacks = callbacks.on_commit(text_callback(f));
    }
    if let Some(f) = table.logger {
        callbacks = callbacks.on_log(move |level: LogLevel, message: &str| {
            let message = to_cstring(message);
            unsafe { f(level.to_c(), message.as_ptr()) }
        });
    }
    callbacks
}

/// Open the process-wide session, replacing any active one. Candidates per
/// page and the symbol limit are applied after opening; rejected values
/// leave the defaults in place.
///
/// # Safety
///
/// `ctx` must be null or valid, with `data_path` null or NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn cs_init(ctx: *const cs_context_t) -> bool {
    let Some(ctx) = ctx.as_ref() else {
        return false;
    };
    let Some(data_path) = str_from_ptr(ctx.config.data_path) else {
        return false;
    };
    let config = SessionConfig::default().with_data_path(PathBuf::from(data_path));
    if simplified::init(config, callbacks_from_table(&ctx.callbacks)).is_err() {
        return false;
    }
    simplified::with_active(|session| {
        let _ = session.set_candidates_per_page(ctx.config.cand_per_page);
        let _ = session.set_max_symbol_len(ctx.config.max_chi_symbol_len);
        let _ = session.set_keyboard_layout(KeyboardLayout::Default);
    });
    true
}

/// Close the process-wide session. False when none was open.
#[no_mangle]
pub extern "C" fn cs_terminate() -> bool {
    simplified::terminate()
}

/// Feed one key: 10 is Enter, 32 Space, 127 Backspace, anything else a
/// character key.
#[no_mangle]
pub extern "C" fn cs_process_key(key: c_char) {
    simplified::process_key(key as u8);
}

/// Pick candidate `index` for the span at the cursor.
#[no_mangle]
pub extern "C" fn cs_select_candidate(index: c_int) {
    simplified::select_candidate(index);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_counts_leftovers() {
        let names = ["a"; 12];
        let mut info = CandidateInfo {
            page_size: 5,
            total_pages: 3,
            current_page: 0,
            total_choices: 12,
            candidates: &names,
        };
        assert_eq!(on_page(&info), 5);
        info.current_page = 2;
        assert_eq!(on_page(&info), 2);
    }

    #[test]
    fn null_context_is_rejected() {
        assert!(!unsafe { cs_init(std::ptr::null()) });
        let ctx = cs_context_t {
            config: cs_config_t {
                data_path: std::ptr::null(),
                cand_per_page: 10,
                max_chi_symbol_len: 20,
            },
            callbacks: cs_callbacks_t::default(),
        };
        assert!(!unsafe { cs_init(&ctx) });
    }
}
