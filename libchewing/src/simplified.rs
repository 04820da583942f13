//! Single-listener convenience API.
//!
//! At most one session is active process-wide. [`init`] tears down the
//! active session, if any, before installing the new one, so only the
//! callbacks of the most recently initialized session receive events. Code
//! that needs several concurrent sessions should use [`Session`] directly,
//! where every session routes to its own callbacks.
//!
//! The active session is guarded by a mutex that is held while callbacks
//! run. Callbacks must not call back into this module.

use std::sync::{Mutex, MutexGuard};

use libchewing_core::{CandidateList, Key};
use once_cell::sync::Lazy;
use tracing::{debug, error};

use crate::callbacks::{CandidateFn, CandidateInfo, Callbacks};
use crate::config::SessionConfig;
use crate::error::OpenError;
use crate::logger::LogLevel;
use crate::session::Session;

pub const KEY_ENTER: u8 = 10;
pub const KEY_SPACE: u8 = b' ';
pub const KEY_BACKSPACE: u8 = 127;

const LOG_PREFIX: &str = "[chewing] ";

struct Active {
    session: Session,
    candidate_info: Option<CandidateFn>,
}

static ACTIVE: Lazy<Mutex<Option<Active>>> = Lazy::new(|| Mutex::new(None));

fn active() -> MutexGuard<'static, Option<Active>> {
    ACTIVE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Open a session and make it the active one. The previous active session
/// is closed first, even when opening the new one fails.
pub fn init(config: SessionConfig, mut callbacks: Callbacks) -> Result<(), OpenError> {
    let mut slot = active();
    if slot.take().is_some() {
        debug!("replacing active session");
    }
    let candidate_info = callbacks.candidate_info.take();
    if let Some(mut log) = callbacks.log.take() {
        callbacks.log = Some(Box::new(move |level: LogLevel, msg: &str| {
            log(level, &format!("{LOG_PREFIX}{msg}"))
        }));
    }
    let session = Session::open(config, callbacks)?;
    *slot = Some(Active {
        session,
        candidate_info,
    });
    Ok(())
}

/// Close the active session. False when none was active.
pub fn terminate() -> bool {
    match active().take() {
        Some(_) => true,
        None => {
            error!("terminate called without an active session");
            false
        }
    }
}

pub fn is_active() -> bool {
    active().is_some()
}

/// Run `f` on the active session.
pub fn with_active<R>(f: impl FnOnce(&mut Session) -> R) -> Option<R> {
    active().as_mut().map(|a| f(&mut a.session))
}

pub fn key_from_code(code: u8) -> Key {
    match code {
        KEY_ENTER => Key::Enter,
        KEY_SPACE => Key::Space,
        KEY_BACKSPACE => Key::Backspace,
        other => Key::Default(char::from(other)),
    }
}

/// Feed one key to the active session. For every key except Enter the
/// candidates for the span at the cursor are reported first, then the
/// preedit, buffer and commit changes.
pub fn process_key(code: u8) -> bool {
    let mut slot = active();
    let Some(active) = slot.as_mut() else {
        error!("process_key called without an active session");
        return false;
    };
    let key = key_from_code(code);
    active.session.handle_held(key);
    if key != Key::Enter {
        if let Some(list) = active.session.peek_candidates() {
            report_candidates(active, &list);
        }
    }
    active.session.flush_events();
    true
}

fn report_candidates(active: &mut Active, list: &CandidateList) {
    if list.is_empty() {
        return;
    }
    let Some(cb) = active.candidate_info.as_mut() else {
        return;
    };
    let candidates: Vec<&str> = list.candidates().iter().map(String::as_str).collect();
    cb(&CandidateInfo {
        page_size: list.page_size(),
        total_pages: list.num_pages(),
        current_page: list.current_page(),
        total_choices: list.len(),
        candidates: &candidates,
    });
}

/// Pick candidate `index` (over the whole list) for the span at the cursor.
pub fn select_candidate(index: i32) -> bool {
    let mut slot = active();
    let Some(active) = slot.as_mut() else {
        error!("select_candidate called without an active session");
        return false;
    };
    let session = &mut active.session;
    let Ok(index) = usize::try_from(index) else {
        session.log(
            LogLevel::Error,
            &format!("select_candidate called with invalid index {index}"),
        );
        return false;
    };
    let opened = session.is_selecting() || session.cand_open();
    let chosen = opened && session.choose_by_index(index);
    if session.is_selecting() {
        session.cand_close();
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_codes_map_to_keys() {
        assert_eq!(key_from_code(10), Key::Enter);
        assert_eq!(key_from_code(b' '), Key::Space);
        assert_eq!(key_from_code(127), Key::Backspace);
        assert_eq!(key_from_code(b'x'), Key::Default('x'));
    }
}
