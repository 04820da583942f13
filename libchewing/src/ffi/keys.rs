//! Keystroke entry points.
//!
//! Each returns 0 once the key has been processed, whatever the editor made
//! of it; [`chewing_keystroke_CheckIgnore`](super::chewing_keystroke_CheckIgnore)
//! and [`chewing_keystroke_CheckAbsorb`](super::chewing_keystroke_CheckAbsorb)
//! report the outcome. A null or deleted context gives -1.

use std::ffi::c_int;

use libchewing_core::Key;
use tracing::warn;

use super::{ctx_mut, is_live, ChewingContext, ERROR, OK};

unsafe fn handle(ctx: *mut ChewingContext, key: Key) -> c_int {
    let ctx = ctx_mut!(ctx, ERROR);
    ctx.session.handle(key);
    OK
}

/// Character keys arrive as code points; anything else is dropped.
fn key_char(code: c_int) -> Option<char> {
    u32::try_from(code).ok().and_then(char::from_u32)
}

macro_rules! plain_keys {
    ($($name:ident => $key:expr;)*) => {
        $(
            /// # Safety
            ///
            /// `ctx` must be null or a live handle.
            #[no_mangle]
            pub unsafe extern "C" fn $name(ctx: *mut ChewingContext) -> c_int {
                handle(ctx, $key)
            }
        )*
    };
}

plain_keys! {
    chewing_handle_Space => Key::Space;
    chewing_handle_ShiftSpace => Key::ShiftSpace;
    chewing_handle_Esc => Key::Esc;
    chewing_handle_Enter => Key::Enter;
    chewing_handle_Del => Key::Del;
    chewing_handle_Backspace => Key::Backspace;
    chewing_handle_Tab => Key::Tab;
    chewing_handle_DblTab => Key::DblTab;
    chewing_handle_ShiftLeft => Key::ShiftLeft;
    chewing_handle_Left => Key::Left;
    chewing_handle_ShiftRight => Key::ShiftRight;
    chewing_handle_Right => Key::Right;
    chewing_handle_Up => Key::Up;
    chewing_handle_Down => Key::Down;
    chewing_handle_Home => Key::Home;
    chewing_handle_End => Key::End;
    chewing_handle_PageUp => Key::PageUp;
    chewing_handle_PageDown => Key::PageDown;
    chewing_handle_Capslock => Key::Capslock;
}

macro_rules! char_keys {
    ($($name:ident => $variant:path;)*) => {
        $(
            /// # Safety
            ///
            /// `ctx` must be null or a live handle.
            #[no_mangle]
            pub unsafe extern "C" fn $name(ctx: *mut ChewingContext, key: c_int) -> c_int {
                if !is_live(ctx) {
                    return ERROR;
                }
                match key_char(key) {
                    Some(ch) => handle(ctx, $variant(ch)),
                    None => {
                        warn!(key, "dropping key that is not a character");
                        OK
                    }
                }
            }
        )*
    };
}

char_keys! {
    chewing_handle_Default => Key::Default;
    chewing_handle_CtrlNum => Key::CtrlNum;
    chewing_handle_Numlock => Key::Numlock;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_codes_become_chars() {
        assert_eq!(key_char(b'x' as c_int), Some('x'));
        assert_eq!(key_char(0x7DA0), Some('綠'));
        assert_eq!(key_char(-1), None);
        assert_eq!(key_char(0xD800), None);
    }

    #[test]
    fn null_context_is_rejected() {
        unsafe {
            assert_eq!(chewing_handle_Space(std::ptr::null_mut()), ERROR);
            assert_eq!(chewing_handle_Default(std::ptr::null_mut(), b'a' as c_int), ERROR);
        }
    }
}
