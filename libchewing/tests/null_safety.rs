// Every per-handle function called with a null or deleted context returns
// its sentinel and leaves nothing behind.

mod common;

use std::ffi::c_int;
use std::ptr::{null, null_mut};

use chewing::ffi::*;
use common::{read_static, take_owned, Fixture};


fn numeric_queries_return_minus_one(ctx: *mut ChewingContext) {
    let table: Vec<(&str, c_int)> = unsafe {
        vec![
            ("Reset", chewing_Reset(ctx)),
            ("ack", chewing_ack(ctx)),
            ("config_has_option", chewing_config_has_option(ctx, c"chewing.candidates_per_page".as_ptr())),
            ("config_get_int", chewing_config_get_int(ctx, c"chewing.candidates_per_page".as_ptr())),
            ("config_set_int", chewing_config_set_int(ctx, c"chewing.candidates_per_page".as_ptr(), 5)),
            ("config_get_str", chewing_config_get_str(ctx, c"chewing.selection_keys".as_ptr(), null_mut())),
            ("config_set_str", chewing_config_set_str(ctx, c"chewing.selection_keys".as_ptr(), c"asdf".as_ptr())),
            ("config_option_kind", chewing_config_option_kind(ctx, c"chewing.selection_keys".as_ptr())),
            ("set_callbacks", chewing_set_callbacks(ctx, null(), null_mut())),
            ("set_KBType", chewing_set_KBType(ctx, 1)),
            ("get_KBType", chewing_get_KBType(ctx)),
            ("get_ChiEngMode", chewing_get_ChiEngMode(ctx)),
            ("get_ShapeMode", chewing_get_ShapeMode(ctx)),
            ("get_candPerPage", chewing_get_candPerPage(ctx)),
            ("get_maxChiSymbolLen", chewing_get_maxChiSymbolLen(ctx)),
            ("get_addPhraseDirection", chewing_get_addPhraseDirection(ctx)),
            ("get_spaceAsSelection", chewing_get_spaceAsSelection(ctx)),
            ("get_escCleanAllBuf", chewing_get_escCleanAllBuf(ctx)),
            ("get_autoShiftCur", chewing_get_autoShiftCur(ctx)),
            ("get_easySymbolInput", chewing_get_easySymbolInput(ctx)),
            ("get_phraseChoiceRearward", chewing_get_phraseChoiceRearward(ctx)),
            ("get_autoLearn", chewing_get_autoLearn(ctx)),
            ("commit_Check", chewing_commit_Check(ctx)),
            ("buffer_Check", chewing_buffer_Check(ctx)),
            ("buffer_Len", chewing_buffer_Len(ctx)),
            ("bopomofo_Check", chewing_bopomofo_Check(ctx)),
            ("zuin_Check", chewing_zuin_Check(ctx)),
            ("cursor_Current", chewing_cursor_Current(ctx)),
            ("commit_preedit_buf", chewing_commit_preedit_buf(ctx)),
            ("clean_preedit_buf", chewing_clean_preedit_buf(ctx)),
            ("clean_bopomofo_buf", chewing_clean_bopomofo_buf(ctx)),
            ("get_phoneSeqLen", chewing_get_phoneSeqLen(ctx)),
            ("aux_Check", chewing_aux_Check(ctx)),
            ("aux_Length", chewing_aux_Length(ctx)),
            ("keystroke_CheckIgnore", chewing_keystroke_CheckIgnore(ctx)),
            ("keystroke_CheckAbsorb", chewing_keystroke_CheckAbsorb(ctx)),
            ("cand_CheckDone", chewing_cand_CheckDone(ctx)),
            ("cand_TotalPage", chewing_cand_TotalPage(ctx)),
            ("cand_ChoicePerPage", chewing_cand_ChoicePerPage(ctx)),
            ("cand_TotalChoice", chewing_cand_TotalChoice(ctx)),
            ("cand_CurrentPage", chewing_cand_CurrentPage(ctx)),
            ("cand_hasNext", chewing_cand_hasNext(ctx)),
            ("cand_choose_by_index", chewing_cand_choose_by_index(ctx, 0)),
            ("cand_open", chewing_cand_open(ctx)),
            ("cand_close", chewing_cand_close(ctx)),
            ("cand_list_first", chewing_cand_list_first(ctx)),
            ("cand_list_last", chewing_cand_list_last(ctx)),
            ("cand_list_next", chewing_cand_list_next(ctx)),
            ("cand_list_prev", chewing_cand_list_prev(ctx)),
            ("interval_hasNext", chewing_interval_hasNext(ctx)),
            ("kbtype_hasNext", chewing_kbtype_hasNext(ctx)),
            ("userphrase_enumerate", chewing_userphrase_enumerate(ctx)),
            ("userphrase_get", chewing_userphrase_get(ctx, null_mut(), 0, null_mut(), 0)),
            ("userphrase_add", chewing_userphrase_add(ctx, c"綠茶".as_ptr(), c"ㄌㄩˋ ㄔㄚˊ".as_ptr())),
            ("userphrase_remove", chewing_userphrase_remove(ctx, c"綠茶".as_ptr(), c"ㄌㄩˋ ㄔㄚˊ".as_ptr())),
        ]
    };
    for (name, value) in table {
        assert_eq!(value, -1, "chewing_{name}");
    }
}

fn predicates_return_zero(ctx: *mut ChewingContext) {
    unsafe {
        assert_eq!(chewing_cand_list_has_next(ctx), 0);
        assert_eq!(chewing_cand_list_has_prev(ctx), 0);
        assert_eq!(chewing_userphrase_has_next(ctx, null_mut(), null_mut()), 0);
        assert_eq!(chewing_userphrase_lookup(ctx, c"綠茶".as_ptr(), null()), 0);
    }
}

fn keystrokes_return_minus_one(ctx: *mut ChewingContext) {
    let handlers: [unsafe extern "C" fn(*mut ChewingContext) -> c_int; 19] = [
        chewing_handle_Space,
        chewing_handle_ShiftSpace,
        chewing_handle_Esc,
        chewing_handle_Enter,
        chewing_handle_Del,
        chewing_handle_Backspace,
        chewing_handle_Tab,
        chewing_handle_DblTab,
        chewing_handle_ShiftLeft,
        chewing_handle_Left,
        chewing_handle_ShiftRight,
        chewing_handle_Right,
        chewing_handle_Up,
        chewing_handle_Down,
        chewing_handle_Home,
        chewing_handle_End,
        chewing_handle_PageUp,
        chewing_handle_PageDown,
        chewing_handle_Capslock,
    ];
    for handler in handlers {
        assert_eq!(unsafe { handler(ctx) }, -1);
    }
    let with_key: [unsafe extern "C" fn(*mut ChewingContext, c_int) -> c_int; 3] = [
        chewing_handle_Default,
        chewing_handle_CtrlNum,
        chewing_handle_Numlock,
    ];
    for handler in with_key {
        assert_eq!(unsafe { handler(ctx, b'1' as c_int) }, -1);
    }
}

fn owned_strings_are_empty(ctx: *mut ChewingContext) {
    let owned = unsafe {
        [
            chewing_get_KBString(ctx),
            chewing_commit_String(ctx),
            chewing_buffer_String(ctx),
            chewing_bopomofo_String(ctx),
            chewing_zuin_String(ctx, null_mut()),
            chewing_aux_String(ctx),
            chewing_cand_String(ctx),
            chewing_cand_string_by_index(ctx, 0),
            chewing_kbtype_String(ctx),
        ]
    };
    for raw in owned {
        assert_eq!(take_owned(raw), "");
    }
}

fn borrowed_strings_are_empty(ctx: *mut ChewingContext) {
    let borrowed = unsafe {
        [
            chewing_commit_String_static(ctx),
            chewing_buffer_String_static(ctx),
            chewing_bopomofo_String_static(ctx),
            chewing_aux_String_static(ctx),
            chewing_cand_String_static(ctx),
            chewing_cand_string_by_index_static(ctx, 0),
            chewing_kbtype_String_static(ctx),
        ]
    };
    for raw in borrowed {
        assert_eq!(read_static(raw), "");
    }
}

fn arrays_are_null(ctx: *mut ChewingContext) {
    unsafe {
        assert!(chewing_get_selKey(ctx).is_null());
        assert!(chewing_get_phoneSeq(ctx).is_null());
    }
}

fn mutators_without_result_are_skipped(ctx: *mut ChewingContext) {
    let keys = [b'a' as c_int; 10];
    let mut interval = IntervalType { from: 7, to: 9 };
    unsafe {
        chewing_free(null_mut());
        chewing_set_logger(ctx, None, null_mut());
        chewing_set_ChiEngMode(ctx, CHINESE_MODE);
        chewing_set_ShapeMode(ctx, FULLSHAPE_MODE);
        chewing_set_candPerPage(ctx, 5);
        chewing_set_maxChiSymbolLen(ctx, 16);
        chewing_set_selKey(ctx, keys.as_ptr(), 10);
        chewing_set_addPhraseDirection(ctx, 1);
        chewing_set_spaceAsSelection(ctx, 1);
        chewing_set_escCleanAllBuf(ctx, 1);
        chewing_set_autoShiftCur(ctx, 1);
        chewing_set_easySymbolInput(ctx, 1);
        chewing_set_phraseChoiceRearward(ctx, 1);
        chewing_set_autoLearn(ctx, 1);
        chewing_cand_Enumerate(ctx);
        chewing_interval_Enumerate(ctx);
        chewing_interval_Get(ctx, &mut interval);
        chewing_kbtype_Enumerate(ctx);
    }
    assert_eq!(interval, IntervalType { from: 7, to: 9 });
}

fn check_every_entry_point(ctx: *mut ChewingContext) {
    numeric_queries_return_minus_one(ctx);
    predicates_return_zero(ctx);
    keystrokes_return_minus_one(ctx);
    owned_strings_are_empty(ctx);
    borrowed_strings_are_empty(ctx);
    arrays_are_null(ctx);
    mutators_without_result_are_skipped(ctx);
}

#[test]
fn null_context() {
    check_every_entry_point(null_mut());
    unsafe { chewing_delete(null_mut()) };
}

// The only context this binary creates, so its address cannot be reused
// by another live handle while the checks run.
#[test]
fn deleted_context() {
    let fx = Fixture::new();
    let ctx = fx.context();
    assert_eq!(unsafe { chewing_get_candPerPage(ctx) }, 10);
    unsafe { chewing_delete(ctx) };
    check_every_entry_point(ctx);
    unsafe { chewing_delete(ctx) };
}

#[test]
fn handle_free_queries_ignore_the_context() {
    unsafe {
        assert_eq!(chewing_kbtype_Total(null()), 17);
        assert_eq!(chewing_KBStr2Num(null()), 0);
        assert!(!read_static(chewing_version()).is_empty());
    }
}
