// Candidate window and the enumeration cursor, through the session and
// through the C surface.

mod common;

use std::ffi::c_int;

use chewing::ffi::*;
use chewing::{CursorState, Key};
use common::{read_static, take_owned, Fixture};

fn type_keys(ctx: *mut ChewingContext, keys: &str) {
    for key in keys.bytes() {
        assert_eq!(unsafe { chewing_handle_Default(ctx, key as c_int) }, 0);
    }
}

#[test]
fn enumeration_yields_every_candidate_once() {
    let fx = Fixture::new();
    let ctx = fx.context();
    type_keys(ctx, "xm4");
    unsafe {
        assert_eq!(chewing_cand_CheckDone(ctx), 1);
        assert_eq!(chewing_cand_open(ctx), 0);
        assert_eq!(chewing_cand_CheckDone(ctx), 0);
        let total = chewing_cand_TotalChoice(ctx);
        assert_eq!(total, 3);
        assert_eq!(chewing_cand_TotalPage(ctx), 1);
        assert_eq!(chewing_cand_CurrentPage(ctx), 0);
        assert_eq!(chewing_cand_ChoicePerPage(ctx), 10);

        chewing_cand_Enumerate(ctx);
        let mut seen = Vec::new();
        while chewing_cand_hasNext(ctx) == 1 {
            let text = take_owned(chewing_cand_String(ctx));
            assert!(!text.is_empty());
            seen.push(text);
        }
        assert_eq!(seen, ["綠", "律", "慮"]);
        assert_eq!(seen.len(), total as usize);
        assert_eq!(chewing_cand_hasNext(ctx), 0);
        assert_eq!(take_owned(chewing_cand_String(ctx)), "");
        assert_eq!(read_static(chewing_cand_String_static(ctx)), "");
        chewing_delete(ctx);
    }
}

#[test]
fn keystroke_invalidates_the_cursor() {
    let fx = Fixture::new();
    let mut session = fx.session();
    for ch in "xm4".chars() {
        session.handle(Key::Default(ch));
    }
    assert_eq!(session.cand_cursor_state(), CursorState::Closed);
    assert!(session.cand_open());
    session.cand_enumerate();
    assert_eq!(session.cand_cursor_state(), CursorState::Open);
    assert_eq!(session.cand_next().as_deref(), Some("綠"));

    session.handle(Key::Esc);
    assert_eq!(session.cand_cursor_state(), CursorState::Closed);
    assert!(!session.cand_has_next());
    assert_eq!(session.cand_next(), None);

    // re-seeding after reopening starts from the top
    assert!(session.cand_open());
    session.cand_enumerate();
    assert_eq!(session.cand_next().as_deref(), Some("綠"));
}

#[test]
fn choosing_by_index_replaces_the_phrase() {
    let fx = Fixture::new();
    let ctx = fx.context();
    type_keys(ctx, "xm4");
    unsafe {
        assert_eq!(take_owned(chewing_buffer_String(ctx)), "綠");
        assert_eq!(chewing_cand_open(ctx), 0);
        assert_eq!(take_owned(chewing_cand_string_by_index(ctx, 1)), "律");
        assert_eq!(read_static(chewing_cand_string_by_index_static(ctx, 2)), "慮");
        assert_eq!(take_owned(chewing_cand_string_by_index(ctx, 3)), "");
        assert_eq!(chewing_cand_choose_by_index(ctx, 7), -1);
        assert_eq!(chewing_cand_choose_by_index(ctx, -1), -1);
        assert_eq!(chewing_cand_choose_by_index(ctx, 1), 0);
        assert_eq!(chewing_cand_CheckDone(ctx), 1);
        assert_eq!(take_owned(chewing_buffer_String(ctx)), "律");
        assert_eq!(read_static(chewing_buffer_String_static(ctx)), "律");
        assert_eq!(chewing_cand_close(ctx), 0);
        chewing_delete(ctx);
    }
}

#[test]
fn phrase_lists_switch_by_length() {
    let fx = Fixture::new();
    let ctx = fx.context();
    type_keys(ctx, "xm4t86");
    unsafe {
        assert_eq!(take_owned(chewing_buffer_String(ctx)), "綠茶");
        assert_eq!(chewing_cand_list_has_next(ctx), 0);
        assert_eq!(chewing_cand_open(ctx), 0);
        assert_eq!(take_owned(chewing_cand_string_by_index(ctx, 0)), "綠茶");
        assert_eq!(chewing_cand_list_has_prev(ctx), 0);
        assert_eq!(chewing_cand_list_has_next(ctx), 1);
        assert_eq!(chewing_cand_list_next(ctx), 0);
        assert_eq!(chewing_cand_TotalChoice(ctx), 3);
        assert_eq!(take_owned(chewing_cand_string_by_index(ctx, 0)), "茶");
        assert_eq!(chewing_cand_list_next(ctx), -1);
        assert_eq!(chewing_cand_list_first(ctx), 0);
        assert_eq!(chewing_cand_TotalChoice(ctx), 1);
        assert_eq!(chewing_cand_list_last(ctx), 0);
        assert_eq!(chewing_cand_list_prev(ctx), 0);
        assert_eq!(take_owned(chewing_cand_string_by_index(ctx, 0)), "綠茶");
        chewing_cand_close(ctx);
        assert_eq!(chewing_cand_TotalPage(ctx), 0);
        chewing_delete(ctx);
    }
}

#[test]
fn intervals_follow_the_segmentation() {
    let fx = Fixture::new();
    let ctx = fx.context();
    type_keys(ctx, "xm4t86hk4g4");
    unsafe {
        assert_eq!(take_owned(chewing_buffer_String(ctx)), "綠茶測試");
        assert_eq!(chewing_buffer_Len(ctx), 4);
        assert_eq!(chewing_cursor_Current(ctx), 4);
        assert_eq!(chewing_get_phoneSeqLen(ctx), 4);
        let seq = chewing_get_phoneSeq(ctx);
        assert!(!seq.is_null());
        chewing_free(seq.cast());

        chewing_interval_Enumerate(ctx);
        let mut spans = Vec::new();
        while chewing_interval_hasNext(ctx) == 1 {
            let mut it = IntervalType::default();
            chewing_interval_Get(ctx, &mut it);
            spans.push((it.from, it.to));
        }
        assert_eq!(spans, [(0, 2), (2, 4)]);
        chewing_delete(ctx);
    }
}
