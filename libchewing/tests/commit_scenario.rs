// Typing a phrase and committing it, with nine candidates per page.

mod common;

use std::ffi::c_int;
use std::sync::{Arc, Mutex};

use chewing::ffi::*;
use chewing::{Callbacks, Key, KeyBehavior};
use common::{read_static, take_owned, Fixture};

const KEYS: &str = "xm4t86";

#[test]
fn session_commits_the_phrase() {
    let fx = Fixture::new();
    let commits = Arc::new(Mutex::new(Vec::new()));
    let sink = commits.clone();
    let mut config = fx.config();
    config.candidates_per_page = 9;
    config.selection_keys = "123456789".into();
    let mut session =
        chewing::Session::open(config, Callbacks::new().on_commit(move |s| sink.lock().unwrap().push(s.to_string())))
            .unwrap();
    assert_eq!(session.candidates_per_page(), 9);
    assert_eq!(session.selection_keys(), "123456789");

    for ch in KEYS.chars() {
        session.handle(Key::Default(ch));
    }
    assert_eq!(session.buffer_string(), "綠茶");
    assert!(!session.has_commit());
    assert_eq!(session.handle(Key::Enter), KeyBehavior::Commit);
    assert_eq!(session.commit_string(), "綠茶");
    assert_eq!(session.buffer_string(), "");
    assert_eq!(*commits.lock().unwrap(), ["綠茶"]);

    // the committed phrase is learned
    assert!(session.lookup_user_phrase(Some("綠茶"), Some("ㄌㄩˋ ㄔㄚˊ")));
    session.ack();
    assert_eq!(session.commit_string(), "");
}

#[test]
fn c_context_commits_the_phrase() {
    let fx = Fixture::new();
    let ctx = fx.context();
    unsafe {
        chewing_set_candPerPage(ctx, 9);
        let keys: Vec<c_int> = "123456789".bytes().map(c_int::from).collect();
        chewing_set_selKey(ctx, keys.as_ptr(), 9);
        assert_eq!(chewing_get_candPerPage(ctx), 9);

        for key in KEYS.bytes() {
            chewing_handle_Default(ctx, key as c_int);
            assert_eq!(chewing_keystroke_CheckAbsorb(ctx), 1);
        }
        assert_eq!(chewing_commit_Check(ctx), 0);
        assert_eq!(chewing_handle_Enter(ctx), 0);
        assert_eq!(chewing_commit_Check(ctx), 1);
        let committed = take_owned(chewing_commit_String(ctx));
        assert!(!committed.is_empty());
        assert_eq!(committed, "綠茶");
        assert_eq!(read_static(chewing_commit_String_static(ctx)), "綠茶");
        assert_eq!(chewing_buffer_Check(ctx), 0);

        assert_eq!(chewing_ack(ctx), 0);
        assert_eq!(chewing_commit_Check(ctx), 0);
        chewing_delete(ctx);
    }
}

#[test]
fn preedit_and_commit_helpers() {
    let fx = Fixture::new();
    let ctx = fx.context();
    unsafe {
        chewing_handle_Default(ctx, b'x' as c_int);
        chewing_handle_Default(ctx, b'm' as c_int);
        assert_eq!(chewing_bopomofo_Check(ctx), 1);
        assert_eq!(chewing_zuin_Check(ctx), 0);
        assert_eq!(take_owned(chewing_bopomofo_String(ctx)), "ㄌㄩ");
        assert_eq!(read_static(chewing_bopomofo_String_static(ctx)), "ㄌㄩ");
        let mut count = 0;
        assert_eq!(take_owned(chewing_zuin_String(ctx, &mut count)), "ㄌㄩ");
        assert_eq!(count, 2);

        assert_eq!(chewing_clean_bopomofo_buf(ctx), 0);
        assert_eq!(chewing_bopomofo_Check(ctx), 0);

        for key in KEYS.bytes() {
            chewing_handle_Default(ctx, key as c_int);
        }
        assert_eq!(chewing_commit_preedit_buf(ctx), 0);
        assert_eq!(take_owned(chewing_commit_String(ctx)), "綠茶");
        assert_eq!(chewing_commit_preedit_buf(ctx), -1);

        for key in KEYS.bytes() {
            chewing_handle_Default(ctx, key as c_int);
        }
        chewing_cand_open(ctx);
        assert_eq!(chewing_commit_preedit_buf(ctx), -1);
        assert_eq!(chewing_clean_preedit_buf(ctx), -1);
        chewing_cand_close(ctx);
        assert_eq!(chewing_clean_preedit_buf(ctx), 0);
        assert_eq!(chewing_buffer_Len(ctx), 0);

        chewing_handle_Default(ctx, b'x' as c_int);
        assert_eq!(chewing_Reset(ctx), 0);
        assert_eq!(chewing_bopomofo_Check(ctx), 0);
        chewing_delete(ctx);
    }
}

#[test]
fn user_phrases_through_the_c_surface() {
    let fx = Fixture::new();
    let ctx = fx.context();
    unsafe {
        assert_eq!(chewing_userphrase_add(ctx, c"測試".as_ptr(), c"ㄘㄜˋ ㄕˋ".as_ptr()), 1);
        assert_eq!(chewing_userphrase_add(ctx, c"測試".as_ptr(), c"ㄘㄜˋ ㄕˋ".as_ptr()), 0);
        assert_eq!(chewing_userphrase_add(ctx, c"測試".as_ptr(), c"ㄘㄜˋ".as_ptr()), 0);
        assert_eq!(chewing_userphrase_add(ctx, std::ptr::null(), c"ㄘㄜˋ".as_ptr()), -1);
        assert_eq!(chewing_userphrase_add(ctx, c"測".as_ptr(), std::ptr::null()), 0);

        assert_eq!(chewing_userphrase_lookup(ctx, c"測試".as_ptr(), c"ㄘㄜˋ ㄕˋ".as_ptr()), 1);
        assert_eq!(chewing_userphrase_lookup(ctx, std::ptr::null(), c"ㄘㄜˋ ㄕˋ".as_ptr()), 1);
        assert_eq!(chewing_userphrase_lookup(ctx, c"測試".as_ptr(), std::ptr::null()), 1);
        assert_eq!(chewing_userphrase_lookup(ctx, c"綠茶".as_ptr(), c"ㄌㄩˋ ㄔㄚˊ".as_ptr()), 0);

        assert_eq!(chewing_userphrase_enumerate(ctx), 0);
        let (mut plen, mut blen) = (0, 0);
        assert_eq!(chewing_userphrase_has_next(ctx, &mut plen, &mut blen), 1);
        assert_eq!(plen as usize, "測試".len() + 1);
        assert_eq!(blen as usize, "ㄘㄜˋ ㄕˋ".len() + 1);

        let mut small = [0 as std::ffi::c_char; 2];
        let mut bopo = vec![0 as std::ffi::c_char; blen as usize];
        assert_eq!(
            chewing_userphrase_get(ctx, small.as_mut_ptr(), 2, bopo.as_mut_ptr(), blen),
            -1
        );
        let mut phrase = vec![0 as std::ffi::c_char; plen as usize];
        assert_eq!(
            chewing_userphrase_get(ctx, phrase.as_mut_ptr(), plen, bopo.as_mut_ptr(), blen),
            0
        );
        assert_eq!(read_static(phrase.as_ptr()), "測試");
        assert_eq!(read_static(bopo.as_ptr()), "ㄘㄜˋ ㄕˋ");
        assert_eq!(chewing_userphrase_has_next(ctx, &mut plen, &mut blen), 0);
        assert_eq!(
            chewing_userphrase_get(ctx, phrase.as_mut_ptr(), plen, bopo.as_mut_ptr(), blen),
            -1
        );

        assert_eq!(chewing_userphrase_remove(ctx, c"測試".as_ptr(), c"ㄘㄜˋ ㄕˋ".as_ptr()), 1);
        assert_eq!(chewing_userphrase_remove(ctx, c"測試".as_ptr(), c"ㄘㄜˋ ㄕˋ".as_ptr()), 0);
        assert_eq!(chewing_userphrase_lookup(ctx, std::ptr::null(), c"ㄘㄜˋ ㄕˋ".as_ptr()), 0);
        chewing_delete(ctx);
    }
}

#[test]
fn deleting_twice_is_harmless() {
    let fx = Fixture::new();
    let ctx = fx.context();
    unsafe {
        chewing_delete(ctx);
        chewing_delete(ctx);
    }
}

#[test]
fn open_fails_without_a_dictionary() {
    let dir = tempfile::tempdir().unwrap();
    let sys = std::ffi::CString::new(dir.path().to_str().unwrap()).unwrap();
    let user = std::ffi::CString::new(dir.path().join("u.redb").to_str().unwrap()).unwrap();
    let ctx = unsafe { chewing_new2(sys.as_ptr(), user.as_ptr(), None, std::ptr::null_mut()) };
    assert!(ctx.is_null());

    let fx = Fixture::new();
    let err = chewing::Session::open(
        fx.config().with_data_path(dir.path()),
        Callbacks::new(),
    )
    .unwrap_err();
    assert!(matches!(err, chewing::OpenError::MissingDictionary { .. }));
}
