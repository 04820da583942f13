// Shared fixtures: a pinned dictionary written into a temporary directory.

#![allow(dead_code)]

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;
use std::ptr;

use chewing::ffi::{chewing_free, chewing_new2, ChewingContext};
use chewing::{Callbacks, Session, SessionConfig};
use libchewing_core::LexiconBuilder;
use tempfile::TempDir;

pub const SOURCE: &str = "\
綠茶 500 ㄌㄩˋ ㄔㄚˊ
綠 300 ㄌㄩˋ
律 200 ㄌㄩˋ
慮 150 ㄌㄩˋ
茶 400 ㄔㄚˊ
查 350 ㄔㄚˊ
察 100 ㄔㄚˊ
測試 900 ㄘㄜˋ ㄕˋ
測 100 ㄘㄜˋ
試 100 ㄕˋ
";

pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        LexiconBuilder::from_source_str(SOURCE)
            .unwrap()
            .write_to_dir(dir.path().join("sys"))
            .unwrap();
        Fixture { dir }
    }

    pub fn sys(&self) -> PathBuf {
        self.dir.path().join("sys")
    }

    pub fn user(&self) -> PathBuf {
        self.dir.path().join("user").join("chewing.redb")
    }

    pub fn config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_data_path(self.sys())
            .with_user_path(self.user())
    }

    pub fn session(&self) -> Session {
        self.session_with(Callbacks::new())
    }

    pub fn session_with(&self, callbacks: Callbacks) -> Session {
        Session::open(self.config(), callbacks).unwrap()
    }

    pub fn c_sys(&self) -> CString {
        CString::new(self.sys().to_str().unwrap()).unwrap()
    }

    pub fn c_user(&self) -> CString {
        CString::new(self.user().to_str().unwrap()).unwrap()
    }

    /// A C context over the fixture paths; release with `chewing_delete`.
    pub fn context(&self) -> *mut ChewingContext {
        let sys = self.c_sys();
        let user = self.c_user();
        let ctx = unsafe { chewing_new2(sys.as_ptr(), user.as_ptr(), None, ptr::null_mut()) };
        assert!(!ctx.is_null());
        ctx
    }
}

/// Copy an owned C string and release it.
pub fn take_owned(raw: *mut c_char) -> String {
    assert!(!raw.is_null());
    let text = unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_string();
    unsafe { chewing_free(raw.cast()) };
    text
}

pub fn read_static(raw: *const c_char) -> String {
    assert!(!raw.is_null());
    unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_string()
}
