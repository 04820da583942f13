//! Event callbacks and their dispatch.
//!
//! A session owns one [`Callbacks`] set with five slots. The log slot lives
//! in the session's log sink; the other four are driven by [`Router`],
//! which compares what the editor shows now against what was last reported
//! and fires only the channels that changed. Dispatch is synchronous, on the
//! thread of the call that caused it.

use std::fmt;

use libchewing_core::Editor;

use crate::logger::{LogFn, LogLevel};

/// Page metadata plus the candidates on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateInfo<'a> {
    pub page_size: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub total_choices: usize,
    pub candidates: &'a [&'a str],
}

pub type CandidateFn = Box<dyn FnMut(&CandidateInfo<'_>) + Send>;
pub type TextFn = Box<dyn FnMut(&str) + Send>;

/// Handlers for the five event channels. Unset handlers are skipped.
#[derive(Default)]
pub struct Callbacks {
    pub(crate) log: Option<LogFn>,
    pub(crate) candidate_info: Option<CandidateFn>,
    pub(crate) buffer: Option<TextFn>,
    pub(crate) preedit: Option<TextFn>,
    pub(crate) commit: Option<TextFn>,
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("log", &self.log.is_some())
            .field("candidate_info", &self.candidate_info.is_some())
            .field("buffer", &self.buffer.is_some())
            .field("preedit", &self.preedit.is_some())
            .field("commit", &self.commit.is_some())
            .finish()
    }
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_log(mut self, f: impl FnMut(LogLevel, &str) + Send + 'static) -> Self {
        self.log = Some(Box::new(f));
        self
    }

    pub fn on_candidate_info(mut self, f: impl FnMut(&CandidateInfo<'_>) + Send + 'static) -> Self {
        self.candidate_info = Some(Box::new(f));
        self
    }

    pub fn on_buffer(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.buffer = Some(Box::new(f));
        self
    }

    /// The bopomofo spelled so far.
    pub fn on_preedit(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.preedit = Some(Box::new(f));
        self
    }

    pub fn on_commit(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.commit = Some(Box::new(f));
        self
    }
}

/// Candidate window as last reported. A closed window has no pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct WindowSnapshot {
    page_size: usize,
    total_pages: usize,
    current_page: usize,
    total_choices: usize,
    page: Vec<String>,
}

impl WindowSnapshot {
    fn capture(editor: &Editor) -> Self {
        match editor.candidates() {
            Some(list) => Self {
                page_size: list.page_size(),
                total_pages: list.num_pages(),
                current_page: list.current_page(),
                total_choices: list.len(),
                page: list.current_page_candidates().to_vec(),
            },
            None => Self {
                page_size: editor.options().candidates_per_page,
                ..Self::default()
            },
        }
    }
}

#[derive(Default)]
pub(crate) struct Router {
    candidate_info: Option<CandidateFn>,
    buffer: Option<TextFn>,
    preedit: Option<TextFn>,
    commit: Option<TextFn>,
    buffer_seen: String,
    preedit_seen: String,
    window_seen: Option<WindowSnapshot>,
}

impl Router {
    /// Take the dispatch handlers out of `callbacks`, returning the log slot.
    pub(crate) fn install(&mut self, callbacks: Callbacks) -> Option<LogFn> {
        self.candidate_info = callbacks.candidate_info;
        self.buffer = callbacks.buffer;
        self.preedit = callbacks.preedit;
        self.commit = callbacks.commit;
        callbacks.log
    }

    /// Record the current state as already reported.
    pub(crate) fn sync(&mut self, editor: &Editor) {
        self.buffer_seen = editor.buffer_string();
        self.preedit_seen = editor.bopomofo_string();
        self.window_seen = Some(WindowSnapshot::capture(editor));
    }

    /// Fire every channel whose content changed. `committed` reports whether
    /// the call that just finished produced commit text.
    pub(crate) fn dispatch(&mut self, editor: &Editor, committed: bool) {
        let window = WindowSnapshot::capture(editor);
        if self.window_seen.as_ref() != Some(&window) {
            if let Some(cb) = self.candidate_info.as_mut() {
                let page: Vec<&str> = window.page.iter().map(String::as_str).collect();
                cb(&CandidateInfo {
                    page_size: window.page_size,
                    total_pages: window.total_pages,
                    current_page: window.current_page,
                    total_choices: window.total_choices,
                    candidates: &page,
                });
            }
            self.window_seen = Some(window);
        }

        let preedit = editor.bopomofo_string();
        if preedit != self.preedit_seen {
            if let Some(cb) = self.preedit.as_mut() {
                cb(&preedit);
            }
            self.preedit_seen = preedit;
        }

        let buffer = editor.buffer_string();
        if buffer != self.buffer_seen {
            if let Some(cb) = self.buffer.as_mut() {
                cb(&buffer);
            }
            self.buffer_seen = buffer;
        }

        if committed {
            if let Some(cb) = self.commit.as_mut() {
                cb(editor.commit_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use libchewing_core::{EditorOptions, Key, LexiconBuilder, UserDict};

    use super::*;

    fn editor() -> Editor {
        let lex = LexiconBuilder::from_source_str("綠 300 ㄌㄩˋ\n律 200 ㄌㄩˋ\n")
            .unwrap()
            .build();
        Editor::new(Arc::new(lex), UserDict::new_in_memory(), EditorOptions::default())
    }

    #[test]
    fn only_changed_channels_fire() {
        let events = Arc::new(Mutex::new(Vec::<String>::new()));
        let (e1, e2, e3) = (events.clone(), events.clone(), events.clone());
        let callbacks = Callbacks::new()
            .on_preedit(move |s| e1.lock().unwrap().push(format!("preedit:{s}")))
            .on_buffer(move |s| e2.lock().unwrap().push(format!("buffer:{s}")))
            .on_commit(move |s| e3.lock().unwrap().push(format!("commit:{s}")));
        let mut router = Router::default();
        assert!(router.install(callbacks).is_none());
        let mut ed = editor();
        router.sync(&ed);

        ed.process(Key::Default('x'));
        router.dispatch(&ed, ed.has_commit());
        ed.process(Key::Default('m'));
        router.dispatch(&ed, ed.has_commit());
        ed.process(Key::Default('4'));
        router.dispatch(&ed, ed.has_commit());
        router.dispatch(&ed, false);
        ed.process(Key::Enter);
        router.dispatch(&ed, ed.has_commit());

        assert_eq!(
            *events.lock().unwrap(),
            [
                "preedit:ㄌ",
                "preedit:ㄌㄩ",
                "preedit:",
                "buffer:綠",
                "buffer:",
                "commit:綠"
            ]
        );
    }

    #[test]
    fn candidate_window_open_and_close_are_reported() {
        let pages = Arc::new(Mutex::new(Vec::new()));
        let out = pages.clone();
        let mut router = Router::default();
        router.install(Callbacks::new().on_candidate_info(move |info| {
            out.lock()
                .unwrap()
                .push((info.total_pages, info.candidates.join(",")));
        }));
        let mut ed = editor();
        router.sync(&ed);
        for ch in "xm4".chars() {
            ed.process(Key::Default(ch));
            router.dispatch(&ed, false);
        }
        assert!(pages.lock().unwrap().is_empty());
        ed.process(Key::Down);
        router.dispatch(&ed, false);
        ed.process(Key::Esc);
        router.dispatch(&ed, false);
        assert_eq!(
            *pages.lock().unwrap(),
            [(1, "綠,律".to_string()), (0, String::new())]
        );
    }
}
