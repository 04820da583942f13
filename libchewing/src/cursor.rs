//! Iteration state for the enumeration calls.
//!
//! [`CandidateCursor`] walks the candidate list that was open when it was
//! seeded. It remembers the editor revision at that moment; once the editor
//! moves on (a key, a selection, an option write) the cursor reports itself
//! closed and has to be re-seeded.

use libchewing_core::Editor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    #[default]
    Closed,
    Open,
    Exhausted,
}

#[derive(Debug, Default)]
pub struct CandidateCursor {
    state: CursorState,
    items: Vec<String>,
    next: usize,
    revision: u64,
}

impl CandidateCursor {
    /// Seed from the editor's open candidate list. With no window open the
    /// cursor opens over nothing.
    pub fn open(&mut self, editor: &Editor) {
        self.items = editor
            .candidates()
            .map(|list| list.candidates().to_vec())
            .unwrap_or_default();
        self.next = 0;
        self.revision = editor.revision();
        self.state = CursorState::Open;
    }

    pub fn close(&mut self) {
        self.state = CursorState::Closed;
        self.items.clear();
        self.next = 0;
    }

    fn sync(&mut self, revision: u64) {
        if self.state != CursorState::Closed && revision != self.revision {
            self.close();
        }
    }

    pub fn state(&mut self, revision: u64) -> CursorState {
        self.sync(revision);
        self.state
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn has_next(&mut self, revision: u64) -> bool {
        self.sync(revision);
        match self.state {
            CursorState::Open if self.next < self.items.len() => true,
            CursorState::Open => {
                self.state = CursorState::Exhausted;
                false
            }
            _ => false,
        }
    }

    /// The next candidate, or `None` once closed or exhausted.
    pub fn next(&mut self, revision: u64) -> Option<&str> {
        if !self.has_next(revision) {
            return None;
        }
        let item = self.items.get(self.next)?;
        self.next += 1;
        Some(item)
    }
}

/// A plain forward walk over a snapshot.
#[derive(Debug)]
pub struct Walk<T> {
    items: Vec<T>,
    next: usize,
}

impl<T> Default for Walk<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next: 0,
        }
    }
}

impl<T> Walk<T> {
    pub fn reset(&mut self, items: Vec<T>) {
        self.items = items;
        self.next = 0;
    }

    pub fn has_next(&self) -> bool {
        self.next < self.items.len()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.get(self.next)
    }

    pub fn advance(&mut self) -> Option<&T> {
        let item = self.items.get(self.next)?;
        self.next += 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use libchewing_core::{EditorOptions, Key, LexiconBuilder, UserDict};

    use super::*;

    fn editor() -> Editor {
        let lex = LexiconBuilder::from_source_str("綠 300 ㄌㄩˋ\n律 200 ㄌㄩˋ\n")
            .unwrap()
            .build();
        let mut ed = Editor::new(Arc::new(lex), UserDict::new_in_memory(), EditorOptions::default());
        for ch in "xm4".chars() {
            ed.process(Key::Default(ch));
        }
        ed
    }

    #[test]
    fn walks_to_exhaustion() {
        let mut ed = editor();
        assert!(ed.open_candidates());
        let mut cursor = CandidateCursor::default();
        assert_eq!(cursor.state(ed.revision()), CursorState::Closed);
        assert!(!cursor.has_next(ed.revision()));

        cursor.open(&ed);
        let rev = ed.revision();
        assert_eq!(cursor.total(), 2);
        assert_eq!(cursor.next(rev), Some("綠"));
        assert_eq!(cursor.next(rev), Some("律"));
        assert!(!cursor.has_next(rev));
        assert_eq!(cursor.state(rev), CursorState::Exhausted);
        assert_eq!(cursor.next(rev), None);
    }

    #[test]
    fn editor_change_closes_cursor() {
        let mut ed = editor();
        ed.open_candidates();
        let mut cursor = CandidateCursor::default();
        cursor.open(&ed);
        ed.process(Key::Esc);
        assert_eq!(cursor.state(ed.revision()), CursorState::Closed);
        assert_eq!(cursor.next(ed.revision()), None);
    }

    #[test]
    fn closed_window_opens_empty() {
        let ed = editor();
        let mut cursor = CandidateCursor::default();
        cursor.open(&ed);
        assert_eq!(cursor.total(), 0);
        assert!(!cursor.has_next(ed.revision()));
        assert_eq!(cursor.state(ed.revision()), CursorState::Exhausted);
    }

    #[test]
    fn walk_advances() {
        let mut walk = Walk::default();
        walk.reset(vec![1, 2]);
        assert_eq!(walk.peek(), Some(&1));
        assert_eq!(walk.advance(), Some(&1));
        assert_eq!(walk.advance(), Some(&2));
        assert!(!walk.has_next());
    }
}
