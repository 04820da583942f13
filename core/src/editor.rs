//! Key-driven composition editor.
//!
//! The editor owns everything one input session mutates: the syllable being
//! spelled (preedit), the composition buffer of completed syllables and
//! literal characters, user selections and segmentation breaks, the
//! candidate window and the commit buffer. Callers feed it [`Key`] events
//! and read the resulting state back through accessors.
//!
//! Every key returns a [`KeyBehavior`]:
//! - `Ignore`: the key means nothing here, the application should handle it
//! - `Absorb`: the key was consumed
//! - `Commit`: text was written to the commit buffer
//! - `KeyError`: the key was consumed but rejected

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{debug, trace};

use crate::candidate::CandidateList;
use crate::conversion::{
    ConversionEngine, Converter, Dictionary, Interval, Selection, Symbol, MAX_PHRASE_LEN,
};
use crate::layout::{KeyBehavior, KeyboardLayout, SyllableEditor};
use crate::lexicon::{key_for, Lexicon};
use crate::userdict::{UserDict, UserPhrase};
use crate::utils::{fullwidth_char, normalize};
use crate::zhuyin::Syllable;

pub const DEFAULT_SELECTION_KEYS: &str = "1234567890";
pub const DEFAULT_CANDIDATES_PER_PAGE: usize = 10;
pub const DEFAULT_AUTO_COMMIT_THRESHOLD: usize = 39;

/// Logical input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Default(char),
    Space,
    ShiftSpace,
    Enter,
    Esc,
    Backspace,
    Del,
    Tab,
    /// Tab pressed twice in a row: drop all selections and breaks.
    DblTab,
    Left,
    Right,
    ShiftLeft,
    ShiftRight,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Capslock,
    /// A key from the numeric keypad.
    Numlock(char),
    /// Ctrl held with a digit: add the phrase of that length as a user phrase.
    CtrlNum(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageMode {
    Symbol,
    #[default]
    Chinese,
}

impl LanguageMode {
    pub fn id(self) -> i32 {
        match self {
            LanguageMode::Symbol => 0,
            LanguageMode::Chinese => 1,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(LanguageMode::Symbol),
            1 => Some(LanguageMode::Chinese),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterForm {
    #[default]
    Half,
    Full,
}

impl CharacterForm {
    pub fn id(self) -> i32 {
        match self {
            CharacterForm::Half => 0,
            CharacterForm::Full => 1,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(CharacterForm::Half),
            1 => Some(CharacterForm::Full),
            _ => None,
        }
    }
}

/// Where Ctrl+digit takes the new user phrase from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddDirection {
    /// The phrase ends at the cursor.
    #[default]
    Backward,
    /// The phrase starts at the cursor.
    Forward,
}

impl AddDirection {
    pub fn id(self) -> i32 {
        match self {
            AddDirection::Backward => 0,
            AddDirection::Forward => 1,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(AddDirection::Backward),
            1 => Some(AddDirection::Forward),
            _ => None,
        }
    }
}

/// Runtime behavior switches. Values are assumed valid; range checks live
/// with whoever owns the configuration surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    pub layout: KeyboardLayout,
    pub candidates_per_page: usize,
    pub auto_commit_threshold: usize,
    pub selection_keys: String,
    pub add_direction: AddDirection,
    pub disable_auto_learn_phrase: bool,
    pub auto_shift_cursor: bool,
    pub easy_symbol_input: bool,
    pub esc_clear_all_buffer: bool,
    pub phrase_choice_rearward: bool,
    pub space_is_select_key: bool,
    pub enable_fullwidth_toggle_key: bool,
    pub sort_candidates_by_frequency: bool,
    pub language_mode: LanguageMode,
    pub character_form: CharacterForm,
    pub conversion_engine: ConversionEngine,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            layout: KeyboardLayout::Default,
            candidates_per_page: DEFAULT_CANDIDATES_PER_PAGE,
            auto_commit_threshold: DEFAULT_AUTO_COMMIT_THRESHOLD,
            selection_keys: DEFAULT_SELECTION_KEYS.to_string(),
            add_direction: AddDirection::Backward,
            disable_auto_learn_phrase: false,
            auto_shift_cursor: false,
            easy_symbol_input: false,
            esc_clear_all_buffer: false,
            phrase_choice_rearward: false,
            space_is_select_key: false,
            enable_fullwidth_toggle_key: false,
            sort_candidates_by_frequency: false,
            language_mode: LanguageMode::Chinese,
            character_form: CharacterForm::Half,
            conversion_engine: ConversionEngine::Chewing,
        }
    }
}

/// Candidate lists for every phrase length available at the cursor,
/// longest first; one of them is shown.
#[derive(Debug, Clone)]
struct CandidateWindow {
    spans: Vec<(usize, usize)>,
    current: usize,
    list: CandidateList,
}

#[derive(Debug)]
pub struct Editor {
    options: EditorOptions,
    dict: Dictionary,
    converter: Converter,
    syllable: Box<dyn SyllableEditor>,
    symbols: Vec<Symbol>,
    selections: Vec<Selection>,
    breaks: Vec<usize>,
    intervals: Vec<Interval>,
    cursor: usize,
    window: Option<CandidateWindow>,
    commit: String,
    aux: String,
    last: KeyBehavior,
    revision: u64,
}

impl Editor {
    pub fn new(lexicon: Arc<Lexicon>, user: UserDict, options: EditorOptions) -> Self {
        let syllable = options.layout.syllable_editor();
        Self {
            options,
            dict: Dictionary::new(lexicon, user),
            converter: Converter::new(),
            syllable,
            symbols: Vec::new(),
            selections: Vec::new(),
            breaks: Vec::new(),
            intervals: Vec::new(),
            cursor: 0,
            window: None,
            commit: String::new(),
            aux: String::new(),
            last: KeyBehavior::Ignore,
            revision: 0,
        }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Replace the options. A layout change drops the pending syllable.
    pub fn set_options(&mut self, options: EditorOptions) {
        let layout_changed = options.layout != self.options.layout;
        self.options = options;
        if layout_changed {
            self.syllable = self.options.layout.syllable_editor();
        }
        if let Some(w) = &mut self.window {
            w.list.set_page_size(self.options.candidates_per_page);
        }
        self.touch();
        self.refresh();
    }

    pub fn user_dict(&self) -> &UserDict {
        &self.dict.user
    }

    /// Bumped whenever state visible through the candidate window may change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn process(&mut self, key: Key) -> KeyBehavior {
        trace!(?key, "key");
        self.touch();
        self.commit.clear();
        self.aux.clear();
        let behavior = match key {
            Key::Default(ch) => self.on_default(ch),
            Key::Space => self.on_space(),
            Key::ShiftSpace => {
                if self.options.enable_fullwidth_toggle_key {
                    self.options.character_form = match self.options.character_form {
                        CharacterForm::Half => CharacterForm::Full,
                        CharacterForm::Full => CharacterForm::Half,
                    };
                    KeyBehavior::Absorb
                } else {
                    self.on_space()
                }
            }
            Key::Enter => self.on_enter(),
            Key::Esc => self.on_esc(),
            Key::Backspace => self.on_backspace(),
            Key::Del => self.on_del(),
            Key::Tab => self.on_tab(),
            Key::DblTab => self.on_dbl_tab(),
            Key::Left | Key::ShiftLeft => self.on_left(),
            Key::Right | Key::ShiftRight => self.on_right(),
            Key::Up => self.on_up(),
            Key::Down => self.on_down(),
            Key::Home => self.on_home(),
            Key::End => self.on_end(),
            Key::PageUp => self.on_page(false),
            Key::PageDown => self.on_page(true),
            Key::Capslock => self.on_capslock(),
            Key::Numlock(ch) => self.on_numlock(ch),
            Key::CtrlNum(ch) => self.on_ctrl_num(ch),
        };
        self.last = behavior;
        behavior
    }

    pub fn last_behavior(&self) -> KeyBehavior {
        self.last
    }

    fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.syllable.is_empty()
    }

    fn on_default(&mut self, ch: char) -> KeyBehavior {
        if self.window.is_some() {
            return match self.selection_key_index(ch) {
                Some(i) if self.choose_on_page(i) => KeyBehavior::Absorb,
                _ => KeyBehavior::KeyError,
            };
        }
        if self.options.language_mode == LanguageMode::Symbol
            || self.options.easy_symbol_input
            || ch.is_ascii_uppercase()
        {
            return self.insert_literal(ch);
        }
        match self.syllable.key_press(self.options.layout.to_qwerty(ch)) {
            KeyBehavior::Commit => self.complete_syllable(),
            KeyBehavior::Ignore if self.syllable.is_empty() && ch.is_ascii_graphic() => {
                self.insert_literal(ch)
            }
            KeyBehavior::Ignore => KeyBehavior::KeyError,
            other => other,
        }
    }

    fn on_space(&mut self) -> KeyBehavior {
        if let Some(w) = &mut self.window {
            if !w.list.page_down() {
                w.list.first_page();
            }
            return KeyBehavior::Absorb;
        }
        if !self.syllable.is_empty() {
            return match self.syllable.key_press(' ') {
                KeyBehavior::Commit => self.complete_syllable(),
                KeyBehavior::Ignore => KeyBehavior::KeyError,
                other => other,
            };
        }
        if self.symbols.is_empty() {
            return match self.options.character_form {
                CharacterForm::Full => {
                    self.commit.push(fullwidth_char(' '));
                    KeyBehavior::Commit
                }
                CharacterForm::Half => KeyBehavior::Ignore,
            };
        }
        if self.options.space_is_select_key && self.options.language_mode == LanguageMode::Chinese
        {
            return if self.open_candidates() {
                KeyBehavior::Absorb
            } else {
                KeyBehavior::KeyError
            };
        }
        self.insert_literal(' ')
    }

    fn on_enter(&mut self) -> KeyBehavior {
        if self.window.take().is_some() {
            return KeyBehavior::Absorb;
        }
        if self.is_empty() {
            return KeyBehavior::Ignore;
        }
        self.syllable.clear();
        if self.commit_all() {
            KeyBehavior::Commit
        } else {
            KeyBehavior::Absorb
        }
    }

    fn on_esc(&mut self) -> KeyBehavior {
        if self.window.take().is_some() {
            return KeyBehavior::Absorb;
        }
        if !self.syllable.is_empty() {
            self.syllable.clear();
            return KeyBehavior::Absorb;
        }
        if self.symbols.is_empty() {
            return KeyBehavior::Ignore;
        }
        if self.options.esc_clear_all_buffer {
            self.clean_preedit();
        }
        KeyBehavior::Absorb
    }

    fn on_backspace(&mut self) -> KeyBehavior {
        if self.window.take().is_some() {
            return KeyBehavior::Absorb;
        }
        if !self.syllable.is_empty() {
            self.syllable.remove_last();
            return KeyBehavior::Absorb;
        }
        if self.symbols.is_empty() {
            return KeyBehavior::Ignore;
        }
        if self.cursor == 0 {
            return KeyBehavior::KeyError;
        }
        self.cursor -= 1;
        self.remove_symbol(self.cursor);
        KeyBehavior::Absorb
    }

    fn on_del(&mut self) -> KeyBehavior {
        if self.window.is_some() {
            return KeyBehavior::Absorb;
        }
        if !self.syllable.is_empty() {
            return KeyBehavior::KeyError;
        }
        if self.symbols.is_empty() {
            return KeyBehavior::Ignore;
        }
        if self.cursor >= self.symbols.len() {
            return KeyBehavior::KeyError;
        }
        self.remove_symbol(self.cursor);
        KeyBehavior::Absorb
    }

    fn on_tab(&mut self) -> KeyBehavior {
        if self.symbols.is_empty() {
            return KeyBehavior::Ignore;
        }
        let len = self.symbols.len();
        if len < 2 {
            return KeyBehavior::Absorb;
        }
        let at = self.cursor.clamp(1, len - 1);
        if let Some(pos) = self.breaks.iter().position(|&b| b == at) {
            self.breaks.remove(pos);
        } else {
            self.breaks.push(at);
            self.breaks.sort_unstable();
        }
        self.window = None;
        self.refresh();
        KeyBehavior::Absorb
    }

    fn on_dbl_tab(&mut self) -> KeyBehavior {
        if self.symbols.is_empty() {
            return KeyBehavior::Ignore;
        }
        self.breaks.clear();
        self.selections.clear();
        self.window = None;
        self.refresh();
        KeyBehavior::Absorb
    }

    fn on_left(&mut self) -> KeyBehavior {
        if let Some(w) = &mut self.window {
            if !w.list.page_up() {
                w.list.last_page();
            }
            return KeyBehavior::Absorb;
        }
        self.move_cursor(|cursor, _| cursor.checked_sub(1))
    }

    fn on_right(&mut self) -> KeyBehavior {
        if let Some(w) = &mut self.window {
            if !w.list.page_down() {
                w.list.first_page();
            }
            return KeyBehavior::Absorb;
        }
        self.move_cursor(|cursor, len| (cursor < len).then_some(cursor + 1))
    }

    fn on_home(&mut self) -> KeyBehavior {
        if let Some(w) = &mut self.window {
            w.list.first_page();
            return KeyBehavior::Absorb;
        }
        self.move_cursor(|_, _| Some(0))
    }

    fn on_end(&mut self) -> KeyBehavior {
        if let Some(w) = &mut self.window {
            w.list.last_page();
            return KeyBehavior::Absorb;
        }
        self.move_cursor(|_, len| Some(len))
    }

    fn move_cursor(&mut self, to: impl FnOnce(usize, usize) -> Option<usize>) -> KeyBehavior {
        if !self.syllable.is_empty() {
            return KeyBehavior::KeyError;
        }
        if self.symbols.is_empty() {
            return KeyBehavior::Ignore;
        }
        match to(self.cursor, self.symbols.len()) {
            Some(c) => {
                self.cursor = c;
                KeyBehavior::Absorb
            }
            None => KeyBehavior::KeyError,
        }
    }

    fn on_up(&mut self) -> KeyBehavior {
        if self.window.take().is_some() {
            return KeyBehavior::Absorb;
        }
        if self.is_empty() {
            KeyBehavior::Ignore
        } else {
            KeyBehavior::Absorb
        }
    }

    fn on_down(&mut self) -> KeyBehavior {
        if self.window.is_some() {
            if !self.list_next() {
                self.list_first();
            }
            return KeyBehavior::Absorb;
        }
        if !self.syllable.is_empty() {
            return KeyBehavior::KeyError;
        }
        if self.symbols.is_empty() {
            return KeyBehavior::Ignore;
        }
        if self.open_candidates() {
            KeyBehavior::Absorb
        } else {
            KeyBehavior::KeyError
        }
    }

    fn on_page(&mut self, down: bool) -> KeyBehavior {
        if let Some(w) = &mut self.window {
            let moved = if down {
                w.list.page_down()
            } else {
                w.list.page_up()
            };
            if !moved {
                if down {
                    w.list.first_page();
                } else {
                    w.list.last_page();
                }
            }
            return KeyBehavior::Absorb;
        }
        if self.is_empty() {
            KeyBehavior::Ignore
        } else {
            KeyBehavior::Absorb
        }
    }

    fn on_capslock(&mut self) -> KeyBehavior {
        self.options.language_mode = match self.options.language_mode {
            LanguageMode::Chinese => {
                self.syllable.clear();
                self.aux.push_str("英數模式");
                LanguageMode::Symbol
            }
            LanguageMode::Symbol => {
                self.aux.push_str("中文模式");
                LanguageMode::Chinese
            }
        };
        KeyBehavior::Absorb
    }

    fn on_numlock(&mut self, ch: char) -> KeyBehavior {
        if !ch.is_ascii_graphic() {
            return KeyBehavior::KeyError;
        }
        if self.is_empty() {
            self.commit.push(ch);
            return KeyBehavior::Commit;
        }
        self.insert_symbol(Symbol::Char(ch))
    }

    fn on_ctrl_num(&mut self, ch: char) -> KeyBehavior {
        let Some(n) = ch.to_digit(10).filter(|&n| n > 0) else {
            return KeyBehavior::KeyError;
        };
        if !self.syllable.is_empty() || self.symbols.is_empty() {
            return KeyBehavior::KeyError;
        }
        let n = n as usize;
        let len = self.symbols.len();
        let span = match self.options.add_direction {
            AddDirection::Backward => self.cursor.checked_sub(n).map(|s| (s, self.cursor)),
            AddDirection::Forward => Some((self.cursor, self.cursor + n)).filter(|&(_, e)| e <= len),
        };
        let Some((start, end)) = span else {
            return KeyBehavior::KeyError;
        };
        let Some(syllables) = self.span_syllables(start, end) else {
            return KeyBehavior::KeyError;
        };
        let phrase: String = self.symbol_texts()[start..end].concat();
        if phrase.chars().count() != n {
            return KeyBehavior::KeyError;
        }
        if self.dict.user.add(&key_for(&syllables), &phrase) {
            debug!(%phrase, "added user phrase");
            self.aux = format!("加入：{}", phrase);
        } else {
            self.aux = format!("已有：{}", phrase);
        }
        self.converter.invalidate();
        self.refresh();
        KeyBehavior::Absorb
    }

    fn selection_key_index(&self, ch: char) -> Option<usize> {
        self.options
            .selection_keys
            .chars()
            .take(self.options.candidates_per_page)
            .position(|k| k == ch)
    }

    fn shaped(&self, ch: char) -> char {
        match self.options.character_form {
            CharacterForm::Full => fullwidth_char(ch),
            CharacterForm::Half => ch,
        }
    }

    fn insert_literal(&mut self, ch: char) -> KeyBehavior {
        let ch = self.shaped(ch);
        if self.is_empty() {
            self.commit.push(ch);
            return KeyBehavior::Commit;
        }
        self.insert_symbol(Symbol::Char(ch))
    }

    fn complete_syllable(&mut self) -> KeyBehavior {
        let syllable = self.syllable.read();
        self.syllable.clear();
        trace!(%syllable, "syllable complete");
        self.insert_symbol(Symbol::Syllable(syllable))
    }

    fn insert_symbol(&mut self, symbol: Symbol) -> KeyBehavior {
        let at = self.cursor.min(self.symbols.len());
        self.symbols.insert(at, symbol);
        self.selections.retain(|s| !(s.start < at && at < s.end));
        for s in &mut self.selections {
            if s.start >= at {
                s.start += 1;
                s.end += 1;
            }
        }
        for b in &mut self.breaks {
            if *b > at {
                *b += 1;
            }
        }
        self.cursor = at + 1;
        self.window = None;
        self.refresh();
        if self.auto_commit() {
            KeyBehavior::Commit
        } else {
            KeyBehavior::Absorb
        }
    }

    fn remove_symbol(&mut self, at: usize) {
        if at >= self.symbols.len() {
            return;
        }
        self.symbols.remove(at);
        self.selections.retain(|s| !(s.start <= at && at < s.end));
        for s in &mut self.selections {
            if s.start > at {
                s.start -= 1;
                s.end -= 1;
            }
        }
        self.breaks.retain(|&b| b != at && b != at + 1);
        for b in &mut self.breaks {
            if *b > at {
                *b -= 1;
            }
        }
        self.cursor = self.cursor.min(self.symbols.len());
        self.refresh();
    }

    fn auto_commit(&mut self) -> bool {
        let len = self.symbols.len();
        let limit = self.options.auto_commit_threshold;
        if len <= limit {
            return false;
        }
        self.commit_front(len - limit);
        true
    }

    fn commit_all(&mut self) -> bool {
        if self.symbols.is_empty() {
            return false;
        }
        self.commit_front(self.symbols.len());
        true
    }

    /// Move the first `n` symbols into the commit buffer.
    fn commit_front(&mut self, n: usize) {
        let n = n.min(self.symbols.len());
        let text: String = self.symbol_texts()[..n].concat();
        self.learn_front(n);
        self.symbols.drain(..n);
        self.selections.retain(|s| s.start >= n);
        for s in &mut self.selections {
            s.start -= n;
            s.end -= n;
        }
        self.breaks.retain(|&b| b > n);
        for b in &mut self.breaks {
            *b -= n;
        }
        self.cursor = self.cursor.saturating_sub(n);
        self.window = None;
        debug!(%text, "commit");
        self.commit.push_str(&text);
        self.refresh();
    }

    fn learn_front(&mut self, n: usize) {
        if self.options.disable_auto_learn_phrase {
            return;
        }
        let mut learned = false;
        for iv in self.intervals.iter().filter(|iv| iv.end <= n) {
            let chosen = self
                .selections
                .iter()
                .any(|s| s.start == iv.start && s.end == iv.end);
            if iv.end - iv.start < 2 && !chosen {
                continue;
            }
            let Some(syllables) = self.span_syllables(iv.start, iv.end) else {
                continue;
            };
            if iv.phrase.chars().count() != syllables.len() {
                continue;
            }
            self.dict.user.learn(&key_for(&syllables), &iv.phrase);
            learned = true;
        }
        if learned {
            self.converter.invalidate();
        }
    }

    fn span_syllables(&self, start: usize, end: usize) -> Option<Vec<Syllable>> {
        self.symbols
            .get(start..end)?
            .iter()
            .map(Symbol::as_syllable)
            .collect()
    }

    fn refresh(&mut self) {
        self.intervals = self.converter.convert(
            self.options.conversion_engine,
            &self.dict,
            &self.symbols,
            &self.selections,
            &self.breaks,
        );
    }

    /// Converted text of each symbol. A span shown as raw bopomofo keeps the
    /// whole text on its first symbol.
    fn symbol_texts(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.symbols.len());
        for iv in &self.intervals {
            let width = iv.end - iv.start;
            let chars: Vec<char> = iv.phrase.chars().collect();
            if chars.len() == width {
                out.extend(chars.into_iter().map(String::from));
            } else {
                out.push(iv.phrase.clone());
                out.extend(std::iter::repeat(String::new()).take(width.saturating_sub(1)));
            }
        }
        out.resize(self.symbols.len(), String::new());
        out
    }

    // ----- candidate window -----

    fn candidates_for(&self, start: usize, end: usize) -> Vec<String> {
        let Some(syllables) = self.span_syllables(start, end) else {
            return Vec::new();
        };
        let fuzzy = self.options.conversion_engine == ConversionEngine::Fuzzy;
        if self.options.sort_candidates_by_frequency {
            return self
                .dict
                .phrases(&syllables, fuzzy)
                .into_iter()
                .map(|e| e.phrase)
                .collect();
        }
        let mut lex = self.dict.lexicon.lookup(&syllables);
        if lex.is_empty() && fuzzy {
            lex = self.dict.lexicon.lookup_toneless(&syllables);
        }
        let mut out: Vec<String> = lex.into_iter().map(|e| e.phrase).collect();
        for p in self.dict.user.phrases_for(&key_for(&syllables)) {
            if !out.contains(&p.phrase) {
                out.push(p.phrase);
            }
        }
        out
    }

    fn candidate_spans(&self) -> Vec<(usize, usize)> {
        let len = self.symbols.len();
        let rearward = self.options.phrase_choice_rearward || self.cursor >= len;
        let mut spans = Vec::new();
        for n in (1..=MAX_PHRASE_LEN.min(len)).rev() {
            let span = if rearward {
                let end = self.cursor.clamp(1, len);
                end.checked_sub(n).map(|s| (s, end))
            } else {
                Some((self.cursor, self.cursor + n)).filter(|&(_, e)| e <= len)
            };
            if let Some((s, e)) = span {
                if !self.candidates_for(s, e).is_empty() {
                    spans.push((s, e));
                }
            }
        }
        spans
    }

    /// Open the candidate window for the span at the cursor.
    pub fn open_candidates(&mut self) -> bool {
        if !self.syllable.is_empty() {
            return false;
        }
        let spans = self.candidate_spans();
        let Some(&(s, e)) = spans.first() else {
            return false;
        };
        let list = CandidateList::from_candidates(
            self.candidates_for(s, e),
            self.options.candidates_per_page,
        );
        self.window = Some(CandidateWindow {
            spans,
            current: 0,
            list,
        });
        self.touch();
        true
    }

    pub fn close_candidates(&mut self) {
        if self.window.take().is_some() {
            self.touch();
        }
    }

    pub fn is_selecting(&self) -> bool {
        self.window.is_some()
    }

    pub fn candidates(&self) -> Option<&CandidateList> {
        self.window.as_ref().map(|w| &w.list)
    }

    /// Composition span the open window offers phrases for.
    pub fn candidate_span(&self) -> Option<(usize, usize)> {
        self.window.as_ref().map(|w| w.spans[w.current])
    }

    fn switch_list(&mut self, pick: impl FnOnce(usize, usize) -> Option<usize>) -> bool {
        let Some(w) = &self.window else {
            return false;
        };
        let Some(next) = pick(w.current, w.spans.len()).filter(|&i| i < w.spans.len()) else {
            return false;
        };
        let (s, e) = w.spans[next];
        let candidates = self.candidates_for(s, e);
        if let Some(w) = &mut self.window {
            w.current = next;
            w.list.set_candidates(candidates);
        }
        self.touch();
        true
    }

    pub fn list_has_next(&self) -> bool {
        self.window
            .as_ref()
            .is_some_and(|w| w.current + 1 < w.spans.len())
    }

    pub fn list_has_prev(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.current > 0)
    }

    /// Switch to the next shorter phrase list.
    pub fn list_next(&mut self) -> bool {
        self.switch_list(|cur, _| Some(cur + 1))
    }

    pub fn list_prev(&mut self) -> bool {
        self.switch_list(|cur, _| cur.checked_sub(1))
    }

    pub fn list_first(&mut self) -> bool {
        self.switch_list(|_, _| Some(0))
    }

    pub fn list_last(&mut self) -> bool {
        self.switch_list(|_, n| n.checked_sub(1))
    }

    fn choose_on_page(&mut self, page_index: usize) -> bool {
        match self.window.as_ref().and_then(|w| w.list.global_index(page_index)) {
            Some(idx) => self.choose_by_index(idx),
            None => false,
        }
    }

    /// Fix the candidate at `index` (over the whole list) for its span.
    pub fn choose_by_index(&mut self, index: usize) -> bool {
        let Some(w) = &self.window else {
            return false;
        };
        let (start, end) = w.spans[w.current];
        let Some(phrase) = w.list.get(index).map(str::to_string) else {
            return false;
        };
        debug!(%phrase, start, end, "candidate chosen");
        self.selections.retain(|s| s.end <= start || s.start >= end);
        self.selections.push(Selection { start, end, phrase });
        self.selections.sort_by_key(|s| s.start);
        self.window = None;
        if self.options.auto_shift_cursor {
            self.cursor = end.min(self.symbols.len());
        }
        self.touch();
        self.refresh();
        true
    }

    // ----- buffers -----

    pub fn bopomofo_string(&self) -> String {
        self.syllable.read().to_string()
    }

    pub fn buffer_string(&self) -> String {
        self.intervals.iter().map(|iv| iv.phrase.as_str()).collect()
    }

    /// Number of symbols in the composition buffer.
    pub fn buffer_len(&self) -> usize {
        self.symbols.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn commit_string(&self) -> &str {
        &self.commit
    }

    pub fn has_commit(&self) -> bool {
        !self.commit.is_empty()
    }

    /// Acknowledge (clear) the committed text.
    pub fn ack(&mut self) {
        self.commit.clear();
    }

    pub fn aux_string(&self) -> &str {
        &self.aux
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Encoded syllables of the composition, literal characters skipped.
    pub fn phone_seq(&self) -> Vec<u16> {
        self.symbols
            .iter()
            .filter_map(Symbol::as_syllable)
            .map(|s| s.to_u16())
            .collect()
    }

    /// Commit the whole composition as if Enter was pressed.
    pub fn commit_preedit(&mut self) -> bool {
        self.touch();
        self.commit.clear();
        let done = self.commit_all();
        if done {
            self.last = KeyBehavior::Commit;
        }
        done
    }

    pub fn clean_preedit(&mut self) {
        self.symbols.clear();
        self.selections.clear();
        self.breaks.clear();
        self.cursor = 0;
        self.window = None;
        self.touch();
        self.refresh();
    }

    pub fn clean_bopomofo(&mut self) {
        self.syllable.clear();
        self.touch();
    }

    /// Drop all editing state; options and the user dictionary are kept.
    pub fn reset(&mut self) {
        self.syllable.clear();
        self.clean_preedit();
        self.commit.clear();
        self.aux.clear();
        self.last = KeyBehavior::Ignore;
    }

    // ----- user phrases -----

    fn parse_bopomofo(phrase: &str, bopomofo: &str) -> Result<Vec<Syllable>> {
        let syllables = bopomofo
            .split_whitespace()
            .map(|s| s.parse::<Syllable>())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if syllables.is_empty() || syllables.len() != phrase.chars().count() {
            bail!(
                "phrase {:?} has {} characters but {} syllables",
                phrase,
                phrase.chars().count(),
                syllables.len()
            );
        }
        Ok(syllables)
    }

    /// Add a user phrase. Returns false if it was already present.
    pub fn add_user_phrase(&mut self, phrase: &str, bopomofo: &str) -> Result<bool> {
        let phrase = normalize(phrase);
        let syllables = Self::parse_bopomofo(&phrase, bopomofo)?;
        let added = self.dict.user.add(&key_for(&syllables), &phrase);
        self.converter.invalidate();
        self.touch();
        self.refresh();
        Ok(added)
    }

    pub fn remove_user_phrase(&mut self, phrase: &str, bopomofo: &str) -> Result<bool> {
        let phrase = normalize(phrase);
        let syllables = Self::parse_bopomofo(&phrase, bopomofo)?;
        let removed = self.dict.user.remove(&key_for(&syllables), &phrase);
        self.converter.invalidate();
        self.touch();
        self.refresh();
        Ok(removed)
    }

    /// Whether a user phrase exists. A missing phrase matches any phrase
    /// stored under `bopomofo`.
    pub fn lookup_user_phrase(&self, phrase: Option<&str>, bopomofo: Option<&str>) -> bool {
        match (phrase, bopomofo) {
            (Some(p), Some(b)) => match Self::parse_bopomofo(p, b) {
                Ok(syllables) => self.dict.user.contains(p, Some(&key_for(&syllables))),
                Err(_) => false,
            },
            (Some(p), None) => self.dict.user.contains(p, None),
            (None, Some(b)) => {
                let syllables: std::result::Result<Vec<Syllable>, _> =
                    b.split_whitespace().map(str::parse).collect();
                match syllables {
                    Ok(s) if !s.is_empty() => !self.dict.user.phrases_for(&key_for(&s)).is_empty(),
                    _ => false,
                }
            }
            (None, None) => false,
        }
    }

    pub fn user_phrases(&self) -> Vec<UserPhrase> {
        self.dict.user.entries()
    }
}
