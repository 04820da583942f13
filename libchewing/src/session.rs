//! The session: one editor plus its configuration surface, callbacks,
//! log sink and enumeration cursors.
//!
//! Every mutating method runs with the session's log sink installed as the
//! thread's `tracing` dispatcher and dispatches changed channels to the
//! registered callbacks before returning. A session is not synchronized;
//! callers serialize access to it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use libchewing_core::{
    AddDirection, CandidateList, CharacterForm, ConversionEngine, Editor, Interval, Key,
    KeyBehavior, KeyboardLayout, LanguageMode, Lexicon, UserDict, UserPhrase,
};
use tracing::{debug, info, warn};

use crate::callbacks::{Callbacks, Router};
use crate::config::{read_option, write_option, OptionKind, OptionName, OptionValue, SessionConfig};
use crate::cursor::{CandidateCursor, CursorState, Walk};
use crate::error::{ConfigError, OpenError};
use crate::logger::{LogFn, LogLevel, LogSink, LoggingConfig, SharedSink};
use crate::paths;

pub struct Session {
    editor: Editor,
    router: Router,
    log: SharedSink,
    candidates: CandidateCursor,
    intervals: Walk<Interval>,
    layouts: Walk<KeyboardLayout>,
    user_phrases: Walk<UserPhrase>,
    data_dir: PathBuf,
    user_path: Option<PathBuf>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("data_dir", &self.data_dir)
            .field("user_path", &self.user_path)
            .field("options", self.editor.options())
            .finish_non_exhaustive()
    }
}

macro_rules! toggle_accessors {
    ($($get:ident, $set:ident => $opt:ident;)*) => {
        $(
            pub fn $get(&self) -> bool {
                self.editor.options().$get
            }

            pub fn $set(&mut self, on: bool) {
                // toggles accept every value
                let _ = self.set_option(OptionName::$opt, OptionValue::Int(on as i32));
            }
        )*
    };
}

impl Session {
    /// Open a session: validate `config`, load the system dictionary and
    /// open the user phrase store.
    pub fn open(config: SessionConfig, callbacks: Callbacks) -> Result<Session, OpenError> {
        let mut router = Router::default();
        let log_fn = router.install(callbacks);
        let log = LogSink::shared(config.logging.clone(), log_fn);
        let opened = {
            let _guard = LogSink::enter(&log);
            Self::load(&config)
        };
        match opened {
            Ok((editor, data_dir, user_path)) => {
                router.sync(&editor);
                let session = Session {
                    editor,
                    router,
                    log,
                    candidates: CandidateCursor::default(),
                    intervals: Walk::default(),
                    layouts: Walk::default(),
                    user_phrases: Walk::default(),
                    data_dir,
                    user_path,
                };
                let _guard = LogSink::enter(&session.log);
                info!(data_dir = %session.data_dir.display(), "session opened");
                Ok(session)
            }
            Err(e) => {
                if let Ok(mut sink) = log.lock() {
                    sink.emit(LogLevel::Critical, &format!("failed to open session: {e}"));
                }
                Err(e)
            }
        }
    }

    fn load(config: &SessionConfig) -> Result<(Editor, PathBuf, Option<PathBuf>), OpenError> {
        let options = config.validate()?;
        let data_dir = paths::resolve_data_dir(config.data_path.as_deref())?;
        let lexicon = Lexicon::load_from_dir(&data_dir).map_err(|source| OpenError::Dictionary {
            path: data_dir.clone(),
            source,
        })?;
        let user_path = paths::resolve_user_path(config.user_path.as_deref());
        let user = match &user_path {
            Some(path) => UserDict::open(path).map_err(|source| OpenError::UserStore {
                path: path.clone(),
                source,
            })?,
            None => {
                debug!("no user data location, keeping user phrases in memory");
                UserDict::new_in_memory()
            }
        };
        Ok((Editor::new(Arc::new(lexicon), user, options), data_dir, user_path))
    }

    /// Release the session. Dropping it does the same.
    pub fn close(self) {}

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn user_path(&self) -> Option<&Path> {
        self.user_path.as_deref()
    }

    /// Run `f` with logging scoped to this session, then report changes.
    fn run<R>(&mut self, commits: bool, f: impl FnOnce(&mut Editor) -> R) -> R {
        let _guard = LogSink::enter(&self.log);
        let out = f(&mut self.editor);
        let committed = commits && self.editor.has_commit();
        self.router.dispatch(&self.editor, committed);
        out
    }

    // ----- callbacks and logging -----

    /// Replace all five handlers. Channels already reported are not
    /// re-sent to the new handlers.
    pub fn set_callbacks(&mut self, callbacks: Callbacks) {
        let log_fn = self.router.install(callbacks);
        self.set_log_callback(log_fn);
    }

    pub fn set_log_callback(&mut self, callback: Option<LogFn>) {
        if let Ok(mut sink) = self.log.lock() {
            sink.set_callback(callback);
        }
    }

    /// Send a message straight to the log callback, subject to the filter.
    pub fn log(&self, level: LogLevel, message: &str) {
        if let Ok(mut sink) = self.log.lock() {
            sink.emit(level, message);
        }
    }

    pub fn logging(&self) -> LoggingConfig {
        self.log
            .lock()
            .map(|sink| sink.config().clone())
            .unwrap_or_default()
    }

    pub fn set_logging(&mut self, config: LoggingConfig) {
        if let Ok(mut sink) = self.log.lock() {
            sink.set_config(config);
        }
    }

    // ----- configuration -----

    pub fn has_option(&self, name: &str) -> bool {
        name.parse::<OptionName>().is_ok()
    }

    pub fn option(&self, name: OptionName) -> OptionValue {
        read_option(self.editor.options(), name)
    }

    /// Validate and store one option. A rejected value leaves the option as
    /// it was.
    pub fn set_option(&mut self, name: OptionName, value: OptionValue) -> Result<(), ConfigError> {
        let _guard = LogSink::enter(&self.log);
        let mut options = self.editor.options().clone();
        let result = write_option(&mut options, name, value);
        if &options != self.editor.options() {
            self.editor.set_options(options);
            self.router.dispatch(&self.editor, false);
        }
        match &result {
            Ok(()) => debug!(option = name.name(), "option updated"),
            Err(e) => warn!("{e}"),
        }
        result
    }

    pub fn get_int(&self, name: &str) -> Result<i32, ConfigError> {
        let name = name.parse::<OptionName>()?;
        match self.option(name) {
            OptionValue::Int(v) => Ok(v),
            OptionValue::Str(_) => Err(ConfigError::WrongType {
                name: name.name(),
                expected: "string",
            }),
        }
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> Result<(), ConfigError> {
        self.set_option(name.parse()?, OptionValue::Int(value))
    }

    pub fn get_str(&self, name: &str) -> Result<String, ConfigError> {
        let name = name.parse::<OptionName>()?;
        match self.option(name) {
            OptionValue::Str(v) => Ok(v),
            OptionValue::Int(_) => Err(ConfigError::WrongType {
                name: name.name(),
                expected: "integer",
            }),
        }
    }

    pub fn set_str(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        self.set_option(name.parse()?, OptionValue::Str(value.to_string()))
    }

    /// Kind of a named option, `None` when the name is unknown.
    pub fn option_kind(&self, name: &str) -> Option<OptionKind> {
        name.parse::<OptionName>().ok().map(OptionName::kind)
    }

    /// Current settings as an open-time configuration.
    pub fn config(&self) -> SessionConfig {
        let mut config = SessionConfig::from_options(self.editor.options());
        config.data_path = Some(self.data_dir.clone());
        config.user_path = self.user_path.clone();
        config.logging = self.logging();
        config
    }

    pub fn candidates_per_page(&self) -> usize {
        self.editor.options().candidates_per_page
    }

    pub fn set_candidates_per_page(&mut self, n: i32) -> Result<(), ConfigError> {
        self.set_option(OptionName::CandidatesPerPage, OptionValue::Int(n))
    }

    pub fn max_symbol_len(&self) -> usize {
        self.editor.options().auto_commit_threshold
    }

    pub fn set_max_symbol_len(&mut self, n: i32) -> Result<(), ConfigError> {
        self.set_option(OptionName::AutoCommitThreshold, OptionValue::Int(n))
    }

    pub fn selection_keys(&self) -> &str {
        &self.editor.options().selection_keys
    }

    pub fn set_selection_keys(&mut self, keys: &str) -> Result<(), ConfigError> {
        self.set_option(OptionName::SelectionKeys, OptionValue::Str(keys.to_string()))
    }

    pub fn keyboard_layout(&self) -> KeyboardLayout {
        self.editor.options().layout
    }

    /// Layouts without an editor fall back to the default one and report
    /// an error.
    pub fn set_keyboard_layout(&mut self, layout: KeyboardLayout) -> Result<(), ConfigError> {
        self.set_option(OptionName::KeyboardType, OptionValue::Str(layout.name().to_string()))
    }

    pub fn add_direction(&self) -> AddDirection {
        self.editor.options().add_direction
    }

    pub fn set_add_direction(&mut self, direction: AddDirection) {
        let _ = self.set_option(
            OptionName::UserPhraseAddDirection,
            OptionValue::Int(direction.id()),
        );
    }

    pub fn language_mode(&self) -> LanguageMode {
        self.editor.options().language_mode
    }

    pub fn set_language_mode(&mut self, mode: LanguageMode) {
        let _ = self.set_option(OptionName::LanguageMode, OptionValue::Int(mode.id()));
    }

    pub fn character_form(&self) -> CharacterForm {
        self.editor.options().character_form
    }

    pub fn set_character_form(&mut self, form: CharacterForm) {
        let _ = self.set_option(OptionName::CharacterForm, OptionValue::Int(form.id()));
    }

    pub fn conversion_engine(&self) -> ConversionEngine {
        self.editor.options().conversion_engine
    }

    pub fn set_conversion_engine(&mut self, engine: ConversionEngine) {
        let _ = self.set_option(OptionName::ConversionEngine, OptionValue::Int(engine.id()));
    }

    toggle_accessors! {
        disable_auto_learn_phrase, set_disable_auto_learn_phrase => DisableAutoLearnPhrase;
        auto_shift_cursor, set_auto_shift_cursor => AutoShiftCursor;
        easy_symbol_input, set_easy_symbol_input => EasySymbolInput;
        esc_clear_all_buffer, set_esc_clear_all_buffer => EscClearAllBuffer;
        phrase_choice_rearward, set_phrase_choice_rearward => PhraseChoiceRearward;
        space_is_select_key, set_space_is_select_key => SpaceIsSelectKey;
        enable_fullwidth_toggle_key, set_enable_fullwidth_toggle_key => EnableFullwidthToggleKey;
        sort_candidates_by_frequency, set_sort_candidates_by_frequency => SortCandidatesByFrequency;
    }

    // ----- keystrokes -----

    pub fn handle(&mut self, key: Key) -> KeyBehavior {
        self.run(true, |ed| ed.process(key))
    }

    /// Process `key` without notifying anyone yet. The changes are
    /// reported by the next [`Session::flush_events`] or mutating call.
    pub(crate) fn handle_held(&mut self, key: Key) -> KeyBehavior {
        let _guard = LogSink::enter(&self.log);
        self.editor.process(key)
    }

    /// Notify the buffer, preedit and commit handlers of held changes.
    pub(crate) fn flush_events(&mut self) {
        let committed = self.editor.has_commit();
        self.router.dispatch(&self.editor, committed);
    }

    pub fn last_behavior(&self) -> KeyBehavior {
        self.editor.last_behavior()
    }

    // ----- buffers -----

    pub fn buffer_string(&self) -> String {
        self.editor.buffer_string()
    }

    pub fn buffer_len(&self) -> usize {
        self.editor.buffer_len()
    }

    pub fn cursor(&self) -> usize {
        self.editor.cursor()
    }

    pub fn bopomofo_string(&self) -> String {
        self.editor.bopomofo_string()
    }

    pub fn commit_string(&self) -> &str {
        self.editor.commit_string()
    }

    pub fn has_commit(&self) -> bool {
        self.editor.has_commit()
    }

    pub fn aux_string(&self) -> &str {
        self.editor.aux_string()
    }

    pub fn phone_seq(&self) -> Vec<u16> {
        self.editor.phone_seq()
    }

    /// Commit the whole composition. False when there was nothing to commit.
    pub fn commit_preedit(&mut self) -> bool {
        self.run(true, Editor::commit_preedit)
    }

    pub fn clean_preedit(&mut self) {
        self.run(false, Editor::clean_preedit)
    }

    pub fn clean_bopomofo(&mut self) {
        self.run(false, Editor::clean_bopomofo)
    }

    pub fn reset(&mut self) {
        self.run(false, Editor::reset)
    }

    /// Drop the committed text once the caller has consumed it.
    pub fn ack(&mut self) {
        self.editor.ack();
    }

    // ----- candidate window -----

    pub fn cand_open(&mut self) -> bool {
        self.run(false, Editor::open_candidates)
    }

    pub fn cand_close(&mut self) {
        self.run(false, Editor::close_candidates)
    }

    pub fn is_selecting(&self) -> bool {
        self.editor.is_selecting()
    }

    pub fn cand_total_choices(&self) -> usize {
        self.editor.candidates().map_or(0, CandidateList::len)
    }

    pub fn cand_total_pages(&self) -> usize {
        self.editor.candidates().map_or(0, CandidateList::num_pages)
    }

    pub fn cand_choice_per_page(&self) -> usize {
        self.editor
            .candidates()
            .map_or(self.candidates_per_page(), CandidateList::page_size)
    }

    pub fn cand_current_page(&self) -> usize {
        self.editor.candidates().map_or(0, CandidateList::current_page)
    }

    /// Candidate at `index` over the whole open list.
    pub fn cand_string_by_index(&self, index: usize) -> Option<&str> {
        self.editor.candidates()?.get(index)
    }

    pub fn choose_by_index(&mut self, index: usize) -> bool {
        self.run(false, |ed| ed.choose_by_index(index))
    }

    pub fn cand_list_has_next(&self) -> bool {
        self.editor.list_has_next()
    }

    pub fn cand_list_has_prev(&self) -> bool {
        self.editor.list_has_prev()
    }

    pub fn cand_list_next(&mut self) -> bool {
        self.run(false, Editor::list_next)
    }

    pub fn cand_list_prev(&mut self) -> bool {
        self.run(false, Editor::list_prev)
    }

    pub fn cand_list_first(&mut self) -> bool {
        self.run(false, Editor::list_first)
    }

    pub fn cand_list_last(&mut self) -> bool {
        self.run(false, Editor::list_last)
    }

    /// Candidates for the span at the cursor, without leaving a window open
    /// or reporting one.
    pub fn peek_candidates(&mut self) -> Option<CandidateList> {
        let _guard = LogSink::enter(&self.log);
        if self.editor.is_selecting() {
            return self.editor.candidates().cloned();
        }
        if !self.editor.open_candidates() {
            return None;
        }
        let list = self.editor.candidates().cloned();
        self.editor.close_candidates();
        list
    }

    // ----- candidate enumeration -----

    pub fn cand_enumerate(&mut self) {
        self.candidates.open(&self.editor);
    }

    pub fn cand_cursor_state(&mut self) -> CursorState {
        self.candidates.state(self.editor.revision())
    }

    pub fn cand_has_next(&mut self) -> bool {
        self.candidates.has_next(self.editor.revision())
    }

    pub fn cand_next(&mut self) -> Option<String> {
        self.candidates
            .next(self.editor.revision())
            .map(str::to_string)
    }

    // ----- intervals and layouts -----

    pub fn intervals(&self) -> &[Interval] {
        self.editor.intervals()
    }

    pub fn interval_enumerate(&mut self) {
        self.intervals.reset(self.editor.intervals().to_vec());
    }

    pub fn interval_has_next(&self) -> bool {
        self.intervals.has_next()
    }

    pub fn interval_next(&mut self) -> Option<Interval> {
        self.intervals.advance().cloned()
    }

    pub fn kbtype_enumerate(&mut self) {
        self.layouts.reset(KeyboardLayout::ALL.to_vec());
    }

    pub fn kbtype_has_next(&self) -> bool {
        self.layouts.has_next()
    }

    pub fn kbtype_next(&mut self) -> Option<KeyboardLayout> {
        self.layouts.advance().copied()
    }

    // ----- user phrases -----

    /// Add a phrase under space separated bopomofo syllables. Ok(false)
    /// when it was already present.
    pub fn add_user_phrase(&mut self, phrase: &str, bopomofo: &str) -> Result<bool> {
        self.run(false, |ed| ed.add_user_phrase(phrase, bopomofo))
    }

    pub fn remove_user_phrase(&mut self, phrase: &str, bopomofo: &str) -> Result<bool> {
        self.run(false, |ed| ed.remove_user_phrase(phrase, bopomofo))
    }

    /// A missing phrase matches any phrase under `bopomofo`.
    pub fn lookup_user_phrase(&self, phrase: Option<&str>, bopomofo: Option<&str>) -> bool {
        self.editor.lookup_user_phrase(phrase, bopomofo)
    }

    pub fn user_phrases(&self) -> Vec<UserPhrase> {
        self.editor.user_phrases()
    }

    pub fn userphrase_enumerate(&mut self) {
        self.user_phrases.reset(self.editor.user_phrases());
    }

    pub fn userphrase_peek(&self) -> Option<&UserPhrase> {
        self.user_phrases.peek()
    }

    pub fn userphrase_next(&mut self) -> Option<UserPhrase> {
        self.user_phrases.advance().cloned()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _guard = LogSink::enter(&self.log);
        info!("session closed");
    }
}
