//! Session configuration.
//!
//! [`SessionConfig`] is the open-time bag (TOML loadable). Once a session is
//! open its live values are the editor's [`EditorOptions`]; both the typed
//! accessors on the session and the string-keyed facade read and write them
//! through [`read_option`] and [`write_option`], so a value written through
//! one path is visible through the other.
//!
//! Every write is validated before anything changes. A rejected write leaves
//! the previous value in place.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use libchewing_core::{
    AddDirection, CharacterForm, ConversionEngine, EditorOptions, KeyboardLayout, LanguageMode,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logger::LoggingConfig;

pub const MIN_SELKEY: i32 = 1;
pub const MAX_SELKEY: i32 = 10;
pub const MIN_CHI_SYMBOL_LEN: i32 = 0;
pub const MAX_CHI_SYMBOL_LEN: i32 = 39;

/// Options reachable through the string-keyed facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionName {
    UserPhraseAddDirection,
    DisableAutoLearnPhrase,
    AutoShiftCursor,
    CandidatesPerPage,
    LanguageMode,
    EasySymbolInput,
    EscClearAllBuffer,
    KeyboardType,
    AutoCommitThreshold,
    PhraseChoiceRearward,
    SelectionKeys,
    CharacterForm,
    SpaceIsSelectKey,
    ConversionEngine,
    EnableFullwidthToggleKey,
    SortCandidatesByFrequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Int,
    Str,
}

impl OptionName {
    pub const ALL: [OptionName; 16] = [
        OptionName::UserPhraseAddDirection,
        OptionName::DisableAutoLearnPhrase,
        OptionName::AutoShiftCursor,
        OptionName::CandidatesPerPage,
        OptionName::LanguageMode,
        OptionName::EasySymbolInput,
        OptionName::EscClearAllBuffer,
        OptionName::KeyboardType,
        OptionName::AutoCommitThreshold,
        OptionName::PhraseChoiceRearward,
        OptionName::SelectionKeys,
        OptionName::CharacterForm,
        OptionName::SpaceIsSelectKey,
        OptionName::ConversionEngine,
        OptionName::EnableFullwidthToggleKey,
        OptionName::SortCandidatesByFrequency,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OptionName::UserPhraseAddDirection => "chewing.user_phrase_add_direction",
            OptionName::DisableAutoLearnPhrase => "chewing.disable_auto_learn_phrase",
            OptionName::AutoShiftCursor => "chewing.auto_shift_cursor",
            OptionName::CandidatesPerPage => "chewing.candidates_per_page",
            OptionName::LanguageMode => "chewing.language_mode",
            OptionName::EasySymbolInput => "chewing.easy_symbol_input",
            OptionName::EscClearAllBuffer => "chewing.esc_clear_all_buffer",
            OptionName::KeyboardType => "chewing.keyboard_type",
            OptionName::AutoCommitThreshold => "chewing.auto_commit_threshold",
            OptionName::PhraseChoiceRearward => "chewing.phrase_choice_rearward",
            OptionName::SelectionKeys => "chewing.selection_keys",
            OptionName::CharacterForm => "chewing.character_form",
            OptionName::SpaceIsSelectKey => "chewing.space_is_select_key",
            OptionName::ConversionEngine => "chewing.conversion_engine",
            OptionName::EnableFullwidthToggleKey => "chewing.enable_fullwidth_toggle_key",
            OptionName::SortCandidatesByFrequency => "chewing.sort_candidates_by_frequency",
        }
    }

    pub fn kind(self) -> OptionKind {
        match self {
            OptionName::KeyboardType | OptionName::SelectionKeys => OptionKind::Str,
            _ => OptionKind::Int,
        }
    }
}

impl FromStr for OptionName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|o| o.name() == s)
            .ok_or_else(|| ConfigError::UnknownOption(s.to_string()))
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Int(i32),
    Str(String),
}

impl OptionValue {
    fn int(self, name: OptionName) -> Result<i32, ConfigError> {
        match self {
            OptionValue::Int(v) => Ok(v),
            OptionValue::Str(_) => Err(ConfigError::WrongType {
                name: name.name(),
                expected: "integer",
            }),
        }
    }

    fn string(self, name: OptionName) -> Result<String, ConfigError> {
        match self {
            OptionValue::Str(v) => Ok(v),
            OptionValue::Int(_) => Err(ConfigError::WrongType {
                name: name.name(),
                expected: "string",
            }),
        }
    }
}

// ----- domains -----

pub fn check_max_symbol_len(value: i32) -> Result<usize, ConfigError> {
    if !(MIN_CHI_SYMBOL_LEN..=MAX_CHI_SYMBOL_LEN).contains(&value) {
        return Err(ConfigError::out_of_domain(
            OptionName::AutoCommitThreshold.name(),
            value,
            format!("{}..={}", MIN_CHI_SYMBOL_LEN, MAX_CHI_SYMBOL_LEN),
        ));
    }
    Ok(value as usize)
}

/// Page size is bounded by the selection key ceiling and the symbol length.
pub fn check_candidates_per_page(value: i32, max_symbol_len: usize) -> Result<usize, ConfigError> {
    let ceiling = MAX_SELKEY.min(max_symbol_len as i32);
    if value < MIN_SELKEY || value > ceiling {
        return Err(ConfigError::out_of_domain(
            OptionName::CandidatesPerPage.name(),
            value,
            format!("{}..={}", MIN_SELKEY, ceiling),
        ));
    }
    Ok(value as usize)
}

/// Selection keys are distinct printable ASCII, at most [`MAX_SELKEY`].
fn check_key_set(keys: &str) -> Result<(), ConfigError> {
    let name = OptionName::SelectionKeys.name();
    let bytes = keys.as_bytes();
    if !keys.is_ascii() || bytes.iter().any(|b| !b.is_ascii_graphic()) {
        return Err(ConfigError::out_of_domain(name, keys, "printable ASCII"));
    }
    if bytes.len() > MAX_SELKEY as usize {
        return Err(ConfigError::out_of_domain(
            name,
            keys,
            format!("at most {} keys", MAX_SELKEY),
        ));
    }
    if bytes
        .iter()
        .enumerate()
        .any(|(i, b)| bytes[..i].contains(b))
    {
        return Err(ConfigError::out_of_domain(name, keys, "distinct keys"));
    }
    Ok(())
}

/// A selection key write supplies exactly one key per candidate on a page.
pub fn check_selection_keys(keys: &str, candidates_per_page: usize) -> Result<(), ConfigError> {
    check_key_set(keys)?;
    if keys.len() != candidates_per_page {
        return Err(ConfigError::out_of_domain(
            OptionName::SelectionKeys.name(),
            keys,
            format!("exactly {} keys", candidates_per_page),
        ));
    }
    Ok(())
}

/// Stored keys may outnumber the page size after the page size shrinks;
/// only the first `candidates_per_page` are active.
pub fn check_stored_selection_keys(keys: &str, candidates_per_page: usize) -> Result<(), ConfigError> {
    check_key_set(keys)?;
    if keys.len() < candidates_per_page {
        return Err(ConfigError::out_of_domain(
            OptionName::SelectionKeys.name(),
            keys,
            format!("at least {} keys", candidates_per_page),
        ));
    }
    Ok(())
}

fn check_enum<T>(
    name: OptionName,
    value: i32,
    parse: fn(i32) -> Option<T>,
    domain: &str,
) -> Result<T, ConfigError> {
    parse(value).ok_or_else(|| ConfigError::out_of_domain(name.name(), value, domain))
}

/// Resolve a layout name. Known layouts without an editor fall back to the
/// default layout; the fallback is applied and reported as an error.
pub fn resolve_layout(name: &str) -> Result<KeyboardLayout, (Option<KeyboardLayout>, ConfigError)> {
    let opt = OptionName::KeyboardType.name();
    match KeyboardLayout::from_str(name) {
        Ok(layout) if layout.is_supported() => Ok(layout),
        Ok(_) => Err((
            Some(KeyboardLayout::Default),
            ConfigError::out_of_domain(opt, name, "supported keyboard layouts"),
        )),
        Err(_) => Err((None, ConfigError::out_of_domain(opt, name, "keyboard layout names"))),
    }
}

/// Current value of `name`.
pub fn read_option(options: &EditorOptions, name: OptionName) -> OptionValue {
    let flag = |b: bool| OptionValue::Int(b as i32);
    match name {
        OptionName::UserPhraseAddDirection => OptionValue::Int(options.add_direction.id()),
        OptionName::DisableAutoLearnPhrase => flag(options.disable_auto_learn_phrase),
        OptionName::AutoShiftCursor => flag(options.auto_shift_cursor),
        OptionName::CandidatesPerPage => OptionValue::Int(options.candidates_per_page as i32),
        OptionName::LanguageMode => OptionValue::Int(options.language_mode.id()),
        OptionName::EasySymbolInput => flag(options.easy_symbol_input),
        OptionName::EscClearAllBuffer => flag(options.esc_clear_all_buffer),
        OptionName::KeyboardType => OptionValue::Str(options.layout.name().to_string()),
        OptionName::AutoCommitThreshold => OptionValue::Int(options.auto_commit_threshold as i32),
        OptionName::PhraseChoiceRearward => flag(options.phrase_choice_rearward),
        OptionName::SelectionKeys => OptionValue::Str(options.selection_keys.clone()),
        OptionName::CharacterForm => OptionValue::Int(options.character_form.id()),
        OptionName::SpaceIsSelectKey => flag(options.space_is_select_key),
        OptionName::ConversionEngine => OptionValue::Int(options.conversion_engine.id()),
        OptionName::EnableFullwidthToggleKey => flag(options.enable_fullwidth_toggle_key),
        OptionName::SortCandidatesByFrequency => flag(options.sort_candidates_by_frequency),
    }
}

/// Validate `value` and store it. On error `options` is unchanged, except for
/// the keyboard layout fallback described on [`resolve_layout`].
pub fn write_option(
    options: &mut EditorOptions,
    name: OptionName,
    value: OptionValue,
) -> Result<(), ConfigError> {
    match name {
        OptionName::KeyboardType => {
            let layout = value.string(name)?;
            match resolve_layout(&layout) {
                Ok(l) => options.layout = l,
                Err((fallback, err)) => {
                    if let Some(l) = fallback {
                        options.layout = l;
                    }
                    return Err(err);
                }
            }
        }
        OptionName::SelectionKeys => {
            let keys = value.string(name)?;
            check_selection_keys(&keys, options.candidates_per_page)?;
            options.selection_keys = keys;
        }
        OptionName::CandidatesPerPage => {
            let candidates_per_page =
                check_candidates_per_page(value.int(name)?, options.auto_commit_threshold)?;
            let keys = options.selection_keys.len();
            if candidates_per_page > keys {
                return Err(ConfigError::out_of_domain(
                    name.name(),
                    candidates_per_page,
                    format!("{}..={}", MIN_SELKEY, keys),
                ));
            }
            options.candidates_per_page = candidates_per_page;
        }
        OptionName::AutoCommitThreshold => {
            let max_symbol_len = check_max_symbol_len(value.int(name)?)?;
            // The page size must stay within the new limit.
            if max_symbol_len < options.candidates_per_page {
                return Err(ConfigError::out_of_domain(
                    name.name(),
                    max_symbol_len,
                    format!("{}..={}", options.candidates_per_page, MAX_CHI_SYMBOL_LEN),
                ));
            }
            options.auto_commit_threshold = max_symbol_len;
        }
        OptionName::UserPhraseAddDirection => {
            options.add_direction =
                check_enum(name, value.int(name)?, AddDirection::from_id, "0 or 1")?;
        }
        OptionName::LanguageMode => {
            options.language_mode =
                check_enum(name, value.int(name)?, LanguageMode::from_id, "0 or 1")?;
        }
        OptionName::CharacterForm => {
            options.character_form =
                check_enum(name, value.int(name)?, CharacterForm::from_id, "0 or 1")?;
        }
        OptionName::ConversionEngine => {
            options.conversion_engine =
                check_enum(name, value.int(name)?, ConversionEngine::from_id, "0..=2")?;
        }
        toggle => {
            let on = value.int(toggle)? != 0;
            *toggle_mut(options, toggle) = on;
        }
    }
    Ok(())
}

fn toggle_mut(options: &mut EditorOptions, name: OptionName) -> &mut bool {
    match name {
        OptionName::DisableAutoLearnPhrase => &mut options.disable_auto_learn_phrase,
        OptionName::AutoShiftCursor => &mut options.auto_shift_cursor,
        OptionName::EasySymbolInput => &mut options.easy_symbol_input,
        OptionName::EscClearAllBuffer => &mut options.esc_clear_all_buffer,
        OptionName::PhraseChoiceRearward => &mut options.phrase_choice_rearward,
        OptionName::SpaceIsSelectKey => &mut options.space_is_select_key,
        OptionName::EnableFullwidthToggleKey => &mut options.enable_fullwidth_toggle_key,
        _ => &mut options.sort_candidates_by_frequency,
    }
}

/// Open-time configuration.
///
/// ```toml
/// data_path = "/usr/share/chewing"
/// candidates_per_page = 9
/// selection_keys = "123456789"
/// keyboard_type = "KB_HSU"
///
/// [logging]
/// min_level = "warning"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding the system dictionary. Resolved from the
    /// environment when absent.
    pub data_path: Option<PathBuf>,
    /// User phrase store file.
    pub user_path: Option<PathBuf>,
    pub candidates_per_page: i32,
    /// Maximum composition length before the leading text auto-commits.
    pub max_symbol_len: i32,
    pub selection_keys: String,
    pub keyboard_type: String,
    pub user_phrase_add_direction: i32,
    pub disable_auto_learn_phrase: bool,
    pub auto_shift_cursor: bool,
    pub easy_symbol_input: bool,
    pub esc_clear_all_buffer: bool,
    pub phrase_choice_rearward: bool,
    pub space_is_select_key: bool,
    pub enable_fullwidth_toggle_key: bool,
    pub sort_candidates_by_frequency: bool,
    pub language_mode: i32,
    pub character_form: i32,
    pub conversion_engine: i32,
    pub logging: LoggingConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_options(&EditorOptions::default())
    }
}

impl SessionConfig {
    /// Capture live options; paths and logging policy take their defaults.
    pub fn from_options(options: &EditorOptions) -> Self {
        Self {
            data_path: None,
            user_path: None,
            candidates_per_page: options.candidates_per_page as i32,
            max_symbol_len: options.auto_commit_threshold as i32,
            selection_keys: options.selection_keys.clone(),
            keyboard_type: options.layout.name().to_string(),
            user_phrase_add_direction: options.add_direction.id(),
            disable_auto_learn_phrase: options.disable_auto_learn_phrase,
            auto_shift_cursor: options.auto_shift_cursor,
            easy_symbol_input: options.easy_symbol_input,
            esc_clear_all_buffer: options.esc_clear_all_buffer,
            phrase_choice_rearward: options.phrase_choice_rearward,
            space_is_select_key: options.space_is_select_key,
            enable_fullwidth_toggle_key: options.enable_fullwidth_toggle_key,
            sort_candidates_by_frequency: options.sort_candidates_by_frequency,
            language_mode: options.language_mode.id(),
            character_form: options.character_form.id(),
            conversion_engine: options.conversion_engine.id(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn with_data_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_path = Some(path.into());
        self
    }

    pub fn with_user_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.user_path = Some(path.into());
        self
    }

    /// Check every option jointly and build the editor options.
    ///
    /// Page size and selection keys are checked together, so a nine key
    /// set with nine candidates per page is accepted even though neither
    /// could be written alone against the defaults.
    pub fn validate(&self) -> Result<EditorOptions, ConfigError> {
        let max_symbol_len = check_max_symbol_len(self.max_symbol_len)?;
        let candidates_per_page = check_candidates_per_page(self.candidates_per_page, max_symbol_len)?;
        check_stored_selection_keys(&self.selection_keys, candidates_per_page)?;
        let layout = resolve_layout(&self.keyboard_type).map_err(|(_, e)| e)?;
        Ok(EditorOptions {
            layout,
            candidates_per_page,
            auto_commit_threshold: max_symbol_len,
            selection_keys: self.selection_keys.clone(),
            add_direction: check_enum(
                OptionName::UserPhraseAddDirection,
                self.user_phrase_add_direction,
                AddDirection::from_id,
                "0 or 1",
            )?,
            disable_auto_learn_phrase: self.disable_auto_learn_phrase,
            auto_shift_cursor: self.auto_shift_cursor,
            easy_symbol_input: self.easy_symbol_input,
            esc_clear_all_buffer: self.esc_clear_all_buffer,
            phrase_choice_rearward: self.phrase_choice_rearward,
            space_is_select_key: self.space_is_select_key,
            enable_fullwidth_toggle_key: self.enable_fullwidth_toggle_key,
            sort_candidates_by_frequency: self.sort_candidates_by_frequency,
            language_mode: check_enum(
                OptionName::LanguageMode,
                self.language_mode,
                LanguageMode::from_id,
                "0 or 1",
            )?,
            character_form: check_enum(
                OptionName::CharacterForm,
                self.character_form,
                CharacterForm::from_id,
                "0 or 1",
            )?,
            conversion_engine: check_enum(
                OptionName::ConversionEngine,
                self.conversion_engine,
                ConversionEngine::from_id,
                "0..=2",
            )?,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn load_toml<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&content)?)
    }

    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let options = SessionConfig::default().validate().unwrap();
        assert_eq!(options, EditorOptions::default());
        assert_eq!(options.candidates_per_page, 10);
        assert_eq!(options.selection_keys, "1234567890");
    }

    #[test]
    fn nine_keys_with_nine_per_page_is_valid_at_open() {
        let config = SessionConfig {
            candidates_per_page: 9,
            selection_keys: "123456789".into(),
            ..SessionConfig::default()
        };
        assert_eq!(config.validate().unwrap().candidates_per_page, 9);
    }

    #[test]
    fn rejected_writes_preserve_previous_value() {
        let mut options = EditorOptions::default();
        for bad in [0, 11, -1] {
            assert!(write_option(&mut options, OptionName::CandidatesPerPage, OptionValue::Int(bad)).is_err());
        }
        for bad in ["", "12345678901", "1234567899", "123456789 "] {
            assert!(write_option(
                &mut options,
                OptionName::SelectionKeys,
                OptionValue::Str(bad.into())
            )
            .is_err());
        }
        assert!(write_option(&mut options, OptionName::AutoCommitThreshold, OptionValue::Int(40)).is_err());
        assert!(write_option(&mut options, OptionName::ConversionEngine, OptionValue::Int(3)).is_err());
        assert_eq!(options, EditorOptions::default());
    }

    #[test]
    fn page_size_respects_symbol_length() {
        let mut options = EditorOptions::default();
        // a limit below the current page size is refused
        assert!(write_option(&mut options, OptionName::AutoCommitThreshold, OptionValue::Int(5)).is_err());
        assert_eq!(options.auto_commit_threshold, 39);

        write_option(&mut options, OptionName::CandidatesPerPage, OptionValue::Int(5)).unwrap();
        write_option(&mut options, OptionName::AutoCommitThreshold, OptionValue::Int(5)).unwrap();
        assert!(write_option(&mut options, OptionName::AutoCommitThreshold, OptionValue::Int(4)).is_err());
        assert!(write_option(&mut options, OptionName::CandidatesPerPage, OptionValue::Int(6)).is_err());
        assert_eq!(read_option(&options, OptionName::CandidatesPerPage), OptionValue::Int(5));
        assert_eq!(read_option(&options, OptionName::AutoCommitThreshold), OptionValue::Int(5));
    }

    #[test]
    fn written_options_always_validate() {
        let mut options = EditorOptions::default();
        write_option(&mut options, OptionName::CandidatesPerPage, OptionValue::Int(9)).unwrap();
        assert_eq!(options.selection_keys, "1234567890");
        let config = SessionConfig::from_options(&options);
        assert_eq!(config.validate().unwrap(), options);

        write_option(&mut options, OptionName::SelectionKeys, OptionValue::Str("asdfghjkl".into())).unwrap();
        // nine keys cannot serve ten candidates
        assert!(write_option(&mut options, OptionName::CandidatesPerPage, OptionValue::Int(10)).is_err());
        assert_eq!(options.candidates_per_page, 9);
        assert!(SessionConfig::from_options(&options).validate().is_ok());
    }

    #[test]
    fn stored_keys_may_outnumber_the_page() {
        assert!(check_stored_selection_keys("1234567890", 9).is_ok());
        assert!(check_stored_selection_keys("12345678", 9).is_err());
        assert!(check_selection_keys("1234567890", 9).is_err());
        assert!(check_stored_selection_keys("12345678901", 9).is_err());
    }

    #[test]
    fn toggles_accept_any_nonzero() {
        let mut options = EditorOptions::default();
        write_option(&mut options, OptionName::SpaceIsSelectKey, OptionValue::Int(7)).unwrap();
        assert_eq!(read_option(&options, OptionName::SpaceIsSelectKey), OptionValue::Int(1));
        write_option(&mut options, OptionName::SpaceIsSelectKey, OptionValue::Int(0)).unwrap();
        assert!(!options.space_is_select_key);
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let mut options = EditorOptions::default();
        let err = write_option(&mut options, OptionName::SelectionKeys, OptionValue::Int(1)).unwrap_err();
        assert!(matches!(err, ConfigError::WrongType { expected: "string", .. }));
    }

    #[test]
    fn unsupported_layout_falls_back() {
        let mut options = EditorOptions::default();
        write_option(&mut options, OptionName::KeyboardType, OptionValue::Str("KB_HSU".into())).unwrap();
        assert_eq!(options.layout, KeyboardLayout::Hsu);
        assert!(write_option(&mut options, OptionName::KeyboardType, OptionValue::Str("KB_ET26".into())).is_err());
        assert_eq!(options.layout, KeyboardLayout::Default);
        write_option(&mut options, OptionName::KeyboardType, OptionValue::Str("KB_HSU".into())).unwrap();
        assert!(write_option(&mut options, OptionName::KeyboardType, OptionValue::Str("KB_NOPE".into())).is_err());
        assert_eq!(options.layout, KeyboardLayout::Hsu);
    }

    #[test]
    fn option_names_round_trip() {
        for name in OptionName::ALL {
            assert_eq!(name.name().parse::<OptionName>().unwrap(), name);
        }
        assert!("chewing.nope".parse::<OptionName>().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let text = r#"
            candidates_per_page = 9
            selection_keys = "asdfghjkl"
            keyboard_type = "KB_HSU"

            [logging]
            min_level = "warning"
        "#;
        let config = SessionConfig::from_toml_str(text).unwrap();
        assert_eq!(config.max_symbol_len, 39);
        assert_eq!(config.logging.min_level, Some(crate::logger::LogLevel::Warning));
        let options = config.validate().unwrap();
        assert_eq!(options.layout, KeyboardLayout::Hsu);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chewing.toml");
        config.save_toml(&path).unwrap();
        assert_eq!(SessionConfig::load_toml(&path).unwrap(), config);
    }
}
