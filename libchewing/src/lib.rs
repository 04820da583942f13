//! # libchewing
//!
//! Session, configuration and callback binding for the zhuyin engine in
//! `libchewing-core`, plus the flat C ABI built on top of it.
//!
//! Public API:
//! - `Session` - One engine instance with its options, callbacks and cursors
//! - `SessionConfig` - Open-time configuration, loadable from TOML
//! - `Callbacks` - Log, candidate, buffer, preedit and commit handlers
//! - `LoggingConfig`, `LogLevel` - Log filtering for the log handler
//! - `simplified` - The process-wide single-listener API
//! - `ffi` - `chewing_*` and `cs_*` C functions

pub mod error;
pub use error::{ConfigError, OpenError};

pub mod transit;
pub use transit::{BorrowedStr, OwnedString};

pub mod logger;
pub use logger::{LogLevel, LoggingConfig};

pub mod config;
pub use config::{OptionKind, OptionName, OptionValue, SessionConfig};

pub mod paths;

pub mod callbacks;
pub use callbacks::{CandidateInfo, Callbacks};

pub mod cursor;
pub use cursor::CursorState;

pub mod session;
pub use session::Session;

pub mod simplified;

pub mod ffi;

pub use libchewing_core::{
    AddDirection, CharacterForm, ConversionEngine, Interval, Key, KeyBehavior, KeyboardLayout,
    LanguageMode, UserPhrase,
};
