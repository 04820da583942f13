//! libchewing-core
//!
//! The zhuyin conversion engine driven by the `libchewing` binding crate.
//!
//! Dictionaries are stored as an FST key index plus bincode payloads; user
//! phrases live in redb.
//!
//! Public API:
//! - `Bopomofo`, `Syllable` - Phonetic symbols and syllables
//! - `KeyboardLayout` - Zhuyin keyboard layouts and their syllable editors
//! - `Lexicon`, `LexiconBuilder` - Syllable sequence to phrase dictionary
//! - `UserDict` - Per-session learned and user-added phrases
//! - `CandidateList` - Paged candidates
//! - `Converter` - Phrase segmentation of the composition buffer
//! - `Editor` - The key-driven composition state machine

pub mod zhuyin;
pub use zhuyin::{Bopomofo, BopomofoKind, ParseSyllableError, Syllable};

pub mod layout;
pub use layout::{KeyBehavior, KeyboardLayout, ParseLayoutError, SyllableEditor};

pub mod lexicon;
pub use lexicon::{Lexicon, LexiconBuilder, PhraseEntry};

pub mod userdict;
pub use userdict::{UserDict, UserPhrase};

pub mod candidate;
pub use candidate::CandidateList;

pub mod conversion;
pub use conversion::{ConversionEngine, Converter, Dictionary, Interval, Selection, Symbol};

pub mod editor;
pub use editor::{AddDirection, CharacterForm, Editor, EditorOptions, Key, LanguageMode};

pub mod utils {
    /// NFC with surrounding whitespace trimmed, as stored for user phrases.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }

    /// Full-width form of a printable ASCII character; others pass through.
    pub fn fullwidth_char(ch: char) -> char {
        match ch {
            ' ' => '\u{3000}',
            '!'..='~' => char::from_u32(ch as u32 - 0x21 + 0xFF01).unwrap_or(ch),
            _ => ch,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn fullwidth_covers_printable_ascii() {
            assert_eq!(fullwidth_char('A'), 'Ａ');
            assert_eq!(fullwidth_char(' '), '\u{3000}');
            assert_eq!(fullwidth_char('綠'), '綠');
        }

        #[test]
        fn normalize_trims_and_composes() {
            assert_eq!(normalize("  e\u{301} "), "\u{e9}");
        }
    }
}
