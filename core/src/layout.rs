// core/src/layout.rs
//
// Zhuyin keyboard layouts. A layout decides which key produces which bopomofo
// symbol; alternative physical keyboards (Dvorak, Colemak, ...) are first
// folded back onto QWERTY positions and then read with the standard table.

use std::fmt;
use std::str::FromStr;

use ahash::AHashMap;
use once_cell::sync::Lazy;

use crate::zhuyin::{Bopomofo, BopomofoKind, Syllable};

/// How a key press was consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBehavior {
    /// Not handled; the application should process the key itself.
    Ignore,
    /// Consumed without producing output.
    Absorb,
    /// Consumed and completed a unit (a syllable, or committed text).
    Commit,
    /// Consumed but rejected.
    KeyError,
}

/// The syllable-building half of a layout.
pub trait SyllableEditor: fmt::Debug + Send {
    /// Feed one key, given as the character at its QWERTY position.
    fn key_press(&mut self, key: char) -> KeyBehavior;
    fn is_empty(&self) -> bool;
    fn remove_last(&mut self);
    fn clear(&mut self);
    fn read(&self) -> Syllable;
}

/// Every layout id known to the classic ABI, in id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyboardLayout {
    Default,
    Hsu,
    Ibm,
    GinYieh,
    Et,
    Et26,
    Dvorak,
    DvorakHsu,
    DachenCp26,
    HanyuPinyin,
    ThlPinyin,
    Mps2Pinyin,
    Carpalx,
    ColemakDhAnsi,
    ColemakDhOrth,
    Workman,
    Colemak,
}

impl KeyboardLayout {
    pub const ALL: [KeyboardLayout; 17] = [
        KeyboardLayout::Default,
        KeyboardLayout::Hsu,
        KeyboardLayout::Ibm,
        KeyboardLayout::GinYieh,
        KeyboardLayout::Et,
        KeyboardLayout::Et26,
        KeyboardLayout::Dvorak,
        KeyboardLayout::DvorakHsu,
        KeyboardLayout::DachenCp26,
        KeyboardLayout::HanyuPinyin,
        KeyboardLayout::ThlPinyin,
        KeyboardLayout::Mps2Pinyin,
        KeyboardLayout::Carpalx,
        KeyboardLayout::ColemakDhAnsi,
        KeyboardLayout::ColemakDhOrth,
        KeyboardLayout::Workman,
        KeyboardLayout::Colemak,
    ];

    pub fn id(self) -> i32 {
        Self::ALL.iter().position(|l| *l == self).unwrap_or(0) as i32
    }

    pub fn from_id(id: i32) -> Option<KeyboardLayout> {
        usize::try_from(id).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn name(self) -> &'static str {
        match self {
            KeyboardLayout::Default => "KB_DEFAULT",
            KeyboardLayout::Hsu => "KB_HSU",
            KeyboardLayout::Ibm => "KB_IBM",
            KeyboardLayout::GinYieh => "KB_GIN_YIEH",
            KeyboardLayout::Et => "KB_ET",
            KeyboardLayout::Et26 => "KB_ET26",
            KeyboardLayout::Dvorak => "KB_DVORAK",
            KeyboardLayout::DvorakHsu => "KB_DVORAK_HSU",
            KeyboardLayout::DachenCp26 => "KB_DACHEN_CP26",
            KeyboardLayout::HanyuPinyin => "KB_HANYU_PINYIN",
            KeyboardLayout::ThlPinyin => "KB_THL_PINYIN",
            KeyboardLayout::Mps2Pinyin => "KB_MPS2_PINYIN",
            KeyboardLayout::Carpalx => "KB_CARPALX",
            KeyboardLayout::ColemakDhAnsi => "KB_COLEMAK_DH_ANSI",
            KeyboardLayout::ColemakDhOrth => "KB_COLEMAK_DH_ORTH",
            KeyboardLayout::Workman => "KB_WORKMAN",
            KeyboardLayout::Colemak => "KB_COLEMAK",
        }
    }

    /// Whether this engine ships an editor for the layout.
    ///
    /// The 26-key compressed layouts and the romanized ones are listed so ids
    /// stay stable, but selecting them is refused.
    pub fn is_supported(self) -> bool {
        !matches!(
            self,
            KeyboardLayout::Et26
                | KeyboardLayout::DachenCp26
                | KeyboardLayout::HanyuPinyin
                | KeyboardLayout::ThlPinyin
                | KeyboardLayout::Mps2Pinyin
        )
    }

    pub fn syllable_editor(self) -> Box<dyn SyllableEditor> {
        match self {
            KeyboardLayout::Hsu | KeyboardLayout::DvorakHsu => Box::new(Hsu::default()),
            KeyboardLayout::Ibm => Box::new(TableEditor::new(&IBM)),
            KeyboardLayout::GinYieh => Box::new(TableEditor::new(&GIN_YIEH)),
            KeyboardLayout::Et => Box::new(TableEditor::new(&ET)),
            _ => Box::new(TableEditor::new(&STANDARD)),
        }
    }

    /// Fold a typed character back onto the QWERTY key at the same position.
    pub fn to_qwerty(self, ch: char) -> char {
        let row = match self {
            KeyboardLayout::Dvorak | KeyboardLayout::DvorakHsu => DVORAK_ROW,
            KeyboardLayout::Carpalx => QGMLWY_ROW,
            KeyboardLayout::Colemak => COLEMAK_ROW,
            KeyboardLayout::ColemakDhAnsi => COLEMAK_DH_ANSI_ROW,
            KeyboardLayout::ColemakDhOrth => COLEMAK_DH_ORTH_ROW,
            KeyboardLayout::Workman => WORKMAN_ROW,
            _ => return ch,
        };
        row.chars()
            .position(|c| c == ch)
            .and_then(|i| QWERTY_ROW.chars().nth(i))
            .unwrap_or(ch)
    }
}

impl Default for KeyboardLayout {
    fn default() -> Self {
        KeyboardLayout::Default
    }
}

impl fmt::Display for KeyboardLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLayoutError(pub String);

impl fmt::Display for ParseLayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown keyboard layout {:?}", self.0)
    }
}

impl std::error::Error for ParseLayoutError {}

impl FromStr for KeyboardLayout {
    type Err = ParseLayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|l| l.name() == s)
            .ok_or_else(|| ParseLayoutError(s.to_string()))
    }
}

// Physical key rows, left to right and top to bottom, space last.
const QWERTY_ROW: &str = "1234567890-=\\`qwertyuiop[]asdfghjkl;'zxcvbnm,./ ";
const DVORAK_ROW: &str = "1234567890[]\\`',.pyfgcrl/=aoeuidhtns-;qjkxbmwvz ";
const COLEMAK_ROW: &str = "1234567890-=\\`qwfpgjluy;[]arstdhneio'zxcvbkm,./ ";
const COLEMAK_DH_ANSI_ROW: &str = "1234567890-=\\`qwfpbjluy;[]arstgmneio'xcdvzkh,./ ";
const COLEMAK_DH_ORTH_ROW: &str = "1234567890-=\\`qwfpbjluy;[]arstgmneio'zxcdvkh,./ ";
const WORKMAN_ROW: &str = "1234567890-=\\`qdrwbjfup;[]ashtgyneoi'zxmcvkl,./ ";
const QGMLWY_ROW: &str = "1234567890-=\\`qgmlwyfub;[]dstnriaeoh'zxcvjkp,./ ";

// (key, symbol) pairs keyed by QWERTY character.
const STANDARD_KEYS: &str = "1ㄅ2ㄉ3ˇ4ˋ5ㄓ6ˊ7˙8ㄚ9ㄞ0ㄢ-ㄦqㄆwㄊeㄍrㄐtㄔyㄗuㄧiㄛoㄟpㄣ\
aㄇsㄋdㄎfㄑgㄕhㄘjㄨkㄜlㄠ;ㄤzㄈxㄌcㄏvㄒbㄖnㄙmㄩ,ㄝ.ㄡ/ㄥ ˉ";
const IBM_KEYS: &str = "1ㄅ2ㄆ3ㄇ4ㄈ5ㄉ6ㄊ7ㄋ8ㄌ9ㄍ0ㄎ-ㄏqㄐwㄑeㄒrㄓtㄔyㄕuㄖiㄗoㄘpㄙ\
aㄧsㄨdㄩfㄚgㄛhㄜjㄝkㄞlㄟ;ㄠzㄡxㄢcㄣvㄤbㄥnㄦmˊ,ˇ.ˋ/˙ ˉ";
const GIN_YIEH_KEYS: &str = "1˙2ㄅ3ㄉ6ㄓ8ㄚ9ㄞ0ㄢ-ㄧ=ㄦqˊwㄆeㄊrㄍtㄐyㄔuㄗiㄛoㄟpㄣ[ㄨ\
aˇsㄇdㄋfㄎgㄑhㄕjㄘkㄜlㄠ;ㄤ'ㄩzˋxㄈcㄌvㄏbㄒnㄖmㄙ,ㄝ.ㄡ/ㄥ ˉ";
const ET_KEYS: &str = "1˙2ˊ3ˇ4ˋ7ㄑ8ㄢ9ㄣ0ㄤ-ㄥ=ㄦqㄟwㄝeㄧrㄜtㄊyㄡuㄩiㄞoㄛpㄆ\
aㄚsㄙdㄉfㄈgㄐhㄏjㄖkㄎlㄌ;ㄗ'ㄘzㄠxㄨcㄒvㄍbㄅnㄋmㄇ,ㄓ.ㄔ/ㄕ ˉ";

fn key_table(pairs: &str) -> AHashMap<char, Bopomofo> {
    let chars: Vec<char> = pairs.chars().collect();
    chars
        .chunks(2)
        .filter_map(|pair| match pair {
            [key, sym] => Bopomofo::from_char(*sym).map(|b| (*key, b)),
            _ => None,
        })
        .collect()
}

static STANDARD: Lazy<AHashMap<char, Bopomofo>> = Lazy::new(|| key_table(STANDARD_KEYS));
static IBM: Lazy<AHashMap<char, Bopomofo>> = Lazy::new(|| key_table(IBM_KEYS));
static GIN_YIEH: Lazy<AHashMap<char, Bopomofo>> = Lazy::new(|| key_table(GIN_YIEH_KEYS));
static ET: Lazy<AHashMap<char, Bopomofo>> = Lazy::new(|| key_table(ET_KEYS));

/// One-key-one-symbol layouts.
#[derive(Debug, Clone)]
pub struct TableEditor {
    table: &'static AHashMap<char, Bopomofo>,
    syllable: Syllable,
}

impl TableEditor {
    fn new(table: &'static Lazy<AHashMap<char, Bopomofo>>) -> Self {
        Self {
            table: Lazy::force(table),
            syllable: Syllable::new(),
        }
    }
}

impl SyllableEditor for TableEditor {
    fn key_press(&mut self, key: char) -> KeyBehavior {
        let Some(&bopomofo) = self.table.get(&key) else {
            return KeyBehavior::Ignore;
        };
        if bopomofo.kind() == BopomofoKind::Tone {
            if self.syllable.is_empty() {
                return KeyBehavior::KeyError;
            }
            self.syllable.update(bopomofo);
            return KeyBehavior::Commit;
        }
        self.syllable.remove_tone();
        self.syllable.update(bopomofo);
        KeyBehavior::Absorb
    }

    fn is_empty(&self) -> bool {
        self.syllable.is_empty()
    }

    fn remove_last(&mut self) {
        self.syllable.pop();
    }

    fn clear(&mut self) {
        self.syllable.clear();
    }

    fn read(&self) -> Syllable {
        self.syllable
    }
}

/// Hsu's layout: 26 letters, where a key's symbol depends on what was typed
/// before it, and s/d/f/j/space double as tone keys once a syllable started.
#[derive(Debug, Clone, Default)]
pub struct Hsu {
    syllable: Syllable,
}

impl Hsu {
    fn end_key_tone(&self, key: char) -> Option<Bopomofo> {
        if self.syllable.is_empty() {
            return None;
        }
        match key {
            's' => Some(Bopomofo::Tone5),
            'd' => Some(Bopomofo::Tone2),
            'f' => Some(Bopomofo::Tone3),
            'j' => Some(Bopomofo::Tone4),
            ' ' => Some(Bopomofo::Tone1),
            _ => None,
        }
    }

    fn started(&self) -> bool {
        self.syllable.has_initial() || self.syllable.has_medial()
    }

    fn symbol_for(&self, key: char) -> Option<Bopomofo> {
        let started = self.started();
        let b = match key {
            'a' if started => Bopomofo::Ei,
            'a' => Bopomofo::C,
            'b' => Bopomofo::B,
            'c' => Bopomofo::Sh,
            'd' => Bopomofo::D,
            'e' if self.syllable.has_medial() => Bopomofo::Eh,
            'e' => Bopomofo::I,
            'f' => Bopomofo::F,
            'g' if started => Bopomofo::E,
            'g' => Bopomofo::G,
            'h' if started => Bopomofo::O,
            'h' => Bopomofo::H,
            'i' => Bopomofo::Ai,
            'j' => Bopomofo::Zh,
            'k' if started => Bopomofo::Ang,
            'k' => Bopomofo::K,
            'l' if started => Bopomofo::Eng,
            'l' => Bopomofo::L,
            'm' if started => Bopomofo::An,
            'm' => Bopomofo::M,
            'n' if started => Bopomofo::En,
            'n' => Bopomofo::N,
            'o' => Bopomofo::Ou,
            'p' => Bopomofo::P,
            'r' => Bopomofo::R,
            's' => Bopomofo::S,
            't' => Bopomofo::T,
            'u' => Bopomofo::Iu,
            'v' => Bopomofo::Ch,
            'w' => Bopomofo::Au,
            'x' => Bopomofo::U,
            'y' => Bopomofo::A,
            'z' => Bopomofo::Z,
            _ => return None,
        };
        Some(b)
    }

    // ㄍ before ㄧ/ㄩ reads as ㄐ.
    fn fix_palatal(&mut self) {
        if self.syllable.initial() == Some(Bopomofo::G)
            && matches!(self.syllable.medial(), Some(Bopomofo::I | Bopomofo::Iu))
        {
            self.syllable.update(Bopomofo::J);
        }
    }
}

impl SyllableEditor for Hsu {
    fn key_press(&mut self, key: char) -> KeyBehavior {
        if let Some(tone) = self.end_key_tone(key) {
            if !self.syllable.has_medial() && !self.syllable.has_rime() {
                // a lone initial followed by a tone key is read as its rime twin
                match self.syllable.initial() {
                    Some(Bopomofo::J) => self.syllable.update(Bopomofo::Zh),
                    Some(Bopomofo::Q) => self.syllable.update(Bopomofo::Ch),
                    Some(Bopomofo::X) => self.syllable.update(Bopomofo::Sh),
                    Some(initial) => {
                        let rime = match initial {
                            Bopomofo::H => Some(Bopomofo::O),
                            Bopomofo::G => Some(Bopomofo::E),
                            Bopomofo::M => Some(Bopomofo::An),
                            Bopomofo::N => Some(Bopomofo::En),
                            Bopomofo::K => Some(Bopomofo::Ang),
                            Bopomofo::L => Some(Bopomofo::Er),
                            _ => None,
                        };
                        if let Some(rime) = rime {
                            self.syllable.remove_initial();
                            self.syllable.update(rime);
                        }
                    }
                    None => {}
                }
            }
            self.fix_palatal();
            if tone == Bopomofo::Tone1 {
                self.syllable.remove_tone();
            } else {
                self.syllable.update(tone);
            }
            return KeyBehavior::Commit;
        }

        let Some(bopomofo) = self.symbol_for(key) else {
            return KeyBehavior::Ignore;
        };
        self.fix_palatal();
        let kind = bopomofo.kind();
        // ㄐㄑㄒ only precede ㄧ/ㄩ; otherwise they are ㄓㄔㄕ
        if bopomofo == Bopomofo::U || (kind == BopomofoKind::Rime && !self.syllable.has_medial()) {
            match self.syllable.initial() {
                Some(Bopomofo::J) => self.syllable.update(Bopomofo::Zh),
                Some(Bopomofo::Q) => self.syllable.update(Bopomofo::Ch),
                Some(Bopomofo::X) => self.syllable.update(Bopomofo::Sh),
                _ => {}
            }
        }
        if matches!(bopomofo, Bopomofo::I | Bopomofo::Iu) {
            match self.syllable.initial() {
                Some(Bopomofo::Zh) => self.syllable.update(Bopomofo::J),
                Some(Bopomofo::Ch) => self.syllable.update(Bopomofo::Q),
                Some(Bopomofo::Sh) => self.syllable.update(Bopomofo::X),
                _ => {}
            }
        }
        self.syllable.update(bopomofo);
        KeyBehavior::Absorb
    }

    fn is_empty(&self) -> bool {
        self.syllable.is_empty()
    }

    fn remove_last(&mut self) {
        self.syllable.pop();
    }

    fn clear(&mut self) {
        self.syllable.clear();
    }

    fn read(&self) -> Syllable {
        self.syllable
    }
}
