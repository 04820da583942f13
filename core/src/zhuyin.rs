//! Bopomofo symbols and syllables.
//!
//! A `Syllable` has four optional slots filled in a fixed order: initial,
//! medial, rime and tone. Tone 1 is never stored; a completed syllable with an
//! empty tone slot reads as first tone.

use std::fmt;
use std::str::FromStr;

/// Which syllable slot a symbol occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BopomofoKind {
    Initial,
    Medial,
    Rime,
    Tone,
}

/// One zhuyin symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bopomofo {
    B,
    P,
    M,
    F,
    D,
    T,
    N,
    L,
    G,
    K,
    H,
    J,
    Q,
    X,
    Zh,
    Ch,
    Sh,
    R,
    Z,
    C,
    S,
    I,
    U,
    Iu,
    A,
    O,
    E,
    Eh,
    Ai,
    Ei,
    Au,
    Ou,
    An,
    En,
    Ang,
    Eng,
    Er,
    Tone1,
    Tone2,
    Tone3,
    Tone4,
    Tone5,
}

const INITIALS: [Bopomofo; 21] = [
    Bopomofo::B,
    Bopomofo::P,
    Bopomofo::M,
    Bopomofo::F,
    Bopomofo::D,
    Bopomofo::T,
    Bopomofo::N,
    Bopomofo::L,
    Bopomofo::G,
    Bopomofo::K,
    Bopomofo::H,
    Bopomofo::J,
    Bopomofo::Q,
    Bopomofo::X,
    Bopomofo::Zh,
    Bopomofo::Ch,
    Bopomofo::Sh,
    Bopomofo::R,
    Bopomofo::Z,
    Bopomofo::C,
    Bopomofo::S,
];
const MEDIALS: [Bopomofo; 3] = [Bopomofo::I, Bopomofo::U, Bopomofo::Iu];
const RIMES: [Bopomofo; 13] = [
    Bopomofo::A,
    Bopomofo::O,
    Bopomofo::E,
    Bopomofo::Eh,
    Bopomofo::Ai,
    Bopomofo::Ei,
    Bopomofo::Au,
    Bopomofo::Ou,
    Bopomofo::An,
    Bopomofo::En,
    Bopomofo::Ang,
    Bopomofo::Eng,
    Bopomofo::Er,
];
const TONES: [Bopomofo; 5] = [
    Bopomofo::Tone1,
    Bopomofo::Tone2,
    Bopomofo::Tone3,
    Bopomofo::Tone4,
    Bopomofo::Tone5,
];

impl Bopomofo {
    pub fn kind(self) -> BopomofoKind {
        use Bopomofo::*;
        match self {
            B | P | M | F | D | T | N | L | G | K | H | J | Q | X | Zh | Ch | Sh | R | Z | C
            | S => BopomofoKind::Initial,
            I | U | Iu => BopomofoKind::Medial,
            A | O | E | Eh | Ai | Ei | Au | Ou | An | En | Ang | Eng | Er => BopomofoKind::Rime,
            Tone1 | Tone2 | Tone3 | Tone4 | Tone5 => BopomofoKind::Tone,
        }
    }

    pub fn as_char(self) -> char {
        use Bopomofo::*;
        match self {
            B => 'ㄅ',
            P => 'ㄆ',
            M => 'ㄇ',
            F => 'ㄈ',
            D => 'ㄉ',
            T => 'ㄊ',
            N => 'ㄋ',
            L => 'ㄌ',
            G => 'ㄍ',
            K => 'ㄎ',
            H => 'ㄏ',
            J => 'ㄐ',
            Q => 'ㄑ',
            X => 'ㄒ',
            Zh => 'ㄓ',
            Ch => 'ㄔ',
            Sh => 'ㄕ',
            R => 'ㄖ',
            Z => 'ㄗ',
            C => 'ㄘ',
            S => 'ㄙ',
            I => 'ㄧ',
            U => 'ㄨ',
            Iu => 'ㄩ',
            A => 'ㄚ',
            O => 'ㄛ',
            E => 'ㄜ',
            Eh => 'ㄝ',
            Ai => 'ㄞ',
            Ei => 'ㄟ',
            Au => 'ㄠ',
            Ou => 'ㄡ',
            An => 'ㄢ',
            En => 'ㄣ',
            Ang => 'ㄤ',
            Eng => 'ㄥ',
            Er => 'ㄦ',
            Tone1 => 'ˉ',
            Tone2 => 'ˊ',
            Tone3 => 'ˇ',
            Tone4 => 'ˋ',
            Tone5 => '˙',
        }
    }

    pub fn from_char(ch: char) -> Option<Bopomofo> {
        INITIALS
            .iter()
            .chain(MEDIALS.iter())
            .chain(RIMES.iter())
            .chain(TONES.iter())
            .copied()
            .find(|b| b.as_char() == ch)
    }

    /// 1-based position inside the symbol's own slot, used by phone codes.
    fn ordinal(self) -> u16 {
        let table: &[Bopomofo] = match self.kind() {
            BopomofoKind::Initial => &INITIALS,
            BopomofoKind::Medial => &MEDIALS,
            BopomofoKind::Rime => &RIMES,
            BopomofoKind::Tone => &TONES,
        };
        table
            .iter()
            .position(|b| *b == self)
            .map(|p| p as u16 + 1)
            .unwrap_or(0)
    }
}

impl fmt::Display for Bopomofo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A (possibly partial) bopomofo syllable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Syllable {
    initial: Option<Bopomofo>,
    medial: Option<Bopomofo>,
    rime: Option<Bopomofo>,
    tone: Option<Bopomofo>,
}

impl Syllable {
    pub const fn new() -> Self {
        Syllable {
            initial: None,
            medial: None,
            rime: None,
            tone: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.initial.is_none() && self.medial.is_none() && self.rime.is_none() && self.tone.is_none()
    }

    pub fn has_initial(&self) -> bool {
        self.initial.is_some()
    }

    pub fn has_medial(&self) -> bool {
        self.medial.is_some()
    }

    pub fn has_rime(&self) -> bool {
        self.rime.is_some()
    }

    pub fn has_tone(&self) -> bool {
        self.tone.is_some()
    }

    pub fn initial(&self) -> Option<Bopomofo> {
        self.initial
    }

    pub fn medial(&self) -> Option<Bopomofo> {
        self.medial
    }

    pub fn rime(&self) -> Option<Bopomofo> {
        self.rime
    }

    pub fn tone(&self) -> Option<Bopomofo> {
        self.tone
    }

    /// Put `bopomofo` into its slot, replacing whatever was there.
    pub fn update(&mut self, bopomofo: Bopomofo) {
        match bopomofo.kind() {
            BopomofoKind::Initial => self.initial = Some(bopomofo),
            BopomofoKind::Medial => self.medial = Some(bopomofo),
            BopomofoKind::Rime => self.rime = Some(bopomofo),
            BopomofoKind::Tone => {
                self.tone = if bopomofo == Bopomofo::Tone1 {
                    None
                } else {
                    Some(bopomofo)
                }
            }
        }
    }

    /// Remove the most recently filled slot.
    pub fn pop(&mut self) -> Option<Bopomofo> {
        if self.tone.is_some() {
            self.tone.take()
        } else if self.rime.is_some() {
            self.rime.take()
        } else if self.medial.is_some() {
            self.medial.take()
        } else {
            self.initial.take()
        }
    }

    pub fn remove_initial(&mut self) -> Option<Bopomofo> {
        self.initial.take()
    }

    pub fn remove_tone(&mut self) -> Option<Bopomofo> {
        self.tone.take()
    }

    pub fn clear(&mut self) {
        *self = Syllable::new();
    }

    pub fn without_tone(&self) -> Syllable {
        Syllable { tone: None, ..*self }
    }

    /// Packed phone code: initial(5 bits) medial(2) rime(4) tone(3).
    pub fn to_u16(&self) -> u16 {
        let initial = self.initial.map(Bopomofo::ordinal).unwrap_or(0);
        let medial = self.medial.map(Bopomofo::ordinal).unwrap_or(0);
        let rime = self.rime.map(Bopomofo::ordinal).unwrap_or(0);
        let tone = self.tone.map(Bopomofo::ordinal).unwrap_or(1);
        (initial << 9) | (medial << 7) | (rime << 3) | tone
    }

    fn symbols(&self) -> impl Iterator<Item = Bopomofo> {
        [self.initial, self.medial, self.rime, self.tone]
            .into_iter()
            .flatten()
    }
}

impl fmt::Display for Syllable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.symbols() {
            write!(f, "{}", b)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSyllableError(pub String);

impl fmt::Display for ParseSyllableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid syllable: {:?}", self.0)
    }
}

impl std::error::Error for ParseSyllableError {}

impl FromStr for Syllable {
    type Err = ParseSyllableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSyllableError(s.to_string());
        let mut syl = Syllable::new();
        // slots must appear in order and at most once
        let mut last_kind: Option<usize> = None;
        for ch in s.chars() {
            let b = Bopomofo::from_char(ch).ok_or_else(err)?;
            let kind = b.kind() as usize;
            if last_kind.is_some_and(|k| k >= kind) {
                return Err(err());
            }
            last_kind = Some(kind);
            syl.update(b);
        }
        if !syl.has_initial() && !syl.has_medial() && !syl.has_rime() {
            return Err(err());
        }
        Ok(syl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_fills_slots_in_order() {
        let mut syl = Syllable::new();
        syl.update(Bopomofo::L);
        syl.update(Bopomofo::Iu);
        syl.update(Bopomofo::Tone4);
        assert_eq!(syl.to_string(), "ㄌㄩˋ");
        assert_eq!(syl.pop(), Some(Bopomofo::Tone4));
        assert_eq!(syl.to_string(), "ㄌㄩ");
    }

    #[test]
    fn first_tone_is_not_stored() {
        let mut syl: Syllable = "ㄇㄚ".parse().unwrap();
        syl.update(Bopomofo::Tone1);
        assert!(!syl.has_tone());
        assert_eq!(syl.to_string(), "ㄇㄚ");
    }

    #[test]
    fn parse_rejects_bad_order_and_tone_only() {
        assert!("ㄚㄇ".parse::<Syllable>().is_err());
        assert!("ˋ".parse::<Syllable>().is_err());
        assert!("".parse::<Syllable>().is_err());
        assert!("abc".parse::<Syllable>().is_err());
        let syl: Syllable = "ㄔㄚˊ".parse().unwrap();
        assert_eq!(syl.initial(), Some(Bopomofo::Ch));
        assert_eq!(syl.tone(), Some(Bopomofo::Tone2));
    }

    #[test]
    fn phone_codes_are_distinct_per_tone() {
        let a: Syllable = "ㄇㄚ".parse().unwrap();
        let b: Syllable = "ㄇㄚˇ".parse().unwrap();
        assert_ne!(a.to_u16(), b.to_u16());
        assert_eq!(a.to_u16() & 0x7, 1);
    }
}
