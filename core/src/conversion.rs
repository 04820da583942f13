// core/src/conversion.rs
//
// Turns the composition (a row of syllables and literal characters) into
// phrase intervals. User-chosen phrases are fixed intervals; breaks stop a
// phrase from spanning a position.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::trace;

use crate::lexicon::{key_for, Lexicon, PhraseEntry};
use crate::userdict::UserDict;
use crate::zhuyin::Syllable;

/// Longest phrase considered during segmentation.
pub const MAX_PHRASE_LEN: usize = 11;

const CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConversionEngine {
    /// Best single character per syllable.
    Simple,
    /// Phrase segmentation: fewest phrases, then highest frequency.
    #[default]
    Chewing,
    /// Like `Chewing`, falling back to tone-insensitive matches.
    Fuzzy,
}

impl ConversionEngine {
    pub fn id(self) -> i32 {
        match self {
            ConversionEngine::Simple => 0,
            ConversionEngine::Chewing => 1,
            ConversionEngine::Fuzzy => 2,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(ConversionEngine::Simple),
            1 => Some(ConversionEngine::Chewing),
            2 => Some(ConversionEngine::Fuzzy),
            _ => None,
        }
    }
}

/// One position in the composition buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Syllable(Syllable),
    Char(char),
}

impl Symbol {
    pub fn as_syllable(&self) -> Option<Syllable> {
        match self {
            Symbol::Syllable(s) => Some(*s),
            Symbol::Char(_) => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Syllable(s) => write!(f, "{}", s),
            Symbol::Char(c) => write!(f, "{}", c),
        }
    }
}

/// A phrase the user picked for `start..end`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
    pub phrase: String,
}

/// A converted span of the composition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
    pub phrase: String,
}

/// Lexicon plus the session's user phrases.
#[derive(Debug, Clone)]
pub struct Dictionary {
    pub lexicon: Arc<Lexicon>,
    pub user: UserDict,
}

impl Dictionary {
    pub fn new(lexicon: Arc<Lexicon>, user: UserDict) -> Self {
        Self { lexicon, user }
    }

    /// User phrases first (most used first), then lexicon phrases.
    pub fn phrases(&self, syllables: &[Syllable], fuzzy: bool) -> Vec<PhraseEntry> {
        let mut lex = self.lexicon.lookup(syllables);
        if lex.is_empty() && fuzzy {
            lex = self.lexicon.lookup_toneless(syllables);
        }
        let top = lex.iter().map(|e| e.freq).max().unwrap_or(0);
        let mut out: Vec<PhraseEntry> = self
            .user
            .phrases_for(&key_for(syllables))
            .into_iter()
            .map(|p| {
                let count = u32::try_from(p.freq).unwrap_or(u32::MAX);
                PhraseEntry::new(p.phrase, top.saturating_add(count))
            })
            .collect();
        out.sort_by(|a, b| b.freq.cmp(&a.freq));
        for e in lex {
            if !out.iter().any(|o| o.phrase == e.phrase) {
                out.push(e);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
struct Step {
    count: usize,
    freq: u64,
    prev: usize,
}

impl Step {
    fn better_than(&self, other: &Step) -> bool {
        self.count < other.count || (self.count == other.count && self.freq > other.freq)
    }
}

/// Segmentation with a small memo of recent results.
pub struct Converter {
    cache: LruCache<String, Vec<Interval>>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    pub fn new() -> Self {
        let capacity = NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Drop memoized results, e.g. after the user dictionary changed.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn convert(
        &mut self,
        engine: ConversionEngine,
        dict: &Dictionary,
        symbols: &[Symbol],
        selections: &[Selection],
        breaks: &[usize],
    ) -> Vec<Interval> {
        let cache_key = format!("{:?}|{:?}|{:?}|{:?}", engine, symbols, selections, breaks);
        if let Some(hit) = self.cache.get(&cache_key) {
            return hit.clone();
        }
        let out = segment(engine, dict, symbols, selections, breaks);
        trace!(symbols = symbols.len(), intervals = out.len(), "converted composition");
        self.cache.put(cache_key, out.clone());
        out
    }
}

fn segment(
    engine: ConversionEngine,
    dict: &Dictionary,
    symbols: &[Symbol],
    selections: &[Selection],
    breaks: &[usize],
) -> Vec<Interval> {
    let n = symbols.len();
    let mut best: Vec<Option<Step>> = vec![None; n + 1];
    let mut phrase_at: Vec<Option<String>> = vec![None; n + 1];
    best[0] = Some(Step {
        count: 0,
        freq: 0,
        prev: 0,
    });

    for i in 0..n {
        let Some(from) = best[i] else { continue };
        for j in (i + 1)..=n.min(i + MAX_PHRASE_LEN) {
            let Some((phrase, freq)) = span_phrase(engine, dict, symbols, selections, breaks, i, j)
            else {
                continue;
            };
            let step = Step {
                count: from.count + 1,
                freq: from.freq + freq,
                prev: i,
            };
            if best[j].map_or(true, |cur| step.better_than(&cur)) {
                best[j] = Some(step);
                phrase_at[j] = Some(phrase);
            }
        }
    }

    if best[n].is_none() {
        // unreachable with well-formed selections; show symbols verbatim
        return symbols
            .iter()
            .enumerate()
            .map(|(i, s)| Interval {
                start: i,
                end: i + 1,
                phrase: s.to_string(),
            })
            .collect();
    }

    let mut out = Vec::new();
    let mut end = n;
    while end > 0 {
        let Some(step) = best[end] else { break };
        out.push(Interval {
            start: step.prev,
            end,
            phrase: phrase_at[end].take().unwrap_or_default(),
        });
        end = step.prev;
    }
    out.reverse();
    out
}

fn span_phrase(
    engine: ConversionEngine,
    dict: &Dictionary,
    symbols: &[Symbol],
    selections: &[Selection],
    breaks: &[usize],
    i: usize,
    j: usize,
) -> Option<(String, u64)> {
    for sel in selections {
        if sel.start < j && i < sel.end {
            return (sel.start == i && sel.end == j).then(|| (sel.phrase.clone(), u64::from(u32::MAX)));
        }
    }
    if breaks.iter().any(|&b| i < b && b < j) {
        return None;
    }
    let syllables: Option<Vec<Syllable>> = symbols[i..j].iter().map(Symbol::as_syllable).collect();
    let Some(syllables) = syllables else {
        // literal characters only stand alone
        return (j - i == 1).then(|| (symbols[i].to_string(), 0));
    };
    if engine == ConversionEngine::Simple && j - i > 1 {
        return None;
    }
    let entries = dict.phrases(&syllables, engine == ConversionEngine::Fuzzy);
    match entries.first() {
        Some(e) => Some((e.phrase.clone(), u64::from(e.freq))),
        None if j - i == 1 => Some((syllables[0].to_string(), 0)),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconBuilder;

    const SOURCE: &str = "\
綠茶 500 ㄌㄩˋ ㄔㄚˊ
綠 300 ㄌㄩˋ
律 200 ㄌㄩˋ
茶 400 ㄔㄚˊ
查 350 ㄔㄚˊ
好 500 ㄏㄠˇ
";

    fn dict() -> Dictionary {
        let lex = LexiconBuilder::from_source_str(SOURCE).unwrap().build();
        Dictionary::new(Arc::new(lex), UserDict::new_in_memory())
    }

    fn syms(s: &str) -> Vec<Symbol> {
        s.split_whitespace()
            .map(|p| Symbol::Syllable(p.parse().unwrap()))
            .collect()
    }

    fn text(intervals: &[Interval]) -> String {
        intervals.iter().map(|i| i.phrase.as_str()).collect()
    }

    #[test]
    fn prefers_longer_phrases() {
        let mut conv = Converter::new();
        let out = conv.convert(ConversionEngine::Chewing, &dict(), &syms("ㄌㄩˋ ㄔㄚˊ"), &[], &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(text(&out), "綠茶");
    }

    #[test]
    fn simple_engine_uses_single_characters() {
        let mut conv = Converter::new();
        let out = conv.convert(ConversionEngine::Simple, &dict(), &syms("ㄌㄩˋ ㄔㄚˊ"), &[], &[]);
        assert_eq!(text(&out), "綠茶");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn selections_and_breaks_are_honored() {
        let mut conv = Converter::new();
        let d = dict();
        let sel = [Selection {
            start: 0,
            end: 1,
            phrase: "律".into(),
        }];
        let out = conv.convert(ConversionEngine::Chewing, &d, &syms("ㄌㄩˋ ㄔㄚˊ"), &sel, &[]);
        assert_eq!(text(&out), "律茶");

        let out = conv.convert(ConversionEngine::Chewing, &d, &syms("ㄌㄩˋ ㄔㄚˊ"), &[], &[1]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn unknown_syllable_and_literals_pass_through() {
        let mut conv = Converter::new();
        let mut s = syms("ㄇㄚ");
        s.push(Symbol::Char('!'));
        let out = conv.convert(ConversionEngine::Chewing, &dict(), &s, &[], &[]);
        assert_eq!(text(&out), "ㄇㄚ!");
    }

    #[test]
    fn fuzzy_engine_ignores_tones() {
        let mut conv = Converter::new();
        let out = conv.convert(ConversionEngine::Fuzzy, &dict(), &syms("ㄏㄠ"), &[], &[]);
        assert_eq!(text(&out), "好");
        let out = conv.convert(ConversionEngine::Chewing, &dict(), &syms("ㄏㄠ"), &[], &[]);
        assert_eq!(text(&out), "ㄏㄠ");
    }

    #[test]
    fn user_phrases_rank_first() {
        let d = dict();
        d.user.add("ㄔㄚˊ", "查");
        let got = d.phrases(&[("ㄔㄚˊ").parse().unwrap()], false);
        assert_eq!(got[0].phrase, "查");
        assert_eq!(got.len(), 2);
    }
}
