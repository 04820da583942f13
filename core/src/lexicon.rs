//! Phrase lexicon keyed by bopomofo syllable sequences.
//!
//! Keys are the display form of each syllable joined by a single space
//! (`"ㄌㄩˋ ㄔㄚˊ"`). On disk a lexicon is two files in one directory:
//!
//! - `lexicon.fst`: an `fst::Map` from key to payload index
//! - `lexicon.bincode`: `Vec<Vec<PhraseEntry>>` indexed by that value
//!
//! `LexiconBuilder` produces both files, either from code or from a plain
//! text source where each line reads `phrase freq syllable...`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::Path;

use ahash::AHashMap;
use anyhow::{bail, Context, Result};
use fst::{Map, MapBuilder, Streamer};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::zhuyin::Syllable;

pub const FST_FILE: &str = "lexicon.fst";
pub const PAYLOAD_FILE: &str = "lexicon.bincode";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseEntry {
    pub phrase: String,
    pub freq: u32,
}

impl PhraseEntry {
    pub fn new<T: Into<String>>(phrase: T, freq: u32) -> Self {
        Self {
            phrase: phrase.into(),
            freq,
        }
    }
}

/// Join syllables into a lexicon key.
pub fn key_for(syllables: &[Syllable]) -> String {
    syllables
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn toneless_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, 'ˊ' | 'ˇ' | 'ˋ' | '˙' | 'ˉ'))
        .collect()
}

#[derive(Debug, Default)]
pub struct Lexicon {
    map: AHashMap<String, Vec<PhraseEntry>>,
    fst_map: Option<Map<Vec<u8>>>,
    payloads: Vec<Vec<PhraseEntry>>,
    // toneless key -> full keys, built on first fuzzy lookup
    toneless: OnceCell<AHashMap<String, Vec<String>>>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an in-memory entry. Repeated phrases accumulate frequency.
    pub fn insert(&mut self, syllables: &[Syllable], phrase: &str, freq: u32) {
        let bucket = self.map.entry(key_for(syllables)).or_default();
        if let Some(e) = bucket.iter_mut().find(|e| e.phrase == phrase) {
            e.freq = e.freq.saturating_add(freq);
        } else {
            bucket.push(PhraseEntry::new(phrase, freq));
        }
        self.toneless = OnceCell::new();
    }

    /// All phrases for an exact syllable sequence, most frequent first.
    pub fn lookup(&self, syllables: &[Syllable]) -> Vec<PhraseEntry> {
        self.lookup_key(&key_for(syllables))
    }

    pub fn lookup_key(&self, key: &str) -> Vec<PhraseEntry> {
        let mut out: Vec<PhraseEntry> = Vec::new();
        if let Some(v) = self.map.get(key) {
            out.extend(v.iter().cloned());
        }
        if let Some(map) = &self.fst_map {
            if let Some(entries) = map.get(key).and_then(|idx| self.payloads.get(idx as usize)) {
                for e in entries {
                    if !out.iter().any(|o| o.phrase == e.phrase) {
                        out.push(e.clone());
                    }
                }
            }
        }
        out.sort_by(|a, b| b.freq.cmp(&a.freq));
        out
    }

    /// Phrases whose syllables match ignoring tones.
    pub fn lookup_toneless(&self, syllables: &[Syllable]) -> Vec<PhraseEntry> {
        let index = self.toneless.get_or_init(|| self.build_toneless_index());
        let wanted = toneless_key(&key_for(syllables));
        let mut out: Vec<PhraseEntry> = Vec::new();
        for key in index.get(&wanted).into_iter().flatten() {
            for e in self.lookup_key(key) {
                if !out.iter().any(|o| o.phrase == e.phrase) {
                    out.push(e);
                }
            }
        }
        out.sort_by(|a, b| b.freq.cmp(&a.freq));
        out
    }

    fn build_toneless_index(&self) -> AHashMap<String, Vec<String>> {
        let mut index: AHashMap<String, Vec<String>> = AHashMap::new();
        for key in self.keys() {
            index.entry(toneless_key(&key)).or_default().push(key);
        }
        debug!(keys = index.len(), "built toneless lexicon index");
        index
    }

    /// Every key in the lexicon (fst keys first, then in-memory ones).
    pub fn keys(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(map) = &self.fst_map {
            let mut stream = map.stream();
            while let Some((k, _)) = stream.next() {
                out.push(String::from_utf8_lossy(k).into_owned());
            }
        }
        for k in self.map.keys() {
            if !out.contains(k) {
                out.push(k.clone());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty() && self.payloads.is_empty()
    }

    /// Load lexicon from FST + bincode artifacts.
    pub fn load_from_fst_bincode<P: AsRef<Path>>(fst_path: P, bincode_path: P) -> Result<Self> {
        let fst_path = fst_path.as_ref();
        let bincode_path = bincode_path.as_ref();

        let mut buf = Vec::new();
        File::open(fst_path)
            .and_then(|mut f| f.read_to_end(&mut buf))
            .with_context(|| format!("read fst {}", fst_path.display()))?;
        let map = Map::new(buf).with_context(|| format!("fst map {}", fst_path.display()))?;

        let mut buf = Vec::new();
        File::open(bincode_path)
            .and_then(|mut f| f.read_to_end(&mut buf))
            .with_context(|| format!("read bincode {}", bincode_path.display()))?;
        let payloads: Vec<Vec<PhraseEntry>> = bincode::deserialize(&buf)
            .with_context(|| format!("deserialize bincode {}", bincode_path.display()))?;

        if payloads.len() != map.len() {
            bail!(
                "lexicon payload count {} does not match key count {}",
                payloads.len(),
                map.len()
            );
        }

        Ok(Self {
            map: AHashMap::new(),
            fst_map: Some(map),
            payloads,
            toneless: OnceCell::new(),
        })
    }

    /// Load `lexicon.fst` + `lexicon.bincode` from a data directory.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let lex = Self::load_from_fst_bincode(dir.join(FST_FILE), dir.join(PAYLOAD_FILE))?;
        info!(path = %dir.display(), keys = lex.payloads.len(), "loaded lexicon");
        Ok(lex)
    }

    /// True when `dir` holds both lexicon files.
    pub fn exists_in<P: AsRef<Path>>(dir: P) -> bool {
        let dir = dir.as_ref();
        dir.join(FST_FILE).is_file() && dir.join(PAYLOAD_FILE).is_file()
    }
}

/// Collects entries and writes the on-disk lexicon.
#[derive(Debug, Default, Clone)]
pub struct LexiconBuilder {
    grouped: BTreeMap<String, Vec<PhraseEntry>>,
}

impl LexiconBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, syllables: &[Syllable], phrase: &str, freq: u32) -> &mut Self {
        let bucket = self.grouped.entry(key_for(syllables)).or_default();
        if let Some(e) = bucket.iter_mut().find(|e| e.phrase == phrase) {
            e.freq = e.freq.saturating_add(freq);
        } else {
            bucket.push(PhraseEntry::new(phrase, freq));
        }
        self
    }

    /// Parse `phrase freq syllable...` lines. `#` starts a comment.
    pub fn from_source_str(text: &str) -> Result<Self> {
        let mut builder = Self::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let (Some(phrase), Some(freq)) = (parts.next(), parts.next()) else {
                bail!("line {}: expected `phrase freq syllable...`", lineno + 1);
            };
            let freq: u32 = freq
                .parse()
                .with_context(|| format!("line {}: bad frequency {:?}", lineno + 1, freq))?;
            let syllables = parts
                .map(|s| s.parse::<Syllable>())
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("line {}", lineno + 1))?;
            if syllables.len() != phrase.chars().count() {
                bail!(
                    "line {}: {} has {} characters but {} syllables",
                    lineno + 1,
                    phrase,
                    phrase.chars().count(),
                    syllables.len()
                );
            }
            builder.insert(&syllables, phrase, freq);
        }
        Ok(builder)
    }

    /// In-memory lexicon with the collected entries.
    pub fn build(&self) -> Lexicon {
        let mut lex = Lexicon::new();
        for (k, v) in &self.grouped {
            lex.map.insert(k.clone(), v.clone());
        }
        lex
    }

    /// Write `lexicon.fst` and `lexicon.bincode` into `dir`.
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

        let w = BufWriter::new(File::create(dir.join(FST_FILE))?);
        let mut map_builder = MapBuilder::new(w)?;
        // BTreeMap iteration is already in the byte order fst requires
        for (i, k) in self.grouped.keys().enumerate() {
            map_builder.insert(k, i as u64)?;
        }
        map_builder.finish()?;

        let payloads: Vec<Vec<PhraseEntry>> = self.grouped.values().cloned().collect();
        let binf = BufWriter::new(File::create(dir.join(PAYLOAD_FILE))?);
        bincode::serialize_into(binf, &payloads)?;
        debug!(path = %dir.display(), keys = payloads.len(), "wrote lexicon");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syls(s: &str) -> Vec<Syllable> {
        s.split_whitespace().map(|p| p.parse().unwrap()).collect()
    }

    const SOURCE: &str = "\
# phrase freq syllables
綠茶 500 ㄌㄩˋ ㄔㄚˊ
綠 300 ㄌㄩˋ
律 200 ㄌㄩˋ
茶 400 ㄔㄚˊ
查 350 ㄔㄚˊ
";

    #[test]
    fn source_lookup_is_frequency_ordered() {
        let lex = LexiconBuilder::from_source_str(SOURCE).unwrap().build();
        let got: Vec<String> = lex
            .lookup(&syls("ㄌㄩˋ"))
            .into_iter()
            .map(|e| e.phrase)
            .collect();
        assert_eq!(got, vec!["綠", "律"]);
        assert_eq!(lex.lookup(&syls("ㄌㄩˋ ㄔㄚˊ"))[0].phrase, "綠茶");
        assert!(lex.lookup(&syls("ㄇㄚ")).is_empty());
    }

    #[test]
    fn write_then_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        LexiconBuilder::from_source_str(SOURCE)
            .unwrap()
            .write_to_dir(dir.path())
            .unwrap();
        assert!(Lexicon::exists_in(dir.path()));
        let lex = Lexicon::load_from_dir(dir.path()).unwrap();
        assert_eq!(lex.lookup(&syls("ㄔㄚˊ"))[0].phrase, "茶");
        assert_eq!(lex.len(), 3);
    }

    #[test]
    fn toneless_lookup_ignores_tone_marks() {
        let lex = LexiconBuilder::from_source_str(SOURCE).unwrap().build();
        let got = lex.lookup_toneless(&syls("ㄔㄚ"));
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn malformed_source_is_rejected() {
        assert!(LexiconBuilder::from_source_str("綠茶 5 ㄌㄩˋ").is_err());
        assert!(LexiconBuilder::from_source_str("綠 x ㄌㄩˋ").is_err());
        assert!(LexiconBuilder::from_source_str("綠").is_err());
    }

    #[test]
    fn missing_dir_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Lexicon::load_from_dir(dir.path().join("nope")).is_err());
    }
}
