//! Per-session user phrase store.
//!
//! Entries are keyed by `(bopomofo key, phrase)` and carry a usage count.
//! Two backends:
//! - `InMemory`: used when no writable location is available, and in tests.
//! - `Redb`: persistent storage in a single `redb` file.
//!
//! The binding does not arbitrate several sessions opening the same file.
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::Context;
use redb::ReadableTable;
use tracing::warn;

/// One learned or user-added phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPhrase {
    pub phrase: String,
    pub bopomofo: String,
    pub freq: u64,
}

type Entries = BTreeMap<(String, String), u64>;

/// A thread-safe in-memory user dictionary.
#[derive(Clone, Debug, Default)]
pub struct InMemoryUserDict {
    inner: Arc<RwLock<Entries>>,
}

impl InMemoryUserDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn learn_with_count(&self, key: &str, phrase: &str, delta: u64) {
        if let Ok(mut map) = self.inner.write() {
            let entry = map.entry((key.to_string(), phrase.to_string())).or_insert(0);
            *entry = entry.saturating_add(delta);
        }
    }

    pub fn frequency(&self, key: &str, phrase: &str) -> u64 {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(&(key.to_string(), phrase.to_string())).copied())
            .unwrap_or(0)
    }

    pub fn remove(&self, key: &str, phrase: &str) -> bool {
        self.inner
            .write()
            .map(|mut map| map.remove(&(key.to_string(), phrase.to_string())).is_some())
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> Entries {
        self.inner.read().map(|m| m.clone()).unwrap_or_default()
    }
}

/// Redb-backed user dictionary.
pub struct RedbUserDict {
    db: redb::Database,
    path: PathBuf,
}

impl fmt::Debug for RedbUserDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbUserDict").field("path", &self.path).finish()
    }
}

impl RedbUserDict {
    /// `(bopomofo key, phrase) -> count`
    const TABLE_DEF: redb::TableDefinition<'static, (&'static str, &'static str), u64> =
        redb::TableDefinition::new("user_phrase");

    /// Create or open a redb database at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, redb::Error> {
        if let Some(parent) = path.as_ref().parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let db = redb::Database::create(path.as_ref())?;
        // make sure the table exists so read transactions never miss it
        let write_txn = db.begin_write()?;
        write_txn.open_table(Self::TABLE_DEF)?;
        write_txn.commit()?;
        Ok(RedbUserDict {
            db,
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn learn_with_count(&self, key: &str, phrase: &str, delta: u64) -> Result<(), redb::Error> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(Self::TABLE_DEF)?;
            let cur = table.get((key, phrase))?.map(|v| v.value()).unwrap_or(0);
            table.insert((key, phrase), &cur.saturating_add(delta))?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn frequency(&self, key: &str, phrase: &str) -> Result<u64, redb::Error> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(Self::TABLE_DEF)?;
        Ok(table.get((key, phrase))?.map(|v| v.value()).unwrap_or(0))
    }

    pub fn remove(&self, key: &str, phrase: &str) -> Result<bool, redb::Error> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(Self::TABLE_DEF)?;
            let removed = table.remove((key, phrase))?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    pub fn snapshot(&self) -> Result<Entries, redb::Error> {
        let mut out = BTreeMap::new();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(Self::TABLE_DEF)?;
        for item in table.iter()? {
            let (k, v) = item?;
            let (key, phrase) = k.value();
            out.insert((key.to_string(), phrase.to_string()), v.value());
        }
        Ok(out)
    }
}

/// Backend switch used by the editor.
#[derive(Clone, Debug)]
pub enum UserDict {
    InMemory(InMemoryUserDict),
    Redb(Arc<RedbUserDict>),
}

impl Default for UserDict {
    fn default() -> Self {
        UserDict::new_in_memory()
    }
}

impl UserDict {
    pub fn new_in_memory() -> Self {
        UserDict::InMemory(InMemoryUserDict::new())
    }

    /// Open (or create) a persistent store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let dict = RedbUserDict::new(path)
            .with_context(|| format!("open user phrase store {}", path.display()))?;
        Ok(UserDict::Redb(Arc::new(dict)))
    }

    /// Increment the usage count by one, inserting the phrase if needed.
    pub fn learn(&self, key: &str, phrase: &str) {
        self.learn_with_count(key, phrase, 1);
    }

    pub fn learn_with_count(&self, key: &str, phrase: &str, delta: u64) {
        match self {
            UserDict::InMemory(m) => m.learn_with_count(key, phrase, delta),
            UserDict::Redb(r) => {
                if let Err(e) = r.learn_with_count(key, phrase, delta) {
                    warn!(error = %e, phrase, "failed to update user phrase");
                }
            }
        }
    }

    /// Add a phrase explicitly. Returns false if it was already present.
    pub fn add(&self, key: &str, phrase: &str) -> bool {
        if self.frequency(key, phrase) > 0 {
            return false;
        }
        self.learn(key, phrase);
        self.frequency(key, phrase) > 0
    }

    pub fn remove(&self, key: &str, phrase: &str) -> bool {
        match self {
            UserDict::InMemory(m) => m.remove(key, phrase),
            UserDict::Redb(r) => r.remove(key, phrase).unwrap_or_else(|e| {
                warn!(error = %e, phrase, "failed to remove user phrase");
                false
            }),
        }
    }

    pub fn frequency(&self, key: &str, phrase: &str) -> u64 {
        match self {
            UserDict::InMemory(m) => m.frequency(key, phrase),
            UserDict::Redb(r) => r.frequency(key, phrase).unwrap_or(0),
        }
    }

    /// All entries ordered by bopomofo key, then phrase.
    pub fn entries(&self) -> Vec<UserPhrase> {
        let snap = match self {
            UserDict::InMemory(m) => m.snapshot(),
            UserDict::Redb(r) => r.snapshot().unwrap_or_default(),
        };
        snap.into_iter()
            .map(|((bopomofo, phrase), freq)| UserPhrase {
                phrase,
                bopomofo,
                freq,
            })
            .collect()
    }

    /// Entries stored under one bopomofo key.
    pub fn phrases_for(&self, key: &str) -> Vec<UserPhrase> {
        self.entries()
            .into_iter()
            .filter(|p| p.bopomofo == key)
            .collect()
    }

    /// Whether `phrase` is present, optionally restricted to one key.
    pub fn contains(&self, phrase: &str, key: Option<&str>) -> bool {
        match key {
            Some(k) => self.frequency(k, phrase) > 0,
            None => self.entries().iter().any(|p| p.phrase == phrase),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_learn_and_frequency() {
        let d = UserDict::new_in_memory();
        assert_eq!(d.frequency("ㄋㄧˇ ㄏㄠˇ", "你好"), 0);
        d.learn("ㄋㄧˇ ㄏㄠˇ", "你好");
        assert_eq!(d.frequency("ㄋㄧˇ ㄏㄠˇ", "你好"), 1);
        d.learn_with_count("ㄋㄧˇ ㄏㄠˇ", "你好", 4);
        assert_eq!(d.frequency("ㄋㄧˇ ㄏㄠˇ", "你好"), 5);
    }

    #[test]
    fn add_is_idempotent_and_remove_reports() {
        let d = UserDict::new_in_memory();
        assert!(d.add("ㄘㄜˋ", "測"));
        assert!(!d.add("ㄘㄜˋ", "測"));
        assert!(d.contains("測", None));
        assert!(d.contains("測", Some("ㄘㄜˋ")));
        assert!(!d.contains("測", Some("ㄘㄜ")));
        assert!(d.remove("ㄘㄜˋ", "測"));
        assert!(!d.remove("ㄘㄜˋ", "測"));
    }

    #[test]
    fn redb_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.redb");
        {
            let d = UserDict::open(&path).unwrap();
            d.learn("ㄌㄩˋ ㄔㄚˊ", "綠茶");
            d.learn("ㄌㄩˋ ㄔㄚˊ", "綠茶");
            d.add("ㄔㄚˊ", "茶");
        }
        let d = UserDict::open(&path).unwrap();
        assert_eq!(d.frequency("ㄌㄩˋ ㄔㄚˊ", "綠茶"), 2);
        let entries = d.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(d.phrases_for("ㄔㄚˊ")[0].phrase, "茶");
    }
}
