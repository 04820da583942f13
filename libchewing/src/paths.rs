//! Locating the system dictionary and the user phrase store.

use std::env;
use std::path::{Path, PathBuf};

use libchewing_core::Lexicon;
use tracing::debug;

use crate::error::OpenError;

pub const USER_STORE_FILE: &str = "chewing.redb";

/// Searched after `CHEWING_PATH`.
const SYSTEM_DIRS: [&str; 2] = ["/usr/share/libchewing", "/usr/local/share/libchewing"];

/// Directory holding the system dictionary.
///
/// An explicit directory must contain the dictionary. Otherwise every entry
/// of `CHEWING_PATH`, then the system directories, is tried in order.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf, OpenError> {
    let candidates: Vec<PathBuf> = match explicit {
        Some(dir) => vec![dir.to_path_buf()],
        None => env::var_os("CHEWING_PATH")
            .map(|v| env::split_paths(&v).collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .chain(SYSTEM_DIRS.iter().map(PathBuf::from))
            .collect(),
    };
    match candidates.iter().find(|dir| Lexicon::exists_in(dir)) {
        Some(dir) => {
            debug!(path = %dir.display(), "using system dictionary");
            Ok(dir.clone())
        }
        None => Err(OpenError::MissingDictionary {
            searched: env::join_paths(&candidates)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }),
    }
}

/// File of the user phrase store, or `None` for an in-memory store.
///
/// An explicit path naming a directory gets [`USER_STORE_FILE`] appended.
pub fn resolve_user_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(in_dir_if_dir(path.to_path_buf()));
    }
    let dir = env::var_os("CHEWING_USER_PATH")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var_os("XDG_DATA_HOME")
                .filter(|v| !v.is_empty())
                .map(|d| PathBuf::from(d).join("chewing"))
        })
        .or_else(|| {
            env::var_os("HOME")
                .filter(|v| !v.is_empty())
                .map(|h| PathBuf::from(h).join(".local/share/chewing"))
        })?;
    Some(dir.join(USER_STORE_FILE))
}

fn in_dir_if_dir(path: PathBuf) -> PathBuf {
    if path.is_dir() {
        path.join(USER_STORE_FILE)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libchewing_core::LexiconBuilder;
    use serial_test::serial;

    #[test]
    fn explicit_data_dir_must_hold_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_data_dir(Some(dir.path())),
            Err(OpenError::MissingDictionary { .. })
        ));
        LexiconBuilder::from_source_str("測 100 ㄘㄜˋ\n")
            .unwrap()
            .write_to_dir(dir.path())
            .unwrap();
        assert_eq!(resolve_data_dir(Some(dir.path())).unwrap(), dir.path());
    }

    #[test]
    #[serial]
    fn search_path_picks_first_match() {
        let empty = tempfile::tempdir().unwrap();
        let full = tempfile::tempdir().unwrap();
        LexiconBuilder::from_source_str("測 100 ㄘㄜˋ\n")
            .unwrap()
            .write_to_dir(full.path())
            .unwrap();
        let joined = env::join_paths([empty.path(), full.path()]).unwrap();
        env::set_var("CHEWING_PATH", &joined);
        let found = resolve_data_dir(None);
        env::remove_var("CHEWING_PATH");
        assert_eq!(found.unwrap(), full.path());
    }

    #[test]
    #[serial]
    fn user_path_follows_environment() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_user_path(Some(dir.path())).unwrap(),
            dir.path().join(USER_STORE_FILE)
        );
        env::set_var("CHEWING_USER_PATH", dir.path());
        let found = resolve_user_path(None);
        env::remove_var("CHEWING_USER_PATH");
        assert_eq!(found.unwrap(), dir.path().join(USER_STORE_FILE));
    }
}
