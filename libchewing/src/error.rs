//! Error types surfaced by the binding.
//!
//! The C ABI never sees these directly; each boundary function maps them to
//! its documented sentinel.

use std::path::PathBuf;

use thiserror::Error;

/// Why a session could not be opened.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("no system dictionary found (searched: {searched})")]
    MissingDictionary { searched: String },

    #[error("failed to load system dictionary from {path}")]
    Dictionary {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to open user phrase store at {path}")]
    UserStore {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid configuration")]
    Config(#[from] ConfigError),
}

/// A rejected configuration read or write. The previous value is untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown option {0:?}")]
    UnknownOption(String),

    #[error("option {name} holds a {expected} value")]
    WrongType {
        name: &'static str,
        expected: &'static str,
    },

    #[error("{value} is outside the valid range of {name} ({domain})")]
    OutOfDomain {
        name: &'static str,
        value: String,
        domain: String,
    },
}

impl ConfigError {
    pub(crate) fn out_of_domain(
        name: &'static str,
        value: impl ToString,
        domain: impl Into<String>,
    ) -> Self {
        ConfigError::OutOfDomain {
            name,
            value: value.to_string(),
            domain: domain.into(),
        }
    }
}
