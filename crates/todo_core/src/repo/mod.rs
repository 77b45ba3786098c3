//! Persistence backend contracts and implementations.
//!
//! # Responsibility
//! - Define the key-value contract the state store persists through.
//! - Keep SQL and JSON encoding details out of the store and reactions.
//!
//! # Invariants
//! - The whole `AppState` is written as one document; there are no partial
//!   writes.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::config::ConfigError;
use crate::db::DbError;
use crate::model::app_state::StateValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod kv_repo;
pub mod state_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for key-value access and state document encoding.
#[derive(Debug)]
pub enum RepoError {
    Config(ConfigError),
    Db(DbError),
    Encode(serde_json::Error),
    Validation(StateValidationError),
    InvalidData(String),
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid store configuration: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode state document: {err}"),
            Self::Validation(err) => write!(f, "invalid persisted state: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted state: {message}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<ConfigError> for RepoError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<StateValidationError> for RepoError {
    fn from(value: StateValidationError) -> Self {
        Self::Validation(value)
    }
}
