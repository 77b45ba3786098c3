//! State document repository.
//!
//! # Responsibility
//! - Encode the whole `AppState` as JSON under one fixed key.
//! - Recover and validate the document at startup.
//!
//! # Invariants
//! - Recovered state passes `AppState::validate()`.
//! - Recovered state has no in-flight markers (`reset_transient`).

use crate::model::app_state::AppState;
use crate::repo::kv_repo::KeyValueStore;
use crate::repo::{RepoError, RepoResult};
use log::{debug, error, info};

/// Reads and writes the persisted `AppState` document.
pub struct StateRepository {
    kv: Box<dyn KeyValueStore>,
    key: String,
}

impl StateRepository {
    pub fn new(kv: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the persisted state, or `None` when nothing was saved yet.
    ///
    /// # Errors
    /// - `InvalidData` when the stored document is not a valid state shape.
    /// - `Validation` when the document breaks state invariants.
    pub fn load(&self) -> RepoResult<Option<AppState>> {
        let Some(document) = self.kv.get(&self.key)? else {
            info!("event=state_load module=repo status=empty");
            return Ok(None);
        };

        let mut state: AppState = serde_json::from_str(&document).map_err(|err| {
            error!("event=state_load module=repo status=error error_code=state_decode_failed");
            RepoError::InvalidData(format!("cannot decode state under `{}`: {err}", self.key))
        })?;
        state.validate()?;
        state.reset_transient();

        info!(
            "event=state_load module=repo status=ok todo_count={} filter={}",
            state.todos.len(),
            state.filter
        );
        Ok(Some(state))
    }

    /// Writes the whole state document.
    pub fn save(&self, state: &AppState) -> RepoResult<()> {
        let document = serde_json::to_string(state).map_err(RepoError::Encode)?;
        self.kv.set(&self.key, &document)?;
        debug!(
            "event=state_save module=repo status=ok todo_count={} bytes={}",
            state.todos.len(),
            document.len()
        );
        Ok(())
    }
}
