//! Core of the task list: state tree, observable store and reactions.
//! Rendering lives outside this crate; it emits `TodoEvent`s and re-renders
//! from `StateStore::state()` when notified.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reaction;
pub mod repo;
pub mod store;

pub use config::{ConfigError, StoreConfig, DEFAULT_LATENCY_MS, DEFAULT_STORAGE_KEY};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::app_state::{AppState, AppStatus, Filter, ParseFilterError, StateValidationError};
pub use model::todo::{Todo, TodoId, TodoModel, TodoUi, UiStatus};
pub use reaction::{
    BackendError, BackendResult, IdGenerator, ReactionError, ReactionRegistry, RoundTrip,
    SimulatedServer, TodoBackend, UuidGenerator,
};
pub use repo::kv_repo::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use repo::state_repo::StateRepository;
pub use repo::{RepoError, RepoResult};
pub use store::{EventKind, StateStore, SubscriptionId, TodoEvent};

/// Opens a persistent store over `kv` and installs the default reactions.
///
/// # Errors
/// - `RepoError::Config` when `config` is invalid.
/// - `RepoError::InvalidData` when the stored document cannot be recovered.
pub fn open_session(
    config: &StoreConfig,
    kv: Box<dyn KeyValueStore>,
) -> RepoResult<(StateStore, ReactionRegistry)> {
    config.validate()?;
    let mut store = StateStore::open(StateRepository::new(kv, config.storage_key.clone()))?;
    let reactions = ReactionRegistry::new(config);
    reactions.install(&mut store);
    Ok((store, reactions))
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, open_session, ConfigError, KeyValueStore, MemoryKeyValueStore, RepoError,
        StoreConfig,
    };

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn open_session_rejects_invalid_config() {
        let config = StoreConfig::default().with_storage_key("");
        let kv = MemoryKeyValueStore::new();
        kv.set("", "{not json").expect("raw write should succeed");

        let err = match open_session(&config, Box::new(kv)) {
            Ok(_) => panic!("blank storage key must be rejected"),
            Err(err) => err,
        };
        assert!(matches!(err, RepoError::Config(ConfigError::EmptyStorageKey)));
        assert!(err.to_string().contains("configuration"));
    }
}
