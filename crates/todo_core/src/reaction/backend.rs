//! Collaborators the reactions call out to: the server round trip and id
//! generation.

use crate::model::todo::TodoId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Request sent when a deferred phase commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTrip<'a> {
    Create { title: &'a str },
    Update { id: TodoId, title: &'a str },
    Delete { ids: &'a [TodoId] },
}

impl RoundTrip<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}

/// Failure reported by a backend round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub code: String,
    pub message: String,
}

impl BackendError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "backend error `{}`: {}", self.code, self.message)
    }
}

impl Error for BackendError {}

pub type BackendResult<T> = Result<T, BackendError>;

/// Server side of a reaction's deferred phase.
///
/// Called once per commit, after the configured latency has elapsed.
pub trait TodoBackend {
    fn round_trip(&self, request: &RoundTrip<'_>) -> BackendResult<()>;
}

/// Backend that accepts every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedServer;

impl TodoBackend for SimulatedServer {
    fn round_trip(&self, _request: &RoundTrip<'_>) -> BackendResult<()> {
        Ok(())
    }
}

/// Source of fresh todo ids.
pub trait IdGenerator {
    fn next_id(&self) -> TodoId;
}

/// Random (v4) UUID generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> TodoId {
        Uuid::new_v4()
    }
}
