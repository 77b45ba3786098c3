//! Event reactions: the six handlers that mutate the state tree.
//!
//! # Responsibility
//! - Give immediate feedback on emit (in-flight markers).
//! - Commit the real mutation after a simulated round trip, then persist.
//! - Roll back in-flight markers when the round trip fails.
//!
//! # Invariants
//! - Targets are captured by `TodoId` at emit time and resolved again at
//!   commit time.
//! - A todo's `ui.status` is only set to a non-ready value by the immediate
//!   phase of `update`/`delete`/`clearCompleted` and only reset by the
//!   matching commit or rollback.
//! - Every committed mutation is followed by a full-state write.

use crate::model::todo::{TodoId, UiStatus};
use crate::store::event::EventKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod backend;
pub mod registry;

pub use backend::{
    BackendError, BackendResult, IdGenerator, RoundTrip, SimulatedServer, TodoBackend,
    UuidGenerator,
};
pub use registry::ReactionRegistry;

/// Problem recorded while running a reaction.
///
/// Reactions never unwind into the view layer; they record errors for it to
/// drain with `ReactionRegistry::take_errors`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionError {
    TodoNotFound {
        kind: EventKind,
        id: TodoId,
    },
    /// Another request for the same todo is still in flight.
    TodoBusy {
        kind: EventKind,
        id: TodoId,
        status: UiStatus,
    },
    Backend {
        kind: EventKind,
        source: BackendError,
    },
    Persist {
        kind: EventKind,
        message: String,
    },
}

impl ReactionError {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::TodoNotFound { kind, .. }
            | Self::TodoBusy { kind, .. }
            | Self::Backend { kind, .. }
            | Self::Persist { kind, .. } => *kind,
        }
    }

    /// Stable machine-readable code, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TodoNotFound { .. } => "todo_not_found",
            Self::TodoBusy { .. } => "todo_busy",
            Self::Backend { .. } => "backend_failed",
            Self::Persist { .. } => "persist_failed",
        }
    }
}

impl Display for ReactionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TodoNotFound { kind, id } => write!(f, "{kind}: todo not found: {id}"),
            Self::TodoBusy { kind, id, status } => write!(
                f,
                "{kind}: todo {id} is busy ({})",
                status.as_str()
            ),
            Self::Backend { kind, source } => write!(f, "{kind}: {source}"),
            Self::Persist { kind, message } => write!(f, "{kind}: failed to save state: {message}"),
        }
    }
}

impl Error for ReactionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend { source, .. } => Some(source),
            _ => None,
        }
    }
}
