//! Typed events accepted by the store.

use crate::model::app_state::Filter;
use crate::model::todo::TodoId;
use std::fmt::{Display, Formatter};

/// Tag of a `TodoEvent`, used as the handler registration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    Create,
    Delete,
    Update,
    Filter,
    ClearCompleted,
    Toggle,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        Self::Create,
        Self::Delete,
        Self::Update,
        Self::Filter,
        Self::ClearCompleted,
        Self::Toggle,
    ];

    /// Wire name of the event, as used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "todo:create",
            Self::Delete => "todo:delete",
            Self::Update => "todo:update",
            Self::Filter => "todo:filter",
            Self::ClearCompleted => "todo:clearCompleted",
            Self::Toggle => "todo:toggle",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event emitted by the view layer, with its payload.
///
/// Todos are addressed by id; the store resolves ids against the live tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoEvent {
    Create { text: String },
    Delete { id: TodoId },
    Update { id: TodoId, text: String },
    Filter { filter: Filter },
    ClearCompleted,
    Toggle { id: TodoId },
}

impl TodoEvent {
    pub fn create(text: impl Into<String>) -> Self {
        Self::Create { text: text.into() }
    }

    pub fn update(id: TodoId, text: impl Into<String>) -> Self {
        Self::Update {
            id,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Create { .. } => EventKind::Create,
            Self::Delete { .. } => EventKind::Delete,
            Self::Update { .. } => EventKind::Update,
            Self::Filter { .. } => EventKind::Filter,
            Self::ClearCompleted => EventKind::ClearCompleted,
            Self::Toggle { .. } => EventKind::Toggle,
        }
    }
}
