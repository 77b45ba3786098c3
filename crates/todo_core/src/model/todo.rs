//! Todo domain model.
//!
//! # Responsibility
//! - Define one task entry: persisted model fields plus transient UI state.
//!
//! # Invariants
//! - `model.id` is assigned at creation and never reassigned.
//! - `ui.status` leaves `Ready` only while a reaction for this todo is in
//!   flight.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a todo.
pub type TodoId = Uuid;

/// Per-item request state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiStatus {
    #[default]
    Ready,
    /// A title update is waiting for its round trip.
    Updating,
    /// A removal is waiting for its round trip.
    Deleting,
}

impl UiStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
        }
    }

    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

/// Persisted fields of a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoModel {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
}

/// Transient view fields of a todo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoUi {
    pub status: UiStatus,
    /// Edit buffer shown when the item is being edited.
    #[serde(default)]
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub model: TodoModel,
    pub ui: TodoUi,
}

impl Todo {
    /// Creates an active todo in `Ready` state.
    ///
    /// The edit buffer starts with the title.
    pub fn new(id: TodoId, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            model: TodoModel {
                id,
                title: title.clone(),
                completed: false,
            },
            ui: TodoUi {
                status: UiStatus::Ready,
                input: title,
            },
        }
    }

    pub fn id(&self) -> TodoId {
        self.model.id
    }

    pub fn title(&self) -> &str {
        &self.model.title
    }

    pub fn is_completed(&self) -> bool {
        self.model.completed
    }

    pub fn status(&self) -> UiStatus {
        self.ui.status
    }
}
