//! Root application state.
//!
//! # Responsibility
//! - Hold the ordered todo list, the pending-entry text, the global request
//!   indicator and the active view filter.
//! - Provide id-based lookups and view projections (counts, filtered list).
//!
//! # Invariants
//! - `todos` order is display order.
//! - No two todos share a `TodoId` (enforced by `validate()` on recovery).

use crate::model::todo::{Todo, TodoId, UiStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Global request-in-flight indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    #[default]
    Ready,
    Loading,
}

impl AppStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Loading => "loading",
        }
    }
}

/// View filter applied to the todo list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Returns whether `todo` is shown under this filter.
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.is_completed(),
            Self::Completed => todo.is_completed(),
        }
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a filter name is not one of `all|active|completed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFilterError(pub String);

impl Display for ParseFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported filter `{}`; expected all|active|completed",
            self.0
        )
    }
}

impl Error for ParseFilterError {}

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(ParseFilterError(other.to_string())),
        }
    }
}

/// Structural problems found in a recovered state document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValidationError {
    DuplicateTodoId(TodoId),
}

impl Display for StateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateTodoId(id) => write!(f, "duplicate todo id: {id}"),
        }
    }
}

impl Error for StateValidationError {}

/// The single root state tree, persisted and observed as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub todos: Vec<Todo>,
    pub todo_input: String,
    pub status: AppStatus,
    pub filter: Filter,
}

impl AppState {
    /// Position of the todo with `id`, or `None` when it is not in the list.
    pub fn find_index(&self, id: TodoId) -> Option<usize> {
        self.todos.iter().position(|todo| todo.id() == id)
    }

    pub fn todo(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id() == id)
    }

    pub fn todo_mut(&mut self, id: TodoId) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|todo| todo.id() == id)
    }

    /// Removes the todo with `id`, resolving its position at call time.
    pub fn remove_todo(&mut self, id: TodoId) -> Option<Todo> {
        let index = self.find_index(id)?;
        Some(self.todos.remove(index))
    }

    pub fn active_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.is_completed()).count()
    }

    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|todo| todo.is_completed()).count()
    }

    /// Todos shown under the active filter, in display order.
    pub fn visible_todos(&self) -> impl Iterator<Item = &Todo> + '_ {
        let filter = self.filter;
        self.todos.iter().filter(move |todo| filter.matches(todo))
    }

    /// Puts every in-flight indicator back to its rest state.
    ///
    /// Pending round trips never survive a restart, so recovered state must
    /// not claim that one is running.
    pub fn reset_transient(&mut self) {
        self.status = AppStatus::Ready;
        for todo in &mut self.todos {
            todo.ui.status = UiStatus::Ready;
        }
    }

    /// Checks structural invariants of the tree.
    ///
    /// # Errors
    /// - `DuplicateTodoId` when two todos share one id.
    pub fn validate(&self) -> Result<(), StateValidationError> {
        let mut seen = HashSet::with_capacity(self.todos.len());
        for todo in &self.todos {
            if !seen.insert(todo.id()) {
                return Err(StateValidationError::DuplicateTodoId(todo.id()));
            }
        }
        Ok(())
    }
}
