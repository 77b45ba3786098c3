//! Domain model for the task list state tree.
//!
//! # Responsibility
//! - Define the single root `AppState` and its `Todo` entries.
//! - Provide id-based lookup helpers used by reactions and views.
//!
//! # Invariants
//! - Every todo is identified by a stable `TodoId`.
//! - `TodoId` values are unique within one `AppState`.

pub mod app_state;
pub mod todo;
