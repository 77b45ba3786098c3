//! Observable state container.
//!
//! # Responsibility
//! - Own the single `AppState` tree of one session.
//! - Dispatch typed events to registered handlers.
//! - Notify subscribers after every discrete mutation.
//! - Run deferred work on a virtual clock.
//!
//! # Invariants
//! - Handlers run synchronously, in registration order.
//! - Deferred jobs never run inside `emit`; only `advance`/`run_until_idle`
//!   fire them, ordered by due time then scheduling order.

pub mod event;
pub mod scheduler;
pub mod state_store;

pub use event::{EventKind, TodoEvent};
pub use scheduler::Scheduler;
pub use state_store::{DeferredJob, EventHandler, StateStore, SubscriptionId};
