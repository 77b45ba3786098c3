//! Reaction registry: binds one handler per event kind onto a store.
//!
//! | Event            | Immediate phase                 | Deferred phase                      |
//! |------------------|---------------------------------|-------------------------------------|
//! | `create`         | `status = loading`              | append todo, clear input, persist   |
//! | `delete`         | `ui.status = deleting`          | remove by id, persist               |
//! | `update`         | `ui.status = updating`          | set title, `ui.status = ready`, persist |
//! | `filter`         | set filter, persist             | none                                |
//! | `clearCompleted` | mark completed todos `deleting` | remove marked ids, persist          |
//! | `toggle`         | flip `completed`, persist       | none                                |

use crate::config::StoreConfig;
use crate::model::app_state::AppStatus;
use crate::model::todo::{Todo, TodoId, UiStatus};
use crate::reaction::backend::{IdGenerator, RoundTrip, SimulatedServer, TodoBackend, UuidGenerator};
use crate::reaction::ReactionError;
use crate::store::event::{EventKind, TodoEvent};
use crate::store::state_store::StateStore;
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

type Reaction = fn(&Shared, &mut StateStore, &TodoEvent);

#[derive(Clone)]
struct Shared {
    latency: Duration,
    backend: Rc<dyn TodoBackend>,
    ids: Rc<dyn IdGenerator>,
    errors: Rc<RefCell<Vec<ReactionError>>>,
    creates_in_flight: Rc<Cell<usize>>,
}

/// Owner of the reaction handlers and their collaborators.
///
/// Handlers installed on a store keep sharing this registry's error log, so
/// the registry can be kept by the view layer to drain errors.
pub struct ReactionRegistry {
    shared: Shared,
}

impl ReactionRegistry {
    /// Registry with the always-successful simulated server and UUID ids.
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_parts(config, Rc::new(SimulatedServer), Rc::new(UuidGenerator))
    }

    pub fn with_parts(
        config: &StoreConfig,
        backend: Rc<dyn TodoBackend>,
        ids: Rc<dyn IdGenerator>,
    ) -> Self {
        Self {
            shared: Shared {
                latency: config.latency,
                backend,
                ids,
                errors: Rc::new(RefCell::new(Vec::new())),
                creates_in_flight: Rc::new(Cell::new(0)),
            },
        }
    }

    pub fn latency(&self) -> Duration {
        self.shared.latency
    }

    /// Registers the six reactions on `store`.
    pub fn install(&self, store: &mut StateStore) {
        self.bind(store, EventKind::Create, on_create);
        self.bind(store, EventKind::Delete, on_delete);
        self.bind(store, EventKind::Update, on_update);
        self.bind(store, EventKind::Filter, on_filter);
        self.bind(store, EventKind::ClearCompleted, on_clear_completed);
        self.bind(store, EventKind::Toggle, on_toggle);
        debug!(
            "event=reactions_install module=reaction status=ok latency_ms={}",
            self.shared.latency.as_millis()
        );
    }

    /// Drains errors recorded since the last call.
    pub fn take_errors(&self) -> Vec<ReactionError> {
        std::mem::take(&mut *self.shared.errors.borrow_mut())
    }

    pub fn error_count(&self) -> usize {
        self.shared.errors.borrow().len()
    }

    fn bind(&self, store: &mut StateStore, kind: EventKind, reaction: Reaction) {
        let shared = self.shared.clone();
        store.on(kind, move |store, event| reaction(&shared, store, event));
    }
}

impl Shared {
    fn record(&self, error: ReactionError) {
        warn!(
            "event=reaction module=reaction status=error kind={} error_code={} error={}",
            error.kind(),
            error.code(),
            error
        );
        self.errors.borrow_mut().push(error);
    }

    fn persist(&self, store: &StateStore, kind: EventKind) {
        if let Err(err) = store.persist() {
            self.record(ReactionError::Persist {
                kind,
                message: err.to_string(),
            });
        }
    }

    /// Immediate phase shared by `update` and `delete`: mark a ready todo as
    /// in flight. Returns `false` when the todo is missing or busy.
    fn begin(
        &self,
        store: &mut StateStore,
        kind: EventKind,
        id: TodoId,
        pending: UiStatus,
    ) -> bool {
        match store.state().todo(id).map(Todo::status) {
            None => {
                self.record(ReactionError::TodoNotFound { kind, id });
                false
            }
            Some(status) if !status.is_ready() => {
                self.record(ReactionError::TodoBusy { kind, id, status });
                false
            }
            Some(_) => {
                store.update_todo(id, |todo| todo.ui.status = pending);
                debug!(
                    "event=reaction module=reaction status=pending kind={kind} todo_id={id} ui_status={}",
                    pending.as_str()
                );
                true
            }
        }
    }

    fn finish_create(&self) -> usize {
        let remaining = self.creates_in_flight.get().saturating_sub(1);
        self.creates_in_flight.set(remaining);
        remaining
    }
}

fn on_create(shared: &Shared, store: &mut StateStore, event: &TodoEvent) {
    let TodoEvent::Create { text } = event else {
        return;
    };
    let title = text.clone();

    shared
        .creates_in_flight
        .set(shared.creates_in_flight.get() + 1);
    store.update(|state| state.status = AppStatus::Loading);
    debug!(
        "event=reaction module=reaction status=pending kind=todo:create in_flight={}",
        shared.creates_in_flight.get()
    );

    let job = shared.clone();
    store.defer(shared.latency, move |store| commit_create(&job, store, title));
}

fn commit_create(shared: &Shared, store: &mut StateStore, title: String) {
    let remaining = shared.finish_create();
    let outcome = shared.backend.round_trip(&RoundTrip::Create { title: &title });

    match outcome {
        Ok(()) => {
            let id = shared.ids.next_id();
            store.update(|state| {
                if remaining == 0 {
                    state.status = AppStatus::Ready;
                }
                state.todo_input.clear();
                state.todos.push(Todo::new(id, title));
            });
            info!("event=reaction module=reaction status=ok kind=todo:create todo_id={id}");
        }
        Err(source) => {
            store.update(|state| {
                if remaining == 0 {
                    state.status = AppStatus::Ready;
                }
            });
            shared.record(ReactionError::Backend {
                kind: EventKind::Create,
                source,
            });
        }
    }
    shared.persist(store, EventKind::Create);
}

fn on_delete(shared: &Shared, store: &mut StateStore, event: &TodoEvent) {
    let TodoEvent::Delete { id } = event else {
        return;
    };
    let id = *id;
    if !shared.begin(store, EventKind::Delete, id, UiStatus::Deleting) {
        return;
    }

    let job = shared.clone();
    store.defer(shared.latency, move |store| commit_delete(&job, store, id));
}

fn commit_delete(shared: &Shared, store: &mut StateStore, id: TodoId) {
    let outcome = shared.backend.round_trip(&RoundTrip::Delete {
        ids: std::slice::from_ref(&id),
    });

    match outcome {
        Ok(()) => {
            if store.state().find_index(id).is_some() {
                store.update(|state| state.remove_todo(id));
                info!("event=reaction module=reaction status=ok kind=todo:delete todo_id={id}");
            } else {
                warn!("event=reaction module=reaction status=skipped kind=todo:delete todo_id={id} reason=already_removed");
            }
        }
        Err(source) => {
            store.update_todo(id, |todo| todo.ui.status = UiStatus::Ready);
            shared.record(ReactionError::Backend {
                kind: EventKind::Delete,
                source,
            });
        }
    }
    shared.persist(store, EventKind::Delete);
}

fn on_update(shared: &Shared, store: &mut StateStore, event: &TodoEvent) {
    let TodoEvent::Update { id, text } = event else {
        return;
    };
    let (id, title) = (*id, text.clone());
    if !shared.begin(store, EventKind::Update, id, UiStatus::Updating) {
        return;
    }

    let job = shared.clone();
    store.defer(shared.latency, move |store| commit_update(&job, store, id, title));
}

fn commit_update(shared: &Shared, store: &mut StateStore, id: TodoId, title: String) {
    let outcome = shared.backend.round_trip(&RoundTrip::Update { id, title: &title });

    let committed = match outcome {
        Ok(()) => store.update_todo(id, |todo| {
            todo.model.title = title.clone();
            todo.ui.input = title;
            todo.ui.status = UiStatus::Ready;
        }),
        Err(source) => {
            let rolled_back = store.update_todo(id, |todo| todo.ui.status = UiStatus::Ready);
            shared.record(ReactionError::Backend {
                kind: EventKind::Update,
                source,
            });
            rolled_back
        }
    };

    if committed.is_none() {
        warn!("event=reaction module=reaction status=skipped kind=todo:update todo_id={id} reason=already_removed");
    } else {
        debug!("event=reaction module=reaction status=done kind=todo:update todo_id={id}");
    }
    shared.persist(store, EventKind::Update);
}

fn on_filter(shared: &Shared, store: &mut StateStore, event: &TodoEvent) {
    let TodoEvent::Filter { filter } = event else {
        return;
    };
    let filter = *filter;
    store.update(|state| state.filter = filter);
    debug!("event=reaction module=reaction status=ok kind=todo:filter filter={filter}");
    shared.persist(store, EventKind::Filter);
}

fn on_clear_completed(shared: &Shared, store: &mut StateStore, _event: &TodoEvent) {
    let has_targets = store
        .state()
        .todos
        .iter()
        .any(|todo| todo.is_completed() && todo.status().is_ready());
    if !has_targets {
        debug!("event=reaction module=reaction status=skipped kind=todo:clearCompleted reason=nothing_completed");
        return;
    }

    // One reverse pass snapshots every target before any commit runs.
    let ids: Vec<TodoId> = store.update(|state| {
        state
            .todos
            .iter_mut()
            .rev()
            .filter(|todo| todo.is_completed() && todo.status().is_ready())
            .map(|todo| {
                todo.ui.status = UiStatus::Deleting;
                todo.id()
            })
            .collect()
    });
    debug!(
        "event=reaction module=reaction status=pending kind=todo:clearCompleted count={}",
        ids.len()
    );

    let job = shared.clone();
    store.defer(shared.latency, move |store| commit_clear_completed(&job, store, ids));
}

fn commit_clear_completed(shared: &Shared, store: &mut StateStore, ids: Vec<TodoId>) {
    let outcome = shared.backend.round_trip(&RoundTrip::Delete { ids: &ids });

    match outcome {
        Ok(()) => {
            let removed = store.update(|state| {
                let before = state.todos.len();
                state.todos.retain(|todo| !ids.contains(&todo.id()));
                before - state.todos.len()
            });
            info!("event=reaction module=reaction status=ok kind=todo:clearCompleted removed={removed}");
        }
        Err(source) => {
            store.update(|state| {
                for todo in state.todos.iter_mut().filter(|todo| ids.contains(&todo.id())) {
                    todo.ui.status = UiStatus::Ready;
                }
            });
            shared.record(ReactionError::Backend {
                kind: EventKind::ClearCompleted,
                source,
            });
        }
    }
    shared.persist(store, EventKind::ClearCompleted);
}

fn on_toggle(shared: &Shared, store: &mut StateStore, event: &TodoEvent) {
    let TodoEvent::Toggle { id } = event else {
        return;
    };
    let id = *id;
    match store.update_todo(id, |todo| {
        todo.model.completed = !todo.model.completed;
        todo.model.completed
    }) {
        Some(completed) => {
            debug!("event=reaction module=reaction status=ok kind=todo:toggle todo_id={id} completed={completed}");
            shared.persist(store, EventKind::Toggle);
        }
        None => shared.record(ReactionError::TodoNotFound {
            kind: EventKind::Toggle,
            id,
        }),
    }
}
