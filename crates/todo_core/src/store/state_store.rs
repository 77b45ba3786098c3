//! State store: owned state tree, event dispatch and change notification.
//!
//! # Responsibility
//! - Hold the current `AppState` for one session.
//! - Route typed events to handlers registered per `EventKind`.
//! - Notify subscribers once per discrete mutation.
//! - Queue deferred jobs on a virtual clock and fire them on request.
//! - Write the whole state through the optional repository.
//!
//! # Invariants
//! - `state()` always reflects the latest committed mutation.
//! - `version()` increases by exactly one per `update`/`update_todo` that
//!   found its target.
//! - Snapshots are detached copies; todos are re-resolved by id, so a todo
//!   handle observes in-place updates until the todo is removed.

use crate::model::app_state::AppState;
use crate::model::todo::{Todo, TodoId};
use crate::repo::state_repo::StateRepository;
use crate::repo::RepoResult;
use crate::store::event::{EventKind, TodoEvent};
use crate::store::scheduler::Scheduler;
use log::{debug, error, info};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

/// Handler invoked for each emitted event of its registered kind.
pub type EventHandler = Rc<dyn Fn(&mut StateStore, &TodoEvent)>;

/// Work queued to run after a delay, with full access to the store.
pub type DeferredJob = Box<dyn FnOnce(&mut StateStore)>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Listener {
    id: SubscriptionId,
    callback: Box<dyn FnMut(&AppState)>,
}

/// Explicitly constructed holder of one `AppState` tree.
pub struct StateStore {
    state: AppState,
    version: u64,
    listeners: Vec<Listener>,
    next_subscription: u64,
    handlers: BTreeMap<EventKind, Vec<EventHandler>>,
    scheduler: Scheduler<DeferredJob>,
    repository: Option<StateRepository>,
}

impl StateStore {
    /// Creates a store over `state` without persistence.
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            version: 0,
            listeners: Vec::new(),
            next_subscription: 0,
            handlers: BTreeMap::new(),
            scheduler: Scheduler::new(),
            repository: None,
        }
    }

    /// Creates an empty, non-persistent store.
    pub fn in_memory() -> Self {
        Self::new(AppState::default())
    }

    /// Recovers state from `repository`, or starts from the default shape
    /// when nothing was saved yet. Later `persist()` calls write back to it.
    ///
    /// # Errors
    /// - Propagates storage failures and invalid persisted documents.
    pub fn open(repository: StateRepository) -> RepoResult<Self> {
        let recovered = repository.load()?;
        let recovered_flag = recovered.is_some();
        let mut store = Self::new(recovered.unwrap_or_default());
        info!(
            "event=store_open module=store status=ok recovered={} key={}",
            recovered_flag,
            repository.key()
        );
        store.repository = Some(repository);
        Ok(store)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Detached copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.state.clone()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_persistent(&self) -> bool {
        self.repository.is_some()
    }

    /// Registers `handler` for events of `kind`.
    ///
    /// Several handlers may share one kind; they run in registration order.
    pub fn on(&mut self, kind: EventKind, handler: impl Fn(&mut StateStore, &TodoEvent) + 'static) {
        self.handlers.entry(kind).or_default().push(Rc::new(handler));
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Runs every handler registered for the event's kind and returns how
    /// many ran. Events without handlers are ignored.
    pub fn emit(&mut self, event: TodoEvent) -> usize {
        let kind = event.kind();
        let handlers = match self.handlers.get(&kind) {
            Some(handlers) if !handlers.is_empty() => handlers.clone(),
            _ => {
                debug!("event=emit module=store status=ignored kind={kind}");
                return 0;
            }
        };

        debug!(
            "event=emit module=store status=dispatch kind={kind} handlers={}",
            handlers.len()
        );
        for handler in &handlers {
            handler(self, &event);
        }
        handlers.len()
    }

    /// Registers a change listener, called after every mutation with the
    /// updated tree.
    pub fn subscribe(&mut self, listener: impl FnMut(&AppState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push(Listener {
            id,
            callback: Box::new(listener),
        });
        id
    }

    /// Removes a listener. Returns `false` when it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    /// Applies one mutation to the tree, then notifies listeners once.
    pub fn update<R>(&mut self, mutate: impl FnOnce(&mut AppState) -> R) -> R {
        let output = mutate(&mut self.state);
        self.commit();
        output
    }

    /// Applies one mutation to the todo with `id`.
    ///
    /// Returns `None` without notifying when the todo is not in the list.
    pub fn update_todo<R>(&mut self, id: TodoId, mutate: impl FnOnce(&mut Todo) -> R) -> Option<R> {
        let todo = self.state.todo_mut(id)?;
        let output = mutate(todo);
        self.commit();
        Some(output)
    }

    /// Direct view-layer write of the pending-entry text.
    pub fn set_todo_input(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.update(|state| state.todo_input = text);
    }

    /// Writes the entire state through the repository, if one is attached.
    pub fn persist(&self) -> RepoResult<()> {
        let Some(repository) = &self.repository else {
            return Ok(());
        };
        repository.save(&self.state).map_err(|err| {
            error!(
                "event=state_persist module=store status=error version={} error={err}",
                self.version
            );
            err
        })
    }

    /// Queues `job` to run `delay` after the current virtual time.
    pub fn defer(&mut self, delay: Duration, job: impl FnOnce(&mut StateStore) + 'static) {
        self.scheduler.schedule(delay, Box::new(job));
    }

    pub fn pending_jobs(&self) -> usize {
        self.scheduler.len()
    }

    /// Current virtual time since the store was created.
    pub fn now(&self) -> Duration {
        Duration::from_millis(self.scheduler.now_ms())
    }

    /// Moves virtual time forward by `by`, firing every job that falls due,
    /// including jobs scheduled by fired jobs. Returns how many fired.
    pub fn advance(&mut self, by: Duration) -> usize {
        let by_ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        let target_ms = self.scheduler.now_ms().saturating_add(by_ms);
        let mut fired = 0;
        while let Some(job) = self.scheduler.pop_due(target_ms) {
            job(self);
            fired += 1;
        }
        self.scheduler.advance_to(target_ms);
        fired
    }

    /// Fires pending jobs until the queue is empty. Returns how many fired.
    pub fn run_until_idle(&mut self) -> usize {
        let mut fired = 0;
        while let Some(due_ms) = self.scheduler.next_due_ms() {
            let wait_ms = due_ms.saturating_sub(self.scheduler.now_ms());
            fired += self.advance(Duration::from_millis(wait_ms));
        }
        fired
    }

    fn commit(&mut self) {
        self.version += 1;
        let Self {
            state, listeners, ..
        } = self;
        for listener in listeners.iter_mut() {
            (listener.callback)(state);
        }
    }
}
