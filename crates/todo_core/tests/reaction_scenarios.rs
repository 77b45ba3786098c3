use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;
use todo_core::{
    open_session, AppState, AppStatus, EventKind, Filter, KeyValueStore, MemoryKeyValueStore,
    ReactionError, ReactionRegistry, StateStore, StoreConfig, Todo, TodoEvent, TodoId, UiStatus,
    DEFAULT_LATENCY_MS,
};
use uuid::Uuid;

const LATENCY: Duration = Duration::from_millis(DEFAULT_LATENCY_MS);
const HALF: Duration = Duration::from_millis(DEFAULT_LATENCY_MS / 2);

fn session() -> (StateStore, ReactionRegistry, MemoryKeyValueStore) {
    let kv = MemoryKeyValueStore::new();
    let (store, reactions) = open_session(&StoreConfig::default(), Box::new(kv.clone())).unwrap();
    (store, reactions, kv)
}

fn seeded(todos: &[(&str, bool)]) -> (StateStore, ReactionRegistry, Vec<TodoId>) {
    let mut state = AppState::default();
    for (title, completed) in todos {
        let mut todo = Todo::new(Uuid::new_v4(), *title);
        todo.model.completed = *completed;
        state.todos.push(todo);
    }
    let ids = state.todos.iter().map(Todo::id).collect();
    let mut store = StateStore::new(state);
    let reactions = ReactionRegistry::new(&StoreConfig::default());
    reactions.install(&mut store);
    (store, reactions, ids)
}

fn titles(store: &StateStore) -> Vec<String> {
    store
        .state()
        .todos
        .iter()
        .map(|todo| todo.title().to_string())
        .collect()
}

#[test]
fn create_shows_loading_then_appends_todo_after_latency() {
    let (mut store, reactions, kv) = session();
    store.set_todo_input("buy milk");

    store.emit(TodoEvent::create("buy milk"));

    assert_eq!(store.state().status, AppStatus::Loading);
    assert!(store.state().todos.is_empty());
    assert_eq!(kv.write_count(), 0);

    assert_eq!(store.advance(LATENCY - Duration::from_millis(1)), 0);
    assert_eq!(store.state().status, AppStatus::Loading);

    assert_eq!(store.advance(Duration::from_millis(1)), 1);
    let state = store.state();
    assert_eq!(state.status, AppStatus::Ready);
    assert_eq!(state.todo_input, "");
    assert_eq!(state.todos.len(), 1);
    assert_eq!(state.todos[0].title(), "buy milk");
    assert!(!state.todos[0].is_completed());
    assert_eq!(state.todos[0].status(), UiStatus::Ready);
    assert_eq!(kv.write_count(), 1);
    assert!(reactions.take_errors().is_empty());
}

#[test]
fn every_create_adds_exactly_one_ready_todo_with_fresh_id() {
    let (mut store, _reactions, _kv) = session();

    for round in 0..5 {
        store.emit(TodoEvent::create(format!("task {round}")));
        store.advance(LATENCY);

        let todos = &store.state().todos;
        assert_eq!(todos.len(), round + 1);
        let newest = todos.last().unwrap();
        assert!(!newest.is_completed());
        assert_eq!(newest.status(), UiStatus::Ready);

        let ids: HashSet<TodoId> = todos.iter().map(Todo::id).collect();
        assert_eq!(ids.len(), todos.len());
    }
}

#[test]
fn overlapping_creates_keep_loading_until_last_commit() {
    let (mut store, _reactions, _kv) = session();

    store.emit(TodoEvent::create("first"));
    store.advance(HALF);
    store.emit(TodoEvent::create("second"));

    store.advance(HALF);
    assert_eq!(titles(&store), vec!["first"]);
    assert_eq!(store.state().status, AppStatus::Loading);

    store.advance(HALF);
    assert_eq!(titles(&store), vec!["first", "second"]);
    assert_eq!(store.state().status, AppStatus::Ready);
}

#[test]
fn simultaneous_creates_commit_in_emission_order() {
    let (mut store, _reactions, _kv) = session();
    for title in ["a", "b", "c"] {
        store.emit(TodoEvent::create(title));
    }

    assert_eq!(store.advance(LATENCY), 3);
    assert_eq!(titles(&store), vec!["a", "b", "c"]);
    assert_eq!(store.state().status, AppStatus::Ready);
}

#[test]
fn clear_completed_marks_then_removes_completed_todos() {
    let (mut store, _reactions, ids) = seeded(&[("A", false), ("B", true)]);

    store.emit(TodoEvent::ClearCompleted);

    let state = store.state();
    assert_eq!(state.todo(ids[1]).unwrap().status(), UiStatus::Deleting);
    assert_eq!(state.todo(ids[0]).unwrap().status(), UiStatus::Ready);
    assert_eq!(state.todos.len(), 2);

    store.advance(LATENCY);
    let remaining: Vec<TodoId> = store.state().todos.iter().map(Todo::id).collect();
    assert_eq!(remaining, vec![ids[0]]);
    assert_eq!(store.state().todos[0].status(), UiStatus::Ready);
}

#[test]
fn clear_completed_removes_interleaved_completed_todos() {
    let (mut store, _reactions, _ids) = seeded(&[
        ("a", true),
        ("b", false),
        ("c", true),
        ("d", true),
        ("e", false),
    ]);

    store.emit(TodoEvent::ClearCompleted);
    store.advance(LATENCY);

    assert_eq!(titles(&store), vec!["b", "e"]);
}

#[test]
fn clear_completed_with_nothing_completed_does_nothing() {
    let (mut store, _reactions, _ids) = seeded(&[("a", false)]);
    let version = store.version();

    store.emit(TodoEvent::ClearCompleted);

    assert_eq!(store.pending_jobs(), 0);
    assert_eq!(store.version(), version);
}

#[test]
fn update_marks_updating_then_commits_title() {
    let (mut store, _reactions, ids) = seeded(&[("old text", false)]);
    let id = ids[0];

    store.emit(TodoEvent::update(id, "new text"));

    let todo = store.state().todo(id).unwrap();
    assert_eq!(todo.status(), UiStatus::Updating);
    assert_eq!(todo.title(), "old text");

    store.advance(LATENCY);
    let todo = store.state().todo(id).unwrap();
    assert_eq!(todo.title(), "new text");
    assert_eq!(todo.ui.input, "new text");
    assert_eq!(todo.status(), UiStatus::Ready);
}

#[test]
fn overlapping_deletes_remove_both_targets() {
    let (mut store, _reactions, ids) = seeded(&[
        ("u", false),
        ("v", false),
        ("t", false),
        ("w", false),
        ("x", false),
    ]);
    let (u, t) = (ids[0], ids[2]);

    store.emit(TodoEvent::Delete { id: t });
    store.advance(HALF);
    store.emit(TodoEvent::Delete { id: u });

    assert_eq!(store.state().todo(t).unwrap().status(), UiStatus::Deleting);
    assert_eq!(store.state().todo(u).unwrap().status(), UiStatus::Deleting);

    store.advance(HALF);
    assert_eq!(titles(&store), vec!["u", "v", "w", "x"]);

    store.advance(HALF);
    assert_eq!(titles(&store), vec!["v", "w", "x"]);
}

#[test]
fn deletes_committing_in_reverse_of_list_order_stay_correct() {
    let (mut store, _reactions, ids) = seeded(&[("a", false), ("b", false), ("c", false)]);

    store.emit(TodoEvent::Delete { id: ids[0] });
    store.emit(TodoEvent::Delete { id: ids[2] });
    store.advance(LATENCY);

    assert_eq!(titles(&store), vec!["b"]);
}

#[test]
fn filter_is_immediate_and_idempotent() {
    let (mut store, _reactions, kv) = session();

    store.emit(TodoEvent::Filter {
        filter: Filter::Active,
    });
    assert_eq!(store.state().filter, Filter::Active);
    assert_eq!(store.pending_jobs(), 0);
    let first_document = kv.get("todos_state").unwrap();

    store.emit(TodoEvent::Filter {
        filter: Filter::Active,
    });
    assert_eq!(store.state().filter, Filter::Active);
    assert_eq!(kv.write_count(), 2);
    assert_eq!(kv.get("todos_state").unwrap(), first_document);
}

#[test]
fn toggle_is_an_involution_and_persists_each_time() {
    let (mut store, _reactions, kv) = session();
    store.emit(TodoEvent::create("flip me"));
    store.advance(LATENCY);
    let id = store.state().todos[0].id();
    let writes = kv.write_count();

    store.emit(TodoEvent::Toggle { id });
    assert!(store.state().todo(id).unwrap().is_completed());
    store.emit(TodoEvent::Toggle { id });
    assert!(!store.state().todo(id).unwrap().is_completed());

    assert_eq!(kv.write_count(), writes + 2);
    assert_eq!(store.pending_jobs(), 0);
}

#[test]
fn second_request_for_busy_todo_is_rejected() {
    let (mut store, reactions, ids) = seeded(&[("keep", false)]);
    let id = ids[0];

    store.emit(TodoEvent::update(id, "renamed"));
    store.emit(TodoEvent::Delete { id });
    store.emit(TodoEvent::update(id, "again"));

    let errors = reactions.take_errors();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|err| matches!(
        err,
        ReactionError::TodoBusy {
            status: UiStatus::Updating,
            ..
        }
    )));
    assert_eq!(errors[0].kind(), EventKind::Delete);
    assert_eq!(store.pending_jobs(), 1);

    store.run_until_idle();
    assert_eq!(titles(&store), vec!["renamed"]);
}

#[test]
fn clear_completed_skips_todos_already_being_deleted() {
    let (mut store, reactions, ids) = seeded(&[("a", true), ("b", true)]);

    store.emit(TodoEvent::Delete { id: ids[0] });
    store.emit(TodoEvent::ClearCompleted);
    store.run_until_idle();

    assert!(store.state().todos.is_empty());
    assert!(reactions.take_errors().is_empty());
}

#[test]
fn events_for_unknown_todo_are_recorded_without_mutation() {
    let (mut store, reactions, _ids) = seeded(&[("a", false)]);
    let unknown = Uuid::new_v4();
    let version = store.version();

    store.emit(TodoEvent::Delete { id: unknown });
    store.emit(TodoEvent::Toggle { id: unknown });
    store.emit(TodoEvent::update(unknown, "x"));

    assert_eq!(store.version(), version);
    assert_eq!(store.pending_jobs(), 0);
    let errors = reactions.take_errors();
    assert_eq!(errors.len(), 3);
    assert!(errors
        .iter()
        .all(|err| matches!(err, ReactionError::TodoNotFound { id, .. } if *id == unknown)));
}

#[test]
fn listeners_see_fully_updated_tree_after_each_phase() {
    let (mut store, _reactions, _kv) = session();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    store.subscribe(move |state| sink.borrow_mut().push((state.status, state.todos.len())));

    store.emit(TodoEvent::create("observed"));
    store.advance(LATENCY);

    assert_eq!(
        *seen.borrow(),
        vec![(AppStatus::Loading, 0), (AppStatus::Ready, 1)]
    );
}

#[test]
fn extra_handlers_run_after_builtin_reaction() {
    let (mut store, _reactions, ids) = seeded(&[("a", false)]);
    let observed = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&observed);
    store.on(EventKind::Toggle, move |store, event| {
        if let TodoEvent::Toggle { id } = event {
            *sink.borrow_mut() = store.state().todo(*id).map(Todo::is_completed);
        }
    });

    assert_eq!(store.emit(TodoEvent::Toggle { id: ids[0] }), 2);
    assert_eq!(*observed.borrow(), Some(true));
}

#[test]
fn deferred_reactions_persist_only_after_commit() {
    let (mut store, _reactions, kv) = session();
    for title in ["a", "b", "c"] {
        store.emit(TodoEvent::create(title));
    }
    store.advance(LATENCY);
    let ids: Vec<TodoId> = store.state().todos.iter().map(Todo::id).collect();
    store.emit(TodoEvent::Toggle { id: ids[2] });

    let events = [
        TodoEvent::Delete { id: ids[0] },
        TodoEvent::update(ids[1], "B"),
        TodoEvent::ClearCompleted,
    ];
    for event in events {
        let kind = event.kind();
        let before = kv.write_count();

        store.emit(event);
        assert_eq!(kv.write_count(), before, "{kind} must not save before commit");

        store.advance(LATENCY);
        assert_eq!(kv.write_count(), before + 1, "{kind} must save once after commit");
    }

    drop(store);
    let (reopened, _reactions) = open_session(&StoreConfig::default(), Box::new(kv)).unwrap();
    assert_eq!(titles(&reopened), vec!["B"]);
    assert_eq!(reopened.state().todos[0].id(), ids[1]);
}
