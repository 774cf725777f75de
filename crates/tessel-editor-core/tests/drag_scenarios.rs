mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{attrs, client_y_of, nodes, session, text};
use insta::assert_snapshot;
use serde_json::json;
use tessel_editor_core::document::class;
use tessel_editor_core::{
    AnalyticsEvent, Completion, Delta, DragContent, DropOutcome, EditorError, Range, StatePath, Store,
};

fn last_drag_event(store: &Store) -> Option<(DragContent, Completion)> {
    store.with_state(|state| match state.analytics.as_ref() {
        Some(AnalyticsEvent::DragAndDrop {
            content, completion, ..
        }) => Some((content.clone(), *completion)),
        None => None,
    })
}

#[test]
fn drop_onto_preceding_line_changes_nothing() {
    let store = Store::new();
    let mut main = session("main", Delta::new().insert("a\nb\nc\n"), &store);
    let n = nodes(&main);
    let before = main.editor().get_contents();

    main.drag_start(2, None).expect("start");
    main.drag_over(client_y_of(&main, n[0]), 0.0).expect("over");
    assert_eq!(store.get_state().drag.and_then(|d| d.target), Some(n[0]));

    assert_eq!(main.drop(40.0), Ok(DropOutcome::Noop));
    assert_eq!(main.editor().get_contents(), before);
    assert!(n.iter().all(|&node| main.editor().scroll().state(node).is_default()));
    assert_eq!(last_drag_event(&store), Some((DragContent::Text, Completion::Incomplete)));

    main.tick(0.0);
    assert_eq!(main.editor().get_selection(), Some(Range::caret(2)));
}

#[test]
fn drop_onto_itself_changes_nothing() {
    let store = Store::new();
    let mut main = session("main", Delta::new().insert("a\nb\nc\n"), &store);
    let n = nodes(&main);

    main.drag_start(2, None).expect("start");
    main.drag_over(client_y_of(&main, n[1]), 0.0).expect("over");
    assert_eq!(main.drop(0.0), Ok(DropOutcome::Noop));
    assert_eq!(text(&main), "a\nb\nc\n");
}

#[test]
fn throttled_drag_over_then_drop_restores_after_cleanup() {
    let store = Store::new();
    let mut main = session(
        "main",
        Delta::new()
            .insert("a")
            .insert_with("\n", attrs(json!({"list": "bullet"})))
            .insert("b\nc\n"),
        &store,
    );
    let n = nodes(&main);

    main.drag_start(0, None).expect("start");
    main.drag_over(client_y_of(&main, n[1]), 0.0).expect("leading");
    main.drag_over(client_y_of(&main, n[2]) - 10.0, 5.0).expect("trailing");
    main.drag_over(client_y_of(&main, n[2]), 8.0).expect("coalesced");
    assert_eq!(store.get_state().drag.and_then(|d| d.target), Some(n[1]));

    main.tick(19.0);
    assert!(main.editor().scroll().state(n[1]).has_class(class::DRAGOVER));
    main.tick(20.0);
    assert_eq!(store.get_state().drag.and_then(|d| d.target), Some(n[2]));
    assert!(!main.editor().scroll().state(n[1]).has_class(class::DRAGOVER));

    let outcome = main.drop(0.0).expect("drop");
    assert!(matches!(outcome, DropOutcome::Moved { restore, .. } if restore == n[0]));
    // Cleanup has not run yet, the emptied container is still there.
    assert_eq!(main.editor().scroll().empty_containers(), 1);
    assert_eq!(main.editor().get_selection(), None);

    main.tick(20.0);
    assert_eq!(main.editor().scroll().empty_containers(), 0);
    assert_snapshot!(main.editor().scroll().outline(), @r#"
    block "b"
    block "c"
    ul
      bullet "a"
    "#);
    assert_eq!(main.editor().get_selection(), Some(Range::caret(4)));
    assert_eq!(last_drag_event(&store), Some((DragContent::List, Completion::Complete)));
    assert!(store.get_state().drag.is_none());
}

#[test]
fn todo_runs_move_as_separate_containers() {
    let store = Store::new();
    let mut main = session(
        "main",
        Delta::new()
            .insert("a")
            .insert_with("\n", attrs(json!({"list": "unchecked"})))
            .insert("b")
            .insert_with("\n", attrs(json!({"list": "unchecked", "indent": 1})))
            .insert("c")
            .insert_with("\n", attrs(json!({"list": "checked", "indent": 1})))
            .insert("tail\n"),
        &store,
    );
    let n = nodes(&main);

    main.drag_start(0, None).expect("start");
    main.drag_over(client_y_of(&main, n[3]), 0.0).expect("over");
    main.drop(0.0).expect("drop");
    main.tick(0.0);

    assert_snapshot!(main.editor().scroll().outline(), @r#"
    block "tail"
    ul unchecked
      unchecked "a"
      unchecked.1 "b"
    ul checked
      checked.1 "c"
    "#);
    assert_eq!(text(&main), "tail\na\nb\nc\n");
    assert_eq!(main.editor().get_selection(), Some(Range::caret(5)));
}

#[test]
fn vacated_gap_closes_after_animation() {
    let store = Store::new();
    let mut main = session("main", Delta::new().insert("a\nb\nc\nd\n"), &store);
    let n = nodes(&main);
    let height = main.editor().scroll().line_box(n[0]).expect("box").client_height;

    main.drag_start(0, None).expect("start");
    main.drag_over(client_y_of(&main, n[2]), 0.0).expect("over");
    main.drop(60.0).expect("drop");
    assert_eq!(main.editor().scroll().state(n[1]).margin_top, height);

    main.tick(100.0);
    assert_eq!(main.editor().scroll().state(n[1]).margin_top, height);
    main.tick(250.0);
    assert_eq!(main.editor().scroll().state(n[1]).margin_top, 0.0);
    assert_eq!(text(&main), "b\nc\na\nd\n");
}

#[test]
fn short_gestures_skip_the_animation() {
    let store = Store::new();
    let mut main = session("main", Delta::new().insert("a\nb\nc\nd\n"), &store);
    let n = nodes(&main);

    main.drag_start(0, None).expect("start");
    main.drag_over(client_y_of(&main, n[2]), 0.0).expect("over");
    main.drop(3.0).expect("drop");
    assert_eq!(main.editor().scroll().state(n[1]).margin_top, 0.0);
}

#[test]
fn cancelled_drag_ignores_trailing_call() {
    let store = Store::new();
    let mut main = session("main", Delta::new().insert("a\nb\nc\n"), &store);
    let n = nodes(&main);

    main.drag_start(0, None).expect("start");
    main.drag_over(client_y_of(&main, n[1]), 0.0).expect("leading");
    main.drag_over(client_y_of(&main, n[2]), 5.0).expect("trailing");
    main.drag_cancel().expect("cancel");
    main.tick(20.0);

    assert!(n.iter().all(|&node| main.editor().scroll().state(node).is_default()));
    assert!(store.get_state().drag.is_none());
    assert_eq!(last_drag_event(&store), Some((DragContent::Text, Completion::Incomplete)));
    assert_eq!(main.drop(0.0), Err(EditorError::NoActiveDrag));

    main.drag_end();
    assert!(main.drag().item().is_none());
}

#[test]
fn repeated_drags_keep_only_the_latest_event() {
    let store = Store::new();
    let mut main = session("main", Delta::new().insert("a\nb\n"), &store);
    let seen = Rc::new(Cell::new(0));
    let counter = Rc::clone(&seen);
    store.subscribe(StatePath::Analytics, move |_| counter.set(counter.get() + 1));

    for _ in 0..100 {
        main.drag_start(0, None).expect("start");
        main.drag_cancel().expect("cancel");
        main.drag_end();
    }

    assert_eq!(seen.get(), 100);
    assert_eq!(last_drag_event(&store), Some((DragContent::Text, Completion::Incomplete)));
}

#[test]
fn drag_from_nowhere_is_an_error() {
    let store = Store::new();
    let mut main = session("main", Delta::new().insert("a\n"), &store);
    assert_eq!(main.drag_start(50, None), Err(EditorError::NoBlockAtIndex(50)));
    assert_eq!(main.drag_over(10.0, 0.0), Err(EditorError::NoActiveDrag));
}

#[test]
fn file_drag_survives_enter_leave_churn() {
    let store = Store::new();
    let mut main = session("main", Delta::new().insert("a\n"), &store);

    main.file_drag_enter();
    main.file_drag_leave();
    main.tick(50.0);
    main.file_drag_enter();
    main.file_drag_leave();
    main.tick(149.0);
    assert!(store.get_state().file_drag_active);

    main.tick(150.0);
    assert!(!store.get_state().file_drag_active);

    main.file_drag_enter();
    main.file_drag_drop();
    assert!(!store.get_state().file_drag_active);
    assert!(main.scheduler().is_empty());
}
