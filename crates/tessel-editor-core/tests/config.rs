mod common;

use common::session_with;
use tessel_editor_core::{ConfigError, Delta, EditorConfig, EditorId, EditorSession, Range, Source, Store};

#[test]
fn toml_overrides_reach_the_trackers() {
    let config = EditorConfig::from_toml_str(
        r#"
        [triggers.emoji]
        trigger = ";"
        min_query = 1

        [drag]
        throttle_ms = 50.0
        "#,
    )
    .expect("valid config");
    assert_eq!(config.triggers.emoji.window, 24);

    let store = Store::new();
    let mut main = session_with("main", Delta::new().insert("\nnext\n"), &store, config);
    main.set_selection(Some(Range::caret(0)), Source::User);
    main.type_text(";");
    main.type_text("x");
    assert_eq!(store.get_state().emoji.map(|e| e.query), Some("x".to_string()));
    assert_eq!(main.config().drag.throttle_ms, 50.0);
}

#[test]
fn load_reports_missing_file() {
    let err = EditorConfig::load("/definitely/not/here/tessel.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn window_must_exceed_query() {
    let mut config = EditorConfig::default();
    config.triggers.mention.max_query = 40;
    // Validation runs on parse; a hand-built config with a pattern that still
    // compiles is accepted by the session.
    let session = EditorSession::new(
        EditorId::new("main"),
        true,
        &Delta::new().insert("\n"),
        Store::new(),
        std::rc::Rc::new(config),
    );
    assert!(session.is_ok());

    let err = EditorConfig::from_toml_str("[triggers.mention]\nmax_query = 40").unwrap_err();
    assert!(matches!(err, ConfigError::TriggerWindow { window: 32, max_query: 40, .. }));
}
