//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::rc::Rc;

use serde_json::json;
use tessel_editor_core::{
    AttributeMap, Delta, EditorConfig, EditorId, EditorSession, Embed, NodeId, SequentialIds, Store,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A session named `id` with predictable line ids. Only `"main"` is the
/// main editor.
pub fn session(id: &str, contents: Delta, store: &Store) -> EditorSession {
    session_with(id, contents, store, EditorConfig::default())
}

pub fn session_with(id: &str, contents: Delta, store: &Store, config: EditorConfig) -> EditorSession {
    init_tracing();
    EditorSession::new(EditorId::new(id), id == "main", &contents, store.clone(), Rc::new(config))
        .expect("valid config")
        .with_id_source(SequentialIds::new(id))
}

pub fn attrs(value: serde_json::Value) -> AttributeMap {
    serde_json::from_value(value).expect("attribute map")
}

pub fn image(src: &str) -> Embed {
    Embed::new("image", json!({ "src": src }))
}

pub fn link(service: &str) -> Embed {
    Embed::new("link", json!({ "url": format!("https://{service}.example/x"), "service": service }))
}

/// Every line node in document order.
pub fn nodes(session: &EditorSession) -> Vec<NodeId> {
    session.editor().scroll().lines().map(|line| line.node).collect()
}

/// Pointer y that lands inside the box of `node`.
pub fn client_y_of(session: &EditorSession, node: NodeId) -> f64 {
    let line_box = session
        .editor()
        .scroll()
        .line_box(node)
        .expect("node is laid out");
    line_box.offset_top + 1.0 + session.config().drag.navbar_height - session.editor().scroll_top()
}

pub fn text(session: &EditorSession) -> String {
    let editor = session.editor();
    editor.get_text(0, editor.length())
}
