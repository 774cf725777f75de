mod common;

use common::{attrs, image, link, session};
use serde_json::json;
use tessel_editor_core::{AttributeMap, Delta, Range, SmolStr, Source, Store};

fn by(author: &str) -> AttributeMap {
    attrs(json!({ "author": author }))
}

fn document() -> Delta {
    Delta::new()
        .insert("Title\n")
        .insert_with("hi", by("ann"))
        .insert("\n")
        .insert_embed(link("figma"), by("bob"))
        .insert_embed(link("youtube"), by("bob"))
        .insert_embed(image("x.png"), attrs(json!({"author": "bob", "omitAuthorship": true})))
        .insert("tail\n")
}

fn authors(labels: &[tessel_editor_core::AuthorLabel]) -> Vec<(usize, &str)> {
    labels.iter().map(|l| (l.line_index, l.author.as_str())).collect()
}

#[test]
fn omitted_services_never_get_labels() {
    let store = Store::new();
    let mut main = session("main", document(), &store);
    main.mark_loaded();
    main.tick(0.0);

    let labels = main.author_labels();
    assert_eq!(authors(&labels), vec![(1, "ann"), (3, "bob")]);
    assert_eq!(labels[0].top, 26.0);
}

#[test]
fn local_typing_is_attributed_after_the_quiet_period() {
    let store = Store::new();
    let mut main = session("main", document(), &store);
    main.set_author(Some(SmolStr::new("cat")));
    main.mark_loaded();
    main.tick(0.0);

    main.set_selection(Some(Range::caret(8)), Source::User);
    main.type_text("zzz");
    let run = main.editor().get_contents_range(8, 3);
    assert_eq!(run, Delta::new().insert_with("zzz", by("cat")));

    main.tick(50.0);
    assert_eq!(authors(&main.author_labels())[0], (1, "ann"));
    main.tick(100.0);
    assert_eq!(authors(&main.author_labels())[0], (1, "cat"));
}

#[test]
fn nothing_is_labelled_before_load() {
    let store = Store::new();
    let mut main = session("main", document(), &store);
    main.set_selection(Some(Range::caret(8)), Source::User);
    main.type_text("zzz");
    main.tick(500.0);
    assert!(main.author_labels().is_empty());
    assert!(store.get_state().author_labels.is_empty());
}
