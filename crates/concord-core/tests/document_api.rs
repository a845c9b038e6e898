use concord_core::document::{Document, DocumentKey};
use concord_core::json::{Element, Value};
use concord_core::time::ActorId;

#[test]
fn update_builds_a_json_tree() {
    let mut doc = new_doc(1);
    doc.update("init", |root| {
        root.set("title", "untitled");
        root.set("count", 7);
        root.set("done", false);
        let mut tags = root.set_new_array("tags");
        tags.add("crdt");
        tags.add("rust");
        let mut meta = root.set_new_object("meta");
        meta.set("version", 3);
    });

    assert_eq!(
        doc.marshal(),
        r#"{"count":7,"done":false,"meta":{"version":3},"tags":["crdt","rust"],"title":"untitled"}"#
    );
    assert!(doc.has_local_changes());

    let pack = doc.create_change_pack();
    assert_eq!(pack.changes().len(), 1);
    assert_eq!(pack.changes()[0].id().client_seq(), 1);
    assert_eq!(pack.changes()[0].operations().len(), 8);
    assert_eq!(pack.checkpoint().client_seq(), 1);
    assert_eq!(pack.checkpoint().server_seq(), 0);
}

#[test]
fn update_without_operations_commits_nothing() {
    let mut doc = new_doc(1);
    doc.update("noop", |_root| {});
    assert!(!doc.has_local_changes());
    assert!(doc.create_change_pack().changes().is_empty());
}

#[test]
fn remove_hides_the_key_but_keeps_the_tombstone() {
    let mut doc = new_doc(1);
    doc.update("init", |root| {
        root.set("keep", 1);
        root.set("drop", 2);
    });
    let registered = doc.root().len();

    doc.update("remove", |root| {
        root.remove("drop");
    });
    assert_eq!(doc.marshal(), r#"{"keep":1}"#);
    // The removed element is retained as a tombstone until snapshot.
    assert_eq!(doc.root().len(), registered);
}

#[test]
fn array_removal_by_visible_index() {
    let mut doc = new_doc(1);
    doc.update("init", |root| {
        let mut list = root.set_new_array("list");
        list.add(1);
        list.add(2);
        list.add(3);
    });
    doc.update("remove middle", |root| {
        if let Some(mut list) = root.array("list") {
            list.remove(1);
        }
    });
    assert_eq!(doc.marshal(), r#"{"list":[1,3]}"#);

    doc.update("remove former index 1", |root| {
        if let Some(mut list) = root.array("list") {
            list.remove(1);
        }
    });
    assert_eq!(doc.marshal(), r#"{"list":[1]}"#);
}

#[test]
fn text_edits_through_the_proxy() {
    let mut doc = new_doc(1);
    doc.update("write", |root| {
        let mut body = root.set_new_text("body");
        body.edit(0, 0, "hello");
        body.edit(5, 5, " world");
    });
    assert_eq!(doc.marshal(), r#"{"body":"hello world"}"#);

    doc.update("rewrite", |root| {
        if let Some(mut body) = root.text("body") {
            body.edit(0, 5, "goodbye");
        }
    });
    assert_eq!(doc.marshal(), r#"{"body":"goodbye world"}"#);
}

#[test]
fn select_publishes_a_range_without_changing_text() {
    let mut doc = new_doc(1);
    doc.update("write", |root| {
        let mut body = root.set_new_text("body");
        body.edit(0, 0, "abc");
        body.select(1, 2);
    });
    assert_eq!(doc.marshal(), r#"{"body":"abc"}"#);

    let body_ticket = doc.root().root_object().get("body").unwrap();
    let Some(Element::Text(text)) = doc.root().element(body_ticket) else {
        panic!("body must be a text element");
    };
    let selection = text.selection(doc.actor()).expect("selection published");
    assert!(selection.from() != selection.to());
}

#[test]
fn primitive_kinds_marshal_faithfully() {
    let mut doc = new_doc(1);
    doc.update("kinds", |root| {
        root.set("null", Value::Null);
        root.set("long", 1i64 << 40);
        root.set("double", 2.5f64);
        root.set("bytes", vec![1u8, 2]);
        root.set("date", Value::Date(1_600_000_000));
    });
    assert_eq!(
        doc.marshal(),
        r#"{"bytes":[1,2],"date":1600000000,"double":2.5,"long":1099511627776,"null":null}"#
    );
}

#[test]
fn cloning_yields_an_independent_deep_copy() {
    let mut doc = new_doc(1);
    doc.update("init", |root| {
        let mut text = root.set_new_text("t");
        text.edit(0, 0, "shared");
        let mut list = root.set_new_array("list");
        list.add(1);
    });

    let copy = doc.clone();
    doc.update("diverge", |root| {
        if let Some(mut text) = root.text("t") {
            text.edit(0, 6, "changed");
        }
        if let Some(mut list) = root.array("list") {
            list.add(2);
        }
    });

    assert_eq!(copy.marshal(), r#"{"list":[1],"t":"shared"}"#);
    assert_eq!(doc.marshal(), r#"{"list":[1,2],"t":"changed"}"#);
}

fn new_doc(actor_byte: u8) -> Document {
    let mut bytes = [0u8; 12];
    bytes[11] = actor_byte;
    let mut doc = Document::new(DocumentKey::new("tests", "doc"));
    doc.set_actor(ActorId::from_bytes(bytes));
    doc
}
