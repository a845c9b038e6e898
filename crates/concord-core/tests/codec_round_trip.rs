use concord_core::codec;
use concord_core::document::{ChangePack, Checkpoint, Document, DocumentKey};
use concord_core::json::{Element, Value};
use concord_core::operation::Operation;
use concord_core::time::ActorId;

#[test]
fn change_pack_survives_the_wire() {
    let mut doc = new_doc(1);
    doc.update("everything", |root| {
        root.set("null", Value::Null);
        root.set("bool", true);
        root.set("int", -5);
        root.set("long", 1i64 << 33);
        root.set("double", 0.5f64);
        root.set("string", "héllo");
        root.set("bytes", vec![0u8, 255]);
        root.set("date", Value::Date(1_600_000_000));
        let mut list = root.set_new_array("list");
        list.add(1);
        list.add(2);
    });

    let pack = doc.create_change_pack();
    let bytes = codec::encode_change_pack(&pack).unwrap();
    let decoded = codec::decode_change_pack(&bytes).unwrap();

    assert_eq!(decoded.document_key(), pack.document_key());
    assert_eq!(decoded.checkpoint(), pack.checkpoint());
    assert_eq!(decoded.changes().len(), pack.changes().len());
    let change = &decoded.changes()[0];
    assert_eq!(change.id(), pack.changes()[0].id());
    assert_eq!(change.operations().len(), pack.changes()[0].operations().len());
    for (decoded_op, original_op) in change
        .operations()
        .iter()
        .zip(pack.changes()[0].operations())
    {
        assert_eq!(decoded_op.executed_at(), original_op.executed_at());
        assert_eq!(decoded_op.parent_created_at(), original_op.parent_created_at());
    }

    // With deterministic payloads (no per-actor maps), the encoding itself
    // round-trips bitwise.
    let reencoded = codec::encode_change_pack(&decoded).unwrap();
    assert_eq!(reencoded, bytes);
}

#[test]
fn decoded_changes_rebuild_the_same_state() {
    let mut doc = new_doc(1);
    doc.update("init", |root| {
        root.set("k", 1);
        let mut text = root.set_new_text("t");
        text.edit(0, 0, "hello");
    });
    doc.update("edit", |root| {
        if let Some(mut text) = root.text("t") {
            text.edit(0, 5, "bye");
        }
    });

    let pack = doc.create_change_pack();
    let bytes = codec::encode_change_pack(&pack).unwrap();
    let decoded = codec::decode_change_pack(&bytes).unwrap();

    // Edit operations carry their observation map intact: the first edit
    // deleted nothing, the second covered the first one's node.
    let edits: Vec<_> = decoded
        .changes()
        .iter()
        .flat_map(|c| c.operations())
        .filter_map(|op| match op {
            Operation::Edit(edit) => Some(edit),
            _ => None,
        })
        .collect();
    assert_eq!(edits.len(), 2);
    assert!(edits[0].created_at_map_by_actor().is_empty());
    assert_eq!(edits[1].created_at_map_by_actor().len(), 1);

    let mut replica = new_doc(2);
    replica.apply_change_pack(&decoded);
    assert_eq!(replica.marshal(), doc.marshal());
}

#[test]
fn snapshot_round_trips_bitwise() {
    let mut doc = new_doc(1);
    doc.update("init", |root| {
        root.set("title", "snapshot");
        root.set("date", Value::Date(1_500_000_000));
        let mut list = root.set_new_array("list");
        list.add(1);
        list.add("two");
        let mut nested = root.set_new_object("nested");
        nested.set("flag", true);
        let mut text = root.set_new_text("body");
        text.edit(0, 0, "abcdef");
        text.edit(2, 4, "XY");
    });
    doc.update("prune", |root| {
        root.remove("title");
        if let Some(mut list) = root.array("list") {
            list.remove(0);
        }
    });
    doc.update("retitle", |root| root.set("title", "final"));

    let bytes = codec::object_to_bytes(doc.root()).unwrap();
    let decoded = codec::object_from_bytes(&bytes).unwrap();
    assert_eq!(decoded.marshal(), doc.marshal());

    let reencoded = codec::object_to_bytes(&decoded).unwrap();
    assert_eq!(reencoded, bytes);

    // Tombstoned members travel with the snapshot; only the displaced
    // first "title" value, unreachable from the root, is compacted.
    assert_eq!(decoded.len(), doc.root().len() - 1);

    let list_ticket = decoded.root_object().get("list").unwrap();
    let Some(Element::Array(list)) = decoded.element(list_ticket) else {
        panic!("list must decode as an array");
    };
    assert_eq!(list.nodes().len(), 2);
    assert_eq!(list.len(), 1);

    let body_ticket = decoded.root_object().get("body").unwrap();
    let (Some(Element::Text(decoded_body)), Some(Element::Text(original_body))) =
        (decoded.element(body_ticket), doc.root().element(body_ticket))
    else {
        panic!("body must decode as text");
    };
    assert_eq!(decoded_body.nodes().len(), original_body.nodes().len());
}

#[test]
fn tombstoned_anchors_survive_snapshots() {
    // Replica B anchors an insert on an element that replica A deletes
    // before the snapshot is taken. The insert is sequenced after the
    // snapshot, so a replica loading the snapshot must resolve the anchor
    // exactly like one that replayed every change.
    let mut a = new_doc(1);
    a.update("init", |root| {
        let mut list = root.set_new_array("list");
        list.add("x");
        list.add("y");
    });
    let base = pending_of(&a);

    let mut b = new_doc(2);
    b.apply_change_pack(&base);
    b.update("append z", |root| {
        if let Some(mut list) = root.array("list") {
            // Anchored on "y", which A is about to delete.
            list.add("z");
        }
    });
    let late = pending_of(&b);

    a.update("drop y", |root| {
        if let Some(mut list) = root.array("list") {
            list.remove(1);
        }
    });
    let bytes = codec::object_to_bytes(a.root()).unwrap();

    // Full replay path.
    a.apply_change_pack(&late);
    assert_eq!(a.marshal(), r#"{"list":["x","z"]}"#);

    // Snapshot path.
    let mut restored = new_doc(3);
    restored.apply_snapshot(3, &bytes).unwrap();
    restored.apply_change_pack(&late);
    assert_eq!(restored.marshal(), a.marshal());
}

#[test]
fn snapshot_decoding_rejects_garbage() {
    assert!(codec::object_from_bytes(&[]).is_err());
    assert!(codec::object_from_bytes(&[0xff, 0x01]).is_err());

    let mut doc = new_doc(1);
    doc.update("init", |root| root.set("k", 1));
    let mut bytes = codec::object_to_bytes(doc.root()).unwrap();

    // Trailing bytes are a framing error.
    bytes.push(0);
    assert!(codec::object_from_bytes(&bytes).is_err());

    // A truncated payload is detected.
    bytes.pop();
    bytes.pop();
    assert!(codec::object_from_bytes(&bytes).is_err());
}

#[test]
fn edits_after_a_snapshot_land_correctly() {
    let mut doc = new_doc(1);
    doc.update("init", |root| {
        let mut text = root.set_new_text("t");
        text.edit(0, 0, "hello world");
    });

    let bytes = codec::object_to_bytes(doc.root()).unwrap();
    let mut restored = Document::new(DocumentKey::new("tests", "doc"));
    restored.set_actor(actor(2));
    restored.apply_snapshot(42, &bytes).unwrap();
    assert_eq!(restored.marshal(), doc.marshal());
    assert_eq!(restored.checkpoint().server_seq(), 42);

    restored.update("edit restored", |root| {
        if let Some(mut text) = root.text("t") {
            text.edit(0, 5, "goodbye");
        }
    });
    assert_eq!(restored.marshal(), r#"{"t":"goodbye world"}"#);
}

fn actor(byte: u8) -> ActorId {
    let mut bytes = [0u8; 12];
    bytes[11] = byte;
    ActorId::from_bytes(bytes)
}

/// A pack carrying only the replica's pending changes, with a neutral
/// checkpoint so direct replica-to-replica delivery does not prune the
/// receiver's own pending changes.
fn pending_of(doc: &Document) -> ChangePack {
    let pack = doc.create_change_pack();
    ChangePack::new(
        pack.document_key().clone(),
        Checkpoint::INITIAL,
        pack.changes().to_vec(),
    )
}

fn new_doc(actor_byte: u8) -> Document {
    let mut doc = Document::new(DocumentKey::new("tests", "doc"));
    doc.set_actor(actor(actor_byte));
    doc
}
