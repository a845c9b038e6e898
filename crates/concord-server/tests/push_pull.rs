use std::sync::Arc;

use concord_core::document::{ChangePack, Checkpoint, Document, DocumentKey};
use concord_server::storage::MemoryStorage;
use concord_server::watch::DocEventType;
use concord_server::{Config, ConcordService, ServerError};

#[tokio::test]
async fn first_push_assigns_server_seqs_and_second_client_pulls_them() {
    let service = service(Config::default());
    let key = DocumentKey::new("tests", "s5");

    // Client 1 attaches with one pending change.
    let c1 = service.activate_client("client-1").await.unwrap();
    let mut doc1 = Document::new(key.clone());
    doc1.set_actor(c1);
    doc1.update("init", |root| root.set("k", 1));

    let resp = service
        .attach_document(c1, doc1.create_change_pack())
        .await
        .unwrap();
    assert_eq!(resp.checkpoint(), Checkpoint::new(1, 1));
    assert!(resp.changes().is_empty());
    doc1.apply_change_pack(&resp);
    assert!(!doc1.has_local_changes());

    // Client 2 attaches with nothing pending and receives the backlog.
    let c2 = service.activate_client("client-2").await.unwrap();
    let mut doc2 = Document::new(key.clone());
    doc2.set_actor(c2);

    let resp = service
        .attach_document(c2, doc2.create_change_pack())
        .await
        .unwrap();
    assert_eq!(resp.changes().len(), 1);
    assert_eq!(resp.checkpoint(), Checkpoint::new(1, 0));
    doc2.apply_change_pack(&resp);
    assert_eq!(doc2.marshal(), doc1.marshal());
}

#[tokio::test]
async fn changes_flow_both_ways_without_echoes() {
    let service = service(Config::default());
    let key = DocumentKey::new("tests", "both-ways");

    let (c1, mut doc1) = attached_client(&service, &key, "client-1").await;
    let (c2, mut doc2) = attached_client(&service, &key, "client-2").await;

    doc1.update("one", |root| root.set("from1", 1));
    let resp = service
        .push_pull(c1, doc1.create_change_pack())
        .await
        .unwrap();
    doc1.apply_change_pack(&resp);

    doc2.update("two", |root| root.set("from2", 2));
    let resp = service
        .push_pull(c2, doc2.create_change_pack())
        .await
        .unwrap();
    // The pull returns client 1's change but not client 2's own echo.
    assert_eq!(resp.changes().len(), 1);
    doc2.apply_change_pack(&resp);

    let resp = service
        .push_pull(c1, doc1.create_change_pack())
        .await
        .unwrap();
    assert_eq!(resp.changes().len(), 1);
    doc1.apply_change_pack(&resp);

    assert_eq!(doc1.marshal(), doc2.marshal());
    assert_eq!(doc1.marshal(), r#"{"from1":1,"from2":2}"#);
}

#[tokio::test]
async fn pushing_the_same_pack_twice_is_idempotent() {
    let service = service(Config::default());
    let key = DocumentKey::new("tests", "replay");

    let (c1, mut doc1) = attached_client(&service, &key, "client-1").await;
    doc1.update("one", |root| root.set("k", 1));
    let pack = doc1.create_change_pack();

    let first = service.push_pull(c1, pack.clone()).await.unwrap();
    assert_eq!(first.checkpoint().server_seq(), 1);

    // A retry of the same push (same change ids, same claimed checkpoint)
    // re-upserts the same rows and allocates nothing new for them.
    let second = service.push_pull(c1, pack).await.unwrap();
    assert_eq!(second.checkpoint(), Checkpoint::new(1, 1));

    let loaded = service.load_document(&key).await.unwrap();
    assert_eq!(loaded.marshal(), r#"{"k":1}"#);
}

#[tokio::test]
async fn checkpoint_underflow_is_a_conflict() {
    let service = service(Config::default());
    let key = DocumentKey::new("tests", "conflict");

    let (c1, _doc1) = attached_client(&service, &key, "client-1").await;
    let bogus = ChangePack::new(key.clone(), Checkpoint::new(99, 0), Vec::new());
    let err = service.push_pull(c1, bogus).await.unwrap_err();
    assert!(matches!(err, ServerError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn foreign_changes_are_rejected_at_push() {
    let service = service(Config::default());
    let key = DocumentKey::new("tests", "foreign");

    let (c1, _) = attached_client(&service, &key, "client-1").await;

    // A pack whose changes claim another actor.
    let mut other = Document::new(key.clone());
    other.set_actor(concord_core::time::ActorId::random());
    other.update("forged", |root| root.set("k", 1));
    let err = service
        .push_pull(c1, other.create_change_pack())
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::InvalidChangePack(_)), "got {err:?}");
}

#[tokio::test]
async fn deactivated_clients_cannot_sync() {
    let service = service(Config::default());
    let key = DocumentKey::new("tests", "inactive");

    let (c1, doc1) = attached_client(&service, &key, "client-1").await;
    service.deactivate_client(c1).await.unwrap();

    let err = service
        .push_pull(c1, doc1.create_change_pack())
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::ClientNotActive(_)), "got {err:?}");

    // Re-activation under the same key restores the same actor id.
    let again = service.activate_client("client-1").await.unwrap();
    assert_eq!(again, c1);
}

#[tokio::test]
async fn push_pull_requires_attachment() {
    let service = service(Config::default());
    let key = DocumentKey::new("tests", "unattached");

    let (_c1, _doc1) = attached_client(&service, &key, "client-1").await;

    let c2 = service.activate_client("client-2").await.unwrap();
    let doc2 = {
        let mut d = Document::new(key.clone());
        d.set_actor(c2);
        d
    };
    let err = service
        .push_pull(c2, doc2.create_change_pack())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ServerError::DocumentNotAttached { .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn detach_then_push_is_rejected() {
    let service = service(Config::default());
    let key = DocumentKey::new("tests", "detach");

    let (c1, mut doc1) = attached_client(&service, &key, "client-1").await;
    doc1.update("one", |root| root.set("k", 1));
    let resp = service
        .detach_document(c1, doc1.create_change_pack())
        .await
        .unwrap();
    doc1.apply_change_pack(&resp);

    let err = service
        .push_pull(c1, doc1.create_change_pack())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ServerError::DocumentNotAttached { .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn snapshot_plus_trailing_changes_equals_full_replay() {
    let mut config = Config::default();
    config.snapshot_threshold = 5;
    let service = service(config);
    let key = DocumentKey::new("tests", "s6");

    let (c1, mut doc1) = attached_client(&service, &key, "client-1").await;
    for i in 0..8 {
        doc1.update("tick", |root| {
            root.set("i", i);
            if let Some(mut text) = root.text("log") {
                let end = text.len();
                text.edit(end, end, "x");
            } else {
                let mut text = root.set_new_text("log");
                text.edit(0, 0, "x");
            }
        });
        let resp = service
            .push_pull(c1, doc1.create_change_pack())
            .await
            .unwrap();
        doc1.apply_change_pack(&resp);
    }

    // The threshold was crossed, so a snapshot exists and loading goes
    // through it; the result must match the replica that replayed
    // everything from origin.
    let loaded = service.load_document(&key).await.unwrap();
    assert_eq!(loaded.marshal(), doc1.marshal());

    // A fresh client attaching now must converge too.
    let (_, doc2) = attached_client(&service, &key, "client-2").await;
    assert_eq!(doc2.marshal(), doc1.marshal());
}

#[tokio::test]
async fn watchers_see_peer_and_change_events() {
    let service = service(Config::default());
    let key = DocumentKey::new("tests", "watch");

    let (c1, _doc1) = attached_client(&service, &key, "client-1").await;
    let c2 = service.activate_client("client-2").await.unwrap();

    let mut rx1 = service
        .watch_documents(c1, std::slice::from_ref(&key))
        .await
        .unwrap();
    let _rx2 = service
        .watch_documents(c2, std::slice::from_ref(&key))
        .await
        .unwrap();

    let event = rx1.try_recv().unwrap();
    assert_eq!(event.event_type, DocEventType::DocumentsWatched);
    assert_eq!(event.publisher, c2);

    // A push by client 2 notifies client 1.
    let mut doc2 = Document::new(key.clone());
    doc2.set_actor(c2);
    doc2.update("hello", |root| root.set("k", 1));
    service
        .attach_document(c2, doc2.create_change_pack())
        .await
        .unwrap();

    let event = rx1.try_recv().unwrap();
    assert_eq!(event.event_type, DocEventType::DocumentsChanged);
    assert_eq!(event.publisher, c2);
    assert_eq!(event.document_key, key);

    service
        .unwatch_documents(c2, std::slice::from_ref(&key))
        .await
        .unwrap();
    let event = rx1.try_recv().unwrap();
    assert_eq!(event.event_type, DocEventType::DocumentsUnwatched);
}

fn service(config: Config) -> ConcordService {
    ConcordService::new(Arc::new(MemoryStorage::new()), config)
}

async fn attached_client(
    service: &ConcordService,
    key: &DocumentKey,
    client_key: &str,
) -> (concord_core::time::ActorId, Document) {
    let actor = service.activate_client(client_key).await.unwrap();
    let mut doc = Document::new(key.clone());
    doc.set_actor(actor);
    let resp = service
        .attach_document(actor, doc.create_change_pack())
        .await
        .unwrap();
    doc.apply_change_pack(&resp);
    (actor, doc)
}

