//! Fan-out of document events to watching clients.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use concord_core::document::DocumentKey;
use concord_core::time::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocEventType {
    /// Another client pushed changes to a watched document.
    DocumentsChanged,
    /// Another client started watching a shared document.
    DocumentsWatched,
    /// Another client stopped watching a shared document.
    DocumentsUnwatched,
}

#[derive(Debug, Clone)]
pub struct DocEvent {
    pub event_type: DocEventType,
    pub document_key: DocumentKey,
    pub publisher: ActorId,
}

type Subscribers = HashMap<ActorId, mpsc::UnboundedSender<DocEvent>>;

/// Registry of watchers per document key. Senders whose receivers are gone
/// are pruned on the next publish to that key.
#[derive(Default)]
pub struct WatchHub {
    inner: Mutex<HashMap<String, Subscribers>>,
}

impl WatchHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `actor` as a watcher of `keys` and returns its event
    /// stream. Peers already watching any of the keys are notified.
    pub fn subscribe(
        &self,
        actor: ActorId,
        keys: &[DocumentKey],
    ) -> mpsc::UnboundedReceiver<DocEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        for key in keys {
            let subs = inner.entry(key.combined()).or_default();
            for (peer, sender) in subs.iter() {
                if *peer != actor {
                    let _ = sender.send(DocEvent {
                        event_type: DocEventType::DocumentsWatched,
                        document_key: key.clone(),
                        publisher: actor,
                    });
                }
            }
            subs.insert(actor, tx.clone());
        }
        rx
    }

    /// Unregisters `actor` from `keys`, notifying remaining peers.
    pub fn unsubscribe(&self, actor: ActorId, keys: &[DocumentKey]) {
        let mut inner = self.inner.lock();
        for key in keys {
            let Some(subs) = inner.get_mut(&key.combined()) else {
                continue;
            };
            if subs.remove(&actor).is_none() {
                continue;
            }
            for sender in subs.values() {
                let _ = sender.send(DocEvent {
                    event_type: DocEventType::DocumentsUnwatched,
                    document_key: key.clone(),
                    publisher: actor,
                });
            }
            if subs.is_empty() {
                inner.remove(&key.combined());
            }
        }
    }

    /// Notifies every watcher of `key` except the publisher that the
    /// document changed.
    pub fn publish_changed(&self, publisher: ActorId, key: &DocumentKey) {
        let mut inner = self.inner.lock();
        let Some(subs) = inner.get_mut(&key.combined()) else {
            return;
        };
        subs.retain(|peer, sender| {
            if *peer == publisher {
                return true;
            }
            sender
                .send(DocEvent {
                    event_type: DocEventType::DocumentsChanged,
                    document_key: key.clone(),
                    publisher,
                })
                .is_ok()
        });
        if subs.is_empty() {
            inner.remove(&key.combined());
        }
    }
}
