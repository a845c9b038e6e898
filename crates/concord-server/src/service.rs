use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use concord_core::codec;
use concord_core::document::{Change, ChangePack, Checkpoint, Document, DocumentKey};
use concord_core::time::ActorId;

use crate::config::Config;
use crate::error::{ServerError, ServerResult};
use crate::lock::KeyLocker;
use crate::storage::{ClientInfo, ClientStatus, DocInfo, Storage};
use crate::watch::{DocEvent, WatchHub};

/// How a push-pull affects the client's attachment to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncMode {
    Attach,
    Detach,
    PushPull,
}

/// The transport-agnostic RPC service.
///
/// Every method corresponds to one logical RPC. Handlers run concurrently;
/// the only mutual exclusion is the per-document lock held for the whole
/// push-pull critical section.
pub struct ConcordService {
    storage: Arc<dyn Storage>,
    locker: KeyLocker,
    hub: WatchHub,
    config: Config,
}

impl ConcordService {
    pub fn new(storage: Arc<dyn Storage>, config: Config) -> Self {
        ConcordService {
            storage,
            locker: KeyLocker::new(),
            hub: WatchHub::new(),
            config,
        }
    }

    /// Issues (or re-issues) the actor id for a client key.
    pub async fn activate_client(&self, client_key: &str) -> ServerResult<ActorId> {
        let client = self.storage.find_or_create_client_info(client_key).await?;
        info!(client_key, client_id = %client.id, "client activated");
        Ok(client.id)
    }

    pub async fn deactivate_client(&self, client_id: ActorId) -> ServerResult<()> {
        self.storage.deactivate_client(client_id).await?;
        info!(client_id = %client_id, "client deactivated");
        Ok(())
    }

    /// Attaches the client to the document, creating it if needed, and runs
    /// a push-pull.
    pub async fn attach_document(
        &self,
        client_id: ActorId,
        pack: ChangePack,
    ) -> ServerResult<ChangePack> {
        self.push_pull_internal(client_id, pack, SyncMode::Attach).await
    }

    /// Runs a final push-pull and drops the client's attachment.
    pub async fn detach_document(
        &self,
        client_id: ActorId,
        pack: ChangePack,
    ) -> ServerResult<ChangePack> {
        self.push_pull_internal(client_id, pack, SyncMode::Detach).await
    }

    /// Exchanges changes: persists what the client pushed and returns what
    /// it has not yet observed.
    pub async fn push_pull(
        &self,
        client_id: ActorId,
        pack: ChangePack,
    ) -> ServerResult<ChangePack> {
        self.push_pull_internal(client_id, pack, SyncMode::PushPull).await
    }

    /// Subscribes the client to change events of the given documents.
    pub async fn watch_documents(
        &self,
        client_id: ActorId,
        keys: &[DocumentKey],
    ) -> ServerResult<mpsc::UnboundedReceiver<DocEvent>> {
        self.active_client(client_id).await?;
        Ok(self.hub.subscribe(client_id, keys))
    }

    pub async fn unwatch_documents(
        &self,
        client_id: ActorId,
        keys: &[DocumentKey],
    ) -> ServerResult<()> {
        self.active_client(client_id).await?;
        self.hub.unsubscribe(client_id, keys);
        Ok(())
    }

    /// Materialises the current state of a document from the newest
    /// snapshot plus trailing changes.
    pub async fn load_document(&self, key: &DocumentKey) -> ServerResult<Document> {
        let doc_info = self.storage.find_doc_info_by_key(key).await?;
        self.build_document(&doc_info).await
    }

    async fn push_pull_internal(
        &self,
        client_id: ActorId,
        pack: ChangePack,
        mode: SyncMode,
    ) -> ServerResult<ChangePack> {
        let mut client = self.active_client(client_id).await?;
        validate_pack(client_id, &pack)?;

        let key = pack.document_key().clone();
        let lock = self.locker.lock_for(&key.combined());
        let _guard = lock.lock().await;

        let mut doc_info = self
            .storage
            .find_or_create_doc_info(&client, &key, mode == SyncMode::Attach)
            .await?;

        if mode == SyncMode::PushPull && !client.is_attached(doc_info.id) {
            return Err(ServerError::DocumentNotAttached {
                client: client_id,
                document: key.combined(),
            });
        }

        if pack.checkpoint().server_seq() > doc_info.server_seq {
            return Err(ServerError::Conflict(format!(
                "checkpoint claims server_seq {} but document {} is at {}",
                pack.checkpoint().server_seq(),
                key,
                doc_info.server_seq,
            )));
        }

        // Push: assign sequences and persist. Persistence is the atomic
        // step; nothing before it is visible to other clients. Changes the
        // server already acknowledged for this client are skipped, so a
        // retried push allocates no new sequences.
        let acked_client_seq = client.checkpoint(doc_info.id).client_seq();
        let mut pushed: Vec<Change> = pack
            .changes()
            .iter()
            .filter(|c| c.id().client_seq() > acked_client_seq)
            .cloned()
            .collect();
        for change in &mut pushed {
            doc_info.server_seq += 1;
            change.set_server_seq(doc_info.server_seq);
        }
        self.storage.append_changes(doc_info.id, &pushed).await?;
        self.storage.update_doc_info(&doc_info).await?;
        debug!(
            document = %key,
            pushed = pushed.len(),
            server_seq = doc_info.server_seq,
            "pushed changes"
        );

        // Pull: everything past the client's checkpoint, minus its own
        // echoes.
        let from = pack.checkpoint().server_seq() + 1;
        let pulled = if from <= doc_info.server_seq {
            self.storage
                .find_changes_between(doc_info.id, from, doc_info.server_seq)
                .await?
        } else {
            Vec::new()
        };
        let response_changes: Vec<Change> = pulled
            .into_iter()
            .filter(|c| c.id().actor() != client_id)
            .collect();

        let pushed_client_seq = pushed
            .iter()
            .map(|c| c.id().client_seq())
            .max()
            .unwrap_or(0);
        let response_checkpoint = Checkpoint::new(
            doc_info.server_seq,
            pack.checkpoint().client_seq().max(pushed_client_seq),
        );

        match mode {
            SyncMode::Detach => {
                client.checkpoints.remove(&doc_info.id);
            }
            _ => {
                client.checkpoints.insert(doc_info.id, response_checkpoint);
            }
        }
        client.updated_at = std::time::SystemTime::now();
        self.storage
            .update_client_info_after_push_pull(&client, &doc_info)
            .await?;

        if !pushed.is_empty() {
            self.hub.publish_changed(client_id, &key);
            if let Err(err) = self.maybe_snapshot(&doc_info).await {
                // Snapshotting is an optimisation; the push-pull itself
                // already succeeded.
                warn!(document = %key, error = %err, "snapshot skipped");
            }
        }

        debug!(
            document = %key,
            pulled = response_changes.len(),
            checkpoint = %response_checkpoint,
            "pull response"
        );
        Ok(ChangePack::new(key, response_checkpoint, response_changes))
    }

    async fn active_client(&self, client_id: ActorId) -> ServerResult<ClientInfo> {
        let client = self.storage.find_client_info_by_id(client_id).await?;
        if client.status != ClientStatus::Activated {
            return Err(ServerError::ClientNotActive(client_id));
        }
        Ok(client)
    }

    async fn maybe_snapshot(&self, doc_info: &DocInfo) -> ServerResult<()> {
        let last = self.storage.find_last_snapshot(doc_info.id).await?;
        let since = last.as_ref().map(|s| s.server_seq).unwrap_or(0);
        if doc_info.server_seq - since < self.config.snapshot_threshold {
            return Ok(());
        }
        let doc = self.build_document(doc_info).await?;
        let bytes = codec::object_to_bytes(doc.root())?;
        self.storage
            .write_snapshot(doc_info.id, doc_info.server_seq, bytes)
            .await?;
        info!(
            document = %doc_info.key,
            server_seq = doc_info.server_seq,
            "snapshot written"
        );
        Ok(())
    }

    async fn build_document(&self, doc_info: &DocInfo) -> ServerResult<Document> {
        let mut doc = Document::new(doc_info.key.clone());
        let mut from = 1;
        if let Some(snapshot) = self.storage.find_last_snapshot(doc_info.id).await? {
            doc.apply_snapshot(snapshot.server_seq, &snapshot.snapshot)?;
            from = snapshot.server_seq + 1;
        }
        let changes = self
            .storage
            .find_changes_between(doc_info.id, from, doc_info.server_seq)
            .await?;
        let pack = ChangePack::new(
            doc_info.key.clone(),
            Checkpoint::new(doc_info.server_seq, 0),
            changes,
        );
        doc.apply_change_pack(&pack);
        Ok(doc)
    }
}

/// Structural validation at the push boundary: a client may only push its
/// own well-formed changes. Apply-time problems inside a change degrade to
/// silent drops; malformed framing is rejected here so clients notice.
fn validate_pack(client_id: ActorId, pack: &ChangePack) -> ServerResult<()> {
    for change in pack.changes() {
        if change.id().actor() != client_id {
            return Err(ServerError::InvalidChangePack(format!(
                "change {} was authored by {}, pushed by {}",
                change.id().client_seq(),
                change.id().actor(),
                client_id,
            )));
        }
        if !change.is_well_formed() {
            return Err(ServerError::InvalidChangePack(format!(
                "change {} is malformed",
                change.id().client_seq(),
            )));
        }
    }
    Ok(())
}
