use std::collections::{BTreeMap, HashMap};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::RwLock;

use concord_core::document::{Change, DocumentKey};
use concord_core::time::ActorId;

use super::{
    ClientInfo, ClientStatus, DocId, DocInfo, SnapshotInfo, Storage, StorageError,
};

#[derive(Default)]
struct State {
    clients_by_key: HashMap<String, ClientInfo>,
    client_keys_by_id: HashMap<ActorId, String>,
    docs_by_key: HashMap<String, DocInfo>,
    doc_keys_by_id: HashMap<DocId, String>,
    next_doc_id: u64,
    changes: HashMap<DocId, BTreeMap<u64, Change>>,
    snapshots: HashMap<DocId, BTreeMap<u64, SnapshotInfo>>,
}

/// In-memory storage backend. Enforces the same uniqueness constraints a
/// database would; used by tests and as the reference adapter behavior.
#[derive(Default)]
pub struct MemoryStorage {
    state: RwLock<State>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn find_or_create_client_info(&self, key: &str) -> Result<ClientInfo, StorageError> {
        let mut state = self.state.write().await;
        let now = SystemTime::now();
        if let Some(client) = state.clients_by_key.get_mut(key) {
            client.status = ClientStatus::Activated;
            client.updated_at = now;
            return Ok(client.clone());
        }
        let client = ClientInfo {
            id: ActorId::random(),
            key: key.to_string(),
            status: ClientStatus::Activated,
            checkpoints: HashMap::new(),
            created_at: now,
            updated_at: now,
        };
        state.client_keys_by_id.insert(client.id, key.to_string());
        state.clients_by_key.insert(key.to_string(), client.clone());
        Ok(client)
    }

    async fn find_client_info_by_id(&self, id: ActorId) -> Result<ClientInfo, StorageError> {
        let state = self.state.read().await;
        let key = state
            .client_keys_by_id
            .get(&id)
            .ok_or_else(|| StorageError::ClientNotFound(id.to_string()))?;
        state
            .clients_by_key
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::ClientNotFound(id.to_string()))
    }

    async fn deactivate_client(&self, id: ActorId) -> Result<ClientInfo, StorageError> {
        let mut state = self.state.write().await;
        let key = state
            .client_keys_by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::ClientNotFound(id.to_string()))?;
        let client = state
            .clients_by_key
            .get_mut(&key)
            .ok_or_else(|| StorageError::ClientNotFound(id.to_string()))?;
        client.status = ClientStatus::Deactivated;
        client.updated_at = SystemTime::now();
        Ok(client.clone())
    }

    async fn update_client_info_after_push_pull(
        &self,
        client: &ClientInfo,
        _doc: &DocInfo,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        if !state.clients_by_key.contains_key(&client.key) {
            return Err(StorageError::ClientNotFound(client.key.clone()));
        }
        state
            .clients_by_key
            .insert(client.key.clone(), client.clone());
        Ok(())
    }

    async fn find_or_create_doc_info(
        &self,
        client: &ClientInfo,
        key: &DocumentKey,
        create_if_missing: bool,
    ) -> Result<DocInfo, StorageError> {
        let mut state = self.state.write().await;
        let combined = key.combined();
        let now = SystemTime::now();
        if let Some(doc) = state.docs_by_key.get_mut(&combined) {
            doc.accessed_at = now;
            return Ok(doc.clone());
        }
        if !create_if_missing {
            return Err(StorageError::DocumentNotFound(combined));
        }
        state.next_doc_id += 1;
        let doc = DocInfo {
            id: DocId(state.next_doc_id),
            key: key.clone(),
            owner: client.id,
            server_seq: 0,
            created_at: now,
            accessed_at: now,
        };
        state.doc_keys_by_id.insert(doc.id, combined.clone());
        state.docs_by_key.insert(combined, doc.clone());
        Ok(doc)
    }

    async fn find_doc_info_by_key(&self, key: &DocumentKey) -> Result<DocInfo, StorageError> {
        let state = self.state.read().await;
        state
            .docs_by_key
            .get(&key.combined())
            .cloned()
            .ok_or_else(|| StorageError::DocumentNotFound(key.combined()))
    }

    async fn update_doc_info(&self, doc: &DocInfo) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        let combined = doc.key.combined();
        if !state.docs_by_key.contains_key(&combined) {
            return Err(StorageError::DocumentNotFound(combined));
        }
        state.docs_by_key.insert(combined, doc.clone());
        Ok(())
    }

    async fn append_changes(
        &self,
        doc_id: DocId,
        changes: &[Change],
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        let stored = state.changes.entry(doc_id).or_default();
        for change in changes {
            let server_seq = change.server_seq();
            if let Some(existing) = stored.get(&server_seq) {
                if existing.id() != change.id() {
                    return Err(StorageError::DuplicateServerSeq { doc_id, server_seq });
                }
            }
            stored.insert(server_seq, change.clone());
        }
        Ok(())
    }

    async fn find_changes_between(
        &self,
        doc_id: DocId,
        from: u64,
        to: u64,
    ) -> Result<Vec<Change>, StorageError> {
        let state = self.state.read().await;
        let Some(stored) = state.changes.get(&doc_id) else {
            return Ok(Vec::new());
        };
        Ok(stored.range(from..=to).map(|(_, c)| c.clone()).collect())
    }

    async fn write_snapshot(
        &self,
        doc_id: DocId,
        server_seq: u64,
        snapshot: Vec<u8>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        let info = SnapshotInfo {
            doc_id,
            server_seq,
            snapshot,
            created_at: SystemTime::now(),
        };
        state
            .snapshots
            .entry(doc_id)
            .or_default()
            .insert(server_seq, info);
        Ok(())
    }

    async fn find_last_snapshot(
        &self,
        doc_id: DocId,
    ) -> Result<Option<SnapshotInfo>, StorageError> {
        let state = self.state.read().await;
        Ok(state
            .snapshots
            .get(&doc_id)
            .and_then(|snaps| snaps.iter().next_back())
            .map(|(_, info)| info.clone()))
    }
}
