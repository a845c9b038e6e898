//! The mutable local replica: a document key, a checkpoint, the pending
//! local changes and the element tree.

mod change;
mod change_context;
mod change_id;
mod change_pack;
mod checkpoint;
mod key;
mod proxy;

use crate::codec;
use crate::error::CoreError;
use crate::json::Root;
use crate::time::{ActorId, Ticket};

pub use change::Change;
pub use change_context::ChangeContext;
pub use change_id::ChangeId;
pub use change_pack::ChangePack;
pub use checkpoint::Checkpoint;
pub use key::DocumentKey;
pub use proxy::{ArrayProxy, ObjectProxy, TextProxy};

/// A single-writer document replica.
///
/// All mutations go through [`update`](Document::update); remote changes
/// arrive through [`apply_change_pack`](Document::apply_change_pack) in
/// server-sequence order. Operation apply commutes under the Lamport order,
/// so replicas that observe the same changes converge regardless of
/// interleaving.
#[derive(Debug, Clone)]
pub struct Document {
    key: DocumentKey,
    checkpoint: Checkpoint,
    change_id: ChangeId,
    local_changes: Vec<Change>,
    root: Root,
}

impl Document {
    pub fn new(key: DocumentKey) -> Self {
        Document {
            key,
            checkpoint: Checkpoint::INITIAL,
            change_id: ChangeId::initial(ActorId::INITIAL),
            local_changes: Vec::new(),
            root: Root::new(),
        }
    }

    /// Assigns the actor issued by the server at activation. Must happen
    /// before the first mutation.
    pub fn set_actor(&mut self, actor: ActorId) {
        self.change_id = self.change_id.with_actor(actor);
    }

    pub fn actor(&self) -> ActorId {
        self.change_id.actor()
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    pub fn marshal(&self) -> String {
        self.root.marshal()
    }

    pub fn has_local_changes(&self) -> bool {
        !self.local_changes.is_empty()
    }

    /// Runs a local mutation. The mutator receives a proxy of the root
    /// object; every operation it issues is applied immediately and
    /// buffered. If it issues none, no change is committed.
    pub fn update(&mut self, message: &str, mutator: impl FnOnce(&mut ObjectProxy<'_, '_>)) {
        let next_id = self.change_id.next();
        let mut ctx = ChangeContext::new(next_id, message.to_string(), &mut self.root);
        let mut root_proxy = ObjectProxy::new(&mut ctx, Ticket::INITIAL);
        mutator(&mut root_proxy);
        if let Some(change) = ctx.into_change() {
            self.local_changes.push(change);
            self.change_id = next_id;
        }
    }

    /// The pack this replica would push: pending changes plus its current
    /// progress.
    pub fn create_change_pack(&self) -> ChangePack {
        let changes = self.local_changes.clone();
        let client_seq = changes
            .last()
            .map(|c| c.id().client_seq())
            .unwrap_or_else(|| self.checkpoint.client_seq());
        ChangePack::new(
            self.key.clone(),
            Checkpoint::new(self.checkpoint.server_seq(), client_seq),
            changes,
        )
    }

    /// Applies a pack received from the server: executes the changes in
    /// order, advances the Lamport clock past each, merges the checkpoint
    /// and drops acknowledged local changes.
    pub fn apply_change_pack(&mut self, pack: &ChangePack) {
        for change in pack.changes() {
            self.change_id = self.change_id.sync_lamport(change.id().lamport());
            change.execute(&mut self.root);
        }
        self.checkpoint = self.checkpoint.forward(pack.checkpoint());
        let acked = pack.checkpoint().client_seq();
        self.local_changes
            .retain(|c| c.id().client_seq() > acked);
    }

    /// Replaces the element tree with a decoded snapshot taken at
    /// `server_seq`; later changes are replayed on top by the caller.
    pub fn apply_snapshot(&mut self, server_seq: u64, snapshot: &[u8]) -> Result<(), CoreError> {
        self.root = codec::object_from_bytes(snapshot)?;
        self.checkpoint = self
            .checkpoint
            .forward(Checkpoint::new(server_seq, self.checkpoint.client_seq()));
        Ok(())
    }
}
