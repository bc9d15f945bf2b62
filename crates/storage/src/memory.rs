//! In-process `DocumentStore` backed by a seed vector and a locked table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use findoc_core::Document;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::StorageError;
use crate::traits::DocumentStore;

/// Generator output, fixed at construction.
#[derive(Debug, Default)]
struct SeedSet {
    docs: Vec<Document>,
    index: HashMap<String, usize>,
}

impl SeedSet {
    fn new(docs: Vec<Document>) -> Self {
        let index = docs
            .iter()
            .enumerate()
            .map(|(i, doc)| (doc.id.clone(), i))
            .collect();
        SeedSet { docs, index }
    }

    fn get(&self, id: &str) -> Option<&Document> {
        self.index.get(id).map(|&i| &self.docs[i])
    }

    fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }
}

/// Documents created through the API, kept in creation order.
#[derive(Debug, Default)]
struct DocumentTable {
    order: Vec<String>,
    docs: HashMap<String, Document>,
}

impl DocumentTable {
    fn put(&mut self, doc: Document) {
        if !self.docs.contains_key(&doc.id) {
            self.order.push(doc.id.clone());
        }
        self.docs.insert(doc.id.clone(), doc);
    }

    fn remove(&mut self, id: &str) {
        if self.docs.remove(id).is_some() {
            self.order.retain(|existing| existing != id);
        }
    }

    fn ordered(&self) -> impl Iterator<Item = &Document> + '_ {
        self.order.iter().filter_map(|id| self.docs.get(id))
    }
}

/// Cheap to clone; clones share the same underlying store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    seed: Arc<SeedSet>,
    table: Arc<Mutex<DocumentTable>>,
}

impl InMemoryStore {
    /// Create a store whose read-only population is `seed`.
    pub fn new(seed: Vec<Document>) -> Self {
        InMemoryStore {
            seed: Arc::new(SeedSet::new(seed)),
            table: Arc::new(Mutex::new(DocumentTable::default())),
        }
    }

    pub fn seed_len(&self) -> usize {
        self.seed.docs.len()
    }

    pub fn is_seed(&self, id: &str) -> bool {
        self.seed.contains(id)
    }
}

enum PendingWrite {
    Put(Document),
    Delete(String),
}

/// An open transaction on an [`InMemoryStore`].
///
/// Holds the store lock for its whole lifetime. Writes are buffered and only
/// reach the table on commit; dropping the snapshot discards them.
pub struct MemorySnapshot {
    table: OwnedMutexGuard<DocumentTable>,
    pending: Vec<PendingWrite>,
}

impl MemorySnapshot {
    /// The document as this snapshot sees it: buffered writes first, then
    /// the committed table.
    fn visible(&self, id: &str) -> Option<&Document> {
        for write in self.pending.iter().rev() {
            match write {
                PendingWrite::Put(doc) if doc.id == id => return Some(doc),
                PendingWrite::Delete(deleted) if deleted == id => return None,
                _ => {}
            }
        }
        self.table.docs.get(id)
    }

    fn check_version(&self, id: &str, expected_version: u64) -> Result<(), StorageError> {
        let current = self.visible(id).ok_or_else(|| StorageError::NotFound {
            id: id.to_string(),
        })?;
        if current.version != expected_version {
            return Err(StorageError::ConcurrentConflict {
                id: id.to_string(),
                expected_version,
                actual_version: current.version,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    type Snapshot = MemorySnapshot;

    async fn begin_snapshot(&self) -> Result<MemorySnapshot, StorageError> {
        let table = Arc::clone(&self.table).lock_owned().await;
        Ok(MemorySnapshot {
            table,
            pending: Vec::new(),
        })
    }

    async fn commit_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        let MemorySnapshot { mut table, pending } = snapshot;
        tracing::debug!(writes = pending.len(), "committing snapshot");
        for write in pending {
            match write {
                PendingWrite::Put(doc) => table.put(doc),
                PendingWrite::Delete(id) => table.remove(&id),
            }
        }
        Ok(())
    }

    async fn abort_snapshot(&self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        tracing::debug!(writes = snapshot.pending.len(), "aborting snapshot");
        drop(snapshot);
        Ok(())
    }

    async fn get_document_for_update(
        &self,
        snapshot: &mut MemorySnapshot,
        id: &str,
    ) -> Result<Document, StorageError> {
        if self.seed.contains(id) {
            return Err(StorageError::ReadOnly { id: id.to_string() });
        }
        snapshot
            .visible(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })
    }

    async fn insert_document(
        &self,
        snapshot: &mut MemorySnapshot,
        document: Document,
    ) -> Result<(), StorageError> {
        if self.seed.contains(&document.id) || snapshot.visible(&document.id).is_some() {
            return Err(StorageError::AlreadyExists { id: document.id });
        }
        snapshot.pending.push(PendingWrite::Put(document));
        Ok(())
    }

    async fn update_document(
        &self,
        snapshot: &mut MemorySnapshot,
        document: Document,
        expected_version: u64,
    ) -> Result<u64, StorageError> {
        if self.seed.contains(&document.id) {
            return Err(StorageError::ReadOnly { id: document.id });
        }
        snapshot.check_version(&document.id, expected_version)?;
        let version = document.version;
        snapshot.pending.push(PendingWrite::Put(document));
        Ok(version)
    }

    async fn delete_document(
        &self,
        snapshot: &mut MemorySnapshot,
        id: &str,
        expected_version: u64,
    ) -> Result<(), StorageError> {
        if self.seed.contains(id) {
            return Err(StorageError::ReadOnly { id: id.to_string() });
        }
        snapshot.check_version(id, expected_version)?;
        snapshot.pending.push(PendingWrite::Delete(id.to_string()));
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Document, StorageError> {
        if let Some(doc) = self.seed.get(id) {
            return Ok(doc.clone());
        }
        self.table
            .lock()
            .await
            .docs
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })
    }

    async fn list_documents(&self) -> Result<Vec<Document>, StorageError> {
        let table = self.table.lock().await;
        let mut docs = Vec::with_capacity(self.seed.docs.len() + table.order.len());
        docs.extend(self.seed.docs.iter().cloned());
        docs.extend(table.ordered().cloned());
        Ok(docs)
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
