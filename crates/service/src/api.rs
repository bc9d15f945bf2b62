//! The documents API: simulated transport, then validation, then store work.
//!
//! Every operation first passes through the [`NetworkSimulator`]; that await
//! is the only suspension point before logic begins. Mutations then run
//! inside one store snapshot: read for update, apply the workflow step, write
//! back against the version that was read, commit. Any error aborts the
//! snapshot, so a failed call leaves the store untouched.

use std::sync::atomic::{AtomicUsize, Ordering};

use findoc_core::{
    generate_with, paginate, Document, DocumentInput, DocumentPatch, DocumentStatus, LineItem,
    LineItemInput, Page, Query, TransitionTable, ValidationError, WorkflowEngine,
};
use findoc_storage::{DocumentStore, InMemoryStore};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::simulator::NetworkSimulator;

/// Arguments of a list call. Absent fields mean no filter, no sort, the
/// configured default limit and the first page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

impl ListRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// One store, one workflow engine, one simulator.
#[derive(Debug)]
pub struct FinanceApi<S: DocumentStore = InMemoryStore> {
    store: S,
    engine: WorkflowEngine,
    simulator: NetworkSimulator,
    default_limit: i64,
    next_number: AtomicUsize,
}

impl FinanceApi<InMemoryStore> {
    /// Build the in-memory API described by `config`: the seed set is
    /// generated once, here, with the configured workflow table.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let engine = WorkflowEngine::for_model(config.workflow.model);
        let seed = generate_with(config.dataset.count, config.dataset.seed, &engine);
        tracing::debug!(
            count = seed.len(),
            seed = config.dataset.seed,
            model = %config.workflow.model,
            "seeded document store"
        );
        let store = InMemoryStore::new(seed);
        FinanceApi::new(store, engine, NetworkSimulator::new(&config.network))
            .with_default_limit(config.pagination.default_limit)
            .with_first_number(config.dataset.count + 1)
    }
}

impl<S: DocumentStore> FinanceApi<S> {
    pub fn new(store: S, engine: WorkflowEngine, simulator: NetworkSimulator) -> Self {
        FinanceApi {
            store,
            engine,
            simulator,
            default_limit: findoc_core::DEFAULT_LIMIT,
            next_number: AtomicUsize::new(1),
        }
    }

    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    /// Sequence number used for the next created document's number.
    pub fn with_first_number(self, first: usize) -> Self {
        self.next_number.store(first, Ordering::Relaxed);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn transition_table(&self) -> &TransitionTable {
        self.engine.table()
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// A fresh synthetic dataset using this API's workflow table. Does not
    /// touch the store.
    pub async fn generate_documents(
        &self,
        count: usize,
        seed: u64,
    ) -> Result<Vec<Document>, ApiError> {
        self.simulator.simulate().await?;
        Ok(generate_with(count, seed, &self.engine))
    }

    /// Filter, sort and paginate the live collection.
    ///
    /// The filter, sort and cursor are all validated before any document is
    /// read.
    pub async fn list_documents(&self, request: &ListRequest) -> Result<Page<Document>, ApiError> {
        self.simulator.simulate().await?;

        let query = Query::parse(request.filter.as_deref(), request.sort.as_deref())?;
        if let Some(cursor) = request.cursor.as_deref() {
            findoc_core::decode_cursor(cursor)?;
        }
        let limit = request.limit.unwrap_or(self.default_limit);

        let docs = query.apply(self.store.list_documents().await?);
        let matched = docs.len();
        let page = paginate(docs, limit, request.cursor.as_deref())?;
        tracing::debug!(
            filter = request.filter.as_deref().unwrap_or(""),
            sort = request.sort.as_deref().unwrap_or(""),
            limit,
            matched,
            returned = page.data.len(),
            has_more = page.has_more,
            "listed documents"
        );
        Ok(page)
    }

    pub async fn get_document(&self, id: &str) -> Result<Document, ApiError> {
        self.simulator.simulate().await?;
        Ok(self.store.get_document(id).await?)
    }

    /// Legal next statuses for the document's current status.
    pub async fn legal_transitions(&self, id: &str) -> Result<Vec<DocumentStatus>, ApiError> {
        self.simulator.simulate().await?;
        let doc = self.store.get_document(id).await?;
        Ok(self.engine.table().legal_next(doc.status).to_vec())
    }

    // ── Creation and deletion ─────────────────────────────────────────────────

    pub async fn create_document(&self, input: DocumentInput) -> Result<Document, ApiError> {
        self.simulator.simulate().await?;

        let now = OffsetDateTime::now_utc();
        let id = format!("doc_{}", Uuid::new_v4().simple());
        let number = format!(
            "{}-{}-{:05}",
            input.doc_type.number_prefix(),
            now.year(),
            self.next_number.fetch_add(1, Ordering::Relaxed)
        );
        let doc = self.engine.create(id, number, input, now)?;

        let mut snap = self.store.begin_snapshot().await?;
        if let Err(err) = self.store.insert_document(&mut snap, doc.clone()).await {
            self.abort(snap, "create").await;
            return Err(err.into());
        }
        self.store.commit_snapshot(snap).await?;

        tracing::info!(
            id = %doc.id,
            status = %doc.status,
            amount = %doc.total_amount,
            "created document"
        );
        Ok(doc)
    }

    /// Delete a document that is still in the initial state.
    pub async fn delete_document(&self, id: &str) -> Result<(), ApiError> {
        self.simulator.simulate().await?;

        let mut snap = self.store.begin_snapshot().await?;
        let result = async {
            let doc = self.store.get_document_for_update(&mut snap, id).await?;
            self.engine.ensure_editable(&doc)?;
            self.store
                .delete_document(&mut snap, id, doc.version)
                .await?;
            Ok::<_, ApiError>(doc.status)
        }
        .await;

        match result {
            Ok(status) => {
                self.store.commit_snapshot(snap).await?;
                tracing::info!(id, %status, "deleted document");
                Ok(())
            }
            Err(err) => {
                self.abort(snap, "delete").await;
                tracing::debug!(id, error = %err, "delete rejected");
                Err(err)
            }
        }
    }

    // ── Workflow transitions ──────────────────────────────────────────────────

    pub async fn advance_document(&self, id: &str) -> Result<Document, ApiError> {
        self.mutate(id, "advance", |engine, doc, now| {
            engine.advance(doc, now)?;
            Ok(())
        })
        .await
    }

    pub async fn set_document_status(
        &self,
        id: &str,
        target: DocumentStatus,
    ) -> Result<Document, ApiError> {
        self.mutate(id, "set_status", |engine, doc, now| {
            engine.set_status(doc, target, now)?;
            Ok(())
        })
        .await
    }

    pub async fn approve_document(
        &self,
        id: &str,
        note: Option<String>,
    ) -> Result<Document, ApiError> {
        self.mutate(id, "approve", |engine, doc, now| {
            engine.approve(doc, note, now)?;
            Ok(())
        })
        .await
    }

    pub async fn decline_document(
        &self,
        id: &str,
        reason: Option<String>,
    ) -> Result<Document, ApiError> {
        self.mutate(id, "decline", |engine, doc, now| {
            engine.decline(doc, reason, now)?;
            Ok(())
        })
        .await
    }

    pub async fn cancel_document(
        &self,
        id: &str,
        reason: Option<String>,
    ) -> Result<Document, ApiError> {
        self.mutate(id, "cancel", |engine, doc, now| {
            engine.cancel(doc, reason, now)?;
            Ok(())
        })
        .await
    }

    /// Mark paid. `paid_at` defaults to now.
    pub async fn mark_document_paid(
        &self,
        id: &str,
        paid_at: Option<OffsetDateTime>,
    ) -> Result<Document, ApiError> {
        self.mutate(id, "mark_paid", |engine, doc, now| {
            engine.mark_paid(doc, paid_at, now)?;
            Ok(())
        })
        .await
    }

    // ── Draft edits ───────────────────────────────────────────────────────────

    pub async fn update_document(
        &self,
        id: &str,
        patch: DocumentPatch,
    ) -> Result<Document, ApiError> {
        self.mutate(id, "update", |engine, doc, now| {
            if patch.is_empty() {
                return Err(ValidationError::InvalidInput {
                    reason: "patch changes nothing".to_string(),
                }
                .into());
            }
            engine.update(doc, patch, now)?;
            Ok(())
        })
        .await
    }

    pub async fn add_line_item(
        &self,
        id: &str,
        item: LineItemInput,
    ) -> Result<Document, ApiError> {
        self.mutate(id, "add_line_item", |engine, doc, now| {
            engine.ensure_editable(doc)?;
            let item = LineItem::from_input(item, doc.total_amount.currency)?;
            engine.add_line_item(doc, item, now)?;
            Ok(())
        })
        .await
    }

    pub async fn remove_line_item(&self, id: &str, index: usize) -> Result<Document, ApiError> {
        self.mutate(id, "remove_line_item", |engine, doc, now| {
            match engine.remove_line_item(doc, index, now)? {
                Some(_) => Ok(()),
                None => Err(ValidationError::InvalidLineItem {
                    reason: format!("no line item at index {index}"),
                }
                .into()),
            }
        })
        .await
    }

    /// Discard `snap`. The caller's error wins; an abort failure is only logged.
    async fn abort(&self, snap: S::Snapshot, operation: &'static str) {
        if let Err(err) = self.store.abort_snapshot(snap).await {
            tracing::warn!(operation, error = %err, "failed to abort snapshot");
        }
    }

    /// Simulate, then run `apply` against the document inside one snapshot.
    async fn mutate<F>(
        &self,
        id: &str,
        operation: &'static str,
        apply: F,
    ) -> Result<Document, ApiError>
    where
        F: FnOnce(&WorkflowEngine, &mut Document, OffsetDateTime) -> Result<(), ApiError> + Send,
    {
        self.simulator.simulate().await?;

        let mut snap = self.store.begin_snapshot().await?;
        let result = async {
            let mut doc = self.store.get_document_for_update(&mut snap, id).await?;
            let from = doc.status;
            let expected_version = doc.version;
            apply(&self.engine, &mut doc, OffsetDateTime::now_utc())?;
            self.store
                .update_document(&mut snap, doc.clone(), expected_version)
                .await?;
            Ok::<_, ApiError>((from, doc))
        }
        .await;

        match result {
            Ok((from, doc)) => {
                self.store.commit_snapshot(snap).await?;
                tracing::info!(
                    id,
                    operation,
                    %from,
                    to = %doc.status,
                    version = doc.version,
                    "document updated"
                );
                Ok(doc)
            }
            Err(err) => {
                self.abort(snap, operation).await;
                tracing::debug!(id, operation, error = %err, "operation rejected");
                Err(err)
            }
        }
    }
}
