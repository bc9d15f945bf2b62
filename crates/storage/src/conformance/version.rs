use std::future::Future;
use std::sync::Arc;

use findoc_core::Document;

use super::{ensure, insert_committed, make_document, TestResult};
use crate::{DocumentStore, StorageError};

/// Number of concurrent tasks to spawn in the race tests.
const N: usize = 10;

pub(super) async fn run_version_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "version",
        "update_with_correct_version_succeeds",
        update_with_correct_version_succeeds(factory).await,
    ));
    results.push(TestResult::from_result(
        "version",
        "stale_version_after_intervening_commit",
        stale_version_after_intervening_commit(factory).await,
    ));
    results.push(TestResult::from_result(
        "version",
        "conflict_does_not_change_document",
        conflict_does_not_change_document(factory).await,
    ));
    results.push(TestResult::from_result(
        "version",
        "sequential_updates_in_one_snapshot",
        sequential_updates_in_one_snapshot(factory).await,
    ));
    results.push(TestResult::from_result(
        "version",
        "concurrent_updates_exactly_one_wins",
        concurrent_updates_exactly_one_wins(factory).await,
    ));
    results.push(TestResult::from_result(
        "version",
        "concurrent_inserts_exactly_one_wins",
        concurrent_inserts_exactly_one_wins(factory).await,
    ));

    results
}

/// `doc` with its version bumped and a recognisable counterparty.
fn bumped(doc: &Document, counterparty: &str) -> Document {
    let mut next = doc.clone();
    next.version += 1;
    next.counterparty = counterparty.to_string();
    next
}

async fn update_with_correct_version_succeeds<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(Vec::new()).await;
    insert_committed(&s, make_document("doc_a")).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let current = s
        .get_document_for_update(&mut snap, "doc_a")
        .await
        .map_err(|e| e.to_string())?;
    let new_version = s
        .update_document(&mut snap, bumped(&current, "Updated Ltd"), current.version)
        .await
        .map_err(|e| format!("update: {e}"))?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    ensure(new_version == 2, format!("expected version 2, got {new_version}"))?;
    let read = s.get_document("doc_a").await.map_err(|e| e.to_string())?;
    ensure(
        read.version == 2 && read.counterparty == "Updated Ltd",
        "update not visible after commit",
    )
}

async fn stale_version_after_intervening_commit<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(Vec::new()).await;
    let original = make_document("doc_a");
    insert_committed(&s, original.clone()).await?;

    // First writer moves the document to version 2.
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.update_document(&mut snap, bumped(&original, "First"), 1)
        .await
        .map_err(|e| e.to_string())?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    // Second writer still believes version 1.
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s
        .update_document(&mut snap, bumped(&original, "Second"), 1)
        .await;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    match result {
        Err(StorageError::ConcurrentConflict {
            id,
            expected_version: 1,
            actual_version: 2,
        }) if id == "doc_a" => Ok(()),
        other => Err(format!("expected ConcurrentConflict 1 vs 2, got {other:?}")),
    }
}

async fn conflict_does_not_change_document<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(Vec::new()).await;
    let original = make_document("doc_a");
    insert_committed(&s, original.clone()).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let update = s
        .update_document(&mut snap, bumped(&original, "Wrong"), 7)
        .await;
    let delete = s.delete_document(&mut snap, "doc_a", 7).await;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    ensure(
        matches!(update, Err(StorageError::ConcurrentConflict { .. })),
        format!("update with wrong version: {update:?}"),
    )?;
    ensure(
        matches!(delete, Err(StorageError::ConcurrentConflict { .. })),
        format!("delete with wrong version: {delete:?}"),
    )?;
    let read = s.get_document("doc_a").await.map_err(|e| e.to_string())?;
    ensure(read == original, "conflicting writes changed the document")
}

async fn sequential_updates_in_one_snapshot<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(Vec::new()).await;
    let original = make_document("doc_a");
    insert_committed(&s, original.clone()).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let v2 = bumped(&original, "Two");
    s.update_document(&mut snap, v2.clone(), 1)
        .await
        .map_err(|e| format!("first update: {e}"))?;
    s.update_document(&mut snap, bumped(&v2, "Three"), 2)
        .await
        .map_err(|e| format!("second update: {e}"))?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    let read = s.get_document("doc_a").await.map_err(|e| e.to_string())?;
    ensure(
        read.version == 3 && read.counterparty == "Three",
        format!("expected version 3, got {}", read.version),
    )
}

// ── Races ───────────────────────────────────────────────────────────────────

/// N tasks all read version 1 and then try to write version 2. Exactly one
/// commit lands; the rest see ConcurrentConflict.
async fn concurrent_updates_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory(Vec::new()).await);
    let original = make_document("doc_a");
    insert_committed(storage.as_ref(), original.clone()).await?;

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        let next = bumped(&original, &format!("writer-{i}"));
        handles.push(tokio::spawn(async move {
            let mut snap = s.begin_snapshot().await?;
            match s.update_document(&mut snap, next, 1).await {
                Ok(_) => {
                    s.commit_snapshot(snap).await?;
                    Ok(true)
                }
                Err(StorageError::ConcurrentConflict { .. }) => {
                    s.abort_snapshot(snap).await?;
                    Ok(false)
                }
                Err(e) => {
                    let _ = s.abort_snapshot(snap).await;
                    Err(e)
                }
            }
        }));
    }

    let mut winners = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
        if won {
            winners += 1;
        }
    }
    ensure(winners == 1, format!("expected exactly 1 winner, got {winners}"))?;

    let read = storage
        .get_document("doc_a")
        .await
        .map_err(|e| e.to_string())?;
    ensure(read.version == 2, format!("final version {}", read.version))
}

/// N tasks insert the same id. Exactly one succeeds.
async fn concurrent_inserts_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory(Vec::new()).await);

    let mut handles = Vec::new();
    for _ in 0..N {
        let s = storage.clone();
        handles.push(tokio::spawn(async move {
            let mut snap = s.begin_snapshot().await?;
            match s.insert_document(&mut snap, make_document("doc_a")).await {
                Ok(()) => {
                    s.commit_snapshot(snap).await?;
                    Ok(true)
                }
                Err(StorageError::AlreadyExists { .. }) => {
                    s.abort_snapshot(snap).await?;
                    Ok(false)
                }
                Err(e) => {
                    let _ = s.abort_snapshot(snap).await;
                    Err(e)
                }
            }
        }));
    }

    let mut winners = 0usize;
    for handle in handles {
        let won = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e: StorageError| format!("storage error: {e}"))?;
        if won {
            winners += 1;
        }
    }
    ensure(winners == 1, format!("expected exactly 1 winner, got {winners}"))?;

    let listed = storage.list_documents().await.map_err(|e| e.to_string())?;
    ensure(listed.len() == 1, format!("{} documents listed", listed.len()))
}
