use std::future::Future;

use findoc_core::Document;

use super::{ensure, insert_committed, make_document, seed_documents, TestResult};
use crate::{DocumentStore, StorageError};

pub(super) async fn run_snapshot_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "snapshot",
        "insert_visible_after_commit",
        insert_visible_after_commit(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "insert_invisible_after_abort",
        insert_invisible_after_abort(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "insert_invisible_after_drop",
        insert_invisible_after_drop(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "duplicate_insert_rejected",
        duplicate_insert_rejected(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "delete_removes_after_commit",
        delete_removes_after_commit(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "list_keeps_creation_order",
        list_keeps_creation_order(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "unknown_id_not_found",
        unknown_id_not_found(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "seed_listed_and_readable",
        seed_listed_and_readable(factory).await,
    ));
    results.push(TestResult::from_result(
        "snapshot",
        "seed_never_writable",
        seed_never_writable(factory).await,
    ));

    results
}

// ── Commit / abort visibility ───────────────────────────────────────────────

async fn insert_visible_after_commit<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(Vec::new()).await;
    let doc = make_document("doc_a");
    insert_committed(&s, doc.clone()).await?;
    let read = s.get_document("doc_a").await.map_err(|e| e.to_string())?;
    ensure(read == doc, "committed document differs from the inserted one")
}

async fn insert_invisible_after_abort<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(Vec::new()).await;
    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.insert_document(&mut snap, make_document("doc_a"))
        .await
        .map_err(|e| e.to_string())?;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    match s.get_document("doc_a").await {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound after abort, got {other:?}")),
    }
}

async fn insert_invisible_after_drop<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(Vec::new()).await;
    {
        let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
        s.insert_document(&mut snap, make_document("doc_a"))
            .await
            .map_err(|e| e.to_string())?;
    }
    let listed = s.list_documents().await.map_err(|e| e.to_string())?;
    ensure(listed.is_empty(), "dropped snapshot leaked a write")
}

async fn duplicate_insert_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed_documents()).await;
    insert_committed(&s, make_document("doc_a")).await?;

    for id in ["doc_a", "doc_000001"] {
        let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
        let result = s.insert_document(&mut snap, make_document(id)).await;
        s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
        match result {
            Err(StorageError::AlreadyExists { id: got }) if got == id => {}
            other => return Err(format!("expected AlreadyExists for {id}, got {other:?}")),
        }
    }
    Ok(())
}

async fn delete_removes_after_commit<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(Vec::new()).await;
    insert_committed(&s, make_document("doc_a")).await?;

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    s.delete_document(&mut snap, "doc_a", 1)
        .await
        .map_err(|e| format!("delete: {e}"))?;
    s.commit_snapshot(snap).await.map_err(|e| e.to_string())?;

    match s.get_document("doc_a").await {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound after delete, got {other:?}")),
    }
}

async fn list_keeps_creation_order<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let seed = seed_documents();
    let s = factory(seed.clone()).await;
    for id in ["doc_z", "doc_a", "doc_m"] {
        insert_committed(&s, make_document(id)).await?;
    }

    let ids: Vec<String> = s
        .list_documents()
        .await
        .map_err(|e| e.to_string())?
        .into_iter()
        .map(|d| d.id)
        .collect();
    let mut expected: Vec<String> = seed.into_iter().map(|d| d.id).collect();
    expected.extend(["doc_z", "doc_a", "doc_m"].map(String::from));
    ensure(ids == expected, format!("unexpected order {ids:?}"))
}

async fn unknown_id_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(seed_documents()).await;
    match s.get_document("doc_missing").await {
        Err(StorageError::NotFound { id }) if id == "doc_missing" => {}
        other => return Err(format!("expected NotFound, got {other:?}")),
    }

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let result = s.get_document_for_update(&mut snap, "doc_missing").await;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;
    match result {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound for update, got {other:?}")),
    }
}

// ── Seed set ────────────────────────────────────────────────────────────────

async fn seed_listed_and_readable<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let seed = seed_documents();
    let s = factory(seed.clone()).await;
    let listed = s.list_documents().await.map_err(|e| e.to_string())?;
    ensure(listed == seed, "seed set not listed verbatim")?;

    let read = s
        .get_document(&seed[2].id)
        .await
        .map_err(|e| e.to_string())?;
    ensure(read == seed[2], "seed document read differs")
}

async fn seed_never_writable<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let seed = seed_documents();
    let s = factory(seed.clone()).await;
    let target = seed[0].clone();

    let mut snap = s.begin_snapshot().await.map_err(|e| e.to_string())?;
    let for_update = s.get_document_for_update(&mut snap, &target.id).await;
    let update = s
        .update_document(&mut snap, target.clone(), target.version)
        .await;
    let delete = s
        .delete_document(&mut snap, &target.id, target.version)
        .await;
    s.abort_snapshot(snap).await.map_err(|e| e.to_string())?;

    ensure(
        matches!(for_update, Err(StorageError::ReadOnly { .. })),
        format!("for_update on seed: {for_update:?}"),
    )?;
    ensure(
        matches!(update, Err(StorageError::ReadOnly { .. })),
        format!("update on seed: {update:?}"),
    )?;
    ensure(
        matches!(delete, Err(StorageError::ReadOnly { .. })),
        format!("delete on seed: {delete:?}"),
    )?;

    let listed = s.list_documents().await.map_err(|e| e.to_string())?;
    ensure(listed == seed, "seed set changed after rejected writes")
}
