//! Conformance test suite for `DocumentStore` implementations.
//!
//! A backend-agnostic suite that any `DocumentStore` implementation can run
//! to verify correctness. The suite covers:
//!
//! - **Snapshot isolation**: uncommitted writes invisible, committed writes visible
//! - **Seed set**: listed and readable, never writable
//! - **Version validation / OCC**: stale versions rejected
//! - **Serialization**: concurrent writers never lose an update
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that builds a
//! fresh store around the given seed documents for each test:
//!
//! ```ignore
//! use findoc_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn my_store_conformance() {
//!     let report = run_conformance_suite(|seed| async move { MyStore::new(seed) }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod snapshot;
mod version;

use std::fmt;
use std::future::Future;

use findoc_core::{generate, Document};

use crate::DocumentStore;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "snapshot", "version").
    pub category: String,
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a storage backend.
///
/// The `factory` is called once per test with the seed documents for that
/// test, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: DocumentStore,
    F: Fn(Vec<Document>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(snapshot::run_snapshot_tests(&factory).await);
    results.extend(version::run_version_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Seed documents used by tests that need a read-only population.
fn seed_documents() -> Vec<Document> {
    generate(5, 42)
}

/// A created document with the given id at version 1.
fn make_document(id: &str) -> Document {
    let mut doc = generate(1, 1_000).remove(0);
    doc.id = id.to_string();
    doc.version = 1;
    doc
}

/// Commit a single insert in its own snapshot.
async fn insert_committed<S: DocumentStore>(store: &S, doc: Document) -> Result<(), String> {
    let mut snap = store.begin_snapshot().await.map_err(|e| e.to_string())?;
    store
        .insert_document(&mut snap, doc)
        .await
        .map_err(|e| format!("insert: {e}"))?;
    store
        .commit_snapshot(snap)
        .await
        .map_err(|e| format!("commit: {e}"))
}

fn ensure(condition: bool, message: impl Into<String>) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(message.into())
    }
}
