//! Document workflow state machine.
//!
//! A [`TransitionTable`] is a static adjacency map from each status to the
//! statuses directly reachable from it, plus an advance map naming the single
//! happy-path successor of every non-terminal status. Tables are validated on
//! construction: every referenced status is declared, the graph is acyclic,
//! and at least one terminal status exists.
//!
//! [`WorkflowEngine`] applies guarded transitions to a [`Document`] in place.
//! Every successful mutation increments the version, refreshes `updated_at`
//! (never moving it backwards) and appends a [`TransitionRecord`] when the
//! status changes. Lookup and persistence are the caller's concern.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{EditError, ValidationError, WorkflowError, WorkflowViolation};
use crate::types::{
    sum_line_totals, Document, DocumentInput, DocumentPatch, DocumentStatus, LineItem, Money,
    TransitionRecord,
};

/// Documents above this amount are routed to the finance director.
pub const DIRECTOR_APPROVAL_THRESHOLD: i64 = 10_000;

pub const FINANCE_MANAGER: &str = "finance-manager";
pub const FINANCE_DIRECTOR: &str = "finance-director";

// ──────────────────────────────────────────────
// Transition tables
// ──────────────────────────────────────────────

/// Which of the two supported transition tables a deployment runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowModel {
    /// `INIT → SUBMITTED → APPROVED → PAID` with CANCELED/DECLINED side exits.
    #[default]
    Branching,
    /// `DRAFT → SUBMITTED → APPROVED → POSTED → PAID`, no branches.
    Linear,
}

impl fmt::Display for WorkflowModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowModel::Branching => f.write_str("branching"),
            WorkflowModel::Linear => f.write_str("linear"),
        }
    }
}

/// Structural problems detected when building a [`TransitionTable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("status {state} is referenced but not declared")]
    UndeclaredState { state: DocumentStatus },
    #[error("transition graph has a cycle through {state}")]
    Cycle { state: DocumentStatus },
    #[error("transition graph has no terminal status")]
    NoTerminal,
    #[error("advance edge {from} -> {to} is not a legal transition")]
    IllegalAdvance {
        from: DocumentStatus,
        to: DocumentStatus,
    },
    #[error("non-terminal status {state} has no advance target")]
    MissingAdvance { state: DocumentStatus },
}

/// Directed acyclic graph of legal status transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    initial: DocumentStatus,
    edges: BTreeMap<DocumentStatus, Vec<DocumentStatus>>,
    advance: BTreeMap<DocumentStatus, DocumentStatus>,
}

impl TransitionTable {
    /// Build and validate a table. Every status appearing anywhere must have
    /// an entry in `edges` (terminal statuses map to an empty list).
    pub fn new(
        initial: DocumentStatus,
        edges: BTreeMap<DocumentStatus, Vec<DocumentStatus>>,
        advance: BTreeMap<DocumentStatus, DocumentStatus>,
    ) -> Result<Self, TableError> {
        let table = TransitionTable {
            initial,
            edges,
            advance,
        };
        table.validate()?;
        Ok(table)
    }

    /// The canonical six-state table with terminal side exits.
    pub fn branching() -> Self {
        use DocumentStatus::*;
        TransitionTable {
            initial: Init,
            edges: BTreeMap::from([
                (Init, vec![Submitted, Canceled]),
                (Submitted, vec![Approved, Declined, Canceled]),
                (Approved, vec![Paid, Canceled]),
                (Paid, vec![]),
                (Canceled, vec![]),
                (Declined, vec![]),
            ]),
            advance: BTreeMap::from([
                (Init, Submitted),
                (Submitted, Approved),
                (Approved, Paid),
            ]),
        }
    }

    /// The strictly linear five-state chain.
    pub fn linear() -> Self {
        use DocumentStatus::*;
        TransitionTable {
            initial: Draft,
            edges: BTreeMap::from([
                (Draft, vec![Submitted]),
                (Submitted, vec![Approved]),
                (Approved, vec![Posted]),
                (Posted, vec![Paid]),
                (Paid, vec![]),
            ]),
            advance: BTreeMap::from([
                (Draft, Submitted),
                (Submitted, Approved),
                (Approved, Posted),
                (Posted, Paid),
            ]),
        }
    }

    pub fn for_model(model: WorkflowModel) -> Self {
        match model {
            WorkflowModel::Branching => TransitionTable::branching(),
            WorkflowModel::Linear => TransitionTable::linear(),
        }
    }

    pub fn initial(&self) -> DocumentStatus {
        self.initial
    }

    /// All declared statuses, in declaration order of the enum.
    pub fn states(&self) -> impl Iterator<Item = DocumentStatus> + '_ {
        self.edges.keys().copied()
    }

    pub fn contains(&self, status: DocumentStatus) -> bool {
        self.edges.contains_key(&status)
    }

    /// Statuses directly reachable from `status`. Empty for terminal or
    /// undeclared statuses.
    pub fn legal_next(&self, status: DocumentStatus) -> &[DocumentStatus] {
        self.edges.get(&status).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn allows(&self, from: DocumentStatus, to: DocumentStatus) -> bool {
        self.legal_next(from).contains(&to)
    }

    pub fn is_terminal(&self, status: DocumentStatus) -> bool {
        self.legal_next(status).is_empty()
    }

    pub fn advance_target(&self, status: DocumentStatus) -> Option<DocumentStatus> {
        self.advance.get(&status).copied()
    }

    /// Statuses with a direct edge into `target`.
    pub fn predecessors(&self, target: DocumentStatus) -> Vec<DocumentStatus> {
        self.edges
            .iter()
            .filter(|(_, next)| next.contains(&target))
            .map(|(from, _)| *from)
            .collect()
    }

    /// Shortest chain of statuses from the initial status to `target`,
    /// inclusive of both ends. `None` when `target` is unreachable.
    pub fn path_to(&self, target: DocumentStatus) -> Option<Vec<DocumentStatus>> {
        let mut parent: BTreeMap<DocumentStatus, DocumentStatus> = BTreeMap::new();
        let mut queue = VecDeque::from([self.initial]);
        let mut seen = BTreeSet::from([self.initial]);
        while let Some(node) = queue.pop_front() {
            if node == target {
                let mut path = vec![node];
                let mut cursor = node;
                while let Some(prev) = parent.get(&cursor) {
                    path.push(*prev);
                    cursor = *prev;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.legal_next(node) {
                if seen.insert(*next) {
                    parent.insert(*next, node);
                    queue.push_back(*next);
                }
            }
        }
        None
    }

    /// Structural checks also run by [`TransitionTable::new`].
    pub fn validate(&self) -> Result<(), TableError> {
        if !self.contains(self.initial) {
            return Err(TableError::UndeclaredState {
                state: self.initial,
            });
        }
        for next in self.edges.values() {
            if let Some(missing) = next.iter().find(|s| !self.contains(**s)) {
                return Err(TableError::UndeclaredState { state: *missing });
            }
        }
        if !self.edges.values().any(Vec::is_empty) {
            return Err(TableError::NoTerminal);
        }
        for (from, to) in &self.advance {
            if !self.allows(*from, *to) {
                return Err(TableError::IllegalAdvance {
                    from: *from,
                    to: *to,
                });
            }
        }
        if let Some(state) = self
            .states()
            .find(|s| !self.is_terminal(*s) && !self.advance.contains_key(s))
        {
            return Err(TableError::MissingAdvance { state });
        }
        self.check_acyclic()
    }

    /// Iterative DFS; a back edge onto the current path is a cycle.
    fn check_acyclic(&self) -> Result<(), TableError> {
        let mut done: BTreeSet<DocumentStatus> = BTreeSet::new();
        for root in self.states() {
            if done.contains(&root) {
                continue;
            }
            let mut on_path: BTreeSet<DocumentStatus> = BTreeSet::from([root]);
            let mut stack: Vec<(DocumentStatus, usize)> = vec![(root, 0)];
            while let Some((node, idx)) = stack.pop() {
                let next = self.legal_next(node);
                if idx < next.len() {
                    stack.push((node, idx + 1));
                    let child = next[idx];
                    if on_path.contains(&child) {
                        return Err(TableError::Cycle { state: child });
                    }
                    if !done.contains(&child) {
                        on_path.insert(child);
                        stack.push((child, 0));
                    }
                } else {
                    on_path.remove(&node);
                    done.insert(node);
                }
            }
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Engine
// ──────────────────────────────────────────────

/// Applies guarded workflow operations against one transition table.
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    table: TransitionTable,
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        WorkflowEngine::new(TransitionTable::branching())
    }
}

impl WorkflowEngine {
    pub fn new(table: TransitionTable) -> Self {
        WorkflowEngine { table }
    }

    pub fn for_model(model: WorkflowModel) -> Self {
        WorkflowEngine::new(TransitionTable::for_model(model))
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Build a new document in the table's initial state at version 1.
    ///
    /// The total is derived from the line items when any are supplied;
    /// otherwise the caller's `amount` is required and trusted.
    pub fn create(
        &self,
        id: String,
        document_number: String,
        input: DocumentInput,
        now: OffsetDateTime,
    ) -> Result<Document, ValidationError> {
        if input.counterparty.trim().is_empty() {
            return Err(ValidationError::InvalidInput {
                reason: "counterparty must not be empty".to_string(),
            });
        }
        let currency = input.currency;
        let line_items = input
            .line_items
            .into_iter()
            .map(|item| LineItem::from_input(item, currency))
            .collect::<Result<Vec<_>, _>>()?;

        let total_amount = if line_items.is_empty() {
            let amount = input.amount.ok_or_else(|| ValidationError::InvalidInput {
                reason: "amount is required when no line items are given".to_string(),
            })?;
            if amount.is_sign_negative() {
                return Err(ValidationError::InvalidInput {
                    reason: format!("amount {} is negative", amount),
                });
            }
            Money::new(amount, currency)
        } else {
            let total = sum_line_totals(&line_items).ok_or_else(|| {
                ValidationError::InvalidLineItem {
                    reason: "sum of line totals overflows".to_string(),
                }
            })?;
            Money::new(total, currency)
        };

        Ok(Document {
            id,
            doc_type: input.doc_type,
            status: self.table.initial(),
            document_number: input.document_number.unwrap_or(document_number),
            issue_date: input.issue_date.unwrap_or_else(|| now.date()),
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
            counterparty: input.counterparty,
            description: input.description,
            total_amount,
            line_items,
            version: 1,
            next_approver: None,
            approval_note: None,
            decline_reason: None,
            cancellation_reason: None,
            payment_at: None,
            history: Vec::new(),
        })
    }

    /// Move along the advance map to the next happy-path status.
    pub fn advance(
        &self,
        doc: &mut Document,
        now: OffsetDateTime,
    ) -> Result<TransitionRecord, WorkflowError> {
        let current = doc.status;
        let target = self.table.advance_target(current).ok_or_else(|| {
            WorkflowError::new(doc.id.clone(), WorkflowViolation::Terminal { current })
        })?;
        Ok(self.transition(doc, target, None, now))
    }

    /// Move to an explicit target, which must be a legal next status.
    pub fn set_status(
        &self,
        doc: &mut Document,
        target: DocumentStatus,
        now: OffsetDateTime,
    ) -> Result<TransitionRecord, WorkflowError> {
        self.ensure_edge(doc, target)?;
        Ok(self.transition(doc, target, None, now))
    }

    pub fn approve(
        &self,
        doc: &mut Document,
        note: Option<String>,
        now: OffsetDateTime,
    ) -> Result<TransitionRecord, WorkflowError> {
        self.require_state(doc, "approve", &[DocumentStatus::Submitted])?;
        self.ensure_edge(doc, DocumentStatus::Approved)?;
        doc.approval_note = note.clone();
        Ok(self.transition(doc, DocumentStatus::Approved, note, now))
    }

    pub fn decline(
        &self,
        doc: &mut Document,
        reason: Option<String>,
        now: OffsetDateTime,
    ) -> Result<TransitionRecord, WorkflowError> {
        self.require_state(doc, "decline", &[DocumentStatus::Submitted])?;
        self.ensure_edge(doc, DocumentStatus::Declined)?;
        doc.decline_reason = reason.clone();
        Ok(self.transition(doc, DocumentStatus::Declined, reason, now))
    }

    pub fn cancel(
        &self,
        doc: &mut Document,
        reason: Option<String>,
        now: OffsetDateTime,
    ) -> Result<TransitionRecord, WorkflowError> {
        let required = self.table.predecessors(DocumentStatus::Canceled);
        self.require_state(doc, "cancel", &required)?;
        doc.cancellation_reason = reason.clone();
        Ok(self.transition(doc, DocumentStatus::Canceled, reason, now))
    }

    /// Record payment. `paid_at` defaults to the transition time and is
    /// clamped so it never precedes the previous `updated_at`.
    pub fn mark_paid(
        &self,
        doc: &mut Document,
        paid_at: Option<OffsetDateTime>,
        now: OffsetDateTime,
    ) -> Result<TransitionRecord, WorkflowError> {
        let required = self.table.predecessors(DocumentStatus::Paid);
        self.require_state(doc, "mark_paid", &required)?;
        let floor = doc.updated_at;
        let record = self.transition(doc, DocumentStatus::Paid, None, now);
        if let Some(at) = paid_at {
            doc.payment_at = Some(at.max(floor));
        }
        Ok(record)
    }

    /// Header edits, only while the document is still in the initial state.
    pub fn update(
        &self,
        doc: &mut Document,
        patch: DocumentPatch,
        now: OffsetDateTime,
    ) -> Result<(), WorkflowError> {
        self.ensure_editable(doc)?;
        if let Some(counterparty) = patch.counterparty {
            doc.counterparty = counterparty;
        }
        if let Some(description) = patch.description {
            doc.description = Some(description);
        }
        if let Some(due_date) = patch.due_date {
            doc.due_date = Some(due_date);
        }
        stamp(doc, now);
        Ok(())
    }

    pub fn add_line_item(
        &self,
        doc: &mut Document,
        item: LineItem,
        now: OffsetDateTime,
    ) -> Result<(), EditError> {
        self.ensure_editable(doc)?;
        doc.line_items.push(item);
        if let Err(err) = doc.recompute_total() {
            doc.line_items.pop();
            return Err(err.into());
        }
        stamp(doc, now);
        Ok(())
    }

    /// Remove the line at `index`; `Ok(None)` when there is no such line.
    pub fn remove_line_item(
        &self,
        doc: &mut Document,
        index: usize,
        now: OffsetDateTime,
    ) -> Result<Option<LineItem>, EditError> {
        self.ensure_editable(doc)?;
        if index >= doc.line_items.len() {
            return Ok(None);
        }
        let removed = doc.line_items.remove(index);
        doc.recompute_total()?;
        stamp(doc, now);
        Ok(Some(removed))
    }

    /// Only unsubmitted documents may be edited or deleted.
    pub fn ensure_editable(&self, doc: &Document) -> Result<(), WorkflowError> {
        if doc.status != self.table.initial() {
            return Err(WorkflowError::new(
                doc.id.clone(),
                WorkflowViolation::NotEditable {
                    current: doc.status,
                    initial: self.table.initial(),
                },
            ));
        }
        Ok(())
    }

    fn ensure_edge(&self, doc: &Document, target: DocumentStatus) -> Result<(), WorkflowError> {
        if self.table.allows(doc.status, target) {
            return Ok(());
        }
        Err(WorkflowError::new(
            doc.id.clone(),
            WorkflowViolation::IllegalTransition {
                current: doc.status,
                attempted: target,
                legal: self.table.legal_next(doc.status).to_vec(),
            },
        ))
    }

    fn require_state(
        &self,
        doc: &Document,
        operation: &'static str,
        required: &[DocumentStatus],
    ) -> Result<(), WorkflowError> {
        if required.contains(&doc.status) {
            return Ok(());
        }
        Err(WorkflowError::new(
            doc.id.clone(),
            WorkflowViolation::WrongState {
                operation,
                current: doc.status,
                required: required.to_vec(),
            },
        ))
    }

    /// Apply an already-validated status change and its side effects.
    pub(crate) fn transition(
        &self,
        doc: &mut Document,
        to: DocumentStatus,
        note: Option<String>,
        now: OffsetDateTime,
    ) -> TransitionRecord {
        let from = doc.status;
        doc.status = to;
        let at = stamp(doc, now);

        if to == DocumentStatus::Submitted {
            doc.next_approver = Some(approver_for(&doc.total_amount).to_string());
        } else if from == DocumentStatus::Submitted {
            doc.next_approver = None;
        }
        if to == DocumentStatus::Paid {
            doc.payment_at = Some(at);
        }

        let record = TransitionRecord {
            from,
            to,
            version: doc.version,
            at,
            note,
        };
        doc.history.push(record.clone());
        record
    }
}

/// Bump the version and move `updated_at` forward, never backwards.
fn stamp(doc: &mut Document, now: OffsetDateTime) -> OffsetDateTime {
    let at = now.max(doc.updated_at);
    doc.updated_at = at;
    doc.version += 1;
    at
}

/// Approver for a document entering review, routed by amount.
pub fn approver_for(total: &Money) -> &'static str {
    if total.amount > Decimal::from(DIRECTOR_APPROVAL_THRESHOLD) {
        FINANCE_DIRECTOR
    } else {
        FINANCE_MANAGER
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
