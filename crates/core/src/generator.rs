//! Deterministic synthetic dataset.
//!
//! Every random choice is drawn from one `StdRng` seeded with the caller's
//! seed, and no wall-clock time is read, so identical `(count, seed)` pairs
//! always produce identical documents. Statuses are reached by replaying the
//! transition table from the initial state, which keeps versions, history,
//! approver routing and payment timestamps consistent with live documents.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use time::macros::date;
use time::{Date, Duration, Time};

use crate::types::{Currency, Document, DocumentStatus, DocumentType, LineItem, Money};
use crate::workflow::WorkflowEngine;

/// First day of the historical window documents are dated in.
pub const HISTORY_START: Date = date!(2023-01-01);
/// Length of the historical window, in days.
pub const HISTORY_DAYS: i64 = 730;

const COUNTERPARTIES: &[&str] = &[
    "Acme Corp",
    "Globex Industries",
    "Initech",
    "Umbrella Logistics",
    "Stark Components",
    "Wayne Enterprises",
    "Hooli Cloud Services",
    "Vandelay Imports",
    "Soylent Foods",
    "Wonka Confectionery",
    "Tyrell Systems",
    "Cyberdyne Robotics",
];

const LINE_DESCRIPTIONS: &[&str] = &[
    "Consulting services",
    "Software licence",
    "Hardware maintenance",
    "Cloud hosting",
    "Office supplies",
    "Freight and shipping",
    "Travel expenses",
    "Training workshop",
    "Support subscription",
    "Marketing campaign",
];

const ACCOUNT_CODES: &[&str] = &["4000", "4100", "5000", "5100", "6100", "6200", "6300", "7000"];

const DOCUMENT_DESCRIPTIONS: &[&str] = &[
    "Quarterly services",
    "Annual renewal",
    "Project milestone",
    "Monthly retainer",
    "Equipment purchase",
    "Reimbursable costs",
];

/// Generate `count` documents with the default (branching) workflow.
pub fn generate(count: usize, seed: u64) -> Vec<Document> {
    generate_with(count, seed, &WorkflowEngine::default())
}

/// Generate `count` documents whose statuses come from `engine`'s table.
pub fn generate_with(count: usize, seed: u64, engine: &WorkflowEngine) -> Vec<Document> {
    let mut rng = StdRng::seed_from_u64(seed);
    let states: Vec<_> = engine.table().states().collect();
    (0..count)
        .map(|index| generate_one(&mut rng, index, engine, &states))
        .collect()
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

fn generate_one(
    rng: &mut StdRng,
    index: usize,
    engine: &WorkflowEngine,
    states: &[DocumentStatus],
) -> Document {
    let doc_type = *pick(rng, &DocumentType::ALL);
    let currency = *pick(rng, &Currency::ALL);
    let issue_date = HISTORY_START + Duration::days(rng.gen_range(0..HISTORY_DAYS));
    let created_at = issue_date
        .with_time(Time::MIDNIGHT)
        .assume_utc()
        + Duration::seconds(rng.gen_range(0..86_400));

    let line_items: Vec<LineItem> = (0..rng.gen_range(1..=5))
        .map(|_| generate_line_item(rng, currency))
        .collect();
    let total: Decimal = line_items.iter().map(|i| i.line_total.amount).sum();

    let description = if rng.gen_ratio(1, 4) {
        None
    } else {
        Some(pick(rng, DOCUMENT_DESCRIPTIONS).to_string())
    };
    let due_date = match doc_type {
        DocumentType::Invoice | DocumentType::Bill => {
            Some(issue_date + Duration::days(*pick(rng, &[15, 30, 45, 60])))
        }
        _ => None,
    };

    let mut doc = Document {
        id: format!("doc_{:06}", index + 1),
        doc_type,
        status: engine.table().initial(),
        document_number: format!(
            "{}-{}-{:05}",
            doc_type.number_prefix(),
            issue_date.year(),
            index + 1
        ),
        issue_date,
        due_date,
        created_at,
        updated_at: created_at,
        counterparty: pick(rng, COUNTERPARTIES).to_string(),
        description,
        total_amount: Money::new(total, currency),
        line_items,
        version: 1,
        next_approver: None,
        approval_note: None,
        decline_reason: None,
        cancellation_reason: None,
        payment_at: None,
        history: Vec::new(),
    };

    let target = *pick(rng, states);
    let path = engine.table().path_to(target).unwrap_or_default();
    let mut at = created_at;
    for next in path.into_iter().skip(1) {
        at += Duration::minutes(rng.gen_range(30..=4_320));
        engine.transition(&mut doc, next, None, at);
    }
    doc
}

fn generate_line_item(rng: &mut StdRng, currency: Currency) -> LineItem {
    let quantity: u32 = rng.gen_range(1..=20);
    let unit_price = Money::new(Decimal::new(rng.gen_range(500..=250_000), 2), currency);
    LineItem {
        description: pick(rng, LINE_DESCRIPTIONS).to_string(),
        quantity,
        unit_price,
        line_total: Money::new(unit_price.amount * Decimal::from(quantity), currency),
        account_code: pick(rng, ACCOUNT_CODES).to_string(),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
