//! Finance document model.
//!
//! All monetary values use `rust_decimal::Decimal` -- never `f64`.
//! Calendar dates serialize as `YYYY-MM-DD`, timestamps as RFC 3339.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::error::ValidationError;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

// ──────────────────────────────────────────────
// Enumerations
// ──────────────────────────────────────────────

/// Kind of finance document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Invoice,
    Bill,
    CreditNote,
    PurchaseOrder,
    ExpenseReport,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Invoice,
        DocumentType::Bill,
        DocumentType::CreditNote,
        DocumentType::PurchaseOrder,
        DocumentType::ExpenseReport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Invoice => "INVOICE",
            DocumentType::Bill => "BILL",
            DocumentType::CreditNote => "CREDIT_NOTE",
            DocumentType::PurchaseOrder => "PURCHASE_ORDER",
            DocumentType::ExpenseReport => "EXPENSE_REPORT",
        }
    }

    /// Prefix used when numbering documents of this type (e.g. `INV-2024-00017`).
    pub fn number_prefix(self) -> &'static str {
        match self {
            DocumentType::Invoice => "INV",
            DocumentType::Bill => "BIL",
            DocumentType::CreditNote => "CRN",
            DocumentType::PurchaseOrder => "PO",
            DocumentType::ExpenseReport => "EXP",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status of a document.
///
/// The variants are the union of both transition tables: `Init` is the
/// initial state of the branching table, `Draft` the initial state of the
/// linear one. See [`crate::workflow::TransitionTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Init,
    Draft,
    Submitted,
    Approved,
    Posted,
    Paid,
    Canceled,
    Declined,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 8] = [
        DocumentStatus::Init,
        DocumentStatus::Draft,
        DocumentStatus::Submitted,
        DocumentStatus::Approved,
        DocumentStatus::Posted,
        DocumentStatus::Paid,
        DocumentStatus::Canceled,
        DocumentStatus::Declined,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Init => "INIT",
            DocumentStatus::Draft => "DRAFT",
            DocumentStatus::Submitted => "SUBMITTED",
            DocumentStatus::Approved => "APPROVED",
            DocumentStatus::Posted => "POSTED",
            DocumentStatus::Paid => "PAID",
            DocumentStatus::Canceled => "CANCELED",
            DocumentStatus::Declined => "DECLINED",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DocumentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownStatus {
                value: s.to_string(),
            })
    }
}

/// ISO 4217 currency codes supported by the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Chf,
    Cad,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Chf,
        Currency::Cad,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Chf => "CHF",
            Currency::Cad => "CAD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::InvalidInput {
                reason: format!("unsupported currency '{}'", s),
            })
    }
}

// ──────────────────────────────────────────────
// Money and line items
// ──────────────────────────────────────────────

/// A decimal amount tagged with its currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Money { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Money::new(Decimal::ZERO, currency)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// A single line of a document. Owned by its parent document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
    pub account_code: String,
}

impl LineItem {
    /// Build a line item, computing `line_total = quantity * unit_price`.
    pub fn new(
        description: impl Into<String>,
        quantity: u32,
        unit_price: Money,
        account_code: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::InvalidLineItem {
                reason: "quantity must be a positive integer".to_string(),
            });
        }
        if unit_price.amount.is_sign_negative() {
            return Err(ValidationError::InvalidLineItem {
                reason: format!("unit price {} is negative", unit_price),
            });
        }
        let amount = unit_price
            .amount
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| ValidationError::InvalidLineItem {
                reason: format!("{} x {} overflows", quantity, unit_price),
            })?;
        let line_total = Money::new(amount, unit_price.currency);
        Ok(LineItem {
            description: description.into(),
            quantity,
            unit_price,
            line_total,
            account_code: account_code.into(),
        })
    }

    /// Validate caller input against the owning document's currency.
    pub fn from_input(input: LineItemInput, currency: Currency) -> Result<Self, ValidationError> {
        if input.description.trim().is_empty() {
            return Err(ValidationError::InvalidLineItem {
                reason: "description must not be empty".to_string(),
            });
        }
        LineItem::new(
            input.description,
            input.quantity,
            Money::new(input.unit_price, currency),
            input.account_code,
        )
    }
}

// ──────────────────────────────────────────────
// Documents
// ──────────────────────────────────────────────

/// One applied workflow transition, appended to [`Document::history`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub from: DocumentStatus,
    pub to: DocumentStatus,
    /// Document version after the transition.
    pub version: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A finance document: the unit stored, filtered, sorted and paginated.
///
/// Invariants: `updated_at >= created_at`; `created_at` never changes after
/// creation; when line items are present `total_amount` is their sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
    pub document_number: String,
    #[serde(with = "iso_date")]
    pub issue_date: Date,
    #[serde(with = "iso_date::option", default)]
    pub due_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub counterparty: String,
    #[serde(default)]
    pub description: Option<String>,
    pub total_amount: Money,
    pub line_items: Vec<LineItem>,
    pub version: u64,
    #[serde(default)]
    pub next_approver: Option<String>,
    #[serde(default)]
    pub approval_note: Option<String>,
    #[serde(default)]
    pub decline_reason: Option<String>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub payment_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub history: Vec<TransitionRecord>,
}

impl Document {
    /// Sum of all line totals, in the document currency.
    pub fn line_items_total(&self) -> Option<Decimal> {
        sum_line_totals(&self.line_items)
    }

    /// Re-derive `total_amount` from the line items.
    pub fn recompute_total(&mut self) -> Result<(), ValidationError> {
        let total = self
            .line_items_total()
            .ok_or_else(|| ValidationError::InvalidLineItem {
                reason: "sum of line totals overflows".to_string(),
            })?;
        self.total_amount = Money::new(total, self.total_amount.currency);
        Ok(())
    }
}

/// Sum of `line_total` over `items`; `None` on decimal overflow.
pub fn sum_line_totals(items: &[LineItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total.amount))
}

// ──────────────────────────────────────────────
// Caller input
// ──────────────────────────────────────────────

/// Caller-supplied line item. The currency is taken from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub account_code: String,
}

/// Input to the create operation.
///
/// When `line_items` is non-empty the total is always derived from them and
/// `amount` is ignored. Without line items `amount` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub counterparty: String,
    #[serde(default)]
    pub description: Option<String>,
    pub currency: Currency,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(with = "iso_date::option", default)]
    pub issue_date: Option<Date>,
    #[serde(with = "iso_date::option", default)]
    pub due_date: Option<Date>,
    #[serde(default)]
    pub document_number: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
}

impl DocumentInput {
    /// Minimal input: a document with a caller-supplied amount and no lines.
    pub fn new(
        doc_type: DocumentType,
        counterparty: impl Into<String>,
        amount: Decimal,
        currency: Currency,
    ) -> Self {
        DocumentInput {
            doc_type,
            counterparty: counterparty.into(),
            description: None,
            currency,
            amount: Some(amount),
            issue_date: None,
            due_date: None,
            document_number: None,
            line_items: Vec::new(),
        }
    }
}

/// Header fields that may be edited while a document is still in its
/// initial state. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "iso_date::option", default)]
    pub due_date: Option<Date>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.counterparty.is_none() && self.description.is_none() && self.due_date.is_none()
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
