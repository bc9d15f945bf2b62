//! Field-accessor table for filtering and sorting.
//!
//! Only the names listed in [`DocumentField::ALL`] may appear in a filter or
//! sort expression. Each field has a fixed extraction function, so a field
//! always yields the same kind of [`FieldValue`] and is always compared the
//! same way.

use std::borrow::Cow;
use std::cmp::Ordering;

use rust_decimal::Decimal;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

use crate::types::Document;

/// A document attribute addressable from a query expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentField {
    Id,
    Type,
    Status,
    DocumentNumber,
    IssueDate,
    DueDate,
    CreatedAt,
    UpdatedAt,
    Counterparty,
    Description,
    Amount,
    Currency,
    LineItemCount,
    Version,
    NextApprover,
}

/// A field value extracted from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Number(Decimal),
    Text(String),
    /// Compared as an instant; rendered as RFC 3339 for text operators.
    Timestamp(OffsetDateTime),
}

impl DocumentField {
    /// Wire name → field. This is the filter/sort allow-list.
    pub const ALL: [(&'static str, DocumentField); 15] = [
        ("id", DocumentField::Id),
        ("type", DocumentField::Type),
        ("status", DocumentField::Status),
        ("documentNumber", DocumentField::DocumentNumber),
        ("issueDate", DocumentField::IssueDate),
        ("dueDate", DocumentField::DueDate),
        ("createdAt", DocumentField::CreatedAt),
        ("updatedAt", DocumentField::UpdatedAt),
        ("counterparty", DocumentField::Counterparty),
        ("description", DocumentField::Description),
        ("amount", DocumentField::Amount),
        ("currency", DocumentField::Currency),
        ("lineItemCount", DocumentField::LineItemCount),
        ("version", DocumentField::Version),
        ("nextApprover", DocumentField::NextApprover),
    ];

    /// Look up a field by its wire name (exact, case-sensitive).
    pub fn parse(name: &str) -> Option<Self> {
        DocumentField::ALL
            .iter()
            .find(|(wire, _)| *wire == name)
            .map(|(_, field)| *field)
    }

    pub fn name(self) -> &'static str {
        DocumentField::ALL
            .iter()
            .find(|(_, field)| *field == self)
            .map(|(wire, _)| *wire)
            .unwrap_or("unknown")
    }

    pub fn extract(self, doc: &Document) -> FieldValue {
        match self {
            DocumentField::Id => FieldValue::Text(doc.id.clone()),
            DocumentField::Type => FieldValue::Text(doc.doc_type.as_str().to_string()),
            DocumentField::Status => FieldValue::Text(doc.status.as_str().to_string()),
            DocumentField::DocumentNumber => FieldValue::Text(doc.document_number.clone()),
            DocumentField::IssueDate => date_value(Some(doc.issue_date)),
            DocumentField::DueDate => date_value(doc.due_date),
            DocumentField::CreatedAt => FieldValue::Timestamp(doc.created_at),
            DocumentField::UpdatedAt => FieldValue::Timestamp(doc.updated_at),
            DocumentField::Counterparty => FieldValue::Text(doc.counterparty.clone()),
            DocumentField::Description => optional_text(doc.description.as_deref()),
            DocumentField::Amount => FieldValue::Number(doc.total_amount.amount),
            DocumentField::Currency => {
                FieldValue::Text(doc.total_amount.currency.code().to_string())
            }
            DocumentField::LineItemCount => {
                FieldValue::Number(Decimal::from(doc.line_items.len() as u64))
            }
            DocumentField::Version => FieldValue::Number(Decimal::from(doc.version)),
            DocumentField::NextApprover => optional_text(doc.next_approver.as_deref()),
        }
    }
}

fn optional_text(value: Option<&str>) -> FieldValue {
    value.map_or(FieldValue::Null, |s| FieldValue::Text(s.to_string()))
}

/// ISO calendar dates order lexically the same way they order in time.
fn date_value(date: Option<Date>) -> FieldValue {
    date.map_or(FieldValue::Null, |d| {
        FieldValue::Text(format!(
            "{:04}-{:02}-{:02}",
            d.year(),
            u8::from(d.month()),
            d.day()
        ))
    })
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// String form used by `eq`, `neq`, `in`, `not_in`, `contains`,
    /// `starts_with`. `None` for null.
    pub fn stringify(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Null => None,
            FieldValue::Number(n) => Some(Cow::Owned(n.to_string())),
            FieldValue::Text(s) => Some(Cow::Borrowed(s)),
            FieldValue::Timestamp(ts) => ts.format(&Rfc3339).ok().map(Cow::Owned),
        }
    }

    /// Numeric form used by `gt`/`gte`/`lt`/`lte`. Text that parses as a
    /// decimal counts as numeric.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Null => None,
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.parse::<Decimal>().ok(),
            FieldValue::Timestamp(_) => None,
        }
    }

    /// Sort order: numbers numerically, timestamps chronologically, text by
    /// byte-wise string order, and nulls after every non-null value.
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Null, _) => Ordering::Greater,
            (_, FieldValue::Null) => Ordering::Less,
            (FieldValue::Number(a), FieldValue::Number(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            (a, b) => a.stringify().cmp(&b.stringify()),
        }
    }
}
