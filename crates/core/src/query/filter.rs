//! Filter expressions.
//!
//! Grammar: `field:operator:value[,field:operator:value...]`. The value of
//! `in` / `not_in` is a `|`-separated set. The value is everything after the
//! second `:`, so it may itself contain colons (timestamps) but not commas.

use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;

use super::field::{DocumentField, FieldValue};
use crate::error::ValidationError;
use crate::types::Document;

/// Supported comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    StartsWith,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 10] = [
        FilterOperator::Eq,
        FilterOperator::Neq,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Contains,
        FilterOperator::StartsWith,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not_in",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "starts_with",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        FilterOperator::ALL.into_iter().find(|op| op.as_str() == s)
    }

    fn is_numeric(self) -> bool {
        matches!(
            self,
            FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte
        )
    }

    fn is_membership(self) -> bool {
        matches!(self, FilterOperator::In | FilterOperator::NotIn)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed right-hand side of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Scalar(String),
    Number(Decimal),
    Set(BTreeSet<String>),
}

/// One validated `field:operator:value` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub field: DocumentField,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterSpec {
    /// Whether `doc` satisfies this filter.
    ///
    /// A null field value satisfies only `neq` and `not_in`.
    pub fn matches(&self, doc: &Document) -> bool {
        let actual = self.field.extract(doc);
        if actual.is_null() {
            return matches!(self.operator, FilterOperator::Neq | FilterOperator::NotIn);
        }
        match (&self.operator, &self.value) {
            (FilterOperator::Eq, FilterValue::Scalar(v)) => text_eq(&actual, v),
            (FilterOperator::Neq, FilterValue::Scalar(v)) => !text_eq(&actual, v),
            (FilterOperator::In, FilterValue::Set(set)) => in_set(&actual, set),
            (FilterOperator::NotIn, FilterValue::Set(set)) => !in_set(&actual, set),
            (FilterOperator::Contains, FilterValue::Scalar(v)) => actual
                .stringify()
                .is_some_and(|s| s.to_lowercase().contains(&v.to_lowercase())),
            (FilterOperator::StartsWith, FilterValue::Scalar(v)) => actual
                .stringify()
                .is_some_and(|s| s.to_lowercase().starts_with(&v.to_lowercase())),
            (op, FilterValue::Number(expected)) => match actual.as_number() {
                Some(n) => match op {
                    FilterOperator::Gt => n > *expected,
                    FilterOperator::Gte => n >= *expected,
                    FilterOperator::Lt => n < *expected,
                    FilterOperator::Lte => n <= *expected,
                    _ => false,
                },
                None => false,
            },
            _ => false,
        }
    }
}

fn text_eq(actual: &FieldValue, expected: &str) -> bool {
    actual.stringify().is_some_and(|s| s == expected)
}

fn in_set(actual: &FieldValue, set: &BTreeSet<String>) -> bool {
    actual
        .stringify()
        .is_some_and(|s| set.contains(s.as_ref()))
}

/// Parse a full filter expression. Empty input yields no filters.
///
/// Every triple is validated before anything is returned, so a bad triple
/// anywhere in the list rejects the whole expression.
pub fn parse_filters(expr: &str) -> Result<Vec<FilterSpec>, ValidationError> {
    if expr.trim().is_empty() {
        return Ok(Vec::new());
    }
    expr.split(',').map(parse_filter).collect()
}

/// Parse one `field:operator:value` triple.
pub fn parse_filter(triple: &str) -> Result<FilterSpec, ValidationError> {
    let mut parts = triple.trim().splitn(3, ':');
    let (Some(field_name), Some(op_name), Some(raw_value)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(ValidationError::MalformedFilter {
            expr: triple.to_string(),
        });
    };
    if field_name.is_empty() || op_name.is_empty() {
        return Err(ValidationError::MalformedFilter {
            expr: triple.to_string(),
        });
    }

    let field =
        DocumentField::parse(field_name).ok_or_else(|| ValidationError::UnknownFilterField {
            field: field_name.to_string(),
        })?;
    let operator =
        FilterOperator::parse(op_name).ok_or_else(|| ValidationError::UnsupportedOperator {
            field: field_name.to_string(),
            operator: op_name.to_string(),
        })?;

    let value = if operator.is_membership() {
        FilterValue::Set(raw_value.split('|').map(str::to_string).collect())
    } else if operator.is_numeric() {
        // A value that is not a number is kept as text and never matches.
        match raw_value.trim().parse::<Decimal>() {
            Ok(n) => FilterValue::Number(n),
            Err(_) => FilterValue::Scalar(raw_value.to_string()),
        }
    } else {
        FilterValue::Scalar(raw_value.to_string())
    };

    Ok(FilterSpec {
        field,
        operator,
        value,
    })
}

/// Keep the documents satisfying every filter (logical AND), preserving order.
pub fn apply_filters(docs: Vec<Document>, filters: &[FilterSpec]) -> Vec<Document> {
    if filters.is_empty() {
        return docs;
    }
    docs.into_iter()
        .filter(|doc| filters.iter().all(|f| f.matches(doc)))
        .collect()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use crate::types::DocumentStatus;

    fn dataset() -> Vec<Document> {
        generate(300, 42)
    }

    #[test]
    fn parses_scalar_numeric_and_set_values() {
        let specs =
            parse_filters("status:in:INIT|SUBMITTED,amount:gte:100.50,counterparty:contains:corp")
                .unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(
            specs[0].value,
            FilterValue::Set(["INIT", "SUBMITTED"].map(String::from).into())
        );
        assert_eq!(specs[1].value, FilterValue::Number(Decimal::new(10050, 2)));
        assert_eq!(specs[2].value, FilterValue::Scalar("corp".to_string()));
    }

    #[test]
    fn value_may_contain_colons() {
        let spec = parse_filter("createdAt:starts_with:2024-01-01T10:").unwrap();
        assert_eq!(
            spec.value,
            FilterValue::Scalar("2024-01-01T10:".to_string())
        );
    }

    #[test]
    fn empty_expression_is_no_filter() {
        assert!(parse_filters("").unwrap().is_empty());
        assert!(parse_filters("   ").unwrap().is_empty());
    }

    #[test]
    fn malformed_triples_rejected() {
        for bad in ["status", "status:eq", ":eq:DRAFT", "status::DRAFT"] {
            assert!(
                matches!(
                    parse_filters(bad),
                    Err(ValidationError::MalformedFilter { .. })
                ),
                "{bad} should be malformed"
            );
        }
        assert!(matches!(
            parse_filters("status:eq:INIT,,"),
            Err(ValidationError::MalformedFilter { .. })
        ));
    }

    #[test]
    fn unknown_field_named_in_error() {
        let err = parse_filters("status:eq:INIT,password:eq:x").unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownFilterField {
                field: "password".to_string()
            }
        );
    }

    #[test]
    fn unknown_operator_named_in_error() {
        let err = parse_filters("amount:between:1").unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedOperator {
                field: "amount".to_string(),
                operator: "between".to_string()
            }
        );
    }

    #[test]
    fn numeric_operator_with_text_value_matches_nothing() {
        let filters = parse_filters("amount:gt:lots").unwrap();
        assert_eq!(filters[0].value, FilterValue::Scalar("lots".to_string()));
        assert!(apply_filters(dataset(), &filters).is_empty());

        let filters = parse_filters("version:lte:abc").unwrap();
        assert!(apply_filters(dataset(), &filters).is_empty());
    }

    #[test]
    fn eq_returns_only_matching_status() {
        let filters = parse_filters("status:eq:SUBMITTED").unwrap();
        let out = apply_filters(dataset(), &filters);
        assert!(!out.is_empty());
        assert!(out.iter().all(|d| d.status == DocumentStatus::Submitted));
        let expected = dataset()
            .iter()
            .filter(|d| d.status == DocumentStatus::Submitted)
            .count();
        assert_eq!(out.len(), expected);
    }

    #[test]
    fn in_returns_union() {
        let all = dataset();
        let init = apply_filters(all.clone(), &parse_filters("status:eq:INIT").unwrap());
        let submitted = apply_filters(all.clone(), &parse_filters("status:eq:SUBMITTED").unwrap());
        let union = apply_filters(all, &parse_filters("status:in:INIT|SUBMITTED").unwrap());
        assert_eq!(union.len(), init.len() + submitted.len());
        assert!(union
            .iter()
            .all(|d| matches!(d.status, DocumentStatus::Init | DocumentStatus::Submitted)));
    }

    #[test]
    fn not_in_is_complement_of_in() {
        let all = dataset();
        let in_set = apply_filters(all.clone(), &parse_filters("currency:in:USD|EUR").unwrap());
        let not_in = apply_filters(all.clone(), &parse_filters("currency:not_in:USD|EUR").unwrap());
        assert_eq!(in_set.len() + not_in.len(), all.len());
    }

    #[test]
    fn numeric_comparisons() {
        let out = apply_filters(dataset(), &parse_filters("amount:gt:10000").unwrap());
        assert!(out
            .iter()
            .all(|d| d.total_amount.amount > Decimal::from(10_000)));

        let out = apply_filters(dataset(), &parse_filters("lineItemCount:lte:1").unwrap());
        assert!(out.iter().all(|d| d.line_items.len() <= 1));
    }

    #[test]
    fn numeric_comparison_on_text_field_never_matches() {
        let out = apply_filters(dataset(), &parse_filters("counterparty:gt:0").unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn contains_and_starts_with_ignore_case() {
        let out = apply_filters(dataset(), &parse_filters("counterparty:contains:CORP").unwrap());
        assert!(!out.is_empty());
        assert!(out.iter().all(|d| d.counterparty.to_lowercase().contains("corp")));

        let out = apply_filters(
            dataset(),
            &parse_filters("documentNumber:starts_with:inv-").unwrap(),
        );
        assert!(out.iter().all(|d| d.document_number.starts_with("INV-")));
    }

    #[test]
    fn null_matches_only_negative_operators() {
        let all = dataset();
        let nulls = all.iter().filter(|d| d.description.is_none()).count();
        assert!(nulls > 0);

        let eq = apply_filters(all.clone(), &parse_filters("description:eq:x").unwrap());
        assert!(eq.iter().all(|d| d.description.is_some()));

        let neq = apply_filters(all.clone(), &parse_filters("description:neq:x").unwrap());
        assert_eq!(neq.len(), all.len());

        let not_in = apply_filters(all.clone(), &parse_filters("dueDate:not_in:x").unwrap());
        assert_eq!(not_in.len(), all.len());

        let contains = apply_filters(all, &parse_filters("dueDate:contains:-").unwrap());
        assert!(contains.iter().all(|d| d.due_date.is_some()));
    }

    #[test]
    fn filters_combine_with_and() {
        let out = apply_filters(
            dataset(),
            &parse_filters("status:eq:PAID,currency:eq:USD").unwrap(),
        );
        assert!(out.iter().all(|d| d.status == DocumentStatus::Paid
            && d.total_amount.currency == crate::types::Currency::Usd));
    }
}
