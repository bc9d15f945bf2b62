//! Sort expressions.
//!
//! Grammar: `field[:direction][,field[:direction]...]`, direction `asc`
//! (default) or `desc`. Keys compose lexicographically: the first key that
//! orders two documents decides. The sort is stable, so fully tied
//! documents keep their original relative order.

use std::cmp::Ordering;
use std::fmt;

use super::field::DocumentField;
use crate::error::ValidationError;
use crate::types::Document;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: DocumentField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ord = self.field.extract(a).sort_cmp(&self.field.extract(b));
        match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

/// Parse a full sort expression. Empty input yields no sort keys.
pub fn parse_sort(expr: &str) -> Result<Vec<SortSpec>, ValidationError> {
    if expr.trim().is_empty() {
        return Ok(Vec::new());
    }
    expr.split(',').map(parse_sort_key).collect()
}

fn parse_sort_key(pair: &str) -> Result<SortSpec, ValidationError> {
    let pair = pair.trim();
    let mut parts = pair.split(':');
    let field_name = parts.next().unwrap_or_default();
    let direction_name = parts.next();
    if field_name.is_empty() || parts.next().is_some() {
        return Err(ValidationError::MalformedSort {
            expr: pair.to_string(),
        });
    }

    let field =
        DocumentField::parse(field_name).ok_or_else(|| ValidationError::UnknownSortField {
            field: field_name.to_string(),
        })?;
    let direction = match direction_name {
        None | Some("") => SortDirection::Asc,
        Some(name) => {
            SortDirection::parse(name).ok_or_else(|| ValidationError::InvalidSortDirection {
                field: field_name.to_string(),
                direction: name.to_string(),
            })?
        }
    };
    Ok(SortSpec { field, direction })
}

/// Compare by each key in turn; the first non-equal key wins.
pub fn compare(a: &Document, b: &Document, keys: &[SortSpec]) -> Ordering {
    keys.iter()
        .map(|key| key.compare(a, b))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Stable in-place sort by `keys`. No keys leaves the order untouched.
pub fn apply_sort(docs: &mut [Document], keys: &[SortSpec]) {
    if keys.is_empty() {
        return;
    }
    docs.sort_by(|a, b| compare(a, b, keys));
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;

    #[test]
    fn direction_defaults_to_ascending() {
        let keys = parse_sort("amount,createdAt:desc").unwrap();
        assert_eq!(
            keys,
            vec![
                SortSpec {
                    field: DocumentField::Amount,
                    direction: SortDirection::Asc
                },
                SortSpec {
                    field: DocumentField::CreatedAt,
                    direction: SortDirection::Desc
                },
            ]
        );
    }

    #[test]
    fn invalid_sort_rejected() {
        assert!(matches!(
            parse_sort("amount:sideways"),
            Err(ValidationError::InvalidSortDirection { .. })
        ));
        assert!(matches!(
            parse_sort("secret:asc"),
            Err(ValidationError::UnknownSortField { .. })
        ));
        assert!(matches!(
            parse_sort("amount:asc:extra"),
            Err(ValidationError::MalformedSort { .. })
        ));
        assert!(matches!(
            parse_sort("amount,"),
            Err(ValidationError::MalformedSort { .. })
        ));
    }

    #[test]
    fn sorts_numerically_not_lexically() {
        let mut docs = generate(200, 4);
        apply_sort(&mut docs, &parse_sort("amount").unwrap());
        for pair in docs.windows(2) {
            assert!(pair[0].total_amount.amount <= pair[1].total_amount.amount);
        }
    }

    #[test]
    fn descending_reverses_order() {
        let mut docs = generate(200, 4);
        apply_sort(&mut docs, &parse_sort("issueDate:desc").unwrap());
        for pair in docs.windows(2) {
            assert!(pair[0].issue_date >= pair[1].issue_date);
        }
    }

    #[test]
    fn secondary_key_breaks_ties() {
        let mut docs = generate(300, 9);
        apply_sort(&mut docs, &parse_sort("status,amount:desc").unwrap());
        for pair in docs.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.status.as_str() <= b.status.as_str());
            if a.status == b.status {
                assert!(a.total_amount.amount >= b.total_amount.amount);
            }
        }
    }

    #[test]
    fn ties_keep_original_order() {
        let original = generate(300, 12);
        let mut sorted = original.clone();
        apply_sort(&mut sorted, &parse_sort("currency").unwrap());

        let position = |id: &str| original.iter().position(|d| d.id == id).unwrap();
        for pair in sorted.windows(2) {
            if pair[0].total_amount.currency == pair[1].total_amount.currency {
                assert!(position(&pair[0].id) < position(&pair[1].id));
            }
        }
    }

    #[test]
    fn nulls_last_ascending() {
        let mut docs = generate(100, 21);
        apply_sort(&mut docs, &parse_sort("description").unwrap());
        let first_null = docs.iter().position(|d| d.description.is_none()).unwrap();
        assert!(docs[first_null..].iter().all(|d| d.description.is_none()));
    }

    #[test]
    fn created_at_orders_fractional_and_whole_seconds() {
        use time::macros::datetime;

        let mut docs = generate(3, 5);
        docs[0].id = "latest".to_string();
        docs[0].created_at = datetime!(2024-03-01 10:00:00.12 UTC);
        docs[1].id = "middle".to_string();
        docs[1].created_at = datetime!(2024-03-01 10:00:00.1 UTC);
        docs[2].id = "earliest".to_string();
        docs[2].created_at = datetime!(2024-03-01 10:00:00 UTC);

        let keys = parse_sort("createdAt:asc").unwrap();
        apply_sort(&mut docs, &keys);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["earliest", "middle", "latest"]);

        let keys = parse_sort("createdAt:desc").unwrap();
        apply_sort(&mut docs, &keys);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["latest", "middle", "earliest"]);
    }
}
