//! Offset cursors and page slicing.
//!
//! A cursor is the standard base64 encoding of the ASCII decimal offset into
//! one specific filtered + sorted result set (`0` encodes as `"MA=="`). The
//! cursor is not bound to that result set; reusing it against another filter
//! or sort silently yields a different window.
//!
//! No total count is computed; `has_more` is the only completeness signal.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 100;
pub const DEFAULT_LIMIT: i64 = 20;

/// Encode an absolute zero-based offset.
pub fn encode_cursor(offset: usize) -> String {
    BASE64.encode(offset.to_string())
}

/// Decode a cursor back to its offset.
pub fn decode_cursor(cursor: &str) -> Result<usize, ValidationError> {
    let format_err = || ValidationError::InvalidCursorFormat {
        cursor: cursor.to_string(),
    };
    let bytes = BASE64.decode(cursor).map_err(|_| format_err())?;
    let text = std::str::from_utf8(&bytes).map_err(|_| format_err())?;
    // A bare decimal: no sign other than `-`, no whitespace.
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format_err());
    }
    let value: i64 = text.parse().map_err(|_| format_err())?;
    if value < 0 {
        return Err(ValidationError::InvalidCursorValue {
            cursor: cursor.to_string(),
        });
    }
    usize::try_from(value).map_err(|_| ValidationError::InvalidCursorValue {
        cursor: cursor.to_string(),
    })
}

/// Clamp a requested page size into `MIN_LIMIT..=MAX_LIMIT`. Out-of-range
/// requests are clamped, never rejected.
pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(MIN_LIMIT, MAX_LIMIT) as usize
}

/// One window of an ordered result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
}

/// Slice `items` starting at `start`.
///
/// `next_cursor` is present iff `start + limit < len` and encodes
/// `start + limit`. `prev_cursor` is present iff `start > 0` and encodes
/// `start - limit` floored at zero; it is recomputed arithmetically, not
/// remembered from the previous request.
pub fn paginate_from<T>(items: Vec<T>, limit: i64, start: usize) -> Page<T> {
    let limit = clamp_limit(limit);
    let len = items.len();
    let end = start.saturating_add(limit);
    let has_more = end < len;
    let data: Vec<T> = items.into_iter().skip(start).take(limit).collect();
    Page {
        data,
        has_more,
        next_cursor: has_more.then(|| encode_cursor(end)),
        prev_cursor: (start > 0).then(|| encode_cursor(start.saturating_sub(limit))),
    }
}

/// Decode `cursor` (absent means offset 0) and slice `items`.
pub fn paginate<T>(
    items: Vec<T>,
    limit: i64,
    cursor: Option<&str>,
) -> Result<Page<T>, ValidationError> {
    let start = cursor.map(decode_cursor).transpose()?.unwrap_or(0);
    Ok(paginate_from(items, limit, start))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_encodes_to_literal() {
        assert_eq!(encode_cursor(0), "MA==");
        assert_eq!(decode_cursor("MA==").unwrap(), 0);
        assert_eq!(encode_cursor(20), "MjA=");
    }

    #[test]
    fn garbage_is_a_format_error() {
        for bad in ["not base64!", "YWJj", ""] {
            assert!(
                matches!(
                    decode_cursor(bad),
                    Err(ValidationError::InvalidCursorFormat { .. })
                ),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn only_bare_decimal_payloads_decode() {
        assert_eq!(BASE64.encode("+5"), "KzU=");
        for payload in ["+5", " 5", "5 ", "5\n", "-", "1e3", "0x10"] {
            let cursor = BASE64.encode(payload);
            assert!(
                matches!(
                    decode_cursor(&cursor),
                    Err(ValidationError::InvalidCursorFormat { .. })
                ),
                "{payload:?}"
            );
        }
        assert!(matches!(
            decode_cursor(" MA=="),
            Err(ValidationError::InvalidCursorFormat { .. })
        ));
        assert_eq!(decode_cursor(&BASE64.encode("007")).unwrap(), 7);
    }

    #[test]
    fn negative_offset_is_a_value_error() {
        let cursor = BASE64.encode("-5");
        assert!(matches!(
            decode_cursor(&cursor),
            Err(ValidationError::InvalidCursorValue { .. })
        ));
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(-40), 1);
        assert_eq!(clamp_limit(250), 100);
        assert_eq!(clamp_limit(37), 37);

        let page = paginate_from((0..500).collect(), 1_000, 0);
        assert_eq!(page.data.len(), 100);
    }

    #[test]
    fn first_middle_and_last_pages() {
        let items: Vec<u32> = (0..25).collect();

        let first = paginate(items.clone(), 10, None).unwrap();
        assert_eq!(first.data, (0..10).collect::<Vec<_>>());
        assert!(first.has_more);
        assert_eq!(first.next_cursor.as_deref(), Some("MTA="));
        assert_eq!(first.prev_cursor, None);

        let middle = paginate(items.clone(), 10, first.next_cursor.as_deref()).unwrap();
        assert_eq!(middle.data, (10..20).collect::<Vec<_>>());
        assert_eq!(middle.prev_cursor.as_deref(), Some("MA=="));

        let last = paginate(items, 10, middle.next_cursor.as_deref()).unwrap();
        assert_eq!(last.data, (20..25).collect::<Vec<_>>());
        assert!(!last.has_more);
        assert_eq!(last.next_cursor, None);
        assert_eq!(last.prev_cursor.as_deref(), Some("MTA="));
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let page = paginate_from((0..20).collect::<Vec<u32>>(), 10, 10);
        assert!(!page.has_more);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn prev_is_floored_at_zero() {
        let page = paginate_from((0..30).collect::<Vec<u32>>(), 10, 4);
        assert_eq!(page.prev_cursor, Some(encode_cursor(0)));
    }

    #[test]
    fn offset_past_end_is_empty() {
        let page = paginate_from((0..5).collect::<Vec<u32>>(), 10, 50);
        assert!(page.data.is_empty());
        assert!(!page.has_more);
        assert_eq!(page.prev_cursor, Some(encode_cursor(40)));
    }

    #[test]
    fn page_serializes_with_camel_case() {
        let page = paginate_from(vec![1, 2, 3], 2, 0);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["hasMore"], true);
        assert_eq!(json["nextCursor"], "Mg==");
        assert!(json["prevCursor"].is_null());
    }
}
