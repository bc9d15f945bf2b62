//! Property tests for the cursor paginator, sorting, and the generator.

use findoc_core::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_sort_expr() -> impl Strategy<Value = String> {
    let field = prop_oneof![
        Just("amount"),
        Just("status"),
        Just("currency"),
        Just("issueDate"),
        Just("dueDate"),
        Just("description"),
        Just("counterparty"),
        Just("lineItemCount"),
    ];
    let direction = prop_oneof![Just(""), Just(":asc"), Just(":desc")];
    prop::collection::vec((field, direction), 1..3).prop_map(|keys| {
        keys.into_iter()
            .map(|(f, d)| format!("{f}{d}"))
            .collect::<Vec<_>>()
            .join(",")
    })
}

/// Walk every page forward from the start, returning the pages.
fn walk(items: &[u32], limit: i64) -> Vec<Page<u32>> {
    let mut pages = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = paginate(items.to_vec(), limit, cursor.as_deref()).unwrap();
        cursor = page.next_cursor.clone();
        pages.push(page);
        if cursor.is_none() {
            break;
        }
    }
    pages
}

// ---------------------------------------------------------------------------
// Cursors and pagination
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn cursor_round_trips(offset in 0usize..10_000_000) {
        prop_assert_eq!(decode_cursor(&encode_cursor(offset)).unwrap(), offset);
    }

    #[test]
    fn forward_walk_covers_every_item_once(len in 0usize..400, limit in -5i64..150) {
        let items: Vec<u32> = (0..len as u32).collect();
        let pages = walk(&items, limit);

        let seen: Vec<u32> = pages.iter().flat_map(|p| p.data.iter().copied()).collect();
        prop_assert_eq!(&seen, &items);

        let effective = clamp_limit(limit);
        prop_assert!(pages.iter().all(|p| p.data.len() <= effective));
        let last = pages.last().unwrap();
        prop_assert!(!last.has_more);
        prop_assert!(last.next_cursor.is_none());
        prop_assert!(pages.first().unwrap().prev_cursor.is_none());
    }

    #[test]
    fn prev_cursor_returns_previous_window(len in 1usize..400, limit in 1i64..100) {
        let items: Vec<u32> = (0..len as u32).collect();
        let pages = walk(&items, limit);
        for pair in pages.windows(2) {
            let back = pair[1].prev_cursor.as_deref();
            prop_assert!(back.is_some());
            let previous = paginate(items.clone(), limit, back).unwrap();
            prop_assert_eq!(&previous.data, &pair[0].data);
        }
    }
}

// ---------------------------------------------------------------------------
// Sorting and generation
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn generation_is_deterministic(count in 0usize..120, seed in any::<u64>()) {
        prop_assert_eq!(generate(count, seed), generate(count, seed));
    }

    #[test]
    fn sort_is_a_stable_permutation(seed in any::<u64>(), expr in arb_sort_expr()) {
        let docs = generate(80, seed);
        let query = Query::parse(None, Some(&expr)).unwrap();
        let sorted = query.apply(docs.clone());

        prop_assert_eq!(sorted.len(), docs.len());
        let position = |id: &str| docs.iter().position(|d| d.id == id).unwrap();
        for pair in sorted.windows(2) {
            let ord = query
                .sort
                .iter()
                .map(|key| key.compare(&pair[0], &pair[1]))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal);
            prop_assert!(ord.is_le());
            if ord.is_eq() {
                prop_assert!(position(&pair[0].id) < position(&pair[1].id));
            }
        }
    }

    #[test]
    fn generated_totals_match_line_items(seed in any::<u64>()) {
        for doc in generate(60, seed) {
            prop_assert_eq!(Some(doc.total_amount.amount), doc.line_items_total());
            prop_assert!(doc.updated_at >= doc.created_at);
            prop_assert_eq!(doc.version as usize, doc.history.len() + 1);
        }
    }
}
