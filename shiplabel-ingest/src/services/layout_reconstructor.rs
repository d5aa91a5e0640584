//! Reading-order reconstruction for PDF text tokens
//!
//! Tokens are ordered top of page first (PDF `y` grows upward). Tokens whose
//! `y` differ by at most [`LINE_TOLERANCE`] share a line and are ordered left
//! to right. The ordered texts are joined with single spaces; line structure
//! is not kept here; the field extractor recovers pseudo-lines from runs of
//! two or more spaces.
//!
//! The tolerance comparison is not transitive (a~b and b~c do not imply
//! a~c), so `slice::sort_by` cannot be used: it requires a total order and
//! may panic without one. A stable merge sort applies the pairwise rule
//! exactly and always terminates.

use std::cmp::Ordering;

use crate::models::{PageTokens, RawToken};

/// Maximum vertical distance for two tokens to count as one line
pub const LINE_TOLERANCE: f64 = 1.0;

/// Pairwise reading-order rule
pub fn reading_order(a: &RawToken, b: &RawToken) -> Ordering {
    if (b.y - a.y).abs() > LINE_TOLERANCE {
        // Higher y first
        b.y.total_cmp(&a.y)
    } else {
        a.x.total_cmp(&b.x)
    }
}

/// Concatenate tokens in reading order
///
/// Never fails; no tokens yields an empty string.
pub fn reconstruct(tokens: &[RawToken]) -> String {
    let mut ordered: Vec<&RawToken> = tokens.iter().collect();
    stable_merge_sort_by(&mut ordered, |a, b| reading_order(a, b));

    ordered
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Concatenate the tokens of all pages (in page order) and reconstruct
pub fn reconstruct_pages(pages: &[PageTokens]) -> String {
    let tokens: Vec<RawToken> = pages.iter().flat_map(|p| p.tokens.iter().cloned()).collect();
    let text = reconstruct(&tokens);

    tracing::debug!(
        pages = pages.len(),
        tokens = tokens.len(),
        chars = text.len(),
        "Reconstructed reading order"
    );

    text
}

/// Stable top-down merge sort tolerant of non-transitive comparators
fn stable_merge_sort_by<T: Copy, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    fn sort<T: Copy, F: FnMut(&T, &T) -> Ordering>(items: &mut [T], compare: &mut F) {
        let len = items.len();
        if len < 2 {
            return;
        }

        let mid = len / 2;
        sort(&mut items[..mid], compare);
        sort(&mut items[mid..], compare);

        let mut merged = Vec::with_capacity(len);
        let (mut i, mut j) = (0, mid);
        while i < mid && j < len {
            // Take from the right only when strictly smaller: keeps ties stable
            if compare(&items[j], &items[i]) == Ordering::Less {
                merged.push(items[j]);
                j += 1;
            } else {
                merged.push(items[i]);
                i += 1;
            }
        }
        merged.extend_from_slice(&items[i..mid]);
        merged.extend_from_slice(&items[j..len]);
        items.copy_from_slice(&merged);
    }

    sort(items, &mut compare);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, x: f64, y: f64) -> RawToken {
        RawToken::new(text, x, y, 1)
    }

    #[test]
    fn test_top_line_first_left_to_right() {
        let tokens = vec![tok("B", 5.0, 10.0), tok("A", 1.0, 10.0), tok("C", 1.0, 20.0)];
        assert_eq!(reconstruct(&tokens), "C A B");
    }

    #[test]
    fn test_tolerance_band_groups_near_lines() {
        // 0.8 apart: same line, ordered by x
        let tokens = vec![tok("right", 50.0, 100.8), tok("left", 10.0, 100.0)];
        assert_eq!(reconstruct(&tokens), "left right");

        // 1.5 apart: separate lines, ordered by y
        let tokens = vec![tok("lower", 10.0, 100.0), tok("upper", 50.0, 101.5)];
        assert_eq!(reconstruct(&tokens), "upper lower");
    }

    #[test]
    fn test_exactly_one_unit_is_same_line() {
        let tokens = vec![tok("second", 20.0, 11.0), tok("first", 10.0, 10.0)];
        assert_eq!(reconstruct(&tokens), "first second");
    }

    #[test]
    fn test_equal_positions_keep_input_order() {
        let tokens = vec![tok("one", 5.0, 10.0), tok("two", 5.0, 10.0), tok("three", 5.0, 10.0)];
        assert_eq!(reconstruct(&tokens), "one two three");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(reconstruct(&[]), "");
        assert_eq!(reconstruct_pages(&[]), "");
    }

    #[test]
    fn test_non_transitive_chain_does_not_panic() {
        // Each neighbour is within tolerance, the ends are not
        let tokens: Vec<RawToken> = (0..200)
            .map(|i| tok(&i.to_string(), (200 - i) as f64, i as f64 * 0.6))
            .collect();
        let text = reconstruct(&tokens);
        assert_eq!(text.split(' ').count(), 200);
    }

    #[test]
    fn test_pages_are_concatenated() {
        let pages = vec![
            PageTokens { page: 1, tokens: vec![tok("SHIP", 1.0, 700.0)] },
            PageTokens { page: 2, tokens: vec![tok("TO:", 2.0, 700.0)] },
        ];
        assert_eq!(reconstruct_pages(&pages), "SHIP TO:");
    }
}
