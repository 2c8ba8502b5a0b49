//! Page-range expressions
//!
//! Turns user-typed text such as `"1-3, 5, 9-10"` into a [`PageSelection`]
//! of zero-based page indices. Parsing is lenient: segments that are not a
//! number or a `start-end` pair are skipped instead of failing the whole
//! expression, so the function never errors. Callers decide what an empty
//! selection means for their operation.
//!
//! Numbers are read the way a browser form reads them: leading whitespace and
//! an optional sign, then the leading run of digits. Whatever follows the
//! digits is ignored, so `"2a"` is page 2 and `"1.5"` is page 1.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Highest 1-based page number that still maps onto a `u32` index.
const MAX_PAGE_NUMBER: i64 = u32::MAX as i64 + 1;

/// Upper bound on the number of indices one expression can produce.
/// Ranges are cut off once the selection reaches it.
pub const MAX_SELECTION_LEN: usize = 1 << 20;

/// Ordered, possibly repeating, zero-based page indices.
///
/// Order is the order of appearance in the expression. Nothing is sorted or
/// deduplicated: `"3,1,1"` selects page 3, then page 1 twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSelection {
    indices: Vec<u32>,
}

impl PageSelection {
    /// Parse a page-range expression. See [`parse_page_range`].
    pub fn parse(expression: &str) -> Self {
        parse_page_range(expression)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.indices
    }

    pub fn into_vec(self) -> Vec<u32> {
        self.indices
    }

    /// 1-based page numbers, the numbering `lopdf` uses for `get_pages`.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.indices.iter().map(|&i| i.saturating_add(1)).collect()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.indices.contains(&index)
    }
}

impl From<Vec<u32>> for PageSelection {
    fn from(indices: Vec<u32>) -> Self {
        Self { indices }
    }
}

impl FromStr for PageSelection {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_page_range(s))
    }
}

impl fmt::Display for PageSelection {
    /// Writes the selection back as 1-based page numbers, e.g. `1,2,5`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, page) in self.page_numbers().into_iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", page)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PageSelection {
    type Item = u32;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter().copied()
    }
}

/// Parse a comma-separated list of 1-based pages and `start-end` ranges into
/// zero-based indices.
///
/// - Blank segments are ignored.
/// - A segment containing `-` yields a range from the number before the first
///   `-` to the number before the second one, so `"1-3-5"` is `1-3`. If either
///   end has no digits the segment is skipped. `start > end` yields nothing.
/// - Page `0` (index `-1`) is dropped.
/// - At most [`MAX_SELECTION_LEN`] indices are produced; a range that would
///   go past the limit is truncated.
pub fn parse_page_range(expression: &str) -> PageSelection {
    let mut indices = Vec::new();

    for segment in expression.split(',') {
        if segment.trim().is_empty() {
            continue;
        }

        let mut parts = segment.split('-');
        let first_part = parts.next().unwrap_or_default();
        match parts.next() {
            Some(end_part) => {
                let (Some(start), Some(end)) = (parse_number(first_part), parse_number(end_part))
                else {
                    continue;
                };
                // Numbers below 1 would become negative indices and are dropped.
                let first = start.max(1);
                let last = end.min(MAX_PAGE_NUMBER);
                if first > last {
                    continue;
                }
                let room = (MAX_SELECTION_LEN - indices.len()) as i64;
                let last = last.min(first.saturating_add(room - 1));
                indices.extend((first..=last).map(|page| (page - 1) as u32));
            }
            None => {
                if let Some(page) = parse_number(segment) {
                    if (1..=MAX_PAGE_NUMBER).contains(&page) && indices.len() < MAX_SELECTION_LEN {
                        indices.push((page - 1) as u32);
                    }
                }
            }
        }
    }

    PageSelection { indices }
}

/// Leading integer of `text`, ignoring anything after the digits.
/// `None` when there are no digits. Saturates instead of overflowing.
pub(crate) fn parse_number(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(digit - b'0'));
    }

    seen.then_some(if negative { -value } else { value })
}
