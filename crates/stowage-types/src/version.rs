//! Version ordering.
//!
//! Versions are split into items at `.` and `-` and at every digit/letter
//! transition. Numeric items compare numerically, so `1.10` sorts after
//! `1.9`. Qualifiers rank `alpha < beta < milestone < rc < snapshot <
//! release < sp`, and any unknown qualifier ranks above all of them,
//! compared case-insensitively. A numeric item always outranks a qualifier,
//! and a number introduced by `.` outranks one introduced by `-`, so
//! `1-1 < 1.1`.
//! Trailing zeros and release qualifiers are insignificant: `1.0 == 1.0.0 ==
//! 1-final`.

use std::cmp::Ordering;
use std::fmt;

/// A version string paired with its parsed ordering key.
#[derive(Clone, Debug)]
pub struct ComparableVersion {
    raw: String,
    items: Vec<Item>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Item {
    /// Decimal digits with leading zeros removed (`"0"` for zero).
    Number { value: String, dotted: bool },
    /// Lower-cased qualifier.
    Qualifier(String),
}

impl ComparableVersion {
    pub fn new(version: &str) -> Self {
        let mut items = tokenize(version);
        while items.last().is_some_and(Item::is_null) {
            items.pop();
        }
        Self {
            raw: version.to_string(),
            items,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for ComparableVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ComparableVersion {}

impl PartialOrd for ComparableVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ComparableVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        for i in 0..len {
            let ord = compare_items(self.items.get(i), other.items.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for ComparableVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compare two version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    ComparableVersion::new(a).cmp(&ComparableVersion::new(b))
}

impl Item {
    fn is_null(&self) -> bool {
        match self {
            Item::Number { value, .. } => value == "0",
            Item::Qualifier(q) => qualifier_rank(q) == RELEASE_RANK,
        }
    }
}

const RELEASE_RANK: u8 = 5;
const UNKNOWN_RANK: u8 = 7;

fn qualifier_rank(qualifier: &str) -> u8 {
    match qualifier {
        "alpha" => 0,
        "beta" => 1,
        "milestone" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => 6,
        _ => UNKNOWN_RANK,
    }
}

fn compare_items(a: Option<&Item>, b: Option<&Item>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(item), None) => compare_to_release(item),
        (None, Some(item)) => compare_to_release(item).reverse(),
        (
            Some(Item::Number { value: x, dotted: dx }),
            Some(Item::Number { value: y, dotted: dy }),
        ) => dx
            .cmp(dy)
            .then_with(|| x.len().cmp(&y.len()))
            .then_with(|| x.cmp(y)),
        (Some(Item::Number { .. }), Some(Item::Qualifier(_))) => Ordering::Greater,
        (Some(Item::Qualifier(_)), Some(Item::Number { .. })) => Ordering::Less,
        (Some(Item::Qualifier(x)), Some(Item::Qualifier(y))) => qualifier_rank(x)
            .cmp(&qualifier_rank(y))
            .then_with(|| x.cmp(y)),
    }
}

/// Compare an item against the implicit release item of a shorter version.
fn compare_to_release(item: &Item) -> Ordering {
    match item {
        Item::Number { value, .. } if value == "0" => Ordering::Equal,
        Item::Number { .. } => Ordering::Greater,
        Item::Qualifier(q) => qualifier_rank(q).cmp(&RELEASE_RANK),
    }
}

fn tokenize(version: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut numeric = false;
    // The first item counts as dotted; `-` and digit/letter transitions don't.
    let mut dotted = true;

    let flush = |current: &mut String, numeric: bool, dotted: bool, items: &mut Vec<Item>| {
        if current.is_empty() {
            return;
        }
        let token = std::mem::take(current);
        if numeric {
            let trimmed = token.trim_start_matches('0');
            let value = if trimmed.is_empty() { "0" } else { trimmed };
            items.push(Item::Number {
                value: value.to_string(),
                dotted,
            });
        } else {
            items.push(Item::Qualifier(token.to_lowercase()));
        }
    };

    for ch in version.chars() {
        match ch {
            '.' => {
                flush(&mut current, numeric, dotted, &mut items);
                dotted = true;
            }
            '-' | '_' => {
                flush(&mut current, numeric, dotted, &mut items);
                dotted = false;
            }
            _ => {
                let is_digit = ch.is_ascii_digit();
                if !current.is_empty() && is_digit != numeric {
                    flush(&mut current, numeric, dotted, &mut items);
                    dotted = false;
                }
                numeric = is_digit;
                current.push(ch);
            }
        }
    }
    flush(&mut current, numeric, dotted, &mut items);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_order(lower: &str, higher: &str) {
        assert_eq!(
            compare_versions(lower, higher),
            Ordering::Less,
            "{lower} < {higher}"
        );
        assert_eq!(
            compare_versions(higher, lower),
            Ordering::Greater,
            "{higher} > {lower}"
        );
    }

    #[test]
    fn numeric_segments_compare_numerically() {
        assert_order("1.9", "1.10");
        assert_order("1.0", "1.0.1");
        assert_order("1.0.1", "1.1");
        assert_order("1.10", "2.0");
        assert_order("8.0.5", "8.1");
        assert_order("7.0", "12.2.0.1");
    }

    #[test]
    fn trailing_zeros_are_insignificant() {
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1", "1.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.0", "1.0-final"), Ordering::Equal);
        assert_eq!(compare_versions("01.2", "1.2"), Ordering::Equal);
    }

    #[test]
    fn qualifiers_rank_below_release() {
        assert_order("1.0-alpha-1", "1.0-beta");
        assert_order("1.0-beta", "1.0-milestone-1");
        assert_order("1.0-milestone-1", "1.0-rc1");
        assert_order("1.0-rc1", "1.0-SNAPSHOT");
        assert_order("1.0-SNAPSHOT", "1.0");
        assert_order("1.0", "1.0-sp1");
        assert_order("1.0-sp1", "1.0-custom");
    }

    #[test]
    fn numbers_outrank_qualifiers() {
        assert_order("1.0-custom", "1.0.1");
        assert_order("1.0-SNAPSHOT", "1.0.1-SNAPSHOT");
    }

    #[test]
    fn snapshot_builds_order_by_timestamp_then_build() {
        assert_order("2.0-20240101.120000-1", "2.0-20240102.120000-2");
        assert_order("2.0-20240101.120000-1", "2.0-20240101.120000-2");
        assert_order("2.0-20240101.120000-9", "2.0.1-20230101.120000-1");
    }

    #[test]
    fn dash_numbers_rank_below_dot_numbers() {
        assert_order("1-1", "1.1");
        assert_order("1", "1-1");
    }

    #[test]
    fn large_numbers_do_not_overflow() {
        assert_order("1.99999999999999999999", "1.100000000000000000000");
    }

    #[test]
    fn sorting_a_version_list() {
        let mut versions: Vec<ComparableVersion> = ["1.10", "1.2", "1.0-SNAPSHOT", "1.0", "1.2.1"]
            .iter()
            .map(|v| ComparableVersion::new(v))
            .collect();
        versions.sort();
        let sorted: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(sorted, vec!["1.0-SNAPSHOT", "1.0", "1.2", "1.2.1", "1.10"]);
    }
}
