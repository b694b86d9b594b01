//! Edit-distance primitives for approximate name matching.
//!
//! All distances work on `char` slices of already-normalized text (see
//! [`rollbook_core::normalize_text`]). The public scorer,
//! [`field_distance`], folds whole-string and substring alignment into a
//! single distance in [0, 1].

use rollbook_core::defaults::{MIN_PARTIAL_MATCH_LEN, PARTIAL_COVERAGE_PENALTY};

/// Optimal string alignment distance: Levenshtein plus transposition of
/// two adjacent characters, each substring edited at most once.
pub fn osa_distance(a: &[char], b: &[char]) -> usize {
    let (n, m) = (a.len(), b.len());
    if n == 0 {
        return m;
    }
    if m == 0 {
        return n;
    }

    let mut prev2: Vec<usize> = vec![0; m + 1];
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr: Vec<usize> = vec![0; m + 1];

    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut d = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d = d.min(prev2[j - 2] + 1);
            }
            curr[j] = d;
        }
        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m]
}

/// Smallest OSA distance between `needle` and any substring of `haystack`.
///
/// The alignment may start and end anywhere in `haystack` at no cost, so
/// an exact occurrence scores 0.
pub fn substring_distance(needle: &[char], haystack: &[char]) -> usize {
    let (n, m) = (needle.len(), haystack.len());
    if n == 0 {
        return 0;
    }
    if m == 0 {
        return n;
    }

    let mut prev2: Vec<usize> = vec![0; m + 1];
    let mut prev: Vec<usize> = vec![0; m + 1];
    let mut curr: Vec<usize> = vec![0; m + 1];

    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = usize::from(needle[i - 1] != haystack[j - 1]);
            let mut d = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
            if i > 1 && j > 1 && needle[i - 1] == haystack[j - 2] && needle[i - 2] == haystack[j - 1]
            {
                d = d.min(prev2[j - 2] + 1);
            }
            curr[j] = d;
        }
        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    prev.iter().copied().min().unwrap_or(n)
}

/// Distance between a query and one searchable field, in [0, 1].
///
/// The best of:
/// - whole-string OSA distance over the longer length;
/// - the query found inside a longer field, penalized by how much of the
///   field it leaves uncovered;
/// - the field found inside a longer query ("bottom closed guard" contains
///   "closed guard"), penalized the same way.
///
/// Substring alignment needs the shorter side to have at least
/// [`MIN_PARTIAL_MATCH_LEN`] chars, so "o" is not a partial hit on "mount".
///
/// Empty inputs are maximally distant.
pub fn field_distance(query: &[char], field: &[char]) -> f32 {
    if query.is_empty() || field.is_empty() {
        return 1.0;
    }

    let (ql, fl) = (query.len() as f32, field.len() as f32);
    let mut best = osa_distance(query, field) as f32 / ql.max(fl);

    if query.len().min(field.len()) >= MIN_PARTIAL_MATCH_LEN {
        let (short, long) = if query.len() <= field.len() {
            (query, field)
        } else {
            (field, query)
        };
        let (sl, ll) = (short.len() as f32, long.len() as f32);
        let partial =
            substring_distance(short, long) as f32 / sl + PARTIAL_COVERAGE_PENALTY * (1.0 - sl / ll);
        best = best.min(partial);
    }

    best.clamp(0.0, 1.0)
}
