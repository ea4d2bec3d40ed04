//! Fuzzy string similarity on a 0–100 scale.
//!
//! All metrics are built on the indel-normalized similarity
//! `200 × LCS(a, b) / (|a| + |b|)`, computed over `char`s.
//!
//! | Function | Compares |
//! |----------|----------|
//! | [`ratio`] | Whole strings |
//! | [`partial_ratio`] | Shorter string against the best window of the longer |
//! | [`token_set_ratio`] | Sorted token sets (order and duplicates ignored) |

use std::collections::BTreeSet;

use crate::text::fold_alnum;

/// Indel-normalized similarity of two strings.
///
/// Two empty strings are identical (100); one empty string scores 0.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best [`ratio`] between the shorter string and any equally long window of
/// the longer one, including windows clipped at either edge.
///
/// Tolerates inflection and typos: `partial_ratio("regimen de adopcion",
/// "adopciones")` is high even though the term never occurs literally.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let m = short.len();
    let n = long.len();
    let in_short = |c: &char| short.contains(c);

    let mut best: f64 = 0.0;

    // Windows clipped at the left edge.
    for end in 1..m.min(n) {
        if in_short(&long[end - 1]) {
            best = best.max(ratio_chars(&short, &long[..end]));
        }
    }

    for start in 0..=(n - m) {
        let window = &long[start..start + m];
        // Only windows anchored on a shared char can be optimal.
        if !in_short(&window[0]) && !in_short(&window[m - 1]) {
            continue;
        }
        best = best.max(ratio_chars(&short, window));
        if best >= 100.0 {
            return 100.0;
        }
    }

    // Windows clipped at the right edge.
    for start in (n - m + 1)..n {
        if in_short(&long[start]) {
            best = best.max(ratio_chars(&short, &long[start..]));
        }
    }

    best
}

/// Token-set similarity: case, accents, punctuation, word order and
/// repeated words are ignored.
///
/// If one token set contains the other the result is 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);

    if ta.is_empty() && tb.is_empty() {
        return 100.0;
    }
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let sect: Vec<&str> = ta.intersection(&tb).map(String::as_str).collect();
    let only_a: Vec<&str> = ta.difference(&tb).map(String::as_str).collect();
    let only_b: Vec<&str> = tb.difference(&ta).map(String::as_str).collect();

    if !sect.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let sect = sect.join(" ");
    let combined_a = join_non_empty(&sect, &only_a.join(" "));
    let combined_b = join_non_empty(&sect, &only_b.join(" "));

    ratio(&sect, &combined_a)
        .max(ratio(&sect, &combined_b))
        .max(ratio(&combined_a, &combined_b))
}

fn tokens(s: &str) -> BTreeSet<String> {
    fold_alnum(s).split_whitespace().map(str::to_string).collect()
}

fn join_non_empty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Longest common subsequence length, two-row dynamic programming.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
