//! Similarity scorers for street-variant comparison. All scores are in 0.0..=1.0.

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

pub trait SimilarityScorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;
    fn name(&self) -> &'static str;
}

/// Block-matching ratio: `2*M / (|a| + |b|)` where `M` is the total length of the
/// recursive longest-common-block decomposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRatio;

#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinRatio;

#[derive(Debug, Clone, Copy, Default)]
pub struct JaroWinkler;

impl SimilarityScorer for SequenceRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        sequence_ratio(a, b)
    }
    fn name(&self) -> &'static str {
        "sequence"
    }
}

impl SimilarityScorer for LevenshteinRatio {
    fn score(&self, a: &str, b: &str) -> f64 {
        normalized_levenshtein(a, b)
    }
    fn name(&self) -> &'static str {
        "levenshtein"
    }
}

impl SimilarityScorer for JaroWinkler {
    fn score(&self, a: &str, b: &str) -> f64 {
        jaro_winkler(a, b)
    }
    fn name(&self) -> &'static str {
        "jaro_winkler"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    #[default]
    Sequence,
    Levenshtein,
    JaroWinkler,
}

impl ScorerKind {
    pub fn build(&self) -> Box<dyn SimilarityScorer> {
        match self {
            ScorerKind::Sequence => Box::new(SequenceRatio),
            ScorerKind::Levenshtein => Box::new(LevenshteinRatio),
            ScorerKind::JaroWinkler => Box::new(JaroWinkler),
        }
    }
}

pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0usize;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
/// Ties go to the smallest `i`, then the smallest `j`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo + 1;
    let mut best = (alo, blo, 0usize);
    // run[j - blo + 1] = length of the common run ending at (i, j)
    let mut prev = vec![0usize; width];
    let mut cur = vec![0usize; width];
    for i in alo..ahi {
        for j in blo..bhi {
            let k = if a[i] == b[j] { prev[j - blo] + 1 } else { 0 };
            cur[j - blo + 1] = k;
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}
