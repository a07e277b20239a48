//! Street-variant detective: greedy single-linkage clustering of raw street
//! spellings into reviewable rewrite candidates.
//!
//! The representative of each group is simply the first variant in lexicographic
//! order. It is a suggestion for a human reviewer, not a claim about which
//! spelling is correct.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::CandidatePair;
use crate::normalize::fold_text;

pub mod similarity;

use similarity::{ScorerKind, SequenceRatio, SimilarityScorer};

/// Tokens removed before comparing two variants. Kept apart from the
/// canonicalization rules; these never reach the stored canonical form.
const DEFAULT_COMPARISON_TOKENS: &[&str] = &[
    "AV.", "AV ", "CALLE ", "DR.", "DR ", "GRAL.", "GRAL ", "PJE ", "PJE.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRules {
    tokens: Vec<String>,
}

impl Default for ComparisonRules {
    fn default() -> Self {
        Self {
            tokens: DEFAULT_COMPARISON_TOKENS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ComparisonRules {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn comparison_key(&self, variant: &str) -> String {
        let mut key = fold_text(variant);
        for token in &self.tokens {
            key = key.replace(token.as_str(), "");
        }
        key.trim().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectiveConfig {
    /// Link when similarity is strictly greater than this. Range (0, 1].
    pub threshold: f64,
    /// Variants shorter than this many characters are ignored.
    pub min_variant_len: usize,
    /// Also link when the representative key (longer than this) is contained in the candidate key.
    pub containment_min_len: Option<usize>,
    pub scorer: ScorerKind,
    pub parallel: bool,
}

impl Default for DetectiveConfig {
    fn default() -> Self {
        Self {
            threshold: 0.85,
            min_variant_len: 4,
            containment_min_len: None,
            scorer: ScorerKind::Sequence,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantGroup {
    pub representative: String,
    pub members: Vec<String>,
}

impl VariantGroup {
    pub fn candidate_pairs(&self) -> impl Iterator<Item = CandidatePair> + '_ {
        self.members.iter().map(|m| CandidatePair {
            variant: m.clone(),
            canonical_suggestion: self.representative.clone(),
        })
    }
}

pub struct DuplicateDetective {
    scorer: Box<dyn SimilarityScorer>,
    rules: ComparisonRules,
    min_variant_len: usize,
    containment_min_len: Option<usize>,
    parallel: bool,
}

impl Default for DuplicateDetective {
    fn default() -> Self {
        Self::new(Box::new(SequenceRatio))
    }
}

impl std::fmt::Debug for DuplicateDetective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateDetective")
            .field("scorer", &self.scorer.name())
            .field("rules", &self.rules)
            .field("min_variant_len", &self.min_variant_len)
            .field("containment_min_len", &self.containment_min_len)
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl DuplicateDetective {
    pub fn new(scorer: Box<dyn SimilarityScorer>) -> Self {
        let defaults = DetectiveConfig::default();
        Self {
            scorer,
            rules: ComparisonRules::default(),
            min_variant_len: defaults.min_variant_len,
            containment_min_len: defaults.containment_min_len,
            parallel: defaults.parallel,
        }
    }

    pub fn from_config(cfg: &DetectiveConfig) -> Self {
        Self {
            scorer: cfg.scorer.build(),
            rules: ComparisonRules::default(),
            min_variant_len: cfg.min_variant_len,
            containment_min_len: cfg.containment_min_len,
            parallel: cfg.parallel,
        }
    }

    pub fn with_rules(mut self, rules: ComparisonRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_min_variant_len(mut self, n: usize) -> Self {
        self.min_variant_len = n;
        self
    }

    pub fn with_containment(mut self, min_len: Option<usize>) -> Self {
        self.containment_min_len = min_len;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn linked(&self, rep_key: &str, key: &str, threshold: f64) -> bool {
        if self.scorer.score(rep_key, key) > threshold {
            return true;
        }
        match self.containment_min_len {
            Some(n) => rep_key.chars().count() > n && key.contains(rep_key),
            None => false,
        }
    }

    /// Groups of two or more variants, in representative order.
    pub fn groups<I, S>(&self, variants: I, threshold: f64) -> Vec<VariantGroup>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let candidates: Vec<String> = variants
            .into_iter()
            .map(|v| v.as_ref().trim().to_string())
            .filter(|v| v.chars().count() >= self.min_variant_len)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let keys: Vec<String> = candidates
            .iter()
            .map(|v| self.rules.comparison_key(v))
            .collect();

        let mut assigned = vec![false; candidates.len()];
        let mut groups = Vec::new();
        for rep in 0..candidates.len() {
            if assigned[rep] {
                continue;
            }
            let open: Vec<usize> = (0..candidates.len())
                .filter(|&j| j != rep && !assigned[j])
                .collect();
            // Scores only depend on the representative; assignment stays in candidate order
            let hits: Vec<usize> = if self.parallel {
                open.par_iter()
                    .copied()
                    .filter(|&j| self.linked(&keys[rep], &keys[j], threshold))
                    .collect()
            } else {
                open.iter()
                    .copied()
                    .filter(|&j| self.linked(&keys[rep], &keys[j], threshold))
                    .collect()
            };
            if hits.is_empty() {
                continue;
            }
            assigned[rep] = true;
            for &j in &hits {
                assigned[j] = true;
            }
            groups.push(VariantGroup {
                representative: candidates[rep].clone(),
                members: hits.iter().map(|&j| candidates[j].clone()).collect(),
            });
        }
        log::info!(
            "detective: {} variants -> {} groups (scorer={}, threshold={})",
            candidates.len(),
            groups.len(),
            self.scorer.name(),
            threshold
        );
        groups
    }

    pub fn cluster<I, S>(&self, variants: I, threshold: f64) -> Vec<CandidatePair>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.groups(variants, threshold)
            .iter()
            .flat_map(|g| g.candidate_pairs())
            .collect()
    }
}
