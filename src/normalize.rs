//! Street-name canonicalization.
//!
//! Two stages, applied in order and testable on their own:
//! 1. [`OverrideTable`]: exact, human-curated rewrites. A hit returns immediately.
//! 2. [`GenericRules`]: ordered, left-anchored prefix stripping (titles, ranks,
//!    street types, initials).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Fold free text for comparison: strip diacritics, uppercase, trim.
pub fn fold_text(input: &str) -> String {
    fold_untrimmed(input).trim().to_string()
}

fn fold_untrimmed(input: &str) -> String {
    // Decompose to NFD and drop combining marks so "Ñ" folds to "N"
    input
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase()
}

/// Lookup key for the override table: folded, with internal whitespace collapsed.
pub fn canonical_key(input: &str) -> String {
    fold_text(input)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// How much of the string a matching generic rule removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceScope {
    /// Remove every occurrence of the rule text, even mid-name ("AV GUSTAV EIFFEL" -> "GUSTEIFFEL").
    #[default]
    AllOccurrences,
    /// Remove only the anchored leading occurrence.
    LeadingOnly,
}

#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    explicit: HashMap<String, String>,
    // Every canonical target is a fixed point unless it is itself an explicit key
    targets: HashMap<String, String>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut table = Self::new();
        for (k, v) in pairs {
            table.insert(k.as_ref(), v.as_ref());
        }
        table
    }

    /// Add a rewrite; returns the previous target for the same key, if any.
    pub fn insert(&mut self, variant: &str, canonical: &str) -> Option<String> {
        let value = canonical_key(canonical);
        self.targets
            .entry(value.clone())
            .or_insert_with(|| value.clone());
        self.explicit.insert(canonical_key(variant), value)
    }

    pub fn lookup(&self, fragment: &str) -> Option<&str> {
        let key = canonical_key(fragment);
        self.explicit
            .get(&key)
            .or_else(|| self.targets.get(&key))
            .map(|s| s.as_str())
    }

    /// Number of explicit rewrites (implicit fixed points are not counted).
    pub fn len(&self) -> usize {
        self.explicit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.explicit.is_empty()
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.targets.values().map(|s| s.as_str())
    }
}

// Titles, ranks, street types, then single-letter initials. Order is significant.
#[rustfmt::skip]
const DEFAULT_GENERIC_RULES: &[&str] = &[
    "AV.", "AV ", "AVENIDA ",
    "CALLE ",
    "PJE.", "PJE ", "PASAJE ",
    "GRL.", "GRL ", "GRAL ", "GRAL. ", "GENERAL ",
    "DR.", "DR ", "DOC ", "DOCTOR ",
    "ING.", "ING ", "INGENIERO ",
    "ARQ.", "ARQ ", "ARQUITECTO ",
    "PROF.", "PROF ", "PROFESOR ",
    "CNEL.", "CNEL ", "CORONEL ",
    "TTE.", "TTE ", "TENIENTE ",
    "SGTO.", "SGTO ", "SARGENTO ",
    "CAP.", "CAP ", "CAPITAN ",
    "MJOR.", "MJOR ", "MAYOR ",
    "CMTE.", "CMTE ", "COMANDANTE ",
    "ALTE.", "ALTE ", "ALMIRANTE ",
    "MONS.", "MONS ", "MONSENOR ",
    "PBRO.", "PBRO ", "PRESBITERO ",
    "INT.", "INT ", "INTENDENTE ",
    "MAESTRA ", "MAESTRA. ",
    "BV.", "BV ", "BVARD ", "BOULEVARD ",
    "A. ", "A ", "C. ", "C ", "J. ", "J ",
    "H. ", "H ", "L. ", "L ", "M. ", "M ",
    "P. ", "P ", "S. ", "S ",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericRules {
    rules: Vec<String>,
}

impl Default for GenericRules {
    fn default() -> Self {
        Self::new(DEFAULT_GENERIC_RULES.iter().copied())
    }
}

impl GenericRules {
    /// Rules are folded but not trimmed: the trailing space of "C " is part of the rule.
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = rules
            .into_iter()
            .map(|r| fold_untrimmed(r.as_ref()))
            .filter(|r| !r.is_empty())
            .collect();
        Self { rules }
    }

    /// Single pass over the rules; each test is re-anchored against the current string.
    pub fn apply(&self, fragment: &str, scope: ReplaceScope) -> String {
        let mut current = fragment.to_string();
        for rule in &self.rules {
            if !current.starts_with(rule.as_str()) {
                continue;
            }
            current = match scope {
                ReplaceScope::AllOccurrences => current.replace(rule.as_str(), ""),
                ReplaceScope::LeadingOnly => current[rule.len()..].to_string(),
            };
        }
        current
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreetNormalizer {
    overrides: OverrideTable,
    rules: GenericRules,
    scope: ReplaceScope,
}

impl StreetNormalizer {
    pub fn new(overrides: OverrideTable, rules: GenericRules, scope: ReplaceScope) -> Self {
        Self {
            overrides,
            rules,
            scope,
        }
    }

    pub fn with_overrides(overrides: OverrideTable) -> Self {
        Self::new(overrides, GenericRules::default(), ReplaceScope::default())
    }

    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    pub fn normalize(&self, street_raw: &str) -> String {
        let street = fold_text(street_raw);
        if let Some(curated) = self.overrides.lookup(&street) {
            return curated.to_string();
        }
        self.rules.apply(&street, self.scope).trim().to_string()
    }

    /// Override targets that do not survive a second pass, i.e. chained rewrites
    /// such as `A -> B` together with `B -> C`. Sorted.
    pub fn unstable_targets(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .overrides
            .targets()
            .filter(|t| self.normalize(t) != *t)
            .map(|t| t.to_string())
            .collect();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_overrides() -> OverrideTable {
        OverrideTable::from_pairs([
            ("BERUTI", "ANTONIO BERUTTI"),
            ("A BERUTI", "ANTONIO BERUTTI"),
            ("GRAL SAN MARTIN", "AV SAN MARTIN"),
            ("AV. SAN MARTIN", "AV SAN MARTIN"),
            ("BV SAN MARTIN", "BOULEVARD SAN MARTIN"),
            ("PTE PERON", "AV PERON"),
            ("TTE GRAL RICCHIERI", "TENIENTE GENERAL RICCHIERI"),
            ("TRES DE FEBRERO", "3 DE FEBRERO"),
        ])
    }

    #[test]
    fn test_fold_text_diacritics() {
        assert_eq!(fold_text("  Monseñor Larumbe "), "MONSENOR LARUMBE");
        assert_eq!(fold_text("Hipólito Yrigoyen"), "HIPOLITO YRIGOYEN");
        assert_eq!(canonical_key(" av   san\tmartin "), "AV SAN MARTIN");
    }

    #[test]
    fn override_wins_outright() {
        let n = StreetNormalizer::with_overrides(sample_overrides());
        // Generic rules alone would strip "TTE " and then stop at "GRAL RICCHIERI"
        assert_eq!(n.normalize("TTE GRAL RICCHIERI"), "TENIENTE GENERAL RICCHIERI");
        assert_eq!(n.normalize("gral  san martin"), "AV SAN MARTIN");
        assert_eq!(n.normalize("Tres de Febrero"), "3 DE FEBRERO");
    }

    #[test]
    fn override_precedence_for_every_key() {
        let pairs = [
            ("BERUTI", "ANTONIO BERUTTI"),
            ("AV. SAN MARTIN", "AV SAN MARTIN"),
            ("C PELLEGRINI", "CARLOS PELLEGRINI"),
        ];
        let n = StreetNormalizer::with_overrides(OverrideTable::from_pairs(pairs));
        for (k, v) in pairs {
            assert_eq!(n.normalize(k), v, "key {k}");
        }
    }

    #[test]
    fn targets_are_fixed_points() {
        let n = StreetNormalizer::with_overrides(sample_overrides());
        // Without the fixed-point rule these would lose their "AV " / "TENIENTE " prefix
        assert_eq!(n.normalize("AV SAN MARTIN"), "AV SAN MARTIN");
        assert_eq!(n.normalize("AV PERON"), "AV PERON");
        for t in n.overrides().targets() {
            assert_eq!(n.normalize(t), t);
        }
        assert!(n.unstable_targets().is_empty());
    }

    #[test]
    fn chained_overrides_are_reported() {
        let table = OverrideTable::from_pairs([
            ("ALVEAR", "M T DE ALVEAR"),
            ("M T DE ALVEAR", "MARCELO T DE ALVEAR"),
        ]);
        let n = StreetNormalizer::with_overrides(table);
        assert_eq!(n.unstable_targets(), vec!["M T DE ALVEAR".to_string()]);
    }

    #[test]
    fn generic_rules_strip_titles_and_initials() {
        let n = StreetNormalizer::default();
        assert_eq!(n.normalize("AV CORDOBA"), "CORDOBA");
        assert_eq!(n.normalize("DR. LUIS AGOTE"), "LUIS AGOTE");
        assert_eq!(n.normalize("C. TEJEDOR"), "TEJEDOR");
        // Title then initial, stripped in two passes
        assert_eq!(n.normalize("GRAL J LAVALLE"), "LAVALLE");
        assert_eq!(n.normalize("SARMIENTO"), "SARMIENTO");
    }

    #[test]
    fn initial_rule_needs_its_space() {
        let n = StreetNormalizer::default();
        assert_eq!(n.normalize("CORDOBA"), "CORDOBA");
        assert_eq!(n.normalize("ALSINA"), "ALSINA");
        assert_eq!(n.normalize("MITRE"), "MITRE");
    }

    #[test]
    fn period_rule_leaves_leading_space_for_later_rules() {
        // "AV." leaves " C. TEJEDOR"; the initial rule no longer anchors
        let n = StreetNormalizer::default();
        assert_eq!(n.normalize("AV. C. TEJEDOR"), "C. TEJEDOR");
    }

    #[test]
    fn replace_scope_all_vs_leading() {
        let rules = GenericRules::default();
        let all = StreetNormalizer::new(
            OverrideTable::new(),
            rules.clone(),
            ReplaceScope::AllOccurrences,
        );
        let leading =
            StreetNormalizer::new(OverrideTable::new(), rules, ReplaceScope::LeadingOnly);
        assert_eq!(all.normalize("AV GUSTAV EIFFEL"), "GUSTEIFFEL");
        assert_eq!(leading.normalize("AV GUSTAV EIFFEL"), "GUSTAV EIFFEL");
        assert_eq!(all.normalize("CALLE LAS HERAS"), leading.normalize("CALLE LAS HERAS"));
    }

    #[test]
    fn normalize_is_deterministic_and_stable_on_common_outputs() {
        let n = StreetNormalizer::with_overrides(sample_overrides());
        let inputs = [
            "AV CORDOBA",
            "AV.SARMIENTO",
            "GRAL J LAVALLE",
            "BERUTI",
            "CALLE 12 DE OCTUBRE",
            "PJE LOS ALAMOS",
            "MONSEÑOR LARUMBE",
            "SARMIENTO",
        ];
        for raw in inputs {
            let once = n.normalize(raw);
            assert_eq!(once, n.normalize(raw));
            assert_eq!(n.normalize(&once), once, "re-normalizing {raw:?}");
        }
    }

    #[test]
    fn single_pass_can_leave_a_second_prefix() {
        // Each rule is tested once, in order, so a prefix exposed by a later
        // strip survives until the next normalization.
        let n = StreetNormalizer::default();
        let cases = [
            ("AV. C. TEJEDOR", "C. TEJEDOR", "TEJEDOR"),
            ("CALLE AV. X", "AV. X", "X"),
        ];
        for (raw, once, twice) in cases {
            assert_eq!(n.normalize(raw), once);
            assert_eq!(n.normalize(once), twice);
            assert_eq!(n.normalize(twice), twice);
        }
    }

    #[test]
    fn empty_fragment_is_total() {
        let n = StreetNormalizer::default();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("   "), "");
    }
}
