//! Orchestrator module: loads the files named by an [`AppConfig`] once and
//! holds the resulting read-only snapshot.
//!
//! A [`Session`] owns:
//! - the street normalizer (overrides + generic rules)
//! - the roster index
//! - the detective settings
//!
//! Nothing is cached globally; callers that want fresh data open a new session.

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::address::AddressParser;
use crate::config::AppConfig;
use crate::error::IngestError;
use crate::export::csv_export::{export_corrections_csv, export_roster_csv};
use crate::index::{IngestSummary, RosterIndex};
use crate::ingest::{load_overrides, load_roster};
use crate::matching::DuplicateDetective;
use crate::models::{CandidatePair, RawRecord};
use crate::normalize::{GenericRules, OverrideTable, StreetNormalizer};

#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    normalizer: StreetNormalizer,
    index: RosterIndex,
    roster_missing: bool,
}

impl Session {
    pub fn open(cfg: &AppConfig) -> Result<Self> {
        let overrides = load_overrides(&cfg.overrides.path, cfg.overrides.delimiter)
            .with_context(|| format!("loading overrides from {}", cfg.overrides.path.display()))?;

        let (records, roster_missing) =
            match load_roster(&cfg.roster.path, cfg.roster.delimiter, &cfg.roster.columns) {
                Ok(records) => (records, false),
                Err(IngestError::NotFound { path }) => {
                    warn!("roster {} not found; starting with an empty index", path);
                    (Vec::new(), true)
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("loading roster from {}", cfg.roster.path.display())
                    });
                }
            };

        let mut session = Self::from_records(cfg, records, overrides);
        session.roster_missing = roster_missing;
        Ok(session)
    }

    /// Build a session from rows already in memory.
    pub fn from_records(cfg: &AppConfig, records: Vec<RawRecord>, overrides: OverrideTable) -> Self {
        let normalizer = StreetNormalizer::new(
            overrides,
            GenericRules::default(),
            cfg.normalizer.replace_scope,
        );
        let unstable = normalizer.unstable_targets();
        if !unstable.is_empty() {
            warn!(
                "{} override targets are rewritten again by another override: {}",
                unstable.len(),
                unstable.join(", ")
            );
        }

        let index = RosterIndex::build(records, &AddressParser::new(), &normalizer);
        let summary = index.summary();
        info!("{}", summary);
        if summary.skipped() > 0 {
            info!(
                "{} records skipped for a missing or unparseable address (RUST_LOG=debug lists them)",
                summary.skipped()
            );
        }

        Self {
            config: cfg.clone(),
            normalizer,
            index,
            roster_missing: false,
        }
    }

    pub fn index(&self) -> &RosterIndex {
        &self.index
    }

    pub fn summary(&self) -> IngestSummary {
        self.index.summary()
    }

    /// True when the roster file did not exist at open time.
    pub fn roster_missing(&self) -> bool {
        self.roster_missing
    }

    /// Resolve a user-typed street name to the canonical key the index uses.
    pub fn canonical_street(&self, name: &str) -> String {
        let typed = name.trim();
        if self.index.list_canonical_streets().contains(&typed) {
            return typed.to_string();
        }
        self.normalizer.normalize(typed)
    }

    /// Run the detective over every distinct raw street spelling in the roster.
    pub fn detect(&self) -> Vec<CandidatePair> {
        let cfg = &self.config.detective;
        let detective = DuplicateDetective::from_config(cfg);
        detective.cluster(self.index.distinct_raw_streets(), cfg.threshold)
    }

    pub fn export_roster(&self, path: &Path) -> Result<usize> {
        export_roster_csv(&self.index, &self.config.roster.columns, path)
            .with_context(|| format!("exporting roster to {}", path.display()))
    }

    pub fn export_suggestions(&self, pairs: &[CandidatePair], path: &Path) -> Result<usize> {
        export_corrections_csv(pairs, path)
            .with_context(|| format!("writing suggestions to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.roster.path = dir.join("datos.csv");
        cfg.overrides.path = dir.join("correcciones.csv");
        cfg
    }

    #[test]
    fn end_to_end_neighbors_through_files() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        fs::write(
            &cfg.roster.path,
            "Apellido;Nombre;Matricula;Domicilio\n\
             PEREZ;JUAN;1;AV SAN MARTIN 450\n\
             GOMEZ;ANA;2;GRAL SAN MARTIN 500\n\
             DIAZ;LUIS;3;SARMIENTO 900\n\
             ROJAS;EVA;4;S/N\n",
        )
        .unwrap();
        fs::write(
            &cfg.overrides.path,
            "Original,Corregido\nGRAL SAN MARTIN,AV SAN MARTIN\n",
        )
        .unwrap();

        let session = Session::open(&cfg).unwrap();
        assert!(!session.roster_missing());
        assert_eq!(session.summary(), IngestSummary { total: 4, usable: 3 });

        let hits = session.index().find_near_person("1", 100).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.family_name, "GOMEZ");
        assert_eq!(hits[0].distance, 50);

        assert_eq!(
            session.index().list_canonical_streets(),
            vec!["AV SAN MARTIN", "SARMIENTO"]
        );
        assert_eq!(session.canonical_street("gral san martin"), "AV SAN MARTIN");
        assert!(session.index().find_near_person("3", 100).unwrap().is_empty());
    }

    #[test]
    fn missing_roster_is_not_fatal() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        let session = Session::open(&cfg).unwrap();
        assert!(session.roster_missing());
        assert!(session.index().is_empty());
        assert!(session.detect().is_empty());
    }

    #[test]
    fn malformed_roster_carries_file_context() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        fs::write(&cfg.roster.path, "Apellido,Nombre\nA,B\n").unwrap();
        let err = Session::open(&cfg).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("loading roster from"), "{msg}");
        assert!(msg.contains("Matricula"), "{msg}");
    }

    #[test]
    fn detect_and_write_suggestions() {
        let dir = tempdir().unwrap();
        let cfg = config_in(dir.path());
        let records = vec![
            RawRecord::new("A", "A", "1", Some("SARMIENTO 100")),
            RawRecord::new("B", "B", "2", Some("SARMIENT 200")),
            RawRecord::new("C", "C", "3", Some("RIVADAVIA 300")),
        ];
        let session = Session::from_records(&cfg, records, OverrideTable::new());
        let pairs = session.detect();
        assert_eq!(
            pairs,
            vec![CandidatePair {
                variant: "SARMIENTO".into(),
                canonical_suggestion: "SARMIENT".into(),
            }]
        );

        let out = dir.path().join("sugeridas.csv");
        assert_eq!(session.export_suggestions(&pairs, &out).unwrap(), 1);
        let reloaded = load_overrides(&out, cfg.overrides.delimiter).unwrap();
        assert_eq!(reloaded.lookup("SARMIENTO"), Some("SARMIENT"));
    }
}
