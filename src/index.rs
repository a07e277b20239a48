//! Read-only roster index keyed by canonical street, answering house-number
//! range queries.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::address::AddressParser;
use crate::models::{ParsedAddress, RawRecord};
use crate::normalize::{StreetNormalizer, fold_text};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedRecord {
    pub record: RawRecord,
    pub address: ParsedAddress,
}

/// A query hit. `distance` is the absolute house-number difference to the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor<'a> {
    pub record: &'a RawRecord,
    pub address: &'a ParsedAddress,
    pub distance: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestSummary {
    pub total: usize,
    pub usable: usize,
}

impl IngestSummary {
    pub fn skipped(&self) -> usize {
        self.total - self.usable
    }
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} records usable", self.usable, self.total)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RosterIndex {
    entries: Vec<IndexedRecord>,
    // canonical street -> entry indexes, in roster order
    by_street: HashMap<String, Vec<usize>>,
    summary: IngestSummary,
}

impl RosterIndex {
    pub fn build<I>(records: I, parser: &AddressParser, normalizer: &StreetNormalizer) -> Self
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut entries = Vec::new();
        let mut by_street: HashMap<String, Vec<usize>> = HashMap::new();
        let mut total = 0usize;
        for record in records {
            total += 1;
            let Some(address) = parser.parse_field(record.address.as_deref(), normalizer) else {
                log::debug!(
                    "skipping record {} ({}): unparseable address {:?}",
                    record.id,
                    record.display_name(),
                    record.address
                );
                continue;
            };
            by_street
                .entry(address.street_canonical.clone())
                .or_default()
                .push(entries.len());
            entries.push(IndexedRecord { record, address });
        }
        let summary = IngestSummary {
            total,
            usable: entries.len(),
        };
        Self {
            entries,
            by_street,
            summary,
        }
    }

    pub fn summary(&self) -> IngestSummary {
        self.summary
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexedRecord] {
        &self.entries
    }

    /// First indexed record with this identifier.
    pub fn get(&self, id: &str) -> Option<&IndexedRecord> {
        self.entries.iter().find(|e| e.record.id == id)
    }

    fn on_street(&self, street_canonical: &str) -> impl Iterator<Item = &IndexedRecord> {
        self.by_street
            .get(street_canonical)
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
    }

    /// Records on the center's street within `radius` house numbers, excluding
    /// `exclude_id`, nearest first. Ties keep roster order.
    pub fn find_near(
        &self,
        center: &ParsedAddress,
        radius: u64,
        exclude_id: Option<&str>,
    ) -> Vec<Neighbor<'_>> {
        let mut hits: Vec<Neighbor<'_>> = self
            .on_street(&center.street_canonical)
            .filter(|e| exclude_id != Some(e.record.id.as_str()))
            .map(|e| Neighbor {
                record: &e.record,
                address: &e.address,
                distance: e.address.house_number.abs_diff(center.house_number),
            })
            .filter(|n| n.distance <= radius)
            .collect();
        hits.sort_by_key(|n| n.distance);
        hits
    }

    /// Neighbors of the indexed person `id`. `None` when the id has no usable address.
    pub fn find_near_person(&self, id: &str, radius: u64) -> Option<Vec<Neighbor<'_>>> {
        let center = self.get(id)?;
        Some(self.find_near(&center.address, radius, Some(id)))
    }

    /// Without a center: the whole street by ascending house number. With a
    /// center: ordered by distance, limited to `radius` when one is given.
    pub fn find_by_street(
        &self,
        street_canonical: &str,
        center_number: Option<u64>,
        radius: Option<u64>,
    ) -> Vec<Neighbor<'_>> {
        let mut hits: Vec<Neighbor<'_>> = self
            .on_street(street_canonical)
            .map(|e| Neighbor {
                record: &e.record,
                address: &e.address,
                distance: center_number
                    .map(|c| e.address.house_number.abs_diff(c))
                    .unwrap_or(0),
            })
            .collect();
        match center_number {
            None => hits.sort_by_key(|n| n.address.house_number),
            Some(_) => {
                if let Some(r) = radius {
                    hits.retain(|n| n.distance <= r);
                }
                hits.sort_by_key(|n| n.distance);
            }
        }
        hits
    }

    pub fn list_canonical_streets(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.by_street.keys().map(|s| s.as_str()).collect();
        set.into_iter().collect()
    }

    pub fn list_raw_variants_for(&self, street_canonical: &str) -> BTreeSet<&str> {
        self.on_street(street_canonical)
            .map(|e| e.address.street_raw.as_str())
            .collect()
    }

    /// Every distinct raw street fragment in the index, sorted.
    pub fn distinct_raw_streets(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .map(|e| e.address.street_raw.as_str())
            .collect()
    }

    /// Family name contains the query (folded), or the identifier contains it verbatim.
    pub fn search_people(&self, query: &str) -> Vec<&IndexedRecord> {
        let q = query.trim();
        if q.is_empty() {
            return Vec::new();
        }
        let folded = fold_text(q);
        self.entries
            .iter()
            .filter(|e| {
                fold_text(&e.record.family_name).contains(&folded) || e.record.id.contains(q)
            })
            .collect()
    }
}
