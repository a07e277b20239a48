//! Free-text address splitting: "<street> <house number>".

use std::sync::LazyLock;

use regex::Regex;

use crate::models::ParsedAddress;
use crate::normalize::{StreetNormalizer, fold_text};

// Lazy street span, then the first digit run. An optional second run, ending at
// whitespace or end of text, is captured so `split` can tell "RUTA 8 1200" from
// floor suffixes such as "1234 3 B".
static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z\s.\d()\-]+?)\s+(\d+)(?:\s+(\d+)(?:\s|$))?").expect("address pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreetAndNumber {
    pub street_raw: String,
    pub house_number: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AddressParser;

impl AddressParser {
    pub fn new() -> Self {
        Self
    }

    /// Split a raw address into street fragment and house number. `None` when the
    /// text has no street-like prefix followed by a number.
    pub fn split(&self, raw: &str) -> Option<StreetAndNumber> {
        let text = fold_text(raw);
        let caps = ADDRESS_RE.captures(&text)?;
        let lead = caps.get(1)?.as_str().trim();
        let first = caps.get(2)?.as_str();
        // The first run belongs to the street only when the next one is longer
        let (street_raw, digits) = match caps.get(3) {
            Some(second) if second.as_str().len() > first.len() => {
                (format!("{} {}", lead, first), second.as_str())
            }
            _ => (lead.to_string(), first),
        };
        if !street_raw.chars().any(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let house_number = match digits.parse::<u64>() {
            Ok(n) => n,
            Err(e) => {
                log::debug!("house number {:?} in {:?} rejected: {}", digits, raw, e);
                return None;
            }
        };
        Some(StreetAndNumber {
            street_raw,
            house_number,
        })
    }

    pub fn parse(&self, raw: &str, normalizer: &StreetNormalizer) -> Option<ParsedAddress> {
        let parts = self.split(raw)?;
        let street_canonical = normalizer.normalize(&parts.street_raw);
        Some(ParsedAddress {
            street_raw: parts.street_raw,
            house_number: parts.house_number,
            street_canonical,
        })
    }

    /// Same as [`parse`](Self::parse) for a field that may be absent.
    pub fn parse_field(
        &self,
        raw: Option<&str>,
        normalizer: &StreetNormalizer,
    ) -> Option<ParsedAddress> {
        raw.and_then(|r| self.parse(r, normalizer))
    }
}
