//! Roster and override-table loading from delimited text files.

use std::collections::HashMap;
use std::path::Path;

use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::models::{ColumnMapping, RawRecord};
use crate::normalize::OverrideTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    /// Comma, retried once with semicolon when the header does not split.
    #[default]
    Auto,
    Comma,
    Semicolon,
}

impl Delimiter {
    fn candidates(self) -> &'static [u8] {
        match self {
            Delimiter::Auto => b",;",
            Delimiter::Comma => b",",
            Delimiter::Semicolon => b";",
        }
    }
}

/// Read a file as text: UTF-8 when valid, otherwise Windows-1252 (a Latin-1 superset).
pub fn read_text(path: &Path) -> Result<String, IngestError> {
    let display = path.display().to_string();
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IngestError::NotFound { path: display });
        }
        Err(e) => {
            return Err(IngestError::Io {
                path: display,
                source: e,
            });
        }
    };
    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            log::debug!("{} is not UTF-8; decoding as Windows-1252", display);
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            decoded.into_owned()
        }
    };
    Ok(text.trim_start_matches('\u{feff}').to_string())
}

fn table_reader<'a>(
    content: &'a str,
    path: &Path,
    delimiter: Delimiter,
) -> Result<(Reader<&'a [u8]>, StringRecord), IngestError> {
    for &delim in delimiter.candidates() {
        let mut reader = ReaderBuilder::new()
            .delimiter(delim)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| IngestError::Csv {
                path: path.display().to_string(),
                source: e,
            })?
            .clone();
        if headers.len() >= 2 {
            return Ok((reader, headers));
        }
        log::info!(
            "{}: header did not split on '{}', trying the next delimiter",
            path.display(),
            delim as char
        );
    }
    Err(IngestError::Delimiter {
        path: path.display().to_string(),
    })
}

pub fn load_roster(
    path: &Path,
    delimiter: Delimiter,
    columns: &ColumnMapping,
) -> Result<Vec<RawRecord>, IngestError> {
    let content = read_text(path)?;
    parse_roster(&content, path, delimiter, columns)
}

fn parse_roster(
    content: &str,
    path: &Path,
    delimiter: Delimiter,
    columns: &ColumnMapping,
) -> Result<Vec<RawRecord>, IngestError> {
    let (mut reader, headers) = table_reader(content, path, delimiter)?;
    let required = columns.required();
    let positions = required.map(|name| headers.iter().position(|h| h == name));
    let [Some(family), Some(given), Some(id), Some(address)] = positions else {
        let missing = required
            .iter()
            .zip(positions)
            .filter(|(_, p)| p.is_none())
            .map(|(c, _)| c.to_string())
            .collect();
        return Err(IngestError::MissingColumns {
            path: path.display().to_string(),
            missing,
        });
    };
    let extra: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !columns.is_required(h))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| IngestError::Csv {
            path: path.display().to_string(),
            source: e,
        })?;
        let field = |i: usize| row.get(i).unwrap_or("").to_string();
        let mut extra_fields = HashMap::with_capacity(extra.len());
        for (i, name) in &extra {
            if let Some(v) = row.get(*i) {
                extra_fields.insert(name.clone(), v.to_string());
            }
        }
        let addr = field(address);
        records.push(RawRecord {
            family_name: field(family),
            given_name: field(given),
            id: field(id),
            address: if addr.is_empty() { None } else { Some(addr) },
            extra_fields,
        });
    }
    log::info!("{}: read {} roster rows", path.display(), records.len());
    Ok(records)
}

/// Load the reviewed corrections file. A missing file is an empty table.
pub fn load_overrides(path: &Path, delimiter: Delimiter) -> Result<OverrideTable, IngestError> {
    let content = match read_text(path) {
        Ok(c) => c,
        Err(IngestError::NotFound { .. }) => {
            log::info!(
                "no override file at {}; generic rules only",
                path.display()
            );
            return Ok(OverrideTable::new());
        }
        Err(e) => return Err(e),
    };
    parse_overrides(&content, path, delimiter)
}

fn parse_overrides(
    content: &str,
    path: &Path,
    delimiter: Delimiter,
) -> Result<OverrideTable, IngestError> {
    let (mut reader, _headers) = table_reader(content, path, delimiter)?;
    let mut table = OverrideTable::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.map_err(|e| IngestError::Csv {
            path: path.display().to_string(),
            source: e,
        })?;
        let variant = row.get(0).unwrap_or("");
        let canonical = row.get(1).unwrap_or("");
        if variant.is_empty() || canonical.is_empty() {
            log::warn!(
                "{}: skipping override row {} with an empty side",
                path.display(),
                line + 2
            );
            continue;
        }
        if let Some(previous) = table.insert(variant, canonical) {
            log::warn!(
                "{}: override for {:?} redefined ({:?} replaced)",
                path.display(),
                variant,
                previous
            );
        }
    }
    log::info!("{}: loaded {} overrides", path.display(), table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn roster_with_comma_and_extra_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        fs::write(
            &path,
            "Apellido,Nombre,Matricula,Domicilio,Telefono\n\
             PEREZ, JUAN, 1, AV SAN MARTIN 450,555-1\n\
             GOMEZ,ANA,2,,555-2\n",
        )
        .unwrap();
        let rows = load_roster(&path, Delimiter::Auto, &ColumnMapping::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].given_name, "JUAN");
        assert_eq!(rows[0].address.as_deref(), Some("AV SAN MARTIN 450"));
        assert_eq!(rows[0].extra_fields.get("Telefono").map(String::as_str), Some("555-1"));
        assert_eq!(rows[1].address, None);
    }

    #[test]
    fn semicolon_retry_and_latin1() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        let mut bytes = b"Apellido;Nombre;Matricula;Domicilio\nNU".to_vec();
        bytes.push(0xD1); // 'Ñ' in Latin-1
        bytes.extend_from_slice(b"EZ;JOSE;9;MONSE");
        bytes.push(0xD1);
        bytes.extend_from_slice(b"OR LARUMBE 1520\n");
        fs::write(&path, bytes).unwrap();
        let rows = load_roster(&path, Delimiter::Auto, &ColumnMapping::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].family_name, "NUÑEZ");
        assert_eq!(rows[0].address.as_deref(), Some("MONSEÑOR LARUMBE 1520"));
    }

    #[test]
    fn explicit_delimiter_is_not_retried() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        fs::write(&path, "Apellido;Nombre;Matricula;Domicilio\n").unwrap();
        let err = load_roster(&path, Delimiter::Comma, &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, IngestError::Delimiter { .. }));
    }

    #[test]
    fn missing_columns_are_named() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("datos.csv");
        fs::write(&path, "Apellido,Nombre,DNI\nA,B,1\n").unwrap();
        let err = load_roster(&path, Delimiter::Auto, &ColumnMapping::default()).unwrap_err();
        match err {
            IngestError::MissingColumns { missing, .. } => {
                assert_eq!(missing, vec!["Matricula".to_string(), "Domicilio".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_roster_is_reported() {
        let dir = tempdir().unwrap();
        let err = load_roster(
            &dir.path().join("nope.csv"),
            Delimiter::Auto,
            &ColumnMapping::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::NotFound { .. }));
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn overrides_load_and_tolerate_absence() {
        let dir = tempdir().unwrap();
        let missing = load_overrides(&dir.path().join("none.csv"), Delimiter::Auto).unwrap();
        assert!(missing.is_empty());

        let path = dir.path().join("correcciones.csv");
        fs::write(
            &path,
            "Original,Corregido\n\
             GRAL SAN MARTIN,AV SAN MARTIN\n\
             ,HUERFANO\n\
             beruti,ANTONIO BERUTTI\n\
             BERUTI,ANTONIO BERUTTI\n",
        )
        .unwrap();
        let table = load_overrides(&path, Delimiter::Auto).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("Gral San Martin"), Some("AV SAN MARTIN"));
        assert_eq!(table.lookup("BERUTI"), Some("ANTONIO BERUTTI"));
        assert_eq!(table.lookup("HUERFANO"), None);
    }
}
