use crate::error::ExportError;
use crate::index::RosterIndex;
use crate::models::{CandidatePair, ColumnMapping};
use csv::{Writer, WriterBuilder};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub const STREET_COLUMN: &str = "Calle_Norm";
pub const NUMBER_COLUMN: &str = "Altura_Limpia";

fn create_writer(path: &Path) -> Result<Writer<BufWriter<File>>, ExportError> {
    let file = File::create(path).map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let buf_writer = BufWriter::with_capacity(512 * 1024, file);
    Ok(WriterBuilder::new().from_writer(buf_writer))
}

/// Write the usable roster with its canonical street and cleaned house number.
pub fn export_roster_csv(
    index: &RosterIndex,
    columns: &ColumnMapping,
    path: &Path,
) -> Result<usize, ExportError> {
    let extra_field_names = collect_extra_field_names(index);
    let mut w = create_writer(path)?;

    let mut headers: Vec<&str> = vec![
        columns.family_name.as_str(),
        columns.given_name.as_str(),
        columns.id.as_str(),
        STREET_COLUMN,
        NUMBER_COLUMN,
        columns.address.as_str(),
    ];
    headers.extend(extra_field_names.iter().map(String::as_str));
    w.write_record(&headers)?;

    for entry in index.entries() {
        let rec = &entry.record;
        let number = entry.address.house_number.to_string();
        let mut row: Vec<&str> = vec![
            rec.family_name.as_str(),
            rec.given_name.as_str(),
            rec.id.as_str(),
            entry.address.street_canonical.as_str(),
            number.as_str(),
            rec.address.as_deref().unwrap_or(""),
        ];
        for name in &extra_field_names {
            row.push(rec.extra_fields.get(name).map(String::as_str).unwrap_or(""));
        }
        w.write_record(&row)?;
    }
    w.flush().map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    log::info!("wrote {} roster rows to {}", index.len(), path.display());
    Ok(index.len())
}

// Sorted so the column order is stable across runs
fn collect_extra_field_names(index: &RosterIndex) -> Vec<String> {
    let mut field_set = BTreeSet::new();
    for entry in index.entries() {
        for key in entry.record.extra_fields.keys() {
            field_set.insert(key.clone());
        }
    }
    field_set.into_iter().collect()
}

/// Write detective output in the same two-column layout the override loader reads.
pub fn export_corrections_csv(pairs: &[CandidatePair], path: &Path) -> Result<usize, ExportError> {
    let mut w = create_writer(path)?;
    // serialize() emits the Original/Corregido header from the serde renames
    if pairs.is_empty() {
        w.write_record(["Original", "Corregido"])?;
    }
    for pair in pairs {
        w.serialize(pair)?;
    }
    w.flush().map_err(|e| ExportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    log::info!("wrote {} suggested corrections to {}", pairs.len(), path.display());
    Ok(pairs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressParser;
    use crate::ingest::{Delimiter, load_overrides};
    use crate::models::RawRecord;
    use crate::normalize::StreetNormalizer;
    use tempfile::tempdir;

    fn pair(v: &str, c: &str) -> CandidatePair {
        CandidatePair {
            variant: v.to_string(),
            canonical_suggestion: c.to_string(),
        }
    }

    #[test]
    fn roster_export_layout() {
        let mut with_extra = RawRecord::new("PEREZ", "JUAN", "1", Some("Av San Martin 0450"));
        with_extra
            .extra_fields
            .insert("Telefono".to_string(), "555".to_string());
        with_extra
            .extra_fields
            .insert("Email".to_string(), "j@x".to_string());
        let records = vec![
            with_extra,
            RawRecord::new("GOMEZ", "ANA", "2", Some("SIN NUMERO")),
            RawRecord::new("DIAZ", "LUIS", "3", Some("SARMIENTO 900")),
        ];
        let index = RosterIndex::build(records, &AddressParser::new(), &StreetNormalizer::default());

        let dir = tempdir().unwrap();
        let path = dir.path().join("padron.csv");
        let n = export_roster_csv(&index, &ColumnMapping::default(), &path).unwrap();
        assert_eq!(n, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "Apellido,Nombre,Matricula,Calle_Norm,Altura_Limpia,Domicilio,Email,Telefono"
        );
        assert_eq!(lines[1], "PEREZ,JUAN,1,SAN MARTIN,450,Av San Martin 0450,j@x,555");
        assert_eq!(lines[2], "DIAZ,LUIS,3,SARMIENTO,900,SARMIENTO 900,,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn corrections_feed_back_into_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("correcciones_sugeridas.csv");
        let pairs = vec![pair("SARMIENTO", "SARMIENT"), pair("BELGRANO", "BELGRAN")];
        assert_eq!(export_corrections_csv(&pairs, &path).unwrap(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Original,Corregido\n"));

        let table = load_overrides(&path, Delimiter::Auto).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("SARMIENTO"), Some("SARMIENT"));
        assert_eq!(table.lookup("BELGRANO"), Some("BELGRAN"));
    }

    #[test]
    fn empty_corrections_still_have_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vacio.csv");
        assert_eq!(export_corrections_csv(&[], &path).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Original,Corregido\n");
        assert!(load_overrides(&path, Delimiter::Auto).unwrap().is_empty());
    }
}
