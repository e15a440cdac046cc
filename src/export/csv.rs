//! Flat tabular export: one `;`-separated row per (objective, skill-match)
//! pair, UTF-8 with byte-order mark so spreadsheet tools pick up the
//! encoding. Derived purely from the nested export.

use std::fs;
use std::path::Path;

use super::json::NestedExport;
use super::ExportError;

/// Fixed header row.
pub const CSV_HEADER: [&str; 11] = [
    "Dokumententyp",
    "Berufsbezeichnung Dokument",
    "Berufsbezeichnung ESCO",
    "Beruf URI ESCO",
    "Lernfelder/Ausbildungsteile",
    "Zeiträume",
    "Zeit",
    "Zeiteinheiten",
    "Lernziel Dokument",
    "Lernziel ESCO Entsprechung",
    "Lernziel ESCO URI",
];

const DELIMITER: char = ';';
const BOM: &str = "\u{FEFF}";

/// Sentinel for the two skill columns of an unmatched objective.
const NO_MATCH: &str = "-";

/// Flatten the nested export: every objective yields `max(1, matches)` rows.
pub fn flat_rows(export: &NestedExport) -> Vec<[String; 11]> {
    let (esco_title, esco_uri) = export
        .beruf
        .esco_daten
        .as_ref()
        .map(|d| (d.beruf.title.clone(), d.beruf.uri.clone()))
        .unwrap_or_default();

    let mut rows = Vec::new();
    let data = &export.beruf.dokumente_daten;
    for (unit_label, unit) in &data.lernfelder_ausbildungsteile {
        for (period_label, period) in &unit.zeitraeume {
            for objective in period.objectives.values() {
                let base = [
                    export.dokumententyp.clone(),
                    data.berufsbezeichnung.clone(),
                    esco_title.clone(),
                    esco_uri.clone(),
                    unit_label.clone(),
                    period_label.clone(),
                    period.time.value.clone(),
                    period.time.unit.clone(),
                    objective.text.clone(),
                ];
                if objective.matches.is_empty() {
                    rows.push(with_match(&base, NO_MATCH, NO_MATCH));
                } else {
                    for skill_match in &objective.matches {
                        rows.push(with_match(&base, &skill_match.label, &skill_match.uri));
                    }
                }
            }
        }
    }
    rows
}

fn with_match(base: &[String; 9], label: &str, uri: &str) -> [String; 11] {
    let mut row: [String; 11] = Default::default();
    row[..9].clone_from_slice(base);
    row[9] = label.to_string();
    row[10] = uri.to_string();
    row
}

/// Quote a field when it carries the delimiter, a quote, or a line break;
/// embedded quotes are doubled.
fn encode_field(field: &str) -> String {
    if field.contains(DELIMITER) || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn encode_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| encode_field(f))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}

/// Write the flat export with BOM, header, and CRLF row endings.
pub fn write_csv(export: &NestedExport, path: &Path) -> Result<(), ExportError> {
    let mut out = String::from(BOM);
    let header: Vec<String> = CSV_HEADER.iter().map(|h| h.to_string()).collect();
    out.push_str(&encode_row(&header));
    out.push_str("\r\n");
    for row in flat_rows(export) {
        out.push_str(&encode_row(&row));
        out.push_str("\r\n");
    }
    fs::write(path, out)?;
    tracing::info!(path = %path.display(), "CSV export written");
    Ok(())
}
