//! # CSV Export
//!
//! Spreadsheet-friendly exports of the calculation history and the machine
//! inventory. Files start with a UTF-8 byte order mark so spreadsheet
//! programs detect the encoding, use CRLF line endings, and quote fields per
//! RFC 4180. Parameters and results are written as compact JSON cells.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::{CalcError, CalcResult};
use crate::history::History;
use crate::machines::Machine;

/// UTF-8 byte order mark
pub const BOM: &str = "\u{feff}";

const HISTORY_HEADER: [&str; 9] = [
    "id",
    "created_at",
    "calc_type",
    "label",
    "material",
    "tool",
    "machine",
    "parameters",
    "results",
];

const MACHINE_HEADER: [&str; 12] = [
    "id",
    "code",
    "name",
    "type",
    "power_kw",
    "min_rpm",
    "max_rpm",
    "travel_x_mm",
    "travel_y_mm",
    "travel_z_mm",
    "hourly_rate",
    "active",
];

/// Quote a field when it holds a comma, quote or line break.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn write_row<W: Write, S: AsRef<str>>(writer: &mut W, fields: &[S]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\r\n")
}

fn io_error(e: std::io::Error) -> CalcError {
    CalcError::file_error("write csv", "<writer>", e.to_string())
}

/// Write the history, newest first. Returns the number of data rows.
pub fn write_history_csv<W: Write>(history: &History, mut writer: W) -> CalcResult<usize> {
    writer.write_all(BOM.as_bytes()).map_err(io_error)?;
    write_row(&mut writer, &HISTORY_HEADER).map_err(io_error)?;

    let records = history.list();
    for record in &records {
        let row = [
            record.id.to_string(),
            record.created_at.to_rfc3339(),
            record.calc_type.clone(),
            record.label.clone(),
            record.material.clone().unwrap_or_default(),
            record.tool.clone().unwrap_or_default(),
            record.machine.clone().unwrap_or_default(),
            serde_json::to_string(&record.parameters)?,
            serde_json::to_string(&record.results)?,
        ];
        write_row(&mut writer, &row).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)?;
    Ok(records.len())
}

/// Write machines sorted by code. Returns the number of data rows.
pub fn write_machines_csv<'a, W: Write>(
    machines: impl IntoIterator<Item = &'a Machine>,
    mut writer: W,
) -> CalcResult<usize> {
    let mut machines: Vec<&Machine> = machines.into_iter().collect();
    machines.sort_by(|a, b| a.code.cmp(&b.code));

    writer.write_all(BOM.as_bytes()).map_err(io_error)?;
    write_row(&mut writer, &MACHINE_HEADER).map_err(io_error)?;
    for m in &machines {
        let row = [
            m.id.to_string(),
            m.code.clone(),
            m.name.clone(),
            m.machine_type.display_name().to_string(),
            m.power_kw.to_string(),
            m.min_rpm.to_string(),
            m.max_rpm.to_string(),
            m.travel.x_mm.to_string(),
            m.travel.y_mm.to_string(),
            m.travel.z_mm.to_string(),
            m.hourly_rate.to_string(),
            m.active.to_string(),
        ];
        write_row(&mut writer, &row).map_err(io_error)?;
    }
    writer.flush().map_err(io_error)?;
    Ok(machines.len())
}

pub fn history_csv_string(history: &History) -> CalcResult<String> {
    let mut buffer = Vec::new();
    write_history_csv(history, &mut buffer)?;
    String::from_utf8(buffer).map_err(CalcError::serialization)
}

/// Export the history to a CSV file.
pub fn export_history_csv(history: &History, path: &Path) -> CalcResult<usize> {
    let file = File::create(path)
        .map_err(|e| CalcError::file_error("create csv", path.display().to_string(), e.to_string()))?;
    let rows = write_history_csv(history, BufWriter::new(file))?;
    tracing::info!(path = %path.display(), rows, "history exported");
    Ok(rows)
}

/// Export machines to a CSV file.
pub fn export_machines_csv<'a>(machines: impl IntoIterator<Item = &'a Machine>, path: &Path) -> CalcResult<usize> {
    let file = File::create(path)
        .map_err(|e| CalcError::file_error("create csv", path.display().to_string(), e.to_string()))?;
    let rows = write_machines_csv(machines, BufWriter::new(file))?;
    tracing::info!(path = %path.display(), rows, "machines exported");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{CalculationItem, CuttingInput};
    use crate::history::CalculationRecord;
    use crate::machines::MachineType;

    fn history_with(labels: &[&str]) -> History {
        let mut history = History::default();
        for label in labels {
            let item = CalculationItem::Cutting(CuttingInput::turning(*label, "C45", 40.0, 0.2));
            let record = CalculationRecord::from_item(&item, serde_json::json!({"spindle_speed_rpm": 1432.4})).unwrap();
            history.add(record).unwrap();
        }
        history
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_rows_equal_records_plus_header() {
        for n in [0usize, 1, 5] {
            let labels: Vec<String> = (0..n).map(|i| format!("R{}", i)).collect();
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let csv = history_csv_string(&history_with(&refs)).unwrap();
            let lines = csv.split("\r\n").filter(|l| !l.is_empty()).count();
            assert_eq!(lines, n + 1);
        }
    }

    #[test]
    fn test_bom_header_and_json_cells() {
        let csv = history_csv_string(&history_with(&["OD, rough"])).unwrap();
        assert!(csv.starts_with(BOM));
        let mut lines = csv.trim_start_matches(BOM).split("\r\n");
        assert_eq!(lines.next().unwrap(), HISTORY_HEADER.join(","));
        let row = lines.next().unwrap();
        assert!(row.contains("\"OD, rough\""));
        assert!(row.contains("\"{\"\"spindle_speed_rpm\"\":1432.4}\""));
    }

    #[test]
    fn test_machines_csv_sorted() {
        let a = Machine::new("M-02", "VMC", MachineType::Mill3Axis, 15.0, 100.0, 10_000.0);
        let b = Machine::new("L-01", "Lathe", MachineType::Lathe, 11.0, 50.0, 4000.0);
        let mut buffer = Vec::new();
        let rows = write_machines_csv([&a, &b], &mut buffer).unwrap();
        assert_eq!(rows, 2);
        let csv = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("L-01"));
        assert!(lines[2].contains("M-02"));
    }
}
