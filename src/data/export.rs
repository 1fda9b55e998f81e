use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

use super::model::{EventRecord, Role};
use crate::geo::solver::TransformMatrix;
use crate::geo::transformer::{transform, TransformError};
use crate::task::TaskContext;

/// Exported columns, in output order.
pub const EXPORT_ROLES: [Role; 6] = [Role::Type, Role::X, Role::Y, Role::Z, Role::Value, Role::Date];

/// Sheet name used in exported workbooks.
pub const EXPORT_SHEET_NAME: &str = "Events";

/// Rows prepared between progress updates / cancellation checks.
const PROGRESS_STEP: usize = 500;

/// Errors that can occur while exporting.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Workbook could not be built or saved.
    #[error("failed to write workbook '{path}': {source}")]
    Xlsx {
        path: String,
        #[source]
        source: XlsxError,
    },

    /// CSV file could not be created or written.
    #[error("failed to write CSV '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// A coordinate could not be converted.
    #[error("source row {row}: {source}")]
    Coordinate {
        row: usize,
        #[source]
        source: TransformError,
    },

    #[error("export cancelled")]
    Cancelled,
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, Copy)]
pub struct ExportOptions<'a> {
    /// Replace X/Y/Z with transformed coordinates.
    pub transform: Option<&'a TransformMatrix>,
    /// Write fractional numbers as `12,5` instead of `12.5`.
    pub decimal_comma: bool,
}

impl Default for ExportOptions<'_> {
    fn default() -> Self {
        Self {
            transform: None,
            decimal_comma: true,
        }
    }
}

/// Append `.xlsx` when `path` has no extension.
pub fn with_default_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("xlsx")
    }
}

/// Write the filtered events to `destination` with canonical column names
/// (`TypeId, X, Y, Z, Energy, LocTime`). `.csv` destinations are written as
/// CSV, everything else as `.xlsx`. Returns the number of data rows.
///
/// The destination is only touched after every row was prepared, so a
/// conversion error or cancellation leaves no partial file behind.
pub fn export_events(
    records: &[EventRecord],
    destination: &Path,
    options: &ExportOptions<'_>,
    ctx: &TaskContext,
) -> Result<usize> {
    let total = records.len() as u64;
    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        if i % PROGRESS_STEP == 0 {
            if ctx.is_cancelled() {
                return Err(ExportError::Cancelled);
            }
            ctx.set_progress(i as u64, total, Some("Preparing rows…"));
        }
        rows.push(export_row(rec, options)?);
    }

    ctx.pulse(&format!("Writing {}…", destination.display()));
    let is_csv = destination
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        write_csv(destination, &rows)?;
    } else {
        write_xlsx(destination, &rows)?;
    }
    ctx.set_progress(total, total, Some("Done"));

    log::info!("Exported {} rows to {}", rows.len(), destination.display());
    Ok(rows.len())
}

fn header() -> impl Iterator<Item = &'static str> {
    EXPORT_ROLES.into_iter().filter_map(Role::export_name)
}

fn export_row(rec: &EventRecord, options: &ExportOptions<'_>) -> Result<Vec<String>> {
    let coords = match options.transform {
        Some(matrix) => {
            let p = transform(matrix, rec.x.as_str(), rec.y.as_str(), rec.z.as_str())
                .map_err(|source| ExportError::Coordinate {
                    row: rec.row,
                    source,
                })?;
            Some(p.map(|v| format!("{v:.3}")))
        }
        None => None,
    };

    Ok(EXPORT_ROLES
        .iter()
        .map(|&role| {
            let text = match (&coords, role) {
                (Some(c), Role::X) => c[0].as_str(),
                (Some(c), Role::Y) => c[1].as_str(),
                (Some(c), Role::Z) => c[2].as_str(),
                _ => rec.field(role),
            };
            format_decimal(text, options.decimal_comma)
        })
        .collect())
}

/// Numbers with a fractional part get a decimal comma; anything else is
/// passed through.
fn format_decimal(text: &str, decimal_comma: bool) -> String {
    if decimal_comma && text.contains('.') && text.trim().parse::<f64>().is_ok() {
        text.replace('.', ",")
    } else {
        text.to_string()
    }
}

fn write_xlsx(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let wrap = |source: XlsxError| ExportError::Xlsx {
        path: path.display().to_string(),
        source,
    };

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET_NAME).map_err(wrap)?;
    for (col, name) in header().enumerate() {
        sheet.write_string(0, col as u16, name).map_err(wrap)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let r = u32::try_from(i + 1).map_err(|_| wrap(XlsxError::RowColumnLimitError))?;
        for (col, value) in row.iter().enumerate() {
            sheet.write_string(r, col as u16, value).map_err(wrap)?;
        }
    }
    workbook.save(path).map_err(wrap)
}

fn write_csv(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    let wrap = |source: csv::Error| ExportError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(wrap)?;
    writer.write_record(header()).map_err(wrap)?;
    for row in rows {
        writer.write_record(row).map_err(wrap)?;
    }
    writer.flush().map_err(|e| wrap(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, Reader};
    use nalgebra::{Matrix3, Vector3};
    use std::error::Error as _;

    fn rec(row: usize, x: &str, value: &str) -> EventRecord {
        EventRecord {
            row,
            timestamp: "2024-03-01 12:00:00".into(),
            type_code: "3".into(),
            x: x.into(),
            y: "20".into(),
            z: "-5.25".into(),
            value: value.into(),
            comment: "quiet".into(),
            source_filename: "a.KIR".into(),
        }
    }

    fn read_back(path: &Path) -> Vec<Vec<String>> {
        let mut wb = open_workbook_auto(path).unwrap();
        let range = wb.worksheet_range(EXPORT_SHEET_NAME).unwrap();
        range
            .rows()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn xlsx_has_canonical_columns_and_decimal_comma() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let records = vec![rec(0, "10.5", "1200"), rec(1, "11", "3.75")];

        let n = export_events(&records, &path, &ExportOptions::default(), &TaskContext::new()).unwrap();
        assert_eq!(n, 2);

        let rows = read_back(&path);
        assert_eq!(rows[0], vec!["TypeId", "X", "Y", "Z", "Energy", "LocTime"]);
        assert_eq!(rows[1], vec!["3", "10,5", "20", "-5,25", "1200", "2024-03-01 12:00:00"]);
        assert_eq!(rows[2][4], "3,75");
    }

    #[test]
    fn transform_replaces_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let shift = TransformMatrix::from_parts(&Matrix3::identity(), &Vector3::new(100.0, 0.0, 0.5));
        let options = ExportOptions {
            transform: Some(&shift),
            decimal_comma: false,
        };

        export_events(&[rec(0, "1", "7")], &path, &options, &TaskContext::new()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(headers, vec!["TypeId", "X", "Y", "Z", "Energy", "LocTime"]);
        let first = reader.records().next().unwrap().unwrap();
        assert_eq!(&first[1], "101.000");
        assert_eq!(&first[2], "20.000");
        assert_eq!(&first[3], "-4.750");
    }

    #[test]
    fn bad_coordinate_is_reported_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let options = ExportOptions {
            transform: Some(crate::geo::reference::reference_transform()),
            decimal_comma: true,
        };

        let err = export_events(&[rec(4, "n/a", "1")], &path, &options, &TaskContext::new())
            .unwrap_err();
        assert!(matches!(err, ExportError::Coordinate { row: 4, .. }));
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_destination_keeps_cause() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.xlsx");

        let err = export_events(&[rec(0, "1", "1")], &path, &ExportOptions::default(), &TaskContext::new())
            .unwrap_err();
        assert!(matches!(err, ExportError::Xlsx { .. }));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("out.xlsx"));
    }

    #[test]
    fn cancelled_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let ctx = TaskContext::new();
        ctx.cancel();

        let err = export_events(&[rec(0, "1", "1")], &path, &ExportOptions::default(), &ctx).unwrap_err();
        assert!(matches!(err, ExportError::Cancelled));
        assert!(!path.exists());
    }

    #[test]
    fn decimal_formatting() {
        assert_eq!(format_decimal("12.5", true), "12,5");
        assert_eq!(format_decimal("12.5", false), "12.5");
        assert_eq!(format_decimal("12", true), "12");
        assert_eq!(format_decimal("v1.2", true), "v1.2");
        assert_eq!(format_decimal("2024-03-01 12:00:00", true), "2024-03-01 12:00:00");
    }

    #[test]
    fn default_extension() {
        assert_eq!(with_default_extension(Path::new("out")), PathBuf::from("out.xlsx"));
        assert_eq!(with_default_extension(Path::new("out.csv")), PathBuf::from("out.csv"));
    }
}
