use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::NaiveDateTime;

use super::model::EventTable;
use crate::task::TaskContext;

/// How dates are rendered when a cell holds an Excel date/time.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Rows converted between progress updates / cancellation checks.
const PROGRESS_STEP: usize = 1000;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// An opened source file and the sheets it offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
    pub path: PathBuf,
    pub sheet_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Spreadsheet,
    Csv,
}

fn detect_format(path: &Path) -> Result<Format> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Format::Spreadsheet),
        "csv" => Ok(Format::Csv),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Open a workbook and list its sheets. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – every sheet
/// * `.csv` – a single sheet named after the file
pub fn open_workbook(path: &Path) -> Result<Workbook> {
    let sheet_names = match detect_format(path)? {
        Format::Spreadsheet => open_workbook_auto(path)
            .with_context(|| format!("opening workbook {}", path.display()))?
            .sheet_names(),
        Format::Csv => vec![path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("csv")
            .to_string()],
    };
    if sheet_names.is_empty() {
        bail!("{} contains no sheets", path.display());
    }
    Ok(Workbook {
        path: path.to_path_buf(),
        sheet_names,
    })
}

/// Read one sheet as text. The first row is the header; every cell is kept
/// as its textual form (deferred typing).
pub fn read_sheet(path: &Path, sheet: &str, ctx: &TaskContext) -> Result<EventTable> {
    ctx.pulse(&format!("Reading sheet '{sheet}'…"));
    let mut rows = match detect_format(path)? {
        Format::Spreadsheet => read_spreadsheet_rows(path, sheet, ctx)?,
        Format::Csv => read_csv_rows(path)?,
    }
    .into_iter();

    let header = rows.next().unwrap_or_default();
    let table = EventTable::new(header, rows.collect());
    log::info!(
        "Loaded sheet '{sheet}' from {}: {} rows, columns {:?}",
        path.display(),
        table.len(),
        table.header
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Spreadsheet reader
// ---------------------------------------------------------------------------

fn read_spreadsheet_rows(path: &Path, sheet: &str, ctx: &TaskContext) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("reading sheet '{sheet}'"))?;

    let total = range.height();
    let mut rows = Vec::with_capacity(total);
    for (i, row) in range.rows().enumerate() {
        if i % PROGRESS_STEP == 0 {
            ctx.check_cancelled()?;
            ctx.set_progress(i as u64, total as u64, None);
        }
        rows.push(row.iter().map(cell_text).collect());
    }
    Ok(rows)
}

/// Textual form of a cell: integer-valued floats without fraction, dates as
/// [`DATETIME_FORMAT`], empty and error cells as `""`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt: NaiveDateTime| dt.format(DATETIME_FORMAT).to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;

    reader
        .records()
        .enumerate()
        .map(|(row_no, result)| -> Result<Vec<String>> {
            let record = result.with_context(|| format!("CSV row {row_no}"))?;
            Ok(record.iter().map(str::to_string).collect())
        })
        .collect()
}
