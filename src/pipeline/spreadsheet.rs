//! Spreadsheet ⇄ delimited text via calamine and rust_xlsxwriter.
//!
//! ## Why spawn_blocking?
//!
//! calamine inflates the whole OOXML container and rust_xlsxwriter
//! deflates the output workbook — both CPU-bound, neither async-aware.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so
//! runtime worker threads never stall on a large workbook.
//!
//! ## Cell rendering
//!
//! CSV has one type (text), spreadsheets have several, so the xlsx→csv
//! direction must pick a lossy-but-predictable rendering per cell type:
//! integral floats drop the `.0`, date/time cells become ISO-8601, error
//! cells keep their Excel literal (`#DIV/0!`), empty cells become empty
//! fields. Rows are padded to the sheet width so every record has the
//! same field count.

use crate::config::{ConvertConfig, SheetSelector};
use crate::error::ConvertError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_xlsxwriter::Workbook;
use std::io::Cursor;
use tracing::{debug, info};

/// Convert workbook bytes (xlsx or xls) to CSV bytes.
pub async fn xlsx_to_csv(bytes: Vec<u8>, config: &ConvertConfig) -> Result<Vec<u8>, ConvertError> {
    let sheet = config.sheet.clone();
    let delimiter = config.delimiter;
    tokio::task::spawn_blocking(move || xlsx_to_csv_blocking(bytes, &sheet, delimiter))
        .await
        .map_err(|e| ConvertError::Internal(format!("Spreadsheet task panicked: {}", e)))?
}

fn xlsx_to_csv_blocking(
    bytes: Vec<u8>,
    sheet: &SheetSelector,
    delimiter: u8,
) -> Result<Vec<u8>, ConvertError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| {
        ConvertError::SpreadsheetParse {
            detail: e.to_string(),
        }
    })?;

    let names = workbook.sheet_names();
    let name = select_sheet(&names, sheet)?;
    debug!("Reading worksheet '{}'", name);

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| ConvertError::SpreadsheetParse {
            detail: e.to_string(),
        })?;

    if range.is_empty() {
        return Err(ConvertError::EmptyWorkbook { sheet: name });
    }

    let width = range.width();
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    for row in range.rows() {
        let mut record: Vec<String> = row.iter().map(render_cell).collect();
        record.resize(width, String::new());
        writer
            .write_record(&record)
            .map_err(|e| ConvertError::CsvParse {
                detail: e.to_string(),
            })?;
    }

    let out = writer
        .into_inner()
        .map_err(|e| ConvertError::Internal(format!("CSV flush failed: {}", e)))?;
    info!(
        "Converted worksheet '{}' ({} rows) to {} CSV bytes",
        name,
        range.height(),
        out.len()
    );
    Ok(out)
}

/// Convert CSV bytes to a single-worksheet xlsx workbook.
pub async fn csv_to_xlsx(bytes: Vec<u8>, config: &ConvertConfig) -> Result<Vec<u8>, ConvertError> {
    let delimiter = config.delimiter;
    let infer_numbers = config.infer_numbers;
    tokio::task::spawn_blocking(move || csv_to_xlsx_blocking(bytes, delimiter, infer_numbers))
        .await
        .map_err(|e| ConvertError::Internal(format!("Spreadsheet task panicked: {}", e)))?
}

fn csv_to_xlsx_blocking(
    bytes: Vec<u8>,
    delimiter: u8,
    infer_numbers: bool,
) -> Result<Vec<u8>, ConvertError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let mut rows = 0usize;
    for (r, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ConvertError::CsvParse {
            detail: e.to_string(),
        })?;
        let row = u32::try_from(r).map_err(|_| ConvertError::XlsxWrite {
            detail: "input exceeds the xlsx row limit".to_string(),
        })?;
        for (c, field) in record.iter().enumerate() {
            let col = u16::try_from(c).map_err(|_| ConvertError::XlsxWrite {
                detail: format!("record {} exceeds the xlsx column limit", r + 1),
            })?;
            match infer_number(field, infer_numbers) {
                Some(n) => worksheet.write_number(row, col, n),
                None => worksheet.write_string(row, col, field),
            }
            .map_err(|e| ConvertError::XlsxWrite {
                detail: e.to_string(),
            })?;
        }
        rows += 1;
    }

    if rows == 0 {
        return Err(ConvertError::CsvParse {
            detail: "input contains no records".to_string(),
        });
    }

    let out = workbook
        .save_to_buffer()
        .map_err(|e| ConvertError::XlsxWrite {
            detail: e.to_string(),
        })?;
    info!("Converted {} CSV records to {} xlsx bytes", rows, out.len());
    Ok(out)
}

/// Resolve a sheet selector against the workbook's sheet list.
fn select_sheet(names: &[String], selector: &SheetSelector) -> Result<String, ConvertError> {
    match selector {
        SheetSelector::First => names.first().cloned().ok_or(ConvertError::EmptyWorkbook {
            sheet: "<none>".to_string(),
        }),
        SheetSelector::Index(i) => names.get(*i).cloned().ok_or_else(|| {
            ConvertError::SheetNotFound {
                name: format!("#{}", i),
                available: names.join(", "),
            }
        }),
        SheetSelector::Name(n) => {
            if names.iter().any(|x| x == n) {
                Ok(n.clone())
            } else {
                Err(ConvertError::SheetNotFound {
                    name: n.clone(),
                    available: names.join(", "),
                })
            }
        }
    }
}

/// Render one spreadsheet cell as a CSV field.
fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => render_float(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => {
                if naive.time() == chrono::NaiveTime::MIN {
                    naive.format("%Y-%m-%d").to_string()
                } else {
                    naive.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            // Durations and out-of-range serials keep the raw serial value
            None => render_float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

/// Integral floats print without the trailing `.0`.
fn render_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Parse a CSV field as a number when inference is on.
///
/// Only finite values count; anything else stays a string. This mirrors
/// what a spreadsheet application does on CSV import, minus date guessing.
fn infer_number(field: &str, enabled: bool) -> Option<f64> {
    if !enabled {
        return None;
    }
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
