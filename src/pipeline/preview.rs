//! Tabular preview: the first rows of converted row/column data.
//!
//! Shown next to the download so the user can eyeball the result without
//! opening it. Preview extraction is strictly best-effort — a conversion
//! never fails because its preview could not be built.

use crate::output::TablePreview;
use tracing::debug;

/// Extract the head of delimited-text bytes as a [`TablePreview`].
///
/// Returns `None` when `limit` is 0, the bytes parse to no records, or the
/// csv reader chokes — the artifact is already converted at this point and
/// a preview problem must not fail the run.
pub fn from_csv_bytes(bytes: &[u8], delimiter: u8, limit: usize) -> Option<TablePreview> {
    if limit == 0 {
        return None;
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(limit);
    let mut truncated = false;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Preview skipped: {}", e);
                return None;
            }
        };
        if rows.len() == limit {
            truncated = true;
            break;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        return None;
    }

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    Some(TablePreview {
        rows,
        columns,
        truncated,
    })
}
