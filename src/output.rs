//! Result types: the delivered artifact, its stats, and inspect reports.

use crate::format::Format;
use serde::{Deserialize, Serialize};

/// The result of one conversion: the artifact plus everything needed to
/// deliver it as a download.
///
/// `bytes` is skipped during serialisation — `--json` output carries the
/// metadata and stats, the artifact itself goes to the output file.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Converted artifact.
    #[serde(skip_serializing)]
    pub bytes: Vec<u8>,

    /// Suggested download filename, derived from the input name with the
    /// target extension.
    pub filename: String,

    /// MIME type matching the target format.
    pub mime_type: String,

    /// First rows of the tabular content, when the conversion involves
    /// row/column data and the preview is enabled.
    pub preview: Option<TablePreview>,

    /// Timing and size accounting for the run.
    pub stats: ConversionStats,
}

/// Accounting for a single conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Size of the uploaded input in bytes.
    pub input_bytes: u64,
    /// Size of the delivered artifact in bytes.
    pub output_bytes: u64,
    /// Wall-clock duration of the whole conversion.
    pub duration_ms: u64,
    /// Which backend produced the artifact, e.g. `"calamine+csv"` or
    /// `"remote-api"`.
    pub backend: String,
}

/// First rows of tabular content, for display next to the download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablePreview {
    /// Up to `preview_rows` records, fields stringified.
    pub rows: Vec<Vec<String>>,
    /// Field count of the widest previewed record.
    pub columns: usize,
    /// True when the source had more records than the preview shows.
    pub truncated: bool,
}

impl TablePreview {
    /// Render the preview as an aligned plain-text table.
    ///
    /// Column widths come from the previewed rows only; cells are
    /// left-aligned and padded with spaces, columns separated by two
    /// spaces. Plain output so it pastes cleanly into terminals and logs.
    pub fn render(&self) -> String {
        let mut widths = vec![0usize; self.columns];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        for row in &self.rows {
            for (i, width) in widths.iter().enumerate() {
                if i > 0 {
                    out.push_str("  ");
                }
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                out.push_str(cell);
                for _ in cell.chars().count()..*width {
                    out.push(' ');
                }
            }
            // Strip pad trailing the last column
            while out.ends_with(' ') {
                out.pop();
            }
            out.push('\n');
        }
        if self.truncated {
            out.push_str("…\n");
        }
        out
    }
}

/// Cheap structural facts about an input, gathered without converting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectReport {
    /// Detected format.
    pub format: Format,
    /// Input size in bytes.
    pub size_bytes: u64,
    /// Format-specific detail.
    pub detail: InspectDetail,
}

/// Per-format structure facts for [`InspectReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InspectDetail {
    /// Workbook: every sheet with its used-range dimensions.
    Spreadsheet { sheets: Vec<SheetInfo> },
    /// Delimited text: record count and widest record.
    Delimited { records: usize, fields: usize },
    /// PDF: page count and encryption flag.
    Pdf { pages: usize, encrypted: bool },
    /// Word-processing document: no cheap structure facts beyond size.
    Document,
}

/// One worksheet's name and used-range dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetInfo {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}
