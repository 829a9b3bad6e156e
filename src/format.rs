//! File formats and conversion directions.
//!
//! A [`Direction`] is the user-selected (source, target) pair that governs
//! which backend runs. Everything downstream — the upload allow-list, the
//! magic-byte check, the output filename and MIME type — derives from it,
//! so the rest of the crate never branches on raw extension strings.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A file format this tool can read or produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// OOXML spreadsheet (`.xlsx`).
    Xlsx,
    /// Legacy binary spreadsheet (`.xls`). Read-only source format.
    Xls,
    /// Delimited text (`.csv`).
    Csv,
    /// OOXML word-processing document (`.docx`).
    Docx,
    /// Page-description document (`.pdf`).
    Pdf,
}

impl Format {
    /// Canonical extension, lower-case, no dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Xlsx => "xlsx",
            Format::Xls => "xls",
            Format::Csv => "csv",
            Format::Docx => "docx",
            Format::Pdf => "pdf",
        }
    }

    /// MIME type used when delivering an artifact of this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            Format::Xls => "application/vnd.ms-excel",
            Format::Csv => "text/csv",
            Format::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Format::Pdf => "application/pdf",
        }
    }

    /// Leading magic bytes, when the format has a fixed signature.
    ///
    /// OOXML containers (xlsx, docx) are ZIP archives; CSV and legacy xls
    /// have no signature we check (xls is OLE2, but calamine gives a better
    /// error than a magic mismatch would).
    pub fn magic(&self) -> Option<&'static [u8]> {
        match self {
            Format::Xlsx | Format::Docx => Some(b"PK\x03\x04"),
            Format::Pdf => Some(b"%PDF"),
            Format::Xls | Format::Csv => None,
        }
    }

    /// Whether content in this format is row/column data worth previewing.
    pub fn is_tabular(&self) -> bool {
        matches!(self, Format::Xlsx | Format::Xls | Format::Csv)
    }

    /// Map a file extension (lower-cased, no dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext {
            "xlsx" => Some(Format::Xlsx),
            "xls" => Some(Format::Xls),
            "csv" => Some(Format::Csv),
            "docx" => Some(Format::Docx),
            "pdf" => Some(Format::Pdf),
            _ => None,
        }
    }

    /// Detect the format of a named file, falling back from extension to
    /// magic bytes when the extension is unknown.
    pub fn detect(name: &str, head: &[u8]) -> Option<Format> {
        if let Some(f) = extension_of(name).and_then(|e| Format::from_extension(&e)) {
            return Some(f);
        }
        if head.starts_with(b"%PDF") {
            return Some(Format::Pdf);
        }
        None
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The user-selected conversion direction.
///
/// Exactly four directions exist; each maps to one backend:
///
/// | Direction   | Backend                         |
/// |-------------|---------------------------------|
/// | `XlsxToCsv` | calamine + csv (local)          |
/// | `CsvToXlsx` | csv + rust_xlsxwriter (local)   |
/// | `DocxToPdf` | remote conversion API           |
/// | `PdfToDocx` | lopdf + docx-rust (local)       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    XlsxToCsv,
    CsvToXlsx,
    DocxToPdf,
    PdfToDocx,
}

impl Direction {
    /// All supported directions, in display order.
    pub const ALL: [Direction; 4] = [
        Direction::XlsxToCsv,
        Direction::CsvToXlsx,
        Direction::DocxToPdf,
        Direction::PdfToDocx,
    ];

    /// The canonical source format (xls is also accepted for `XlsxToCsv`).
    pub fn source(&self) -> Format {
        match self {
            Direction::XlsxToCsv => Format::Xlsx,
            Direction::CsvToXlsx => Format::Csv,
            Direction::DocxToPdf => Format::Docx,
            Direction::PdfToDocx => Format::Pdf,
        }
    }

    /// The target format the artifact is delivered in.
    pub fn target(&self) -> Format {
        match self {
            Direction::XlsxToCsv => Format::Csv,
            Direction::CsvToXlsx => Format::Xlsx,
            Direction::DocxToPdf => Format::Pdf,
            Direction::PdfToDocx => Format::Docx,
        }
    }

    /// The upload allow-list: extensions accepted as input for this direction.
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Direction::XlsxToCsv => &["xlsx", "xls"],
            Direction::CsvToXlsx => &["csv"],
            Direction::DocxToPdf => &["docx"],
            Direction::PdfToDocx => &["pdf"],
        }
    }

    /// Stable label, also the CLI spelling (`--direction xlsx-csv`).
    pub fn label(&self) -> &'static str {
        match self {
            Direction::XlsxToCsv => "xlsx-csv",
            Direction::CsvToXlsx => "csv-xlsx",
            Direction::DocxToPdf => "docx-pdf",
            Direction::PdfToDocx => "pdf-docx",
        }
    }

    /// Resolve a direction from a detected source and a requested target.
    ///
    /// `Xls` sources fold into [`Direction::XlsxToCsv`] — calamine reads
    /// both container types behind one call.
    pub fn from_formats(source: Format, target: Format) -> Result<Direction, ConvertError> {
        match (source, target) {
            (Format::Xlsx | Format::Xls, Format::Csv) => Ok(Direction::XlsxToCsv),
            (Format::Csv, Format::Xlsx) => Ok(Direction::CsvToXlsx),
            (Format::Docx, Format::Pdf) => Ok(Direction::DocxToPdf),
            (Format::Pdf, Format::Docx) => Ok(Direction::PdfToDocx),
            _ => Err(ConvertError::UnsupportedDirection {
                src: source.to_string(),
                target: target.to_string(),
            }),
        }
    }

    /// Check a filename against the allow-list before any backend runs.
    pub fn check_extension(&self, name: &str) -> Result<(), ConvertError> {
        let ext = extension_of(name).unwrap_or_default();
        if self.allowed_extensions().contains(&ext.as_str()) {
            Ok(())
        } else {
            Err(ConvertError::UnsupportedExtension {
                name: name.to_string(),
                direction: self.label(),
                allowed: self.allowed_extensions().join(", "),
            })
        }
    }

    /// Derive the delivered filename: strip the final extension, append the
    /// target's. `report.xlsx` → `report.csv`; an extensionless name just
    /// gains the new extension.
    pub fn output_filename(&self, input_name: &str) -> String {
        let stem = match input_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => input_name,
        };
        format!("{}.{}", stem, self.target().extension())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx-csv" | "xls-csv" | "excel-csv" => Ok(Direction::XlsxToCsv),
            "csv-xlsx" | "csv-excel" => Ok(Direction::CsvToXlsx),
            "docx-pdf" | "word-pdf" => Ok(Direction::DocxToPdf),
            "pdf-docx" | "pdf-word" => Ok(Direction::PdfToDocx),
            other => {
                let (source, target) = other.split_once('-').unwrap_or((other, ""));
                Err(ConvertError::UnsupportedDirection {
                    src: source.to_string(),
                    target: target.to_string(),
                })
            }
        }
    }
}

/// Lower-cased extension of a file or URL basename, without the dot.
pub(crate) fn extension_of(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.rsplit_once('.')
        .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
        .map(|(_, ext)| ext.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parse_labels() {
        assert_eq!("xlsx-csv".parse::<Direction>().unwrap(), Direction::XlsxToCsv);
        assert_eq!("CSV-XLSX".parse::<Direction>().unwrap(), Direction::CsvToXlsx);
        assert_eq!("docx-pdf".parse::<Direction>().unwrap(), Direction::DocxToPdf);
        assert_eq!("pdf-docx".parse::<Direction>().unwrap(), Direction::PdfToDocx);
        assert!("xlsx-pdf".parse::<Direction>().is_err());
    }

    #[test]
    fn allow_list_accepts_both_excel_extensions() {
        assert!(Direction::XlsxToCsv.check_extension("book.xlsx").is_ok());
        assert!(Direction::XlsxToCsv.check_extension("legacy.XLS").is_ok());
        assert!(Direction::XlsxToCsv.check_extension("data.csv").is_err());
    }

    #[test]
    fn allow_list_rejects_missing_extension() {
        assert!(Direction::CsvToXlsx.check_extension("data").is_err());
        assert!(Direction::PdfToDocx.check_extension(".pdf").is_err());
    }

    #[test]
    fn output_filename_replaces_extension() {
        assert_eq!(
            Direction::XlsxToCsv.output_filename("report.xlsx"),
            "report.csv"
        );
        assert_eq!(
            Direction::CsvToXlsx.output_filename("monthly.sales.csv"),
            "monthly.sales.xlsx"
        );
        assert_eq!(Direction::DocxToPdf.output_filename("letter"), "letter.pdf");
    }

    #[test]
    fn from_formats_folds_xls_into_xlsx_direction() {
        assert_eq!(
            Direction::from_formats(Format::Xls, Format::Csv).unwrap(),
            Direction::XlsxToCsv
        );
        assert!(Direction::from_formats(Format::Pdf, Format::Csv).is_err());
    }

    #[test]
    fn format_detect_prefers_extension_then_magic() {
        assert_eq!(Format::detect("a.csv", b"PK\x03\x04"), Some(Format::Csv));
        assert_eq!(Format::detect("download", b"%PDF-1.7"), Some(Format::Pdf));
        assert_eq!(Format::detect("download", b"PK\x03\x04"), None);
    }

    #[test]
    fn extension_of_handles_paths_and_urls() {
        assert_eq!(extension_of("/tmp/a/report.XLSX").as_deref(), Some("xlsx"));
        assert_eq!(
            extension_of("https://host/files/doc.docx").as_deref(),
            Some("docx")
        );
        assert_eq!(extension_of("noext"), None);
    }
}
