//! Error types for the docshuttle library.
//!
//! Every conversion path fails as a single [`ConvertError`] returned from
//! the top-level `convert*` functions. A conversion is an all-or-nothing
//! request/response exchange — there is no partial output to salvage, so
//! one error type covers the whole crate.
//!
//! Messages are written for the person who typed the command: they carry
//! the offending path/URL/status and, where a remediation exists, a hint
//! on the next line.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docshuttle library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The file's extension is not in the selected direction's allow-list.
    #[error(
        "'{name}' cannot be the source of a {direction} conversion.\n\
         Accepted extensions: {allowed}"
    )]
    UnsupportedExtension {
        name: String,
        direction: &'static str,
        allowed: String,
    },

    /// The (source, target) pair is not one of the supported directions.
    #[error(
        "No conversion from {src} to {target} is supported.\n\
         Supported directions: xlsx-csv, csv-xlsx, docx-pdf, pdf-docx."
    )]
    UnsupportedDirection { src: String, target: String },

    /// The file exists but its leading bytes do not match the expected format.
    #[error("File is not a valid {expected} file: '{path}'\nFirst bytes: {magic:?}")]
    FormatMismatch {
        path: PathBuf,
        expected: &'static str,
        magic: [u8; 4],
    },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Spreadsheet errors ────────────────────────────────────────────────
    /// calamine could not parse the workbook.
    #[error("Failed to read spreadsheet: {detail}")]
    SpreadsheetParse { detail: String },

    /// The workbook (or the selected sheet) contains no cells.
    #[error("Worksheet '{sheet}' is empty — nothing to convert")]
    EmptyWorkbook { sheet: String },

    /// A sheet selector named a worksheet that does not exist.
    #[error("Worksheet '{name}' not found. Available sheets: {available}")]
    SheetNotFound { name: String, available: String },

    /// The csv crate rejected the delimited input.
    #[error("Failed to parse delimited text: {detail}")]
    CsvParse { detail: String },

    /// rust_xlsxwriter failed to produce the workbook.
    #[error("Failed to write workbook: {detail}")]
    XlsxWrite { detail: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// lopdf could not parse the PDF.
    #[error("Failed to read PDF: {detail}")]
    PdfParse { detail: String },

    /// The PDF is encrypted; text extraction would return ciphertext.
    #[error("PDF is encrypted and cannot be converted.")]
    PdfEncrypted,

    /// No page yielded any text (scanned/image-only PDF).
    #[error(
        "No extractable text found in the PDF.\n\
         Image-only (scanned) PDFs need OCR, which this tool does not perform."
    )]
    NoExtractableText,

    /// docx-rust failed to write the document.
    #[error("Failed to write document: {detail}")]
    DocxWrite { detail: String },

    // ── Remote API errors ─────────────────────────────────────────────────
    /// No API secret in config or environment.
    #[error(
        "Conversion API secret is not configured.\n\
         Set CONVERTAPI_SECRET or pass --api-key."
    )]
    ApiKeyMissing,

    /// The conversion service answered with a non-success status.
    #[error("Conversion API returned HTTP {status}: {body}")]
    RemoteApi { status: u16, body: String },

    /// The request could not be delivered at all (DNS, TLS, connection reset).
    #[error("Conversion API request failed: {reason}")]
    ApiRequestFailed { reason: String },

    /// The API call exceeded the configured timeout.
    #[error("Conversion API call timed out after {secs}s\nIncrease --api-timeout.")]
    ApiTimeout { secs: u64 },

    /// A 2xx response whose body we could not interpret.
    #[error("Conversion API returned an unexpected response: {detail}")]
    MalformedApiResponse { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
