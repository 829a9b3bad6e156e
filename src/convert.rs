//! Conversion entry points: validate, dispatch, deliver.
//!
//! The flow is the same for every direction:
//!
//! 1. Check the input name against the direction's extension allow-list —
//!    before any bytes are read or any backend is touched.
//! 2. Resolve the input (local path, URL download, or caller-supplied
//!    bytes), verifying magic bytes where the format has them.
//! 3. Dispatch to the one backend the direction maps to.
//! 4. Wrap the artifact with its download filename, MIME type, optional
//!    tabular preview, and run stats.
//!
//! There is deliberately no orchestration beyond this: one upload in, one
//! artifact (or one error) out.

use crate::config::ConvertConfig;
use crate::error::ConvertError;
use crate::format::{extension_of, Direction, Format};
use crate::output::{
    ConversionOutput, ConversionStats, InspectDetail, InspectReport, SheetInfo,
};
use crate::pipeline::{document, input, preview, remote, spreadsheet};
use calamine::Reader;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a file or URL in the given direction.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL
/// * `direction` — The selected (source, target) pair
/// * `config`    — Conversion configuration
///
/// # Errors
/// Returns `Err(ConvertError)` when the extension is outside the
/// direction's allow-list, the input cannot be resolved, or the backend
/// fails. There are no partial results.
pub async fn convert(
    input_str: impl AsRef<str>,
    direction: Direction,
    config: &ConvertConfig,
) -> Result<ConversionOutput, ConvertError> {
    let started = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting {} conversion: {}", direction, input_str);

    // ── Step 1: Upload allow-list ────────────────────────────────────────
    let name = display_name(input_str);
    direction.check_extension(&name)?;

    // ── Step 2: Resolve input ────────────────────────────────────────────
    // Magic bytes are checked against the file's own format (an .xls
    // source of xlsx-csv is OLE2, not ZIP), not the direction's canonical
    // source.
    let source_format =
        extension_of(&name).and_then(|e| Format::from_extension(&e));
    let resolved = input::resolve(input_str, source_format, config.download_timeout_secs).await?;
    let bytes = tokio::fs::read(resolved.path())
        .await
        .map_err(|e| ConvertError::Internal(format!("Failed to read input: {}", e)))?;

    run(bytes, &resolved.file_name(), direction, config, started).await
}

/// Convert in-memory bytes in the given direction.
///
/// `input_name` drives the allow-list check and the delivered filename,
/// exactly as an uploaded file's name would.
pub async fn convert_bytes(
    bytes: Vec<u8>,
    input_name: &str,
    direction: Direction,
    config: &ConvertConfig,
) -> Result<ConversionOutput, ConvertError> {
    let started = Instant::now();
    info!(
        "Starting {} conversion of {} in-memory bytes",
        direction,
        bytes.len()
    );

    direction.check_extension(input_name)?;
    if let Some(format) = extension_of(input_name).and_then(|e| Format::from_extension(&e)) {
        input::check_magic(
            &bytes[..bytes.len().min(4)],
            format,
            Path::new(input_name),
        )?;
    }

    run(bytes, input_name, direction, config, started).await
}

/// Convert and write the artifact directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    direction: Direction,
    config: &ConvertConfig,
) -> Result<ConversionOutput, ConvertError> {
    let output = convert(input_str, direction, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ConvertError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(&tmp_path, &output.bytes)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    direction: Direction,
    config: &ConvertConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, direction, config))
}

/// Report structure facts about an input without converting it.
///
/// Does not require an API key and never calls a remote service.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<InspectReport, ConvertError> {
    let input_str = input_str.as_ref();
    let name = display_name(input_str);
    let guessed = extension_of(&name).and_then(|e| Format::from_extension(&e));

    let resolved = input::resolve(input_str, guessed, 120).await?;
    let bytes = tokio::fs::read(resolved.path())
        .await
        .map_err(|e| ConvertError::Internal(format!("Failed to read input: {}", e)))?;

    let format = Format::detect(&resolved.file_name(), &bytes).ok_or_else(|| {
        ConvertError::InvalidInput {
            input: input_str.to_string(),
        }
    })?;
    let size_bytes = bytes.len() as u64;

    let detail = tokio::task::spawn_blocking(move || inspect_detail(format, &bytes))
        .await
        .map_err(|e| ConvertError::Internal(format!("Inspect task panicked: {}", e)))??;

    Ok(InspectReport {
        format,
        size_bytes,
        detail,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Dispatch + delivery shared by the path and bytes entry points.
async fn run(
    bytes: Vec<u8>,
    input_name: &str,
    direction: Direction,
    config: &ConvertConfig,
    started: Instant,
) -> Result<ConversionOutput, ConvertError> {
    let input_len = bytes.len() as u64;

    // The csv-xlsx preview reads the input, which dispatch consumes.
    let preview_source = if direction == Direction::CsvToXlsx && config.preview_rows > 0 {
        Some(bytes.clone())
    } else {
        None
    };

    // ── Dispatch to the direction's backend ──────────────────────────────
    let (out_bytes, backend) = match direction {
        Direction::XlsxToCsv => (
            spreadsheet::xlsx_to_csv(bytes, config).await?,
            "calamine+csv",
        ),
        Direction::CsvToXlsx => (
            spreadsheet::csv_to_xlsx(bytes, config).await?,
            "csv+rust_xlsxwriter",
        ),
        Direction::DocxToPdf => (
            remote::docx_to_pdf(&bytes, input_name, config).await?,
            "remote-api",
        ),
        Direction::PdfToDocx => (document::pdf_to_docx(bytes).await?, "lopdf+docx-rust"),
    };

    // ── Result delivery ──────────────────────────────────────────────────
    let preview = match direction {
        Direction::XlsxToCsv => {
            preview::from_csv_bytes(&out_bytes, config.delimiter, config.preview_rows)
        }
        Direction::CsvToXlsx => preview_source
            .as_deref()
            .and_then(|b| preview::from_csv_bytes(b, config.delimiter, config.preview_rows)),
        _ => None,
    };

    let stats = ConversionStats {
        input_bytes: input_len,
        output_bytes: out_bytes.len() as u64,
        duration_ms: started.elapsed().as_millis() as u64,
        backend: backend.to_string(),
    };
    info!(
        "Conversion complete: {} → {} bytes in {}ms via {}",
        stats.input_bytes, stats.output_bytes, stats.duration_ms, backend
    );

    Ok(ConversionOutput {
        bytes: out_bytes,
        filename: direction.output_filename(input_name),
        mime_type: direction.target().mime_type().to_string(),
        preview,
        stats,
    })
}

/// Basename of a path or URL, for allow-list checks and logs.
fn display_name(input: &str) -> String {
    if input::is_url(input) {
        let no_query = input.split(['?', '#']).next().unwrap_or(input);
        no_query
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("download")
            .to_string()
    } else {
        Path::new(input)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.to_string())
    }
}

/// Format-specific facts for [`inspect`]. CPU-bound, caller wraps in
/// `spawn_blocking`.
fn inspect_detail(format: Format, bytes: &[u8]) -> Result<InspectDetail, ConvertError> {
    match format {
        Format::Xlsx | Format::Xls => {
            let mut workbook =
                calamine::open_workbook_auto_from_rs(std::io::Cursor::new(bytes.to_vec()))
                    .map_err(|e| ConvertError::SpreadsheetParse {
                        detail: e.to_string(),
                    })?;
            let mut sheets = Vec::new();
            for name in workbook.sheet_names() {
                let range =
                    workbook
                        .worksheet_range(&name)
                        .map_err(|e| ConvertError::SpreadsheetParse {
                            detail: e.to_string(),
                        })?;
                sheets.push(SheetInfo {
                    name,
                    rows: range.height(),
                    columns: range.width(),
                });
            }
            debug!("Inspected workbook: {} sheets", sheets.len());
            Ok(InspectDetail::Spreadsheet { sheets })
        }
        Format::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(bytes);
            let mut records = 0usize;
            let mut fields = 0usize;
            for result in reader.records() {
                let record = result.map_err(|e| ConvertError::CsvParse {
                    detail: e.to_string(),
                })?;
                records += 1;
                fields = fields.max(record.len());
            }
            Ok(InspectDetail::Delimited { records, fields })
        }
        Format::Pdf => {
            let pdf = lopdf::Document::load_mem(bytes).map_err(|e| ConvertError::PdfParse {
                detail: e.to_string(),
            })?;
            Ok(InspectDetail::Pdf {
                pages: pdf.get_pages().len(),
                encrypted: pdf.is_encrypted(),
            })
        }
        Format::Docx => Ok(InspectDetail::Document),
    }
}
