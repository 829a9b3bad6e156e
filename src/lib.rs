//! # docshuttle
//!
//! Convert spreadsheets and documents between formats — CLI and library.
//!
//! ## What this crate is (and is not)
//!
//! docshuttle is a thin orchestration layer over external conversion
//! backends. It validates the selected conversion direction, resolves the
//! input (file, URL, or bytes), hands the bytes to exactly one backend,
//! and delivers the artifact with a download filename, MIME type, and an
//! optional tabular preview. It implements no parsing or layout logic of
//! its own — calamine, rust_xlsxwriter, lopdf, docx-rust, and a remote
//! conversion API do the byte-level work.
//!
//! ## Directions
//!
//! ```text
//! xlsx/xls ──▶ csv      calamine + csv          (local)
//! csv      ──▶ xlsx     csv + rust_xlsxwriter   (local)
//! docx     ──▶ pdf      remote conversion API   (needs CONVERTAPI_SECRET)
//! pdf      ──▶ docx     lopdf + docx-rust       (local)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docshuttle::{convert, ConvertConfig, Direction};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConvertConfig::default();
//!     let output = convert("report.xlsx", Direction::XlsxToCsv, &config).await?;
//!     std::fs::write(&output.filename, &output.bytes)?;
//!     if let Some(preview) = &output.preview {
//!         println!("{}", preview.render());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docshuttle` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! docshuttle = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConvertConfig, ConvertConfigBuilder, SheetSelector};
pub use convert::{convert, convert_bytes, convert_sync, convert_to_file, inspect};
pub use error::ConvertError;
pub use format::{Direction, Format};
pub use output::{
    ConversionOutput, ConversionStats, InspectDetail, InspectReport, SheetInfo, TablePreview,
};
