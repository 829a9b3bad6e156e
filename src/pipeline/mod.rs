//! Pipeline stages for file conversion.
//!
//! Each submodule owns exactly one concern, so a backend can be swapped
//! without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ dispatch ──▶ backend ──▶ preview
//! (URL/path)  (direction)  (local lib     (tabular
//!                          or remote API)  head rows)
//! ```
//!
//! 1. [`input`]       — canonicalise the user-supplied path or URL to local
//!    bytes, validating magic bytes for formats that have them
//! 2. [`spreadsheet`] — workbook ⇄ delimited text via calamine /
//!    rust_xlsxwriter; CPU-bound, runs in `spawn_blocking`
//! 3. [`document`]    — PDF → DOCX via lopdf text extraction and the
//!    docx-rust writer; the only stage that needs scratch files
//! 4. [`remote`]      — DOCX → PDF via the remote conversion API; the only
//!    stage with network I/O after input resolution
//! 5. [`preview`]     — head rows of tabular content for result delivery

pub mod document;
pub mod input;
pub mod preview;
pub mod remote;
pub mod spreadsheet;
