//! CLI binary for docshuttle.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConvertConfig` + `Direction` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use docshuttle::{
    convert_to_file, inspect, ConvertConfig, Direction, Format, InspectDetail, SheetSelector,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Spreadsheet to CSV (output name inferred: report.csv)
  docshuttle report.xlsx --to csv

  # CSV to spreadsheet, semicolon-delimited input
  docshuttle data.csv --to xlsx --delimiter ";"

  # Pick a worksheet by name
  docshuttle report.xlsx --to csv --sheet Summary

  # Word document to PDF via the remote conversion API
  export CONVERTAPI_SECRET=sk-...
  docshuttle letter.docx --to pdf -o letter.pdf

  # PDF to Word (local, text-only extraction)
  docshuttle paper.pdf --to docx

  # Convert straight from a URL
  docshuttle https://example.com/files/report.xlsx --to csv

  # Inspect structure without converting (no API key needed)
  docshuttle report.xlsx --inspect-only

  # Machine-readable result summary
  docshuttle report.xlsx --to csv --json

DIRECTIONS:
  Source      Target   Backend
  ─────────   ──────   ───────────────────────
  xlsx, xls   csv      local spreadsheet libraries
  csv         xlsx     local spreadsheet libraries
  docx        pdf      remote conversion API (secret key required)
  pdf         docx     local document libraries (text only, no OCR)

ENVIRONMENT VARIABLES:
  CONVERTAPI_SECRET   Secret key for the docx→pdf remote conversion API
"#;

/// Convert spreadsheets and documents between formats.
#[derive(Parser, Debug)]
#[command(
    name = "docshuttle",
    version,
    about = "Convert spreadsheets and documents between formats",
    long_about = "Convert files (local paths or URLs) between spreadsheet, delimited-text, \
word-processing, and page-description formats. Spreadsheet directions run locally; \
docx→pdf delegates to a remote conversion API.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path or HTTP/HTTPS URL.
    input: String,

    /// Target format: csv, xlsx, pdf, docx. Source is inferred from the
    /// input extension.
    #[arg(long, conflicts_with = "direction")]
    to: Option<String>,

    /// Explicit direction: xlsx-csv, csv-xlsx, docx-pdf, pdf-docx.
    #[arg(long)]
    direction: Option<String>,

    /// Write the artifact to this path instead of the inferred filename.
    #[arg(short, long, env = "DOCSHUTTLE_OUTPUT")]
    output: Option<PathBuf>,

    /// Worksheet to read: a name, or a 0-based index.
    #[arg(long, env = "DOCSHUTTLE_SHEET")]
    sheet: Option<String>,

    /// Field delimiter for delimited text ("tab" for tab).
    #[arg(long, env = "DOCSHUTTLE_DELIMITER", default_value = ",")]
    delimiter: String,

    /// Rows shown in the tabular preview.
    #[arg(long, env = "DOCSHUTTLE_PREVIEW_ROWS", default_value_t = 10)]
    preview_rows: usize,

    /// Disable the tabular preview.
    #[arg(long, env = "DOCSHUTTLE_NO_PREVIEW")]
    no_preview: bool,

    /// Write everything as strings when building a workbook (no number
    /// inference).
    #[arg(long)]
    no_infer_numbers: bool,

    /// Base URL of the remote conversion API.
    #[arg(long, env = "DOCSHUTTLE_API_URL")]
    api_url: Option<String>,

    /// Secret key for the remote conversion API.
    #[arg(long, env = "CONVERTAPI_SECRET", hide_env_values = true)]
    api_key: Option<String>,

    /// HTTP download timeout for URL inputs, in seconds.
    #[arg(long, env = "DOCSHUTTLE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-call remote API timeout in seconds.
    #[arg(long, env = "DOCSHUTTLE_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Retries on transient remote API failures.
    #[arg(long, env = "DOCSHUTTLE_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Output a structured JSON summary instead of the human-readable one.
    #[arg(long, env = "DOCSHUTTLE_JSON")]
    json: bool,

    /// Print input structure only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCSHUTTLE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCSHUTTLE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // summary line provides the feedback that matters.
    let show_spinner = !cli.quiet && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_spinner {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let report = inspect(&cli.input).await.context("Failed to inspect input")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise report")?
            );
        } else {
            println!("File:    {}", cli.input);
            println!("Format:  {}", report.format);
            println!("Size:    {} bytes", report.size_bytes);
            match report.detail {
                InspectDetail::Spreadsheet { sheets } => {
                    println!("Sheets:  {}", sheets.len());
                    for s in sheets {
                        println!("  {}  {} rows × {} columns", s.name, s.rows, s.columns);
                    }
                }
                InspectDetail::Delimited { records, fields } => {
                    println!("Records: {}", records);
                    println!("Fields:  {}", fields);
                }
                InspectDetail::Pdf { pages, encrypted } => {
                    println!("Pages:     {}", pages);
                    println!("Encrypted: {}", encrypted);
                }
                InspectDetail::Document => {}
            }
        }
        return Ok(());
    }

    // ── Build direction and config ───────────────────────────────────────
    let direction = resolve_direction(&cli)?;
    let config = build_config(&cli)?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(direction.output_filename(&basename(&cli.input))));

    // ── Run conversion ───────────────────────────────────────────────────
    let spinner = if show_spinner {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!(
            "Converting {} → {}…",
            direction.source(),
            direction.target()
        ));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let result = convert_to_file(&cli.input, &output_path, direction, &config).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let output = match result {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{} {}", red("✗"), e);
            std::process::exit(1);
        }
    };

    // ── Result delivery ──────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        println!(
            "{} {}  {}  {}",
            green("✔"),
            bold(&output_path.display().to_string()),
            dim(&format!(
                "{} → {} bytes",
                output.stats.input_bytes, output.stats.output_bytes
            )),
            dim(&format!("{}ms", output.stats.duration_ms)),
        );
        if let Some(preview) = &output.preview {
            print!("{}", preview.render());
        }
    }

    Ok(())
}

/// Work out the direction from `--direction`, or `--to` plus the input
/// extension.
fn resolve_direction(cli: &Cli) -> Result<Direction> {
    if let Some(ref raw) = cli.direction {
        return Direction::from_str(raw).with_context(|| format!("Invalid --direction '{raw}'"));
    }

    let Some(ref target_str) = cli.to else {
        bail!("Specify a target with --to <csv|xlsx|pdf|docx> or --direction <src-dst>");
    };
    let target = Format::from_extension(&target_str.to_lowercase())
        .with_context(|| format!("Unknown target format '{target_str}'"))?;

    let name = basename(&cli.input);
    let source = name
        .rsplit_once('.')
        .and_then(|(_, ext)| Format::from_extension(&ext.to_lowercase()))
        .with_context(|| {
            format!("Cannot infer the source format of '{name}'; use --direction instead")
        })?;

    Ok(Direction::from_formats(source, target)?)
}

/// Map CLI args to `ConvertConfig`.
fn build_config(cli: &Cli) -> Result<ConvertConfig> {
    let delimiter = parse_delimiter(&cli.delimiter)?;

    let mut builder = ConvertConfig::builder()
        .delimiter(delimiter)
        .preview_rows(if cli.no_preview { 0 } else { cli.preview_rows })
        .infer_numbers(!cli.no_infer_numbers)
        .api_timeout_secs(cli.api_timeout)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref sheet) = cli.sheet {
        builder = builder.sheet(parse_sheet(sheet));
    }
    if let Some(ref url) = cli.api_url {
        builder = builder.api_base_url(url.clone());
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_secret(key.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--delimiter`: a single character, or "tab".
fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => bail!("Delimiter must be a single ASCII character or 'tab', got '{other}'"),
            }
        }
    }
}

/// Parse `--sheet`: digits mean a 0-based index, anything else a name.
fn parse_sheet(s: &str) -> SheetSelector {
    match s.parse::<usize>() {
        Ok(i) => SheetSelector::Index(i),
        Err(_) => SheetSelector::Name(s.to_string()),
    }
}

/// Basename of a path or URL.
fn basename(input: &str) -> String {
    let no_query = input.split(['?', '#']).next().unwrap_or(input);
    no_query
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(no_query)
        .to_string()
}
