//! Configuration types for file conversion.
//!
//! All conversion behaviour is controlled through [`ConvertConfig`], built
//! via its [`ConvertConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across calls and to diff two runs to
//! understand why their outputs differ.

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which worksheet of a workbook to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetSelector {
    /// The first worksheet (default — matches what a spreadsheet
    /// application shows when the file opens).
    #[default]
    First,
    /// A worksheet by 0-based position.
    Index(usize),
    /// A worksheet by name, matched exactly.
    Name(String),
}

/// Configuration for a conversion.
///
/// Built via [`ConvertConfig::builder()`] or [`ConvertConfig::default()`].
///
/// # Example
/// ```rust
/// use docshuttle::ConvertConfig;
///
/// let config = ConvertConfig::builder()
///     .delimiter(b';')
///     .preview_rows(5)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConvertConfig {
    /// Worksheet to read when the source is a workbook. Default: first.
    pub sheet: SheetSelector,

    /// Field delimiter for reading and writing delimited text. Default: `,`.
    pub delimiter: u8,

    /// Rows shown in the tabular preview. 0 disables the preview. Default: 10.
    pub preview_rows: usize,

    /// Infer numeric cells when building a workbook from delimited text.
    /// Default: true.
    ///
    /// With inference off every field lands as a string, which round-trips
    /// byte-exactly but loses numeric formatting and sums in the spreadsheet
    /// application.
    pub infer_numbers: bool,

    /// Base URL of the remote conversion service. Default:
    /// `https://v2.convertapi.com`.
    pub api_base_url: String,

    /// Secret key for the remote conversion service. When `None`, the
    /// `CONVERTAPI_SECRET` environment variable is consulted at call time.
    pub api_secret: Option<String>,

    /// Per-request timeout for remote conversion calls, in seconds.
    /// Default: 60.
    pub api_timeout_secs: u64,

    /// Retry attempts on a transient remote failure (429/5xx/timeout).
    /// Default: 3. Client errors (4xx) are never retried.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds; doubles per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Download timeout for URL inputs, in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::First,
            delimiter: b',',
            preview_rows: 10,
            infer_numbers: true,
            api_base_url: "https://v2.convertapi.com".to_string(),
            api_secret: None,
            api_timeout_secs: 60,
            max_retries: 3,
            retry_backoff_ms: 500,
            download_timeout_secs: 120,
        }
    }
}

// Manual Debug so the API secret never lands in logs.
impl fmt::Debug for ConvertConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertConfig")
            .field("sheet", &self.sheet)
            .field("delimiter", &(self.delimiter as char))
            .field("preview_rows", &self.preview_rows)
            .field("infer_numbers", &self.infer_numbers)
            .field("api_base_url", &self.api_base_url)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl ConvertConfig {
    /// Create a new builder for `ConvertConfig`.
    pub fn builder() -> ConvertConfigBuilder {
        ConvertConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConvertConfig`].
#[derive(Debug)]
pub struct ConvertConfigBuilder {
    config: ConvertConfig,
}

impl ConvertConfigBuilder {
    pub fn sheet(mut self, selector: SheetSelector) -> Self {
        self.config.sheet = selector;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.config.preview_rows = rows;
        self
    }

    pub fn infer_numbers(mut self, v: bool) -> Self {
        self.config.infer_numbers = v;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn api_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.api_secret = Some(secret.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConvertConfig, ConvertError> {
        let c = &self.config;
        if matches!(c.delimiter, b'\n' | b'\r' | b'"') {
            return Err(ConvertError::InvalidConfig(format!(
                "delimiter {:?} conflicts with record framing",
                c.delimiter as char
            )));
        }
        if c.api_base_url.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "api_base_url must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
