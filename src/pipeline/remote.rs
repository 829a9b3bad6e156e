//! DOCX → PDF via the remote conversion API.
//!
//! The service accepts a multipart upload plus a secret key and answers
//! with JSON describing the converted file — either inline base64
//! (`FileData`) or a URL to fetch with a second GET. Both shapes are
//! handled; inline wins when present because it saves a round-trip.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 5xx from conversion services are transient and frequent
//! under load. Exponential backoff (`retry_backoff_ms * 2^attempt`)
//! avoids thundering-herd: with 500 ms base and 3 retries the wait
//! sequence is 500 ms → 1 s → 2 s, under 4 s of back-off total. Client
//! errors (4xx) are never retried — a bad secret does not get better.

use crate::config::ConvertConfig;
use crate::error::ConvertError;
use crate::format::Format;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Response envelope of the conversion service.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "Files", alias = "files")]
    files: Vec<ApiFile>,
}

/// One converted file inside [`ApiResponse`].
#[derive(Debug, Deserialize)]
struct ApiFile {
    #[serde(rename = "Url", alias = "url")]
    url: Option<String>,
    #[serde(rename = "FileData", alias = "file_data")]
    file_data: Option<String>,
}

/// Convert DOCX bytes to PDF bytes via the remote service.
pub async fn docx_to_pdf(
    bytes: &[u8],
    file_name: &str,
    config: &ConvertConfig,
) -> Result<Vec<u8>, ConvertError> {
    let secret = resolve_secret(config)?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.api_timeout_secs))
        .build()
        .map_err(|e| ConvertError::Internal(format!("HTTP client: {}", e)))?;

    let endpoint = format!(
        "{}/convert/docx/to/pdf",
        config.api_base_url.trim_end_matches('/')
    );
    info!("Posting {} bytes to {}", bytes.len(), endpoint);

    let mut last_err: Option<ConvertError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Remote conversion: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        // The multipart form is consumed per request, so rebuild it.
        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(Format::Docx.mime_type())
            .map_err(|e| ConvertError::Internal(format!("multipart: {}", e)))?;
        let form = Form::new().part("file", part);

        let sent = client
            .post(&endpoint)
            .query(&[("secret", secret.as_str())])
            .multipart(form)
            .send()
            .await;

        match sent {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return fetch_artifact(response, &client).await;
                }

                let body = body_snippet(response).await;
                let err = ConvertError::RemoteApi {
                    status: status.as_u16(),
                    body,
                };
                if status.as_u16() == 429 || status.is_server_error() {
                    warn!("Remote conversion: transient HTTP {}", status);
                    last_err = Some(err);
                } else {
                    return Err(err);
                }
            }
            Err(e) if e.is_timeout() => {
                warn!("Remote conversion: timed out");
                last_err = Some(ConvertError::ApiTimeout {
                    secs: config.api_timeout_secs,
                });
            }
            Err(e) => {
                warn!("Remote conversion: request failed: {}", e);
                last_err = Some(ConvertError::ApiRequestFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| ConvertError::Internal("retry loop exited without error".into())))
}

/// Pull the converted bytes out of a 2xx response.
async fn fetch_artifact(
    response: reqwest::Response,
    client: &reqwest::Client,
) -> Result<Vec<u8>, ConvertError> {
    let body: ApiResponse =
        response
            .json()
            .await
            .map_err(|e| ConvertError::MalformedApiResponse {
                detail: e.to_string(),
            })?;

    let file = body
        .files
        .into_iter()
        .next()
        .ok_or_else(|| ConvertError::MalformedApiResponse {
            detail: "response contains no files".to_string(),
        })?;

    if let Some(data) = file.file_data {
        debug!("Artifact delivered inline ({} base64 chars)", data.len());
        return STANDARD
            .decode(data)
            .map_err(|e| ConvertError::MalformedApiResponse {
                detail: format!("invalid base64 file data: {}", e),
            });
    }

    if let Some(url) = file.url {
        debug!("Artifact delivered by URL, fetching {}", url);
        let fetched = client
            .get(&url)
            .send()
            .await
            .map_err(|e| ConvertError::DownloadFailed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        if !fetched.status().is_success() {
            return Err(ConvertError::RemoteApi {
                status: fetched.status().as_u16(),
                body: format!("result fetch from {} failed", url),
            });
        }
        return Ok(fetched
            .bytes()
            .await
            .map_err(|e| ConvertError::DownloadFailed {
                url,
                reason: e.to_string(),
            })?
            .to_vec());
    }

    Err(ConvertError::MalformedApiResponse {
        detail: "file entry has neither Url nor FileData".to_string(),
    })
}

/// Secret from config, falling back to the environment.
fn resolve_secret(config: &ConvertConfig) -> Result<String, ConvertError> {
    if let Some(ref s) = config.api_secret {
        if !s.is_empty() {
            return Ok(s.clone());
        }
    }
    std::env::var("CONVERTAPI_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or(ConvertError::ApiKeyMissing)
}

/// First 200 chars of the response body, for error messages.
async fn body_snippet(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    let mut snippet: String = text.chars().take(200).collect();
    if snippet.len() < text.len() {
        snippet.push('…');
    }
    snippet
}
