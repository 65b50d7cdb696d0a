//! Registry statistics downloader
//!
//! Each URL is tried with exponential backoff. When the canonical `latest`
//! file stays unavailable, dated snapshots (tomorrow, today, yesterday) are
//! tried in turn, since registries publish them under the date and sometimes
//! lag in updating the `latest` name.

use crate::clock::Clock;
use crate::config::{IngestConfig, RetryPolicy};
use crate::error::{IngestError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::LAST_MODIFIED;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Token in source URLs that the dated fallbacks replace
pub const LATEST_TOKEN: &str = "latest";

/// A downloaded statistics file
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// URL the body was actually served from
    pub url: String,

    /// `Last-Modified` reported by the server (Unix epoch when absent)
    pub last_modified: DateTime<Utc>,

    pub body: String,
}

/// HTTP client for registry statistics files
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl Fetcher {
    /// Create new fetcher with configuration
    pub fn new(config: &IngestConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("rir-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| IngestError::Http {
                url: String::new(),
                source,
            })?;

        Ok(Self {
            client,
            retry: config.retry.clone(),
            clock,
        })
    }

    /// Fetch one registry's statistics file
    ///
    /// Fails with [`IngestError::SourceUnavailable`] wrapping the canonical
    /// URL's error when the canonical URL and every fallback fail.
    pub async fn fetch(&self, url: &str) -> Result<FetchedDocument> {
        let original = match self.fetch_with_retry(url).await {
            Ok(document) => return Ok(document),
            Err(e) => e,
        };

        let fallbacks = fallback_urls(url, self.clock.today());
        if fallbacks.is_empty() {
            warn!("No dated fallback for {} (no '{}' token)", url, LATEST_TOKEN);
        } else {
            warn!("{} unavailable ({}), trying {} dated fallbacks", url, original, fallbacks.len());
        }

        for fallback in &fallbacks {
            match self.fetch_with_retry(fallback).await {
                Ok(document) => {
                    info!("Using fallback {} for {}", fallback, url);
                    return Ok(document);
                },
                Err(e) => {
                    warn!("Fallback {} failed: {}", fallback, e);
                },
            }
        }

        Err(IngestError::SourceUnavailable {
            url: url.to_string(),
            fallbacks: fallbacks.len(),
            source: Box::new(original),
        })
    }

    /// Fetch URL with retry logic
    async fn fetch_with_retry(&self, url: &str) -> Result<FetchedDocument> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            info!("Fetching {} (attempt {}/{})", url, attempt, max_attempts);

            match self.fetch_once(url).await {
                Ok(document) => return Ok(document),
                Err(e) if attempt < max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt, max_attempts, url, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(e) => {
                    warn!("Attempt {}/{} for {} failed: {}", attempt, max_attempts, url, e);
                    return Err(e);
                },
            }
        }
    }

    /// Fetch URL without retry
    async fn fetch_once(&self, url: &str) -> Result<FetchedDocument> {
        let http_error = |source| IngestError::Http {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let last_modified = match response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
        {
            Some(value) => parse_http_date(value).unwrap_or_else(|| {
                warn!("Unparsable Last-Modified '{}' from {}; treating as oldest", value, url);
                DateTime::<Utc>::UNIX_EPOCH
            }),
            None => {
                warn!("No Last-Modified from {}; treating as oldest", url);
                DateTime::<Utc>::UNIX_EPOCH
            },
        };

        let bytes = response.bytes().await.map_err(http_error)?;
        let body = String::from_utf8(bytes.to_vec()).map_err(|_| IngestError::InvalidBody {
            url: url.to_string(),
        })?;

        debug!("Fetched {} bytes from {} (last modified {})", body.len(), url, last_modified);

        Ok(FetchedDocument {
            url: url.to_string(),
            last_modified,
            body,
        })
    }
}

/// Dated fallbacks for `url`: tomorrow, today, yesterday in `YYYYMMDD` form
///
/// Only the last `latest` in the URL is replaced, so host names containing
/// the word are left alone. Returns nothing when the URL has no token.
pub fn fallback_urls(url: &str, today: NaiveDate) -> Vec<String> {
    let Some(position) = url.rfind(LATEST_TOKEN) else {
        return Vec::new();
    };

    [today.succ_opt(), Some(today), today.pred_opt()]
        .into_iter()
        .flatten()
        .map(|date| {
            format!(
                "{}{}{}",
                &url[..position],
                date.format("%Y%m%d"),
                &url[position + LATEST_TOKEN.len()..]
            )
        })
        .collect()
}

/// Parse an HTTP date header (`Wed, 21 Oct 2015 07:28:00 GMT`)
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
