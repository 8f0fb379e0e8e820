//! URL reachability validator
//!
//! The one asynchronous, network-bound component, fully independent of the
//! synchronous pipeline: it takes the `{url, file, line, label}` records
//! extracted during compilation and probes each outbound link.
//!
//! Probe discipline: a lightweight HEAD first; if the server rejects the
//! method, retry with a full GET before concluding brokenness. "Too many
//! requests" counts as reachable — the link exists, the server is just
//! throttling us. Timeouts, connect errors, and other non-success statuses
//! become `warning`s naming the URL, file, and line.
//!
//! Probes run concurrently with bounded fan-out, each under its own
//! timeout; one URL's failure never cancels the others, and a cancellation
//! signal aborts in-flight checks while keeping warnings collected so far.

use crate::compile::config::LinkcheckConfig;
use crate::compile::diagnostics::ContentError;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, warn};

/// One outbound link occurrence in authored content.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlRecord {
    pub url: String,
    pub file: String,
    pub line: usize,
    /// The enclosing section's title or keyword, for the warning text.
    pub label: String,
}

/// A status counts as reachable if the resource exists, even when the
/// server refuses to serve it right now.
fn status_is_reachable(status: StatusCode) -> bool {
    status.is_success() || status.is_redirection() || status == StatusCode::TOO_MANY_REQUESTS
}

/// HEAD rejections that warrant a full GET before judging the URL broken.
fn needs_get_fallback(status: StatusCode) -> bool {
    status == StatusCode::METHOD_NOT_ALLOWED || status == StatusCode::NOT_IMPLEMENTED
}

/// Check every record, returning reachability warnings in record order.
/// Flipping `cancel` to `true` aborts in-flight probes; warnings collected
/// before that point are still returned.
pub async fn check_urls(
    records: Vec<UrlRecord>,
    config: &LinkcheckConfig,
    cancel: watch::Receiver<bool>,
) -> Vec<ContentError> {
    let client = match Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
    {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "could not build HTTP client; skipping URL checks");
            return Vec::new();
        }
    };

    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let mut handles = Vec::with_capacity(records.len());

    for record in records {
        let client = client.clone();
        let semaphore = semaphore.clone();
        let mut cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return None,
            };
            if *cancel.borrow() {
                return None;
            }
            tokio::select! {
                outcome = probe(&client, &record) => outcome,
                _ = cancel.changed() => None,
            }
        }));
    }

    let mut warnings = Vec::new();
    for handle in handles {
        if let Ok(Some(warning)) = handle.await {
            warnings.push(warning);
        }
    }
    warnings
}

/// Probe one URL. Returns a warning when it appears unreachable.
async fn probe(client: &Client, record: &UrlRecord) -> Option<ContentError> {
    let verdict = match client.head(&record.url).send().await {
        Ok(response) if status_is_reachable(response.status()) => Ok(()),
        Ok(response) if needs_get_fallback(response.status()) => {
            match client.get(&record.url).send().await {
                Ok(response) if status_is_reachable(response.status()) => Ok(()),
                Ok(response) => Err(format!("HTTP {}", response.status().as_u16())),
                Err(err) => Err(request_failure(&err)),
            }
        }
        Ok(response) => Err(format!("HTTP {}", response.status().as_u16())),
        Err(err) => Err(request_failure(&err)),
    };

    match verdict {
        Ok(()) => {
            debug!(url = %record.url, "URL reachable");
            None
        }
        Err(reason) => Some(
            ContentError::warning(
                &record.file,
                format!(
                    "URL `{}` in `{}` appears unreachable: {}",
                    record.url, record.label, reason
                ),
            )
            .at_line(record.line),
        ),
    }
}

fn request_failure(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        format!("request failed: {}", err)
    }
}
