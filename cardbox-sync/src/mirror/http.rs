//! HTTP mirror with retry, exponential backoff, timeout, and gzip.
//!
//! Pushes projections to `{base_url}/cards/{id}` and `{base_url}/tags/{id}`.
//! Server-side and transport failures are retried with doubling backoff;
//! client errors (4xx) mean the payload itself was refused and fail fast.

use std::time::Duration;

use cardbox_core::errors::SyncError;
use cardbox_core::traits::{MirrorPayload, RemoteMirror};

/// Configuration for the HTTP transport layer.
#[derive(Debug, Clone)]
pub struct HttpMirrorConfig {
    /// Base URL of the mirror API, without a trailing slash.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum number of retry attempts per push.
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry).
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl Default for HttpMirrorConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(10),
        }
    }
}

fn net_err(reason: String) -> SyncError {
    SyncError::Unavailable { reason }
}

/// A mirror that pushes projections over HTTP.
#[derive(Debug)]
pub struct HttpMirror {
    config: HttpMirrorConfig,
    client: reqwest::blocking::Client,
}

impl HttpMirror {
    /// Build the mirror and its underlying client.
    pub fn new(config: HttpMirrorConfig) -> Result<Self, SyncError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|e| net_err(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Convenience constructor from just a base URL.
    pub fn for_url(base_url: &str) -> Result<Self, SyncError> {
        Self::new(HttpMirrorConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..HttpMirrorConfig::default()
        })
    }

    /// Unified retry loop for any HTTP method.
    fn do_request(
        &self,
        method: reqwest::Method,
        url: &str,
        entity_id: &str,
        body: Option<&MirrorPayload>,
    ) -> Result<(), SyncError> {
        let mut backoff = self.config.initial_backoff;
        let mut last_err = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    "mirror: retry attempt {}/{} after {:?}",
                    attempt,
                    self.config.max_retries,
                    backoff
                );
                std::thread::sleep(backoff);
                backoff = (backoff * 2).min(self.config.max_backoff);
            }

            let mut req = self.client.request(method.clone(), url);
            if let Some(payload) = body {
                req = req.json(payload);
            }

            match req.send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(());
                    }
                    if status.is_client_error() {
                        let body_text = resp.text().unwrap_or_default();
                        return Err(SyncError::Rejected {
                            entity_id: entity_id.to_string(),
                            reason: format!("HTTP {status}: {body_text}"),
                        });
                    }
                    last_err = format!("HTTP {status}");
                }
                Err(e) => {
                    last_err = e.to_string();
                }
            }
        }

        Err(net_err(format!(
            "all {} retries exhausted: {last_err}",
            self.config.max_retries
        )))
    }
}

impl RemoteMirror for HttpMirror {
    /// Reachability is discovered by pushing; probing here would add a
    /// network round trip to every sweep.
    fn can_sync(&self) -> bool {
        true
    }

    fn upsert_card(&self, payload: &MirrorPayload) -> Result<(), SyncError> {
        let url = format!("{}/cards/{}", self.config.base_url, payload.entity_id);
        self.do_request(reqwest::Method::PUT, &url, &payload.entity_id, Some(payload))
    }

    fn upsert_tag(&self, payload: &MirrorPayload) -> Result<(), SyncError> {
        let url = format!("{}/tags/{}", self.config.base_url, payload.entity_id);
        self.do_request(reqwest::Method::PUT, &url, &payload.entity_id, Some(payload))
    }

    fn delete_card(&self, entity_id: &str) -> Result<(), SyncError> {
        let url = format!("{}/cards/{entity_id}", self.config.base_url);
        self.do_request(reqwest::Method::DELETE, &url, entity_id, None)
    }
}
