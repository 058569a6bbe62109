//! HTTP probe and health classification for listing pages

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Endpoint, ProbeConfig};
use crate::io::HttpClient;

/// Why a probe produced its verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeReason {
    Ok,
    HttpNotFound,
    HttpGone,
    HttpOtherStatus,
    NetworkError,
    Timeout,
}

impl fmt::Display for ProbeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProbeReason::Ok => "ok",
            ProbeReason::HttpNotFound => "http_not_found",
            ProbeReason::HttpGone => "http_gone",
            ProbeReason::HttpOtherStatus => "http_other_status",
            ProbeReason::NetworkError => "network_error",
            ProbeReason::Timeout => "timeout",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one probe attempt sequence for an endpoint.
///
/// Created fresh each run; never mutated after creation.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub endpoint_key: String,
    pub healthy: bool,
    pub reason: ProbeReason,
    pub http_status: Option<u16>,
    pub observed_at: DateTime<Utc>,
}

/// Classify an HTTP status into a health verdict.
///
/// 404 and 410 are kept distinct from other failing statuses: they imply
/// permanent delisting rather than a transient fault.
fn classify(status: u16) -> (bool, ProbeReason) {
    match status {
        200 => (true, ProbeReason::Ok),
        404 => (false, ProbeReason::HttpNotFound),
        410 => (false, ProbeReason::HttpGone),
        _ => (false, ProbeReason::HttpOtherStatus),
    }
}

/// Bounded-retry prober over the shared HTTP client.
///
/// The per-attempt timeout is enforced by the client itself (see
/// [`crate::io::ReqwestHttpClient::new`]).
pub struct Prober {
    http: Arc<dyn HttpClient>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Prober {
    pub fn new(http: Arc<dyn HttpClient>, probe: &ProbeConfig) -> Self {
        Self {
            http,
            max_retries: probe.max_retries,
            retry_backoff: Duration::from_secs(probe.retry_backoff_seconds),
        }
    }

    /// Probe an endpoint, always yielding a verdict.
    ///
    /// A received HTTP status is definitive and ends the attempt sequence,
    /// even when it is a failing one; only attempts that produce no status at
    /// all (timeout, network fault) are retried. Total failure after
    /// exhausting retries becomes an unhealthy verdict carrying the final
    /// attempt's fault.
    pub async fn probe(&self, endpoint: &Endpoint) -> Verdict {
        let mut fault = ProbeReason::NetworkError;

        for attempt in 0..=self.max_retries {
            if attempt > 0 && !self.retry_backoff.is_zero() {
                tokio::time::sleep(self.retry_backoff * attempt).await;
            }

            match self.http.get(&endpoint.url).await {
                Ok(response) => {
                    let (healthy, reason) = classify(response.status);
                    tracing::debug!(
                        "Probe '{}' attempt {}: HTTP {} -> {}",
                        endpoint.name,
                        attempt + 1,
                        response.status,
                        reason
                    );
                    return Verdict {
                        endpoint_key: endpoint.key.clone(),
                        healthy,
                        reason,
                        http_status: Some(response.status),
                        observed_at: Utc::now(),
                    };
                }
                Err(crate::StorewatchError::Timeout(e)) => {
                    tracing::debug!(
                        "Probe '{}' attempt {} timed out: {}",
                        endpoint.name,
                        attempt + 1,
                        e
                    );
                    fault = ProbeReason::Timeout;
                }
                Err(e) => {
                    tracing::debug!(
                        "Probe '{}' attempt {} failed: {}",
                        endpoint.name,
                        attempt + 1,
                        e
                    );
                    fault = ProbeReason::NetworkError;
                }
            }
        }

        Verdict {
            endpoint_key: endpoint.key.clone(),
            healthy: false,
            reason: fault,
            http_status: None,
            observed_at: Utc::now(),
        }
    }
}
