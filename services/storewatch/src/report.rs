//! Rendering of alert messages

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::Endpoint;
use crate::probe::{ProbeReason, Verdict};

/// Human-readable reason line for a verdict, with operator hints for the
/// statuses that tend to mean something specific on storefront CDNs.
pub fn describe_reason(verdict: &Verdict) -> String {
    match (verdict.reason, verdict.http_status) {
        (ProbeReason::Ok, _) => "page reachable".to_string(),
        (ProbeReason::HttpNotFound, _) => {
            "HTTP 404 (strong signal: listing delisted or unavailable in this region)".to_string()
        }
        (ProbeReason::HttpGone, _) => "HTTP 410 (strong signal: listing removed)".to_string(),
        (ProbeReason::HttpOtherStatus, Some(403)) => {
            "HTTP 403 (possibly rate-limited, challenged, or region-blocked)".to_string()
        }
        (ProbeReason::HttpOtherStatus, Some(429)) => {
            "HTTP 429 (too many requests: throttled)".to_string()
        }
        (ProbeReason::HttpOtherStatus, Some(status @ 500..=599)) => {
            format!("HTTP {} (storefront server error, possibly transient)", status)
        }
        (ProbeReason::HttpOtherStatus, Some(status @ 400..=499)) => {
            format!("HTTP {} (client error: page unavailable)", status)
        }
        (ProbeReason::HttpOtherStatus, Some(status)) => {
            format!("HTTP {} (page not reachable)", status)
        }
        (ProbeReason::HttpOtherStatus, None) => "unexpected HTTP status".to_string(),
        (ProbeReason::NetworkError, _) => "network error (DNS or connection failure)".to_string(),
        (ProbeReason::Timeout, _) => "request timed out".to_string(),
    }
}

/// Elapsed time since the listing went live, truncated to whole hours
pub fn listed_duration(listed_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - listed_at).num_seconds().max(0) as u64;
    let whole_hours = seconds - seconds % 3600;
    if whole_hours == 0 {
        return "under 1h".to_string();
    }
    humantime::format_duration(Duration::from_secs(whole_hours)).to_string()
}

/// The message body for one unhealthy endpoint
pub fn alert_message(endpoint: &Endpoint, verdict: &Verdict, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        format!("Listing unavailable: {}", endpoint.name),
        format!("- URL: {}", endpoint.url),
    ];
    if let Some(listed_at) = endpoint.listed_at {
        lines.push(format!(
            "- Listed since: {} (live for {})",
            listed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            listed_duration(listed_at, now)
        ));
    }
    lines.push(format!("- Reason: {}", describe_reason(verdict)));
    lines.join("\n")
}
