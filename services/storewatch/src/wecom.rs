//! WeCom group-robot webhook channel

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::io::HttpClient;
use crate::notifier::{Notification, Notifier};

/// WeCom reports failures with HTTP 200 and a non-zero errcode in the body
#[derive(Debug, Deserialize)]
struct WeComResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// WeCom group webhook sender
pub struct WeComNotifier {
    webhook_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for WeComNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The webhook URL embeds the credential, keep it out of debug output
        f.debug_struct("WeComNotifier").finish()
    }
}

impl WeComNotifier {
    pub fn new(webhook_url: String, http: Arc<dyn HttpClient>) -> Self {
        Self { webhook_url, http }
    }
}

#[async_trait]
impl Notifier for WeComNotifier {
    fn type_name(&self) -> &str {
        "wecom"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        let payload = serde_json::json!({
            "msgtype": "text",
            "text": { "content": notification.message },
        });

        tracing::debug!(
            "Sending WeCom notification ({} chars)",
            notification.message.len()
        );

        let response = self
            .http
            .post_json(&self.webhook_url, &payload)
            .await
            .map_err(|e| crate::StorewatchError::Notifier(format!("WeCom send failed: {}", e)))?;

        if response.status != 200 {
            return Err(crate::StorewatchError::Notifier(format!(
                "WeCom webhook returned status {}: {}",
                response.status, response.body
            )));
        }

        let parsed: WeComResponse = serde_json::from_str(&response.body).unwrap_or(WeComResponse {
            errcode: 0,
            errmsg: String::new(),
        });
        if parsed.errcode != 0 {
            return Err(crate::StorewatchError::Notifier(format!(
                "WeCom webhook returned error {}: {}",
                parsed.errcode, parsed.errmsg
            )));
        }

        tracing::debug!("WeCom notification sent successfully");
        Ok(())
    }
}
