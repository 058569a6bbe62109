//! Notifier trait and channel selection

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::NotifierConfig;
use crate::io::HttpClient;
use crate::serverchan::ServerChanNotifier;
use crate::wecom::WeComNotifier;

/// A notification to be sent
#[derive(Debug, Clone)]
pub struct Notification {
    /// Channel-level title; an empty title lets the channel apply its default
    pub title: String,
    pub message: String,
}

/// Trait for sending notifications
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Get the notifier type name (e.g. "wecom")
    fn type_name(&self) -> &str;

    /// Send a notification; Ok means the channel accepted it
    async fn notify(&self, notification: &Notification) -> crate::Result<()>;
}

/// Build the channel selected by configuration.
///
/// An unset selection or a missing credential is a configuration error: a run
/// that cannot alert at all must fail loudly before any probing happens.
pub fn build_notifier(
    config: Option<&NotifierConfig>,
    http: Arc<dyn HttpClient>,
) -> crate::Result<Arc<dyn Notifier>> {
    let config = config.ok_or_else(|| {
        crate::StorewatchError::Config(
            "No notification channel configured: set `notifier` to a wecom or serverchan entry"
                .to_string(),
        )
    })?;

    match config {
        NotifierConfig::WeCom { webhook_url } => {
            if webhook_url.is_empty() {
                return Err(crate::StorewatchError::Config(
                    "wecom channel selected but webhook_url is empty \
                     (set it in the config or via WECOM_WEBHOOK_URL)"
                        .to_string(),
                ));
            }
            Ok(Arc::new(WeComNotifier::new(webhook_url.clone(), http)))
        }
        NotifierConfig::ServerChan { send_key, title } => {
            if send_key.is_empty() {
                return Err(crate::StorewatchError::Config(
                    "serverchan channel selected but send_key is empty \
                     (set it in the config or via SERVERCHAN_SENDKEY)"
                        .to_string(),
                ));
            }
            Ok(Arc::new(ServerChanNotifier::new(
                send_key.clone(),
                title.clone(),
                http,
            )))
        }
    }
}
