//! ServerChan personal push channel

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::io::HttpClient;
use crate::notifier::{Notification, Notifier};

const SERVERCHAN_API_BASE: &str = "https://sctapi.ftqq.com";

#[derive(Debug, Deserialize)]
struct ServerChanResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// ServerChan push sender, keyed by a send-key instead of a webhook URL
pub struct ServerChanNotifier {
    send_key: String,
    default_title: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for ServerChanNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerChanNotifier")
            .field("default_title", &self.default_title)
            .finish()
    }
}

impl ServerChanNotifier {
    pub fn new(send_key: String, default_title: String, http: Arc<dyn HttpClient>) -> Self {
        Self {
            send_key,
            default_title,
            http,
        }
    }
}

/// ServerChan renders `desp` as Markdown, where a single newline collapses
/// into a space. Suffix non-empty lines with two spaces to keep one message
/// line per rendered line.
fn markdown_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}  ", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Notifier for ServerChanNotifier {
    fn type_name(&self) -> &str {
        "serverchan"
    }

    async fn notify(&self, notification: &Notification) -> crate::Result<()> {
        let title = if notification.title.is_empty() {
            &self.default_title
        } else {
            &notification.title
        };
        let url = format!("{}/{}.send", SERVERCHAN_API_BASE, self.send_key);
        let desp = markdown_line_breaks(&notification.message);
        let params = vec![("title", title.as_str()), ("desp", desp.as_str())];

        tracing::debug!("Sending ServerChan notification: title='{}'", title);

        let response = self
            .http
            .post_form(&url, &params)
            .await
            .map_err(|e| {
                crate::StorewatchError::Notifier(format!("ServerChan send failed: {}", e))
            })?;

        if response.status != 200 {
            return Err(crate::StorewatchError::Notifier(format!(
                "ServerChan returned status {}: {}",
                response.status, response.body
            )));
        }

        let parsed: ServerChanResponse =
            serde_json::from_str(&response.body).unwrap_or(ServerChanResponse {
                code: 0,
                message: String::new(),
            });
        if parsed.code != 0 {
            return Err(crate::StorewatchError::Notifier(format!(
                "ServerChan returned error {}: {}",
                parsed.code, parsed.message
            )));
        }

        tracing::debug!("ServerChan notification sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{HttpResponse, MockHttpClient};

    fn test_notification() -> Notification {
        Notification {
            title: String::new(),
            message: "Listing unavailable: Acme Notes\n- Reason: HTTP 410".to_string(),
        }
    }

    fn notifier(mock: MockHttpClient) -> ServerChanNotifier {
        ServerChanNotifier::new(
            "SCT123KEY".to_string(),
            "Storefront listing alert".to_string(),
            Arc::new(mock),
        )
    }

    fn ok_response() -> HttpResponse {
        HttpResponse {
            status: 200,
            body: r#"{"code":0,"message":""}"#.to_string(),
        }
    }

    #[test]
    fn markdown_line_breaks_suffixes_non_empty_lines() {
        let text = "line one\n\nline two\r\nline three";
        assert_eq!(
            markdown_line_breaks(text),
            "line one  \n\nline two  \nline three  "
        );
    }

    #[tokio::test]
    async fn sends_form_to_sendkey_url() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form()
            .withf(|url, params| {
                url == "https://sctapi.ftqq.com/SCT123KEY.send"
                    && params.contains(&("title", "Storefront listing alert"))
                    && params
                        .iter()
                        .any(|(k, v)| *k == "desp" && v.starts_with("Listing unavailable"))
            })
            .returning(|_, _| Box::pin(async { Ok(ok_response()) }));

        notifier(mock).notify(&test_notification()).await.unwrap();
    }

    #[tokio::test]
    async fn uses_notification_title_when_present() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form()
            .withf(|_, params| params.contains(&("title", "Custom title")))
            .returning(|_, _| Box::pin(async { Ok(ok_response()) }));

        let notification = Notification {
            title: "Custom title".to_string(),
            message: "msg".to_string(),
        };
        notifier(mock).notify(&notification).await.unwrap();
    }

    #[tokio::test]
    async fn desp_carries_markdown_line_breaks() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form()
            .withf(|_, params| {
                params.iter().any(|(k, v)| {
                    *k == "desp" && *v == "Listing unavailable: Acme Notes  \n- Reason: HTTP 410  "
                })
            })
            .returning(|_, _| Box::pin(async { Ok(ok_response()) }));

        notifier(mock).notify(&test_notification()).await.unwrap();
    }

    #[tokio::test]
    async fn returns_error_on_non_200() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form().returning(|_, _| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 404,
                    body: "not found".to_string(),
                })
            })
        });

        let err = notifier(mock)
            .notify(&test_notification())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn returns_error_on_error_body() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form().returning(|_, _| {
            Box::pin(async {
                Ok(HttpResponse {
                    status: 200,
                    body: r#"{"code":40001,"message":"bad sendkey"}"#.to_string(),
                })
            })
        });

        let err = notifier(mock)
            .notify(&test_notification())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("40001"));
        assert!(err.to_string().contains("bad sendkey"));
    }

    #[tokio::test]
    async fn returns_error_on_transport_failure() {
        let mut mock = MockHttpClient::new();
        mock.expect_post_form().returning(|_, _| {
            Box::pin(async { Err(crate::StorewatchError::Http("connection reset".to_string())) })
        });

        let err = notifier(mock)
            .notify(&test_notification())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn type_name_is_serverchan() {
        let notifier = notifier(MockHttpClient::new());
        assert_eq!(notifier.type_name(), "serverchan");
    }
}
