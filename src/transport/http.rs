//! Real transport: POSTs rendered messages to the backend email endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::notification::Message;

use super::{Delivery, RealTransport, TransportError};

/// Logical path of the backend email endpoint
pub const SEND_EMAIL_PATH: &str = "/api/notifications/send-email";

/// Wire body expected by the backend
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cc: Option<&'a str>,
    subject: &'a str,
    html: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

/// HTTP client for the backend email endpoint
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport targeting `{base_url}/api/notifications/send-email`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), SEND_EMAIL_PATH),
            timeout,
        })
    }

    fn map_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl RealTransport for HttpTransport {
    #[tracing::instrument(
        name = "transport.http.send",
        skip(self, message),
        fields(recipient = %message.recipient(), kind = %message.kind())
    )]
    async fn send(&self, message: &Message) -> Result<Delivery, TransportError> {
        let request = SendEmailRequest {
            to: message.recipient(),
            cc: message.carbon_copy(),
            subject: message.subject(),
            html: message.body(),
            kind: message.kind().as_str(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = %status,
                body = %text,
                "Backend rejected notification"
            );
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::InvalidBody(e.to_string())
            }
        })?;

        let message_id = body
            .get("messageId")
            .or_else(|| body.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        tracing::debug!(message_id = %message_id, "Backend accepted notification");

        Ok(Delivery { message_id })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> Message {
        Message::new(
            NotificationKind::Absence,
            "d@x.com",
            Some("a@x.com".to_string()),
            "Absence Detected - Luis",
            "<p>body</p>",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_posts_wire_body_and_reads_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_EMAIL_PATH))
            .and(body_json(json!({
                "to": "d@x.com",
                "cc": "a@x.com",
                "subject": "Absence Detected - Luis",
                "html": "<p>body</p>",
                "type": "absence"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageId": "srv-1"})))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let delivery = transport.send(&message()).await.unwrap();

        assert_eq!(delivery.message_id, "srv-1");
    }

    #[tokio::test]
    async fn test_omits_cc_when_absent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_EMAIL_PATH))
            .and(body_json(json!({
                "to": "t@x.com",
                "subject": "Test Notification",
                "html": "b",
                "type": "test"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap();
        let message = Message::new(NotificationKind::Test, "t@x.com", None, "Test Notification", "b").unwrap();

        let delivery = transport.send(&message).await.unwrap();
        assert!(!delivery.message_id.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_EMAIL_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let result = transport.send(&message()).await;

        assert_eq!(result, Err(TransportError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn test_success_without_json_is_invalid_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_EMAIL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("sent"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let result = transport.send(&message()).await;

        assert!(matches!(result, Err(TransportError::InvalidBody(_))));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_EMAIL_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&server.uri(), Duration::from_millis(200)).unwrap();
        let result = transport.send(&message()).await;

        assert!(matches!(result, Err(TransportError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) on localhost is almost never listening
        let transport = HttpTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let result = transport.send(&message()).await;

        assert!(matches!(
            result,
            Err(TransportError::Network(_)) | Err(TransportError::Timeout(_))
        ));
    }

    #[test]
    fn test_endpoint_joins_path() {
        let transport = HttpTransport::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            transport.endpoint(),
            "http://localhost:8080/api/notifications/send-email"
        );
    }
}
