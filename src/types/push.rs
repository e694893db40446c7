use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

pub const DEFAULT_ICON: &str = "/icon-192x192.png";
pub const DEFAULT_BADGE: &str = "/badge-72x72.png";

#[derive(Debug, Clone)]
pub struct VapidConfig {
    pub private_key: String,
    pub public_key: String,
    pub subject: String,
}

/// Browser `PushSubscription.toJSON()` shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
    #[serde(default)]
    pub keys: SubscriptionKeys,
}

impl PushSubscription {
    pub fn new(endpoint: impl Into<String>, p256dh: impl Into<String>, auth: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            expiration_time: None,
            keys: SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    #[serde(default)]
    pub p256dh: String,
    #[serde(default)]
    pub auth: String,
}

/// Body of `POST /subscribe`, sent by the client manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    #[serde(default)]
    pub subscription: PushSubscription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Body of `POST /unsubscribe`. Only the endpoint is read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoveSubscription {
    #[serde(default)]
    pub subscription: PushSubscription,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub subscription: PushSubscription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    pub subscription_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SubscriptionRecord {
    pub fn endpoint(&self) -> &str {
        &self.subscription.endpoint
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Body of `POST /send`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<NotificationAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_endpoint: Option<String>,
}

impl NotificationRequest {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn to_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.target_endpoint = Some(endpoint.into());
        self
    }
}

/// The JSON document delivered to the service worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub data: JsonValue,
    pub actions: Vec<NotificationAction>,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub endpoint: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReport {
    pub success: bool,
    pub results: Vec<DeliveryResult>,
    pub sent: usize,
    pub failed: usize,
}

impl SendReport {
    pub(crate) fn from_results(results: Vec<DeliveryResult>) -> Self {
        let sent = results.iter().filter(|result| result.success).count();
        let failed = results.len() - sent;
        Self {
            success: true,
            results,
            sent,
            failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DeliveryError {
    pub status: Option<u16>,
    pub message: String,
}

impl DeliveryError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 404 and 410 mean the push service has dropped the subscription.
    pub fn is_gone(&self) -> bool {
        matches!(self.status, Some(404) | Some(410))
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;

    #[test]
    fn new_subscription__should_parse_browser_json() {
        // Given
        let raw = r#"{
            "subscription": {
                "endpoint": "https://push.example/a",
                "expirationTime": null,
                "keys": { "p256dh": "p256", "auth": "auth" }
            },
            "userAgent": "Firefox",
            "timestamp": 1736674200000
        }"#;

        // When
        let request: NewSubscription = serde_json::from_str(raw).expect("parse request");

        // Then
        assert_eq!(request.subscription.endpoint, "https://push.example/a");
        assert_eq!(request.subscription.keys.auth, "auth");
        assert_eq!(request.user_agent.as_deref(), Some("Firefox"));
        assert_eq!(request.timestamp, Some(1736674200000));
    }

    #[test]
    fn new_subscription__should_default_missing_subscription_to_empty_endpoint() {
        // When
        let request: NewSubscription = serde_json::from_str("{}").expect("parse request");

        // Then
        assert!(request.subscription.endpoint.is_empty());
    }

    #[test]
    fn notification_request__should_read_camel_case_target() {
        // When
        let request: NotificationRequest =
            serde_json::from_str(r#"{"title":"T","body":"B","targetEndpoint":"https://push.example/a"}"#)
                .expect("parse request");

        // Then
        assert_eq!(request.title, "T");
        assert_eq!(
            request.target_endpoint.as_deref(),
            Some("https://push.example/a")
        );
    }

    #[test]
    fn delivery_error__should_treat_404_and_410_as_gone() {
        assert!(DeliveryError::new(Some(410), "gone").is_gone());
        assert!(DeliveryError::new(Some(404), "not found").is_gone());
        assert!(!DeliveryError::new(Some(500), "server").is_gone());
        assert!(!DeliveryError::new(None, "io").is_gone());
    }

    #[test]
    fn send_report__should_count_partial_failures_and_stay_successful() {
        // Given
        let results = vec![
            DeliveryResult {
                endpoint: "a".to_string(),
                success: true,
                error: None,
            },
            DeliveryResult {
                endpoint: "b".to_string(),
                success: false,
                error: Some("gone".to_string()),
            },
        ];

        // When
        let report = SendReport::from_results(results);

        // Then
        assert!(report.success);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
    }
}
