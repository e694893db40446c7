//! Host capabilities the client manager drives: permission prompts,
//! service-worker registration, push subscriptions and local notifications.
//!
//! In a browser build these map onto `Notification`, `navigator.serviceWorker`
//! and `PushManager`; tests supply in-memory fakes.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::PlatformError;
use crate::types::push::PushSubscription;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Default,
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformCapabilities {
    pub service_worker: bool,
    pub push_manager: bool,
    pub notification: bool,
}

impl PlatformCapabilities {
    pub fn all() -> Self {
        Self {
            service_worker: true,
            push_manager: true,
            notification: true,
        }
    }

    pub fn supports_push(&self) -> bool {
        self.service_worker && self.push_manager && self.notification
    }
}

/// Handle for a registered service worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub script_path: String,
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub user_visible_only: bool,
    pub application_server_key: Vec<u8>,
}

/// Options for a locally displayed notification. Unset fields fall back to
/// the caller's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

pub trait PushPlatform: Send + Sync {
    fn capabilities(&self) -> PlatformCapabilities;

    /// Current permission state, without prompting.
    fn permission(&self) -> Permission;

    fn user_agent(&self) -> String;

    fn request_permission(&self) -> impl Future<Output = Result<Permission, PlatformError>> + Send;

    fn register_service_worker(
        &self,
        script_path: &str,
    ) -> impl Future<Output = Result<Registration, PlatformError>> + Send;

    fn subscribe(
        &self,
        registration: &Registration,
        options: SubscribeOptions,
    ) -> impl Future<Output = Result<PushSubscription, PlatformError>> + Send;

    fn get_subscription(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<Option<PushSubscription>, PlatformError>> + Send;

    fn unsubscribe(
        &self,
        subscription: &PushSubscription,
    ) -> impl Future<Output = Result<bool, PlatformError>> + Send;

    fn show_notification(
        &self,
        title: &str,
        options: &NotificationOptions,
    ) -> Result<(), PlatformError>;
}
