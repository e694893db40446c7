use base64::{URL_SAFE_NO_PAD, decode_config};
use tracing::{debug, error, warn};

use crate::adapters::SystemTimeProvider;
use crate::config::DEFAULT_API_PREFIX;
use crate::error::ClientError;
use crate::ports::platform::{
    NotificationOptions, Permission, PushPlatform, Registration, SubscribeOptions,
};
use crate::ports::{DispatcherApi, TimeProvider};
use crate::types::push::{DEFAULT_BADGE, DEFAULT_ICON, NewSubscription, PushSubscription};

pub const DEFAULT_SW_PATH: &str = "/sw.js";
pub const DEFAULT_TEST_TITLE: &str = "Test Notification";
const DEFAULT_TEST_BODY: &str = "This is a test notification";

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Path of the notification routes, relative to the page origin.
    pub api_endpoint: String,
    pub sw_path: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_PREFIX.to_string(),
            sw_path: DEFAULT_SW_PATH.to_string(),
        }
    }
}

/// Result of [`PushNotificationManager::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsubscribeOutcome {
    /// No local subscription was held; nothing happened.
    NotSubscribed,
    /// The platform subscription was cancelled. `server_notified` is false
    /// when the dispatcher could not be told.
    Unsubscribed { server_notified: bool },
}

impl UnsubscribeOutcome {
    pub fn removed(&self) -> bool {
        matches!(self, UnsubscribeOutcome::Unsubscribed { .. })
    }
}

/// Drives the platform push lifecycle and keeps the dispatcher informed.
pub struct PushNotificationManager<P, A, T = SystemTimeProvider> {
    config: ManagerConfig,
    platform: P,
    api: A,
    time: T,
    supported: bool,
    subscription: Option<PushSubscription>,
    registration: Option<Registration>,
}

impl<P, A> PushNotificationManager<P, A, SystemTimeProvider>
where
    P: PushPlatform,
    A: DispatcherApi,
{
    pub fn new(config: ManagerConfig, platform: P, api: A) -> Self {
        Self::with_time(config, platform, api, SystemTimeProvider)
    }
}

impl<P, A, T> PushNotificationManager<P, A, T>
where
    P: PushPlatform,
    A: DispatcherApi,
    T: TimeProvider,
{
    pub fn with_time(config: ManagerConfig, platform: P, api: A, time: T) -> Self {
        let supported = platform.capabilities().supports_push();
        debug!(supported, sw_path = %config.sw_path, "push notification manager initialized");
        Self {
            config,
            platform,
            api,
            time,
            supported,
            subscription: None,
            registration: None,
        }
    }

    /// Capability check captured at construction.
    pub fn check_support(&self) -> bool {
        self.supported
    }

    pub fn permission(&self) -> Permission {
        self.platform.permission()
    }

    pub fn subscription(&self) -> Option<&PushSubscription> {
        self.subscription.as_ref()
    }

    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    pub async fn request_permission(&self) -> Result<Permission, ClientError> {
        if !self.supported {
            return Err(ClientError::UnsupportedPlatform);
        }

        let mut permission = self.platform.permission();
        if permission == Permission::Default {
            permission = self
                .platform
                .request_permission()
                .await
                .map_err(|err| ClientError::Platform(err.to_string()))?;
        }

        if permission != Permission::Granted {
            return Err(ClientError::PermissionDenied);
        }
        Ok(permission)
    }

    pub async fn register_service_worker(&mut self) -> Result<Registration, ClientError> {
        if !self.supported {
            return Err(ClientError::UnsupportedPlatform);
        }

        let registration = self
            .platform
            .register_service_worker(&self.config.sw_path)
            .await
            .map_err(|err| {
                error!("service worker registration failed: {err}");
                ClientError::Registration(err.to_string())
            })?;
        debug!(scope = %registration.scope, "service worker registered");
        self.registration = Some(registration.clone());
        Ok(registration)
    }

    pub async fn fetch_public_key(&self) -> Result<String, ClientError> {
        self.api.public_key().await.inspect_err(|err| {
            error!("failed to get VAPID public key: {err}");
        })
    }

    /// Creates a platform subscription and registers it with the dispatcher.
    ///
    /// If the dispatcher rejects the subscription the platform subscription
    /// is kept and remains available through [`Self::subscription`].
    pub async fn subscribe(&mut self) -> Result<PushSubscription, ClientError> {
        self.request_permission().await?;

        let registration = match self.registration.clone() {
            Some(registration) => registration,
            None => self.register_service_worker().await?,
        };

        let public_key = self.fetch_public_key().await?;
        let application_server_key = decode_application_server_key(&public_key)?;

        let subscription = self
            .platform
            .subscribe(
                &registration,
                SubscribeOptions {
                    user_visible_only: true,
                    application_server_key,
                },
            )
            .await
            .map_err(|err| ClientError::Platform(err.to_string()))?;
        self.subscription = Some(subscription.clone());

        let request = NewSubscription {
            subscription: subscription.clone(),
            user_agent: Some(self.platform.user_agent()),
            timestamp: Some(self.time.now_millis()),
        };
        let subscription_id = self.api.subscribe(&request).await.inspect_err(|err| {
            error!("failed to send subscription to server: {err}");
        })?;
        debug!(%subscription_id, "push subscription successful");
        Ok(subscription)
    }

    pub async fn unsubscribe(&mut self) -> Result<UnsubscribeOutcome, ClientError> {
        let Some(subscription) = self.subscription.clone() else {
            return Ok(UnsubscribeOutcome::NotSubscribed);
        };

        let cancelled = self
            .platform
            .unsubscribe(&subscription)
            .await
            .map_err(|err| ClientError::Platform(err.to_string()))?;
        if !cancelled {
            warn!(endpoint = %subscription.endpoint, "platform did not cancel push subscription");
        }

        let server_notified = match self.api.unsubscribe(&subscription).await {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to remove subscription from server: {err}");
                false
            }
        };
        self.subscription = None;
        debug!(server_notified, "push subscription removed");
        Ok(UnsubscribeOutcome::Unsubscribed { server_notified })
    }

    /// Looks up an existing platform subscription. `Ok(None)` means there is
    /// none (or no service worker has been registered yet).
    pub async fn get_subscription(&mut self) -> Result<Option<PushSubscription>, ClientError> {
        let Some(registration) = self.registration.as_ref() else {
            return Ok(None);
        };

        let subscription = self
            .platform
            .get_subscription(registration)
            .await
            .map_err(|err| ClientError::Platform(err.to_string()))?;
        self.subscription = subscription.clone();
        Ok(subscription)
    }

    /// Shows a local notification when permission is already granted;
    /// otherwise does nothing.
    pub fn show_test_notification(
        &self,
        title: Option<&str>,
        options: NotificationOptions,
    ) -> Result<(), ClientError> {
        if self.platform.permission() != Permission::Granted {
            return Ok(());
        }

        let options = NotificationOptions {
            body: options.body.or_else(|| Some(DEFAULT_TEST_BODY.to_string())),
            icon: options.icon.or_else(|| Some(DEFAULT_ICON.to_string())),
            badge: options.badge.or_else(|| Some(DEFAULT_BADGE.to_string())),
            ..options
        };
        self.platform
            .show_notification(title.unwrap_or(DEFAULT_TEST_TITLE), &options)
            .map_err(|err| ClientError::Platform(err.to_string()))
    }
}

/// Decodes a URL-safe base64 VAPID key, tolerating padding and the standard
/// alphabet.
pub fn decode_application_server_key(key: &str) -> Result<Vec<u8>, ClientError> {
    let normalized: String = key
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|ch| match ch {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    if normalized.is_empty() {
        return Err(ClientError::InvalidPublicKey);
    }
    decode_config(&normalized, URL_SAFE_NO_PAD).map_err(|_| ClientError::InvalidPublicKey)
}
