use futures::stream::{self, StreamExt};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::adapters::{SystemTimeProvider, WebPushSender};
use crate::config::AppConfig;
use crate::error::DispatchError;
use crate::ports::{PushSender, SubscriptionStore, TimeProvider};
use crate::push::subscription_id;
use crate::push::vapid::load_vapid_config;
use crate::types::push::{
    DEFAULT_BADGE, DEFAULT_ICON, DeliveryResult, NewSubscription, NotificationPayload,
    NotificationRequest, SendReport, SubscriptionRecord, VapidConfig,
};

/// Owns the VAPID identity and the subscription store, and fans
/// notifications out to stored subscriptions.
pub struct NotificationDispatcher<S, P, T = SystemTimeProvider> {
    vapid: VapidConfig,
    store: S,
    sender: P,
    time: T,
    fanout_concurrency: usize,
}

impl<S> NotificationDispatcher<S, WebPushSender, SystemTimeProvider>
where
    S: SubscriptionStore,
{
    /// Fails with [`DispatchError::Configuration`] unless the VAPID key pair
    /// and subject are all configured.
    pub fn from_config(config: &AppConfig, store: S) -> Result<Self, DispatchError> {
        let vapid = load_vapid_config(config).into_config()?;
        let sender = WebPushSender::new(vapid.clone())
            .map_err(|err| DispatchError::Transport(err.to_string()))?;
        Ok(Self::with_parts(vapid, store, sender, SystemTimeProvider)
            .with_fanout_concurrency(config.fanout_concurrency))
    }
}

impl<S, P, T> NotificationDispatcher<S, P, T>
where
    S: SubscriptionStore,
    P: PushSender,
    T: TimeProvider,
{
    pub fn with_parts(vapid: VapidConfig, store: S, sender: P, time: T) -> Self {
        Self {
            vapid,
            store,
            sender,
            time,
            fanout_concurrency: 1,
        }
    }

    /// Maximum number of deliveries in flight during one send. Values below
    /// one are treated as one.
    pub fn with_fanout_concurrency(mut self, limit: usize) -> Self {
        self.fanout_concurrency = limit.max(1);
        self
    }

    pub fn public_key(&self) -> &str {
        &self.vapid.public_key
    }

    pub async fn subscribe(&self, request: NewSubscription) -> Result<String, DispatchError> {
        if request.subscription.endpoint.trim().is_empty() {
            return Err(DispatchError::Validation("subscription endpoint is required"));
        }

        let id = subscription_id(&request.subscription.endpoint);
        let record = SubscriptionRecord {
            subscription: request.subscription,
            user_agent: request.user_agent,
            timestamp: request.timestamp,
            subscription_id: id.clone(),
            created_at: self.time.now(),
        };
        self.store.set(record).await?;
        info!(subscription_id = %id, "push subscription stored");
        Ok(id)
    }

    pub async fn unsubscribe(&self, endpoint: &str) -> Result<(), DispatchError> {
        if endpoint.trim().is_empty() {
            return Err(DispatchError::Validation("subscription endpoint is required"));
        }
        let removed = self.store.delete(endpoint).await?;
        debug!(removed, "push subscription removed");
        Ok(())
    }

    pub async fn send_notification(
        &self,
        request: NotificationRequest,
    ) -> Result<SendReport, DispatchError> {
        if request.title.is_empty() || request.body.is_empty() {
            return Err(DispatchError::Validation("title and body are required"));
        }

        let target = request
            .target_endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.is_empty())
            .map(str::to_string);
        let payload = serde_json::to_vec(&self.normalize(request))?;

        let targets = match target {
            Some(endpoint) => self.store.get(&endpoint).await?.into_iter().collect(),
            None => self.store.list().await?,
        };

        let deliveries: Vec<_> = targets
            .into_iter()
            .map(|record| self.deliver(record, &payload))
            .collect();
        let results: Vec<DeliveryResult> = stream::iter(deliveries)
            .buffered(self.fanout_concurrency)
            .collect()
            .await;

        let report = SendReport::from_results(results);
        info!(sent = report.sent, failed = report.failed, "notification fan-out finished");
        Ok(report)
    }

    pub async fn get_all_subscriptions(&self) -> Result<Vec<SubscriptionRecord>, DispatchError> {
        Ok(self.store.list().await?)
    }

    pub async fn get_subscription_count(&self) -> Result<usize, DispatchError> {
        Ok(self.store.count().await?)
    }

    fn normalize(&self, request: NotificationRequest) -> NotificationPayload {
        NotificationPayload {
            title: request.title,
            body: request.body,
            icon: non_empty(request.icon).unwrap_or_else(|| DEFAULT_ICON.to_string()),
            badge: non_empty(request.badge).unwrap_or_else(|| DEFAULT_BADGE.to_string()),
            data: request
                .data
                .unwrap_or_else(|| JsonValue::Object(Default::default())),
            actions: request.actions.unwrap_or_default(),
            tag: non_empty(request.tag).unwrap_or_else(|| self.time.now_millis().to_string()),
        }
    }

    async fn deliver(&self, record: SubscriptionRecord, payload: &[u8]) -> DeliveryResult {
        let endpoint = record.subscription.endpoint.clone();
        match self.sender.send(&record.subscription, payload).await {
            Ok(()) => DeliveryResult {
                endpoint,
                success: true,
                error: None,
            },
            Err(err) => {
                warn!(
                    subscription_id = %record.subscription_id,
                    status = ?err.status,
                    "push delivery failed: {err}"
                );
                if err.is_gone() {
                    match self.store.delete(&endpoint).await {
                        Ok(_) => info!(
                            subscription_id = %record.subscription_id,
                            "evicted expired push subscription"
                        ),
                        Err(store_err) => warn!(
                            subscription_id = %record.subscription_id,
                            "failed to evict expired push subscription: {store_err}"
                        ),
                    }
                }
                DeliveryResult {
                    endpoint,
                    success: false,
                    error: Some(err.message),
                }
            }
        }
    }
}

/// Empty strings count as unset, like a missing field.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}
