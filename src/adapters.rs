use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::client::ManagerConfig;
use crate::error::{ClientError, StoreError};
use crate::ports;
use crate::types::push::{
    DeliveryError, NewSubscription, PushSubscription, RemoveSubscription, SubscriptionRecord,
    VapidConfig,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl ports::TimeProvider for SystemTimeProvider {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, web_push::WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }

    async fn deliver(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<(), web_push::WebPushError> {
        let subscription_info = web_push::SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.keys.p256dh.clone(),
            subscription.keys.auth.clone(),
        );
        let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload);
        let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature_builder.build()?);
        self.client.send(builder.build()?).await
    }
}

fn delivery_error(err: web_push::WebPushError) -> DeliveryError {
    let status = match &err {
        web_push::WebPushError::EndpointNotValid => Some(410),
        web_push::WebPushError::EndpointNotFound => Some(404),
        _ => None,
    };
    DeliveryError::new(status, err.to_string())
}

impl ports::PushSender for WebPushSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a PushSubscription, payload: &'a [u8]) -> Self::Fut<'a> {
        Box::pin(async move {
            if subscription.keys.p256dh.is_empty() || subscription.keys.auth.is_empty() {
                return Err(DeliveryError::new(None, "subscription is missing encryption keys"));
            }
            self.deliver(subscription, payload)
                .await
                .map_err(delivery_error)
        })
    }
}

/// Process-lifetime store. Records are listed in endpoint order.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionStore {
    records: Arc<RwLock<BTreeMap<String, SubscriptionRecord>>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ports::SubscriptionStore for InMemorySubscriptionStore {
    async fn get(&self, endpoint: &str) -> Result<Option<SubscriptionRecord>, StoreError> {
        Ok(self.records.read().await.get(endpoint).cloned())
    }

    async fn set(&self, record: SubscriptionRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .insert(record.subscription.endpoint.clone(), record);
        Ok(())
    }

    async fn delete(&self, endpoint: &str) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(endpoint).is_some())
    }

    async fn list(&self) -> Result<Vec<SubscriptionRecord>, StoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }
}

/// Talks to the notification routes over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDispatcherApi {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct PublicKeyBody {
    #[serde(rename = "publicKey")]
    public_key: String,
}

#[derive(Deserialize)]
struct SubscribeBody {
    #[serde(rename = "subscriptionId", default)]
    subscription_id: String,
}

impl HttpDispatcherApi {
    /// `base_url` is the origin plus the route prefix, e.g.
    /// `https://example.com/api/notifications`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Joins the page origin with the manager's `api_endpoint`.
    pub fn for_origin(origin: &str, config: &ManagerConfig) -> Self {
        let endpoint = config.api_endpoint.trim_start_matches('/');
        Self::new(format!("{}/{}", origin.trim_end_matches('/'), endpoint))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn network_error(err: reqwest::Error) -> ClientError {
    ClientError::Network(err.to_string())
}

impl ports::DispatcherApi for HttpDispatcherApi {
    async fn public_key(&self) -> Result<String, ClientError> {
        let response = self
            .client
            .get(self.url("vapid-public-key"))
            .send()
            .await
            .map_err(network_error)?;
        if !response.status().is_success() {
            return Err(ClientError::Network(format!(
                "unexpected status {}",
                response.status()
            )));
        }
        let body: PublicKeyBody = response.json().await.map_err(network_error)?;
        Ok(body.public_key)
    }

    async fn subscribe(&self, subscription: &NewSubscription) -> Result<String, ClientError> {
        let response = self
            .client
            .post(self.url("subscribe"))
            .json(subscription)
            .send()
            .await
            .map_err(network_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::SubscriptionTransmit {
                status: status.as_u16(),
            });
        }
        let body: SubscribeBody = response.json().await.map_err(network_error)?;
        Ok(body.subscription_id)
    }

    async fn unsubscribe(&self, subscription: &PushSubscription) -> Result<(), ClientError> {
        let body = RemoveSubscription {
            subscription: subscription.clone(),
        };
        let response = self
            .client
            .post(self.url("unsubscribe"))
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::SubscriptionTransmit {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
