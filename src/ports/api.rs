use crate::error::ClientError;
use crate::types::push::{NewSubscription, PushSubscription};

/// Client-side view of the notification server.
pub trait DispatcherApi: Send + Sync {
    fn public_key(&self) -> impl Future<Output = Result<String, ClientError>> + Send;

    /// Returns the server-assigned subscription id.
    fn subscribe(
        &self,
        subscription: &NewSubscription,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    fn unsubscribe(
        &self,
        subscription: &PushSubscription,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}
