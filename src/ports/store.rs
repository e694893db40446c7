use crate::error::StoreError;
use crate::types::push::SubscriptionRecord;

/// Endpoint-keyed subscription storage.
///
/// `set` overwrites any record with the same endpoint; `delete` reports
/// whether a record was removed and succeeds either way.
pub trait SubscriptionStore: Send + Sync + 'static {
    fn get(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<Option<SubscriptionRecord>, StoreError>> + Send;

    fn set(&self, record: SubscriptionRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete(&self, endpoint: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn list(&self) -> impl Future<Output = Result<Vec<SubscriptionRecord>, StoreError>> + Send;

    fn count(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;
}
