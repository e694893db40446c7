mod dispatcher;
pub(crate) mod vapid;

use base64::encode;

pub use dispatcher::NotificationDispatcher;
pub use vapid::{VapidConfigStatus, VapidCredentials, generate_vapid_credentials, load_vapid_config};

const SUBSCRIPTION_ID_LEN: usize = 12;

/// Short display id: the tail of the endpoint's base64 encoding. Not
/// guaranteed unique.
pub fn subscription_id(endpoint: &str) -> String {
    let encoded = encode(endpoint);
    let start = encoded.len().saturating_sub(SUBSCRIPTION_ID_LEN);
    encoded[start..].to_string()
}
