use thiserror::Error;

/// Failures of the subscription store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("subscription store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the notification dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed request; surfaces as HTTP 400.
    #[error("validation failed: {0}")]
    Validation(&'static str),

    /// Missing or incomplete VAPID identity.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to initialize push transport: {0}")]
    Transport(String),

    #[error("failed to encode notification payload")]
    Payload(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised by the client subscription manager.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("push notifications are not supported")]
    UnsupportedPlatform,

    #[error("push notification permission denied")]
    PermissionDenied,

    #[error("service worker registration failed: {0}")]
    Registration(String),

    #[error("request to notification server failed: {0}")]
    Network(String),

    #[error("invalid VAPID public key from server")]
    InvalidPublicKey,

    #[error("failed to send subscription to server (status {status})")]
    SubscriptionTransmit { status: u16 },

    #[error("push platform error: {0}")]
    Platform(String),
}

/// Error reported by a host push platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PlatformError(pub String);
