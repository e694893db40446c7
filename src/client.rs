//! Browser-side subscription flow, expressed against the [`PushPlatform`]
//! and [`DispatcherApi`] ports.
//!
//! [`PushPlatform`]: crate::ports::PushPlatform
//! [`DispatcherApi`]: crate::ports::DispatcherApi

pub mod manager;
pub mod reactive;

pub use manager::{ManagerConfig, PushNotificationManager, UnsubscribeOutcome};
pub use reactive::{PushEvent, PushNotifications, PushState};
