pub mod api;
pub mod platform;
pub mod push;
pub mod store;
pub mod time;

pub use api::DispatcherApi;
pub use platform::PushPlatform;
pub use push::PushSender;
pub use store::SubscriptionStore;
pub use time::TimeProvider;
