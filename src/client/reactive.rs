//! UI-facing state holder over [`PushNotificationManager`].
//!
//! Every change goes through [`PushState::apply`], which returns a fresh
//! snapshot; subscribers observe snapshots through a `tokio::sync::watch`
//! channel. Errors are flattened to their message text.

use tokio::sync::watch;

use crate::adapters::SystemTimeProvider;
use crate::client::manager::PushNotificationManager;
use crate::ports::{DispatcherApi, TimeProvider};
use crate::ports::platform::{NotificationOptions, Permission, PushPlatform};
use crate::types::push::PushSubscription;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushState {
    pub supported: bool,
    pub subscription: Option<PushSubscription>,
    pub permission: Permission,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Initialized {
        supported: bool,
        permission: Permission,
    },
    ExistingSubscriptionFound(PushSubscription),
    OperationStarted,
    Subscribed(PushSubscription),
    Unsubscribed,
    Failed {
        message: String,
        permission: Option<Permission>,
    },
    ErrorCleared,
}

impl PushState {
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn apply(&self, event: PushEvent) -> PushState {
        let mut next = self.clone();
        match event {
            PushEvent::Initialized {
                supported,
                permission,
            } => {
                next.supported = supported;
                next.permission = permission;
            }
            PushEvent::ExistingSubscriptionFound(subscription) => {
                next.subscription = Some(subscription);
            }
            PushEvent::OperationStarted => {
                next.loading = true;
                next.error = None;
            }
            PushEvent::Subscribed(subscription) => {
                next.subscription = Some(subscription);
                next.permission = Permission::Granted;
                next.loading = false;
            }
            PushEvent::Unsubscribed => {
                next.subscription = None;
                next.loading = false;
            }
            PushEvent::Failed {
                message,
                permission,
            } => {
                next.error = Some(message);
                if let Some(permission) = permission {
                    next.permission = permission;
                }
                next.loading = false;
            }
            PushEvent::ErrorCleared => {
                next.error = None;
            }
        }
        next
    }
}

pub struct PushNotifications<P, A, T = SystemTimeProvider> {
    manager: PushNotificationManager<P, A, T>,
    state: watch::Sender<PushState>,
}

impl<P, A, T> PushNotifications<P, A, T>
where
    P: PushPlatform,
    A: DispatcherApi,
    T: TimeProvider,
{
    pub fn new(manager: PushNotificationManager<P, A, T>) -> Self {
        let (state, _) = watch::channel(PushState::default());
        Self { manager, state }
    }

    pub fn state(&self) -> PushState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<PushState> {
        self.state.subscribe()
    }

    pub fn manager(&self) -> &PushNotificationManager<P, A, T> {
        &self.manager
    }

    fn dispatch(&self, event: PushEvent) {
        self.state.send_modify(|state| *state = state.apply(event));
    }

    /// Reads support and permission, then picks up any subscription that
    /// survived a reload.
    pub async fn initialize(&mut self) {
        let supported = self.manager.check_support();
        let permission = if supported {
            self.manager.permission()
        } else {
            Permission::Default
        };
        self.dispatch(PushEvent::Initialized {
            supported,
            permission,
        });
        if !supported {
            return;
        }

        match self.manager.get_subscription().await {
            Ok(Some(subscription)) => {
                self.dispatch(PushEvent::ExistingSubscriptionFound(subscription))
            }
            Ok(None) => {}
            Err(err) => self.dispatch(PushEvent::Failed {
                message: err.to_string(),
                permission: None,
            }),
        }
    }

    pub async fn subscribe(&mut self) {
        self.dispatch(PushEvent::OperationStarted);
        let event = match self.manager.subscribe().await {
            Ok(subscription) => PushEvent::Subscribed(subscription),
            Err(err) => PushEvent::Failed {
                message: err.to_string(),
                permission: Some(self.manager.permission()),
            },
        };
        self.dispatch(event);
    }

    pub async fn unsubscribe(&mut self) {
        self.dispatch(PushEvent::OperationStarted);
        let event = match self.manager.unsubscribe().await {
            Ok(_) => PushEvent::Unsubscribed,
            Err(err) => PushEvent::Failed {
                message: err.to_string(),
                permission: None,
            },
        };
        self.dispatch(event);
    }

    pub fn show_test_notification(&self, title: Option<&str>, options: NotificationOptions) {
        if let Err(err) = self.manager.show_test_notification(title, options) {
            self.dispatch(PushEvent::Failed {
                message: err.to_string(),
                permission: None,
            });
        }
    }

    pub fn clear_error(&self) {
        self.dispatch(PushEvent::ErrorCleared);
    }
}
