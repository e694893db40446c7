use crate::push::NotificationDispatcher;

use std::sync::Arc;

pub struct AppState<S, P, T> {
    pub dispatcher: Arc<NotificationDispatcher<S, P, T>>,
}

impl<S, P, T> Clone for AppState<S, P, T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}
