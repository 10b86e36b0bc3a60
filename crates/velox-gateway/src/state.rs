use std::sync::Arc;

use crate::dispatcher::Dispatcher;

/// Shared application state accessible from all request handlers.
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }
}

pub type SharedState = Arc<AppState>;
