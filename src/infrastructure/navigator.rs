// Navigation side effects triggered outside the request/response channel
use std::sync::{Mutex, PoisonError};

pub const SIGN_IN_ROUTE: &str = "/signin";

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Logs navigations; the HTTP layer turns a lost session into a redirect itself
#[derive(Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!("Navigating to {}", route);
    }
}

/// Keeps every requested route, for embedding and tests
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}
