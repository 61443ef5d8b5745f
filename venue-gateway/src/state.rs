//! Shared application state.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::alerts::AlertBanner;
use crate::config::Config;
use crate::gateway::{InferenceGateway, Subscription};
use crate::transport::CredentialStore;
use crate::venue::VenueState;

/// Shared application state passed to all handlers.
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<InferenceGateway>,
    pub credentials: Arc<CredentialStore>,
    pub venue: Arc<RwLock<VenueState>>,
    pub alerts: Arc<AlertBanner>,
    alert_subscription: Subscription,
}

impl AppState {
    pub fn new(
        config: Config,
        gateway: Arc<InferenceGateway>,
        credentials: Arc<CredentialStore>,
        venue: Arc<RwLock<VenueState>>,
    ) -> Self {
        let (alerts, alert_subscription) = AlertBanner::attach(&gateway);
        Self {
            config,
            gateway,
            credentials,
            venue,
            alerts,
            alert_subscription,
        }
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.alert_subscription.unsubscribe();
    }
}
