use crate::config::Config;
use crate::error::ApiError;
use crate::services::account_service::AccountStore;
use crate::services::nowpayments::PaymentGateway;
use std::sync::Arc;

/// Shared by every handler; cloned into each actix worker.
pub struct AppState {
    pub config: Config,
    pub accounts: Arc<dyn AccountStore>,
    /// `None` while no processor API key is configured.
    pub gateway: Option<Arc<dyn PaymentGateway>>,
}

impl AppState {
    pub fn new(config: Config, accounts: Arc<dyn AccountStore>, gateway: Option<Arc<dyn PaymentGateway>>) -> Self {
        AppState { config, accounts, gateway }
    }

    pub fn gateway(&self) -> Result<&dyn PaymentGateway, ApiError> {
        self.gateway.as_deref().ok_or_else(ApiError::api_key_missing)
    }

    pub fn ipn_secret(&self) -> Result<&str, ApiError> {
        self.config
            .nowpayments_ipn_secret
            .as_deref()
            .ok_or_else(|| ApiError::NotConfigured("NowPayments IPN secret is not configured".to_string()))
    }
}
