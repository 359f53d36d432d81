//! # Application State
//!
//! Shared handles passed to every handler via axum's `State` extractor.

use std::sync::Arc;

use tavola_db::Database;

use crate::config::{http_url, ConfigError, ServerConfig};
use crate::payment::{HostedCheckoutGateway, PaymentGateway};
use crate::session::CartSessions;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: Arc<CartSessions>,
    pub payments: Arc<dyn PaymentGateway>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Builds state with the hosted checkout gateway from `config`.
    ///
    /// The configuration is validated first; a missing payment signing
    /// secret is an error.
    pub fn new(db: Database, config: ServerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let checkout_url = http_url("checkout_url", &config.payments.checkout_url)?;
        let gateway = HostedCheckoutGateway::new(
            checkout_url,
            config.payments.currency.clone(),
            config.payments.signing_secret.clone(),
            config.checkout_session_ttl(),
        );
        Ok(AppState::with_gateway(db, config, Arc::new(gateway)))
    }

    /// Builds state around a given payment gateway.
    pub fn with_gateway(
        db: Database,
        config: ServerConfig,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        AppState {
            db,
            sessions: Arc::new(CartSessions::new(config.session_idle_timeout())),
            payments,
            config: Arc::new(config),
        }
    }
}
