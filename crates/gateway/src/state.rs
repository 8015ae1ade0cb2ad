//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::directory::{DirectoryClient, DirectoryError};

/// Fixed deadline for every upstream and directory call, so a hung
/// upstream can never block a gateway request indefinitely.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: GatewayConfig,
    http: reqwest::Client,
    directory: DirectoryClient,
}

impl AppState {
    /// Create the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or directory client cannot be
    /// built from the configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, DirectoryError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let directory = DirectoryClient::new(&config.directory, http.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                http,
                directory,
            }),
        })
    }

    /// Gateway configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Shared HTTP client (10s deadline baked in).
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Tenant directory client.
    #[must_use]
    pub fn directory(&self) -> &DirectoryClient {
        &self.inner.directory
    }
}
