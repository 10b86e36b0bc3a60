use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use velox_common::{Error, Result};
use velox_config::AppConfig;

use crate::bootstrap::build_dispatcher;
use crate::router::build_router;
use crate::state::AppState;

/// The webhook server: binds to the configured address and serves Telegram updates.
pub struct GatewayServer {
    config: AppConfig,
}

impl GatewayServer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.gateway.host, self.config.gateway.port);

        let dispatcher = build_dispatcher(&self.config)?;
        let state = Arc::new(AppState::new(dispatcher));
        let app = build_router(state);

        let listener = TcpListener::bind(&addr).await?;
        info!("Velox gateway listening on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Gateway(format!("server error: {e}")))?;

        Ok(())
    }
}
