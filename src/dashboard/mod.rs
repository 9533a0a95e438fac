//! Dashboard Module
//!
//! HTTP API serving trade history, summary statistics and system status to
//! the dashboard frontend.

mod api;
mod types;

pub use api::create_router;
pub use types::*;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::repository::TradeStore;

/// Shared state behind the dashboard API
pub struct DashboardContext {
    pub store: Arc<TradeStore>,
    pub config: AppConfig,
}

/// Start the dashboard server
pub async fn start_server(context: Arc<DashboardContext>) -> Result<()> {
    let host = context.config.dashboard.host.clone();
    let port = context.config.dashboard.port;
    let app = create_router(context);

    let addr = format!("{host}:{port}");
    tracing::info!("Dashboard API starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind dashboard to {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}
