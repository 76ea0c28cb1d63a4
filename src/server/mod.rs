//! HTTP service
//!
//! An axum service over process-wide read-only state. Each request runs
//! independently; streaming responses are fed by a relay task through a
//! bounded channel.

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::{
    AgentInfo, AnalyzeRequest, AnalyzeResponse, ConfigResponse, DocumentInfo, GenerateRequest, ListingResponse,
    SectionInfo, UsageInfo, router,
};
pub use state::AppState;

use eyre::{Context, Result};
use tracing::info;

/// Bind and serve until ctrl-c
pub async fn serve(state: AppState, host: &str, port: u16) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .context(format!("Failed to bind {}:{}", host, port))?;

    let addr = listener.local_addr().context("Failed to read local address")?;
    info!(%addr, "draftsmith listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
