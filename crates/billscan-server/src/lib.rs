//! HTTP API for billscan.
//!
//! Every capability of `billscan-core` is exposed as one JSON endpoint.
//! Shared components are built before serving and handed to the router
//! through [`AppState`]; nothing in it is written while requests run.

mod error;
mod handlers;

pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use billscan_core::{BillExtractor, ExtractionMode, GenerationClient, OcrAdapter, RuleExtractor};

/// Shared state accessible by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Pipeline behind `/process_bill` and `/process_image`.
    pub extractor: Arc<dyn BillExtractor>,
    /// Keyword classifier behind `/classify`, independent of the mode.
    pub rules: Arc<RuleExtractor>,
    /// `None` when OCR is disabled.
    pub ocr: Option<OcrAdapter>,
    pub llm: GenerationClient,
}

impl AppState {
    pub fn new(
        extractor: Arc<dyn BillExtractor>,
        ocr: Option<OcrAdapter>,
        llm: GenerationClient,
    ) -> Self {
        Self {
            extractor,
            rules: Arc::new(RuleExtractor::new()),
            ocr,
            llm,
        }
    }

    pub fn mode(&self) -> ExtractionMode {
        self.extractor.mode()
    }
}

/// Build the router with permissive CORS, request tracing and a body limit.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    handlers::routes()
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("billscan listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
