use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use credline_core::config::GatewayConfig;

use crate::service::SubmissionService;

use super::handlers;

/// Gateway HTTP server.
pub struct Gateway {
    config: GatewayConfig,
    service: SubmissionService,
}

impl Gateway {
    pub fn new(config: GatewayConfig, service: SubmissionService) -> Self {
        Self { config, service }
    }

    /// Build the Axum router.
    pub fn router(&self) -> Router {
        // Build CORS layer
        let cors = if self.config.cors_enabled {
            if self.config.cors_origins.contains(&"*".to_string()) {
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
            } else {
                let origins: Vec<_> = self
                    .config
                    .cors_origins
                    .iter()
                    .filter_map(|o| o.parse().ok())
                    .collect();
                CorsLayer::new()
                    .allow_origin(origins)
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        } else {
            CorsLayer::new()
        };

        Router::new()
            .route("/health", get(handlers::health))
            .route(
                "/api/submissions",
                get(handlers::list_submissions).post(handlers::create_submission),
            )
            .route("/api/submissions/{id}", get(handlers::get_submission))
            .route(
                "/api/submissions/{id}/approve",
                post(handlers::approve_submission),
            )
            .route(
                "/api/submissions/{id}/reject",
                post(handlers::reject_submission),
            )
            .route("/api/submissions/{id}/report", post(handlers::submit_report))
            .route("/api/intake", post(handlers::intake))
            .route("/api/metrics", get(handlers::metrics))
            .route("/api/report", get(handlers::payout_report))
            .route("/api/report/export", get(handlers::export_payout_report))
            .route("/api/alerts", get(handlers::alerts))
            .route("/api/sweep", post(handlers::sweep))
            .with_state(self.service.clone())
            .layer(cors)
    }

    /// Get the socket address to bind to.
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.config.port))
    }

    /// Bind and serve until the task is cancelled.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.addr();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "gateway listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
