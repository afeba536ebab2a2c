//! Mock status API for the station dashboard.
//!
//! Routes:
//!
//! | Method | Path | Body |
//! |---|---|---|
//! | GET | `/api/status` | [`Status`] |
//! | GET, POST | `/api/config` | [`StationConfig`](crate::config::StationConfig) / [`ActionResponse`] |
//! | GET | `/api/logs?lines=N` | array of [`LogEntry`] |
//! | POST | `/api/restart` | [`ActionResponse`] |
//! | GET | `/api/health` | [`Health`] |
//! | GET | `/` | endpoint index |
//!
//! Every error, including a handler panic, is answered with
//! `{"status": "error", "error": "..."}`.

mod error;
pub mod handlers;
pub mod logs;
mod metrics;
pub mod models;
mod state;

use std::any::Any;
use std::future::Future;

use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

pub use error::ApiError;
pub use metrics::MetricsSampler;
pub use models::{ActionResponse, Health, LogEntry, LogLevel, Status, StationUpdate, SystemMetrics};
pub use state::{AppState, SharedState};

/// Build the route table over `state`.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/status", get(handlers::status))
        .route(
            "/api/config",
            get(handlers::get_config).post(handlers::update_config),
        )
        .route("/api/logs", get(handlers::recent_logs))
        .route("/api/restart", post(handlers::restart))
        .route("/api/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
///
/// # Errors
///
/// Returns [`Error::Bind`] if the address is unavailable, or an I/O error if
/// the server stops abnormally.
pub async fn serve(config: Config) -> Result<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| Error::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(
        %addr,
        callsign = %config.station.callsign,
        "API server listening"
    );
    run(listener, AppState::new(config), shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns an I/O error if the server stops abnormally.
pub async fn run<F>(listener: TcpListener, state: SharedState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for Ctrl-C; run until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[allow(clippy::needless_pass_by_value)]
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::internal(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_panic_response_is_json_500() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = panic_response(Box::new(42_u8));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
