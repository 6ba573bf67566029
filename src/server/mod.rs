//! HTTP Surface
//!
//! An axum router exposing the executor under `/workflow`: start runs
//! (async or blocking), poll their status, list and evict them.

pub mod error;
pub mod routes;

use std::io;
use std::sync::Arc;

use axum::Router;
use log::info;
use tokio::net::TcpListener;

use crate::config::Settings;
use crate::execution::WorkflowExecutor;

pub use error::{ApiError, ErrorResponse};

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub executor: WorkflowExecutor,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(executor: WorkflowExecutor, settings: Settings) -> Self {
        Self {
            executor,
            settings: Arc::new(settings),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/workflow", routes::workflow_routes())
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(state: AppState, addr: &str) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested, finishing in-flight requests");
    } else {
        // no signal handler available; run until the process is killed
        std::future::pending::<()>().await;
    }
}
