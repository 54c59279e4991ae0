//! REST API over the [`Ledger`] and [`Auth`] stores

mod handlers;
mod routes;
mod session;

pub use session::AuthSession;

use crate::{auth::Auth, ledger::Ledger};
use axum::{routing::get, Router};
use log::info;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

/// Shared state of all handlers
#[derive(Clone)]
pub struct AppState {
    /// accounts and transactions
    pub ledger: Arc<Ledger>,
    /// users and sessions
    pub auth: Arc<Auth>,
}

impl AppState {
    /// state over empty stores
    pub fn new(auth: Auth) -> Self {
        Self {
            ledger: Arc::new(Ledger::new()),
            auth: Arc::new(auth),
        }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "Backend is running" }))
        .merge(routes::api_routes())
        .with_state(state)
}

/// Serve the API on an already bound `listener` until ctrl-c
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    info!(
        "event=server_start module=server status=ok addr={}",
        listener.local_addr()?
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

/// Bind `addr` and serve the API until ctrl-c
pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("event=server_signal module=server status=error reason={e}");
        // without a signal handler keep serving forever
        std::future::pending::<()>().await;
    }
}
