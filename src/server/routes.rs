use crate::server::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/accounts", get(handlers::list_accounts))
        .route("/api/account/create", post(handlers::create_account))
        .route("/api/account/deposit", post(handlers::deposit))
        .route("/api/account/transfer", post(handlers::transfer))
        .route("/api/account/deactivate", post(handlers::deactivate))
        .route(
            "/api/account/:account_id/transactions",
            get(handlers::transactions),
        )
}
