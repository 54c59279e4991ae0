use crate::{
    api::ErrorResponse,
    errors::{BankError, ErrorKind},
    server::AppState,
    UserID,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

/// Route guard: resolves the `Authorization: Bearer <token>` header to an open session.
/// Handlers taking it reject anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// token the request was authorized with
    pub token: String,
    /// logged in user
    pub user_id: UserID,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = BankError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| BankError::Unauthorized("Unauthorized".into()))?;

        let session = state.auth.session(token)?;
        Ok(AuthSession {
            token: session.token,
            user_id: session.user_id,
        })
    }
}

impl IntoResponse for BankError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::InvalidAccount
            | ErrorKind::InvalidAmount
            | ErrorKind::InsufficientFunds
            | ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Server => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
