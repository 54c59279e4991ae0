use crate::{
    account::AccountType,
    api::{
        parse_account_field, parse_amount_field, AccountView, AccountsResponse,
        CreateAccountRequest, DeactivateRequest, DepositRequest, LoginRequest, LoginResponse,
        MessageResponse, RegisterRequest, TransactionView, TransactionsResponse, TransferRequest,
    },
    auth::Registration,
    errors::BankError,
    server::{AppState, AuthSession},
    AccountID,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use log::error;

type ApiResult<T> = Result<(StatusCode, Json<T>), BankError>;

fn ok<T>(body: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(body)))
}

/// unwrap a json body, malformed bodies are validation errors
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, BankError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| BankError::Validation(rejection.body_text()))
}

/// run blocking work (password hashing) off the async workers
async fn blocking<T, F>(work: F) -> Result<T, BankError>
where
    F: FnOnce() -> Result<T, BankError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!("event=blocking_task module=server status=error reason={e}");
        BankError::Server("Server error".into())
    })?
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let req = body(payload)?;
    let registration = Registration {
        full_name: req.full_name,
        mobile: req.mobile,
        email: req.email,
        password: req.password,
    };

    let auth = state.auth.clone();
    blocking(move || auth.register(registration).map_err(BankError::from)).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Registration successful")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let req = body(payload)?;

    let auth = state.auth.clone();
    let session =
        blocking(move || auth.login(req.email, req.password).map_err(BankError::from)).await?;

    ok(LoginResponse {
        user_id: session.user_id,
        full_name: session.full_name,
        token: session.token,
    })
}

pub async fn logout(
    State(state): State<AppState>,
    session: AuthSession,
) -> ApiResult<MessageResponse> {
    state.auth.logout(&session.token)?;
    ok(MessageResponse::new("Logged out"))
}

pub async fn list_accounts(
    State(state): State<AppState>,
    session: AuthSession,
) -> ApiResult<AccountsResponse> {
    let accounts = state
        .ledger
        .accounts_of(session.user_id)
        .iter()
        .map(AccountView::from)
        .collect();

    ok(AccountsResponse { accounts })
}

pub async fn create_account(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let req = body(payload)?;
    let account_type: AccountType = req
        .account_type
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|e| BankError::Validation(format!("{e}")))?;

    state.ledger.open_account(session.user_id, account_type);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Account created successfully")),
    ))
}

pub async fn deposit(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<DepositRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let req = body(payload)?;
    let account_id = parse_account_field(req.account_id.as_ref(), "account_id")?;
    let amount = parse_amount_field(req.amount.as_ref())?;

    state.ledger.deposit(session.user_id, account_id, amount)?;

    ok(MessageResponse::new("Deposit successful"))
}

pub async fn transfer(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let req = body(payload)?;
    let from = parse_account_field(req.from_account.as_ref(), "from_account")?;
    let to = parse_account_field(req.to_account.as_ref(), "to_account")?;
    let amount = parse_amount_field(req.amount.as_ref())?;

    state.ledger.transfer(session.user_id, from, to, amount)?;

    ok(MessageResponse::new("Transfer successful"))
}

pub async fn deactivate(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<DeactivateRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let req = body(payload)?;
    let account_id = parse_account_field(req.account_id.as_ref(), "account_id")?;

    state.ledger.deactivate(session.user_id, account_id)?;

    ok(MessageResponse::new("Account deactivated successfully"))
}

pub async fn transactions(
    State(state): State<AppState>,
    session: AuthSession,
    Path(account_id): Path<String>,
) -> ApiResult<TransactionsResponse> {
    let account_id: AccountID = account_id
        .trim()
        .parse()
        .map_err(|_| BankError::InvalidAccount("Invalid account".into()))?;

    let transactions = state
        .ledger
        .history(session.user_id, account_id)?
        .iter()
        .map(TransactionView::from)
        .collect();

    ok(TransactionsResponse { transactions })
}
