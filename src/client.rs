//! Typed async client for the REST API.
//!
//! Every call returns `Result<_, BankError>`: error bodies are turned back into the matching
//! [`BankError`] variant, transport failures and unexpected responses into
//! [`BankError::Server`]. Authenticated calls take the [`Session`] explicitly.

use crate::{
    api::{
        AccountView, AccountsResponse, CreateAccountRequest, DeactivateRequest, DepositRequest,
        ErrorResponse, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
        TransactionView, TransactionsResponse, TransferRequest,
    },
    account::AccountType,
    errors::BankError,
    AccountID, UserID,
};
use reqwest::{Method, RequestBuilder};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};

/// Logged in user as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// logged in user
    pub user_id: UserID,
    /// name to greet the user with
    pub full_name: String,
    token: String,
}

/// Client of one bank server
#[derive(Debug, Clone)]
pub struct BankClient {
    http: reqwest::Client,
    base_url: String,
}

fn server_error(e: impl std::fmt::Display) -> BankError {
    BankError::Server(format!("Server error: {e}"))
}

impl BankClient {
    /// Client of server at `base_url`, e.g. `http://127.0.0.1:5000`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    /// Client reusing a configured [`reqwest::Client`]
    pub fn with_http_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http, base_url }
    }

    /// Create user, returns the server message
    pub async fn register(
        &self,
        full_name: &str,
        mobile: &str,
        email: &str,
        password: &str,
    ) -> Result<String, BankError> {
        let body = RegisterRequest {
            full_name: Some(full_name.to_owned()),
            mobile: Some(mobile.to_owned()),
            email: Some(email.to_owned()),
            password: Some(password.to_owned()),
        };
        let resp: MessageResponse = self
            .send(self.request(Method::POST, "/api/register", None), Some(&body))
            .await?;
        Ok(resp.message)
    }

    /// Open session
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, BankError> {
        let body = LoginRequest {
            email: Some(email.to_owned()),
            password: Some(password.to_owned()),
        };
        let resp: LoginResponse = self
            .send(self.request(Method::POST, "/api/login", None), Some(&body))
            .await?;
        Ok(Session {
            user_id: resp.user_id,
            full_name: resp.full_name,
            token: resp.token,
        })
    }

    /// Close session
    pub async fn logout(&self, session: &Session) -> Result<String, BankError> {
        let resp: MessageResponse = self
            .send::<(), _>(self.request(Method::POST, "/api/logout", Some(session)), None)
            .await?;
        Ok(resp.message)
    }

    /// Open new account of `account_type`
    pub async fn create_account(
        &self,
        session: &Session,
        account_type: AccountType,
    ) -> Result<String, BankError> {
        let body = CreateAccountRequest {
            account_type: Some(account_type.to_string()),
        };
        self.message(Method::POST, "/api/account/create", session, &body)
            .await
    }

    /// Deposit `amount` into `account_id`
    pub async fn deposit(
        &self,
        session: &Session,
        account_id: AccountID,
        amount: Decimal,
    ) -> Result<String, BankError> {
        let body = DepositRequest {
            account_id: Some(account_id.into()),
            amount: Some(amount.into()),
        };
        self.message(Method::POST, "/api/account/deposit", session, &body)
            .await
    }

    /// Move `amount` from `from` to `to`
    pub async fn transfer(
        &self,
        session: &Session,
        from: AccountID,
        to: AccountID,
        amount: Decimal,
    ) -> Result<String, BankError> {
        let body = TransferRequest {
            from_account: Some(from.into()),
            to_account: Some(to.into()),
            amount: Some(amount.into()),
        };
        self.message(Method::POST, "/api/account/transfer", session, &body)
            .await
    }

    /// Block `account_id`
    pub async fn deactivate(
        &self,
        session: &Session,
        account_id: AccountID,
    ) -> Result<String, BankError> {
        let body = DeactivateRequest {
            account_id: Some(account_id.into()),
        };
        self.message(Method::POST, "/api/account/deactivate", session, &body)
            .await
    }

    /// Accounts of the logged in user
    pub async fn accounts(&self, session: &Session) -> Result<Vec<AccountView>, BankError> {
        let resp: AccountsResponse = self
            .send::<(), _>(self.request(Method::GET, "/api/accounts", Some(session)), None)
            .await?;
        Ok(resp.accounts)
    }

    /// History of `account_id`, newest first
    pub async fn transactions(
        &self,
        session: &Session,
        account_id: AccountID,
    ) -> Result<Vec<TransactionView>, BankError> {
        let path = format!("/api/account/{account_id}/transactions");
        let resp: TransactionsResponse = self
            .send::<(), _>(self.request(Method::GET, &path, Some(session)), None)
            .await?;
        Ok(resp.transactions)
    }

    async fn message<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        session: &Session,
        body: &B,
    ) -> Result<String, BankError> {
        let resp: MessageResponse = self
            .send(self.request(method, path, Some(session)), Some(body))
            .await?;
        Ok(resp.message)
    }

    fn request(&self, method: Method, path: &str, session: Option<&Session>) -> RequestBuilder {
        let req = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match session {
            Some(session) => req.bearer_auth(&session.token),
            None => req,
        }
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        body: Option<&B>,
    ) -> Result<T, BankError> {
        let req = match body {
            Some(body) => req.json(body),
            None => req,
        };
        let resp = req.send().await.map_err(server_error)?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(server_error)?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(server_error);
        }

        match serde_json::from_slice::<ErrorResponse>(&bytes) {
            Ok(body) => Err(body.into()),
            Err(_) => Err(server_error(format!("unexpected response status {status}"))),
        }
    }
}
