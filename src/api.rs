//! JSON bodies exchanged between [`crate::server`] and [`crate::client`]

use crate::{
    account::{Account, AccountSnapshot, AccountStatus, TransKind, TransRecord},
    amount::to_minor_scale,
    errors::{BankError, ErrorKind},
    AccountID, TransID, UserID,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Numeric request field. Browsers send input field values as strings, typed clients send
/// numbers, both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON number
    Number(serde_json::Number),
    /// anything sent as JSON string
    Text(String),
}

impl Scalar {
    fn as_text(&self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.trim().to_owned(),
        }
    }

    /// Interpret as account identifier
    pub fn account_id(&self) -> Option<AccountID> {
        self.as_text().parse().ok()
    }

    /// Interpret as money amount. Values a [`Decimal`] can not hold without rounding are `None`.
    pub fn decimal(&self) -> Option<Decimal> {
        let text = self.as_text();
        if text.contains(|c: char| c == 'e' || c == 'E') {
            exact_scientific(&text)
        } else {
            Decimal::from_str_exact(&text).ok()
        }
    }
}

/// `<mantissa>e<exponent>` notation without rounding
fn exact_scientific(text: &str) -> Option<Decimal> {
    let (mantissa, exponent) = text.split_once(|c: char| c == 'e' || c == 'E')?;
    let mut value = Decimal::from_str_exact(mantissa).ok()?;
    let exponent: i64 = exponent.parse().ok()?;

    let scale = i64::from(value.scale()) - exponent;
    if scale >= 0 {
        value.set_scale(u32::try_from(scale).ok()?).ok()?;
        return Some(value);
    }

    value.set_scale(0).ok()?;
    for _ in 0..scale.unsigned_abs() {
        if value.is_zero() {
            break;
        }
        value = value.checked_mul(Decimal::TEN)?;
    }
    Some(value)
}

impl From<AccountID> for Scalar {
    fn from(id: AccountID) -> Self {
        Scalar::Number(id.into())
    }
}

impl From<Decimal> for Scalar {
    fn from(d: Decimal) -> Self {
        Scalar::Text(d.to_string())
    }
}

/// Resolve required account id field
pub fn parse_account_field(field: Option<&Scalar>, name: &str) -> Result<AccountID, BankError> {
    let field = field.ok_or_else(|| BankError::Validation(format!("{name} is required")))?;
    field
        .account_id()
        .ok_or_else(|| BankError::InvalidAccount(format!("Invalid account: {}", field.as_text())))
}

/// Resolve required amount field
pub fn parse_amount_field(field: Option<&Scalar>) -> Result<Decimal, BankError> {
    let field = field.ok_or_else(|| BankError::Validation("amount is required".into()))?;
    field
        .decimal()
        .ok_or_else(|| BankError::InvalidAmount("Invalid amount".into()))
}

/// `POST /api/register`
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// `POST /api/login`
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Successful login
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: UserID,
    pub full_name: String,
    /// bearer token for authenticated requests
    pub token: String,
}

/// `POST /api/account/create`
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub account_type: Option<String>,
}

/// `POST /api/account/transfer`
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferRequest {
    #[serde(default)]
    pub from_account: Option<Scalar>,
    #[serde(default)]
    pub to_account: Option<Scalar>,
    #[serde(default)]
    pub amount: Option<Scalar>,
}

/// `POST /api/account/deposit`
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DepositRequest {
    #[serde(default)]
    pub account_id: Option<Scalar>,
    #[serde(default)]
    pub amount: Option<Scalar>,
}

/// `POST /api/account/deactivate`
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeactivateRequest {
    #[serde(default)]
    pub account_id: Option<Scalar>,
}

/// Generic success body
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    /// body with `message`
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Generic error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// message shown to the user
    pub error: String,
    /// missing in bodies produced by other servers
    #[serde(default)]
    pub kind: Option<ErrorKind>,
}

impl From<&BankError> for ErrorResponse {
    fn from(e: &BankError) -> Self {
        Self {
            error: e.message().to_owned(),
            kind: Some(e.kind()),
        }
    }
}

impl From<ErrorResponse> for BankError {
    fn from(body: ErrorResponse) -> Self {
        BankError::from_kind(body.kind.unwrap_or(ErrorKind::Server), body.error)
    }
}

/// One account in `GET /api/accounts`
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub account_id: AccountID,
    pub account_type: String,
    pub balance: Decimal,
    pub status: AccountStatus,
}

impl From<&AccountSnapshot> for AccountView {
    fn from(acc: &AccountSnapshot) -> Self {
        Self {
            account_id: acc.account_id(),
            account_type: acc.account_type().to_string(),
            balance: to_minor_scale(acc.balance()),
            status: acc.status(),
        }
    }
}

/// `GET /api/accounts`
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsResponse {
    pub accounts: Vec<AccountView>,
}

/// One entry in `GET /api/account/{id}/transactions`
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub transaction_id: TransID,
    pub transaction_type: TransKind,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<AccountID>,
}

impl From<&TransRecord> for TransactionView {
    fn from(rec: &TransRecord) -> Self {
        Self {
            transaction_id: rec.id(),
            transaction_type: rec.kind(),
            amount: to_minor_scale(rec.amount().into()),
            created_at: rec.created_at(),
            counterparty: rec.counterparty(),
        }
    }
}

/// `GET /api/account/{id}/transactions`
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<TransactionView>,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::amount::{Amount, AmountErr};

    #[test]
    fn scalar_accepts_strings_and_numbers() {
        let req: TransferRequest =
            serde_json::from_str(r#"{"from_account": "1", "to_account": 2, "amount": "150.50"}"#)
                .unwrap();

        assert_eq!(parse_account_field(req.from_account.as_ref(), "from_account"), Ok(1));
        assert_eq!(parse_account_field(req.to_account.as_ref(), "to_account"), Ok(2));
        assert_eq!(
            parse_amount_field(req.amount.as_ref()),
            Ok(Decimal::new(15050, 2))
        );

        let req: DepositRequest =
            serde_json::from_str(r#"{"account_id": 3, "amount": 12.5}"#).unwrap();
        assert_eq!(
            parse_amount_field(req.amount.as_ref()),
            Ok(Decimal::new(125, 1))
        );
    }

    #[test]
    fn amounts_are_never_rounded() {
        // beyond 28 significant digits a rounding parse would yield exactly 1
        let text = Scalar::Text("1.00000000000000000000000000001".into());
        assert_eq!(
            parse_amount_field(Some(&text)),
            Err(BankError::InvalidAmount("Invalid amount".into()))
        );

        // json numbers keep the literal the client sent
        let req: DepositRequest =
            serde_json::from_str(r#"{"account_id": 1, "amount": 1.0000000000000000001}"#).unwrap();
        let amount = parse_amount_field(req.amount.as_ref()).unwrap();
        assert_eq!(amount.scale(), 19);
        assert_eq!(Amount::try_from(amount), Err(AmountErr::TooPrecise));

        let req: DepositRequest =
            serde_json::from_str(r#"{"account_id": 1, "amount": 12.345}"#).unwrap();
        let amount = parse_amount_field(req.amount.as_ref()).unwrap();
        assert_eq!(amount, Decimal::new(12345, 3));
    }

    #[test]
    fn scientific_notation() {
        let parse = |s: &str| Scalar::Text(s.into()).decimal();
        assert_eq!(parse("1.5e2"), Some(Decimal::new(150, 0)));
        assert_eq!(parse("25E-1"), Some(Decimal::new(25, 1)));
        assert_eq!(parse("1e-29"), None);
        assert_eq!(parse("1e40"), None);
        assert_eq!(parse("1.00000000000000000000000000001e1"), None);
    }

    #[test]
    fn malformed_fields() {
        let req: TransferRequest =
            serde_json::from_str(r#"{"from_account": "abc", "amount": "ten"}"#).unwrap();

        assert!(matches!(
            parse_account_field(req.from_account.as_ref(), "from_account"),
            Err(BankError::InvalidAccount(_))
        ));
        assert_eq!(
            parse_account_field(req.to_account.as_ref(), "to_account"),
            Err(BankError::Validation("to_account is required".into()))
        );
        assert_eq!(
            parse_amount_field(req.amount.as_ref()),
            Err(BankError::InvalidAmount("Invalid amount".into()))
        );
    }

    #[test]
    fn error_body_round_trip() {
        let e = BankError::InsufficientFunds("Insufficient balance".into());
        let body = serde_json::to_string(&ErrorResponse::from(&e)).unwrap();
        assert_eq!(
            body,
            r#"{"error":"Insufficient balance","kind":"insufficient_funds"}"#
        );

        let back: ErrorResponse = serde_json::from_str(&body).unwrap();
        assert_eq!(BankError::from(back), e);

        let foreign: ErrorResponse = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert_eq!(BankError::from(foreign), BankError::Server("boom".into()));
    }
}
