//! User registration, password checks and the server side session store.
//!
//! Passwords are stored as argon2 PHC strings with a random salt. Sessions are opaque UUID
//! tokens handed out on login and sent back by clients as bearer tokens. A session expires
//! [`SESSION_TTL_HOURS`] after login, expired sessions are dropped on lookup and on every login.

use crate::{errors::AuthErr, UserID};
use chrono::{DateTime, Duration, Utc};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::{info, warn};
use once_cell::sync::Lazy;
use rand::RngCore;
use regex::Regex;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        PoisonError, RwLock,
    },
};
use uuid::Uuid;

const MIN_PASSWORD_CHARS: usize = 6;
const SALT_BYTES: usize = 16;

/// Lifetime of a session
pub const SESSION_TTL_HOURS: i64 = 12;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").expect("valid mobile regex"));

/// Data required to register a user, fields may be missing in raw requests
#[allow(missing_docs)]
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub full_name: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
struct User {
    user_id: UserID,
    full_name: String,
    #[allow(dead_code)]
    mobile: String,
    password_hash: String,
}

/// Authenticated user bound to a session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// bearer token identifying the session
    pub token: String,
    /// logged in user
    pub user_id: UserID,
    /// name shown to the user
    pub full_name: String,
}

#[derive(Debug, Clone)]
struct OpenSession {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// Registered users and their open sessions
pub struct Auth {
    // keyed by normalized email
    users: RwLock<HashMap<String, User>>,
    sessions: RwLock<HashMap<String, OpenSession>>,
    session_ttl: Duration,
    next_user_id: AtomicU64,
    hasher: Argon2<'static>,
}

impl Default for Auth {
    fn default() -> Self {
        Self::new()
    }
}

fn required(field: Option<String>, name: &str) -> Result<String, AuthErr> {
    match field.map(|f| f.trim().to_owned()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AuthErr::Validation(format!("{name} is required"))),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl Auth {
    /// Create store without users, hashing passwords with default argon2id parameters
    pub fn new() -> Self {
        Self::with_hasher(Argon2::default())
    }

    /// Create store hashing passwords with `hasher`
    pub fn with_hasher(hasher: Argon2<'static>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            session_ttl: Duration::hours(SESSION_TTL_HOURS),
            next_user_id: AtomicU64::new(1),
            hasher,
        }
    }

    /// Replace the default session lifetime
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Validate `registration` and store a new user
    pub fn register(&self, registration: Registration) -> Result<UserID, AuthErr> {
        let full_name = required(registration.full_name, "Full name")?;
        let mobile = required(registration.mobile, "Mobile")?;
        let email = normalize_email(&required(registration.email, "Email")?);
        // passwords are not trimmed
        let password = match registration.password {
            Some(p) if !p.is_empty() => p,
            _ => return Err(AuthErr::Validation("Password is required".into())),
        };

        if !MOBILE_RE.is_match(&mobile) {
            return Err(AuthErr::Validation("Invalid mobile number".into()));
        }
        if !EMAIL_RE.is_match(&email) {
            return Err(AuthErr::Validation("Invalid email address".into()));
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthErr::Validation(format!(
                "Password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }

        let password_hash = self.hash_password(&password)?;

        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if users.contains_key(&email) {
            return Err(AuthErr::Validation("Email already registered".into()));
        }
        let user_id = self.next_user_id.fetch_add(1, Ordering::Relaxed);
        users.insert(
            email,
            User {
                user_id,
                full_name,
                mobile,
                password_hash,
            },
        );

        info!("event=user_register module=auth status=ok user={user_id}");
        Ok(user_id)
    }

    /// Check credentials and open a new session
    pub fn login(&self, email: Option<String>, password: Option<String>) -> Result<Session, AuthErr> {
        let (email, password) = match (email, password) {
            (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => (e, p),
            _ => {
                return Err(AuthErr::Validation(
                    "Email and password are required".into(),
                ))
            }
        };

        let user = self
            .users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_email(&email))
            .cloned();

        let user = match user {
            Some(user) if self.verify_password(&password, &user.password_hash) => user,
            _ => {
                warn!("event=user_login module=auth status=rejected");
                return Err(AuthErr::InvalidCredentials);
            }
        };

        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            user_id: user.user_id,
            full_name: user.full_name,
        };
        let now = Utc::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|_, open| open.expires_at > now);
        sessions.insert(
            session.token.clone(),
            OpenSession {
                session: session.clone(),
                expires_at: now + self.session_ttl,
            },
        );
        drop(sessions);

        info!("event=user_login module=auth status=ok user={}", session.user_id);
        Ok(session)
    }

    /// Session bound to `token`, expired sessions are closed
    pub fn session(&self, token: &str) -> Result<Session, AuthErr> {
        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            match sessions.get(token) {
                None => return Err(AuthErr::UnknownSession),
                Some(open) if open.expires_at > Utc::now() => return Ok(open.session.clone()),
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(open) = sessions.remove(token) {
            info!(
                "event=session_expire module=auth status=ok user={}",
                open.session.user_id
            );
        }
        Err(AuthErr::UnknownSession)
    }

    /// Close session bound to `token`
    pub fn logout(&self, token: &str) -> Result<(), AuthErr> {
        let open = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
            .ok_or(AuthErr::UnknownSession)?;

        info!(
            "event=user_logout module=auth status=ok user={}",
            open.session.user_id
        );
        Ok(())
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthErr> {
        let mut salt = [0u8; SALT_BYTES];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt).map_err(|e| AuthErr::Hashing(e.to_string()))?;

        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthErr::Hashing(e.to_string()))
    }

    fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        match PasswordHash::new(password_hash) {
            Ok(parsed) => self
                .hasher
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!("event=password_verify module=auth status=error reason={e}");
                false
            }
        }
    }
}
