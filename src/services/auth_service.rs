use async_trait::async_trait;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::auth::{AuthToken, LoginRequest};
use crate::models::user::{CreateUserRequest, User};
use crate::repositories::RepositoryError;
use crate::repositories::user_repository::UserRepository;

/// Hours an expense API token stays valid unless `TOKEN_TTL_HOURS` says otherwise
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Payload signed into every token; `sub` is the caller the ownership checks compare against
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // users.email is the only unique column a registration can hit
            RepositoryError::ConstraintViolation(_) => AuthError::DuplicateEmail,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

/// Identity side of the API: who may call the expense routes, and as whom
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, request: CreateUserRequest) -> Result<User, AuthError>;

    /// Exchanges email and password for a bearer token
    async fn login(&self, request: LoginRequest) -> Result<AuthToken, AuthError>;

    /// Returns the caller id carried by a bearer token
    async fn validate_token(&self, token: &str) -> Result<Uuid, AuthError>;
}

/// HS256 keys derived once from the shared secret
struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::default(),
        }
    }

    fn issue(
        &self,
        user_id: Uuid,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<AuthToken, AuthError> {
        let expires_at = issued_at + ttl;
        let claims = Claims {
            sub: user_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("Token signing failed: {}", e)))?;

        Ok(AuthToken { token, expires_at })
    }

    fn caller(&self, token: &str) -> Result<Uuid, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
}

fn password_matches(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    verify(password, password_hash)
        .map_err(|e| AuthError::Internal(format!("Password verification failed: {}", e)))
}

/// bcrypt passwords, HS256 tokens, users from a [`UserRepository`]
pub struct AuthServiceImpl {
    users: Arc<dyn UserRepository>,
    keys: TokenKeys,
    token_ttl: Duration,
}

impl AuthServiceImpl {
    pub fn new(users: Arc<dyn UserRepository>, jwt_secret: String) -> Self {
        Self {
            users,
            keys: TokenKeys::from_secret(jwt_secret.as_bytes()),
            token_ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }

    pub fn with_token_ttl(mut self, token_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(&self, request: CreateUserRequest) -> Result<User, AuthError> {
        let password_hash = hash_password(&request.password)?;
        let user = self.users.create(request, password_hash).await?;

        tracing::info!(user_id = %user.id, "registered user");
        Ok(user)
    }

    async fn login(&self, request: LoginRequest) -> Result<AuthToken, AuthError> {
        let Some(user) = self.users.find_by_email(&request.email).await? else {
            tracing::debug!("login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !password_matches(&request.password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "password mismatch on login");
            return Err(AuthError::InvalidCredentials);
        }

        self.keys.issue(user.id, Utc::now(), self.token_ttl)
    }

    async fn validate_token(&self, token: &str) -> Result<Uuid, AuthError> {
        self.keys.caller(token)
    }
}
