use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use game_persistence::StoreError;
use game_persistence::repositories::UserRepository;
use game_types::{AuthenticatedUser, LoginResponse, User};

pub const MIN_USERNAME_LENGTH: usize = 5;
pub const MIN_PASSWORD_LENGTH: usize = 5;
pub const PASSWORD_SYMBOLS: &[char] = &['$', '%', '*', '@'];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User id
    pub name: String, // Username
    pub adm: bool,    // Admin flag
    pub iat: i64,
    pub exp: i64,
}

pub struct AuthService {
    users: Arc<UserRepository>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<UserRepository>, secret: &str, token_ttl: Duration) -> Self {
        Self {
            users,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
        }
    }

    /// Create a regular player account.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        validate_username(username)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;
        let user = self
            .users
            .create_user(username, &password_hash, false)
            .await?;
        Ok(user)
    }

    /// Create an admin account. Only reachable from the admin CLI.
    pub async fn create_admin(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if password.is_empty() {
            return Err(AuthError::WeakPassword);
        }

        let password_hash = hash_password(password)?;
        let user = self.users.create_user(username, &password_hash, true).await?;
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let credentials = self.users.find_credentials(username).await?;

        let Some(credentials) = credentials else {
            tracing::warn!(username, "Login for unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &credentials.password_hash) {
            tracing::warn!(username, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&credentials.user)?;
        tracing::info!(user_id = %credentials.user.id, "User logged in");

        Ok(LoginResponse {
            token,
            user: credentials.user,
        })
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.username.clone(),
            adm: user.is_admin,
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            AuthError::Internal(e.to_string())
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => {
                        tracing::warn!("JWT validation failed: {:?}", e);
                        AuthError::InvalidToken
                    }
                }
            })?;

        let claims = token_data.claims;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthenticatedUser {
            user_id,
            username: claims.name,
            is_admin: claims.adm,
        })
    }

    /// Resolve an `Authorization: Bearer <token>` header value to the
    /// caller's identity.
    pub fn authenticate(&self, auth_header: Option<&str>) -> Result<AuthenticatedUser, AuthError> {
        let token = auth_header
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or(AuthError::InvalidToken)?;
        self.validate_token(token.trim())
    }
}

pub fn require_admin(user: &AuthenticatedUser) -> Result<(), AuthError> {
    if user.is_admin {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.user_id, "Non-admin tried to reach admin route");
        Err(AuthError::Forbidden)
    }
}

pub fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername);
    }
    Ok(())
}

/// At least five characters with a letter, a digit and one of `$ % * @`.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let strong = password.chars().count() >= MIN_PASSWORD_LENGTH
        && password.chars().any(|c| c.is_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(&c));

    if strong {
        Ok(())
    } else {
        Err(AuthError::WeakPassword)
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Internal(e.to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("Username must be at least 5 characters")]
    InvalidUsername,
    #[error("Password must have 5+ characters with a letter, a digit and one of $ % * @")]
    WeakPassword,
    #[error("Admin access required")]
    Forbidden,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken(username) => AuthError::UsernameTaken(username),
            other => {
                tracing::error!("User store failure: {}", other);
                AuthError::Internal(other.to_string())
            }
        }
    }
}
