//! Credential service
//!
//! Account registration, login, and the signed session token that carries
//! identity between requests. Passwords are stored as Argon2id hashes with
//! a random salt per password. Tokens are stateless: a base64url JSON
//! payload joined to a base64url HMAC-SHA256 signature over the encoded
//! payload, so logout is purely a cookie removal on the API side.

use crate::db::repositories::UserRepository;
use crate::models::{CreateUserInput, User, UserRole};
use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use data_encoding::BASE64URL_NOPAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Error types for credential operations
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email address already registered
    #[error("Email '{0}' is already registered")]
    DuplicateIdentity(String),

    /// Unknown email, wrong password, or a bad token. One variant for all
    /// three so responses never reveal which part failed.
    #[error("Invalid email or password")]
    InvalidCredential,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Claims carried inside a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    /// Expiry as a unix timestamp in seconds
    pub exp: i64,
}

impl TokenClaims {
    /// Build claims for a user with the given lifetime
    pub fn for_user(user: &User, ttl_days: u64) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            exp: (Utc::now() + Duration::days(ttl_days as i64)).timestamp(),
        }
    }
}

/// Hash a password using Argon2id with secure defaults.
///
/// Returns the hash in PHC string format (algorithm, parameters, salt,
/// and hash in one string).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored PHC-format hash.
///
/// Returns `Ok(false)` for a wrong password; an error only when the stored
/// hash itself cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e)),
    }
}

/// Sign claims into a `payload.signature` token string
pub fn issue_token(claims: &TokenClaims, secret: &str) -> Result<String> {
    let payload = serde_json::to_vec(claims).context("Failed to serialize token claims")?;
    let payload_b64 = BASE64URL_NOPAD.encode(&payload);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid token secret: {}", e))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!(
        "{}.{}",
        payload_b64,
        BASE64URL_NOPAD.encode(&signature)
    ))
}

/// Verify a token's signature and expiry, returning its claims.
///
/// Any malformed, tampered, or expired token maps to `InvalidCredential`.
pub fn verify_token(token: &str, secret: &str) -> Result<TokenClaims, CredentialError> {
    let (payload_b64, signature_b64) = token
        .split_once('.')
        .ok_or(CredentialError::InvalidCredential)?;

    let signature = BASE64URL_NOPAD
        .decode(signature_b64.as_bytes())
        .map_err(|_| CredentialError::InvalidCredential)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid token secret: {}", e))?;
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| CredentialError::InvalidCredential)?;

    let payload = BASE64URL_NOPAD
        .decode(payload_b64.as_bytes())
        .map_err(|_| CredentialError::InvalidCredential)?;
    let claims: TokenClaims =
        serde_json::from_slice(&payload).map_err(|_| CredentialError::InvalidCredential)?;

    if claims.exp < Utc::now().timestamp() {
        return Err(CredentialError::InvalidCredential);
    }

    Ok(claims)
}

/// Credential service for registration and login
pub struct CredentialService {
    user_repo: Arc<dyn UserRepository>,
    token_secret: String,
    token_ttl_days: u64,
}

impl CredentialService {
    /// Create a new credential service
    pub fn new(user_repo: Arc<dyn UserRepository>, token_secret: String, token_ttl_days: u64) -> Self {
        Self {
            user_repo,
            token_secret,
            token_ttl_days,
        }
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// - `ValidationError` if email, password, or name is missing
    /// - `DuplicateIdentity` if the email is already registered
    /// - `InternalError` for database errors
    pub async fn register(&self, input: CreateUserInput) -> Result<User, CredentialError> {
        validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(CredentialError::DuplicateIdentity(input.email));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = User::new(
            input.email,
            password_hash,
            input.name,
            input.role.unwrap_or_default(),
            input.organization,
        );

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        Ok(created)
    }

    /// Authenticate an account and issue a session token
    ///
    /// # Errors
    ///
    /// - `InvalidCredential` if the email is unknown or the password is wrong
    /// - `InternalError` for database errors
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, String), CredentialError> {
        let user = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to get user by email")?
            .ok_or(CredentialError::InvalidCredential)?;

        let password_valid = verify_password(password, &user.password_hash)
            .context("Failed to verify password")?;

        if !password_valid {
            return Err(CredentialError::InvalidCredential);
        }

        let claims = TokenClaims::for_user(&user, self.token_ttl_days);
        let token = issue_token(&claims, &self.token_secret)?;

        Ok((user, token))
    }

    /// Fetch the full user row behind an identity, for the profile
    /// projection
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, CredentialError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by id")?;
        Ok(user)
    }
}

fn validate_register_input(input: &CreateUserInput) -> Result<(), CredentialError> {
    if input.email.trim().is_empty() {
        return Err(CredentialError::ValidationError(
            "Email cannot be empty".to_string(),
        ));
    }

    if !input.email.contains('@') {
        return Err(CredentialError::ValidationError(
            "Invalid email format".to_string(),
        ));
    }

    if input.password.is_empty() {
        return Err(CredentialError::ValidationError(
            "Password cannot be empty".to_string(),
        ));
    }

    if input.name.trim().is_empty() {
        return Err(CredentialError::ValidationError(
            "Name cannot be empty".to_string(),
        ));
    }

    Ok(())
}
