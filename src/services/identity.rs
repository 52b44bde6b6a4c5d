//! Identity resolution
//!
//! Turns an inbound credential (the `token` cookie value) into an
//! authenticated identity. The provider is chosen once at startup: the
//! token-backed one for normal operation, or a fixed development identity
//! when the auth bypass flag is set. Config loading refuses the bypass in
//! production, so the fixed provider can never reach a real deployment.

use crate::config::AuthConfig;
use crate::models::UserRole;
use crate::services::credential::verify_token;
use serde::Serialize;
use std::sync::Arc;

/// Authenticated identity attached to a request
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

impl Identity {
    /// Check if the identity carries the admin role
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Error types for identity resolution
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    /// No credential was presented
    #[error("Authentication required")]
    Unauthenticated,

    /// A credential was presented but failed verification
    #[error("Invalid or expired session")]
    InvalidCredential,
}

/// Resolves a request credential into an identity
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, token: Option<&str>) -> Result<Identity, IdentityError>;
}

/// Verifies the signed session token
pub struct TokenIdentityProvider {
    secret: String,
}

impl TokenIdentityProvider {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

impl IdentityProvider for TokenIdentityProvider {
    fn resolve(&self, token: Option<&str>) -> Result<Identity, IdentityError> {
        let token = token.ok_or(IdentityError::Unauthenticated)?;
        let claims =
            verify_token(token, &self.secret).map_err(|_| IdentityError::InvalidCredential)?;

        Ok(Identity {
            id: claims.id,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        })
    }
}

/// Injects a fixed development admin identity without verifying anything
pub struct FixedIdentityProvider;

impl IdentityProvider for FixedIdentityProvider {
    fn resolve(&self, _token: Option<&str>) -> Result<Identity, IdentityError> {
        Ok(Identity {
            id: 0,
            email: "dev@local".to_string(),
            name: "Dev".to_string(),
            role: UserRole::Admin,
        })
    }
}

/// Select the identity provider for the configured auth mode
pub fn provider_from_config(auth: &AuthConfig) -> Arc<dyn IdentityProvider> {
    if auth.bypass {
        Arc::new(FixedIdentityProvider)
    } else {
        Arc::new(TokenIdentityProvider::new(auth.token_secret.clone()))
    }
}
