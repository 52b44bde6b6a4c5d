//! User model
//!
//! This module defines the User entity and related types for the TechMatch
//! marketplace. A user is a buyer, a seller, or an administrator; the role
//! travels inside the session token and drives ownership checks elsewhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name
    pub name: String,
    /// Marketplace role
    pub role: UserRole,
    /// Company or institution, free text
    pub organization: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// Note: The password should already be hashed before calling this
    /// function. Use `services::credential::hash_password()` to hash it.
    pub fn new(
        email: String,
        password_hash: String,
        name: String,
        role: UserRole,
        organization: Option<String>,
    ) -> Self {
        Self {
            id: 0, // Will be set by the database
            email,
            password_hash,
            name,
            role,
            organization,
            created_at: Utc::now(),
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Marketplace role.
///
/// - Buyer: browses listings and files interests
/// - Seller: owns patent listings
/// - Admin: reviews pending listings and edits articles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Buyer - files interests on listings
    Buyer,
    /// Seller - owns listings
    Seller,
    /// Administrator - approval workflow and article management
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Buyer
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Buyer => write!(f, "buyer"),
            UserRole::Seller => write!(f, "seller"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buyer" => Ok(UserRole::Buyer),
            "seller" => Ok(UserRole::Seller),
            "admin" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Email address
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    /// Display name
    pub name: String,
    /// Marketplace role (optional, defaults to Buyer)
    pub role: Option<UserRole>,
    /// Company or institution
    pub organization: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "test@example.com".to_string(),
            "hashed_password".to_string(),
            "Test User".to_string(),
            UserRole::Seller,
            Some("Acme Labs".to_string()),
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.name, "Test User");
        assert_eq!(user.role, UserRole::Seller);
        assert_eq!(user.organization.as_deref(), Some("Acme Labs"));
    }

    #[test]
    fn test_user_is_admin() {
        let admin = User::new(
            "admin@test.com".to_string(),
            "hash".to_string(),
            "Admin".to_string(),
            UserRole::Admin,
            None,
        );
        let buyer = User::new(
            "buyer@test.com".to_string(),
            "hash".to_string(),
            "Buyer".to_string(),
            UserRole::Buyer,
            None,
        );

        assert!(admin.is_admin());
        assert!(!buyer.is_admin());
    }

    #[test]
    fn test_user_role_display() {
        assert_eq!(UserRole::Buyer.to_string(), "buyer");
        assert_eq!(UserRole::Seller.to_string(), "seller");
        assert_eq!(UserRole::Admin.to_string(), "admin");
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from_str("buyer").unwrap(), UserRole::Buyer);
        assert_eq!(UserRole::from_str("SELLER").unwrap(), UserRole::Seller);
        assert_eq!(UserRole::from_str("Admin").unwrap(), UserRole::Admin);
        assert!(UserRole::from_str("editor").is_err());
    }

    #[test]
    fn test_user_role_default() {
        assert_eq!(UserRole::default(), UserRole::Buyer);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new(
            "secret@test.com".to_string(),
            "supersecret-hash".to_string(),
            "Secret".to_string(),
            UserRole::Buyer,
            None,
        );

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("supersecret-hash"));
        assert!(!json.contains("password_hash"));
    }
}
