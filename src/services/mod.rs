//! Services layer - Business logic
//!
//! This module contains the business logic of the TechMatch marketplace.
//! Services are responsible for:
//! - Enforcing ownership and role rules
//! - Coordinating repositories, uploads and the remote content source
//! - Handling validation and error cases

pub mod article;
pub mod content;
pub mod credential;
pub mod identity;
pub mod interest;
pub mod message;
pub mod patent;

pub use article::{estimate_read_time, ArticleService, ArticleServiceError};
pub use content::{ColumnEntry, ContentService, ContentServiceError, InterviewEntry};
pub use credential::{
    hash_password, verify_password, CredentialError, CredentialService, TokenClaims,
};
pub use identity::{
    provider_from_config, FixedIdentityProvider, Identity, IdentityError, IdentityProvider,
    TokenIdentityProvider,
};
pub use interest::{InterestService, InterestServiceError};
pub use message::{MessageService, MessageServiceError};
pub use patent::{parse_price, PatentService, PatentServiceError};
