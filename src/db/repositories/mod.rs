//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod article;
pub mod interest;
pub mod message;
pub mod patent;
pub mod user;

pub use article::{ArticleRepository, SqlxArticleRepository};
pub use interest::{InterestRepository, SqlxInterestRepository};
pub use message::{MessageRepository, SqlxMessageRepository};
pub use patent::{PatentRepository, SqlxPatentRepository};
pub use user::{SqlxUserRepository, UserRepository};
