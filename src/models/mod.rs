//! Data models
//!
//! This module contains all data structures used throughout the TechMatch
//! marketplace. Models represent:
//! - Database entities (User, Patent, Interest, Message, Article)
//! - API request/response types
//! - Internal data transfer objects

mod article;
mod interest;
mod message;
mod patent;
mod user;

pub use article::{Article, ArticleStatus, ArticleType, CreateArticleInput, UpdateArticleInput};
pub use interest::{
    CreateInterestInput, Interest, InterestStatus, InterestWithPatent, ReceivedInterest,
};
pub use message::{CreateMessageInput, Message};
pub use patent::{
    ApprovalStatus, CreatePatentInput, ListScope, Patent, PatentFilter, PatentStatus,
    PatentWithOwner, UpdatePatentInput,
};
pub use user::{CreateUserInput, User, UserRole};
