//! Patent listing model
//!
//! A patent is a marketplace listing owned by exactly one user (owner_id is
//! nullable only for legacy rows imported before ownership existed). Listings
//! carry two independent state fields: `status` is the seller-facing
//! availability, `approval_status` is the admin review state that gates
//! public visibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Patent listing entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patent {
    /// Unique identifier
    pub id: i64,
    /// Listing title
    pub title: String,
    /// Short description
    pub description: Option<String>,
    /// Problem the invention addresses
    pub problem: Option<String>,
    /// Intended usage
    pub usage: Option<String>,
    /// Advantage over existing approaches
    pub advantage: Option<String>,
    /// Listing category (free-form, filtered by equality)
    pub category: Option<String>,
    /// Registered patent number
    pub patent_number: Option<String>,
    /// Asking price, non-negative
    pub price: f64,
    /// Seller-facing availability
    pub status: PatentStatus,
    /// Admin review state; gates public visibility
    pub approval_status: ApprovalStatus,
    /// Relative URL of the uploaded image, if any
    pub image: Option<String>,
    /// Owning user id; None only for legacy rows
    pub owner_id: Option<i64>,
    /// Owner display name captured at creation time
    pub owner_name: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Patent {
    /// Check whether the given user id owns this listing.
    ///
    /// Legacy rows without an owner belong to nobody; mutation on them is
    /// always refused.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner_id == Some(user_id)
    }

    /// Check whether the listing passed admin review
    pub fn is_approved(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved
    }
}

/// Seller-facing availability of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatentStatus {
    /// Open for interests
    Available,
    /// A deal is being negotiated
    Negotiation,
}

impl Default for PatentStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl fmt::Display for PatentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatentStatus::Available => write!(f, "available"),
            PatentStatus::Negotiation => write!(f, "negotiation"),
        }
    }
}

impl FromStr for PatentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(PatentStatus::Available),
            "negotiation" => Ok(PatentStatus::Negotiation),
            _ => Err(anyhow::anyhow!("Invalid patent status: {}", s)),
        }
    }
}

/// Admin review state of a listing.
///
/// New listings start pending. Approve and reject are unconditional admin
/// actions; repeating one is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Awaiting admin review
    Pending,
    /// Publicly visible
    Approved,
    /// Refused by an admin
    Rejected,
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "pending"),
            ApprovalStatus::Approved => write!(f, "approved"),
            ApprovalStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid approval status: {}", s)),
        }
    }
}

/// Listing scope for patent queries.
///
/// - Public: approved rows only, available without authentication
/// - Mine: the caller's rows plus legacy rows with no owner
/// - All: every row regardless of review state (authenticated)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Public,
    Mine(i64),
    All,
}

/// Store-level filters for patent listings.
///
/// `search` is applied in application code after the fetch, matching
/// case-insensitively against title, description and category. A category or
/// status value of "all" means no filter.
#[derive(Debug, Clone, Default)]
pub struct PatentFilter {
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl PatentFilter {
    /// Category filter normalized: None when absent or "all"
    pub fn category_filter(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| *c != "all" && !c.is_empty())
    }

    /// Status filter normalized: None when absent or "all"
    pub fn status_filter(&self) -> Option<&str> {
        self.status.as_deref().filter(|s| *s != "all" && !s.is_empty())
    }

    /// Check a row against the in-app search term
    pub fn matches_search(&self, patent: &Patent) -> bool {
        let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();
        let haystacks = [
            Some(patent.title.as_str()),
            patent.description.as_deref(),
            patent.category.as_deref(),
        ];
        haystacks
            .iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Input for creating a new listing
#[derive(Debug, Clone)]
pub struct CreatePatentInput {
    pub title: String,
    pub description: Option<String>,
    pub problem: Option<String>,
    pub usage: Option<String>,
    pub advantage: Option<String>,
    pub category: Option<String>,
    pub patent_number: Option<String>,
    /// Already coerced to a non-negative number
    pub price: f64,
    /// Relative URL of a stored image
    pub image: Option<String>,
}

/// Input for updating a listing; None fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdatePatentInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub problem: Option<String>,
    pub usage: Option<String>,
    pub advantage: Option<String>,
    pub category: Option<String>,
    pub patent_number: Option<String>,
    pub price: Option<f64>,
    pub status: Option<PatentStatus>,
}

/// Listing joined with owner account details, for admin review views.
///
/// `owner_name` on the embedded patent is overwritten with the resolved
/// display name: account name, falling back to account email, then a fixed
/// label for rows whose owning account is gone.
#[derive(Debug, Clone, Serialize)]
pub struct PatentWithOwner {
    #[serde(flatten)]
    pub patent: Patent,
    pub owner_email: Option<String>,
    pub owner_organization: Option<String>,
}
