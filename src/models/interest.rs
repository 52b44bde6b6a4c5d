//! Interest model
//!
//! An interest is a directed relation from a buyer to a patent listing,
//! carrying a free-form message. Buyer name and email are denormalized onto
//! the row at creation time so received-interest views survive account
//! renames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Expression of interest in a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interest {
    /// Unique identifier
    pub id: i64,
    /// Target listing
    pub patent_id: i64,
    /// Buyer account id
    pub buyer_id: i64,
    /// Buyer display name at creation time
    pub buyer_name: Option<String>,
    /// Buyer email at creation time
    pub buyer_email: Option<String>,
    /// Message to the seller
    pub message: Option<String>,
    /// Seller-side handling state
    pub status: InterestStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Interest {
    /// Display name for seller-facing views: stored name, then email, then a
    /// generic label.
    pub fn display_name(&self) -> String {
        self.buyer_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| self.buyer_email.clone().filter(|e| !e.is_empty()))
            .unwrap_or_else(|| "購入者".to_string())
    }
}

/// Seller-side handling state of an interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestStatus {
    /// Not yet handled
    Pending,
    /// Seller accepted
    Accepted,
    /// Seller declined
    Rejected,
}

impl Default for InterestStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for InterestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterestStatus::Pending => write!(f, "pending"),
            InterestStatus::Accepted => write!(f, "accepted"),
            InterestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for InterestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(InterestStatus::Pending),
            "accepted" => Ok(InterestStatus::Accepted),
            "rejected" => Ok(InterestStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid interest status: {}", s)),
        }
    }
}

/// Input for filing an interest
#[derive(Debug, Clone)]
pub struct CreateInterestInput {
    pub patent_id: i64,
    pub message: Option<String>,
}

/// Received-interest projection for the seller dashboard.
///
/// Normalized keys match what the dashboard renders directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedInterest {
    pub id: i64,
    pub patent_id: i64,
    pub patent_title: String,
    pub user_name: String,
    /// Coerced to an empty string when the buyer left no message
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Interest joined with listing details, for the buyer dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct InterestWithPatent {
    #[serde(flatten)]
    pub interest: Interest,
    pub patent_title: Option<String>,
    pub patent_category: Option<String>,
    pub patent_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_interest() -> Interest {
        Interest {
            id: 1,
            patent_id: 10,
            buyer_id: 5,
            buyer_name: Some("Buyer".to_string()),
            buyer_email: Some("buyer@example.com".to_string()),
            message: Some("want to license".to_string()),
            status: InterestStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_name() {
        let interest = sample_interest();
        assert_eq!(interest.display_name(), "Buyer");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut interest = sample_interest();
        interest.buyer_name = None;
        assert_eq!(interest.display_name(), "buyer@example.com");

        interest.buyer_name = Some(String::new());
        assert_eq!(interest.display_name(), "buyer@example.com");
    }

    #[test]
    fn test_display_name_generic_label() {
        let mut interest = sample_interest();
        interest.buyer_name = None;
        interest.buyer_email = None;
        assert_eq!(interest.display_name(), "購入者");
    }

    #[test]
    fn test_interest_status_parsing() {
        assert_eq!(
            InterestStatus::from_str("accepted").unwrap(),
            InterestStatus::Accepted
        );
        assert!(InterestStatus::from_str("unknown").is_err());
        assert_eq!(InterestStatus::default(), InterestStatus::Pending);
    }

    #[test]
    fn test_received_interest_camel_case_keys() {
        let entry = ReceivedInterest {
            id: 1,
            patent_id: 10,
            patent_title: "Listing".to_string(),
            user_name: "Buyer".to_string(),
            message: String::new(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("patentId"));
        assert!(json.contains("patentTitle"));
        assert!(json.contains("userName"));
        assert!(json.contains("createdAt"));
    }
}
