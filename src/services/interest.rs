//! Interest service
//!
//! Buyer-to-seller interest flows. The seller-facing received view is
//! assembled in two steps (owned listing ids, then interests against that
//! set) because legacy rows without an owner still belong to every
//! seller's dashboard, and a seller with no listings gets an empty list
//! rather than an error.

use crate::db::repositories::{InterestRepository, PatentRepository};
use crate::models::{
    CreateInterestInput, Interest, InterestStatus, InterestWithPatent, ListScope, PatentFilter,
    ReceivedInterest,
};
use crate::services::identity::Identity;
use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;

/// Error types for interest operations
#[derive(Debug, thiserror::Error)]
pub enum InterestServiceError {
    /// Target listing does not exist
    #[error("Patent not found")]
    NotFound,

    /// Caller does not own the listing
    #[error("Not allowed to view interests for this patent")]
    Forbidden,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Interest service for filing and reviewing interests
pub struct InterestService {
    interest_repo: Arc<dyn InterestRepository>,
    patent_repo: Arc<dyn PatentRepository>,
}

impl InterestService {
    /// Create a new interest service
    pub fn new(
        interest_repo: Arc<dyn InterestRepository>,
        patent_repo: Arc<dyn PatentRepository>,
    ) -> Self {
        Self {
            interest_repo,
            patent_repo,
        }
    }

    /// File an interest in a listing.
    ///
    /// The buyer's name and email are snapshotted onto the row so the
    /// seller view survives later account changes. Filing interest in
    /// one's own listing is allowed.
    pub async fn create(
        &self,
        input: &CreateInterestInput,
        buyer: &Identity,
    ) -> Result<Interest, InterestServiceError> {
        self.patent_repo
            .get_by_id(input.patent_id)
            .await
            .context("Failed to check patent")?
            .ok_or(InterestServiceError::NotFound)?;

        let interest = Interest {
            id: 0,
            patent_id: input.patent_id,
            buyer_id: buyer.id,
            buyer_name: Some(buyer.name.clone()),
            buyer_email: Some(buyer.email.clone()),
            message: input.message.clone(),
            status: InterestStatus::Pending,
            created_at: chrono::Utc::now(),
        };

        let created = self
            .interest_repo
            .create(&interest)
            .await
            .context("Failed to create interest")?;

        Ok(created)
    }

    /// Interests the caller has filed, newest first
    pub async fn list_mine(&self, buyer_id: i64) -> Result<Vec<Interest>, InterestServiceError> {
        let interests = self
            .interest_repo
            .list_by_buyer(buyer_id)
            .await
            .context("Failed to list interests")?;

        Ok(interests)
    }

    /// Interests the caller has filed, joined with listing details for the
    /// buyer dashboard
    pub async fn list_mine_with_patents(
        &self,
        buyer_id: i64,
    ) -> Result<Vec<InterestWithPatent>, InterestServiceError> {
        let interests = self
            .interest_repo
            .list_by_buyer_with_patents(buyer_id)
            .await
            .context("Failed to list interests with patents")?;

        Ok(interests)
    }

    /// Interests received against the caller's listings, normalized for
    /// the seller dashboard.
    ///
    /// Legacy ownerless listings count as the caller's. An owner with no
    /// listings gets an empty list.
    pub async fn list_received(
        &self,
        owner_id: i64,
    ) -> Result<Vec<ReceivedInterest>, InterestServiceError> {
        let owned = self
            .patent_repo
            .list(ListScope::Mine(owner_id), &PatentFilter::default())
            .await
            .context("Failed to list owned patents")?;

        if owned.is_empty() {
            return Ok(Vec::new());
        }

        let titles: HashMap<i64, String> =
            owned.iter().map(|p| (p.id, p.title.clone())).collect();
        let ids: Vec<i64> = owned.iter().map(|p| p.id).collect();

        let interests = self
            .interest_repo
            .list_by_patents(&ids)
            .await
            .context("Failed to list received interests")?;

        let received = interests
            .into_iter()
            .map(|interest| ReceivedInterest {
                id: interest.id,
                patent_id: interest.patent_id,
                patent_title: titles
                    .get(&interest.patent_id)
                    .filter(|t| !t.is_empty())
                    .cloned()
                    .unwrap_or_else(|| interest.patent_id.to_string()),
                user_name: interest.display_name(),
                message: interest.message.clone().unwrap_or_default(),
                created_at: interest.created_at,
            })
            .collect();

        Ok(received)
    }

    /// Interests against one listing, restricted to its owner
    pub async fn list_for_patent(
        &self,
        patent_id: i64,
        caller_id: i64,
    ) -> Result<Vec<Interest>, InterestServiceError> {
        let patent = self
            .patent_repo
            .get_by_id(patent_id)
            .await
            .context("Failed to get patent")?
            .ok_or(InterestServiceError::NotFound)?;

        if !patent.is_owned_by(caller_id) {
            return Err(InterestServiceError::Forbidden);
        }

        let interests = self
            .interest_repo
            .list_by_patent(patent_id)
            .await
            .context("Failed to list interests")?;

        Ok(interests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        PatentRepository, SqlxInterestRepository, SqlxPatentRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{CreatePatentInput, UserRole};
    use chrono::Utc;

    async fn setup() -> (DynDatabasePool, InterestService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = InterestService::new(
            SqlxInterestRepository::boxed(pool.clone()),
            SqlxPatentRepository::boxed(pool.clone()),
        );

        (pool, service)
    }

    fn identity(id: i64, email: &str, name: &str) -> Identity {
        Identity {
            id,
            email: email.to_string(),
            name: name.to_string(),
            role: UserRole::Buyer,
        }
    }

    async fn seed_user(pool: &DynDatabasePool, id: i64, email: &str, name: &str) {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, name, role, created_at) VALUES (?, ?, 'x', ?, 'buyer', ?)",
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(Utc::now())
        .execute(pool.as_sqlite().unwrap())
        .await
        .expect("Failed to seed user");
    }

    async fn seed_patent(pool: &DynDatabasePool, owner_id: i64, title: &str) -> i64 {
        let repo = SqlxPatentRepository::new(pool.clone());
        let input = CreatePatentInput {
            title: title.to_string(),
            description: None,
            problem: None,
            usage: None,
            advantage: None,
            category: None,
            patent_number: None,
            price: 0.0,
            image: None,
        };
        repo.create(&input, owner_id, "売り手")
            .await
            .expect("Failed to create patent")
            .id
    }

    async fn seed_legacy_patent(pool: &DynDatabasePool, title: &str) -> i64 {
        let result = sqlx::query(
            "INSERT INTO patents (title, price, status, approval_status, created_at) VALUES (?, 0, 'available', 'pending', ?)",
        )
        .bind(title)
        .bind(Utc::now())
        .execute(pool.as_sqlite().unwrap())
        .await
        .expect("Failed to seed legacy patent");
        result.last_insert_rowid()
    }

    #[tokio::test]
    async fn test_create_snapshots_buyer_identity() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, "seller@example.com", "売り手").await;
        seed_user(&pool, 2, "buyer@example.com", "買い手").await;
        let patent_id = seed_patent(&pool, 1, "耐熱コーティング").await;

        let created = service
            .create(
                &CreateInterestInput {
                    patent_id,
                    message: Some("詳細を教えてください".to_string()),
                },
                &identity(2, "buyer@example.com", "買い手"),
            )
            .await
            .expect("Failed to create interest");

        assert_eq!(created.buyer_id, 2);
        assert_eq!(created.buyer_name.as_deref(), Some("買い手"));
        assert_eq!(created.buyer_email.as_deref(), Some("buyer@example.com"));
        assert_eq!(created.status, InterestStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_missing_patent() {
        let (pool, service) = setup().await;
        seed_user(&pool, 2, "buyer@example.com", "買い手").await;

        let result = service
            .create(
                &CreateInterestInput {
                    patent_id: 999,
                    message: None,
                },
                &identity(2, "buyer@example.com", "買い手"),
            )
            .await;

        assert!(matches!(result, Err(InterestServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_own_patent_interest_is_allowed() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, "seller@example.com", "売り手").await;
        let patent_id = seed_patent(&pool, 1, "自分の特許").await;

        let created = service
            .create(
                &CreateInterestInput {
                    patent_id,
                    message: None,
                },
                &identity(1, "seller@example.com", "売り手"),
            )
            .await
            .expect("Should be allowed");

        assert_eq!(created.buyer_id, 1);
    }

    #[tokio::test]
    async fn test_received_covers_owned_and_legacy_rows() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, "seller@example.com", "売り手").await;
        seed_user(&pool, 2, "buyer@example.com", "買い手").await;
        seed_user(&pool, 3, "other@example.com", "別の売り手").await;

        let owned = seed_patent(&pool, 1, "自分の特許").await;
        let legacy = seed_legacy_patent(&pool, "引き継ぎ特許").await;
        let foreign = seed_patent(&pool, 3, "他人の特許").await;

        let buyer = identity(2, "buyer@example.com", "買い手");
        for (patent_id, message) in [(owned, "所有分"), (legacy, "レガシー分"), (foreign, "他人分")] {
            service
                .create(
                    &CreateInterestInput {
                        patent_id,
                        message: Some(message.to_string()),
                    },
                    &buyer,
                )
                .await
                .expect("Failed to create interest");
        }

        let received = service
            .list_received(1)
            .await
            .expect("Failed to list received");

        assert_eq!(received.len(), 2);
        let titles: Vec<&str> = received.iter().map(|r| r.patent_title.as_str()).collect();
        assert!(titles.contains(&"自分の特許"));
        assert!(titles.contains(&"引き継ぎ特許"));
        assert!(received.iter().all(|r| r.user_name == "買い手"));
    }

    #[tokio::test]
    async fn test_received_empty_without_listings() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, "seller@example.com", "売り手").await;

        let received = service
            .list_received(1)
            .await
            .expect("Failed to list received");
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn test_received_normalizes_missing_fields() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, "seller@example.com", "売り手").await;
        seed_user(&pool, 2, "buyer@example.com", "買い手").await;
        let patent_id = seed_patent(&pool, 1, "特許").await;

        // Row with no snapshot and no message, as legacy imports produced
        sqlx::query(
            "INSERT INTO interests (patent_id, buyer_id, status, created_at) VALUES (?, 2, 'pending', ?)",
        )
        .bind(patent_id)
        .bind(Utc::now())
        .execute(pool.as_sqlite().unwrap())
        .await
        .expect("Failed to seed interest");

        let received = service
            .list_received(1)
            .await
            .expect("Failed to list received");

        assert_eq!(received.len(), 1);
        assert_eq!(received[0].user_name, "購入者");
        assert_eq!(received[0].message, "");
    }

    #[tokio::test]
    async fn test_list_for_patent_owner_only() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, "seller@example.com", "売り手").await;
        seed_user(&pool, 2, "buyer@example.com", "買い手").await;
        let patent_id = seed_patent(&pool, 1, "特許").await;

        service
            .create(
                &CreateInterestInput {
                    patent_id,
                    message: Some("興味があります".to_string()),
                },
                &identity(2, "buyer@example.com", "買い手"),
            )
            .await
            .expect("Failed to create interest");

        assert!(matches!(
            service.list_for_patent(999, 1).await,
            Err(InterestServiceError::NotFound)
        ));
        assert!(matches!(
            service.list_for_patent(patent_id, 2).await,
            Err(InterestServiceError::Forbidden)
        ));

        let interests = service
            .list_for_patent(patent_id, 1)
            .await
            .expect("Failed to list");
        assert_eq!(interests.len(), 1);
    }

    #[tokio::test]
    async fn test_buyer_dashboard_join() {
        let (pool, service) = setup().await;
        seed_user(&pool, 1, "seller@example.com", "売り手").await;
        seed_user(&pool, 2, "buyer@example.com", "買い手").await;
        let patent_id = seed_patent(&pool, 1, "特許").await;

        let buyer = identity(2, "buyer@example.com", "買い手");
        service
            .create(
                &CreateInterestInput {
                    patent_id,
                    message: None,
                },
                &buyer,
            )
            .await
            .expect("Failed to create interest");

        let mine = service.list_mine(2).await.expect("Failed to list");
        assert_eq!(mine.len(), 1);

        let joined = service
            .list_mine_with_patents(2)
            .await
            .expect("Failed to list");
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].patent_title.as_deref(), Some("特許"));
    }
}
