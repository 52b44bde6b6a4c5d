//! Patent lifecycle service
//!
//! Business logic for marketplace listings: scoped queries, ownership-gated
//! mutation, and the admin review workflow. Visibility rules live here and
//! in the repository scope, not in the handlers: public callers only ever
//! see approved rows, owners see their own rows plus legacy ownerless ones,
//! admins see everything.

use crate::db::repositories::PatentRepository;
use crate::models::{
    ApprovalStatus, CreatePatentInput, ListScope, Patent, PatentFilter, PatentWithOwner,
    UpdatePatentInput,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Error types for patent operations
#[derive(Debug, thiserror::Error)]
pub enum PatentServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Listing does not exist
    #[error("Patent not found")]
    NotFound,

    /// Caller does not own the listing
    #[error("Not allowed to modify this patent")]
    Forbidden,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Coerce a raw price string into a non-negative finite number.
///
/// Absent, unparseable, non-finite, and negative values all collapse to 0.
pub fn parse_price(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite() && *p >= 0.0)
        .unwrap_or(0.0)
}

/// Patent service for listing lifecycle and admin review
pub struct PatentService {
    patent_repo: Arc<dyn PatentRepository>,
    upload_dir: PathBuf,
}

impl PatentService {
    /// Create a new patent service. `upload_dir` is where stored images
    /// live, for cleanup on delete.
    pub fn new(patent_repo: Arc<dyn PatentRepository>, upload_dir: PathBuf) -> Self {
        Self {
            patent_repo,
            upload_dir,
        }
    }

    /// List listings in the given scope.
    ///
    /// Category and status are filtered at the store; the search term is a
    /// case-insensitive substring match over title, description and
    /// category applied here after the fetch.
    pub async fn list(
        &self,
        scope: ListScope,
        filter: &PatentFilter,
    ) -> Result<Vec<Patent>, PatentServiceError> {
        let mut patents = self
            .patent_repo
            .list(scope, filter)
            .await
            .context("Failed to list patents")?;

        patents.retain(|p| filter.matches_search(p));

        Ok(patents)
    }

    /// Fetch one listing. Visible regardless of review state.
    pub async fn get(&self, id: i64) -> Result<Patent, PatentServiceError> {
        self.patent_repo
            .get_by_id(id)
            .await
            .context("Failed to get patent")?
            .ok_or(PatentServiceError::NotFound)
    }

    /// Create a listing for the caller. New listings always start
    /// available and pending review.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the title is empty
    pub async fn create(
        &self,
        input: &CreatePatentInput,
        owner_id: i64,
        owner_name: &str,
    ) -> Result<Patent, PatentServiceError> {
        if input.title.trim().is_empty() {
            return Err(PatentServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }

        let patent = self
            .patent_repo
            .create(input, owner_id, owner_name)
            .await
            .context("Failed to create patent")?;

        Ok(patent)
    }

    /// Update a listing's seller-editable fields.
    ///
    /// The review state and stored image are never touched here; approval
    /// only moves through `approve`/`reject` and the image only at create.
    pub async fn update(
        &self,
        id: i64,
        input: &UpdatePatentInput,
        caller_id: i64,
    ) -> Result<Patent, PatentServiceError> {
        let mut patent = self.get(id).await?;
        if !patent.is_owned_by(caller_id) {
            return Err(PatentServiceError::Forbidden);
        }

        if let Some(title) = &input.title {
            patent.title = title.clone();
        }
        if input.description.is_some() {
            patent.description = input.description.clone();
        }
        if input.problem.is_some() {
            patent.problem = input.problem.clone();
        }
        if input.usage.is_some() {
            patent.usage = input.usage.clone();
        }
        if input.advantage.is_some() {
            patent.advantage = input.advantage.clone();
        }
        if input.category.is_some() {
            patent.category = input.category.clone();
        }
        if input.patent_number.is_some() {
            patent.patent_number = input.patent_number.clone();
        }
        if let Some(price) = input.price {
            patent.price = price;
        }
        if let Some(status) = input.status {
            patent.status = status;
        }

        let updated = self
            .patent_repo
            .update(&patent)
            .await
            .context("Failed to update patent")?;

        Ok(updated)
    }

    /// Delete a listing and best-effort remove its stored image.
    ///
    /// The row goes first; a failure to remove the file is logged and
    /// swallowed so the request still succeeds.
    pub async fn delete(&self, id: i64, caller_id: i64) -> Result<(), PatentServiceError> {
        let patent = self.get(id).await?;
        if !patent.is_owned_by(caller_id) {
            return Err(PatentServiceError::Forbidden);
        }

        self.patent_repo
            .delete(id)
            .await
            .context("Failed to delete patent")?;

        if let Some(image) = &patent.image {
            if let Some(path) = self.image_path(image) {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!("Failed to remove image {}: {}", path.display(), e);
                }
            }
        }

        Ok(())
    }

    /// Approve a pending listing. Unconditional and idempotent: approving
    /// an already-approved or missing id is not an error.
    pub async fn approve(&self, id: i64) -> Result<(), PatentServiceError> {
        let affected = self
            .patent_repo
            .set_approval(id, ApprovalStatus::Approved)
            .await
            .context("Failed to approve patent")?;

        if affected == 0 {
            warn!("Approve touched no rows for patent {}", id);
        }

        Ok(())
    }

    /// Reject a pending listing. Same semantics as `approve`.
    pub async fn reject(&self, id: i64) -> Result<(), PatentServiceError> {
        let affected = self
            .patent_repo
            .set_approval(id, ApprovalStatus::Rejected)
            .await
            .context("Failed to reject patent")?;

        if affected == 0 {
            warn!("Reject touched no rows for patent {}", id);
        }

        Ok(())
    }

    /// Pending listings with owner contact details, for the review queue
    pub async fn list_pending_for_admin(&self) -> Result<Vec<PatentWithOwner>, PatentServiceError> {
        let patents = self
            .patent_repo
            .list_with_owner(Some(ApprovalStatus::Pending))
            .await
            .context("Failed to list pending patents")?;

        Ok(patents)
    }

    /// Every listing with owner contact details, for the admin overview
    pub async fn list_all_for_admin(&self) -> Result<Vec<PatentWithOwner>, PatentServiceError> {
        let patents = self
            .patent_repo
            .list_with_owner(None)
            .await
            .context("Failed to list patents for admin")?;

        Ok(patents)
    }

    /// Listings strictly owned by the caller, without the legacy
    /// null-owner allowance
    pub async fn list_owned(&self, owner_id: i64) -> Result<Vec<Patent>, PatentServiceError> {
        let patents = self
            .patent_repo
            .list_owned(owner_id)
            .await
            .context("Failed to list owned patents")?;

        Ok(patents)
    }

    /// Map a stored `/uploads/{name}` value onto the upload directory.
    ///
    /// Only the final filename component is used, so a crafted image value
    /// cannot point outside the directory.
    fn image_path(&self, image: &str) -> Option<PathBuf> {
        let name = image.strip_prefix("/uploads/")?;
        let name = Path::new(name).file_name()?;
        Some(self.upload_dir.join(name))
    }
}
