//! Article service
//!
//! Editorial articles behind the admin surface and the public column and
//! interview pages. Public reads only ever see published rows of the
//! requested kind; the admin surface sees everything and any admin-surface
//! caller may edit any article.

use crate::db::repositories::ArticleRepository;
use crate::models::{Article, ArticleType, CreateArticleInput, UpdateArticleInput};
use anyhow::Context;
use std::sync::Arc;

/// Error types for article operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Article does not exist (or is not visible to the caller)
    #[error("Article not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Estimate reading time from body text.
///
/// Counts non-whitespace characters at 350 per minute, rounded, with a
/// floor of one minute, rendered as `{n}分`.
pub fn estimate_read_time(text: &str) -> String {
    let chars = text.chars().filter(|c| !c.is_whitespace()).count();
    let minutes = ((chars as f64 / 350.0).round() as i64).max(1);
    format!("{}分", minutes)
}

/// Article service
pub struct ArticleService {
    article_repo: Arc<dyn ArticleRepository>,
}

impl ArticleService {
    /// Create a new article service
    pub fn new(article_repo: Arc<dyn ArticleRepository>) -> Self {
        Self { article_repo }
    }

    /// Published articles of one kind, for the public pages
    pub async fn list_published(
        &self,
        article_type: ArticleType,
    ) -> Result<Vec<Article>, ArticleServiceError> {
        let articles = self
            .article_repo
            .list_published(article_type)
            .await
            .context("Failed to list published articles")?;

        Ok(articles)
    }

    /// One published article of one kind.
    ///
    /// Missing, unpublished, and wrong-kind rows are indistinguishable to
    /// the public caller; all map to `NotFound`.
    pub async fn get_published(
        &self,
        id: i64,
        article_type: ArticleType,
    ) -> Result<Article, ArticleServiceError> {
        let article = self
            .article_repo
            .get_by_id(id)
            .await
            .context("Failed to get article")?
            .ok_or(ArticleServiceError::NotFound)?;

        if !article.is_published() || article.article_type != article_type {
            return Err(ArticleServiceError::NotFound);
        }

        Ok(article)
    }

    /// Every article regardless of status, optionally restricted to one
    /// kind, for the admin surface
    pub async fn list_all(
        &self,
        article_type: Option<ArticleType>,
    ) -> Result<Vec<Article>, ArticleServiceError> {
        let articles = self
            .article_repo
            .list(article_type)
            .await
            .context("Failed to list articles")?;

        Ok(articles)
    }

    /// One article regardless of status, for the admin surface
    pub async fn get(&self, id: i64) -> Result<Article, ArticleServiceError> {
        self.article_repo
            .get_by_id(id)
            .await
            .context("Failed to get article")?
            .ok_or(ArticleServiceError::NotFound)
    }

    /// Create an article
    ///
    /// # Errors
    ///
    /// - `ValidationError` if title or category is empty
    pub async fn create(&self, input: &CreateArticleInput) -> Result<Article, ArticleServiceError> {
        if input.title.trim().is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if input.category.trim().is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "Category cannot be empty".to_string(),
            ));
        }

        let article = self
            .article_repo
            .create(input)
            .await
            .context("Failed to create article")?;

        Ok(article)
    }

    /// Update an article
    pub async fn update(
        &self,
        id: i64,
        input: &UpdateArticleInput,
    ) -> Result<Article, ArticleServiceError> {
        self.get(id).await?;

        let updated = self
            .article_repo
            .update(id, input)
            .await
            .context("Failed to update article")?;

        Ok(updated)
    }

    /// Delete an article
    pub async fn delete(&self, id: i64) -> Result<(), ArticleServiceError> {
        self.get(id).await?;

        self.article_repo
            .delete(id)
            .await
            .context("Failed to delete article")?;

        Ok(())
    }
}
