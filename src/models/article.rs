//! Article model
//!
//! Editorial content managed by administrators: columns and researcher
//! interviews. Public endpoints only ever see published rows; the admin
//! surface sees everything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Editorial article entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Content kind (column or interview)
    #[serde(rename = "type")]
    pub article_type: ArticleType,
    /// Article title
    pub title: String,
    /// Editorial category (slug or display name)
    pub category: String,
    /// Credited author, for columns
    pub author: Option<String>,
    /// Interviewed researcher, for interviews
    pub researcher: Option<String>,
    /// Researcher's affiliation
    pub affiliation: Option<String>,
    /// Short teaser shown in listings
    pub excerpt: Option<String>,
    /// Full body
    pub content: Option<String>,
    /// Featured image URL
    pub image: Option<String>,
    /// Publication state
    pub status: ArticleStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Check whether the article is visible on public endpoints
    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published
    }

    /// Text the read-time estimate is derived from: the body, falling back
    /// to the excerpt for stub articles.
    pub fn read_time_source(&self) -> &str {
        match self.content.as_deref() {
            Some(content) if !content.is_empty() => content,
            _ => self.excerpt.as_deref().unwrap_or(""),
        }
    }
}

/// Content kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleType {
    /// Editorial column
    Column,
    /// Researcher interview
    Interview,
}

impl fmt::Display for ArticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleType::Column => write!(f, "column"),
            ArticleType::Interview => write!(f, "interview"),
        }
    }
}

impl FromStr for ArticleType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "column" => Ok(ArticleType::Column),
            "interview" => Ok(ArticleType::Interview),
            _ => Err(anyhow::anyhow!("Invalid article type: {}", s)),
        }
    }
}

/// Publication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Only visible on the admin surface
    Draft,
    /// Publicly visible
    Published,
}

impl Default for ArticleStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleStatus::Draft => write!(f, "draft"),
            ArticleStatus::Published => write!(f, "published"),
        }
    }
}

impl FromStr for ArticleStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ArticleStatus::Draft),
            "published" => Ok(ArticleStatus::Published),
            _ => Err(anyhow::anyhow!("Invalid article status: {}", s)),
        }
    }
}

/// Input for creating an article
#[derive(Debug, Clone)]
pub struct CreateArticleInput {
    pub article_type: ArticleType,
    pub title: String,
    pub category: String,
    pub author: Option<String>,
    pub researcher: Option<String>,
    pub affiliation: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    /// Defaults to draft when absent
    pub status: Option<ArticleStatus>,
}

/// Input for updating an article; None fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub researcher: Option<String>,
    pub affiliation: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub status: Option<ArticleStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> Article {
        Article {
            id: 1,
            article_type: ArticleType::Column,
            title: "特許の基礎".to_string(),
            category: "patent-basics".to_string(),
            author: Some("編集部".to_string()),
            researcher: None,
            affiliation: None,
            excerpt: Some("概要".to_string()),
            content: Some("本文".to_string()),
            image: None,
            status: ArticleStatus::Published,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_published() {
        let mut article = sample_article();
        assert!(article.is_published());

        article.status = ArticleStatus::Draft;
        assert!(!article.is_published());
    }

    #[test]
    fn test_read_time_source_prefers_content() {
        let article = sample_article();
        assert_eq!(article.read_time_source(), "本文");
    }

    #[test]
    fn test_read_time_source_falls_back_to_excerpt() {
        let mut article = sample_article();
        article.content = None;
        assert_eq!(article.read_time_source(), "概要");

        article.content = Some(String::new());
        assert_eq!(article.read_time_source(), "概要");

        article.excerpt = None;
        assert_eq!(article.read_time_source(), "");
    }

    #[test]
    fn test_article_type_parsing() {
        assert_eq!(ArticleType::from_str("column").unwrap(), ArticleType::Column);
        assert_eq!(
            ArticleType::from_str("Interview").unwrap(),
            ArticleType::Interview
        );
        assert!(ArticleType::from_str("news").is_err());
    }

    #[test]
    fn test_type_serializes_as_type_key() {
        let article = sample_article();
        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("\"type\":\"column\""));
        assert!(!json.contains("article_type"));
    }

    #[test]
    fn test_status_default_is_draft() {
        assert_eq!(ArticleStatus::default(), ArticleStatus::Draft);
    }
}
