//! Admin article API endpoints
//!
//! Handles HTTP requests for editorial article management:
//! - GET    /api/admin/articles?type - List articles (all statuses)
//! - GET    /api/admin/articles/{id} - Get one article
//! - POST   /api/admin/articles - Create an article
//! - PUT    /api/admin/articles/{id} - Update an article
//! - DELETE /api/admin/articles/{id} - Delete an article
//!
//! The public read side of articles is served by the content gateway
//! (`/api/columns`, `/api/interviews`); this surface is for editing.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Article, CreateArticleInput, UpdateArticleInput};
use crate::services::{estimate_read_time, ArticleServiceError};

/// Query parameters for listing articles
#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    /// Restrict to one kind: `column` or `interview`
    #[serde(rename = "type")]
    pub article_type: Option<String>,
}

/// Response for a single article
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub article_type: String,
    pub title: String,
    pub category: String,
    pub author: Option<String>,
    pub researcher: Option<String>,
    pub affiliation: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub status: String,
    pub read_time: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        let read_time = estimate_read_time(article.read_time_source());
        Self {
            id: article.id,
            article_type: article.article_type.to_string(),
            title: article.title,
            category: article.category,
            author: article.author,
            researcher: article.researcher,
            affiliation: article.affiliation,
            excerpt: article.excerpt,
            content: article.content,
            image: article.image,
            status: article.status.to_string(),
            read_time,
            created_at: article.created_at.to_rfc3339(),
            updated_at: article.updated_at.to_rfc3339(),
        }
    }
}

/// Listing projection: everything but the content body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummaryResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub article_type: String,
    pub title: String,
    pub category: String,
    pub author: Option<String>,
    pub researcher: Option<String>,
    pub affiliation: Option<String>,
    pub excerpt: Option<String>,
    pub image: Option<String>,
    pub status: String,
    pub read_time: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Article> for ArticleSummaryResponse {
    fn from(article: Article) -> Self {
        let read_time = estimate_read_time(article.read_time_source());
        Self {
            id: article.id,
            article_type: article.article_type.to_string(),
            title: article.title,
            category: article.category,
            author: article.author,
            researcher: article.researcher,
            affiliation: article.affiliation,
            excerpt: article.excerpt,
            image: article.image,
            status: article.status.to_string(),
            read_time,
            created_at: article.created_at.to_rfc3339(),
            updated_at: article.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for creating an article
#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    #[serde(rename = "type")]
    pub article_type: String,
    pub title: String,
    pub category: String,
    pub author: Option<String>,
    pub researcher: Option<String>,
    pub affiliation: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
}

/// Request body for updating an article. The kind is fixed at creation.
#[derive(Debug, Deserialize)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub researcher: Option<String>,
    pub affiliation: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub status: Option<String>,
}

/// Build the admin articles router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_articles))
        .route("/", post(create_article))
        .route("/{id}", get(get_article))
        .route("/{id}", put(update_article))
        .route("/{id}", delete(delete_article))
}

/// GET /api/admin/articles - List articles of every status, without bodies
async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListArticlesQuery>,
) -> Result<Json<Vec<ArticleSummaryResponse>>, ApiError> {
    let article_type = match query.article_type.as_deref() {
        Some(raw) => Some(
            raw.parse()
                .map_err(|_| ApiError::validation_error("無効な記事種別です"))?,
        ),
        None => None,
    };

    let articles = state
        .article_service
        .list_all(article_type)
        .await
        .map_err(map_article_error)?;

    Ok(Json(articles.into_iter().map(Into::into).collect()))
}

/// GET /api/admin/articles/{id} - Get one article regardless of status
async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state
        .article_service
        .get(id)
        .await
        .map_err(map_article_error)?;

    Ok(Json(article.into()))
}

/// POST /api/admin/articles - Create an article
async fn create_article(
    State(state): State<AppState>,
    Json(body): Json<CreateArticleRequest>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article_type = body
        .article_type
        .parse()
        .map_err(|_| ApiError::validation_error("無効な記事種別です"))?;
    let status = parse_status(body.status.as_deref())?;

    let input = CreateArticleInput {
        article_type,
        title: body.title,
        category: body.category,
        author: body.author,
        researcher: body.researcher,
        affiliation: body.affiliation,
        excerpt: body.excerpt,
        content: body.content,
        image: body.image,
        status,
    };

    let article = state
        .article_service
        .create(&input)
        .await
        .map_err(map_article_error)?;

    Ok(Json(article.into()))
}

/// PUT /api/admin/articles/{id} - Update an article
async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateArticleRequest>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let status = parse_status(body.status.as_deref())?;

    let input = UpdateArticleInput {
        title: body.title,
        category: body.category,
        author: body.author,
        researcher: body.researcher,
        affiliation: body.affiliation,
        excerpt: body.excerpt,
        content: body.content,
        image: body.image,
        status,
    };

    let article = state
        .article_service
        .update(id, &input)
        .await
        .map_err(map_article_error)?;

    Ok(Json(article.into()))
}

/// DELETE /api/admin/articles/{id} - Delete an article
async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .article_service
        .delete(id)
        .await
        .map_err(map_article_error)?;

    Ok(Json(serde_json::json!({ "message": "記事を削除しました" })))
}

fn parse_status(
    raw: Option<&str>,
) -> Result<Option<crate::models::ArticleStatus>, ApiError> {
    match raw {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ApiError::validation_error("無効なステータスです")),
        None => Ok(None),
    }
}

fn map_article_error(e: ArticleServiceError) -> ApiError {
    match e {
        ArticleServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        ArticleServiceError::NotFound => ApiError::not_found("記事が見つかりません"),
        ArticleServiceError::InternalError(err) => {
            tracing::error!("Article operation failed: {:#}", err);
            ApiError::store_failure("記事の処理に失敗しました")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArticleStatus, ArticleType};
    use chrono::Utc;

    #[test]
    fn test_article_response_includes_read_time() {
        let article = Article {
            id: 3,
            article_type: ArticleType::Column,
            title: "特許の基礎".to_string(),
            category: "basics".to_string(),
            author: Some("編集部".to_string()),
            researcher: None,
            affiliation: None,
            excerpt: None,
            content: Some("あ".repeat(700)),
            image: None,
            status: ArticleStatus::Published,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(ArticleResponse::from(article)).unwrap();
        assert_eq!(json["type"], "column");
        assert_eq!(json["readTime"], "2分");
        assert_eq!(json["status"], "published");
    }

    #[test]
    fn test_list_projection_omits_content_body() {
        let article = Article {
            id: 7,
            article_type: ArticleType::Interview,
            title: "研究室訪問".to_string(),
            category: "材料工学".to_string(),
            author: None,
            researcher: Some("山田教授".to_string()),
            affiliation: Some("工学部".to_string()),
            excerpt: Some("触媒研究の現場から".to_string()),
            content: Some("あ".repeat(700)),
            image: None,
            status: ArticleStatus::Draft,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(ArticleSummaryResponse::from(article)).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["readTime"], "2分");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["excerpt"], "触媒研究の現場から");
    }

    #[test]
    fn test_create_request_uses_type_key() {
        let body: CreateArticleRequest = serde_json::from_value(serde_json::json!({
            "type": "interview",
            "title": "研究者に聞く",
            "category": "材料工学"
        }))
        .unwrap();

        assert_eq!(body.article_type, "interview");
        assert!(body.status.is_none());
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(
            parse_status(Some("published")).unwrap(),
            Some(ArticleStatus::Published)
        );
        assert_eq!(parse_status(None).unwrap(), None);
        assert!(parse_status(Some("archived")).is_err());
    }
}
