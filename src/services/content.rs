//! Content gateway
//!
//! Reads editorial posts from a WordPress source and projects them into the
//! shapes the public columns/interviews pages render. The remote source is
//! optional and unreliable, so every read runs a fixed fallback chain:
//! remote posts, then locally stored published articles, then built-in
//! sample entries. Listings always return something to render; upstream
//! failures are logged and never surfaced to the caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::cache::{CacheLayer, MemoryCache};
use crate::config::ContentConfig;
use crate::db::repositories::ArticleRepository;
use crate::models::{Article, ArticleType};
use crate::services::article::estimate_read_time;

/// Cache key for the resolved endpoint shape and category map
const CATEGORY_CACHE_KEY: &str = "wp:categories";

/// Byline used when the source does not credit anyone
const DEFAULT_BYLINE: &str = "編集部";

/// Content gateway errors
///
/// Listings cannot fail (the sample stage always answers); single-entry
/// lookups fail only when no stage has the requested id.
#[derive(Debug, Error)]
pub enum ContentServiceError {
    #[error("Content not found")]
    NotFound,
}

/// A column as rendered on the public site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: String,
    pub author: String,
    pub created_at: String,
    pub read_time: String,
    pub featured_image: Option<String>,
}

/// An interview as rendered on the public site
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewEntry {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: String,
    pub category_slug: String,
    pub interviewer: String,
    pub created_at: String,
    pub read_time: String,
    pub featured_image: Option<String>,
}

/// How the WordPress REST API is reached on a given site.
///
/// Sites with pretty permalinks answer under `/wp-json/`; sites with plain
/// permalinks only answer the `?rest_route=` form. The probe tries them in
/// this order and the winner is cached with the category map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum EndpointShape {
    WpJson,
    RestRoute,
}

impl EndpointShape {
    fn url(&self, base: &str, route: &str, query: &str) -> String {
        let base = base.trim_end_matches('/');
        match self {
            EndpointShape::WpJson => {
                if query.is_empty() {
                    format!("{}/wp-json/wp/v2/{}", base, route)
                } else {
                    format!("{}/wp-json/wp/v2/{}?{}", base, route, query)
                }
            }
            EndpointShape::RestRoute => {
                if query.is_empty() {
                    format!("{}/?rest_route=/wp/v2/{}", base, route)
                } else {
                    format!("{}/?rest_route=/wp/v2/{}&{}", base, route, query)
                }
            }
        }
    }
}

/// Cached result of the categories probe: the endpoint shape that answered
/// plus category ids keyed by both name and slug.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CategorySnapshot {
    shape: EndpointShape,
    ids: HashMap<String, i64>,
}

/// Remove HTML tags and collapse whitespace
pub fn strip_html(html: &str) -> String {
    static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("invalid tag pattern"));
    static SPACE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace pattern"));

    let without_tags = TAG.replace_all(html, "");
    SPACE.replace_all(&without_tags, " ").trim().to_string()
}

fn rendered_field(post: &Value, field: &str) -> String {
    post.get(field)
        .and_then(|v| v.get("rendered"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// First embedded term with taxonomy `category`
fn primary_category(post: &Value) -> Option<&Value> {
    post.get("_embedded")?
        .get("wp:term")?
        .get(0)?
        .as_array()?
        .iter()
        .find(|term| term.get("taxonomy").and_then(Value::as_str) == Some("category"))
}

fn embedded_author(post: &Value) -> Option<&str> {
    post.get("_embedded")?
        .get("author")?
        .get(0)?
        .get("name")?
        .as_str()
}

fn featured_image(post: &Value) -> Option<String> {
    post.get("_embedded")?
        .get("wp:featuredmedia")?
        .get(0)?
        .get("source_url")?
        .as_str()
        .map(str::to_string)
}

fn post_id(post: &Value) -> String {
    match post.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn post_date(post: &Value) -> String {
    post.get("date")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Project a WordPress post into a column entry
pub(crate) fn wp_post_to_column(post: &Value) -> ColumnEntry {
    let content_html = rendered_field(post, "content");
    ColumnEntry {
        id: post_id(post),
        title: strip_html(&rendered_field(post, "title")),
        description: strip_html(&rendered_field(post, "excerpt")),
        category: primary_category(post)
            .and_then(|c| c.get("slug"))
            .and_then(Value::as_str)
            .unwrap_or("all")
            .to_string(),
        author: embedded_author(post).unwrap_or(DEFAULT_BYLINE).to_string(),
        created_at: post_date(post),
        read_time: estimate_read_time(&strip_html(&content_html)),
        featured_image: featured_image(post),
        content: content_html,
    }
}

/// Project a WordPress post into an interview entry
pub(crate) fn wp_post_to_interview(post: &Value) -> InterviewEntry {
    let content_html = rendered_field(post, "content");
    let category = primary_category(post);
    InterviewEntry {
        id: post_id(post),
        title: strip_html(&rendered_field(post, "title")),
        description: strip_html(&rendered_field(post, "excerpt")),
        category: category
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        category_slug: category
            .and_then(|c| c.get("slug"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        interviewer: embedded_author(post).unwrap_or(DEFAULT_BYLINE).to_string(),
        created_at: post_date(post),
        read_time: estimate_read_time(&strip_html(&content_html)),
        featured_image: featured_image(post),
        content: content_html,
    }
}

/// Project a locally stored article into a column entry
fn article_to_column(article: &Article) -> ColumnEntry {
    ColumnEntry {
        id: article.id.to_string(),
        title: article.title.clone(),
        description: article.excerpt.clone().unwrap_or_default(),
        content: article.content.clone().unwrap_or_default(),
        category: if article.category.is_empty() {
            "all".to_string()
        } else {
            article.category.clone()
        },
        author: article
            .author
            .clone()
            .unwrap_or_else(|| DEFAULT_BYLINE.to_string()),
        created_at: article.created_at.to_rfc3339(),
        read_time: estimate_read_time(article.read_time_source()),
        featured_image: article.image.clone(),
    }
}

/// Project a locally stored article into an interview entry
fn article_to_interview(article: &Article) -> InterviewEntry {
    InterviewEntry {
        id: article.id.to_string(),
        title: article.title.clone(),
        description: article.excerpt.clone().unwrap_or_default(),
        content: article.content.clone().unwrap_or_default(),
        category: article.category.clone(),
        category_slug: article.category.clone(),
        interviewer: article
            .author
            .clone()
            .or_else(|| article.researcher.clone())
            .unwrap_or_else(|| DEFAULT_BYLINE.to_string()),
        created_at: article.created_at.to_rfc3339(),
        read_time: estimate_read_time(article.read_time_source()),
        featured_image: article.image.clone(),
    }
}

/// Built-in column entries shown when no other source answers
fn sample_columns() -> Vec<ColumnEntry> {
    vec![
        ColumnEntry {
            id: "sample-1".to_string(),
            title: "特許売買の基本の流れ".to_string(),
            description: "特許の譲渡を検討する前に押さえておきたい手続きの全体像を整理します。"
                .to_string(),
            content: "<p>特許権は譲渡できる財産権です。譲渡契約の締結後、特許庁への移転登録申請をもって権利が移転します。本コラムでは出品から成約までの基本的な流れを解説します。</p>".to_string(),
            category: "basics".to_string(),
            author: DEFAULT_BYLINE.to_string(),
            created_at: "2024-04-01T09:00:00".to_string(),
            read_time: "1分".to_string(),
            featured_image: None,
        },
        ColumnEntry {
            id: "sample-2".to_string(),
            title: "特許の価値はどう決まるか".to_string(),
            description: "収益性、残存期間、代替技術の有無。価格設定の考え方を紹介します。"
                .to_string(),
            content: "<p>特許の価格に定価はありません。実施による収益見込み、権利の残存期間、回避設計の難易度などを踏まえ、売り手と買い手の合意で決まります。</p>".to_string(),
            category: "valuation".to_string(),
            author: DEFAULT_BYLINE.to_string(),
            created_at: "2024-04-15T09:00:00".to_string(),
            read_time: "1分".to_string(),
            featured_image: None,
        },
        ColumnEntry {
            id: "sample-3".to_string(),
            title: "譲渡とライセンスの違い".to_string(),
            description: "権利を手放すか、使わせるか。二つの活用方法を比較します。".to_string(),
            content: "<p>特許の活用には権利そのものを移転する譲渡と、実施を許諾するライセンスがあります。まとまった対価を得たいなら譲渡、継続収入を望むならライセンスが向いています。</p>".to_string(),
            category: "contract".to_string(),
            author: DEFAULT_BYLINE.to_string(),
            created_at: "2024-05-01T09:00:00".to_string(),
            read_time: "1分".to_string(),
            featured_image: None,
        },
    ]
}

/// Built-in interview entries shown when no other source answers
fn sample_interviews() -> Vec<InterviewEntry> {
    vec![
        InterviewEntry {
            id: "sample-1".to_string(),
            title: "大学発の特許を市場へ".to_string(),
            description: "研究成果の社会実装に取り組む研究者に、技術移転の現場を聞きました。"
                .to_string(),
            content: "<p>大学の研究室で生まれた特許の多くは、出口を見つけられないまま眠っています。売買プラットフォームを通じて企業との接点が生まれたことで、実用化への道筋が見えてきました。</p>".to_string(),
            category: "研究者インタビュー".to_string(),
            category_slug: "interview".to_string(),
            interviewer: DEFAULT_BYLINE.to_string(),
            created_at: "2024-04-10T09:00:00".to_string(),
            read_time: "1分".to_string(),
            featured_image: None,
        },
        InterviewEntry {
            id: "sample-2".to_string(),
            title: "中小企業の知財戦略".to_string(),
            description: "限られた予算で知財をどう守り、どう活かすか。現場の工夫を聞きます。"
                .to_string(),
            content: "<p>自社で使わなくなった特許も、他社にとっては価値のある技術です。維持年金を払い続けるより、必要とする企業に譲渡する方が双方にとって合理的な場合があります。</p>".to_string(),
            category: "研究者インタビュー".to_string(),
            category_slug: "interview".to_string(),
            interviewer: DEFAULT_BYLINE.to_string(),
            created_at: "2024-05-10T09:00:00".to_string(),
            read_time: "1分".to_string(),
            featured_image: None,
        },
    ]
}

/// Reads columns and interviews through the remote-local-sample chain.
pub struct ContentService {
    article_repo: Arc<dyn ArticleRepository>,
    cache: MemoryCache,
    client: reqwest::Client,
    config: ContentConfig,
}

impl ContentService {
    pub fn new(article_repo: Arc<dyn ArticleRepository>, config: ContentConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("TechMatch-Content-Gateway")
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .context("Failed to build HTTP client for the WordPress source")?;
        let cache =
            MemoryCache::with_capacity_and_ttl(64, Duration::from_secs(config.cache_ttl_seconds));

        Ok(Self {
            article_repo,
            cache,
            client,
            config,
        })
    }

    /// List columns, optionally narrowed to one category slug
    pub async fn list_columns(&self, category: Option<&str>) -> Vec<ColumnEntry> {
        if self.remote_enabled() {
            match self.remote_columns().await {
                Ok(entries) if !entries.is_empty() => {
                    return filter_columns(entries, category);
                }
                Ok(_) => debug!("WordPress returned no columns, falling back to local articles"),
                Err(err) => warn!("WordPress columns unavailable: {:#}", err),
            }
        }

        match self.local_entries(ArticleType::Column, article_to_column).await {
            Some(entries) if !entries.is_empty() => filter_columns(entries, category),
            _ => filter_columns(sample_columns(), category),
        }
    }

    /// Fetch one column by id
    pub async fn get_column(&self, id: &str) -> Result<ColumnEntry, ContentServiceError> {
        if self.remote_enabled() {
            match self.remote_post(id).await {
                Ok(post) => return Ok(wp_post_to_column(&post)),
                Err(err) => warn!("WordPress column {} unavailable: {:#}", id, err),
            }
        }

        if let Some(article) = self.local_entry(id, ArticleType::Column).await {
            return Ok(article_to_column(&article));
        }

        sample_columns()
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or(ContentServiceError::NotFound)
    }

    /// List interviews
    pub async fn list_interviews(&self) -> Vec<InterviewEntry> {
        if self.remote_enabled() {
            match self.remote_interviews().await {
                Ok(entries) if !entries.is_empty() => return entries,
                Ok(_) => debug!("WordPress returned no interviews, falling back to local articles"),
                Err(err) => warn!("WordPress interviews unavailable: {:#}", err),
            }
        }

        match self
            .local_entries(ArticleType::Interview, article_to_interview)
            .await
        {
            Some(entries) if !entries.is_empty() => entries,
            _ => sample_interviews(),
        }
    }

    /// Fetch one interview by id
    pub async fn get_interview(&self, id: &str) -> Result<InterviewEntry, ContentServiceError> {
        if self.remote_enabled() {
            match self.remote_post(id).await {
                Ok(post) => return Ok(wp_post_to_interview(&post)),
                Err(err) => warn!("WordPress interview {} unavailable: {:#}", id, err),
            }
        }

        if let Some(article) = self.local_entry(id, ArticleType::Interview).await {
            return Ok(article_to_interview(&article));
        }

        sample_interviews()
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or(ContentServiceError::NotFound)
    }

    fn remote_enabled(&self) -> bool {
        !self.config.wordpress_url.trim().is_empty()
    }

    /// Local stage of the chain. Store errors are logged and treated as a
    /// missing stage so the chain can still answer.
    async fn local_entries<T>(
        &self,
        article_type: ArticleType,
        project: fn(&Article) -> T,
    ) -> Option<Vec<T>> {
        match self.article_repo.list_published(article_type).await {
            Ok(articles) => Some(articles.iter().map(project).collect()),
            Err(err) => {
                error!("Local article fallback failed: {:#}", err);
                None
            }
        }
    }

    async fn local_entry(&self, id: &str, article_type: ArticleType) -> Option<Article> {
        let article_id: i64 = id.parse().ok()?;
        match self.article_repo.get_by_id(article_id).await {
            Ok(Some(article))
                if article.is_published() && article.article_type == article_type =>
            {
                Some(article)
            }
            Ok(_) => None,
            Err(err) => {
                error!("Local article fallback failed: {:#}", err);
                None
            }
        }
    }

    async fn remote_columns(&self) -> Result<Vec<ColumnEntry>> {
        let posts = self.remote_posts(&self.config.column_category).await?;
        Ok(posts.iter().map(wp_post_to_column).collect())
    }

    async fn remote_interviews(&self) -> Result<Vec<InterviewEntry>> {
        let posts = self.remote_posts(&self.config.interview_category).await?;
        Ok(posts.iter().map(wp_post_to_interview).collect())
    }

    /// All posts in the named category, embedded terms and media included
    async fn remote_posts(&self, category: &str) -> Result<Vec<Value>> {
        let snapshot = self.category_snapshot().await?;
        let category_id = match snapshot.ids.get(category) {
            Some(id) => *id,
            None => anyhow::bail!("WordPress category '{}' not found", category),
        };

        let query = format!("categories={}&per_page=100&_embed", category_id);
        let url = snapshot
            .shape
            .url(&self.config.wordpress_url, "posts", &query);
        match self.fetch_json(&url).await? {
            Value::Array(posts) => Ok(posts),
            _ => anyhow::bail!("WordPress posts response is not an array"),
        }
    }

    /// One post by id, under whichever endpoint shape the probe resolved
    async fn remote_post(&self, id: &str) -> Result<Value> {
        let snapshot = self.category_snapshot().await?;
        let route = format!("posts/{}", id);
        let url = snapshot
            .shape
            .url(&self.config.wordpress_url, &route, "_embed");
        self.fetch_json(&url).await
    }

    /// Cached categories probe. A concurrent rebuild does duplicate work
    /// but both writers store the same snapshot.
    async fn category_snapshot(&self) -> Result<CategorySnapshot> {
        if let Some(snapshot) = self
            .cache
            .get::<CategorySnapshot>(CATEGORY_CACHE_KEY)
            .await?
        {
            return Ok(snapshot);
        }

        let snapshot = self.resolve_categories().await?;
        self.cache.set(CATEGORY_CACHE_KEY, &snapshot).await?;
        Ok(snapshot)
    }

    /// Probe the categories route under each endpoint shape in order and
    /// build the name/slug to id map from the first one that answers.
    async fn resolve_categories(&self) -> Result<CategorySnapshot> {
        let mut last_err = anyhow::anyhow!("WordPress source not configured");

        for shape in [EndpointShape::WpJson, EndpointShape::RestRoute] {
            let url = shape.url(&self.config.wordpress_url, "categories", "per_page=100");
            match self.fetch_json(&url).await {
                Ok(Value::Array(categories)) => {
                    let mut ids = HashMap::new();
                    for category in &categories {
                        let id = match category.get("id").and_then(Value::as_i64) {
                            Some(id) => id,
                            None => continue,
                        };
                        if let Some(name) = category.get("name").and_then(Value::as_str) {
                            ids.insert(name.to_string(), id);
                        }
                        if let Some(slug) = category.get("slug").and_then(Value::as_str) {
                            ids.insert(slug.to_string(), id);
                        }
                    }
                    debug!(
                        "Resolved {} WordPress categories via {:?}",
                        categories.len(),
                        shape
                    );
                    return Ok(CategorySnapshot { shape, ids });
                }
                Ok(_) => {
                    last_err = anyhow::anyhow!("Categories response from {} is not an array", url);
                }
                Err(err) => last_err = err,
            }
        }

        Err(last_err)
    }

    async fn fetch_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Request to {} returned an error status", url))?;

        response
            .json()
            .await
            .with_context(|| format!("Response from {} is not valid JSON", url))
    }
}

fn filter_columns(entries: Vec<ColumnEntry>, category: Option<&str>) -> Vec<ColumnEntry> {
    match category {
        Some(slug) if !slug.is_empty() && slug != "all" => entries
            .into_iter()
            .filter(|entry| entry.category == slug)
            .collect(),
        _ => entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxArticleRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{ArticleStatus, CreateArticleInput};
    use serde_json::json;

    async fn service_without_remote() -> (ContentService, Arc<dyn ArticleRepository>) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo: Arc<dyn ArticleRepository> = SqlxArticleRepository::boxed(pool);
        let service = ContentService::new(repo.clone(), ContentConfig::default())
            .expect("Failed to build content service");
        (service, repo)
    }

    fn published_column(title: &str, category: &str) -> CreateArticleInput {
        CreateArticleInput {
            article_type: ArticleType::Column,
            title: title.to_string(),
            category: category.to_string(),
            author: Some("山田太郎".to_string()),
            researcher: None,
            affiliation: None,
            excerpt: Some("概要です。".to_string()),
            content: Some("<p>本文です。</p>".to_string()),
            image: None,
            status: Some(ArticleStatus::Published),
        }
    }

    fn published_interview(title: &str) -> CreateArticleInput {
        CreateArticleInput {
            article_type: ArticleType::Interview,
            title: title.to_string(),
            category: "研究者インタビュー".to_string(),
            author: None,
            researcher: Some("佐藤花子".to_string()),
            affiliation: Some("東都大学".to_string()),
            excerpt: Some("インタビュー概要。".to_string()),
            content: Some("<p>お話を伺いました。</p>".to_string()),
            image: None,
            status: Some(ArticleStatus::Published),
        }
    }

    #[test]
    fn test_strip_html_removes_tags_and_collapses_whitespace() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_html("  a \n\t b  "), "a b");
        assert_eq!(strip_html("<br/><br/>"), "");
        assert_eq!(strip_html("特許の<em>価値</em>評価"), "特許の価値評価");
    }

    #[test]
    fn test_endpoint_shape_urls() {
        let base = "https://cms.example.jp/";
        assert_eq!(
            EndpointShape::WpJson.url(base, "categories", "per_page=100"),
            "https://cms.example.jp/wp-json/wp/v2/categories?per_page=100"
        );
        assert_eq!(
            EndpointShape::RestRoute.url(base, "categories", "per_page=100"),
            "https://cms.example.jp/?rest_route=/wp/v2/categories&per_page=100"
        );
        assert_eq!(
            EndpointShape::WpJson.url(base, "posts/12", "_embed"),
            "https://cms.example.jp/wp-json/wp/v2/posts/12?_embed"
        );
        assert_eq!(
            EndpointShape::RestRoute.url(base, "posts/12", ""),
            "https://cms.example.jp/?rest_route=/wp/v2/posts/12"
        );
    }

    #[test]
    fn test_wp_post_to_column_maps_embedded_fields() {
        let post = json!({
            "id": 42,
            "date": "2024-06-01T12:00:00",
            "title": {"rendered": "<b>紹介</b> 記事"},
            "excerpt": {"rendered": "<p>概要\nテキスト</p>"},
            "content": {"rendered": "<p>本文</p>"},
            "_embedded": {
                "wp:term": [[
                    {"taxonomy": "post_tag", "name": "tag", "slug": "tag"},
                    {"taxonomy": "category", "name": "技術コラム", "slug": "tech-column"}
                ]],
                "author": [{"name": "山田太郎"}],
                "wp:featuredmedia": [{"source_url": "https://cms.example.jp/a.jpg"}]
            }
        });

        let column = wp_post_to_column(&post);
        assert_eq!(column.id, "42");
        assert_eq!(column.title, "紹介 記事");
        assert_eq!(column.description, "概要 テキスト");
        assert_eq!(column.content, "<p>本文</p>");
        assert_eq!(column.category, "tech-column");
        assert_eq!(column.author, "山田太郎");
        assert_eq!(column.created_at, "2024-06-01T12:00:00");
        assert_eq!(column.read_time, "1分");
        assert_eq!(
            column.featured_image,
            Some("https://cms.example.jp/a.jpg".to_string())
        );
    }

    #[test]
    fn test_wp_post_to_column_defaults() {
        let post = json!({
            "id": 7,
            "title": {"rendered": "タイトル"},
            "excerpt": {"rendered": ""},
            "content": {"rendered": ""}
        });

        let column = wp_post_to_column(&post);
        assert_eq!(column.category, "all");
        assert_eq!(column.author, "編集部");
        assert_eq!(column.featured_image, None);
        assert_eq!(column.read_time, "1分");
    }

    #[test]
    fn test_wp_post_to_interview_uses_category_name_and_slug() {
        let post = json!({
            "id": 9,
            "date": "2024-06-02T08:30:00",
            "title": {"rendered": "研究者に聞く"},
            "excerpt": {"rendered": "<p>概要</p>"},
            "content": {"rendered": "<p>本文</p>"},
            "_embedded": {
                "wp:term": [[
                    {"taxonomy": "category", "name": "研究者インタビュー", "slug": "interview"}
                ]],
                "author": [{"name": "鈴木一郎"}]
            }
        });

        let interview = wp_post_to_interview(&post);
        assert_eq!(interview.id, "9");
        assert_eq!(interview.category, "研究者インタビュー");
        assert_eq!(interview.category_slug, "interview");
        assert_eq!(interview.interviewer, "鈴木一郎");
        assert_eq!(interview.featured_image, None);
    }

    #[tokio::test]
    async fn test_columns_fall_back_to_local_published_articles() {
        let (service, repo) = service_without_remote().await;
        let published = repo
            .create(&published_column("ローカル記事", "tech"))
            .await
            .unwrap();
        let mut draft = published_column("下書き記事", "tech");
        draft.status = Some(ArticleStatus::Draft);
        repo.create(&draft).await.unwrap();

        let columns = service.list_columns(None).await;
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].id, published.id.to_string());
        assert_eq!(columns[0].title, "ローカル記事");
        assert_eq!(columns[0].author, "山田太郎");
        assert_eq!(columns[0].read_time, "1分");
    }

    #[tokio::test]
    async fn test_columns_fall_back_to_samples_when_no_local_articles() {
        let (service, _repo) = service_without_remote().await;

        let columns = service.list_columns(None).await;
        assert!(!columns.is_empty());
        assert!(columns.iter().all(|c| c.id.starts_with("sample-")));
    }

    #[tokio::test]
    async fn test_columns_category_filter() {
        let (service, repo) = service_without_remote().await;
        repo.create(&published_column("AI記事", "ai")).await.unwrap();
        repo.create(&published_column("素材記事", "materials"))
            .await
            .unwrap();

        let ai_only = service.list_columns(Some("ai")).await;
        assert_eq!(ai_only.len(), 1);
        assert_eq!(ai_only[0].title, "AI記事");

        let all = service.list_columns(Some("all")).await;
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_get_column_local_then_sample_then_not_found() {
        let (service, repo) = service_without_remote().await;
        let article = repo
            .create(&published_column("単体記事", "tech"))
            .await
            .unwrap();

        let local = service.get_column(&article.id.to_string()).await.unwrap();
        assert_eq!(local.title, "単体記事");

        let sample = service.get_column("sample-1").await.unwrap();
        assert_eq!(sample.id, "sample-1");

        let missing = service.get_column("99999").await;
        assert!(matches!(missing, Err(ContentServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_get_column_ignores_drafts_and_wrong_type() {
        let (service, repo) = service_without_remote().await;
        let mut draft = published_column("下書き", "tech");
        draft.status = Some(ArticleStatus::Draft);
        let draft = repo.create(&draft).await.unwrap();
        let interview = repo.create(&published_interview("対談")).await.unwrap();

        let from_draft = service.get_column(&draft.id.to_string()).await;
        assert!(matches!(from_draft, Err(ContentServiceError::NotFound)));

        let from_interview = service.get_column(&interview.id.to_string()).await;
        assert!(matches!(from_interview, Err(ContentServiceError::NotFound)));
    }

    #[tokio::test]
    async fn test_interviews_fall_back_to_local_then_samples() {
        let (service, repo) = service_without_remote().await;

        let samples = service.list_interviews().await;
        assert!(samples.iter().all(|entry| entry.id.starts_with("sample-")));

        let stored = repo.create(&published_interview("現場の声")).await.unwrap();
        let interviews = service.list_interviews().await;
        assert_eq!(interviews.len(), 1);
        assert_eq!(interviews[0].id, stored.id.to_string());
        assert_eq!(interviews[0].interviewer, "佐藤花子");
        assert_eq!(interviews[0].category, "研究者インタビュー");
    }

    #[tokio::test]
    async fn test_get_interview_falls_back_to_sample() {
        let (service, _repo) = service_without_remote().await;

        let sample = service.get_interview("sample-2").await.unwrap();
        assert_eq!(sample.title, "中小企業の知財戦略");

        let missing = service.get_interview("does-not-exist").await;
        assert!(matches!(missing, Err(ContentServiceError::NotFound)));
    }
}
