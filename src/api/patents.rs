//! Patent listing API endpoints
//!
//! Handles HTTP requests for the listing lifecycle:
//! - GET    /api/patents - List listings (public/mine/all scope)
//! - GET    /api/patents/{id} - Get one listing
//! - POST   /api/patents - Create a listing (multipart, optional image)
//! - PUT    /api/patents/{id} - Update a listing (owner only)
//! - DELETE /api/patents/{id} - Delete a listing (owner only)
//! - GET    /api/user/patents - Listings strictly owned by the caller

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::api::middleware::{ApiError, AppState, CurrentIdentity, OptionalIdentity};
use crate::config::UploadConfig;
use crate::models::{
    CreatePatentInput, ListScope, Patent, PatentFilter, UpdatePatentInput,
};
use crate::services::{parse_price, PatentServiceError};

/// Query parameters for listing patents
#[derive(Debug, Deserialize)]
pub struct ListPatentsQuery {
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    /// Listing scope: absent for the public view, `me` for the caller's
    /// rows, `all` for every row. `me` and `all` require authentication.
    pub owner: Option<String>,
}

/// Response for a single listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatentResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub problem: Option<String>,
    pub usage: Option<String>,
    pub advantage: Option<String>,
    pub category: Option<String>,
    pub patent_number: Option<String>,
    pub price: f64,
    pub status: String,
    pub approval_status: String,
    pub image: Option<String>,
    pub owner_id: Option<i64>,
    pub owner_name: Option<String>,
    pub created_at: String,
}

impl From<Patent> for PatentResponse {
    fn from(patent: Patent) -> Self {
        Self {
            id: patent.id,
            title: patent.title,
            description: patent.description,
            problem: patent.problem,
            usage: patent.usage,
            advantage: patent.advantage,
            category: patent.category,
            patent_number: patent.patent_number,
            price: patent.price,
            status: patent.status.to_string(),
            approval_status: patent.approval_status.to_string(),
            image: patent.image,
            owner_id: patent.owner_id,
            owner_name: patent.owner_name,
            created_at: patent.created_at.to_rfc3339(),
        }
    }
}

/// Request body for updating a listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub problem: Option<String>,
    pub usage: Option<String>,
    pub advantage: Option<String>,
    pub category: Option<String>,
    pub patent_number: Option<String>,
    /// Accepted as a number or a numeric string; coerced non-negative
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<f64>,
    pub status: Option<String>,
}

/// Form clients send the price as text, JSON clients as a number. Both
/// are accepted and coerced the way the create path coerces.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
    }

    Ok(Option::<RawPrice>::deserialize(deserializer)?.map(|raw| match raw {
        RawPrice::Number(n) if n.is_finite() && n >= 0.0 => n,
        RawPrice::Number(_) => 0.0,
        RawPrice::Text(s) => parse_price(Some(&s)),
    }))
}

/// GET /api/patents - List listings
///
/// Without `owner` this is the public view: approved listings only, no
/// authentication needed. `owner=me` and `owner=all` switch to the
/// authenticated scopes and reject anonymous callers.
pub async fn list_patents(
    State(state): State<AppState>,
    identity: OptionalIdentity,
    Query(query): Query<ListPatentsQuery>,
) -> Result<Json<Vec<PatentResponse>>, ApiError> {
    let scope = match query.owner.as_deref() {
        Some("me") => {
            let identity = identity
                .0
                .ok_or_else(|| ApiError::unauthenticated("ログインが必要です"))?;
            ListScope::Mine(identity.id)
        }
        Some("all") => {
            identity
                .0
                .ok_or_else(|| ApiError::unauthenticated("ログインが必要です"))?;
            ListScope::All
        }
        _ => ListScope::Public,
    };

    let filter = PatentFilter {
        category: query.category,
        status: query.status,
        search: query.search,
    };

    let patents = state
        .patent_service
        .list(scope, &filter)
        .await
        .map_err(map_patent_error)?;

    Ok(Json(patents.into_iter().map(Into::into).collect()))
}

/// GET /api/patents/{id} - Get one listing
pub async fn get_patent(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PatentResponse>, ApiError> {
    let patent = state.patent_service.get(id).await.map_err(map_patent_error)?;

    Ok(Json(patent.into()))
}

/// POST /api/patents - Create a listing
///
/// Accepts multipart/form-data. Text fields mirror the listing columns; an
/// optional `image` file field is stored under the upload directory with a
/// generated name and referenced as `/uploads/{name}`. The image is written
/// before the row insert.
pub async fn create_patent(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    mut multipart: Multipart,
) -> Result<Json<PatentResponse>, ApiError> {
    let mut title = String::new();
    let mut description = None;
    let mut problem = None;
    let mut usage = None;
    let mut advantage = None;
    let mut category = None;
    let mut patent_number = None;
    let mut price_raw: Option<String> = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("マルチパートの読み取りに失敗しました: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => title = read_text(field).await?,
            "description" => description = non_empty(read_text(field).await?),
            "problem" => problem = non_empty(read_text(field).await?),
            "usage" => usage = non_empty(read_text(field).await?),
            "advantage" => advantage = non_empty(read_text(field).await?),
            "category" => category = non_empty(read_text(field).await?),
            "patentNumber" | "patent_number" => {
                patent_number = non_empty(read_text(field).await?)
            }
            "price" => price_raw = Some(read_text(field).await?),
            "image" => {
                if let Some(stored) = store_image(&state.config.upload, field).await? {
                    image = Some(stored);
                }
            }
            _ => {}
        }
    }

    let input = CreatePatentInput {
        title,
        description,
        problem,
        usage,
        advantage,
        category,
        patent_number,
        price: parse_price(price_raw.as_deref()),
        image,
    };

    let patent = state
        .patent_service
        .create(&input, identity.0.id, &identity.0.name)
        .await
        .map_err(map_patent_error)?;

    Ok(Json(patent.into()))
}

/// PUT /api/patents/{id} - Update a listing
///
/// Owner only. The review state is never touched here.
pub async fn update_patent(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePatentRequest>,
) -> Result<Json<PatentResponse>, ApiError> {
    let status = match body.status.as_deref() {
        Some(raw) => Some(
            raw.parse()
                .map_err(|_| ApiError::validation_error("無効なステータスです"))?,
        ),
        None => None,
    };

    let input = UpdatePatentInput {
        title: body.title,
        description: body.description,
        problem: body.problem,
        usage: body.usage,
        advantage: body.advantage,
        category: body.category,
        patent_number: body.patent_number,
        price: body.price,
        status,
    };

    let patent = state
        .patent_service
        .update(id, &input, identity.0.id)
        .await
        .map_err(map_patent_error)?;

    Ok(Json(patent.into()))
}

/// DELETE /api/patents/{id} - Delete a listing
///
/// Owner only. The row is removed first; the stored image is removed
/// best-effort afterwards.
pub async fn delete_patent(
    State(state): State<AppState>,
    identity: CurrentIdentity,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .patent_service
        .delete(id, identity.0.id)
        .await
        .map_err(map_patent_error)?;

    Ok(Json(serde_json::json!({ "message": "特許を削除しました" })))
}

/// GET /api/user/patents - Listings strictly owned by the caller
///
/// Unlike `owner=me`, legacy rows without an owner are excluded here.
pub async fn list_owned_patents(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> Result<Json<Vec<PatentResponse>>, ApiError> {
    let patents = state
        .patent_service
        .list_owned(identity.0.id)
        .await
        .map_err(map_patent_error)?;

    Ok(Json(patents.into_iter().map(Into::into).collect()))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation_error(format!("フィールドの読み取りに失敗しました: {}", e)))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Persist an uploaded image field and return its `/uploads/{name}` URL.
///
/// A file input submitted without a selection arrives as an empty part and
/// is treated as no image.
async fn store_image(
    config: &UploadConfig,
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<String>, ApiError> {
    let filename = field.file_name().unwrap_or("").to_string();
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::validation_error(format!("画像の読み取りに失敗しました: {}", e)))?;

    if data.is_empty() {
        return Ok(None);
    }

    if !config.is_type_allowed(&content_type) {
        return Err(ApiError::validation_error(format!(
            "許可されていないファイル形式です: {}",
            content_type
        )));
    }

    if data.len() as u64 > config.max_file_size {
        return Err(ApiError::validation_error(format!(
            "ファイルサイズが上限を超えています (最大 {} MB)",
            config.max_file_size / 1024 / 1024
        )));
    }

    if !config.path.exists() {
        fs::create_dir_all(&config.path)
            .await
            .map_err(|e| ApiError::store_failure(format!("アップロード先の作成に失敗しました: {}", e)))?;
    }

    let stored_name = format!(
        "{}.{}",
        Uuid::new_v4(),
        image_extension(&filename, &content_type, config)
    );
    fs::write(config.path.join(&stored_name), &data)
        .await
        .map_err(|e| ApiError::store_failure(format!("画像の保存に失敗しました: {}", e)))?;

    Ok(Some(format!("/uploads/{}", stored_name)))
}

/// File extension from the client filename, falling back to the MIME type
fn image_extension(filename: &str, content_type: &str, config: &UploadConfig) -> String {
    if let Some(ext) = filename.rsplit('.').next() {
        if ext != filename && !ext.is_empty() && ext.len() < 10 {
            return ext.to_lowercase();
        }
    }

    config.get_extension(content_type).to_string()
}

pub(crate) fn map_patent_error(e: PatentServiceError) -> ApiError {
    match e {
        PatentServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        PatentServiceError::NotFound => ApiError::not_found("特許が見つかりません"),
        PatentServiceError::Forbidden => {
            ApiError::forbidden("この特許を操作する権限がありません")
        }
        PatentServiceError::InternalError(err) => {
            tracing::error!("Patent operation failed: {:#}", err);
            ApiError::store_failure("特許の処理に失敗しました")
        }
    }
}
