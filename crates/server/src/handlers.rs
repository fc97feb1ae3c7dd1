//! Request handlers
//!
//! Thin adapters from HTTP bodies onto [`bg_core::GatewaySession`]. Every
//! handler reports failures as [`ApiError`], which renders as a 400.

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use bg_core::path::normalize_folder;
use bg_core::{Confirmation, ObjectRecord, StoreConfiguration, UploadRequest};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of a plain `{message}` reply
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Reply to a bulk deletion
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub message: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
    pub key: String,
    pub folder: String,
    pub thumbnail: Option<String>,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub expires_in: Option<u64>,
    pub prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathBody {
    pub path: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct KeyBody {
    pub key: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteAllBody {
    pub captcha: Option<String>,
    pub expected_captcha: Option<String>,
}

/// POST /configure
pub async fn configure(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StoreConfiguration>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(config) = body?;
    state.session.configure(config).await?;
    Ok(MessageResponse::new("Successfully connected to S3!"))
}

/// GET /files
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ObjectRecord>>> {
    // Unconfigured wins over a malformed query
    state.session.bucket().await?;
    let Query(query) = query?;

    let records = state
        .session
        .list_files(query.prefix.as_deref(), query.expires_in)
        .await?;
    Ok(Json(records))
}

/// POST /create-folder
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PathBody>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    state.session.bucket().await?;
    let Json(body) = body?;

    let folder = state.session.create_folder(&body.path).await?;
    Ok(MessageResponse::new(format!(
        "Folder {folder} created successfully"
    )))
}

/// POST /upload
///
/// Multipart fields: `file` (required), `folder_path`, `public`, `expires_in`.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    state.session.bucket().await?;
    let mut multipart = multipart?;

    let mut file: Option<(String, Vec<u8>)> = None;
    let mut request = UploadRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                file = Some((filename, data.to_vec()));
            }
            "folder_path" => request.folder = Some(field.text().await?),
            "public" => request.make_public = field.text().await?.eq_ignore_ascii_case("true"),
            "expires_in" => request.expires_in = parse_expires_in(&field.text().await?)?,
            _ => {}
        }
    }

    let Some((filename, data)) = file else {
        return Err(ApiError::bad_request("No file provided"));
    };
    request.filename = filename;
    request.data = data;

    let result = state.session.upload(request).await?;
    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        url: result.url,
        key: result.key,
        folder: result.folder,
        thumbnail: result.thumbnail,
        is_public: result.is_public,
    }))
}

fn parse_expires_in(raw: &str) -> ApiResult<Option<u64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ApiError::bad_request(format!("Invalid expires_in: {raw}")))
}

/// POST /delete
pub async fn delete_object(
    State(state): State<Arc<AppState>>,
    body: Result<Json<KeyBody>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    state.session.bucket().await?;
    let Json(body) = body?;

    state.session.delete_object(&body.key).await?;
    Ok(MessageResponse::new(format!(
        "File {} deleted successfully",
        body.key
    )))
}

/// POST /delete-folder
pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PathBody>, JsonRejection>,
) -> ApiResult<Json<CountResponse>> {
    state.session.bucket().await?;
    let Json(body) = body?;

    let count = state.session.delete_folder(&body.path).await?;
    let folder = normalize_folder(&body.path);
    let message = if count == 0 {
        format!("Folder {folder} was empty or didn't exist")
    } else {
        format!("Folder {folder} and its contents ({count} objects) deleted successfully")
    };
    Ok(Json(CountResponse { message, count }))
}

/// POST /delete-all
pub async fn delete_all(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DeleteAllBody>, JsonRejection>,
) -> ApiResult<Json<CountResponse>> {
    state.session.bucket().await?;
    let Json(body) = body?;

    let confirmation = Confirmation {
        captcha: body.captcha,
        expected: body.expected_captcha,
    };
    let count = state.session.delete_all(&confirmation).await?;
    let message = if count == 0 {
        "No files to delete".to_string()
    } else {
        format!("Successfully deleted {count} files")
    };
    Ok(Json(CountResponse { message, count }))
}
