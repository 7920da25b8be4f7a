//! REST handlers for `/health` and `/api/documents`.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use dfab_types::{
    ContentSlice, DocumentId, DocumentList, DocumentRecord, Outline, Tags, MAX_PAGE_SIZE,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_FILENAME: &str = "unnamed";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// Parameter parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

pub(crate) fn parse_id(raw: &str) -> ApiResult<DocumentId> {
    DocumentId::parse(raw).map_err(|e| ApiError::validation(e.to_string()))
}

/// Validate listing bounds: limit in 1..=100, offset >= 0.
pub(crate) fn page_bounds(
    limit: Option<i64>,
    offset: Option<i64>,
    default_limit: usize,
) -> ApiResult<(usize, usize)> {
    let limit = match limit {
        None => default_limit,
        Some(l) if (1..=MAX_PAGE_SIZE as i64).contains(&l) => l as usize,
        Some(_) => {
            return Err(ApiError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )))
        }
    };
    let offset = non_negative("offset", offset)?.unwrap_or(0);
    Ok((limit, offset))
}

/// Validate slice bounds: offset >= 0, limit >= 1.
pub(crate) fn slice_bounds(
    offset: Option<i64>,
    limit: Option<i64>,
) -> ApiResult<(Option<usize>, Option<usize>)> {
    let offset = non_negative("offset", offset)?;
    let limit = match limit {
        Some(l) if l < 1 => return Err(ApiError::validation("limit must be at least 1")),
        other => other.map(|l| l as usize),
    };
    Ok((offset, limit))
}

fn non_negative(name: &str, value: Option<i64>) -> ApiResult<Option<usize>> {
    match value {
        Some(v) if v < 0 => Err(ApiError::validation(format!("{name} must be non-negative"))),
        other => Ok(other.map(|v| v as usize)),
    }
}

fn query_error(e: QueryRejection) -> ApiError {
    ApiError::validation(e.body_text())
}

/// Keep only the last path component of a client-supplied filename.
pub(crate) fn sanitize_filename(raw: Option<&str>) -> String {
    raw.and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(DEFAULT_FILENAME)
        .to_string()
}

// ---------------------------------------------------------------------------
// Multipart upload
// ---------------------------------------------------------------------------

/// The parts of an upload form.
#[derive(Debug)]
pub(crate) struct Upload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub tags: Option<Tags>,
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<Upload> {
    let mut file = None;
    let mut tags = None;

    while let Some(field) = multipart.next_field().await.map_err(ApiError::from_multipart)? {
        match field.name() {
            Some("file") => {
                let filename = sanitize_filename(field.file_name());
                let content_type = field
                    .content_type()
                    .filter(|ct| !ct.trim().is_empty())
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let data = field.bytes().await.map_err(ApiError::from_multipart)?;
                file = Some((filename, content_type, data.to_vec()));
            }
            Some("metadata") => {
                let text = field.text().await.map_err(ApiError::from_multipart)?;
                let parsed: Tags = serde_json::from_str(&text)
                    .map_err(|_| ApiError::validation("Invalid metadata JSON"))?;
                tags = Some(parsed);
            }
            _ => {}
        }
    }

    let (filename, content_type, data) =
        file.ok_or_else(|| ApiError::validation("missing multipart field: file"))?;
    Ok(Upload {
        filename,
        content_type,
        data,
        tags,
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn create_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<DocumentRecord>)> {
    let upload = read_upload(multipart).await?;
    let record = state
        .service
        .create(&upload.filename, &upload.content_type, &upload.data, upload.tags)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_documents(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<DocumentList>> {
    let Query(params) = params.map_err(query_error)?;
    let (limit, offset) = page_bounds(params.limit, params.offset, state.config.default_page_size)?;
    Ok(Json(state.service.list(limit, offset).await?))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DocumentRecord>> {
    let id = parse_id(&id)?;
    Ok(Json(state.service.get(&id).await?))
}

pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<DocumentRecord>> {
    let id = parse_id(&id)?;
    let upload = read_upload(multipart).await?;
    let record = state
        .service
        .update(&id, &upload.filename, &upload.content_type, &upload.data)
        .await?;
    Ok(Json(record))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state.service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<ContentParams>, QueryRejection>,
) -> ApiResult<Json<ContentSlice>> {
    let id = parse_id(&id)?;
    let Query(params) = params.map_err(query_error)?;
    let (offset, limit) = slice_bounds(params.offset, params.limit)?;
    Ok(Json(state.service.read_content(&id, offset, limit).await?))
}

pub async fn get_outline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Outline>> {
    let id = parse_id(&id)?;
    Ok(Json(state.service.outline(&id).await?))
}

pub async fn get_original(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id = parse_id(&id)?;
    let original = state.service.read_original(&id).await?;

    let content_type = HeaderValue::from_str(&original.content_type)
        .unwrap_or(HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let disposition = HeaderValue::from_str(&content_disposition(&original.filename))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        original.data,
    )
        .into_response())
}

/// `attachment; filename="..."` with characters unsafe in a quoted header
/// value replaced.
fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
