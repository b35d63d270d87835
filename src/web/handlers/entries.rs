//! Catalog entry HTTP handlers

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, Path, State,
    },
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::models::{EntryCreateRequest, EntryUpdateRequest};
use crate::web::{
    extractors::{parse_entry_id, PaginationParams},
    responses::{created, ok, ApiResponse},
    AppState,
};

/// Multipart field carrying the import document
pub const IMPORT_FIELD: &str = "file";

fn entry_id(raw: &str) -> AppResult<u64> {
    parse_entry_id(raw).ok_or_else(|| AppError::not_found("Entry", raw))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

/// `GET /entries?page=&limit=`
pub async fn list_entries(
    State(state): State<AppState>,
    pagination: PaginationParams,
) -> AppResult<Response> {
    let page = state
        .catalog
        .list(pagination.page, pagination.limit)
        .await?;

    Ok(Json(ApiResponse::success(page.entries).with_pagination(page.pagination)).into_response())
}

/// `GET /entries/{id}`
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let entry = state.catalog.get_by_id(entry_id(&id)?).await?;
    Ok(ok(entry))
}

/// `POST /entries`
pub async fn create_entry(
    State(state): State<AppState>,
    payload: Result<Json<EntryCreateRequest>, JsonRejection>,
) -> AppResult<Response> {
    let entry = state.catalog.create(json_body(payload)?).await?;
    Ok(created(entry))
}

/// `PUT /entries/{id}`
pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EntryUpdateRequest>, JsonRejection>,
) -> AppResult<Response> {
    let id = entry_id(&id)?;
    let entry = state.catalog.update(id, json_body(payload)?).await?;
    Ok(ok(entry))
}

/// `DELETE /entries/{id}`
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    state.catalog.delete(entry_id(&id)?).await?;
    Ok(Json(ApiResponse::<()>::message("Entry deleted successfully")).into_response())
}

/// `GET /entries/recommendations/{genre}`
pub async fn recommendations(
    State(state): State<AppState>,
    Path(genre): Path<String>,
) -> AppResult<Response> {
    let entries = state.catalog.recommend_by_category(&genre).await?;
    Ok(ok(entries))
}

/// `POST /entries/import` with a multipart `file` field holding a JSON array
pub async fn import_entries(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    let document = match multipart {
        Ok(multipart) => read_import_document(multipart).await?,
        Err(rejection) => {
            debug!("Import request is not multipart: {}", rejection);
            None
        }
    };

    let summary = state.catalog.bulk_import(document.as_deref()).await?;
    let message = format!("Successfully imported {} entries", summary.count);
    Ok(Json(ApiResponse::success(summary.entries).with_message(message)).into_response())
}

/// Pull the JSON document out of the upload, if one was attached
async fn read_import_document(mut multipart: Multipart) -> AppResult<Option<Vec<u8>>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(IMPORT_FIELD) {
            continue;
        }

        if !is_json_content_type(field.content_type()) {
            return Err(AppError::validation("Only JSON files are allowed"));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read uploaded file: {e}")))?;
        return Ok(Some(data.to_vec()));
    }
    Ok(None)
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}
