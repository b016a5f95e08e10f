//! Request handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use memoria_core::{
    BulkReport, GuestbookEntry, MediaView, MemorialProfile, PipelineResult, PutOutcome,
};
use memoria_error::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::{debug, info, instrument};

use crate::{ApiError, AppState};

type ApiResult<T> = Result<T, ApiError>;

/// Liveness check.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    name: Option<String>,
}

/// `PUT /media?name=` stores the request body.
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn put_media(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<PutOutcome>)> {
    let name = query.name.unwrap_or_default();
    let outcome = state.storage.put(&body, &name).await?;
    let status = if outcome.duplicate {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome)))
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    view: Option<String>,
}

fn parse_view(view: Option<&str>) -> ApiResult<MediaView> {
    match view {
        None => Ok(MediaView::default()),
        Some(raw) => MediaView::from_str(raw).map_err(|_| {
            ApiError::from(ValidationError::new(format!(
                "unknown view '{}', expected all, originals or restyled",
                raw
            )))
        }),
    }
}

/// `GET /media[?view=]` lists keys in display order.
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<Json<Vec<String>>> {
    let view = parse_view(query.view.as_deref())?;
    Ok(Json(state.storage.list_view(view)))
}

fn content_type_for(key: &str) -> &'static str {
    let extension = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// `GET /media/:key` returns stored bytes.
#[instrument(skip(state))]
pub async fn get_media(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    let bytes = state.storage.get(&key).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&key))], bytes).into_response())
}

/// `DELETE /media/:key` removes an item and its derivative.
///
/// Cached restyle results of removed Originals are forgotten as well.
#[instrument(skip(state))]
pub async fn delete_media(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    let removed = state.storage.delete(&key).await?;
    for item in removed.iter().filter(|item| item.is_original()) {
        state.pipeline.forget(&item.content_hash).await?;
    }
    debug!(removed = removed.len(), "Delete handled");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RestyleQuery {
    #[serde(default)]
    force: bool,
}

/// `POST /media/:key/restyle[?force=true]`
#[instrument(skip(state))]
pub async fn restyle(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<RestyleQuery>,
) -> ApiResult<Json<PipelineResult>> {
    let result = state.pipeline.restyle(&key, query.force).await?;
    Ok(Json(result))
}

/// `POST /media/restyle-all` restyles every Original, stopping early on shutdown.
#[instrument(skip(state))]
pub async fn restyle_all(State(state): State<AppState>) -> Json<BulkReport> {
    let cancel = state.shutdown.child_token();
    Json(state.pipeline.restyle_all(&cancel).await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestbookSubmission {
    author_name: String,
    message_body: String,
}

/// `POST /guestbook` signs the guestbook.
#[instrument(skip(state, submission))]
pub async fn sign_guestbook(
    State(state): State<AppState>,
    Json(submission): Json<GuestbookSubmission>,
) -> ApiResult<(StatusCode, Json<GuestbookEntry>)> {
    let entry = state
        .guestbook
        .submit(&submission.author_name, &submission.message_body)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `GET /guestbook` lists entries newest first.
pub async fn list_guestbook(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<GuestbookEntry>>> {
    Ok(Json(state.guestbook.list_display_order().await?))
}

/// `DELETE /guestbook/:index` removes the entry shown at that position.
#[instrument(skip(state))]
pub async fn delete_guestbook(
    State(state): State<AppState>,
    Path(display_index): Path<usize>,
) -> ApiResult<StatusCode> {
    state.guestbook.delete_by_display_index(display_index).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /memorial`
pub async fn get_memorial(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(match state.profile.load().await? {
        Some(profile) => Json(profile).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "no memorial profile saved"})),
        )
            .into_response(),
    })
}

/// `PUT /memorial` replaces the memorial record.
#[instrument(skip(state, profile))]
pub async fn put_memorial(
    State(state): State<AppState>,
    Json(profile): Json<MemorialProfile>,
) -> ApiResult<StatusCode> {
    state.profile.save(&profile).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Carousel movement.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Forward one item
    Next,
    /// Back one item
    Prev,
    /// Re-read the current position
    #[default]
    Stay,
}

#[derive(Debug, Deserialize)]
pub struct CarouselQuery {
    view: Option<String>,
    #[serde(default)]
    step: Step,
}

/// Where a session's carousel landed.
#[derive(Debug, Serialize, Deserialize)]
pub struct CarouselPosition {
    /// View the cursor is bound to
    pub view: MediaView,
    /// Index under the cursor, absent when the view is empty
    pub index: Option<usize>,
    /// Key under the cursor
    pub key: Option<String>,
    /// Items in the view
    pub len: usize,
}

/// `POST /carousel/:session?view=&step=`
///
/// Each session keeps its own cursor. The cursor is re-synced to the view's
/// current length before stepping, so deletions made by other sessions never
/// leave it out of bounds.
#[instrument(skip(state))]
pub async fn carousel(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Query(query): Query<CarouselQuery>,
) -> ApiResult<Json<CarouselPosition>> {
    let view = parse_view(query.view.as_deref())?;
    let keys = state.storage.list_view(view);

    let shared = state.sessions.cursor(&session, view, keys.len());
    let mut cursor = shared.lock();
    cursor.rebind(view, keys.len());
    match query.step {
        Step::Next => cursor.next(),
        Step::Prev => cursor.prev(),
        Step::Stay => cursor.current_index(),
    };

    let position = CarouselPosition {
        view,
        index: cursor.current_index(),
        key: cursor.current(&keys).cloned(),
        len: keys.len(),
    };
    drop(cursor);

    info!(index = ?position.index, "Carousel moved");
    Ok(Json(position))
}
