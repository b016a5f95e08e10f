//! Route table.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};

use crate::AppState;
use crate::handlers;

/// Builds the Memoria API router.
pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/media",
            put(handlers::put_media)
                .get(handlers::list_media)
                .layer(upload_limit),
        )
        .route("/media/restyle-all", post(handlers::restyle_all))
        .route(
            "/media/:key",
            get(handlers::get_media).delete(handlers::delete_media),
        )
        .route("/media/:key/restyle", post(handlers::restyle))
        .route(
            "/guestbook",
            post(handlers::sign_guestbook).get(handlers::list_guestbook),
        )
        .route("/guestbook/:index", delete(handlers::delete_guestbook))
        .route(
            "/memorial",
            get(handlers::get_memorial).put(handlers::put_memorial),
        )
        .route("/carousel/:session", post(handlers::carousel))
        .with_state(state)
}
