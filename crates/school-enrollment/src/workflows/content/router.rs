use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::domain::{SettingsUpdate, SiteContentUpdate};
use super::repository::ContentRepository;
use super::service::{ContentError, ContentService};

/// Router for the public announcement, guidelines and school settings.
pub fn content_router<R>(service: Arc<ContentService<R>>) -> Router
where
    R: ContentRepository + 'static,
{
    Router::new()
        .route(
            "/api/site-content",
            get(content_handler::<R>).put(update_content_handler::<R>),
        )
        .route(
            "/api/settings",
            get(settings_handler::<R>).put(update_settings_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn content_handler<R>(State(service): State<Arc<ContentService<R>>>) -> Response
where
    R: ContentRepository + 'static,
{
    match service.site_content() {
        Ok(content) => (StatusCode::OK, Json(content)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_content_handler<R>(
    State(service): State<Arc<ContentService<R>>>,
    Json(update): Json<SiteContentUpdate>,
) -> Response
where
    R: ContentRepository + 'static,
{
    match service.update_content(update) {
        Ok(content) => (StatusCode::OK, Json(content)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn settings_handler<R>(State(service): State<Arc<ContentService<R>>>) -> Response
where
    R: ContentRepository + 'static,
{
    match service.settings() {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_settings_handler<R>(
    State(service): State<Arc<ContentService<R>>>,
    Json(update): Json<SettingsUpdate>,
) -> Response
where
    R: ContentRepository + 'static,
{
    match service.update_settings(update) {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ContentError) -> Response {
    let status = match error {
        ContentError::MissingTitle => StatusCode::UNPROCESSABLE_ENTITY,
        ContentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
