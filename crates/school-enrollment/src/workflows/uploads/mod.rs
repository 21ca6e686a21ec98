//! Storage for parent-supplied documents and admin-managed site assets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Public route prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Reference to a stored file as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("uploaded file is empty")]
    Empty,
    #[error("file name is required")]
    MissingName,
    #[error("unable to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Replaces every character outside `[A-Za-z0-9.]` with an underscore.
pub fn sanitize_file_name(original: &str) -> String {
    original
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Unique on-disk name: `{millis}-{uuid}-{sanitized original}`.
pub fn storage_file_name(original: &str) -> String {
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4(),
        sanitize_file_name(original)
    )
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn store(&self, original_name: &str, bytes: &[u8])
        -> Result<StoredDocument, UploadError>;
}

/// Writes uploads into a local directory served under [`PUBLIC_PREFIX`].
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the upload directory when it does not exist yet.
    pub async fn prepare(&self) -> Result<(), UploadError> {
        if tokio::fs::metadata(&self.root).await.is_err() {
            tokio::fs::create_dir_all(&self.root).await?;
            info!(path = %self.root.display(), "created uploads directory");
        }
        Ok(())
    }

    /// Static file service for the stored uploads.
    pub fn serve_dir(&self) -> ServeDir {
        ServeDir::new(&self.root)
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn store(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredDocument, UploadError> {
        let original_name = original_name.trim();
        if original_name.is_empty() {
            return Err(UploadError::MissingName);
        }
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }

        self.prepare().await?;
        let file_name = storage_file_name(original_name);
        tokio::fs::write(self.root.join(&file_name), bytes).await?;

        Ok(StoredDocument {
            url: format!("{PUBLIC_PREFIX}/{file_name}"),
            name: Some(original_name.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadQuery {
    #[serde(default)]
    name: String,
}

pub fn upload_router<S>(store: Arc<S>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/api/uploads", post(upload_handler::<S>))
        .with_state(store)
}

pub(crate) async fn upload_handler<S>(
    State(store): State<Arc<S>>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Response
where
    S: DocumentStore + 'static,
{
    match store.store(&query.name, &body).await {
        Ok(document) => {
            info!(url = %document.url, size = body.len(), "stored upload");
            (StatusCode::CREATED, Json(document)).into_response()
        }
        Err(err @ (UploadError::Empty | UploadError::MissingName)) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        Err(err) => {
            warn!(error = %err, "upload failed");
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
