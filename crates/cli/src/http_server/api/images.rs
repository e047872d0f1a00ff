use std::path::Path as FsPath;

use axum::extract::{Json, Multipart, Path, State};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use img_store::{ErrorKind, ImageMeta, ImageType, ImgError};
use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::http_server::ServerState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub group: String,
    /// Uploaded file names, in the order they were stored
    pub files: Vec<String>,
}

/// Names stored under a group, ascending.
pub async fn list_handler(
    State(state): State<ServerState>,
    Path(group): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let names = state.store().list(&group).await?;
    Ok(Json(names.into_iter().collect()))
}

pub async fn meta_handler(
    State(state): State<ServerState>,
    Path((group, name)): Path<(String, String)>,
) -> Result<Json<ImageMeta>, ApiError> {
    let meta = state.store().meta(&group, &name).await?;
    Ok(Json(meta))
}

/// Raw bytes for `name.type`, split at the last `.`.
pub async fn get_handler(
    State(state): State<ServerState>,
    Path((group, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (name, ty) = file.rsplit_once('.').ok_or_else(|| {
        ImgError::new(
            ErrorKind::BadType,
            format!("missing image type in '{}'", file.escape_debug()),
        )
    })?;

    let bytes = state.store().get(&group, name, ty).await?;
    // get() only succeeds for registered types
    let mime = ty
        .parse::<ImageType>()
        .map(|t| t.mime())
        .unwrap_or("application/octet-stream");

    Ok((StatusCode::OK, [(CONTENT_TYPE, mime)], bytes).into_response())
}

/// Store uploaded image files under a group.
///
/// Each `file`/`files` part is stored like `put` stores a file with the
/// part's file name. Files are stored in order and the first failure stops
/// the upload; files stored before it stay stored.
pub async fn upload_handler(
    State(state): State<ServerState>,
    Path(group): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut files: Vec<(String, Bytes)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Upload(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" | "files" => {
                // Only the base name; clients may send full paths
                let file_name = field
                    .file_name()
                    .and_then(|n| FsPath::new(n).file_name())
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::Upload("image part has no file name".into()))?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Upload(e.to_string()))?;
                files.push((file_name, data));
            }
            _ => {
                tracing::warn!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    if files.is_empty() {
        return Err(ApiError::Upload("at least one file is required".into()));
    }

    let scratch = tempfile::tempdir()?;
    let mut stored = Vec::with_capacity(files.len());
    for (file_name, data) in files {
        let path = scratch.path().join(&file_name);
        tokio::fs::write(&path, &data).await?;
        state.store().put(&group, &path).await?;
        stored.push(file_name);
    }

    tracing::info!(group = %group, files = ?stored, "images uploaded");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            group,
            files: stored,
        }),
    ))
}
