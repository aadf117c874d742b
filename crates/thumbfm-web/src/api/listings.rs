use axum::extract::State;
use axum::Json;
use thumbfm_core::{Item, ThumbnailOutcome};

use crate::dto::{required, success, Envelope, PathRequest, ThumbsRequest, ThumbsResponse};
use crate::error::AppError;
use crate::state::AppState;

pub async fn listing(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Result<Json<Envelope<Vec<Item>>>, AppError> {
    let path = required(req.path, "Must provide a folder path.")?;

    let items = state.catalog.list_directory(&path).await?;
    Ok(success("Success", Some(items)))
}

/// Generates thumbnails with the configured size and quality. Skipped paths
/// come back without a `thumb` field.
pub async fn thumbs(
    State(state): State<AppState>,
    Json(req): Json<ThumbsRequest>,
) -> Result<Json<Envelope<ThumbsResponse<ThumbnailOutcome>>>, AppError> {
    if req.list.is_empty() {
        return Err(AppError::BadRequest(
            "Must provide a list of image paths to be processed.".to_string(),
        ));
    }
    let paths = req
        .list
        .into_iter()
        .map(|entry| entry.path.unwrap_or_default())
        .collect();

    let catalog = &state.catalog;
    let list = catalog
        .generate_thumbnails(paths, catalog.thumbnail_options())
        .await;
    Ok(success("Success.", Some(ThumbsResponse { list })))
}
