use axum::extract::State;
use axum::Json;

use crate::dto::{success, CleanedResponse, Envelope};
use crate::error::AppError;
use crate::state::AppState;

pub async fn clean_thumbs(
    State(state): State<AppState>,
) -> Result<Json<Envelope<CleanedResponse>>, AppError> {
    let removed = state.catalog.clear_thumbnail_cache().await?;
    Ok(success(
        "Thumbnail database cache has been deleted.",
        Some(CleanedResponse { removed }),
    ))
}
