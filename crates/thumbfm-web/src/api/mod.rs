pub mod items;
pub mod listings;
pub mod maintenance;

use axum::routing::post;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/info", post(items::info))
        .route("/create", post(items::create))
        .route("/copy", post(items::copy))
        .route("/move", post(items::move_item))
        .route("/delete", post(items::delete))
        .route("/batch", post(items::batch))
        .route("/listing", post(listings::listing))
        .route("/thumbs", post(listings::thumbs))
        .route("/maintenance/clean-thumbs", post(maintenance::clean_thumbs))
}
