use axum::Json;
use serde::{Deserialize, Serialize};
use thumbfm_core::BatchAction;

use crate::error::AppError;

/// Success envelope shared by every route.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success<T: Serialize>(message: impl Into<String>, data: Option<T>) -> Json<Envelope<T>> {
    Json(Envelope {
        status_code: 200,
        message: message.into(),
        data,
    })
}

/// Returns the value of a required string field, rejecting missing and empty ones.
pub fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(message.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct PathRequest {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub newpath: Option<String>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub action: Option<BatchAction>,
    /// Destination folder, required for `move`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThumbsRequest {
    #[serde(default)]
    pub list: Vec<PathRequest>,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ThumbsResponse<T> {
    pub list: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct CleanedResponse {
    pub removed: usize,
}
