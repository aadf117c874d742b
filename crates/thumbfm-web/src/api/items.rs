use axum::extract::State;
use axum::Json;
use thumbfm_core::fs::classify::extension_of;
use thumbfm_core::{normalize, BatchAction, BatchReport, Item};

use crate::dto::{
    required, success, BatchRequest, CreateRequest, CreatedResponse, Envelope, MoveRequest,
    PathRequest,
};
use crate::error::AppError;
use crate::state::AppState;

/// "File" for names with an extension, "Folder" otherwise.
fn kind_of(path: &str) -> &'static str {
    if extension_of(normalize(path).name()).is_some() {
        "File"
    } else {
        "Folder"
    }
}

pub async fn info(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Result<Json<Envelope<Item>>, AppError> {
    let path = required(req.path, "Must provide a file path.")?;

    match state.catalog.resolve_item(&path).await {
        Some(item) => Ok(success("Success", Some(item))),
        None => Err(AppError::NotFound(
            "The requested file could not be found.".to_string(),
        )),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateRequest>,
) -> Result<Json<Envelope<CreatedResponse>>, AppError> {
    let parent = required(req.path, "Must provide a parent folder path.")?;
    let name = required(req.name, "Must provide a name for the new item.")?;

    let created = state.catalog.create_item(&parent, &name).await?;
    let message = format!("{} created successfully.", kind_of(created.as_str()));
    Ok(success(
        message,
        Some(CreatedResponse {
            path: created.into_string(),
        }),
    ))
}

pub async fn copy(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Result<Json<Envelope<CreatedResponse>>, AppError> {
    let path = required(req.path, "Must provide a file or folder path to be copied.")?;

    let copied = state.catalog.copy_item(&path).await?;
    Ok(success(
        format!("{} copied successfully.", kind_of(&path)),
        Some(CreatedResponse {
            path: copied.into_string(),
        }),
    ))
}

pub async fn move_item(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<Envelope<()>>, AppError> {
    let (path, newpath) = match (req.path, req.newpath) {
        (Some(p), Some(n)) if !p.is_empty() && !n.is_empty() => (p, n),
        _ => {
            return Err(AppError::BadRequest(
                "Must provide both the target and new path to move an item.".to_string(),
            ))
        }
    };

    state
        .catalog
        .invalidate_on_move(&path, &newpath, req.force)
        .await?;
    Ok(success(format!("{} saved successfully.", kind_of(&path)), None))
}

pub async fn delete(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Result<Json<Envelope<()>>, AppError> {
    let path = required(req.path, "Must provide a file or folder path to be deleted.")?;

    state.catalog.invalidate_on_delete(&path).await?;
    Ok(success(format!("{} deleted successfully.", kind_of(&path)), None))
}

pub async fn batch(
    State(state): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<Envelope<BatchReport>>, AppError> {
    let action = req
        .action
        .ok_or_else(|| AppError::BadRequest("Must provide an action.".to_string()))?;
    let destination = req.path.filter(|p| !p.is_empty());
    if action == BatchAction::Move && destination.is_none() {
        return Err(AppError::BadRequest(
            "Must provide a new path when trying to move items.".to_string(),
        ));
    }
    let items: Vec<String> = req.items.into_iter().filter(|p| !p.is_empty()).collect();
    if items.is_empty() {
        return Err(AppError::BadRequest(
            "Must provide a list of items to process.".to_string(),
        ));
    }

    let report = state
        .catalog
        .invalidate_batch(action, items, destination.as_deref())
        .await?;
    Ok(success(report.summary(action), Some(report)))
}
