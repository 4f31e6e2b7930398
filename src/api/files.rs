use axum::extract::Request;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::state::AppState;
use crate::db::{FileInfo, FileRepository};
use crate::error::AppError;

/// GET /saved (requires auth)
pub async fn saved(request: Request, state: AppState) -> Result<Json<Vec<FileInfo>>, Response> {
    if request.method() != Method::GET {
        return Err(AppError::MethodNotAllowed.into_response());
    }

    let session = state
        .authenticate(request.headers())
        .await
        .map_err(IntoResponse::into_response)?;

    let files = FileRepository::list(&state.db)
        .await
        .map_err(IntoResponse::into_response)?;

    tracing::debug!(user_id = session.user_id, count = files.len(), "Listing saved files");
    Ok(Json(files))
}
