use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use pictura_core::AppError;
use std::sync::Arc;

/// Raw bytes of a stored image, always served as `image/jpeg`.
#[tracing::instrument(skip(state))]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, HttpAppError> {
    // Sidecars and other objects are not served here
    if !state.pipeline.policy().allows(&name) {
        return Err(AppError::NotFound(format!("File not found: {}", name)).into());
    }

    let data = state.pipeline.fetch_image(&name).await?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], data).into_response())
}
