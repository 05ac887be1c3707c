use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use pictura_core::ImageDetails;
use std::sync::Arc;

/// Stored title and description of an image. Placeholders are returned when
/// no caption exists yet; captioning is never triggered from here.
#[tracing::instrument(skip(state))]
pub async fn get_image_details(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ImageDetails>, HttpAppError> {
    let details = state.pipeline.image_details(&name).await?;
    Ok(Json(details))
}
