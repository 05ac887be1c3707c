//! Upload page and upload form submission

use crate::error::HttpAppError;
use crate::services::IngestionError;
use crate::state::AppState;
use crate::utils::cookies::{append_set_cookie, read_cookie, FLASH_COOKIE};
use crate::utils::html::escape;
use crate::validation::{ValidationError, FLASH_FILE_TOO_LARGE};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use bytes::Bytes;
use pictura_core::AppError;
use std::sync::Arc;

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "form_file";

pub const UPLOAD_SUCCEEDED: &str = "File successfully uploaded";

const FLASH_MAX_AGE_SECS: i64 = 60;

/// Upload form, pending flash message and the stored images.
#[tracing::instrument(skip_all)]
pub async fn index_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let flash = read_cookie(&headers, FLASH_COOKIE)
        .and_then(|raw| urlencoding::decode(&raw).ok().map(|m| m.into_owned()));

    let images = state.pipeline.list_images().await?;
    let page = render_index(flash.as_deref(), &images, state.auth.is_some());

    let mut response = Html(page).into_response();
    if flash.is_some() {
        append_set_cookie(&mut response, &state.cookies.clear(FLASH_COOKIE))?;
    }
    Ok(response)
}

/// Handle the upload form. Always redirects back to `/` with a flash
/// message unless storing the image or its metadata fails.
#[tracing::instrument(skip_all)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, HttpAppError> {
    let part = match multipart {
        Ok(multipart) => read_file_part(multipart).await,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Upload request is not multipart");
            Ok(None)
        }
    };

    let (filename, data) = match part {
        Ok(Some(part)) => part,
        Ok(None) => {
            return flash_redirect(&state, ValidationError::MissingFilePart.flash_message())
        }
        Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::info!(error = %err, "Upload exceeded body limit");
            return flash_redirect(&state, FLASH_FILE_TOO_LARGE);
        }
        Err(err) => return Err(AppError::BadRequest(err.body_text()).into()),
    };

    match state.pipeline.ingest(&filename, data).await {
        Ok(outcome) => {
            tracing::info!(
                image_key = %outcome.image_key,
                caption_status = %outcome.caption.status,
                "Upload accepted"
            );
            flash_redirect(&state, UPLOAD_SUCCEEDED)
        }
        Err(IngestionError::Rejected(reason)) => {
            tracing::info!(filename = %filename, reason = %reason, "Upload rejected");
            flash_redirect(&state, reason.flash_message())
        }
        Err(err) => Err(err.into()),
    }
}

/// First field named [`FILE_FIELD`], as `(filename, bytes)`.
async fn read_file_part(mut multipart: Multipart) -> Result<Option<(String, Bytes)>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        return Ok(Some((filename, data)));
    }
    Ok(None)
}

fn flash_redirect(state: &AppState, message: &str) -> Result<Response, HttpAppError> {
    let mut response = Redirect::to("/").into_response();
    let cookie = state.cookies.build(
        FLASH_COOKIE,
        &urlencoding::encode(message),
        Some(FLASH_MAX_AGE_SECS),
    );
    append_set_cookie(&mut response, &cookie)?;
    Ok(response)
}

fn render_index(flash: Option<&str>, images: &[String], signed_in: bool) -> String {
    let flash_html = flash
        .map(|message| format!("    <p class=\"flash\">{}</p>\n", escape(message)))
        .unwrap_or_default();

    let items = if images.is_empty() {
        "      <li>No images uploaded yet.</li>\n".to_string()
    } else {
        images
            .iter()
            .map(|name| {
                let href = urlencoding::encode(name);
                format!(
                    "      <li><a href=\"/files/{href}\"><img src=\"/files/{href}\" alt=\"{label}\" width=\"160\"></a> \
<a href=\"/files/{href}\">{label}</a> (<a href=\"/image_details/{href}\">details</a>)</li>\n",
                    href = href,
                    label = escape(name)
                )
            })
            .collect()
    };

    let logout = if signed_in {
        "    <p><a href=\"/logout\">Sign out</a></p>\n"
    } else {
        ""
    };

    format!(
        "<!doctype html>
<html lang=\"en\">
  <head>
    <meta charset=\"utf-8\">
    <title>Pictura</title>
  </head>
  <body>
    <h1>Upload an image</h1>
{flash_html}    <form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">
      <input type=\"file\" name=\"{field}\" accept=\".jpg,.jpeg,image/jpeg\">
      <input type=\"submit\" value=\"Upload\">
    </form>
    <h2>Uploaded images</h2>
    <ul>
{items}    </ul>
{logout}  </body>
</html>
",
        flash_html = flash_html,
        field = FILE_FIELD,
        items = items,
        logout = logout
    )
}
