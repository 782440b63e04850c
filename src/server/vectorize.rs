//! Vectorization proxy handler
//!
//! Forwards the uploaded image to the commercial vectorization API and
//! streams the upstream body straight back, copying the status code and the
//! usage-credit headers through verbatim — including upstream errors.

use super::AppState;
use crate::{
    error::{OutfitError, Result},
    vectorize::{VectorizeOptions, CREDIT_HEADERS},
};
use axum::{
    body::StreamBody,
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

/// `POST /api/vectorize` — multipart: `image`, optional `format` and `mode`
pub async fn vectorize_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let client = state.vectorizer()?;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut options = VectorizeOptions::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OutfitError::invalid_request(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("image") => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        OutfitError::invalid_request(format!("failed to read image field: {e}"))
                    })?
                    .to_vec();
                file = Some((file_name, content_type, bytes));
            },
            Some("format") => {
                let text = field.text().await.map_err(|e| {
                    OutfitError::invalid_request(format!("failed to read format field: {e}"))
                })?;
                options.format = text.parse()?;
            },
            Some("mode") => {
                let text = field.text().await.map_err(|e| {
                    OutfitError::invalid_request(format!("failed to read mode field: {e}"))
                })?;
                options.mode = text.parse()?;
            },
            _ => {},
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| OutfitError::invalid_field("image", "image upload is required"))?;
    if bytes.is_empty() {
        return Err(OutfitError::invalid_field("image", "image upload is empty"));
    }

    let upstream = client
        .vectorize(&file_name, &content_type, bytes, options)
        .await?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    info!(
        status = status.as_u16(),
        format = options.format.as_str(),
        "vectorization response streaming"
    );

    let mut headers = HeaderMap::new();
    if let Some(value) = upstream.headers().get(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, value.clone());
    }
    for &name in CREDIT_HEADERS {
        if let Some(value) = upstream.headers().get(name) {
            headers.insert(HeaderName::from_static(name), value.clone());
        }
    }

    Ok((status, headers, StreamBody::new(upstream.bytes_stream())).into_response())
}
