//! Wardrobe and outfit CRUD handlers
//!
//! Thin glue over the hosted store client. The upload handler stores the
//! image object first and inserts the row second; a failed insert is
//! reported as-is and the uploaded object is left behind (no compensation).

use super::AppState;
use crate::{
    error::{OutfitError, Result},
    services::ALLOWED_IMAGE_MIME_TYPES,
    wardrobe::{GarmentKind, GarmentRecord, OutfitRecord},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Query parameters for the listing endpoints
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    /// Owner identifier to filter by
    pub owner: Option<String>,
}

impl OwnerQuery {
    fn require(self) -> Result<String> {
        self.owner
            .filter(|owner| !owner.is_empty())
            .ok_or_else(|| OutfitError::invalid_field("owner", "query parameter is required"))
    }
}

/// Request body for creating an outfit row
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOutfitRequest {
    /// Owning user
    pub owner: String,
    /// Upper-body garment reference
    pub top_id: String,
    /// Lower-body garment reference
    pub bottom_id: String,
    /// Generated try-on image as a URL, when available
    #[serde(default)]
    pub image_url: Option<String>,
}

/// `POST /api/wardrobe` — multipart: `file`, `kind`, `owner`
pub async fn upload_garment(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<GarmentRecord>> {
    let store = state.store()?;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut kind: Option<GarmentKind> = None;
    let mut owner: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| OutfitError::invalid_request(format!("malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("garment").to_string();
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        OutfitError::invalid_request(format!("failed to read file field: {e}"))
                    })?
                    .to_vec();
                file = Some((file_name, content_type, bytes));
            },
            Some("kind") => {
                let text = field.text().await.map_err(|e| {
                    OutfitError::invalid_request(format!("failed to read kind field: {e}"))
                })?;
                kind = Some(text.parse()?);
            },
            Some("owner") => {
                let text = field.text().await.map_err(|e| {
                    OutfitError::invalid_request(format!("failed to read owner field: {e}"))
                })?;
                owner = Some(text);
            },
            _ => {},
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| OutfitError::invalid_field("file", "file upload is required"))?;
    let kind = kind.ok_or_else(|| OutfitError::invalid_field("kind", "field is required"))?;
    let owner = owner
        .filter(|owner| !owner.is_empty())
        .ok_or_else(|| OutfitError::invalid_field("owner", "field is required"))?;

    if !ALLOWED_IMAGE_MIME_TYPES.contains(&content_type.as_str()) {
        return Err(OutfitError::invalid_field(
            "file",
            &format!("unsupported content type '{content_type}'"),
        ));
    }
    image::load_from_memory(&bytes)
        .map_err(|e| OutfitError::invalid_field("file", &format!("not a decodable image: {e}")))?;

    let object_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(&file_name));
    let image_url = store
        .upload_garment_image(&owner, &object_name, &content_type, bytes)
        .await?;

    // Insert failures are reported as-is; the uploaded object stays
    let record = store.insert_garment(&owner, kind, &image_url).await?;
    info!(id = %record.id, owner = %record.owner_id, "garment uploaded");
    Ok(Json(record))
}

/// `GET /api/wardrobe?owner=`
pub async fn list_garments(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Vec<GarmentRecord>>> {
    let owner = query.require()?;
    let records = state.store()?.list_garments(&owner).await?;
    Ok(Json(records))
}

/// `DELETE /api/wardrobe/:id`
pub async fn delete_garment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.store()?.delete_garment(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/outfits`
pub async fn create_outfit(
    State(state): State<AppState>,
    Json(request): Json<NewOutfitRequest>,
) -> Result<Json<OutfitRecord>> {
    for (field, value) in [
        ("owner", &request.owner),
        ("topId", &request.top_id),
        ("bottomId", &request.bottom_id),
    ] {
        if value.is_empty() {
            return Err(OutfitError::invalid_field(field, "must not be empty"));
        }
    }

    let record = state
        .store()?
        .insert_outfit(
            &request.owner,
            &request.top_id,
            &request.bottom_id,
            request.image_url.as_deref(),
        )
        .await?;
    Ok(Json(record))
}

/// `GET /api/outfits?owner=`
pub async fn list_outfits(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Vec<OutfitRecord>>> {
    let owner = query.require()?;
    let records = state.store()?.list_outfits(&owner).await?;
    Ok(Json(records))
}

/// Keep object names to a safe character set
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "garment".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("shirt.png"), "shirt.png");
        assert_eq!(sanitize_file_name("my shirt (1).png"), "my-shirt--1-.png");
        assert_eq!(sanitize_file_name(""), "garment");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "..-..-etc-passwd");
    }

    #[test]
    fn test_owner_query_requires_value() {
        let err = OwnerQuery { owner: None }.require().unwrap_err();
        assert_eq!(err.http_status(), 400);

        let err = OwnerQuery {
            owner: Some(String::new()),
        }
        .require()
        .unwrap_err();
        assert_eq!(err.http_status(), 400);

        let owner = OwnerQuery {
            owner: Some("user-1".to_string()),
        }
        .require()
        .unwrap();
        assert_eq!(owner, "user-1");
    }
}
