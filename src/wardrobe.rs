//! Hosted wardrobe store
//!
//! Thin data-access client for the hosted backend: garment image uploads go
//! to object storage, garment and outfit rows live in the relational store
//! behind its REST interface. Calls are simple insert/select/delete
//! requests; there is no transaction spanning the upload and the row
//! insert, so a failed insert leaves the uploaded object in place.

use crate::{
    config::StorageConfig,
    error::{OutfitError, Result},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Clothing categories a garment row can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentKind {
    /// Upper-body garment
    Top,
    /// Lower-body garment
    Bottom,
}

impl GarmentKind {
    /// Stable lowercase name, matching the stored column value
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl std::str::FromStr for GarmentKind {
    type Err = OutfitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            other => Err(OutfitError::invalid_field(
                "kind",
                &format!("'{other}' is not a garment kind (expected 'top' or 'bottom')"),
            )),
        }
    }
}

impl std::fmt::Display for GarmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored clothing item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarmentRecord {
    /// Row id assigned by the store
    pub id: String,
    /// Owning user
    pub owner_id: String,
    /// Clothing category
    pub kind: GarmentKind,
    /// Public URL of the uploaded image
    pub image_url: String,
    /// Row creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One stored outfit: two garment references plus an optional generated
/// try-on image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutfitRecord {
    /// Row id assigned by the store
    pub id: String,
    /// Owning user
    pub owner_id: String,
    /// Upper-body garment reference
    pub top_id: String,
    /// Lower-body garment reference
    pub bottom_id: String,
    /// Generated try-on image URL, when one was produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Row creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct NewGarment<'a> {
    owner_id: &'a str,
    kind: GarmentKind,
    image_url: &'a str,
}

#[derive(Debug, Serialize)]
struct NewOutfit<'a> {
    owner_id: &'a str,
    top_id: &'a str,
    bottom_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
}

/// Client for the hosted store's REST and storage interfaces.
///
/// Constructed explicitly and passed into handlers; there is no ambient
/// global client handle.
pub struct WardrobeStore {
    http: reqwest::Client,
    config: StorageConfig,
}

impl WardrobeStore {
    /// Create a store client for the given settings
    ///
    /// # Errors
    ///
    /// Returns `OutfitError` when the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: StorageConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OutfitError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.base_url)
    }

    /// Upload garment image bytes to object storage and return the public
    /// URL. The caller provides a unique object name.
    pub async fn upload_garment_image(
        &self,
        owner_id: &str,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let object_path = format!("{owner_id}/{object_name}");
        let upload_url = format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url, self.config.bucket, object_path
        );

        debug!(path = %object_path, bytes = bytes.len(), "uploading garment image");
        let response = self
            .authed(self.http.post(&upload_url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| OutfitError::storage_op("upload garment image", &e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OutfitError::storage_op(
                "upload garment image",
                &format!("HTTP {status}: {body}"),
            ));
        }

        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base_url, self.config.bucket, object_path
        ))
    }

    /// Insert a garment row and return it
    pub async fn insert_garment(
        &self,
        owner_id: &str,
        kind: GarmentKind,
        image_url: &str,
    ) -> Result<GarmentRecord> {
        let row = NewGarment {
            owner_id,
            kind,
            image_url,
        };
        let record: GarmentRecord = self
            .insert_row("garments", &row)
            .await?;
        info!(id = %record.id, %kind, "garment stored");
        Ok(record)
    }

    /// List garments belonging to an owner, newest first
    pub async fn list_garments(&self, owner_id: &str) -> Result<Vec<GarmentRecord>> {
        self.select_rows("garments", owner_id).await
    }

    /// Delete a garment row by id
    pub async fn delete_garment(&self, id: &str) -> Result<()> {
        let response = self
            .authed(self.http.delete(self.rest_url("garments")))
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await
            .map_err(|e| OutfitError::storage_op("delete garment", &e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OutfitError::storage_op(
                "delete garment",
                &format!("HTTP {status}: {body}"),
            ));
        }
        Ok(())
    }

    /// Insert an outfit row referencing two garments and return it
    pub async fn insert_outfit(
        &self,
        owner_id: &str,
        top_id: &str,
        bottom_id: &str,
        image_url: Option<&str>,
    ) -> Result<OutfitRecord> {
        let row = NewOutfit {
            owner_id,
            top_id,
            bottom_id,
            image_url,
        };
        let record: OutfitRecord = self.insert_row("outfits", &row).await?;
        info!(id = %record.id, "outfit stored");
        Ok(record)
    }

    /// List outfits belonging to an owner, newest first
    pub async fn list_outfits(&self, owner_id: &str) -> Result<Vec<OutfitRecord>> {
        self.select_rows("outfits", owner_id).await
    }

    async fn insert_row<B, R>(&self, table: &str, row: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .authed(self.http.post(self.rest_url(table)))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await
            .map_err(|e| OutfitError::storage_op(&format!("insert into {table}"), &e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OutfitError::storage_op(
                &format!("insert into {table}"),
                &format!("HTTP {status}: {body}"),
            ));
        }

        // The store answers representation requests with a one-row array
        let mut rows: Vec<R> = response.json().await.map_err(|e| {
            OutfitError::storage_op(&format!("insert into {table}"), &e.to_string())
        })?;
        rows.pop().ok_or_else(|| {
            OutfitError::storage_op(&format!("insert into {table}"), "no row returned")
        })
    }

    async fn select_rows<R>(&self, table: &str, owner_id: &str) -> Result<Vec<R>>
    where
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .authed(self.http.get(self.rest_url(table)))
            .query(&[
                ("owner_id", format!("eq.{owner_id}")),
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await
            .map_err(|e| OutfitError::storage_op(&format!("select from {table}"), &e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OutfitError::storage_op(
                &format!("select from {table}"),
                &format!("HTTP {status}: {body}"),
            ));
        }

        response.json().await.map_err(|e| {
            OutfitError::storage_op(&format!("select from {table}"), &e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_garment_kind_parse() {
        assert_eq!(GarmentKind::from_str("top").unwrap(), GarmentKind::Top);
        assert_eq!(GarmentKind::from_str("BOTTOM").unwrap(), GarmentKind::Bottom);

        let err = GarmentKind::from_str("hat").unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!(err.to_string().contains("hat"));
    }

    #[test]
    fn test_garment_record_serde() {
        let json = r#"{
            "id": "g-1",
            "owner_id": "user-9",
            "kind": "top",
            "image_url": "https://store.example/wardrobe/user-9/shirt.png",
            "created_at": "2026-01-15T10:30:00Z"
        }"#;
        let record: GarmentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, GarmentKind::Top);
        assert!(record.created_at.is_some());

        // Rows without timestamps (not yet committed) still parse
        let json = r#"{"id":"g-2","owner_id":"u","kind":"bottom","image_url":"x"}"#;
        let record: GarmentRecord = serde_json::from_str(json).unwrap();
        assert!(record.created_at.is_none());
    }

    #[test]
    fn test_new_outfit_omits_missing_image() {
        let row = NewOutfit {
            owner_id: "u",
            top_id: "t",
            bottom_id: "b",
            image_url: None,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(!json.contains("image_url"));
    }
}
