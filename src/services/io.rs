//! Image payload decoding and data-URI handling
//!
//! Every image enters the service as a base64 payload with a declared MIME
//! type (JSON endpoints) or as raw multipart bytes. The helpers here
//! validate and decode those payloads at the request boundary so malformed
//! input is always a client error, never an internal one.

use crate::error::{OutfitError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::DynamicImage;
use std::path::Path;

/// MIME types accepted for uploaded and inlined images
pub const ALLOWED_IMAGE_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// A decoded image payload: the bitmap plus the raw bytes it came from
#[derive(Debug, Clone)]
pub struct DecodedPayload {
    /// Decoded bitmap
    pub image: DynamicImage,
    /// Raw image bytes, as decoded from base64
    pub bytes: Vec<u8>,
    /// Declared MIME type
    pub mime_type: String,
}

/// Service for image input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Decode an image from raw bytes
    pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| {
            OutfitError::processing(format!("failed to decode image from bytes: {e}"))
        })
    }

    /// Load an image from a file path
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();
        image::open(path_ref).map_err(|e| {
            OutfitError::processing(format!(
                "failed to load image '{}': {e}",
                path_ref.display()
            ))
        })
    }

    /// Validate and decode a base64 image payload from a request.
    ///
    /// Accepts either a bare base64 string or a full `data:` URI; the
    /// declared MIME type must be one of [`ALLOWED_IMAGE_MIME_TYPES`] and
    /// the decoded bytes must parse as an image. Every failure here is an
    /// invalid-request error (HTTP 400).
    pub fn decode_base64_payload(mime_type: &str, data: &str) -> Result<DecodedPayload> {
        if !ALLOWED_IMAGE_MIME_TYPES.contains(&mime_type) {
            return Err(OutfitError::invalid_request(format!(
                "unsupported image MIME type '{mime_type}' (expected one of: {})",
                ALLOWED_IMAGE_MIME_TYPES.join(", ")
            )));
        }

        // Tolerate clients sending the preview data URI unchanged
        let payload = Self::split_data_uri(data).map_or(data, |(_, payload)| payload);

        let bytes = BASE64.decode(payload.trim()).map_err(|e| {
            OutfitError::invalid_request(format!("image data is not valid base64: {e}"))
        })?;

        if bytes.is_empty() {
            return Err(OutfitError::invalid_request("image data is empty"));
        }

        let image = image::load_from_memory(&bytes).map_err(|e| {
            OutfitError::invalid_request(format!("image data is not a decodable image: {e}"))
        })?;

        Ok(DecodedPayload {
            image,
            bytes,
            mime_type: mime_type.to_string(),
        })
    }

    /// Encode bytes as a base64 data URI
    #[must_use]
    pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
        format!("data:{mime_type};base64,{}", BASE64.encode(bytes))
    }

    /// Split a `data:` URI into its MIME type and base64 payload
    #[must_use]
    pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
        let rest = uri.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        Some((mime, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn png_base64() -> String {
        let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 255]));
        let mut bytes = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut bytes);
        DynamicImage::ImageRgba8(image)
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
        BASE64.encode(bytes)
    }

    #[test]
    fn test_decode_valid_payload() {
        let payload = ImageIOService::decode_base64_payload("image/png", &png_base64()).unwrap();
        assert_eq!(payload.image.dimensions(), (2, 2));
        assert_eq!(payload.mime_type, "image/png");
        assert!(!payload.bytes.is_empty());
    }

    #[test]
    fn test_decode_accepts_data_uri() {
        let uri = format!("data:image/png;base64,{}", png_base64());
        let payload = ImageIOService::decode_base64_payload("image/png", &uri).unwrap();
        assert_eq!(payload.image.dimensions(), (2, 2));
    }

    #[test]
    fn test_malformed_base64_is_invalid_request() {
        let err =
            ImageIOService::decode_base64_payload("image/png", "!!not-base64!!").unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn test_valid_base64_invalid_image_is_invalid_request() {
        let garbage = BASE64.encode(b"clearly not an image");
        let err = ImageIOService::decode_base64_payload("image/png", &garbage).unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_unsupported_mime_type_is_invalid_request() {
        let err = ImageIOService::decode_base64_payload("image/gif", &png_base64()).unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!(err.to_string().contains("image/gif"));
    }

    #[test]
    fn test_data_uri_roundtrip() {
        let uri = ImageIOService::to_data_uri("image/png", &[1, 2, 3]);
        let (mime, payload) = ImageIOService::split_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(BASE64.decode(payload).unwrap(), vec![1, 2, 3]);
    }
}
