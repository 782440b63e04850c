//! Generative-image API client
//!
//! Thin wrapper over the hosted Gemini image generation endpoint. Requests
//! carry images as base64 inline data plus a text instruction; responses
//! carry generated images the same way. Failures are translated into
//! [`ProviderError`] categories by substring-matching the provider message.
//! Nothing is retried; the caller re-triggers the action manually.

use crate::{
    config::GeminiConfig,
    error::{OutfitError, ProviderError, Result},
    services::ImageIOService,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Request timeout for generation calls; image generation is slow but a
/// stuck call should still surface as a timeout rather than hang the client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// An image carried in a request or response as base64 with a declared
/// MIME type. This is both the public payload shape of the service's own
/// JSON API and the provider's inline-data shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    /// Declared MIME type, e.g. `image/png`
    pub mime_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

impl ImagePayload {
    /// Build a payload from raw image bytes
    #[must_use]
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: BASE64.encode(bytes),
        }
    }
}

/// One generation request: an instruction plus the images it operates on
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Text instruction for the model
    pub prompt: String,
    /// Input images, in the order the prompt refers to them
    pub images: Vec<ImagePayload>,
}

/// A generated image returned by the provider
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// MIME type reported by the provider
    pub mime_type: String,
    /// Decoded image bytes
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    /// Encode as a base64 data URI for JSON transport
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        ImageIOService::to_data_uri(&self.mime_type, &self.bytes)
    }
}

/// Abstraction over the generative-image provider, so handlers depend on an
/// injected client instance rather than an ambient global.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Run one generation request and return the first produced image
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage>;
}

/// Client for the Gemini `generateContent` REST endpoint
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client for the given provider settings.
    ///
    /// # Errors
    ///
    /// Returns `OutfitError` when the underlying HTTP client cannot be
    /// constructed. A missing API key is not an error here; it surfaces on
    /// the first request.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OutfitError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn ensure_credentials(&self) -> Result<()> {
        if self.config.api_key.is_empty() {
            return Err(OutfitError::invalid_config(
                "GEMINI_API_KEY is not set; image generation is unavailable",
            ));
        }
        Ok(())
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        self.ensure_credentials()?;

        let body = GenerateContentBody::from_request(request);
        debug!(
            model = %self.config.model,
            images = request.images.len(),
            "sending generation request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = parse_error_message(&text)
                .unwrap_or_else(|| format!("provider returned HTTP {status}: {text}"));
            return Err(ProviderError::classify(message).into());
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::classify(format!("unreadable provider response: {e}")))?;

        let image = extract_image(parsed)?;
        info!(
            mime_type = %image.mime_type,
            bytes = image.bytes.len(),
            "generation complete"
        );
        Ok(image)
    }
}

// Wire types for the generateContent endpoint. Field names follow the
// provider's camelCase JSON.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentBody {
    fn from_request(request: &GenerationRequest) -> Self {
        let mut parts: Vec<Part> = request
            .images
            .iter()
            .map(|image| Part {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data.clone(),
                }),
            })
            .collect();
        parts.push(Part {
            text: Some(request.prompt.clone()),
            inline_data: None,
        });

        Self {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Successful provider response
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Build a response carrying a single inline image (test support)
    #[must_use]
    pub fn with_inline_image(mime_type: &str, data: &str) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    parts: vec![Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: mime_type.to_string(),
                            data: data.to_string(),
                        }),
                    }],
                }),
            }],
        }
    }

    /// Build a response with no candidates (test support)
    #[must_use]
    pub fn empty() -> Self {
        Self { candidates: vec![] }
    }
}

/// Pull the first inline image out of a provider response.
///
/// # Errors
///
/// A response without a usable image part is an empty-response provider
/// error; inline data that fails base64 decoding is classified from its
/// message.
pub fn extract_image(response: GenerateContentResponse) -> Result<GeneratedImage> {
    let inline = response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.inline_data);

    let Some(inline) = inline else {
        return Err(ProviderError::empty_response().into());
    };

    let bytes = BASE64.decode(inline.data.as_bytes()).map_err(|e| {
        ProviderError::classify(format!("provider returned undecodable image data: {e}"))
    })?;

    Ok(GeneratedImage {
        mime_type: inline.mime_type,
        bytes,
    })
}

/// Extract the human-readable message from a provider error body
fn parse_error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
        status: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let detail = parsed.error?;
    match (detail.status, detail.message) {
        (Some(status), Some(message)) => Some(format!("{status}: {message}")),
        (None, Some(message)) => Some(message),
        (Some(status), None) => Some(status),
        (None, None) => None,
    }
}

/// Prompt builders for the product's generation operations.
///
/// Kept next to the client so library users get the same instructions the
/// HTTP handlers send.
pub mod prompts {
    use crate::wardrobe::GarmentKind;

    /// Compose a virtual try-on from a person photo plus garment images.
    /// The person image is always sent first, garments after it in slot
    /// order.
    #[must_use]
    pub fn try_on(slots: &[GarmentKind]) -> String {
        let garment_list = slots
            .iter()
            .map(GarmentKind::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "The first image is a photo of a person. The following images are \
             clothing items ({garment_list}), in that order. Redraw the person \
             wearing all of these clothing items together as one outfit. Keep \
             the person's face, pose, body shape and the photo background \
             unchanged. Match fabric colors and textures to the clothing \
             images exactly. Return only the final image."
        )
    }

    /// Extract a garment from a photo and place it on the requested
    /// background.
    #[must_use]
    pub fn garment_extraction(background: &str) -> String {
        format!(
            "Extract the clothing item from this photo, removing the person, \
             hangers and any surroundings. Render the garment alone, neatly \
             laid out, on a {background} background. Preserve the garment's \
             exact color, pattern and shape. Return only the final image."
        )
    }

    /// Redraw the person in a standard standing pose
    #[must_use]
    pub fn pose_normalization() -> String {
        "Redraw the person in this photo standing straight in a neutral, \
         front-facing standing pose with arms relaxed at their sides. Keep \
         the face, hairstyle, clothing and background unchanged. Return only \
         the final image."
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_wire_shape() {
        let request = GenerationRequest {
            prompt: "make it so".to_string(),
            images: vec![ImagePayload {
                mime_type: "image/png".to_string(),
                data: "QUJD".to_string(),
            }],
        };
        let body = GenerateContentBody::from_request(&request);
        let json = serde_json::to_value(&body).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[0]["inlineData"]["data"], "QUJD");
        assert_eq!(parts[1]["text"], "make it so");
        assert_eq!(json["generationConfig"]["responseModalities"][0], "IMAGE");
    }

    #[test]
    fn test_extract_image_success() {
        let encoded = BASE64.encode(b"fake-image-bytes");
        let response = GenerateContentResponse::with_inline_image("image/png", &encoded);

        let image = extract_image(response).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, b"fake-image-bytes");
        assert!(image.to_data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_extract_image_no_candidates_is_empty_response() {
        let err = extract_image(GenerateContentResponse::empty()).unwrap_err();
        assert_eq!(err.http_status(), 500);
        assert!(err.to_string().contains("no response"));
    }

    #[test]
    fn test_extract_image_text_only_candidate() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"cannot comply"}]}}]}"#,
        )
        .unwrap();
        let err = extract_image(response).unwrap_err();
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn test_parse_error_message() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let message = parse_error_message(body).unwrap();
        assert_eq!(message, "RESOURCE_EXHAUSTED: Quota exceeded");

        assert!(parse_error_message("not json").is_none());
        assert!(parse_error_message("{}").is_none());
    }

    #[test]
    fn test_response_parsing_from_provider_json() {
        let json = format!(
            r#"{{"candidates":[{{"content":{{"parts":[{{"inlineData":{{"mimeType":"image/png","data":"{}"}}}}]}}}}]}}"#,
            BASE64.encode(b"png-bytes")
        );
        let response: GenerateContentResponse = serde_json::from_str(&json).unwrap();
        let image = extract_image(response).unwrap();
        assert_eq!(image.bytes, b"png-bytes");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        let err = client.ensure_credentials().unwrap_err();
        assert_eq!(err.http_status(), 500);
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_prompts_mention_slots() {
        let prompt = prompts::try_on(&[
            crate::wardrobe::GarmentKind::Top,
            crate::wardrobe::GarmentKind::Bottom,
        ]);
        assert!(prompt.contains("top, bottom"));

        let prompt = prompts::garment_extraction("pure white");
        assert!(prompt.contains("pure white"));
    }
}
