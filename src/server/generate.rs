//! Generation and background-editing handlers
//!
//! The generation endpoints validate their payloads, optionally run the
//! local pixel pipeline on garment images, and forward to the generative
//! provider; provider failures come back with the status codes recovered
//! from the provider message. The background-removal endpoint runs entirely
//! locally.

use super::AppState;
use crate::{
    config::OutputFormat,
    error::{OutfitError, Result},
    gemini::{prompts, GenerationRequest, ImagePayload},
    processor::{BackgroundProcessor, ProcessorConfig},
    services::ImageIOService,
    wardrobe::GarmentKind,
};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One garment image with its slot in the outfit
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentImage {
    /// Which slot this garment fills
    pub slot: GarmentKind,
    /// The garment image payload
    #[serde(flatten)]
    pub image: ImagePayload,
}

/// Request body for the virtual try-on endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnRequest {
    /// The person photo
    pub person: ImagePayload,
    /// Garment images, one per slot
    pub garments: Vec<GarmentImage>,
    /// Run the local garment-whitening pass before forwarding
    #[serde(default)]
    pub normalize_garment_backgrounds: bool,
}

/// Background treatment for garment extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundTreatment {
    /// Flat white background
    White,
    /// Transparent background
    Transparent,
}

impl Default for BackgroundTreatment {
    fn default() -> Self {
        Self::White
    }
}

impl BackgroundTreatment {
    fn describe(self) -> &'static str {
        match self {
            Self::White => "pure white",
            Self::Transparent => "transparent",
        }
    }
}

/// Request body for the garment extraction endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GarmentCleanupRequest {
    /// Photo containing the garment
    pub image: ImagePayload,
    /// Requested background treatment
    #[serde(default)]
    pub background: BackgroundTreatment,
}

/// Request body for the pose normalization endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseRequest {
    /// The person photo
    pub person: ImagePayload,
}

/// Response carrying one generated image as a data URI
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImageResponse {
    /// Generated image as a `data:` URI
    pub image: String,
}

/// Request body for the local background-removal endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundRemovalRequest {
    /// Image to process
    pub image: ImagePayload,
    /// Pipeline configuration; defaults to the portrait cutout preset
    #[serde(default = "default_removal_config")]
    pub config: ProcessorConfig,
}

fn default_removal_config() -> ProcessorConfig {
    ProcessorConfig::portrait_cutout()
}

/// Response of the local background-removal endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundRemovalResponse {
    /// Processed image as a `data:` URI
    pub image: String,
    /// Policy that produced the mask
    pub policy: String,
    /// Composite mode that was applied
    pub mode: String,
    /// Fraction of pixels classified as background
    pub background_ratio: f32,
}

/// `POST /api/generate/try-on`
pub async fn try_on(
    State(state): State<AppState>,
    Json(request): Json<TryOnRequest>,
) -> Result<Json<GeneratedImageResponse>> {
    if request.garments.is_empty() {
        return Err(OutfitError::invalid_request(
            "at least one garment image is required",
        ));
    }

    ImageIOService::decode_base64_payload(&request.person.mime_type, &request.person.data)?;

    let whitener = if request.normalize_garment_backgrounds {
        Some(BackgroundProcessor::new(ProcessorConfig::garment_whitening())?)
    } else {
        None
    };

    let mut images = Vec::with_capacity(request.garments.len() + 1);
    images.push(request.person.clone());

    let mut slots = Vec::with_capacity(request.garments.len());
    for garment in &request.garments {
        let decoded =
            ImageIOService::decode_base64_payload(&garment.image.mime_type, &garment.image.data)?;
        slots.push(garment.slot);

        if let Some(whitener) = &whitener {
            let processed = whitener.process_image(&decoded.image)?;
            let bytes = processed.to_bytes(OutputFormat::Png, 90)?;
            images.push(ImagePayload::from_bytes("image/png", &bytes));
        } else {
            images.push(garment.image.clone());
        }
    }

    info!(
        garments = slots.len(),
        normalized = request.normalize_garment_backgrounds,
        "try-on generation requested"
    );

    let generated = state
        .generator
        .generate(&GenerationRequest {
            prompt: prompts::try_on(&slots),
            images,
        })
        .await?;

    Ok(Json(GeneratedImageResponse {
        image: generated.to_data_uri(),
    }))
}

/// `POST /api/generate/garment`
pub async fn garment(
    State(state): State<AppState>,
    Json(request): Json<GarmentCleanupRequest>,
) -> Result<Json<GeneratedImageResponse>> {
    ImageIOService::decode_base64_payload(&request.image.mime_type, &request.image.data)?;

    let generated = state
        .generator
        .generate(&GenerationRequest {
            prompt: prompts::garment_extraction(request.background.describe()),
            images: vec![request.image],
        })
        .await?;

    Ok(Json(GeneratedImageResponse {
        image: generated.to_data_uri(),
    }))
}

/// `POST /api/generate/pose`
pub async fn pose(
    State(state): State<AppState>,
    Json(request): Json<PoseRequest>,
) -> Result<Json<GeneratedImageResponse>> {
    ImageIOService::decode_base64_payload(&request.person.mime_type, &request.person.data)?;

    let generated = state
        .generator
        .generate(&GenerationRequest {
            prompt: prompts::pose_normalization(),
            images: vec![request.person],
        })
        .await?;

    Ok(Json(GeneratedImageResponse {
        image: generated.to_data_uri(),
    }))
}

/// `POST /api/background/remove` — local pixel pipeline, no provider call
pub async fn background_remove(
    State(_state): State<AppState>,
    Json(request): Json<BackgroundRemovalRequest>,
) -> Result<Json<BackgroundRemovalResponse>> {
    let payload = ImageIOService::decode_base64_payload(&request.image.mime_type, &request.image.data)?;

    // Out-of-range cutoffs came from the request body here, so they are the
    // client's mistake, not a deployment one
    let processor = BackgroundProcessor::new(request.config).map_err(|e| match e {
        OutfitError::InvalidConfig(message) => OutfitError::invalid_request(message),
        other => other,
    })?;
    let result = processor.process_image(&payload.image)?;
    let stats = result.mask.statistics();

    let output_format = processor.config().output_format;
    let quality = processor.config().jpeg_quality;

    Ok(Json(BackgroundRemovalResponse {
        image: result.to_data_uri(output_format, quality)?,
        policy: result.metadata.policy.clone(),
        mode: result.metadata.mode.clone(),
        background_ratio: stats.background_ratio,
    }))
}
