//! Configuration types for the outfit generation service

use serde::{Deserialize, Serialize};
use std::env;

/// Output image format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    Png,
    /// JPEG (no transparency, alpha flattened on encode)
    Jpeg,
    /// WebP with alpha channel transparency
    WebP,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Png
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::Jpeg => write!(f, "jpeg"),
            Self::WebP => write!(f, "webp"),
        }
    }
}

/// Generative-image provider settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key; may be empty, in which case requests fail with a
    /// configuration error at call time
    pub api_key: String,

    /// Model identifier to invoke
    pub model: String,

    /// API base URL (overridable for testing)
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash-image-preview".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl GeminiConfig {
    /// Read provider settings from the environment.
    ///
    /// `GEMINI_API_KEY` is required for requests to succeed but its absence
    /// is not an error here; it surfaces as a configuration error on first
    /// use, matching the per-request credential check of the service.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
        }
    }
}

/// Hosted store settings (object storage + relational rows)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the hosted backend
    pub base_url: String,

    /// Service role key used for both storage and row access
    pub service_key: String,

    /// Object storage bucket for garment images
    pub bucket: String,
}

impl StorageConfig {
    /// Read hosted-store settings from the environment; `None` when the
    /// account/storage features are not configured (they are optional).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("SUPABASE_URL").ok()?;
        let service_key = env::var("SUPABASE_SERVICE_ROLE_KEY").ok()?;
        Some(Self {
            base_url,
            service_key,
            bucket: env::var("WARDROBE_BUCKET").unwrap_or_else(|_| "wardrobe".to_string()),
        })
    }
}

/// Vectorization API settings (the embedded image-to-vector sub-app)
#[cfg(feature = "vectorize")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// API id for basic authentication
    pub api_id: String,

    /// API secret for basic authentication
    pub api_secret: String,

    /// Vectorization endpoint
    pub endpoint: String,
}

#[cfg(feature = "vectorize")]
impl VectorizerConfig {
    /// Read vectorizer settings from the environment; `None` when the
    /// sub-app is not configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_id = env::var("VECTORIZER_API_ID").ok()?;
        let api_secret = env::var("VECTORIZER_API_SECRET").ok()?;
        Some(Self {
            api_id,
            api_secret,
            endpoint: env::var("VECTORIZER_ENDPOINT")
                .unwrap_or_else(|_| "https://vectorizer.ai/api/v1/vectorize".to_string()),
        })
    }
}

/// Complete service configuration, assembled from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Generative-image provider settings
    pub gemini: GeminiConfig,

    /// Hosted store settings, when configured
    pub storage: Option<StorageConfig>,

    /// Vectorizer settings, when configured
    #[cfg(feature = "vectorize")]
    pub vectorizer: Option<VectorizerConfig>,
}

impl AppConfig {
    /// Assemble the configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            gemini: GeminiConfig::from_env(),
            storage: StorageConfig::from_env(),
            #[cfg(feature = "vectorize")]
            vectorizer: VectorizerConfig::from_env(),
        }
    }
}
