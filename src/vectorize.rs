//! Image-to-vector sub-app
//!
//! Unrelated to the try-on flow: forwards a raster image to a commercial
//! vectorization API and hands the raw upstream response back so the HTTP
//! layer can stream the vector bytes and pass the usage-credit headers
//! through verbatim.

use crate::{
    config::VectorizerConfig,
    error::{OutfitError, Result},
};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Response headers copied through to the client unchanged
pub const CREDIT_HEADERS: &[&str] = &["x-credits-charged", "x-credits-calculated"];

/// Vector output formats the API can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorFormat {
    Svg,
    Eps,
    Pdf,
    Dxf,
    Png,
}

impl VectorFormat {
    /// Format name as the API expects it
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Eps => "eps",
            Self::Pdf => "pdf",
            Self::Dxf => "dxf",
            Self::Png => "png",
        }
    }
}

impl std::str::FromStr for VectorFormat {
    type Err = OutfitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "eps" => Ok(Self::Eps),
            "pdf" => Ok(Self::Pdf),
            "dxf" => Ok(Self::Dxf),
            "png" => Ok(Self::Png),
            other => Err(OutfitError::invalid_field(
                "format",
                &format!("'{other}' is not a supported vector format"),
            )),
        }
    }
}

impl Default for VectorFormat {
    fn default() -> Self {
        Self::Svg
    }
}

/// Processing mode passed through to the API (test runs are free but
/// watermarked)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorizeMode {
    Production,
    Preview,
    Test,
}

impl VectorizeMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Preview => "preview",
            Self::Test => "test",
        }
    }
}

impl std::str::FromStr for VectorizeMode {
    type Err = OutfitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "preview" => Ok(Self::Preview),
            "test" => Ok(Self::Test),
            other => Err(OutfitError::invalid_field(
                "mode",
                &format!("'{other}' is not a vectorization mode"),
            )),
        }
    }
}

impl Default for VectorizeMode {
    fn default() -> Self {
        Self::Production
    }
}

/// Options forwarded with a vectorization request
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorizeOptions {
    /// Requested output format
    pub format: VectorFormat,
    /// Processing mode
    pub mode: VectorizeMode,
}

/// Client for the commercial vectorization API
pub struct VectorizerClient {
    http: reqwest::Client,
    config: VectorizerConfig,
}

impl VectorizerClient {
    /// Create a client for the given settings
    ///
    /// # Errors
    ///
    /// Returns `OutfitError` when the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OutfitError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn ensure_credentials(&self) -> Result<()> {
        if self.config.api_id.is_empty() || self.config.api_secret.is_empty() {
            return Err(OutfitError::invalid_config(
                "vectorizer credentials are not set; vectorization is unavailable",
            ));
        }
        Ok(())
    }

    /// Forward image bytes to the vectorization API.
    ///
    /// Returns the raw upstream response: the caller streams the body and
    /// copies the status and credit headers through unchanged, including
    /// upstream error statuses.
    ///
    /// # Errors
    ///
    /// Returns `OutfitError` for missing credentials or transport failures;
    /// upstream HTTP errors are not an `Err` here, they travel back inside
    /// the response.
    pub async fn vectorize(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        options: VectorizeOptions,
    ) -> Result<reqwest::Response> {
        self.ensure_credentials()?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| {
                OutfitError::invalid_request(format!("invalid upload content type: {e}"))
            })?;
        let form = reqwest::multipart::Form::new()
            .part("image", part)
            .text("mode", options.mode.as_str())
            .text("output.file_format", options.format.as_str());

        debug!(
            format = options.format.as_str(),
            mode = options.mode.as_str(),
            "forwarding image to vectorization API"
        );

        self.http
            .post(&self.config.endpoint)
            .basic_auth(&self.config.api_id, Some(&self.config.api_secret))
            .multipart(form)
            .send()
            .await
            .map_err(|e| OutfitError::internal(format!("vectorization request failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_vector_format_parse() {
        assert_eq!(VectorFormat::from_str("svg").unwrap(), VectorFormat::Svg);
        assert_eq!(VectorFormat::from_str("DXF").unwrap(), VectorFormat::Dxf);
        assert_eq!(VectorFormat::default(), VectorFormat::Svg);

        let err = VectorFormat::from_str("tiff").unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn test_vectorize_mode_parse() {
        assert_eq!(VectorizeMode::from_str("test").unwrap(), VectorizeMode::Test);
        assert!(VectorizeMode::from_str("dry-run").is_err());
    }

    #[test]
    fn test_missing_credentials_is_config_error() {
        let client = VectorizerClient::new(VectorizerConfig {
            api_id: String::new(),
            api_secret: String::new(),
            endpoint: "https://vectorizer.example/api".to_string(),
        })
        .unwrap();
        let err = client.ensure_credentials().unwrap_err();
        assert_eq!(err.http_status(), 500);
    }
}
