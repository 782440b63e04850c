//! HTTP surface of the outfit generation service
//!
//! All state handed to handlers is built up-front from [`AppConfig`] and
//! injected through axum's `State` extractor: one generative client, plus
//! optional store and vectorizer clients for the account and sub-app
//! features. Handlers never reach for ambient globals.

pub mod generate;
#[cfg(feature = "vectorize")]
pub mod vectorize;
pub mod wardrobe;

use crate::{
    config::AppConfig,
    error::{OutfitError, Result},
    gemini::{GeminiClient, ImageGenerator},
    wardrobe::WardrobeStore,
};
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::{error, warn};

/// Default request body limit; generation requests carry multiple base64
/// images, so this sits well above typical photo sizes.
pub const DEFAULT_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Shared handler state: explicitly constructed clients, cloned per request
#[derive(Clone)]
pub struct AppState {
    /// Generative-image provider client
    pub generator: Arc<dyn ImageGenerator>,

    /// Hosted store client, when the account features are configured
    pub store: Option<Arc<WardrobeStore>>,

    /// Vectorizer client, when the sub-app is configured
    #[cfg(feature = "vectorize")]
    pub vectorizer: Option<Arc<crate::vectorize::VectorizerClient>>,
}

impl AppState {
    /// Build handler state from the service configuration
    ///
    /// # Errors
    ///
    /// Returns `OutfitError` when a client cannot be constructed. Missing
    /// credentials are not an error here; they surface per request.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let generator: Arc<dyn ImageGenerator> =
            Arc::new(GeminiClient::new(config.gemini.clone())?);

        let store = match &config.storage {
            Some(storage) => Some(Arc::new(WardrobeStore::new(storage.clone())?)),
            None => None,
        };

        #[cfg(feature = "vectorize")]
        let vectorizer = match &config.vectorizer {
            Some(settings) => Some(Arc::new(crate::vectorize::VectorizerClient::new(
                settings.clone(),
            )?)),
            None => None,
        };

        Ok(Self {
            generator,
            store,
            #[cfg(feature = "vectorize")]
            vectorizer,
        })
    }

    /// The store client, or a configuration error when the account
    /// features are not set up
    pub(crate) fn store(&self) -> Result<&WardrobeStore> {
        self.store.as_deref().ok_or_else(|| {
            OutfitError::invalid_config("hosted store is not configured; wardrobe is unavailable")
        })
    }

    /// The vectorizer client, or a configuration error when the sub-app is
    /// not set up
    #[cfg(feature = "vectorize")]
    pub(crate) fn vectorizer(&self) -> Result<&crate::vectorize::VectorizerClient> {
        self.vectorizer.as_deref().ok_or_else(|| {
            OutfitError::invalid_config("vectorizer is not configured; vectorization is unavailable")
        })
    }
}

/// Build the service router with the given state and body limit
pub fn router(state: AppState, body_limit: usize) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/generate/try-on", post(generate::try_on))
        .route("/api/generate/garment", post(generate::garment))
        .route("/api/generate/pose", post(generate::pose))
        .route("/api/background/remove", post(generate::background_remove))
        .route(
            "/api/wardrobe",
            post(wardrobe::upload_garment).get(wardrobe::list_garments),
        )
        .route("/api/wardrobe/:id", delete(wardrobe::delete_garment))
        .route(
            "/api/outfits",
            post(wardrobe::create_outfit).get(wardrobe::list_outfits),
        );

    #[cfg(feature = "vectorize")]
    let router = router.route("/api/vectorize", post(vectorize::vectorize_image));

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

impl IntoResponse for OutfitError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ProviderErrorKind};

    #[test]
    fn test_error_response_status_codes() {
        let response = OutfitError::invalid_request("bad payload").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = OutfitError::from(ProviderError::new(
            ProviderErrorKind::QuotaExceeded,
            "quota exceeded",
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = OutfitError::from(ProviderError::empty_response()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
