// Route exports
pub mod dogs;
pub mod matches;

use actix_web::dev::Payload;
use actix_web::{error, http::header, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse, Responder};
use std::future::{ready, Ready};
use std::sync::Arc;

use crate::config::{CacheSettings, MatchingSettings};
use crate::core::{DiscoverLimits, EngineError, MatchEngine, ProfileService};
use crate::models::{Caller, ErrorResponse, HealthResponse};
use crate::services::{AuthError, MatchStore, ProfileCache, ProfileStore, TokenVerifier};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: MatchEngine,
    pub profiles: ProfileService,
    pub store: Arc<dyn MatchStore>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Wire the engine and profile service over the given stores.
    /// Profile reads go through a moka cache.
    pub fn new(
        profile_store: Arc<dyn ProfileStore>,
        match_store: Arc<dyn MatchStore>,
        verifier: Arc<TokenVerifier>,
        matching: &MatchingSettings,
        cache: &CacheSettings,
    ) -> Self {
        let profiles: Arc<dyn ProfileStore> = Arc::new(ProfileCache::new(
            profile_store,
            cache.profile_cache_size,
            cache.ttl_secs,
        ));

        let limits = DiscoverLimits {
            default_limit: matching.discover_default_limit,
            max_limit: matching.discover_max_limit,
        };

        Self {
            engine: MatchEngine::new(profiles.clone(), match_store.clone(), limits),
            profiles: ProfileService::new(profiles, matching.feed_limit),
            store: match_store,
            verifier,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .configure(dogs::configure)
        .configure(matches::configure);
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.store.health_check().await.unwrap_or(false);

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// JSON error returned from extractors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.error.clone(),
            message: self.message.clone(),
            status_code: self.status_code,
        })
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Extractor configs shared by the server and the test harness
pub fn json_config() -> web::JsonConfig {
    // Dog images may be sent inline as data URIs
    web::JsonConfig::default()
        .limit(16 * 1024 * 1024)
        .error_handler(handle_json_payload_error)
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(handle_query_payload_error)
}

impl FromRequest for Caller {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            tracing::error!("AppState missing while authenticating {}", req.path());
            return ready(Err(error::ErrorInternalServerError("application state missing")));
        };

        let auth_header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let result: Result<Caller, actix_web::Error> = state.verifier.verify_header(auth_header).map_err(|e: AuthError| {
            tracing::debug!("Rejected request to {}: {}", req.path(), e);
            JsonError {
                error: "unauthorized".to_string(),
                message: e.to_string(),
                status_code: 401,
            }
            .into()
        });

        ready(result)
    }
}

/// Map an engine error to its HTTP response
pub(crate) fn engine_error_response(err: &EngineError) -> HttpResponse {
    let (status, label) = match err {
        EngineError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
        EngineError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
        EngineError::Forbidden(_) => (StatusCode::FORBIDDEN, "Forbidden"),
        EngineError::Store(e) => {
            tracing::error!("Store failure: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    };

    HttpResponse::build(status).json(ErrorResponse {
        error: label.to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}
