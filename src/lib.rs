pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::MediaConfig;
use crate::services::media_service::MediaService;
use crate::services::storage::StorageService;
use axum::{
    Router,
    http::{HeaderValue, header},
    middleware::from_fn,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::legacy::legacy_upload,
        api::handlers::media::hash::get_media_hash,
        api::handlers::media::upload::upload_media,
        api::handlers::media::upload::upload_multiple_media,
        api::handlers::media::delete::delete_media,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::media::FileUploadForm,
            api::handlers::media::MultiFileUploadForm,
            api::handlers::media::LegacyUploadResponse,
            api::handlers::media::HashResponse,
            api::handlers::media::MediaUploadResponse,
            api::handlers::media::BatchItemResponse,
            api::handlers::media::BatchUploadResponse,
            api::handlers::media::DeleteMediaRequest,
            api::handlers::media::MessageResponse,
        )
    ),
    tags(
        (name = "media", description = "Media upload, fingerprint and deletion endpoints"),
        (name = "legacy", description = "Flat upload route kept for older clients"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageService>,
    pub media_service: Arc<MediaService>,
    pub config: MediaConfig,
}

impl AppState {
    pub fn new(storage: Arc<dyn StorageService>, config: MediaConfig) -> Self {
        let media_service = Arc::new(MediaService::new(storage.clone(), config.clone()));
        Self {
            storage,
            media_service,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let media_routes = Router::new()
        .route("/hash", post(api::handlers::media::get_media_hash))
        .route("/upload", post(api::handlers::media::upload_media))
        .route(
            "/upload-multiple",
            post(api::handlers::media::upload_multiple_media),
        )
        .route("/", delete(api::handlers::media::delete_media))
        .route("/delete", post(api::handlers::media::delete_media));

    let mut app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/upload", post(api::handlers::legacy::legacy_upload))
        .nest("/api/media", media_routes);

    if state.config.serve_uploads {
        tracing::info!(
            "Serving uploads locally at /{}",
            services::path_resolver::PUBLIC_PREFIX
        );
        app = app.nest_service("/uploads", ServeDir::new(&state.config.upload_root));
    }

    app.layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .layer(axum::extract::DefaultBodyLimit::max(state.config.body_limit()))
        .with_state(state)
}

fn cors_layer(config: &MediaConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
