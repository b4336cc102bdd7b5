//! Shared application state and router construction.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::services::content_fetcher::ReadmeSource;
use crate::services::extractor::StructuredExtractor;
use crate::services::key_service::{KeyHasher, KeyService};
use crate::services::pipeline::SummarizePipeline;
use crate::services::validation_gate::ValidationGate;
use crate::store::CredentialStore;

/// State shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SummarizePipeline>,
    pub keys: KeyService,
    pub store: Arc<dyn CredentialStore>,
    pub hasher: KeyHasher,
    /// Keyed hash of the admin token. `None` disables key management.
    pub admin_token_hash: Option<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: KeyHasher,
        source: Arc<dyn ReadmeSource>,
        extractor: StructuredExtractor,
    ) -> Self {
        let gate = ValidationGate::new(store.clone(), hasher.clone());

        Self {
            pipeline: Arc::new(SummarizePipeline::new(gate, source, extractor)),
            keys: KeyService::new(store.clone(), hasher.clone()),
            store,
            hasher,
            admin_token_hash: None,
        }
    }

    /// Enable the key management routes, guarded by `token`.
    pub fn with_admin_token(mut self, token: &str) -> Self {
        self.admin_token_hash = Some(self.hasher.hash(token));
        self
    }
}

/// Build the HTTP router.
///
/// Public routes are always mounted. `/api/keys` is only mounted when an
/// admin token is configured, otherwise those paths are 404.
pub fn create_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/github-summarizer",
            post(handlers::summarize::summarize_repository),
        )
        .route(
            "/api/validate-key",
            post(handlers::validate_key::validate_key),
        );

    if state.admin_token_hash.is_some() {
        let admin_routes = Router::new()
            .route(
                "/api/keys",
                get(handlers::keys::list_keys).post(handlers::keys::create_key),
            )
            .route(
                "/api/keys/{id}",
                put(handlers::keys::update_key).delete(handlers::keys::delete_key),
            )
            // Apply the admin token check to every key management route
            .route_layer(axum_middleware::from_fn_with_state(
                state.clone(),
                middleware::auth::admin_auth,
            ));
        app = app.merge(admin_routes);
    }

    app
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
