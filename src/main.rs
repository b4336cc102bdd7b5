//! GitHub Summarizer - Main Application Entry Point
//!
//! Serves `POST /api/github-summarizer`: authenticate the caller's API key,
//! fetch the repository README from GitHub, and return a model-generated
//! summary with a list of notable facts.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Open the credential store (Postgres with migrations, or in memory)
//! 3. Build the README fetcher and the model client
//! 4. Build the HTTP router with routes and middleware
//! 5. Start server on configured port

use std::sync::Arc;

use github_summarizer::{
    app::{AppState, create_router},
    config, db,
    services::{
        content_fetcher::GithubReadmeFetcher, extractor::StructuredExtractor,
        generator::OpenAiChatGenerator, key_service::KeyHasher,
    },
    store::{CredentialStore, InMemoryCredentialStore, PgCredentialStore},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Open the credential store
    let store: Arc<dyn CredentialStore> = match &config.database_url {
        Some(database_url) => {
            let pool = db::create_pool(database_url).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgCredentialStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, API keys are kept in memory and lost on restart");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    // One HTTP client shared by the README fetcher and the model client
    let http = reqwest::Client::builder().build()?;

    let fetcher = GithubReadmeFetcher::new(http.clone(), config.github_api_url.clone())
        .with_token(config.github_token.clone())
        .with_max_bytes(config.max_readme_bytes)
        .with_timeout(config.fetch_timeout());

    let generator = OpenAiChatGenerator::new(
        http,
        &config.llm_api_url,
        config.llm_api_key.clone(),
        config.llm_model.clone(),
    );
    tracing::info!("Using model {}", generator.model());

    let extractor = StructuredExtractor::new(
        Arc::new(generator),
        config.llm_timeout(),
        config.max_concurrent_generations,
    );

    let mut state = AppState::new(
        store,
        KeyHasher::new(&config.api_key_pepper),
        Arc::new(fetcher),
        extractor,
    );
    match &config.admin_token {
        Some(token) => state = state.with_admin_token(token),
        None => tracing::info!("ADMIN_TOKEN not set, key management routes are disabled"),
    }

    let app = create_router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
