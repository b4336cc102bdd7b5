//! Summarization pipeline: authenticate, fetch the README, extract.
//!
//! # Flow
//!
//! 1. Authenticate the presented key (missing key stops here with no store access)
//! 2. Parse the repository URL and fetch its README
//! 3. Run structured extraction on the README
//!
//! The first failing stage ends the request. Stages never run out of order:
//! no fetch happens for an unauthenticated caller, and no model call happens
//! without README content.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::summary::ExtractionResult;
use crate::services::content_fetcher::ReadmeSource;
use crate::services::extractor::StructuredExtractor;
use crate::services::validation_gate::{AuthResult, ValidationGate};

pub struct SummarizePipeline {
    gate: ValidationGate,
    source: Arc<dyn ReadmeSource>,
    extractor: StructuredExtractor,
}

impl SummarizePipeline {
    pub fn new(
        gate: ValidationGate,
        source: Arc<dyn ReadmeSource>,
        extractor: StructuredExtractor,
    ) -> Self {
        Self {
            gate,
            source,
            extractor,
        }
    }

    /// The gate on its own, for endpoints that only validate keys.
    pub fn gate(&self) -> &ValidationGate {
        &self.gate
    }

    /// Summarize the repository at `repo_url` on behalf of `api_key`.
    ///
    /// A missing `repo_url` is reported as `InvalidLocator`, after the key
    /// has been checked.
    pub async fn run(
        &self,
        api_key: Option<&str>,
        repo_url: Option<&str>,
    ) -> Result<ExtractionResult, AppError> {
        let record = match self.gate.authenticate(api_key).await? {
            AuthResult::Valid(record) => record,
            AuthResult::Invalid => return Err(AppError::InvalidCredential),
        };

        let repo_url = repo_url.unwrap_or_default();
        let readme = self.source.fetch_readme(repo_url).await?;
        tracing::debug!(
            "Fetched README for {} ({} bytes) on behalf of key {}",
            repo_url,
            readme.len(),
            record.id
        );

        let result = self.extractor.extract(&readme).await?;
        tracing::info!(
            "Summarized {} with {} facts for key {}",
            repo_url,
            result.cool_facts.len(),
            record.id
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::api_key::NewApiKey;
    use crate::services::content_fetcher::{FetchError, RepoLocator};
    use crate::services::generator::{ChatPrompt, GenerationError, TextGenerator};
    use crate::services::key_service::KeyHasher;
    use crate::store::{CredentialStore, InMemoryCredentialStore};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    const PEPPER: &str = "pipeline-test-pepper";
    const KEY: &str = "pk_abc123";

    /// Serves fixed README text for `foo/bar`, 404 for anything else.
    struct StaticSource {
        readme: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReadmeSource for StaticSource {
        async fn fetch(&self, locator: &RepoLocator) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if locator.owner == "foo" && locator.repo == "bar" {
                Ok(self.readme.clone())
            } else {
                Err(FetchError::Status {
                    status: reqwest::StatusCode::NOT_FOUND,
                })
            }
        }
    }

    struct StaticGenerator {
        output: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for StaticGenerator {
        async fn generate(&self, _prompt: &ChatPrompt) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }
    }

    struct Harness {
        pipeline: SummarizePipeline,
        source: Arc<StaticSource>,
        generator: Arc<StaticGenerator>,
    }

    async fn harness(readme: &str, output: &str) -> Harness {
        let hasher = KeyHasher::new(PEPPER);
        let store = Arc::new(InMemoryCredentialStore::new());
        store
            .insert(NewApiKey {
                id: Uuid::new_v4(),
                name: "pipeline".to_string(),
                key_hash: hasher.hash(KEY),
                key_prefix: KEY.to_string(),
                monthly_limit: 1000,
                permissions: vec!["read".to_string()],
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        let source = Arc::new(StaticSource {
            readme: readme.to_string(),
            calls: AtomicUsize::new(0),
        });
        let generator = Arc::new(StaticGenerator {
            output: output.to_string(),
            calls: AtomicUsize::new(0),
        });
        let extractor = StructuredExtractor::new(generator.clone(), Duration::from_secs(5), 2);

        Harness {
            pipeline: SummarizePipeline::new(
                ValidationGate::new(store, hasher),
                source.clone(),
                extractor,
            ),
            source,
            generator,
        }
    }

    const GOOD: &str = r#"{"summary":"A tool.","cool_facts":["fast","small","free"]}"#;

    #[tokio::test]
    async fn summarizes_an_authorized_request() {
        let h = harness("# Bar\nA tool.", GOOD).await;

        let result = h
            .pipeline
            .run(Some(KEY), Some("https://github.com/foo/bar"))
            .await
            .unwrap();

        assert_eq!(result.summary, "A tool.");
        assert_eq!(result.cool_facts.len(), 3);
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unauthenticated_requests_fetch_nothing() {
        let h = harness("# Bar", GOOD).await;

        let err = h
            .pipeline
            .run(None, Some("https://github.com/foo/bar"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingCredential));

        let err = h
            .pipeline
            .run(Some("pk_wrong"), Some("https://github.com/foo/bar"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredential));

        assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bad_locator_stops_before_fetching() {
        let h = harness("# Bar", GOOD).await;

        for url in [None, Some("not-a-url"), Some("https://gitlab.com/foo/bar")] {
            let err = h.pipeline.run(Some(KEY), url).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidLocator(_)), "{url:?}");
        }
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_readme_skips_extraction() {
        let h = harness("# Bar", GOOD).await;

        let err = h
            .pipeline
            .run(Some(KEY), Some("https://github.com/foo/missing"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ContentUnavailable(_)));
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_readme_is_reported() {
        let h = harness("   ", GOOD).await;

        let err = h
            .pipeline
            .run(Some(KEY), Some("github.com/foo/bar"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::EmptySource));
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn off_schema_output_fails_the_request() {
        let h = harness("# Bar", "I cannot help with that.").await;

        let err = h
            .pipeline
            .run(Some(KEY), Some("https://github.com/foo/bar"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SchemaViolation(_)));
    }
}
